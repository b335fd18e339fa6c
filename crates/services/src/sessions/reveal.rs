use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::{Instant, sleep_until};

use quest_core::model::SessionToken;

/// Pause between showing whether an answer was right and moving on.
pub const DEFAULT_REVEAL_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Default)]
struct CancelState {
    generation: AtomicU64,
    notify: Notify,
}

/// How a pending reveal ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    /// The delay elapsed for the session identified by the token.
    Fired(SessionToken),
    /// The timer was cancelled before the delay elapsed.
    Cancelled,
}

/// Cancellable one-shot timer for the reveal delay.
///
/// Every `start` hands out a `PendingReveal`; `cancel` (directly or through a
/// `RevealCanceller`) invalidates all reveals started before it.
#[derive(Debug, Clone)]
pub struct RevealTimer {
    delay: Duration,
    cancel: Arc<CancelState>,
}

impl Default for RevealTimer {
    fn default() -> Self {
        Self::new(DEFAULT_REVEAL_DELAY)
    }
}

impl RevealTimer {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            cancel: Arc::new(CancelState::default()),
        }
    }

    /// Arm the timer for the session identified by `token`.
    #[must_use]
    pub fn start(&self, token: SessionToken) -> PendingReveal {
        PendingReveal {
            token,
            generation: self.cancel.generation.load(Ordering::SeqCst),
            deadline: Instant::now() + self.delay,
            cancel: Arc::clone(&self.cancel),
        }
    }

    /// Cancel every reveal started so far.
    pub fn cancel(&self) {
        cancel_all(&self.cancel);
    }

    /// A handle that can cancel from elsewhere, e.g. a quit key handler.
    #[must_use]
    pub fn canceller(&self) -> RevealCanceller {
        RevealCanceller {
            cancel: Arc::clone(&self.cancel),
        }
    }
}

fn cancel_all(state: &CancelState) {
    state.generation.fetch_add(1, Ordering::SeqCst);
    state.notify.notify_waiters();
}

/// Cloneable cancel handle for a `RevealTimer`.
#[derive(Debug, Clone)]
pub struct RevealCanceller {
    cancel: Arc<CancelState>,
}

impl RevealCanceller {
    pub fn cancel(&self) {
        cancel_all(&self.cancel);
    }
}

/// A reveal in flight. Resolves once, by value.
#[derive(Debug)]
pub struct PendingReveal {
    token: SessionToken,
    generation: u64,
    deadline: Instant,
    cancel: Arc<CancelState>,
}

impl PendingReveal {
    fn is_cancelled(&self) -> bool {
        self.cancel.generation.load(Ordering::SeqCst) != self.generation
    }

    /// Wait for the delay to elapse or for a cancel, whichever comes first.
    pub async fn wait(self) -> RevealOutcome {
        loop {
            let notified = self.cancel.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a cancel between the check and the
            // select is not missed.
            notified.as_mut().enable();
            if self.is_cancelled() {
                return RevealOutcome::Cancelled;
            }

            tokio::select! {
                () = sleep_until(self.deadline) => {
                    return if self.is_cancelled() {
                        RevealOutcome::Cancelled
                    } else {
                        RevealOutcome::Fired(self.token)
                    };
                }
                () = &mut notified => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fires_after_delay() {
        let timer = RevealTimer::new(Duration::from_millis(1500));
        let token = SessionToken::new(3);
        let started = Instant::now();

        let outcome = timer.start(token).wait().await;

        assert_eq!(outcome, RevealOutcome::Fired(token));
        assert!(started.elapsed() >= Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_before_wait_wins() {
        let timer = RevealTimer::default();
        let pending = timer.start(SessionToken::new(1));
        timer.cancel();
        assert_eq!(pending.wait().await, RevealOutcome::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_wait_interrupts() {
        let timer = RevealTimer::new(Duration::from_secs(60));
        let canceller = timer.canceller();
        let pending = timer.start(SessionToken::new(1));

        let waiter = tokio::spawn(pending.wait());
        tokio::time::sleep(Duration::from_secs(1)).await;
        canceller.cancel();

        assert_eq!(waiter.await.unwrap(), RevealOutcome::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_does_not_affect_later_reveals() {
        let timer = RevealTimer::new(Duration::from_millis(10));
        timer.cancel();
        let token = SessionToken::new(2);
        assert_eq!(timer.start(token).wait().await, RevealOutcome::Fired(token));
    }
}
