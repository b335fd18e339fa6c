use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;

use quest_core::model::Employee;

use crate::error::SessionError;

/// Number of employees asked about per session unless configured otherwise.
pub const DEFAULT_SESSION_SIZE: usize = 10;

/// Draws the roster for one session from the directory's employee pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSampler {
    desired_count: usize,
}

impl Default for SessionSampler {
    fn default() -> Self {
        Self {
            desired_count: DEFAULT_SESSION_SIZE,
        }
    }
}

impl SessionSampler {
    /// # Errors
    ///
    /// Returns `SessionError::InvalidSessionSize` when `desired_count` is 0.
    pub fn new(desired_count: usize) -> Result<Self, SessionError> {
        if desired_count == 0 {
            return Err(SessionError::InvalidSessionSize);
        }
        Ok(Self { desired_count })
    }

    #[must_use]
    pub fn desired_count(&self) -> usize {
        self.desired_count
    }

    /// Pick up to `desired_count` distinct employees in random order.
    ///
    /// - Repeated ids in `pool` are collapsed to their first occurrence.
    /// - With enough employees, draws without replacement: each step takes a
    ///   uniformly random index from what remains.
    /// - With too few, the whole pool is used.
    /// - The result is shuffled so the order never follows the directory's.
    pub fn sample<R: Rng + ?Sized>(&self, pool: Vec<Employee>, rng: &mut R) -> Vec<Employee> {
        let mut seen = HashSet::with_capacity(pool.len());
        let mut working: Vec<Employee> = pool
            .into_iter()
            .filter(|employee| seen.insert(employee.id()))
            .collect();

        let mut roster = if working.len() >= self.desired_count {
            let mut picked = Vec::with_capacity(self.desired_count);
            for _ in 0..self.desired_count {
                let idx = rng.random_range(0..working.len());
                picked.push(working.swap_remove(idx));
            }
            picked
        } else {
            working
        };

        roster.shuffle(rng);
        roster
    }
}
