//! Interactive terminal loop for one quiz session.

use std::error::Error;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use quest_core::model::{PromptTemplate, ScoreBand, Scoreboard, SessionContext};
use services::{
    ActiveSession, AdvanceOutcome, AnswerResult, SessionError, SessionLoopService,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Choice(usize),
    Skip,
    Quit,
    Invalid,
}

fn parse_input(line: &str, choice_count: usize) -> Input {
    match line.trim() {
        "q" | "Q" => Input::Quit,
        "s" | "S" => Input::Skip,
        other => match other.parse::<usize>() {
            Ok(n) if (1..=choice_count).contains(&n) => Input::Choice(n - 1),
            _ => Input::Invalid,
        },
    }
}

fn band_label(band: ScoreBand) -> &'static str {
    match band {
        ScoreBand::Zero => "Better luck next time.",
        ScoreBand::Low => "Keep at it.",
        ScoreBand::High => "Nice work.",
        ScoreBand::Perfect => "Perfect!",
    }
}

/// Play one session on stdin/stdout. Quitting or hitting end of input abandons
/// the session without recording anything.
pub async fn play(
    session_loop: &SessionLoopService,
    context: SessionContext,
) -> Result<(), Box<dyn Error>> {
    let mut session = session_loop.start_session(context).await?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    if session.quiz().is_finished() {
        println!("No colleagues with a photo in this department.");
        return Ok(());
    }

    let mut scoreboard = None;
    while !session.quiz().is_finished() {
        let choices = render_question(&session);

        let Some(line) = lines.next_line().await? else {
            abandon(session_loop, &mut session);
            return Ok(());
        };

        let result = match parse_input(&line, choices) {
            Input::Quit => {
                abandon(session_loop, &mut session);
                return Ok(());
            }
            Input::Invalid => {
                println!("Enter a number from 1 to {choices}, s to skip or q to quit.");
                continue;
            }
            Input::Skip => session_loop.skip(&mut session).await,
            Input::Choice(idx) => match answer(session_loop, &mut session, &mut lines, idx).await? {
                Some(result) => result,
                None => {
                    abandon(session_loop, &mut session);
                    return Ok(());
                }
            },
        };

        match result {
            Ok(result) => scoreboard = result.scoreboard.or(scoreboard),
            Err(SessionError::Score(err)) => {
                tracing::warn!(error = %err, "saving the score failed; retrying once");
                scoreboard = session_loop.finalize_score(&mut session).await?;
            }
            Err(err) => return Err(err.into()),
        }
    }

    print_summary(&session, scoreboard.as_ref())?;
    Ok(())
}

/// Submit a choice, show the reveal and wait it out. `Ok(None)` when the
/// player quit during the reveal.
async fn answer(
    session_loop: &SessionLoopService,
    session: &mut ActiveSession,
    lines: &mut Lines<BufReader<Stdin>>,
    idx: usize,
) -> Result<Option<Result<AnswerResult, SessionError>>, Box<dyn Error>> {
    let reveal = session_loop.submit(session, idx)?;
    let correct_choice = session
        .quiz()
        .current_question()
        .and_then(|q| q.choices().get(reveal.answer_index))
        .cloned()
        .unwrap_or_default();
    if reveal.correct {
        println!("Correct!");
    } else {
        println!("Wrong, it was {correct_choice}.");
    }

    let canceller = session.canceller();
    let wait = reveal.pending.wait();
    tokio::pin!(wait);
    let outcome = loop {
        tokio::select! {
            outcome = &mut wait => break outcome,
            line = lines.next_line() => match line {
                Ok(Some(line)) if parse_input(&line, 0) == Input::Quit => canceller.cancel(),
                Ok(None) => canceller.cancel(),
                Ok(Some(_)) => {}
                Err(err) => return Err(err.into()),
            },
        }
    };

    match session_loop.complete(session, outcome).await {
        Ok(AdvanceOutcome::Advanced(result)) => Ok(Some(Ok(result))),
        Ok(AdvanceOutcome::Discarded) => Ok(None),
        Err(err) => Ok(Some(Err(err))),
    }
}

fn abandon(session_loop: &SessionLoopService, session: &mut ActiveSession) {
    session_loop.reset(session);
    println!("Session abandoned; nothing was recorded.");
}

/// Print the current question; returns the number of choices offered.
fn render_question(session: &ActiveSession) -> usize {
    let quiz = session.quiz();
    let (Some(employee), Some(question)) = (quiz.current_employee(), quiz.current_question())
    else {
        return 0;
    };
    let progress = quiz.progress();

    println!();
    println!(
        "[{}/{}] score {}",
        progress.answered + 1,
        progress.total,
        progress.score
    );
    println!("Photo: {}", employee.photo_url());
    if question.template() != PromptTemplate::JobTitle && !employee.job_title().is_empty() {
        println!("Job title: {}", employee.job_title());
    }
    if !employee.department_name().is_empty() {
        println!("Department: {}", employee.department_name());
    }
    println!("{}", question.prompt());
    for (i, choice) in question.choices().iter().enumerate() {
        println!("  {}. {choice}", i + 1);
    }
    println!("(number, s to skip, q to quit)");
    question.choices().len()
}

fn print_summary(
    session: &ActiveSession,
    scoreboard: Option<&Scoreboard>,
) -> Result<(), Box<dyn Error>> {
    let quiz = session.quiz();
    let band = quiz.progress().band()?;

    println!();
    println!("You scored {}/{}. {}", quiz.score(), quiz.total(), band_label(band));
    println!("This game's colleagues:");
    for employee in quiz.roster() {
        if employee.job_title().is_empty() {
            println!("  - {}", employee.name());
        } else {
            println!("  - {} ({})", employee.name(), employee.job_title());
        }
    }
    match scoreboard {
        Some(board) => println!(
            "Average over {} sessions: {:.1}",
            board.num_scores(),
            board.average()
        ),
        None => println!("The score could not be saved."),
    }
    Ok(())
}
