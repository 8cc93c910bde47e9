//! Line-oriented terminal presenter.

use anyhow::Result;
use guessnum_game::{Guess, Verdict};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument};

use crate::client::GameClient;
use crate::error::{SessionError, SessionErrorKind};
use crate::machine::{MachineState, SessionEvent};
use crate::session::GameSession;

/// One line typed by the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Anything else is treated as a guess.
    Guess(String),
    /// `leave` or `quit`.
    Leave,
    /// Blank line.
    Empty,
}

impl Input {
    /// Interprets a line of input.
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "" => Input::Empty,
            "leave" | "quit" | "q" => Input::Leave,
            _ => Input::Guess(trimmed.to_string()),
        }
    }
}

/// Text shown for `event`, or `None` for events with nothing to say.
pub fn render(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::StateChanged {
            to: MachineState::AwaitingOpponent,
            ..
        } => Some("Waiting for an opponent to join...".to_string()),
        SessionEvent::StateChanged { .. } => None,
        SessionEvent::OpponentJoined { name } => Some(format!("Playing with {}.", name)),
        SessionEvent::GuessObserved(entry) => Some(format!(
            "#{:>2}  {}  digits: {}  positions: {}",
            entry.sequence(),
            entry.guess(),
            entry.score().matched_digits(),
            entry.score().matched_positions(),
        )),
        SessionEvent::GameOver { verdict, secret } => {
            let secret = secret
                .as_deref()
                .map(|s| format!(" The number was {}.", s))
                .unwrap_or_default();
            Some(match verdict {
                Verdict::Won => format!("Cracked it!{}", secret),
                Verdict::Lost => format!("Out of guesses.{}", secret),
                Verdict::InProgress => format!("Game ended.{}", secret),
            })
        }
        SessionEvent::Abandoned { id } => Some(format!("Left game {}.", id)),
    }
}

/// Note shown when `input` repeats a guess already in `session`.
fn repeat_note(session: &GameSession, input: &str) -> Option<String> {
    let guess = Guess::parse(input).ok()?;
    session
        .has_tried(&guess)
        .then(|| format!("You already tried {}; it still counts.", guess))
}

/// Text shown for a failed submission.
fn error_text(err: &SessionError) -> String {
    match err.kind {
        SessionErrorKind::Validation => "Not a valid guess: use four different digits.".to_string(),
        kind if kind.is_retryable() => {
            format!("Could not reach the game service ({}). Try again.", err.message)
        }
        kind => format!("{}: {}", kind, err.message),
    }
}

enum Step {
    Line(Option<String>),
    Polled(bool),
}

fn flush(events: &mut mpsc::UnboundedReceiver<SessionEvent>) {
    while let Ok(event) = events.try_recv() {
        if let Some(text) = render(&event) {
            println!("{}", text);
        }
    }
}

fn prompt(client: &GameClient) {
    if client.can_submit() {
        if let Some(left) = client.remaining_guesses() {
            println!("Your guess ({} left, 'leave' to quit):", left);
        }
    }
}

/// Drives `client` from stdin until the game ends or the player leaves.
#[instrument(skip_all)]
pub async fn run(
    mut client: GameClient,
    mut events: mpsc::UnboundedReceiver<SessionEvent>,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    flush(&mut events);
    prompt(&client);

    while client.state().is_live() {
        let step = tokio::select! {
            line = lines.next_line() => Step::Line(line?),
            polled = client.next_poll(), if client.is_polling() => Step::Polled(polled),
        };

        match step {
            Step::Line(None) => {
                info!("Input closed");
                client.leave().await;
            }
            Step::Line(Some(line)) => match Input::parse(&line) {
                Input::Empty => {}
                Input::Leave => {
                    client.leave().await;
                }
                Input::Guess(_) if !client.can_submit() => {
                    println!("It is not your turn to guess. Type 'leave' to quit.");
                }
                Input::Guess(guess) => {
                    if let Some(note) = client.session().and_then(|s| repeat_note(s, &guess)) {
                        println!("{}", note);
                    }
                    if let Err(e) = client.submit_guess(&guess).await {
                        println!("{}", error_text(&e));
                    }
                    flush(&mut events);
                    prompt(&client);
                }
            },
            Step::Polled(applied) => {
                debug!(applied, state = %client.state(), "Poll step");
            }
        }
        flush(&mut events);
    }

    flush(&mut events);
    Ok(())
}
