//! Line-oriented console front-end.
//!
//! Renders [`BoardView`]s as text, turns typed commands into controller calls
//! and answers the controller's follow-up prompts from the same input stream.

use crate::controller::{ClientEvent, GameController, TurnPrompter};
use crate::game::{BoardView, CardId, CardRef, GameAction, Patrician};
use std::fmt::Write as _;
use std::io::BufRead;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, instrument, warn};

/// Input lines shared by the command loop and the prompter.
pub type SharedLines = Arc<Mutex<mpsc::UnboundedReceiver<String>>>;

/// Spawns a thread forwarding stdin lines into a shared channel.
///
/// A plain thread is used because a blocked tokio stdin read keeps the
/// runtime from shutting down.
pub fn spawn_stdin_reader() -> SharedLines {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed to read stdin");
                    break;
                }
            }
        }
        debug!("Stdin reader finished");
    });
    Arc::new(Mutex::new(rx))
}

/// Input that is already closed; every prompt is cancelled.
pub fn closed_lines() -> SharedLines {
    let (_, rx) = mpsc::unbounded_channel();
    Arc::new(Mutex::new(rx))
}

async fn next_line(lines: &SharedLines) -> Option<String> {
    lines.lock().await.recv().await
}

// ─────────────────────────────────────────────────────────────
//  Rendering
// ─────────────────────────────────────────────────────────────

fn short_asset(asset: &str) -> &str {
    asset
        .rsplit('/')
        .next()
        .unwrap_or(asset)
        .trim_end_matches(".svg")
}

/// Renders a board view as plain text.
pub fn render_board(view: &BoardView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", view.status.title);
    if !view.status.turn_info.is_empty() {
        let _ = writeln!(out, "{}", view.status.turn_info);
    }

    for column in &view.patricians {
        let opponent: Vec<_> = column
            .opponent_influence
            .iter()
            .map(|asset| short_asset(asset))
            .collect();
        let own: Vec<String> = column
            .player_influence
            .iter()
            .map(|card| {
                let face = card.actual.as_deref().unwrap_or(&card.src);
                let mut label = short_asset(face).to_uppercase();
                if !card.face_up {
                    label.push_str(" (down)");
                }
                if card.staged {
                    label.push('*');
                }
                label
            })
            .collect();
        let _ = writeln!(
            out,
            "{:<9} x{}  them: [{}]  you: [{}]",
            column.name,
            column.remaining,
            opponent.join(", "),
            own.join(", ")
        );
    }

    let hand: Vec<_> = view.hand.iter().map(|card| card.card.id.to_string()).collect();
    let _ = writeln!(out, "Hand: {}", hand.join(" "));

    let counts = &view.counts;
    let _ = writeln!(
        out,
        "Decks: action {} influence {} | discard {} | busts {} | opponent hand {}",
        counts.player_action,
        counts.player_influence,
        counts.discard_pile,
        counts.bust_bag,
        counts.opponent_hand
    );

    if !view.buttons.is_empty() {
        let buttons: Vec<_> = view
            .buttons
            .iter()
            .map(|button| {
                if button.disabled {
                    format!("({})", button.action)
                } else {
                    format!("[{}]", button.action)
                }
            })
            .collect();
        let _ = writeln!(out, "Actions: {}", buttons.join(" "));
    }
    out
}

// ─────────────────────────────────────────────────────────────
//  Commands
// ─────────────────────────────────────────────────────────────

/// A typed console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `place <CARD> <PATRICIAN>`
    Place(CardId, Patrician),
    /// `unstage <CARD> <PATRICIAN>`
    Unstage(CardId, Patrician),
    /// An action button, by id or shorthand.
    Press(GameAction),
    /// `auto`: stage the whole starting hand.
    Auto,
    /// `refresh`
    Refresh,
    /// `reset`
    Reset,
    /// `show`
    Show,
    /// `help`
    Help,
    /// `quit`
    Quit,
}

/// Console usage text.
pub const HELP: &str = "\
Commands:
  place <CARD> <PATRICIAN>    stage an influence card (e.g. place ONE consul)
  unstage <CARD> <PATRICIAN>  take a staged card back
  submit                      submit initial influence
  end                         end turn with a vote of confidence
  action                      submit influence and play an action card
  skip                        skip to the action phase
  auto                        auto-complete initial influence
  refresh | show | reset | help | quit";

fn parse_patrician(word: &str) -> Result<Patrician, String> {
    word.parse()
        .map_err(|_| format!("Unknown patrician '{word}'"))
}

/// Parses one input line.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    match words.as_slice() {
        ["place", card, slot] => Ok(Command::Place(CardId::new(card), parse_patrician(slot)?)),
        ["unstage", card, slot] => Ok(Command::Unstage(CardId::new(card), parse_patrician(slot)?)),
        ["place" | "unstage", ..] => Err("Usage: place|unstage <CARD> <PATRICIAN>".to_string()),
        ["submit"] => Ok(Command::Press(GameAction::SubmitInitialInfluence)),
        ["end"] => Ok(Command::Press(GameAction::EndTurn)),
        ["action"] => Ok(Command::Press(GameAction::PlayActionCard)),
        ["skip"] => Ok(Command::Press(GameAction::SkipToAction)),
        ["auto"] => Ok(Command::Auto),
        ["refresh"] => Ok(Command::Refresh),
        ["reset"] => Ok(Command::Reset),
        ["show"] => Ok(Command::Show),
        ["help"] => Ok(Command::Help),
        ["quit" | "exit"] => Ok(Command::Quit),
        [word] => word
            .parse::<GameAction>()
            .map(Command::Press)
            .map_err(|_| format!("Unknown command '{word}', type help")),
        _ => Err("Unknown command, type help".to_string()),
    }
}

/// Parses a vote selection: a 1-based index or a patrician name.
pub fn parse_vote_choice(input: &str) -> Option<Patrician> {
    let input = input.trim();
    if let Ok(index) = input.parse::<usize>() {
        return index
            .checked_sub(1)
            .and_then(|i| Patrician::all().get(i).copied());
    }
    input.parse().ok()
}

/// Parses an action selection: `<index|CARD> [PATRICIAN]`.
pub fn parse_action_choice(
    input: &str,
    cards: &[CardRef],
) -> Option<(CardId, Option<Patrician>)> {
    let mut words = input.split_whitespace();
    let first = words.next()?;
    let card = match first.parse::<usize>() {
        Ok(index) => cards.get(index.checked_sub(1)?)?.id.clone(),
        Err(_) => {
            let id = CardId::new(first);
            cards.iter().find(|card| card.id == id)?.id.clone()
        }
    };
    let target = match words.next() {
        Some(word) => Some(word.parse().ok()?),
        None => None,
    };
    Some((card, target))
}

// ─────────────────────────────────────────────────────────────
//  Prompter
// ─────────────────────────────────────────────────────────────

/// Answers follow-up prompts from console input.
pub struct ConsolePrompter {
    lines: SharedLines,
    screen: Option<SharedScreen>,
}

impl ConsolePrompter {
    /// Creates a prompter reading from `lines`.
    pub fn new(lines: SharedLines) -> Self {
        Self {
            lines,
            screen: None,
        }
    }

    /// Flushes `screen` before every prompt so the board shown is current.
    pub fn with_screen(mut self, screen: SharedScreen) -> Self {
        self.screen = Some(screen);
        self
    }

    async fn catch_up(&self) {
        if let Some(screen) = &self.screen {
            screen.lock().await.drain();
        }
    }
}

#[async_trait::async_trait]
impl TurnPrompter for ConsolePrompter {
    async fn choose_vote_patrician(&mut self, _view: &BoardView) -> Option<Patrician> {
        self.catch_up().await;
        println!("Select a patrician for the vote of confidence (blank to cancel):");
        for (index, patrician) in Patrician::all().into_iter().enumerate() {
            println!("  {}) {}", index + 1, patrician.label());
        }
        let line = next_line(&self.lines).await?;
        let choice = parse_vote_choice(&line);
        if choice.is_none() && !line.trim().is_empty() {
            println!("Invalid selection");
        }
        choice
    }

    async fn choose_action_card(
        &mut self,
        cards: &[CardRef],
    ) -> Option<(CardId, Option<Patrician>)> {
        self.catch_up().await;
        println!("Select an action card, optionally with a target (blank to cancel):");
        for (index, card) in cards.iter().enumerate() {
            println!("  {}) {}", index + 1, card.id);
        }
        let line = next_line(&self.lines).await?;
        let choice = parse_action_choice(&line, cards);
        if choice.is_none() && !line.trim().is_empty() {
            println!("Invalid selection");
        }
        choice
    }
}

// ─────────────────────────────────────────────────────────────
//  Loop
// ─────────────────────────────────────────────────────────────

/// Console output fed by the controller's event stream.
///
/// Shared between the command loop and the prompter, which drains it before
/// asking a follow-up question in the middle of a flow.
pub struct ConsoleScreen {
    events: mpsc::UnboundedReceiver<ClientEvent>,
    last_view: Option<BoardView>,
}

/// A [`ConsoleScreen`] shared across tasks.
pub type SharedScreen = Arc<Mutex<ConsoleScreen>>;

impl ConsoleScreen {
    /// Creates a screen reading controller events from `events`.
    pub fn new(events: mpsc::UnboundedReceiver<ClientEvent>) -> Self {
        Self {
            events,
            last_view: None,
        }
    }

    /// Wraps the screen for sharing with a [`ConsolePrompter`].
    pub fn shared(self) -> SharedScreen {
        Arc::new(Mutex::new(self))
    }

    /// Last board printed.
    pub fn last_view(&self) -> Option<&BoardView> {
        self.last_view.as_ref()
    }

    /// Prints every queued event, returning how many were handled.
    pub fn drain(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events.try_recv() {
            self.print_event(event);
            handled += 1;
        }
        handled
    }

    /// Prints `view` unconditionally.
    pub fn show(&mut self, view: BoardView) {
        println!("{}", render_board(&view));
        self.last_view = Some(view);
    }

    fn print_event(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::ViewChanged(view) => {
                if self.last_view.as_ref() != Some(&view) {
                    self.show(view);
                }
            }
            ClientEvent::Notice(message) => println!(">> {message}"),
            ClientEvent::VoteResolved { patrician, winner } => match winner {
                Some(winner) => println!(">> {} claimed by {winner}", patrician.label()),
                None => println!(">> {} vote tied", patrician.label()),
            },
        }
    }
}

/// Runs the interactive console until `quit` or end of input.
#[instrument(skip_all)]
pub async fn run_console(
    mut controller: GameController,
    screen: SharedScreen,
    lines: SharedLines,
    poll_interval: Duration,
) -> anyhow::Result<()> {
    info!("Starting console");
    let mut poll = tokio::time::interval(poll_interval);
    poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    println!("{HELP}");
    let _ = controller.refresh().await;

    loop {
        screen.lock().await.drain();

        tokio::select! {
            line = next_line(&lines) => {
                let Some(line) = line else {
                    info!("Input closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let command = match parse_command(&line) {
                    Ok(command) => command,
                    Err(message) => {
                        println!("{message}");
                        continue;
                    }
                };
                debug!(?command, "Console command");
                // Failures are already reported as notices.
                let _ = match command {
                    Command::Place(card, slot) => controller.place(card, slot).await,
                    Command::Unstage(card, slot) => controller.unstage(card, slot).await,
                    Command::Press(action) => controller.press(action).await,
                    Command::Auto => controller.auto_complete().await,
                    Command::Refresh => controller.refresh().await.map(|_| ()),
                    Command::Reset => controller.reset().await,
                    Command::Show => {
                        screen.lock().await.show(controller.view());
                        Ok(())
                    }
                    Command::Help => {
                        println!("{HELP}");
                        Ok(())
                    }
                    Command::Quit => break,
                };
            }
            _ = poll.tick() => {
                if let Err(error) = controller.poll().await {
                    debug!(%error, "Poll failed");
                }
            }
        }
    }

    info!("Console finished");
    Ok(())
}
