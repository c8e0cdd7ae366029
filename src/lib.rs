//! Patricians client core
//!
//! Client-side view-model for the two-player card game "Patricians"
//! (Caesar & Cleopatra). The backend owns rules and card ownership; this
//! crate lets a player stage influence placements, enforces placement
//! legality locally, derives the enabled actions and reconciles staged state
//! with every server refresh.
//!
//! # Architecture
//!
//! - **Game**: pure turn/placement state machine, rules, invariants and view
//! - **Client**: `GameApi` trait and its `reqwest` implementation
//! - **Controller**: session owner driving the machine against the API
//! - **Console**: line-oriented front-end used by the binary
//!
//! # Example
//!
//! ```no_run
//! use patricians::{CardId, Patrician, Phase, PlayerId, TurnStateMachine};
//!
//! # fn example(snapshot: patricians::AuthoritativeSnapshot) -> Result<(), patricians::TurnError> {
//! let mut machine = TurnStateMachine::new(Some(PlayerId::Caesar));
//! let ticket = machine.issue_refresh();
//! machine.apply_snapshot(ticket, snapshot);
//! machine.place(&CardId::new("THREE"), Patrician::Consul)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod client;
mod config;
mod console;
mod controller;
mod error;
mod game;

// Crate-level exports - Game core
pub use game::{
    Assignment, AuthoritativeSnapshot, BoardView, ButtonView, CapacityInvariant, CardId,
    CardInHand, CardKind, CardRef, DeckCounts, FaceOrderInvariant, GameAction, HandCardView,
    InfluenceEntry, InfluenceOnly, InitialInfluencePlacements, Invariant, InvariantSet,
    InvariantViolation, LegalPlacement, Patrician, PatricianBoardEntry, PatricianView,
    PendingSelection, Phase, PlacedCardView, PlacementContext, PlacementRecord, PlacementVerdict,
    PlayActionRequest, PlayInfluenceRequest, PlayerId, Reconciliation, RefreshSequencer,
    RefreshTicket, RuleViolation, STANDARD_PLAY_CAPACITY, STARTING_INFLUENCE,
    SingleOccupancyInvariant, SnapshotOutcome, StagedPlacementStore, Staging, StagingInvariants,
    StatusView, Submission, SubmissionKind, TurnPhase, TurnState, TurnStateMachine,
    UniqueCardInvariant, VoteRequest, WithinTurnCapacity, can_place, can_remove, derive_actions,
    prune_missing, reconcile, starting_hand,
};

// Crate-level exports - HTTP client
pub use client::{
    ClientError, ClientErrorKind, ErrorBody, GameApi, HttpGameClient, InitialInfluenceResponse,
    VoteResponse, rejection_reason,
};

// Crate-level exports - Configuration
pub use config::{ClientConfig, ConfigError, SEAT_ENV, SERVER_URL_ENV, parse_seat};

// Crate-level exports - Session control
pub use controller::{ClientEvent, GameController, TurnPrompter};
pub use error::TurnError;

// Crate-level exports - Console front-end
pub use console::{
    Command as ConsoleCommand, ConsolePrompter, ConsoleScreen, HELP, SharedLines, SharedScreen,
    closed_lines, parse_action_choice, parse_command, parse_vote_choice, render_board, run_console,
    spawn_stdin_reader,
};
