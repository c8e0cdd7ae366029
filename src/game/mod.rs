//! Turn and placement core: pure state, rules and projections.

mod availability;
mod invariants;
mod machine;
mod placement;
mod rules;
mod snapshot;
mod submission;
mod sync;
mod types;
mod view;

pub use availability::{GameAction, derive_actions};
pub use invariants::{
    CapacityInvariant, FaceOrderInvariant, Invariant, InvariantSet, InvariantViolation,
    SingleOccupancyInvariant, Staging, StagingInvariants, UniqueCardInvariant,
};
pub use machine::{SnapshotOutcome, TurnStateMachine};
pub use placement::{PlacementRecord, StagedPlacementStore};
pub use rules::{
    CardInHand, InfluenceOnly, LegalPlacement, PlacementContext, PlacementVerdict, RuleViolation,
    STANDARD_PLAY_CAPACITY, WithinTurnCapacity, can_place, can_remove,
};
pub use snapshot::{AuthoritativeSnapshot, InfluenceEntry, PatricianBoardEntry, TurnPhase};
pub use submission::{
    Assignment, InitialInfluencePlacements, PlayActionRequest, PlayInfluenceRequest, Submission,
    VoteRequest,
};
pub use sync::{Reconciliation, RefreshSequencer, RefreshTicket, prune_missing, reconcile};
pub use types::{
    CardId, CardKind, CardRef, Patrician, PendingSelection, Phase, PlayerId, STARTING_INFLUENCE,
    SubmissionKind, TurnState, starting_hand,
};
pub use view::{
    BoardView, ButtonView, DeckCounts, HandCardView, PatricianView, PlacedCardView, StatusView,
};
