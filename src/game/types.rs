//! Core domain types for the Patricians client.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Game phase, driving which placement rule set is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum Phase {
    /// Opening phase: each player secretly assigns one card per patrician.
    #[serde(rename = "INITIAL_INFLUENCE_PLACEMENT", alias = "INITIAL_PLACEMENT")]
    #[strum(serialize = "INITIAL_INFLUENCE_PLACEMENT")]
    InitialPlacement,
    /// Main phase: up to two influence cards per turn.
    #[serde(rename = "STANDARD_PLAY")]
    #[strum(serialize = "STANDARD_PLAY")]
    StandardPlay,
}

/// One of the two fixed player identities.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum PlayerId {
    /// Caesar.
    Caesar,
    /// Cleopatra.
    Cleopatra,
}

impl PlayerId {
    /// Returns the opposing player.
    pub fn opponent(self) -> Self {
        match self {
            PlayerId::Caesar => PlayerId::Cleopatra,
            PlayerId::Cleopatra => PlayerId::Caesar,
        }
    }

    /// Asset name of this player's card back.
    pub fn card_back(self) -> String {
        format!("backs/{}.svg", self.to_string().to_lowercase())
    }
}

/// A patrician type: the named placement target on the board.
///
/// Variants are declared in board order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Patrician {
    /// Quaestor.
    Quaestor,
    /// Aedile.
    Aedile,
    /// Praetor.
    Praetor,
    /// Consul.
    Consul,
    /// Censor.
    Censor,
}

impl Patrician {
    /// All patricians in board order.
    pub fn all() -> Vec<Patrician> {
        Patrician::iter().collect()
    }

    /// Display name, e.g. "Quaestor".
    pub fn label(self) -> &'static str {
        match self {
            Patrician::Quaestor => "Quaestor",
            Patrician::Aedile => "Aedile",
            Patrician::Praetor => "Praetor",
            Patrician::Consul => "Consul",
            Patrician::Censor => "Censor",
        }
    }

    /// Board image asset, e.g. "quaestor.svg".
    pub fn image(self) -> String {
        format!("{}.svg", self.to_string().to_lowercase())
    }
}

/// Kind of card held in a hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CardKind {
    /// Influence card, placed on patricians.
    Influence,
    /// Action card.
    Action,
}

/// Server-side card identifier, normalized to upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, derive_more::Display)]
#[serde(from = "String", into = "String")]
pub struct CardId(String);

impl CardId {
    /// Creates a card id, normalizing case.
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_uppercase())
    }

    /// Returns the id as sent on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for CardId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl From<&str> for CardId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<CardId> for String {
    fn from(id: CardId) -> Self {
        id.0
    }
}

/// Identifies a card in a hand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardRef {
    /// Card id (type/name).
    pub id: CardId,
    /// Card kind.
    #[serde(rename = "type")]
    pub kind: CardKind,
}

impl CardRef {
    /// Creates an influence card reference.
    pub fn influence(id: impl Into<CardId>) -> Self {
        Self {
            id: id.into(),
            kind: CardKind::Influence,
        }
    }

    /// Creates an action card reference.
    pub fn action(id: impl Into<CardId>) -> Self {
        Self {
            id: id.into(),
            kind: CardKind::Action,
        }
    }

    /// Display asset for the face of this card.
    pub fn asset(&self) -> String {
        format!("{}/{}.svg", self.kind, self.id.as_str().to_lowercase())
    }
}

/// Follow-up selection opened by a two-step flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum PendingSelection {
    /// Choose a patrician for a vote of confidence.
    #[display("vote of confidence")]
    Vote,
    /// Choose an action card to play.
    #[display("action card")]
    ActionCard,
}

/// Influence cards every player holds during initial placement.
pub const STARTING_INFLUENCE: [&str; 5] = ["ONE", "TWO", "THREE", "FOUR", "FIVE"];

/// Returns the starting influence hand.
pub fn starting_hand() -> Vec<CardRef> {
    STARTING_INFLUENCE.iter().map(|id| CardRef::influence(*id)).collect()
}

/// Turn state of the client-side state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum TurnState {
    /// Viewing only; not the local player's turn.
    Idle,
    /// The local player may add and remove staged placements.
    Placing,
    /// A submission request is in flight.
    #[display("Submitting({_0})")]
    Submitting(SubmissionKind),
    /// Submission acknowledged; waiting for the next snapshot.
    AwaitingRefresh,
}

/// The submit paths out of `Placing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum SubmissionKind {
    /// Initial influence placement.
    InitialInfluence,
    /// Influence cards submitted before a vote of confidence.
    EndTurn,
    /// Influence cards submitted before choosing an action card.
    PlayActionCard,
    /// Vote of confidence over a patrician type.
    VoteOfConfidence,
    /// An action card played from the hand.
    ActionCard,
}
