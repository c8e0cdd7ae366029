//! Errors surfaced by turn operations.

use crate::client::ClientError;
use crate::game::RuleViolation;
use derive_more::{Display, Error};

/// Failure of a controller or machine operation.
///
/// None of these are fatal: a rule violation leaves state untouched, `Busy`
/// is returned instead of queueing, and a client error leaves the staged
/// placements in place for a retry.
#[derive(Debug, Clone, Display, Error)]
pub enum TurnError {
    /// The local rule engine rejected the move.
    #[display("{_0}")]
    Rule(RuleViolation),

    /// A submission is already in flight.
    #[display("A submission is already in progress")]
    Busy,

    /// The server or network failed the request.
    #[display("{_0}")]
    Client(ClientError),
}

impl From<RuleViolation> for TurnError {
    fn from(violation: RuleViolation) -> Self {
        Self::Rule(violation)
    }
}

impl From<ClientError> for TurnError {
    fn from(error: ClientError) -> Self {
        Self::Client(error)
    }
}

impl TurnError {
    /// Text suitable for showing to the player.
    pub fn user_message(&self) -> String {
        match self {
            TurnError::Rule(violation) => violation.to_string(),
            TurnError::Busy => self.to_string(),
            TurnError::Client(error) => error.user_message(),
        }
    }
}
