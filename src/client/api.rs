//! The backend action API as seen by the controller.

use super::error::ClientError;
use crate::game::{
    AuthoritativeSnapshot, InitialInfluencePlacements, Phase, PlayActionRequest,
    PlayInfluenceRequest, PlayerId, VoteRequest,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Response of `POST /game/action/placeInitialInfluence`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialInfluenceResponse {
    /// Player to act next.
    #[serde(default)]
    pub current_player: Option<PlayerId>,
    /// Game mode after the submission.
    #[serde(default)]
    pub current_mode: Option<Phase>,
    /// Free-form status text.
    #[serde(default)]
    pub status: Option<String>,
}

/// Response of `POST /game/action/voteOfConfidence`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteResponse {
    /// Winner of the vote, absent on a tie.
    #[serde(default)]
    pub winner: Option<PlayerId>,
}

/// One async call per backend endpoint.
///
/// Every method either returns the parsed body or a [`ClientError`]; none of
/// them retry.
#[async_trait]
pub trait GameApi: Send + Sync {
    /// `GET /game`.
    async fn fetch_game(&self) -> Result<AuthoritativeSnapshot, ClientError>;

    /// `POST /game/reset`.
    async fn reset_game(&self) -> Result<(), ClientError>;

    /// `POST /game/action/placeInitialInfluence?playerId=<player>`.
    async fn place_initial_influence(
        &self,
        player: PlayerId,
        placements: &InitialInfluencePlacements,
    ) -> Result<InitialInfluenceResponse, ClientError>;

    /// `POST /game/action/playInfluenceCard`.
    async fn play_influence(&self, request: &PlayInfluenceRequest) -> Result<(), ClientError>;

    /// `POST /game/action/voteOfConfidence`.
    async fn vote_of_confidence(&self, request: &VoteRequest) -> Result<VoteResponse, ClientError>;

    /// `POST /game/action/playAction`.
    async fn play_action(&self, request: &PlayActionRequest) -> Result<(), ClientError>;
}
