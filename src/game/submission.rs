//! Outgoing submission payloads built by the turn machine.
//!
//! Field names and casing match the backend action endpoints exactly.

use super::placement::{PlacementRecord, StagedPlacementStore};
use super::types::{CardId, Patrician, PlayerId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Body of `POST /game/action/placeInitialInfluence`.
///
/// Serializes as a flat map such as `{"QUAESTOR": "ONE", ...}`.
pub type InitialInfluencePlacements = BTreeMap<Patrician, CardId>;

/// One influence card assigned to a patrician.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    /// Card being played.
    pub influence_card_id: CardId,
    /// Target patrician.
    pub patrician_type: Patrician,
}

/// Body of `POST /game/action/playInfluenceCard`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayInfluenceRequest {
    /// Submitting player.
    pub player_id: PlayerId,
    /// First staged card, played face down.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_down_assignment: Option<Assignment>,
    /// Second staged card, played face up.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_up_assignment: Option<Assignment>,
}

impl PlayInfluenceRequest {
    /// Builds the request from the staged records.
    pub fn from_staged(player_id: PlayerId, staged: &StagedPlacementStore) -> Self {
        let assign = |record: &PlacementRecord| Assignment {
            influence_card_id: record.card_id.clone(),
            patrician_type: record.slot,
        };
        Self {
            player_id,
            face_down_assignment: staged.face_down().map(assign),
            face_up_assignment: staged.face_up().map(assign),
        }
    }
}

/// Body of `POST /game/action/voteOfConfidence`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    /// Player calling the vote.
    pub player_id: PlayerId,
    /// Patrician put to the vote.
    pub patrician_type: Patrician,
}

/// Body of `POST /game/action/playAction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayActionRequest {
    /// Player playing the card.
    pub player_id: PlayerId,
    /// Action card from the hand.
    pub card_id: CardId,
    /// Optional patrician the action targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patrician_type: Option<Patrician>,
}

/// An influence request the controller must send on behalf of the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Initial influence for `player`.
    InitialInfluence {
        /// Submitting player, sent as the `playerId` query parameter.
        player: PlayerId,
        /// One card per patrician.
        placements: InitialInfluencePlacements,
    },
    /// Staged standard-play influence.
    Influence(PlayInfluenceRequest),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_play_influence_wire_shape() {
        let mut staged = StagedPlacementStore::new();
        staged.add(PlacementRecord::new(CardId::new("THREE"), Patrician::Praetor, false));

        let request = PlayInfluenceRequest::from_staged(PlayerId::Cleopatra, &staged);

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "playerId": "CLEOPATRA",
                "faceDownAssignment": {"influenceCardId": "THREE", "patricianType": "PRAETOR"}
            })
        );
    }

    #[test]
    fn test_initial_placements_wire_shape() {
        let placements: InitialInfluencePlacements = [
            (Patrician::Censor, CardId::new("FIVE")),
            (Patrician::Quaestor, CardId::new("ONE")),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            serde_json::to_value(&placements).unwrap(),
            json!({"QUAESTOR": "ONE", "CENSOR": "FIVE"})
        );
    }
}
