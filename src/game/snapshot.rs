//! Authoritative game state as served by `GET /game`.
//!
//! The client treats a snapshot as read-only and replaces it wholesale on
//! every accepted fetch. Every field except the current player and the game
//! mode is optional on the wire so that older servers still parse.

use super::types::{CardKind, CardRef, Patrician, Phase, PlayerId, starting_hand};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Turn phase within standard play, as tracked by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TurnPhase {
    /// Choosing the first card (face-down influence or action).
    FirstCardSelection,
    /// Optionally choosing a second card (face-up influence or action).
    SecondCardSelection,
    /// Vote of confidence pending.
    VoteOfConfidence,
    /// Drawing back up to the hand limit.
    DrawPhase,
}

/// One influence card played on a patrician.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfluenceEntry {
    /// Whether the card is face up.
    pub face_up: bool,
    /// Influence card type, e.g. "THREE".
    #[serde(rename = "type")]
    pub card_type: String,
}

impl InfluenceEntry {
    /// Face asset of the played card.
    pub fn face_asset(&self) -> String {
        CardRef::influence(self.card_type.as_str()).asset()
    }
}

/// Board entry for one patrician type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatricianBoardEntry {
    /// Patrician cards of this type still on the board.
    #[serde(default)]
    pub remaining: u32,
    /// Played influence stacks per player.
    #[serde(default)]
    pub influence: HashMap<PlayerId, Vec<InfluenceEntry>>,
}

impl PatricianBoardEntry {
    /// Influence stack played by `player`.
    pub fn stack(&self, player: PlayerId) -> &[InfluenceEntry] {
        self.influence.get(&player).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Immutable-per-fetch server state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthoritativeSnapshot {
    /// Player whose turn it is.
    pub current_player: PlayerId,
    /// Current game mode.
    pub game_mode: Phase,
    /// True while the current player still owes initial influence.
    #[serde(default)]
    pub waiting_for_initial_influence: bool,
    /// Server-side turn phase during standard play.
    #[serde(default)]
    pub turn_phase: Option<TurnPhase>,
    /// Turn counter.
    #[serde(default)]
    pub turn_number: Option<u32>,
    /// Cards already played by the current player this turn.
    #[serde(default)]
    pub cards_played_this_turn: Option<u32>,
    /// Whether the server accepts more cards this turn.
    #[serde(default)]
    pub can_play_more_cards: Option<bool>,
    /// Per-patrician board state.
    #[serde(default)]
    pub patrician_board: HashMap<Patrician, PatricianBoardEntry>,
    /// Current player's hand.
    #[serde(default)]
    pub current_player_hand: Vec<CardRef>,
    /// Cards left in the current player's action deck.
    #[serde(default)]
    pub player_action_deck_size: u32,
    /// Cards left in the current player's influence deck.
    #[serde(default)]
    pub player_influence_deck_size: u32,
    /// Cards in the shared discard pile.
    #[serde(default)]
    pub discard_pile_size: u32,
    /// Busts left in the bag.
    #[serde(default)]
    pub bust_bag_size: u32,
    /// Cards in the opponent's hand.
    #[serde(default)]
    pub opponent_hand_size: u32,
    /// Cards left in the opponent's action deck.
    #[serde(default)]
    pub opponent_action_deck_size: u32,
    /// Cards left in the opponent's influence deck.
    #[serde(default)]
    pub opponent_influence_deck_size: u32,
}

impl AuthoritativeSnapshot {
    /// Creates a bare snapshot with an empty board.
    pub fn new(current_player: PlayerId, game_mode: Phase) -> Self {
        Self {
            current_player,
            game_mode,
            waiting_for_initial_influence: false,
            turn_phase: None,
            turn_number: None,
            cards_played_this_turn: None,
            can_play_more_cards: None,
            patrician_board: HashMap::new(),
            current_player_hand: Vec::new(),
            player_action_deck_size: 0,
            player_influence_deck_size: 0,
            discard_pile_size: 0,
            bust_bag_size: 0,
            opponent_hand_size: 0,
            opponent_action_deck_size: 0,
            opponent_influence_deck_size: 0,
        }
    }

    /// Board entry for a patrician, empty if the server omitted it.
    pub fn board_entry(&self, patrician: Patrician) -> PatricianBoardEntry {
        self.patrician_board.get(&patrician).cloned().unwrap_or_default()
    }

    /// Whether `player` is the one the server expects to act right now.
    pub fn awaits_action_from(&self, player: PlayerId) -> bool {
        if self.current_player != player {
            return false;
        }
        match self.game_mode {
            Phase::InitialPlacement => self.waiting_for_initial_influence,
            Phase::StandardPlay => true,
        }
    }

    /// Cards the local player holds this phase, before staging.
    ///
    /// Initial placement always deals the fixed starting set; the server
    /// hand is only read during standard play.
    pub fn hand(&self) -> Vec<CardRef> {
        match self.game_mode {
            Phase::InitialPlacement if self.waiting_for_initial_influence => starting_hand(),
            Phase::InitialPlacement => Vec::new(),
            Phase::StandardPlay => self.current_player_hand.clone(),
        }
    }

    /// Influence cards the current player may still stage this turn.
    ///
    /// Starts from `limit` and subtracts cards the server already counted.
    /// Nothing is left once the server reports the turn closed or past card
    /// selection. Servers that omit these fields leave the full `limit`.
    pub fn remaining_capacity(&self, limit: usize) -> usize {
        let past_selection = matches!(
            self.turn_phase,
            Some(TurnPhase::VoteOfConfidence | TurnPhase::DrawPhase)
        );
        if past_selection || self.can_play_more_cards == Some(false) {
            return 0;
        }
        let played = self.cards_played_this_turn.unwrap_or(0) as usize;
        limit.saturating_sub(played)
    }

    /// Action cards in the current player's hand.
    pub fn action_cards(&self) -> Vec<CardRef> {
        self.current_player_hand
            .iter()
            .filter(|card| card.kind == CardKind::Action)
            .cloned()
            .collect()
    }
}
