//! Which action controls are enabled.

use super::types::{Phase, TurnState};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum::{Display, EnumIter, EnumString};
use tracing::{debug, instrument};

/// An action control the rendering layer can show as a button.
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
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum GameAction {
    /// Submit the five initial influence placements.
    SubmitInitialInfluence,
    /// Submit staged influence and call a vote of confidence.
    EndTurn,
    /// Submit staged influence and play an action card.
    PlayActionCard,
    /// Go straight to action card selection without placing influence.
    SkipToAction,
}

impl GameAction {
    /// Button caption.
    pub fn label(self) -> &'static str {
        match self {
            GameAction::SubmitInitialInfluence => "Submit Initial Influence",
            GameAction::EndTurn => "End Turn (Vote of Confidence)",
            GameAction::PlayActionCard => "Play Action Card",
            GameAction::SkipToAction => "Skip to Action Phase",
        }
    }

    /// Styling hint for the button.
    pub fn css_class(self) -> &'static str {
        match self {
            GameAction::SubmitInitialInfluence | GameAction::EndTurn => "primary-button",
            GameAction::PlayActionCard | GameAction::SkipToAction => "secondary-button",
        }
    }
}

/// Maps turn state, phase and staging progress to the enabled action set.
///
/// Outside [`TurnState::Placing`] nothing is enabled. While placing:
///
/// | Phase            | Condition          | Enabled                    |
/// |------------------|--------------------|----------------------------|
/// | InitialPlacement | hand empty         | SubmitInitialInfluence     |
/// | InitialPlacement | hand non-empty     | none                       |
/// | StandardPlay     | nothing staged     | SkipToAction               |
/// | StandardPlay     | one or more staged | EndTurn, PlayActionCard    |
#[instrument]
pub fn derive_actions(
    turn_state: TurnState,
    phase: Phase,
    staged: usize,
    hand_remaining: usize,
) -> BTreeSet<GameAction> {
    let mut actions = BTreeSet::new();
    if turn_state != TurnState::Placing {
        return actions;
    }
    match phase {
        Phase::InitialPlacement => {
            if hand_remaining == 0 {
                actions.insert(GameAction::SubmitInitialInfluence);
            }
        }
        Phase::StandardPlay => {
            if staged == 0 {
                actions.insert(GameAction::SkipToAction);
            } else {
                actions.insert(GameAction::EndTurn);
                actions.insert(GameAction::PlayActionCard);
            }
        }
    }
    debug!(?actions, "Derived available actions");
    actions
}
