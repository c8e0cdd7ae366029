//! Declarative render contract projected from machine state.
//!
//! The projection is a pure function of [`TurnStateMachine`]; the rendering
//! layer never reads the machine directly.

use super::availability::GameAction;
use super::machine::TurnStateMachine;
use super::snapshot::{AuthoritativeSnapshot, InfluenceEntry};
use super::types::{CardRef, Patrician, Phase, PlayerId, TurnState};
use serde::Serialize;

/// Status banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusView {
    /// Headline, e.g. "Standard Play - Turn 3 - CAESAR's turn".
    pub title: String,
    /// Secondary line.
    pub turn_info: String,
}

/// A card shown in an influence stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacedCardView {
    /// Asset actually drawn.
    pub src: String,
    /// True face, kept for hover reveal when `src` is a card back.
    pub actual: Option<String>,
    /// Whether the card is face up.
    pub face_up: bool,
    /// Whether the card is a local staged placement.
    pub staged: bool,
}

/// One patrician column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatricianView {
    /// Slot the column represents.
    pub slot: Patrician,
    /// Display name.
    pub name: &'static str,
    /// Board image.
    pub image: String,
    /// Patrician cards of this type left.
    pub remaining: u32,
    /// Opponent stack, face-down cards as backs.
    pub opponent_influence: Vec<String>,
    /// Own stack: played cards, then staged ones.
    pub player_influence: Vec<PlacedCardView>,
}

/// A card in the rendered hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandCardView {
    /// The card.
    pub card: CardRef,
    /// Face asset.
    pub asset: String,
}

/// An action button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ButtonView {
    /// Action the button triggers.
    pub action: GameAction,
    /// Caption.
    pub label: &'static str,
    /// Styling hint.
    pub css_class: &'static str,
    /// Whether the button is greyed out.
    pub disabled: bool,
}

/// Deck and pile counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeckCounts {
    /// Acting player's action deck.
    pub player_action: u32,
    /// Acting player's influence deck.
    pub player_influence: u32,
    /// Shared discard pile.
    pub discard_pile: u32,
    /// Bust bag.
    pub bust_bag: u32,
    /// Opponent hand size.
    pub opponent_hand: u32,
    /// Opponent action deck.
    pub opponent_action: u32,
    /// Opponent influence deck.
    pub opponent_influence: u32,
}

impl From<&AuthoritativeSnapshot> for DeckCounts {
    fn from(snapshot: &AuthoritativeSnapshot) -> Self {
        Self {
            player_action: snapshot.player_action_deck_size,
            player_influence: snapshot.player_influence_deck_size,
            discard_pile: snapshot.discard_pile_size,
            bust_bag: snapshot.bust_bag_size,
            opponent_hand: snapshot.opponent_hand_size,
            opponent_action: snapshot.opponent_action_deck_size,
            opponent_influence: snapshot.opponent_influence_deck_size,
        }
    }
}

/// Everything the rendering layer draws.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardView {
    /// Status banner.
    pub status: StatusView,
    /// Active phase, if known.
    pub phase: Option<Phase>,
    /// Machine turn state.
    #[serde(serialize_with = "serialize_display")]
    pub turn_state: TurnState,
    /// Player the board is drawn for.
    pub viewer: Option<PlayerId>,
    /// Patrician columns in board order.
    pub patricians: Vec<PatricianView>,
    /// Visible hand.
    pub hand: Vec<HandCardView>,
    /// Action buttons.
    pub buttons: Vec<ButtonView>,
    /// Deck counters.
    pub counts: DeckCounts,
}

fn serialize_display<S: serde::Serializer>(
    value: &TurnState,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

impl BoardView {
    /// Projects `machine` into a board view.
    pub fn project(machine: &TurnStateMachine) -> Self {
        let viewer = machine.acting_player();
        let Some(snapshot) = machine.snapshot() else {
            return Self {
                status: StatusView {
                    title: "Connecting...".to_string(),
                    turn_info: String::new(),
                },
                phase: None,
                turn_state: machine.turn_state(),
                viewer,
                patricians: Vec::new(),
                hand: Vec::new(),
                buttons: Vec::new(),
                counts: DeckCounts::default(),
            };
        };
        let viewer_id = viewer.unwrap_or(snapshot.current_player);

        Self {
            status: status(snapshot, machine),
            phase: Some(snapshot.game_mode),
            turn_state: machine.turn_state(),
            viewer,
            patricians: Patrician::all()
                .into_iter()
                .map(|slot| patrician_column(snapshot, machine, viewer_id, slot))
                .collect(),
            hand: machine
                .visible_hand()
                .into_iter()
                .map(|card| HandCardView {
                    asset: card.asset(),
                    card,
                })
                .collect(),
            buttons: buttons(machine, snapshot.game_mode),
            counts: DeckCounts::from(snapshot),
        }
    }
}

fn status(snapshot: &AuthoritativeSnapshot, machine: &TurnStateMachine) -> StatusView {
    let current = snapshot.current_player;
    match snapshot.game_mode {
        Phase::InitialPlacement => StatusView {
            title: "Initial Influence Placement Phase".to_string(),
            turn_info: if machine.turn_state() == TurnState::Placing {
                format!("{current}'s turn to place initial influence")
            } else {
                format!("Waiting for {current} to place initial influence")
            },
        },
        Phase::StandardPlay => StatusView {
            title: match snapshot.turn_number {
                Some(turn) => format!("Standard Play - Turn {turn} - {current}'s turn"),
                None => format!("Standard Play - {current}'s turn"),
            },
            turn_info: match machine.turn_state() {
                TurnState::Placing => "Select cards to play".to_string(),
                TurnState::Submitting(kind) => format!("Submitting {kind}..."),
                TurnState::AwaitingRefresh => "Waiting for the server...".to_string(),
                TurnState::Idle => format!("Waiting for {current}"),
            },
        },
    }
}

fn played_card(entry: &InfluenceEntry, owner: PlayerId, reveal: bool) -> PlacedCardView {
    if entry.face_up {
        PlacedCardView {
            src: entry.face_asset(),
            actual: None,
            face_up: true,
            staged: false,
        }
    } else {
        PlacedCardView {
            src: owner.card_back(),
            actual: reveal.then(|| entry.face_asset()),
            face_up: false,
            staged: false,
        }
    }
}

fn patrician_column(
    snapshot: &AuthoritativeSnapshot,
    machine: &TurnStateMachine,
    viewer: PlayerId,
    slot: Patrician,
) -> PatricianView {
    let entry = snapshot.board_entry(slot);
    let opponent = viewer.opponent();

    let opponent_influence = entry
        .stack(opponent)
        .iter()
        .map(|card| played_card(card, opponent, false).src)
        .collect();

    let mut player_influence: Vec<PlacedCardView> = entry
        .stack(viewer)
        .iter()
        .map(|card| played_card(card, viewer, true))
        .collect();
    player_influence.extend(
        machine
            .staged()
            .list()
            .iter()
            .filter(|record| record.slot == slot)
            .map(|record| {
                let face = CardRef::influence(record.card_id.clone()).asset();
                PlacedCardView {
                    src: if record.face_up {
                        face.clone()
                    } else {
                        viewer.card_back()
                    },
                    actual: Some(face),
                    face_up: record.face_up,
                    staged: true,
                }
            }),
    );

    PatricianView {
        slot,
        name: slot.label(),
        image: slot.image(),
        remaining: entry.remaining,
        opponent_influence,
        player_influence,
    }
}

fn buttons(machine: &TurnStateMachine, phase: Phase) -> Vec<ButtonView> {
    if machine.turn_state() != TurnState::Placing {
        return Vec::new();
    }
    let available = machine.available_actions();
    let button = |action: GameAction| ButtonView {
        action,
        label: action.label(),
        css_class: action.css_class(),
        disabled: !available.contains(&action),
    };
    match phase {
        Phase::InitialPlacement => vec![button(GameAction::SubmitInitialInfluence)],
        Phase::StandardPlay => available.iter().copied().map(button).collect(),
    }
}
