//! Placement legality for staged moves.
//!
//! These are the only rules the client enforces itself: whether a pending
//! local placement or removal is legal before anything is submitted. The
//! server remains the arbiter of everything else.

use super::availability::GameAction;
use super::placement::StagedPlacementStore;
use super::types::{
    CardId, CardKind, CardRef, Patrician, PendingSelection, Phase, SubmissionKind, TurnState,
};
use tracing::{instrument, warn};

/// Most influence cards a player may stage in one standard-play turn.
pub const STANDARD_PLAY_CAPACITY: usize = 2;

/// A local move rejected before it reaches the server.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum RuleViolation {
    /// The turn already holds the maximum number of staged cards.
    #[display("You can only place up to {limit} influence cards per turn")]
    CapacityExceeded {
        /// The per-turn cap.
        limit: usize,
    },

    /// The card is not in the visible hand.
    #[display("Card {_0} is not in your hand")]
    CardNotInHand(CardId),

    /// The card is already staged on a patrician.
    #[display("Card {_0} is already placed")]
    CardAlreadyStaged(CardId),

    /// Only influence cards go on patricians.
    #[display("Card {_0} is not an influence card")]
    NotAnInfluenceCard(CardId),

    /// No staged record matches the card and slot.
    #[display("Card {card} is not staged on {slot}")]
    NotStaged {
        /// The card asked for.
        card: CardId,
        /// The slot asked for.
        slot: Patrician,
    },

    /// Placements are only accepted while the local player is placing.
    #[display("Cannot change placements while {_0}")]
    NotPlacing(TurnState),

    /// The requested action is not enabled right now.
    #[display("{_0} is not available right now")]
    ActionUnavailable(GameAction),

    /// The operation belongs to another phase.
    #[display("Not allowed during {_0}")]
    WrongPhase(Phase),

    /// A follow-up submission arrived with no matching selection open.
    #[display("No {_0} selection is pending")]
    SelectionNotPending(SubmissionKind),

    /// Staging is frozen until the open follow-up selection is finished.
    #[display("Finish or cancel the {_0} selection first")]
    SelectionOpen(PendingSelection),
}

impl std::error::Error for RuleViolation {}

/// Outcome of a legal placement check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementVerdict {
    /// Face the new card takes.
    pub face_up: bool,
    /// Card already on the slot that goes back to hand first.
    pub evicts: Option<CardId>,
}

/// Everything a placement check reads.
#[derive(Debug, Clone, Copy)]
pub struct PlacementContext<'a> {
    /// Active phase.
    pub phase: Phase,
    /// Current staged records.
    pub staged: &'a StagedPlacementStore,
    /// Visible hand, one entry removed per staged record.
    pub hand: &'a [CardRef],
    /// Cards the server still accepts this standard-play turn.
    pub capacity: usize,
}

// ─────────────────────────────────────────────────────────────
//  Placement preconditions
// ─────────────────────────────────────────────────────────────

/// Precondition: the card is in the visible hand.
pub struct CardInHand;

impl CardInHand {
    /// Rejects staged cards and cards outside the visible hand.
    ///
    /// Holding is counted per copy: the visible hand already has one entry
    /// removed for each staged record, so an unstaged duplicate still counts
    /// as held. An id that is already staged stays rejected either way.
    #[instrument(skip(ctx))]
    pub fn check(card: &CardId, ctx: &PlacementContext<'_>) -> Result<(), RuleViolation> {
        if ctx.staged.contains_card(card) {
            return Err(RuleViolation::CardAlreadyStaged(card.clone()));
        }
        if ctx.hand.iter().any(|held| &held.id == card) {
            Ok(())
        } else {
            Err(RuleViolation::CardNotInHand(card.clone()))
        }
    }
}

/// Precondition: the card is an influence card.
pub struct InfluenceOnly;

impl InfluenceOnly {
    /// Rejects action cards.
    #[instrument(skip(ctx))]
    pub fn check(card: &CardId, ctx: &PlacementContext<'_>) -> Result<(), RuleViolation> {
        let is_influence = ctx
            .hand
            .iter()
            .filter(|held| &held.id == card)
            .any(|held| held.kind == CardKind::Influence);
        if is_influence {
            Ok(())
        } else {
            Err(RuleViolation::NotAnInfluenceCard(card.clone()))
        }
    }
}

/// Precondition: the turn has room for another staged card.
pub struct WithinTurnCapacity;

impl WithinTurnCapacity {
    /// Rejects cards beyond the turn's remaining capacity in standard play.
    #[instrument(skip(ctx))]
    pub fn check(ctx: &PlacementContext<'_>) -> Result<(), RuleViolation> {
        if ctx.phase == Phase::StandardPlay && ctx.staged.len() >= ctx.capacity {
            warn!(staged = ctx.staged.len(), capacity = ctx.capacity, "Turn capacity reached");
            Err(RuleViolation::CapacityExceeded {
                limit: ctx.capacity,
            })
        } else {
            Ok(())
        }
    }
}

/// Composite precondition for placing `card` on `slot`.
pub struct LegalPlacement;

impl LegalPlacement {
    /// Validates all preconditions and decides face and eviction.
    #[instrument(skip(ctx), fields(phase = %ctx.phase, staged = ctx.staged.len()))]
    pub fn check(
        card: &CardId,
        slot: Patrician,
        ctx: &PlacementContext<'_>,
    ) -> Result<PlacementVerdict, RuleViolation> {
        CardInHand::check(card, ctx)?;
        InfluenceOnly::check(card, ctx)?;
        WithinTurnCapacity::check(ctx)?;

        let verdict = match ctx.phase {
            Phase::InitialPlacement => PlacementVerdict {
                face_up: false,
                evicts: ctx.staged.for_slot(slot).map(|record| record.card_id.clone()),
            },
            Phase::StandardPlay => PlacementVerdict {
                face_up: StagedPlacementStore::face_for_position(ctx.staged.len()),
                evicts: None,
            },
        };
        Ok(verdict)
    }
}

/// Decides whether `card` may be staged on `slot`.
pub fn can_place(
    card: &CardId,
    slot: Patrician,
    ctx: &PlacementContext<'_>,
) -> Result<PlacementVerdict, RuleViolation> {
    LegalPlacement::check(card, slot, ctx)
}

/// Decides whether the staged `card` may be taken back off `slot`.
#[instrument(skip(staged))]
pub fn can_remove(
    phase: Phase,
    turn_state: TurnState,
    staged: &StagedPlacementStore,
    card: &CardId,
    slot: Patrician,
) -> Result<(), RuleViolation> {
    if phase == Phase::InitialPlacement && turn_state != TurnState::Placing {
        return Err(RuleViolation::NotPlacing(turn_state));
    }
    let is_staged = staged
        .list()
        .iter()
        .any(|record| &record.card_id == card && record.slot == slot);
    if is_staged {
        Ok(())
    } else {
        Err(RuleViolation::NotStaged {
            card: card.clone(),
            slot,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::placement::PlacementRecord;
    use crate::game::types::starting_hand;

    fn visible(hand: &[CardRef], staged: &StagedPlacementStore) -> Vec<CardRef> {
        staged.remaining_hand(hand.to_vec())
    }

    #[test]
    fn test_initial_placement_evicts_occupant() {
        let mut staged = StagedPlacementStore::new();
        staged.add(PlacementRecord::new(CardId::new("ONE"), Patrician::Consul, false));
        let hand = visible(&starting_hand(), &staged);
        let ctx = PlacementContext {
            phase: Phase::InitialPlacement,
            staged: &staged,
            hand: &hand,
            capacity: STANDARD_PLAY_CAPACITY,
        };

        let verdict = can_place(&CardId::new("TWO"), Patrician::Consul, &ctx).unwrap();

        assert_eq!(verdict.evicts, Some(CardId::new("ONE")));
        assert!(!verdict.face_up);
    }

    #[test]
    fn test_standard_play_capacity() {
        let mut staged = StagedPlacementStore::new();
        staged.add(PlacementRecord::new(CardId::new("ONE"), Patrician::Aedile, false));
        staged.add(PlacementRecord::new(CardId::new("TWO"), Patrician::Aedile, true));
        let hand = vec![CardRef::influence("THREE")];
        let ctx = PlacementContext {
            phase: Phase::StandardPlay,
            staged: &staged,
            hand: &hand,
            capacity: STANDARD_PLAY_CAPACITY,
        };

        assert_eq!(
            can_place(&CardId::new("THREE"), Patrician::Censor, &ctx),
            Err(RuleViolation::CapacityExceeded { limit: 2 })
        );
    }

    #[test]
    fn test_standard_play_face_follows_position() {
        let mut staged = StagedPlacementStore::new();
        let hand = vec![CardRef::influence("ONE"), CardRef::influence("TWO")];
        let ctx = PlacementContext {
            phase: Phase::StandardPlay,
            staged: &staged,
            hand: &hand,
            capacity: STANDARD_PLAY_CAPACITY,
        };
        assert!(!can_place(&CardId::new("ONE"), Patrician::Aedile, &ctx).unwrap().face_up);

        staged.add(PlacementRecord::new(CardId::new("ONE"), Patrician::Aedile, false));
        let hand = visible(&hand, &staged);
        let ctx = PlacementContext {
            phase: Phase::StandardPlay,
            staged: &staged,
            hand: &hand,
            capacity: STANDARD_PLAY_CAPACITY,
        };
        assert!(can_place(&CardId::new("TWO"), Patrician::Aedile, &ctx).unwrap().face_up);
    }

    #[test]
    fn test_rejects_cards_outside_hand_and_action_cards() {
        let staged = StagedPlacementStore::new();
        let hand = vec![CardRef::influence("ONE"), CardRef::action("SCOUT")];
        let ctx = PlacementContext {
            phase: Phase::StandardPlay,
            staged: &staged,
            hand: &hand,
            capacity: STANDARD_PLAY_CAPACITY,
        };

        assert_eq!(
            can_place(&CardId::new("FIVE"), Patrician::Aedile, &ctx),
            Err(RuleViolation::CardNotInHand(CardId::new("FIVE")))
        );
        assert_eq!(
            can_place(&CardId::new("SCOUT"), Patrician::Aedile, &ctx),
            Err(RuleViolation::NotAnInfluenceCard(CardId::new("SCOUT")))
        );
    }

    #[test]
    fn test_already_staged_card_is_rejected() {
        let mut staged = StagedPlacementStore::new();
        staged.add(PlacementRecord::new(CardId::new("ONE"), Patrician::Aedile, false));
        let hand = starting_hand();
        let ctx = PlacementContext {
            phase: Phase::InitialPlacement,
            staged: &staged,
            hand: &hand,
            capacity: STANDARD_PLAY_CAPACITY,
        };

        assert_eq!(
            can_place(&CardId::new("ONE"), Patrician::Censor, &ctx),
            Err(RuleViolation::CardAlreadyStaged(CardId::new("ONE")))
        );
    }

    #[test]
    fn test_duplicate_copy_counts_as_held() {
        let mut staged = StagedPlacementStore::new();
        staged.add(PlacementRecord::new(CardId::new("THREE"), Patrician::Consul, false));
        let hand = visible(
            &[
                CardRef::influence("THREE"),
                CardRef::influence("THREE"),
                CardRef::influence("ONE"),
            ],
            &staged,
        );
        let ctx = PlacementContext {
            phase: Phase::StandardPlay,
            staged: &staged,
            hand: &hand,
            capacity: STANDARD_PLAY_CAPACITY,
        };

        assert!(InfluenceOnly::check(&CardId::new("THREE"), &ctx).is_ok());
        assert_eq!(
            can_place(&CardId::new("THREE"), Patrician::Aedile, &ctx),
            Err(RuleViolation::CardAlreadyStaged(CardId::new("THREE")))
        );
        assert!(can_place(&CardId::new("ONE"), Patrician::Aedile, &ctx).is_ok());
    }

    #[test]
    fn test_capacity_shrinks_with_cards_already_played() {
        let mut staged = StagedPlacementStore::new();
        staged.add(PlacementRecord::new(CardId::new("ONE"), Patrician::Aedile, false));
        let hand = vec![CardRef::influence("TWO")];
        let ctx = PlacementContext {
            phase: Phase::StandardPlay,
            staged: &staged,
            hand: &hand,
            capacity: 1,
        };

        assert_eq!(
            can_place(&CardId::new("TWO"), Patrician::Censor, &ctx),
            Err(RuleViolation::CapacityExceeded { limit: 1 })
        );
    }

    #[test]
    fn test_can_remove() {
        let mut staged = StagedPlacementStore::new();
        staged.add(PlacementRecord::new(CardId::new("ONE"), Patrician::Aedile, false));
        let one = CardId::new("ONE");

        assert!(can_remove(Phase::StandardPlay, TurnState::Placing, &staged, &one, Patrician::Aedile).is_ok());
        assert!(can_remove(Phase::InitialPlacement, TurnState::Placing, &staged, &one, Patrician::Aedile).is_ok());
        assert_eq!(
            can_remove(Phase::InitialPlacement, TurnState::Idle, &staged, &one, Patrician::Aedile),
            Err(RuleViolation::NotPlacing(TurnState::Idle))
        );
        assert_eq!(
            can_remove(Phase::StandardPlay, TurnState::Placing, &staged, &one, Patrician::Censor),
            Err(RuleViolation::NotStaged {
                card: one.clone(),
                slot: Patrician::Censor
            })
        );
    }
}
