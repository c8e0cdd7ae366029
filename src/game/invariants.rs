//! First-class invariants over staged placements.
//!
//! Invariants are logical properties that must hold after every mutation of
//! the staged store. They are checked in debug builds by the turn machine and
//! can be tested independently.

use super::placement::{PlacementRecord, StagedPlacementStore};
use super::rules::STANDARD_PLAY_CAPACITY;
use super::types::Phase;
use std::collections::HashSet;

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// A set of invariants that can be checked together.
pub trait InvariantSet<S> {
    /// Checks all invariants in the set, collecting every violation.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

fn collect<S>(checks: &[(fn(&S) -> bool, fn() -> &'static str)], state: &S) -> Result<(), Vec<InvariantViolation>> {
    let violations: Vec<_> = checks
        .iter()
        .filter(|(holds, _)| !holds(state))
        .map(|(_, description)| InvariantViolation::new(description()))
        .collect();
    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

impl<S, I1, I2> InvariantSet<S> for (I1, I2)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        collect(
            &[(I1::holds, I1::description), (I2::holds, I2::description)],
            state,
        )
    }
}

impl<S, I1, I2, I3, I4> InvariantSet<S> for (I1, I2, I3, I4)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
    I3: Invariant<S>,
    I4: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        collect(
            &[
                (I1::holds, I1::description),
                (I2::holds, I2::description),
                (I3::holds, I3::description),
                (I4::holds, I4::description),
            ],
            state,
        )
    }
}

/// Staged records seen together with the phase that governs them.
#[derive(Debug, Clone, Copy)]
pub struct Staging<'a> {
    /// Active phase.
    pub phase: Phase,
    /// Staged records.
    pub store: &'a StagedPlacementStore,
}

impl<'a> Staging<'a> {
    /// Pairs a store with its phase.
    pub fn new(phase: Phase, store: &'a StagedPlacementStore) -> Self {
        Self { phase, store }
    }

    fn records(&self) -> &'a [PlacementRecord] {
        self.store.list()
    }
}

/// Invariant: no card is staged twice.
pub struct UniqueCardInvariant;

impl Invariant<Staging<'_>> for UniqueCardInvariant {
    fn holds(state: &Staging<'_>) -> bool {
        let mut seen = HashSet::new();
        state.records().iter().all(|record| seen.insert(&record.card_id))
    }

    fn description() -> &'static str {
        "Each card is staged at most once"
    }
}

/// Invariant: standard play never stages more than the per-turn cap.
pub struct CapacityInvariant;

impl Invariant<Staging<'_>> for CapacityInvariant {
    fn holds(state: &Staging<'_>) -> bool {
        state.phase != Phase::StandardPlay || state.records().len() <= STANDARD_PLAY_CAPACITY
    }

    fn description() -> &'static str {
        "Standard play stages at most two cards per turn"
    }
}

/// Invariant: faces follow placement order.
///
/// Standard play: first record face down, second face up.
/// Initial placement: every record face down.
pub struct FaceOrderInvariant;

impl Invariant<Staging<'_>> for FaceOrderInvariant {
    fn holds(state: &Staging<'_>) -> bool {
        state
            .records()
            .iter()
            .enumerate()
            .all(|(position, record)| match state.phase {
                Phase::InitialPlacement => !record.face_up,
                Phase::StandardPlay => {
                    record.face_up == StagedPlacementStore::face_for_position(position)
                }
            })
    }

    fn description() -> &'static str {
        "Faces are assigned by placement position"
    }
}

/// Invariant: initial placement holds at most one card per slot.
pub struct SingleOccupancyInvariant;

impl Invariant<Staging<'_>> for SingleOccupancyInvariant {
    fn holds(state: &Staging<'_>) -> bool {
        if state.phase != Phase::InitialPlacement {
            return true;
        }
        let mut seen = HashSet::new();
        state.records().iter().all(|record| seen.insert(record.slot))
    }

    fn description() -> &'static str {
        "Initial placement holds one card per patrician"
    }
}

/// Every staging invariant as a composable set.
pub type StagingInvariants = (
    UniqueCardInvariant,
    CapacityInvariant,
    FaceOrderInvariant,
    SingleOccupancyInvariant,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::types::{CardId, Patrician};

    fn store(records: &[(&str, Patrician, bool)]) -> StagedPlacementStore {
        let mut store = StagedPlacementStore::new();
        for (card, slot, face_up) in records {
            store.add(PlacementRecord::new(CardId::new(card), *slot, *face_up));
        }
        store
    }

    #[test]
    fn test_invariant_set_holds_for_legal_staging() {
        let staged = store(&[("ONE", Patrician::Aedile, false), ("TWO", Patrician::Aedile, true)]);
        assert!(StagingInvariants::check_all(&Staging::new(Phase::StandardPlay, &staged)).is_ok());

        let staged = store(&[("ONE", Patrician::Aedile, false), ("TWO", Patrician::Censor, false)]);
        assert!(StagingInvariants::check_all(&Staging::new(Phase::InitialPlacement, &staged)).is_ok());
    }

    #[test]
    fn test_detects_wrong_face_order() {
        let staged = store(&[("ONE", Patrician::Aedile, true)]);
        assert!(!FaceOrderInvariant::holds(&Staging::new(Phase::StandardPlay, &staged)));
        assert!(!FaceOrderInvariant::holds(&Staging::new(Phase::InitialPlacement, &staged)));
    }

    #[test]
    fn test_detects_double_occupancy_and_duplicates() {
        let staged = store(&[("ONE", Patrician::Consul, false), ("ONE", Patrician::Consul, false)]);
        let result = StagingInvariants::check_all(&Staging::new(Phase::InitialPlacement, &staged));

        let violations = result.unwrap_err();
        assert_eq!(violations.len(), 2);
    }

    #[test]
    fn test_detects_capacity_overflow() {
        let staged = store(&[
            ("ONE", Patrician::Aedile, false),
            ("TWO", Patrician::Aedile, true),
            ("THREE", Patrician::Aedile, true),
        ]);
        type TwoInvariants = (CapacityInvariant, UniqueCardInvariant);
        let violations = TwoInvariants::check_all(&Staging::new(Phase::StandardPlay, &staged)).unwrap_err();
        assert_eq!(violations, vec![InvariantViolation::new(CapacityInvariant::description())]);
    }
}
