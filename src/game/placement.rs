//! Staged (not yet submitted) placements for the current turn.

use super::types::{CardId, CardRef, Patrician, Phase};
use derive_new::new;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// A client-local card-to-slot assignment awaiting submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, new)]
pub struct PlacementRecord {
    /// The staged card.
    pub card_id: CardId,
    /// Target patrician slot.
    pub slot: Patrician,
    /// Whether the card goes down face up.
    pub face_up: bool,
}

impl std::fmt::Display for PlacementRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let face = if self.face_up { "face up" } else { "face down" };
        write!(f, "{} -> {} ({})", self.card_id, self.slot, face)
    }
}

/// Ordered sequence of staged placements, owned by the turn machine.
///
/// The store performs no legality checks of its own; the machine consults
/// the rule engine before calling [`StagedPlacementStore::add`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedPlacementStore {
    records: Vec<PlacementRecord>,
}

impl StagedPlacementStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record.
    #[instrument(skip(self), fields(staged = self.records.len()))]
    pub fn add(&mut self, record: PlacementRecord) {
        debug!(%record, "Staging placement");
        self.records.push(record);
    }

    /// Removes every record matching `predicate`, returning them in order.
    ///
    /// In standard play the remaining records have their faces reassigned
    /// by position.
    #[instrument(skip(self, predicate))]
    pub fn remove<F>(&mut self, phase: Phase, predicate: F) -> Vec<PlacementRecord>
    where
        F: Fn(&PlacementRecord) -> bool,
    {
        let (removed, kept): (Vec<_>, Vec<_>) =
            self.records.drain(..).partition(|record| predicate(record));
        self.records = kept;
        if phase == Phase::StandardPlay {
            self.reassign_faces();
        }
        debug!(removed = removed.len(), remaining = self.records.len(), "Unstaged placements");
        removed
    }

    /// Drops every record.
    #[instrument(skip(self), fields(staged = self.records.len()))]
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Staged records in placement order.
    pub fn list(&self) -> &[PlacementRecord] {
        &self.records
    }

    /// Number of staged records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The record staged on `slot`, if any.
    pub fn for_slot(&self, slot: Patrician) -> Option<&PlacementRecord> {
        self.records.iter().find(|record| record.slot == slot)
    }

    /// Whether `card_id` is staged anywhere.
    pub fn contains_card(&self, card_id: &CardId) -> bool {
        self.records.iter().any(|record| &record.card_id == card_id)
    }

    /// Returns `hand` minus one entry per staged record.
    ///
    /// The server deals several copies under the same id, so staging one
    /// `THREE` must leave any other `THREE` in the hand.
    pub fn remaining_hand(&self, hand: Vec<CardRef>) -> Vec<CardRef> {
        let mut pending: Vec<&CardId> = self.records.iter().map(|record| &record.card_id).collect();
        hand.into_iter()
            .filter(|card| match pending.iter().position(|id| **id == card.id) {
                Some(index) => {
                    pending.swap_remove(index);
                    false
                }
                None => true,
            })
            .collect()
    }

    /// First face-down record.
    pub fn face_down(&self) -> Option<&PlacementRecord> {
        self.records.iter().find(|record| !record.face_up)
    }

    /// First face-up record.
    pub fn face_up(&self) -> Option<&PlacementRecord> {
        self.records.iter().find(|record| record.face_up)
    }

    /// Face assigned to the record at `position` during standard play.
    pub fn face_for_position(position: usize) -> bool {
        position > 0
    }

    fn reassign_faces(&mut self) {
        for (position, record) in self.records.iter_mut().enumerate() {
            record.face_up = Self::face_for_position(position);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staged(card: &str, slot: Patrician, face_up: bool) -> PlacementRecord {
        PlacementRecord::new(CardId::new(card), slot, face_up)
    }

    #[test]
    fn test_remove_reassigns_faces_in_standard_play() {
        let mut store = StagedPlacementStore::new();
        store.add(staged("ONE", Patrician::Aedile, false));
        store.add(staged("TWO", Patrician::Consul, true));

        let removed = store.remove(Phase::StandardPlay, |r| r.card_id == CardId::new("ONE"));

        assert_eq!(removed.len(), 1);
        assert_eq!(store.list(), &[staged("TWO", Patrician::Consul, false)]);
    }

    #[test]
    fn test_remove_keeps_faces_in_initial_placement() {
        let mut store = StagedPlacementStore::new();
        store.add(staged("ONE", Patrician::Aedile, false));
        store.add(staged("TWO", Patrician::Consul, false));

        store.remove(Phase::InitialPlacement, |r| r.slot == Patrician::Aedile);

        assert_eq!(store.list(), &[staged("TWO", Patrician::Consul, false)]);
    }

    #[test]
    fn test_lookups() {
        let mut store = StagedPlacementStore::new();
        store.add(staged("THREE", Patrician::Censor, false));
        store.add(staged("FOUR", Patrician::Praetor, true));

        assert_eq!(store.for_slot(Patrician::Censor).map(|r| r.card_id.as_str()), Some("THREE"));
        assert!(store.for_slot(Patrician::Quaestor).is_none());
        assert!(store.contains_card(&CardId::new("four")));
        assert_eq!(store.face_down().map(|r| r.slot), Some(Patrician::Censor));
        assert_eq!(store.face_up().map(|r| r.slot), Some(Patrician::Praetor));

        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_remaining_hand_removes_one_copy_per_record() {
        let mut store = StagedPlacementStore::new();
        store.add(staged("THREE", Patrician::Consul, false));
        let hand = vec![
            CardRef::influence("three"),
            CardRef::influence("three"),
            CardRef::influence("one"),
        ];

        let remaining = store.remaining_hand(hand);

        assert_eq!(
            remaining,
            vec![CardRef::influence("THREE"), CardRef::influence("ONE")]
        );
    }
}
