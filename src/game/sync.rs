//! Reconciliation of staged state with freshly fetched snapshots.

use super::placement::StagedPlacementStore;
use super::snapshot::AuthoritativeSnapshot;
use super::types::Phase;
use tracing::{debug, info, instrument};

/// Result of reconciling an incoming snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// The snapshot to install.
    pub snapshot: AuthoritativeSnapshot,
    /// Whether every staged record must be discarded.
    pub reset_staged: bool,
}

/// Decides whether staged state survives `incoming`.
///
/// Staged state is discarded on first load and whenever the current player
/// or the game mode moved on.
#[instrument(skip_all, fields(
    current = %incoming.current_player,
    mode = %incoming.game_mode,
))]
pub fn reconcile(
    previous: Option<&AuthoritativeSnapshot>,
    incoming: AuthoritativeSnapshot,
) -> Reconciliation {
    let reset_staged = match previous {
        None => true,
        Some(previous) => {
            previous.current_player != incoming.current_player
                || previous.game_mode != incoming.game_mode
        }
    };
    if reset_staged {
        info!("Turn advanced, discarding staged placements");
    }
    Reconciliation {
        snapshot: incoming,
        reset_staged,
    }
}

/// Drops staged records whose card is no longer in `snapshot`'s hand.
///
/// Returns how many records were pruned.
#[instrument(skip_all, fields(staged = staged.len()))]
pub fn prune_missing(staged: &mut StagedPlacementStore, snapshot: &AuthoritativeSnapshot) -> usize {
    // Initial placement deals a fixed hand, nothing to prune against.
    if snapshot.game_mode == Phase::InitialPlacement {
        return 0;
    }
    let hand = snapshot.hand();
    let removed = staged.remove(snapshot.game_mode, |record| {
        !hand.iter().any(|card| card.id == record.card_id)
    });
    if !removed.is_empty() {
        debug!(pruned = removed.len(), "Pruned staged cards no longer held");
    }
    removed.len()
}

/// Identifies one outstanding `GET /game` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RefreshTicket(u64);

impl RefreshTicket {
    /// Sequence number of the request.
    pub fn sequence(self) -> u64 {
        self.0
    }
}

/// Orders refresh responses so a late answer never overwrites a newer one.
#[derive(Debug, Clone, Default)]
pub struct RefreshSequencer {
    issued: u64,
    applied: u64,
}

impl RefreshSequencer {
    /// Creates a sequencer with nothing issued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the ticket for a new request.
    pub fn issue(&mut self) -> RefreshTicket {
        self.issued += 1;
        RefreshTicket(self.issued)
    }

    /// Accepts `ticket` if it is newer than the last accepted one.
    pub fn accept(&mut self, ticket: RefreshTicket) -> bool {
        if ticket.0 > self.applied && ticket.0 <= self.issued {
            self.applied = ticket.0;
            true
        } else {
            debug!(ticket = ticket.0, applied = self.applied, "Discarding stale refresh");
            false
        }
    }

    /// Marks every outstanding ticket stale.
    pub fn invalidate(&mut self) {
        self.applied = self.issued;
    }
}
