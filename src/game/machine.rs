//! Client-side turn and placement state machine.
//!
//! The machine owns the last accepted snapshot, the staged placements and the
//! turn state. It never performs I/O: submissions are returned as payloads for
//! the controller to send, and the controller reports the outcome back.
//!
//! ```text
//! Idle ──snapshot(our turn)──▶ Placing ──begin_submit──▶ Submitting(kind)
//!   ▲                            ▲  ▲                        │
//!   └──snapshot(their turn)──────┘  └──submission_failed─────┤
//!                                                            │ submission_succeeded
//!                        AwaitingRefresh ◀───────────────────┘
//! ```

use super::availability::{GameAction, derive_actions};
use super::invariants::{InvariantSet, Staging, StagingInvariants};
use super::placement::{PlacementRecord, StagedPlacementStore};
use super::rules::{
    PlacementContext, PlacementVerdict, RuleViolation, STANDARD_PLAY_CAPACITY, can_place, can_remove,
};
use super::snapshot::AuthoritativeSnapshot;
use super::submission::{
    InitialInfluencePlacements, PlayActionRequest, PlayInfluenceRequest, Submission, VoteRequest,
};
use super::sync::{RefreshSequencer, RefreshTicket, prune_missing, reconcile};
use super::types::{
    CardId, CardRef, Patrician, PendingSelection, Phase, PlayerId, SubmissionKind, TurnState,
};
use crate::error::TurnError;
use std::collections::BTreeSet;
use tracing::{debug, error, info, instrument, warn};

/// What happened to a fetched snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOutcome {
    /// Installed; staged placements were discarded if `reset_staged`.
    Applied {
        /// Whether staged placements were discarded.
        reset_staged: bool,
        /// Turn state after the snapshot.
        turn_state: TurnState,
    },
    /// A newer snapshot was already applied.
    Stale,
}

/// The client-side turn/placement state machine for one session.
#[derive(Debug, Clone)]
pub struct TurnStateMachine {
    seat: Option<PlayerId>,
    snapshot: Option<AuthoritativeSnapshot>,
    staged: StagedPlacementStore,
    turn_state: TurnState,
    selection: Option<PendingSelection>,
    sequencer: RefreshSequencer,
}

impl TurnStateMachine {
    /// Creates a machine for `seat`, or for whoever is current when `None`.
    pub fn new(seat: Option<PlayerId>) -> Self {
        Self {
            seat,
            snapshot: None,
            staged: StagedPlacementStore::new(),
            turn_state: TurnState::Idle,
            selection: None,
            sequencer: RefreshSequencer::new(),
        }
    }

    // ─────────────────────────────────────────────────────────────
    //  Queries
    // ─────────────────────────────────────────────────────────────

    /// Configured seat, `None` in hot-seat mode.
    pub fn seat(&self) -> Option<PlayerId> {
        self.seat
    }

    /// Last accepted snapshot.
    pub fn snapshot(&self) -> Option<&AuthoritativeSnapshot> {
        self.snapshot.as_ref()
    }

    /// Staged placements in order.
    pub fn staged(&self) -> &StagedPlacementStore {
        &self.staged
    }

    /// Current turn state.
    pub fn turn_state(&self) -> TurnState {
        self.turn_state
    }

    /// Active phase, unknown before the first snapshot.
    pub fn phase(&self) -> Option<Phase> {
        self.snapshot.as_ref().map(|snapshot| snapshot.game_mode)
    }

    /// Open follow-up selection, if any.
    pub fn pending_selection(&self) -> Option<PendingSelection> {
        self.selection
    }

    /// The player this client acts for right now.
    pub fn acting_player(&self) -> Option<PlayerId> {
        self.seat
            .or_else(|| self.snapshot.as_ref().map(|snapshot| snapshot.current_player))
    }

    /// Full hand for the active phase, staged cards included.
    pub fn hand(&self) -> Vec<CardRef> {
        self.snapshot
            .as_ref()
            .filter(|snapshot| Some(snapshot.current_player) == self.acting_player())
            .map(AuthoritativeSnapshot::hand)
            .unwrap_or_default()
    }

    /// Hand as rendered: one copy removed per staged record.
    pub fn visible_hand(&self) -> Vec<CardRef> {
        self.staged.remaining_hand(self.hand())
    }

    /// Influence cards still accepted this standard-play turn.
    pub fn turn_capacity(&self) -> usize {
        self.snapshot
            .as_ref()
            .map(|snapshot| snapshot.remaining_capacity(STANDARD_PLAY_CAPACITY))
            .unwrap_or(STANDARD_PLAY_CAPACITY)
    }

    /// Action cards the acting player may choose from.
    pub fn action_cards(&self) -> Vec<CardRef> {
        self.snapshot
            .as_ref()
            .map(AuthoritativeSnapshot::action_cards)
            .unwrap_or_default()
    }

    /// Enabled action controls.
    ///
    /// Nothing is enabled while a follow-up selection is open.
    pub fn available_actions(&self) -> BTreeSet<GameAction> {
        let Some(phase) = self.phase() else {
            return BTreeSet::new();
        };
        if self.selection.is_some() {
            return BTreeSet::new();
        }
        derive_actions(
            self.turn_state,
            phase,
            self.staged.len(),
            self.visible_hand().len(),
        )
    }

    // ─────────────────────────────────────────────────────────────
    //  Server sync
    // ─────────────────────────────────────────────────────────────

    /// Issues the ticket for a new `GET /game`.
    pub fn issue_refresh(&mut self) -> RefreshTicket {
        self.sequencer.issue()
    }

    /// Installs a fetched snapshot and resolves the turn state.
    ///
    /// While a submission is in flight the snapshot is reconciled but the
    /// turn state is left for the submission outcome to resolve.
    #[instrument(skip(self, snapshot), fields(ticket = ticket.sequence(), state = %self.turn_state))]
    pub fn apply_snapshot(
        &mut self,
        ticket: RefreshTicket,
        snapshot: AuthoritativeSnapshot,
    ) -> SnapshotOutcome {
        if !self.sequencer.accept(ticket) {
            return SnapshotOutcome::Stale;
        }

        let reconciliation = reconcile(self.snapshot.as_ref(), snapshot);
        if reconciliation.reset_staged {
            self.staged.clear();
            self.selection = None;
        } else {
            prune_missing(&mut self.staged, &reconciliation.snapshot);
        }
        self.snapshot = Some(reconciliation.snapshot);

        if !matches!(self.turn_state, TurnState::Submitting(_)) {
            let resolved = self.resolve_turn_state();
            if resolved != self.turn_state {
                info!(from = %self.turn_state, to = %resolved, "Turn state resolved");
            }
            self.turn_state = resolved;
        }
        self.check_invariants();

        SnapshotOutcome::Applied {
            reset_staged: reconciliation.reset_staged,
            turn_state: self.turn_state,
        }
    }

    fn resolve_turn_state(&self) -> TurnState {
        match (&self.snapshot, self.acting_player()) {
            (Some(snapshot), Some(player)) if snapshot.awaits_action_from(player) => {
                TurnState::Placing
            }
            _ => TurnState::Idle,
        }
    }

    // ─────────────────────────────────────────────────────────────
    //  Staging
    // ─────────────────────────────────────────────────────────────

    fn ensure_placing(&self) -> Result<Phase, TurnError> {
        match self.turn_state {
            TurnState::Submitting(_) => Err(TurnError::Busy),
            TurnState::Placing => self
                .phase()
                .ok_or(TurnError::Rule(RuleViolation::NotPlacing(self.turn_state))),
            other => Err(RuleViolation::NotPlacing(other).into()),
        }
    }

    /// Like `ensure_placing`, but also refuses while a follow-up selection
    /// is open: the committed cards are still in the snapshot hand.
    fn ensure_staging(&self) -> Result<Phase, TurnError> {
        let phase = self.ensure_placing()?;
        match self.selection {
            Some(selection) => Err(RuleViolation::SelectionOpen(selection).into()),
            None => Ok(phase),
        }
    }

    /// Stages `card` on `slot`.
    #[instrument(skip(self), fields(state = %self.turn_state, staged = self.staged.len()))]
    pub fn place(&mut self, card: &CardId, slot: Patrician) -> Result<PlacementVerdict, TurnError> {
        let phase = self.ensure_staging()?;
        let hand = self.visible_hand();
        let ctx = PlacementContext {
            phase,
            staged: &self.staged,
            hand: &hand,
            capacity: self.turn_capacity(),
        };
        let verdict = can_place(card, slot, &ctx).inspect_err(|violation| {
            warn!(%violation, "Placement rejected");
        })?;

        if let Some(evicted) = &verdict.evicts {
            self.staged.remove(phase, |record| &record.card_id == evicted);
            debug!(%evicted, %slot, "Returned occupant to hand");
        }
        self.staged
            .add(PlacementRecord::new(card.clone(), slot, verdict.face_up));
        self.check_invariants();

        info!(%card, %slot, face_up = verdict.face_up, "Card staged");
        Ok(verdict)
    }

    /// Takes the staged `card` back off `slot`.
    #[instrument(skip(self), fields(state = %self.turn_state, staged = self.staged.len()))]
    pub fn unstage(&mut self, card: &CardId, slot: Patrician) -> Result<(), TurnError> {
        let phase = self.ensure_staging()?;
        can_remove(phase, self.turn_state, &self.staged, card, slot)?;

        self.staged
            .remove(phase, |record| &record.card_id == card && record.slot == slot);
        self.check_invariants();

        info!(%card, %slot, "Card unstaged");
        Ok(())
    }

    /// Stages the starting hand one card per patrician in board order.
    #[instrument(skip(self), fields(state = %self.turn_state))]
    pub fn auto_stage_initial(&mut self) -> Result<(), TurnError> {
        let phase = self.ensure_staging()?;
        if phase != Phase::InitialPlacement {
            return Err(RuleViolation::WrongPhase(phase).into());
        }

        self.staged.clear();
        let hand = self.visible_hand();
        for (slot, card) in Patrician::all().into_iter().zip(hand) {
            self.place(&card.id, slot)?;
        }
        info!(staged = self.staged.len(), "Auto-staged initial influence");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────
    //  Submission
    // ─────────────────────────────────────────────────────────────

    fn ensure_available(&self, action: GameAction) -> Result<(), TurnError> {
        if self.available_actions().contains(&action) {
            Ok(())
        } else {
            warn!(%action, "Action not available");
            Err(RuleViolation::ActionUnavailable(action).into())
        }
    }

    fn submitter(&self) -> Result<PlayerId, TurnError> {
        self.acting_player()
            .ok_or(TurnError::Rule(RuleViolation::NotPlacing(self.turn_state)))
    }

    /// Moves to `Submitting(kind)` once `action` is enabled.
    fn start_submission(
        &mut self,
        kind: SubmissionKind,
        action: GameAction,
    ) -> Result<PlayerId, TurnError> {
        self.ensure_placing()?;
        self.ensure_available(action)?;
        let player = self.submitter()?;
        self.turn_state = TurnState::Submitting(kind);
        info!(%player, %kind, "Submission started");
        Ok(player)
    }

    /// Starts the initial influence submission.
    ///
    /// Returns the submitting player and one card per patrician.
    #[instrument(skip(self), fields(state = %self.turn_state, staged = self.staged.len()))]
    pub fn begin_initial_influence(
        &mut self,
    ) -> Result<(PlayerId, InitialInfluencePlacements), TurnError> {
        let player = self.start_submission(
            SubmissionKind::InitialInfluence,
            GameAction::SubmitInitialInfluence,
        )?;
        let placements: InitialInfluencePlacements = self
            .staged
            .list()
            .iter()
            .map(|record| (record.slot, record.card_id.clone()))
            .collect();
        debug!(?placements, "Initial influence payload");
        Ok((player, placements))
    }

    /// Starts the influence half of ending the turn with a vote.
    #[instrument(skip(self), fields(state = %self.turn_state, staged = self.staged.len()))]
    pub fn begin_end_turn(&mut self) -> Result<PlayInfluenceRequest, TurnError> {
        self.begin_influence(SubmissionKind::EndTurn, GameAction::EndTurn)
    }

    /// Starts the influence half of playing an action card.
    #[instrument(skip(self), fields(state = %self.turn_state, staged = self.staged.len()))]
    pub fn begin_play_action_card(&mut self) -> Result<PlayInfluenceRequest, TurnError> {
        self.begin_influence(SubmissionKind::PlayActionCard, GameAction::PlayActionCard)
    }

    fn begin_influence(
        &mut self,
        kind: SubmissionKind,
        action: GameAction,
    ) -> Result<PlayInfluenceRequest, TurnError> {
        let player = self.start_submission(kind, action)?;
        let request = PlayInfluenceRequest::from_staged(player, &self.staged);
        debug!(?request, "Influence payload");
        Ok(request)
    }

    /// Starts an influence submission of `kind` and returns its payload.
    ///
    /// Accepts [`SubmissionKind::InitialInfluence`],
    /// [`SubmissionKind::EndTurn`] and [`SubmissionKind::PlayActionCard`];
    /// the follow-up kinds go through [`Self::begin_vote`] and
    /// [`Self::begin_action_card`].
    pub fn begin_submit(&mut self, kind: SubmissionKind) -> Result<Submission, TurnError> {
        self.ensure_placing()?;
        match kind {
            SubmissionKind::InitialInfluence => self
                .begin_initial_influence()
                .map(|(player, placements)| Submission::InitialInfluence { player, placements }),
            SubmissionKind::EndTurn => self.begin_end_turn().map(Submission::Influence),
            SubmissionKind::PlayActionCard => {
                self.begin_play_action_card().map(Submission::Influence)
            }
            SubmissionKind::VoteOfConfidence | SubmissionKind::ActionCard => {
                Err(RuleViolation::SelectionNotPending(kind).into())
            }
        }
    }

    /// Opens action-card selection without committing influence.
    #[instrument(skip(self), fields(state = %self.turn_state))]
    pub fn skip_to_action(&mut self) -> Result<(), TurnError> {
        self.ensure_placing()?;
        self.ensure_available(GameAction::SkipToAction)?;
        self.selection = Some(PendingSelection::ActionCard);
        info!("Skipped to action phase");
        Ok(())
    }

    fn take_selection(
        &mut self,
        expected: PendingSelection,
        kind: SubmissionKind,
    ) -> Result<PlayerId, TurnError> {
        self.ensure_placing()?;
        if self.selection != Some(expected) {
            return Err(RuleViolation::SelectionNotPending(kind).into());
        }
        self.submitter()
    }

    /// Starts a vote of confidence on `patrician`.
    #[instrument(skip(self), fields(state = %self.turn_state))]
    pub fn begin_vote(&mut self, patrician: Patrician) -> Result<VoteRequest, TurnError> {
        let player = self.take_selection(PendingSelection::Vote, SubmissionKind::VoteOfConfidence)?;
        self.selection = None;
        self.turn_state = TurnState::Submitting(SubmissionKind::VoteOfConfidence);
        info!(%player, %patrician, "Vote of confidence started");
        Ok(VoteRequest {
            player_id: player,
            patrician_type: patrician,
        })
    }

    /// Starts playing the action `card`, optionally aimed at `target`.
    #[instrument(skip(self), fields(state = %self.turn_state))]
    pub fn begin_action_card(
        &mut self,
        card: &CardId,
        target: Option<Patrician>,
    ) -> Result<PlayActionRequest, TurnError> {
        let player =
            self.take_selection(PendingSelection::ActionCard, SubmissionKind::ActionCard)?;
        if !self.action_cards().iter().any(|held| &held.id == card) {
            return Err(RuleViolation::CardNotInHand(card.clone()).into());
        }
        self.selection = None;
        self.turn_state = TurnState::Submitting(SubmissionKind::ActionCard);
        info!(%player, %card, ?target, "Action card started");
        Ok(PlayActionRequest {
            player_id: player,
            card_id: card.clone(),
            patrician_type: target,
        })
    }

    /// Drops an open follow-up selection.
    pub fn cancel_selection(&mut self) {
        if let Some(selection) = self.selection.take() {
            info!(%selection, "Selection cancelled");
        }
    }

    /// The in-flight request succeeded; wait for the next snapshot.
    #[instrument(skip(self), fields(state = %self.turn_state))]
    pub fn submission_succeeded(&mut self) {
        self.staged.clear();
        self.selection = None;
        self.turn_state = TurnState::AwaitingRefresh;
        info!("Submission accepted, awaiting refresh");
    }

    /// The influence half of a two-step flow succeeded.
    ///
    /// The staged placements are consumed and the matching follow-up
    /// selection opens while the machine returns to `Placing`.
    #[instrument(skip(self), fields(state = %self.turn_state))]
    pub fn influence_committed(&mut self) {
        let selection = match self.turn_state {
            TurnState::Submitting(SubmissionKind::EndTurn) => PendingSelection::Vote,
            TurnState::Submitting(SubmissionKind::PlayActionCard) => PendingSelection::ActionCard,
            other => {
                warn!(state = %other, "No influence submission in flight");
                return;
            }
        };
        self.staged.clear();
        self.selection = Some(selection);
        self.turn_state = TurnState::Placing;
        info!(%selection, "Influence committed");
    }

    /// The in-flight request failed; staged placements stay for a retry.
    #[instrument(skip(self), fields(state = %self.turn_state))]
    pub fn submission_failed(&mut self) {
        if matches!(self.turn_state, TurnState::Submitting(_)) {
            self.turn_state = TurnState::Placing;
            self.selection = None;
            warn!(staged = self.staged.len(), "Submission failed, staged placements kept");
        }
    }

    /// Discards every piece of local state.
    #[instrument(skip(self), fields(state = %self.turn_state))]
    pub fn reset(&mut self) {
        self.snapshot = None;
        self.staged.clear();
        self.selection = None;
        self.turn_state = TurnState::Idle;
        self.sequencer.invalidate();
        info!("Local state reset");
    }

    fn check_invariants(&self) {
        let Some(phase) = self.phase() else {
            return;
        };
        let result = StagingInvariants::check_all(&Staging::new(phase, &self.staged));
        if let Err(violations) = &result {
            for violation in violations {
                error!(invariant = %violation.description, "Staging invariant violated");
            }
        }
        debug_assert!(result.is_ok(), "staging invariants violated: {result:?}");
    }
}
