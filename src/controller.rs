//! Session controller tying the turn machine to the backend.
//!
//! The controller owns one [`TurnStateMachine`], an injected [`GameApi`] and a
//! [`TurnPrompter`]. Each handler runs to completion; network calls are the
//! only await points, each executed as its own task and awaited in place.

use crate::client::{ClientError, GameApi};
use crate::error::TurnError;
use crate::game::{
    BoardView, CardId, CardRef, GameAction, Patrician, Phase, PlayInfluenceRequest, PlayerId,
    SnapshotOutcome, TurnState, TurnStateMachine,
};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// Messages sent from the controller to the rendering layer.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// The board changed and must be redrawn.
    ViewChanged(BoardView),
    /// Something the player should read.
    Notice(String),
    /// A vote of confidence was resolved by the server.
    VoteResolved {
        /// Patrician that was voted on.
        patrician: Patrician,
        /// Winner, `None` on a tie.
        winner: Option<PlayerId>,
    },
}

/// Collects the follow-up choices of the two-step flows.
#[async_trait::async_trait]
pub trait TurnPrompter: Send {
    /// Asks which patrician to put to a vote of confidence.
    ///
    /// `None` abandons the vote.
    async fn choose_vote_patrician(&mut self, view: &BoardView) -> Option<Patrician>;

    /// Asks which action card to play, and optionally its target.
    ///
    /// `None` abandons the action.
    async fn choose_action_card(
        &mut self,
        cards: &[CardRef],
    ) -> Option<(CardId, Option<Patrician>)>;
}

/// Owns the state of one client session.
pub struct GameController {
    machine: TurnStateMachine,
    api: Arc<dyn GameApi>,
    prompter: Box<dyn TurnPrompter>,
    event_tx: mpsc::UnboundedSender<ClientEvent>,
}

impl GameController {
    /// Creates a controller for `seat` (`None` for hot-seat play).
    pub fn new(
        seat: Option<PlayerId>,
        api: Arc<dyn GameApi>,
        prompter: Box<dyn TurnPrompter>,
        event_tx: mpsc::UnboundedSender<ClientEvent>,
    ) -> Self {
        Self {
            machine: TurnStateMachine::new(seat),
            api,
            prompter,
            event_tx,
        }
    }

    /// The underlying machine.
    pub fn machine(&self) -> &TurnStateMachine {
        &self.machine
    }

    /// Current board view.
    pub fn view(&self) -> BoardView {
        BoardView::project(&self.machine)
    }

    fn publish(&self, event: ClientEvent) {
        if self.event_tx.send(event).is_err() {
            debug!("No listener for client events");
        }
    }

    fn publish_view(&self) {
        self.publish(ClientEvent::ViewChanged(self.view()));
    }

    fn notify(&self, message: impl Into<String>) {
        self.publish(ClientEvent::Notice(message.into()));
    }

    fn reject(&self, error: TurnError) -> TurnError {
        warn!(%error, "Operation rejected");
        self.notify(error.user_message());
        error
    }

    /// Runs one backend call as its own task and waits for it.
    async fn call<T, F, Fut>(&self, request: F) -> Result<T, ClientError>
    where
        F: FnOnce(Arc<dyn GameApi>) -> Fut,
        Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
        T: Send + 'static,
    {
        tokio::spawn(request(Arc::clone(&self.api)))
            .await
            .map_err(|e| ClientError::network(format!("Request task failed: {}", e)))?
    }

    // ─────────────────────────────────────────────────────────────
    //  Refresh
    // ─────────────────────────────────────────────────────────────

    /// Fetches `GET /game` and reconciles it.
    #[instrument(skip(self), fields(state = %self.machine.turn_state()))]
    pub async fn refresh(&mut self) -> Result<SnapshotOutcome, TurnError> {
        let ticket = self.machine.issue_refresh();
        let snapshot = self
            .call(|api| async move { api.fetch_game().await })
            .await
            .map_err(|e| self.reject(e.into()))?;

        let outcome = self.machine.apply_snapshot(ticket, snapshot);
        if let SnapshotOutcome::Applied { reset_staged, turn_state } = outcome {
            debug!(reset_staged, %turn_state, "Snapshot applied");
            self.publish_view();
        }
        Ok(outcome)
    }

    /// Refreshes only while waiting on the server or the opponent.
    pub async fn poll(&mut self) -> Result<Option<SnapshotOutcome>, TurnError> {
        match self.machine.turn_state() {
            TurnState::Idle | TurnState::AwaitingRefresh => self.refresh().await.map(Some),
            TurnState::Placing | TurnState::Submitting(_) => Ok(None),
        }
    }

    /// Resets the game on the server and discards all local state.
    #[instrument(skip(self))]
    pub async fn reset(&mut self) -> Result<(), TurnError> {
        self.call(|api| async move { api.reset_game().await })
            .await
            .map_err(|e| self.reject(e.into()))?;

        self.machine.reset();
        self.notify("Game has been reset!");
        self.publish_view();
        self.refresh().await?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────
    //  Staging
    // ─────────────────────────────────────────────────────────────

    /// Stages `card` on `slot`.
    #[instrument(skip(self))]
    pub async fn place(&mut self, card: CardId, slot: Patrician) -> Result<(), TurnError> {
        let verdict = self
            .machine
            .place(&card, slot)
            .map_err(|e| self.reject(e))?;
        if let Some(evicted) = verdict.evicts {
            self.notify(format!("{evicted} returned to your hand"));
        }
        self.publish_view();
        Ok(())
    }

    /// Returns the staged `card` on `slot` to the hand.
    #[instrument(skip(self))]
    pub async fn unstage(&mut self, card: CardId, slot: Patrician) -> Result<(), TurnError> {
        self.machine
            .unstage(&card, slot)
            .map_err(|e| self.reject(e))?;
        self.publish_view();
        Ok(())
    }

    /// Stages the whole starting hand, one card per patrician.
    #[instrument(skip(self))]
    pub async fn auto_complete(&mut self) -> Result<(), TurnError> {
        self.machine.auto_stage_initial().map_err(|e| self.reject(e))?;
        self.publish_view();
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────
    //  Actions
    // ─────────────────────────────────────────────────────────────

    /// Handles an action button.
    #[instrument(skip(self))]
    pub async fn press(&mut self, action: GameAction) -> Result<(), TurnError> {
        match action {
            GameAction::SubmitInitialInfluence => self.submit_initial().await,
            GameAction::EndTurn => self.end_turn().await,
            GameAction::PlayActionCard => self.play_action_card().await,
            GameAction::SkipToAction => self.skip_to_action().await,
        }
    }

    /// Submits the five initial influence placements.
    #[instrument(skip(self))]
    pub async fn submit_initial(&mut self) -> Result<(), TurnError> {
        let (player, placements) = self
            .machine
            .begin_initial_influence()
            .map_err(|e| self.reject(e))?;
        self.publish_view();

        let response = self
            .call(move |api| async move { api.place_initial_influence(player, &placements).await })
            .await;
        match response {
            Ok(response) => {
                self.machine.submission_succeeded();
                let message = match (response.current_mode, response.current_player) {
                    (Some(Phase::StandardPlay), _) => {
                        "Both players have placed initial influence. Game enters standard play mode!"
                            .to_string()
                    }
                    (_, Some(next)) => {
                        format!("{player} initial influence submitted. Now {next}'s turn.")
                    }
                    _ => format!("{player} initial influence submitted."),
                };
                info!(%player, "Initial influence accepted");
                self.notify(message);
                self.publish_view();
                self.refresh().await?;
                Ok(())
            }
            Err(error) => Err(self.fail_submission(error)),
        }
    }

    /// Submits staged influence, then calls a vote of confidence.
    #[instrument(skip(self))]
    pub async fn end_turn(&mut self) -> Result<(), TurnError> {
        self.commit_influence(TurnStateMachine::begin_end_turn).await?;

        let view = self.view();
        let Some(patrician) = self.prompter.choose_vote_patrician(&view).await else {
            self.machine.cancel_selection();
            self.notify("Vote of confidence cancelled");
            self.publish_view();
            self.refresh().await?;
            return Ok(());
        };

        let request = self
            .machine
            .begin_vote(patrician)
            .map_err(|e| self.reject(e))?;
        self.publish_view();

        let response = self
            .call(move |api| async move { api.vote_of_confidence(&request).await })
            .await;
        match response {
            Ok(response) => {
                self.machine.submission_succeeded();
                let message = match response.winner {
                    Some(winner) => format!("Vote of Confidence completed! Winner: {winner}"),
                    None => "Vote of Confidence completed with no winner".to_string(),
                };
                self.publish(ClientEvent::VoteResolved {
                    patrician,
                    winner: response.winner,
                });
                self.notify(message);
                self.publish_view();
                self.refresh().await?;
                Ok(())
            }
            Err(error) => Err(self.fail_submission(error)),
        }
    }

    /// Submits staged influence, then plays an action card.
    #[instrument(skip(self))]
    pub async fn play_action_card(&mut self) -> Result<(), TurnError> {
        self.commit_influence(TurnStateMachine::begin_play_action_card).await?;
        self.select_action().await
    }

    /// Goes straight to action card selection.
    #[instrument(skip(self))]
    pub async fn skip_to_action(&mut self) -> Result<(), TurnError> {
        self.machine.skip_to_action().map_err(|e| self.reject(e))?;
        self.publish_view();
        self.select_action().await
    }

    /// Sends the staged influence half of a two-step flow.
    async fn commit_influence(
        &mut self,
        start: fn(&mut TurnStateMachine) -> Result<PlayInfluenceRequest, TurnError>,
    ) -> Result<(), TurnError> {
        let request = start(&mut self.machine).map_err(|e| self.reject(e))?;
        let state = self.machine.turn_state();
        self.publish_view();

        let result = self
            .call(move |api| async move { api.play_influence(&request).await })
            .await;
        match result {
            Ok(()) => {
                self.machine.influence_committed();
                info!(%state, "Influence cards submitted");
                self.publish_view();
                Ok(())
            }
            Err(error) => Err(self.fail_submission(error)),
        }
    }

    async fn select_action(&mut self) -> Result<(), TurnError> {
        let cards = self.machine.action_cards();
        if cards.is_empty() {
            self.machine.cancel_selection();
            self.notify("No action cards in hand");
            self.publish_view();
            self.refresh().await?;
            return Ok(());
        }

        let Some((card, target)) = self.prompter.choose_action_card(&cards).await else {
            self.machine.cancel_selection();
            self.notify("Action card cancelled");
            self.publish_view();
            self.refresh().await?;
            return Ok(());
        };

        let request = self
            .machine
            .begin_action_card(&card, target)
            .map_err(|e| self.reject(e))?;
        self.publish_view();

        let result = self
            .call(move |api| async move { api.play_action(&request).await })
            .await;
        match result {
            Ok(()) => {
                self.machine.submission_succeeded();
                self.notify(format!("Played {card}"));
                self.publish_view();
                self.refresh().await?;
                Ok(())
            }
            Err(error) => Err(self.fail_submission(error)),
        }
    }

    fn fail_submission(&mut self, error: ClientError) -> TurnError {
        self.machine.submission_failed();
        self.publish_view();
        self.reject(error.into())
    }
}
