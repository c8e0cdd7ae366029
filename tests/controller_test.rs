//! Tests for the session controller against a scripted backend.

use async_trait::async_trait;
use patricians::{
    AuthoritativeSnapshot, BoardView, CardId, CardRef, ClientError, ClientEvent, ClientErrorKind,
    GameAction, GameApi, GameController, InitialInfluencePlacements, InitialInfluenceResponse,
    Patrician, Phase, PlayActionRequest, PlayInfluenceRequest, PlayerId, TurnError, TurnPrompter,
    TurnState, VoteRequest, VoteResponse,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Backend double that records every call and replays scripted snapshots.
#[derive(Default)]
struct ScriptedApi {
    snapshots: Mutex<VecDeque<AuthoritativeSnapshot>>,
    calls: Mutex<Vec<String>>,
    influence_requests: Mutex<Vec<PlayInfluenceRequest>>,
    vote_requests: Mutex<Vec<VoteRequest>>,
    action_requests: Mutex<Vec<PlayActionRequest>>,
    reject_influence: Mutex<Option<String>>,
    initial_response: Mutex<InitialInfluenceResponse>,
}

impl ScriptedApi {
    fn with_snapshots(snapshots: impl IntoIterator<Item = AuthoritativeSnapshot>) -> Arc<Self> {
        let api = Self::default();
        *api.snapshots.lock().unwrap() = snapshots.into_iter().collect();
        Arc::new(api)
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GameApi for ScriptedApi {
    async fn fetch_game(&self) -> Result<AuthoritativeSnapshot, ClientError> {
        self.record("fetch_game");
        let mut snapshots = self.snapshots.lock().unwrap();
        // The last snapshot repeats forever.
        let snapshot = if snapshots.len() > 1 {
            snapshots.pop_front()
        } else {
            snapshots.front().cloned()
        };
        snapshot.ok_or_else(|| ClientError::network("no snapshot scripted"))
    }

    async fn reset_game(&self) -> Result<(), ClientError> {
        self.record("reset_game");
        Ok(())
    }

    async fn place_initial_influence(
        &self,
        _player: PlayerId,
        _placements: &InitialInfluencePlacements,
    ) -> Result<InitialInfluenceResponse, ClientError> {
        self.record("place_initial_influence");
        Ok(self.initial_response.lock().unwrap().clone())
    }

    async fn play_influence(&self, request: &PlayInfluenceRequest) -> Result<(), ClientError> {
        self.record("play_influence");
        if let Some(reason) = self.reject_influence.lock().unwrap().clone() {
            return Err(ClientError::rejected(400, reason));
        }
        self.influence_requests.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn vote_of_confidence(&self, request: &VoteRequest) -> Result<VoteResponse, ClientError> {
        self.record("vote_of_confidence");
        self.vote_requests.lock().unwrap().push(request.clone());
        Ok(VoteResponse {
            winner: Some(request.player_id),
        })
    }

    async fn play_action(&self, request: &PlayActionRequest) -> Result<(), ClientError> {
        self.record("play_action");
        self.action_requests.lock().unwrap().push(request.clone());
        Ok(())
    }
}

/// Prompter double answering with fixed choices.
struct FixedPrompter {
    vote: Option<Patrician>,
    action: Option<(CardId, Option<Patrician>)>,
}

#[async_trait]
impl TurnPrompter for FixedPrompter {
    async fn choose_vote_patrician(&mut self, _view: &BoardView) -> Option<Patrician> {
        self.vote
    }

    async fn choose_action_card(
        &mut self,
        _cards: &[CardRef],
    ) -> Option<(CardId, Option<Patrician>)> {
        self.action.clone()
    }
}

fn initial_snapshot(player: PlayerId) -> AuthoritativeSnapshot {
    let mut snapshot = AuthoritativeSnapshot::new(player, Phase::InitialPlacement);
    snapshot.waiting_for_initial_influence = true;
    snapshot
}

fn standard_snapshot(player: PlayerId) -> AuthoritativeSnapshot {
    let mut snapshot = AuthoritativeSnapshot::new(player, Phase::StandardPlay);
    snapshot.current_player_hand = vec![
        CardRef::influence("ONE"),
        CardRef::influence("FOUR"),
        CardRef::action("SCOUT"),
    ];
    snapshot
}

fn controller(
    seat: Option<PlayerId>,
    api: &Arc<ScriptedApi>,
    prompter: FixedPrompter,
) -> (GameController, mpsc::UnboundedReceiver<ClientEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let api: Arc<dyn GameApi> = api.clone();
    (GameController::new(seat, api, Box::new(prompter), tx), rx)
}

fn no_choices() -> FixedPrompter {
    FixedPrompter {
        vote: None,
        action: None,
    }
}

fn notices(rx: &mut mpsc::UnboundedReceiver<ClientEvent>) -> Vec<String> {
    let mut notices = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let ClientEvent::Notice(message) = event {
            notices.push(message);
        }
    }
    notices
}

#[tokio::test]
async fn test_refresh_resolves_placing() {
    let api = ScriptedApi::with_snapshots([initial_snapshot(PlayerId::Caesar)]);
    let (mut controller, mut rx) = controller(Some(PlayerId::Caesar), &api, no_choices());

    controller.refresh().await.unwrap();

    assert_eq!(controller.machine().turn_state(), TurnState::Placing);
    assert!(matches!(rx.try_recv(), Ok(ClientEvent::ViewChanged(_))));
}

#[tokio::test]
async fn test_poll_skips_fetch_while_placing() {
    let api = ScriptedApi::with_snapshots([initial_snapshot(PlayerId::Caesar)]);
    let (mut controller, _rx) = controller(Some(PlayerId::Caesar), &api, no_choices());
    controller.refresh().await.unwrap();

    let outcome = controller.poll().await.unwrap();

    assert!(outcome.is_none());
    assert_eq!(api.calls(), vec!["fetch_game"]);
}

#[tokio::test]
async fn test_initial_submission_flow() {
    let api = ScriptedApi::with_snapshots([
        initial_snapshot(PlayerId::Caesar),
        initial_snapshot(PlayerId::Cleopatra),
    ]);
    *api.initial_response.lock().unwrap() = InitialInfluenceResponse {
        current_player: Some(PlayerId::Cleopatra),
        current_mode: Some(Phase::InitialPlacement),
        status: None,
    };
    let (mut controller, mut rx) = controller(Some(PlayerId::Caesar), &api, no_choices());
    controller.refresh().await.unwrap();

    controller.auto_complete().await.unwrap();
    controller
        .press(GameAction::SubmitInitialInfluence)
        .await
        .unwrap();

    assert_eq!(
        api.calls(),
        vec!["fetch_game", "place_initial_influence", "fetch_game"]
    );
    assert!(notices(&mut rx).contains(
        &"CAESAR initial influence submitted. Now CLEOPATRA's turn.".to_string()
    ));
    assert_eq!(controller.machine().turn_state(), TurnState::Idle);
    assert!(controller.machine().staged().is_empty());
}

#[tokio::test]
async fn test_end_turn_without_vote_sends_only_influence() {
    let api = ScriptedApi::with_snapshots([
        standard_snapshot(PlayerId::Caesar),
        standard_snapshot(PlayerId::Cleopatra),
    ]);
    let (mut controller, mut rx) = controller(Some(PlayerId::Caesar), &api, no_choices());
    controller.refresh().await.unwrap();

    controller
        .place(CardId::new("ONE"), Patrician::Aedile)
        .await
        .unwrap();
    controller.press(GameAction::EndTurn).await.unwrap();

    assert_eq!(
        api.calls(),
        vec!["fetch_game", "play_influence", "fetch_game"]
    );
    assert!(api.vote_requests.lock().unwrap().is_empty());
    assert!(notices(&mut rx).contains(&"Vote of confidence cancelled".to_string()));
    assert_eq!(controller.machine().turn_state(), TurnState::Idle);
}

#[tokio::test]
async fn test_end_turn_with_vote_sends_both_requests() {
    let api = ScriptedApi::with_snapshots([
        standard_snapshot(PlayerId::Caesar),
        standard_snapshot(PlayerId::Cleopatra),
    ]);
    let prompter = FixedPrompter {
        vote: Some(Patrician::Consul),
        action: None,
    };
    let (mut controller, mut rx) = controller(Some(PlayerId::Caesar), &api, prompter);
    controller.refresh().await.unwrap();

    controller
        .place(CardId::new("ONE"), Patrician::Aedile)
        .await
        .unwrap();
    controller
        .place(CardId::new("FOUR"), Patrician::Aedile)
        .await
        .unwrap();
    controller.end_turn().await.unwrap();

    assert_eq!(
        api.calls(),
        vec![
            "fetch_game",
            "play_influence",
            "vote_of_confidence",
            "fetch_game"
        ]
    );
    let influence = api.influence_requests.lock().unwrap();
    assert_eq!(influence.len(), 1);
    assert_eq!(
        influence[0].face_down_assignment.as_ref().map(|a| a.influence_card_id.clone()),
        Some(CardId::new("ONE"))
    );
    assert_eq!(
        influence[0].face_up_assignment.as_ref().map(|a| a.influence_card_id.clone()),
        Some(CardId::new("FOUR"))
    );
    assert_eq!(
        api.vote_requests.lock().unwrap()[0].patrician_type,
        Patrician::Consul
    );

    let events: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
    assert!(events.iter().any(|event| matches!(
        event,
        ClientEvent::VoteResolved {
            patrician: Patrician::Consul,
            winner: Some(PlayerId::Caesar)
        }
    )));
}

#[tokio::test]
async fn test_rejected_submission_keeps_staged() {
    let api = ScriptedApi::with_snapshots([standard_snapshot(PlayerId::Caesar)]);
    *api.reject_influence.lock().unwrap() = Some("Invalid move".to_string());
    let (mut controller, mut rx) = controller(Some(PlayerId::Caesar), &api, no_choices());
    controller.refresh().await.unwrap();
    controller
        .place(CardId::new("ONE"), Patrician::Censor)
        .await
        .unwrap();

    let result = controller.end_turn().await;

    let Err(TurnError::Client(error)) = result else {
        panic!("Expected client error");
    };
    assert!(matches!(
        error.kind,
        ClientErrorKind::ServerRejection { status: 400, .. }
    ));
    assert!(notices(&mut rx).contains(&"Invalid move".to_string()));
    assert_eq!(controller.machine().turn_state(), TurnState::Placing);
    assert_eq!(controller.machine().staged().len(), 1);
}

#[tokio::test]
async fn test_illegal_placement_is_reported() {
    let api = ScriptedApi::with_snapshots([standard_snapshot(PlayerId::Caesar)]);
    let (mut controller, mut rx) = controller(Some(PlayerId::Caesar), &api, no_choices());
    controller.refresh().await.unwrap();

    let result = controller
        .place(CardId::new("SCOUT"), Patrician::Censor)
        .await;

    assert!(matches!(result, Err(TurnError::Rule(_))));
    assert!(notices(&mut rx).contains(&"Card SCOUT is not an influence card".to_string()));
    assert!(controller.machine().staged().is_empty());
}

#[tokio::test]
async fn test_skip_to_action_plays_chosen_card() {
    let api = ScriptedApi::with_snapshots([
        standard_snapshot(PlayerId::Caesar),
        standard_snapshot(PlayerId::Cleopatra),
    ]);
    let prompter = FixedPrompter {
        vote: None,
        action: Some((CardId::new("SCOUT"), None)),
    };
    let (mut controller, _rx) = controller(Some(PlayerId::Caesar), &api, prompter);
    controller.refresh().await.unwrap();

    controller.press(GameAction::SkipToAction).await.unwrap();

    assert_eq!(api.calls(), vec!["fetch_game", "play_action", "fetch_game"]);
    assert_eq!(
        api.action_requests.lock().unwrap()[0].card_id,
        CardId::new("SCOUT")
    );
}

#[tokio::test]
async fn test_reset_clears_state_and_refetches() {
    let api = ScriptedApi::with_snapshots([
        standard_snapshot(PlayerId::Caesar),
        initial_snapshot(PlayerId::Caesar),
    ]);
    let (mut controller, mut rx) = controller(None, &api, no_choices());
    controller.refresh().await.unwrap();
    controller
        .place(CardId::new("ONE"), Patrician::Censor)
        .await
        .unwrap();

    controller.reset().await.unwrap();

    assert_eq!(api.calls(), vec!["fetch_game", "reset_game", "fetch_game"]);
    assert!(notices(&mut rx).contains(&"Game has been reset!".to_string()));
    assert!(controller.machine().staged().is_empty());
    assert_eq!(
        controller.machine().phase(),
        Some(Phase::InitialPlacement)
    );
}
