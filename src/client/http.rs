//! `reqwest`-backed implementation of [`GameApi`].

use super::api::{GameApi, InitialInfluenceResponse, VoteResponse};
use super::error::{ClientError, rejection_reason};
use crate::config::ClientConfig;
use crate::game::{
    AuthoritativeSnapshot, InitialInfluencePlacements, PlayActionRequest, PlayInfluenceRequest,
    PlayerId, VoteRequest,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// HTTP client for the Patricians backend.
#[derive(Debug, Clone)]
pub struct HttpGameClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpGameClient {
    /// Creates a client for `base_url` with the given request timeout.
    #[instrument(skip_all, fields(base_url = %base_url.as_ref()))]
    pub fn new(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: base_url.as_ref().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Creates a client from loaded configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::new(
            config.server_url(),
            Duration::from_millis(*config.request_timeout_ms()),
        )
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends `request` and returns the raw body of a successful response.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(status = %status, body = %body, "Got response");

        if !status.is_success() {
            let reason = rejection_reason(&body, status);
            warn!(status = %status, reason = %reason, "Request rejected");
            return Err(ClientError::rejected(status.as_u16(), reason));
        }
        Ok(body)
    }

    fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ClientError> {
        serde_json::from_str(body).map_err(|e| ClientError::decode(e.to_string()))
    }

    /// Like [`Self::decode`], treating an empty body as the default value.
    fn decode_or_default<T: DeserializeOwned + Default>(body: &str) -> Result<T, ClientError> {
        if body.trim().is_empty() {
            Ok(T::default())
        } else {
            Self::decode(body)
        }
    }
}

#[async_trait]
impl GameApi for HttpGameClient {
    #[instrument(skip(self))]
    async fn fetch_game(&self) -> Result<AuthoritativeSnapshot, ClientError> {
        let body = self.send(self.client.get(self.url("/game"))).await?;
        let snapshot: AuthoritativeSnapshot = Self::decode(&body)?;
        debug!(
            current = %snapshot.current_player,
            mode = %snapshot.game_mode,
            "Fetched game state"
        );
        Ok(snapshot)
    }

    #[instrument(skip(self))]
    async fn reset_game(&self) -> Result<(), ClientError> {
        info!("Resetting game");
        self.send(self.client.post(self.url("/game/reset"))).await?;
        Ok(())
    }

    #[instrument(skip(self, placements), fields(placements = placements.len()))]
    async fn place_initial_influence(
        &self,
        player: PlayerId,
        placements: &InitialInfluencePlacements,
    ) -> Result<InitialInfluenceResponse, ClientError> {
        info!("Submitting initial influence");
        let request = self
            .client
            .post(self.url(&format!(
                "/game/action/placeInitialInfluence?playerId={player}"
            )))
            .json(placements);
        let body = self.send(request).await?;
        // Older servers answer with a bare status string.
        match Self::decode_or_default(&body) {
            Ok(response) => Ok(response),
            Err(e) => {
                debug!(error = %e, "Initial influence response not JSON, falling back to default");
                Ok(InitialInfluenceResponse::default())
            }
        }
    }

    #[instrument(skip(self, request), fields(player = %request.player_id))]
    async fn play_influence(&self, request: &PlayInfluenceRequest) -> Result<(), ClientError> {
        info!("Submitting influence cards");
        self.send(
            self.client
                .post(self.url("/game/action/playInfluenceCard"))
                .json(request),
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self, request), fields(player = %request.player_id, patrician = %request.patrician_type))]
    async fn vote_of_confidence(&self, request: &VoteRequest) -> Result<VoteResponse, ClientError> {
        info!("Calling vote of confidence");
        let body = self
            .send(
                self.client
                    .post(self.url("/game/action/voteOfConfidence"))
                    .json(request),
            )
            .await?;
        Self::decode_or_default(&body)
    }

    #[instrument(skip(self, request), fields(player = %request.player_id, card = %request.card_id))]
    async fn play_action(&self, request: &PlayActionRequest) -> Result<(), ClientError> {
        info!("Playing action card");
        self.send(
            self.client
                .post(self.url("/game/action/playAction"))
                .json(request),
        )
        .await?;
        Ok(())
    }
}
