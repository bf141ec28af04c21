//! HTTP implementations of the remote collaborators.

use super::client::{BotClient, BotMove, BotMoveRequest, ClientError, GameRecord, PersistenceClient};
use async_trait::async_trait;
use tracing::{debug, info, instrument};

/// Client for the bot and game-storage HTTP API.
///
/// `POST {base}/api/bot/move` answers `{"move", "evaluation"}` for a `{"fen"}`
/// body; `POST {base}/api/games` stores a finished game.
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl BotClient for HttpApiClient {
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn request_move(&self, request: BotMoveRequest) -> Result<BotMove, ClientError> {
        debug!("Requesting bot move");

        let response = self
            .client
            .post(format!("{}/api/bot/move", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let bot_move: BotMove = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Malformed(e.to_string()))?;

        debug!(mv = %bot_move.mv, evaluation = bot_move.evaluation, "Bot answered");
        Ok(bot_move)
    }
}

#[async_trait]
impl PersistenceClient for HttpApiClient {
    #[instrument(skip(self, record), fields(game_id = %record.id, moves = record.moves.len()))]
    async fn save_game(&self, record: &GameRecord) -> Result<(), ClientError> {
        let response = self
            .client
            .post(format!("{}/api/games", self.base_url))
            .json(record)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Self::check(response).await?;
        info!("Game saved");
        Ok(())
    }
}
