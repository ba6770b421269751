//! HTTP client for the external kanban board API
//!
//! Thin idempotent wrappers around the board's card and board endpoints.
//! Every method returns an absent result on transport or non-2xx failure
//! instead of an error: board sync is best-effort by design, and callers
//! decide whether absence matters. Failures are logged here with context.

use crate::config::BoardConfig;
use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Stable default placement for cards moved without an explicit position.
pub const DEFAULT_CARD_POSITION: f64 = 65536.0;

// ============================================================================
// WIRE TYPES
// ============================================================================

/// Card create/update request body.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<f64>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub card_type: Option<String>,
}

/// Card representation returned by the board.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardResponse {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub list_id: Option<String>,
    #[serde(default)]
    pub board_id: Option<String>,
    #[serde(default)]
    pub position: Option<f64>,
}

/// One list (column) of a board.
#[derive(Debug, Clone, Deserialize)]
pub struct BoardList {
    pub id: String,
    pub name: String,
}

/// The board wraps every response in an `{item, included}` envelope.
#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    #[serde(default)]
    item: Option<serde_json::Value>,
    #[serde(default)]
    included: Option<serde_json::Value>,
}

// ============================================================================
// CLIENT
// ============================================================================

/// HTTP client for the board API.
pub struct BoardClient {
    http: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

impl BoardClient {
    /// Build a client with the configured timeouts.
    pub fn new(config: &BoardConfig) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::internal_error(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.http.request(method, url);
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn send_for_envelope(
        &self,
        builder: reqwest::RequestBuilder,
        context: &str,
    ) -> Option<ApiEnvelope> {
        match builder.send().await {
            Ok(response) if response.status().is_success() => {
                match response.json::<ApiEnvelope>().await {
                    Ok(envelope) => Some(envelope),
                    Err(e) => {
                        tracing::warn!(error = %e, context, "Board response body was not parseable");
                        None
                    }
                }
            }
            Ok(response) => {
                tracing::warn!(status = %response.status(), context, "Board call failed with non-2xx status");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, context, "Board call failed");
                None
            }
        }
    }

    fn card_from_envelope(envelope: ApiEnvelope, context: &str) -> Option<CardResponse> {
        let item = envelope.item?;
        match serde_json::from_value::<CardResponse>(item) {
            Ok(card) => Some(card),
            Err(e) => {
                tracing::warn!(error = %e, context, "Board card payload was not parseable");
                None
            }
        }
    }

    /// Create a card in a list. `POST /api/lists/{listId}/cards`
    pub async fn create_card(&self, list_id: &str, request: &CardRequest) -> Option<CardResponse> {
        tracing::info!(list_id, name = %request.name, "Creating board card");

        let builder = self
            .request(reqwest::Method::POST, &format!("/api/lists/{}/cards", list_id))
            .json(request);
        let envelope = self.send_for_envelope(builder, "create_card").await?;
        Self::card_from_envelope(envelope, "create_card")
    }

    /// Update card fields. `PATCH /api/cards/{cardId}`
    pub async fn update_card(&self, card_id: &str, request: &CardRequest) -> Option<CardResponse> {
        tracing::info!(card_id, "Updating board card");

        let builder = self
            .request(reqwest::Method::PATCH, &format!("/api/cards/{}", card_id))
            .json(request);
        let envelope = self.send_for_envelope(builder, "update_card").await?;
        Self::card_from_envelope(envelope, "update_card")
    }

    /// Move a card to another list. Update and move share the PATCH
    /// endpoint; the move body names only the target list and position.
    pub async fn move_card(
        &self,
        card_id: &str,
        target_list_id: &str,
        position: Option<f64>,
    ) -> Option<CardResponse> {
        tracing::info!(card_id, target_list_id, "Moving board card");

        let body = json!({
            "listId": target_list_id,
            "position": position.unwrap_or(DEFAULT_CARD_POSITION),
        });
        let builder = self
            .request(reqwest::Method::PATCH, &format!("/api/cards/{}", card_id))
            .json(&body);
        let envelope = self.send_for_envelope(builder, "move_card").await?;
        Self::card_from_envelope(envelope, "move_card")
    }

    /// Delete a card. `DELETE /api/cards/{cardId}`
    pub async fn delete_card(&self, card_id: &str) -> bool {
        tracing::info!(card_id, "Deleting board card");

        match self
            .request(reqwest::Method::DELETE, &format!("/api/cards/{}", card_id))
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::warn!(status = %response.status(), card_id, "Board card delete failed");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, card_id, "Board card delete failed");
                false
            }
        }
    }

    /// Fetch a card. `GET /api/cards/{cardId}`
    pub async fn get_card(&self, card_id: &str) -> Option<CardResponse> {
        let builder = self.request(reqwest::Method::GET, &format!("/api/cards/{}", card_id));
        let envelope = self.send_for_envelope(builder, "get_card").await?;
        Self::card_from_envelope(envelope, "get_card")
    }

    /// Enumerate a board's lists. The board returns them under
    /// `included.lists` of `GET /api/boards/{boardId}`.
    pub async fn get_board_lists(&self, board_id: &str) -> Vec<BoardList> {
        let builder = self.request(reqwest::Method::GET, &format!("/api/boards/{}", board_id));
        let Some(envelope) = self.send_for_envelope(builder, "get_board_lists").await else {
            return Vec::new();
        };

        let Some(lists) = envelope
            .included
            .and_then(|included| included.get("lists").cloned())
        else {
            return Vec::new();
        };

        match serde_json::from_value::<Vec<BoardList>>(lists) {
            Ok(lists) => lists,
            Err(e) => {
                tracing::warn!(error = %e, board_id, "Board lists payload was not parseable");
                Vec::new()
            }
        }
    }

    /// Find a list id by display name, case-insensitively.
    pub async fn find_list_id_by_name(&self, board_id: &str, list_name: &str) -> Option<String> {
        self.get_board_lists(board_id)
            .await
            .into_iter()
            .find(|list| list.name.eq_ignore_ascii_case(list_name))
            .map(|list| list.id)
    }

    /// Authenticate against the board. `POST /api/access-tokens`
    pub async fn authenticate(&self, email_or_username: &str, password: &str) -> Option<String> {
        tracing::info!(user = email_or_username, "Authenticating against board");

        let body = json!({
            "emailOrUsername": email_or_username,
            "password": password,
        });
        let builder = self
            .request(reqwest::Method::POST, "/api/access-tokens")
            .json(&body);
        let envelope = self.send_for_envelope(builder, "authenticate").await?;
        envelope.item.and_then(|item| item.as_str().map(String::from))
    }
}

// =============================================================================
// TESTS
// =============================================================================
