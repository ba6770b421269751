//! Service Configuration
//!
//! Explicit configuration structs loaded from environment variables with
//! development defaults. Nothing here is ambient state - constructors
//! receive these structs.

use std::time::Duration;

// ============================================================================
// BOARD INTEGRATION
// ============================================================================

/// Configuration for the external kanban board integration.
#[derive(Debug, Clone)]
pub struct BoardConfig {
    /// Whether the board integration is enabled at all.
    pub enabled: bool,

    /// Base URL of the board API.
    pub base_url: String,

    /// API token sent on every outbound board call.
    pub api_token: Option<String>,

    /// Shared secret expected on inbound webhooks. `None` disables
    /// verification (development opt-out).
    pub webhook_secret: Option<String>,

    /// Board whose lists mirror the RFC statuses.
    pub board_id: Option<String>,

    /// Create/update cards automatically on RFC writes.
    pub auto_sync: bool,

    /// Connect timeout for outbound board calls.
    pub connect_timeout: Duration,

    /// Read timeout for outbound board calls.
    pub request_timeout: Duration,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "http://localhost:3000".to_string(),
            api_token: None,
            webhook_secret: None,
            board_id: None,
            auto_sync: true,
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl BoardConfig {
    /// Create BoardConfig from environment variables.
    ///
    /// Environment variables:
    /// - `RFC_BOARD_ENABLED`: "true" or "false" (default: false)
    /// - `RFC_BOARD_URL`: board API base URL (default: http://localhost:3000)
    /// - `RFC_BOARD_API_TOKEN`: outbound API token
    /// - `RFC_BOARD_WEBHOOK_SECRET`: inbound webhook shared secret
    /// - `RFC_BOARD_ID`: board id holding the status lists
    /// - `RFC_BOARD_AUTO_SYNC`: "true" or "false" (default: true)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let enabled = std::env::var("RFC_BOARD_ENABLED")
            .ok()
            .map(|s| s.to_lowercase() == "true")
            .unwrap_or(defaults.enabled);

        let base_url = std::env::var("RFC_BOARD_URL").unwrap_or(defaults.base_url);

        let api_token = std::env::var("RFC_BOARD_API_TOKEN")
            .ok()
            .filter(|s| !s.is_empty());

        let webhook_secret = std::env::var("RFC_BOARD_WEBHOOK_SECRET")
            .ok()
            .filter(|s| !s.is_empty());

        let board_id = std::env::var("RFC_BOARD_ID").ok().filter(|s| !s.is_empty());

        let auto_sync = std::env::var("RFC_BOARD_AUTO_SYNC")
            .ok()
            .map(|s| s.to_lowercase() != "false")
            .unwrap_or(defaults.auto_sync);

        Self {
            enabled,
            base_url,
            api_token,
            webhook_secret,
            board_id,
            auto_sync,
            connect_timeout: defaults.connect_timeout,
            request_timeout: defaults.request_timeout,
        }
    }
}

// ============================================================================
// STATUS REFRESH JOB
// ============================================================================

/// Configuration for the periodic status derivation job.
#[derive(Debug, Clone)]
pub struct StatusRefreshConfig {
    /// How often to run a derivation pass (default: 3 seconds).
    pub tick_interval: Duration,

    /// Leave an RFC alone for this long after a human board edit
    /// (default: 5 minutes).
    pub debounce_window: Duration,
}

impl Default for StatusRefreshConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(3),
            debounce_window: Duration::from_secs(300),
        }
    }
}

impl StatusRefreshConfig {
    /// Create StatusRefreshConfig from environment variables.
    ///
    /// Environment variables:
    /// - `RFC_STATUS_TICK_SECS`: derivation pass interval (default: 3)
    /// - `RFC_STATUS_DEBOUNCE_SECS`: board-edit debounce window (default: 300)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let tick_interval = std::env::var("RFC_STATUS_TICK_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.tick_interval);

        let debounce_window = std::env::var("RFC_STATUS_DEBOUNCE_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.debounce_window);

        Self {
            tick_interval,
            debounce_window,
        }
    }
}

// ============================================================================
// API SERVER
// ============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind host (default: 0.0.0.0).
    pub bind_host: String,

    /// Bind port (default: 8080).
    pub bind_port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            bind_port: 8080,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables (`RFC_API_BIND`, `PORT`).
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_host = std::env::var("RFC_API_BIND").unwrap_or(defaults.bind_host);

        let bind_port = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.bind_port);

        Self {
            bind_host,
            bind_port,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
