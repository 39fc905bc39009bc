//! Daemon configuration model.
//!
//! Loaded from a JSON file (see `flowsync-core::config`). Every field apart
//! from the credential and the bot list carries a serde default so a minimal
//! config stays minimal.

use serde::{Deserialize, Serialize};

/// Minimum allowed pull interval, enforced to prevent runaway polling.
pub const MIN_PULL_INTERVAL_SECS: u64 = 1;

/// One bot tracked by the daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BotEntry {
    /// Remote entity id.
    pub id: String,
    /// Display name; used as the mirror file stem.
    pub name: String,
}

/// Full daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// API bearer credential.
    pub token: String,
    /// Bots to keep in sync.
    pub bot_list: Vec<BotEntry>,
    /// Remote API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Seconds between Puller cycles.
    #[serde(default = "default_pull_interval")]
    pub pull_interval: u64,
    /// Directory the Puller writes remote documents into.
    #[serde(default = "default_input_dir")]
    pub input_dir: String,
    /// Directory the Pusher watches for local edits.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// Debounce window for bursts of filesystem events, in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Timeout applied to every remote request, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://next-app.1datatech.net/next/bot".to_string()
}

fn default_pull_interval() -> u64 {
    10
}

fn default_input_dir() -> String {
    "flow/input".to_string()
}

fn default_output_dir() -> String {
    "flow/output".to_string()
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_request_timeout() -> u64 {
    30
}

impl SyncSettings {
    /// Pull interval with the 1-second floor applied.
    pub fn effective_pull_interval(&self) -> u64 {
        self.pull_interval.max(MIN_PULL_INTERVAL_SECS)
    }

    /// Look up a bot's display name by id.
    pub fn display_name(&self, bot_id: &str) -> Option<&str> {
        self.bot_list
            .iter()
            .find(|b| b.id == bot_id)
            .map(|b| b.name.as_str())
    }

    /// Look up a bot's id by display name (mirror file stem).
    pub fn bot_id_for_name(&self, name: &str) -> Option<&str> {
        self.bot_list
            .iter()
            .find(|b| b.name == name)
            .map(|b| b.id.as_str())
    }
}
