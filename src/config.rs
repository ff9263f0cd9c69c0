//! Runtime configuration resolved from environment variables.
//!
//! # Environment Variables
//!
//! - `OPENAI_API_KEY`: key for the chat-completions endpoint
//! - `OPENAI_API_BASE`: endpoint base URL (default: `https://api.openai.com/v1`)
//! - `MODEL`: default model for agents without an explicit `llm` (default: `gpt-4o-mini`)
//! - `CREW_PROJECT_DIR`: project root holding `config/`, `knowledge/` and
//!   `task_outputs/` (default: current directory)
//! - `PORT`: bridge HTTP port (default: 6000)

use std::path::PathBuf;

use crate::preferences::USER_PREFERENCE_PATH;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BRIDGE_PORT: u16 = 6000;

/// Settings shared by all entry points.
#[derive(Clone)]
pub struct StudioConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    pub project_dir: PathBuf,
    pub port: u16,
}

impl std::fmt::Debug for StudioConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudioConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("project_dir", &self.project_dir)
            .field("port", &self.port)
            .finish()
    }
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            project_dir: PathBuf::from("."),
            port: DEFAULT_BRIDGE_PORT,
        }
    }
}

impl StudioConfig {
    /// Resolve from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve from an arbitrary lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "invalid PORT, using default {}", DEFAULT_BRIDGE_PORT);
                DEFAULT_BRIDGE_PORT
            }),
            None => defaults.port,
        };

        Self {
            api_key: get("OPENAI_API_KEY"),
            api_base: get("OPENAI_API_BASE")
                .map(|b| b.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base),
            model: get("MODEL").unwrap_or(defaults.model),
            project_dir: get("CREW_PROJECT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.project_dir),
            port,
        }
    }

    /// Path of the user preference file under the project directory.
    pub fn preference_path(&self) -> PathBuf {
        self.project_dir.join(USER_PREFERENCE_PATH)
    }

    /// Directory holding the replay store.
    pub fn task_output_dir(&self) -> PathBuf {
        self.project_dir.join("task_outputs")
    }
}
