//! Input assembly for crew kickoffs.

use std::collections::HashMap;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

/// Topic used when no user topic is available.
pub const DEFAULT_TOPIC: &str = "AI LLMs";

pub const TOPIC_KEY: &str = "topic";
pub const CURRENT_YEAR_KEY: &str = "current_year";
pub const USER_PREFERENCE_KEY: &str = "user_preference";

/// The interpolation inputs handed to the crew.
///
/// Always carries the same three keys; see [`InputBundle::to_map`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputBundle {
    pub topic: String,
    pub current_year: String,
    pub user_preference: String,
}

impl InputBundle {
    /// The bundle as `{key}` interpolation inputs.
    pub fn to_map(&self) -> HashMap<String, String> {
        HashMap::from([
            (TOPIC_KEY.to_string(), self.topic.clone()),
            (CURRENT_YEAR_KEY.to_string(), self.current_year.clone()),
            (USER_PREFERENCE_KEY.to_string(), self.user_preference.clone()),
        ])
    }
}

/// The current calendar year in local time.
pub fn current_year() -> i32 {
    chrono::Local::now().year()
}

/// Build a bundle from the raw topic text.
pub fn assemble(topic: &str, current_year: i32, preferences: &str) -> InputBundle {
    InputBundle {
        topic: topic.to_string(),
        current_year: current_year.to_string(),
        user_preference: preferences.to_string(),
    }
}

/// Build a bundle for a bridge message; an empty message falls back to
/// [`DEFAULT_TOPIC`].
pub fn assemble_bridge(message: &str, current_year: i32, preferences: &str) -> InputBundle {
    let topic = if message.is_empty() {
        DEFAULT_TOPIC
    } else {
        message
    };
    assemble(topic, current_year, preferences)
}

/// Bundle used by `train` and `test`: fixed topic, no preferences.
pub fn assemble_fixed(current_year: i32) -> InputBundle {
    assemble(DEFAULT_TOPIC, current_year, "")
}
