//! Request classification.
//!
//! Maps an inbound message to the task sequence the crew should run. Two
//! variants exist because the interactive command and the bridge route
//! requests differently:
//!
//! | message                      | interactive                | bridge                     |
//! |------------------------------|----------------------------|----------------------------|
//! | contains `self introduction` | `intro_task`               | `intro_task`               |
//! | starts with `brewing:`       | `research_task, brew_task` | `research_task, brew_task` |
//! | anything else                | `research_task, brew_task` | `research_task`            |
//!
//! Matching is case-insensitive and purely substring/prefix based.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Substring that selects the introduction task.
pub const SELF_INTRODUCTION_MARKER: &str = "self introduction";

/// Prefix that selects the research + brew pipeline on the bridge path.
pub const BREWING_PREFIX: &str = "brewing:";

/// One unit of work the crew knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    /// `intro_task`: the crew introduces itself.
    #[serde(rename = "intro_task")]
    Introduction,
    /// `research_task`: research the requested topic.
    #[serde(rename = "research_task")]
    Research,
    /// `brew_task`: turn the research into brewing advice.
    #[serde(rename = "brew_task")]
    Brew,
}

impl TaskKind {
    /// Every task kind, in definition order.
    pub const ALL: [TaskKind; 3] = [Self::Introduction, Self::Research, Self::Brew];

    /// The task identifier used in `tasks.yaml` and the replay store.
    pub fn id(self) -> &'static str {
        match self {
            Self::Introduction => "intro_task",
            Self::Research => "research_task",
            Self::Brew => "brew_task",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for TaskKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "intro_task" => Ok(Self::Introduction),
            "research_task" => Ok(Self::Research),
            "brew_task" => Ok(Self::Brew),
            other => Err(format!("unknown task '{}'", other)),
        }
    }
}

/// An ordered, non-empty list of tasks selected for one invocation.
///
/// Only the constructors in this module can build one, so a sequence is
/// never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TaskSequence(Vec<TaskKind>);

impl TaskSequence {
    /// `(intro_task)`
    pub fn introduction() -> Self {
        Self(vec![TaskKind::Introduction])
    }

    /// `(research_task)`
    pub fn research() -> Self {
        Self(vec![TaskKind::Research])
    }

    /// `(research_task, brew_task)`
    pub fn research_and_brew() -> Self {
        Self(vec![TaskKind::Research, TaskKind::Brew])
    }

    pub fn tasks(&self) -> &[TaskKind] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true for a sequence built by this module.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = TaskKind> + '_ {
        self.0.iter().copied()
    }

    /// Task identifiers in order, e.g. `["research_task", "brew_task"]`.
    pub fn ids(&self) -> Vec<&'static str> {
        self.0.iter().map(|t| t.id()).collect()
    }
}

impl fmt::Display for TaskSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.ids().join(", "))
    }
}

fn mentions_self_introduction(normalized: &str) -> bool {
    normalized.contains(SELF_INTRODUCTION_MARKER)
}

/// Classifier used by the network bridge.
///
/// First match wins: introduction, then the `brewing:` prefix, then a
/// research-only default.
pub fn classify_bridge_request(message: &str) -> TaskSequence {
    let normalized = message.to_lowercase();
    if mentions_self_introduction(&normalized) {
        TaskSequence::introduction()
    } else if normalized.starts_with(BREWING_PREFIX) {
        TaskSequence::research_and_brew()
    } else {
        TaskSequence::research()
    }
}

/// Classifier used by the interactive `run` command.
///
/// Only the introduction rule applies; everything else runs research + brew,
/// with or without a `brewing:` prefix.
///
/// The introduction check ignores case here too, unlike the earlier
/// case-sensitive `run` command; this is intentional.
pub fn classify_interactive_request(message: &str) -> TaskSequence {
    if mentions_self_introduction(&message.to_lowercase()) {
        TaskSequence::introduction()
    } else {
        TaskSequence::research_and_brew()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_introduction_anywhere_any_case() {
        for msg in [
            "self introduction",
            "Self Introduction please",
            "giving a self introduction today",
            "SELF INTRODUCTION",
            "brewing: then a self introduction",
        ] {
            assert_eq!(classify_bridge_request(msg), TaskSequence::introduction(), "{msg}");
            assert_eq!(
                classify_interactive_request(msg),
                TaskSequence::introduction(),
                "{msg}"
            );
        }
    }

    #[test]
    fn test_brewing_prefix_bridge() {
        assert_eq!(
            classify_bridge_request("Brewing: pour over, medium roast"),
            TaskSequence::research_and_brew()
        );
        assert_eq!(
            classify_bridge_request("BREWING:espresso"),
            TaskSequence::research_and_brew()
        );
    }

    #[test]
    fn test_brewing_must_be_a_prefix() {
        assert_eq!(
            classify_bridge_request("tips for brewing: cold brew"),
            TaskSequence::research()
        );
        assert_eq!(classify_bridge_request("brewing"), TaskSequence::research());
    }

    #[test]
    fn test_bridge_default_is_research_only() {
        assert_eq!(classify_bridge_request(""), TaskSequence::research());
        assert_eq!(
            classify_bridge_request("what is the history of coffee?"),
            TaskSequence::research()
        );
    }

    #[test]
    fn test_interactive_default_is_research_and_brew() {
        assert_eq!(
            classify_interactive_request(""),
            TaskSequence::research_and_brew()
        );
        assert_eq!(
            classify_interactive_request("what is the history of coffee?"),
            TaskSequence::research_and_brew()
        );
        assert_eq!(
            classify_interactive_request("brewing: v60"),
            TaskSequence::research_and_brew()
        );
    }

    #[test]
    fn test_variants_diverge_on_plain_messages() {
        let msg = "AI LLMs";
        assert_ne!(classify_bridge_request(msg), classify_interactive_request(msg));
    }

    #[test]
    fn test_task_ids_round_trip_through_from_str() {
        for kind in TaskKind::ALL {
            assert_eq!(kind.id().parse::<TaskKind>().unwrap(), kind);
        }
        assert!("coffee_task".parse::<TaskKind>().is_err());
    }

    #[test]
    fn test_sequence_display_and_ids() {
        let seq = TaskSequence::research_and_brew();
        assert_eq!(seq.ids(), vec!["research_task", "brew_task"]);
        assert_eq!(seq.to_string(), "(research_task, brew_task)");
        assert!(!seq.is_empty());
    }
}
