//! Agent and task definitions.
//!
//! Uses the crewAI project layout: `config/agents.yaml` maps an agent name to
//! its role, goal and backstory; `config/tasks.yaml` maps a task identifier to
//! its description, expected output and agent name. Text fields may contain
//! `{key}` placeholders filled from the kickoff inputs.
//!
//! Files under the project directory override the embedded defaults.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::classifier::TaskKind;
use crate::error::WorkflowError;

const DEFAULT_AGENTS_YAML: &str = include_str!("../../config/agents.yaml");
const DEFAULT_TASKS_YAML: &str = include_str!("../../config/tasks.yaml");

/// Relative path of the agents file inside a project.
pub const AGENTS_CONFIG: &str = "config/agents.yaml";
/// Relative path of the tasks file inside a project.
pub const TASKS_CONFIG: &str = "config/tasks.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub role: String,
    pub goal: String,
    pub backstory: String,
    /// Model override for this agent.
    #[serde(default)]
    pub llm: Option<String>,
}

impl AgentConfig {
    pub fn interpolated(&self, inputs: &HashMap<String, String>) -> Self {
        Self {
            role: interpolate_string(self.role.trim(), inputs),
            goal: interpolate_string(self.goal.trim(), inputs),
            backstory: interpolate_string(self.backstory.trim(), inputs),
            llm: self.llm.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskConfig {
    pub description: String,
    pub expected_output: String,
    /// Name of the agent in `agents.yaml`.
    pub agent: String,
}

impl TaskConfig {
    pub fn interpolated(&self, inputs: &HashMap<String, String>) -> Self {
        Self {
            description: interpolate_string(self.description.trim(), inputs),
            expected_output: interpolate_string(self.expected_output.trim(), inputs),
            agent: self.agent.clone(),
        }
    }
}

/// The full crew definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrewConfig {
    pub agents: HashMap<String, AgentConfig>,
    pub tasks: HashMap<String, TaskConfig>,
}

impl CrewConfig {
    /// Parse agent and task YAML documents.
    pub fn from_yaml_str(agents_yaml: &str, tasks_yaml: &str) -> Result<Self, WorkflowError> {
        let agents = serde_yaml::from_str(agents_yaml).map_err(|e| WorkflowError::Config {
            message: format!("invalid agents config: {}", e),
        })?;
        let tasks = serde_yaml::from_str(tasks_yaml).map_err(|e| WorkflowError::Config {
            message: format!("invalid tasks config: {}", e),
        })?;
        Ok(Self { agents, tasks })
    }

    /// The definitions compiled into the binary.
    pub fn embedded() -> Result<Self, WorkflowError> {
        Self::from_yaml_str(DEFAULT_AGENTS_YAML, DEFAULT_TASKS_YAML)
    }

    /// Load from `project_dir`, falling back to the embedded file for each
    /// document that is absent.
    pub fn load(project_dir: &Path) -> Result<Self, WorkflowError> {
        let agents = read_or_default(&project_dir.join(AGENTS_CONFIG), DEFAULT_AGENTS_YAML)?;
        let tasks = read_or_default(&project_dir.join(TASKS_CONFIG), DEFAULT_TASKS_YAML)?;
        let config = Self::from_yaml_str(&agents, &tasks)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every task kind is defined and names a known agent.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        for kind in TaskKind::ALL {
            self.resolve(kind)?;
        }
        Ok(())
    }

    /// The task definition for `kind` together with its agent.
    pub fn resolve(&self, kind: TaskKind) -> Result<(&TaskConfig, &AgentConfig), WorkflowError> {
        let task = self
            .tasks
            .get(kind.id())
            .ok_or_else(|| WorkflowError::UnknownTask {
                task: kind.id().to_string(),
            })?;
        let agent = self
            .agents
            .get(&task.agent)
            .ok_or_else(|| WorkflowError::UnknownAgent {
                agent: task.agent.clone(),
                task: kind.id().to_string(),
            })?;
        Ok((task, agent))
    }
}

fn read_or_default(path: &Path, default: &str) -> Result<String, WorkflowError> {
    if !path.exists() {
        return Ok(default.to_string());
    }
    log::debug!("Loading crew config from {}", path.display());
    fs::read_to_string(path).map_err(|source| WorkflowError::Storage {
        path: path.to_path_buf(),
        source,
    })
}

/// Replace every `{key}` in `template` with its input value.
///
/// The template is scanned once, left to right; substituted values are never
/// rescanned. Unknown placeholders are left untouched.
pub fn interpolate_string(template: &str, inputs: &HashMap<String, String>) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        result.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            result.push_str(&rest[open..]);
            return result;
        };
        match inputs.get(&after[..close]) {
            Some(value) => {
                result.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                result.push('{');
                rest = after;
            }
        }
    }
    result.push_str(rest);
    result
}
