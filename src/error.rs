//! Error types for the studio.
//!
//! [`StudioError`] is what entry points and the bridge handler return;
//! [`WorkflowError`] is what a [`WorkflowRunner`](crate::workflow::WorkflowRunner)
//! reports. Entry points wrap the latter with an [`EntryPoint`] prefix so the
//! message says which command failed.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Exit code used when the bridge is started without its required environment.
pub const MISSING_ENV_EXIT_CODE: i32 = 2;

/// The command that invoked the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPoint {
    Run,
    Train,
    Replay,
    Test,
}

impl EntryPoint {
    /// Gerund used in the failure prefix, e.g. `"running"`.
    pub fn verb(self) -> &'static str {
        match self {
            Self::Run => "running",
            Self::Train => "training",
            Self::Replay => "replaying",
            Self::Test => "testing",
        }
    }

    /// Fixed prefix carried by every wrapped workflow failure.
    pub fn failure_prefix(self) -> String {
        format!("An error occurred while {} the crew", self.verb())
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Run => write!(f, "run"),
            Self::Train => write!(f, "train"),
            Self::Replay => write!(f, "replay"),
            Self::Test => write!(f, "test"),
        }
    }
}

/// Errors raised by a workflow runner.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Agent or task configuration could not be loaded.
    #[error("Crew configuration error: {message}")]
    Config { message: String },

    /// A task sequence referenced a task with no definition.
    #[error("Task '{task}' is not defined in the tasks configuration")]
    UnknownTask { task: String },

    /// A task references an agent with no definition.
    #[error("Agent '{agent}' required by task '{task}' is not defined")]
    UnknownAgent { agent: String, task: String },

    /// The language model call failed.
    #[error("LLM call failed: {message}")]
    Llm { message: String },

    /// Training data or task outputs could not be persisted or read.
    #[error("Storage error at {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stored data was present but malformed.
    #[error("Corrupt data in {}: {message}", .path.display())]
    CorruptData { path: PathBuf, message: String },

    /// The crew finished without any non-empty task output.
    #[error("No valid task outputs available to create crew output.")]
    NoOutput,

    /// Replay was asked for a task that the last kickoff did not run.
    #[error("Task '{task_id}' not found in the last kickoff; run the crew first")]
    ReplayNotFound { task_id: String },

    /// Invalid arguments, such as zero iterations.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },
}

/// Errors surfaced at entry-point and bridge boundaries.
#[derive(Debug, Error)]
pub enum StudioError {
    /// A required environment variable is absent or empty.
    #[error("Missing required environment variable(s): {}", .names.join(", "))]
    MissingEnv { names: Vec<&'static str> },

    /// The user preference file could not be read.
    #[error("Failed to read user preferences from {}: {source}", .path.display())]
    PreferenceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The workflow failed; rendered as `"<prefix>: <source>"`.
    #[error("{}: {source}", .entry_point.failure_prefix())]
    Workflow {
        entry_point: EntryPoint,
        #[source]
        source: WorkflowError,
    },

    /// The bridge could not be started or crashed while serving.
    #[error("Bridge error: {message}")]
    Bridge { message: String },

    /// Reading the interactive prompt failed.
    #[error("Failed to read input: {source}")]
    Input {
        #[source]
        source: std::io::Error,
    },
}

impl StudioError {
    /// Wrap a workflow failure for the given entry point.
    pub fn workflow(entry_point: EntryPoint, source: WorkflowError) -> Self {
        Self::Workflow {
            entry_point,
            source,
        }
    }
}
