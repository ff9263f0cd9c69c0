//! # MIT AI Studio
//!
//! A coffee crew: it classifies a free-text request into a task sequence
//! ("introduce yourself" or "research and brew coffee"), assembles the kickoff
//! inputs with the user's preferences, and runs the crew. The same pipeline
//! can be exposed over HTTP through the bridge.
//!
//! The crew and the bridge sit behind the [`WorkflowRunner`] and
//! [`bridge::Bridge`] traits; [`Crew`] and [`bridge::HttpBridge`] are the
//! bundled implementations.

pub mod bridge;
pub mod classifier;
pub mod config;
pub mod crew;
pub mod entry;
pub mod error;
pub mod inputs;
pub mod llm;
pub mod logging;
pub mod preferences;
pub mod workflow;

pub use classifier::{classify_bridge_request, classify_interactive_request, TaskKind, TaskSequence};
pub use config::StudioConfig;
pub use crew::{Crew, CrewOutput, TestReport};
pub use error::{EntryPoint, StudioError, WorkflowError};
pub use inputs::{assemble, assemble_bridge, assemble_fixed, InputBundle};
pub use preferences::{load_preferences, read_preferences, USER_PREFERENCE_PATH};
pub use workflow::{invoke, WorkflowRunner};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
