//! The message handler behind the bridge.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::bridge::MessageHandler;
use crate::classifier::{classify_bridge_request, TaskSequence};
use crate::error::{EntryPoint, StudioError};
use crate::inputs::{assemble_bridge, current_year, InputBundle};
use crate::preferences::load_preferences;
use crate::workflow::{invoke, WorkflowRunner};

/// Routes inbound messages to the crew.
///
/// The preference file is re-read for every message and may be absent.
#[derive(Clone)]
pub struct StudioHandler {
    runner: Arc<dyn WorkflowRunner>,
    preference_path: PathBuf,
    clock: fn() -> i32,
}

impl StudioHandler {
    pub fn new(runner: Arc<dyn WorkflowRunner>, preference_path: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            preference_path: preference_path.into(),
            clock: current_year,
        }
    }

    /// Replace the year source.
    pub fn with_clock(mut self, clock: fn() -> i32) -> Self {
        self.clock = clock;
        self
    }

    /// Classify and assemble a message without running anything.
    ///
    /// Surrounding whitespace is stripped before both steps.
    pub fn prepare(&self, message: &str) -> (TaskSequence, InputBundle) {
        let message = message.trim();
        let tasks = classify_bridge_request(message);
        let inputs = assemble_bridge(
            message,
            (self.clock)(),
            &load_preferences(&self.preference_path),
        );
        (tasks, inputs)
    }
}

#[async_trait]
impl MessageHandler for StudioHandler {
    async fn handle(&self, message: &str) -> Result<String, StudioError> {
        let (tasks, inputs) = self.prepare(message);
        tracing::info!(%tasks, "bridge request");
        let output = invoke(self.runner.as_ref(), EntryPoint::Run, &tasks, &inputs).await?;
        Ok(output.to_string())
    }
}
