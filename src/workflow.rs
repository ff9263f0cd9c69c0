//! Workflow invocation.
//!
//! [`WorkflowRunner`] is the seam between the studio's own logic and the
//! engine that actually executes tasks. The free functions here forward a
//! request to the runner and wrap any failure with the [`EntryPoint`] that
//! issued it. Failures are never retried.

use async_trait::async_trait;

use crate::classifier::TaskSequence;
use crate::crew::{CrewOutput, TestReport};
use crate::error::{EntryPoint, StudioError, WorkflowError};
use crate::inputs::InputBundle;

/// Executes task sequences.
#[async_trait]
pub trait WorkflowRunner: Send + Sync {
    /// Run `tasks` with `inputs` interpolated into every task.
    async fn kickoff(&self, tasks: &TaskSequence, inputs: &InputBundle) -> Result<CrewOutput, WorkflowError>;

    /// Run the default crew `n_iterations` times, recording training data to `filename`.
    async fn train(&self, n_iterations: u32, filename: &str, inputs: &InputBundle) -> Result<(), WorkflowError>;

    /// Re-run the last kickoff starting at `task_id`.
    async fn replay(&self, task_id: &str) -> Result<CrewOutput, WorkflowError>;

    /// Run the default crew `n_iterations` times and score it with `eval_llm`.
    async fn test(&self, n_iterations: u32, eval_llm: &str, inputs: &InputBundle) -> Result<TestReport, WorkflowError>;
}

/// Forward `(tasks, inputs)` to the runner.
pub async fn invoke(
    runner: &dyn WorkflowRunner,
    entry_point: EntryPoint,
    tasks: &TaskSequence,
    inputs: &InputBundle,
) -> Result<CrewOutput, StudioError> {
    tracing::debug!(%entry_point, %tasks, topic = %inputs.topic, "invoking workflow");
    runner
        .kickoff(tasks, inputs)
        .await
        .map_err(|e| StudioError::workflow(entry_point, e))
}

pub async fn invoke_train(
    runner: &dyn WorkflowRunner,
    n_iterations: u32,
    filename: &str,
    inputs: &InputBundle,
) -> Result<(), StudioError> {
    runner
        .train(n_iterations, filename, inputs)
        .await
        .map_err(|e| StudioError::workflow(EntryPoint::Train, e))
}

pub async fn invoke_replay(runner: &dyn WorkflowRunner, task_id: &str) -> Result<CrewOutput, StudioError> {
    runner
        .replay(task_id)
        .await
        .map_err(|e| StudioError::workflow(EntryPoint::Replay, e))
}

pub async fn invoke_test(
    runner: &dyn WorkflowRunner,
    n_iterations: u32,
    eval_llm: &str,
    inputs: &InputBundle,
) -> Result<TestReport, StudioError> {
    runner
        .test(n_iterations, eval_llm, inputs)
        .await
        .map_err(|e| StudioError::workflow(EntryPoint::Test, e))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;
    use crate::crew::TaskOutput;

    /// A call received by [`RecordingRunner`].
    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Kickoff(TaskSequence, InputBundle),
        Train(u32, String, InputBundle),
        Replay(String),
        Test(u32, String, InputBundle),
    }

    /// Records calls and answers with a fixed output, or fails every call.
    #[derive(Default)]
    pub struct RecordingRunner {
        pub calls: Mutex<Vec<Call>>,
        pub fail_with: Option<String>,
    }

    impl RecordingRunner {
        pub fn failing(message: &str) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_with: Some(message.to_string()),
            }
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn answer<T>(&self, call: Call, ok: T) -> Result<T, WorkflowError> {
            self.calls.lock().unwrap().push(call);
            match &self.fail_with {
                Some(message) => Err(WorkflowError::Llm {
                    message: message.clone(),
                }),
                None => Ok(ok),
            }
        }

        fn output(tasks: &TaskSequence) -> CrewOutput {
            let tasks_output = tasks
                .iter()
                .map(|task| TaskOutput {
                    task,
                    description: String::new(),
                    expected_output: String::new(),
                    agent: "test".to_string(),
                    raw: format!("{} done", task),
                })
                .collect();
            CrewOutput::from_task_outputs(tasks_output).unwrap()
        }
    }

    #[async_trait]
    impl WorkflowRunner for RecordingRunner {
        async fn kickoff(&self, tasks: &TaskSequence, inputs: &InputBundle) -> Result<CrewOutput, WorkflowError> {
            self.answer(Call::Kickoff(tasks.clone(), inputs.clone()), Self::output(tasks))
        }

        async fn train(&self, n_iterations: u32, filename: &str, inputs: &InputBundle) -> Result<(), WorkflowError> {
            self.answer(Call::Train(n_iterations, filename.to_string(), inputs.clone()), ())
        }

        async fn replay(&self, task_id: &str) -> Result<CrewOutput, WorkflowError> {
            self.answer(
                Call::Replay(task_id.to_string()),
                Self::output(&TaskSequence::research_and_brew()),
            )
        }

        async fn test(&self, n_iterations: u32, eval_llm: &str, inputs: &InputBundle) -> Result<TestReport, WorkflowError> {
            self.answer(
                Call::Test(n_iterations, eval_llm.to_string(), inputs.clone()),
                TestReport::new(eval_llm, n_iterations),
            )
        }
    }
}
