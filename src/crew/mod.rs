//! The studio crew.
//!
//! A sequential crew: each task in the selected [`TaskSequence`] is executed
//! by its configured agent, with the outputs of the earlier tasks passed
//! along as context. Every kickoff is written to the replay store so
//! `replay` can resume from any task of the last run.

pub mod config;
pub mod output;
pub mod storage;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::classifier::{TaskKind, TaskSequence};
use crate::config::StudioConfig;
use crate::error::WorkflowError;
use crate::inputs::InputBundle;
use crate::llm::{ChatCompletionsClient, ChatMessage, LlmClient};
use crate::workflow::WorkflowRunner;

pub use config::{AgentConfig, CrewConfig, TaskConfig};
pub use output::{CrewOutput, TaskOutput, TaskScores, TestReport};
pub use storage::{KickoffRecord, TaskOutputStorage, TrainingHandler};

/// Separator placed between earlier task outputs in the context block.
const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

pub struct Crew {
    config: CrewConfig,
    llm: Arc<dyn LlmClient>,
    /// Model for agents without an `llm` override.
    model: String,
    storage: TaskOutputStorage,
    /// Tasks run by `train` and `test`.
    default_tasks: TaskSequence,
}

impl std::fmt::Debug for Crew {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crew")
            .field("agents", &self.config.agents.keys().collect::<Vec<_>>())
            .field("tasks", &self.config.tasks.keys().collect::<Vec<_>>())
            .field("model", &self.model)
            .field("storage", &self.storage)
            .field("default_tasks", &self.default_tasks)
            .finish_non_exhaustive()
    }
}

impl Crew {
    pub fn new(
        config: CrewConfig,
        llm: Arc<dyn LlmClient>,
        model: impl Into<String>,
        storage_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            config,
            llm,
            model: model.into(),
            storage: TaskOutputStorage::new(storage_dir),
            default_tasks: TaskSequence::research_and_brew(),
        }
    }

    /// Build the crew from the project directory and LLM settings.
    pub fn from_config(studio: &StudioConfig) -> Result<Self, WorkflowError> {
        let config = CrewConfig::load(&studio.project_dir)?;
        let llm = ChatCompletionsClient::from_config(studio)?;
        Ok(Self::new(
            config,
            Arc::new(llm),
            studio.model.clone(),
            studio.task_output_dir(),
        ))
    }

    pub fn storage(&self) -> &TaskOutputStorage {
        &self.storage
    }

    /// Run `tasks` in order on top of `prior` outputs and return all outputs.
    async fn execute(
        &self,
        tasks: &[TaskKind],
        inputs: &HashMap<String, String>,
        mut outputs: Vec<TaskOutput>,
    ) -> Result<Vec<TaskOutput>, WorkflowError> {
        for &kind in tasks {
            let (task, agent) = self.config.resolve(kind)?;
            let task = task.interpolated(inputs);
            let agent = agent.interpolated(inputs);
            let model = agent.llm.as_deref().unwrap_or(&self.model);

            let context = if outputs.is_empty() {
                None
            } else {
                Some(
                    outputs
                        .iter()
                        .map(|o| o.raw.as_str())
                        .collect::<Vec<_>>()
                        .join(CONTEXT_SEPARATOR),
                )
            };

            log::info!("Executing task {} with agent '{}'", kind, agent.role);
            let messages = build_messages(&agent, &task, context.as_deref());
            let raw = self.llm.complete(model, &messages).await?;
            let output = TaskOutput {
                task: kind,
                description: task.description,
                expected_output: task.expected_output,
                agent: agent.role,
                raw,
            };
            log::debug!(
                "Task {} finished ({} chars): {}",
                kind,
                output.raw.len(),
                output.summary()
            );
            outputs.push(output);
        }
        Ok(outputs)
    }

    fn persist(&self, record: &KickoffRecord) {
        if let Err(e) = self.storage.save(record) {
            log::warn!("Failed to store task outputs for replay: {}", e);
        }
    }

    async fn kickoff_tasks(&self, tasks: &TaskSequence, inputs: &InputBundle) -> Result<CrewOutput, WorkflowError> {
        let outputs = self.execute(tasks.tasks(), &inputs.to_map(), Vec::new()).await?;
        self.persist(&KickoffRecord::new(
            inputs.clone(),
            tasks.tasks().to_vec(),
            outputs.clone(),
        ));
        CrewOutput::from_task_outputs(outputs)
    }

    /// Ask `eval_llm` to rate one task output.
    async fn evaluate(&self, eval_llm: &str, output: &TaskOutput) -> Result<f64, WorkflowError> {
        let messages = vec![
            ChatMessage::system(
                "You are an impartial evaluator of AI agent work. \
                 Rate how well the output fulfils the task and its expected output.",
            ),
            ChatMessage::user(format!(
                "Task: {}\n\nExpected output: {}\n\nActual output:\n{}\n\n\
                 Rate the output on a scale of 1 to 10 where 10 is best. \
                 Respond with the number only.",
                output.description, output.expected_output, output.raw
            )),
        ];
        let reply = self.llm.complete(eval_llm, &messages).await?;
        parse_score(&reply).ok_or_else(|| WorkflowError::Llm {
            message: format!("evaluator returned no score: {}", reply.trim()),
        })
    }
}

fn build_messages(agent: &AgentConfig, task: &TaskConfig, context: Option<&str>) -> Vec<ChatMessage> {
    let system = format!(
        "You are {}. {}\nYour personal goal is: {}",
        agent.role, agent.backstory, agent.goal
    );
    let mut user = format!(
        "Current Task: {}\n\nThis is the expected criteria for your final answer: {}\n\
         you MUST return the actual complete content as the final answer, not a summary.",
        task.description, task.expected_output
    );
    if let Some(ctx) = context {
        user.push_str("\n\nThis is the context you're working with:\n");
        user.push_str(ctx);
    }
    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

/// First number in `text` within the 1..=10 scoring scale.
pub fn parse_score(text: &str) -> Option<f64> {
    text.split(|c: char| !(c.is_ascii_digit() || c == '.'))
        .filter(|token| !token.is_empty())
        .filter_map(|token| token.trim_end_matches('.').parse::<f64>().ok())
        .find(|score| (1.0..=10.0).contains(score))
}

#[async_trait]
impl WorkflowRunner for Crew {
    async fn kickoff(&self, tasks: &TaskSequence, inputs: &InputBundle) -> Result<CrewOutput, WorkflowError> {
        log::info!("Crew kickoff: tasks={}", tasks);
        self.kickoff_tasks(tasks, inputs).await
    }

    async fn train(&self, n_iterations: u32, filename: &str, inputs: &InputBundle) -> Result<(), WorkflowError> {
        if n_iterations == 0 {
            return Err(WorkflowError::InvalidArgument {
                message: "n_iterations must be at least 1".to_string(),
            });
        }
        let handler = TrainingHandler::new(filename);
        for iteration in 0..n_iterations {
            log::info!("Training iteration {}/{}", iteration + 1, n_iterations);
            let result = self.kickoff_tasks(&self.default_tasks, inputs).await?;
            for output in &result.tasks_output {
                let (task, _) = self.config.resolve(output.task)?;
                handler.append(
                    &task.agent,
                    serde_json::json!({
                        "iteration": iteration,
                        "task": output.task.id(),
                        "description": output.description,
                        "output": output.raw,
                    }),
                )?;
            }
        }
        log::info!("Training data written to {}", handler.path().display());
        Ok(())
    }

    async fn replay(&self, task_id: &str) -> Result<CrewOutput, WorkflowError> {
        let not_found = || WorkflowError::ReplayNotFound {
            task_id: task_id.to_string(),
        };
        let record = self.storage.load()?.ok_or_else(not_found)?;
        let start = record.position(task_id).ok_or_else(not_found)?;

        log::info!("Replaying kickoff {} from task {}", record.kickoff_id, task_id);
        let prior: Vec<TaskOutput> = record.outputs.iter().take(start).cloned().collect();
        let outputs = self
            .execute(&record.tasks[start..], &record.inputs.to_map(), prior)
            .await?;
        self.persist(&KickoffRecord::new(
            record.inputs.clone(),
            record.tasks.clone(),
            outputs.clone(),
        ));
        CrewOutput::from_task_outputs(outputs)
    }

    async fn test(&self, n_iterations: u32, eval_llm: &str, inputs: &InputBundle) -> Result<TestReport, WorkflowError> {
        if n_iterations == 0 {
            return Err(WorkflowError::InvalidArgument {
                message: "n_iterations must be at least 1".to_string(),
            });
        }
        let mut report = TestReport::new(eval_llm, n_iterations);
        for iteration in 0..n_iterations {
            log::info!("Test iteration {}/{}", iteration + 1, n_iterations);
            let result = self.kickoff_tasks(&self.default_tasks, inputs).await?;
            for output in &result.tasks_output {
                let score = self.evaluate(eval_llm, output).await?;
                report.record(output.task, score);
            }
        }
        Ok(report)
    }
}
