//! Command procedures behind the `run`, `train`, `replay` and `test`
//! subcommands.
//!
//! Each one gathers its inputs, forwards them through
//! [`workflow`](crate::workflow), and propagates failures unchanged. The
//! current year is passed in by the caller.

use std::io::{BufRead, Write};
use std::path::Path;

use crate::classifier::classify_interactive_request;
use crate::crew::{CrewOutput, TestReport};
use crate::error::{EntryPoint, StudioError};
use crate::inputs::{assemble, assemble_fixed};
use crate::preferences::read_preferences;
use crate::workflow::{invoke, invoke_replay, invoke_test, invoke_train, WorkflowRunner};

/// Prompt shown by `run`.
pub const RUN_PROMPT: &str = "If you want to get coffee brewing advice, please enter `brewing: <your coffee requirement>\n\
If you want to get self introduction, please enter `self introduction`\n\
Please enter your request here: ";

/// Read one line from `input`, without its line terminator.
fn read_request<R: BufRead>(input: &mut R) -> Result<String, StudioError> {
    let mut line = String::new();
    input
        .read_line(&mut line)
        .map_err(|source| StudioError::Input { source })?;
    let trimmed = line.strip_suffix('\n').unwrap_or(&line);
    let trimmed = trimmed.strip_suffix('\r').unwrap_or(trimmed);
    Ok(trimmed.to_string())
}

/// Interactive run: read preferences (required), prompt for a request,
/// classify it and kick off the crew.
pub async fn run<R: BufRead, W: Write>(
    runner: &dyn WorkflowRunner,
    preference_path: &Path,
    current_year: i32,
    input: &mut R,
    output: &mut W,
) -> Result<CrewOutput, StudioError> {
    let user_preference = read_preferences(preference_path)?;

    write!(output, "{}", RUN_PROMPT).map_err(|source| StudioError::Input { source })?;
    output.flush().map_err(|source| StudioError::Input { source })?;
    let topic = read_request(input)?;

    let tasks = classify_interactive_request(&topic);
    let inputs = assemble(&topic, current_year, &user_preference);
    tracing::info!(%tasks, "running crew");
    invoke(runner, EntryPoint::Run, &tasks, &inputs).await
}

/// Train the crew for `n_iterations`, saving to `filename`.
pub async fn train(
    runner: &dyn WorkflowRunner,
    n_iterations: u32,
    filename: &str,
    current_year: i32,
) -> Result<(), StudioError> {
    invoke_train(runner, n_iterations, filename, &assemble_fixed(current_year)).await
}

/// Replay the last kickoff from `task_id`.
pub async fn replay(runner: &dyn WorkflowRunner, task_id: &str) -> Result<CrewOutput, StudioError> {
    invoke_replay(runner, task_id).await
}

/// Test the crew for `n_iterations`, scored by `eval_llm`.
pub async fn test(
    runner: &dyn WorkflowRunner,
    n_iterations: u32,
    eval_llm: &str,
    current_year: i32,
) -> Result<TestReport, StudioError> {
    invoke_test(runner, n_iterations, eval_llm, &assemble_fixed(current_year)).await
}
