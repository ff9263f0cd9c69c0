//! Results of crew executions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::classifier::TaskKind;
use crate::error::WorkflowError;

/// The result of one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutput {
    pub task: TaskKind,
    /// Interpolated task description.
    pub description: String,
    pub expected_output: String,
    /// Role of the agent that produced the output.
    pub agent: String,
    pub raw: String,
}

impl TaskOutput {
    /// First ten words of the description followed by an ellipsis.
    pub fn summary(&self) -> String {
        let words: Vec<&str> = self.description.split_whitespace().take(10).collect();
        format!("{}...", words.join(" "))
    }
}

/// The result of a crew kickoff or replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewOutput {
    /// Raw output of the final task.
    pub raw: String,
    /// Output of each task, in execution order.
    pub tasks_output: Vec<TaskOutput>,
}

impl CrewOutput {
    /// Build from task outputs. The final raw text is the last non-empty one.
    pub fn from_task_outputs(tasks_output: Vec<TaskOutput>) -> Result<Self, WorkflowError> {
        let raw = tasks_output
            .iter()
            .rev()
            .find(|t| !t.raw.trim().is_empty())
            .map(|t| t.raw.clone())
            .ok_or(WorkflowError::NoOutput)?;
        Ok(Self { raw, tasks_output })
    }
}

impl fmt::Display for CrewOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Scores one task received across test iterations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskScores {
    pub task: TaskKind,
    pub scores: Vec<f64>,
}

impl TaskScores {
    pub fn mean(&self) -> Option<f64> {
        if self.scores.is_empty() {
            None
        } else {
            Some(self.scores.iter().sum::<f64>() / self.scores.len() as f64)
        }
    }
}

/// Evaluation summary produced by `test`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestReport {
    pub eval_llm: String,
    pub iterations: u32,
    pub tasks: Vec<TaskScores>,
}

impl TestReport {
    pub fn new(eval_llm: impl Into<String>, iterations: u32) -> Self {
        Self {
            eval_llm: eval_llm.into(),
            iterations,
            tasks: Vec::new(),
        }
    }

    /// Record a score for `task`, keeping first-seen task order.
    pub fn record(&mut self, task: TaskKind, score: f64) {
        match self.tasks.iter_mut().find(|t| t.task == task) {
            Some(entry) => entry.scores.push(score),
            None => self.tasks.push(TaskScores {
                task,
                scores: vec![score],
            }),
        }
    }

    /// Mean over every recorded score.
    pub fn overall(&self) -> Option<f64> {
        let all: Vec<f64> = self.tasks.iter().flat_map(|t| t.scores.iter().copied()).collect();
        if all.is_empty() {
            None
        } else {
            Some(all.iter().sum::<f64>() / all.len() as f64)
        }
    }
}

impl fmt::Display for TestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Task scores (1-10 higher is better), {} iteration(s), evaluated by {}",
            self.iterations, self.eval_llm
        )?;
        writeln!(f, "{:<16} {:>30} {:>8}", "Task", "Runs", "Avg")?;
        for entry in &self.tasks {
            let runs: Vec<String> = entry.scores.iter().map(|s| format!("{:.1}", s)).collect();
            let avg = entry.mean().map(|m| format!("{:.1}", m)).unwrap_or_default();
            writeln!(f, "{:<16} {:>30} {:>8}", entry.task.id(), runs.join(" "), avg)?;
        }
        if let Some(overall) = self.overall() {
            write!(f, "{:<16} {:>30} {:>8.1}", "Crew", "", overall)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(task: TaskKind, raw: &str) -> TaskOutput {
        TaskOutput {
            task,
            description: "Conduct thorough research about cold brew given the current year is 2026".to_string(),
            expected_output: "Bullets".to_string(),
            agent: "Coffee Research Specialist".to_string(),
            raw: raw.to_string(),
        }
    }

    #[test]
    fn test_crew_output_uses_last_non_empty() {
        let out = CrewOutput::from_task_outputs(vec![
            output(TaskKind::Research, "findings"),
            output(TaskKind::Brew, "  "),
        ])
        .unwrap();
        assert_eq!(out.raw, "findings");
        assert_eq!(out.to_string(), "findings");
        assert_eq!(out.tasks_output.len(), 2);
    }

    #[test]
    fn test_crew_output_requires_content() {
        assert!(matches!(
            CrewOutput::from_task_outputs(vec![output(TaskKind::Research, "")]),
            Err(WorkflowError::NoOutput)
        ));
        assert!(CrewOutput::from_task_outputs(Vec::new()).is_err());
    }

    #[test]
    fn test_summary() {
        assert_eq!(
            output(TaskKind::Research, "x").summary(),
            "Conduct thorough research about cold brew given the current year..."
        );
    }

    #[test]
    fn test_report_means_and_table() {
        let mut report = TestReport::new("gpt-4o", 2);
        report.record(TaskKind::Research, 8.0);
        report.record(TaskKind::Brew, 6.0);
        report.record(TaskKind::Research, 9.0);
        report.record(TaskKind::Brew, 7.0);

        assert_eq!(report.tasks[0].task, TaskKind::Research);
        assert_eq!(report.tasks[0].mean(), Some(8.5));
        assert_eq!(report.tasks[1].mean(), Some(6.5));
        assert_eq!(report.overall(), Some(7.5));

        let table = report.to_string();
        assert!(table.contains("evaluated by gpt-4o"));
        assert!(table.contains("research_task"));
        assert!(table.contains("8.5"));
        assert!(table.contains("7.5"));
    }
}
