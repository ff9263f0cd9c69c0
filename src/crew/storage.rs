//! JSON persistence for replay and training data.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::classifier::TaskKind;
use crate::crew::output::TaskOutput;
use crate::error::WorkflowError;
use crate::inputs::InputBundle;

fn storage_error(path: &Path) -> impl FnOnce(std::io::Error) -> WorkflowError + '_ {
    move |source| WorkflowError::Storage {
        path: path.to_path_buf(),
        source,
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, WorkflowError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(storage_error(path))?;
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| WorkflowError::CorruptData {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<(), WorkflowError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(storage_error(dir))?;
    }
    let content = serde_json::to_string_pretty(data).map_err(|e| WorkflowError::CorruptData {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    fs::write(path, content).map_err(storage_error(path))
}

/// Everything needed to replay a kickoff from one of its tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KickoffRecord {
    pub kickoff_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub inputs: InputBundle,
    /// The full task sequence, including tasks that were replayed.
    pub tasks: Vec<TaskKind>,
    pub outputs: Vec<TaskOutput>,
}

impl KickoffRecord {
    pub fn new(inputs: InputBundle, tasks: Vec<TaskKind>, outputs: Vec<TaskOutput>) -> Self {
        Self {
            kickoff_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            inputs,
            tasks,
            outputs,
        }
    }

    /// Index of `task_id` within the recorded sequence.
    pub fn position(&self, task_id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.id() == task_id)
    }
}

/// Stores the task outputs of the latest kickoff.
#[derive(Debug, Clone)]
pub struct TaskOutputStorage {
    directory: PathBuf,
}

impl TaskOutputStorage {
    pub const FILE_NAME: &'static str = "task_outputs.json";

    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.directory.join(Self::FILE_NAME)
    }

    pub fn save(&self, record: &KickoffRecord) -> Result<(), WorkflowError> {
        write_json(&self.path(), record)
    }

    /// The latest record, or `None` when nothing was stored yet.
    pub fn load(&self) -> Result<Option<KickoffRecord>, WorkflowError> {
        read_json(&self.path())
    }
}

/// Appends per-agent training entries to a JSON file.
///
/// The file holds an object keyed by agent name; each value is the list of
/// entries recorded for that agent.
#[derive(Debug, Clone)]
pub struct TrainingHandler {
    path: PathBuf,
}

impl TrainingHandler {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Value, WorkflowError> {
        Ok(read_json(&self.path)?.unwrap_or_else(|| Value::Object(Default::default())))
    }

    pub fn append(&self, agent: &str, entry: Value) -> Result<(), WorkflowError> {
        let mut data = self.load()?;
        let map = data.as_object_mut().ok_or_else(|| WorkflowError::CorruptData {
            path: self.path.clone(),
            message: "training data must be a JSON object".to_string(),
        })?;
        let entries = map
            .entry(agent.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        match entries {
            Value::Array(arr) => arr.push(entry),
            _ => {
                return Err(WorkflowError::CorruptData {
                    path: self.path.clone(),
                    message: format!("entries for '{}' must be a JSON array", agent),
                })
            }
        }
        write_json(&self.path, &data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::assemble_fixed;

    fn record() -> KickoffRecord {
        KickoffRecord::new(
            assemble_fixed(2026),
            vec![TaskKind::Research, TaskKind::Brew],
            vec![TaskOutput {
                task: TaskKind::Research,
                description: "d".to_string(),
                expected_output: "e".to_string(),
                agent: "Coffee Research Specialist".to_string(),
                raw: "findings".to_string(),
            }],
        )
    }

    #[test]
    fn test_task_output_storage_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let storage = TaskOutputStorage::new(dir.path().join("task_outputs"));
        assert!(storage.load().unwrap().is_none());

        let rec = record();
        storage.save(&rec).unwrap();
        let loaded = storage.load().unwrap().unwrap();
        assert_eq!(loaded, rec);
        assert_eq!(loaded.position("brew_task"), Some(1));
        assert_eq!(loaded.position("intro_task"), None);
    }

    #[test]
    fn test_corrupt_store() {
        let dir = tempfile::tempdir().unwrap();
        let storage = TaskOutputStorage::new(dir.path());
        fs::write(storage.path(), "not json").unwrap();
        assert!(matches!(storage.load(), Err(WorkflowError::CorruptData { .. })));
    }

    #[test]
    fn test_training_append_groups_by_agent() {
        let dir = tempfile::tempdir().unwrap();
        let handler = TrainingHandler::new(dir.path().join("trained.json"));

        handler.append("researcher", serde_json::json!({"iteration": 0})).unwrap();
        handler.append("barista", serde_json::json!({"iteration": 0})).unwrap();
        handler.append("researcher", serde_json::json!({"iteration": 1})).unwrap();

        let data = handler.load().unwrap();
        assert_eq!(data["researcher"].as_array().unwrap().len(), 2);
        assert_eq!(data["barista"][0]["iteration"], 0);
    }

    #[test]
    fn test_training_rejects_non_object_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trained.json");
        fs::write(&path, "[1, 2]").unwrap();
        let handler = TrainingHandler::new(&path);
        assert!(matches!(
            handler.append("researcher", Value::Null),
            Err(WorkflowError::CorruptData { .. })
        ));
    }
}
