//! Backend request and response handling.

use crate::project::domain::ProjectId;
use crate::task::domain::{Task, TaskId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Input handed to the execution backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// Task being executed.
    pub task_id: TaskId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Task title.
    pub title: String,
    /// Task description.
    pub description: Option<String>,
    /// Task metadata passed through as context.
    pub context: BTreeMap<String, Value>,
}

impl ExecutionRequest {
    /// Builds the request for `task`.
    #[must_use]
    pub fn from_task(task: &Task) -> Self {
        Self {
            task_id: task.id(),
            project_id: task.project_id(),
            title: task.title().to_owned(),
            description: task.description().map(ToOwned::to_owned),
            context: task.metadata().clone(),
        }
    }
}

/// Extracts the result text from a backend response.
///
/// A `result` field wins over a `content` field; without either, the whole
/// response is serialised. String values are used verbatim.
#[must_use]
pub fn extract_result(response: &Value) -> String {
    let picked = response
        .get("result")
        .or_else(|| response.get("content"))
        .unwrap_or(response);
    match picked {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
