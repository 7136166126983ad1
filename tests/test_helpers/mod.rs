//! Execution backend double shared by integration and behaviour tests.

use async_trait::async_trait;
use orchestrion::execution::{
    domain::ExecutionRequest,
    ports::{ExecutionBackend, ExecutionBackendError},
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Mutex;

/// Backend answering from a script keyed by task title.
///
/// Titles without a scripted failure succeed with `done: <title>`.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    always_fail: Option<String>,
    transient_failures: Mutex<HashMap<String, u32>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    /// Creates a backend that succeeds for every task.
    #[must_use]
    pub fn succeeding() -> Self {
        Self::default()
    }

    /// Creates a backend that fails every call with `message`.
    #[must_use]
    pub fn failing(message: &str) -> Self {
        Self {
            always_fail: Some(message.to_owned()),
            ..Self::default()
        }
    }

    /// Makes the task titled `title` fail `times` times before succeeding.
    #[must_use]
    pub fn failing_first(self, title: &str, times: u32) -> Self {
        self.transient_failures
            .lock()
            .expect("script lock")
            .insert(title.to_owned(), times);
        self
    }

    /// Returns the titles of every executed request, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl ExecutionBackend for ScriptedBackend {
    async fn execute(&self, request: ExecutionRequest) -> Result<Value, ExecutionBackendError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push(request.title.clone());
        if let Some(message) = &self.always_fail {
            return Err(ExecutionBackendError(message.clone()));
        }
        let mut failures = self.transient_failures.lock().expect("script lock");
        if let Some(remaining) = failures.get_mut(&request.title) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(ExecutionBackendError(format!(
                    "transient failure in {}",
                    request.title
                )));
            }
        }
        Ok(json!({ "result": format!("done: {}", request.title) }))
    }
}
