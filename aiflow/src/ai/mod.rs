//! AI subsystem interface.
//!
//! Task nodes hand requests (move-to, perception query, montage wait) to an
//! engine-provided [`AiSubsystem`] and get a [`TaskHandle`] back. The subsystem
//! reports completion through the [`Completer`] it was given; the node cancels
//! the handle when the context cancels it.
//!
//! [`AsyncTask`] is the async flavour: a future run on the current tokio
//! runtime by [`SpawnedTaskNode`](crate::nodes::SpawnedTaskNode).

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::context::Completer;
use crate::error::NodeFault;
use crate::graph::{InputValues, Outcome};
use crate::value::Value;

/// Request issued by a task node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiRequest {
    /// Operation name understood by the subsystem (e.g. `move_to`).
    pub action: String,
    #[serde(default)]
    pub params: BTreeMap<String, Value>,
}

impl AiRequest {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// How an AI task ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    /// Fires `Success`, with the payload when present.
    Succeeded(Option<Value>),
    /// Fires `Failure`.
    Failed,
}

impl From<TaskOutcome> for Outcome {
    fn from(outcome: TaskOutcome) -> Self {
        match outcome {
            TaskOutcome::Succeeded(Some(value)) => Outcome::success().fire_value("Success", value),
            TaskOutcome::Succeeded(None) => Outcome::success().fire("Success"),
            TaskOutcome::Failed => Outcome::failure().fire("Failure"),
        }
    }
}

/// Handle to an issued request.
pub trait TaskHandle: Send {
    /// Stops the operation. The subsystem must not complete it afterwards;
    /// if it does, the completion is discarded as stale.
    fn cancel(&mut self);
}

/// Engine-side collaborator that executes AI requests.
pub trait AiSubsystem: Send + Sync {
    fn issue(
        &self,
        request: &AiRequest,
        completer: Completer,
    ) -> Result<Box<dyn TaskHandle>, NodeFault>;
}

/// Async work run by a [`SpawnedTaskNode`](crate::nodes::SpawnedTaskNode).
#[async_trait]
pub trait AsyncTask: Send + Sync + 'static {
    async fn run(&self, inputs: InputValues) -> Result<Outcome, NodeFault>;
}
