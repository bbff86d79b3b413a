//! Spawned task: runs an [`AsyncTask`] on the current tokio runtime.
//!
//! The future's result completes the activation through a completer; on
//! cancel the spawned task is aborted.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::ai::AsyncTask;
use crate::context::NodeContext;
use crate::error::NodeFault;
use crate::graph::{Activation, FlowNode, InputValues, NodeInfo, NodeKind, PinSpec};
use crate::value::PinType;

#[derive(Default)]
struct Spawned(Option<JoinHandle<()>>);

pub struct SpawnedTaskNode<T: AsyncTask> {
    task: Arc<T>,
    outputs: Vec<String>,
}

impl<T: AsyncTask> SpawnedTaskNode<T> {
    /// Node with `Success` and `Failure` outputs.
    pub fn new(task: T) -> Self {
        Self::with_outputs(task, ["Success", "Failure"])
    }

    /// Node declaring the given output pins (untyped); the task's outcome
    /// must fire among them.
    pub fn with_outputs<I, S>(task: T, outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            task: Arc::new(task),
            outputs: outputs.into_iter().map(Into::into).collect(),
        }
    }
}

impl<T: AsyncTask> FlowNode for SpawnedTaskNode<T> {
    fn info(&self) -> NodeInfo {
        let info = NodeInfo::new(NodeKind::Task).input(PinSpec::input("In"));
        let info = self
            .outputs
            .iter()
            .fold(info, |info, name| info.output(PinSpec::data_output(name.as_str(), PinType::Any)));
        if self.outputs.iter().any(|o| o == "Failure") {
            info.fault_output("Failure")
        } else {
            info
        }
    }

    fn on_activate(
        &self,
        ctx: &mut NodeContext<'_>,
        inputs: &InputValues,
    ) -> Result<Activation, NodeFault> {
        let runtime = Handle::try_current()
            .map_err(|e| NodeFault::Subsystem(format!("no tokio runtime: {}", e)))?;
        let completer = ctx.completer();
        let task = Arc::clone(&self.task);
        let inputs = inputs.clone();
        let join = runtime.spawn(async move {
            match task.run(inputs).await {
                Ok(outcome) => completer.complete(outcome),
                Err(fault) => completer.fail(fault),
            }
        });
        if let Some(previous) = ctx.memory_mut::<Spawned>().0.replace(join) {
            previous.abort();
        }
        Ok(Activation::Running)
    }

    fn on_cancel(&self, ctx: &mut NodeContext<'_>) {
        if let Some(join) = ctx.take_memory::<Spawned>().and_then(|s| s.0) {
            join.abort();
        }
    }
}
