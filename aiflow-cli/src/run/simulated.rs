//! Simulated AI subsystem: every request completes after a delay.
//!
//! Request params understood:
//! - `duration` (float seconds, default 0): how long the action takes
//! - `fail` (bool, default false): report failure instead of success
//!
//! The payload of a successful request is its `Target` param, when present.

use std::time::Duration;

use aiflow::ai::{AiRequest, AiSubsystem, TaskHandle, TaskOutcome};
use aiflow::context::Completer;
use aiflow::error::NodeFault;
use aiflow::value::Value;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedSubsystem;

struct SimulatedTask(JoinHandle<()>);

impl TaskHandle for SimulatedTask {
    fn cancel(&mut self) {
        self.0.abort();
    }
}

impl AiSubsystem for SimulatedSubsystem {
    fn issue(
        &self,
        request: &AiRequest,
        completer: Completer,
    ) -> Result<Box<dyn TaskHandle>, NodeFault> {
        let runtime = Handle::try_current()
            .map_err(|e| NodeFault::Subsystem(format!("simulated agent needs tokio: {}", e)))?;
        let seconds = match request.params.get("duration") {
            Some(Value::Float(s)) if s.is_finite() => s.max(0.0),
            Some(Value::Int(s)) => (*s).max(0) as f32,
            Some(other) => {
                return Err(NodeFault::Subsystem(format!(
                    "duration must be a number, got {}",
                    other
                )))
            }
            None => 0.0,
        };
        let fail = request
            .params
            .get("fail")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let payload = request.params.get("Target").cloned();
        let delay = Duration::try_from_secs_f32(seconds).map_err(|e| {
            NodeFault::Subsystem(format!("duration {} is out of range: {}", seconds, e))
        })?;

        tracing::debug!(action = %request.action, seconds, fail, "simulated request issued");
        let join = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let outcome = if fail {
                TaskOutcome::Failed
            } else {
                TaskOutcome::Succeeded(payload)
            };
            completer.complete(outcome);
        });
        Ok(Box::new(SimulatedTask(join)))
    }
}
