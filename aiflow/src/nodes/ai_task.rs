//! AI task: issues a request to the AI subsystem and waits for its completion.
//!
//! Fires `Success` (with the subsystem's payload, if any) or `Failure`. A
//! rejected request or a subsystem fault also fires `Failure`.

use std::sync::Arc;

use serde::Deserialize;

use crate::ai::{AiRequest, AiSubsystem, TaskHandle};
use crate::context::NodeContext;
use crate::error::NodeFault;
use crate::graph::{Activation, FlowNode, InputValues, NodeInfo, NodeKind, PinSpec};
use crate::value::PinType;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AiTaskConfig {
    #[serde(flatten)]
    pub request: AiRequest,
}

/// Handle of the in-flight request, kept in node memory.
#[derive(Default)]
struct InFlight(Option<Box<dyn TaskHandle>>);

pub struct AiTaskNode {
    subsystem: Arc<dyn AiSubsystem>,
    request: AiRequest,
}

impl AiTaskNode {
    pub fn new(subsystem: Arc<dyn AiSubsystem>, request: AiRequest) -> Self {
        Self { subsystem, request }
    }

    pub fn from_config(subsystem: Arc<dyn AiSubsystem>, config: AiTaskConfig) -> Self {
        Self::new(subsystem, config.request)
    }

    /// Request with every input value merged into its params.
    fn request_for(&self, inputs: &InputValues) -> AiRequest {
        let mut request = self.request.clone();
        for (pin, value) in inputs.iter() {
            request.params.insert(pin.to_string(), value.clone());
        }
        request
    }
}

impl FlowNode for AiTaskNode {
    fn info(&self) -> NodeInfo {
        NodeInfo::new(NodeKind::Task)
            .input(PinSpec::input("In"))
            .input(PinSpec::data("Target", PinType::Any))
            .output(PinSpec::data_output("Success", PinType::Any))
            .output(PinSpec::output("Failure"))
            .fault_output("Failure")
    }

    fn on_activate(
        &self,
        ctx: &mut NodeContext<'_>,
        inputs: &InputValues,
    ) -> Result<Activation, NodeFault> {
        let request = self.request_for(inputs);
        let handle = self.subsystem.issue(&request, ctx.completer())?;
        ctx.memory_mut::<InFlight>().0 = Some(handle);
        Ok(Activation::Running)
    }

    fn on_cancel(&self, ctx: &mut NodeContext<'_>) {
        if let Some(mut handle) = ctx.take_memory::<InFlight>().and_then(|f| f.0) {
            handle.cancel();
        }
    }
}
