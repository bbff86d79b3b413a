//! Per-context configuration.

use crate::blackboard::Blackboard;
use crate::tags::TagSet;

use super::events::EventSender;

/// Signals processed in one step before the rest waits for the next step.
pub const DEFAULT_MAX_SIGNALS_PER_STEP: usize = 10_000;

/// Options for [`ExecutionContext::start_with`](super::ExecutionContext::start_with).
#[derive(Debug, Clone)]
pub struct ContextOptions {
    /// Agent name used in logs and passed to nodes.
    pub agent: String,
    pub tags: TagSet,
    /// Initial blackboard contents.
    pub blackboard: Blackboard,
    /// Receives [`ContextEvent`](super::ContextEvent)s when set.
    pub events: Option<EventSender>,
    /// Runaway-loop guard for graphs with loops.
    pub max_signals_per_step: usize,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            agent: "agent".to_string(),
            tags: TagSet::new(),
            blackboard: Blackboard::new(),
            events: None,
            max_signals_per_step: DEFAULT_MAX_SIGNALS_PER_STEP,
        }
    }
}

impl ContextOptions {
    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = agent.into();
        self
    }

    pub fn with_tags(mut self, tags: TagSet) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_blackboard(mut self, blackboard: Blackboard) -> Self {
        self.blackboard = blackboard;
        self
    }

    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_max_signals_per_step(mut self, max: usize) -> Self {
        self.max_signals_per_step = max.max(1);
        self
    }
}
