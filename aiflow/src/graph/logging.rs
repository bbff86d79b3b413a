//! Logging utilities for flow execution.
//!
//! Structured events for context lifecycle, node activation and the
//! scheduler's signal handling. Uses `tracing` when the feature is enabled,
//! stderr otherwise.

use crate::error::NodeFault;
use crate::graph::NodeResult;

/// Log context start.
pub fn log_context_start(agent: &str, nodes: usize) {
    #[cfg(feature = "tracing")]
    tracing::info!(agent = agent, nodes = nodes, "Starting flow context");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[INFO] Starting flow context: {} ({} nodes)", agent, nodes);
}

/// Log context completion.
pub fn log_context_finish(agent: &str, result: NodeResult) {
    #[cfg(feature = "tracing")]
    tracing::info!(agent = agent, %result, "Flow context finished");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[INFO] Flow context finished: {} -> {}", agent, result);
}

/// Log context cancellation.
pub fn log_context_cancel(agent: &str, running: usize) {
    #[cfg(feature = "tracing")]
    tracing::info!(agent = agent, running = running, "Flow context cancelled");

    #[cfg(not(feature = "tracing"))]
    eprintln!(
        "[INFO] Flow context cancelled: {} ({} nodes running)",
        agent, running
    );
}

/// Log node activation.
pub fn log_node_activate(node: &str, generation: u64) {
    #[cfg(feature = "tracing")]
    tracing::debug!(node = node, generation = generation, "Activating node");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[DEBUG] Activating node: {} (gen {})", node, generation);
}

/// Log node completion.
pub fn log_node_finish(node: &str, result: NodeResult, fired: usize) {
    #[cfg(feature = "tracing")]
    tracing::debug!(node = node, %result, fired = fired, "Node finished");

    #[cfg(not(feature = "tracing"))]
    eprintln!(
        "[DEBUG] Node finished: {} -> {} ({} pins fired)",
        node, result, fired
    );
}

/// Log a fault raised by a node callback.
pub fn log_node_fault(node: &str, fault: &NodeFault) {
    #[cfg(feature = "tracing")]
    tracing::warn!(node = node, %fault, "Node fault");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[WARN] Node fault: {}: {}", node, fault);
}

/// Log a completion that no longer matches the node's activation.
pub fn log_stale_completion(node: &str, ticket: u64) {
    #[cfg(feature = "tracing")]
    tracing::debug!(node = node, ticket = ticket, "Discarding stale completion");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[DEBUG] Discarding stale completion: {} (ticket {})", node, ticket);
}

/// Log a signal held back until the running node finishes.
pub fn log_signal_deferred(node: &str, pin: &str) {
    #[cfg(feature = "tracing")]
    tracing::debug!(node = node, pin = pin, "Deferring signal to running node");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[DEBUG] Deferring signal to running node: {}.{}", node, pin);
}

/// Log a signal merged into a running latched node.
pub fn log_signal_merged(node: &str, pin: &str) {
    #[cfg(feature = "tracing")]
    tracing::debug!(node = node, pin = pin, "Merging signal into latched node");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[DEBUG] Merging signal into latched node: {}.{}", node, pin);
}

/// Log a dropped signal.
pub fn log_signal_dropped(node: &str, reason: &str) {
    #[cfg(feature = "tracing")]
    tracing::trace!(node = node, reason = reason, "Dropping signal");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[TRACE] Dropping signal: {} ({})", node, reason);
}

/// Log a partial join reset by its merge window.
pub fn log_join_expired(node: &str, pin: &str) {
    #[cfg(feature = "tracing")]
    tracing::debug!(node = node, pin = pin, "Merge window expired");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[DEBUG] Merge window expired: {}.{}", node, pin);
}

/// Log that a step stopped early because it hit its signal budget.
pub fn log_step_budget_exhausted(agent: &str, pending: usize) {
    #[cfg(feature = "tracing")]
    tracing::warn!(
        agent = agent,
        pending = pending,
        "Signal budget exhausted; continuing next step"
    );

    #[cfg(not(feature = "tracing"))]
    eprintln!(
        "[WARN] Signal budget exhausted: {} ({} signals pending)",
        agent, pending
    );
}
