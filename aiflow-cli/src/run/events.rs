//! Prints context events as they happen (`--verbose`).

use aiflow::context::{ContextEvent, EventStream};
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;

/// One line per event, or `None` for events not worth printing.
pub fn describe(event: &ContextEvent) -> Option<String> {
    Some(match event {
        ContextEvent::Started { agent } => format!("started for {}", agent),
        ContextEvent::Activated {
            name, generation, ..
        } => format!("{} activated (generation {})", name, generation),
        ContextEvent::Running { name, .. } => format!("{} running", name),
        ContextEvent::Finished {
            name,
            result,
            fired,
            ..
        } if fired.is_empty() => format!("{} finished: {}", name, result),
        ContextEvent::Finished {
            name,
            result,
            fired,
            ..
        } => format!("{} finished: {} -> {}", name, result, fired.join(", ")),
        ContextEvent::Fault(report) => format!("{} fault: {}", report.name, report.fault),
        ContextEvent::Merged { name, pin, .. } => format!("{}.{} merged", name, pin),
        ContextEvent::Deferred { name, pin, .. } => format!("{}.{} deferred", name, pin),
        ContextEvent::JoinExpired { name, pin, .. } => format!("{}.{} join expired", name, pin),
        ContextEvent::ContextFinished(_) | ContextEvent::Cancelled => return None,
    })
}

/// Prints every event from `stream` until the context drops its sender.
pub fn spawn_printer(mut stream: EventStream) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = stream.next().await {
            if let Some(line) = describe(&event) {
                println!("  {}", line);
            }
        }
    })
}
