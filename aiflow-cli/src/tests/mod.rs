//! Unit tests for aiflow-cli: config loading, layout runs and event lines.


use std::sync::{Mutex, MutexGuard, OnceLock};

/// Lock used by tests that set/remove `AIFLOW_*` variables so they run serially.
static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

pub(crate) fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub(crate) const ENV_VARS: [&str; 5] = [
    "AIFLOW_TICK_MS",
    "AIFLOW_MAX_TICKS",
    "AIFLOW_SEED",
    "AIFLOW_TAGS",
    "AIFLOW_AGENT",
];

/// Runs `f` with the given `AIFLOW_*` values set and every other one removed,
/// then restores the previous environment.
pub(crate) fn with_env<R>(vars: &[(&str, &str)], f: impl FnOnce() -> R) -> R {
    let _guard = env_lock();
    let saved: Vec<_> = ENV_VARS
        .iter()
        .map(|name| (*name, std::env::var(name).ok()))
        .collect();
    for name in ENV_VARS {
        std::env::remove_var(name);
    }
    for (name, value) in vars {
        std::env::set_var(name, value);
    }

    let result = f();

    for (name, value) in saved {
        match value {
            Some(v) => std::env::set_var(name, v),
            None => std::env::remove_var(name),
        }
    }
    result
}
