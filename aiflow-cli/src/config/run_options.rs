//! Optional overrides for a run (CLI flags or programmatic).
//!
//! Applied on top of the env-based config by
//! [`RunConfig::apply_options`](super::RunConfig::apply_options).

/// Overrides for a run. Only set fields replace the base config.
#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    /// Step period in milliseconds.
    pub tick_ms: Option<u64>,
    /// Stop after this many steps if the graph has not finished.
    pub max_ticks: Option<u64>,
    /// Graph seed, replacing the layout's.
    pub seed: Option<u64>,
    /// Agent tags, replacing the configured ones.
    pub tags: Option<Vec<String>>,
    pub agent: Option<String>,
    pub verbose: bool,
}
