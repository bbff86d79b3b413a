//! Run config: tick period, tick limit, seed, agent tags. Filled from env / .env.

use std::time::Duration;

use super::RunOptions;

/// Error type used for config loading and runs.
pub type Error = Box<dyn std::error::Error + Send + Sync>;

pub const DEFAULT_TICK_MS: u64 = 100;
pub const DEFAULT_MAX_TICKS: u64 = 1_000;

#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig {
    /// Step period; also the delta time every step receives.
    pub tick_ms: u64,
    pub max_ticks: u64,
    /// Overrides the layout's seed when set.
    pub seed: Option<u64>,
    /// Tags of the simulated agent.
    pub tags: Vec<String>,
    pub agent: String,
    /// Print every context event.
    pub verbose: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            tick_ms: DEFAULT_TICK_MS,
            max_ticks: DEFAULT_MAX_TICKS,
            seed: None,
            tags: Vec::new(),
            agent: "agent".to_string(),
            verbose: false,
        }
    }
}

impl RunConfig {
    /// Fill config from env vars. Call `dotenv::dotenv().ok()` first to pick up `.env`.
    ///
    /// `AIFLOW_TICK_MS`, `AIFLOW_MAX_TICKS`, `AIFLOW_SEED`, `AIFLOW_TAGS`
    /// (comma or whitespace separated) and `AIFLOW_AGENT` are optional. A set
    /// but unparsable number is an error.
    pub fn from_env() -> Result<Self, Error> {
        let defaults = Self::default();
        let tick_ms = parse_var("AIFLOW_TICK_MS")?.unwrap_or(defaults.tick_ms);
        let max_ticks = parse_var("AIFLOW_MAX_TICKS")?.unwrap_or(defaults.max_ticks);
        let seed = parse_var("AIFLOW_SEED")?;
        let tags = std::env::var("AIFLOW_TAGS")
            .map(|s| split_tags(&s))
            .unwrap_or_default();
        let agent = std::env::var("AIFLOW_AGENT").unwrap_or(defaults.agent);
        Ok(Self {
            tick_ms,
            max_ticks,
            seed,
            tags,
            agent,
            verbose: false,
        })
    }

    /// Apply overrides from `options`; only set fields replace config values.
    pub fn apply_options(&mut self, options: &RunOptions) {
        if let Some(tick_ms) = options.tick_ms {
            self.tick_ms = tick_ms;
        }
        if let Some(max_ticks) = options.max_ticks {
            self.max_ticks = max_ticks;
        }
        if options.seed.is_some() {
            self.seed = options.seed;
        }
        if let Some(tags) = &options.tags {
            self.tags = tags.clone();
        }
        if let Some(agent) = &options.agent {
            self.agent = agent.clone();
        }
        self.verbose = options.verbose;
    }

    /// Step period, at least one millisecond.
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

/// Splits a tag list on commas and whitespace.
pub(crate) fn split_tags(s: &str) -> Vec<String> {
    s.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_var<T>(name: &str) -> Result<Option<T>, Error>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| format!("{} must be a number, got {:?}: {}", name, raw, e).into()),
        Err(_) => Ok(None),
    }
}
