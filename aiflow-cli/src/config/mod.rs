//! Configuration for running a layout.
//!
//! Re-exports [`RunConfig`], [`RunOptions`] and config [`Error`].

mod run_config;
mod run_options;

pub use run_config::{Error, RunConfig};
pub(crate) use run_config::split_tags;
pub use run_options::RunOptions;
