//! aiflow-cli library: load a JSON graph layout and run it against a
//! simulated agent on a fixed tick.
//!
//! ## Usage
//!
//! ```rust,no_run
//! # async fn demo() -> Result<(), aiflow_cli::Error> {
//! let report = aiflow_cli::run_with_options(
//!     std::path::Path::new("patrol.json"),
//!     &aiflow_cli::RunOptions::default(),
//! )
//! .await?;
//! println!("{:?}", report.status);
//! # Ok(())
//! # }
//! ```

mod config;
mod run;

pub use config::{Error, RunConfig, RunOptions};
pub use run::{
    describe, load_layout, registry, run_file, run_layout, run_with_options, RunReport,
    SimulatedSubsystem,
};

#[cfg(test)]
mod tests;
