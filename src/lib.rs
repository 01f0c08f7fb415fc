//! # Git History Analysis Library
//!
//! `visulog` ingests a repository's commit log, normalizes author identities
//! and runs a set of independent aggregation plugins over the filtered history.
//!
//! ## Pipeline
//!
//! - Parse raw `git log` output into [`Commit`] records
//! - Resolve every commit's author through an alias table
//! - Filter by date window and mail whitelist/blacklist
//! - Run the selected plugins and collect an ordered [`AnalyzerResult`]
//!
//! ## Example
//!
//! ```no_run
//! use visulog::{AnalysisOptions, Configuration};
//!
//! # async fn demo() -> visulog::Result<()> {
//! let options = AnalysisOptions {
//!     plugins: vec!["commits-per-author".into()],
//!     aliases: vec!["Alice,alice@work.example,alice@home.example".into()],
//!     ..AnalysisOptions::default()
//! };
//! let config = Configuration::from_options(&options)?;
//! let result = visulog::analysis::analyze_repo_async(&config).await?;
//! for (_, plugin) in result.iter() {
//!     println!("{}: {}", plugin.name(), plugin.as_display_string());
//! }
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod plugins;
pub mod report;
pub mod types;
pub mod utils;

// Re-export main types for convenience
pub use analysis::{Analyzer, AnalyzerResult, FilterPolicy, FilteredHistory};
pub use config::{AnalysisOptions, Configuration};
pub use error::{Error, ErrorKind, Result};
pub use plugins::{PluginKind, PluginResult};
pub use types::{Author, ChartType, Commit};
