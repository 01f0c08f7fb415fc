use std::sync::Arc;
use tracing::{info, warn};

use crate::analysis::analyzer::{Analyzer, AnalyzerResult, FilteredHistory};
use crate::analysis::filter::filter_commits;
use crate::analysis::git::GitRepository;
use crate::analysis::identity::AuthorResolver;
use crate::analysis::parser::parse_log;
use crate::config::Configuration;
use crate::error::Result;

/// Parse, resolve identities and filter: everything that happens before the
/// plugins run.
///
/// # Errors
///
/// Returns [`crate::Error::Parse`] if the raw log cannot be ingested.
pub fn prepare_history(raw_log: &str, config: &Configuration) -> Result<FilteredHistory> {
    let parsed = parse_log(raw_log, config.malformed_records())?;
    if parsed.skipped > 0 {
        warn!(skipped = parsed.skipped, "malformed log records were skipped");
    }

    let mut resolver = AuthorResolver::new(config.aliases());
    resolver.resolve_all(&parsed.commits);

    let commits = filter_commits(&parsed.commits, config.filter());
    info!(
        parsed = parsed.commits.len(),
        kept = commits.len(),
        implicit_authors = resolver.implicit_count(),
        "history prepared"
    );

    Ok(FilteredHistory::new(commits, config.date_format()))
}

/// Run the configured plugins over raw log text.
pub async fn analyze_log(raw_log: &str, config: &Configuration) -> Result<AnalyzerResult> {
    let history = Arc::new(prepare_history(raw_log, config)?);
    let analyzer = Analyzer::new(history, config.plugins());
    Ok(analyzer.compute_results().await)
}

/// Read the configured repository's history and analyze it.
///
/// # Errors
///
/// Returns [`crate::Error::SourceUnavailable`] if the repository or branch
/// cannot be read, and [`crate::Error::Parse`] if its log cannot be parsed.
pub async fn analyze_repo_async(config: &Configuration) -> Result<AnalyzerResult> {
    let repo = GitRepository::open(config.repo_path()).await?;
    let raw_log = repo.read_log(config.filter().branch()).await?;
    analyze_log(&raw_log, config).await
}
