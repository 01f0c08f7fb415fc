use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::spawn_blocking;
use tracing::{debug, info};

use crate::analysis::cache::ResultCache;
use crate::error::Result;
use crate::plugins::{PluginKind, SharedResult};
use crate::types::{ChartType, Commit};

/// The filtered commit sequence every plugin reads, plus the date format
/// used to render commit dates.
#[derive(Debug, Clone)]
pub struct FilteredHistory {
    commits: Vec<Commit>,
    date_format: String,
}

impl FilteredHistory {
    pub fn new(commits: Vec<Commit>, date_format: impl Into<String>) -> Self {
        Self {
            commits,
            date_format: date_format.into(),
        }
    }

    pub fn commits(&self) -> &[Commit] {
        &self.commits
    }

    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }
}

/// Runs the configured plugins over one filtered history.
///
/// Results are memoized: asking twice for the same plugin, or computing all
/// results twice, runs each plugin at most once.
pub struct Analyzer {
    history: Arc<FilteredHistory>,
    plugins: Vec<PluginKind>,
    cache: Arc<ResultCache>,
}

impl Analyzer {
    /// Create an analyzer for `plugins`; duplicates keep their first position.
    pub fn new(history: Arc<FilteredHistory>, plugins: &[PluginKind]) -> Self {
        let mut ordered = Vec::with_capacity(plugins.len());
        for kind in plugins {
            if !ordered.contains(kind) {
                ordered.push(*kind);
            }
        }

        Self {
            history,
            plugins: ordered,
            cache: Arc::new(ResultCache::new()),
        }
    }

    /// Resolve plugin names, failing on the first unknown one before anything runs.
    pub fn from_names<S: AsRef<str>>(history: Arc<FilteredHistory>, names: &[S]) -> Result<Self> {
        let plugins = names
            .iter()
            .map(|name| name.as_ref().parse::<PluginKind>())
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(history, &plugins))
    }

    pub fn plugins(&self) -> &[PluginKind] {
        &self.plugins
    }

    pub fn history(&self) -> &FilteredHistory {
        &self.history
    }

    /// Result of one configured plugin, computed on first request.
    pub fn result(&self, kind: PluginKind) -> Option<SharedResult> {
        if !self.plugins.contains(&kind) {
            return None;
        }
        Some(self.cache.get_or_compute(kind, || kind.compute(&self.history)))
    }

    /// Compute every configured plugin concurrently and collect the results
    /// in configured order.
    pub async fn compute_results(&self) -> AnalyzerResult {
        let start_time = Instant::now();
        let max_tasks = get_optimal_task_count(self.plugins.len());
        let semaphore = Arc::new(Semaphore::new(max_tasks));

        let tasks = self.plugins.iter().map(|&kind| {
            let semaphore = Arc::clone(&semaphore);
            let history = Arc::clone(&self.history);
            let cache = Arc::clone(&self.cache);

            async move {
                let _permit = semaphore.acquire_owned().await;
                let joined = spawn_blocking(move || {
                    let plugin_start = Instant::now();
                    let result = cache.get_or_compute(kind, || kind.compute(&history));
                    debug!(
                        plugin = %kind,
                        elapsed_ms = plugin_start.elapsed().as_millis() as u64,
                        "plugin finished"
                    );
                    result
                })
                .await;

                match joined {
                    Ok(result) => (kind, result),
                    // Plugins only count over validated data; a panic is a bug.
                    Err(e) => std::panic::resume_unwind(e.into_panic()),
                }
            }
        });

        let entries = join_all(tasks).await;

        info!(
            plugins = entries.len(),
            commits = self.history.len(),
            parallel_tasks = max_tasks,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "analysis complete"
        );

        AnalyzerResult { entries }
    }
}

/// Bounded by the number of plugins and the available CPUs.
fn get_optimal_task_count(plugins: usize) -> usize {
    plugins.min(num_cpus::get()).max(1)
}

/// Plugin results in configured order.
#[derive(Debug, Clone, Default)]
pub struct AnalyzerResult {
    entries: Vec<(PluginKind, SharedResult)>,
}

#[derive(Serialize)]
struct ResultDocument<'a> {
    plugin: &'a str,
    name: &'a str,
    chart_type: ChartType,
    entries: Vec<MappingEntry<'a>>,
}

#[derive(Serialize)]
struct MappingEntry<'a> {
    key: &'a str,
    value: u64,
}

impl AnalyzerResult {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, kind: PluginKind) -> Option<&SharedResult> {
        self.entries
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, result)| result)
    }

    /// Look up a result by its display name.
    pub fn get_by_name(&self, name: &str) -> Option<&SharedResult> {
        self.entries
            .iter()
            .find(|(_, result)| result.name() == name)
            .map(|(_, result)| result)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PluginKind, &SharedResult)> {
        self.entries.iter().map(|(kind, result)| (*kind, result))
    }

    /// Stable JSON rendering: plugin order and mapping order are preserved.
    pub fn to_json(&self) -> Result<String> {
        let documents: Vec<ResultDocument<'_>> = self
            .entries
            .iter()
            .map(|(kind, result)| ResultDocument {
                plugin: kind.id(),
                name: result.name(),
                chart_type: result.chart_type(),
                entries: result
                    .as_mapping()
                    .iter()
                    .map(|(key, value)| MappingEntry { key, value: *value })
                    .collect(),
            })
            .collect();

        Ok(serde_json::to_string_pretty(&documents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn history() -> Arc<FilteredHistory> {
        let commits = vec![
            Commit::new(
                "c2",
                "Bob",
                "bob@y",
                Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap(),
                "Merge branch 'feat'",
                vec!["c1".into(), "x".into()],
            ),
            Commit::new(
                "c1",
                "Alice",
                "alice@x",
                Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
                "init",
                vec![],
            ),
        ];
        Arc::new(FilteredHistory::new(commits, "%Y-%m-%d"))
    }

    #[tokio::test]
    async fn results_follow_configured_order() {
        let analyzer = Analyzer::new(
            history(),
            &[
                PluginKind::TypeOfProgression,
                PluginKind::CommitsPerAuthor,
                PluginKind::TypeOfProgression,
            ],
        );

        let results = analyzer.compute_results().await;
        let order: Vec<PluginKind> = results.iter().map(|(kind, _)| kind).collect();
        assert_eq!(
            order,
            vec![PluginKind::TypeOfProgression, PluginKind::CommitsPerAuthor]
        );
        assert!(results.get(PluginKind::MergeCommitsPerAuthor).is_none());
        assert!(results.get_by_name("Commits per author").is_some());
    }

    #[tokio::test]
    async fn results_are_memoized_across_requests() {
        let analyzer = Analyzer::new(history(), &[PluginKind::CommitsPerAuthor]);

        let direct = analyzer.result(PluginKind::CommitsPerAuthor).unwrap();
        let results = analyzer.compute_results().await;
        let collected = results.get(PluginKind::CommitsPerAuthor).unwrap();

        assert!(Arc::ptr_eq(&direct, collected));
        assert!(analyzer.result(PluginKind::TypeOfProgression).is_none());
    }

    #[test]
    fn unknown_name_fails_before_running() {
        let err = Analyzer::from_names(history(), &["commits-per-author", "nope"])
            .err()
            .unwrap();
        assert!(err.to_string().contains("nope"));
    }

    #[tokio::test]
    async fn json_is_stable() {
        let names = ["commits-per-author", "merge-commits-per-author"];
        let first = Analyzer::from_names(history(), &names)
            .unwrap()
            .compute_results()
            .await
            .to_json()
            .unwrap();
        let second = Analyzer::from_names(history(), &names)
            .unwrap()
            .compute_results()
            .await
            .to_json()
            .unwrap();

        assert_eq!(first, second);
        let parsed: serde_json::Value = serde_json::from_str(&first).unwrap();
        assert_eq!(parsed[0]["plugin"], "commits-per-author");
        assert_eq!(parsed[1]["chart_type"], "column");
        assert_eq!(parsed[1]["entries"][0]["key"], "Bob");
    }

    #[test]
    fn empty_history_is_fine() {
        let empty = Arc::new(FilteredHistory::new(Vec::new(), "%Y"));
        let analyzer = Analyzer::new(empty, &PluginKind::ALL);
        for kind in PluginKind::ALL {
            assert!(analyzer.result(kind).unwrap().as_mapping().is_empty());
        }

        let results = tokio_test::block_on(analyzer.compute_results());
        assert_eq!(results.len(), PluginKind::ALL.len());
    }
}
