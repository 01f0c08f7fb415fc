//! # Analysis Plugins
//!
//! Each plugin is a pure aggregation over the filtered commit sequence. A
//! plugin is selected by [`PluginKind`], computed with [`PluginKind::compute`]
//! and hands back its own result type behind the [`PluginResult`] capability
//! set, which is everything a renderer needs.

mod commits_per_author;
mod merge_commits;
mod progression;

pub use commits_per_author::CommitsPerAuthor;
pub use merge_commits::MergeCommitsPerAuthor;
pub use progression::TypeOfProgression;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::analysis::FilteredHistory;
use crate::error::Error;
use crate::types::{ChartType, Commit};
use crate::utils::display_pairs;

/// What a renderer can ask of any plugin result.
pub trait PluginResult: fmt::Debug + Send + Sync {
    /// Display name of the plugin that produced this result.
    fn name(&self) -> &str;

    fn chart_type(&self) -> ChartType;

    /// Ordered key/value pairs; key semantics depend on the plugin.
    fn as_mapping(&self) -> &[(String, u64)];

    fn as_display_string(&self) -> String {
        display_pairs(self.as_mapping())
    }

    /// Self-contained HTML block, no stylesheet required.
    fn as_markup_fragment(&self) -> String;
}

/// A computed result, shared between the cache and every reader.
pub type SharedResult = Arc<dyn PluginResult>;

/// Every plugin the analyzer knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginKind {
    CommitsPerAuthor,
    MergeCommitsPerAuthor,
    TypeOfProgression,
}

impl PluginKind {
    pub const ALL: [PluginKind; 3] = [
        PluginKind::CommitsPerAuthor,
        PluginKind::MergeCommitsPerAuthor,
        PluginKind::TypeOfProgression,
    ];

    /// Identifier used on the command line and in saved configurations.
    pub fn id(self) -> &'static str {
        match self {
            PluginKind::CommitsPerAuthor => "commits-per-author",
            PluginKind::MergeCommitsPerAuthor => "merge-commits-per-author",
            PluginKind::TypeOfProgression => "type-of-progression",
        }
    }

    /// Historical class-style name, still accepted when parsing.
    fn legacy_name(self) -> &'static str {
        match self {
            PluginKind::CommitsPerAuthor => "countcommitsperauthor",
            PluginKind::MergeCommitsPerAuthor => "countmergecommitsperauthor",
            PluginKind::TypeOfProgression => "typeofprogression",
        }
    }

    /// Run the plugin over the filtered history.
    pub fn compute(self, history: &FilteredHistory) -> SharedResult {
        match self {
            PluginKind::CommitsPerAuthor => Arc::new(CommitsPerAuthor::compute(history.commits())),
            PluginKind::MergeCommitsPerAuthor => {
                Arc::new(MergeCommitsPerAuthor::compute(history.commits()))
            }
            PluginKind::TypeOfProgression => Arc::new(TypeOfProgression::compute(
                history.commits(),
                history.date_format(),
            )),
        }
    }
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for PluginKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        PluginKind::ALL
            .into_iter()
            .find(|kind| kind.id() == wanted || kind.legacy_name() == wanted)
            .ok_or_else(|| {
                Error::Configuration(format!(
                    "unknown plugin '{}' (available: {})",
                    s.trim(),
                    PluginKind::ALL.map(PluginKind::id).join(", ")
                ))
            })
    }
}

/// Count commits per canonical author name, sorted by name.
fn count_by_author<'a>(commits: impl Iterator<Item = &'a Commit>) -> Vec<(String, u64)> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for commit in commits {
        *counts.entry(commit.author_name()).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(name, count)| (name.to_string(), count))
        .collect()
}

/// `<li>` list of pairs wrapped in a titled `<div>`.
fn pairs_fragment(title: &str, pairs: &[(String, u64)]) -> String {
    let mut html = format!("<div>{}: \n<ul>\n", crate::utils::escape_html(title));
    for (key, value) in pairs {
        html.push_str(&format!(
            "<li>{}: {}</li>\n",
            crate::utils::escape_html(key),
            value
        ));
    }
    html.push_str("</ul>\n</div>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ids_and_legacy_names() {
        assert_eq!(
            "commits-per-author".parse::<PluginKind>().unwrap(),
            PluginKind::CommitsPerAuthor
        );
        assert_eq!(
            "CountMergeCommitsPerAuthor".parse::<PluginKind>().unwrap(),
            PluginKind::MergeCommitsPerAuthor
        );
        assert_eq!(
            " Type-Of-Progression ".parse::<PluginKind>().unwrap(),
            PluginKind::TypeOfProgression
        );
    }

    #[test]
    fn unknown_plugin_is_a_configuration_error() {
        let err = "lines-per-author".parse::<PluginKind>().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("lines-per-author"));
    }

    #[test]
    fn ids_round_trip() {
        for kind in PluginKind::ALL {
            assert_eq!(kind.to_string().parse::<PluginKind>().unwrap(), kind);
        }
    }
}
