use super::{count_by_author, pairs_fragment, PluginResult};
use crate::types::{ChartType, Commit};

const MERGE_MARKER: &str = "merge branch";

/// Number of merge commits per canonical author.
///
/// A merge is recognized by its message: the description contains
/// `merge branch`, ignoring case. Parent count is not consulted, so squash
/// merges with a default message count and merges with a custom message do not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeCommitsPerAuthor {
    counts: Vec<(String, u64)>,
}

impl MergeCommitsPerAuthor {
    pub const NAME: &'static str = "Count merge commits per author";

    pub fn compute(commits: &[Commit]) -> Self {
        Self {
            counts: count_by_author(commits.iter().filter(|c| is_merge_message(&c.description))),
        }
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|(_, count)| count).sum()
    }
}

fn is_merge_message(description: &str) -> bool {
    description.to_lowercase().contains(MERGE_MARKER)
}

impl PluginResult for MergeCommitsPerAuthor {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn chart_type(&self) -> ChartType {
        ChartType::Column
    }

    fn as_mapping(&self) -> &[(String, u64)] {
        &self.counts
    }

    fn as_markup_fragment(&self) -> String {
        pairs_fragment("Merge commits per author", &self.counts)
    }
}
