use super::{count_by_author, pairs_fragment, PluginResult};
use crate::types::{ChartType, Commit};

/// Number of commits per canonical author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitsPerAuthor {
    counts: Vec<(String, u64)>,
}

impl CommitsPerAuthor {
    pub const NAME: &'static str = "Commits per author";

    pub fn compute(commits: &[Commit]) -> Self {
        Self {
            counts: count_by_author(commits.iter()),
        }
    }

    pub fn count_for(&self, author: &str) -> Option<u64> {
        self.counts
            .iter()
            .find(|(name, _)| name == author)
            .map(|(_, count)| *count)
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|(_, count)| count).sum()
    }
}

impl PluginResult for CommitsPerAuthor {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn chart_type(&self) -> ChartType {
        ChartType::List
    }

    fn as_mapping(&self) -> &[(String, u64)] {
        &self.counts
    }

    fn as_markup_fragment(&self) -> String {
        pairs_fragment(Self::NAME, &self.counts)
    }
}
