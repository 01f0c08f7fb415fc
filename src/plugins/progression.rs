use super::PluginResult;
use crate::types::{ChartType, Commit};
use crate::utils::escape_html;

/// Cumulative commit count over time.
///
/// Commits are sorted by timestamp (stable, so ties keep their input order)
/// and numbered from 1; each point pairs the formatted date with that number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeOfProgression {
    points: Vec<(String, u64)>,
}

impl TypeOfProgression {
    pub const NAME: &'static str = "Type of project progression";

    pub fn compute(commits: &[Commit], date_format: &str) -> Self {
        let mut ordered: Vec<&Commit> = commits.iter().collect();
        ordered.sort_by_key(|c| c.timestamp);

        let points = ordered
            .into_iter()
            .zip(1u64..)
            .map(|(commit, index)| (commit.formatted_date(date_format), index))
            .collect();

        Self { points }
    }

    /// Formatted date of the most recent commit.
    pub fn last_modification(&self) -> Option<&str> {
        self.points.last().map(|(date, _)| date.as_str())
    }

    /// Highest index, equal to the number of filtered commits.
    pub fn total_commits(&self) -> u64 {
        self.points.last().map(|(_, index)| *index).unwrap_or(0)
    }
}

impl PluginResult for TypeOfProgression {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn chart_type(&self) -> ChartType {
        ChartType::Area
    }

    fn as_mapping(&self) -> &[(String, u64)] {
        &self.points
    }

    fn as_markup_fragment(&self) -> String {
        let mut html = format!("<div>{}: \n<ul>\n", Self::NAME);
        html.push_str(&format!(
            "<li>Date of last modification: {}</li>\n",
            escape_html(self.last_modification().unwrap_or("-"))
        ));
        html.push_str(&format!(
            "<li>Number of all commits: {}</li>\n",
            self.total_commits()
        ));
        html.push_str("</ul>\n</div>\n");
        html
    }
}
