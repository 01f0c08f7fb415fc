//! Commit filtering by date window and mail policy.
//!
//! Branch scope is applied when history is read (see [`crate::analysis::git`]);
//! the policy only carries the branch name so the reader can request it.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::types::{normalize_mail, Commit};

/// Rules narrowing the commit sequence before analysis.
///
/// The mail policy is evaluated whitelist first: with a non-empty whitelist
/// only authors owning a listed mail pass. The blacklist is applied second and
/// always wins, so a mail present in both lists is excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPolicy {
    branch: Option<String>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    mail_blacklist: BTreeSet<String>,
    mail_whitelist: BTreeSet<String>,
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self::new(DateTime::<Utc>::default(), Utc::now())
    }
}

impl FilterPolicy {
    /// Policy keeping every commit in `start..=end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            branch: None,
            start,
            end,
            mail_blacklist: BTreeSet::new(),
            mail_whitelist: BTreeSet::new(),
        }
    }

    /// Restrict to a branch; a blank name means the current branch.
    pub fn with_branch(mut self, branch: Option<String>) -> Self {
        self.branch = branch.filter(|b| !b.trim().is_empty());
        self
    }

    pub fn with_blacklist<I, S>(mut self, mails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.mail_blacklist = normalize_all(mails);
        self.warn_on_overlap();
        self
    }

    pub fn with_whitelist<I, S>(mut self, mails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.mail_whitelist = normalize_all(mails);
        self.warn_on_overlap();
        self
    }

    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Both bounds are inclusive; an inverted window contains nothing.
    pub fn in_window(&self, timestamp: DateTime<Utc>) -> bool {
        self.start <= timestamp && timestamp <= self.end
    }

    /// Apply the whitelist then the blacklist to a set of normalized mails.
    pub fn allows_mails(&self, mails: &BTreeSet<String>) -> bool {
        if !self.mail_whitelist.is_empty() && mails.is_disjoint(&self.mail_whitelist) {
            return false;
        }
        mails.is_disjoint(&self.mail_blacklist)
    }

    pub fn allows(&self, commit: &Commit) -> bool {
        self.in_window(commit.timestamp) && self.allows_mails(&commit.author_mails())
    }

    fn warn_on_overlap(&self) {
        for mail in self.mail_whitelist.intersection(&self.mail_blacklist) {
            warn!(mail = %mail, "mail is both whitelisted and blacklisted, it will be excluded");
        }
    }
}

fn normalize_all<I, S>(mails: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    mails
        .into_iter()
        .map(|m| normalize_mail(m.as_ref()))
        .filter(|m| !m.is_empty())
        .collect()
}

/// Keep the commits allowed by `policy`, in their original order.
pub fn filter_commits(commits: &[Commit], policy: &FilterPolicy) -> Vec<Commit> {
    if policy.start > policy.end {
        debug!("start is after end, nothing can match");
        return Vec::new();
    }

    let kept: Vec<Commit> = commits
        .iter()
        .filter(|c| policy.allows(c))
        .cloned()
        .collect();

    debug!(
        input = commits.len(),
        kept = kept.len(),
        "filtered commits"
    );
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::identity::{AliasDeclaration, AliasTable, AuthorResolver};
    use chrono::{Duration, TimeZone};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 3, day, 12, 0, 0).unwrap()
    }

    fn commit(hash: &str, mail: &str, day: u32) -> Commit {
        Commit::new(hash, "", mail, at(day), "", vec![])
    }

    fn hashes(commits: &[Commit]) -> Vec<&str> {
        commits.iter().map(|c| c.hash.as_str()).collect()
    }

    fn resolved(commits: Vec<Commit>, aliases: &[&str]) -> Vec<Commit> {
        let decls: Vec<_> = aliases
            .iter()
            .map(|a| AliasDeclaration::parse(a).unwrap())
            .collect();
        let table = AliasTable::new(&decls).unwrap();
        AuthorResolver::new(&table).resolve_all(&commits);
        commits
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let commits = vec![
            Commit::new("before", "", "a@x", at(1) - Duration::seconds(1), "", vec![]),
            commit("start", "a@x", 1),
            commit("middle", "a@x", 2),
            commit("end", "a@x", 3),
            Commit::new("after", "", "a@x", at(3) + Duration::seconds(1), "", vec![]),
        ];

        let policy = FilterPolicy::new(at(1), at(3));
        assert_eq!(
            hashes(&filter_commits(&commits, &policy)),
            vec!["start", "middle", "end"]
        );
    }

    #[test]
    fn inverted_window_is_empty_not_an_error() {
        let commits = vec![commit("a", "a@x", 1), commit("b", "a@x", 2)];
        let policy = FilterPolicy::new(at(3), at(1));
        assert!(filter_commits(&commits, &policy).is_empty());
    }

    #[test]
    fn preserves_input_order_and_does_not_mutate_input() {
        let commits = vec![commit("c3", "a@x", 3), commit("c1", "a@x", 1), commit("c2", "b@x", 2)];
        let policy = FilterPolicy::new(at(1), at(3)).with_blacklist(["b@x"]);

        let kept = filter_commits(&commits, &policy);
        assert_eq!(hashes(&kept), vec!["c3", "c1"]);
        assert_eq!(commits.len(), 3);
    }

    // Mail policy matrix: (whitelist, blacklist, expected survivors) over
    // commits from a@x, b@x and c@x.
    #[test]
    fn mail_policy_matrix() {
        let cases: Vec<(Vec<&str>, Vec<&str>, Vec<&str>)> = vec![
            (vec![], vec![], vec!["a", "b", "c"]),
            (vec!["a@x"], vec![], vec!["a"]),
            (vec![], vec!["a@x"], vec!["b", "c"]),
            (vec!["a@x", "b@x"], vec!["b@x"], vec!["a"]),
            (vec!["a@x"], vec!["b@x"], vec!["a"]),
            (vec!["a@x"], vec!["a@x"], vec![]),
            (vec!["nobody@x"], vec![], vec![]),
        ];

        for (whitelist, blacklist, expected) in cases {
            let commits = vec![commit("a", "a@x", 1), commit("b", "b@x", 1), commit("c", "c@x", 1)];
            let policy = FilterPolicy::new(at(1), at(2))
                .with_whitelist(&whitelist)
                .with_blacklist(&blacklist);
            assert_eq!(
                hashes(&filter_commits(&commits, &policy)),
                expected,
                "whitelist={whitelist:?} blacklist={blacklist:?}"
            );
        }
    }

    #[test]
    fn blacklisting_one_alias_excludes_every_mail_of_the_author() {
        let commits = resolved(
            vec![
                commit("work", "alice@work", 1),
                commit("home", "alice@home", 1),
                commit("bob", "bob@y", 1),
            ],
            &["Alice,alice@work,alice@home"],
        );

        let policy = FilterPolicy::new(at(1), at(2)).with_blacklist(["ALICE@home"]);
        assert_eq!(hashes(&filter_commits(&commits, &policy)), vec!["bob"]);
    }

    #[test]
    fn whitelisting_one_alias_admits_every_mail_of_the_author() {
        let commits = resolved(
            vec![
                commit("work", "alice@work", 1),
                commit("home", "alice@home", 1),
                commit("bob", "bob@y", 1),
            ],
            &["Alice,alice@work,alice@home"],
        );

        let policy = FilterPolicy::new(at(1), at(2)).with_whitelist(["alice@work"]);
        assert_eq!(hashes(&filter_commits(&commits, &policy)), vec!["work", "home"]);
    }

    #[test]
    fn blank_branch_means_current() {
        let policy = FilterPolicy::default().with_branch(Some("  ".into()));
        assert_eq!(policy.branch(), None);
        let policy = FilterPolicy::default().with_branch(Some("develop".into()));
        assert_eq!(policy.branch(), Some("develop"));
    }
}
