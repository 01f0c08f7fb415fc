//! # Common Types
//!
//! This module contains the data model shared by the ingestion pipeline and
//! the analysis plugins: commits, canonical authors and chart tags.

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};

/// Canonical form of a mail address used for every comparison.
pub fn normalize_mail(mail: &str) -> String {
    mail.trim().to_lowercase()
}

/// A canonical author identity covering one or more mail addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    primary_name: String,
    mails: BTreeSet<String>,
}

impl Author {
    /// Create an author from a display name and its mail addresses.
    ///
    /// Mails are normalized; an author without any mail is rejected.
    pub fn new<I, S>(primary_name: impl Into<String>, mails: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let primary_name = primary_name.into();
        let mails: BTreeSet<String> = mails
            .into_iter()
            .map(|m| normalize_mail(m.as_ref()))
            .filter(|m| !m.is_empty())
            .collect();

        if mails.is_empty() {
            return Err(Error::Configuration(format!(
                "author '{primary_name}' has no mail address"
            )));
        }

        Ok(Self {
            primary_name,
            mails,
        })
    }

    /// Single-mail author for an address that no alias declares.
    pub(crate) fn implicit(name: &str, mail: &str) -> Self {
        let mail = normalize_mail(mail);
        let primary_name = if name.trim().is_empty() {
            mail.clone()
        } else {
            name.trim().to_string()
        };

        Self {
            primary_name,
            mails: BTreeSet::from([mail]),
        }
    }

    pub fn primary_name(&self) -> &str {
        &self.primary_name
    }

    /// Every mail mapped to this author, normalized and sorted.
    pub fn mails(&self) -> impl Iterator<Item = &str> {
        self.mails.iter().map(String::as_str)
    }

    pub fn has_mail(&self, mail: &str) -> bool {
        self.mails.contains(&normalize_mail(mail))
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.primary_name)
    }
}

/// One recorded change in the history.
///
/// Everything is fixed at parse time except the resolved author, which can be
/// attached exactly once.
#[derive(Debug, Clone)]
pub struct Commit {
    pub hash: String,
    /// Author name as reported by the log.
    pub raw_name: String,
    /// Author mail as reported by the log.
    pub raw_mail: String,
    pub timestamp: DateTime<Utc>,
    /// Full message, newlines preserved.
    pub description: String,
    pub parents: Vec<String>,
    author: OnceCell<Arc<Author>>,
}

impl Commit {
    pub fn new(
        hash: impl Into<String>,
        raw_name: impl Into<String>,
        raw_mail: impl Into<String>,
        timestamp: DateTime<Utc>,
        description: impl Into<String>,
        parents: Vec<String>,
    ) -> Self {
        Self {
            hash: hash.into(),
            raw_name: raw_name.into(),
            raw_mail: raw_mail.into(),
            timestamp,
            description: description.into(),
            parents,
            author: OnceCell::new(),
        }
    }

    /// The resolved author, if identity resolution already ran.
    pub fn author(&self) -> Option<&Arc<Author>> {
        self.author.get()
    }

    /// Attach the resolved author. Returns `false` if one was already attached.
    pub fn attach_author(&self, author: Arc<Author>) -> bool {
        self.author.set(author).is_ok()
    }

    /// Name used to group this commit: the canonical name once resolved.
    pub fn author_name(&self) -> &str {
        match self.author() {
            Some(author) => author.primary_name(),
            None if self.raw_name.trim().is_empty() => &self.raw_mail,
            None => &self.raw_name,
        }
    }

    /// Normalized mails identifying this commit's author: the raw mail plus
    /// every mail of the resolved author.
    pub fn author_mails(&self) -> BTreeSet<String> {
        let mut mails = BTreeSet::from([normalize_mail(&self.raw_mail)]);
        if let Some(author) = self.author() {
            mails.extend(author.mails().map(str::to_string));
        }
        mails
    }

    /// Structural merge check: more than one parent.
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    pub fn formatted_date(&self, format: &str) -> String {
        self.timestamp.format(format).to_string()
    }
}

/// Chart a rendering collaborator should use for a plugin result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    List,
    Column,
    Area,
}

impl ChartType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChartType::List => "list",
            ChartType::Column => "column",
            ChartType::Area => "area",
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
