//! Author identity resolution.
//!
//! An [`AliasTable`] is built once from the operator's alias declarations.
//! [`AuthorResolver`] maps each commit's raw mail to a canonical [`Author`],
//! creating single-mail authors for mails nobody declared.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{normalize_mail, Author, Commit};

/// An operator-declared author: display name plus every mail it uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasDeclaration {
    pub name: String,
    pub mails: Vec<String>,
}

impl AliasDeclaration {
    /// Parse `Name_Of_Author,mail,...`; underscores in the name become spaces.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when the name or every mail is missing.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut parts = raw.split(',').map(str::trim);
        let name = parts.next().unwrap_or_default().replace('_', " ");
        let mails: Vec<String> = parts.filter(|m| !m.is_empty()).map(str::to_string).collect();

        if name.trim().is_empty() {
            return Err(Error::Configuration(format!(
                "alias '{raw}' does not start with an author name"
            )));
        }
        if mails.is_empty() {
            return Err(Error::Configuration(format!(
                "alias '{raw}' declares no mail address"
            )));
        }

        Ok(Self {
            name: name.trim().to_string(),
            mails,
        })
    }
}

/// Static mail to author mapping, immutable once built.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    by_mail: HashMap<String, Arc<Author>>,
}

impl AliasTable {
    /// Build the table from alias declarations.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if one mail is claimed by two
    /// different declarations.
    pub fn new(declarations: &[AliasDeclaration]) -> Result<Self> {
        let mut by_mail: HashMap<String, Arc<Author>> = HashMap::new();

        for declaration in declarations {
            let author = Arc::new(Author::new(&declaration.name, &declaration.mails)?);
            for mail in author.mails() {
                if let Some(existing) = by_mail.get(mail) {
                    return Err(Error::Configuration(format!(
                        "mail '{mail}' is declared for both '{}' and '{}'",
                        existing.primary_name(),
                        author.primary_name()
                    )));
                }
                by_mail.insert(mail.to_string(), Arc::clone(&author));
            }
        }

        Ok(Self { by_mail })
    }

    pub fn get(&self, mail: &str) -> Option<&Arc<Author>> {
        self.by_mail.get(&normalize_mail(mail))
    }

    pub fn len(&self) -> usize {
        self.by_mail.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_mail.is_empty()
    }
}

/// Resolves raw identities against an [`AliasTable`], remembering implicit
/// authors so a repeated mail always yields the same shared [`Author`].
///
/// Implicit authors are only created by [`AuthorResolver::resolve_all`],
/// which sees the whole sequence before naming anyone. Lookups never
/// register anything, so the answer for a mail cannot depend on call order.
pub struct AuthorResolver<'a> {
    aliases: &'a AliasTable,
    implicit: HashMap<String, Arc<Author>>,
}

impl<'a> AuthorResolver<'a> {
    pub fn new(aliases: &'a AliasTable) -> Self {
        Self {
            aliases,
            implicit: HashMap::new(),
        }
    }

    /// Canonical author of `commit`: its declared alias, or the implicit
    /// author registered for its mail. `None` for a mail that no
    /// declaration covers and no resolved sequence contained.
    pub fn resolve(&self, commit: &Commit) -> Option<Arc<Author>> {
        if let Some(author) = self.aliases.get(&commit.raw_mail) {
            return Some(Arc::clone(author));
        }
        self.implicit
            .get(&normalize_mail(&commit.raw_mail))
            .map(Arc::clone)
    }

    /// Resolve and attach an author to every commit.
    ///
    /// Implicit authors are seeded from the whole sequence first so the name
    /// chosen for a mail does not depend on which commit came first.
    pub fn resolve_all(&mut self, commits: &[Commit]) {
        let mut names: BTreeMap<String, &str> = BTreeMap::new();
        for commit in commits {
            if self.aliases.get(&commit.raw_mail).is_some() {
                continue;
            }
            let mail = normalize_mail(&commit.raw_mail);
            if self.implicit.contains_key(&mail) {
                continue;
            }
            let name = commit.raw_name.trim();
            names
                .entry(mail)
                .and_modify(|current| {
                    if current.is_empty() || (!name.is_empty() && name < *current) {
                        *current = name;
                    }
                })
                .or_insert(name);
        }
        for (mail, name) in names {
            debug!(mail = %mail, "registering implicit author");
            let author = Arc::new(Author::implicit(name, &mail));
            self.implicit.insert(mail, author);
        }

        for commit in commits {
            let Some(author) = self.resolve(commit) else {
                continue;
            };
            if !commit.attach_author(author) {
                debug!(hash = %commit.hash, "author already attached, keeping it");
            }
        }
    }

    /// Number of authors created for undeclared mails.
    pub fn implicit_count(&self) -> usize {
        self.implicit.len()
    }
}
