//! # Configuration
//!
//! [`AnalysisOptions`] holds options exactly as the operator typed them and is
//! what `--save` / `--load` persist as TOML. [`Configuration::from_options`]
//! validates those options once and produces the immutable value the
//! pipeline consumes.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::analysis::filter::FilterPolicy;
use crate::analysis::identity::{AliasDeclaration, AliasTable};
use crate::analysis::parser::MalformedRecordPolicy;
use crate::error::{Error, Result};
use crate::plugins::PluginKind;

/// Date format used when none is configured (`dd/MM/yyyy`).
pub const DEFAULT_DATE_FORMAT: &str = "%d/%m/%Y";

/// Raw, persistable options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    /// Repository to analyze; the current directory when unset.
    pub path: Option<PathBuf>,
    /// Plugin ids, in the order results should be rendered.
    pub plugins: Vec<String>,
    pub branch: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    /// chrono format for `start`, `end` and rendered commit dates.
    pub format: Option<String>,
    /// `Name_Of_Author,mail,...` declarations.
    pub aliases: Vec<String>,
    pub blacklist: Vec<String>,
    pub whitelist: Vec<String>,
    /// Abort on malformed log records instead of skipping them.
    pub strict: bool,
    /// Page title; underscores become spaces.
    pub title: Option<String>,
    /// Stylesheets inlined into the generated page.
    pub css: Vec<PathBuf>,
}

impl AnalysisOptions {
    /// Read options saved with [`AnalysisOptions::save`].
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            Error::Configuration(format!("invalid config file {}: {e}", path.display()))
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            Error::Configuration(format!("cannot serialize configuration: {e}"))
        })?;
        std::fs::write(path, content)?;
        debug!(path = %path.display(), "saved configuration");
        Ok(())
    }

    /// Layer `self` over `base`: every option set here wins.
    pub fn over(self, base: AnalysisOptions) -> AnalysisOptions {
        fn pick<T>(primary: Vec<T>, fallback: Vec<T>) -> Vec<T> {
            if primary.is_empty() {
                fallback
            } else {
                primary
            }
        }

        AnalysisOptions {
            path: self.path.or(base.path),
            plugins: pick(self.plugins, base.plugins),
            branch: self.branch.or(base.branch),
            start: self.start.or(base.start),
            end: self.end.or(base.end),
            format: self.format.or(base.format),
            aliases: pick(self.aliases, base.aliases),
            blacklist: pick(self.blacklist, base.blacklist),
            whitelist: pick(self.whitelist, base.whitelist),
            strict: self.strict || base.strict,
            title: self.title.or(base.title),
            css: pick(self.css, base.css),
        }
    }
}

/// Validated, immutable pipeline configuration.
#[derive(Debug, Clone)]
pub struct Configuration {
    repo_path: PathBuf,
    filter: FilterPolicy,
    aliases: AliasTable,
    plugins: Vec<PluginKind>,
    date_format: String,
    malformed_records: MalformedRecordPolicy,
}

impl Configuration {
    /// Validate options, with "now" as the default end of the date window.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] for unknown plugins, bad alias declarations or
    /// an invalid date format; [`Error::Parse`] for unparsable date bounds.
    pub fn from_options(options: &AnalysisOptions) -> Result<Self> {
        Self::from_options_at(options, Utc::now())
    }

    /// Same as [`Configuration::from_options`] with an explicit "now".
    pub fn from_options_at(options: &AnalysisOptions, now: DateTime<Utc>) -> Result<Self> {
        let plugins = options
            .plugins
            .iter()
            .map(|name| name.parse::<PluginKind>())
            .collect::<Result<Vec<_>>>()?;

        let date_format = options
            .format
            .clone()
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string());
        validate_date_format(&date_format)?;

        let start = match non_blank(&options.start) {
            Some(raw) => parse_date_bound(raw, &date_format)?,
            None => DateTime::<Utc>::default(),
        };
        let end = match non_blank(&options.end) {
            Some(raw) => parse_date_bound(raw, &date_format)?,
            None => now,
        };

        let declarations = options
            .aliases
            .iter()
            .map(|raw| AliasDeclaration::parse(raw))
            .collect::<Result<Vec<_>>>()?;
        let aliases = AliasTable::new(&declarations)?;

        let filter = FilterPolicy::new(start, end)
            .with_branch(options.branch.clone())
            .with_whitelist(&options.whitelist)
            .with_blacklist(&options.blacklist);

        let malformed_records = if options.strict {
            MalformedRecordPolicy::Fail
        } else {
            MalformedRecordPolicy::Skip
        };

        Ok(Self {
            repo_path: options.path.clone().unwrap_or_else(|| PathBuf::from(".")),
            filter,
            aliases,
            plugins,
            date_format,
            malformed_records,
        })
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    pub fn filter(&self) -> &FilterPolicy {
        &self.filter
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    pub fn plugins(&self) -> &[PluginKind] {
        &self.plugins
    }

    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    pub fn malformed_records(&self) -> MalformedRecordPolicy {
        self.malformed_records
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn validate_date_format(format: &str) -> Result<()> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(Error::Configuration(format!(
            "invalid date format '{format}'"
        )));
    }
    Ok(())
}

/// Parse a date bound; date-only formats resolve to midnight UTC.
pub fn parse_date_bound(raw: &str, format: &str) -> Result<DateTime<Utc>> {
    if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, format) {
        return Ok(datetime.and_utc());
    }
    NaiveDate::parse_from_str(raw, format)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| datetime.and_utc())
        .ok_or_else(|| {
            Error::Parse(format!(
                "invalid date '{raw}' for format '{format}'"
            ))
        })
}
