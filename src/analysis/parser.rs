//! Raw log parsing.
//!
//! The log tool is asked for one record per commit. Every record starts with
//! [`RECORD_SEPARATOR`] and holds six fields split by [`FIELD_SEPARATOR`]:
//! hash, author name, author mail, strict ISO-8601 timestamp, space separated
//! parent hashes and the full message body.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::types::Commit;

pub const RECORD_SEPARATOR: char = '\u{1e}';
pub const FIELD_SEPARATOR: char = '\u{1f}';

/// `git log --format` string producing records this parser understands.
pub const GIT_LOG_FORMAT: &str = "%x1e%H%x1f%an%x1f%ae%x1f%aI%x1f%P%x1f%B";

const FIELD_COUNT: usize = 6;

/// What to do with a record missing its hash or timestamp.
///
/// Applies to the whole parse, never per record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedRecordPolicy {
    /// Drop the record, count it and keep going.
    #[default]
    Skip,
    /// Abort the whole parse.
    Fail,
}

/// Commits in emission order plus the number of records dropped on the way.
#[derive(Debug, Clone, Default)]
pub struct ParsedLog {
    pub commits: Vec<Commit>,
    pub skipped: usize,
}

/// Parse raw log text into commits, preserving the order of the log.
///
/// # Errors
///
/// Returns [`Error::Parse`] when a timestamp cannot be parsed, or when a
/// record is malformed and the policy is [`MalformedRecordPolicy::Fail`].
pub fn parse_log(input: &str, policy: MalformedRecordPolicy) -> Result<ParsedLog> {
    let mut parsed = ParsedLog::default();
    // Set once the previous chunk produced a commit, so that a stray record
    // separator inside a message can be glued back onto that message. Only
    // chunks without any field separator qualify; anything else is a
    // truncated record.
    let mut last_was_commit = false;

    for (index, chunk) in input.split(RECORD_SEPARATOR).enumerate() {
        if index == 0 {
            if !chunk.trim().is_empty() {
                warn!("ignoring {} bytes before the first log record", chunk.len());
            }
            continue;
        }

        let fields: Vec<&str> = chunk.splitn(FIELD_COUNT, FIELD_SEPARATOR).collect();

        if fields.len() < FIELD_COUNT {
            if last_was_commit && !chunk.contains(FIELD_SEPARATOR) {
                if let Some(previous) = parsed.commits.last_mut() {
                    previous.description.push(RECORD_SEPARATOR);
                    previous.description.push_str(trim_body(chunk));
                    continue;
                }
            }
            reject(&mut parsed, policy, index, "record has too few fields")?;
            last_was_commit = false;
            continue;
        }

        let hash = fields[0].trim();
        let timestamp = fields[3].trim();

        if hash.is_empty() {
            reject(&mut parsed, policy, index, "record has no hash")?;
            last_was_commit = false;
            continue;
        }
        if timestamp.is_empty() {
            reject(&mut parsed, policy, index, "record has no timestamp")?;
            last_was_commit = false;
            continue;
        }

        let timestamp = parse_timestamp(timestamp).map_err(|e| {
            Error::Parse(format!("record {index} ({hash}): invalid timestamp: {e}"))
        })?;

        let parents = fields[4]
            .split_whitespace()
            .map(str::to_string)
            .collect();

        parsed.commits.push(Commit::new(
            hash,
            fields[1].trim(),
            fields[2].trim(),
            timestamp,
            trim_body(fields[5]),
            parents,
        ));
        last_was_commit = true;
    }

    debug!(
        commits = parsed.commits.len(),
        skipped = parsed.skipped,
        "parsed raw log"
    );

    Ok(parsed)
}

fn reject(
    parsed: &mut ParsedLog,
    policy: MalformedRecordPolicy,
    index: usize,
    reason: &str,
) -> Result<()> {
    match policy {
        MalformedRecordPolicy::Fail => Err(Error::Parse(format!("record {index}: {reason}"))),
        MalformedRecordPolicy::Skip => {
            warn!(record = index, "skipping malformed record: {reason}");
            parsed.skipped += 1;
            Ok(())
        }
    }
}

fn parse_timestamp(raw: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc))
}

/// The log tool ends every body with line breaks before the next record.
fn trim_body(body: &str) -> &str {
    body.trim_end_matches(['\n', '\r'])
}
