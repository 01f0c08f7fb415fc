//! # Errors
//!
//! Every failure the pipeline can report. Library code returns [`Error`]; the
//! binary maps [`ErrorKind`] to a process exit code.

use std::fmt;

/// Errors raised while building a configuration, reading history or parsing it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Raw log text or a date bound could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// Unknown plugin, invalid alias declaration or otherwise unusable options.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The repository or the requested branch cannot be reached.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse classification of an [`Error`], stable across message changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Configuration,
    SourceUnavailable,
    Io,
    Serialization,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Parse(_) => ErrorKind::Parse,
            Error::Configuration(_) => ErrorKind::Configuration,
            Error::SourceUnavailable(_) => ErrorKind::SourceUnavailable,
            Error::Io(_) => ErrorKind::Io,
            Error::Serialization(_) => ErrorKind::Serialization,
        }
    }
}

impl ErrorKind {
    /// Exit code reported by the command line tool for this kind of failure.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::Configuration => 2,
            ErrorKind::Parse => 3,
            ErrorKind::SourceUnavailable => 4,
            ErrorKind::Io | ErrorKind::Serialization => 1,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::Parse => "parse",
            ErrorKind::Configuration => "configuration",
            ErrorKind::SourceUnavailable => "source unavailable",
            ErrorKind::Io => "io",
            ErrorKind::Serialization => "serialization",
        };
        f.write_str(label)
    }
}

impl From<git2::Error> for Error {
    fn from(e: git2::Error) -> Self {
        Error::SourceUnavailable(e.message().to_string())
    }
}

/// A convenience `Result` type for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_distinct_exit_codes() {
        let parse = Error::Parse("bad timestamp".into());
        let config = Error::Configuration("unknown plugin".into());
        let source = Error::SourceUnavailable("no repo".into());

        assert_eq!(parse.kind(), ErrorKind::Parse);
        assert_eq!(config.kind(), ErrorKind::Configuration);
        assert_ne!(parse.kind().exit_code(), config.kind().exit_code());
        assert_ne!(source.kind().exit_code(), config.kind().exit_code());
    }

    #[test]
    fn messages_carry_context() {
        let err = Error::Configuration("unknown plugin 'foo'".into());
        assert_eq!(err.to_string(), "configuration error: unknown plugin 'foo'");
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io_err.into();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.to_string().contains("gone"));
    }
}
