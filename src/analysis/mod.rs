mod analyzer;
mod cache;
pub mod filter;
pub mod git;
pub mod identity;
pub mod parser;
mod pipeline;


pub use analyzer::{Analyzer, AnalyzerResult, FilteredHistory};
pub use cache::ResultCache;
pub use filter::{filter_commits, FilterPolicy};
pub use git::GitRepository;
pub use identity::{AliasDeclaration, AliasTable, AuthorResolver};
pub use parser::{parse_log, MalformedRecordPolicy, ParsedLog};
pub use pipeline::{analyze_log, analyze_repo_async, prepare_history};
