pub mod format;

pub use format::{display_pairs, escape_html};
