pub mod file;
pub mod time;

pub use file::{ensure_parent_dir, load_identifiers};
pub use time::{current_human_timestamp, format_utc};
