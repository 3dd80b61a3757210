pub mod bootstrap;
pub mod controller;

pub use bootstrap::{resolve_config, FetchJob};
pub use controller::{print_offsets, run_fetch, run_fetch_with, show_report};
