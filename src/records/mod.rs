pub mod faults;
pub mod report;

pub use faults::{truncate_faults, write_faults, ChannelFault};
pub use report::{BatchReport, IdentifierReport, REPORT_COLUMNS};
