use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::{Context, Result};
use crate::fetch::TimeOffset;

/// Remote-reported error for one sub-query, kept for operator follow-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelFault {
    pub identifier: String,
    pub offset: TimeOffset,
    pub reason: String,
}

impl ChannelFault {
    pub fn line(&self) -> String {
        format!("{} {} {}", self.identifier, self.offset, self.reason)
    }
}

/// Empty the fault log, creating it if needed.
pub fn truncate_faults<P: AsRef<Path>>(file_path: P) -> Result<()> {
    let path = file_path.as_ref();
    fs::File::create(path)
        .with_context(|| format!("Failed to truncate {}", path.display()))?;
    Ok(())
}

/// Append one line per fault.
pub fn write_faults<P: AsRef<Path>>(file_path: P, faults: &[ChannelFault]) -> Result<()> {
    let path = file_path.as_ref();
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    for fault in faults {
        writeln!(file, "{}", fault.line())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_one_line_per_fault_after_truncate() {
        let path = std::env::temp_dir().join(format!("whales-cli-{}-faults.txt", std::process::id()));
        fs::write(&path, "stale line\n").unwrap();

        truncate_faults(&path).expect("truncate");
        let faults = vec![
            ChannelFault {
                identifier: "luna".to_string(),
                offset: TimeOffset::ZERO,
                reason: "invalid symbol".to_string(),
            },
            ChannelFault {
                identifier: "luna".to_string(),
                offset: TimeOffset::Years(2),
                reason: "invalid symbol".to_string(),
            },
        ];
        write_faults(&path, &faults).expect("write faults");

        let text = fs::read_to_string(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(text, "luna 0d invalid symbol\nluna 2y invalid symbol\n");
    }
}
