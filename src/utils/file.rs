use std::fs;
use std::path::Path;

use crate::error::{Context, Result};

/// Read identifiers, one per line. Blank lines and `#` comments are skipped; order and
/// duplicates are kept.
pub fn load_identifiers(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read identifier list at {}", path.display()))?;

    Ok(parse_identifiers(&contents))
}

pub fn parse_identifiers(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.to_string())
        .collect()
}

/// Create the parent directory of `path` if it does not exist yet.
pub fn ensure_parent_dir(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    Ok(())
}
