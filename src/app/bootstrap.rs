use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::{load_config, validator, FetchConfig};
use crate::error::Result;

/// Everything one `fetch` run needs.
#[derive(Debug, Clone)]
pub struct FetchJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub invalid: PathBuf,
    pub csv: Option<PathBuf>,
    pub config: FetchConfig,
}

/// Built-in defaults, then the optional config file, then command-line overrides.
pub fn resolve_config(
    path: Option<&Path>,
    concurrency: Option<usize>,
    timeout_ms: Option<u64>,
) -> Result<FetchConfig> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => FetchConfig::builtin(),
    };

    if let Some(limit) = concurrency {
        config = config.with_concurrency_limit(limit);
    }
    if let Some(ms) = timeout_ms {
        config = config.with_query_timeout(Duration::from_millis(ms));
    }

    validator::validate_config(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_file() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR"));
        let path = root.join("assets").join("config.json");

        let config = resolve_config(Some(&path), Some(2), Some(3_000)).expect("config resolves");

        assert_eq!(config.concurrency_limit, 2);
        assert_eq!(config.query_timeout, Duration::from_secs(3));
        assert_eq!(config.market.prefix, "INTOTHEBLOCK");
    }

    #[test]
    fn zero_timeout_flag_is_rejected() {
        let err = resolve_config(None, None, Some(0)).expect_err("zero timeout is invalid");
        assert!(err.to_string().contains("query_timeout_ms"), "unexpected error: {err}");
    }
}
