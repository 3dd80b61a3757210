use std::{fs, path::Path, time::Duration};

use serde::Deserialize;

use crate::config::validator;
use crate::error::{Context, Result};

use super::{FetchConfig, MarketConfig, SourceConfig};

/// Load a fetch configuration from JSON, layering the file over the built-in defaults.
pub fn load_config(path: &Path) -> Result<FetchConfig> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read fetch config JSON at {}", path.display()))?;

    let raw: RawFetchConfig = serde_json::from_str(&json)
        .with_context(|| format!("failed to parse fetch config JSON at {}", path.display()))?;

    let config = raw.into_fetch_config();
    validator::validate_config(&config)?;
    Ok(config)
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawFetchConfig {
    #[serde(default)]
    concurrency_limit: Option<usize>,
    #[serde(default)]
    query_timeout_ms: Option<u64>,
    #[serde(default)]
    market: RawMarketConfig,
    #[serde(default)]
    source: RawSourceConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawMarketConfig {
    prefix: Option<String>,
    suffix: Option<String>,
    timeframe: Option<String>,
    range: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawSourceConfig {
    endpoint: Option<String>,
    origin: Option<String>,
    chart_url: Option<String>,
}

impl RawFetchConfig {
    fn into_fetch_config(self) -> FetchConfig {
        let defaults = FetchConfig::builtin();
        FetchConfig {
            concurrency_limit: self
                .concurrency_limit
                .unwrap_or(defaults.concurrency_limit),
            query_timeout: self
                .query_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.query_timeout),
            market: self.market.into_market_config(defaults.market),
            source: self.source.into_source_config(defaults.source),
        }
    }
}

impl RawMarketConfig {
    fn into_market_config(self, defaults: MarketConfig) -> MarketConfig {
        MarketConfig {
            prefix: self.prefix.unwrap_or(defaults.prefix),
            suffix: self.suffix.unwrap_or(defaults.suffix),
            timeframe: self.timeframe.unwrap_or(defaults.timeframe),
            range: self.range.unwrap_or(defaults.range),
        }
    }
}

impl RawSourceConfig {
    fn into_source_config(self, defaults: SourceConfig) -> SourceConfig {
        SourceConfig {
            endpoint: self.endpoint.unwrap_or(defaults.endpoint),
            origin: self.origin.unwrap_or(defaults.origin),
            chart_url: self.chart_url.unwrap_or(defaults.chart_url),
        }
    }
}
