use std::time::Duration;

use crate::error::{AppError, Result};

use super::FetchConfig;

/// Check a fetch configuration and report every problem found in one error.
pub fn validate_config(config: &FetchConfig) -> Result<()> {
    let mut issues = Vec::new();

    if config.concurrency_limit == 0 {
        issues.push("concurrency_limit must be at least 1".to_string());
    }

    if config.query_timeout == Duration::ZERO {
        issues.push("query_timeout_ms must be greater than zero".to_string());
    }

    validate_market(config, &mut issues);
    validate_source(config, &mut issues);

    if issues.is_empty() {
        Ok(())
    } else {
        Err(AppError::message(format!(
            "invalid fetch configuration: {}",
            issues.join("; ")
        )))
    }
}

fn validate_market(config: &FetchConfig, issues: &mut Vec<String>) {
    let market = &config.market;
    if market.prefix.trim().is_empty() {
        issues.push("market.prefix must not be empty".to_string());
    }
    if market.prefix.contains(':') {
        issues.push("market.prefix must not contain ':'".to_string());
    }
    if market.timeframe.trim().is_empty() {
        issues.push("market.timeframe must not be empty".to_string());
    }
    if market.range == 0 {
        issues.push("market.range must be at least 1".to_string());
    }
}

fn validate_source(config: &FetchConfig, issues: &mut Vec<String>) {
    let source = &config.source;
    if !(source.endpoint.starts_with("ws://") || source.endpoint.starts_with("wss://")) {
        issues.push(format!(
            "source.endpoint must be a ws:// or wss:// URL, found `{}`",
            source.endpoint
        ));
    }
    if source.chart_url.trim().is_empty() {
        issues.push("source.chart_url must not be empty".to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_config_is_valid() {
        validate_config(&FetchConfig::builtin()).expect("builtin config should be valid");
    }

    #[test]
    fn reports_every_issue_at_once() {
        let mut config = FetchConfig::builtin()
            .with_concurrency_limit(0)
            .with_query_timeout(Duration::ZERO);
        config.market.range = 0;

        let err = validate_config(&config).expect_err("validation should fail");
        let message = err.to_string();
        assert!(message.contains("concurrency_limit"), "unexpected error message: {message}");
        assert!(message.contains("query_timeout_ms"), "unexpected error message: {message}");
        assert!(message.contains("market.range"), "unexpected error message: {message}");
    }

    #[test]
    fn rejects_http_endpoint() {
        let mut config = FetchConfig::builtin();
        config.source.endpoint = "https://data.tradingview.com/socket.io/websocket".to_string();

        let err = validate_config(&config).expect_err("validation should fail");
        assert!(
            err.to_string().contains("source.endpoint"),
            "unexpected error message: {}",
            err
        );
    }
}
