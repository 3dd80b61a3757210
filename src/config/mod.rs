use std::time::Duration;

pub mod loader;
pub mod validator;

pub use loader::load_config;

/// Default number of identifiers processed at once. Raising it trips the remote rate limiter.
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 5;
/// Default time a single sub-query may wait for its first data point.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_millis(5_000);

pub const DEFAULT_MARKET_PREFIX: &str = "INTOTHEBLOCK";
pub const DEFAULT_MARKET_SUFFIX: &str = "_WHALESPERCENTAGE";
pub const DEFAULT_TIMEFRAME: &str = "1D";
pub const DEFAULT_RANGE: u32 = 1;

pub const DEFAULT_SOURCE_ENDPOINT: &str =
    "wss://data.tradingview.com/socket.io/websocket?type=chart";
pub const DEFAULT_SOURCE_ORIGIN: &str = "https://www.tradingview.com";
pub const DEFAULT_CHART_URL: &str = "https://www.tradingview.com/chart/?symbol=";

/// How a market key is built from an identifier and which series is requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketConfig {
    pub prefix: String,
    pub suffix: String,
    pub timeframe: String,
    pub range: u32,
}

impl MarketConfig {
    /// `PREFIX:IDENTIFIER_SUFFIX`, identifier upper-cased.
    pub fn market_key(&self, identifier: &str) -> String {
        format!(
            "{}:{}{}",
            self.prefix,
            identifier.trim().to_uppercase(),
            self.suffix
        )
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_MARKET_PREFIX.to_string(),
            suffix: DEFAULT_MARKET_SUFFIX.to_string(),
            timeframe: DEFAULT_TIMEFRAME.to_string(),
            range: DEFAULT_RANGE,
        }
    }
}

/// Connection details for the live chart source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub endpoint: String,
    pub origin: String,
    pub chart_url: String,
}

impl SourceConfig {
    pub fn chart_url_for(&self, market_key: &str) -> String {
        format!("{}{}", self.chart_url, market_key)
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SOURCE_ENDPOINT.to_string(),
            origin: DEFAULT_SOURCE_ORIGIN.to_string(),
            chart_url: DEFAULT_CHART_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    pub concurrency_limit: usize,
    pub query_timeout: Duration,
    pub market: MarketConfig,
    pub source: SourceConfig,
}

impl FetchConfig {
    pub fn builtin() -> Self {
        Self {
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            market: MarketConfig::default(),
            source: SourceConfig::default(),
        }
    }

    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit;
        self
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::builtin()
    }
}
