use std::fmt;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use tokio::time::{timeout_at, Instant};

use crate::config::FetchConfig;

use super::channel::{ChannelFactory, ChartEvent, Period, RemoteChannel, SeriesRequest};
use super::offset::TimeOffset;

const OPEN_TIMED_OUT: &str = "timed out opening channel";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubQuery {
    pub identifier: String,
    pub offset: TimeOffset,
}

impl SubQuery {
    pub fn new(identifier: impl Into<String>, offset: TimeOffset) -> Self {
        Self {
            identifier: identifier.into(),
            offset,
        }
    }

    pub fn series_request(&self, config: &FetchConfig, now: DateTime<Utc>) -> SeriesRequest {
        SeriesRequest {
            market_key: config.market.market_key(&self.identifier),
            timeframe: config.market.timeframe.clone(),
            range: config.market.range,
            to: self.offset.resolve(now),
            offset: self.offset,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FailureReason {
    Timeout,
    /// Error event pushed by the source.
    Remote(String),
    /// Source hung up before any data point arrived.
    Disconnected,
    /// The channel could not be opened at all.
    Open(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Timeout => f.write_str("timeout"),
            FailureReason::Remote(text) => f.write_str(text),
            FailureReason::Disconnected => f.write_str("channel closed before any data"),
            FailureReason::Open(text) => write!(f, "open failed: {text}"),
        }
    }
}

/// Settled result of one sub-query.
#[derive(Debug, Clone, PartialEq)]
pub enum SubQueryOutcome {
    Success {
        identifier: String,
        description: String,
        value: f64,
        observed_at: DateTime<Utc>,
        url: String,
        offset: TimeOffset,
    },
    Failure {
        offset: TimeOffset,
        reason: FailureReason,
    },
}

impl SubQueryOutcome {
    pub fn offset(&self) -> TimeOffset {
        match self {
            SubQueryOutcome::Success { offset, .. } | SubQueryOutcome::Failure { offset, .. } => {
                *offset
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SubQueryOutcome::Success { .. })
    }

    pub fn failure_reason(&self) -> Option<&FailureReason> {
        match self {
            SubQueryOutcome::Failure { reason, .. } => Some(reason),
            SubQueryOutcome::Success { .. } => None,
        }
    }
}

enum Settled {
    Data(Period),
    Remote(String),
    Disconnected,
}

/// Run one sub-query against a fresh channel, racing the first data point against
/// `config.query_timeout`. The deadline covers opening the channel as well; an open still
/// pending at the deadline counts as an open failure.
///
/// Never fails: every outcome, including timeouts and remote errors, is returned as data.
/// An opened channel is closed exactly once before this returns.
pub async fn race_sub_query<F: ChannelFactory>(
    factory: &F,
    query: &SubQuery,
    config: &FetchConfig,
    now: DateTime<Utc>,
) -> SubQueryOutcome {
    let request = query.series_request(config, now);
    let deadline = Instant::now() + config.query_timeout;
    let offset = query.offset;

    let mut channel = match timeout_at(deadline, factory.open(&request)).await {
        Ok(Ok(channel)) => channel,
        Ok(Err(err)) => {
            warn!("Chart open failed: {} {} {}", query.identifier, offset, err);
            return SubQueryOutcome::Failure {
                offset,
                reason: FailureReason::Open(err.to_string()),
            };
        }
        Err(_) => {
            warn!("Chart open timed out: {} {}", query.identifier, offset);
            return SubQueryOutcome::Failure {
                offset,
                reason: FailureReason::Open(OPEN_TIMED_OUT.to_string()),
            };
        }
    };

    let settled = timeout_at(deadline, first_data_point(&mut channel)).await;
    let description = channel.description().unwrap_or_default().to_string();
    channel.close().await;

    match settled {
        Ok(Settled::Data(period)) => SubQueryOutcome::Success {
            identifier: query.identifier.clone(),
            description,
            value: period.value,
            observed_at: period.time,
            url: config.source.chart_url_for(&request.market_key),
            offset,
        },
        Ok(Settled::Remote(text)) => {
            warn!("Chart error: {} {} {}", query.identifier, offset, text);
            SubQueryOutcome::Failure {
                offset,
                reason: FailureReason::Remote(text),
            }
        }
        Ok(Settled::Disconnected) => SubQueryOutcome::Failure {
            offset,
            reason: FailureReason::Disconnected,
        },
        Err(_) => {
            debug!("Timeout for {} {}", query.identifier, offset);
            SubQueryOutcome::Failure {
                offset,
                reason: FailureReason::Timeout,
            }
        }
    }
}

async fn first_data_point<C: RemoteChannel>(channel: &mut C) -> Settled {
    loop {
        match channel.next_event().await {
            Some(ChartEvent::Update(periods)) => {
                // Empty updates do not resolve the race.
                if let Some(first) = periods.into_iter().next() {
                    return Settled::Data(first);
                }
            }
            Some(ChartEvent::Error(text)) => return Settled::Remote(text),
            None => return Settled::Disconnected,
        }
    }
}
