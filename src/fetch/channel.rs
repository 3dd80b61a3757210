//! Capability seam between the fetch core and a live chart source.
//!
//! A [`ChannelFactory`] opens one [`RemoteChannel`] per sub-query. The channel then yields
//! [`ChartEvent`]s until it is closed. Test doubles live in `fetch::testing`.

use chrono::{DateTime, Utc};

use super::offset::TimeOffset;
use super::FetchResult;

/// One bar of the subscribed series.
#[derive(Debug, Clone, PartialEq)]
pub struct Period {
    pub time: DateTime<Utc>,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartEvent {
    /// Bars received so far, newest first. May be empty.
    Update(Vec<Period>),
    /// Remote-reported fault, e.g. an unknown or delisted market.
    Error(String),
}

/// Subscription parameters for a single series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesRequest {
    pub market_key: String,
    pub timeframe: String,
    pub range: u32,
    pub to: DateTime<Utc>,
    /// Lookback that produced `to`.
    pub offset: TimeOffset,
}

#[allow(async_fn_in_trait)]
pub trait RemoteChannel {
    /// Wait for the next event. `None` once the source has hung up.
    async fn next_event(&mut self) -> Option<ChartEvent>;

    /// Human-readable market description reported by the source, if it sent one yet.
    fn description(&self) -> Option<&str>;

    /// Release the underlying resource. Safe to call more than once.
    async fn close(&mut self);
}

#[allow(async_fn_in_trait)]
pub trait ChannelFactory {
    type Channel: RemoteChannel;

    async fn open(&self, request: &SeriesRequest) -> FetchResult<Self::Channel>;
}
