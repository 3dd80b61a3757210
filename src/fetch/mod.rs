use crate::error::Result;

pub mod batch;
pub mod channel;
pub mod fan_out;
pub mod fold;
pub mod offset;
pub mod racer;

#[cfg(test)]
pub(crate) mod testing;

pub use batch::{BatchDriver, BatchProgress};
pub use channel::{ChannelFactory, ChartEvent, Period, RemoteChannel, SeriesRequest};
pub use fan_out::{fan_out, OutcomeSet};
pub use fold::fold_outcomes;
pub use offset::{TimeOffset, FIXED_OFFSETS};
pub use racer::{race_sub_query, FailureReason, SubQuery, SubQueryOutcome};

pub type FetchResult<T> = Result<T>;

#[inline]
pub fn ensure_concurrency_limit(limit: usize) -> usize {
    limit.max(1)
}
