use chrono::{DateTime, Utc};
use futures::future::join_all;

use crate::config::FetchConfig;

use super::channel::ChannelFactory;
use super::offset::{TimeOffset, FIXED_OFFSETS};
use super::racer::{race_sub_query, SubQuery, SubQueryOutcome};

/// All settled sub-query outcomes for one identifier, one per fixed offset.
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeSet {
    identifier: String,
    outcomes: Vec<SubQueryOutcome>,
}

impl OutcomeSet {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn get(&self, offset: TimeOffset) -> Option<&SubQueryOutcome> {
        self.outcomes.iter().find(|outcome| outcome.offset() == offset)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SubQueryOutcome> {
        self.outcomes.iter()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub(crate) fn from_outcomes(identifier: &str, outcomes: Vec<SubQueryOutcome>) -> Self {
        Self {
            identifier: identifier.to_string(),
            outcomes,
        }
    }
}

/// Race every fixed offset for `identifier` at once and wait for all of them to settle.
///
/// All offsets share one `now` anchor. Individual failures never cut the wait short.
pub async fn fan_out<F: ChannelFactory>(
    factory: &F,
    identifier: &str,
    config: &FetchConfig,
) -> OutcomeSet {
    let now = Utc::now();
    fan_out_at(factory, identifier, config, now).await
}

pub(crate) async fn fan_out_at<F: ChannelFactory>(
    factory: &F,
    identifier: &str,
    config: &FetchConfig,
    now: DateTime<Utc>,
) -> OutcomeSet {
    let queries: Vec<SubQuery> = FIXED_OFFSETS
        .iter()
        .map(|offset| SubQuery::new(identifier, *offset))
        .collect();

    let outcomes = join_all(
        queries
            .iter()
            .map(|query| race_sub_query(factory, query, config, now)),
    )
    .await;

    OutcomeSet::from_outcomes(identifier, outcomes)
}
