use crate::records::IdentifierReport;

use super::fan_out::OutcomeSet;
use super::offset::TimeOffset;
use super::racer::SubQueryOutcome;

/// Pivot one identifier's outcomes into a report row.
///
/// Returns `None` when the baseline (offset zero) sub-query did not succeed; that is the only
/// reason an identifier is dropped. Failed lookbacks become empty slots.
pub fn fold_outcomes(outcomes: &OutcomeSet) -> Option<IdentifierReport> {
    let (identifier, description, url) = match outcomes.get(TimeOffset::ZERO)? {
        SubQueryOutcome::Success {
            identifier,
            description,
            url,
            ..
        } => (identifier, description, url),
        SubQueryOutcome::Failure { .. } => return None,
    };

    let mut report = IdentifierReport::new(identifier, description, url);
    for outcome in outcomes.iter() {
        if let SubQueryOutcome::Success { value, offset, .. } = outcome {
            if let Some(slot) = report.slot_mut(*offset) {
                *slot = value.to_string();
            }
        }
    }

    Some(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::offset::FIXED_OFFSETS;
    use crate::fetch::racer::FailureReason;
    use chrono::Utc;

    fn success(offset: TimeOffset, value: f64) -> SubQueryOutcome {
        SubQueryOutcome::Success {
            identifier: "aaa".to_string(),
            description: "AAA whales".to_string(),
            value,
            observed_at: Utc::now(),
            url: "https://example.test/AAA".to_string(),
            offset,
        }
    }

    fn timeout(offset: TimeOffset) -> SubQueryOutcome {
        SubQueryOutcome::Failure {
            offset,
            reason: FailureReason::Timeout,
        }
    }

    #[test]
    fn missing_baseline_drops_identifier() {
        let outcomes = FIXED_OFFSETS
            .iter()
            .map(|offset| {
                if offset.is_baseline() {
                    timeout(*offset)
                } else {
                    success(*offset, 1.0)
                }
            })
            .collect();

        assert_eq!(fold_outcomes(&OutcomeSet::from_outcomes("aaa", outcomes)), None);
    }

    #[test]
    fn baseline_alone_still_produces_report() {
        let outcomes = FIXED_OFFSETS
            .iter()
            .map(|offset| {
                if offset.is_baseline() {
                    success(*offset, 12.3)
                } else {
                    timeout(*offset)
                }
            })
            .collect();

        let report = fold_outcomes(&OutcomeSet::from_outcomes("aaa", outcomes))
            .expect("report for baseline success");
        assert_eq!(report.symbol, "aaa");
        assert_eq!(report.description, "AAA whales");
        assert_eq!(report.url, "https://example.test/AAA");
        assert_eq!(report.day_0, "12.3");
        for offset in &FIXED_OFFSETS[1..] {
            assert_eq!(report.slot(*offset), Some(""), "slot {offset} should be empty");
        }
    }

    #[test]
    fn every_success_fills_its_own_slot() {
        let outcomes = FIXED_OFFSETS
            .iter()
            .rev()
            .enumerate()
            .map(|(i, offset)| success(*offset, i as f64 + 0.25))
            .collect();

        let report = fold_outcomes(&OutcomeSet::from_outcomes("aaa", outcomes)).unwrap();
        assert_eq!(report.year_3, "0.25");
        assert_eq!(report.year_2, "1.25");
        assert_eq!(report.year_1, "2.25");
        assert_eq!(report.day_90, "3.25");
        assert_eq!(report.day_30, "4.25");
        assert_eq!(report.day_7, "5.25");
        assert_eq!(report.day_0, "6.25");
    }
}
