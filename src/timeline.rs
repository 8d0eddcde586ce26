use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate};

use crate::models::{BarChartSeries, DailyXpBucket, RawTransaction};

const TARGET_TICKS: f64 = 10.0;
const MAX_NICE_PASSES: usize = 10;

/// Calendar day of a timestamp, in the offset the timestamp was written in.
pub fn day_of(created_at: &str) -> Option<NaiveDate> {
    let text = created_at.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
        return Some(timestamp.date_naive());
    }
    // Accept shortened ISO forms such as "2024-01-01T10:00Z" or a bare date.
    text.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

/// Sums every transaction, skill updates included, per calendar day.
pub fn bucket_by_day(transactions: &[RawTransaction]) -> Vec<DailyXpBucket> {
    let mut days: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();

    for transaction in transactions {
        match day_of(&transaction.created_at) {
            Some(day) => days.entry(day).or_default().push(transaction.amount),
            None => tracing::debug!(
                created_at = %transaction.created_at,
                kind = %transaction.kind,
                "skipping transaction without a readable date"
            ),
        }
    }

    days.into_iter()
        .map(|(date, mut amounts)| {
            // Fixed summation order keeps float totals independent of input order.
            amounts.sort_by(f64::total_cmp);
            DailyXpBucket {
                date,
                total_xp: amounts.into_iter().sum(),
            }
        })
        .collect()
}

pub fn bar_chart(buckets: Vec<DailyXpBucket>) -> BarChartSeries {
    let x_domain = match (buckets.first(), buckets.last()) {
        (Some(first), Some(last)) => Some((first.date, last.date)),
        _ => None,
    };
    let max_total = buckets
        .iter()
        .map(|bucket| bucket.total_xp)
        .fold(f64::NEG_INFINITY, f64::max);

    BarChartSeries {
        buckets,
        x_domain,
        y_domain: (0.0, nice_ceiling(max_total)),
    }
}

/// Rounds `max` up to a tick boundary of a `[0, max]` linear scale.
pub fn nice_ceiling(max: f64) -> f64 {
    if !max.is_finite() || max <= 0.0 {
        return 0.0;
    }

    let mut stop = max;
    let mut previous_step = None;
    for _ in 0..MAX_NICE_PASSES {
        let step = tick_increment(stop);
        if previous_step == Some(step) {
            return stop;
        }
        if step > 0.0 {
            stop = (stop / step).ceil() * step;
        } else if step < 0.0 {
            stop = (stop * step).floor() / step;
        } else {
            break;
        }
        previous_step = Some(step);
    }
    max
}

/// Step between ticks for `[0, stop]`. Negative values encode `1 / |step|`
/// so sub-unit steps stay exact.
fn tick_increment(stop: f64) -> f64 {
    let step = stop / TARGET_TICKS;
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };

    if power >= 0.0 {
        factor * 10f64.powf(power)
    } else {
        -10f64.powf(-power) / factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(created_at: &str, amount: f64, kind: &str) -> RawTransaction {
        RawTransaction {
            created_at: created_at.to_string(),
            amount,
            kind: kind.to_string(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn merges_same_day_entries_and_keeps_days_apart() {
        let transactions = vec![
            tx("2024-01-01T10:00Z", 50.0, "x"),
            tx("2024-01-01T22:00Z", 30.0, "y"),
            tx("2024-01-02T00:00Z", 10.0, "z"),
        ];

        let buckets = bucket_by_day(&transactions);
        assert_eq!(
            buckets,
            vec![
                DailyXpBucket { date: date(2024, 1, 1), total_xp: 80.0 },
                DailyXpBucket { date: date(2024, 1, 2), total_xp: 10.0 },
            ]
        );
    }

    #[test]
    fn separates_days_across_month_and_year_boundaries() {
        let transactions = vec![
            tx("2024-01-01T00:00:00+00:00", 3.0, "xp"),
            tx("2023-12-31T23:59:59+00:00", 2.0, "xp"),
            tx("2024-02-01T08:00:00.512+00:00", 7.0, "xp"),
            tx("2024-01-31T08:00:00+00:00", 1.0, "xp"),
        ];

        let dates: Vec<NaiveDate> = bucket_by_day(&transactions)
            .into_iter()
            .map(|bucket| bucket.date)
            .collect();
        assert_eq!(
            dates,
            vec![date(2023, 12, 31), date(2024, 1, 1), date(2024, 1, 31), date(2024, 2, 1)]
        );
    }

    #[test]
    fn uses_the_timestamps_own_offset() {
        let buckets = bucket_by_day(&[tx("2024-03-01T23:30:00-05:00", 5.0, "xp")]);
        assert_eq!(buckets[0].date, date(2024, 3, 1));
    }

    #[test]
    fn includes_skill_updates_in_daily_totals() {
        let transactions = vec![
            tx("2024-05-05T09:00:00Z", 100.0, "xp"),
            tx("2024-05-05T09:00:00Z", 35.0, "skill_go"),
        ];
        assert_eq!(bucket_by_day(&transactions)[0].total_xp, 135.0);
    }

    #[test]
    fn reordering_input_gives_identical_output() {
        let transactions = vec![
            tx("2024-01-03T10:00:00Z", 0.1, "xp"),
            tx("2024-01-01T10:00:00Z", 0.2, "xp"),
            tx("2024-01-03T11:00:00Z", 0.7, "xp"),
            tx("2024-01-03T12:00:00Z", 1e16, "xp"),
            tx("2024-01-01T12:00:00Z", 0.3, "xp"),
        ];
        let mut reversed = transactions.clone();
        reversed.reverse();
        let mut rotated = transactions.clone();
        rotated.rotate_left(2);

        let expected = bucket_by_day(&transactions);
        assert_eq!(expected.len(), 2);
        for permutation in [reversed, rotated] {
            let actual = bucket_by_day(&permutation);
            assert_eq!(actual.len(), expected.len());
            for (a, b) in actual.iter().zip(expected.iter()) {
                assert_eq!(a.date, b.date);
                assert_eq!(a.total_xp.to_bits(), b.total_xp.to_bits());
            }
        }
    }

    #[test]
    fn unreadable_dates_are_skipped() {
        let transactions = vec![tx("", 10.0, "xp"), tx("yesterday", 5.0, "xp")];
        assert!(bucket_by_day(&transactions).is_empty());
    }

    #[test]
    fn empty_series_has_degenerate_domain() {
        let chart = bar_chart(Vec::new());
        assert!(chart.buckets.is_empty());
        assert_eq!(chart.x_domain, None);
        assert_eq!(chart.y_domain, (0.0, 0.0));
    }

    #[test]
    fn chart_domain_spans_first_to_last_day() {
        let chart = bar_chart(bucket_by_day(&[
            tx("2024-01-02T10:00:00Z", 83.0, "xp"),
            tx("2024-01-09T10:00:00Z", 12.0, "xp"),
        ]));
        assert_eq!(chart.x_domain, Some((date(2024, 1, 2), date(2024, 1, 9))));
        assert_eq!(chart.y_domain, (0.0, 90.0));
    }

    #[test]
    fn nice_ceiling_snaps_to_tick_boundaries() {
        assert_eq!(nice_ceiling(80.0), 80.0);
        assert_eq!(nice_ceiling(83.0), 90.0);
        assert_eq!(nice_ceiling(4.3), 4.5);
        assert_eq!(nice_ceiling(1234.0), 1300.0);
        assert_eq!(nice_ceiling(-5.0), 0.0);
    }
}
