use crate::types::AnalyticsPoint;
use chrono::{Datelike, Days, NaiveDate, Weekday};
use rand::distr::{Distribution, Uniform};

pub const DEFAULT_SAMPLE_DAYS: u32 = 30;
pub const MAX_SAMPLE_DAYS: u32 = 366;

const WEEKDAY_BASE: (f64, f64) = (150.0, 450.0);
const WEEKEND_BASE: (f64, f64) = (80.0, 230.0);

/// Synthetic series for exercising charts without an upstream: `days` points
/// ending at `today`, oldest first. Weekends run lower than weekdays and every
/// day is scaled by one random factor in `[0.8, 1.2)`.
pub fn sample_series<R: rand::Rng + ?Sized>(today: NaiveDate, days: u32, rng: &mut R) -> Vec<AnalyticsPoint> {
    let days = days.min(MAX_SAMPLE_DAYS);
    let factor = Uniform::new(0.8f64, 1.2).expect("valid sample factor range");

    (0..days)
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(u64::from(back))))
        .map(|date| {
            let (visitors, pageviews) = match date.weekday() {
                Weekday::Sat | Weekday::Sun => WEEKEND_BASE,
                _ => WEEKDAY_BASE,
            };
            let scale = factor.sample(&mut *rng);
            AnalyticsPoint::new(
                date.format("%Y-%m-%d").to_string(),
                (visitors * scale).round() as u64,
                (pageviews * scale).round() as u64,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_series_shape() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 25).unwrap();
        let points = sample_series(today, DEFAULT_SAMPLE_DAYS, &mut rand::rng());
        assert_eq!(points.len(), 30);
        assert_eq!(points.first().unwrap().date, "2025-02-24");
        assert_eq!(points.last().unwrap().date, "2025-03-25");

        for point in &points {
            let date = NaiveDate::parse_from_str(&point.date, "%Y-%m-%d").unwrap();
            if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                assert!((64..=96).contains(&point.visitors), "{:?}", point);
                assert!((184..=276).contains(&point.pageviews), "{:?}", point);
            } else {
                assert!((120..=180).contains(&point.visitors), "{:?}", point);
                assert!((360..=540).contains(&point.pageviews), "{:?}", point);
            }
        }
    }

    #[test]
    fn test_sample_series_bounds() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 25).unwrap();
        assert!(sample_series(today, 0, &mut rand::rng()).is_empty());
        assert_eq!(sample_series(today, 10_000, &mut rand::rng()).len(), MAX_SAMPLE_DAYS as usize);
    }
}
