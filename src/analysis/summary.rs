use crate::types::AnalyticsPoint;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Day names indexed 0 = Sunday .. 6 = Saturday.
pub const WEEKDAY_NAMES: [&str; 7] = ["일요일", "월요일", "화요일", "수요일", "목요일", "금요일", "토요일"];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

/// Headline numbers for a per-date series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSummary {
    pub total_visitors: u64,
    pub total_pageviews: u64,
    pub avg_visitors: u64,
    pub avg_pageviews: u64,
    pub max_visitors: u64,
    pub max_visitors_date: String,
    pub min_visitors: u64,
    pub min_visitors_date: String,
    /// Monday through Friday.
    pub avg_weekday_visitors: u64,
    /// Saturday and Sunday.
    pub avg_weekend_visitors: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekdayRow {
    pub name: String,
    pub visitors: u64,
    pub pageviews: u64,
}

/// Summarize a series. `None` for an empty series.
///
/// Points whose date does not parse still count towards totals and extremes
/// but are left out of the weekday/weekend split.
pub fn summarize(points: &[AnalyticsPoint]) -> Option<ChartSummary> {
    // Ties keep the earliest point.
    let max = points.iter().reduce(|best, p| if p.visitors > best.visitors { p } else { best })?;
    let min = points.iter().reduce(|best, p| if p.visitors < best.visitors { p } else { best })?;

    let total_visitors: u64 = points.iter().map(|p| p.visitors).sum();
    let total_pageviews: u64 = points.iter().map(|p| p.pageviews).sum();

    let (mut weekday, mut weekend) = (Vec::new(), Vec::new());
    for point in points {
        match parse_date(&point.date).map(|d| d.weekday()) {
            Some(Weekday::Sat | Weekday::Sun) => weekend.push(point.visitors),
            Some(_) => weekday.push(point.visitors),
            None => {}
        }
    }

    Some(ChartSummary {
        total_visitors,
        total_pageviews,
        avg_visitors: rounded_mean(total_visitors, points.len()),
        avg_pageviews: rounded_mean(total_pageviews, points.len()),
        max_visitors: max.visitors,
        max_visitors_date: max.date.clone(),
        min_visitors: min.visitors,
        min_visitors_date: min.date.clone(),
        avg_weekday_visitors: rounded_mean(weekday.iter().sum(), weekday.len()),
        avg_weekend_visitors: rounded_mean(weekend.iter().sum(), weekend.len()),
    })
}

/// Average visitors and pageviews per day of week, Sunday first. Always seven
/// rows; days with no points report zeros. Empty for an empty series.
pub fn weekday_profile(points: &[AnalyticsPoint]) -> Vec<WeekdayRow> {
    if points.is_empty() {
        return Vec::new();
    }

    // (visitors, pageviews, count)
    let mut buckets = [(0u64, 0u64, 0usize); 7];
    for point in points {
        if let Some(date) = parse_date(&point.date) {
            let bucket = &mut buckets[date.weekday().num_days_from_sunday() as usize];
            bucket.0 += point.visitors;
            bucket.1 += point.pageviews;
            bucket.2 += 1;
        }
    }

    WEEKDAY_NAMES
        .iter()
        .zip(buckets)
        .map(|(name, (visitors, pageviews, count))| WeekdayRow {
            name: name.to_string(),
            visitors: rounded_mean(visitors, count),
            pageviews: rounded_mean(pageviews, count),
        })
        .collect()
}

pub(crate) fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

fn rounded_mean(total: u64, count: usize) -> u64 {
    if count == 0 {
        return 0;
    }
    (total as f64 / count as f64).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn week() -> Vec<AnalyticsPoint> {
        // 2025-03-23 is a Sunday.
        vec![
            AnalyticsPoint::new("2025-03-23", 80, 200),
            AnalyticsPoint::new("2025-03-24", 150, 450),
            AnalyticsPoint::new("2025-03-25", 151, 451),
            AnalyticsPoint::new("2025-03-26", 150, 400),
            AnalyticsPoint::new("2025-03-29", 81, 230),
        ]
    }

    #[test]
    fn test_summary() {
        let summary = summarize(&week()).unwrap();
        assert_eq!(summary.total_visitors, 612);
        assert_eq!(summary.total_pageviews, 1731);
        assert_eq!(summary.avg_visitors, 122);
        assert_eq!(summary.avg_pageviews, 346);
        assert_eq!(summary.max_visitors, 151);
        assert_eq!(summary.max_visitors_date, "2025-03-25");
        assert_eq!(summary.min_visitors, 80);
        assert_eq!(summary.min_visitors_date, "2025-03-23");
        assert_eq!(summary.avg_weekday_visitors, 150);
        assert_eq!(summary.avg_weekend_visitors, 81);
    }

    #[test]
    fn test_extremes_report_first_date() {
        let points = vec![
            AnalyticsPoint::new("a", 5, 0),
            AnalyticsPoint::new("b", 9, 0),
            AnalyticsPoint::new("c", 9, 0),
            AnalyticsPoint::new("d", 5, 0),
        ];
        let summary = summarize(&points).unwrap();
        assert_eq!(summary.max_visitors_date, "b");
        assert_eq!(summary.min_visitors_date, "a");
        assert_eq!(summary.avg_weekday_visitors, 0);
    }

    #[test]
    fn test_empty_series() {
        assert!(summarize(&[]).is_none());
        assert!(weekday_profile(&[]).is_empty());
    }

    #[test]
    fn test_weekday_profile() {
        let mut points = week();
        points.push(AnalyticsPoint::new("2025-03-30", 90, 250));
        points.push(AnalyticsPoint::new("날짜 없음", 1000, 1000));
        let rows = weekday_profile(&points);
        assert_eq!(rows.len(), 7);
        assert_eq!(rows[0], WeekdayRow { name: "일요일".into(), visitors: 85, pageviews: 225 });
        assert_eq!(rows[1].visitors, 150);
        assert_eq!(rows[4], WeekdayRow { name: "목요일".into(), visitors: 0, pageviews: 0 });
        assert_eq!(rows[6].name, "토요일");
    }

    #[test]
    fn test_parse_date_formats() {
        assert!(parse_date("2025-03-01").is_some());
        assert!(parse_date("2025/03/01").is_some());
        assert!(parse_date("20250301").is_some());
        assert!(parse_date("March 1st").is_none());
    }
}
