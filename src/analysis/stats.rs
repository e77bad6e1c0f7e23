use crate::types::{Record, Table};
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Visit date, `YYYY-MM-DD`.
pub const DATE_COLUMN: &str = "2";
/// Visit time, `HH:MM[:SS]`.
pub const TIME_COLUMN: &str = "3";
/// Search keyword that led to the visit.
pub const KEYWORD_COLUMN: &str = "8";

static HOUR: OnceLock<Regex> = OnceLock::new();

fn hour_pattern() -> &'static Regex {
    HOUR.get_or_init(|| Regex::new(r"(\d{2}):").expect("valid hour regex"))
}

/// Visit aggregates over one table. Recomputed from scratch for every table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_visits: u64,
    pub visits_by_day: BTreeMap<String, u64>,
    /// 0 = Sunday .. 6 = Saturday.
    pub visits_by_day_of_week: BTreeMap<u8, u64>,
    /// 0..=23.
    pub visits_by_hour: BTreeMap<u8, u64>,
    pub visits_by_keyword: BTreeMap<String, u64>,
}

/// Aggregate a table's records. A record missing a column (or carrying an
/// unusable value in it) is simply absent from that dimension.
pub fn compute_stats(table: &Table) -> Stats {
    let mut stats = Stats {
        total_visits: table.records.len() as u64,
        ..Default::default()
    };

    for record in &table.records {
        if let Some((day, date)) = visit_date(record) {
            *stats.visits_by_day.entry(day.to_string()).or_default() += 1;
            let weekday = date.weekday().num_days_from_sunday() as u8;
            *stats.visits_by_day_of_week.entry(weekday).or_default() += 1;
        }

        if let Some(hour) = record.get(TIME_COLUMN).and_then(visit_hour) {
            *stats.visits_by_hour.entry(hour).or_default() += 1;
        }

        if let Some(keyword) = record.get(KEYWORD_COLUMN).map(str::trim) {
            if !keyword.is_empty() {
                *stats.visits_by_keyword.entry(keyword.to_string()).or_default() += 1;
            }
        }
    }

    stats
}

fn visit_date(record: &Record) -> Option<(&str, NaiveDate)> {
    let day = record.get(DATE_COLUMN)?.trim();
    let date = NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()?;
    Some((day, date))
}

fn visit_hour(time: &str) -> Option<u8> {
    let caps = hour_pattern().captures(time)?;
    caps[1].parse::<u8>().ok().filter(|h| *h < 24)
}
