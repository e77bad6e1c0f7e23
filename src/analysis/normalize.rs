//! Resolve whatever JSON the upstream (or a caller) hands us into a per-date
//! [`AnalyticsPoint`] series.
//!
//! Shapes are tried in a fixed order and the first match wins:
//!
//! 1. JSON text: decoded and resolved again.
//! 2. Visit-log table (`data_header` + `data_content`): records grouped by the
//!    column whose header equals the configured date label.
//! 3. Array of per-day objects, keyed by synonym field names.
//! 4. Object wrapping the real payload in a container key (`data`, `result`, ...).
//! 5. Object keyed by dates.
//! 6. Object with `visitors` / `pageviews` maps keyed by date.
//! 7. Object with flattened per-day `visitor*` / `pageview*` keys.
//!
//! Anything else resolves to an empty series. Nothing here returns an error.

use crate::recovery::{table_from_value, Payload};
use crate::types::{compare_indices, AnalyticsPoint};
use chrono::{Days, NaiveDate, Utc};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Header label of the date column in the upstream locale.
pub const DEFAULT_DATE_COLUMN_LABEL: &str = "날짜";
/// Date shown for array rows that carry no date field.
pub const MISSING_DATE: &str = "날짜 없음";
/// Body the upstream returns when the caller's IP is not allow-listed.
pub const IP_RESTRICTION_MARKER: &str = "허용된 IP주소가 아닙니다";

const CONTAINER_KEYS: [&str; 6] = ["data", "result", "results", "analytics", "stats", "statistics"];
const DATE_KEYS: [&str; 3] = ["date", "dt", "날짜"];
const VISITOR_KEYS: [&str; 3] = ["visitors", "visitor_count", "방문자"];
const PAGEVIEW_KEYS: [&str; 3] = ["pageviews", "pageview_count", "페이지뷰"];

static DATE_KEY: OnceLock<Regex> = OnceLock::new();

fn date_key() -> &'static Regex {
    DATE_KEY.get_or_init(|| {
        Regex::new(r"^\d{4}[-/]?\d{2}[-/]?\d{2}$|^\d{8}$").expect("valid date key regex")
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub date_column_label: String,
    /// Last day of synthesized date ranges (flattened per-day keys).
    pub today: NaiveDate,
}

impl NormalizeOptions {
    pub fn new(date_column_label: impl Into<String>, today: NaiveDate) -> Self {
        Self {
            date_column_label: date_column_label.into(),
            today,
        }
    }

    /// Options anchored at the current UTC date.
    pub fn for_today(date_column_label: impl Into<String>) -> Self {
        Self::new(date_column_label, Utc::now().date_naive())
    }
}

/// Conditions the upstream reports as a plain-text body instead of data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamNotice {
    IpNotAllowed,
}

impl UpstreamNotice {
    pub fn message(self) -> &'static str {
        match self {
            UpstreamNotice::IpNotAllowed => {
                "upstream rejected the request: this server's IP address is not allow-listed (허용된 IP주소가 아닙니다)"
            }
        }
    }
}

pub fn detect_upstream_notice(text: &str) -> Option<UpstreamNotice> {
    text.contains(IP_RESTRICTION_MARKER)
        .then_some(UpstreamNotice::IpNotAllowed)
}

/// Resolve `value` into a per-date series. Unrecognized input yields an empty series.
pub fn normalize(value: &Value, opts: &NormalizeOptions) -> Vec<AnalyticsPoint> {
    match value {
        Value::String(text) => from_text(text, opts),
        Value::Object(obj) => from_object(value, obj, opts),
        Value::Array(items) => from_array(items),
        _ => {
            debug!("normalize: scalar input, nothing to chart");
            Vec::new()
        }
    }
}

fn from_text(text: &str, opts: &NormalizeOptions) -> Vec<AnalyticsPoint> {
    if let Some(notice) = detect_upstream_notice(text) {
        warn!("normalize: {}", notice.message());
        return Vec::new();
    }
    match Payload::classify(text) {
        Payload::Structured(value) => normalize(&value, opts),
        Payload::Unstructured(_) => {
            warn!("normalize: text payload is not JSON");
            Vec::new()
        }
    }
}

fn from_object(value: &Value, obj: &Map<String, Value>, opts: &NormalizeOptions) -> Vec<AnalyticsPoint> {
    let has = |key: &str| obj.get(key).is_some_and(is_truthy);

    if has("data_header") && has("data_content") {
        return from_table(value, &opts.date_column_label);
    }

    if let Some(inner) = CONTAINER_KEYS.iter().find_map(|key| obj.get(*key).filter(|v| is_truthy(v))) {
        return normalize(inner, opts);
    }

    if obj.keys().any(|key| date_key().is_match(key)) {
        debug!("normalize: date-keyed object");
        return obj
            .iter()
            .map(|(date, entry)| match entry {
                Value::Object(fields) => point_from_fields(date.clone(), fields),
                Value::Number(_) => AnalyticsPoint::new(date.as_str(), count_value(entry), 0),
                _ => AnalyticsPoint::new(date.as_str(), 0, 0),
            })
            .collect();
    }

    let visitors = first_truthy(obj, &["visitors"]);
    let pageviews = first_truthy(obj, &["pageviews"]);
    if visitors.is_some() || pageviews.is_some() {
        debug!("normalize: visitors/pageviews maps");
        return from_sibling_maps(visitors, pageviews);
    }

    let flattened = from_flattened_keys(obj, opts.today);
    if flattened.is_empty() {
        debug!("normalize: unrecognized object shape ({} keys)", obj.len());
    }
    flattened
}

/// Visit-log table: one visit per record, bucketed by the date column.
///
/// The format has no separate page-view signal, so `pageviews` repeats the visit count.
fn from_table(value: &Value, date_label: &str) -> Vec<AnalyticsPoint> {
    let Some(table) = table_from_value(value) else {
        return Vec::new();
    };
    let Some(column) = table.column_labelled(date_label) else {
        warn!("normalize: no header column labelled {:?}", date_label);
        return Vec::new();
    };

    let mut visits: BTreeMap<&str, u64> = BTreeMap::new();
    for date in table.records.iter().filter_map(|r| r.get(column)) {
        if !date.is_empty() {
            *visits.entry(date).or_default() += 1;
        }
    }
    debug!("normalize: {} record(s) over {} date(s)", table.records.len(), visits.len());

    visits
        .into_iter()
        .map(|(date, count)| AnalyticsPoint::new(date, count, count))
        .collect()
}

fn from_array(items: &[Value]) -> Vec<AnalyticsPoint> {
    items
        .iter()
        .map(|item| match item.as_object() {
            Some(fields) => {
                let date = first_truthy(fields, &DATE_KEYS)
                    .and_then(scalar_text)
                    .unwrap_or_else(|| MISSING_DATE.to_string());
                point_from_fields(date, fields)
            }
            None => AnalyticsPoint::new(MISSING_DATE, 0, 0),
        })
        .collect()
}

fn from_sibling_maps(visitors: Option<&Value>, pageviews: Option<&Value>) -> Vec<AnalyticsPoint> {
    let empty = Map::new();
    let visitors = visitors.and_then(Value::as_object).unwrap_or(&empty);
    let pageviews = pageviews.and_then(Value::as_object).unwrap_or(&empty);

    let dates: BTreeSet<&String> = visitors.keys().chain(pageviews.keys()).collect();
    dates
        .into_iter()
        .map(|date| {
            AnalyticsPoint::new(
                date.as_str(),
                visitors.get(date).map_or(0, count_value),
                pageviews.get(date).map_or(0, count_value),
            )
        })
        .collect()
}

/// `{"visitorsDay1": 10, "pageviewsDay1": 30, ...}`: positional pairing against
/// consecutive dates ending at `today`, oldest first. Keys are ordered by their
/// trailing day number, so `Day10` follows `Day9`.
fn from_flattened_keys(obj: &Map<String, Value>, today: NaiveDate) -> Vec<AnalyticsPoint> {
    let visitor_keys = day_keys(obj, "visitor");
    let pageview_keys = day_keys(obj, "pageview");
    let days = visitor_keys.len().max(pageview_keys.len());

    (0..days)
        .filter_map(|index| {
            let back = (days - 1 - index) as u64;
            let date = today.checked_sub_days(Days::new(back))?;
            let count_at = |keys: &[&String]| {
                keys.get(index)
                    .and_then(|key| obj.get(*key))
                    .map_or(0, count_value)
            };
            Some(AnalyticsPoint::new(
                date.format("%Y-%m-%d").to_string(),
                count_at(visitor_keys.as_slice()),
                count_at(pageview_keys.as_slice()),
            ))
        })
        .collect()
}

fn day_keys<'a>(obj: &'a Map<String, Value>, marker: &str) -> Vec<&'a String> {
    let mut keys: Vec<&String> = obj.keys().filter(|k| k.to_lowercase().contains(marker)).collect();
    keys.sort_by(|a, b| compare_indices(day_suffix(a), day_suffix(b)).then_with(|| a.cmp(b)));
    keys
}

/// Trailing ASCII digits of `key`, empty when there are none.
fn day_suffix(key: &str) -> &str {
    let stem = key.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    &key[stem..]
}

fn point_from_fields(date: String, fields: &Map<String, Value>) -> AnalyticsPoint {
    AnalyticsPoint {
        date,
        visitors: first_truthy(fields, &VISITOR_KEYS).map_or(0, count_value),
        pageviews: first_truthy(fields, &PAGEVIEW_KEYS).map_or(0, count_value),
    }
}

/// First truthy value whose key matches one of `synonyms`, ignoring case.
/// Synonyms are tried in order.
fn first_truthy<'a>(obj: &'a Map<String, Value>, synonyms: &[&str]) -> Option<&'a Value> {
    synonyms.iter().find_map(|synonym| {
        obj.iter()
            .find(|(key, value)| key.to_lowercase() == *synonym && is_truthy(value))
            .map(|(_, value)| value)
    })
}

/// JavaScript truthiness: `null`, `false`, `0` and `""` are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Integer-prefix coercion: `12` -> 12, `"12 visits"` -> 12, garbage -> 0.
/// Negative counts clamp to 0.
fn count_value(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => {
            let s = s.trim_start();
            let s = s.strip_prefix('+').unwrap_or(s);
            let digits: String = s.chars().take_while(char::is_ascii_digit).collect();
            digits.parse().unwrap_or(0)
        }
        _ => 0,
    }
}
