use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

// ───────────────────────────────────────────────────────────────────────────
// Canonical table model
// ───────────────────────────────────────────────────────────────────────────

/// Column index (decimal digits, as text) -> value.
pub type FieldMap = BTreeMap<String, String>;

/// Column index -> human-readable column name.
pub type Header = FieldMap;

/// Numeric ordering for decimal-digit column indices ("10" sorts after "9").
///
/// Non-digit indices never come out of the extractors, but they still get a
/// total order: they sort after every numeric index, lexically among themselves.
pub fn compare_indices(a: &str, b: &str) -> Ordering {
    let numeric = |s: &str| !s.is_empty() && s.bytes().all(|c| c.is_ascii_digit());
    match (numeric(a), numeric(b)) {
        (true, true) => {
            let a = a.trim_start_matches('0');
            let b = b.trim_start_matches('0');
            a.len().cmp(&b.len()).then_with(|| a.cmp(b))
        }
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.cmp(b),
    }
}

/// Keys of a field map in numeric column order.
pub fn sorted_columns(fields: &FieldMap) -> Vec<&str> {
    let mut keys: Vec<&str> = fields.keys().map(String::as_str).collect();
    keys.sort_by(|a, b| compare_indices(a, b));
    keys
}

/// One logical row. `id` is only present when the detector that produced the
/// record recovered a block id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub fields: FieldMap,
}

impl Record {
    pub fn new(fields: FieldMap) -> Self {
        Self { id: None, fields }
    }

    pub fn with_id(id: impl Into<String>, fields: FieldMap) -> Self {
        Self {
            id: Some(id.into()),
            fields,
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    pub fn has_fields(&self) -> bool {
        !self.fields.is_empty()
    }
}

/// `{header, records}`; serialized with the upstream key names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    #[serde(rename = "data_header", default)]
    pub header: Header,
    #[serde(rename = "data_content", default)]
    pub records: Vec<Record>,
}

impl Table {
    pub fn is_empty(&self) -> bool {
        self.header.is_empty() && self.records.is_empty()
    }

    /// Column index whose header name equals `label`, lowest index first.
    pub fn column_labelled(&self, label: &str) -> Option<&str> {
        sorted_columns(&self.header)
            .into_iter()
            .find(|key| self.header.get(*key).map(String::as_str) == Some(label))
    }
}

/// Per-date visitor/pageview summary handed to charts and the insight prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsPoint {
    pub date: String,
    pub visitors: u64,
    pub pageviews: u64,
}

impl AnalyticsPoint {
    pub fn new(date: impl Into<String>, visitors: u64, pageviews: u64) -> Self {
        Self {
            date: date.into(),
            visitors,
            pageviews,
        }
    }
}

// ───────────────────────────────────────────────────────────────────────────
// HTTP request / response bodies
// ───────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ProxyQuery {
    #[serde(default)]
    pub url: Option<String>,
}

/// `data` is the recovered table when `parsed` is true, the raw upstream text otherwise.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    pub data: serde_json::Value,
    pub status: u16,
    pub status_text: String,
    pub response_type: String,
    pub parsed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
}

/// Upstream answered with a non-success status. Sent with HTTP 200 so the
/// caller sees the upstream status and body verbatim.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpstreamFailure {
    pub error: bool,
    pub status: u16,
    pub data: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub custom_prompt: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub analysis: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DataRequest {
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProcessDataResponse {
    pub success: bool,
    pub message: String,
    pub processed_data: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizeResponse {
    pub points: Vec<AnalyticsPoint>,
    pub summary: Option<crate::analysis::summary::ChartSummary>,
    pub weekday_profile: Vec<crate::analysis::summary::WeekdayRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SampleQuery {
    #[serde(default)]
    pub days: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: true,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}
