use super::{recover, Recovery, Strategy};
use crate::types::{FieldMap, Header, Record, Table};
use serde_json::{Map, Value};
use tracing::{debug, info};

/// Upstream text, decoded once at the boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload<'a> {
    Structured(Value),
    Unstructured(&'a str),
}

impl<'a> Payload<'a> {
    pub fn classify(text: &'a str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => Payload::Structured(value),
            Err(e) => {
                debug!("payload is not valid JSON ({}), treating as text", e);
                Payload::Unstructured(text)
            }
        }
    }
}

/// Recover a table from upstream text.
///
/// Well-formed JSON carrying the table shape is converted directly; everything
/// else (including valid JSON of another shape) goes through the detector cascade.
/// A well-formed table with a header but no records keeps its decoded header.
pub fn recover_payload(text: &str) -> Recovery {
    let mut decoded_header = None;
    if let Payload::Structured(value) = Payload::classify(text) {
        match table_from_value(&value) {
            Some(table) if !table.records.is_empty() => {
                info!(
                    "recovery: {} header column(s), {} record(s) via json",
                    table.header.len(),
                    table.records.len()
                );
                return Recovery {
                    table,
                    strategy: Some(Strategy::Json),
                };
            }
            Some(table) => decoded_header = Some(table.header).filter(|h| !h.is_empty()),
            None => {}
        }
        debug!("JSON payload has no usable records, running detector cascade");
    }

    let mut recovery = recover(text);
    if let Some(header) = decoded_header {
        recovery.table.header = header;
    }
    recovery
}

/// Convert a JSON value with `data_header` + `data_content` into a [`Table`].
///
/// Accepts the upstream wire shape (header as a list of single-pair objects,
/// content items as `{"<id>": [{"<col>": "<value>"}, ...]}`) as well as the
/// flat shape this crate serializes (`Table`'s own serde form).
pub fn table_from_value(value: &Value) -> Option<Table> {
    let obj = value.as_object()?;
    let header_value = obj.get("data_header").filter(|v| !v.is_null())?;
    let content_value = obj.get("data_content").filter(|v| !v.is_null())?;

    let header = header_from_value(header_value);
    let records = content_value
        .as_array()
        .map(|items| items.iter().flat_map(records_from_item).collect())
        .unwrap_or_default();

    Some(Table { header, records })
}

fn header_from_value(value: &Value) -> Header {
    let mut header = Header::new();
    match value {
        Value::Array(entries) => {
            for entry in entries.iter().filter_map(Value::as_object) {
                merge_pairs(entry, &mut header);
            }
        }
        Value::Object(entry) => merge_pairs(entry, &mut header),
        _ => {}
    }
    header
}

fn records_from_item(item: &Value) -> Vec<Record> {
    let Some(obj) = item.as_object() else {
        return Vec::new();
    };

    let mut records = Vec::new();
    let mut flat = Record::default();
    for (key, value) in obj {
        match value {
            // {"334": [{"1": "..."}, {"2": "..."}]}
            Value::Array(pairs) => {
                let mut fields = FieldMap::new();
                for pair in pairs.iter().filter_map(Value::as_object) {
                    merge_pairs(pair, &mut fields);
                }
                records.push(Record::with_id(key.as_str(), fields));
            }
            _ if key == "id" => flat.id = scalar_text(value),
            _ => {
                if let Some(text) = scalar_text(value) {
                    flat.fields.insert(key.clone(), text);
                }
            }
        }
    }
    if flat.has_fields() {
        records.push(flat);
    }
    records.retain(Record::has_fields);
    records
}

fn merge_pairs(pairs: &Map<String, Value>, into: &mut FieldMap) {
    for (key, value) in pairs {
        if let Some(text) = scalar_text(value) {
            into.insert(key.clone(), text);
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shape_to_table() {
        let value = json!({
            "data_header": [{"1": "번호"}, {"2": "날짜"}],
            "data_content": [{"334": [{"1": "334. "}, {"2": "2025-03-25"}]}]
        });
        let table = table_from_value(&value).unwrap();
        assert_eq!(table.header["2"], "날짜");
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.records[0].id.as_deref(), Some("334"));
        assert_eq!(table.records[0].get("2"), Some("2025-03-25"));
    }

    #[test]
    fn test_own_serialized_shape_round_trips() {
        let text = r#"{"data_header":[{"1":"번호"}],"data_content":[{"7":[{"1":"a"}],},]}"#;
        let recovery = recover(text);
        let value = serde_json::to_value(&recovery.table).unwrap();
        assert_eq!(table_from_value(&value).unwrap(), recovery.table);
    }

    #[test]
    fn test_not_a_table() {
        assert!(table_from_value(&json!({"data": []})).is_none());
        assert!(table_from_value(&json!([1, 2])).is_none());
    }

    #[test]
    fn test_valid_json_goes_straight_to_table() {
        let text = r#"{"data_header":[{"2":"날짜"}],"data_content":[{"9":[{"2":"2025-03-25"}]}]}"#;
        let recovery = recover_payload(text);
        assert_eq!(recovery.strategy, Some(Strategy::Json));
        assert_eq!(recovery.table.records[0].id.as_deref(), Some("9"));
    }

    #[test]
    fn test_empty_table_keeps_object_header() {
        let recovery = recover_payload(r#"{"data_header":{"1":"번호"},"data_content":[]}"#);
        assert_eq!(recovery.strategy, None);
        assert_eq!(recovery.table.header["1"], "번호");
        assert!(recovery.is_parsed());
        assert!(!recovery.records_recovered());
    }

    #[test]
    fn test_near_json_falls_back_to_cascade() {
        let text = r#"{"data_content":[{"9":[{"2":"2025-03-25"}],}]}"#;
        assert!(matches!(Payload::classify(text), Payload::Unstructured(_)));
        assert_eq!(recover_payload(text).strategy, Some(Strategy::BracketedBlock));
    }
}
