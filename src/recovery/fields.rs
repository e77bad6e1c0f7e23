use crate::types::{FieldMap, Header};
use regex::Regex;
use std::sync::OnceLock;

static FIELD_PAIR: OnceLock<Regex> = OnceLock::new();
static HEADER_BLOCK: OnceLock<Regex> = OnceLock::new();

fn field_pair() -> &'static Regex {
    FIELD_PAIR.get_or_init(|| Regex::new(r#"\{"(\d+)"\s*:\s*"([^"]*)"\}"#).expect("valid field regex"))
}

fn header_block() -> &'static Regex {
    HEADER_BLOCK.get_or_init(|| {
        Regex::new(r#""data_header"\s*:\s*\[(?s:(.*?))\]"#).expect("valid header regex")
    })
}

/// Recover `{"N":"V"}` pairs from a fragment, left to right.
///
/// Anything between pairs (commas, whitespace, stray brackets) is skipped.
/// A repeated index keeps the last value seen.
pub fn extract_fields(fragment: &str) -> FieldMap {
    let mut fields = FieldMap::new();
    for caps in field_pair().captures_iter(fragment) {
        fields.insert(caps[1].to_string(), caps[2].to_string());
    }
    fields
}

/// Column names from the first `"data_header": [ ... ]` block.
///
/// Pairs with an empty name are dropped; a missing block yields an empty header.
pub fn extract_header(text: &str) -> Header {
    let Some(block) = header_block().captures(text) else {
        return Header::new();
    };
    let mut header = extract_fields(&block[1]);
    header.retain(|_, name| !name.is_empty());
    header
}
