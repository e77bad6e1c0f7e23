//! Record-boundary detectors.
//!
//! Each detector scans the whole payload for one kind of boundary signal and
//! hands every bounded fragment to [`extract_fields`]. They are ordered from the
//! strictest assumption about well-formedness to the loosest; the cascade in
//! [`super::recover`] picks the first one that finds anything.

use super::fields::extract_fields;
use crate::types::{compare_indices, Record};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Characters of context taken before a date anchor.
pub const DATE_WINDOW_BEFORE: usize = 100;
/// Characters of context taken from a date anchor onwards.
pub const DATE_WINDOW_AFTER: usize = 400;

static BRACKETED_BLOCK: OnceLock<Regex> = OnceLock::new();
static GENERIC_BLOCK: OnceLock<Regex> = OnceLock::new();
static DATE_ANCHOR: OnceLock<Regex> = OnceLock::new();
static LINE_FIELD: OnceLock<Regex> = OnceLock::new();
static LINE_START: OnceLock<Regex> = OnceLock::new();

fn bracketed_block() -> &'static Regex {
    BRACKETED_BLOCK.get_or_init(|| {
        Regex::new(r#""(\d+)"\s*:\s*\[(?s:(.*?)),?\s*\]\s*,"#).expect("valid block regex")
    })
}

fn generic_block() -> &'static Regex {
    GENERIC_BLOCK.get_or_init(|| {
        Regex::new(r#""(\d+)"\s*:\s*\[(?s:(.*?))\]"#).expect("valid block regex")
    })
}

fn date_anchor() -> &'static Regex {
    DATE_ANCHOR.get_or_init(|| {
        Regex::new(r#"\{"2"\s*:\s*"\d{4}-\d{2}-\d{2}"\}"#).expect("valid date anchor regex")
    })
}

fn line_field() -> &'static Regex {
    LINE_FIELD.get_or_init(|| {
        Regex::new(r#"^\{"(\d+)"\s*:\s*"([^"]*)"\},?$"#).expect("valid line field regex")
    })
}

fn line_start() -> &'static Regex {
    LINE_START.get_or_init(|| Regex::new(r#"^\{"(\d+)"\s*:"#).expect("valid line start regex"))
}

/// `"N": [ ... ],` blocks. The block id is discarded; the fields carry the row.
pub fn bracketed_blocks(text: &str) -> Vec<Record> {
    bracketed_block()
        .captures_iter(text)
        .map(|caps| Record::new(extract_fields(&caps[2])))
        .filter(Record::has_fields)
        .collect()
}

/// `"N": [ ... ]` blocks without the trailing comma. Keeps the block id.
pub fn generic_arrays(text: &str) -> Vec<Record> {
    generic_block()
        .captures_iter(text)
        .map(|caps| Record::with_id(&caps[1], extract_fields(&caps[2])))
        .filter(Record::has_fields)
        .collect()
}

/// Rows located through their date column (`{"2":"YYYY-MM-DD"}`).
///
/// The enclosing block is searched for in a window around every anchor, so the
/// same row is usually found several times; the first sighting of an id wins
/// and the survivors come back in numeric id order.
pub fn date_anchored(text: &str) -> Vec<Record> {
    let mut seen = HashSet::new();
    let mut records: Vec<Record> = date_anchor()
        .find_iter(text)
        .filter_map(|anchor| {
            let window = char_window(text, anchor.start(), DATE_WINDOW_BEFORE, DATE_WINDOW_AFTER);
            bracketed_block()
                .captures(window)
                .map(|caps| Record::with_id(&caps[1], extract_fields(&caps[2])))
        })
        .filter(|record| record.id.as_ref().is_some_and(|id| seen.insert(id.clone())))
        .collect();

    records.retain(Record::has_fields);
    records.sort_by(|a, b| {
        compare_indices(
            a.id.as_deref().unwrap_or_default(),
            b.id.as_deref().unwrap_or_default(),
        )
    });
    records
}

/// One field assignment per line, rows introduced by a `{"N":` line.
pub fn line_oriented(text: &str) -> Vec<Record> {
    let mut records = Vec::new();
    let mut current: Option<Record> = None;

    for line in text.lines().map(str::trim) {
        if let Some(caps) = line_field().captures(line) {
            if let Some(record) = current.as_mut() {
                record.fields.insert(caps[1].to_string(), caps[2].to_string());
            }
        } else if let Some(caps) = line_start().captures(line) {
            if let Some(done) = current.take().filter(Record::has_fields) {
                records.push(done);
            }
            current = Some(Record::with_id(&caps[1], Default::default()));
        }
    }

    if let Some(done) = current.filter(Record::has_fields) {
        records.push(done);
    }
    records
}

/// Slice of `text` spanning `before` characters ahead of byte offset `at` and
/// `after` characters from it, clamped to the text and to char boundaries.
fn char_window(text: &str, at: usize, before: usize, after: usize) -> &str {
    let start = text[..at]
        .char_indices()
        .rev()
        .take(before)
        .last()
        .map_or(at, |(i, _)| i);
    let end = text[at..]
        .char_indices()
        .nth(after)
        .map_or(text.len(), |(i, _)| at + i);
    &text[start..end]
}
