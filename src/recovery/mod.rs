//! Tolerant table recovery for the upstream visit-log dialect.
//!
//! The upstream payload claims to be JSON but routinely is not (trailing commas
//! inside arrays, truncated bodies, one pair per line). Recovery runs an ordered
//! cascade of [`Strategy`] detectors and keeps the first non-empty result; the
//! header is extracted independently of which strategy wins.

pub mod detectors;
pub mod fields;
mod payload;

pub use fields::{extract_fields, extract_header};
pub use payload::{recover_payload, table_from_value, Payload};

use crate::types::{Record, Table};
use serde::Serialize;
use tracing::{debug, info};

/// How a table was obtained. Everything except `Json` is a record-boundary
/// detector and takes part in the cascade, in [`Strategy::CASCADE`] order;
/// `Json` marks a well-formed payload decoded without any detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Json,
    BracketedBlock,
    GenericArray,
    DateAnchored,
    LineOriented,
}

impl Strategy {
    pub const CASCADE: [Strategy; 4] = [
        Strategy::BracketedBlock,
        Strategy::GenericArray,
        Strategy::DateAnchored,
        Strategy::LineOriented,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Json => "json",
            Strategy::BracketedBlock => "bracketed_block",
            Strategy::GenericArray => "generic_array",
            Strategy::DateAnchored => "date_anchored",
            Strategy::LineOriented => "line_oriented",
        }
    }

    /// Records found by this detector. `Json` is not a detector: well-formed
    /// payloads are decoded once by [`recover_payload`], so it finds nothing here.
    pub fn detect(self, text: &str) -> Vec<Record> {
        match self {
            Strategy::Json => Vec::new(),
            Strategy::BracketedBlock => detectors::bracketed_blocks(text),
            Strategy::GenericArray => detectors::generic_arrays(text),
            Strategy::DateAnchored => detectors::date_anchored(text),
            Strategy::LineOriented => detectors::line_oriented(text),
        }
    }
}

/// Outcome of one recovery pass. `strategy` is `None` when no detector found a
/// record; the header may still be populated in that case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recovery {
    pub table: Table,
    pub strategy: Option<Strategy>,
}

impl Recovery {
    pub fn records_recovered(&self) -> bool {
        !self.table.records.is_empty()
    }

    /// True when anything at all came back: a header key or a record.
    pub fn is_parsed(&self) -> bool {
        !self.table.is_empty()
    }
}

/// Run the detector cascade over `text`.
pub fn recover(text: &str) -> Recovery {
    let header = extract_header(text);

    let winner = Strategy::CASCADE.into_iter().find_map(|strategy| {
        let records = strategy.detect(text);
        debug!("{} found {} record(s)", strategy.as_str(), records.len());
        (!records.is_empty()).then_some((strategy, records))
    });

    let (strategy, records) = match winner {
        Some((strategy, records)) => (Some(strategy), records),
        None => (None, Vec::new()),
    };

    info!(
        "recovery: {} header column(s), {} record(s) via {}",
        header.len(),
        records.len(),
        strategy.map_or("none", Strategy::as_str)
    );
    if let Some(first) = records.first() {
        debug!("first recovered record: {:?}", first);
    }

    Recovery {
        table: Table { header, records },
        strategy,
    }
}
