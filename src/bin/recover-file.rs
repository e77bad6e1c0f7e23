//! Run table recovery over a captured upstream payload and print the result.
//!
//! Usage: `recover-file [PATH]` (reads stdin when PATH is omitted or `-`).

use analytics_insight::analysis::{compute_stats, detect_upstream_notice};
use analytics_insight::recovery::recover_payload;
use anyhow::{Context, Result};
use std::io::Read;

fn main() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let path = std::env::args().nth(1);
    let text = match path.as_deref() {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read payload from stdin")?;
            buf
        }
        Some(p) => std::fs::read_to_string(p).with_context(|| format!("failed to read {}", p))?,
    };

    if let Some(notice) = detect_upstream_notice(&text) {
        eprintln!("note: {}", notice.message());
    }

    let recovery = recover_payload(&text);
    let report = serde_json::json!({
        "parsed": recovery.is_parsed(),
        "strategy": recovery.strategy,
        "headerColumns": recovery.table.header.len(),
        "records": recovery.table.records.len(),
        "stats": compute_stats(&recovery.table),
        "table": recovery.table,
    });

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
