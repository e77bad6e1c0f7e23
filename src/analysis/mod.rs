//! Charting and aggregation over recovered data.

pub mod normalize;
pub mod sample;
pub mod stats;
pub mod summary;

pub use normalize::{detect_upstream_notice, normalize, NormalizeOptions, UpstreamNotice};
pub use sample::sample_series;
pub use stats::{compute_stats, Stats};
pub use summary::{summarize, weekday_profile, ChartSummary, WeekdayRow};
