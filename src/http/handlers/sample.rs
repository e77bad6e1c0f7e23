use crate::analysis::sample::{sample_series, DEFAULT_SAMPLE_DAYS};
use crate::types::{AnalyticsPoint, SampleQuery};
use axum::{extract::Query, response::Json};
use chrono::Utc;

/// `GET /api/sample?days=N`: synthetic series ending today.
pub async fn handle(Query(query): Query<SampleQuery>) -> Json<Vec<AnalyticsPoint>> {
    let days = query.days.unwrap_or(DEFAULT_SAMPLE_DAYS);
    let today = Utc::now().date_naive();
    Json(sample_series(today, days, &mut rand::rng()))
}
