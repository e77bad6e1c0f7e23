use super::common::{require_data, HandlerError};
use crate::analysis::{
    compute_stats, detect_upstream_notice, normalize, summarize, weekday_profile, NormalizeOptions, Stats,
};
use crate::recovery::{recover_payload, table_from_value};
use crate::types::{DataRequest, NormalizeResponse, ProcessDataResponse, Table};
use crate::AppState;
use axum::{extract::State, response::Json};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// `POST /process-data`: acknowledges and echoes the payload.
pub async fn process_data(Json(request): Json<DataRequest>) -> Result<Json<ProcessDataResponse>, HandlerError> {
    let data = require_data(&request.data, "데이터가 필요합니다.")?;
    info!("process-data: {} bytes", data.to_string().len());

    Ok(Json(ProcessDataResponse {
        success: true,
        message: "데이터 처리 완료".to_string(),
        processed_data: data.clone(),
    }))
}

/// `POST /api/normalize`: chart series plus its summary.
pub async fn normalize_data(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DataRequest>,
) -> Result<Json<NormalizeResponse>, HandlerError> {
    let data = require_data(&request.data, "데이터가 필요합니다.")?;

    let notice = data
        .as_str()
        .and_then(detect_upstream_notice)
        .map(|n| n.message().to_string());

    let opts = NormalizeOptions::for_today(state.config.normalize.resolve_date_column_label());
    let points = normalize(data, &opts);
    info!("normalize: {} point(s)", points.len());

    Ok(Json(NormalizeResponse {
        summary: summarize(&points),
        weekday_profile: weekday_profile(&points),
        points,
        notice,
    }))
}

/// `POST /api/stats`: `data` is either a table or raw upstream text.
pub async fn stats(Json(request): Json<DataRequest>) -> Result<Json<Stats>, HandlerError> {
    let data = require_data(&request.data, "데이터가 필요합니다.")?;
    Ok(Json(compute_stats(&table_of(data))))
}

fn table_of(data: &Value) -> Table {
    match data {
        Value::String(text) => recover_payload(text).table,
        other => table_from_value(other).unwrap_or_else(|| {
            debug!("stats: payload has no table shape");
            Table::default()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_of_accepts_text_and_objects() {
        let text = json!(r#"{"data_content":[{"9":[{"2":"2025-03-25"}],}]}"#);
        assert_eq!(table_of(&text).records.len(), 1);

        let object = json!({"data_header": {}, "data_content": [{"2": "2025-03-25"}]});
        assert_eq!(table_of(&object).records.len(), 1);

        assert!(table_of(&json!([1, 2, 3])).is_empty());
    }
}
