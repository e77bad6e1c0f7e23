use super::common::{require_data, server_error, HandlerError};
use crate::tools::insight::request_insight;
use crate::types::{AnalyzeRequest, AnalyzeResponse};
use crate::AppState;
use axum::{extract::State, response::Json};
use std::sync::Arc;
use tracing::error;

/// `POST /api/analyze`
pub async fn handle(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, HandlerError> {
    let data = require_data(&request.data, "분석할 데이터가 필요합니다.")?;

    let analysis = request_insight(
        state.insight_backend.as_ref(),
        data,
        request.custom_prompt.as_deref(),
        &state.config.analysis,
    )
    .await
    .map_err(|e| {
        error!("analyze: {}", e);
        server_error("데이터 분석 중 오류가 발생했습니다.", e)
    })?;

    Ok(Json(AnalyzeResponse { analysis }))
}
