use super::common::{bad_request, server_error};
use crate::tools::fetch::{fetch_and_recover, FetchError};
use crate::types::{ProxyQuery, UpstreamFailure};
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{error, warn};

/// `GET /proxy-api?url=...`
///
/// An upstream that answers with a non-success status is reported with HTTP
/// 200 so the caller sees the upstream status and body as they were.
pub async fn handle(State(state): State<Arc<AppState>>, Query(query): Query<ProxyQuery>) -> Response {
    let Some(url) = query.url.filter(|u| !u.trim().is_empty()) else {
        return bad_request("URL 파라미터가 필요합니다.").into_response();
    };

    match fetch_and_recover(&state, &url).await {
        Ok(fetched) => Json(fetched.into_proxy_response()).into_response(),
        Err(FetchError::Status { status, body }) => (
            StatusCode::OK,
            Json(UpstreamFailure {
                error: true,
                status,
                data: body,
                message: format!("API 요청 실패: {}", status),
            }),
        )
            .into_response(),
        Err(e @ FetchError::InvalidUrl { .. }) => {
            warn!("proxy-api: {}", e);
            bad_request(&e.to_string()).into_response()
        }
        Err(e @ FetchError::Transport(_)) => {
            error!("proxy-api: {}", e);
            server_error("서버 오류가 발생했습니다.", e).into_response()
        }
    }
}
