use analytics_insight::core::config::InsightConfig;
use analytics_insight::http::router;
use analytics_insight::tools::insight::{ChatPrompt, InsightBackend, InsightError};
use analytics_insight::AppState;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use axum::Router;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

const NEAR_JSON: &str = r#"{"data_header":[{"1":"번호"},{"2":"날짜"}],"data_content":[{"334":[{"1":"334. "},{"2":"2025-03-25"}],}]}"#;

fn init_logger() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Records the prompt it was given and answers with a fixed text.
#[derive(Default)]
struct StubBackend {
    seen: Mutex<Option<ChatPrompt>>,
}

#[async_trait]
impl InsightBackend for StubBackend {
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String, InsightError> {
        *self.seen.lock().unwrap() = Some(prompt.clone());
        Ok("방문자가 주말에 감소합니다.".to_string())
    }
}

struct FailingBackend;

#[async_trait]
impl InsightBackend for FailingBackend {
    async fn complete(&self, _prompt: &ChatPrompt) -> Result<String, InsightError> {
        Err(InsightError::Upstream("chat.completions failed: status=401".to_string()))
    }
}

fn app_with(backend: Arc<dyn InsightBackend>) -> Router {
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let state = AppState::with_config(client, InsightConfig::default()).with_insight_backend(backend);
    router(Arc::new(state))
}

fn app() -> Router {
    app_with(Arc::new(StubBackend::default()))
}

/// Stand-in for the visit-log source.
async fn spawn_upstream() -> String {
    let upstream = Router::new()
        .route("/near-json", get(|| async { NEAR_JSON }))
        .route("/restricted", get(|| async { "허용된 IP주소가 아닙니다." }))
        .route(
            "/down",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance window") }),
        );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, upstream).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn get_req(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_reports_service() {
    let (status, body) = send(app(), get_req("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn proxy_recovers_table_from_near_json() {
    init_logger();
    let base = spawn_upstream().await;
    let uri = format!("/proxy-api?url={}/near-json", base);

    let (status, body) = send(app(), get_req(&uri)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["parsed"], true);
    assert_eq!(body["responseType"], "object");
    assert_eq!(body["status"], 200);
    assert_eq!(body["statusText"], "OK");
    assert_eq!(body["strategy"], "bracketed_block");
    assert_eq!(body["data"]["data_header"], json!({"1": "번호", "2": "날짜"}));
    assert_eq!(
        body["data"]["data_content"],
        json!([{"1": "334. ", "2": "2025-03-25"}])
    );
}

#[tokio::test]
async fn proxy_passes_unparseable_text_through() {
    init_logger();
    let base = spawn_upstream().await;
    let uri = format!("/proxy-api?url={}/restricted", base);

    let (status, body) = send(app(), get_req(&uri)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["parsed"], false);
    assert_eq!(body["responseType"], "string");
    assert_eq!(body["data"], "허용된 IP주소가 아닙니다.");
}

#[tokio::test]
async fn proxy_reports_upstream_status_verbatim() {
    init_logger();
    let base = spawn_upstream().await;
    let uri = format!("/proxy-api?url={}/down", base);

    let (status, body) = send(app(), get_req(&uri)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"], true);
    assert_eq!(body["status"], 503);
    assert_eq!(body["data"], "maintenance window");
}

#[tokio::test]
async fn proxy_transport_failure_is_server_error() {
    init_logger();
    let closed = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let uri = format!("/proxy-api?url=http://{}/gone", closed);

    let (status, body) = send(app(), get_req(&uri)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], true);
    assert!(body["details"].as_str().is_some());
}

#[tokio::test]
async fn proxy_rejects_missing_or_bad_url() {
    let (status, _) = send(app(), get_req("/proxy-api")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(app(), get_req("/proxy-api?url=ftp://example.com/x")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);
}

#[tokio::test]
async fn analyze_sends_composed_prompt_to_backend() {
    init_logger();
    let backend = Arc::new(StubBackend::default());
    let data = json!({"data_header": {"2": "날짜"}, "data_content": [{"2": "2025-03-25"}]});

    let (status, body) = send(
        app_with(backend.clone()),
        post_json("/api/analyze", json!({"data": data, "customPrompt": "주말 트렌드만"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["analysis"], "방문자가 주말에 감소합니다.");

    let prompt = backend.seen.lock().unwrap().clone().unwrap();
    assert!(prompt.user.contains("- 데이터 항목 수: 1개"));
    assert!(prompt.user.contains("주말 트렌드만\n\n"));
}

#[tokio::test]
async fn analyze_without_data_is_bad_request() {
    let (status, body) = send(app(), post_json("/api/analyze", json!({"customPrompt": "x"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "분석할 데이터가 필요합니다.");
}

#[tokio::test]
async fn analyze_backend_failure_is_reported() {
    let (status, body) = send(
        app_with(Arc::new(FailingBackend)),
        post_json("/api/analyze", json!({"data": [1, 2, 3]})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], true);
    assert!(body["details"].as_str().unwrap().contains("401"));
}

#[tokio::test]
async fn process_data_echoes_payload() {
    let (status, body) = send(app(), post_json("/process-data", json!({"data": {"a": [1, 2]}}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["processed_data"], json!({"a": [1, 2]}));
}

#[tokio::test]
async fn normalize_returns_points_and_summary() {
    let data = json!({"2023-04-01": {"visitors": 100, "pageviews": 200}, "2023-04-02": 50});
    let (status, body) = send(app(), post_json("/api/normalize", json!({"data": data}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["points"],
        json!([
            {"date": "2023-04-01", "visitors": 100, "pageviews": 200},
            {"date": "2023-04-02", "visitors": 50, "pageviews": 0}
        ])
    );
    assert_eq!(body["summary"]["totalVisitors"], 150);
    assert_eq!(body["summary"]["maxVisitorsDate"], "2023-04-01");
    assert_eq!(body["weekdayProfile"].as_array().unwrap().len(), 7);
    assert!(body.get("notice").is_none());
}

#[tokio::test]
async fn normalize_flags_ip_restriction() {
    let (status, body) = send(
        app(),
        post_json("/api/normalize", json!({"data": "허용된 IP주소가 아닙니다."})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["points"], json!([]));
    assert!(body["summary"].is_null());
    assert!(body["notice"].as_str().unwrap().contains("허용된 IP주소가 아닙니다"));
}

#[tokio::test]
async fn stats_accepts_raw_upstream_text() {
    let (status, body) = send(app(), post_json("/api/stats", json!({"data": NEAR_JSON}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalVisits"], 1);
    assert_eq!(body["visitsByDay"]["2025-03-25"], 1);
}

#[tokio::test]
async fn sample_series_has_requested_length() {
    let (status, body) = send(app(), get_req("/api/sample?days=7")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 7);

    let (_, body) = send(app(), get_req("/api/sample")).await;
    assert_eq!(body.as_array().unwrap().len(), 30);
}
