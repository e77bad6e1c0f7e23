use crate::recovery::{recover_payload, Recovery};
use crate::types::ProxyResponse;
use crate::AppState;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid upstream url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Upstream answered, but not with a success status. Body is kept verbatim.
    #[error("upstream request failed: {status}")]
    Status { status: u16, body: String },

    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Upstream body plus the table recovered from it.
#[derive(Debug)]
pub struct Fetched {
    pub status: u16,
    pub status_text: String,
    pub body: String,
    pub recovery: Recovery,
}

impl Fetched {
    /// Client-facing view: the recovered table when anything was recovered,
    /// the raw text otherwise.
    pub fn into_proxy_response(self) -> ProxyResponse {
        let parsed = self.recovery.is_parsed();
        let data = if parsed {
            serde_json::to_value(&self.recovery.table).unwrap_or(serde_json::Value::Null)
        } else {
            serde_json::Value::String(self.body)
        };
        ProxyResponse {
            data,
            status: self.status,
            status_text: self.status_text,
            response_type: if parsed { "object" } else { "string" }.to_string(),
            parsed,
            strategy: self.recovery.strategy.map(|s| s.as_str().to_string()),
        }
    }
}

/// Only absolute http(s) URLs are fetched.
pub fn validate_upstream_url(raw: &str) -> Result<url::Url, FetchError> {
    let invalid = |reason: String| FetchError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };
    let parsed = url::Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(invalid(format!("unsupported scheme {other:?}"))),
    }
}

/// GET `raw_url` with the configured User-Agent and run table recovery over the body.
pub async fn fetch_and_recover(state: &AppState, raw_url: &str) -> Result<Fetched, FetchError> {
    let url = validate_upstream_url(raw_url)?;
    info!("proxying request to {}", url);

    let response = state
        .http_client
        .get(url.clone())
        .header(
            reqwest::header::USER_AGENT,
            state.config.upstream.resolve_user_agent(),
        )
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;
    debug!("upstream {} -> {} ({} bytes)", url, status, body.len());

    if !status.is_success() {
        warn!("upstream {} answered {}", url, status);
        return Err(FetchError::Status {
            status: status.as_u16(),
            body,
        });
    }

    debug!(
        "body mentions data_header: {}, data_content: {}",
        body.contains("data_header"),
        body.contains("data_content")
    );
    let recovery = recover_payload(&body);

    Ok(Fetched {
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or_default().to_string(),
        body,
        recovery,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_upstream_url() {
        assert!(validate_upstream_url("https://example.com/log?x=1").is_ok());
        assert!(validate_upstream_url(" http://127.0.0.1:8080/ ").is_ok());
        assert!(matches!(
            validate_upstream_url("ftp://example.com"),
            Err(FetchError::InvalidUrl { .. })
        ));
        assert!(matches!(
            validate_upstream_url("not a url"),
            Err(FetchError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_unparsed_body_is_passed_through() {
        let fetched = Fetched {
            status: 200,
            status_text: "OK".into(),
            body: "허용된 IP주소가 아닙니다.".into(),
            recovery: recover_payload("허용된 IP주소가 아닙니다."),
        };
        let response = fetched.into_proxy_response();
        assert!(!response.parsed);
        assert_eq!(response.response_type, "string");
        assert_eq!(response.data, "허용된 IP주소가 아닙니다.");
        assert!(response.strategy.is_none());
    }
}
