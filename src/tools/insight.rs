use crate::core::config::AnalysisConfig;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info};

const PROMPT_PREAMBLE: &str = "다음은 웹사이트 방문 로그 데이터입니다.\n\n";

#[derive(Debug, Error)]
pub enum InsightError {
    /// Key missing, transport failure, or a non-success answer from the endpoint.
    #[error("insight request failed: {0}")]
    Upstream(String),

    #[error("insight service returned no completion text")]
    EmptyResult,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPrompt {
    pub system: String,
    pub user: String,
}

/// Text-generation seam. The HTTP layer only ever talks to this trait.
#[async_trait]
pub trait InsightBackend: Send + Sync {
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String, InsightError>;
}

/// Build the chat prompt for `data`.
///
/// Table-shaped data gets a short structural description (header, record
/// count, first record) ahead of the instruction. The data itself is embedded
/// last, cut to the configured character budget.
pub fn compose_prompt(data: &Value, instruction: Option<&str>, cfg: &AnalysisConfig) -> ChatPrompt {
    let serialized = match data {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    let budget = cfg.resolve_max_data_chars();
    let data_for_analysis: String = serialized.chars().take(budget).collect();

    let mut user = String::from(PROMPT_PREAMBLE);
    if let Some(description) = describe_table(data) {
        user.push_str(&description);
    }

    let instruction = instruction
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| cfg.resolve_default_instruction());
    user.push_str(&instruction);
    user.push_str("\n\n");
    user.push_str(&data_for_analysis);

    ChatPrompt {
        system: cfg.resolve_system_prompt(),
        user,
    }
}

fn describe_table(data: &Value) -> Option<String> {
    let header = data.get("data_header").filter(|v| !v.is_null())?;
    let content = data.get("data_content")?.as_array()?;

    let mut out = String::from("이 데이터는 다음과 같은 구조를 가지고 있습니다:\n");
    out.push_str(&format!("- 헤더: {}\n", header));
    out.push_str(&format!("- 데이터 항목 수: {}개\n\n", content.len()));
    if let Some(first) = content.first() {
        out.push_str(&format!("각 항목의 예시: {}\n\n", first));
    }
    Some(out)
}

/// Compose the prompt for `data` and submit it through `backend`.
pub async fn request_insight(
    backend: &dyn InsightBackend,
    data: &Value,
    custom_prompt: Option<&str>,
    cfg: &AnalysisConfig,
) -> Result<String, InsightError> {
    let prompt = compose_prompt(data, custom_prompt, cfg);
    info!(
        "requesting insight ({} prompt chars, custom instruction: {})",
        prompt.user.chars().count(),
        custom_prompt.is_some_and(|p| !p.trim().is_empty())
    );

    let text = backend.complete(&prompt).await?;
    let text = text.trim();
    if text.is_empty() {
        return Err(InsightError::EmptyResult);
    }
    Ok(text.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// OpenAI-compatible chat.completions backend
// ─────────────────────────────────────────────────────────────────────────────

pub struct OpenAiInsightBackend {
    http_client: reqwest::Client,
    config: AnalysisConfig,
}

impl OpenAiInsightBackend {
    pub fn new(http_client: reqwest::Client, config: AnalysisConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }
}

#[async_trait]
impl InsightBackend for OpenAiInsightBackend {
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String, InsightError> {
        // Empty string is valid for key-less local endpoints (Ollama / LM Studio).
        let api_key = self
            .config
            .resolve_api_key()
            .ok_or_else(|| InsightError::Upstream("no LLM API key configured".to_string()))?;

        let base_url = self.config.resolve_base_url();
        let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));

        let body = serde_json::json!({
            "model": self.config.resolve_model(),
            "temperature": self.config.resolve_temperature(),
            "max_tokens": self.config.resolve_max_tokens(),
            "messages": [
                {"role": "system", "content": prompt.system},
                {"role": "user", "content": prompt.user}
            ]
        });

        let builder = self.http_client.post(url).json(&body);
        let builder = if api_key.is_empty() {
            builder
        } else {
            builder.bearer_auth(api_key.trim())
        };
        let response = builder.send().await.map_err(|e| {
            error!("chat.completions request failed: {}", e);
            InsightError::Upstream(format!("chat.completions request failed: {e}"))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            error!("chat.completions failed: status={}", status);
            return Err(InsightError::Upstream(format!(
                "chat.completions failed: status={} body={}",
                status, text
            )));
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| InsightError::Upstream(format!("chat.completions response parse failed: {e}")))?;

        value
            .get("choices")
            .and_then(|v| v.as_array())
            .and_then(|arr| arr.first())
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(InsightError::EmptyResult)
    }
}
