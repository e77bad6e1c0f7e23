use std::path::PathBuf;

// ---------------------------------------------------------------------------
// InsightConfig: file-based config loader (analytics-insight.json) with env-var fallback
// ---------------------------------------------------------------------------

pub const CONFIG_FILE_NAME: &str = "analytics-insight.json";
pub const ENV_CONFIG_PATH: &str = "ANALYTICS_INSIGHT_CONFIG";

pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 2000;
pub const DEFAULT_MAX_DATA_CHARS: usize = 8000;

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "당신은 웹사이트 방문 데이터를 분석하는 데이터 분석가입니다. 주어진 데이터를 분석하고 인사이트를 제공해주세요.";
pub const DEFAULT_INSTRUCTION: &str =
    "이 데이터를 분석하여 주요 트렌드, 패턴, 인사이트를 한국어로 요약해주세요:";

/// Sent on every upstream fetch; the visit-log source rejects obvious bots.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Insight sub-config (mirrors the `analysis` key in analytics-insight.json).
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct AnalysisConfig {
    /// LLM endpoint, e.g. `https://api.openai.com/v1` or `http://localhost:11434/v1` (Ollama).
    pub llm_base_url: Option<String>,
    /// API key. Never logged. Leave blank for key-less local endpoints.
    pub llm_api_key: Option<String>,
    pub llm_model: Option<String>,
    pub temperature: Option<f32>,
    /// Max tokens the LLM may generate for one insight.
    pub max_tokens: Option<u32>,
    /// Max characters of serialized data embedded in the prompt.
    pub max_data_chars: Option<usize>,
    pub system_prompt: Option<String>,
    /// Instruction used when the caller sends no custom prompt.
    pub default_instruction: Option<String>,
}

impl AnalysisConfig {
    /// API key: JSON field → `OPENAI_API_KEY` env var → `None`.
    ///
    /// An explicit `""` in the config file returns `Some("")`, meaning the
    /// endpoint needs no key (Ollama / LM Studio).
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(k) = &self.llm_api_key {
            return Some(k.trim().to_string());
        }
        env_nonempty("OPENAI_API_KEY")
    }

    /// LLM base URL: JSON field → `OPENAI_BASE_URL` env var → `https://api.openai.com/v1`.
    pub fn resolve_base_url(&self) -> String {
        nonempty(&self.llm_base_url)
            .or_else(|| env_nonempty("OPENAI_BASE_URL"))
            .unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string())
    }

    /// Model name: JSON field → `INSIGHT_LLM_MODEL` env var → `gpt-4o`.
    pub fn resolve_model(&self) -> String {
        nonempty(&self.llm_model)
            .or_else(|| env_nonempty("INSIGHT_LLM_MODEL"))
            .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string())
    }

    pub fn resolve_temperature(&self) -> f32 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    /// Max output tokens: JSON field → `INSIGHT_MAX_TOKENS` env var → 2000.
    pub fn resolve_max_tokens(&self) -> u32 {
        self.max_tokens
            .or_else(|| env_parsed("INSIGHT_MAX_TOKENS"))
            .unwrap_or(DEFAULT_MAX_TOKENS)
    }

    /// Prompt data budget: JSON field → `INSIGHT_MAX_DATA_CHARS` env var → 8000.
    pub fn resolve_max_data_chars(&self) -> usize {
        self.max_data_chars
            .or_else(|| env_parsed("INSIGHT_MAX_DATA_CHARS"))
            .unwrap_or(DEFAULT_MAX_DATA_CHARS)
    }

    pub fn resolve_system_prompt(&self) -> String {
        nonempty(&self.system_prompt).unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string())
    }

    pub fn resolve_default_instruction(&self) -> String {
        nonempty(&self.default_instruction).unwrap_or_else(|| DEFAULT_INSTRUCTION.to_string())
    }
}

/// Upstream fetch sub-config.
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct UpstreamConfig {
    pub user_agent: Option<String>,
}

impl UpstreamConfig {
    /// User-Agent: JSON field → `UPSTREAM_USER_AGENT` env var → desktop Chrome.
    pub fn resolve_user_agent(&self) -> String {
        nonempty(&self.user_agent)
            .or_else(|| env_nonempty("UPSTREAM_USER_AGENT"))
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string())
    }
}

/// Normalizer sub-config.
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct NormalizeConfig {
    /// Header label that marks the date column of a visit-log table.
    pub date_column_label: Option<String>,
}

impl NormalizeConfig {
    pub fn resolve_date_column_label(&self) -> String {
        nonempty(&self.date_column_label)
            .unwrap_or_else(|| crate::analysis::normalize::DEFAULT_DATE_COLUMN_LABEL.to_string())
    }
}

/// Top-level config loaded from `analytics-insight.json`.
#[derive(serde::Deserialize, Default, Clone, Debug)]
#[serde(default)]
pub struct InsightConfig {
    pub analysis: AnalysisConfig,
    pub upstream: UpstreamConfig,
    pub normalize: NormalizeConfig,
}

/// Load `analytics-insight.json` from standard locations.
///
/// Search order (first found wins):
/// 1. `ANALYTICS_INSIGHT_CONFIG` env var path
/// 2. `./analytics-insight.json`
/// 3. `../analytics-insight.json`
/// 4. `~/.analytics-insight/config.json`
///
/// Missing file → `InsightConfig::default()` (silent, all env-var fallbacks apply).
/// Parse error → log a warning, return `InsightConfig::default()`.
pub fn load_insight_config() -> InsightConfig {
    for path in &config_candidates() {
        let Ok(contents) = std::fs::read_to_string(path) else {
            continue;
        };
        return match serde_json::from_str::<InsightConfig>(&contents) {
            Ok(cfg) => {
                tracing::info!("{} loaded from {}", CONFIG_FILE_NAME, path.display());
                cfg
            }
            Err(e) => {
                tracing::warn!(
                    "{} parse error at {}: {}; using defaults",
                    CONFIG_FILE_NAME,
                    path.display(),
                    e
                );
                InsightConfig::default()
            }
        };
    }

    InsightConfig::default()
}

fn config_candidates() -> Vec<PathBuf> {
    let mut v = vec![
        PathBuf::from(CONFIG_FILE_NAME),
        PathBuf::from("..").join(CONFIG_FILE_NAME),
    ];
    if let Some(home) = dirs::home_dir() {
        v.push(home.join(".analytics-insight").join("config.json"));
    }
    if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
        v.insert(0, PathBuf::from(env_path));
    }
    v
}

fn nonempty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
