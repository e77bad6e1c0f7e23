pub mod fetch;
pub mod insight;

pub use fetch::{fetch_and_recover, FetchError, Fetched};
pub use insight::{compose_prompt, request_insight, ChatPrompt, InsightBackend, InsightError, OpenAiInsightBackend};
