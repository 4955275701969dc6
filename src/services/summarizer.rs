use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::LlmConfig;
use crate::models::Article;

#[derive(Debug, Error)]
pub enum SummarizerError {
    #[error("Summarization failed: {0}")]
    Failed(String),
}

// ---- Chat-completion wire types ----

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fallbacks: Vec<String>,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

/// A completed chat call: the assistant text plus the model that actually
/// served it (the aggregator may have fallen through to a fallback model).
#[derive(Debug, Clone)]
pub struct ChatCompletion {
    pub content: String,
    pub model: String,
}

/// Transport seam over the chat-completion endpoint, so the service logic
/// can be exercised without a network.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> Result<ChatCompletion, SummarizerError>;
}

/// HTTP client for an OpenRouter-style aggregation API. The aggregator
/// handles the fallback chain server-side; we just name the candidates.
pub struct HttpChatApi {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpChatApi {
    pub fn new(config: &LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn chat(&self, request: ChatRequest) -> Result<ChatCompletion, SummarizerError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| SummarizerError::Failed("No LLM API key configured".to_string()))?;

        let requested_model = request.model.clone();
        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| SummarizerError::Failed(format!("Request failed: {}", e)))?;

        let status = response.status();
        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| SummarizerError::Failed(format!("Invalid response body: {}", e)))?;

        if let Some(error) = body.error {
            return Err(SummarizerError::Failed(error.message));
        }
        if !status.is_success() {
            return Err(SummarizerError::Failed(format!(
                "API returned status {}",
                status
            )));
        }

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| SummarizerError::Failed("Empty completion".to_string()))?;

        Ok(ChatCompletion {
            content,
            model: body.model.unwrap_or(requested_model),
        })
    }
}

/// Outcome of the best-effort enhancement stage.
#[derive(Debug)]
pub enum Enhancement {
    Enhanced(String),
    Skipped,
}

/// A summary together with the model that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryOutput {
    pub summary: String,
    pub model_used: String,
}

/// LLM-backed article summarizer with a two-stage pipeline: a web-search
/// enhancement pass that may be skipped, then summarization with a model
/// fallback chain.
pub struct SummarizerService {
    api: Arc<dyn ChatApi>,
    config: LlmConfig,
}

impl SummarizerService {
    pub fn new(api: Arc<dyn ChatApi>, config: LlmConfig) -> Self {
        Self { api, config }
    }

    /// Summarize article content to roughly `max_length` words.
    pub async fn summarize(
        &self,
        content: &str,
        max_length: u32,
    ) -> Result<SummaryOutput, SummarizerError> {
        let source_text = match self.enhance(content).await {
            Enhancement::Enhanced(enriched) => enriched,
            Enhancement::Skipped => content.to_string(),
        };

        let prompt = format!(
            "Summarize the following geoscience article in at most {} words. \
             Keep the key findings and why they matter. Reply with the summary only.\n\n{}",
            max_length, source_text
        );

        let completion = self
            .api
            .chat(ChatRequest {
                model: self.config.summary_model.clone(),
                fallbacks: self.config.fallback_models.clone(),
                messages: vec![ChatMessage::user(prompt)],
                max_tokens: self.config.max_tokens,
                tools: None,
            })
            .await?;

        Ok(SummaryOutput {
            summary: completion.content.trim().to_string(),
            model_used: completion.model,
        })
    }

    /// Best-effort enrichment via a web-search-augmented model. Failures are
    /// logged and never block summarization.
    async fn enhance(&self, content: &str) -> Enhancement {
        let prompt = format!(
            "Find recent context relevant to this article and return the article \
             text followed by any additional background you found:\n\n{}",
            content
        );

        let result = self
            .api
            .chat(ChatRequest {
                model: self.config.search_model.clone(),
                fallbacks: Vec::new(),
                messages: vec![ChatMessage::user(prompt)],
                max_tokens: self.config.max_tokens,
                tools: Some(serde_json::json!([{ "type": "web_search" }])),
            })
            .await;

        match result {
            Ok(completion) if !completion.content.trim().is_empty() => {
                Enhancement::Enhanced(completion.content)
            }
            Ok(_) => Enhancement::Skipped,
            Err(e) => {
                tracing::warn!("Enhancement stage skipped: {}", e);
                Enhancement::Skipped
            }
        }
    }

    /// Suggest a newsletter title from a set of articles.
    pub async fn suggest_title(&self, articles: &[Article]) -> Result<String, SummarizerError> {
        let listing = articles
            .iter()
            .map(|a| format!("- {}", a.title))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "Suggest a short, engaging newsletter title covering these articles. \
             Reply with the title only, no quotes:\n{}",
            listing
        );

        let completion = self
            .api
            .chat(ChatRequest {
                model: self.config.summary_model.clone(),
                fallbacks: self.config.fallback_models.clone(),
                messages: vec![ChatMessage::user(prompt)],
                max_tokens: 100,
                tools: None,
            })
            .await?;

        Ok(completion.content.trim().trim_matches('"').to_string())
    }

    /// Search for candidate articles on a topic. Malformed model output
    /// degrades to an empty list rather than an error.
    pub async fn search(&self, topic: &str) -> Result<Vec<Article>, SummarizerError> {
        let prompt = format!(
            "Find recent geoscience articles about \"{}\". Reply with a JSON array \
             of objects with fields: title, source_url, summary, category. \
             Reply with JSON only.",
            topic
        );

        let completion = self
            .api
            .chat(ChatRequest {
                model: self.config.search_model.clone(),
                fallbacks: Vec::new(),
                messages: vec![ChatMessage::user(prompt)],
                max_tokens: self.config.max_tokens,
                tools: Some(serde_json::json!([{ "type": "web_search" }])),
            })
            .await?;

        Ok(parse_article_list(&completion.content))
    }
}

/// Parse a JSON array of articles out of model output, tolerating markdown
/// code fences. Anything unparseable yields an empty list.
fn parse_article_list(raw: &str) -> Vec<Article> {
    let stripped = strip_code_fence(raw);
    match serde_json::from_str::<Vec<Article>>(stripped) {
        Ok(articles) => articles,
        Err(e) => {
            tracing::warn!("Discarding unparseable search results: {}", e);
            Vec::new()
        }
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag on the fence line.
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.trim_start_matches(['\r', '\n'])
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Scripted API: pops canned results in order and records requests.
    struct ScriptedApi {
        results: Mutex<Vec<Result<ChatCompletion, SummarizerError>>>,
        requests: Mutex<Vec<String>>,
    }

    impl ScriptedApi {
        fn new(results: Vec<Result<ChatCompletion, SummarizerError>>) -> Self {
            Self {
                results: Mutex::new(results),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn ok(content: &str, model: &str) -> Result<ChatCompletion, SummarizerError> {
            Ok(ChatCompletion {
                content: content.to_string(),
                model: model.to_string(),
            })
        }
    }

    #[async_trait]
    impl ChatApi for ScriptedApi {
        async fn chat(&self, request: ChatRequest) -> Result<ChatCompletion, SummarizerError> {
            self.requests.lock().unwrap().push(request.model.clone());
            self.results.lock().unwrap().remove(0)
        }
    }

    fn service(api: ScriptedApi) -> SummarizerService {
        SummarizerService::new(Arc::new(api), LlmConfig::default())
    }

    #[tokio::test]
    async fn test_summarize_uses_enhanced_content() {
        let api = ScriptedApi::new(vec![
            ScriptedApi::ok("enriched article text", "perplexity/sonar"),
            ScriptedApi::ok("A short summary.", "anthropic/claude-3.5-sonnet"),
        ]);
        let service = service(api);

        let output = service.summarize("raw article text", 100).await.unwrap();
        assert_eq!(output.summary, "A short summary.");
        assert_eq!(output.model_used, "anthropic/claude-3.5-sonnet");
    }

    #[tokio::test]
    async fn test_summarize_survives_enhancement_failure() {
        let api = ScriptedApi::new(vec![
            Err(SummarizerError::Failed("search model down".to_string())),
            ScriptedApi::ok("Summary anyway.", "openai/gpt-4o-mini"),
        ]);
        let service = service(api);

        let output = service.summarize("raw article text", 100).await.unwrap();
        assert_eq!(output.summary, "Summary anyway.");
        // The fallback model that served the summary is reported.
        assert_eq!(output.model_used, "openai/gpt-4o-mini");
    }

    #[tokio::test]
    async fn test_summarize_fails_when_fallbacks_exhausted() {
        let api = ScriptedApi::new(vec![
            Err(SummarizerError::Failed("down".to_string())),
            Err(SummarizerError::Failed("all models failed".to_string())),
        ]);
        let service = service(api);

        let result = service.summarize("content", 100).await;
        assert!(matches!(result, Err(SummarizerError::Failed(_))));
    }

    #[tokio::test]
    async fn test_suggest_title_trims_quotes() {
        let api = ScriptedApi::new(vec![ScriptedApi::ok(
            "\"Quakes and Currents\"\n",
            "anthropic/claude-3.5-sonnet",
        )]);
        let service = service(api);

        let title = service.suggest_title(&[]).await.unwrap();
        assert_eq!(title, "Quakes and Currents");
    }

    #[tokio::test]
    async fn test_search_degrades_malformed_json_to_empty() {
        let api = ScriptedApi::new(vec![ScriptedApi::ok(
            "Sorry, I could not find anything.",
            "perplexity/sonar",
        )]);
        let service = service(api);

        let articles = service.search("volcanoes").await.unwrap();
        assert!(articles.is_empty());
    }

    #[tokio::test]
    async fn test_search_parses_fenced_json() {
        let api = ScriptedApi::new(vec![ScriptedApi::ok(
            "```json\n[{\"title\":\"Deep quake swarm\",\"source_url\":\"https://x.example/a\",\"summary\":\"s\",\"category\":\"seismology\"}]\n```",
            "perplexity/sonar",
        )]);
        let service = service(api);

        let articles = service.search("earthquakes").await.unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Deep quake swarm");
        assert_eq!(articles[0].category, "seismology");
    }

    #[test]
    fn test_strip_code_fence_variants() {
        assert_eq!(strip_code_fence("[1]"), "[1]");
        assert_eq!(strip_code_fence("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("```\n[1]\n```"), "[1]");
    }
}
