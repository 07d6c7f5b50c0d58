use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::{BackendKind, LlmConfig};

/// Capability boundary for text generation: one prompt in, raw text out.
///
/// Implementations may fail, time out, or return non-JSON text; callers own
/// the retry policy.
pub trait TextGenerator {
    async fn generate_text(&self, prompt: &str, temperature: f32) -> Result<String>;
}

fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(120))
        .build()
        .context("Failed to create HTTP client")
}

// --- Gemini generateContent (structured client) ---

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Deserialize, Default)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<TextPart>,
}

#[derive(Deserialize)]
struct TextPart {
    #[serde(default)]
    text: String,
}

/// Gemini `generateContent` transport with typed request/response bodies.
pub struct GenAiClient {
    client: reqwest::Client,
    model: String,
    api_key: String,
}

impl GenAiClient {
    pub fn new(model: &str, api_key: &str) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            model: model.to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        )
    }
}

impl TextGenerator for GenAiClient {
    async fn generate_text(&self, prompt: &str, temperature: f32) -> Result<String> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig { temperature },
        };

        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("LLM request failed")?
            .error_for_status()
            .context("LLM request returned an error status")?;

        let parsed: GenerateContentResponse =
            resp.json().await.context("Failed to parse LLM response")?;

        // Text is the concatenation of the first candidate's parts.
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| c.content.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        Ok(text)
    }
}

// --- OpenAI-compatible chat/completions (raw HTTP) ---

/// OpenAI-compatible `chat/completions` transport speaking raw JSON with a
/// bearer token.
pub struct RawHttpClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl RawHttpClient {
    pub fn new(base_url: &str, model: &str, api_key: &str) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            base_url: base_url.to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Resolve the chat completions endpoint from the base URL.
    fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            base.to_string()
        } else if base.ends_with("/v1") {
            format!("{}/chat/completions", base)
        } else {
            format!("{}/v1/chat/completions", base)
        }
    }
}

impl TextGenerator for RawHttpClient {
    async fn generate_text(&self, prompt: &str, temperature: f32) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": temperature,
        });

        let resp = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .context("LLM request failed")?
            .error_for_status()
            .context("LLM request returned an error status")?;

        let text = resp.text().await.context("Failed to read LLM response")?;
        let json: serde_json::Value =
            serde_json::from_str(&text).context("Failed to parse LLM JSON")?;

        // Extract content from choices[0].message.content (handle null)
        let content = json["choices"]
            .get(0)
            .and_then(|c| c["message"]["content"].as_str())
            .unwrap_or("")
            .to_string();

        Ok(content)
    }
}

/// Backend selected once at startup; call sites stay transport-agnostic.
pub enum LlmBackend {
    GenAi(GenAiClient),
    Http(RawHttpClient),
}

impl LlmBackend {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        Ok(match config.backend {
            BackendKind::GenAi => {
                LlmBackend::GenAi(GenAiClient::new(&config.model, &config.api_key)?)
            }
            BackendKind::Http => LlmBackend::Http(RawHttpClient::new(
                &config.base_url,
                &config.model,
                &config.api_key,
            )?),
        })
    }
}

impl TextGenerator for LlmBackend {
    async fn generate_text(&self, prompt: &str, temperature: f32) -> Result<String> {
        match self {
            LlmBackend::GenAi(c) => c.generate_text(prompt, temperature).await,
            LlmBackend::Http(c) => c.generate_text(prompt, temperature).await,
        }
    }
}
