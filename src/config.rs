use anyhow::{bail, Result};

/// Which transport talks to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Typed Gemini `generateContent` client.
    GenAi,
    /// Raw OpenAI-compatible `chat/completions` POST.
    Http,
}

/// Process-wide LLM configuration, read once at startup.
///
/// The cache-only reconciliation path never constructs this, so a missing
/// credential only aborts runs that actually contact the model.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub model: String,
    pub backend: BackendKind,
    pub api_key: String,
    /// Base URL for the raw HTTP backend (ignored by the GenAi backend).
    pub base_url: String,
}

impl LlmConfig {
    pub fn from_env() -> Result<Self> {
        let model = dotenv::var("GEMINI_MODEL")
            .unwrap_or_else(|_| "gemini-2.0-flash".to_string());

        let backend = match dotenv::var("LLM_BACKEND").ok().as_deref() {
            None | Some("") | Some("genai") => BackendKind::GenAi,
            Some("http") => BackendKind::Http,
            Some(other) => {
                bail!("Unknown LLM_BACKEND '{}': expected 'genai' or 'http'", other)
            }
        };

        let api_key = dotenv::var("GOOGLE_API_KEY")
            .unwrap_or_default()
            .trim()
            .to_string();
        if api_key.is_empty() {
            bail!("Missing GOOGLE_API_KEY in environment (.env)");
        }

        let base_url = dotenv::var("LLM_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:1234/v1".to_string());

        Ok(Self {
            model,
            backend,
            api_key,
            base_url,
        })
    }
}
