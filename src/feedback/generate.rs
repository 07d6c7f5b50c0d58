use std::time::Duration;

use serde_json::json;
use tracing::{debug, warn};

use crate::llm::TextGenerator;

use super::json::{extract_first_json, parse_lenient};
use super::{normalize, FeedbackRecord};

/// Retry knobs for feedback generation.
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_attempts: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_attempts: 4,
        }
    }
}

/// Exponential backoff between attempts, capped at 8 seconds.
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt).min(8))
}

/// Coerces raw model output into a [`FeedbackRecord`] with bounded retry.
///
/// [`generate`](Self::generate) always returns a well-formed record:
/// transport failures and unparsable responses are retried with backoff and
/// degrade to the canonical empty record once attempts run out.
pub struct FeedbackGenerator<G> {
    llm: G,
    settings: GenerationSettings,
}

impl<G: TextGenerator> FeedbackGenerator<G> {
    pub fn new(llm: G, settings: GenerationSettings) -> Self {
        Self { llm, settings }
    }

    pub async fn generate(&self, prompt: &str) -> FeedbackRecord {
        for attempt in 0..self.settings.max_attempts {
            match self.llm.generate_text(prompt, self.settings.temperature).await {
                Ok(text) => {
                    let raw_json = extract_first_json(&text).unwrap_or(&text);
                    if let Some(value) = parse_lenient(raw_json) {
                        if value.is_object() {
                            // First structurally-valid mapping wins, however thin.
                            return normalize(&value);
                        }
                    }
                    debug!(
                        attempt,
                        response_len = text.len(),
                        "response did not parse as a JSON object"
                    );
                }
                Err(e) => {
                    warn!(attempt, error = %e, "LLM call failed");
                }
            }

            if attempt + 1 < self.settings.max_attempts {
                tokio::time::sleep(backoff_delay(attempt)).await;
            }
        }

        warn!(
            max_attempts = self.settings.max_attempts,
            "exhausted attempts, returning empty feedback"
        );
        normalize(&json!({
            "overall_summary": "",
            "positives": [],
            "feedback_items": [],
        }))
    }
}
