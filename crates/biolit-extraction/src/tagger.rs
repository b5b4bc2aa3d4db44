use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use biolit_core::entity::EntityType;
use biolit_core::error::{BiolitError, Result};
use biolit_core::tagging::{EntityTagger, RawMention};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const MODEL: &str = "claude-haiku-4-5-20251001";
const MAX_TOKENS: u32 = 4096;

/// Biomedical mention tagging backed by the Anthropic Messages API.
pub struct LlmTagger {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

// ── Anthropic Messages API request/response types ──────────────────────────

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

// ── Model output schema ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct LlmTaggingOutput {
    #[serde(default)]
    mentions: Vec<LlmMention>,
}

#[derive(Debug, Deserialize)]
struct LlmMention {
    text: String,
    #[serde(rename = "type")]
    entity_type: String,
    #[serde(default)]
    start: Option<usize>,
    #[serde(default = "default_confidence")]
    confidence: f64,
}

fn default_confidence() -> f64 {
    0.5
}

impl LlmTagger {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: MODEL.to_string(),
        }
    }

    fn build_system_prompt() -> String {
        r#"You are a biomedical named-entity tagger.

Given a text, list every mention of a gene, protein, disease or drug.

Return ONLY valid JSON (no markdown fences, no commentary) matching this exact schema:

{
  "mentions": [
    {
      "text": "exact substring of the input",
      "type": "gene | protein | disease | drug | other",
      "start": character offset of the first character in the input,
      "confidence": 0.0 to 1.0
    }
  ]
}

Rules:
- "text" MUST be copied verbatim from the input.
- Report every occurrence separately, in reading order.
- If there are no mentions, return {"mentions": []}."#
            .to_string()
    }

    async fn call_anthropic(&self, text: &str) -> Result<String> {
        let request = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            system: Self::build_system_prompt(),
            messages: vec![Message {
                role: "user".to_string(),
                content: text.to_string(),
            }],
        };

        tracing::debug!(
            model = %self.model,
            content_len = text.len(),
            "Sending tagging request to Anthropic API"
        );

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| BiolitError::Tagging(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            return Err(BiolitError::Tagging(format!(
                "Anthropic API returned status {status}: {body}"
            )));
        }

        let api_response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| BiolitError::Tagging(format!("Failed to parse API response: {e}")))?;

        let reply = api_response
            .content
            .iter()
            .find_map(|block| {
                if block.block_type == "text" {
                    block.text.clone()
                } else {
                    None
                }
            })
            .ok_or_else(|| BiolitError::Tagging("No text content block in API response".into()))?;

        tracing::debug!(
            stop_reason = ?api_response.stop_reason,
            response_len = reply.len(),
            "Received tagging response"
        );

        Ok(reply)
    }

    /// Parses the model reply into mentions with offsets checked against
    /// `text`. Reported offsets are trusted only when they point at the
    /// mention; otherwise the next verbatim occurrence is used. Mentions that
    /// do not occur in the text are dropped.
    fn parse_llm_response(raw_json: &str, text: &str) -> Result<Vec<RawMention>> {
        let cleaned = raw_json.trim();
        let cleaned = if cleaned.starts_with("```") {
            let start = cleaned.find('{').unwrap_or(0);
            let end = cleaned.rfind('}').map(|i| i + 1).unwrap_or(cleaned.len());
            cleaned.get(start..end).unwrap_or(cleaned)
        } else {
            cleaned
        };

        let output: LlmTaggingOutput = serde_json::from_str(cleaned).map_err(|e| {
            tracing::error!(error = %e, "Failed to parse tagger JSON");
            BiolitError::Tagging(format!("Failed to parse tagger JSON output: {e}"))
        })?;

        let chars: Vec<char> = text.chars().collect();
        let mut cursor = 0;
        let mut mentions = Vec::with_capacity(output.mentions.len());

        for m in output.mentions {
            let needle: Vec<char> = m.text.chars().collect();
            if needle.is_empty() {
                continue;
            }
            let matches_at = |pos: usize| {
                pos.checked_add(needle.len())
                    .and_then(|end| chars.get(pos..end))
                    == Some(&needle[..])
            };

            let start = match m.start {
                Some(pos) if matches_at(pos) => Some(pos),
                _ => (cursor..chars.len()).find(|&pos| matches_at(pos)),
            };

            match start {
                Some(start) => {
                    cursor = start + 1;
                    mentions.push(RawMention {
                        entity_type: EntityType::from_label(&m.entity_type),
                        text: m.text,
                        start,
                        end: start + needle.len(),
                        confidence: m.confidence.clamp(0.0, 1.0),
                    });
                }
                None => {
                    tracing::warn!(mention = %m.text, "Skipping mention not found in text");
                }
            }
        }

        Ok(mentions)
    }
}

#[async_trait]
impl EntityTagger for LlmTagger {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn tag(&self, text: &str) -> Result<Vec<RawMention>> {
        let reply = self.call_anthropic(text).await?;
        let mentions = Self::parse_llm_response(&reply, text)?;
        tracing::info!(mentions = mentions.len(), "Tagging complete");
        Ok(mentions)
    }
}
