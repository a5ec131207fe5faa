use anyhow::{Result, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Oracle;

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";
/// A one-word answer never needs more than a handful of tokens.
const MAX_TOKENS: u32 = 16;

/// An oracle that calls the Anthropic Messages API.
pub struct AnthropicOracle {
    client: reqwest::Client,
    model: String,
    api_key: Option<String>,
}

impl AnthropicOracle {
    pub fn new(model: Option<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key,
        }
    }

    /// Build from `ANTHROPIC_API_KEY`. A missing key only fails on `ask`.
    pub fn from_env(model: Option<String>) -> Self {
        Self::new(model, super::env_credential(API_KEY_VAR))
    }

    fn extract_text(resp: &ApiResponse) -> String {
        resp.content
            .iter()
            .filter_map(|block| {
                if block.content_type == "text" {
                    block.text.as_deref()
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

#[async_trait]
impl Oracle for AnthropicOracle {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn ask(&self, prompt: &str) -> Result<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            bail!("no Anthropic credentials found. Set {}.", API_KEY_VAR);
        };

        let body = ApiRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            messages: &[Message {
                role: "user",
                content: prompt,
            }],
        };

        let resp = self
            .client
            .post(API_URL)
            .header("anthropic-version", API_VERSION)
            .header("x-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!("Anthropic API error ({}): {}", status, text);
        }

        let api_resp: ApiResponse = resp.json().await?;
        if let Some(usage) = &api_resp.usage {
            debug!(
                input = usage.input_tokens,
                output = usage.output_tokens,
                "anthropic token usage"
            );
        }

        Ok(Self::extract_text(&api_resp))
    }
}

// --- API types ---

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: &'a [Message<'a>],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ApiResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn extract_text_joins_text_blocks() {
        let resp = parse(
            r#"{"content": [
                {"type": "text", "text": "Par"},
                {"type": "tool_use", "id": "x"},
                {"type": "text", "text": "is"}
            ]}"#,
        );
        assert_eq!(AnthropicOracle::extract_text(&resp), "Paris");
    }

    #[test]
    fn extract_text_empty_content() {
        let resp = parse(r#"{"content": [], "usage": {"input_tokens": 3, "output_tokens": 0}}"#);
        assert_eq!(AnthropicOracle::extract_text(&resp), "");
    }

    #[test]
    fn default_model_applied() {
        let oracle = AnthropicOracle::new(None, None);
        assert_eq!(oracle.model, DEFAULT_MODEL);
    }

    #[test]
    fn request_shape() {
        let body = ApiRequest {
            model: "m",
            max_tokens: MAX_TOKENS,
            messages: &[Message {
                role: "user",
                content: "hi",
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "m");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hi");
    }

    #[tokio::test]
    async fn missing_key_fails_on_ask() {
        let oracle = AnthropicOracle::new(None, None);
        let err = oracle.ask("question").await.unwrap_err();
        assert!(err.to_string().contains(API_KEY_VAR));
    }
}
