use anyhow::{Result, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::Oracle;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

/// An oracle that calls Google's Generative Language `generateContent` API.
pub struct GeminiOracle {
    client: reqwest::Client,
    model: String,
    api_key: Option<String>,
}

impl GeminiOracle {
    pub fn new(model: Option<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key,
        }
    }

    /// Build from `GEMINI_API_KEY`. A missing key only fails on `ask`.
    pub fn from_env(model: Option<String>) -> Self {
        Self::new(model, super::env_credential(API_KEY_VAR))
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", API_BASE, self.model)
    }

    /// Text of the first candidate, or an error if the model produced none.
    fn extract_text(resp: GenerateResponse) -> Result<String> {
        let Some(candidate) = resp.candidates.into_iter().next() else {
            match resp.prompt_feedback.and_then(|f| f.block_reason) {
                Some(reason) => bail!("Gemini blocked the prompt: {}", reason),
                None => bail!("Gemini returned no candidates"),
            }
        };
        let text: String = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|p| p.text)
            .collect();
        Ok(text)
    }
}

#[async_trait]
impl Oracle for GeminiOracle {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn ask(&self, prompt: &str) -> Result<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            bail!("no Gemini credentials found. Set {}.", API_KEY_VAR);
        };

        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        };

        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!("Gemini API error ({}): {}", status, text);
        }

        Self::extract_text(resp.json().await?)
    }
}

// --- API types ---

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> GenerateResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn extract_first_candidate_text() {
        let resp = parse(
            r#"{"candidates": [
                {"content": {"parts": [{"text": "Paris"}], "role": "model"}},
                {"content": {"parts": [{"text": "Lyon"}]}}
            ]}"#,
        );
        assert_eq!(GeminiOracle::extract_text(resp).unwrap(), "Paris");
    }

    #[test]
    fn extract_concatenates_parts() {
        let resp = parse(r#"{"candidates": [{"content": {"parts": [{"text": "Pa"}, {"text": "ris"}]}}]}"#);
        assert_eq!(GeminiOracle::extract_text(resp).unwrap(), "Paris");
    }

    #[test]
    fn extract_blocked_prompt_fails() {
        let resp = parse(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#);
        let err = GeminiOracle::extract_text(resp).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn extract_no_candidates_fails() {
        let resp = parse(r#"{"candidates": []}"#);
        assert!(GeminiOracle::extract_text(resp).is_err());
    }

    #[test]
    fn candidate_without_content_is_empty() {
        let resp = parse(r#"{"candidates": [{"finishReason": "MAX_TOKENS"}]}"#);
        assert_eq!(GeminiOracle::extract_text(resp).unwrap(), "");
    }

    #[test]
    fn endpoint_includes_model() {
        let oracle = GeminiOracle::new(Some("gemini-test".to_string()), None);
        assert_eq!(
            oracle.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-test:generateContent"
        );
    }

    #[tokio::test]
    async fn missing_key_fails_on_ask() {
        let oracle = GeminiOracle::new(None, None);
        let err = oracle.ask("question").await.unwrap_err();
        assert!(err.to_string().contains(API_KEY_VAR));
    }
}
