use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Prompt, TextGenerator};
use crate::errors::GeneratorError;

pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const PROVIDER: &str = "gemini";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
    max_output_tokens: u32,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate.
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        model: String,
        temperature: f32,
        max_output_tokens: u32,
        timeout: Duration,
    ) -> Result<Self, GeneratorError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| {
                GeneratorError::Misconfiguration(format!("Failed to build HTTP client: {}", e))
            })?;
        Ok(Self {
            client,
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature,
            max_output_tokens,
            timeout,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    fn body<'a>(&self, prompt: &'a Prompt) -> GenerateRequest<'a> {
        GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: &prompt.system,
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: &prompt.user }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        }
    }
}

/// Map a non-success HTTP status to a generator error.
fn map_status(status: StatusCode, body: &str) -> GeneratorError {
    let message = format!("{}: {}", status, body.chars().take(300).collect::<String>());
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GeneratorError::Auth {
            provider: PROVIDER.into(),
            message,
        },
        StatusCode::TOO_MANY_REQUESTS => GeneratorError::Quota {
            provider: PROVIDER.into(),
            message,
        },
        s if s.is_server_error() => GeneratorError::Outage {
            provider: PROVIDER.into(),
            message,
        },
        _ => GeneratorError::Misconfiguration(format!("{} rejected the request: {}", PROVIDER, message)),
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn generate(&self, prompt: &Prompt) -> Result<String, GeneratorError> {
        debug!(model = %self.model, chars = prompt.user.len(), "Calling Gemini");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .timeout(self.timeout)
            .json(&self.body(prompt))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeneratorError::Timeout(self.timeout)
                } else {
                    GeneratorError::Transport(format!("{} request failed: {}", PROVIDER, e))
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GeneratorError::Transport(format!("reading {} response: {}", PROVIDER, e)))?;

        if !status.is_success() {
            return Err(map_status(status, &text));
        }

        let parsed: GenerateResponse = serde_json::from_str(&text).map_err(|e| {
            GeneratorError::Transport(format!("malformed {} response: {}", PROVIDER, e))
        })?;
        parsed.text().ok_or(GeneratorError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GeminiClient {
        GeminiClient::new(
            "test-key".into(),
            DEFAULT_MODEL.into(),
            0.3,
            8192,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn endpoint_includes_model() {
        let c = client().with_base_url("http://localhost:1/v1beta/");
        assert_eq!(
            c.endpoint(),
            "http://localhost:1/v1beta/models/gemini-2.5-pro:generateContent"
        );
    }

    #[test]
    fn request_body_shape() {
        let c = client();
        let prompt = Prompt::new("You are the Game Architect.", "Plan pong");
        let json = serde_json::to_value(c.body(&prompt)).unwrap();
        assert_eq!(
            json["systemInstruction"]["parts"][0]["text"],
            "You are the Game Architect."
        );
        assert!(json["systemInstruction"].get("role").is_none());
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Plan pong");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 8192);
    }

    #[test]
    fn response_text_joins_parts() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"Hello "},{"text":"world"}]}}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.text().as_deref(), Some("Hello world"));
    }

    #[test]
    fn response_without_candidates_is_empty() {
        let parsed: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(parsed.text().is_none());
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(
            map_status(StatusCode::UNAUTHORIZED, ""),
            GeneratorError::Auth { .. }
        ));
        assert!(matches!(
            map_status(StatusCode::TOO_MANY_REQUESTS, ""),
            GeneratorError::Quota { .. }
        ));
        let outage = map_status(StatusCode::SERVICE_UNAVAILABLE, "try later");
        assert!(outage.is_transient());
        assert!(!map_status(StatusCode::BAD_REQUEST, "").is_transient());
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        let c = client().with_base_url("http://127.0.0.1:1/v1beta");
        let err = c.generate(&Prompt::new("s", "u")).await.unwrap_err();
        assert!(err.is_transient(), "got {err:?}");
    }
}
