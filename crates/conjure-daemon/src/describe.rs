//! Text-completion client for asset descriptions
//!
//! Talks to any OpenAI-compatible `chat/completions` endpoint. One request per
//! prompt, no retries; every failure is mapped to a [`DescribeError`] so the
//! prompt service can substitute its placeholder.

use anyhow::{Context, Result};
use conjure_core::{DescribeError, Describer};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::CompletionConfig;

const SYSTEM_PROMPT: &str =
    "You write captions for 3D models shown in an augmented reality viewer. \
    Reply with one or two vivid sentences describing the model the user asked for. \
    Do not mention that the model was pre-made.";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

/// Description client backed by a chat-completions API
pub struct CompletionClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    max_tokens: u32,
    api_key: Option<String>,
}

impl CompletionClient {
    /// Create a client, reading the API key from the configured variable
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).ok();
        if api_key.as_deref().map(str::trim).unwrap_or_default().is_empty() {
            info!(
                env = %config.api_key_env,
                "No completion API key set, descriptions will use the placeholder"
            );
        }
        Self::with_api_key(config, api_key)
    }

    /// Create a client with an explicit (possibly absent) API key
    pub fn with_api_key(config: &CompletionConfig, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            api_key,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

impl Describer for CompletionClient {
    async fn describe(&self, prompt: &str, category: &str) -> Result<String, DescribeError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(DescribeError::NotConfigured);
        };

        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!("Prompt: {}\nModel type: {}", prompt, category),
                },
            ],
            max_tokens: self.max_tokens,
            temperature: 0.7,
        };

        debug!(endpoint = %self.endpoint, model = %self.model, "Requesting description");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DescribeError::Timeout
                } else {
                    DescribeError::Request(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(DescribeError::Status(response.status().as_u16()));
        }

        let text = response
            .text()
            .await
            .map_err(|e| DescribeError::Request(e.to_string()))?;
        parse_completion(&text)
    }
}

/// Pull the first choice's text out of a chat-completions response body
fn parse_completion(body: &str) -> Result<String, DescribeError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| DescribeError::Malformed(e.to_string()))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| DescribeError::Malformed("response has no content".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    const CHAT_REPLY: &str = concat!(
        r#"{"id":"x","choices":[{"index":0,"message":"#,
        r#"{"role":"assistant","content":"  A dragon coiled in smoke. "}}]}"#,
    );

    fn config(api_base: &str) -> CompletionConfig {
        CompletionConfig {
            api_base: api_base.to_string(),
            timeout_secs: 2,
            ..CompletionConfig::default()
        }
    }

    fn keyed_client(api_base: &str) -> CompletionClient {
        CompletionClient::with_api_key(&config(api_base), Some("sk-test".to_string())).unwrap()
    }

    /// Answer a single HTTP request with `status` and a JSON `body`
    ///
    /// Returns the API base URL and a handle yielding the raw request text.
    async fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\
             Connection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request_complete(&request) {
                    break;
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });

        (format!("http://{}/v1", addr), handle)
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        request.len() >= header_end + 4 + content_length
    }

    #[test]
    fn test_parse_completion() {
        assert_eq!(parse_completion(CHAT_REPLY).unwrap(), "A dragon coiled in smoke.");
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(parse_completion("not json"), Err(DescribeError::Malformed(_))));
        assert!(matches!(
            parse_completion(r#"{"choices":[]}"#),
            Err(DescribeError::Malformed(_))
        ));
        assert!(matches!(
            parse_completion(r#"{"choices":[{"message":{"content":null}}]}"#),
            Err(DescribeError::Malformed(_))
        ));
    }

    #[test]
    fn test_endpoint() {
        let client =
            CompletionClient::with_api_key(&config("https://llm.example.com/v1/"), None).unwrap();
        assert_eq!(client.endpoint, "https://llm.example.com/v1/chat/completions");
    }

    #[tokio::test]
    async fn test_missing_key_skips_request() {
        let client =
            CompletionClient::with_api_key(&config("http://127.0.0.1:9"), Some("  ".to_string()))
                .unwrap();
        assert!(!client.is_configured());
        assert_eq!(
            client.describe("a dragon", "dragon").await,
            Err(DescribeError::NotConfigured)
        );
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        let client = keyed_client("http://127.0.0.1:9");
        let err = client.describe("a dragon", "dragon").await.unwrap_err();
        assert!(matches!(err, DescribeError::Request(_) | DescribeError::Timeout));
    }

    #[tokio::test]
    async fn test_successful_description() {
        let (api_base, server) = serve_once("200 OK", CHAT_REPLY).await;
        let client = keyed_client(&api_base);

        let text = client.describe("a red dragon", "dragon").await.unwrap();
        assert_eq!(text, "A dragon coiled in smoke.");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /v1/chat/completions "));
        assert!(request.to_lowercase().contains("authorization: bearer sk-test"));
        assert!(request.contains("Model type: dragon"));
    }

    #[tokio::test]
    async fn test_error_status() {
        let (api_base, server) =
            serve_once("500 Internal Server Error", r#"{"error":"boom"}"#).await;
        let client = keyed_client(&api_base);

        let err = client.describe("a red dragon", "dragon").await.unwrap_err();
        assert_eq!(err, DescribeError::Status(500));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_malformed_reply() {
        let (api_base, server) = serve_once("200 OK", r#"{"choices":[]}"#).await;
        let client = keyed_client(&api_base);

        let err = client.describe("a red dragon", "dragon").await.unwrap_err();
        assert!(matches!(err, DescribeError::Malformed(_)));
        server.await.unwrap();
    }
}
