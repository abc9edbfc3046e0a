//! HTTP client for the upstream AI gateway.
//!
//! Implements [`CompletionGateway`] against an OpenAI-compatible
//! `/chat/completions` endpoint with `stream: true`. The response body is
//! handed back chunk for chunk; reassembly into SSE events is the consumer's
//! concern.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never logged
//! or included in `Debug` output.

use std::time::Duration;

use futures_util::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::warn;

use botdesk_core::relay::{CompletionGateway, RelayStream};
use botdesk_types::chat::{ChatMessage, MessageRole};
use botdesk_types::config::GatewayConfig;
use botdesk_types::error::RelayError;

/// Reqwest-backed gateway client.
pub struct HttpCompletionGateway {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: SecretString,
    idle_timeout: Duration,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

impl HttpCompletionGateway {
    pub fn new(config: &GatewayConfig, api_key: SecretString) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            idle_timeout: Duration::from_secs(config.idle_timeout_secs),
        }
    }

    fn build_request<'a>(
        &'a self,
        system_prompt: &'a str,
        messages: &'a [ChatMessage],
    ) -> CompletionRequest<'a> {
        let mut wire = Vec::with_capacity(messages.len() + 1);
        wire.push(WireMessage {
            role: "system",
            content: system_prompt,
        });
        for message in messages {
            wire.push(WireMessage {
                role: match message.role {
                    MessageRole::System => "system",
                    MessageRole::User => "user",
                    MessageRole::Assistant => "assistant",
                },
                content: &message.content,
            });
        }

        CompletionRequest {
            model: &self.model,
            messages: wire,
            stream: true,
        }
    }
}

impl CompletionGateway for HttpCompletionGateway {
    async fn stream_completion(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
    ) -> Result<RelayStream, RelayError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_request(system_prompt, messages);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                warn!(error = %err, "gateway request failed");
                RelayError::UpstreamUnavailable
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RelayError::RateLimited);
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(status = %status, detail = %detail, "gateway returned error");
            return Err(RelayError::UpstreamUnavailable);
        }

        let mut upstream = response.bytes_stream();
        let idle_timeout = self.idle_timeout;
        let stream = async_stream::try_stream! {
            loop {
                match tokio::time::timeout(idle_timeout, upstream.next()).await {
                    Ok(Some(Ok(chunk))) => yield chunk,
                    Ok(Some(Err(err))) => {
                        Err(RelayError::Stream(err.to_string()))?;
                    }
                    Ok(None) => break,
                    Err(_) => {
                        Err(RelayError::Stream(format!(
                            "no data from gateway for {}s",
                            idle_timeout.as_secs()
                        )))?;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> HttpCompletionGateway {
        HttpCompletionGateway::new(
            &GatewayConfig::default(),
            SecretString::from("test-key".to_string()),
        )
    }

    #[test]
    fn test_request_prepends_system_message() {
        let gw = gateway();
        let messages = vec![ChatMessage::user("Hi"), ChatMessage::assistant("Hello!")];
        let request = gw.build_request("You are a bot.", &messages);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "google/gemini-3-flash-preview");
        assert_eq!(json["stream"], true);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], "You are a bot.");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][2]["role"], "assistant");
    }

    #[test]
    fn test_base_url_trailing_slash_normalized() {
        let config = GatewayConfig {
            base_url: "https://gateway.example.com/v1/".to_string(),
            ..GatewayConfig::default()
        };
        let gw = HttpCompletionGateway::new(&config, SecretString::from("k".to_string()));
        assert_eq!(gw.base_url, "https://gateway.example.com/v1");
    }
}
