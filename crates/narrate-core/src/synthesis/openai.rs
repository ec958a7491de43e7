//! OpenAI-compatible speech endpoint client

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, error, info};

use super::{SynthesisRequest, Synthesizer};
use crate::config::NarrateConfig;
use crate::error::{Error, Result};

/// Request body for `POST /audio/speech`
#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

/// Synthesizer backed by the OpenAI `audio/speech` API
#[derive(Debug, Clone)]
pub struct OpenAiSynthesizer {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl OpenAiSynthesizer {
    pub fn new(api_base_url: &str, model: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_base_url, model)
    }

    pub fn with_client(client: reqwest::Client, api_base_url: &str, model: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: format!("{}/audio/speech", api_base_url.trim_end_matches('/')),
            model: model.into(),
        }
    }

    pub fn from_config(config: &NarrateConfig) -> Self {
        Self::new(&config.api_base_url, config.model.clone())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Synthesizer for OpenAiSynthesizer {
    async fn synthesize(&self, request: SynthesisRequest<'_>) -> Result<Bytes> {
        let segment = request.segment;
        info!(
            model = %self.model,
            voice = %request.voice,
            segment = segment.index,
            length = segment.length,
            "Calling speech API"
        );

        let body = SpeechRequest {
            model: &self.model,
            input: &segment.text,
            voice: request.voice.as_str(),
            response_format: "mp3",
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(request.credential.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::SynthesisFailure {
                index: segment.index,
                status: None,
                message: format!("transport error: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!(
                status = status.as_u16(),
                segment = segment.index,
                "Speech API call failed"
            );
            return Err(Error::SynthesisFailure {
                index: segment.index,
                status: Some(status.as_u16()),
                message: format!("OpenAI API error ({}): {}", status, detail),
            });
        }

        let audio = response.bytes().await?;
        debug!(segment = segment.index, bytes = audio.len(), "Speech audio received");
        Ok(audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_base_url() {
        let synth = OpenAiSynthesizer::new("https://api.openai.com/v1/", "tts-1");
        assert_eq!(synth.endpoint(), "https://api.openai.com/v1/audio/speech");
    }

    #[test]
    fn test_request_body_shape() {
        let body = SpeechRequest {
            model: "tts-1",
            input: "Hello there.",
            voice: "nova",
            response_format: "mp3",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "tts-1");
        assert_eq!(json["input"], "Hello there.");
        assert_eq!(json["voice"], "nova");
    }
}
