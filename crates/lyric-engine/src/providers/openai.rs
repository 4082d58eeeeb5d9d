use std::time::Duration;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::blocking::{Client as HttpClient, Response as HttpResponse};
use reqwest::header::CONTENT_TYPE;
use serde_json::{json, Value};

use super::{ChatRequest, ImageBytes, ImageProvider, ImageRequest, TextProvider};
use crate::config::AgentConfig;
use crate::truncate_text;

const ERROR_BODY_MAX_CHARS: usize = 512;

/// Blocking client for an OpenAI-compatible `chat/completions` and
/// `images/generations` API.
pub struct OpenAiCompatProvider {
    api_base: String,
    api_key: String,
    download_timeout: Duration,
    http: HttpClient,
}

impl OpenAiCompatProvider {
    pub fn from_config(config: &AgentConfig) -> Result<Self> {
        let (api_key, api_base) = config.credentials()?;
        let http = HttpClient::builder()
            .timeout(config.request_timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            api_base: api_base.to_string(),
            api_key: api_key.to_string(),
            download_timeout: config.image_download_timeout,
            http,
        })
    }

    fn post_json(&self, endpoint: &str, payload: &Value) -> Result<Value> {
        let response = self
            .http
            .post(endpoint)
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .json(payload)
            .send()
            .with_context(|| format!("request failed ({endpoint})"))?;
        response_json_or_error(endpoint, response)
    }

    fn first_image(&self, response_payload: &Value) -> Result<ImageBytes> {
        let Some(item) = response_payload
            .get("data")
            .and_then(Value::as_array)
            .and_then(|rows| rows.first())
            .and_then(Value::as_object)
        else {
            bail!("image response returned no data");
        };

        if let Some(b64) = item.get("b64_json").and_then(Value::as_str) {
            let bytes = BASE64
                .decode(b64.as_bytes())
                .context("image base64 decode failed")?;
            return Ok(ImageBytes {
                bytes,
                mime_type: None,
                source_url: None,
            });
        }

        if let Some(url) = item.get("url").and_then(Value::as_str) {
            tracing::info!(url, "image url received");
            return self.download_image(url);
        }

        bail!("image response item has neither url nor b64_json");
    }

    fn download_image(&self, url: &str) -> Result<ImageBytes> {
        let response = self
            .http
            .get(url)
            .timeout(self.download_timeout)
            .send()
            .with_context(|| format!("failed downloading image ({url})"))?;
        if !response.status().is_success() {
            let code = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            bail!(
                "image download failed ({code}): {}",
                truncate_text(&body, ERROR_BODY_MAX_CHARS)
            );
        }
        let mime_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .context("failed reading image bytes")?
            .to_vec();
        Ok(ImageBytes {
            bytes,
            mime_type,
            source_url: Some(url.to_string()),
        })
    }
}

impl TextProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn complete(&self, request: &ChatRequest) -> Result<String> {
        let endpoint = format!("{}/chat/completions", self.api_base);
        let payload = json!({
            "model": request.model,
            "messages": [
                {"role": "system", "content": request.system},
                {"role": "user", "content": request.user},
            ],
        });
        let response_payload = self.post_json(&endpoint, &payload)?;
        extract_message_content(&response_payload)
    }
}

impl ImageProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn generate(&self, request: &ImageRequest) -> Result<ImageBytes> {
        let endpoint = format!("{}/images/generations", self.api_base);
        let payload = json!({
            "model": request.model,
            "prompt": request.prompt,
            "n": 1,
            "size": request.size,
        });
        let response_payload = self.post_json(&endpoint, &payload)?;
        self.first_image(&response_payload)
    }
}

fn extract_message_content(response_payload: &Value) -> Result<String> {
    let content = response_payload
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"));
    match content {
        Some(Value::String(text)) => Ok(text.clone()),
        Some(Value::Array(parts)) => {
            let text = parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("");
            if text.is_empty() {
                bail!("chat response content had no text parts");
            }
            Ok(text)
        }
        _ => bail!("chat response had no message content"),
    }
}

fn response_json_or_error(endpoint: &str, response: HttpResponse) -> Result<Value> {
    let status = response.status();
    let code = status.as_u16();
    let body = response
        .text()
        .with_context(|| format!("response body read failed ({endpoint})"))?;
    if !status.is_success() {
        bail!(
            "request failed ({code}): {}",
            truncate_text(&body, ERROR_BODY_MAX_CHARS)
        );
    }
    serde_json::from_str(&body).with_context(|| format!("invalid JSON payload ({endpoint})"))
}
