use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{error, info};

/// Hard deadline for a single model call. One attempt, no retry: a slow or
/// flaky endpoint degrades to the fallback template instead of stalling the
/// request.
const MODEL_TIMEOUT: Duration = Duration::from_secs(60);

const DEFAULT_MODEL_URL: &str =
    "https://router.huggingface.co/models/codellama/CodeLlama-7b-Instruct-hf";

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("http error: {0}")]
    Http(String),
    #[error("model endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed model response: {0}")]
    Malformed(String),
    #[error("model API key is not configured")]
    MissingApiKey,
}

/// Seam for the text-generation backend so handler tests can count calls
/// and script outcomes.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Returns the raw generated text. No semantic validation of the text
    /// happens here; extraction and repair are the extractor's job.
    async fn generate_website(
        &self,
        prompt: &str,
        website_type: Option<&str>,
    ) -> Result<String, ModelError>;
}

pub struct HfClient {
    client: Client,
    api_key: String,
    model_url: String,
}

impl HfClient {
    pub fn new(api_key: String) -> Self {
        let model_url = std::env::var("HUGGINGFACE_MODEL_URL")
            .unwrap_or_else(|_| DEFAULT_MODEL_URL.to_string());
        let client = Client::builder()
            .timeout(MODEL_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, api_key, model_url }
    }

    pub fn build_prompt(prompt: &str, website_type: Option<&str>) -> String {
        let website_type = website_type.unwrap_or("general");
        format!(
            "You are an expert web developer. Generate a complete, modern, responsive website based on the user's requirements.\n\n\
            User Request: {prompt}\n\
            Website Type: {website_type}\n\n\
            Generate ONLY valid HTML code with inline CSS using Tailwind CSS classes. The HTML should be:\n\
            1. Complete and ready to render\n\
            2. Fully responsive (mobile, tablet, desktop)\n\
            3. Modern and visually appealing\n\
            4. Include semantic HTML5 tags\n\
            5. Use Tailwind CSS classes for styling\n\
            6. Include realistic content relevant to the request\n\n\
            Return ONLY the HTML code, nothing else. Start with <!DOCTYPE html> and end with </html>."
        )
    }

    async fn query(&self, composed: &str) -> Result<String, ModelError> {
        let request_body = json!({
            "inputs": composed,
            "parameters": {
                "max_new_tokens": 2000,
                "temperature": 0.7,
                "top_p": 0.95,
                "return_full_text": false
            }
        });

        info!("🔗 Querying model endpoint: {}", self.model_url);

        let response = self
            .client
            .post(&self.model_url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| ModelError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("❌ Model endpoint error {}: {}", status, body);
            return Err(ModelError::Status { status: status.as_u16(), body });
        }

        let text = response
            .text()
            .await
            .map_err(|e| ModelError::Http(e.to_string()))?;
        let parsed: HfResponse = serde_json::from_str(&text)
            .map_err(|e| ModelError::Malformed(format!("{e}")))?;
        parsed
            .into_generated_text()
            .ok_or_else(|| ModelError::Malformed("no generated_text in response".into()))
    }
}

#[async_trait]
impl ModelClient for HfClient {
    async fn generate_website(
        &self,
        prompt: &str,
        website_type: Option<&str>,
    ) -> Result<String, ModelError> {
        if self.api_key.is_empty() {
            // Skip the doomed network call; the caller falls back to a
            // template.
            return Err(ModelError::MissingApiKey);
        }
        let composed = Self::build_prompt(prompt, website_type);
        let raw = self.query(&composed).await?;
        info!("✅ Model returned {} chars of raw text", raw.len());
        Ok(raw)
    }
}

// --- Response Parsing Helpers ---

/// The inference router answers either with an array whose first element
/// carries `generated_text`, or with a bare object carrying it.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HfResponse {
    Many(Vec<HfGeneration>),
    One(HfGeneration),
}

#[derive(Debug, Deserialize)]
struct HfGeneration {
    generated_text: String,
}

impl HfResponse {
    fn into_generated_text(self) -> Option<String> {
        match self {
            HfResponse::Many(mut v) => {
                if v.is_empty() {
                    None
                } else {
                    Some(v.remove(0).generated_text)
                }
            }
            HfResponse::One(g) => Some(g.generated_text),
        }
    }
}
