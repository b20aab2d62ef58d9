use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// A validated generation request. Built from the raw JSON body so that a
/// missing or non-string prompt surfaces as a 400 with a JSON error payload
/// instead of a body-extractor rejection.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub prompt: String,
    pub website_type: Option<String>,
    pub persist: bool,
}

impl GenerateRequest {
    pub fn from_body(body: &Value) -> Result<Self, ApiError> {
        let prompt = match body.get("prompt") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
            _ => return Err(ApiError::Validation("Prompt is required".into())),
        };
        let website_type = body
            .get("websiteType")
            .and_then(Value::as_str)
            .map(|s| s.to_string());
        let persist = body.get("persist").and_then(Value::as_bool).unwrap_or(false);
        Ok(Self { prompt, website_type, persist })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub succeeded: bool,
    pub html: String,
    /// Always empty in the current design: styling is inlined via Tailwind.
    pub css: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
}

/// A stored website, as persisted by the gateway and returned by the CRUD
/// routes. The id is opaque to callers (a UUID string under the hood).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Website {
    pub id: String,
    pub title: String,
    pub description: String,
    pub prompt: String,
    pub website_type: String,
    pub html_code: String,
    pub css_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields the caller supplies when persisting; id and timestamps are
/// assigned by the store.
#[derive(Debug, Clone)]
pub struct NewWebsite {
    pub title: String,
    pub description: String,
    pub prompt: String,
    pub website_type: String,
    pub html_code: String,
    pub css_code: String,
}
