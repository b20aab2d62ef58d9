use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use crate::error::ApiError;
use crate::extract::extract_html;
use crate::hf::ModelClient;
use crate::models::{GenerateRequest, GenerateResponse, NewWebsite};
use crate::store::WebsiteStore;
use crate::templates::select_fallback;

const DEFAULT_LIST_LIMIT: i64 = 50;

#[derive(Clone)]
pub struct AppState {
    pub model: Arc<dyn ModelClient>,
    pub store: Arc<dyn WebsiteStore>,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/generate", post(generate_website))
        .route("/api/websites", get(list_websites))
        .route("/api/websites/:id", get(get_website).delete(delete_website))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[axum::debug_handler]
pub async fn generate_website(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let req = GenerateRequest::from_body(&body)?;
    info!("🚀 Generating website for prompt: {}", req.prompt);
    let response = run_generation(state.model.as_ref(), state.store.as_ref(), &req).await;
    Ok(Json(response))
}

/// The generation pipeline: model call, extraction, template fallback,
/// optional persistence. Past validation it cannot fail: any model problem
/// degrades to a pre-authored template and is still reported as a success.
pub async fn run_generation(
    model: &dyn ModelClient,
    store: &dyn WebsiteStore,
    req: &GenerateRequest,
) -> GenerateResponse {
    let website_type = req.website_type.as_deref();
    let html = match model.generate_website(&req.prompt, website_type).await {
        Ok(raw) => {
            let html = extract_html(&raw);
            if html.is_empty() {
                info!("🔄 Model produced no usable HTML, using a fallback template");
                select_fallback(&req.prompt, website_type).to_string()
            } else {
                html
            }
        }
        Err(e) => {
            error!("❌ Model invocation failed: {e}");
            info!("🔄 Using a fallback template");
            select_fallback(&req.prompt, website_type).to_string()
        }
    };

    // Persistence never changes the outcome of generation: a store failure
    // is logged and the record id is simply absent from the response.
    let record_id = if req.persist {
        let record = NewWebsite {
            title: format!(
                "Generated Website - {}",
                Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
            ),
            description: req.prompt.clone(),
            prompt: req.prompt.clone(),
            website_type: req.website_type.clone().unwrap_or_else(|| "general".into()),
            html_code: html.clone(),
            css_code: String::new(),
        };
        match store.create(record).await {
            Ok(id) => {
                info!("💾 Persisted website as {id}");
                Some(id)
            }
            Err(e) => {
                warn!("⚠️ Failed to persist website: {e}");
                None
            }
        }
    } else {
        None
    };

    GenerateResponse {
        succeeded: true,
        html,
        css: String::new(),
        record_id,
    }
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
}

pub async fn list_websites(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    let websites = state.store.list(limit).await?;
    Ok(Json(json!({ "succeeded": true, "websites": websites })))
}

pub async fn get_website(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    match state.store.get(&id).await? {
        Some(website) => Ok(Json(json!({ "succeeded": true, "website": website }))),
        None => Err(ApiError::NotFound("Website not found".into())),
    }
}

pub async fn delete_website(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    if state.store.delete(&id).await? {
        info!("🗑️ Deleted website {id}");
        Ok(Json(
            json!({ "succeeded": true, "message": "Website deleted successfully" }),
        ))
    } else {
        Err(ApiError::NotFound("Website not found".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hf::ModelError;
    use crate::models::Website;
    use crate::store::StoreError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    struct ScriptedModel {
        reply: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl ScriptedModel {
        fn replying(reply: &'static str) -> Self {
            Self { reply: Some(reply), calls: AtomicUsize::new(0) }
        }

        fn failing() -> Self {
            Self { reply: None, calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl ModelClient for ScriptedModel {
        async fn generate_website(
            &self,
            _prompt: &str,
            _website_type: Option<&str>,
        ) -> Result<String, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.reply {
                Some(r) => Ok(r.to_string()),
                None => Err(ModelError::Http("connection refused".into())),
            }
        }
    }

    struct CountingStore {
        fail: bool,
        creates: AtomicUsize,
    }

    impl CountingStore {
        fn working() -> Self {
            Self { fail: false, creates: AtomicUsize::new(0) }
        }

        fn broken() -> Self {
            Self { fail: true, creates: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl WebsiteStore for CountingStore {
        async fn create(&self, _site: NewWebsite) -> Result<String, StoreError> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(StoreError::Unavailable("store is down".into()))
            } else {
                Ok(Uuid::new_v4().to_string())
            }
        }

        async fn get(&self, _id: &str) -> Result<Option<Website>, StoreError> {
            Ok(None)
        }

        async fn list(&self, _limit: i64) -> Result<Vec<Website>, StoreError> {
            Ok(Vec::new())
        }

        async fn delete(&self, _id: &str) -> Result<bool, StoreError> {
            Ok(false)
        }
    }

    fn request(prompt: &str, persist: bool) -> GenerateRequest {
        GenerateRequest {
            prompt: prompt.to_string(),
            website_type: None,
            persist,
        }
    }

    #[tokio::test]
    async fn successful_generation_returns_the_extracted_document() {
        let model = ScriptedModel::replying(
            "```html\n<!DOCTYPE html><html><head><script src=\"https://cdn.tailwindcss.com\"></script></head><body>ok</body></html>\n```",
        );
        let store = CountingStore::working();
        let out = run_generation(&model, &store, &request("a bakery", false)).await;
        assert!(out.succeeded);
        assert!(out.html.contains("<body>ok</body>"));
        assert!(out.css.is_empty());
        assert_eq!(out.record_id, None);
        assert_eq!(store.creates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn model_failure_degrades_to_a_template_and_still_succeeds() {
        let model = ScriptedModel::failing();
        let store = CountingStore::working();
        let out = run_generation(&model, &store, &request("a site for a photographer", false)).await;
        assert!(out.succeeded);
        assert!(out.html.contains("Portfolio"));
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_model_output_counts_as_no_usable_html() {
        let model = ScriptedModel::replying("   ");
        let store = CountingStore::working();
        let out = run_generation(&model, &store, &request("an online store", false)).await;
        assert!(out.succeeded);
        assert!(out.html.contains("ShopNow"));
    }

    #[tokio::test]
    async fn persistence_is_attempted_once_when_requested() {
        let model = ScriptedModel::failing();
        let store = CountingStore::working();
        let out = run_generation(&model, &store, &request("a portfolio", true)).await;
        assert!(out.succeeded);
        assert!(out.record_id.is_some());
        assert_eq!(store.creates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn store_failure_is_swallowed_and_the_record_id_is_absent() {
        let model = ScriptedModel::replying("<!DOCTYPE html><html><head></head><body></body></html>");
        let store = CountingStore::broken();
        let out = run_generation(&model, &store, &request("a blog", true)).await;
        assert!(out.succeeded);
        assert_eq!(out.record_id, None);
        assert_eq!(store.creates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn persistence_is_skipped_when_not_requested() {
        let model = ScriptedModel::replying("<!DOCTYPE html><html><head></head><body></body></html>");
        let store = CountingStore::working();
        let out = run_generation(&model, &store, &request("a blog", false)).await;
        assert_eq!(out.record_id, None);
        assert_eq!(store.creates.load(Ordering::SeqCst), 0);
    }
}
