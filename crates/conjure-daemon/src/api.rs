//! REST API handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use conjure_core::{Category, DefaultAsset, ResolveError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::state::AppState;

/// Generate request body
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    prompt: Option<String>,
}

/// Resolved asset for a prompt
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub url: String,
    pub description: String,
    pub ai_generated: bool,
    pub model_type: String,
}

/// Error response; still carries the default asset so the viewer has
/// something to show
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateError {
    pub error: String,
    pub url: String,
}

/// Resolve a prompt to an asset URL and description
pub async fn generate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> impl IntoResponse {
    let default_url = state.catalog().default_url().to_string();
    let bad_request = |msg: String| {
        (
            StatusCode::BAD_REQUEST,
            Json(GenerateError {
                error: msg,
                url: default_url.clone(),
            }),
        )
            .into_response()
    };

    let prompt = match payload {
        Ok(Json(GenerateRequest {
            prompt: Some(prompt),
        })) => prompt,
        Ok(_) => return bad_request("Prompt is required".to_string()),
        Err(rejection) => {
            debug!(error = %rejection, "Rejected generate request body");
            return bad_request(format!("Invalid request body: {}", rejection.body_text()));
        }
    };

    match state.service.resolve(&prompt).await {
        Ok(resolution) => {
            info!(
                category = %resolution.matched_category,
                ai_generated = resolution.ai_generated(),
                "Prompt resolved"
            );
            Json(GenerateResponse {
                ai_generated: resolution.ai_generated(),
                url: resolution.asset_url,
                description: resolution.description,
                model_type: resolution.matched_category,
            })
            .into_response()
        }
        Err(e @ ResolveError::EmptyPrompt) => bad_request(e.to_string()),
    }
}

/// Catalog listing for the front end
#[derive(Debug, Serialize, Deserialize)]
pub struct CatalogResponse {
    pub version: String,
    pub default: DefaultAsset,
    pub categories: Vec<Category>,
}

/// Get the keyword catalog
pub async fn get_catalog(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let catalog = state.catalog();
    Json(CatalogResponse {
        version: catalog.version().to_string(),
        default: catalog.default_asset().clone(),
        categories: catalog.categories().to_vec(),
    })
}

/// Liveness probe
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
