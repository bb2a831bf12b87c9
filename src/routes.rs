//! HTTP route handlers for the dashboard API.

use std::str::FromStr;

use autovote_runner::{Error, LabelOverrides, NewSite, Site};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{delete, get, post};
use axum::Router;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::sse;
use crate::state::AppState;

/// Build the API router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/sites", get(list_sites).post(create_site))
        .route("/sites/{id}", delete(delete_site))
        .route("/start-vote", post(start_vote))
        .route("/logs", get(sse::logs_handler))
}

/// JSON error body with a status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "success": false, "error": self.message }));
        (self.status, body).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::SiteNotFound(_) => {
                ApiError::new(StatusCode::NOT_FOUND, "Site configuration not found")
            }
            Error::Config(_) | Error::Yaml(_) => {
                ApiError::new(StatusCode::BAD_REQUEST, err.to_string())
            }
            other => {
                warn!(error = %other, "request failed");
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

/// Number or numeric string; anything else reads as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.to_string().parse().ok(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

async fn health() -> &'static str {
    "ok"
}

/// GET /api/sites - all saved sites.
async fn list_sites(State(state): State<AppState>) -> Json<Vec<Site>> {
    let sites = state.sites.lock().await;
    Json(sites.list().to_vec())
}

#[derive(Deserialize)]
struct CreateSite {
    #[serde(default)]
    name: String,
    #[serde(default, alias = "loginUrl")]
    login_url: String,
    #[serde(default, alias = "voteUrl")]
    vote_url: String,
    #[serde(default, alias = "defaultIterations", deserialize_with = "lenient")]
    default_iterations: Option<u32>,
    #[serde(default)]
    labels: Option<LabelOverrides>,
}

/// POST /api/sites - save a new site.
async fn create_site(
    State(state): State<AppState>,
    payload: Result<Json<CreateSite>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = payload?;
    let site = state.sites.lock().await.create(NewSite {
        name: req.name,
        login_url: req.login_url,
        vote_url: req.vote_url,
        default_iterations: req.default_iterations,
        labels: req.labels,
    })?;
    Ok(Json(json!({ "success": true, "site": site })))
}

/// DELETE /api/sites/{id} - remove a saved site.
async fn delete_site(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.sites.lock().await.delete(&id)?;
    Ok(Json(json!({ "success": true })))
}

#[derive(Deserialize)]
struct StartVote {
    #[serde(default, deserialize_with = "lenient")]
    id: Option<String>,
    #[serde(default, alias = "choiceIndex", deserialize_with = "lenient")]
    choice_index: Option<usize>,
    #[serde(default, alias = "siteId", deserialize_with = "lenient")]
    site_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    iterations: Option<u32>,
}

/// POST /api/start-vote - resolve the site and run in the background.
async fn start_vote(
    State(state): State<AppState>,
    payload: Result<Json<StartVote>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = payload?;
    let identifier = req.id.as_deref().unwrap_or_default();
    let site_id = req.site_id.as_deref().map(str::trim).unwrap_or_default();
    if identifier.trim().is_empty() || site_id.is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "ID and Site Selection are required",
        ));
    }

    let (name, config) = {
        let sites = state.sites.lock().await;
        let site = sites.resolve(site_id)?;
        let config =
            site.run_config(identifier, req.choice_index.unwrap_or(0), req.iterations)?;
        (site.name.clone(), config)
    };

    info!(site = %name, "starting vote");
    state.spawn_run(config);
    Ok(Json(json!({
        "success": true,
        "message": format!("Voting started for {}", name),
    })))
}
