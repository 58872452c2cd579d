use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::aggregate::{Sentiment, SentimentVerdict};
use crate::service::{EvaluateError, Evaluator};

#[derive(Clone)]
pub struct AppState {
    pub evaluator: Evaluator,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/evaluate_sentiment", post(evaluate_form))
        .route("/api/evaluate", post(evaluate_json))
        .route("/recents", get(list_recents).delete(delete_recents))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct EvaluateReq {
    url: String,
}

#[derive(Debug, Serialize)]
pub struct EvaluateResp {
    url: String,
    title: String,
    comments: SentimentVerdict,
}

#[derive(Debug, Serialize)]
struct RecentOut {
    url: String,
    title: String,
    sentiment: Sentiment,
    score: f64,
}

#[derive(Debug, Serialize)]
struct ErrorOut {
    error: String,
}

/// Maps evaluation failures onto HTTP statuses.
pub struct ApiError(EvaluateError);

impl From<EvaluateError> for ApiError {
    fn from(e: EvaluateError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            EvaluateError::InvalidUrl(_) | EvaluateError::NoComments => StatusCode::BAD_REQUEST,
            EvaluateError::Source(_) | EvaluateError::Classifier(_) => StatusCode::BAD_GATEWAY,
            EvaluateError::Aggregate(_) | EvaluateError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = ErrorOut {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

async fn evaluate_form(
    State(state): State<AppState>,
    Form(req): Form<EvaluateReq>,
) -> Result<Json<EvaluateResp>, ApiError> {
    evaluate(&state, &req.url).await
}

async fn evaluate_json(
    State(state): State<AppState>,
    Json(req): Json<EvaluateReq>,
) -> Result<Json<EvaluateResp>, ApiError> {
    evaluate(&state, &req.url).await
}

async fn evaluate(state: &AppState, url: &str) -> Result<Json<EvaluateResp>, ApiError> {
    let ev = state.evaluator.evaluate(url).await?;
    Ok(Json(EvaluateResp {
        url: ev.locator,
        title: ev.title,
        comments: ev.verdict,
    }))
}

async fn list_recents(State(state): State<AppState>) -> Result<Json<Vec<RecentOut>>, ApiError> {
    let rows = state
        .evaluator
        .store()
        .list_recent()
        .await
        .map_err(EvaluateError::from)?;
    let out = rows
        .into_iter()
        .map(|r| RecentOut {
            url: r.locator,
            title: r.title,
            sentiment: r.sentiment,
            score: r.score,
        })
        .collect();
    Ok(Json(out))
}

async fn delete_recents(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let removed = state
        .evaluator
        .store()
        .delete_all()
        .await
        .map_err(EvaluateError::from)?;
    tracing::info!(removed, "cleared recent videos");
    Ok(Json(serde_json::json!({ "success": true })))
}
