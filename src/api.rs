//! HTTP adapter for run/submit

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::languages::get_supported_languages;
use crate::core::JudgeError;
use crate::judger::{ExecutionResult, Judge, RunMode, TestCase};

#[derive(Debug, Deserialize)]
pub struct RunRequest {
    pub problem_title: String,
    pub language: String,
    pub code: String,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RunResponse {
    pub passed: bool,
    pub results: Vec<ExecutionResult>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn router(judge: Arc<Judge>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/languages", get(languages))
        .route("/run", post(run))
        .route("/submit", post(submit))
        .with_state(judge)
}

async fn health() -> &'static str {
    "OK"
}

async fn languages() -> Json<Vec<String>> {
    Json(get_supported_languages())
}

async fn run(
    State(judge): State<Arc<Judge>>,
    Json(request): Json<RunRequest>,
) -> Result<Json<RunResponse>, ApiError> {
    handle(&judge, request, RunMode::Run).await
}

async fn submit(
    State(judge): State<Arc<Judge>>,
    Json(request): Json<RunRequest>,
) -> Result<Json<RunResponse>, ApiError> {
    handle(&judge, request, RunMode::Submit).await
}

async fn handle(
    judge: &Judge,
    request: RunRequest,
    mode: RunMode,
) -> Result<Json<RunResponse>, ApiError> {
    let results = judge
        .run_or_submit(
            &request.problem_title,
            &request.language,
            &request.code,
            &request.test_cases,
            mode,
        )
        .await
        .map_err(|e| {
            warn!("Rejected {:?} request: {}", mode, e);
            (status_for(&e), Json(ErrorResponse { error: e.to_string() }))
        })?;

    Ok(Json(RunResponse {
        passed: results.iter().all(|r| r.passed),
        results,
    }))
}

fn status_for(error: &JudgeError) -> StatusCode {
    match error {
        JudgeError::ConfigurationMissing(_) => StatusCode::NOT_FOUND,
        JudgeError::UnsupportedLanguage(_) | JudgeError::Decode(_) => StatusCode::BAD_REQUEST,
        JudgeError::Synthesis(_) | JudgeError::Execution(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
