use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use super::domain::EntryParams;
use super::persistence::ProgressStore;
use super::sequencer::WizardEvent;
use super::service::{WizardService, WizardServiceError};
use super::submission::SubmissionGateway;

/// Router builder exposing the wizard session endpoints.
pub fn wizard_router<S, G>(service: Arc<WizardService<S, G>>) -> Router
where
    S: ProgressStore + 'static,
    G: SubmissionGateway + 'static,
{
    Router::new()
        .route(
            "/api/v1/membership/wizard/session",
            post(start_handler::<S, G>).get(state_handler::<S, G>),
        )
        .route(
            "/api/v1/membership/wizard/session/resume",
            post(resume_handler::<S, G>),
        )
        .route(
            "/api/v1/membership/wizard/session/events",
            post(event_handler::<S, G>),
        )
        .with_state(service)
}

pub(crate) async fn start_handler<S, G>(
    State(service): State<Arc<WizardService<S, G>>>,
    Query(params): Query<EntryParams>,
) -> Response
where
    S: ProgressStore + 'static,
    G: SubmissionGateway + 'static,
{
    let outcome = service.start(&params, Utc::now());
    (StatusCode::CREATED, Json(outcome)).into_response()
}

pub(crate) async fn state_handler<S, G>(
    State(service): State<Arc<WizardService<S, G>>>,
) -> Response
where
    S: ProgressStore + 'static,
    G: SubmissionGateway + 'static,
{
    match service.state() {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn resume_handler<S, G>(
    State(service): State<Arc<WizardService<S, G>>>,
) -> Response
where
    S: ProgressStore + 'static,
    G: SubmissionGateway + 'static,
{
    match service.resume(Utc::now()) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn event_handler<S, G>(
    State(service): State<Arc<WizardService<S, G>>>,
    Json(event): Json<WizardEvent>,
) -> Response
where
    S: ProgressStore + 'static,
    G: SubmissionGateway + 'static,
{
    match service.dispatch(event, Utc::now()) {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: WizardServiceError) -> Response {
    let status = match err {
        WizardServiceError::NoSession => StatusCode::CONFLICT,
        WizardServiceError::NothingToResume => StatusCode::NOT_FOUND,
    };
    let payload = json!({ "error": err.to_string() });
    (status, Json(payload)).into_response()
}
