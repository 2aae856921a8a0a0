use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;

use crate::activities::{
    ActivityDraft, ActivityFilter, ActivityId, ActivityRepository, RepositoryError, StudentId,
};

use super::service::{ScoreSink, ScoringService, ScoringServiceError};

/// Router builder exposing the activity CRUD, preview, and score endpoints.
pub fn scoring_router<R, S>(service: Arc<ScoringService<R, S>>) -> Router
where
    R: ActivityRepository + 'static,
    S: ScoreSink + 'static,
{
    Router::new()
        .route("/api/v1/rules", get(rules_handler::<R, S>))
        .route("/api/v1/activities", get(list_handler::<R, S>))
        .route("/api/v1/activities/preview", post(preview_handler::<R, S>))
        .route(
            "/api/v1/students/:student_id/activities",
            get(student_activities_handler::<R, S>).post(submit_handler::<R, S>),
        )
        .route(
            "/api/v1/students/:student_id/activities/:activity_id",
            put(update_handler::<R, S>).delete(delete_handler::<R, S>),
        )
        .route(
            "/api/v1/students/:student_id/score",
            get(score_handler::<R, S>),
        )
        .with_state(service)
}

pub(crate) async fn rules_handler<R, S>(
    State(service): State<Arc<ScoringService<R, S>>>,
) -> Response
where
    R: ActivityRepository + 'static,
    S: ScoreSink + 'static,
{
    (StatusCode::OK, Json(service.rules())).into_response()
}

pub(crate) async fn list_handler<R, S>(
    State(service): State<Arc<ScoringService<R, S>>>,
    Query(filter): Query<ActivityFilter>,
) -> Response
where
    R: ActivityRepository + 'static,
    S: ScoreSink + 'static,
{
    match service.all_activities(&filter) {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn preview_handler<R, S>(
    State(service): State<Arc<ScoringService<R, S>>>,
    Json(draft): Json<ActivityDraft>,
) -> Response
where
    R: ActivityRepository + 'static,
    S: ScoreSink + 'static,
{
    match service.preview(draft) {
        Ok(preview) => (StatusCode::OK, Json(preview)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn student_activities_handler<R, S>(
    State(service): State<Arc<ScoringService<R, S>>>,
    Path(student_id): Path<String>,
) -> Response
where
    R: ActivityRepository + 'static,
    S: ScoreSink + 'static,
{
    match service.activities_for(&StudentId(student_id)) {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_handler<R, S>(
    State(service): State<Arc<ScoringService<R, S>>>,
    Path(student_id): Path<String>,
    Json(draft): Json<ActivityDraft>,
) -> Response
where
    R: ActivityRepository + 'static,
    S: ScoreSink + 'static,
{
    match service.submit(&StudentId(student_id), draft) {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_handler<R, S>(
    State(service): State<Arc<ScoringService<R, S>>>,
    Path((student_id, activity_id)): Path<(String, String)>,
    Json(draft): Json<ActivityDraft>,
) -> Response
where
    R: ActivityRepository + 'static,
    S: ScoreSink + 'static,
{
    match service.update(&StudentId(student_id), &ActivityId(activity_id), draft) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_handler<R, S>(
    State(service): State<Arc<ScoringService<R, S>>>,
    Path((student_id, activity_id)): Path<(String, String)>,
) -> Response
where
    R: ActivityRepository + 'static,
    S: ScoreSink + 'static,
{
    match service.delete(&StudentId(student_id), &ActivityId(activity_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn score_handler<R, S>(
    State(service): State<Arc<ScoringService<R, S>>>,
    Path(student_id): Path<String>,
) -> Response
where
    R: ActivityRepository + 'static,
    S: ScoreSink + 'static,
{
    match service.score(&StudentId(student_id)) {
        Ok(score) => (StatusCode::OK, Json(score)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: ScoringServiceError) -> Response {
    let status = match &error {
        ScoringServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ScoringServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        ScoringServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, Json(payload)).into_response()
}
