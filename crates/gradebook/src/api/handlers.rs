//! HTTP request handlers for the student routes.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde_json::Value;

use super::ApiState;
use crate::error::Result;
use crate::student::{StudentId, StudentPayload, StudentRecord};

/// Build the `/students` routes.
pub fn student_routes() -> Router<ApiState> {
    Router::new()
        .route("/students", get(list_students).post(create_student))
        .route("/students/{id}", put(update_student).delete(delete_student))
}

async fn list_students(State(state): State<ApiState>) -> Result<Json<Vec<StudentRecord>>> {
    Ok(Json(state.gateway.list().await?))
}

async fn create_student(
    State(state): State<ApiState>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<StudentRecord>)> {
    let Json(body) = body?;
    let student = StudentPayload::from_value(body)?.into_new_student()?;
    let record = state.gateway.create(student).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn update_student(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<StudentRecord>> {
    let Json(body) = body?;
    let scores = StudentPayload::from_value(body)?.into_scores()?;
    let record = state.gateway.update(&StudentId::from(id), scores).await?;
    Ok(Json(record))
}

async fn delete_student(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    state.gateway.delete(&StudentId::from(id)).await?;
    Ok(Json(serde_json::json!({ "message": "Student deleted" })))
}
