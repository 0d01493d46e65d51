use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use uuid::Uuid;

use crate::response::{ok, AppError};
use crate::services::sessions::SessionOptions;
use crate::session::{Action, Outcome, SessionSnapshot};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/:id", get(show).delete(remove))
        .route("/:id/actions", post(apply))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatedSession {
    session_id: Uuid,
    snapshot: SessionSnapshot,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ActionResult {
    outcome: Outcome,
    snapshot: SessionSnapshot,
}

#[derive(Debug, Serialize)]
struct Deleted {
    deleted: bool,
}

async fn create(
    State(state): State<AppState>,
    body: Option<Json<SessionOptions>>,
) -> Result<Response, AppError> {
    let options = body.map(|Json(options)| options).unwrap_or_default();
    let payload = state.fetcher().fetch().await;

    let (session_id, snapshot) = state.sessions().create(payload, options, today())?;
    Ok((
        StatusCode::CREATED,
        ok(CreatedSession {
            session_id,
            snapshot,
        }),
    )
        .into_response())
}

async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let snapshot = state.sessions().snapshot(id, today()).await?;
    Ok(ok(snapshot))
}

async fn apply(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Action>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let Json(action) = body.map_err(|rejection| AppError::validation(rejection.body_text()))?;

    let (outcome, snapshot) = state.sessions().apply(id, action, today()).await?;
    Ok(ok(ActionResult { outcome, snapshot }))
}

async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    if !state.sessions().remove(id) {
        return Err(AppError::not_found(format!("session {id} not found")));
    }
    Ok(ok(Deleted { deleted: true }))
}

fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::not_found(format!("session {raw} not found")))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
