use axum::extract::{Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;

use crate::response::ok;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub(super) struct ProgressQuery {
    profile: Option<String>,
}

pub(super) async fn show(
    State(state): State<AppState>,
    Query(query): Query<ProgressQuery>,
) -> impl IntoResponse {
    ok(state.sessions().progress(query.profile.as_deref()))
}
