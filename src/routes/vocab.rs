use axum::extract::State;
use axum::Json;

use crate::services::vocab::VocabPayload;
use crate::state::AppState;

/// Always 200: an unreachable or unconfigured source yields the fallback list.
pub(super) async fn list(State(state): State<AppState>) -> Json<VocabPayload> {
    Json(state.fetcher().fetch().await)
}
