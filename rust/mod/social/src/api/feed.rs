use axum::extract::{Query, State};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use murmur_core::{Envelope, ServiceError};

use crate::api::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/feed/revision", get(revision))
}

#[derive(Debug, Deserialize)]
struct RevisionQuery {
    #[serde(default = "root_path")]
    path: String,
}

fn root_path() -> String {
    "/".to_string()
}

/// GET /social/feed/revision?path=/: bumped every time the view at `path` changes.
async fn revision(
    State(svc): State<AppState>,
    Query(q): Query<RevisionQuery>,
) -> Result<Envelope<serde_json::Value>, ServiceError> {
    let revision = svc.feed_revision(&q.path).map_err(ServiceError::from)?;
    Ok(Envelope::ok(serde_json::json!({ "path": q.path, "revision": revision })))
}
