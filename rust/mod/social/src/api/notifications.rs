use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};

use murmur_core::{Envelope, ServiceError};

use crate::api::{AppState, CurrentActor};
use crate::model::{MarkRead, NotificationView};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list))
        .route("/notifications/unread-count", get(unread_count))
        .route("/notifications/read", post(mark_read))
}

/// GET /social/notifications: the caller's inbox, newest first.
async fn list(
    State(svc): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> Result<Envelope<Vec<NotificationView>>, ServiceError> {
    let items = svc.get_notifications(&actor).map_err(ServiceError::from)?;
    Ok(Envelope::ok(items))
}

async fn unread_count(
    State(svc): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> Result<Envelope<serde_json::Value>, ServiceError> {
    let unread = svc.unread_count(&actor).map_err(ServiceError::from)?;
    Ok(Envelope::ok(serde_json::json!({ "unread": unread })))
}

/// POST /social/notifications/read: mark some of the caller's notifications read.
async fn mark_read(
    State(svc): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(input): Json<MarkRead>,
) -> Result<Envelope<serde_json::Value>, ServiceError> {
    let updated = svc
        .mark_notifications_read(&actor, &input.ids)
        .map_err(ServiceError::from)?;
    Ok(Envelope::ok(serde_json::json!({ "updated": updated })))
}
