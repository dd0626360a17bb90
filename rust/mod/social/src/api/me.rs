use axum::extract::{Extension, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use murmur_core::{Envelope, Identity, ServiceError};

use crate::api::{AppState, CurrentActor};
use crate::model::{User, UserProfile};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sync", post(sync))
        .route("/me", get(me).patch(update_me))
        .route("/me/id", get(my_id))
}

/// POST /social/sync: create the caller's user on first contact.
async fn sync(
    State(svc): State<AppState>,
    identity: Option<Extension<Identity>>,
) -> Result<Envelope<User>, ServiceError> {
    let Some(Extension(identity)) = identity else {
        return Err(ServiceError::Unauthenticated("sign in required".into()));
    };
    let user = svc.resolve_or_create(&identity).map_err(ServiceError::from)?;
    Ok(Envelope::ok(user))
}

/// GET /social/me/id: internal id of the caller, null when anonymous.
///
/// Never creates a user; an identity that was never synced is not found.
async fn my_id(
    State(svc): State<AppState>,
    identity: Option<Extension<Identity>>,
) -> Result<Envelope<serde_json::Value>, ServiceError> {
    let external_id = identity.as_ref().map(|i| i.external_id.as_str());
    let actor = svc.resolve_actor(external_id).map_err(ServiceError::from)?;
    Ok(Envelope::ok(serde_json::json!({ "user_id": actor.id() })))
}

async fn me(
    State(svc): State<AppState>,
    identity: Option<Extension<Identity>>,
) -> Result<Envelope<UserProfile>, ServiceError> {
    let Some(Extension(identity)) = identity else {
        return Err(ServiceError::Unauthenticated("sign in required".into()));
    };
    let profile = svc
        .get_user_by_external_id(&identity.external_id)
        .map_err(ServiceError::from)?;
    Ok(Envelope::ok(profile))
}

/// PATCH /social/me: merge-patch the caller's editable profile fields.
async fn update_me(
    State(svc): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(patch): Json<serde_json::Value>,
) -> Result<Envelope<User>, ServiceError> {
    let user = svc.update_profile(&actor, patch).map_err(ServiceError::from)?;
    Ok(Envelope::ok(user))
}
