use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Router;

use murmur_core::{Envelope, ServiceError};

use crate::api::{AppState, CurrentActor};
use crate::model::{FollowToggle, SuggestedUser, UserSummary};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/suggestions", get(suggestions))
        .route("/users/{id}/follow", post(toggle_follow))
        .route("/users/{id}/following-state", get(following_state))
        .route("/users/{id}/followers", get(followers))
        .route("/users/{id}/following", get(following))
}

/// GET /social/users/suggestions: people the caller might follow.
async fn suggestions(
    State(svc): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> Result<Envelope<Vec<SuggestedUser>>, ServiceError> {
    let users = svc.get_random_users(&actor).map_err(ServiceError::from)?;
    Ok(Envelope::ok(users))
}

async fn toggle_follow(
    State(svc): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> Result<Envelope<FollowToggle>, ServiceError> {
    let outcome = svc.toggle_follow(&actor, &id).map_err(ServiceError::from)?;
    Ok(Envelope::ok(outcome))
}

/// GET /social/users/{id}/following-state: whether the caller follows `id`.
async fn following_state(
    State(svc): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> Result<Envelope<FollowToggle>, ServiceError> {
    let following = match actor.id() {
        Some(me) => svc.is_following(me, &id).map_err(ServiceError::from)?,
        None => false,
    };
    Ok(Envelope::ok(FollowToggle { following }))
}

async fn followers(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Envelope<Vec<UserSummary>>, ServiceError> {
    let users = svc.list_followers(&id).map_err(ServiceError::from)?;
    Ok(Envelope::ok(users))
}

async fn following(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Envelope<Vec<UserSummary>>, ServiceError> {
    let users = svc.list_following(&id).map_err(ServiceError::from)?;
    Ok(Envelope::ok(users))
}
