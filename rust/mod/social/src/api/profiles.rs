use axum::extract::{Path, State};
use axum::routing::get;
use axum::Router;

use murmur_core::{Envelope, ServiceError};

use crate::api::{AppState, CurrentActor};
use crate::model::{PostView, UserProfile};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/profiles/{handle}", get(profile))
        .route("/profiles/{handle}/posts", get(posts))
        .route("/profiles/{handle}/likes", get(liked_posts))
}

async fn profile(
    State(svc): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Envelope<UserProfile>, ServiceError> {
    let profile = svc.get_profile_by_handle(&handle).map_err(ServiceError::from)?;
    Ok(Envelope::ok(profile))
}

async fn posts(
    State(svc): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(handle): Path<String>,
) -> Result<Envelope<Vec<PostView>>, ServiceError> {
    let posts = svc.get_user_posts(&handle, &actor).map_err(ServiceError::from)?;
    Ok(Envelope::ok(posts))
}

async fn liked_posts(
    State(svc): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(handle): Path<String>,
) -> Result<Envelope<Vec<PostView>>, ServiceError> {
    let posts = svc
        .get_user_liked_posts(&handle, &actor)
        .map_err(ServiceError::from)?;
    Ok(Envelope::ok(posts))
}
