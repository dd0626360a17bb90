use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use murmur_core::{Envelope, ServiceError};

use crate::api::{AppState, CurrentActor};
use crate::model::{Comment, CreateComment, CreatePost, LikeToggle, Post, PostView, UserSummary};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/{id}", get(get_post).delete(delete_post))
        .route("/posts/{id}/like", post(toggle_like))
        .route("/posts/{id}/likes", get(list_likers))
        .route("/posts/{id}/comments", post(create_comment))
}

/// GET /social/posts: the whole feed, newest first.
async fn list_posts(
    State(svc): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> Result<Envelope<Vec<PostView>>, ServiceError> {
    let posts = svc.get_posts(&actor).map_err(ServiceError::from)?;
    Ok(Envelope::ok(posts))
}

async fn create_post(
    State(svc): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(input): Json<CreatePost>,
) -> Result<(StatusCode, Envelope<Post>), ServiceError> {
    let post = svc.create_post(&actor, input).map_err(ServiceError::from)?;
    Ok((StatusCode::CREATED, Envelope::ok(post)))
}

async fn get_post(
    State(svc): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> Result<Envelope<PostView>, ServiceError> {
    let view = svc.get_post(&id, &actor).map_err(ServiceError::from)?;
    Ok(Envelope::ok(view))
}

async fn delete_post(
    State(svc): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> Result<Envelope<()>, ServiceError> {
    svc.delete_post(&actor, &id).map_err(ServiceError::from)?;
    Ok(Envelope::done())
}

async fn toggle_like(
    State(svc): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> Result<Envelope<LikeToggle>, ServiceError> {
    let outcome = svc.toggle_like(&actor, &id).map_err(ServiceError::from)?;
    Ok(Envelope::ok(outcome))
}

async fn list_likers(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Envelope<Vec<UserSummary>>, ServiceError> {
    let likers = svc.get_post_likers(&id).map_err(ServiceError::from)?;
    Ok(Envelope::ok(likers))
}

async fn create_comment(
    State(svc): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    Json(input): Json<CreateComment>,
) -> Result<(StatusCode, Envelope<Comment>), ServiceError> {
    let comment = svc
        .create_comment(&actor, &id, &input.content)
        .map_err(ServiceError::from)?;
    Ok((StatusCode::CREATED, Envelope::ok(comment)))
}
