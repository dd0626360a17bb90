mod actor;
mod feed;
mod me;
mod notifications;
mod posts;
mod profiles;
mod users;

use std::sync::Arc;

use axum::Router;

use crate::service::SocialService;

pub use actor::CurrentActor;

/// Shared application state.
pub type AppState = Arc<SocialService>;

/// Build the complete social API router.
///
/// All routes are relative. The caller nests them under `/social`.
/// Callers are identified by an `Identity` request extension, which the
/// server attaches after checking the provider's token.
pub fn build_router(svc: AppState) -> Router {
    Router::new()
        .merge(me::routes())
        .merge(posts::routes())
        .merge(users::routes())
        .merge(profiles::routes())
        .merge(notifications::routes())
        .merge(feed::routes())
        .with_state(svc)
}
