use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use murmur_core::{Identity, ServiceError};

use crate::api::AppState;
use crate::model::Actor;

/// The caller of a request, resolved once from the `Identity` extension
/// the server attached.
///
/// A first-time identity is synced into a user here; requests without an
/// identity resolve to [`Actor::Anonymous`].
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Actor);

impl FromRequestParts<AppState> for CurrentActor {
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, svc: &AppState) -> Result<Self, Self::Rejection> {
        let identity = parts.extensions.get::<Identity>();
        let user = svc.sync_user(identity).map_err(ServiceError::from)?;
        Ok(CurrentActor(user.map_or(Actor::Anonymous, |u| Actor::User(u.id))))
    }
}
