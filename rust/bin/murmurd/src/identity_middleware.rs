//! Identity provider token middleware.
//!
//! Decodes `Authorization: Bearer <jwt>` issued by the identity provider
//! and attaches the caller's [`Identity`] to the request. Requests without
//! the header pass through anonymously; a header that does not hold a
//! valid token is rejected with 401.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use murmur_core::{Identity, ProfileHints, ServiceError};

use crate::config::IdentityConfig;

/// Claims the identity provider puts in its tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// External user id.
    pub sub: String,
    /// Expiration (unix timestamp).
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Claims {
    pub fn into_identity(self) -> Identity {
        Identity::new(self.sub).with_hints(ProfileHints {
            first_name: self.first_name,
            last_name: self.last_name,
            username: self.username,
            email: self.email,
            image_url: self.image_url,
        })
    }
}

/// Shared token verification settings for the middleware.
#[derive(Clone)]
pub struct IdentityState {
    pub decoding_key: DecodingKey,
    pub validation: Validation,
}

impl IdentityState {
    pub fn from_config(config: &IdentityConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }
        Self {
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        }
    }
}

pub async fn identity_middleware(
    State(state): State<Arc<IdentityState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let Some(header) = request.headers().get(AUTHORIZATION) else {
        return Ok(next.run(request).await);
    };

    let token = header
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ServiceError::Unauthenticated("expected a bearer token".into()))?;

    let token_data =
        jsonwebtoken::decode::<Claims>(token, &state.decoding_key, &state.validation).map_err(
            |e| {
                debug!("rejected identity token: {}", e);
                ServiceError::Unauthenticated(format!("invalid token: {}", e))
            },
        )?;

    request
        .extensions_mut()
        .insert(token_data.claims.into_identity());
    Ok(next.run(request).await)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use axum::Router;
    use axum::body::Body;
    use axum::extract::Extension;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use jsonwebtoken::{EncodingKey, Header};
    use tower::ServiceExt;

    use super::*;

    pub(crate) fn token(secret: &str, claims: &Claims) -> String {
        jsonwebtoken::encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    pub(crate) fn claims(sub: &str, ttl_secs: i64) -> Claims {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64;
        Claims {
            sub: sub.to_string(),
            exp: now + ttl_secs,
            iss: None,
            first_name: None,
            last_name: None,
            username: Some(sub.trim_start_matches("ext_").to_string()),
            email: None,
            image_url: None,
        }
    }

    fn app(issuer: Option<&str>) -> Router {
        let state = Arc::new(IdentityState::from_config(&IdentityConfig {
            secret: "s3cret".into(),
            issuer: issuer.map(str::to_string),
        }));
        Router::new()
            .route(
                "/whoami",
                get(|identity: Option<Extension<Identity>>| async move {
                    identity.map_or("anonymous".to_string(), |Extension(i)| i.external_id)
                }),
            )
            .layer(axum::middleware::from_fn_with_state(state, identity_middleware))
    }

    async fn whoami(app: &Router, authorization: Option<String>) -> (StatusCode, String) {
        let mut builder = Request::builder().uri("/whoami");
        if let Some(value) = authorization {
            builder = builder.header("authorization", value);
        }
        let resp = app
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn missing_header_is_anonymous() {
        let (status, body) = whoami(&app(None), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "anonymous");
    }

    #[tokio::test]
    async fn valid_token_attaches_identity() {
        let bearer = format!("Bearer {}", token("s3cret", &claims("ext_alice", 3600)));
        let (status, body) = whoami(&app(None), Some(bearer)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ext_alice");
    }

    #[tokio::test]
    async fn bad_tokens_are_rejected() {
        let app = app(None);
        let cases = [
            format!("Bearer {}", token("wrong", &claims("ext_alice", 3600))),
            format!("Bearer {}", token("s3cret", &claims("ext_alice", -3600))),
            "Bearer not-a-jwt".to_string(),
            "Basic YWxpY2U6cHc=".to_string(),
        ];
        for authorization in cases {
            let (status, body) = whoami(&app, Some(authorization)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            let json: serde_json::Value = serde_json::from_str(&body).unwrap();
            assert_eq!(json["success"], false);
            assert_eq!(json["code"], "UNAUTHENTICATED");
        }
    }

    #[tokio::test]
    async fn issuer_is_checked_when_configured() {
        let app = app(Some("https://id.example.com"));

        let mut good = claims("ext_alice", 3600);
        good.iss = Some("https://id.example.com".into());
        let (status, _) = whoami(&app, Some(format!("Bearer {}", token("s3cret", &good)))).await;
        assert_eq!(status, StatusCode::OK);

        let mut other = claims("ext_alice", 3600);
        other.iss = Some("https://evil.example.com".into());
        let (status, _) = whoami(&app, Some(format!("Bearer {}", token("s3cret", &other)))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn claims_carry_profile_hints() {
        let mut c = claims("ext_bob", 60);
        c.email = Some("bob@example.com".into());
        c.image_url = Some("img/bob.png".into());
        let identity = c.into_identity();
        assert_eq!(identity.external_id, "ext_bob");
        assert_eq!(identity.hints.username.as_deref(), Some("bob"));
        assert_eq!(identity.hints.email.as_deref(), Some("bob@example.com"));
        assert_eq!(identity.hints.image_url.as_deref(), Some("img/bob.png"));
    }
}
