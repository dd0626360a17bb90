//! Route registration: collects all module routes + system endpoints.

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::get;

use crate::identity_middleware::{self, IdentityState};

/// Build the complete router with all routes.
///
/// Every request passes through the identity middleware; module handlers
/// decide for themselves whether an anonymous caller is acceptable.
pub fn build_router(identity: Arc<IdentityState>, module_routes: Vec<(&str, Router)>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/version", get(version));

    // Mount each module's routes under /{module_name}.
    for (name, router) in module_routes {
        app = app.nest(&format!("/{}", name), router);
    }

    app.layer(middleware::from_fn_with_state(
        identity,
        identity_middleware::identity_middleware,
    ))
}

async fn health() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
    }))
}

async fn version() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": "murmurd",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use murmur_core::Module;
    use murmur_kv::{KVStore, RedbStore};
    use murmur_social::SocialModule;
    use murmur_social::service::SocialConfig;
    use murmur_sql::{SQLStore, SqliteStore};

    use super::*;
    use crate::config::IdentityConfig;
    use crate::identity_middleware::tests::{claims, token};

    fn app(dir: &tempfile::TempDir) -> Router {
        let sql: Arc<dyn SQLStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let kv: Arc<dyn KVStore> = Arc::new(RedbStore::open(&dir.path().join("kv.redb")).unwrap());
        let social = SocialModule::new(sql, kv, SocialConfig::default()).unwrap();
        let identity = Arc::new(IdentityState::from_config(&IdentityConfig {
            secret: "s3cret".into(),
            issuer: None,
        }));
        build_router(identity, vec![(social.name(), social.routes())])
    }

    async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        bearer: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(t) = bearer {
            builder = builder.header("authorization", format!("Bearer {t}"));
        }
        if body.is_some() {
            builder = builder.header("content-type", "application/json");
        }
        let body = match body {
            Some(v) => Body::from(serde_json::to_string(&v).unwrap()),
            None => Body::empty(),
        };
        let resp = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(json!(null));
        (status, json)
    }

    #[tokio::test]
    async fn system_endpoints() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);

        let (status, body) = call(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (_, body) = call(&app, "GET", "/version", None, None).await;
        assert_eq!(body["name"], "murmurd");
    }

    #[tokio::test]
    async fn token_holder_can_post() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);
        let alice = token("s3cret", &claims("ext_alice", 3600));

        let (status, body) = call(
            &app,
            "POST",
            "/social/posts",
            Some(&alice),
            Some(json!({"content": "hello"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);

        let (status, body) = call(&app, "GET", "/social/posts", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["content"], "hello");
        assert_eq!(body["data"][0]["author"]["handle"], "alice");

        let (status, body) = call(&app, "GET", "/social/posts", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHENTICATED");
    }
}
