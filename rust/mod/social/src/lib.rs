//! Social interaction and notification engine.
//!
//! Users post, comment, like posts and follow each other; likes, comments
//! and follows fan out notifications to the affected user. Every
//! multi-write operation runs as one unit of work against the SQL store.

pub mod api;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;
use murmur_core::Module;
use murmur_kv::KVStore;
use murmur_sql::SQLStore;

use service::{SocialConfig, SocialError, SocialService};

/// Social Module: feed, reactions, follows and notifications.
pub struct SocialModule {
    service: Arc<SocialService>,
}

impl SocialModule {
    pub fn new(
        sql: Arc<dyn SQLStore>,
        kv: Arc<dyn KVStore>,
        config: SocialConfig,
    ) -> Result<Self, SocialError> {
        Ok(Self {
            service: SocialService::new(sql, kv, config)?,
        })
    }

    pub fn service(&self) -> &Arc<SocialService> {
        &self.service
    }
}

impl Module for SocialModule {
    fn name(&self) -> &str {
        "social"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone())
    }
}
