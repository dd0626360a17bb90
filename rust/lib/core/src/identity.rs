//! Caller identity as supplied by the external identity provider.
//!
//! The server binary decodes the provider's token and attaches an
//! [`Identity`] to the request. Modules never verify credentials
//! themselves; they only map the external id to their own records.

use serde::{Deserialize, Serialize};

/// Profile fields the identity provider knows about a user.
///
/// Only consulted the first time an external id is seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileHints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    /// Preferred handle. Derived from the email when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Avatar image reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// An authenticated caller: the provider's stable user id plus hints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub external_id: String,

    #[serde(default)]
    pub hints: ProfileHints,
}

impl Identity {
    pub fn new(external_id: impl Into<String>) -> Self {
        Self {
            external_id: external_id.into(),
            hints: ProfileHints::default(),
        }
    }

    pub fn with_hints(mut self, hints: ProfileHints) -> Self {
        self.hints = hints;
        self
    }
}
