use serde::Serialize;

/// The caller of an operation, resolved once per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Actor {
    /// No identity was presented.
    Anonymous,
    /// An internal user id.
    User(String),
}

impl Actor {
    pub fn user(id: impl Into<String>) -> Self {
        Actor::User(id.into())
    }

    /// The user id, if any.
    pub fn id(&self) -> Option<&str> {
        match self {
            Actor::Anonymous => None,
            Actor::User(id) => Some(id.as_str()),
        }
    }
}
