//! Identity resolver: maps external identities to internal users.

use tracing::{debug, info};

use murmur_core::{Identity, ProfileHints, merge_patch, new_id, now_rfc3339};
use murmur_sql::Value;

use crate::model::{Actor, User, UserProfile};
use crate::service::records::{count, find_record, get_record, insert_record, update_record};
use crate::service::{SocialError, SocialService, require_user};

/// Profile fields a user may change about themselves.
const EDITABLE_PROFILE_FIELDS: &[&str] = &["name", "bio", "location", "website"];

impl SocialService {
    /// Return the user for `identity`, creating it on first contact.
    ///
    /// An existing user is returned unchanged. Concurrent first-contact
    /// calls for the same external id all return the same user: the loser
    /// of the insert race reads back the winner's row.
    pub fn resolve_or_create(&self, identity: &Identity) -> Result<User, SocialError> {
        let external_id = identity.external_id.trim();
        if external_id.is_empty() {
            return Err(SocialError::Validation("external id is required".into()));
        }

        if let Some(user) = self.find_user_by_external_id(external_id)? {
            return Ok(user);
        }

        let hints = &identity.hints;
        let base_handle = derive_handle(external_id, hints);
        let mut user = User {
            id: new_id(),
            external_id: external_id.to_string(),
            name: display_name(hints, &base_handle),
            handle: base_handle.clone(),
            email: non_empty(hints.email.as_deref()),
            avatar: non_empty(hints.image_url.as_deref()),
            bio: None,
            location: None,
            website: None,
            created_at: now_rfc3339(),
        };

        // First try the derived handle, then a suffixed one if it is taken.
        let mut attempt = 0;
        loop {
            if attempt > 0 || self.handle_taken(&base_handle)? {
                user.handle = format!("{}_{}", base_handle, &user.id[..6]);
            }

            match self.insert_user(&user) {
                Ok(()) => {
                    info!(user_id = %user.id, handle = %user.handle, "created user on first contact");
                    return Ok(user);
                }
                Err(e) => {
                    if let Some(existing) = self.find_user_by_external_id(external_id)? {
                        debug!(user_id = %existing.id, "lost first-contact race, using existing user");
                        return Ok(existing);
                    }
                    // The plain handle was claimed concurrently; retry once with the suffix.
                    if attempt > 0 || !self.handle_taken(&user.handle)? {
                        return Err(e);
                    }
                    attempt += 1;
                }
            }
        }
    }

    /// Identity resolver entry point for a request: `None` when no identity
    /// was presented.
    pub fn sync_user(&self, identity: Option<&Identity>) -> Result<Option<User>, SocialError> {
        identity.map(|i| self.resolve_or_create(i)).transpose()
    }

    /// Resolve the internal user id of the caller without creating anything.
    ///
    /// No external id means [`Actor::Anonymous`]; an external id that was
    /// never synced is `NotFound`.
    pub fn resolve_actor(&self, external_id: Option<&str>) -> Result<Actor, SocialError> {
        let Some(external_id) = external_id else {
            return Ok(Actor::Anonymous);
        };
        let user = self.find_user_by_external_id(external_id)?.ok_or_else(|| {
            SocialError::NotFound(format!("no user for external id '{}'", external_id))
        })?;
        Ok(Actor::User(user.id))
    }

    pub fn find_user_by_external_id(&self, external_id: &str) -> Result<Option<User>, SocialError> {
        find_record(self.sql.as_ref(), "users", "external_id", external_id)
    }

    /// Get a user by internal id.
    pub fn get_user(&self, id: &str) -> Result<User, SocialError> {
        get_record(self.sql.as_ref(), "users", id)
    }

    /// User with follower/following/post counts, by external id.
    pub fn get_user_by_external_id(&self, external_id: &str) -> Result<UserProfile, SocialError> {
        let user = self.find_user_by_external_id(external_id)?.ok_or_else(|| {
            SocialError::NotFound(format!("no user for external id '{}'", external_id))
        })?;
        self.profile_of(user)
    }

    /// User with follower/following/post counts, by handle.
    pub fn get_profile_by_handle(&self, handle: &str) -> Result<UserProfile, SocialError> {
        let user = self.get_user_by_handle(handle)?;
        self.profile_of(user)
    }

    pub fn get_user_by_handle(&self, handle: &str) -> Result<User, SocialError> {
        find_record(self.sql.as_ref(), "users", "handle", handle)?
            .ok_or_else(|| SocialError::NotFound(format!("user '@{}'", handle)))
    }

    /// Update the caller's own profile with JSON merge-patch semantics.
    ///
    /// Only name, bio, location and website can be changed.
    pub fn update_profile(
        &self,
        actor: &Actor,
        patch: serde_json::Value,
    ) -> Result<User, SocialError> {
        let actor_id = require_user(actor)?;

        let Some(fields) = patch.as_object() else {
            return Err(SocialError::Validation("profile patch must be an object".into()));
        };
        if let Some(field) = fields
            .keys()
            .find(|k| !EDITABLE_PROFILE_FIELDS.contains(&k.as_str()))
        {
            return Err(SocialError::Validation(format!("field '{}' is not editable", field)));
        }
        if fields.get("name").is_some_and(|n| n.is_null()) {
            return Err(SocialError::Validation("name cannot be removed".into()));
        }

        let current = self.get_user(actor_id)?;
        let mut base =
            serde_json::to_value(&current).map_err(|e| SocialError::Internal(e.to_string()))?;
        merge_patch(&mut base, &patch);
        let updated: User = serde_json::from_value(base)
            .map_err(|e| SocialError::Validation(format!("invalid profile: {}", e)))?;

        if updated.name.trim().is_empty() {
            return Err(SocialError::Validation("name cannot be empty".into()));
        }

        update_record(
            self.sql.as_ref(),
            "users",
            actor_id,
            &updated,
            &[("name", Value::Text(updated.name.clone()))],
        )?;
        self.invalidate(&format!("/profile/{}", updated.handle));
        Ok(updated)
    }

    fn profile_of(&self, user: User) -> Result<UserProfile, SocialError> {
        let db = self.sql.as_ref();
        let id = [Value::Text(user.id.clone())];
        let followers = count(
            db,
            "SELECT COUNT(*) AS cnt FROM follows WHERE following_id = ?1",
            &id,
        )?;
        let following = count(
            db,
            "SELECT COUNT(*) AS cnt FROM follows WHERE follower_id = ?1",
            &id,
        )?;
        let posts = count(db, "SELECT COUNT(*) AS cnt FROM posts WHERE author_id = ?1", &id)?;
        Ok(UserProfile {
            user,
            followers,
            following,
            posts,
        })
    }

    fn handle_taken(&self, handle: &str) -> Result<bool, SocialError> {
        Ok(find_record::<_, User>(self.sql.as_ref(), "users", "handle", handle)?.is_some())
    }

    fn insert_user(&self, user: &User) -> Result<(), SocialError> {
        insert_record(
            self.sql.as_ref(),
            "users",
            &user.id,
            user,
            &[
                ("external_id", Value::Text(user.external_id.clone())),
                ("handle", Value::Text(user.handle.clone())),
                ("name", Value::Text(user.name.clone())),
                ("created_at", Value::Text(user.created_at.clone())),
            ],
        )
    }
}

/// Preferred username, else the email local-part, else a handle built
/// from the external id.
fn derive_handle(external_id: &str, hints: &ProfileHints) -> String {
    if let Some(username) = non_empty(hints.username.as_deref()) {
        return username;
    }
    if let Some(local) = hints
        .email
        .as_deref()
        .and_then(|e| e.split('@').next())
        .and_then(|l| non_empty(Some(l)))
    {
        return local;
    }
    let tail: String = external_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(8)
        .collect();
    format!("user_{}", tail.to_ascii_lowercase())
}

fn display_name(hints: &ProfileHints, handle: &str) -> String {
    let name = format!(
        "{} {}",
        hints.first_name.as_deref().unwrap_or(""),
        hints.last_name.as_deref().unwrap_or("")
    );
    match name.trim() {
        "" => handle.to_string(),
        trimmed => trimmed.to_string(),
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
