//! User storage boundary
//!
//! The auth core never queries storage itself. Handlers fetch a [`UserRecord`]
//! through a [`UserStore`] and hand it over. [`MemoryUserStore`] is the
//! in-process implementation the server ships with.

use std::collections::HashMap;
use std::sync::RwLock;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{GatehouseError, GatehouseResult};
use crate::types::{Role, UserRecord};

/// Data required to create a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

/// Field changes applied by [`UserStore::update`]. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
    pub active: Option<bool>,
}

/// Lookup and persistence of user accounts
pub trait UserStore: Send + Sync {
    /// Find a user by email (case insensitive)
    fn find_by_email(&self, email: &str) -> Option<UserRecord>;

    fn find_by_id(&self, id: &str) -> Option<UserRecord>;

    /// Create a user. Fails with `Conflict` if the email is taken.
    fn insert(&self, user: NewUser) -> GatehouseResult<UserRecord>;

    fn update_password_hash(&self, id: &str, password_hash: String) -> GatehouseResult<()>;

    /// Apply `changes` and return the updated record. Fails with `NotFound`.
    fn update(&self, id: &str, changes: UserUpdate) -> GatehouseResult<UserRecord>;

    /// Soft delete: the record is kept but can no longer sign in
    fn deactivate(&self, id: &str) -> GatehouseResult<UserRecord> {
        self.update(
            id,
            UserUpdate {
                active: Some(false),
                ..UserUpdate::default()
            },
        )
    }

    /// Users ordered by creation time, oldest first
    fn list(&self, offset: usize, limit: usize) -> Vec<UserRecord>;
}

/// Thread-safe in-memory user store
#[derive(Default)]
pub struct MemoryUserStore {
    /// Maps user id -> record
    users: RwLock<HashMap<String, UserRecord>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.read().map(|users| users.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl UserStore for MemoryUserStore {
    fn find_by_email(&self, email: &str) -> Option<UserRecord> {
        let email = email.to_lowercase();
        let users = self.users.read().ok()?;
        users.values().find(|u| u.email == email).cloned()
    }

    fn find_by_id(&self, id: &str) -> Option<UserRecord> {
        let users = self.users.read().ok()?;
        users.get(id).cloned()
    }

    fn insert(&self, user: NewUser) -> GatehouseResult<UserRecord> {
        let email = user.email.trim().to_lowercase();
        if email.is_empty() {
            return Err(GatehouseError::Validation("email is required".to_string()));
        }

        let mut users = self
            .users
            .write()
            .map_err(|_| GatehouseError::Internal("user store lock poisoned".to_string()))?;

        if users.values().any(|u| u.email == email) {
            return Err(GatehouseError::Conflict("user already exists".to_string()));
        }

        let now = OffsetDateTime::now_utc();
        let record = UserRecord {
            id: Uuid::new_v4().to_string(),
            email,
            password_hash: user.password_hash,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            active: true,
            created_at: now,
            updated_at: now,
        };
        users.insert(record.id.clone(), record.clone());

        tracing::debug!(user_id = %record.id, total_users = users.len(), "user created");

        Ok(record)
    }

    fn update_password_hash(&self, id: &str, password_hash: String) -> GatehouseResult<()> {
        let mut users = self
            .users
            .write()
            .map_err(|_| GatehouseError::Internal("user store lock poisoned".to_string()))?;

        let user = users
            .get_mut(id)
            .ok_or_else(|| GatehouseError::NotFound(format!("user {id}")))?;
        user.password_hash = password_hash;
        user.updated_at = OffsetDateTime::now_utc();
        Ok(())
    }

    fn update(&self, id: &str, changes: UserUpdate) -> GatehouseResult<UserRecord> {
        let mut users = self
            .users
            .write()
            .map_err(|_| GatehouseError::Internal("user store lock poisoned".to_string()))?;

        let user = users
            .get_mut(id)
            .ok_or_else(|| GatehouseError::NotFound(format!("user {id}")))?;

        if let Some(first_name) = changes.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            user.last_name = last_name;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        if let Some(active) = changes.active {
            user.active = active;
        }
        user.updated_at = OffsetDateTime::now_utc();

        tracing::debug!(user_id = %user.id, role = %user.role, active = user.active, "user updated");

        Ok(user.clone())
    }

    fn list(&self, offset: usize, limit: usize) -> Vec<UserRecord> {
        let Ok(users) = self.users.read() else {
            return Vec::new();
        };
        let mut all: Vec<UserRecord> = users.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        all.into_iter().skip(offset).take(limit).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "$argon2id$placeholder".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            role: Role::User,
        }
    }

    #[test]
    fn test_insert_and_lookup() {
        let store = MemoryUserStore::new();
        let created = store.insert(new_user("Ada@Example.com")).unwrap();

        assert_eq!(created.email, "ada@example.com");
        assert!(created.active);
        assert_eq!(store.len(), 1);

        let by_email = store.find_by_email("ADA@example.com").unwrap();
        assert_eq!(by_email.id, created.id);

        let by_id = store.find_by_id(&created.id).unwrap();
        assert_eq!(by_id.email, "ada@example.com");
        assert!(store.find_by_id("missing").is_none());
    }

    #[test]
    fn test_duplicate_email_conflicts() {
        let store = MemoryUserStore::new();
        store.insert(new_user("a@x.com")).unwrap();

        let result = store.insert(new_user("A@X.COM"));
        assert!(matches!(result, Err(GatehouseError::Conflict(_))));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_empty_email_rejected() {
        let store = MemoryUserStore::new();
        assert!(matches!(
            store.insert(new_user("   ")),
            Err(GatehouseError::Validation(_))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_update_password_hash() {
        let store = MemoryUserStore::new();
        let user = store.insert(new_user("a@x.com")).unwrap();

        store
            .update_password_hash(&user.id, "$argon2id$new".to_string())
            .unwrap();
        assert_eq!(store.find_by_id(&user.id).unwrap().password_hash, "$argon2id$new");

        assert!(matches!(
            store.update_password_hash("missing", String::new()),
            Err(GatehouseError::NotFound(_))
        ));
    }

    #[test]
    fn test_update_changes_only_given_fields() {
        let store = MemoryUserStore::new();
        let user = store.insert(new_user("a@x.com")).unwrap();

        let updated = store
            .update(
                &user.id,
                UserUpdate {
                    last_name: Some("Byron".to_string()),
                    role: Some(Role::Admin),
                    ..UserUpdate::default()
                },
            )
            .unwrap();

        assert_eq!(updated.first_name, "Ada");
        assert_eq!(updated.last_name, "Byron");
        assert_eq!(updated.role, Role::Admin);
        assert!(updated.active);
        assert_eq!(store.find_by_id(&user.id).unwrap().role, Role::Admin);

        assert!(matches!(
            store.update("missing", UserUpdate::default()),
            Err(GatehouseError::NotFound(_))
        ));
    }

    #[test]
    fn test_deactivate_keeps_record() {
        let store = MemoryUserStore::new();
        let user = store.insert(new_user("a@x.com")).unwrap();

        let deactivated = store.deactivate(&user.id).unwrap();
        assert!(!deactivated.active);

        let stored = store.find_by_email("a@x.com").unwrap();
        assert!(!stored.active);
        assert_eq!(store.len(), 1);
        assert!(matches!(
            store.deactivate("missing"),
            Err(GatehouseError::NotFound(_))
        ));
    }

    #[test]
    fn test_list_paginates() {
        let store = MemoryUserStore::new();
        for i in 0..5 {
            store.insert(new_user(&format!("user{i}@x.com"))).unwrap();
        }

        assert_eq!(store.list(0, 10).len(), 5);
        assert_eq!(store.list(0, 2).len(), 2);
        assert_eq!(store.list(4, 10).len(), 1);
        assert!(store.list(5, 10).is_empty());
    }
}
