//! In-memory store adapter.
//!
//! Reference implementation of the store traits over hash maps. Used by
//! the integration tests and handy for embedding in tools that do not
//! need durable accounts. All guarantees (email uniqueness, expiry
//! filtering) are enforced here exactly as a database-backed adapter
//! would enforce them.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::store::{
    ProfileUpdate, RefreshTokenRecord, RefreshTokenStore, StoreError, User, UserStore,
};

#[derive(Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    tokens: RwLock<HashMap<String, RefreshTokenRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn insert_user(&self, email: &str, password_hash: &str) -> Result<User, StoreError> {
        let mut users = self.users.write().await;

        // uniqueness check and insert under one write lock
        if users.values().any(|u| u.email == email) {
            return Err(StoreError::Duplicate(format!(
                "email {} is already registered",
                email
            )));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            first_name: None,
            last_name: None,
            dob: None,
            address: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn update_profile(
        &self,
        email: &str,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().await;
        let Some(user) = users.values_mut().find(|u| u.email == email) else {
            return Ok(None);
        };

        user.first_name = Some(update.first_name.clone());
        user.last_name = Some(update.last_name.clone());
        user.dob = Some(update.dob);
        user.address = Some(update.address.clone());
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryStore {
    async fn insert(&self, record: RefreshTokenRecord) -> Result<(), StoreError> {
        let mut tokens = self.tokens.write().await;
        tokens.insert(record.fingerprint.clone(), record);
        Ok(())
    }

    async fn find_valid(
        &self,
        fingerprint: &str,
    ) -> Result<Option<RefreshTokenRecord>, StoreError> {
        let tokens = self.tokens.read().await;
        let now = Utc::now();
        Ok(tokens
            .get(fingerprint)
            .filter(|record| record.expires_at > now)
            .cloned())
    }

    async fn delete(&self, fingerprint: &str) -> Result<u64, StoreError> {
        let mut tokens = self.tokens.write().await;
        Ok(tokens.remove(fingerprint).map_or(0, |_| 1))
    }

    async fn delete_expired(&self) -> Result<u64, StoreError> {
        let mut tokens = self.tokens.write().await;
        let now = Utc::now();
        let before = tokens.len();
        tokens.retain(|_, record| record.expires_at > now);
        Ok((before - tokens.len()) as u64)
    }

    async fn delete_all_for_user(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, record| record.user_id != user_id);
        Ok((before - tokens.len()) as u64)
    }
}
