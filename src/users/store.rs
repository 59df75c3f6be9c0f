use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::model::{NewUser, User, UserChanges};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email or mobile already in use")]
    Duplicate,

    #[error("user not found")]
    NotFound,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Filter and page window for a directory scan.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    /// Case-insensitive substring matched against first name, last name or
    /// email. `None` matches everything.
    pub search: Option<String>,
    pub page: u32,
    pub limit: u32,
}

impl ListQuery {
    pub fn offset(&self) -> i64 {
        (i64::from(self.page.max(1)) - 1) * i64::from(self.limit)
    }
}

#[derive(Debug, Clone)]
pub struct UserPage {
    pub users: Vec<User>,
    pub total: u64,
}

/// Storage adapter for the user directory, independent of the data engine.
///
/// Uniqueness of email and mobile is the implementation's job: concurrent
/// creates with the same value race at this layer and exactly one wins.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, new: NewUser) -> Result<User, StoreError>;

    async fn get(&self, id: Uuid) -> Result<User, StoreError>;

    /// Filtered scan, newest first, plus the total count of matches.
    async fn list(&self, query: &ListQuery) -> Result<UserPage, StoreError>;

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<User, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;

    /// Every record, oldest first. Used by the CSV export.
    async fn all(&self) -> Result<Vec<User>, StoreError>;
}

/// In-memory store backing tests and local fake state. The mutex spans the
/// whole uniqueness check plus insert, so duplicate races resolve to exactly
/// one winner, same as the database unique index.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches(user: &User, search: &str) -> bool {
    let needle = search.to_lowercase();
    user.first_name.to_lowercase().contains(&needle)
        || user.last_name.to_lowercase().contains(&needle)
        || user.email.to_lowercase().contains(&needle)
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.lock().unwrap();
        if users
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(&new.email) || u.mobile == new.mobile)
        {
            return Err(StoreError::Duplicate);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            mobile: new.mobile,
            address: new.address,
            gender: new.gender,
            status: new.status,
            profile_image_url: new.profile_image_url,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn get(&self, id: Uuid) -> Result<User, StoreError> {
        let users = self.users.lock().unwrap();
        users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list(&self, query: &ListQuery) -> Result<UserPage, StoreError> {
        let users = self.users.lock().unwrap();
        let mut matched: Vec<User> = users
            .iter()
            .filter(|u| match &query.search {
                Some(s) if !s.is_empty() => matches(u, s),
                _ => true,
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matched.len() as u64;
        let page = matched
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit as usize)
            .collect();
        Ok(UserPage { users: page, total })
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<User, StoreError> {
        let mut users = self.users.lock().unwrap();
        if let Some(email) = &changes.email {
            if users
                .iter()
                .any(|u| u.id != id && u.email.eq_ignore_ascii_case(email))
            {
                return Err(StoreError::Duplicate);
            }
        }
        if let Some(mobile) = &changes.mobile {
            if users.iter().any(|u| u.id != id && u.mobile == *mobile) {
                return Err(StoreError::Duplicate);
            }
        }
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StoreError::NotFound)?;
        if let Some(v) = changes.first_name {
            user.first_name = v;
        }
        if let Some(v) = changes.last_name {
            user.last_name = v;
        }
        if let Some(v) = changes.email {
            user.email = v;
        }
        if let Some(v) = changes.mobile {
            user.mobile = v;
        }
        if let Some(v) = changes.address {
            user.address = v;
        }
        if let Some(v) = changes.gender {
            user.gender = v;
        }
        if let Some(v) = changes.status {
            user.status = v;
        }
        if let Some(v) = changes.profile_image_url {
            user.profile_image_url = v;
        }
        user.updated_at = OffsetDateTime::now_utc();
        Ok(user.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != id);
        if users.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn all(&self) -> Result<Vec<User>, StoreError> {
        let users = self.users.lock().unwrap();
        let mut all = users.clone();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(all)
    }
}
