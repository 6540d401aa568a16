//! In-memory user directory.
//!
//! Mirrors the search endpoint: validated users only, case-insensitive
//! username prefix, ordered by username, capped at [`SEARCH_LIMIT`].

use std::path::Path;

use async_trait::async_trait;

use super::UserDirectory;
use super::types::{DirectoryUser, UserRecord};
use crate::error::{Error, Result};

/// Maximum number of users a search returns.
pub const SEARCH_LIMIT: usize = 10;

/// Directory backed by a fixed list of accounts.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    users: Vec<DirectoryUser>,
}

impl StaticDirectory {
    /// Build a directory; users are kept sorted by username.
    pub fn new(mut users: Vec<DirectoryUser>) -> Self {
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Self { users }
    }

    /// Load a JSON array of [`DirectoryUser`] from `path`.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read users file {}: {}", path.display(), e))
        })?;
        let users: Vec<DirectoryUser> = serde_json::from_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse users file {}: {}", path.display(), e))
        })?;
        Ok(Self::new(users))
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Synchronous search with endpoint semantics. A blank query lists the
    /// first validated users.
    pub fn matching(&self, query: &str) -> Vec<UserRecord> {
        let needle = query.trim().to_lowercase();
        self.users
            .iter()
            .filter(|u| u.is_validated)
            .filter(|u| needle.is_empty() || u.username.to_lowercase().starts_with(&needle))
            .take(SEARCH_LIMIT)
            .map(DirectoryUser::to_record)
            .collect()
    }
}

#[async_trait]
impl UserDirectory for StaticDirectory {
    async fn search(&self, query: &str) -> Result<Vec<UserRecord>> {
        Ok(self.matching(query))
    }
}
