//! User directory lookups for mention candidates.
//!
//! [`UserDirectory`] is the seam between the autocomplete and wherever users
//! come from: the web application's search endpoint ([`HttpDirectory`]) or
//! an in-memory list ([`StaticDirectory`]) for offline use and tests.

mod http;
mod memory;
mod types;

pub use http::HttpDirectory;
pub use memory::{SEARCH_LIMIT, StaticDirectory};
pub use types::{DirectoryUser, Role, UserRecord, UsersResponse};

use async_trait::async_trait;

use crate::error::Result;

/// Source of mention candidates.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Users whose username matches `query`, in display order.
    async fn search(&self, query: &str) -> Result<Vec<UserRecord>>;
}
