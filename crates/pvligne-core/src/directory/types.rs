//! Wire and storage types for the user directory.

use serde::{Deserialize, Serialize};

/// A mention candidate as returned by the search endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Human-readable role label shown next to the username.
    pub role_display: String,
}

impl UserRecord {
    /// Convenience constructor with no id and no role code.
    pub fn new(username: &str, role_display: &str) -> Self {
        Self {
            id: None,
            username: username.to_string(),
            role: None,
            role_display: role_display.to_string(),
        }
    }
}

/// Body of `GET /api/users/search/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsersResponse {
    pub users: Vec<UserRecord>,
}

/// Account role in the web application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
    Validator,
}

impl Role {
    pub const fn code(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
            Self::Validator => "validator",
        }
    }

    pub const fn display_label(self) -> &'static str {
        match self {
            Self::Admin => "Administrateur",
            Self::User => "Utilisateur",
            Self::Validator => "Validateur",
        }
    }
}

/// A stored account, as kept by [`super::StaticDirectory`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryUser {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub role: Role,
    /// Only validated accounts can be mentioned.
    #[serde(default)]
    pub is_validated: bool,
}

impl DirectoryUser {
    pub fn to_record(&self) -> UserRecord {
        UserRecord {
            id: Some(self.id),
            username: self.username.clone(),
            role: Some(self.role.code().to_string()),
            role_display: self.role.display_label().to_string(),
        }
    }
}
