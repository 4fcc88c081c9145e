use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::i18n::Lang;

/// Access level; everything not ADMIN is a plain user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(String);

impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            _ => Err(UnknownRole(value)),
        }
    }
}

/// User record in the database. Deliberately not `Serialize`: the only
/// outward shape is `UserDto`, which carries neither the password hash
/// nor the reset token.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub lastname: String,
    pub email: String,
    pub password_hash: String,
    pub document: String,
    pub phone: String,
    pub lang: Option<String>,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub reset_token: String, // empty when no reset is pending
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Candidate row for user creation.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub lastname: String,
    pub email: String,
    pub password_hash: String,
    pub document: String,
    pub phone: String,
    pub lang: Option<Lang>,
    pub role: Role,
}

/// Partial profile update. Absent fields are left untouched, never nulled.
#[derive(Debug, Default, Clone)]
pub struct UserChanges {
    pub name: Option<String>,
    pub lastname: Option<String>,
    pub document: Option<String>,
    pub phone: Option<String>,
    pub lang: Option<Lang>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.lastname.is_none()
            && self.document.is_none()
            && self.phone.is_none()
            && self.lang.is_none()
    }
}

/// Optional substring filters for the user listing.
#[derive(Debug, Default, Clone)]
pub struct UserFilters {
    pub name: Option<String>,
    pub document: Option<String>,
    pub phone: Option<String>,
}
