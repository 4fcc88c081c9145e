use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::i18n::Lang;
use crate::users::repo_types::{Role, User};

/// Public user attributes embedded in a session token. The password hash
/// is never part of this payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub name: String,
    pub lastname: String,
    pub email: String,
    pub phone: String,
    pub document: String,
    pub lang: Option<Lang>,
    pub role: Role,
}

/// Payload of a session JWT.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user: SessionUser,
    pub iat: usize, // issued at (unix timestamp)
    pub exp: usize, // expires at (unix timestamp)
}

/// Payload of a password-reset JWT. Single use: the user row must still
/// hold the exact token string for it to be accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetClaims {
    pub sub: Uuid, // user ID
    pub iat: usize,
    pub exp: usize,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            lastname: user.lastname.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            document: user.document.clone(),
            lang: user.lang.as_deref().and_then(Lang::parse),
            role: user.role,
        }
    }
}
