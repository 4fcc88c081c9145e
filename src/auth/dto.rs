use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::i18n::Lang;
use crate::validation::{is_digits_between, is_valid_email, len_between};

/// Body of POST /auth/login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub user: LoginUser,
}

#[derive(Debug, Deserialize)]
pub struct LoginUser {
    pub email: String,
    pub password: String,
}

impl LoginUser {
    pub fn normalize(&mut self) {
        self.email = self.email.trim().to_lowercase();
    }

    pub fn validate(&self, lang: Lang) -> Result<(), ApiError> {
        if !is_valid_email(&self.email) || self.password.is_empty() {
            return Err(ApiError::invalid_payload(lang));
        }
        Ok(())
    }
}

/// Body of POST /auth/register.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub user: SignupUser,
}

#[derive(Debug, Deserialize)]
pub struct SignupUser {
    pub name: String,
    pub lastname: String,
    pub email: String,
    pub password: String,
    pub document: String,
    pub phone: String,
    #[serde(default)]
    pub lang: Option<Lang>,
}

impl SignupUser {
    pub fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        self.lastname = self.lastname.trim().to_string();
        self.email = self.email.trim().to_lowercase();
        self.document = self.document.trim().to_string();
        self.phone = self.phone.trim().to_string();
    }

    pub fn validate(&self, lang: Lang) -> Result<(), ApiError> {
        let ok = len_between(&self.name, 2, 25)
            && len_between(&self.lastname, 2, 25)
            && is_valid_email(&self.email)
            && self.password.chars().count() >= 8
            && is_digits_between(&self.document, 7, 15)
            && is_digits_between(&self.phone, 7, 15);
        if !ok {
            return Err(ApiError::invalid_payload(lang));
        }
        Ok(())
    }
}

/// Body of POST /auth/forgot_password.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

impl ForgotPasswordRequest {
    pub fn normalize(&mut self) {
        self.email = self.email.trim().to_lowercase();
    }

    pub fn validate(&self, lang: Lang) -> Result<(), ApiError> {
        if !is_valid_email(&self.email) {
            return Err(ApiError::invalid_payload(lang));
        }
        Ok(())
    }
}

/// Body of PUT /auth/new_password.
#[derive(Debug, Deserialize)]
pub struct NewPasswordRequest {
    pub password: String,
    pub confirmation_password: String,
    pub token: String,
}

impl NewPasswordRequest {
    pub fn validate(&self, lang: Lang) -> Result<(), ApiError> {
        let ok = self.password.chars().count() >= 8
            && self.confirmation_password.chars().count() >= 8
            && !self.token.is_empty();
        if !ok {
            return Err(ApiError::invalid_payload(lang));
        }
        Ok(())
    }
}

/// Successful login body.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub jwt: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_signup() -> SignupUser {
        SignupUser {
            name: "Ana".into(),
            lastname: "García".into(),
            email: "Ana@Example.COM ".into(),
            password: "supersecret".into(),
            document: "12345678".into(),
            phone: "155512345".into(),
            lang: None,
        }
    }

    #[test]
    fn signup_normalizes_and_accepts_valid_payload() {
        let mut user = valid_signup();
        user.normalize();
        assert_eq!(user.email, "ana@example.com");
        assert!(user.validate(Lang::En).is_ok());
    }

    #[test]
    fn signup_rejects_short_name_and_password() {
        let mut user = valid_signup();
        user.name = "A".into();
        assert!(user.validate(Lang::En).is_err());

        let mut user = valid_signup();
        user.password = "short".into();
        assert!(user.validate(Lang::En).is_err());
    }

    #[test]
    fn signup_rejects_non_numeric_document_and_phone() {
        let mut user = valid_signup();
        user.document = "12a45678".into();
        assert!(user.validate(Lang::En).is_err());

        let mut user = valid_signup();
        user.phone = "123".into();
        assert!(user.validate(Lang::En).is_err());
    }

    #[test]
    fn login_rejects_bad_email_or_empty_password() {
        let mut user = LoginUser {
            email: "nope".into(),
            password: "x".into(),
        };
        user.normalize();
        assert!(user.validate(Lang::En).is_err());

        let user = LoginUser {
            email: "ana@example.com".into(),
            password: String::new(),
        };
        assert!(user.validate(Lang::En).is_err());
    }

    #[test]
    fn token_response_serializes_as_jwt_field() {
        let json = serde_json::to_string(&TokenResponse {
            jwt: "abc.def.ghi".into(),
        })
        .unwrap();
        assert_eq!(json, r#"{"jwt":"abc.def.ghi"}"#);
    }
}
