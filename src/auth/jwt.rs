use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::auth::claims::{Claims, ResetClaims, SessionUser};
use crate::config::JwtConfig;
use crate::state::AppState;

/// Holds the process-wide signing secret, read once at startup. Tokens are
/// stateless: rotating the secret invalidates everything outstanding.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub session_ttl: Duration,
    pub reset_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            session_ttl_minutes,
            reset_ttl_minutes,
        } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            session_ttl: Duration::from_secs((session_ttl_minutes as u64) * 60),
            reset_ttl: Duration::from_secs((reset_ttl_minutes as u64) * 60),
        }
    }
}

fn timestamps(ttl: Duration) -> (usize, usize) {
    let now = OffsetDateTime::now_utc();
    let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
    (now.unix_timestamp() as usize, exp.unix_timestamp() as usize)
}

fn strict_validation() -> Validation {
    let mut validation = Validation::default();
    // no leeway: an expired token is expired
    validation.leeway = 0;
    validation
}

impl JwtKeys {
    pub fn sign_session(&self, user: SessionUser) -> anyhow::Result<String> {
        let (iat, exp) = timestamps(self.session_ttl);
        let claims = Claims { user, iat, exp };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %claims.user.id, "session token signed");
        Ok(token)
    }

    pub fn sign_reset(&self, user_id: Uuid) -> anyhow::Result<String> {
        let (iat, exp) = timestamps(self.reset_ttl);
        let claims = ResetClaims {
            sub: user_id,
            iat,
            exp,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "reset token signed");
        Ok(token)
    }

    /// Fails closed on any malformed, tampered or expired token.
    pub fn verify_session(&self, token: &str) -> anyhow::Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding, &strict_validation())?;
        Ok(data.claims)
    }

    pub fn verify_reset(&self, token: &str) -> anyhow::Result<ResetClaims> {
        let data = decode::<ResetClaims>(token, &self.decoding, &strict_validation())?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Lang;
    use crate::users::repo_types::Role;

    fn make_keys() -> JwtKeys {
        JwtKeys::from_ref(&AppState::fake())
    }

    fn sample_session_user() -> SessionUser {
        SessionUser {
            id: Uuid::new_v4(),
            name: "Ana".into(),
            lastname: "García".into(),
            email: "ana@example.com".into(),
            phone: "155512345".into(),
            document: "12345678".into(),
            lang: Some(Lang::Es),
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn sign_and_verify_session_roundtrip() {
        let keys = make_keys();
        let user = sample_session_user();
        let token = keys.sign_session(user.clone()).expect("sign session");
        let claims = keys.verify_session(&token).expect("verify session");
        assert_eq!(claims.user.id, user.id);
        assert_eq!(claims.user.email, user.email);
        assert_eq!(claims.user.role, Role::User);
        assert_eq!(claims.user.lang, Some(Lang::Es));
        assert!(claims.exp > claims.iat);
    }

    #[tokio::test]
    async fn verify_rejects_expired_token() {
        let keys = make_keys();
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            user: sample_session_user(),
            iat: (now - 600) as usize,
            exp: (now - 300) as usize,
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).expect("encode");
        assert!(keys.verify_session(&token).is_err());
    }

    #[tokio::test]
    async fn verify_rejects_tampered_token() {
        let keys = make_keys();
        let token = keys
            .sign_session(sample_session_user())
            .expect("sign session");
        let mut tampered = token.clone();
        let last = tampered.pop().expect("token is non-empty");
        tampered.push(if last == 'a' { 'b' } else { 'a' });
        assert!(keys.verify_session(&tampered).is_err());
    }

    #[tokio::test]
    async fn verify_rejects_token_signed_with_other_secret() {
        let keys = make_keys();
        let other = JwtKeys {
            encoding: EncodingKey::from_secret(b"another-secret"),
            decoding: DecodingKey::from_secret(b"another-secret"),
            session_ttl: keys.session_ttl,
            reset_ttl: keys.reset_ttl,
        };
        let token = other
            .sign_session(sample_session_user())
            .expect("sign session");
        assert!(keys.verify_session(&token).is_err());
    }

    #[tokio::test]
    async fn reset_and_session_tokens_are_not_interchangeable() {
        let keys = make_keys();
        let user = sample_session_user();
        let session = keys.sign_session(user.clone()).expect("sign session");
        let reset = keys.sign_reset(user.id).expect("sign reset");
        assert!(keys.verify_reset(&session).is_err());
        assert!(keys.verify_session(&reset).is_err());
        let claims = keys.verify_reset(&reset).expect("verify reset");
        assert_eq!(claims.sub, user.id);
    }
}
