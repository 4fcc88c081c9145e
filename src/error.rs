use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::i18n::{Lang, Msg};

/// The `{message}` body used for both success and error responses.
#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: String,
}

impl MessageBody {
    pub fn new(lang: Lang, msg: Msg) -> Self {
        Self {
            message: msg.text(lang).to_string(),
        }
    }
}

/// A localized error response. Flows build one of these instead of letting
/// lower-level errors reach the transport layer; internals are logged at
/// the failure site and never serialized.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, lang: Lang, msg: Msg) -> Self {
        Self {
            status,
            message: msg.text(lang).to_string(),
        }
    }

    pub fn unauthorized(lang: Lang) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, lang, Msg::AuthorizationIncorrect)
    }

    pub fn forbidden(lang: Lang) -> Self {
        Self::new(StatusCode::FORBIDDEN, lang, Msg::AuthorizationIncorrect)
    }

    pub fn invalid_payload(lang: Lang) -> Self {
        Self::new(StatusCode::BAD_REQUEST, lang, Msg::InvalidPayload)
    }

    pub fn wrong_credentials(lang: Lang) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, lang, Msg::WrongCredentials)
    }

    pub fn account_exists(lang: Lang) -> Self {
        Self::new(StatusCode::BAD_REQUEST, lang, Msg::AccountExists)
    }

    pub fn expired_reset_token(lang: Lang) -> Self {
        Self::new(StatusCode::BAD_REQUEST, lang, Msg::ExpiredResetToken)
    }

    pub fn not_found(lang: Lang) -> Self {
        Self::new(StatusCode::NOT_FOUND, lang, Msg::WrongCredentials)
    }

    pub fn unexpected(lang: Lang) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, lang, Msg::UnexpectedError)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(MessageBody {
                message: self.message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_and_forbidden_are_distinct_statuses() {
        assert_eq!(
            ApiError::unauthorized(Lang::En).into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::forbidden(Lang::En).into_response().status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn error_body_is_a_localized_message() {
        let body = MessageBody::new(Lang::Es, Msg::UnexpectedError);
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("Ha ocurrido un error inesperado"));
    }
}
