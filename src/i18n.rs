use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};

/// Languages the API can answer in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    Es,
    En,
}

impl Lang {
    pub fn parse(value: &str) -> Option<Lang> {
        match value {
            "es" => Some(Lang::Es),
            "en" => Some(Lang::En),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Lang::Es => "es",
            Lang::En => "en",
        }
    }
}

/// Picks the response language: the `lang` header wins, then the
/// authenticated user's stored preference, then the configured default.
pub fn resolve(header: Option<Lang>, user: Option<Lang>, default: Lang) -> Lang {
    header.or(user).unwrap_or(default)
}

/// The `lang` request header, when present and valid.
pub struct RequestLang(pub Option<Lang>);

#[async_trait]
impl<S> FromRequestParts<S> for RequestLang
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let lang = parts
            .headers
            .get("lang")
            .and_then(|v| v.to_str().ok())
            .and_then(Lang::parse);
        Ok(RequestLang(lang))
    }
}

/// Keys of the localized user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Msg {
    UnexpectedError,
    Success,
    SignupSuccess,
    AuthorizationIncorrect,
    InvalidPayload,
    WrongCredentials,
    AccountExists,
    CheckYourEmail,
    RecoveryEmailSubject,
    PasswordUpdated,
    ExpiredResetToken,
}

impl Msg {
    pub fn text(self, lang: Lang) -> &'static str {
        match (self, lang) {
            (Msg::UnexpectedError, Lang::En) => "An unexpected error has occurred",
            (Msg::UnexpectedError, Lang::Es) => "Ha ocurrido un error inesperado",
            (Msg::Success, Lang::En) => "Request Successful!",
            (Msg::Success, Lang::Es) => "Solicitud Exitosa!",
            (Msg::SignupSuccess, Lang::En) => "We're glad you joined!",
            (Msg::SignupSuccess, Lang::Es) => "Estamos alegres que te hayas unido!",
            (Msg::AuthorizationIncorrect, Lang::En) => "Login to continue.",
            (Msg::AuthorizationIncorrect, Lang::Es) => "Inicia sesión para continuar.",
            (Msg::InvalidPayload, Lang::En) => "The provided data is not valid",
            (Msg::InvalidPayload, Lang::Es) => "Los datos proporcionados no son válidos",
            (Msg::WrongCredentials, Lang::En) => "Email or password was not correct",
            (Msg::WrongCredentials, Lang::Es) => "El email o la contraseña no son correctos",
            (Msg::AccountExists, Lang::En) => {
                "There is already an account associated with this email or document"
            }
            (Msg::AccountExists, Lang::Es) => {
                "Ya existe una cuenta asociada a este correo electrónico o documento"
            }
            (Msg::CheckYourEmail, Lang::En) => {
                "Check your email to continue with the password recovery process"
            }
            (Msg::CheckYourEmail, Lang::Es) => {
                "Revisa tu correo electrónico para continuar con el proceso de recuperación de contraseña"
            }
            (Msg::RecoveryEmailSubject, Lang::En) => "Password recovery instructions",
            (Msg::RecoveryEmailSubject, Lang::Es) => {
                "Instrucciones para recuperación de contraseña"
            }
            (Msg::PasswordUpdated, Lang::En) => "Password updated successfully",
            (Msg::PasswordUpdated, Lang::Es) => "Contraseña actualizada con éxito",
            (Msg::ExpiredResetToken, Lang::En) => {
                "Expired token you must request again to recover password"
            }
            (Msg::ExpiredResetToken, Lang::Es) => {
                "Token expirado debes solicitar de nuevo recuperar contraseña"
            }
        }
    }
}
