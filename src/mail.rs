use anyhow::Result;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::info;

use crate::config::SmtpConfig;
use crate::i18n::{Lang, Msg};

/// Outbound mail seam; swapped for a no-op when SMTP is unconfigured and
/// in unit tests.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_recovery_email(&self, to: &str, lang: Lang, reset_url: &str) -> Result<()>;
}

pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_recovery_email(&self, to: &str, lang: Lang, reset_url: &str) -> Result<()> {
        let host = self
            .config
            .host
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("SMTP host not configured"))?;
        let from_address = self
            .config
            .from
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("SMTP from address not configured"))?;

        let from: Mailbox = format!("Cartera <{}>", from_address).parse()?;
        let to_mailbox: Mailbox = to.parse()?;
        let subject = Msg::RecoveryEmailSubject.text(lang);

        let email = Message::builder()
            .from(from)
            .to(to_mailbox)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(render_recovery_text(lang, reset_url)),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(render_recovery_html(lang, reset_url)),
                    ),
            )?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(host)?
            .port(self.config.port);
        let mailer = if let (Some(username), Some(password)) =
            (&self.config.username, &self.config.password)
        {
            mailer.credentials(Credentials::new(username.clone(), password.clone()))
        } else {
            mailer
        };

        mailer.build().send(email).await?;

        info!(to = %to, "recovery email sent");
        Ok(())
    }
}

/// Used when no SMTP credentials are configured; logs the attempt so
/// local development still shows the flow happened.
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send_recovery_email(&self, to: &str, _lang: Lang, _reset_url: &str) -> Result<()> {
        info!(to = %to, "email sending is disabled (no SMTP credentials); skipping recovery email");
        Ok(())
    }
}

fn render_recovery_text(lang: Lang, reset_url: &str) -> String {
    match lang {
        Lang::En => format!(
            "To change your password, open the link below and follow the steps we indicate:\n\n{}\n",
            reset_url
        ),
        Lang::Es => format!(
            "Para cambiar tu clave, abre el siguiente enlace y sigue los pasos que te indicamos:\n\n{}\n",
            reset_url
        ),
    }
}

fn render_recovery_html(lang: Lang, reset_url: &str) -> String {
    let (paragraph, button) = match lang {
        Lang::En => (
            "To change your password very easily, you just have to click the new password \
             button and follow the steps we indicate. This way you can keep using Cartera \
             with total security and comfort.",
            "NEW PASSWORD",
        ),
        Lang::Es => (
            "Para cambiar tu clave de manera muy sencilla, solo tienes que clickear el botón \
             nueva contraseña y seguir los pasos que te indicamos. Así podrás seguir \
             disfrutando de Cartera con total seguridad y comodidad.",
            "NUEVA CONTRASEÑA",
        ),
    };

    format!(
        r#"<div style="text-align: center; font-family: Arial; font-size: 20px;">
  <p>{paragraph}</p>
  <a href="{reset_url}" target="_blank" style="color: white; text-decoration: none;">
    <button style="color: white; font-weight: 600; background-color: #1ab187; border-radius: 10px; height: 56px; padding: 6px 16px; font-size: 0.875rem; min-width: 64px;">
      {button}
    </button>
  </a>
</div>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_body_carries_the_reset_link() {
        let url = "https://app.example.com/new_password?token=abc123";
        let html = render_recovery_html(Lang::En, url);
        assert!(html.contains(url));
        assert!(html.contains("NEW PASSWORD"));

        let html_es = render_recovery_html(Lang::Es, url);
        assert!(html_es.contains(url));
        assert!(html_es.contains("NUEVA CONTRASEÑA"));
    }

    #[test]
    fn text_body_carries_the_reset_link() {
        let url = "https://app.example.com/new_password?token=abc123";
        assert!(render_recovery_text(Lang::En, url).contains(url));
        assert!(render_recovery_text(Lang::Es, url).contains(url));
    }
}
