use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::{Notification, Notifier};
use crate::config::SmtpConfig;
use crate::error::DeliveryError;

pub struct EmailNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

/// Port 465 speaks TLS from the first byte; every other port upgrades with STARTTLS.
pub fn uses_implicit_tls(port: u16) -> bool {
    port == 465
}

impl EmailNotifier {
    pub fn new(cfg: &SmtpConfig) -> Result<Self, DeliveryError> {
        let creds = Credentials::new(cfg.user.clone(), cfg.password.clone());
        let builder = if uses_implicit_tls(cfg.port) {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.host)?
        };
        let mailer = builder.port(cfg.port).credentials(creds).build();
        Ok(Self { mailer })
    }
}

fn mailbox(address: &str) -> Result<Mailbox, DeliveryError> {
    address
        .parse()
        .map_err(|source| DeliveryError::Address {
            address: address.to_string(),
            source,
        })
}

/// Build the HTML message without sending it.
pub fn build_message(n: &Notification) -> Result<Message, DeliveryError> {
    let msg = Message::builder()
        .from(mailbox(&n.from)?)
        .to(mailbox(&n.to)?)
        .subject(n.subject.clone())
        .header(header::ContentType::TEXT_HTML)
        .body(n.html_body.clone())?;
    Ok(msg)
}

#[async_trait::async_trait]
impl Notifier for EmailNotifier {
    async fn send(&self, n: &Notification) -> Result<(), DeliveryError> {
        let msg = build_message(n)?;
        self.mailer.send(msg).await?;
        tracing::info!(source = %n.source, to = %n.to, subject = %n.subject, "change email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(to: &str) -> Notification {
        Notification {
            source: "waveriderz".into(),
            from: "postmaster@mg.example.org".into(),
            to: to.into(),
            subject: "Waveriderz forecast changed".into(),
            html_body: "Borut pravi: <br />flat".into(),
        }
    }

    #[test]
    fn message_is_html_with_subject() {
        let msg = build_message(&notification("surfer@example.org")).unwrap();
        let raw = String::from_utf8(msg.formatted()).unwrap();
        assert!(raw.contains("Subject: Waveriderz forecast changed"));
        assert!(raw.contains("Content-Type: text/html"));
        assert!(raw.contains("To: surfer@example.org"));
    }

    #[test]
    fn bad_recipient_is_a_delivery_error() {
        let err = build_message(&notification("not an address")).unwrap_err();
        assert!(matches!(err, DeliveryError::Address { .. }));
    }

    #[test]
    fn tls_mode_follows_port() {
        assert!(uses_implicit_tls(465));
        assert!(!uses_implicit_tls(587));
        assert!(!uses_implicit_tls(25));
    }

    #[tokio::test]
    async fn transport_builds_for_both_tls_modes() {
        for port in [465u16, 587] {
            let cfg = SmtpConfig {
                host: "smtp.example.org".into(),
                port,
                user: "postmaster@mg.example.org".into(),
                password: "secret".into(),
            };
            assert!(EmailNotifier::new(&cfg).is_ok());
        }
    }
}
