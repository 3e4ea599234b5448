// =============================================================================
// Email Export — send the scan CSV through an authenticated SMTP relay
// =============================================================================
//
// SECURITY: relay credentials are read from the environment only
// (SMTP_USERNAME / SMTP_PASSWORD). They are never written to the config file
// and never logged.
// =============================================================================

use anyhow::{Context, Result};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

/// Non-secret relay settings (persisted in the runtime config).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpSettings {
    #[serde(default = "default_smtp_host")]
    pub host: String,

    #[serde(default = "default_smtp_port")]
    pub port: u16,

    /// Sender address; falls back to the SMTP username when unset.
    #[serde(default)]
    pub from: Option<String>,
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
            from: None,
        }
    }
}

/// Relay login, supplied by the operator at runtime.
#[derive(Clone)]
pub struct SmtpCredentials {
    pub username: String,
    password: String,
}

impl SmtpCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Read `SMTP_USERNAME` / `SMTP_PASSWORD`; `None` if either is missing.
    pub fn from_env() -> Option<Self> {
        let username = std::env::var("SMTP_USERNAME").ok().filter(|s| !s.is_empty())?;
        let password = std::env::var("SMTP_PASSWORD").ok().filter(|s| !s.is_empty())?;
        Some(Self::new(username, password))
    }
}

impl std::fmt::Debug for SmtpCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Build a message with `csv` attached as `file_name`.
pub fn build_report_message(
    from: &str,
    recipients: &[String],
    subject: &str,
    body: &str,
    file_name: &str,
    csv: Vec<u8>,
) -> Result<Message> {
    if recipients.is_empty() {
        anyhow::bail!("no email recipients given");
    }

    let from: Mailbox = from
        .parse()
        .with_context(|| format!("invalid sender address '{from}'"))?;

    let mut builder = Message::builder().from(from).subject(subject);
    for r in recipients {
        let to: Mailbox = r
            .trim()
            .parse()
            .with_context(|| format!("invalid recipient address '{r}'"))?;
        builder = builder.to(to);
    }

    let csv_type = ContentType::parse("text/csv").context("invalid CSV content type")?;
    let attachment = Attachment::new(file_name.to_string()).body(csv, csv_type);

    builder
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(body.to_string()))
                .singlepart(attachment),
        )
        .context("failed to build report email")
}

/// Deliver `message` through the STARTTLS relay described by `settings`.
#[instrument(skip(settings, credentials, message), fields(host = %settings.host, port = settings.port))]
pub async fn send_message(settings: &SmtpSettings, credentials: &SmtpCredentials, message: Message) -> Result<()> {
    let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
        .with_context(|| format!("failed to configure SMTP relay {}", settings.host))?
        .port(settings.port)
        .credentials(Credentials::new(
            credentials.username.clone(),
            credentials.password.clone(),
        ))
        .build();

    transport
        .send(message)
        .await
        .context("SMTP delivery failed")?;

    info!("report email delivered");
    Ok(())
}

/// Sender address: configured `from`, else the login name.
pub fn sender_address(settings: &SmtpSettings, credentials: &SmtpCredentials) -> String {
    settings
        .from
        .clone()
        .unwrap_or_else(|| credentials.username.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_carries_attachment_and_recipients() {
        let msg = build_report_message(
            "scanner@example.com",
            &["a@example.com".into(), " b@example.com ".into()],
            "Watchlist 2024-07-05",
            "Attached.",
            "watchlist_2024-07-05.csv",
            b"ticker,score\nTCS.NS,3\n".to_vec(),
        )
        .unwrap();

        let raw = String::from_utf8(msg.formatted()).unwrap();
        assert!(raw.contains("a@example.com"));
        assert!(raw.contains("b@example.com"));
        assert!(raw.contains("Subject: Watchlist 2024-07-05"));
        assert!(raw.contains("watchlist_2024-07-05.csv"));
        assert!(raw.contains("text/csv"));
    }

    #[test]
    fn no_recipients_is_error() {
        let r = build_report_message("s@example.com", &[], "s", "b", "f.csv", Vec::new());
        assert!(r.is_err());
    }

    #[test]
    fn bad_address_is_error() {
        let r = build_report_message("s@example.com", &["not an address".into()], "s", "b", "f.csv", Vec::new());
        assert!(r.is_err());
    }

    #[test]
    fn credentials_are_redacted_in_debug() {
        let c = SmtpCredentials::new("user@example.com", "hunter2");
        let dbg = format!("{c:?}");
        assert!(dbg.contains("user@example.com"));
        assert!(!dbg.contains("hunter2"));
    }

    #[test]
    fn sender_falls_back_to_username() {
        let c = SmtpCredentials::new("user@example.com", "pw");
        assert_eq!(sender_address(&SmtpSettings::default(), &c), "user@example.com");

        let s = SmtpSettings {
            from: Some("desk@example.com".into()),
            ..Default::default()
        };
        assert_eq!(sender_address(&s, &c), "desk@example.com");
    }
}
