use crate::config::EmailConfig;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::path::Path;
use thiserror::Error;

/// Environment variable holding the sender address (also the SMTP user)
pub const SENDER_EMAIL_VAR: &str = "SENDER_EMAIL";
/// Environment variable holding the SMTP password
pub const SENDER_PASSWORD_VAR: &str = "SENDER_PASSWORD";
/// Environment variable holding the recipient address
pub const RECIPIENT_EMAIL_VAR: &str = "RECIPIENT_EMAIL";

const EPUB_CONTENT_TYPE: &str = "application/epub+zip";

/// Errors that can occur while delivering a book
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Failed to read attachment {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Invalid attachment content type: {0}")]
    ContentType(String),

    #[error("Failed to build email: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP delivery failed: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Email task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// SMTP login and addressing
#[derive(Clone, PartialEq, Eq)]
pub struct EmailCredentials {
    pub sender: String,
    pub password: String,
    pub recipient: String,
}

impl std::fmt::Debug for EmailCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailCredentials")
            .field("sender", &self.sender)
            .field("password", &"<redacted>")
            .field("recipient", &self.recipient)
            .finish()
    }
}

impl EmailCredentials {
    /// Reads credentials from the process environment
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads credentials through `lookup`; `None` unless all three are set
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let value = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Some(Self {
            sender: value(SENDER_EMAIL_VAR)?,
            password: value(SENDER_PASSWORD_VAR)?,
            recipient: value(RECIPIENT_EMAIL_VAR)?,
        })
    }
}

/// What happened to a delivery request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Sent { recipient: String },
    /// Credentials were not configured
    Skipped,
}

/// Sends finished books as email attachments
#[derive(Debug, Clone)]
pub struct EmailSender {
    smtp_host: String,
    smtp_port: u16,
    credentials: Option<EmailCredentials>,
}

impl EmailSender {
    pub fn new(config: &EmailConfig, credentials: Option<EmailCredentials>) -> Self {
        Self {
            smtp_host: config.smtp_host.clone(),
            smtp_port: config.smtp_port,
            credentials,
        }
    }

    /// Sends the book at `path`, or skips with a warning when credentials
    /// are missing
    pub async fn send_book(&self, path: &Path, date: &str) -> Result<Delivery, EmailError> {
        let Some(credentials) = &self.credentials else {
            tracing::warn!(
                "Email not sent: missing {}, {} or {}",
                SENDER_EMAIL_VAR,
                SENDER_PASSWORD_VAR,
                RECIPIENT_EMAIL_VAR
            );
            return Ok(Delivery::Skipped);
        };

        let attachment = std::fs::read(path).map_err(|source| EmailError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "book.epub".to_string());
        let message = build_message(credentials, &filename, attachment, date)?;

        let transport = self.transport(credentials)?;
        tracing::info!("Sending EPUB to {}...", credentials.recipient);

        let response = tokio::task::spawn_blocking(move || transport.send(&message)).await??;
        tracing::info!(
            "Email sent: {}",
            response.message().collect::<Vec<_>>().join(" ")
        );

        Ok(Delivery::Sent {
            recipient: credentials.recipient.clone(),
        })
    }

    fn transport(&self, credentials: &EmailCredentials) -> Result<SmtpTransport, EmailError> {
        let login = Credentials::new(credentials.sender.clone(), credentials.password.clone());
        // Port 465 speaks TLS from the first byte; everything else upgrades with STARTTLS
        let builder = if self.smtp_port == 465 {
            SmtpTransport::relay(&self.smtp_host)?
        } else {
            SmtpTransport::starttls_relay(&self.smtp_host)?
        };
        Ok(builder.port(self.smtp_port).credentials(login).build())
    }
}

/// Builds the delivery message with the book attached
pub fn build_message(
    credentials: &EmailCredentials,
    filename: &str,
    attachment: Vec<u8>,
    date: &str,
) -> Result<Message, EmailError> {
    let from: Mailbox = credentials.sender.parse()?;
    let to: Mailbox = credentials.recipient.parse()?;
    let content_type = ContentType::parse(EPUB_CONTENT_TYPE)
        .map_err(|e| EmailError::ContentType(e.to_string()))?;

    let text = format!(
        "Your saved articles have been converted to EPUB.\n\nSee the attached file: {}",
        filename
    );

    let message = Message::builder()
        .from(from)
        .to(to)
        .subject(format!("Paperbind EPUB - {}", date))
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(text))
                .singlepart(Attachment::new(filename.to_string()).body(attachment, content_type)),
        )?;
    Ok(message)
}
