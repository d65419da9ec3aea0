//! Delivery of finished books
//!
//! Books are sent over SMTP as email attachments. Credentials come from the
//! environment; without them delivery is skipped with a warning.

mod email;

pub use email::{
    build_message, Delivery, EmailCredentials, EmailError, EmailSender, RECIPIENT_EMAIL_VAR,
    SENDER_EMAIL_VAR, SENDER_PASSWORD_VAR,
};
