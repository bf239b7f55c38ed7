//! Composing, dispatching and recording outbound email

pub mod email_addresses;
pub mod email_messages;
pub mod mailer;
