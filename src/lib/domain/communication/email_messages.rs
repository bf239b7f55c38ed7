//! Sent-email history and the service that dispatches and records messages

mod email_message;
mod repository;
mod service;

pub mod errors;

pub use email_message::{EmailMessage, EmailStatus, NewEmailMessage};
pub use repository::EmailMessageRepository;
pub use service::{EmailService, EmailServiceImpl, SendEmailRequest, SentEmail};

#[cfg(test)]
pub mod tests {
    pub use super::repository::MockEmailMessageRepository;
    pub use super::service::MockEmailService;
}
