//! Email message

use super::MessageError;

/// A transport-neutral email.
///
/// Recipients keep the order they were given in so that transports emit a
/// deterministic `To:` header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    sender: String,
    recipients: Vec<String>,
    subject: String,
    body: String,
    html_body: Option<String>,
}

impl Message {
    /// Build a message from raw form input.
    ///
    /// `raw_recipients` is a comma-separated list; entries are trimmed and
    /// empty entries dropped. Address syntax is not checked here.
    ///
    /// # Errors
    /// [`MessageError::EmptyRecipientList`] if no recipient remains.
    pub fn build(
        sender: &str,
        raw_recipients: &str,
        subject: &str,
        body: &str,
        html_body: Option<&str>,
    ) -> Result<Self, MessageError> {
        let recipients: Vec<String> = raw_recipients
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(String::from)
            .collect();

        if recipients.is_empty() {
            return Err(MessageError::EmptyRecipientList);
        }

        Ok(Self {
            sender: sender.trim().to_string(),
            recipients,
            subject: subject.to_string(),
            body: body.to_string(),
            html_body: html_body
                .filter(|html| !html.trim().is_empty())
                .map(String::from),
        })
    }

    /// The sender address
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// The recipients, in input order
    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    /// The subject line
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// The plain-text body
    pub fn body(&self) -> &str {
        &self.body
    }

    /// The optional HTML alternative
    pub fn html_body(&self) -> Option<&str> {
        self.html_body.as_deref()
    }

    /// Recipients joined the way they are stored
    pub fn joined_recipients(&self) -> String {
        self.recipients.join(", ")
    }
}
