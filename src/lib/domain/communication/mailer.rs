//! Mailer module

use async_trait::async_trait;

#[cfg(test)]
use mockall::mock;

mod errors;
mod message;
mod outcome;
mod selector;

pub use errors::{ConfigurationError, MessageError};
pub use message::Message;
pub use outcome::Outcome;
pub use selector::{Transport, TransportSelector};

/// A delivery mechanism for a composed [`Message`]
#[async_trait]
pub trait Mailer: Clone + Send + Sync + 'static {
    /// Deliver a message.
    ///
    /// Never fails past this boundary: every transport-level problem is
    /// classified into [`Outcome::Failed`] with a human-readable reason.
    async fn dispatch(&self, message: &Message) -> Outcome;
}

#[cfg(test)]
mock! {
    pub Mailer {}

    impl Clone for Mailer {
        fn clone(&self) -> Self;
    }

    #[async_trait]
    impl Mailer for Mailer {
        async fn dispatch(&self, message: &Message) -> Outcome;
    }
}
