//! Email transports

pub mod provider;
pub mod smtp;
