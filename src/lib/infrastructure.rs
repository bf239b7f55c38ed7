//! Adapters for the outside world: SMTP, the provider API, DNS, Postgres and HTTP

pub mod db;
pub mod dns;
pub mod email;
pub mod http;
