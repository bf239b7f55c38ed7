//! Domain types, services and the traits infrastructure implements

pub mod communication;
pub mod dns;
