//! Endpoint implementations of the HTTP API.

pub mod authorization;
pub mod balance;
pub mod mint;
pub mod protocol;
