//! Request handlers.

pub mod articles;
pub mod health;
pub mod intake;
pub mod monitoring;
pub mod portal;
pub mod portal_auth;
