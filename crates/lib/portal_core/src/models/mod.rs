//! Domain models shared by `portal_core` and `portal_api`.

pub mod auth;
pub mod content;
pub mod language;
pub mod monitoring;
pub mod portal;
