//! Business logic sitting between handlers and `portal_core`.

pub mod portal_auth;
