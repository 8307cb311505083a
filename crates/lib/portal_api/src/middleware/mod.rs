//! Request middleware.

pub mod internal;
pub mod session;
