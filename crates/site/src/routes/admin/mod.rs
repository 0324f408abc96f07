//! Admin console route handlers.

pub mod auth;
pub mod bags;
pub mod settings;
