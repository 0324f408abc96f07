//! Sonie Atelier Core - Shared domain types.
//!
//! This crate provides the types shared between the site binary and the
//! integration tests:
//! - `site` - Public catalog pages and the `/admin` console
//! - `integration-tests` - Black-box tests for the admin workflow
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients, no async. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Bag, image, settings, price, email, and ID types
//! - [`upload`] - Client-upload tracking model and default-image index math

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;
pub mod upload;

pub use types::*;
