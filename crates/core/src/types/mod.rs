//! Core types for Sonie Atelier.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod bag;
pub mod email;
pub mod id;
pub mod price;

pub use bag::{Bag, BagImage, Settings, UploadedImage};
pub use email::{Email, EmailError};
pub use id::{BagId, UserId};
pub use price::{Price, PriceError};
