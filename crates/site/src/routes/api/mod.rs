//! JSON API handlers.

pub mod cloudinary;
