//! Clients for the three hosted collaborators.
//!
//! - [`catalog`] - PostgREST client for the bag and settings rows
//! - [`identity`] - GoTrue client for password, signup, and OAuth flows
//! - [`cloudinary`] - upload-ticket signer for direct browser uploads

pub mod catalog;
pub mod cloudinary;
pub mod identity;

pub use catalog::{CatalogClient, CatalogError};
pub use cloudinary::{UploadSigner, UploadTicket};
pub use identity::{AuthenticatedUser, IdentityClient, IdentityError, ProviderSession};
