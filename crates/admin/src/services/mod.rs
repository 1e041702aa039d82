//! Business logic services for admin.
//!
//! # Services
//!
//! - `upload` - Item image storage (media host or local directory)

pub mod upload;

pub use upload::{ImageUploader, UPLOADS_PATH, UploadError};
