//! Blob store backends.

pub mod filesystem;
#[cfg(feature = "s3")]
pub mod s3;

pub use filesystem::FilesystemBlobStore;
#[cfg(feature = "s3")]
pub use s3::{S3BlobStore, S3Config};
