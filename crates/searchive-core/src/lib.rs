//! # searchive-core
//!
//! Core types, traits, and abstractions for searchive.
//!
//! This crate provides:
//! - Data models for documents, tags, and keyword extraction results
//! - Trait seams for blob storage, the search index, keyphrase ranking and text extraction
//! - The error taxonomy shared by every crate
//! - Centralized defaults and structured logging field names

pub mod defaults;
pub mod error;
pub mod formats;
pub mod keywords;
pub mod logging;
pub mod models;
pub mod traits;

pub use error::{Error, ErrorKind, Result};
pub use formats::{file_extension, is_supported_mime, DocumentFormat, SUPPORTED_MIME_TYPES};
pub use keywords::{normalize_keyword, normalize_keywords};
pub use models::*;
pub use traits::*;
