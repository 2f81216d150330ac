//! # Reseed Error Definitions Module
//!
//! This module defines the structured errors used across the reseed core.
//! Every fallible function returns `anyhow::Result`; the failures a caller has to
//! tell apart are raised as a `ReseedError` and can be recovered with
//! `err.downcast_ref::<ReseedError>()`.
//!
//! ## Example
//! ```rust
//! use reseed::{ReseedError, Su3File};
//!
//! let err = Su3File::from_bytes(b"not an su3 file").unwrap_err();
//! assert!(matches!(err.downcast_ref::<ReseedError>(), Some(ReseedError::MalformedContainer(_))));
//! ```
//!
//! ## Error Categories
//! - **Container Errors**: malformed su3 bytes, fields too long for the header
//! - **Signature Errors**: unknown algorithm, structurally broken signature, cryptographic mismatch, wrong key family
//! - **Identity Errors**: certificate missing or unparsable, no signing key
//! - **Cache Errors**: no generation installed yet, failed or cancelled rebuild
//!
//! None of these are fatal to a running server: decode and verify failures are
//! reported to the caller, a failed rebuild keeps the previous generation in service.
//!
//! Copyrights © 2025 Reseed Contributors. All rights reserved.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReseedError {
    #[error("Malformed su3 container: {0}")]
    MalformedContainer(String),

    #[error("su3 field does not fit its header length field")]
    FieldTooLong,

    #[error("Unsupported signature type {0}")]
    UnsupportedAlgorithm(u16),

    #[error("Signature does not match the signed content")]
    InvalidSignature,

    #[error("Signature is not a valid DER encoded (r, s) pair")]
    MalformedSignature,

    #[error("Key type does not match the signature type")]
    KeyTypeMismatch,

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Certificate not found at {0}")]
    CertificateNotFound(PathBuf),

    #[error("Malformed certificate: {0}")]
    MalformedCertificate(String),

    #[error("No signing key available")]
    MissingSigningKey,

    #[error("Malformed zip archive: {0}")]
    MalformedArchive(String),

    #[error("Bundle cache is not ready")]
    CacheNotReady,

    #[error("Rebuild failed: {0}")]
    RebuildFailed(String),

    #[error("Rebuild cancelled")]
    RebuildCancelled,
}
