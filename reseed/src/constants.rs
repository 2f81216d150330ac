//! # Reseed Constants Module
//!
//! Wire constants of the su3 container and the operational defaults used by the
//! bundle builder and the rebuild loop.
//!
//! The su3 header is a fixed 40 byte layout (all integers big-endian), followed by
//! the variable length version, signer id, content and signature fields. Offsets
//! are kept here so the codec and its tests agree on one table.
//!
//! Copyrights © 2025 Reseed Contributors. All rights reserved.

use std::time::Duration;

pub const SU3_MAGIC: &[u8; 6] = b"I2Psu3";
pub const SU3_HEADER_SIZE: usize = 40;
pub const SU3_MIN_VERSION_LENGTH: usize = 16;

pub const OFFSET_FORMAT: usize = 7;
pub const OFFSET_SIGNATURE_TYPE: usize = 8;
pub const OFFSET_SIGNATURE_LENGTH: usize = 10;
pub const OFFSET_VERSION_LENGTH: usize = 13;
pub const OFFSET_SIGNER_ID_LENGTH: usize = 15;
pub const OFFSET_CONTENT_LENGTH: usize = 16;
pub const OFFSET_FILE_TYPE: usize = 25;
pub const OFFSET_CONTENT_TYPE: usize = 27;

// DER length of a signature depends on the leading bits of r and s
pub const MAX_SIGN_ATTEMPTS: usize = 32;

pub const SIGNER_AT_REPLACEMENT: &str = "_at_";
pub const CERTIFICATE_EXTENSION: &str = ".crt";
pub const RESEED_PURPOSE: &str = "reseed";

pub const CERT_ORGANIZATION: &str = "I2P Anonymous Network";
pub const CERT_ORGANIZATIONAL_UNIT: &str = "I2P";
pub const CERT_COUNTRY: &str = "XX";
pub const CERT_LOCALITY: &str = "XX";
pub const CERT_VALIDITY: Duration = Duration::from_secs(3652 * 24 * 60 * 60); // 10 years
pub const DEFAULT_RSA_BITS: usize = 4096;

pub const ROUTER_INFO_PREFIX: &str = "routerInfo-";
pub const ROUTER_INFO_SUFFIX: &str = ".dat";

pub const DEFAULT_NUM_RI: usize = 77;
pub const DEFAULT_NUM_SU3: usize = 0; // 0 -> derived from netDb size
pub const DEFAULT_MAX_ROUTER_INFO_AGE: Duration = Duration::from_secs(72 * 60 * 60);
pub const DEFAULT_REBUILD_INTERVAL: Duration = Duration::from_secs(90 * 60 * 60);

/// (netDb size strictly above, bundle count) pairs, checked in order
pub const AUTO_SU3_TIERS: [(usize, usize); 4] = [(4000, 300), (3000, 200), (2000, 100), (1000, 75)];
pub const AUTO_SU3_MINIMUM: usize = 50;
