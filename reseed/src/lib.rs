//! # Reseed
//!
//! Core of an I2P reseed server: hands bootstrapping routers a signed bundle of
//! router descriptors taken from a local netDb.
//!
//! The building blocks are
//!     1. the su3 container codec with signing and verification (`core::su3_file`).
//!     2. RSA, ECDSA and DSA signatures over su3 bodies (`core::su3_signature`).
//!     3. signer identities and self-signed certificates (`core::certificate`, `core::keystore`).
//!     4. router descriptor discovery with an age cutoff (`core::netdb`).
//!     5. zip bundling of descriptors into signed su3 files (`core::seeds`).
//!     6. a generation cache with per-peer deterministic lookup (`core::su3_cache`),
//!         rebuilt periodically by the `Reseeder`.
//!
//! Copyrights © 2025 Reseed Contributors. All rights reserved.

pub mod config;
pub mod constants;
pub mod core;
pub mod prelude;
pub mod reseed_errors;
pub mod reseeder;
pub mod utils;
pub mod verify;

pub use prelude::*;
