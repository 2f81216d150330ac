//! # Reseed Configuration Module
//!
//! Settings of a reseed server, stored as a TOML file (`ReseedConfig.toml` by default).
//! Durations are written as whole seconds.
//!
//! ```toml
//! netdb = "/var/lib/i2p/netDb"
//! max_router_info_age = 259200   # 72h
//! num_ri = 77
//! num_su3 = 0                    # 0 -> derived from the netDb size
//! rebuild_interval = 324000      # 90h
//! signer = "you@mail.i2p"
//! signing_key = "/etc/reseed/you_at_mail.i2p.pem"
//! signature_type = 6             # RSA-SHA512-4096
//! ```
//!
//! Copyrights © 2025 Reseed Contributors. All rights reserved.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_with::{DurationSeconds, serde_as};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{DEFAULT_MAX_ROUTER_INFO_AGE, DEFAULT_NUM_RI, DEFAULT_NUM_SU3, DEFAULT_REBUILD_INTERVAL};
use crate::core::su3_file::SignatureType;

pub const DEFAULT_CONFIG_FILE: &str = "ReseedConfig.toml";

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReseedConfig {
    pub netdb: PathBuf,                  // root of the router info directory
    #[serde_as(as = "DurationSeconds<u64>")]
    pub max_router_info_age: Duration,   // older router infos are never bundled
    pub num_ri: usize,                   // router infos per su3 bundle
    pub num_su3: usize,                  // cached bundles, 0 for automatic
    #[serde_as(as = "DurationSeconds<u64>")]
    pub rebuild_interval: Duration,      // time between two cache rebuilds
    pub signer: String,                  // signer id, e.g. "you@mail.i2p"
    pub signing_key: Option<PathBuf>,    // PEM file with the signer's private key
    pub signature_type: SignatureType,
}

impl Default for ReseedConfig {
    fn default() -> Self {
        Self {
            netdb: PathBuf::from("netDb"),
            max_router_info_age: DEFAULT_MAX_ROUTER_INFO_AGE,
            num_ri: DEFAULT_NUM_RI,
            num_su3: DEFAULT_NUM_SU3,
            rebuild_interval: DEFAULT_REBUILD_INTERVAL,
            signer: String::new(),
            signing_key: None,
            signature_type: SignatureType::default(),
        }
    }
}

impl ReseedConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<ReseedConfig> {
        read_toml_file(path.as_ref())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_toml_file(path.as_ref(), self)
    }
}

fn write_toml_file(path: &Path, config: &ReseedConfig) -> Result<()> {
    let toml_string = toml::to_string(config)?;
    let mut file = File::create(path)?;
    file.write_all(toml_string.as_bytes())?;
    Ok(())
}

fn read_toml_file(path: &Path) -> Result<ReseedConfig> {
    let contents = fs::read_to_string(path)?;
    let config: ReseedConfig = toml::from_str(&contents)?;
    Ok(config)
}
