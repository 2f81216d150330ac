use anyhow::{Result, anyhow};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::constants::{CERTIFICATE_EXTENSION, SIGNER_AT_REPLACEMENT};

/// Returns the current time as a u64 timestamp in seconds since the UNIX epoch.
pub fn current_time_as_u64() -> Result<u64> {
    if let Ok(time) = SystemTime::now().duration_since(UNIX_EPOCH) {
        return Ok(time.as_secs());
    }
    Err(anyhow!("Time went backwards"))
}

/// Base file name (without extension) used to store a signer's key material.
/// `"a@b.i2p"` becomes `"a_at_b.i2p"`; only the first `@` is replaced.
pub fn signer_file_stem(signer_id: &str) -> String {
    let replaced = signer_id.replacen('@', SIGNER_AT_REPLACEMENT, 1);

    // a signer id must never walk out of the keystore directory
    match Path::new(&replaced).file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        // no final component, e.g. "..", "x/.." or "/"
        None => replaced.replace(['/', '\\', '.'], "_"),
    }
}

/// Certificate file name of a signer, e.g. `"a_at_b.i2p.crt"`.
pub fn signer_filename(signer_id: &str) -> String {
    format!("{}{CERTIFICATE_EXTENSION}", signer_file_stem(signer_id))
}
