//! Offline verification of su3 files, as used by operators and the `verify` tool.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::core::keystore::KeyStore;
use crate::core::su3_file::Su3File;

pub const EXTRACTED_CONTENT_FILE: &str = "extracted.zip";

/// Outcome of checking one su3 file against a keystore.
#[derive(Debug)]
pub struct VerifyReport {
    pub su3: Su3File,
    pub signer: String,  // signer whose certificate was used
    pub summary: String, // human readable header dump
    pub outcome: Result<()>,
}

impl VerifyReport {
    pub fn is_valid(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Decode `bytes` and verify the signature with the certificate of `expected_signer`
/// (or the signer named in the file) found under `keystore/purpose`.
///
/// Bytes that do not decode are an error. Certificate lookup and signature failures
/// are reported in `VerifyReport::outcome` next to the header summary.
pub fn verify_su3(bytes: &[u8], expected_signer: Option<&str>, keystore: &KeyStore, purpose: &str) -> Result<VerifyReport> {
    let su3 = Su3File::from_bytes(bytes)?;
    let summary = su3.to_string();
    let signer = expected_signer.map_or_else(|| su3.signer_id_str(), str::to_string);

    info!(keystore = %keystore.path.display(), purpose, signer = %signer, "verifying su3");
    let outcome = keystore
        .dir_reseeder_certificate(purpose, &signer)
        .and_then(|certificate| su3.verify(&certificate));

    Ok(VerifyReport {
        su3,
        signer,
        summary,
        outcome,
    })
}

/// Write the content of a verified su3 file to `dir/extracted.zip`.
pub fn extract_content<P: AsRef<Path>>(su3: &Su3File, dir: P) -> Result<PathBuf> {
    let path = dir.as_ref().join(EXTRACTED_CONTENT_FILE);
    fs::write(&path, &su3.content)?;
    Ok(path)
}
