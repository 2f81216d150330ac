use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use x509_cert::Certificate;

use super::super::constants::RESEED_PURPOSE;
use super::super::reseed_errors::ReseedError;
use super::super::utils::signer_filename;
use super::certificate::decode_certificate;

/// Directory of trusted signer certificates, laid out as `<path>/<purpose>/<signer file>.crt`.
#[derive(Debug, Clone)]
pub struct KeyStore {
    pub path: PathBuf,
}

impl KeyStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Certificate of a reseed signer.
    pub fn reseeder_certificate(&self, signer_id: &str) -> Result<Certificate> {
        self.dir_reseeder_certificate(RESEED_PURPOSE, signer_id)
    }

    /// Certificate of `signer_id` under the `purpose` namespace (e.g. "reseed", "router").
    pub fn dir_reseeder_certificate(&self, purpose: &str, signer_id: &str) -> Result<Certificate> {
        let path = self.certificate_path(purpose, signer_id);
        if !path.is_file() {
            return Err(ReseedError::CertificateNotFound(path).into());
        }

        let contents = fs::read(&path)?;
        let block = pem::parse(&contents).map_err(|e| ReseedError::MalformedCertificate(format!("{}: {e}", path.display())))?;
        decode_certificate(&block)
    }

    pub fn certificate_path(&self, purpose: &str, signer_id: &str) -> PathBuf {
        self.path.join(purpose).join(signer_filename(signer_id))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::certificate::test::test_identity;
    use tempfile::tempdir;

    fn error_of(result: Result<Certificate>) -> ReseedError {
        result.expect_err("lookup should fail").downcast::<ReseedError>().expect("should be a ReseedError")
    }

    #[test]
    fn test_resolve_saved_certificate() {
        let dir = tempdir().unwrap();
        let identity = test_identity("a@b.i2p");
        identity.save(dir.path().join("reseed")).unwrap();

        let store = KeyStore::new(dir.path());
        let certificate = store.reseeder_certificate("a@b.i2p").unwrap();
        assert_eq!(certificate, identity.certificate);
        assert_eq!(store.certificate_path("reseed", "a@b.i2p"), dir.path().join("reseed").join("a_at_b.i2p.crt"));
    }

    #[test]
    fn test_other_purpose() {
        let dir = tempdir().unwrap();
        let identity = test_identity("news@b.i2p");
        identity.save(dir.path().join("news")).unwrap();

        let store = KeyStore::new(dir.path());
        assert!(store.dir_reseeder_certificate("news", "news@b.i2p").is_ok());
        assert!(matches!(error_of(store.reseeder_certificate("news@b.i2p")), ReseedError::CertificateNotFound(_)));
    }

    #[test]
    fn test_missing_certificate() {
        let dir = tempdir().unwrap();
        let store = KeyStore::new(dir.path());
        let err = error_of(store.reseeder_certificate("nobody@b.i2p"));
        assert!(matches!(err, ReseedError::CertificateNotFound(path) if path.ends_with("nobody_at_b.i2p.crt")));
    }

    #[test]
    fn test_malformed_certificate() {
        let dir = tempdir().unwrap();
        let reseed_dir = dir.path().join("reseed");
        fs::create_dir_all(&reseed_dir).unwrap();
        let store = KeyStore::new(dir.path());

        fs::write(reseed_dir.join("garbage_at_b.i2p.crt"), b"not a pem file").unwrap();
        assert!(matches!(error_of(store.reseeder_certificate("garbage@b.i2p")), ReseedError::MalformedCertificate(_)));

        let bad_der = pem::encode(&pem::Pem::new("CERTIFICATE", vec![0x30, 0x03, 0x02, 0x01, 0x01]));
        fs::write(reseed_dir.join("baddata_at_b.i2p.crt"), bad_der).unwrap();
        assert!(matches!(error_of(store.reseeder_certificate("baddata@b.i2p")), ReseedError::MalformedCertificate(_)));
    }
}
