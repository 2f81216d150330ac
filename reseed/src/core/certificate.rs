//! # Reseed Signing Identity Module
//!
//! A `SigningIdentity` is the long lived key pair of a reseed operator together with
//! its self-signed X.509 certificate. The certificate is what routers ship in their
//! keystore to verify su3 bundles; the private key never leaves the server.
//!
//! ## Certificate profile
//! - Subject: `C=XX, O=I2P Anonymous Network, OU=I2P, L=XX, CN=<signer id>`, issuer = subject
//! - Validity: 10 years from issuance
//! - BasicConstraints `CA=true`, KeyUsage `digitalSignature | keyCertSign`
//! - ExtendedKeyUsage `clientAuth, serverAuth`
//! - SubjectKeyIdentifier = signer id bytes
//!
//! Certificates can be issued for RSA (SHA256withRSA), P-256 and P-384 keys.
//!
//! ## On disk
//! `<signer file>.pem` holds the private key (PKCS#1 `RSA PRIVATE KEY`) followed by
//! the certificate, `<signer file>.crt` holds the certificate alone. The signer file
//! name replaces the first `@` of the signer id with `_at_`.
//!
//! Copyrights © 2025 Reseed Contributors. All rights reserved.

use anyhow::Result;
use const_oid::ObjectIdentifier;
use der::asn1::{Any, OctetString, SetOfVec};
use der::{Decode, Encode, Tag};
use ecdsa::signature::{Keypair, Signer};
use p256::NistP256;
use p384::NistP384;
use pem::Pem;
use rand::RngCore;
use rand::rngs::OsRng;
use rsa::RsaPrivateKey;
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::pkcs8::DecodePrivateKey;
use sha2::Sha256;
use spki::{DynSignatureAlgorithmIdentifier, EncodePublicKey, SignatureBitStringEncoding, SubjectPublicKeyInfoOwned};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use x509_cert::Certificate;
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::builder::{Builder, CertificateBuilder, Profile};
use x509_cert::ext::pkix::{BasicConstraints, ExtendedKeyUsage, KeyUsage, KeyUsages, SubjectKeyIdentifier};
use x509_cert::name::{Name, RdnSequence, RelativeDistinguishedName};
use x509_cert::serial_number::SerialNumber;
use x509_cert::time::Validity;

use super::super::constants::{CERT_COUNTRY, CERT_LOCALITY, CERT_ORGANIZATION, CERT_ORGANIZATIONAL_UNIT, CERT_VALIDITY};
use super::super::reseed_errors::ReseedError;
use super::super::utils::signer_file_stem;
use super::su3_signature::{PrivateKey, PublicKey};

const OID_COUNTRY: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.6");
const OID_ORGANIZATION: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.10");
const OID_ORGANIZATIONAL_UNIT: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.11");
const OID_LOCALITY: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.7");
const OID_COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");
const OID_KP_SERVER_AUTH: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.3.1");
const OID_KP_CLIENT_AUTH: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.3.2");

const PEM_RSA_PRIVATE_KEY: &str = "RSA PRIVATE KEY";
const PEM_PRIVATE_KEY: &str = "PRIVATE KEY";
const PEM_CERTIFICATE: &str = "CERTIFICATE";

/// Private key plus self-signed certificate of a reseed operator.
#[derive(Debug, Clone)]
pub struct SigningIdentity {
    pub signer_id: String,
    pub private_key: PrivateKey,
    pub certificate: Certificate,
}

impl SigningIdentity {
    /// Wrap an existing key, issuing a fresh certificate for it.
    pub fn new(signer_id: &str, private_key: PrivateKey) -> Result<Self> {
        let certificate = issue_self_signed_certificate(signer_id, &private_key)?;
        Ok(Self {
            signer_id: signer_id.to_string(),
            private_key,
            certificate,
        })
    }

    pub fn generate_rsa(signer_id: &str, bits: usize) -> Result<Self> {
        let key = RsaPrivateKey::new(&mut OsRng, bits).map_err(|e| ReseedError::SigningFailed(e.to_string()))?;
        Self::new(signer_id, PrivateKey::Rsa(key))
    }

    pub fn public_key(&self) -> PublicKey {
        self.private_key.public_key()
    }

    /// Load a key file. A certificate block next to the key is used as is,
    /// otherwise a new one is issued for `signer_id`.
    pub fn load<P: AsRef<Path>>(path: P, signer_id: &str) -> Result<Self> {
        let contents = fs::read(path.as_ref())?;
        let blocks = pem::parse_many(&contents).map_err(|e| ReseedError::MalformedCertificate(e.to_string()))?;

        let private_key = blocks
            .iter()
            .find_map(|block| match block.tag() {
                PEM_RSA_PRIVATE_KEY | PEM_PRIVATE_KEY => Some(decode_private_key(block)),
                _ => None,
            })
            .ok_or(ReseedError::MissingSigningKey)??;

        match blocks.iter().find(|block| block.tag() == PEM_CERTIFICATE) {
            Some(block) => Ok(Self {
                signer_id: signer_id.to_string(),
                private_key,
                certificate: decode_certificate(block)?,
            }),
            None => Self::new(signer_id, private_key),
        }
    }

    /// Write `<signer file>.pem` (key and certificate) and `<signer file>.crt` into `dir`.
    /// Returns the key file path.
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf> {
        let key_block = match &self.private_key {
            PrivateKey::Rsa(key) => {
                let der = key.to_pkcs1_der().map_err(|e| ReseedError::SigningFailed(e.to_string()))?;
                Pem::new(PEM_RSA_PRIVATE_KEY, der.as_bytes().to_vec())
            }
            _ => return Err(ReseedError::KeyTypeMismatch.into()),
        };
        let cert_pem = self.certificate_pem()?;

        fs::create_dir_all(dir.as_ref())?;
        let stem = signer_file_stem(&self.signer_id);
        let key_path = dir.as_ref().join(format!("{stem}.pem"));
        let cert_path = dir.as_ref().join(format!("{stem}.crt"));

        fs::write(&key_path, format!("{}{cert_pem}", pem::encode(&key_block)))?;
        restrict_permissions(&key_path)?;
        fs::write(&cert_path, cert_pem)?;

        info!(signer = %self.signer_id, key = %key_path.display(), "saved signing identity");
        Ok(key_path)
    }

    /// Load the identity stored under `dir`, generating and saving a new RSA one if absent.
    pub fn load_or_create<P: AsRef<Path>>(dir: P, signer_id: &str, bits: usize) -> Result<Self> {
        let key_path = dir.as_ref().join(format!("{}.pem", signer_file_stem(signer_id)));
        if key_path.exists() {
            return Self::load(&key_path, signer_id);
        }

        info!(signer = %signer_id, bits, "generating new signing identity");
        let identity = Self::generate_rsa(signer_id, bits)?;
        identity.save(dir)?;
        Ok(identity)
    }

    pub fn certificate_pem(&self) -> Result<String> {
        let der = self.certificate.to_der().map_err(|e| ReseedError::MalformedCertificate(e.to_string()))?;
        Ok(pem::encode(&Pem::new(PEM_CERTIFICATE, der)))
    }
}

fn decode_private_key(block: &Pem) -> Result<PrivateKey> {
    let invalid = |e: String| ReseedError::MalformedCertificate(format!("invalid private key: {e}"));

    if block.tag() == PEM_RSA_PRIVATE_KEY {
        let key = RsaPrivateKey::from_pkcs1_der(block.contents()).map_err(|e| invalid(e.to_string()))?;
        return Ok(PrivateKey::Rsa(key));
    }

    if let Ok(key) = RsaPrivateKey::from_pkcs8_der(block.contents()) {
        return Ok(PrivateKey::Rsa(key));
    }
    if let Ok(key) = ecdsa::SigningKey::<NistP256>::from_pkcs8_der(block.contents()) {
        return Ok(PrivateKey::EcdsaP256(key));
    }
    if let Ok(key) = ecdsa::SigningKey::<NistP384>::from_pkcs8_der(block.contents()) {
        return Ok(PrivateKey::EcdsaP384(key));
    }
    Err(invalid("unsupported PKCS#8 key".to_string()).into())
}

/// Parse one PEM `CERTIFICATE` block.
pub fn decode_certificate(block: &Pem) -> Result<Certificate> {
    if block.tag() != PEM_CERTIFICATE {
        return Err(ReseedError::MalformedCertificate(format!("unexpected PEM block {}", block.tag())).into());
    }
    Certificate::from_der(block.contents()).map_err(|e| ReseedError::MalformedCertificate(e.to_string()).into())
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

fn rdn(oid: ObjectIdentifier, tag: Tag, value: &str) -> Result<RelativeDistinguishedName> {
    let value = Any::new(tag, value.as_bytes()).map_err(certificate_error)?;
    let set = SetOfVec::try_from(vec![AttributeTypeAndValue { oid, value }]).map_err(certificate_error)?;
    Ok(RelativeDistinguishedName(set))
}

// built attribute by attribute, a signer id may contain ',' '+' or '='
fn signer_name(signer_id: &str) -> Result<Name> {
    Ok(RdnSequence(vec![
        rdn(OID_COUNTRY, Tag::PrintableString, CERT_COUNTRY)?,
        rdn(OID_ORGANIZATION, Tag::Utf8String, CERT_ORGANIZATION)?,
        rdn(OID_ORGANIZATIONAL_UNIT, Tag::Utf8String, CERT_ORGANIZATIONAL_UNIT)?,
        rdn(OID_LOCALITY, Tag::Utf8String, CERT_LOCALITY)?,
        rdn(OID_COMMON_NAME, Tag::Utf8String, signer_id)?,
    ]))
}

fn random_serial() -> Result<SerialNumber> {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    // positive and without a leading zero byte
    bytes[0] = (bytes[0] & 0x7f) | 0x01;
    SerialNumber::new(&bytes).map_err(certificate_error)
}

fn certificate_error<E: std::fmt::Display>(err: E) -> anyhow::Error {
    ReseedError::SigningFailed(format!("certificate: {err}")).into()
}

fn build_certificate<S, Signature>(signer: &S, signer_id: &str, public_key: SubjectPublicKeyInfoOwned) -> Result<Certificate>
where
    S: Keypair + DynSignatureAlgorithmIdentifier + Signer<Signature>,
    S::VerifyingKey: EncodePublicKey,
    Signature: SignatureBitStringEncoding,
{
    let validity = Validity::from_now(CERT_VALIDITY).map_err(certificate_error)?;
    let subject = signer_name(signer_id)?;

    let mut builder = CertificateBuilder::new(Profile::Manual { issuer: None }, random_serial()?, validity, subject, public_key, signer)
        .map_err(certificate_error)?;

    builder
        .add_extension(&BasicConstraints {
            ca: true,
            path_len_constraint: None,
        })
        .map_err(certificate_error)?;
    builder
        .add_extension(&KeyUsage(KeyUsages::DigitalSignature | KeyUsages::KeyCertSign))
        .map_err(certificate_error)?;
    builder
        .add_extension(&ExtendedKeyUsage(vec![OID_KP_CLIENT_AUTH, OID_KP_SERVER_AUTH]))
        .map_err(certificate_error)?;
    let key_id = OctetString::new(signer_id.as_bytes()).map_err(certificate_error)?;
    builder.add_extension(&SubjectKeyIdentifier(key_id)).map_err(certificate_error)?;

    builder.build::<Signature>().map_err(certificate_error)
}

/// Issue the self-signed certificate of a signing identity.
pub fn issue_self_signed_certificate(signer_id: &str, private_key: &PrivateKey) -> Result<Certificate> {
    match private_key {
        PrivateKey::Rsa(key) => {
            let public_key = SubjectPublicKeyInfoOwned::from_key(key.to_public_key()).map_err(certificate_error)?;
            let signer = rsa::pkcs1v15::SigningKey::<Sha256>::new(key.clone());
            build_certificate::<_, rsa::pkcs1v15::Signature>(&signer, signer_id, public_key)
        }
        PrivateKey::EcdsaP256(key) => {
            let public_key = SubjectPublicKeyInfoOwned::from_key(key.verifying_key().clone()).map_err(certificate_error)?;
            build_certificate::<_, ecdsa::der::Signature<NistP256>>(key, signer_id, public_key)
        }
        PrivateKey::EcdsaP384(key) => {
            let public_key = SubjectPublicKeyInfoOwned::from_key(key.verifying_key().clone()).map_err(certificate_error)?;
            build_certificate::<_, ecdsa::der::Signature<NistP384>>(key, signer_id, public_key)
        }
        PrivateKey::EcdsaP521(_) | PrivateKey::Dsa(_) => Err(ReseedError::KeyTypeMismatch.into()),
    }
}
