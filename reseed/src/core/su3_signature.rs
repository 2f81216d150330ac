//! Signature engine for su3 containers.
//!
//! One sign/verify pair per algorithm family, selected by the `SignatureType`
//! announced in the container header:
//! - RSA: SHA-256/384/512 digest, PKCS#1 v1.5, signature as long as the modulus
//! - ECDSA: SHA width matching the curve, DER `SEQUENCE { r, s }`
//! - DSA: SHA-1, same DER shape as ECDSA
//!
//! A key of the wrong family for the announced type is a `KeyTypeMismatch`,
//! an unknown type is always `UnsupportedAlgorithm`.

use anyhow::Result;
use const_oid::{AssociatedOid, ObjectIdentifier};
use der::Encode;
use ecdsa::signature::{DigestVerifier, RandomizedDigestSigner, RandomizedSigner, SignatureEncoding, Verifier};
use p256::NistP256;
use p384::NistP384;
use rand::rngs::OsRng;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};
use spki::DecodePublicKey;
use std::fmt;
use x509_cert::Certificate;

use super::super::reseed_errors::ReseedError;
use super::su3_file::SignatureType;

pub const OID_RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
pub const OID_DSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10040.4.1");
pub const OID_EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
pub const OID_SECP256R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");
pub const OID_SECP384R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.34");
pub const OID_SECP521R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.35");

/// Private half of a signing identity.
#[derive(Clone)]
pub enum PrivateKey {
    Rsa(RsaPrivateKey),
    EcdsaP256(ecdsa::SigningKey<NistP256>),
    EcdsaP384(ecdsa::SigningKey<NistP384>),
    EcdsaP521(p521::ecdsa::SigningKey),
    Dsa(dsa::SigningKey),
}

/// Public key taken from a certificate, used to verify.
#[derive(Clone)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
    EcdsaP256(ecdsa::VerifyingKey<NistP256>),
    EcdsaP384(ecdsa::VerifyingKey<NistP384>),
    EcdsaP521(p521::ecdsa::VerifyingKey),
    Dsa(dsa::VerifyingKey),
}

impl PrivateKey {
    pub fn family(&self) -> &'static str {
        match self {
            PrivateKey::Rsa(_) => "RSA",
            PrivateKey::EcdsaP256(_) => "ECDSA-P256",
            PrivateKey::EcdsaP384(_) => "ECDSA-P384",
            PrivateKey::EcdsaP521(_) => "ECDSA-P521",
            PrivateKey::Dsa(_) => "DSA",
        }
    }

    pub fn public_key(&self) -> PublicKey {
        match self {
            PrivateKey::Rsa(key) => PublicKey::Rsa(key.to_public_key()),
            PrivateKey::EcdsaP256(key) => PublicKey::EcdsaP256(key.verifying_key().clone()),
            PrivateKey::EcdsaP384(key) => PublicKey::EcdsaP384(key.verifying_key().clone()),
            PrivateKey::EcdsaP521(key) => PublicKey::EcdsaP521(p521::ecdsa::VerifyingKey::from(key)),
            PrivateKey::Dsa(key) => PublicKey::Dsa(key.verifying_key().clone()),
        }
    }

    /// Expected signature length for `signature_type`. Exact for RSA, a typical
    /// DER length for DSA and ECDSA.
    pub fn signature_length_hint(&self, signature_type: SignatureType) -> Result<usize> {
        check_pairing(signature_type, self.family())?;
        Ok(match self {
            PrivateKey::Rsa(key) => key.size(),
            PrivateKey::EcdsaP256(_) => 71,
            PrivateKey::EcdsaP384(_) => 103,
            PrivateKey::EcdsaP521(_) => 138,
            PrivateKey::Dsa(_) => 46,
        })
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey({})", self.family())
    }
}

impl PublicKey {
    pub fn family(&self) -> &'static str {
        match self {
            PublicKey::Rsa(_) => "RSA",
            PublicKey::EcdsaP256(_) => "ECDSA-P256",
            PublicKey::EcdsaP384(_) => "ECDSA-P384",
            PublicKey::EcdsaP521(_) => "ECDSA-P521",
            PublicKey::Dsa(_) => "DSA",
        }
    }

    /// Extract the subject public key of an X.509 certificate.
    pub fn from_certificate(certificate: &Certificate) -> Result<Self> {
        let spki = &certificate.tbs_certificate.subject_public_key_info;
        let algorithm = spki.algorithm.oid;
        let raw = spki
            .subject_public_key
            .as_bytes()
            .ok_or_else(|| ReseedError::MalformedCertificate("public key bit string is not byte aligned".to_string()))?;

        if algorithm == OID_RSA_ENCRYPTION {
            let key = RsaPublicKey::from_pkcs1_der(raw).map_err(|e| ReseedError::MalformedCertificate(e.to_string()))?;
            return Ok(PublicKey::Rsa(key));
        }

        if algorithm == OID_EC_PUBLIC_KEY {
            let curve = spki
                .algorithm
                .parameters
                .as_ref()
                .and_then(|parameters| parameters.decode_as::<ObjectIdentifier>().ok())
                .ok_or_else(|| ReseedError::MalformedCertificate("missing named curve".to_string()))?;
            let invalid_point = |_| ReseedError::MalformedCertificate("invalid curve point".to_string());

            return if curve == OID_SECP256R1 {
                Ok(PublicKey::EcdsaP256(ecdsa::VerifyingKey::from_sec1_bytes(raw).map_err(invalid_point)?))
            } else if curve == OID_SECP384R1 {
                Ok(PublicKey::EcdsaP384(ecdsa::VerifyingKey::from_sec1_bytes(raw).map_err(invalid_point)?))
            } else if curve == OID_SECP521R1 {
                Ok(PublicKey::EcdsaP521(p521::ecdsa::VerifyingKey::from_sec1_bytes(raw).map_err(invalid_point)?))
            } else {
                Err(ReseedError::MalformedCertificate(format!("unsupported curve {curve}")).into())
            };
        }

        if algorithm == OID_DSA {
            let spki_der = spki.to_der().map_err(|e| ReseedError::MalformedCertificate(e.to_string()))?;
            let key = dsa::VerifyingKey::from_public_key_der(&spki_der).map_err(|e| ReseedError::MalformedCertificate(e.to_string()))?;
            return Ok(PublicKey::Dsa(key));
        }

        Err(ReseedError::MalformedCertificate(format!("unsupported public key algorithm {algorithm}")).into())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.family())
    }
}

/// Key family a signature type requires, `UnsupportedAlgorithm` for unknown types.
fn required_family(signature_type: SignatureType) -> Result<&'static str> {
    match signature_type {
        SignatureType::DsaSha1 => Ok("DSA"),
        SignatureType::EcdsaSha256P256 => Ok("ECDSA-P256"),
        SignatureType::EcdsaSha384P384 => Ok("ECDSA-P384"),
        SignatureType::EcdsaSha512P521 => Ok("ECDSA-P521"),
        SignatureType::RsaSha256_2048 | SignatureType::RsaSha384_3072 | SignatureType::RsaSha512_4096 => Ok("RSA"),
        SignatureType::Unknown(code) => Err(ReseedError::UnsupportedAlgorithm(code).into()),
    }
}

fn check_pairing(signature_type: SignatureType, family: &str) -> Result<()> {
    if required_family(signature_type)? != family {
        return Err(ReseedError::KeyTypeMismatch.into());
    }
    Ok(())
}

fn signing_failed<E: fmt::Display>(err: E) -> anyhow::Error {
    ReseedError::SigningFailed(err.to_string()).into()
}

fn rsa_sign<D: Digest + AssociatedOid>(key: &RsaPrivateKey, message: &[u8]) -> Result<Vec<u8>> {
    key.sign(Pkcs1v15Sign::new::<D>(), &D::digest(message)).map_err(signing_failed)
}

fn rsa_verify<D: Digest + AssociatedOid>(key: &RsaPublicKey, message: &[u8], signature: &[u8]) -> Result<()> {
    key.verify(Pkcs1v15Sign::new::<D>(), &D::digest(message), signature)
        .map_err(|_| ReseedError::InvalidSignature.into())
}

/// Sign `message` (the su3 body bytes) with the algorithm named by `signature_type`.
pub fn sign_message(private_key: &PrivateKey, signature_type: SignatureType, message: &[u8]) -> Result<Vec<u8>> {
    check_pairing(signature_type, private_key.family())?;

    match (signature_type, private_key) {
        (SignatureType::RsaSha256_2048, PrivateKey::Rsa(key)) => rsa_sign::<Sha256>(key, message),
        (SignatureType::RsaSha384_3072, PrivateKey::Rsa(key)) => rsa_sign::<Sha384>(key, message),
        (SignatureType::RsaSha512_4096, PrivateKey::Rsa(key)) => rsa_sign::<Sha512>(key, message),
        (SignatureType::EcdsaSha256P256, PrivateKey::EcdsaP256(key)) => {
            let signature: ecdsa::Signature<NistP256> = key.try_sign_with_rng(&mut OsRng, message).map_err(signing_failed)?;
            Ok(signature.to_der().as_bytes().to_vec())
        }
        (SignatureType::EcdsaSha384P384, PrivateKey::EcdsaP384(key)) => {
            let signature: ecdsa::Signature<NistP384> = key.try_sign_with_rng(&mut OsRng, message).map_err(signing_failed)?;
            Ok(signature.to_der().as_bytes().to_vec())
        }
        (SignatureType::EcdsaSha512P521, PrivateKey::EcdsaP521(key)) => {
            let signature: p521::ecdsa::Signature = key.try_sign_with_rng(&mut OsRng, message).map_err(signing_failed)?;
            Ok(signature.to_der().as_bytes().to_vec())
        }
        (SignatureType::DsaSha1, PrivateKey::Dsa(key)) => {
            let signature: dsa::Signature = key
                .try_sign_digest_with_rng(&mut OsRng, Sha1::new_with_prefix(message))
                .map_err(signing_failed)?;
            Ok(signature.to_vec())
        }
        _ => Err(ReseedError::KeyTypeMismatch.into()),
    }
}

/// Verify `signature` over `message`. Structural failures (`MalformedSignature`) are
/// reported apart from cryptographic ones (`InvalidSignature`).
pub fn verify_signature(public_key: &PublicKey, signature_type: SignatureType, message: &[u8], signature: &[u8]) -> Result<()> {
    check_pairing(signature_type, public_key.family())?;

    match (signature_type, public_key) {
        (SignatureType::RsaSha256_2048, PublicKey::Rsa(key)) => rsa_verify::<Sha256>(key, message, signature),
        (SignatureType::RsaSha384_3072, PublicKey::Rsa(key)) => rsa_verify::<Sha384>(key, message, signature),
        (SignatureType::RsaSha512_4096, PublicKey::Rsa(key)) => rsa_verify::<Sha512>(key, message, signature),
        (SignatureType::EcdsaSha256P256, PublicKey::EcdsaP256(key)) => {
            let signature = ecdsa::Signature::<NistP256>::from_der(signature).map_err(|_| ReseedError::MalformedSignature)?;
            key.verify(message, &signature).map_err(|_| ReseedError::InvalidSignature.into())
        }
        (SignatureType::EcdsaSha384P384, PublicKey::EcdsaP384(key)) => {
            let signature = ecdsa::Signature::<NistP384>::from_der(signature).map_err(|_| ReseedError::MalformedSignature)?;
            key.verify(message, &signature).map_err(|_| ReseedError::InvalidSignature.into())
        }
        (SignatureType::EcdsaSha512P521, PublicKey::EcdsaP521(key)) => {
            let signature = p521::ecdsa::Signature::from_der(signature).map_err(|_| ReseedError::MalformedSignature)?;
            key.verify(message, &signature).map_err(|_| ReseedError::InvalidSignature.into())
        }
        (SignatureType::DsaSha1, PublicKey::Dsa(key)) => {
            let signature = dsa::Signature::try_from(signature).map_err(|_| ReseedError::MalformedSignature)?;
            key.verify_digest(Sha1::new_with_prefix(message), &signature)
                .map_err(|_| ReseedError::InvalidSignature.into())
        }
        _ => Err(ReseedError::KeyTypeMismatch.into()),
    }
}

/// Verify against the subject public key of `certificate`.
pub fn verify_with_certificate(certificate: &Certificate, signature_type: SignatureType, message: &[u8], signature: &[u8]) -> Result<()> {
    required_family(signature_type)?;
    let public_key = PublicKey::from_certificate(certificate)?;
    verify_signature(&public_key, signature_type, message, signature)
}
