//! # Reseed su3 Container Module
//!
//! This module defines `Su3File`, the signed distribution unit handed to joining
//! routers. A container is a fixed 40 byte header followed by four variable length
//! fields: version, signer id, content and signature.
//!
//! ## Layout
//! ```text
//! 0   6  magic "I2Psu3"        16  8  content length
//! 7   1  format version        25  1  file type
//! 8   2  signature type        27  1  content type
//! 10  2  signature length      40  .. version | signer id | content | signature
//! 13  1  version length
//! 15  1  signer id length
//! ```
//! Unlisted header bytes are unused and written as zero. Integers are big-endian.
//!
//! ## Signing
//! The signature covers every byte before it ("body bytes"), header included. The
//! header announces the signature length, so the body can only be produced once the
//! signature length is known. `Su3File::sign` settles that length before the final
//! signature is stored.
//!
//! ## Design
//! - Decoding is total: short, truncated or foreign input is a `MalformedContainer`
//!   error, never a panic
//! - Unknown type codes are kept (`Unknown`/`Other`) so any well formed container decodes;
//!   algorithm dispatch rejects an unknown signature type later
//! - The version is zero padded to 16 bytes on encode and never truncated
//!
//! Copyrights © 2025 Reseed Contributors. All rights reserved.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use x509_cert::Certificate;

use super::super::constants::{
    MAX_SIGN_ATTEMPTS, OFFSET_CONTENT_LENGTH, OFFSET_CONTENT_TYPE, OFFSET_FILE_TYPE, OFFSET_FORMAT, OFFSET_SIGNATURE_LENGTH,
    OFFSET_SIGNATURE_TYPE, OFFSET_SIGNER_ID_LENGTH, OFFSET_VERSION_LENGTH, SU3_HEADER_SIZE, SU3_MAGIC, SU3_MIN_VERSION_LENGTH,
};
use super::super::reseed_errors::ReseedError;
use super::super::utils::current_time_as_u64;
use super::su3_signature::{PrivateKey, PublicKey, sign_message, verify_signature, verify_with_certificate};

/// Signature algorithm announced in the su3 header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "u16", into = "u16")]
pub enum SignatureType {
    DsaSha1,
    EcdsaSha256P256,
    EcdsaSha384P384,
    EcdsaSha512P521,
    RsaSha256_2048,
    RsaSha384_3072,
    #[default]
    RsaSha512_4096,
    Unknown(u16),
}

impl SignatureType {
    pub const ALL: [SignatureType; 7] = [
        SignatureType::DsaSha1,
        SignatureType::EcdsaSha256P256,
        SignatureType::EcdsaSha384P384,
        SignatureType::EcdsaSha512P521,
        SignatureType::RsaSha256_2048,
        SignatureType::RsaSha384_3072,
        SignatureType::RsaSha512_4096,
    ];

    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => SignatureType::DsaSha1,
            1 => SignatureType::EcdsaSha256P256,
            2 => SignatureType::EcdsaSha384P384,
            3 => SignatureType::EcdsaSha512P521,
            4 => SignatureType::RsaSha256_2048,
            5 => SignatureType::RsaSha384_3072,
            6 => SignatureType::RsaSha512_4096,
            other => SignatureType::Unknown(other),
        }
    }

    pub fn to_u16(self) -> u16 {
        match self {
            SignatureType::DsaSha1 => 0,
            SignatureType::EcdsaSha256P256 => 1,
            SignatureType::EcdsaSha384P384 => 2,
            SignatureType::EcdsaSha512P521 => 3,
            SignatureType::RsaSha256_2048 => 4,
            SignatureType::RsaSha384_3072 => 5,
            SignatureType::RsaSha512_4096 => 6,
            SignatureType::Unknown(other) => other,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SignatureType::DsaSha1 => "DSA-SHA1",
            SignatureType::EcdsaSha256P256 => "ECDSA-SHA256-P256",
            SignatureType::EcdsaSha384P384 => "ECDSA-SHA384-P384",
            SignatureType::EcdsaSha512P521 => "ECDSA-SHA512-P521",
            SignatureType::RsaSha256_2048 => "RSA-SHA256-2048",
            SignatureType::RsaSha384_3072 => "RSA-SHA384-3072",
            SignatureType::RsaSha512_4096 => "RSA-SHA512-4096",
            SignatureType::Unknown(_) => "UNKNOWN",
        }
    }
}

impl From<u16> for SignatureType {
    fn from(value: u16) -> Self {
        SignatureType::from_u16(value)
    }
}

impl From<SignatureType> for u16 {
    fn from(value: SignatureType) -> Self {
        value.to_u16()
    }
}

impl fmt::Display for SignatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.to_u16())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileType {
    #[default]
    Zip,
    Xml,
    Html,
    XmlGz,
    TxtGz,
    Dmg,
    Exe,
    Other(u8),
}

impl FileType {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => FileType::Zip,
            1 => FileType::Xml,
            2 => FileType::Html,
            3 => FileType::XmlGz,
            4 => FileType::TxtGz,
            5 => FileType::Dmg,
            6 => FileType::Exe,
            other => FileType::Other(other),
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            FileType::Zip => 0,
            FileType::Xml => 1,
            FileType::Html => 2,
            FileType::XmlGz => 3,
            FileType::TxtGz => 4,
            FileType::Dmg => 5,
            FileType::Exe => 6,
            FileType::Other(other) => other,
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileType::Zip => "zip",
            FileType::Xml => "xml",
            FileType::Html => "html",
            FileType::XmlGz => "xml.gz",
            FileType::TxtGz => "txt.gz",
            FileType::Dmg => "dmg",
            FileType::Exe => "exe",
            FileType::Other(_) => "unknown",
        };
        write!(f, "{name} ({})", self.to_u8())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentType {
    #[default]
    Unknown,
    Router,
    Plugin,
    Reseed,
    News,
    Blocklist,
    Other(u8),
}

impl ContentType {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => ContentType::Unknown,
            1 => ContentType::Router,
            2 => ContentType::Plugin,
            3 => ContentType::Reseed,
            4 => ContentType::News,
            5 => ContentType::Blocklist,
            other => ContentType::Other(other),
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            ContentType::Unknown => 0,
            ContentType::Router => 1,
            ContentType::Plugin => 2,
            ContentType::Reseed => 3,
            ContentType::News => 4,
            ContentType::Blocklist => 5,
            ContentType::Other(other) => other,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContentType::Unknown | ContentType::Other(_) => "unknown",
            ContentType::Router => "router",
            ContentType::Plugin => "plugin",
            ContentType::Reseed => "reseed",
            ContentType::News => "news",
            ContentType::Blocklist => "blocklist",
        };
        write!(f, "{name} ({})", self.to_u8())
    }
}

/// A decoded (or not yet encoded) su3 container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Su3File {
    pub format: u8,                     // container format version, always 0 so far
    pub signature_type: SignatureType,  // algorithm used for `signature`
    pub file_type: FileType,            // what `content` is encoded as
    pub content_type: ContentType,      // what `content` is for
    pub version: Vec<u8>,               // freshness tag, zero padded to 16 bytes on the wire
    pub signer_id: Vec<u8>,             // name of the signing identity, e.g. "a@b.i2p"
    pub content: Vec<u8>,               // opaque payload
    pub signature: Vec<u8>,             // signature over the body bytes
}

impl Default for Su3File {
    fn default() -> Self {
        Self::new()
    }
}

impl Su3File {
    /// Empty container stamped with the current unix time as version,
    /// announcing an RSA-SHA512-4096 signature.
    pub fn new() -> Self {
        let version = current_time_as_u64().unwrap_or(0).to_string().into_bytes();
        Self {
            format: 0,
            signature_type: SignatureType::default(),
            file_type: FileType::default(),
            content_type: ContentType::default(),
            version,
            signer_id: Vec::new(),
            content: Vec::new(),
            signature: Vec::new(),
        }
    }

    /// Zero pad the version to its wire length so the in-memory value matches what decodes.
    pub fn pad_version(&mut self) {
        if self.version.len() < SU3_MIN_VERSION_LENGTH {
            self.version.resize(SU3_MIN_VERSION_LENGTH, 0);
        }
    }

    fn version_length(&self) -> usize {
        self.version.len().max(SU3_MIN_VERSION_LENGTH)
    }

    /// Every byte covered by the signature: magic, header, version, signer id, content.
    pub fn body_bytes(&self) -> Result<Vec<u8>> {
        let version_length = u8::try_from(self.version_length()).map_err(|_| ReseedError::FieldTooLong)?;
        let signer_id_length = u8::try_from(self.signer_id.len()).map_err(|_| ReseedError::FieldTooLong)?;
        let signature_length = u16::try_from(self.signature.len()).map_err(|_| ReseedError::FieldTooLong)?;

        let mut header = [0u8; SU3_HEADER_SIZE];
        header[..SU3_MAGIC.len()].copy_from_slice(SU3_MAGIC);
        header[OFFSET_FORMAT] = self.format;
        header[OFFSET_SIGNATURE_TYPE..OFFSET_SIGNATURE_TYPE + 2].copy_from_slice(&self.signature_type.to_u16().to_be_bytes());
        header[OFFSET_SIGNATURE_LENGTH..OFFSET_SIGNATURE_LENGTH + 2].copy_from_slice(&signature_length.to_be_bytes());
        header[OFFSET_VERSION_LENGTH] = version_length;
        header[OFFSET_SIGNER_ID_LENGTH] = signer_id_length;
        header[OFFSET_CONTENT_LENGTH..OFFSET_CONTENT_LENGTH + 8].copy_from_slice(&(self.content.len() as u64).to_be_bytes());
        header[OFFSET_FILE_TYPE] = self.file_type.to_u8();
        header[OFFSET_CONTENT_TYPE] = self.content_type.to_u8();

        let mut encoded = Vec::with_capacity(SU3_HEADER_SIZE + version_length as usize + self.signer_id.len() + self.content.len());
        encoded.extend_from_slice(&header);
        encoded.extend_from_slice(&self.version);
        encoded.resize(SU3_HEADER_SIZE + version_length as usize, 0);
        encoded.extend_from_slice(&self.signer_id);
        encoded.extend_from_slice(&self.content);

        Ok(encoded)
    }

    /// Serialize to prepare for storing or transmission.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut encoded = self.body_bytes()?;
        encoded.extend_from_slice(&self.signature);
        Ok(encoded)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < SU3_HEADER_SIZE {
            return Err(malformed(format!("{} bytes is shorter than the {SU3_HEADER_SIZE} byte header", data.len())));
        }
        if &data[..SU3_MAGIC.len()] != SU3_MAGIC {
            return Err(malformed("magic bytes mismatch".to_string()));
        }

        let format = data[OFFSET_FORMAT];
        let signature_type = SignatureType::from_u16(read_u16(data, OFFSET_SIGNATURE_TYPE));
        let signature_length = read_u16(data, OFFSET_SIGNATURE_LENGTH) as u64;
        let version_length = data[OFFSET_VERSION_LENGTH] as u64;
        let signer_id_length = data[OFFSET_SIGNER_ID_LENGTH] as u64;
        let content_length = read_u64(data, OFFSET_CONTENT_LENGTH);
        let file_type = FileType::from_u8(data[OFFSET_FILE_TYPE]);
        let content_type = ContentType::from_u8(data[OFFSET_CONTENT_TYPE]);

        let remaining = (data.len() - SU3_HEADER_SIZE) as u64;
        let declared = version_length
            .checked_add(signer_id_length)
            .and_then(|total| total.checked_add(content_length))
            .and_then(|total| total.checked_add(signature_length))
            .ok_or_else(|| malformed("declared lengths overflow".to_string()))?;
        if declared > remaining {
            return Err(malformed(format!("declared fields need {declared} bytes, only {remaining} remain")));
        }
        if declared < remaining {
            return Err(malformed(format!("{} trailing bytes after the signature", remaining - declared)));
        }

        // lengths fit the buffer, so the offsets below fit usize
        let mut cursor = SU3_HEADER_SIZE;
        let mut take = |length: u64| {
            let field = data[cursor..cursor + length as usize].to_vec();
            cursor += length as usize;
            field
        };
        let version = take(version_length);
        let signer_id = take(signer_id_length);
        let content = take(content_length);
        let signature = take(signature_length);

        Ok(Self {
            format,
            signature_type,
            file_type,
            content_type,
            version,
            signer_id,
            content,
            signature,
        })
    }

    /// Sign the container in place. The header announces the signature length, so the
    /// placeholder length is adjusted until the produced signature has the announced size.
    /// On error the container is left without signature.
    pub fn sign(&mut self, private_key: &PrivateKey) -> Result<()> {
        let signed = self.settle_signature(private_key);
        if signed.is_err() {
            self.signature.clear();
        }
        signed
    }

    fn settle_signature(&mut self, private_key: &PrivateKey) -> Result<()> {
        let mut length = private_key.signature_length_hint(self.signature_type)?;

        for _ in 0..MAX_SIGN_ATTEMPTS {
            self.signature = vec![0; length];
            let body = self.body_bytes()?;
            let signature = sign_message(private_key, self.signature_type, &body)?;
            if signature.len() == length {
                self.signature = signature;
                return Ok(());
            }
            length = signature.len();
        }

        Err(ReseedError::SigningFailed("signature length did not settle".to_string()).into())
    }

    /// Verify the signature against the public key of `certificate`.
    pub fn verify(&self, certificate: &Certificate) -> Result<()> {
        verify_with_certificate(certificate, self.signature_type, &self.body_bytes()?, &self.signature)
    }

    pub fn verify_with_key(&self, public_key: &PublicKey) -> Result<()> {
        verify_signature(public_key, self.signature_type, &self.body_bytes()?, &self.signature)
    }

    pub fn signer_id_str(&self) -> String {
        String::from_utf8_lossy(&self.signer_id).into_owned()
    }

    /// The version as text, without its zero padding.
    pub fn version_str(&self) -> String {
        let end = self.version.iter().rposition(|b| *b != 0).map_or(0, |last| last + 1);
        String::from_utf8_lossy(&self.version[..end]).into_owned()
    }
}

impl fmt::Display for Su3File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "---------------------------")?;
        writeln!(f, "Format: {}", self.format)?;
        writeln!(f, "SignatureType: {}", self.signature_type)?;
        writeln!(f, "FileType: {}", self.file_type)?;
        writeln!(f, "ContentType: {}", self.content_type)?;
        writeln!(f, "Version: {}", self.version_str())?;
        writeln!(f, "SignerId: {}", self.signer_id_str())?;
        write!(f, "---------------------------")
    }
}

fn malformed(reason: String) -> anyhow::Error {
    ReseedError::MalformedContainer(reason).into()
}

fn read_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([data[offset], data[offset + 1]])
}

fn read_u64(data: &[u8], offset: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&data[offset..offset + 8]);
    u64::from_be_bytes(bytes)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::su3_signature::test::{dsa_key, rsa_key};
    use rand::rngs::OsRng;

    fn sample_file() -> Su3File {
        Su3File {
            format: 0,
            signature_type: SignatureType::RsaSha512_4096,
            file_type: FileType::Zip,
            content_type: ContentType::Reseed,
            version: b"1700000000\0\0\0\0\0\0".to_vec(),
            signer_id: b"a@b.i2p".to_vec(),
            content: b"some content".to_vec(),
            signature: vec![7; 512],
        }
    }

    fn is_malformed(err: &anyhow::Error) -> bool {
        matches!(err.downcast_ref::<ReseedError>(), Some(ReseedError::MalformedContainer(_)))
    }

    #[test]
    fn test_header_layout() {
        let file = sample_file();
        let bytes = file.to_bytes().unwrap();

        assert_eq!(&bytes[..6], b"I2Psu3", "magic bytes lead the container");
        assert_eq!(bytes[6], 0);
        assert_eq!(bytes[7], 0, "format version");
        assert_eq!(&bytes[8..10], &[0, 6], "signature type RSA-SHA512-4096");
        assert_eq!(&bytes[10..12], &512u16.to_be_bytes(), "signature length");
        assert_eq!(bytes[13], 16, "version length");
        assert_eq!(bytes[15], 7, "signer id length");
        assert_eq!(&bytes[16..24], &12u64.to_be_bytes(), "content length");
        assert_eq!(bytes[25], 0, "file type zip");
        assert_eq!(bytes[27], 3, "content type reseed");
        assert!(bytes[28..40].iter().all(|b| *b == 0), "unused header bytes are zero");
        assert_eq!(&bytes[40..56], b"1700000000\0\0\0\0\0\0");
        assert_eq!(&bytes[56..63], b"a@b.i2p");
        assert_eq!(&bytes[63..75], b"some content");
        assert_eq!(bytes.len(), 75 + 512);
    }

    #[test]
    fn test_round_trip() {
        let file = sample_file();
        let decoded = Su3File::from_bytes(&file.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, file, "decode(encode(c)) should equal c");
    }

    #[test]
    fn test_round_trip_unknown_codes() {
        let mut file = sample_file();
        file.signature_type = SignatureType::Unknown(99);
        file.file_type = FileType::Other(42);
        file.content_type = ContentType::Other(200);
        file.content = Vec::new();
        file.signature = Vec::new();

        let decoded = Su3File::from_bytes(&file.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, file);
    }

    #[test]
    fn test_short_version_is_padded_not_truncated() {
        let mut file = sample_file();
        file.version = b"42".to_vec();
        let bytes = file.to_bytes().unwrap();
        assert_eq!(bytes[13], 16);
        assert_eq!(&bytes[40..56], b"42\0\0\0\0\0\0\0\0\0\0\0\0\0\0");

        let decoded = Su3File::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.version_str(), "42");

        file.pad_version();
        assert_eq!(decoded, file, "a padded container round trips");

        let mut long = sample_file();
        long.version = vec![b'9'; 20];
        let decoded = Su3File::from_bytes(&long.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded.version.len(), 20, "long versions are kept whole");
    }

    #[test]
    fn test_body_bytes_exclude_signature() {
        let file = sample_file();
        let body = file.body_bytes().unwrap();
        let full = file.to_bytes().unwrap();
        assert_eq!(&full[..body.len()], &body[..]);
        assert_eq!(full.len() - body.len(), file.signature.len());
    }

    #[test]
    fn test_field_too_long() {
        let mut file = sample_file();
        file.signer_id = vec![b'a'; 256];
        let err = file.to_bytes().unwrap_err();
        assert!(matches!(err.downcast_ref::<ReseedError>(), Some(ReseedError::FieldTooLong)));
    }

    #[test]
    fn test_malformed_inputs() {
        let bytes = sample_file().to_bytes().unwrap();

        let err = Su3File::from_bytes(&[]).unwrap_err();
        assert!(is_malformed(&err), "empty input is malformed");

        let err = Su3File::from_bytes(&bytes[..39]).unwrap_err();
        assert!(is_malformed(&err), "input shorter than the header is malformed");

        let mut wrong_magic = bytes.clone();
        wrong_magic[0] = b'X';
        let err = Su3File::from_bytes(&wrong_magic).unwrap_err();
        assert!(is_malformed(&err), "wrong magic is malformed");

        let mut huge = bytes.clone();
        huge[16..24].copy_from_slice(&u64::MAX.to_be_bytes());
        let err = Su3File::from_bytes(&huge).unwrap_err();
        assert!(is_malformed(&err), "overflowing content length is malformed");

        let mut trailing = bytes.clone();
        trailing.push(0);
        let err = Su3File::from_bytes(&trailing).unwrap_err();
        assert!(is_malformed(&err), "trailing bytes are malformed");
    }

    #[test]
    fn test_every_truncation_is_an_error() {
        let bytes = sample_file().to_bytes().unwrap();
        for length in 0..bytes.len() {
            let err = Su3File::from_bytes(&bytes[..length]).unwrap_err();
            assert!(is_malformed(&err), "truncation at {length} should be malformed");
        }
    }

    #[test]
    fn test_garbage_never_panics() {
        let mut state = 0x2545_f491_4f6c_dd1du64;
        for length in [0usize, 1, 6, 40, 41, 64, 200, 1024] {
            for _ in 0..32 {
                let mut data: Vec<u8> = (0..length)
                    .map(|_| {
                        state ^= state << 13;
                        state ^= state >> 7;
                        state ^= state << 17;
                        state as u8
                    })
                    .collect();
                if length >= 6 {
                    data[..6].copy_from_slice(b"I2Psu3");
                }
                let _ = Su3File::from_bytes(&data);
            }
        }
    }

    #[test]
    fn test_signature_type_codes() {
        for (code, sig_type) in SignatureType::ALL.iter().enumerate() {
            assert_eq!(sig_type.to_u16(), code as u16);
            assert_eq!(SignatureType::from_u16(code as u16), *sig_type);
        }
        assert_eq!(SignatureType::from_u16(7), SignatureType::Unknown(7));
    }

    #[test]
    fn test_new_defaults() {
        let file = Su3File::new();
        assert_eq!(file.signature_type, SignatureType::RsaSha512_4096);
        assert!(file.version_str().parse::<u64>().is_ok(), "version is a unix timestamp");
    }

    #[test]
    fn test_display_summary() {
        let summary = sample_file().to_string();
        assert!(summary.starts_with("---------------------------\n"));
        assert!(summary.contains("SignatureType: RSA-SHA512-4096 (6)"));
        assert!(summary.contains("FileType: zip (0)"));
        assert!(summary.contains("ContentType: reseed (3)"));
        assert!(summary.contains("Version: 1700000000\n"), "zero padding is trimmed");
        assert!(summary.contains("SignerId: a@b.i2p"));
    }

    fn der_keys() -> Vec<(SignatureType, PrivateKey)> {
        vec![
            (SignatureType::DsaSha1, PrivateKey::Dsa(dsa_key())),
            (SignatureType::EcdsaSha256P256, PrivateKey::EcdsaP256(ecdsa::SigningKey::random(&mut OsRng))),
            (SignatureType::EcdsaSha384P384, PrivateKey::EcdsaP384(ecdsa::SigningKey::random(&mut OsRng))),
            (SignatureType::EcdsaSha512P521, PrivateKey::EcdsaP521(p521::ecdsa::SigningKey::random(&mut OsRng))),
        ]
    }

    #[test]
    fn test_sign_settles_der_signature_length() {
        for (signature_type, key) in der_keys() {
            let public_key = key.public_key();
            for round in 0..20 {
                let mut file = sample_file();
                file.signature_type = signature_type;
                file.content = format!("content of round {round}").into_bytes();
                file.sign(&key).unwrap();

                let bytes = file.to_bytes().unwrap();
                let announced = u16::from_be_bytes([bytes[10], bytes[11]]) as usize;
                assert_eq!(announced, file.signature.len(), "{signature_type}: header should announce the stored signature length");

                let decoded = Su3File::from_bytes(&bytes).unwrap();
                let result = decoded.verify_with_key(&public_key);
                assert!(result.is_ok(), "{signature_type}: signed container should verify: {result:?}");

                let mut tampered = bytes.clone();
                tampered[bytes.len() - file.signature.len() - 1] ^= 0x01;
                let tampered = Su3File::from_bytes(&tampered).unwrap();
                assert!(tampered.verify_with_key(&public_key).is_err(), "{signature_type}: a flipped body byte should not verify");
            }
        }
    }

    #[test]
    fn test_failed_sign_leaves_no_signature() {
        let mut file = sample_file();
        file.signature_type = SignatureType::RsaSha256_2048;
        file.signer_id = vec![b'a'; 256];

        let err = file.sign(&PrivateKey::Rsa(rsa_key())).unwrap_err();
        assert!(matches!(err.downcast_ref::<ReseedError>(), Some(ReseedError::FieldTooLong)));
        assert!(file.signature.is_empty(), "a failed sign should not leave a placeholder behind");
    }
}
