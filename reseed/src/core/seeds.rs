//! # Reseed Bundle Builder Module
//!
//! Turns a set of router descriptors into the payload of one reseed bundle: a
//! random sample of the descriptors packed into a zip archive, one deflated entry
//! per descriptor carrying its file name and modification time.
//!
//! `build_signed_su3` wraps that payload into a signed su3 container ready to be
//! cached and served as is.
//!
//! ## Notes
//! - Sampling is uniform without replacement; a short descriptor set is used whole
//! - Zip timestamps are MS-DOS times: UTC, 2 second resolution, years 1980..=2107
//! - An empty descriptor set gives a valid, empty archive
//!
//! Copyrights © 2025 Reseed Contributors. All rights reserved.

use anyhow::Result;
use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use rand::seq::SliceRandom;
use std::io::{Cursor, Read, Write};
use std::time::SystemTime;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::super::reseed_errors::ReseedError;
use super::certificate::SigningIdentity;
use super::netdb::RouterInfo;
use super::su3_file::{ContentType, FileType, SignatureType, Su3File};

/// Pick up to `sample_size` distinct descriptors uniformly at random.
pub fn sample_seeds(records: &[RouterInfo], sample_size: usize) -> Vec<&RouterInfo> {
    records.choose_multiple(&mut rand::thread_rng(), sample_size).collect()
}

/// Pack descriptors into a zip archive, preserving name and modification time.
pub fn zip_seeds<'a, I>(records: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = &'a RouterInfo>,
{
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for record in records {
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(to_zip_time(record.mod_time));
        writer.start_file(record.name.as_str(), options)?;
        writer.write_all(&record.data)?;
    }

    Ok(writer.finish()?.into_inner())
}

/// Reverse of `zip_seeds`.
pub fn unzip_seeds(archive: &[u8]) -> Result<Vec<RouterInfo>> {
    let malformed = |e: zip::result::ZipError| ReseedError::MalformedArchive(e.to_string());
    let mut archive = ZipArchive::new(Cursor::new(archive)).map_err(malformed)?;
    let mut records = Vec::with_capacity(archive.len());

    for index in 0..archive.len() {
        let mut file = archive.by_index(index).map_err(malformed)?;
        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)
            .map_err(|e| ReseedError::MalformedArchive(format!("{}: {e}", file.name())))?;

        records.push(RouterInfo {
            name: file.name().to_string(),
            mod_time: from_zip_time(file.last_modified()),
            data,
        });
    }

    Ok(records)
}

/// Sample `sample_size` descriptors and zip them.
pub fn build_payload(records: &[RouterInfo], sample_size: usize) -> Result<Vec<u8>> {
    zip_seeds(sample_seeds(records, sample_size))
}

/// One ready to serve reseed bundle signed by `identity`.
pub fn build_signed_su3(
    records: &[RouterInfo],
    sample_size: usize,
    identity: &SigningIdentity,
    signature_type: SignatureType,
) -> Result<Su3File> {
    let mut su3 = Su3File::new();
    su3.signature_type = signature_type;
    su3.file_type = FileType::Zip;
    su3.content_type = ContentType::Reseed;
    su3.signer_id = identity.signer_id.as_bytes().to_vec();
    su3.content = build_payload(records, sample_size)?;
    su3.pad_version();

    su3.sign(&identity.private_key)?;
    Ok(su3)
}

fn to_zip_time(time: SystemTime) -> zip::DateTime {
    let utc: DateTime<Utc> = time.into();
    u16::try_from(utc.year())
        .ok()
        .and_then(|year| {
            zip::DateTime::from_date_and_time(
                year,
                utc.month() as u8,
                utc.day() as u8,
                utc.hour() as u8,
                utc.minute() as u8,
                utc.second() as u8,
            )
            .ok()
        })
        .unwrap_or_default()
}

fn from_zip_time(time: zip::DateTime) -> SystemTime {
    Utc.with_ymd_and_hms(
        time.year() as i32,
        time.month() as u32,
        time.day() as u32,
        time.hour() as u32,
        time.minute() as u32,
        time.second() as u32,
    )
    .single()
    .map(SystemTime::from)
    .unwrap_or(SystemTime::UNIX_EPOCH)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::certificate::test::shared_identity;
    use std::collections::HashSet;
    use std::time::{Duration, UNIX_EPOCH};

    fn record(name: &str, data: &[u8], secs: u64) -> RouterInfo {
        RouterInfo {
            name: name.to_string(),
            mod_time: UNIX_EPOCH + Duration::from_secs(secs),
            data: data.to_vec(),
        }
    }

    fn records(count: usize) -> Vec<RouterInfo> {
        (0..count)
            .map(|i| record(&format!("routerInfo-{i}.dat"), format!("router {i}").as_bytes(), 1_700_000_000 + 2 * i as u64))
            .collect()
    }

    #[test]
    fn test_zip_round_trip() {
        let input = vec![
            record("routerInfo-a.dat", b"first router", 1_700_000_000),
            record("routerInfo-b.dat", b"second router", 1_600_000_002),
        ];
        let output = unzip_seeds(&zip_seeds(&input).unwrap()).unwrap();
        assert_eq!(output, input, "unzip(zip(records)) should give back the records");
    }

    #[test]
    fn test_zip_empty() {
        let archive = zip_seeds(&[]).unwrap();
        assert!(!archive.is_empty(), "an empty archive still has a directory record");
        assert!(unzip_seeds(&archive).unwrap().is_empty());
    }

    #[test]
    fn test_zip_binary_payload() {
        let mut data: Vec<u8> = (0..=255u8).cycle().take(1 << 20).collect();
        data.extend_from_slice(&[0, 0, 0xff, 0xfe]);
        let input = vec![record("routerInfo-binary.dat", &data, 1_700_000_000)];

        let output = unzip_seeds(&zip_seeds(&input).unwrap()).unwrap();
        assert_eq!(output.len(), 1);
        assert_eq!(output[0].data, data, "binary data should survive compression");
    }

    #[test]
    fn test_zip_time_resolution() {
        let input = vec![record("routerInfo-odd.dat", b"x", 1_700_000_001)];
        let output = unzip_seeds(&zip_seeds(&input).unwrap()).unwrap();
        let drift = input[0].mod_time.duration_since(output[0].mod_time).unwrap();
        assert!(drift <= Duration::from_secs(1), "zip times are rounded down to 2 seconds");
    }

    #[test]
    fn test_unzip_garbage() {
        let err = unzip_seeds(b"definitely not a zip archive").unwrap_err();
        assert!(matches!(err.downcast_ref::<ReseedError>(), Some(ReseedError::MalformedArchive(_))));
    }

    #[test]
    fn test_sample_sizes() {
        let set = records(10);
        assert_eq!(sample_seeds(&set, 4).len(), 4);
        assert_eq!(sample_seeds(&set, 10).len(), 10);
        assert_eq!(sample_seeds(&set, 77).len(), 10, "a short set is used whole");
        assert!(sample_seeds(&[], 77).is_empty());

        let names: HashSet<&str> = sample_seeds(&set, 7).iter().map(|ri| ri.name.as_str()).collect();
        assert_eq!(names.len(), 7, "a sample never repeats a descriptor");
    }

    #[test]
    fn test_build_payload_is_a_subset() {
        let set = records(20);
        let payload = unzip_seeds(&build_payload(&set, 5).unwrap()).unwrap();
        assert_eq!(payload.len(), 5);
        assert!(payload.iter().all(|ri| set.contains(ri)), "payload entries should come from the input set");
    }

    #[test]
    fn test_build_signed_su3() {
        let identity = shared_identity();
        let su3 = build_signed_su3(&records(30), 10, &identity, SignatureType::RsaSha512_4096).unwrap();

        assert_eq!(su3.file_type, FileType::Zip);
        assert_eq!(su3.content_type, ContentType::Reseed);
        assert_eq!(su3.signer_id_str(), identity.signer_id);
        assert_eq!(su3.version.len(), 16);
        assert_eq!(su3.signature.len(), 256);
        assert_eq!(unzip_seeds(&su3.content).unwrap().len(), 10);

        let decoded = Su3File::from_bytes(&su3.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, su3);
        assert!(decoded.verify(&identity.certificate).is_ok(), "bundle should verify against the signer certificate");
    }
}
