//! Router descriptor source.
//!
//! An I2P netDb directory keeps one `routerInfo-<hash>.dat` file per known router,
//! spread over `r<char>` skiplist subdirectories. Every call to
//! `LocalNetDb::router_infos` lists the directory again and yields the descriptors
//! that are not older than the configured maximum age.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

use super::super::constants::{ROUTER_INFO_PREFIX, ROUTER_INFO_SUFFIX};

/// One router descriptor as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterInfo {
    pub name: String,
    pub mod_time: SystemTime,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct LocalNetDb {
    pub path: PathBuf,
    pub max_router_info_age: Duration,
}

impl LocalNetDb {
    pub fn new<P: AsRef<Path>>(path: P, max_router_info_age: Duration) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            max_router_info_age,
        }
    }

    /// Lazily read the fresh descriptors. Unreadable files are skipped with a warning.
    /// Ordering follows the directory listing and is not stable.
    pub fn router_infos(&self) -> Result<impl Iterator<Item = RouterInfo>> {
        let files = self.descriptor_files()?;
        let max_age = self.max_router_info_age;
        let now = SystemTime::now();

        Ok(files.into_iter().filter_map(move |path| read_router_info(&path, now, max_age)))
    }

    fn descriptor_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in fs::read_dir(&self.path)? {
            let entry = entry?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();

            if path.is_dir() && name.starts_with('r') {
                match fs::read_dir(&path) {
                    Ok(sub_entries) => files.extend(sub_entries.flatten().map(|e| e.path()).filter(|p| is_router_info(p))),
                    Err(err) => warn!(dir = %path.display(), error = %err, "skipping unreadable netDb directory"),
                }
            } else if is_router_info(&path) {
                files.push(path);
            }
        }

        debug!(netdb = %self.path.display(), count = files.len(), "listed router infos");
        Ok(files)
    }
}

fn is_router_info(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(ROUTER_INFO_PREFIX) && name.ends_with(ROUTER_INFO_SUFFIX))
}

fn read_router_info(path: &Path, now: SystemTime, max_age: Duration) -> Option<RouterInfo> {
    let mod_time = match fs::metadata(path).and_then(|meta| meta.modified()) {
        Ok(mod_time) => mod_time,
        Err(err) => {
            warn!(file = %path.display(), error = %err, "skipping router info without readable metadata");
            return None;
        }
    };

    // files from the future count as fresh
    let age = now.duration_since(mod_time).unwrap_or(Duration::ZERO);
    if age > max_age {
        return None;
    }

    match fs::read(path) {
        Ok(data) => Some(RouterInfo {
            name: path.file_name()?.to_string_lossy().into_owned(),
            mod_time,
            data,
        }),
        Err(err) => {
            warn!(file = %path.display(), error = %err, "skipping unreadable router info");
            None
        }
    }
}
