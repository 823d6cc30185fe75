//! Cutout cache directory.
//!
//! Artifacts are named `cutout-<unix-millis>-<sequence>.png`. The sequence is
//! a process-wide counter, and every name is claimed with an exclusive create:
//! a name already taken (by this or another process sharing the directory)
//! moves on to the next sequence number. Files stay until
//! [`CutoutCache::delete`] or [`CutoutCache::clear`] removes them.

use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use chrono::Utc;
use image::{ImageFormat, RgbaImage};
use tracing::{debug, info, warn};

use crate::error::{VisionError, VisionResult};

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

const PREFIX: &str = "cutout-";
const EXTENSION: &str = ".png";
/// Names tried per slot before giving up.
const MAX_CLAIM_ATTEMPTS: u32 = 1024;

/// A claimed cache location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSlot {
    pub path: PathBuf,
    pub created_at_ms: i64,
}

#[derive(Debug, Clone)]
pub struct CutoutCache {
    dir: PathBuf,
}

impl CutoutCache {
    /// Open the cache, creating the directory when missing.
    pub fn open(dir: impl Into<PathBuf>) -> VisionResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| VisionError::io("creating cutout cache", e).with_path(&dir))?;
        debug!(dir = %dir.display(), "cutout cache ready");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Claim a new, empty file keyed by the current time.
    pub fn create_slot(&self) -> VisionResult<(CacheSlot, File)> {
        let created_at_ms = Utc::now().timestamp_millis();
        self.claim(created_at_ms, || SEQUENCE.fetch_add(1, Ordering::Relaxed))
    }

    fn claim(
        &self,
        created_at_ms: i64,
        mut next_seq: impl FnMut() -> u64,
    ) -> VisionResult<(CacheSlot, File)> {
        for _ in 0..MAX_CLAIM_ATTEMPTS {
            let seq = next_seq();
            let path = self.dir.join(format!("{PREFIX}{created_at_ms}-{seq}{EXTENSION}"));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((CacheSlot { path, created_at_ms }, file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    debug!(path = %path.display(), "cache name taken, trying next");
                }
                Err(e) => {
                    return Err(VisionError::io("creating cutout file", e).with_path(&path));
                }
            }
        }
        Err(VisionError::io(
            "creating cutout file",
            io::Error::new(io::ErrorKind::AlreadyExists, "no free cache name"),
        )
        .with_path(&self.dir))
    }

    /// Encode `image` as PNG into a new slot. A failed write leaves no file behind.
    pub fn store_png(&self, image: &RgbaImage) -> VisionResult<CacheSlot> {
        let (slot, file) = self.create_slot()?;
        let written = {
            let mut writer = BufWriter::new(file);
            image
                .write_to(&mut writer, ImageFormat::Png)
                .map_err(|e| e.to_string())
                .and_then(|()| writer.flush().map_err(|e| e.to_string()))
        };
        if let Err(reason) = written {
            if let Err(e) = fs::remove_file(&slot.path) {
                warn!(path = %slot.path.display(), error = %e, "could not remove partial cutout");
            }
            return Err(VisionError::image_encode(&slot.path, reason));
        }
        Ok(slot)
    }

    /// Cached cutouts, oldest first.
    pub fn list(&self) -> VisionResult<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.dir)
            .map_err(|e| VisionError::io("listing cutout cache", e).with_path(&self.dir))?;
        let mut files = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| VisionError::io("listing cutout cache", e).with_path(&self.dir))?;
            let path = entry.path();
            if path.is_file() && is_cutout_name(&path) {
                files.push(path);
            }
        }
        files.sort_by_key(|p| sort_key(p));
        Ok(files)
    }

    /// Delete one cached cutout. Paths outside the cache are refused.
    pub fn delete(&self, path: &Path) -> VisionResult<()> {
        if path.parent() != Some(self.dir.as_path()) || !is_cutout_name(path) {
            return Err(VisionError::io(
                "deleting cutout",
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a cached cutout"),
            )
            .with_path(path));
        }
        fs::remove_file(path).map_err(|e| VisionError::io("deleting cutout", e).with_path(path))?;
        debug!(path = %path.display(), "cutout deleted");
        Ok(())
    }

    /// Delete every cached cutout and return how many were removed.
    pub fn clear(&self) -> VisionResult<usize> {
        let files = self.list()?;
        for path in &files {
            fs::remove_file(path)
                .map_err(|e| VisionError::io("clearing cutout cache", e).with_path(path))?;
        }
        info!(removed = files.len(), dir = %self.dir.display(), "cutout cache cleared");
        Ok(files.len())
    }
}

fn is_cutout_name(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(PREFIX) && n.ends_with(EXTENSION))
}

/// (millis, sequence) parsed from the file name; unparseable names sort first.
fn sort_key(path: &Path) -> (i64, u64) {
    let stem = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.strip_prefix(PREFIX))
        .and_then(|n| n.strip_suffix(EXTENSION))
        .unwrap_or_default();
    let mut parts = stem.splitn(2, '-');
    let millis = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let seq = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    (millis, seq)
}
