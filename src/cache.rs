//! Memoization of generated region files.
//!
//! Outputs are keyed by a digest of their inputs' contents and parameters,
//! so reuse never depends on file timestamps. Writes go through [`Staged`]:
//! the output path appears only once it is complete.

use anyhow::{Context, Result};
use log::{debug, info};
use md5::{Digest, Md5};
use std::fmt::Display;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::utils::{ensure_dir, open_reader};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn builder(operation: &str) -> CacheKeyBuilder {
        let mut hasher = Md5::new();
        hasher.update(operation.as_bytes());
        CacheKeyBuilder { hasher }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub struct CacheKeyBuilder {
    hasher: Md5,
}

impl CacheKeyBuilder {
    /// Mix in a file's decompressed contents.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let mut reader = open_reader(path.as_ref())?;
        self.hasher.update(b"\0file\0");
        loop {
            let chunk = reader.fill_buf()?;
            if chunk.is_empty() {
                break;
            }
            self.hasher.update(chunk);
            let consumed = chunk.len();
            reader.consume(consumed);
        }
        Ok(self)
    }

    pub fn param<V: Display>(mut self, name: &str, value: V) -> Self {
        self.hasher.update(format!("\0{}={}", name, value).as_bytes());
        self
    }

    pub fn finish(self) -> CacheKey {
        CacheKey(format!("{:x}", self.hasher.finalize()))
    }
}

/// Directory of published outputs addressed by [`CacheKey`].
#[derive(Debug, Clone)]
pub struct OutputCache {
    dir: PathBuf,
}

impl OutputCache {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        ensure_dir(dir.as_ref())?;
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/<name>-<key prefix>.bed`
    pub fn path_for(&self, key: &CacheKey, name: &str) -> PathBuf {
        self.dir.join(format!("{}-{}.bed", name, &key.as_str()[..12]))
    }

    pub fn lookup(&self, key: &CacheKey, name: &str) -> Option<PathBuf> {
        let path = self.path_for(key, name);
        path.is_file().then_some(path)
    }

    /// Return the published output for `key`, building it first if absent.
    /// `build` writes to a staging path that is published only on success.
    pub fn get_or_create<F>(&self, key: &CacheKey, name: &str, build: F) -> Result<PathBuf>
    where
        F: FnOnce(&Path) -> Result<()>,
    {
        if let Some(path) = self.lookup(key, name) {
            info!("Reusing cached {:?}", path);
            return Ok(path);
        }

        let target = self.path_for(key, name);
        let staged = Staged::new(&target)?;
        build(staged.path())?;
        staged.commit()
    }
}

/// A temporary file next to `target`, renamed onto it by [`Staged::commit`]
/// and removed if dropped uncommitted.
pub struct Staged {
    tmp: NamedTempFile,
    target: PathBuf,
}

impl Staged {
    pub fn new<P: AsRef<Path>>(target: P) -> Result<Self> {
        let target = target.as_ref().to_path_buf();
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        ensure_dir(&dir)?;
        let tmp = NamedTempFile::new_in(&dir)
            .context(format!("Failed to create staging file in {:?}", dir))?;
        debug!("Staging {:?} at {:?}", target, tmp.path());
        Ok(Self { tmp, target })
    }

    pub fn path(&self) -> &Path {
        self.tmp.path()
    }

    pub fn commit(self) -> Result<PathBuf> {
        self.tmp
            .persist(&self.target)
            .context(format!("Failed to publish {:?}", self.target))?;
        Ok(self.target)
    }
}
