use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tempfile::NamedTempFile;

use crate::model::{ArtifactRole, Fingerprint};

/// Durable mapping from (fingerprint, role) to an image blob.
pub trait ArtifactStore: Send + Sync {
    fn put(&self, fp: &Fingerprint, role: ArtifactRole, bytes: &[u8]) -> Result<()>;
    fn get(&self, fp: &Fingerprint, role: ArtifactRole) -> Result<Option<Vec<u8>>>;

    /// Remove an artifact. Missing artifacts are not an error.
    fn discard(&self, fp: &Fingerprint, role: ArtifactRole) -> Result<()>;

    /// Move `from` into `to`, replacing whatever `to` held, in one step.
    /// Fails if `from` does not exist.
    fn promote(&self, fp: &Fingerprint, from: ArtifactRole, to: ArtifactRole) -> Result<()>;
}

/// Flat directory of `<fingerprint>.<role>.png` files.
#[derive(Clone, Debug)]
pub struct FsArtifactStore {
    pub root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Creates the root directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).with_context(|| format!("create artifact dir {}", root.display()))?;
        Ok(Self::new(root))
    }

    pub fn path_of(&self, fp: &Fingerprint, role: ArtifactRole) -> PathBuf {
        self.root.join(format!("{}.{}.png", fp.as_str(), role.as_str()))
    }
}

fn remove_if_present(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("remove {}", path.display())),
    }
}

impl ArtifactStore for FsArtifactStore {
    fn put(&self, fp: &Fingerprint, role: ArtifactRole, bytes: &[u8]) -> Result<()> {
        let dest = self.path_of(fp, role);
        // Each writer stages under its own random name; the temp file is
        // removed on drop if persisting fails.
        let mut staged = NamedTempFile::new_in(&self.root)
            .with_context(|| format!("create staging file in {}", self.root.display()))?;
        staged
            .write_all(bytes)
            .with_context(|| format!("write {}", staged.path().display()))?;
        staged
            .persist(&dest)
            .map_err(|e| e.error)
            .with_context(|| format!("persist {}", dest.display()))?;
        Ok(())
    }

    fn get(&self, fp: &Fingerprint, role: ArtifactRole) -> Result<Option<Vec<u8>>> {
        let path = self.path_of(fp, role);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("read {}", path.display())),
        }
    }

    fn discard(&self, fp: &Fingerprint, role: ArtifactRole) -> Result<()> {
        remove_if_present(&self.path_of(fp, role))
    }

    fn promote(&self, fp: &Fingerprint, from: ArtifactRole, to: ArtifactRole) -> Result<()> {
        if from == to {
            return Err(anyhow!("cannot promote {from} onto itself"));
        }
        let src = self.path_of(fp, from);
        let dest = self.path_of(fp, to);
        // rename(2) replaces dest atomically, so `to` is never absent or doubled.
        std::fs::rename(&src, &dest).with_context(|| format!("rename {} -> {}", src.display(), dest.display()))
    }
}
