use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, Result};

use crate::model::{ArtifactRole, Fingerprint};
use crate::store::ArtifactStore;

/// In-memory artifact store. Not durable, but good for unit/scenario tests.
#[derive(Default)]
pub struct InMemoryArtifactStore {
    inner: Mutex<HashMap<(Fingerprint, ArtifactRole), Vec<u8>>>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Roles currently held for a fingerprint, in `ArtifactRole` order.
    pub fn roles(&self, fp: &Fingerprint) -> Vec<ArtifactRole> {
        let inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        let mut roles: Vec<_> = inner.keys().filter(|(f, _)| f == fp).map(|(_, r)| *r).collect();
        roles.sort();
        roles
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ArtifactStore for InMemoryArtifactStore {
    fn put(&self, fp: &Fingerprint, role: ArtifactRole, bytes: &[u8]) -> Result<()> {
        let mut inner = self.inner.lock().map_err(|_| anyhow!("artifact store lock poisoned"))?;
        inner.insert((fp.clone(), role), bytes.to_vec());
        Ok(())
    }

    fn get(&self, fp: &Fingerprint, role: ArtifactRole) -> Result<Option<Vec<u8>>> {
        let inner = self.inner.lock().map_err(|_| anyhow!("artifact store lock poisoned"))?;
        Ok(inner.get(&(fp.clone(), role)).cloned())
    }

    fn discard(&self, fp: &Fingerprint, role: ArtifactRole) -> Result<()> {
        let mut inner = self.inner.lock().map_err(|_| anyhow!("artifact store lock poisoned"))?;
        inner.remove(&(fp.clone(), role));
        Ok(())
    }

    fn promote(&self, fp: &Fingerprint, from: ArtifactRole, to: ArtifactRole) -> Result<()> {
        if from == to {
            return Err(anyhow!("cannot promote {from} onto itself"));
        }
        let mut inner = self.inner.lock().map_err(|_| anyhow!("artifact store lock poisoned"))?;
        let bytes = inner
            .remove(&(fp.clone(), from))
            .ok_or_else(|| anyhow!("no {from} artifact for {fp}"))?;
        inner.insert((fp.clone(), to), bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_creates_empty_store() {
        let store = InMemoryArtifactStore::new();
        assert!(store.is_empty());
    }

    #[test]
    fn test_promote_moves_bytes() {
        let store = InMemoryArtifactStore::new();
        let fp = Fingerprint::of_url("https://example.com");
        store.put(&fp, ArtifactRole::Current, b"a").unwrap();
        store.promote(&fp, ArtifactRole::Current, ArtifactRole::Baseline).unwrap();
        assert_eq!(store.roles(&fp), vec![ArtifactRole::Baseline]);
        assert_eq!(store.get(&fp, ArtifactRole::Baseline).unwrap(), Some(b"a".to_vec()));
    }

    #[test]
    fn test_promote_missing_source_fails() {
        let store = InMemoryArtifactStore::new();
        let fp = Fingerprint::of_url("https://example.com");
        store.put(&fp, ArtifactRole::Baseline, b"keep").unwrap();
        assert!(store.promote(&fp, ArtifactRole::Current, ArtifactRole::Baseline).is_err());
        assert_eq!(store.get(&fp, ArtifactRole::Baseline).unwrap(), Some(b"keep".to_vec()));
    }

    #[test]
    fn test_fingerprints_are_isolated() {
        let store = InMemoryArtifactStore::new();
        let a = Fingerprint::of_url("https://a.example");
        let b = Fingerprint::of_url("https://b.example");
        store.put(&a, ArtifactRole::Baseline, b"a").unwrap();
        store.discard(&b, ArtifactRole::Baseline).unwrap();
        assert_eq!(store.roles(&a), vec![ArtifactRole::Baseline]);
        assert!(store.roles(&b).is_empty());
    }
}
