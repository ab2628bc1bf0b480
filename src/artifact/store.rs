use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use tempfile::{NamedTempFile, TempDir};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::namer::{media_type_for, unique_name, validate_name};
use super::{ArtifactKind, ArtifactRef, ArtifactState};
use crate::config::Config;
use crate::error::ArtifactError;

/// Bytes read back for the response layer
#[derive(Debug, Clone, PartialEq)]
pub struct ServedArtifact {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

/// The ArtifactStore owns the private artifact area.
///
/// Nothing outside this type sees a storage path. Names are write-once:
/// uniqueness comes from the namer, and a write never replaces an existing
/// file, so concurrent writers need no lock.
#[derive(Debug)]
pub struct ArtifactStore {
    root: PathBuf,
    /// Keeps a process-owned temporary area alive
    _temp: Option<TempDir>,
}

impl ArtifactStore {
    /// Open the configured area, or a fresh temporary directory when
    /// none is configured
    pub fn open(config: &Config) -> Result<Self, ArtifactError> {
        match &config.artifact_dir {
            Some(dir) => Self::at(dir),
            None => {
                let temp = tempfile::Builder::new().prefix("image-pipeline-").tempdir()?;
                let root = temp.path().to_path_buf();
                info!(root = %root.display(), "artifact area in temporary directory");
                Ok(Self {
                    root,
                    _temp: Some(temp),
                })
            }
        }
    }

    /// Use an explicit directory, creating it if needed
    pub fn at(dir: &Path) -> Result<Self, ArtifactError> {
        std::fs::create_dir_all(dir)?;
        info!(root = %dir.display(), "artifact area ready");
        Ok(Self {
            root: dir.to_path_buf(),
            _temp: None,
        })
    }

    pub(crate) fn root(&self) -> &Path {
        &self.root
    }

    /// Persist bytes under a fresh unique name.
    ///
    /// Bytes go to a temporary file first and are renamed into place only
    /// when complete; a failed write leaves nothing behind. The returned
    /// guard deletes the artifact when dropped unless it is committed.
    pub fn write(
        &self,
        kind: ArtifactKind,
        extension: &str,
        bytes: &[u8],
    ) -> Result<ArtifactGuard, ArtifactError> {
        let name = unique_name(kind, extension);
        let path = self.root.join(&name);

        let mut staging = NamedTempFile::new_in(&self.root)?;
        staging.write_all(bytes)?;
        staging.flush()?;
        staging
            .persist_noclobber(&path)
            .map_err(|e| ArtifactError::Io(e.error))?;

        debug!(artifact = %name, size = bytes.len(), "artifact written");

        Ok(ArtifactGuard {
            artifact: ArtifactRef {
                media_type: media_type_for(&name),
                name,
                kind,
                created_at: Utc::now(),
            },
            path,
            state: ArtifactState::Written,
        })
    }

    /// Read an artifact by name without removing it
    pub fn read(&self, name: &str) -> Result<ServedArtifact, ArtifactError> {
        let path = self.path_of(name)?;
        let bytes = std::fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ArtifactError::NotFound(name.to_string()),
            _ => ArtifactError::Io(e),
        })?;

        Ok(ServedArtifact {
            name: name.to_string(),
            media_type: media_type_for(name),
            bytes,
        })
    }

    /// Read an artifact and delete it once the bytes are in memory.
    ///
    /// The file is first renamed to a private claim name, so of several
    /// concurrent callers exactly one gets the bytes and the rest see
    /// `NotFound`. Claim names start with '.' and never validate.
    pub fn take(&self, name: &str) -> Result<ServedArtifact, ArtifactError> {
        let path = self.path_of(name)?;
        let claimed = self.root.join(format!(".claim-{}", Uuid::new_v4().simple()));
        std::fs::rename(&path, &claimed).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ArtifactError::NotFound(name.to_string()),
            _ => ArtifactError::Io(e),
        })?;

        let bytes = match std::fs::read(&claimed) {
            Ok(bytes) => bytes,
            Err(e) => {
                // Put it back so a later request can still be served
                if let Err(restore) = std::fs::rename(&claimed, &path) {
                    warn!(artifact = name, error = %restore, "failed to restore claimed artifact");
                }
                return Err(ArtifactError::Io(e));
            }
        };
        remove_if_present(&claimed)?;
        info!(artifact = name, "artifact served and deleted");

        Ok(ServedArtifact {
            name: name.to_string(),
            media_type: media_type_for(name),
            bytes,
        })
    }

    /// Delete by name. Missing artifacts are not an error.
    ///
    /// Names that could address anything outside the artifact area fail
    /// with `InvalidName` before touching the filesystem.
    pub fn delete(&self, name: &str) -> Result<(), ArtifactError> {
        let path = self.path_of(name)?;
        remove_if_present(&path)?;
        info!(artifact = name, "artifact deleted");
        Ok(())
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path_of(name).map(|p| p.is_file()).unwrap_or(false)
    }

    fn path_of(&self, name: &str) -> Result<PathBuf, ArtifactError> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }
}

/// Scoped handle to a written artifact.
///
/// Dropping a guard in the `Written` state deletes the file, so every early
/// return or `?` after a write cleans up. `commit` hands the artifact to the
/// response layer and disarms the cleanup.
#[derive(Debug)]
pub struct ArtifactGuard {
    artifact: ArtifactRef,
    path: PathBuf,
    state: ArtifactState,
}

impl ArtifactGuard {
    pub fn artifact(&self) -> &ArtifactRef {
        &self.artifact
    }

    pub fn name(&self) -> &str {
        &self.artifact.name
    }

    pub fn state(&self) -> ArtifactState {
        self.state
    }

    /// Location for in-process consumers that must read the file back
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Keep the artifact and return its reference
    pub fn commit(mut self) -> ArtifactRef {
        self.state = ArtifactState::Served;
        self.artifact.clone()
    }

    /// Delete now, reporting any storage error
    pub fn discard(mut self) -> Result<(), ArtifactError> {
        self.state = ArtifactState::Deleted;
        remove_if_present(&self.path)
    }
}

impl Drop for ArtifactGuard {
    fn drop(&mut self) {
        if self.state != ArtifactState::Written {
            return;
        }
        match remove_if_present(&self.path) {
            Ok(()) => debug!(artifact = %self.artifact.name, "uncommitted artifact removed"),
            Err(e) => warn!(artifact = %self.artifact.name, error = %e, "failed to remove artifact"),
        }
        self.state = ArtifactState::Deleted;
    }
}

fn remove_if_present(path: &Path) -> Result<(), ArtifactError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ArtifactError::Io(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn store() -> (tempfile::TempDir, ArtifactStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::at(&dir.path().join("artifacts")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_write_and_read() {
        let (_dir, store) = store();
        let guard = store.write(ArtifactKind::ReportJson, "json", b"{}").unwrap();
        assert_eq!(guard.state(), ArtifactState::Written);
        let artifact = guard.commit();

        let served = store.read(&artifact.name).unwrap();
        assert_eq!(served.bytes, b"{}");
        assert_eq!(served.media_type, "application/json");
    }

    #[test]
    fn test_dropped_guard_deletes() {
        let (_dir, store) = store();
        let guard = store.write(ArtifactKind::Upload, "png", b"data").unwrap();
        let name = guard.name().to_string();
        assert!(store.exists(&name));

        drop(guard);
        assert!(!store.exists(&name));
    }

    #[test]
    fn test_cleanup_on_error_path() {
        fn failing_step(store: &ArtifactStore) -> Result<ArtifactRef, ArtifactError> {
            let guard = store.write(ArtifactKind::ReportChart, "png", b"partial")?;
            let encoded: Result<(), ArtifactError> = Err(ArtifactError::Encode("boom".into()));
            encoded?;
            Ok(guard.commit())
        }

        let (_dir, store) = store();
        assert!(failing_step(&store).is_err());
        assert_eq!(std::fs::read_dir(store.root()).unwrap().count(), 0);
    }

    #[test]
    fn test_delete_missing_is_ok() {
        let (_dir, store) = store();
        assert!(store.delete("transformed_0123456789abcdef.jpg").is_ok());
    }

    #[test]
    fn test_delete_twice_is_ok() {
        let (_dir, store) = store();
        let name = store
            .write(ArtifactKind::TransformedImage, "jpg", b"x")
            .unwrap()
            .commit()
            .name;
        assert!(store.delete(&name).is_ok());
        assert!(store.delete(&name).is_ok());
    }

    #[test]
    fn test_delete_traversal_rejected() {
        let (dir, store) = store();
        let victim = dir.path().join("passwd");
        std::fs::write(&victim, b"root").unwrap();

        let result = store.delete("../passwd");
        assert!(matches!(result, Err(ArtifactError::InvalidName(_))));
        assert!(victim.exists());

        let result = store.delete("../../etc/passwd");
        assert!(matches!(result, Err(ArtifactError::InvalidName(_))));
    }

    #[test]
    fn test_take_serves_once() {
        let (_dir, store) = store();
        let name = store
            .write(ArtifactKind::ReportChart, "png", b"png")
            .unwrap()
            .commit()
            .name;

        assert_eq!(store.take(&name).unwrap().bytes, b"png");
        assert!(matches!(store.take(&name), Err(ArtifactError::NotFound(_))));
    }

    #[test]
    fn test_temporary_area_removed_with_store() {
        let store = ArtifactStore::open(&Config::with_corpus("/tmp")).unwrap();
        let root = store.root().to_path_buf();
        assert!(root.is_dir());
        drop(store);
        assert!(!root.exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_distinct() {
        let (_dir, store) = store();
        let store = Arc::new(store);

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::task::spawn_blocking(move || {
                    store
                        .write(ArtifactKind::ReportJson, "json", format!("{{\"n\":{}}}", i).as_bytes())
                        .map(|g| (g.commit(), i))
                })
            })
            .collect();

        let mut names = std::collections::HashSet::new();
        for task in tasks {
            let (artifact, i) = task.await.unwrap().unwrap();
            let served = store.read(&artifact.name).unwrap();
            assert_eq!(served.bytes, format!("{{\"n\":{}}}", i).into_bytes());
            names.insert(artifact.name);
        }
        assert_eq!(names.len(), 8);
    }

    #[test]
    fn test_concurrent_take_serves_exactly_once() {
        let (dir, store) = store();
        let store = Arc::new(store);
        let name = store
            .write(ArtifactKind::ReportJson, "json", b"{}")
            .unwrap()
            .commit()
            .name;

        let barrier = Arc::new(std::sync::Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                let name = name.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    store.take(&name)
                })
            })
            .collect();

        let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let served = outcomes.iter().filter(|r| r.is_ok()).count();
        assert_eq!(served, 1);
        assert!(outcomes
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, ArtifactError::NotFound(_))));
        assert_eq!(std::fs::read_dir(dir.path().join("artifacts")).unwrap().count(), 0);
    }
}
