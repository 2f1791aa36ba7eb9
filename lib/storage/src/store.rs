//! Artifact persistence
//!
//! The bundle is written as a single bincode file through `atomicwrites`, so
//! a reader never observes a half-written model.

use crate::artifacts::Artifacts;
use anyhow::{anyhow, Context, Result};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct ArtifactStore {
    path: PathBuf,
}

impl ArtifactStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Validate and write the bundle, replacing any previous one
    pub fn save(&self, artifacts: &Artifacts) -> Result<()> {
        artifacts.validate()?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let data = bincode::serialize(artifacts).map_err(|e| anyhow!("Serialization error: {}", e))?;
        AtomicFile::new(&self.path, OverwriteBehavior::AllowOverwrite)
            .write(|f| f.write_all(&data))
            .with_context(|| format!("failed to write {}", self.path.display()))?;

        tracing::info!(path = %self.path.display(), bytes = data.len(), "saved artifacts");
        Ok(())
    }

    /// Read and validate a bundle
    pub fn load(&self) -> Result<Artifacts> {
        let data = fs::read(&self.path).with_context(|| format!("failed to read {}", self.path.display()))?;
        let artifacts: Artifacts =
            bincode::deserialize(&data).map_err(|e| anyhow!("Deserialization error: {}", e))?;
        artifacts
            .validate()
            .with_context(|| format!("invalid artifacts in {}", self.path.display()))?;

        tracing::info!(
            path = %self.path.display(),
            vocabulary = artifacts.vectorizer.dim(),
            context_dim = artifacts.encoder.dim(),
            "loaded artifacts"
        );
        Ok(artifacts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::tests::{records, small_config};
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("models").join("whiff.bin"));
        let (artifacts, _) = Artifacts::fit(&records(), &small_config()).unwrap();

        assert!(!store.exists());
        store.save(&artifacts).unwrap();
        assert!(store.exists());

        let loaded = store.load().unwrap();
        assert_eq!(loaded, artifacts);
    }

    #[test]
    fn test_save_overwrites() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("whiff.bin"));
        let (first, _) = Artifacts::fit(&records(), &small_config()).unwrap();
        store.save(&first).unwrap();

        let config = whiff_classifier::TrainingConfig {
            seed: 7,
            ..small_config()
        };
        let (second, _) = Artifacts::fit(&records(), &config).unwrap();
        store.save(&second).unwrap();
        assert_eq!(store.load().unwrap(), second);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("absent.bin"));
        assert!(store.load().is_err());
    }

    #[test]
    fn test_load_garbage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage.bin");
        fs::write(&path, b"not a model").unwrap();
        assert!(ArtifactStore::new(&path).load().is_err());
    }

    #[test]
    fn test_invalid_bundle_not_saved() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("whiff.bin"));
        let (mut artifacts, _) = Artifacts::fit(&records(), &small_config()).unwrap();
        artifacts.format_version = 99;
        assert!(store.save(&artifacts).is_err());
        assert!(!store.exists());
    }
}
