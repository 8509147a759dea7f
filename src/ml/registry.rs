use crate::error::{AppError, Result};
use crate::ml::persist::PersistedModel;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Shared, read-only handle to the active model.
///
/// Readers take an `Arc` snapshot and never block each other. A reload reads
/// the new artifact first and only then swaps the pointer, so a failed reload
/// leaves the previous model serving and in-flight requests keep the snapshot
/// they started with.
pub struct ModelHandle {
    path: PathBuf,
    current: RwLock<Option<Arc<PersistedModel>>>,
}

impl ModelHandle {
    /// Load the artifact at `path`; a missing artifact is an error
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let model = PersistedModel::load(&path)?;
        info!(
            path = %path.display(),
            model_id = %model.metadata.model_id,
            model_type = %model.metadata.model_type,
            "Model handle initialized"
        );
        Ok(Self {
            path,
            current: RwLock::new(Some(Arc::new(model))),
        })
    }

    /// Like `load`, but starts empty when no artifact exists yet
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        match Self::load(path.clone()) {
            Ok(handle) => Ok(handle),
            Err(AppError::ModelNotFound(msg)) => {
                warn!(path = %path.display(), "No model artifact yet: {}", msg);
                Ok(Self::empty(path))
            }
            Err(e) => Err(e),
        }
    }

    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            current: RwLock::new(None),
        }
    }

    /// Wrap an in-memory model; `reload` reads from `path`
    pub fn from_model(path: impl Into<PathBuf>, model: PersistedModel) -> Self {
        Self {
            path: path.into(),
            current: RwLock::new(Some(Arc::new(model))),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.current.read().is_some()
    }

    /// Snapshot of the active model
    pub fn current(&self) -> Result<Arc<PersistedModel>> {
        self.current.read().clone().ok_or_else(|| {
            AppError::ModelNotFound(format!(
                "{} has not been loaded; train a model and reload",
                self.path.display()
            ))
        })
    }

    /// Re-read the artifact from disk and make it active
    pub fn reload(&self) -> Result<Arc<PersistedModel>> {
        let model = Arc::new(PersistedModel::load(&self.path)?);
        let previous = self.swap(Arc::clone(&model));
        info!(
            previous = ?previous.map(|m| m.metadata.model_id),
            current = %model.metadata.model_id,
            "Model reloaded"
        );
        Ok(model)
    }

    /// Replace the active model, returning the one it displaced
    pub fn swap(&self, model: Arc<PersistedModel>) -> Option<Arc<PersistedModel>> {
        self.current.write().replace(model)
    }
}
