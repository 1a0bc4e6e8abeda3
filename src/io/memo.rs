//! Load-once cells for the process-lifetime dataset and model.
//!
//! A `LoadOnce<T>` is bound to a fixed path. The first successful load is
//! kept for the life of the cell and handed out as a shared `Arc<T>`; later
//! calls never touch the file again. A failed load is not cached, so the
//! caller sees the error and may retry.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

pub struct LoadOnce<T> {
    path: PathBuf,
    cell: OnceLock<Arc<T>>,
    // Serializes first-time loads so concurrent callers read the file once.
    init: Mutex<()>,
}

impl<T> LoadOnce<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cell: OnceLock::new(),
            init: Mutex::new(()),
        }
    }

    /// Return the cached value, running `load` on the first call.
    pub fn get_or_load<E>(&self, load: impl FnOnce(&Path) -> Result<T, E>) -> Result<Arc<T>, E> {
        if let Some(value) = self.cell.get() {
            return Ok(Arc::clone(value));
        }

        let _guard = self.init.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(value) = self.cell.get() {
            return Ok(Arc::clone(value));
        }

        let value = Arc::new(load(&self.path)?);
        tracing::debug!(path = %self.path.display(), "cached for process lifetime");
        Ok(Arc::clone(self.cell.get_or_init(|| value)))
    }
}

impl<T> std::fmt::Debug for LoadOnce<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadOnce")
            .field("path", &self.path)
            .field("loaded", &self.cell.get().is_some())
            .finish()
    }
}
