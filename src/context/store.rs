//! Durable persistence for the active context.
//!
//! The persistence contract is best-effort: the store exists so the
//! selected scope survives between invocations, not as a source of truth.
//! Save failures are logged by the manager and never surfaced; an
//! unreadable or inconsistent file restores as "no context".

use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::context::ActiveContext;
use crate::errors::StoreError;

/// Key-value persistence for the serialized [`ActiveContext`], one fixed
/// slot, overwrite on every save.
pub trait ContextStore: Send + Sync {
    fn load(&self) -> Result<Option<ActiveContext>, StoreError>;
    fn save(&self, context: &ActiveContext) -> Result<(), StoreError>;
}

/// On-disk envelope around the persisted context.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedContext {
    saved_at: DateTime<Utc>,
    context: ActiveContext,
}

/// File-backed store under the platform state directory.
///
/// Writes take an exclusive lock on the file: two `scopectl` invocations
/// racing on the same file must not interleave a torn write.
pub struct FileContextStore {
    path: PathBuf,
}

impl FileContextStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store at the default location, `<data dir>/scopectl/active_context.json`.
    pub fn at_default_path() -> Result<Self, StoreError> {
        let base = dirs::data_dir().ok_or(StoreError::NoStateDir)?;
        Ok(Self::in_dir(&base.join("scopectl")))
    }

    /// Store in an explicit state directory (the `[state] dir` config
    /// override).
    pub fn in_dir(dir: &std::path::Path) -> Self {
        Self::new(dir.join("active_context.json"))
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl ContextStore for FileContextStore {
    fn load(&self) -> Result<Option<ActiveContext>, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };
        let envelope: PersistedContext =
            serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt {
                path: self.path.clone(),
                source: e,
            })?;
        Ok(Some(envelope.context))
    }

    fn save(&self, context: &ActiveContext) -> Result<(), StoreError> {
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }

        let envelope = PersistedContext {
            saved_at: Utc::now(),
            context: context.clone(),
        };
        let json = serde_json::to_string_pretty(&envelope).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            source: e,
        })?;

        // Open without truncating: the previous contents may only be
        // destroyed once the exclusive lock is held, otherwise a concurrent
        // locked writer observes an empty file.
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .open(&self.path)
            .map_err(write_err)?;
        file.lock_exclusive().map_err(write_err)?;
        let result = file
            .set_len(0)
            .and_then(|()| file.write_all(json.as_bytes()))
            .and_then(|()| file.flush())
            .map_err(write_err);
        let _ = fs2::FileExt::unlock(&file);
        result
    }
}

/// In-memory store, for tests and embedding.
#[derive(Default)]
pub struct MemoryContextStore {
    slot: Mutex<Option<ActiveContext>>,
}

impl MemoryContextStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContextStore for MemoryContextStore {
    fn load(&self) -> Result<Option<ActiveContext>, StoreError> {
        Ok(self.slot.lock().expect("store mutex poisoned").clone())
    }

    fn save(&self, context: &ActiveContext) -> Result<(), StoreError> {
        *self.slot.lock().expect("store mutex poisoned") = Some(context.clone());
        Ok(())
    }
}
