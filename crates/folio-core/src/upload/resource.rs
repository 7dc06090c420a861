//! Temporary source references.
//!
//! While the cropper is open the host needs a handle to render the picked
//! file from (a browser object URL, a temp file). The handle is owned by a
//! [`TempSourceRef`] guard: whoever holds the guard last releases it, once,
//! when it is dropped.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::source::SourceFile;

/// Host capability that hands out and revokes temporary references.
pub trait SourceRegistry: Send + Sync {
    /// Register `file` and return a handle the host can render from.
    fn create(&self, file: &SourceFile) -> String;

    /// Revoke a handle returned by [`SourceRegistry::create`].
    fn revoke(&self, handle: &str);
}

/// Owning guard for one registered handle. Revokes on drop.
pub struct TempSourceRef {
    handle: String,
    registry: Arc<dyn SourceRegistry>,
}

impl TempSourceRef {
    pub fn acquire(registry: Arc<dyn SourceRegistry>, file: &SourceFile) -> Self {
        let handle = registry.create(file);
        debug!(handle = %handle, file_name = %file.name, "Acquired temporary source");
        Self { handle, registry }
    }

    pub fn handle(&self) -> &str {
        &self.handle
    }
}

impl Drop for TempSourceRef {
    fn drop(&mut self) {
        debug!(handle = %self.handle, "Releasing temporary source");
        self.registry.revoke(&self.handle);
    }
}

impl fmt::Debug for TempSourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TempSourceRef")
            .field("handle", &self.handle)
            .finish()
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    next: u64,
    live: HashSet<String>,
    revocations: HashMap<String, usize>,
}

/// In-process registry that records every revocation.
///
/// Handles look like `blob:folio/1`. Revoking an unknown or already revoked
/// handle is counted but otherwise ignored.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    state: Mutex<RegistryState>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles created and not yet revoked.
    pub fn live_count(&self) -> usize {
        self.state.lock().map(|s| s.live.len()).unwrap_or(0)
    }

    pub fn is_live(&self, handle: &str) -> bool {
        self.state
            .lock()
            .map(|s| s.live.contains(handle))
            .unwrap_or(false)
    }

    /// How many times `handle` has been revoked.
    pub fn revocations(&self, handle: &str) -> usize {
        self.state
            .lock()
            .ok()
            .and_then(|s| s.revocations.get(handle).copied())
            .unwrap_or(0)
    }

    /// Revocations across all handles.
    pub fn total_revocations(&self) -> usize {
        self.state
            .lock()
            .map(|s| s.revocations.values().sum())
            .unwrap_or(0)
    }
}

impl SourceRegistry for MemoryRegistry {
    fn create(&self, _file: &SourceFile) -> String {
        let Ok(mut state) = self.state.lock() else {
            return String::new();
        };
        state.next += 1;
        let handle = format!("blob:folio/{}", state.next);
        state.live.insert(handle.clone());
        handle
    }

    fn revoke(&self, handle: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.live.remove(handle);
            *state.revocations.entry(handle.to_string()).or_default() += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file() -> SourceFile {
        SourceFile::new("a.png", "image/png", vec![1u8, 2, 3])
    }

    #[test]
    fn test_released_on_drop() {
        let registry = Arc::new(MemoryRegistry::new());
        let guard = TempSourceRef::acquire(registry.clone(), &file());
        let handle = guard.handle().to_string();
        assert!(registry.is_live(&handle));

        drop(guard);
        assert!(!registry.is_live(&handle));
        assert_eq!(registry.revocations(&handle), 1);
    }

    #[test]
    fn test_moving_does_not_release() {
        let registry = Arc::new(MemoryRegistry::new());
        let guard = TempSourceRef::acquire(registry.clone(), &file());
        let handle = guard.handle().to_string();

        let moved = Some(guard);
        assert_eq!(registry.revocations(&handle), 0);
        drop(moved);
        assert_eq!(registry.revocations(&handle), 1);
    }

    #[test]
    fn test_distinct_handles() {
        let registry = Arc::new(MemoryRegistry::new());
        let a = TempSourceRef::acquire(registry.clone(), &file());
        let b = TempSourceRef::acquire(registry.clone(), &file());
        assert_ne!(a.handle(), b.handle());
        assert_eq!(registry.live_count(), 2);
    }
}
