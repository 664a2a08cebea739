use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::format::AssetFormat;

/// Unique identifier for an uploaded asset.
pub type AssetId = u64;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a new unique asset ID.
fn next_asset_id() -> AssetId {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Opaque reference to the bytes of one uploaded 3D scene.
///
/// Clones share the same bytes and the same revoked flag, so a loader that
/// still holds a clone can observe that its upload has been replaced.
#[derive(Debug, Clone)]
pub struct AssetHandle {
    id: AssetId,
    uri: String,
    name: String,
    format: AssetFormat,
    origin: Option<PathBuf>,
    bytes: Arc<[u8]>,
    revoked: Arc<AtomicBool>,
}

impl AssetHandle {
    /// Wrap in-memory bytes as a new handle.
    pub fn from_bytes(name: impl Into<String>, format: AssetFormat, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            id: next_asset_id(),
            uri: format!("blob:aeroview/{}", Uuid::new_v4()),
            name: name.into(),
            format,
            origin: None,
            bytes: bytes.into(),
            revoked: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Remember the file this handle was read from, so JSON glTF files can
    /// resolve buffers that live next to them.
    pub fn with_origin(mut self, path: impl Into<PathBuf>) -> Self {
        self.origin = Some(path.into());
        self
    }

    /// The unique ID of this asset.
    pub fn id(&self) -> AssetId {
        self.id
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Display name (usually the uploaded file name).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> AssetFormat {
        self.format
    }

    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked.load(Ordering::Acquire)
    }

    fn revoke(&self) {
        self.revoked.store(true, Ordering::Release);
    }
}

impl PartialEq for AssetHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for AssetHandle {}

/// Owner of the single live upload. Installing a new handle revokes the
/// previous one.
#[derive(Debug, Default)]
pub struct HandleRegistry {
    current: Option<AssetHandle>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `handle` as the live upload and return the revoked previous
    /// handle, if any.
    pub fn replace(&mut self, handle: AssetHandle) -> Option<AssetHandle> {
        let previous = self.revoke_current();
        info!("Asset handle {} is live ({})", handle.uri(), handle.name());
        self.current = Some(handle);
        previous
    }

    /// Revoke and release the live handle (component teardown).
    pub fn revoke_current(&mut self) -> Option<AssetHandle> {
        let previous = self.current.take()?;
        previous.revoke();
        info!("Revoked asset handle {}", previous.uri());
        Some(previous)
    }

    pub fn current(&self) -> Option<&AssetHandle> {
        self.current.as_ref()
    }

    /// Number of live handles; never more than one.
    pub fn live_count(&self) -> usize {
        usize::from(self.current.is_some())
    }
}

impl Drop for HandleRegistry {
    fn drop(&mut self) {
        self.revoke_current();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(name: &str) -> AssetHandle {
        AssetHandle::from_bytes(name, AssetFormat::Glb, vec![1u8, 2, 3])
    }

    #[test]
    fn test_handles_get_unique_ids_and_uris() {
        let a = handle("a.glb");
        let b = handle("b.glb");
        assert_ne!(a.id(), b.id());
        assert_ne!(a.uri(), b.uri());
        assert!(a.uri().starts_with("blob:aeroview/"));
    }

    #[test]
    fn test_replace_revokes_previous() {
        let mut registry = HandleRegistry::new();
        let first = handle("first.glb");
        let observer = first.clone();

        assert!(registry.replace(first).is_none());
        assert_eq!(registry.live_count(), 1);
        assert!(!observer.is_revoked());

        let previous = registry.replace(handle("second.glb"));
        assert_eq!(previous.map(|h| h.id()), Some(observer.id()));
        assert!(observer.is_revoked());
        assert_eq!(registry.live_count(), 1);
        assert_eq!(registry.current().map(|h| h.name()), Some("second.glb"));
    }

    #[test]
    fn test_teardown_revokes_live_handle() {
        let live = handle("live.glb");
        let observer = live.clone();
        {
            let mut registry = HandleRegistry::new();
            registry.replace(live);
        }
        assert!(observer.is_revoked());
    }

    #[test]
    fn test_revoke_current_empties_registry() {
        let mut registry = HandleRegistry::new();
        assert!(registry.revoke_current().is_none());
        registry.replace(handle("x.glb"));
        assert!(registry.revoke_current().is_some());
        assert_eq!(registry.live_count(), 0);
    }
}
