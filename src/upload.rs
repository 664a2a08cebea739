//! Upload boundary: turns a selected file into an asset handle

use std::fs;
use std::path::Path;

use aeroview_assets::{AssetFormat, AssetHandle};
use anyhow::{Context, Result};
use tracing::debug;

/// Read `path` into a handle, or `None` if its extension is not a 3D scene
/// format. Ignored files are never opened.
pub fn read_asset(path: &Path) -> Result<Option<AssetHandle>> {
    let Some(format) = AssetFormat::from_path(path) else {
        debug!("Ignoring {:?}: not a .glb or .gltf file", path);
        return Ok(None);
    };

    let bytes = fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("asset.{}", format.extension()));

    Ok(Some(AssetHandle::from_bytes(name, format, bytes).with_origin(path)))
}
