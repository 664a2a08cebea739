use std::path::Path;

use serde::{Deserialize, Serialize};

/// GLB magic number ("glTF" in little-endian).
pub(crate) const GLB_MAGIC: u32 = 0x4654_6C67;

/// Container formats accepted at the upload boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetFormat {
    /// Self-contained binary glTF (`.glb`).
    Glb,
    /// JSON glTF (`.gltf`), possibly linking external buffers.
    Gltf,
}

impl AssetFormat {
    /// Classify a file by its extension. Anything other than `.glb` or
    /// `.gltf` (case-insensitive) is not an asset.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "glb" => Some(Self::Glb),
            "gltf" => Some(Self::Gltf),
            _ => None,
        }
    }

    /// Classify a bare file name such as `"coupe.GLB"`.
    pub fn from_file_name(name: &str) -> Option<Self> {
        Self::from_path(Path::new(name))
    }

    /// Whether the leading bytes match what this format promises.
    pub fn matches_content(&self, data: &[u8]) -> bool {
        match self {
            Self::Glb => has_glb_magic(data),
            // JSON glTF; tolerate a UTF-8 BOM and leading whitespace.
            Self::Gltf => {
                let data = data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data);
                data.iter()
                    .find(|b| !b.is_ascii_whitespace())
                    .is_some_and(|&b| b == b'{')
            }
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Glb => "glb",
            Self::Gltf => "gltf",
        }
    }
}

pub(crate) fn has_glb_magic(data: &[u8]) -> bool {
    data.len() >= 4 && u32::from_le_bytes([data[0], data[1], data[2], data[3]]) == GLB_MAGIC
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extensions_are_case_insensitive() {
        assert_eq!(AssetFormat::from_file_name("car.glb"), Some(AssetFormat::Glb));
        assert_eq!(AssetFormat::from_file_name("CAR.GLB"), Some(AssetFormat::Glb));
        assert_eq!(AssetFormat::from_file_name("car.gltf"), Some(AssetFormat::Gltf));
    }

    #[test]
    fn test_other_files_are_not_assets() {
        assert_eq!(AssetFormat::from_file_name("car.obj"), None);
        assert_eq!(AssetFormat::from_file_name("car.glb.txt"), None);
        assert_eq!(AssetFormat::from_file_name("glb"), None);
    }

    #[test]
    fn test_content_sniffing() {
        assert!(AssetFormat::Glb.matches_content(b"glTF\x02\x00\x00\x00"));
        assert!(!AssetFormat::Glb.matches_content(b"{\"asset\":{}}"));
        assert!(!AssetFormat::Glb.matches_content(b"gl"));
        assert!(AssetFormat::Gltf.matches_content(b"  \n{\"asset\":{}}"));
        assert!(!AssetFormat::Gltf.matches_content(b"glTF"));
    }
}
