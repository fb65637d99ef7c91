//! Grid snapshots for renderers and offline inspection

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// On-disk snapshot encoding
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotFormat {
    /// Human-readable RON
    #[default]
    Ron,
    /// Compact bincode
    Bincode,
}

/// Element ids of every cell plus the id to name palette
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub width: u32,
    pub height: u32,
    pub tick: u64,
    /// Element names indexed by element id
    pub palette: Vec<String>,
    /// Row-major element ids, row 0 at the top
    pub cells: Vec<u16>,
}

impl GridSnapshot {
    /// Element name at (x, y), `None` outside the grid
    pub fn name_at(&self, x: u32, y: u32) -> Option<&str> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = y as usize * self.width as usize + x as usize;
        let id = *self.cells.get(index)?;
        self.palette.get(id as usize).map(String::as_str)
    }

    /// Number of cells holding the named element
    pub fn count(&self, name: &str) -> usize {
        match self.palette.iter().position(|n| n == name) {
            Some(id) => self.cells.iter().filter(|c| **c as usize == id).count(),
            None => 0,
        }
    }

    pub fn to_ron(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .context("Failed to serialize snapshot to RON")
    }

    pub fn from_ron(text: &str) -> Result<Self> {
        ron::from_str(text).context("Failed to parse RON snapshot")
    }

    pub fn to_bincode(&self) -> Result<Vec<u8>> {
        bincode_next::serde::encode_to_vec(self, bincode_next::config::standard())
            .context("Failed to serialize snapshot")
    }

    pub fn from_bincode(bytes: &[u8]) -> Result<Self> {
        let (snapshot, _): (GridSnapshot, _) =
            bincode_next::serde::decode_from_slice(bytes, bincode_next::config::standard())
                .map_err(|e| anyhow::anyhow!("Failed to deserialize snapshot: {:?}", e))?;
        Ok(snapshot)
    }

    /// Write the snapshot to `path` (temp file, then rename)
    pub fn save(&self, path: impl AsRef<Path>, format: SnapshotFormat) -> Result<()> {
        let path = path.as_ref();
        let bytes = match format {
            SnapshotFormat::Ron => self.to_ron()?.into_bytes(),
            SnapshotFormat::Bincode => self.to_bincode()?,
        };

        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, &bytes)
            .with_context(|| format!("Failed to write snapshot file: {}", temp_path.display()))?;
        std::fs::rename(&temp_path, path)
            .with_context(|| format!("Failed to rename snapshot file: {}", path.display()))?;

        log::info!(
            "Saved {}x{} snapshot at tick {} to {} ({} bytes)",
            self.width,
            self.height,
            self.tick,
            path.display(),
            bytes.len()
        );
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>, format: SnapshotFormat) -> Result<Self> {
        let path = path.as_ref();
        match format {
            SnapshotFormat::Ron => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read snapshot file: {}", path.display()))?;
                Self::from_ron(&text)
            }
            SnapshotFormat::Bincode => {
                let bytes = std::fs::read(path)
                    .with_context(|| format!("Failed to read snapshot file: {}", path.display()))?;
                Self::from_bincode(&bytes)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GridSnapshot {
        GridSnapshot {
            width: 3,
            height: 2,
            tick: 7,
            palette: vec!["Empty".to_string(), "Sand".to_string(), "Water".to_string()],
            cells: vec![0, 1, 0, 2, 2, 1],
        }
    }

    #[test]
    fn test_name_at_and_count() {
        let snapshot = sample();
        assert_eq!(snapshot.name_at(1, 0), Some("Sand"));
        assert_eq!(snapshot.name_at(0, 1), Some("Water"));
        assert_eq!(snapshot.name_at(3, 0), None);
        assert_eq!(snapshot.count("Water"), 2);
        assert_eq!(snapshot.count("Lava"), 0);
    }

    #[test]
    fn test_name_at_large_dimensions_does_not_wrap() {
        // Declared size larger than u32 cell indices, cells truncated
        let snapshot = GridSnapshot {
            width: 70_000,
            height: 70_000,
            ..sample()
        };
        assert_eq!(snapshot.name_at(0, 0), Some("Empty"));
        assert_eq!(snapshot.name_at(5, 65_000), None);
    }

    #[test]
    fn test_save_and_load_both_formats() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = sample();

        for (file, format) in [
            ("grid.ron", SnapshotFormat::Ron),
            ("grid.bin", SnapshotFormat::Bincode),
        ] {
            let path = dir.path().join(file);
            snapshot.save(&path, format).unwrap();
            assert!(!path.with_extension("tmp").exists());
            assert_eq!(GridSnapshot::load(&path, format).unwrap(), snapshot);
        }
    }

    #[test]
    fn test_load_garbage_fails_with_context() {
        let err = GridSnapshot::from_ron("not a snapshot").unwrap_err();
        assert!(err.to_string().contains("Failed to parse RON snapshot"));
        assert!(GridSnapshot::from_bincode(&[0xff, 0xff]).is_err());
    }
}
