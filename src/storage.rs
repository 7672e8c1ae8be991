// SPDX-License-Identifier: GPL-3.0-only

//! Snapshot storage

use crate::constants::{app_info::APP_NAME, file_formats::SNAPSHOT_EXTENSION};
use crate::errors::VelvetResult;
use crate::frame::Frame;
use std::path::{Path, PathBuf};
use tracing::info;

/// `~/Pictures/velvet`, or `./velvet` when there is no home directory
pub fn default_snapshot_dir() -> PathBuf {
    dirs::picture_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Pictures")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Timestamped snapshot file name inside `dir`
pub fn snapshot_path(dir: &Path) -> PathBuf {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S_%3f");
    dir.join(format!("{}_{}.{}", APP_NAME, timestamp, SNAPSHOT_EXTENSION))
}

/// Encode a frame to `path`, format chosen from the extension
pub fn save_frame(frame: Frame, path: &Path) -> VelvetResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let (width, height) = frame.dimensions();
    frame.into_rgba_image()?.save(path)?;
    info!(path = %path.display(), width, height, "Frame saved");
    Ok(())
}

/// Save a frame as a new snapshot in `dir`
pub fn save_snapshot(frame: Frame, dir: &Path) -> VelvetResult<PathBuf> {
    let path = snapshot_path(dir);
    save_frame(frame, &path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_path_shape() {
        let path = snapshot_path(Path::new("/tmp/shots"));
        assert_eq!(path.parent(), Some(Path::new("/tmp/shots")));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("velvet_"));
        assert!(name.ends_with(".png"));
    }

    #[test]
    fn test_default_dir_ends_with_app_name() {
        assert!(default_snapshot_dir().ends_with(APP_NAME));
    }

    #[test]
    fn test_save_snapshot_roundtrip() {
        let dir = std::env::temp_dir().join(format!("velvet_storage_{}", std::process::id()));
        let frame = Frame::filled(2, 2, [12, 34, 56, 255]);

        let path = save_snapshot(frame, &dir).unwrap();
        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded.dimensions(), (2, 2));
        assert_eq!(loaded.get_pixel(1, 1).0, [12, 34, 56, 255]);

        let _ = std::fs::remove_dir_all(dir);
    }
}
