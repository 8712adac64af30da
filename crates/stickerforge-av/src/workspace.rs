//! Scratch space for a transcode phase.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Process-wide scratch directory for interim files.
///
/// Created before any worker starts and shared by all of them; every file
/// name it hands out embeds the sticker id, so concurrent tasks never
/// collide. The directory and everything in it is removed on drop.
///
/// # Example
///
/// ```no_run
/// use stickerforge_av::Workspace;
///
/// let workspace = Workspace::new()?;
/// let interim = workspace.interim_file("4412296", 1, "scale", "png");
/// assert!(interim.ends_with("4412296-1-scale.png"));
/// # Ok::<(), stickerforge_av::Error>(())
/// ```
#[derive(Debug)]
pub struct Workspace {
    temp_dir: TempDir,
}

impl Workspace {
    /// Create a new scratch directory under the system temp location.
    pub fn new() -> Result<Self> {
        let temp_dir = tempfile::Builder::new()
            .prefix("stickerforge-")
            .tempdir()
            .map_err(|e| Error::Workspace(e.to_string()))?;
        Ok(Self { temp_dir })
    }

    /// Create a new scratch directory inside `parent`.
    pub fn new_in(parent: impl AsRef<Path>) -> Result<Self> {
        let temp_dir = tempfile::Builder::new()
            .prefix("stickerforge-")
            .tempdir_in(parent)
            .map_err(|e| Error::Workspace(e.to_string()))?;
        Ok(Self { temp_dir })
    }

    /// Get the scratch directory path.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a temp file path with the given name.
    pub fn temp_file(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Path for the output of pipeline step `step` of sticker `id`.
    pub fn interim_file(&self, id: &str, step: usize, op: &str, ext: &str) -> PathBuf {
        self.temp_file(&format!("{id}-{step}-{op}.{ext}"))
    }

    /// Fresh, empty directory for split frames of sticker `id` at `step`.
    pub fn frames_dir(&self, id: &str, step: usize) -> Result<PathBuf> {
        let dir = self.temp_file(&format!("frames-{id}-{step}"));
        if dir.exists() {
            std::fs::remove_dir_all(&dir)?;
        }
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

/// Copy `interim` to `destination` without exposing a partial file.
///
/// The bytes are written to a hidden sibling of the destination and renamed
/// into place, so the destination is either absent or complete.
pub fn deliver(interim: &Path, destination: &Path) -> Result<PathBuf> {
    if !interim.exists() {
        return Err(Error::Workspace(format!(
            "Output file does not exist: {:?}",
            interim
        )));
    }

    let file_name = destination
        .file_name()
        .ok_or_else(|| Error::InvalidInput(format!("Invalid destination path: {:?}", destination)))?;

    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let staging = destination.with_file_name(format!(".{}.part", file_name.to_string_lossy()));

    if let Err(e) = std::fs::copy(interim, &staging) {
        let _ = std::fs::remove_file(&staging);
        return Err(Error::Workspace(format!(
            "Failed to copy output to destination: {}",
            e
        )));
    }

    if let Err(e) = std::fs::rename(&staging, destination) {
        let _ = std::fs::remove_file(&staging);
        return Err(Error::Workspace(format!(
            "Failed to move output to destination: {}",
            e
        )));
    }

    Ok(destination.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_interim_names_embed_id_and_step() {
        let workspace = Workspace::new().unwrap();
        let a = workspace.interim_file("100", 0, "overlay", "png");
        let b = workspace.interim_file("101", 0, "overlay", "png");
        assert_ne!(a, b);
        assert!(a.starts_with(workspace.path()));
        assert_eq!(a.file_name().unwrap(), "100-0-overlay.png");
    }

    #[test]
    fn test_frames_dir_is_recreated_empty() {
        let workspace = Workspace::new().unwrap();
        let dir = workspace.frames_dir("7", 2).unwrap();
        std::fs::write(dir.join("frame-0.png"), b"stale").unwrap();

        let again = workspace.frames_dir("7", 2).unwrap();
        assert_eq!(dir, again);
        assert_eq!(std::fs::read_dir(&again).unwrap().count(), 0);
    }

    #[test]
    fn test_workspace_removed_on_drop() {
        let parent = tempdir().unwrap();
        let path = {
            let workspace = Workspace::new_in(parent.path()).unwrap();
            workspace.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_deliver_copies_and_keeps_interim() {
        let dir = tempdir().unwrap();
        let interim = dir.path().join("interim.gif");
        std::fs::write(&interim, b"GIF89a").unwrap();

        let dest = dir.path().join("out").join("42.gif");
        let delivered = deliver(&interim, &dest).unwrap();

        assert_eq!(delivered, dest);
        assert_eq!(std::fs::read(&dest).unwrap(), b"GIF89a");
        assert!(interim.exists());
        assert!(!dir.path().join("out").join(".42.gif.part").exists());
    }

    #[test]
    fn test_deliver_missing_interim_leaves_no_output() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("42.gif");
        assert!(deliver(&dir.path().join("missing.gif"), &dest).is_err());
        assert!(!dest.exists());
    }
}
