//! Frame list descriptors for ffmpeg's concat demuxer.

use crate::Result;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Name of the descriptor written next to the split frames.
pub const FRAME_LIST_NAME: &str = "frames.txt";

/// File name of split frame `index`.
pub fn frame_file_name(index: usize) -> String {
    format!("frame-{index}.png")
}

/// Render a descriptor alternating file and duration lines.
///
/// The demuxer ignores the duration of the final entry, so the last file is
/// listed once more after it.
pub fn render_frame_list(durations: &[f64]) -> String {
    let mut out = String::from("ffconcat version 1.0\n");
    for (i, d) in durations.iter().enumerate() {
        let _ = writeln!(out, "file '{}'", frame_file_name(i));
        let _ = writeln!(out, "duration {:.3}", d);
    }
    if let Some(last) = durations.len().checked_sub(1) {
        let _ = writeln!(out, "file '{}'", frame_file_name(last));
    }
    out
}

/// Write the descriptor for `durations` into `dir`, replacing any previous one.
pub fn write_frame_list(dir: &Path, durations: &[f64]) -> Result<PathBuf> {
    let path = dir.join(FRAME_LIST_NAME);
    std::fs::write(&path, render_frame_list(durations))?;
    Ok(path)
}
