//! Encoder actions, one per pipeline operation.
//!
//! Each action reads a [`MediaInput`], writes one new interim file into the
//! workspace, and returns it as the next step's input. Actions never touch
//! the final destination.

mod extract;
mod gif;
mod mp4;
mod overlay;
mod remove_alpha;
mod scale;
mod webm;

pub use extract::extract_frames;
pub use gif::{gif_filter_graph, to_gif};
pub use mp4::to_mp4;
pub use overlay::overlay;
pub use remove_alpha::{remove_alpha, FLATTEN_FILTER};
pub use scale::{scale, scale_filter};
pub use webm::{to_webm, WebmRenderer};

use crate::capper::DurationCapper;
use crate::probe::SourceKind;
use crate::{ToolCommand, ToolRegistry, Workspace};
use std::path::{Path, PathBuf};

/// Default `paletteuse` alpha threshold for GIF output.
pub const DEFAULT_GIF_ALPHA_THRESHOLD: u8 = 10;
/// Default nominal framerate for WebM output.
pub const DEFAULT_WEBM_FRAMERATE: u32 = 30;

/// Encoder parameters shared by all tasks of a run.
#[derive(Debug, Clone)]
pub struct EncodeSettings {
    /// Pixels with alpha below this are transparent in GIF output.
    pub gif_alpha_threshold: u8,
    /// Constant output framerate for WebM.
    pub webm_framerate: u32,
    /// Duration and size limits for WebM.
    pub capper: DurationCapper,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            gif_alpha_threshold: DEFAULT_GIF_ALPHA_THRESHOLD,
            webm_framerate: DEFAULT_WEBM_FRAMERATE,
            capper: DurationCapper::default(),
        }
    }
}

/// Where one pipeline step runs: tools, scratch space, and interim naming.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    pub tools: &'a ToolRegistry,
    pub workspace: &'a Workspace,
    pub sticker_id: &'a str,
    pub step: usize,
}

impl StepContext<'_> {
    /// Interim file for this step.
    pub fn output(&self, op: &str, ext: &str) -> PathBuf {
        self.workspace
            .interim_file(self.sticker_id, self.step, op, ext)
    }
}

/// Split frames of a reconstructed animation plus their descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSequence {
    pub dir: PathBuf,
    pub list: PathBuf,
    pub canvas: (u32, u32),
    pub durations: Vec<f64>,
}

/// Input to an action.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaInput {
    /// A single file ffmpeg or magick can decode.
    File { path: PathBuf, kind: SourceKind },
    /// Complete frames read through the concat demuxer.
    Frames(FrameSequence),
}

impl MediaInput {
    pub fn file(path: impl Into<PathBuf>, kind: SourceKind) -> Self {
        Self::File {
            path: path.into(),
            kind,
        }
    }

    pub fn is_animated(&self) -> bool {
        match self {
            Self::File { kind, .. } => kind.is_animated(),
            Self::Frames(_) => true,
        }
    }

    /// File backing this input; the descriptor for frame sequences.
    pub fn path(&self) -> &Path {
        match self {
            Self::File { path, .. } => path,
            Self::Frames(seq) => &seq.list,
        }
    }

    /// Add the ffmpeg input options for this source.
    fn push_ffmpeg_input(&self, cmd: &mut ToolCommand) {
        match self {
            Self::File {
                path,
                kind: SourceKind::AnimatedPng,
            } => {
                cmd.args(["-f", "apng", "-i"]).arg(path);
            }
            Self::File { path, .. } => {
                cmd.arg("-i").arg(path);
            }
            Self::Frames(seq) => {
                cmd.args(["-f", "concat", "-safe", "0", "-i"]).arg(&seq.list);
            }
        }
    }
}

/// Join filters into one `-vf` chain.
fn filter_chain<I, S>(filters: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined: Vec<String> = filters
        .into_iter()
        .map(|f| f.as_ref().to_string())
        .filter(|f| !f.is_empty())
        .collect();
    if joined.is_empty() {
        None
    } else {
        Some(joined.join(","))
    }
}

/// Kind of a re-encoded file: still images land in PNG.
fn reencoded_kind(kind: SourceKind) -> SourceKind {
    match kind {
        SourceKind::AnimatedPng | SourceKind::AnimatedWebp => SourceKind::AnimatedPng,
        SourceKind::Gif => SourceKind::Gif,
        SourceKind::StaticPng | SourceKind::StaticWebp | SourceKind::Unknown => {
            SourceKind::StaticPng
        }
    }
}

/// Add ffmpeg output options that keep `kind`'s container.
fn push_same_container_output(cmd: &mut ToolCommand, kind: SourceKind) {
    match kind {
        SourceKind::AnimatedPng => {
            cmd.args(["-f", "apng", "-plays", "0"]);
        }
        SourceKind::Gif => {
            cmd.args(["-f", "gif", "-loop", "0"]);
        }
        _ => {
            cmd.args(["-frames:v", "1", "-update", "1"]);
        }
    }
}
