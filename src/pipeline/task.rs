use stickerforge_common::{validate_order, Operation, StickerId};
use std::path::{Path, PathBuf};

/// Everything needed to transcode one sticker.
///
/// The operation list is validated on construction and cannot change
/// afterwards; the builder methods only fill in optional inputs before the
/// task is queued.
#[derive(Debug, Clone, PartialEq)]
pub struct StickerTask {
    id: StickerId,
    input: PathBuf,
    audio: Option<PathBuf>,
    overlay: Option<PathBuf>,
    scale: u32,
    operations: Vec<Operation>,
    output: PathBuf,
}

impl StickerTask {
    /// Create a task, rejecting operation lists that break the
    /// overlay, scale, alpha removal, conversion order.
    pub fn new(
        id: impl Into<StickerId>,
        input: impl Into<PathBuf>,
        operations: Vec<Operation>,
        output: impl Into<PathBuf>,
    ) -> stickerforge_common::Result<Self> {
        validate_order(&operations)?;
        Ok(Self {
            id: id.into(),
            input: input.into(),
            audio: None,
            overlay: None,
            scale: 0,
            operations,
            output: output.into(),
        })
    }

    pub fn with_audio(mut self, audio: impl Into<PathBuf>) -> Self {
        self.audio = Some(audio.into());
        self
    }

    pub fn with_overlay(mut self, overlay: impl Into<PathBuf>) -> Self {
        self.overlay = Some(overlay.into());
        self
    }

    /// Longer side for [`Operation::Scale`]; 0 leaves size unchanged.
    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = scale;
        self
    }

    pub fn id(&self) -> &StickerId {
        &self.id
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn audio(&self) -> Option<&Path> {
        self.audio.as_deref()
    }

    pub fn overlay(&self) -> Option<&Path> {
        self.overlay.as_deref()
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn output(&self) -> &Path {
        &self.output
    }
}
