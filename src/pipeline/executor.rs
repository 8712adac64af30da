use super::StickerTask;
use anyhow::{Context, Result};
use stickerforge_av::actions::{
    extract_frames, overlay, remove_alpha, scale, scale_filter, to_gif, to_mp4, to_webm,
    EncodeSettings, MediaInput, StepContext, FLATTEN_FILTER,
};
use stickerforge_av::probe::{sniff_file, SourceKind};
use stickerforge_av::{deliver, ToolRegistry, Workspace};
use stickerforge_common::Operation;
use std::path::PathBuf;

/// Progress callback type
pub type ProgressCallback = Box<dyn Fn(f32, &str) + Send + Sync>;

/// Current file of a task plus filters waiting for the next encode.
///
/// Animated WebP cannot be re-encoded by ffmpeg in place, so scale and
/// alpha removal on it are carried forward and applied by the conversion
/// that reads the reconstructed frames.
#[derive(Debug)]
struct Chain {
    input: MediaInput,
    deferred: Vec<String>,
}

impl Chain {
    fn defers(&self) -> bool {
        matches!(
            self.input,
            MediaInput::File {
                kind: SourceKind::AnimatedWebp,
                ..
            } | MediaInput::Frames(_)
        )
    }
}

/// Applies a task's operations in order and delivers the result.
///
/// One executor is shared by every transcode worker; all interim files go
/// to the shared workspace under names unique to the task.
pub struct PipelineExecutor<'a> {
    tools: &'a ToolRegistry,
    workspace: &'a Workspace,
    settings: EncodeSettings,
    progress_callback: Option<ProgressCallback>,
}

impl<'a> PipelineExecutor<'a> {
    pub fn new(tools: &'a ToolRegistry, workspace: &'a Workspace, settings: EncodeSettings) -> Self {
        Self {
            tools,
            workspace,
            settings,
            progress_callback: None,
        }
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn report_progress(&self, task: &StickerTask, progress: f32, step: &str) {
        if let Some(ref cb) = self.progress_callback {
            cb(progress, step);
        }
        tracing::debug!(sticker_id = %task.id(), "[{:.0}%] {}", progress, step);
    }

    /// Run every operation of `task` and copy the final file to its output.
    ///
    /// Nothing is written to the output path unless all operations succeed.
    pub fn execute(&self, task: &StickerTask) -> Result<PathBuf> {
        if !task.input().exists() {
            anyhow::bail!("Input file does not exist: {:?}", task.input());
        }

        let kind = sniff_file(task.input())
            .with_context(|| format!("Failed to read input: {:?}", task.input()))?;
        let mut chain = Chain {
            input: MediaInput::file(task.input(), kind),
            deferred: Vec::new(),
        };
        let mut result = None;

        let total = task.operations().len();
        for (i, op) in task.operations().iter().enumerate() {
            let progress = (i as f32 / total as f32) * 100.0;
            let step_name = action_name(*op);
            self.report_progress(task, progress, &format!("Starting: {}", step_name));

            let ctx = StepContext {
                tools: self.tools,
                workspace: self.workspace,
                sticker_id: task.id().as_str(),
                step: i,
            };
            result = self
                .execute_action(&ctx, task, *op, &mut chain)
                .with_context(|| format!("Failed to execute action: {}", step_name))?;
        }

        let final_file = match result {
            Some(path) => path,
            None if chain.deferred.is_empty() => chain.input.path().to_path_buf(),
            None => anyhow::bail!(
                "{} needs a conversion to apply {}",
                kind,
                chain.deferred.join(", ")
            ),
        };

        self.report_progress(task, 100.0, "Finalizing");
        let delivered = deliver(&final_file, task.output())
            .with_context(|| format!("Failed to deliver {:?}", task.output()))?;
        tracing::info!(sticker_id = %task.id(), output = %delivered.display(), "sticker done");
        Ok(delivered)
    }

    /// Run one operation; conversions return the final file.
    fn execute_action(
        &self,
        ctx: &StepContext<'_>,
        task: &StickerTask,
        op: Operation,
        chain: &mut Chain,
    ) -> Result<Option<PathBuf>> {
        match op {
            Operation::Scale => {
                if task.scale() == 0 {
                    anyhow::bail!("Scale requested without a target size");
                }
                if chain.defers() {
                    chain.deferred.push(scale_filter(task.scale()));
                } else {
                    chain.input = scale(ctx, &chain.input, task.scale())?;
                }
                Ok(None)
            }
            Operation::Overlay => {
                let image = task
                    .overlay()
                    .ok_or_else(|| anyhow::anyhow!("No overlay image for sticker {}", task.id()))?;
                chain.input = overlay(ctx, &chain.input, image)?;
                Ok(None)
            }
            Operation::RemoveAlpha => {
                if chain.defers() {
                    chain.deferred.push(FLATTEN_FILTER.to_string());
                } else {
                    chain.input = remove_alpha(ctx, &chain.input)?;
                }
                Ok(None)
            }
            Operation::ToGif | Operation::ToWebm | Operation::ToMp4 => {
                let source = self.conversion_source(ctx, &chain.input)?;
                let path = match op {
                    Operation::ToGif => to_gif(
                        ctx,
                        &source,
                        &chain.deferred,
                        self.settings.gif_alpha_threshold,
                    )?,
                    Operation::ToWebm => to_webm(ctx, &source, &chain.deferred, &self.settings)?.path,
                    _ => to_mp4(ctx, &source, &chain.deferred, task.audio())?,
                };
                Ok(Some(path))
            }
        }
    }

    /// Input for a conversion: animated WebP is split into complete frames.
    fn conversion_source(&self, ctx: &StepContext<'_>, input: &MediaInput) -> Result<MediaInput> {
        match input {
            MediaInput::File {
                path,
                kind: SourceKind::AnimatedWebp,
            } => Ok(MediaInput::Frames(extract_frames(ctx, path)?)),
            other => Ok(other.clone()),
        }
    }
}

fn action_name(op: Operation) -> &'static str {
    match op {
        Operation::Scale => "Scale",
        Operation::Overlay => "Overlay",
        Operation::RemoveAlpha => "Remove Alpha",
        Operation::ToGif => "Convert to GIF",
        Operation::ToWebm => "Convert to WebM",
        Operation::ToMp4 => "Convert to MP4",
    }
}
