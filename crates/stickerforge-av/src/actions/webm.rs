use super::{filter_chain, EncodeSettings, MediaInput, StepContext};
use crate::capper::{CapOutcome, Render};
use crate::concat::write_frame_list;
use crate::probe::probe_duration;
use crate::{Error, Result, ToolCommand};
use std::path::{Path, PathBuf};

/// Display time given to a still image encoded as WebM.
const STILL_SECONDS: f64 = 1.0;

/// Renders WebM attempts for the duration capper.
///
/// Frame sequences are re-timed by rewriting their descriptor. Single-file
/// sources are treated as one segment of their natural length and re-timed
/// with `setpts`.
pub struct WebmRenderer<'a> {
    ctx: StepContext<'a>,
    input: &'a MediaInput,
    pre_filters: &'a [String],
    framerate: u32,
    natural: f64,
}

impl<'a> WebmRenderer<'a> {
    /// Build a renderer and the durations its natural timing corresponds to.
    pub fn new(
        ctx: StepContext<'a>,
        input: &'a MediaInput,
        pre_filters: &'a [String],
        framerate: u32,
    ) -> Result<(Self, Vec<f64>)> {
        let durations = match input {
            MediaInput::Frames(seq) => seq.durations.clone(),
            MediaInput::File { path, kind } if kind.is_animated() => {
                vec![probe_duration(ctx.tools, path)?]
            }
            MediaInput::File { .. } => vec![STILL_SECONDS],
        };
        let natural = durations.iter().sum();
        if natural <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "animation for {} has no duration",
                ctx.sticker_id
            )));
        }

        Ok((
            Self {
                ctx,
                input,
                pre_filters,
                framerate,
                natural,
            },
            durations,
        ))
    }

    fn push_input(&self, cmd: &mut ToolCommand, durations: &[f64]) -> Result<Vec<String>> {
        let mut filters: Vec<String> = self.pre_filters.to_vec();
        match self.input {
            MediaInput::Frames(seq) => {
                write_frame_list(&seq.dir, durations)?;
                self.input.push_ffmpeg_input(cmd);
            }
            MediaInput::File { path, kind } if !kind.is_animated() => {
                let target: f64 = durations.iter().sum();
                cmd.args(["-loop", "1", "-t"])
                    .arg(format!("{target:.3}"))
                    .arg("-i")
                    .arg(path);
            }
            MediaInput::File { .. } => {
                let target: f64 = durations.iter().sum();
                self.input.push_ffmpeg_input(cmd);
                filters.push(format!("setpts=PTS*{:.6}", target / self.natural));
            }
        }
        Ok(filters)
    }
}

impl Render for WebmRenderer<'_> {
    fn render(&mut self, attempt: u32, durations: &[f64]) -> Result<PathBuf> {
        let output = self.ctx.output(&format!("towebm-{attempt}"), "webm");

        let mut cmd = self.ctx.tools.ffmpeg()?;
        let filters = self.push_input(&mut cmd, durations)?;
        if let Some(chain) = filter_chain(&filters) {
            cmd.arg("-vf").arg(chain);
        }
        cmd.args([
            "-c:v",
            "libvpx-vp9",
            "-pix_fmt",
            "yuva420p",
            "-b:v",
            "0",
            "-crf",
            "32",
            "-an",
        ])
        .arg("-r")
        .arg(self.framerate.to_string())
        .args(["-fps_mode", "cfr", "-f", "webm"])
        .arg(&output)
        .execute()?;

        Ok(output)
    }

    fn probe_duration(&mut self, output: &Path) -> Result<f64> {
        probe_duration(self.ctx.tools, output)
    }
}

/// Encode VP9 WebM with alpha at a constant framerate, capped in duration.
pub fn to_webm(
    ctx: &StepContext<'_>,
    input: &MediaInput,
    pre_filters: &[String],
    settings: &EncodeSettings,
) -> Result<CapOutcome> {
    let (mut renderer, durations) =
        WebmRenderer::new(*ctx, input, pre_filters, settings.webm_framerate)?;
    let outcome = settings.capper.cap(&durations, &mut renderer)?;

    tracing::info!(
        sticker_id = ctx.sticker_id,
        duration = outcome.duration,
        factor = outcome.factor,
        renders = outcome.renders,
        size = outcome.size,
        "encoded webm"
    );
    Ok(outcome)
}
