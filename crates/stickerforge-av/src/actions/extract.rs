use super::{FrameSequence, StepContext};
use crate::compositor::composite_in_place;
use crate::concat::{frame_file_name, write_frame_list};
use crate::frames::needs_compositing;
use crate::probe::identify_frames;
use crate::{Error, Result};
use std::path::Path;

/// Split an animation into complete frames plus a concat descriptor.
///
/// ImageMagick emits WebP frames as stored: bare rectangles, or full-canvas
/// deltas meant to be alpha-blended. Unless every frame already stands on
/// its own, the frames are composited in place before the descriptor is
/// written.
pub fn extract_frames(ctx: &StepContext<'_>, source: &Path) -> Result<FrameSequence> {
    let dir = ctx.workspace.frames_dir(ctx.sticker_id, ctx.step)?;

    ctx.tools
        .magick()?
        .arg(source)
        .arg(dir.join("frame-%d.png"))
        .execute()?;

    let probe = identify_frames(ctx.tools, source)?;

    let expected = probe.frames.len();
    let last = dir.join(frame_file_name(expected - 1));
    if !last.exists() {
        return Err(Error::parse_error(
            "magick",
            format!("expected {expected} split frames in {:?}", dir),
        ));
    }

    if needs_compositing(probe.canvas, &probe.frames) {
        tracing::debug!(sticker_id = ctx.sticker_id, frames = expected, "compositing frames");
        composite_in_place(&dir, probe.canvas, &probe.frames)?;
    }

    let durations = probe.durations();
    let list = write_frame_list(&dir, &durations)?;

    Ok(FrameSequence {
        dir,
        list,
        canvas: probe.canvas,
        durations,
    })
}
