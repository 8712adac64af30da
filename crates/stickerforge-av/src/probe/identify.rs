//! Per-frame metadata via `magick identify`.

use crate::frames::{AnimationFrame, BlendMode, DisposeMode, Rect};
use crate::{Error, Result, ToolRegistry};
use std::path::Path;

/// Format string passed to `magick identify -format`.
///
/// Per frame: delay (centiseconds), canvas width/height, frame width/height,
/// x/y offset, WebP blend token, dispose token; records are `|`-terminated.
pub const IDENTIFY_FORMAT: &str = "%T,%W,%H,%w,%h,%X,%Y,%[webp:mux-blend],%D|";

/// Delay substituted for frames that declare none.
const DEFAULT_FRAME_DELAY: f64 = 0.1;

/// Canvas size and frame list of an animation.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameProbe {
    pub canvas: (u32, u32),
    pub frames: Vec<AnimationFrame>,
}

impl FrameProbe {
    /// Frame durations in seconds, in order.
    pub fn durations(&self) -> Vec<f64> {
        self.frames.iter().map(|f| f.duration).collect()
    }
}

/// Run `magick identify` on an animation and parse its frame records.
pub fn identify_frames(tools: &ToolRegistry, path: &Path) -> Result<FrameProbe> {
    if !path.exists() {
        return Err(Error::file_not_found(path));
    }
    let output = tools
        .magick()?
        .args(["identify", "-format", IDENTIFY_FORMAT])
        .arg(path)
        .execute()?;
    parse_identify(&output.stdout)
}

/// Parse the output produced with [`IDENTIFY_FORMAT`].
pub fn parse_identify(output: &str) -> Result<FrameProbe> {
    let mut frames = Vec::new();
    let mut canvas = None;

    for (index, record) in output
        .split('|')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .enumerate()
    {
        let fields: Vec<&str> = record.split(',').collect();
        if fields.len() != 9 {
            return Err(Error::parse_error(
                "magick",
                format!("frame {index}: expected 9 fields, got {:?}", record),
            ));
        }

        let bad = |i: usize| Error::parse_error("magick", format!("frame {index}: bad field {:?}", fields[i]));
        let num = |i: usize| -> Result<u32> { parse_size(fields[i]).ok_or_else(|| bad(i)) };
        let offset = |i: usize| -> Result<i32> { parse_offset(fields[i]).ok_or_else(|| bad(i)) };

        let delay = num(0)?;
        let canvas_size = (num(1)?, num(2)?);
        canvas.get_or_insert(canvas_size);

        let duration = if delay == 0 {
            tracing::debug!(frame = index, "frame has no delay, using default");
            DEFAULT_FRAME_DELAY
        } else {
            // centiseconds, already at hundredth-of-a-second precision
            f64::from(delay) / 100.0
        };

        frames.push(AnimationFrame {
            index,
            duration,
            rect: Rect::new(offset(5)?, offset(6)?, num(3)?, num(4)?),
            blend: BlendMode::from_token(fields[7]),
            dispose: DisposeMode::from_token(fields[8]),
        });
    }

    let canvas = canvas.ok_or_else(|| Error::parse_error("magick", "no frames reported"))?;
    Ok(FrameProbe { canvas, frames })
}

/// Parse an unsigned field, accepting a leading `+`.
fn parse_size(field: &str) -> Option<u32> {
    field.trim().trim_start_matches('+').parse().ok()
}

/// Parse a page offset, which ImageMagick prints with an explicit sign.
fn parse_offset(field: &str) -> Option<i32> {
    field.trim().trim_start_matches('+').parse().ok()
}
