//! Frame reconstruction for sparse animations.
//!
//! Splitters emit each animated WebP frame as only the rectangle it changes.
//! [`Compositor`] replays those rectangles onto a persistent canvas, honoring
//! blend and dispose modes, and yields one complete raster per frame.

use crate::frames::{AnimationFrame, BlendMode, DisposeMode, Rect};
use crate::{Error, Result};
use image::{imageops, Rgba, RgbaImage};
use std::path::Path;

/// Persistent canvas replaying frames in order.
#[derive(Debug)]
pub struct Compositor {
    canvas: RgbaImage,
    /// Rectangle and dispose mode of the frame drawn last.
    pending_dispose: Option<(Rect, DisposeMode)>,
}

impl Compositor {
    /// Start with a fully transparent `width` x `height` canvas.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: RgbaImage::new(width, height),
            pending_dispose: None,
        }
    }

    /// Current canvas.
    pub fn canvas(&self) -> &RgbaImage {
        &self.canvas
    }

    /// Draw the next frame and return the resulting full canvas.
    ///
    /// The previous frame's dispose is applied first, over the previous
    /// frame's rectangle.
    pub fn push(&mut self, frame: &AnimationFrame, raster: &RgbaImage) -> &RgbaImage {
        let (cw, ch) = self.canvas.dimensions();

        if let Some((rect, DisposeMode::Background)) = self.pending_dispose.take() {
            clear_rect(&mut self.canvas, rect.clip(cw, ch));
        }

        let rect = frame.rect.clip(cw, ch);
        if !rect.is_empty() {
            let source = frame_pixels(raster, frame.rect, rect, (cw, ch));
            draw(&mut self.canvas, &source, rect, frame.blend);
        }

        self.pending_dispose = Some((frame.rect, frame.dispose));
        &self.canvas
    }
}

/// Composite `rasters` (one per frame) into full-canvas frames.
pub fn composite_frames(
    canvas: (u32, u32),
    frames: &[AnimationFrame],
    rasters: Vec<RgbaImage>,
) -> Result<Vec<RgbaImage>> {
    if frames.len() != rasters.len() {
        return Err(Error::InvalidInput(format!(
            "{} frames but {} rasters",
            frames.len(),
            rasters.len()
        )));
    }

    let mut compositor = Compositor::new(canvas.0, canvas.1);
    Ok(frames
        .iter()
        .zip(rasters.iter())
        .map(|(frame, raster)| compositor.push(frame, raster).clone())
        .collect())
}

/// Composite the split frames `frame-{i}.png` in `dir`, overwriting each file
/// with its complete canvas snapshot.
pub fn composite_in_place(dir: &Path, canvas: (u32, u32), frames: &[AnimationFrame]) -> Result<()> {
    let mut compositor = Compositor::new(canvas.0, canvas.1);

    for (i, frame) in frames.iter().enumerate() {
        let path = dir.join(crate::concat::frame_file_name(i));
        let raster = image::open(&path)
            .map_err(|e| Error::InvalidInput(format!("frame {} of {:?}: {}", i, dir, e)))?
            .to_rgba8();
        compositor.push(frame, &raster).save(&path)?;
    }

    tracing::debug!(frames = frames.len(), dir = %dir.display(), "composited frames");
    Ok(())
}

/// The pixels a frame contributes inside `clipped`, its overlap with the
/// canvas.
///
/// Splitters sometimes emit canvas-sized rasters for sub-rectangle frames;
/// those are read at canvas coordinates. Frame-sized rasters are read
/// relative to the frame's own origin, which crops the parts of frames
/// hanging off the canvas.
fn frame_pixels(raster: &RgbaImage, rect: Rect, clipped: Rect, canvas: (u32, u32)) -> RgbaImage {
    let (x, y) = clipped.origin();
    let (sx, sy) = if raster.dimensions() == canvas && (rect.width, rect.height) != canvas {
        (x, y)
    } else {
        (
            (clipped.x - rect.x).unsigned_abs(),
            (clipped.y - rect.y).unsigned_abs(),
        )
    };
    imageops::crop_imm(raster, sx, sy, clipped.width, clipped.height).to_image()
}

fn clear_rect(canvas: &mut RgbaImage, rect: Rect) {
    let (x0, y0) = rect.origin();
    for y in y0..y0 + rect.height {
        for x in x0..x0 + rect.width {
            canvas.put_pixel(x, y, Rgba([0, 0, 0, 0]));
        }
    }
}

fn draw(canvas: &mut RgbaImage, source: &RgbaImage, rect: Rect, blend: BlendMode) {
    let (x0, y0) = rect.origin();
    let width = rect.width.min(source.width());
    let height = rect.height.min(source.height());

    for y in 0..height {
        for x in 0..width {
            let src = source.get_pixel(x, y).0;
            let dst = canvas.get_pixel_mut(x0 + x, y0 + y);
            dst.0 = match blend {
                BlendMode::Replace => src,
                BlendMode::AlphaComposite => over(dst.0, src),
            };
        }
    }
}

/// Straight-alpha source-over.
pub fn over(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    match src[3] {
        0 => return dst,
        255 => return src,
        _ => {}
    }

    let sa = u16::from(src[3]);
    let inv = 255 - sa;
    // destination alpha contribution after the source covers it
    let da = mul_div255(u16::from(dst[3]), inv);
    let out_a = add_sat_u8(src[3], da);
    if out_a == 0 {
        return [0, 0, 0, 0];
    }

    let mut out = [0u8; 4];
    for i in 0..3 {
        let sum = u32::from(src[i]) * u32::from(sa) + u32::from(dst[i]) * u32::from(da);
        out[i] = ((sum + u32::from(out_a) / 2) / u32::from(out_a)).min(255) as u8;
    }
    out[3] = out_a;
    out
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}
