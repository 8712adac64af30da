//! Per-frame animation metadata.
//!
//! Frames are described the way an animated WebP stores them: a sub-rectangle
//! of the canvas plus a blend mode (how the frame meets the canvas) and a
//! dispose mode (what happens to its rectangle before the next frame).

use serde::{Deserialize, Serialize};

/// Canvas-relative rectangle of a frame.
///
/// Offsets are signed: a frame may start left of or above the canvas, in
/// which case only its overlap with the canvas is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Full-canvas rectangle.
    pub fn canvas(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Top-left corner as canvas coordinates; negative offsets read as 0.
    pub fn origin(&self) -> (u32, u32) {
        (self.x.max(0).unsigned_abs(), self.y.max(0).unsigned_abs())
    }

    /// Whether this rectangle covers a `width` x `height` canvas entirely.
    pub fn covers(&self, width: u32, height: u32) -> bool {
        let (x, y) = (i64::from(self.x), i64::from(self.y));
        x <= 0
            && y <= 0
            && x + i64::from(self.width) >= i64::from(width)
            && y + i64::from(self.height) >= i64::from(height)
    }

    /// Intersection with a `width` x `height` canvas.
    pub fn clip(&self, width: u32, height: u32) -> Rect {
        let (x, y) = (i64::from(self.x), i64::from(self.y));
        let x0 = x.clamp(0, i64::from(width));
        let y0 = y.clamp(0, i64::from(height));
        let x1 = (x + i64::from(self.width)).clamp(x0, i64::from(width));
        let y1 = (y + i64::from(self.height)).clamp(y0, i64::from(height));
        // all four bounds lie within the u32 canvas
        Rect {
            x: x0 as i32,
            y: y0 as i32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        }
    }
}

/// How a frame's pixels meet the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    /// Overwrite the frame rectangle outright.
    Replace,
    /// Straight-alpha "over" using the frame's own alpha.
    #[default]
    AlphaComposite,
}

impl BlendMode {
    /// Map a `webp:mux-blend` token.
    ///
    /// `AtopPreviousAlphaBlend` replaces the region; every other token,
    /// including unknown ones, composites. Unknown non-empty tokens are
    /// logged.
    pub fn from_token(token: &str) -> Self {
        match token.trim() {
            "AtopPreviousAlphaBlend" => Self::Replace,
            "AtopBackgroundAlphaBlend" | "" => Self::AlphaComposite,
            other => {
                tracing::debug!(token = other, "unknown blend token, using alpha-composite");
                Self::AlphaComposite
            }
        }
    }
}

/// What happens to a frame's rectangle before the next frame is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisposeMode {
    /// Leave the canvas as drawn.
    #[default]
    None,
    /// Clear the rectangle to transparent.
    Background,
}

impl DisposeMode {
    /// Map an ImageMagick dispose token (`%D`).
    pub fn from_token(token: &str) -> Self {
        match token.trim() {
            "Background" => Self::Background,
            "None" | "Undefined" | "" => Self::None,
            other => {
                tracing::debug!(token = other, "unknown dispose token, using none");
                Self::None
            }
        }
    }
}

/// One frame of an animated source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationFrame {
    pub index: usize,
    /// Display time in seconds.
    pub duration: f64,
    pub rect: Rect,
    pub blend: BlendMode,
    pub dispose: DisposeMode,
}

/// Whether `frames` need compositing before they can be encoded one by one.
///
/// Split frames stand on their own only when every frame exactly fills the
/// canvas, nothing is cleared, and every frame after the first replaces the
/// canvas outright. Alpha-blended frames leave "unchanged" pixels
/// transparent and must be drawn over the previous canvas.
pub fn needs_compositing(canvas: (u32, u32), frames: &[AnimationFrame]) -> bool {
    let full = Rect::canvas(canvas.0, canvas.1);
    frames.iter().enumerate().any(|(i, f)| {
        f.rect != full
            || f.dispose == DisposeMode::Background
            || (i > 0 && f.blend == BlendMode::AlphaComposite)
    })
}

/// Sum of frame durations in seconds.
pub fn total_duration(frames: &[AnimationFrame]) -> f64 {
    frames.iter().map(|f| f.duration).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(rect: Rect, dispose: DisposeMode) -> AnimationFrame {
        AnimationFrame {
            index: 0,
            duration: 0.1,
            rect,
            blend: BlendMode::AlphaComposite,
            dispose,
        }
    }

    #[test]
    fn test_blend_tokens() {
        assert_eq!(BlendMode::from_token("AtopPreviousAlphaBlend"), BlendMode::Replace);
        assert_eq!(
            BlendMode::from_token("AtopBackgroundAlphaBlend"),
            BlendMode::AlphaComposite
        );
        assert_eq!(BlendMode::from_token(""), BlendMode::AlphaComposite);
        assert_eq!(BlendMode::from_token("Sideways"), BlendMode::AlphaComposite);
    }

    #[test]
    fn test_dispose_tokens() {
        assert_eq!(DisposeMode::from_token("Background"), DisposeMode::Background);
        assert_eq!(DisposeMode::from_token("Undefined"), DisposeMode::None);
        assert_eq!(DisposeMode::from_token("Previous"), DisposeMode::None);
    }

    #[test]
    fn test_rect_clip() {
        let r = Rect::new(8, 8, 10, 10).clip(12, 12);
        assert_eq!(r, Rect::new(8, 8, 4, 4));

        let outside = Rect::new(20, 0, 5, 5).clip(12, 12);
        assert!(outside.is_empty());
    }

    #[test]
    fn test_rect_clip_negative_offset_crops() {
        let r = Rect::new(-3, 2, 10, 4).clip(12, 12);
        assert_eq!(r, Rect::new(0, 2, 7, 4));
        assert_eq!(r.origin(), (0, 2));

        let gone = Rect::new(-10, 0, 5, 5).clip(12, 12);
        assert!(gone.is_empty());
    }

    #[test]
    fn test_rect_covers_with_negative_offset() {
        assert!(Rect::new(-1, -1, 6, 6).covers(4, 4));
        assert!(!Rect::new(-1, 0, 4, 4).covers(4, 4));
    }

    #[test]
    fn test_compositing_detection() {
        let replace = |rect, dispose| AnimationFrame {
            blend: BlendMode::Replace,
            ..frame(rect, dispose)
        };
        let full = replace(Rect::canvas(4, 4), DisposeMode::None);
        assert!(!needs_compositing((4, 4), &[full.clone(), full.clone()]));

        let partial = replace(Rect::new(1, 1, 2, 2), DisposeMode::None);
        assert!(needs_compositing((4, 4), &[full.clone(), partial]));

        let cleared = replace(Rect::canvas(4, 4), DisposeMode::Background);
        assert!(needs_compositing((4, 4), &[full.clone(), cleared]));

        let oversized = replace(Rect::new(-1, -1, 6, 6), DisposeMode::None);
        assert!(needs_compositing((4, 4), &[full.clone(), oversized]));
    }

    #[test]
    fn test_full_canvas_alpha_blend_needs_compositing() {
        let first = frame(Rect::canvas(2, 2), DisposeMode::None);
        let blended = frame(Rect::canvas(2, 2), DisposeMode::None);

        // a blended first frame lands on a transparent canvas unchanged
        assert!(!needs_compositing((2, 2), std::slice::from_ref(&first)));
        assert!(needs_compositing((2, 2), &[first, blended]));
    }
}
