//! Duration and size capping for animated output.
//!
//! Encoders quantize frame times to their output framerate, so the only
//! reliable duration is the one probed from the rendered file. The capper
//! renders, probes, and uniformly speeds the animation up until it fits.

use crate::Result;
use std::path::{Path, PathBuf};

/// Default hard ceiling on playback time, in seconds.
pub const DEFAULT_MAX_DURATION: f64 = 3.0;
/// Default soft ceiling on encoded size, in bytes.
pub const DEFAULT_MAX_SIZE: u64 = 256 * 1024;
/// Default bound on re-render attempts after the first render.
pub const DEFAULT_MAX_ITERATIONS: u32 = 20;
/// Default factor inflation when a re-render still overshoots.
pub const DEFAULT_GROWTH: f64 = 1.05;

/// Something that can encode a frame sequence with given durations.
pub trait Render {
    /// Encode with `durations` (seconds per frame). `attempt` is 0 for the
    /// natural timing and increases with every re-render; implementations
    /// write each attempt to its own file.
    fn render(&mut self, attempt: u32, durations: &[f64]) -> Result<PathBuf>;

    /// Actual playback duration of a rendered file, in seconds.
    fn probe_duration(&mut self, output: &Path) -> Result<f64>;
}

/// Result of capping one animation.
#[derive(Debug, Clone, PartialEq)]
pub struct CapOutcome {
    /// Accepted rendering.
    pub path: PathBuf,
    /// Probed duration of `path`.
    pub duration: f64,
    /// Speed factor applied (1.0 when the natural timing fit).
    pub factor: f64,
    /// Number of renders performed.
    pub renders: u32,
    /// Whether `duration` is within the ceiling.
    pub within_limit: bool,
    /// Encoded size of `path`.
    pub size: u64,
    /// Whether `size` exceeds the size ceiling.
    pub oversize: bool,
}

/// Iterative duration capper.
#[derive(Debug, Clone)]
pub struct DurationCapper {
    pub max_duration: f64,
    pub max_size: u64,
    pub max_iterations: u32,
    pub growth: f64,
}

impl Default for DurationCapper {
    fn default() -> Self {
        Self {
            max_duration: DEFAULT_MAX_DURATION,
            max_size: DEFAULT_MAX_SIZE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            growth: DEFAULT_GROWTH,
        }
    }
}

impl DurationCapper {
    /// Render `durations`, speeding up until the result fits the ceiling.
    ///
    /// Every re-render uses a strictly larger factor than the last, so frame
    /// times never grow between attempts. If the encoder cannot get under
    /// the ceiling within `max_iterations` re-renders, the shortest rendering
    /// is accepted with a warning.
    pub fn cap<R: Render>(&self, durations: &[f64], renderer: &mut R) -> Result<CapOutcome> {
        let first = renderer.render(0, durations)?;
        let natural = renderer.probe_duration(&first)?;
        tracing::debug!(duration = natural, "probed natural duration");

        if natural <= self.max_duration {
            return self.finish(first, natural, 1.0, 1, true);
        }

        let mut best = (first, natural, 1.0);
        let mut factor = natural / self.max_duration;
        let mut renders = 1;

        for attempt in 1..=self.max_iterations {
            let scaled = scale_durations(durations, factor);
            let path = renderer.render(attempt, &scaled)?;
            let duration = renderer.probe_duration(&path)?;
            renders += 1;
            tracing::debug!(attempt, factor, duration, "re-rendered with speedup");

            if duration < best.1 {
                best = (path, duration, factor);
            }
            if best.1 <= self.max_duration {
                let (path, duration, factor) = best;
                return self.finish(path, duration, factor, renders, true);
            }
            factor *= self.growth;
        }

        let (path, duration, factor) = best;
        tracing::warn!(
            duration,
            ceiling = self.max_duration,
            renders,
            "could not reach duration ceiling, keeping closest rendering"
        );
        self.finish(path, duration, factor, renders, false)
    }

    fn finish(
        &self,
        path: PathBuf,
        duration: f64,
        factor: f64,
        renders: u32,
        within_limit: bool,
    ) -> Result<CapOutcome> {
        let size = std::fs::metadata(&path)?.len();
        let oversize = size > self.max_size;
        if oversize {
            tracing::warn!(
                size,
                ceiling = self.max_size,
                path = %path.display(),
                "encoded size exceeds limit"
            );
        }

        Ok(CapOutcome {
            path,
            duration,
            factor,
            renders,
            within_limit,
            size,
            oversize,
        })
    }
}

/// Divide every duration by `factor`, truncated to whole milliseconds and
/// never below one millisecond.
pub fn scale_durations(durations: &[f64], factor: f64) -> Vec<f64> {
    durations
        .iter()
        .map(|d| ((d / factor * 1000.0).floor() / 1000.0).max(0.001))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use tempfile::TempDir;

    /// Renders by quantizing each frame up to whole output frames.
    struct QuantizingRenderer {
        dir: TempDir,
        fps: f64,
        bytes: usize,
        rendered: Vec<f64>,
    }

    impl QuantizingRenderer {
        fn new(fps: f64) -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
                fps,
                bytes: 16,
                rendered: Vec::new(),
            }
        }
    }

    impl Render for QuantizingRenderer {
        fn render(&mut self, attempt: u32, durations: &[f64]) -> Result<PathBuf> {
            let frames: f64 = durations
                .iter()
                .map(|d| (d * self.fps - 1e-9).ceil().max(1.0))
                .sum();
            let total = frames / self.fps;
            self.rendered.push(total);

            let path = self.dir.path().join(format!("out-{attempt}.webm"));
            std::fs::write(&path, vec![0u8; self.bytes])?;
            std::fs::write(path.with_extension("duration"), total.to_string())?;
            Ok(path)
        }

        fn probe_duration(&mut self, output: &Path) -> Result<f64> {
            let text = std::fs::read_to_string(output.with_extension("duration"))?;
            text.parse()
                .map_err(|_| Error::parse_error("fake", text.clone()))
        }
    }

    #[test]
    fn test_short_animation_is_untouched() {
        let mut renderer = QuantizingRenderer::new(30.0);
        let outcome = DurationCapper::default()
            .cap(&[0.5, 0.5, 0.5], &mut renderer)
            .unwrap();

        assert_eq!(outcome.renders, 1);
        assert_eq!(outcome.factor, 1.0);
        assert!(outcome.within_limit);
        assert!((outcome.duration - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_ten_frames_of_six_seconds_cap_to_three() {
        let mut renderer = QuantizingRenderer::new(30.0);
        let outcome = DurationCapper::default()
            .cap(&[0.6; 10], &mut renderer)
            .unwrap();

        assert!(outcome.within_limit);
        assert!((2.85..=3.15).contains(&outcome.duration), "{}", outcome.duration);
        assert!(outcome.factor >= 2.0);
        assert!(outcome.path.ends_with(format!("out-{}.webm", outcome.renders - 1)));
    }

    #[test]
    fn test_capped_duration_within_ceiling_for_varied_inputs() {
        let cases: Vec<Vec<f64>> = vec![
            vec![0.01; 40],
            vec![4.0],
            vec![0.07, 0.13, 0.33, 1.9, 0.04, 2.2],
            (1..=24).map(|i| f64::from(i) * 0.05).collect(),
            vec![10.0, 0.02, 0.02, 0.02],
        ];

        for durations in cases {
            let mut renderer = QuantizingRenderer::new(30.0);
            let outcome = DurationCapper::default().cap(&durations, &mut renderer).unwrap();
            assert!(
                outcome.duration <= DEFAULT_MAX_DURATION + 0.05,
                "{:?} -> {}",
                durations,
                outcome.duration
            );
        }
    }

    #[test]
    fn test_renders_never_get_longer() {
        let mut renderer = QuantizingRenderer::new(25.0);
        let durations = vec![0.37, 0.41, 0.29, 0.55, 0.61, 0.33, 0.47, 0.52, 0.44];
        DurationCapper::default().cap(&durations, &mut renderer).unwrap();

        for pair in renderer.rendered.windows(2) {
            assert!(pair[1] <= pair[0] + 1e-9, "{:?}", renderer.rendered);
        }
    }

    #[test]
    fn test_unreachable_ceiling_terminates_with_best_effort() {
        // one whole second per frame at 1 fps: ten frames can never fit
        let mut renderer = QuantizingRenderer::new(1.0);
        let capper = DurationCapper {
            max_iterations: 5,
            ..Default::default()
        };
        let outcome = capper.cap(&[2.0; 10], &mut renderer).unwrap();

        assert!(!outcome.within_limit);
        assert_eq!(outcome.renders, 6);
        assert!((outcome.duration - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_oversize_is_flagged_not_fatal() {
        let mut renderer = QuantizingRenderer::new(30.0);
        renderer.bytes = 2048;
        let capper = DurationCapper {
            max_size: 1024,
            ..Default::default()
        };
        let outcome = capper.cap(&[0.1, 0.1], &mut renderer).unwrap();

        assert!(outcome.oversize);
        assert_eq!(outcome.size, 2048);
        assert!(outcome.path.exists());
    }

    #[test]
    fn test_scale_durations_rounds_to_milliseconds() {
        assert_eq!(scale_durations(&[0.6, 0.25], 2.0), vec![0.3, 0.125]);
        assert_eq!(scale_durations(&[0.0001], 3.0), vec![0.001]);
        let scaled = scale_durations(&[0.1], 3.0);
        assert!((scaled[0] - 0.033).abs() < 1e-12);
    }
}
