//! FFprobe-based media probing.

use crate::{Error, Result, ToolRegistry};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    nb_read_frames: Option<String>,
    #[serde(default)]
    tags: FfprobeTags,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeTags {
    #[serde(rename = "DURATION")]
    duration: Option<String>,
}

/// What ffprobe reports about a file.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaProbe {
    /// Playback duration in seconds, if known.
    pub duration: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub size: Option<u64>,
}

fn run_ffprobe(tools: &ToolRegistry, path: &Path, extra: &[&str]) -> Result<String> {
    if !path.exists() {
        return Err(Error::file_not_found(path));
    }
    let output = tools
        .ffprobe()?
        .args(["-v", "error", "-print_format", "json"])
        .args(extra)
        .arg(path)
        .execute()?;
    Ok(output.stdout)
}

/// Probe duration, dimensions and size of a media file.
pub fn probe_media(tools: &ToolRegistry, path: &Path) -> Result<MediaProbe> {
    let json = run_ffprobe(tools, path, &["-show_format", "-show_streams"])?;
    parse_media(&json)
}

/// Probe the playback duration of a media file, in seconds.
pub fn probe_duration(tools: &ToolRegistry, path: &Path) -> Result<f64> {
    probe_media(tools, path)?
        .duration
        .ok_or_else(|| Error::parse_error("ffprobe", format!("no duration reported for {:?}", path)))
}

/// Decode the first video stream and count its frames.
pub fn count_frames(tools: &ToolRegistry, path: &Path) -> Result<u64> {
    let json = run_ffprobe(
        tools,
        path,
        &[
            "-count_frames",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=nb_read_frames",
        ],
    )?;
    let output: FfprobeOutput = serde_json::from_str(&json)?;
    output
        .streams
        .first()
        .and_then(|s| s.nb_read_frames.as_deref())
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| Error::parse_error("ffprobe", "no frame count reported"))
}

/// Parse `-show_format -show_streams` JSON.
///
/// Duration comes from the container, falling back to the first stream's
/// `DURATION` tag (`HH:MM:SS.fffffffff`) which Matroska/WebM writers use.
pub fn parse_media(json: &str) -> Result<MediaProbe> {
    let output: FfprobeOutput = serde_json::from_str(json)?;

    let format_duration = output
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(|s| s.parse::<f64>().ok());

    let tag_duration = output
        .streams
        .first()
        .and_then(|s| s.tags.duration.as_deref())
        .and_then(parse_hms);

    let video = output
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"));

    Ok(MediaProbe {
        duration: format_duration.or(tag_duration),
        width: video.and_then(|s| s.width),
        height: video.and_then(|s| s.height),
        size: output
            .format
            .as_ref()
            .and_then(|f| f.size.as_deref())
            .and_then(|s| s.parse().ok()),
    })
}

/// Parse `HH:MM:SS.fraction` into seconds.
pub fn parse_hms(s: &str) -> Option<f64> {
    let mut parts = s.trim().splitn(3, ':');
    let hours: f64 = parts.next()?.parse().ok()?;
    let minutes: f64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format_duration() {
        let json = r#"{
            "format": {"filename": "a.webm", "duration": "2.960000", "size": "40213"},
            "streams": [{"codec_type": "video", "width": 512, "height": 384}]
        }"#;
        let probe = parse_media(json).unwrap();
        assert_eq!(probe.duration, Some(2.96));
        assert_eq!(probe.width, Some(512));
        assert_eq!(probe.height, Some(384));
        assert_eq!(probe.size, Some(40213));
    }

    #[test]
    fn test_parse_falls_back_to_duration_tag() {
        let json = r#"{
            "format": {"filename": "a.webm"},
            "streams": [{"codec_type": "video", "tags": {"DURATION": "00:00:03.033000000"}}]
        }"#;
        let probe = parse_media(json).unwrap();
        let d = probe.duration.unwrap();
        assert!((d - 3.033).abs() < 1e-9);
    }

    #[test]
    fn test_parse_without_duration() {
        let probe = parse_media(r#"{"streams": []}"#).unwrap();
        assert_eq!(probe.duration, None);
        assert_eq!(probe.width, None);
    }

    #[test]
    fn test_parse_hms() {
        assert_eq!(parse_hms("01:02:03.5"), Some(3723.5));
        assert_eq!(parse_hms("garbage"), None);
    }

    #[test]
    fn test_probe_missing_file() {
        let tools = ToolRegistry::with_paths([("ffprobe", "ffprobe")]);
        let err = probe_duration(&tools, Path::new("/nonexistent/42.webm")).unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }
}
