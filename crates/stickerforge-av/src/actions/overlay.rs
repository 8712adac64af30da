use super::{push_same_container_output, reencoded_kind, MediaInput, StepContext};
use crate::probe::SourceKind;
use crate::{Error, Result};
use std::path::Path;

const OVERLAY_GRAPH: &str = "[0:v][1:v]overlay=x=(W-w)/2:y=(H-h)/2:format=auto";

/// Composite `overlay_image` centered over the input.
pub fn overlay(ctx: &StepContext<'_>, input: &MediaInput, overlay_image: &Path) -> Result<MediaInput> {
    if !overlay_image.is_file() {
        return Err(Error::file_not_found(overlay_image));
    }

    let kind = match input {
        MediaInput::File {
            kind: SourceKind::AnimatedWebp,
            ..
        }
        | MediaInput::Frames(_) => {
            return Err(Error::Unsupported(
                "overlay on animated WebP".to_string(),
            ))
        }
        MediaInput::File { kind, .. } => *kind,
    };

    let out_kind = reencoded_kind(kind);
    let output = ctx.output("overlay", out_kind.extension());

    let mut cmd = ctx.tools.ffmpeg()?;
    input.push_ffmpeg_input(&mut cmd);
    cmd.arg("-i")
        .arg(overlay_image)
        .args(["-filter_complex", OVERLAY_GRAPH]);
    push_same_container_output(&mut cmd, out_kind);
    cmd.arg(&output).execute()?;

    Ok(MediaInput::file(output, out_kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ToolRegistry, Workspace};

    #[test]
    fn test_missing_overlay_fails_before_encoding() {
        let tools = ToolRegistry::default();
        let workspace = Workspace::new().unwrap();
        let ctx = StepContext {
            tools: &tools,
            workspace: &workspace,
            sticker_id: "9",
            step: 0,
        };
        let input = MediaInput::file("/nonexistent/9.png", SourceKind::StaticPng);

        let err = overlay(&ctx, &input, Path::new("/nonexistent/overlay/9.png")).unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }
}
