use super::{push_same_container_output, reencoded_kind, MediaInput, StepContext};
use crate::probe::SourceKind;
use crate::{Error, Result};

/// Per-pixel blend onto white: `c * a / 255 + (255 - a)`.
pub const FLATTEN_FILTER: &str = "format=rgba,\
geq=r='r(X,Y)*alpha(X,Y)/255+255-alpha(X,Y)'\
:g='g(X,Y)*alpha(X,Y)/255+255-alpha(X,Y)'\
:b='b(X,Y)*alpha(X,Y)/255+255-alpha(X,Y)'\
:a=255";

/// Flatten transparency onto a white background.
///
/// Animated sources go through the alpha-weighted ffmpeg blend frame by
/// frame; still images are flattened directly by ImageMagick.
pub fn remove_alpha(ctx: &StepContext<'_>, input: &MediaInput) -> Result<MediaInput> {
    let (path, kind) = match input {
        MediaInput::File {
            kind: SourceKind::AnimatedWebp,
            ..
        }
        | MediaInput::Frames(_) => {
            return Err(Error::Unsupported(
                "animated WebP is flattened during frame-based encoding".to_string(),
            ))
        }
        MediaInput::File { path, kind } => (path, *kind),
    };

    let out_kind = reencoded_kind(kind);
    let output = ctx.output("removealpha", out_kind.extension());

    if kind.is_animated() {
        let mut cmd = ctx.tools.ffmpeg()?;
        input.push_ffmpeg_input(&mut cmd);
        cmd.args(["-vf", FLATTEN_FILTER]);
        push_same_container_output(&mut cmd, out_kind);
        cmd.arg(&output).execute()?;
    } else {
        ctx.tools
            .magick()?
            .arg(path)
            .args(["-background", "white", "-alpha", "remove", "-alpha", "off"])
            .arg(&output)
            .execute()?;
    }

    Ok(MediaInput::file(output, out_kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_filter_is_one_chain() {
        assert!(FLATTEN_FILTER.starts_with("format=rgba,geq=r="));
        assert!(FLATTEN_FILTER.ends_with(":a=255"));
        assert!(!FLATTEN_FILTER.contains(' '));
    }
}
