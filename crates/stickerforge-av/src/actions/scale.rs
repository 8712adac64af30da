use super::{push_same_container_output, reencoded_kind, MediaInput, StepContext};
use crate::probe::SourceKind;
use crate::{Error, Result};

/// ffmpeg filter constraining the longer side to `size`, keeping aspect.
pub fn scale_filter(size: u32) -> String {
    format!("scale=w='if(gt(iw,ih),{size},-2)':h='if(gt(iw,ih),-2,{size})':flags=lanczos")
}

/// Resize so the longer side is `size` pixels.
pub fn scale(ctx: &StepContext<'_>, input: &MediaInput, size: u32) -> Result<MediaInput> {
    let kind = match input {
        MediaInput::File {
            kind: SourceKind::AnimatedWebp,
            ..
        }
        | MediaInput::Frames(_) => {
            return Err(Error::Unsupported(
                "animated WebP is scaled during frame-based encoding".to_string(),
            ))
        }
        MediaInput::File { kind, .. } => *kind,
    };
    if size == 0 {
        return Err(Error::InvalidInput("scale target must be positive".to_string()));
    }

    let out_kind = reencoded_kind(kind);
    let output = ctx.output("scale", out_kind.extension());

    let mut cmd = ctx.tools.ffmpeg()?;
    input.push_ffmpeg_input(&mut cmd);
    cmd.arg("-vf").arg(scale_filter(size));
    push_same_container_output(&mut cmd, out_kind);
    cmd.arg(&output).execute()?;

    tracing::debug!(sticker_id = ctx.sticker_id, size, kind = %kind, "scaled");
    Ok(MediaInput::file(output, out_kind))
}
