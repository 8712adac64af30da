use super::{filter_chain, MediaInput, StepContext};
use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// H.264 needs even dimensions.
const EVEN_PAD_FILTER: &str = "pad=ceil(iw/2)*2:ceil(ih/2)*2";

/// Encode H.264 MP4, muxing the sticker's sound when one exists.
///
/// A still image has no length of its own, so it is only encodable when
/// there is audio to give it one.
pub fn to_mp4(
    ctx: &StepContext<'_>,
    input: &MediaInput,
    pre_filters: &[String],
    audio: Option<&Path>,
) -> Result<PathBuf> {
    let audio = audio.filter(|p| p.exists());
    let output = ctx.output("tomp4", "mp4");

    let mut cmd = ctx.tools.ffmpeg()?;
    if input.is_animated() {
        input.push_ffmpeg_input(&mut cmd);
    } else if audio.is_some() {
        cmd.args(["-loop", "1", "-i"]).arg(input.path());
    } else {
        return Err(Error::Unsupported(format!(
            "sticker {} is a still image without sound; nothing to encode as MP4",
            ctx.sticker_id
        )));
    }

    if let Some(sound) = audio {
        cmd.arg("-i").arg(sound);
        cmd.args(["-map", "0:v:0", "-map", "1:a:0", "-c:a", "aac", "-shortest"]);
    }

    let filters = pre_filters
        .iter()
        .map(String::as_str)
        .chain(["format=rgba", EVEN_PAD_FILTER]);
    if let Some(chain) = filter_chain(filters) {
        cmd.arg("-vf").arg(chain);
    }

    cmd.args([
        "-c:v",
        "libx264",
        "-pix_fmt",
        "yuv420p",
        "-movflags",
        "+faststart",
        "-f",
        "mp4",
    ])
    .arg(&output)
    .execute()?;

    tracing::info!(
        sticker_id = ctx.sticker_id,
        with_audio = audio.is_some(),
        "encoded mp4"
    );
    Ok(output)
}
