use super::{filter_chain, MediaInput, StepContext};
use crate::Result;
use std::path::PathBuf;

/// Filter graph building one shared palette with a transparent slot.
pub fn gif_filter_graph(pre_filters: &[String], alpha_threshold: u8) -> String {
    let head = filter_chain(pre_filters.iter().map(String::as_str).chain(["split[a][b]"]))
        .unwrap_or_default();
    format!(
        "{head};[a]palettegen=reserve_transparent=1[p];[b][p]paletteuse=alpha_threshold={alpha_threshold}"
    )
}

/// Convert to a palette GIF whose frames are all complete.
///
/// ffmpeg's GIF muxer writes delta frames; the result is re-written with
/// `-coalesce` because some consumers cannot decode minimal-delta GIFs.
pub fn to_gif(
    ctx: &StepContext<'_>,
    input: &MediaInput,
    pre_filters: &[String],
    alpha_threshold: u8,
) -> Result<PathBuf> {
    let paletted = ctx.output("togif-palette", "gif");
    let output = ctx.output("togif", "gif");

    let mut cmd = ctx.tools.ffmpeg()?;
    input.push_ffmpeg_input(&mut cmd);
    cmd.arg("-filter_complex")
        .arg(gif_filter_graph(pre_filters, alpha_threshold))
        .args(["-f", "gif", "-loop", "0"])
        .arg(&paletted)
        .execute()?;

    ctx.tools
        .magick()?
        .arg(&paletted)
        .arg("-coalesce")
        .arg(&output)
        .execute()?;

    Ok(output)
}
