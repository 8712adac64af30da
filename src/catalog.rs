//! Store layout: asset URLs, raw directory structure and operation planning.
//!
//! Sticker packs are fetched into a raw directory of the form
//!
//! ```text
//! raw/
//!   static/{id}.png | animation/{id}.png | popup/{id}.png | emoji/{id}.png
//!   sound/{id}.m4a
//!   overlay/{id}.png
//!   icon.png
//! ```
//!
//! and converted from there into `{id}.{format}` files. Animated packs
//! converted to WebM also get an `icon.webm` made from the pack's main image.

use crate::download::DownloadJob;
use crate::pipeline::StickerTask;
use anyhow::{Context, Result};
use stickerforge_common::{
    Capabilities, Operation, OutputFormat, PackId, StickerId, StickerType,
};
use std::path::{Path, PathBuf};

/// The store only serves assets to browser-like clients.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/63.0.3239.132 Safari/537.36";

const STICKER_CDN: &str = "https://stickershop.line-scdn.net/stickershop/v1/sticker";
const STICON_CDN: &str = "https://stickershop.line-scdn.net/sticonshop/v1/sticon";
const PRODUCT_CDN: &str = "https://stickershop.line-scdn.net/stickershop/v1/product";

/// Task id of the pack icon.
pub const ICON_ID: &str = "icon";

/// Longer side used when scaling still stickers on request.
pub const STATIC_SCALE: u32 = 512;
/// Longer side of WebM stickers.
pub const WEBM_SCALE: u32 = 512;
/// Longer side of WebM emoji.
pub const WEBM_EMOJI_SCALE: u32 = 100;

/// URL of the image asset for one sticker.
pub fn image_url(kind: StickerType, pack: &PackId, id: &StickerId) -> String {
    match kind {
        StickerType::Static
        | StickerType::NameText
        | StickerType::PerStickerText
        | StickerType::Message => format!("{STICKER_CDN}/{id}/iPhone/sticker@2x.png"),
        StickerType::StaticWithSound => format!("{STICKER_CDN}/{id}/android/sticker@2x.png"),
        StickerType::Animated | StickerType::AnimatedWithSound => {
            format!("{STICKER_CDN}/{id}/IOS/sticker_animation@2x.png")
        }
        StickerType::Popup | StickerType::PopupWithSound => {
            format!("{STICKER_CDN}/{id}/IOS/sticker_popup.png")
        }
        StickerType::Emoji => format!("{STICON_CDN}/{pack}/iPhone/{id}.png"),
        StickerType::AnimatedEmoji => format!("{STICON_CDN}/{pack}/iPhone/{id}_animation.png"),
    }
}

/// URL of the sound clip for one sticker.
pub fn sound_url(id: &StickerId) -> String {
    format!("{STICKER_CDN}/{id}/IOS/sticker_sound.m4a")
}

/// URL of the pack's main image, for animated sticker packs.
///
/// Popup packs use the popup main image. Still packs and emoji have no icon.
pub fn icon_url(kind: StickerType, pack: &PackId) -> Option<String> {
    let caps = kind.capabilities();
    if !caps.has_animation || caps.is_emoji {
        return None;
    }
    let name = if caps.has_popup {
        "main_popup.png"
    } else {
        "main_animation.png"
    };
    Some(format!("{PRODUCT_CDN}/{pack}/IOS/{name}"))
}

/// Raw subdirectory holding the images of a sticker type.
///
/// Emoji win over popups, popups over plain animation.
pub fn raw_subfolder(caps: Capabilities) -> &'static str {
    if caps.is_emoji {
        "emoji"
    } else if caps.has_popup {
        "popup"
    } else if caps.has_animation {
        "animation"
    } else {
        "static"
    }
}

/// Target size of the longer side, or 0 for no scaling.
pub fn default_scale(caps: Capabilities, format: OutputFormat, scale_requested: bool) -> u32 {
    if scale_requested && !caps.has_animation {
        STATIC_SCALE
    } else if format == OutputFormat::Webm {
        if caps.is_emoji {
            WEBM_EMOJI_SCALE
        } else {
            WEBM_SCALE
        }
    } else {
        0
    }
}

/// Operations for one sticker: overlay, scale, alpha removal, conversion.
///
/// Packs without animation only convert to PNG; MP4 is additionally allowed
/// when there is sound to give the still image a length.
pub fn plan_operations(
    caps: Capabilities,
    format: OutputFormat,
    scale: u32,
    overlay: bool,
) -> stickerforge_common::Result<Vec<Operation>> {
    let still_video = format == OutputFormat::Mp4 && caps.has_sound;
    if !caps.has_animation && format != OutputFormat::Png && !still_video {
        return Err(stickerforge_common::Error::invalid_input(format!(
            "sticker pack has no animation, {format} output is not supported"
        )));
    }

    let mut ops = Vec::new();
    if overlay && caps.has_text_overlay {
        ops.push(Operation::Overlay);
    }
    if scale > 0 {
        ops.push(Operation::Scale);
    }
    if format == OutputFormat::Mp4 {
        ops.push(Operation::RemoveAlpha);
    }
    ops.extend(format.conversion());
    Ok(ops)
}

/// On-disk layout of a fetched pack.
#[derive(Debug, Clone)]
pub struct RawLayout {
    root: PathBuf,
}

impl RawLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn image(&self, caps: Capabilities, id: &StickerId) -> PathBuf {
        self.root.join(raw_subfolder(caps)).join(format!("{id}.png"))
    }

    pub fn sound(&self, id: &StickerId) -> PathBuf {
        self.root.join("sound").join(format!("{id}.m4a"))
    }

    pub fn overlay(&self, id: &StickerId) -> PathBuf {
        self.root.join("overlay").join(format!("{id}.png"))
    }

    pub fn icon(&self) -> PathBuf {
        self.root.join("icon.png")
    }

    /// Sticker ids with an image in the subfolder for `caps`, sorted.
    pub fn sticker_ids(&self, caps: Capabilities) -> Result<Vec<StickerId>> {
        let dir = self.root.join(raw_subfolder(caps));
        let entries = std::fs::read_dir(&dir)
            .with_context(|| format!("Failed to read raw directory: {:?}", dir))?;

        let mut ids = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("png") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(StickerId::from(stem));
            }
        }
        ids.sort();
        Ok(ids)
    }
}

/// Download jobs for the image and, where the type has one, the sound of
/// every sticker, followed by the pack icon for animated packs.
pub fn fetch_jobs(
    kind: StickerType,
    pack: &PackId,
    ids: &[StickerId],
    layout: &RawLayout,
) -> Vec<DownloadJob> {
    let caps = kind.capabilities();
    let mut jobs = Vec::with_capacity(ids.len() * 2);
    for id in ids {
        jobs.push(DownloadJob::new(
            format!("{id}|image"),
            image_url(kind, pack, id),
            layout.image(caps, id),
        ));
        if caps.has_sound {
            jobs.push(DownloadJob::new(
                format!("{id}|sound"),
                sound_url(id),
                layout.sound(id),
            ));
        }
    }
    if let Some(url) = icon_url(kind, pack) {
        jobs.push(DownloadJob::new(
            format!("{ICON_ID}|image"),
            url,
            layout.icon(),
        ));
    }
    jobs
}

/// Options for turning a raw pack into transcode tasks.
#[derive(Debug, Clone)]
pub struct ConvertPlan {
    pub kind: StickerType,
    pub format: OutputFormat,
    pub scale_requested: bool,
    pub overlay: bool,
    pub output_dir: PathBuf,
}

/// One task per sticker found in the raw layout.
pub fn plan_tasks(layout: &RawLayout, plan: &ConvertPlan) -> Result<Vec<StickerTask>> {
    let caps = plan.kind.capabilities();
    let scale = default_scale(caps, plan.format, plan.scale_requested);
    let operations = plan_operations(caps, plan.format, scale, plan.overlay)?;

    let ids = layout.sticker_ids(caps)?;
    if ids.is_empty() {
        anyhow::bail!(
            "No stickers found in {:?}",
            layout.root().join(raw_subfolder(caps))
        );
    }

    let mut tasks = Vec::with_capacity(ids.len());
    for id in ids {
        let output = plan.output_dir.join(plan.format.file_name(&id));
        let mut task = StickerTask::new(
            id.clone(),
            layout.image(caps, &id),
            operations.clone(),
            output,
        )?
        .with_scale(scale);

        if caps.has_sound {
            task = task.with_audio(layout.sound(&id));
        }
        if operations.contains(&Operation::Overlay) {
            task = task.with_overlay(layout.overlay(&id));
        }
        tasks.push(task);
    }

    if let Some(icon) = plan_icon(layout, plan)? {
        tasks.push(icon);
    }
    Ok(tasks)
}

/// The `icon.webm` task for animated packs converted to WebM.
///
/// Returns `None` for other packs and formats, or when the icon was not
/// fetched.
pub fn plan_icon(layout: &RawLayout, plan: &ConvertPlan) -> Result<Option<StickerTask>> {
    let caps = plan.kind.capabilities();
    if plan.format != OutputFormat::Webm || !caps.has_animation || caps.is_emoji {
        return Ok(None);
    }

    let input = layout.icon();
    if !input.is_file() {
        tracing::warn!("Pack icon not found at {:?}, skipping icon.webm", input);
        return Ok(None);
    }

    let id = StickerId::from(ICON_ID);
    let output = plan.output_dir.join(OutputFormat::Webm.file_name(&id));
    let task = StickerTask::new(id, input, vec![Operation::Scale, Operation::ToWebm], output)?
    .with_scale(WEBM_SCALE);
    Ok(Some(task))
}
