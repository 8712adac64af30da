//! Sticker classification and delivery format types.
//!
//! Enums are serialized with the same lowercase tokens the store uses in
//! pack metadata so that metadata files round-trip unchanged.

use crate::{Error, Operation, StickerId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Classification of a sticker pack as published by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StickerType {
    /// Plain static PNG stickers.
    #[serde(rename = "static")]
    Static,
    /// Animated PNG stickers.
    #[serde(rename = "animated")]
    Animated,
    /// Full-screen popup animations.
    #[serde(rename = "popup")]
    Popup,
    /// Static stickers with a sound clip.
    #[serde(rename = "static&sound")]
    StaticWithSound,
    /// Animated stickers with a sound clip.
    #[serde(rename = "animated&sound")]
    AnimatedWithSound,
    /// Popup animations with a sound clip.
    #[serde(rename = "popup&sound")]
    PopupWithSound,
    /// Custom stickers rendering the buyer's name.
    #[serde(rename = "name_text")]
    NameText,
    /// Stickers with per-sticker editable text.
    #[serde(rename = "per_sticker_text")]
    PerStickerText,
    /// Message stickers with a default text overlay.
    #[serde(rename = "message")]
    Message,
    /// Static emoji.
    #[serde(rename = "emoji")]
    Emoji,
    /// Animated emoji.
    #[serde(rename = "animated_emoji")]
    AnimatedEmoji,
}

/// What a sticker type carries, used to decide which operations apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub has_animation: bool,
    pub has_sound: bool,
    pub has_popup: bool,
    pub has_text_overlay: bool,
    pub is_emoji: bool,
}

impl StickerType {
    /// All known sticker types.
    pub const ALL: [StickerType; 11] = [
        Self::Static,
        Self::Animated,
        Self::Popup,
        Self::StaticWithSound,
        Self::AnimatedWithSound,
        Self::PopupWithSound,
        Self::NameText,
        Self::PerStickerText,
        Self::Message,
        Self::Emoji,
        Self::AnimatedEmoji,
    ];

    /// Metadata token for this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Animated => "animated",
            Self::Popup => "popup",
            Self::StaticWithSound => "static&sound",
            Self::AnimatedWithSound => "animated&sound",
            Self::PopupWithSound => "popup&sound",
            Self::NameText => "name_text",
            Self::PerStickerText => "per_sticker_text",
            Self::Message => "message",
            Self::Emoji => "emoji",
            Self::AnimatedEmoji => "animated_emoji",
        }
    }

    /// Capability tuple for this type.
    pub fn capabilities(&self) -> Capabilities {
        let mut caps = Capabilities::default();
        match self {
            Self::Static | Self::NameText | Self::PerStickerText => {}
            Self::Animated => caps.has_animation = true,
            Self::Popup => {
                caps.has_animation = true;
                caps.has_popup = true;
            }
            Self::StaticWithSound => caps.has_sound = true,
            Self::AnimatedWithSound => {
                caps.has_animation = true;
                caps.has_sound = true;
            }
            Self::PopupWithSound => {
                caps.has_animation = true;
                caps.has_popup = true;
                caps.has_sound = true;
            }
            Self::Message => caps.has_text_overlay = true,
            Self::Emoji => caps.is_emoji = true,
            Self::AnimatedEmoji => {
                caps.has_animation = true;
                caps.is_emoji = true;
            }
        }
        caps
    }
}

impl fmt::Display for StickerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StickerType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| Error::unknown("sticker type", s))
    }
}

/// Delivery format of a processed sticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Source PNG (static or APNG), optionally scaled.
    Png,
    /// Animated GIF.
    Gif,
    /// VP9 WebM with alpha, for video sticker platforms.
    Webm,
    /// H.264 MP4, optionally with audio.
    Mp4,
}

impl OutputFormat {
    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Webm => "webm",
            Self::Mp4 => "mp4",
        }
    }

    /// Output file name for a sticker: `{sticker_id}.{extension}`.
    pub fn file_name(&self, id: &StickerId) -> String {
        format!("{}.{}", id, self.extension())
    }

    /// The conversion operation producing this format, if any.
    pub fn conversion(&self) -> Option<Operation> {
        match self {
            Self::Png => None,
            Self::Gif => Some(Operation::ToGif),
            Self::Webm => Some(Operation::ToWebm),
            Self::Mp4 => Some(Operation::ToMp4),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "png" | "apng" => Ok(Self::Png),
            "gif" => Ok(Self::Gif),
            "webm" => Ok(Self::Webm),
            "mp4" | "video" => Ok(Self::Mp4),
            _ => Err(Error::unknown("output format", s)),
        }
    }
}
