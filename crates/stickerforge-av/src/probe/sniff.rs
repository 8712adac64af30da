//! Source kind detection from file signatures.
//!
//! Store assets carry a `.png` extension whether they are static or APNG,
//! and decrypted Kakao assets may be WebP or GIF, so routing is decided by
//! content rather than by name.

use crate::Result;
use std::fmt;
use std::path::Path;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
const VP8X_ANIMATION_FLAG: u8 = 0x02;

/// What kind of raster a source file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    StaticPng,
    /// PNG with an `acTL` chunk.
    AnimatedPng,
    StaticWebp,
    /// WebP with the VP8X animation flag; ffmpeg cannot decode these.
    AnimatedWebp,
    Gif,
    Unknown,
}

impl SourceKind {
    /// Whether the source may hold more than one frame.
    pub fn is_animated(&self) -> bool {
        matches!(self, Self::AnimatedPng | Self::AnimatedWebp | Self::Gif)
    }

    /// Extension matching the container.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::StaticPng | Self::AnimatedPng | Self::Unknown => "png",
            Self::StaticWebp | Self::AnimatedWebp => "webp",
            Self::Gif => "gif",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::StaticPng => "png",
            Self::AnimatedPng => "apng",
            Self::StaticWebp => "webp",
            Self::AnimatedWebp => "animated webp",
            Self::Gif => "gif",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Detect the kind of the file at `path`.
pub fn sniff_file(path: &Path) -> Result<SourceKind> {
    let data = std::fs::read(path)?;
    Ok(sniff_bytes(&data))
}

/// Detect the kind of an in-memory file.
pub fn sniff_bytes(data: &[u8]) -> SourceKind {
    if data.starts_with(PNG_SIGNATURE) {
        return if png_has_actl(&data[PNG_SIGNATURE.len()..]) {
            SourceKind::AnimatedPng
        } else {
            SourceKind::StaticPng
        };
    }

    if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        let animated = data.len() >= 21
            && &data[12..16] == b"VP8X"
            && data[20] & VP8X_ANIMATION_FLAG != 0;
        return if animated {
            SourceKind::AnimatedWebp
        } else {
            SourceKind::StaticWebp
        };
    }

    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return SourceKind::Gif;
    }

    SourceKind::Unknown
}

/// Walk PNG chunks until image data; animation control must precede it.
fn png_has_actl(mut chunks: &[u8]) -> bool {
    while chunks.len() >= 8 {
        let len = u32::from_be_bytes([chunks[0], chunks[1], chunks[2], chunks[3]]) as usize;
        let kind = &chunks[4..8];
        if kind == b"acTL" {
            return true;
        }
        if kind == b"IDAT" || kind == b"IEND" {
            return false;
        }
        // length + type + data + crc
        let next = 12usize.saturating_add(len);
        if next > chunks.len() {
            return false;
        }
        chunks = &chunks[next..];
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(kind: &[u8; 4], data: &[u8]) -> Vec<u8> {
        let mut out = (data.len() as u32).to_be_bytes().to_vec();
        out.extend_from_slice(kind);
        out.extend_from_slice(data);
        out.extend_from_slice(&[0, 0, 0, 0]);
        out
    }

    fn png(chunks: &[Vec<u8>]) -> Vec<u8> {
        let mut out = PNG_SIGNATURE.to_vec();
        for c in chunks {
            out.extend_from_slice(c);
        }
        out
    }

    #[test]
    fn test_png_kinds() {
        let ihdr = chunk(b"IHDR", &[0; 13]);
        let idat = chunk(b"IDAT", &[1, 2, 3]);
        let actl = chunk(b"acTL", &[0, 0, 0, 4, 0, 0, 0, 0]);

        assert_eq!(sniff_bytes(&png(&[ihdr.clone(), idat.clone()])), SourceKind::StaticPng);
        assert_eq!(
            sniff_bytes(&png(&[ihdr.clone(), actl.clone(), idat.clone()])),
            SourceKind::AnimatedPng
        );
        // acTL after IDAT is not a valid APNG
        assert_eq!(sniff_bytes(&png(&[ihdr, idat, actl])), SourceKind::StaticPng);
    }

    #[test]
    fn test_webp_kinds() {
        let mut animated = b"RIFF\0\0\0\0WEBPVP8X".to_vec();
        animated.extend_from_slice(&[10, 0, 0, 0, VP8X_ANIMATION_FLAG | 0x10]);
        assert_eq!(sniff_bytes(&animated), SourceKind::AnimatedWebp);

        let simple = b"RIFF\0\0\0\0WEBPVP8 \0\0\0\0".to_vec();
        assert_eq!(sniff_bytes(&simple), SourceKind::StaticWebp);
    }

    #[test]
    fn test_gif_and_unknown() {
        assert_eq!(sniff_bytes(b"GIF89a\x01\x00"), SourceKind::Gif);
        assert_eq!(sniff_bytes(b"not an image"), SourceKind::Unknown);
        assert_eq!(sniff_bytes(&[]), SourceKind::Unknown);
    }

    #[test]
    fn test_real_png_from_image_crate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("still.png");
        image::RgbaImage::new(3, 2).save(&path).unwrap();
        assert_eq!(sniff_file(&path).unwrap(), SourceKind::StaticPng);
        assert!(!SourceKind::StaticPng.is_animated());
    }
}
