//! Probing of sticker sources and rendered outputs.
//!
//! - [`ffprobe`]: container duration, dimensions and frame counts
//! - [`identify`]: per-frame animation metadata from ImageMagick
//! - [`sniff`]: source kind detection from file signatures

pub mod ffprobe;
pub mod identify;
pub mod sniff;

pub use ffprobe::{count_frames, probe_duration, probe_media, MediaProbe};
pub use identify::{identify_frames, parse_identify, FrameProbe, IDENTIFY_FORMAT};
pub use sniff::{sniff_bytes, sniff_file, SourceKind};
