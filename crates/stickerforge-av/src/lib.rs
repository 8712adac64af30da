//! # stickerforge-av
//!
//! Media processing library for sticker transcoding.
//!
//! This crate provides functionality for:
//! - Probing sources and rendered outputs (ffprobe, ImageMagick identify,
//!   file signature sniffing)
//! - Reconstructing complete frames from sparse animated WebP
//! - The per-sticker operations: scale, overlay, alpha removal, and
//!   conversion to GIF, WebM and MP4
//! - Capping animation duration by probing what the encoder actually wrote
//! - De-obfuscating KakaoTalk animated downloads
//!
//! ## Example
//!
//! ```no_run
//! use stickerforge_av::actions::{scale, MediaInput, StepContext};
//! use stickerforge_av::probe::sniff_file;
//! use stickerforge_av::{ToolRegistry, ToolsConfig, Workspace};
//! use std::path::Path;
//!
//! let tools = ToolRegistry::discover(&ToolsConfig::default());
//! tools.require_all()?;
//! let workspace = Workspace::new()?;
//!
//! let source = Path::new("raw/static/4412296.png");
//! let input = MediaInput::file(source, sniff_file(source)?);
//! let ctx = StepContext { tools: &tools, workspace: &workspace, sticker_id: "4412296", step: 0 };
//! let scaled = scale(&ctx, &input, 512)?;
//! println!("scaled into {}", scaled.path().display());
//! # Ok::<(), stickerforge_av::Error>(())
//! ```

mod command;
mod error;

pub mod actions;
pub mod capper;
pub mod compositor;
pub mod concat;
pub mod decrypt;
pub mod frames;
pub mod probe;
pub mod tools;
pub mod workspace;

// Re-exports
pub use capper::{CapOutcome, DurationCapper, Render};
pub use command::{ToolCommand, ToolOutput};
pub use error::{Error, Result};
pub use frames::{AnimationFrame, BlendMode, DisposeMode, Rect};
pub use tools::{ToolInfo, ToolRegistry, ToolsConfig};
pub use workspace::{deliver, Workspace};
