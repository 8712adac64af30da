//! Stickerforge - sticker pack downloader and transcoder
//!
//! This library crate exposes the core functionality for integration testing.

pub mod catalog;
pub mod config;
pub mod download;
pub mod pipeline;
pub mod queue;

pub use pipeline::{PipelineExecutor, StickerTask};
pub use stickerforge_av::{ToolRegistry, Workspace};
