//! Stickerforge-Common: Shared types, identifiers, and operations.
//!
//! This crate provides the vocabulary used across stickerforge:
//!
//! - **Identifiers**: [`StickerId`] and [`PackId`] newtypes
//! - **Sticker types**: [`StickerType`] and its [`Capabilities`] tuple
//! - **Operations**: the closed [`Operation`] set and its ordering rules
//! - **Formats**: [`OutputFormat`] and file naming
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use stickerforge_common::{Operation, OutputFormat, StickerId, StickerType};
//!
//! let id = StickerId::from("4412296");
//! assert_eq!(OutputFormat::Webm.file_name(&id), "4412296.webm");
//!
//! let caps = StickerType::AnimatedWithSound.capabilities();
//! assert!(caps.has_animation && caps.has_sound);
//!
//! assert!(Operation::Overlay.rank() < Operation::Scale.rank());
//! ```

pub mod error;
pub mod ids;
pub mod ops;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use ops::{validate_order, Operation};
pub use types::*;
