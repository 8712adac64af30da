//! The closed set of per-sticker operations.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single transcoding step. Parameters come from the owning task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Constrain the longer side to the task's scale target.
    Scale,
    /// Composite the task's overlay image centered over the input.
    Overlay,
    /// Flatten transparency onto white.
    RemoveAlpha,
    /// Convert to a palette GIF with full frames.
    ToGif,
    /// Convert to VP9 WebM with alpha, duration capped.
    ToWebm,
    /// Convert to H.264 MP4 with optional audio.
    ToMp4,
}

impl Operation {
    /// Position in the pipeline. Operations must appear in strictly
    /// increasing rank, which also limits a task to one conversion.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Overlay => 0,
            Self::Scale => 1,
            Self::RemoveAlpha => 2,
            Self::ToGif | Self::ToWebm | Self::ToMp4 => 3,
        }
    }

    /// Whether this step changes the container format.
    pub fn is_conversion(&self) -> bool {
        self.rank() == 3
    }

    /// Short name used in interim file names and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scale => "scale",
            Self::Overlay => "overlay",
            Self::RemoveAlpha => "removealpha",
            Self::ToGif => "togif",
            Self::ToWebm => "towebm",
            Self::ToMp4 => "tomp4",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check that `ops` follows overlay, scale, remove-alpha, conversion order.
pub fn validate_order(ops: &[Operation]) -> Result<()> {
    for pair in ops.windows(2) {
        if pair[0].rank() >= pair[1].rank() {
            return Err(Error::OperationOrder(format!(
                "{} cannot follow {}",
                pair[1], pair[0]
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_orders() {
        assert!(validate_order(&[]).is_ok());
        assert!(validate_order(&[Operation::ToWebm]).is_ok());
        assert!(validate_order(&[
            Operation::Overlay,
            Operation::Scale,
            Operation::RemoveAlpha,
            Operation::ToMp4
        ])
        .is_ok());
    }

    #[test]
    fn test_invalid_orders() {
        assert!(validate_order(&[Operation::Scale, Operation::Overlay]).is_err());
        assert!(validate_order(&[Operation::ToGif, Operation::ToWebm]).is_err());
        assert!(validate_order(&[Operation::Scale, Operation::Scale]).is_err());

        let err = validate_order(&[Operation::ToGif, Operation::Scale]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid operation order: scale cannot follow togif"
        );
    }

    #[test]
    fn test_conversion_flags() {
        assert!(Operation::ToMp4.is_conversion());
        assert!(!Operation::RemoveAlpha.is_conversion());
    }
}
