// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the frame processing pipeline

use crate::constants::DISABLED_MESSAGE;
use std::fmt;

/// Result type alias using VelvetError
pub type VelvetResult<T> = Result<T, VelvetError>;

/// Main error type
///
/// Chain and registry errors are recovered by whoever made the call.
/// Stream acquisition errors abort startup and tear the stream down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VelvetError {
    /// The kill switch has been tripped for this session
    Disabled,
    /// A chain already holds more than its maximum number of processors
    Overflow { max: usize },
    /// Removal was requested from an empty chain
    Underflow,
    /// The processor name is already present in the chain
    Duplicate(String),
    /// The processor name is not present in the chain
    NotFound(String),
    /// The capture device handed back something that is not a usable video stream
    UnrecognizedMediaStream(String),
    /// Permission or device failure while acquiring the capture device
    DeviceAcquisition(String),
    /// A pixel buffer does not match its declared dimensions
    InvalidFrame(String),
    /// Configuration errors
    Config(String),
    /// Render target failure
    Render(String),
    /// Filesystem and terminal I/O
    Io(String),
}

impl VelvetError {
    /// True for the kill-switch error, which is a shutdown path rather than a failure
    pub fn is_disabled(&self) -> bool {
        matches!(self, VelvetError::Disabled)
    }

    /// True for the guard violations raised by chain add/remove
    pub fn is_chain_guard(&self) -> bool {
        matches!(
            self,
            VelvetError::Overflow { .. }
                | VelvetError::Underflow
                | VelvetError::Duplicate(_)
                | VelvetError::NotFound(_)
        )
    }
}

impl fmt::Display for VelvetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VelvetError::Disabled => write!(f, "{}", DISABLED_MESSAGE),
            VelvetError::Overflow { max } => write!(
                f,
                "Overflow Exception: Cannot add more than {} processors for now.",
                max
            ),
            VelvetError::Underflow => write!(
                f,
                "Underflow Exception: Cannot remove item from empty array. No processor at the moment."
            ),
            VelvetError::Duplicate(name) => write!(f, "{} processor already exists.", name),
            VelvetError::NotFound(name) => write!(f, "{} processor does not exists yet.", name),
            VelvetError::UnrecognizedMediaStream(msg) => write!(
                f,
                "Unfortunately this is not a recognized media stream ({}). Cannot continue.",
                msg
            ),
            VelvetError::DeviceAcquisition(msg) => {
                write!(f, "Could not acquire capture device: {}", msg)
            }
            VelvetError::InvalidFrame(msg) => write!(f, "Invalid frame: {}", msg),
            VelvetError::Config(msg) => write!(f, "Configuration error: {}", msg),
            VelvetError::Render(msg) => write!(f, "Render error: {}", msg),
            VelvetError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for VelvetError {}

impl From<std::io::Error> for VelvetError {
    fn from(err: std::io::Error) -> Self {
        VelvetError::Io(err.to_string())
    }
}

impl From<image::ImageError> for VelvetError {
    fn from(err: image::ImageError) -> Self {
        VelvetError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for VelvetError {
    fn from(err: serde_json::Error) -> Self {
        VelvetError::Config(err.to_string())
    }
}
