//! Error types for the video subsystem

use crate::foundation::collections::DisplayId;
use crate::window::WindowFlags;
use thiserror::Error;

/// Video subsystem errors
///
/// Precondition violations abort with no state change. `Unsupported` means the
/// active backend lacks the capability and is distinct from a hard failure, so
/// callers may choose to ignore it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VideoError {
    /// The video subsystem has not been initialized or was shut down
    #[error("Video subsystem has not been initialized")]
    NotInitialized,

    /// Window handle does not resolve to a live window
    #[error("Invalid window")]
    InvalidWindow,

    /// Display id does not resolve to an attached display
    #[error("Invalid display: {0}")]
    InvalidDisplay(DisplayId),

    /// No displays are attached
    #[error("Couldn't find any displays")]
    NoDisplays,

    /// Invalid parameter value
    #[error("Parameter '{param}' is invalid: {reason}")]
    InvalidParam {
        /// Parameter name
        param: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// More than one flag of a mutually exclusive group was requested
    #[error("Conflicting window {group} flags specified: {flags:?}")]
    ConflictingFlags {
        /// Name of the exclusivity group
        group: &'static str,
        /// The conflicting flags
        flags: WindowFlags,
    },

    /// Popup and modal windows must have a parent
    #[error("{0} windows must specify a parent window")]
    MissingParent(&'static str),

    /// Operation is not valid for popup windows
    #[error("Operation invalid on popup windows")]
    PopupWindow,

    /// Backend does not implement the requested operation
    #[error("{0} is not supported by the current video backend")]
    Unsupported(&'static str),

    /// Backend reported a failure
    #[error("Backend operation failed: {0}")]
    BackendFailed(String),

    /// Display mode switch was rejected
    #[error("Couldn't switch display {display} to {w}x{h}")]
    ModeSwitchFailed {
        /// Target display
        display: DisplayId,
        /// Requested width
        w: i32,
        /// Requested height
        h: i32,
    },

    /// Fullscreen transition was rejected by the backend
    #[error("Fullscreen transition failed")]
    FullscreenFailed,
}

impl VideoError {
    /// Convenience constructor for parameter errors
    pub fn invalid_param(param: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParam { param, reason: reason.into() }
    }

    /// Whether this error only signals a missing backend capability
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }
}

/// Result type used throughout the crate
pub type VideoResult<T> = Result<T, VideoError>;
