//! Error handling for Aura
//!
//! Every error carries a stable code and recovery suggestions so the page
//! layer can decide whether to swallow it or report it.

use thiserror::Error;

/// Result type alias for Aura operations
pub type Result<T> = std::result::Result<T, AuraError>;

/// Main error type for Aura operations
#[derive(Error, Debug)]
pub enum AuraError {
    // Audio Errors
    #[error("Audio unavailable: {reason}")]
    AudioUnavailable { reason: String },

    #[error("Audio node {node} is already stopped")]
    AlreadyStopped { node: usize },

    #[error("Unknown audio node: {node}")]
    UnknownNode { node: usize },

    #[error("Invalid audio connection: {reason}")]
    InvalidConnection { reason: String },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    // Page Errors
    #[error("Slide index {index} out of range (carousel has {len} slides)")]
    SlideOutOfRange { index: usize, len: usize },

    #[error("Missing page element: {selector}")]
    MissingElement { selector: String },

    // Configuration Errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AuraError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            AuraError::AudioUnavailable { .. } => "AUDIO_UNAVAILABLE",
            AuraError::AlreadyStopped { .. } => "ALREADY_STOPPED",
            AuraError::UnknownNode { .. } => "UNKNOWN_NODE",
            AuraError::InvalidConnection { .. } => "INVALID_CONNECTION",
            AuraError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            AuraError::SlideOutOfRange { .. } => "SLIDE_OUT_OF_RANGE",
            AuraError::MissingElement { .. } => "MISSING_ELEMENT",
            AuraError::InvalidConfig { .. } => "INVALID_CONFIG",
            AuraError::Io(_) => "IO_ERROR",
            AuraError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error is recovered locally and never shown to the user
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AuraError::AudioUnavailable { .. } | AuraError::AlreadyStopped { .. }
        )
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            AuraError::AudioUnavailable { .. } => vec![
                "The page keeps working without the soundscape",
                "Check that an audio output device is connected",
                "Use the offline renderer to produce a WAV file instead",
            ],
            AuraError::SlideOutOfRange { .. } => vec![
                "Indicator indices must match the number of slides",
                "Check that every slide has exactly one indicator dot",
            ],
            AuraError::MissingElement { .. } => vec![
                "Check the page markup for the required id or class",
            ],
            AuraError::InvalidConfig { .. } => vec![
                "Print the defaults with 'aura-cli config' and compare",
                "Volumes must lie in [0, 1] and durations must be positive",
            ],
            AuraError::UnsupportedFormat { .. } => vec![
                "Supported WAV bit depths: 16, 24, 32",
            ],
            _ => vec![],
        }
    }
}
