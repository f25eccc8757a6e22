//! Error taxonomy shared by the generation client, the local store and the
//! controller.
//!
//! Every variant carries enough detail for logging through [`std::fmt::Display`],
//! while [`PalaceError::user_message`] yields the single human-readable line shown
//! to the user.

use thiserror::Error;

/// Errors surfaced by palace operations.
#[derive(Debug, Error)]
pub enum PalaceError {
    /// Missing anchor, empty item list or similar input problems. Raised before any I/O.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The text model returned something that does not match the palace schema.
    #[error("invalid response from generation service: {0}")]
    InvalidResponse(String),

    /// An image request came back without image data.
    #[error("image generation failed: {0}")]
    ImageGenerationFailed(String),

    /// The local store could not be opened or queried. Holds the user-facing message.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Transport failure or non-success HTTP status from the generation service.
    #[error("generation service error (status {status:?}): {message}")]
    Service { status: Option<u16>, message: String },

    /// Missing credential or similar setup problem.
    #[error("configuration error: {0}")]
    Config(String),

    /// A generation or regeneration is already in flight.
    #[error("another operation is already in progress")]
    Busy,

    #[error("palace not found: {0}")]
    NotFound(i64),
}

impl PalaceError {
    /// The message rendered to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(message) | Self::StoreUnavailable(message) | Self::Config(message) => {
                message.clone()
            }
            Self::InvalidResponse(_) => {
                "The AI returned an invalid response. Please try again.".into()
            }
            Self::ImageGenerationFailed(_) => {
                "Failed to generate or edit the image. The model may have returned text instead."
                    .into()
            }
            Self::Service {
                status: Some(status),
                ..
            } => format!("The generation service responded with HTTP {status}. Please try again."),
            Self::Service { status: None, .. } => {
                "The generation service could not be reached. Please try again.".into()
            }
            Self::Busy => "Please wait for the current operation to finish.".into(),
            Self::NotFound(id) => format!("No saved palace with id {id}."),
        }
    }
}

pub type Result<T> = std::result::Result<T, PalaceError>;
