//! Error types for the pixel board pipeline

use thiserror::Error;

/// Result type alias for board operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading, merging or rendering a board
#[derive(Error, Debug)]
pub enum Error {
    /// The grid artifact is missing, unreadable or corrupt
    #[error("Grid store unavailable: {0}")]
    StoreUnavailable(String),

    /// An update request has fields of the wrong type (or is not an object at all)
    #[error("Malformed update request: {0}")]
    MalformedRequest(String),

    /// An update request targets a cell outside the grid
    #[error("Pixel ({x},{y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        x: i128,
        y: i128,
        width: u32,
        height: u32,
    },

    /// An update request carries a color that is not `#` followed by six hex digits
    #[error("Invalid color format: {0:?}")]
    InvalidColorFormat(String),

    /// Failed to produce or encode the rendered image
    #[error("Rendering failed: {0}")]
    RenderFailure(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Filesystem error while persisting an artifact
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error rejects a single update request rather than the whole run.
    ///
    /// Batch merges skip rejected requests; direct merges abort on them.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Error::MalformedRequest(_) | Error::OutOfBounds { .. } | Error::InvalidColorFormat(_)
        )
    }

    /// Process exit code for the command line front-end.
    pub fn exit_code(&self) -> i32 {
        if self.is_rejection() {
            2
        } else {
            1
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::RenderFailure(err.to_string())
    }
}
