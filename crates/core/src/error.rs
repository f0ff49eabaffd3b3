/// Result alias that carries the custom [`StarflightError`] type.
pub type Result<T> = std::result::Result<T, StarflightError>;

/// Common error type for the core crate.
///
/// None of these are fatal to the frame loop on their own. The compositor
/// treats per-entity failures as "skip this entity for this frame".
#[derive(Debug, thiserror::Error)]
pub enum StarflightError {
    /// Free-form message for failures without a dedicated variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Configuration or recording (de)serialisation failure.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    /// A configuration value is outside the range the simulation supports.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// An image could not be loaded or is unusable.
    #[error("asset `{path}` unavailable: {reason}")]
    Asset { path: String, reason: String },
    /// An emblem carries data that cannot be drawn.
    #[error("malformed emblem: {0}")]
    MalformedEmblem(String),
    /// The drawing surface rejected a draw call.
    #[error("draw failed: {0}")]
    Draw(String),
}

impl StarflightError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub fn asset(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Asset {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl From<&str> for StarflightError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for StarflightError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
