/// Convenience result type used across Enefty.
pub type EneftyResult<T> = Result<T, EneftyError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum EneftyError {
    /// Invalid user-provided stack edits or project data.
    #[error("validation error: {0}")]
    Validation(String),

    /// A bulk run was rejected before it started (no folder, nothing to combine, wrong state).
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// The render adapter could not produce an image for the current composition.
    #[error("render error: {0}")]
    Render(String),

    /// The output adapter could not store a rendered image.
    #[error("persist error: {0}")]
    Persist(String),

    /// Errors when serializing or deserializing project documents.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EneftyError {
    /// Build a [`EneftyError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`EneftyError::Precondition`] value.
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    /// Build a [`EneftyError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`EneftyError::Persist`] value.
    pub fn persist(msg: impl Into<String>) -> Self {
        Self::Persist(msg.into())
    }

    /// Build a [`EneftyError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
