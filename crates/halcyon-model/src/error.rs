//! Error types for the model layer.

/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the model layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A model was defined twice under the same name.
    #[error("model '{name}' is already defined")]
    DuplicateModel { name: String },

    /// A model name has no registered definition.
    #[error("unknown model '{name}'")]
    UnknownModel { name: String },
}

impl Error {
    /// Create a duplicate-definition error.
    pub fn duplicate_model(name: impl Into<String>) -> Self {
        Self::DuplicateModel { name: name.into() }
    }

    /// Create an unknown-model error.
    pub fn unknown_model(name: impl Into<String>) -> Self {
        Self::UnknownModel { name: name.into() }
    }
}
