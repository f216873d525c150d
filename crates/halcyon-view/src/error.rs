//! Error types for the view core.

/// Result type alias for view operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the view core.
///
/// All of these surface synchronously at the call that detects them;
/// nothing is retried or swallowed internally. A misconfigured definition
/// fails at define/info time rather than later at render time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// `define` was called twice with the same id.
    #[error("view '{id}' is already defined")]
    DuplicateDefinition { id: String },

    /// `info`/`create` was called for an id that was never defined.
    #[error("unknown view '{id}'")]
    UnknownDefinition { id: String },

    /// An instance was queried for a model it does not declare.
    #[error("view '{view}' does not declare model '{name}'")]
    UnknownModel { view: String, name: String },

    /// A string handler reference has no match on the effective method set.
    #[error("view '{view}' has no method '{name}'")]
    UnresolvedHandler { view: String, name: String },

    /// An event descriptor key does not match the key grammar.
    #[error("invalid event key '{key}': {message}")]
    InvalidEventKey { key: String, message: String },

    /// Model resolution failed while creating an instance.
    #[error(transparent)]
    Model(#[from] halcyon_model::Error),
}

impl Error {
    /// Create a duplicate-definition error.
    pub fn duplicate_definition(id: impl Into<String>) -> Self {
        Self::DuplicateDefinition { id: id.into() }
    }

    /// Create an unknown-definition error.
    pub fn unknown_definition(id: impl Into<String>) -> Self {
        Self::UnknownDefinition { id: id.into() }
    }

    /// Create an unknown-model error.
    pub fn unknown_model(view: impl Into<String>, name: impl Into<String>) -> Self {
        Self::UnknownModel {
            view: view.into(),
            name: name.into(),
        }
    }

    /// Create an unresolved-handler error.
    pub fn unresolved_handler(view: impl Into<String>, name: impl Into<String>) -> Self {
        Self::UnresolvedHandler {
            view: view.into(),
            name: name.into(),
        }
    }

    /// Create an invalid-event-key error.
    pub fn invalid_event_key(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEventKey {
            key: key.into(),
            message: message.into(),
        }
    }
}
