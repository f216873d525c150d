//! The narrow model surface consumed by the view layer.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;

/// Validity of a model's current contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelStatus {
    /// Never fetched; carries neither data nor error.
    #[default]
    None,
    /// Holds fetched data.
    Valid,
    /// The last fetch failed; holds an error payload.
    Error,
}

/// Parameters a view passes down to the models it depends on.
pub type Params = HashMap<String, String>;

/// What a view needs from a model: validity plus data/error snapshots.
pub trait Model {
    /// Current validity.
    fn status(&self) -> ModelStatus;

    /// Data snapshot, if any has been set.
    fn data(&self) -> Option<Value>;

    /// Error payload from the last failed fetch, if any.
    fn error(&self) -> Option<Value>;
}

/// Shared handle to a model instance.
pub type ModelRef = Arc<dyn Model + Send + Sync>;

/// Resolves model names to instances for the view layer.
pub trait ModelSource {
    /// Resolve (or lazily create) the model `name` for the given view params.
    ///
    /// Implementations key instance identity on the subset of `params` the
    /// model declares as relevant, so unrelated view params do not fan out
    /// into distinct instances.
    fn create(&self, name: &str, params: &Params) -> Result<ModelRef>;

    /// Ask the underlying transport to (re)fetch the model's data.
    ///
    /// The in-memory registry has no transport, so the default is a no-op.
    fn fetch(&self, _name: &str, _model: &ModelRef) {}
}
