//! In-memory model registry.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::{Model, ModelRef, ModelSource, ModelStatus, Params};

/// Declaration of a model: the parameter keys that identify an instance.
#[derive(Debug, Clone, Default)]
pub struct ModelDecl {
    params: Vec<String>,
}

impl ModelDecl {
    /// A model with no identifying parameters (a singleton per name).
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the parameter keys relevant to this model.
    ///
    /// Incoming view params are filtered down to these keys before they
    /// take part in instance identity.
    pub fn with_params<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            params: keys.into_iter().map(Into::into).collect(),
        }
    }
}

/// Instance identity: model name plus its filtered parameters.
type InstanceKey = (String, BTreeMap<String, String>);

#[derive(Debug, Default)]
struct ModelState {
    status: ModelStatus,
    data: Option<Value>,
    error: Option<Value>,
}

/// A model that holds its latest data or error in memory.
#[derive(Debug, Default)]
pub struct MemoryModel {
    state: RwLock<ModelState>,
}

impl MemoryModel {
    /// Store fetched data and mark the model valid.
    pub fn set_data(&self, data: Value) {
        let mut state = self.state.write();
        state.status = ModelStatus::Valid;
        state.data = Some(data);
        state.error = None;
    }

    /// Store an error payload and mark the model invalid.
    pub fn set_error(&self, error: Value) {
        let mut state = self.state.write();
        state.status = ModelStatus::Error;
        state.error = Some(error);
    }

    /// Drop validity without touching the stored payloads.
    pub fn invalidate(&self) {
        self.state.write().status = ModelStatus::None;
    }
}

impl Model for MemoryModel {
    fn status(&self) -> ModelStatus {
        self.state.read().status
    }

    fn data(&self) -> Option<Value> {
        self.state.read().data.clone()
    }

    fn error(&self) -> Option<Value> {
        self.state.read().error.clone()
    }
}

/// Registry of model definitions and their live instances.
///
/// Instances are keyed on `(name, filtered params)`: repeated `get` calls
/// with equal relevant params return the same shared instance, so a view
/// and a test fixture observing "the same" model really do share state.
#[derive(Default)]
pub struct ModelRegistry {
    decls: RwLock<HashMap<String, ModelDecl>>,
    instances: RwLock<HashMap<InstanceKey, Arc<MemoryModel>>>,
}

impl ModelRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model definition.
    ///
    /// Fails with [`Error::DuplicateModel`] if `name` is already defined;
    /// the existing definition is never replaced.
    pub fn define(&self, name: impl Into<String>, decl: ModelDecl) -> Result<()> {
        let name = name.into();
        let mut decls = self.decls.write();
        if decls.contains_key(&name) {
            return Err(Error::duplicate_model(name));
        }
        tracing::debug!(target: "halcyon::model", name = %name, "defined model");
        decls.insert(name, decl);
        Ok(())
    }

    /// Get or create the instance of `name` identified by `params`.
    pub fn get(&self, name: &str, params: &Params) -> Result<Arc<MemoryModel>> {
        let key = self.instance_key(name, params)?;
        if let Some(existing) = self.instances.read().get(&key) {
            return Ok(existing.clone());
        }
        let mut instances = self.instances.write();
        let model = instances.entry(key).or_insert_with(|| {
            tracing::trace!(target: "halcyon::model", name, "created model instance");
            Arc::new(MemoryModel::default())
        });
        Ok(model.clone())
    }

    /// Remove one definition, or all of them when `name` is `None`.
    ///
    /// Live instances of removed definitions are dropped as well. Used for
    /// lifecycle/test reset, not steady-state operation.
    pub fn undefine(&self, name: Option<&str>) {
        match name {
            Some(name) => {
                self.decls.write().remove(name);
                self.instances.write().retain(|(n, _), _| n != name);
                tracing::debug!(target: "halcyon::model", name, "undefined model");
            }
            None => {
                self.decls.write().clear();
                self.instances.write().clear();
                tracing::debug!(target: "halcyon::model", "undefined all models");
            }
        }
    }

    fn instance_key(&self, name: &str, params: &Params) -> Result<InstanceKey> {
        let decls = self.decls.read();
        let decl = decls
            .get(name)
            .ok_or_else(|| Error::unknown_model(name))?;
        let filtered = decl
            .params
            .iter()
            .filter_map(|key| params.get(key).map(|v| (key.clone(), v.clone())))
            .collect();
        Ok((name.to_owned(), filtered))
    }
}

impl ModelSource for ModelRegistry {
    fn create(&self, name: &str, params: &Params) -> Result<ModelRef> {
        Ok(self.get(name, params)?)
    }
}
