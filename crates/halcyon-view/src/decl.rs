//! Raw view declarations.
//!
//! A [`ViewDecl`] is the untyped definition info handed to
//! [`ViewRegistry::define`](crate::registry::ViewRegistry::define): event
//! descriptor keys, methods reachable from string handler references, and
//! declared model dependencies. Declarations are inert data; nothing is
//! parsed or validated until the registry compiles them on first access.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::handler::{HandlerFn, HandlerRef};
use crate::instance::ViewInstance;

/// Declared model dependencies, before normalization.
#[derive(Debug, Clone)]
pub enum ModelsDecl {
    /// A list of names, all implicitly required.
    List(Vec<String>),
    /// Name → flag; truthiness decides required vs optional.
    Flags(Vec<(String, Value)>),
}

impl Default for ModelsDecl {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl ModelsDecl {
    /// Canonical form: model name → required.
    ///
    /// An empty declaration yields an empty map. A name whose flag is falsy
    /// (`null`, `false`, `0`, `""`) is optional: resolved and surfaced for
    /// rendering, but excluded from validity gating.
    pub fn normalize(&self) -> BTreeMap<String, bool> {
        match self {
            Self::List(names) => names.iter().map(|n| (n.clone(), true)).collect(),
            Self::Flags(flags) => flags
                .iter()
                .map(|(name, flag)| (name.clone(), is_truthy(flag)))
                .collect(),
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Raw definition info passed to `define`.
///
/// Event keys behave like map keys: declaring the same key again replaces
/// the handler but keeps the key's original position.
#[derive(Default)]
pub struct ViewDecl {
    pub(crate) events: Vec<(String, HandlerRef)>,
    pub(crate) methods: Vec<(String, HandlerFn)>,
    pub(crate) models: ModelsDecl,
}

impl ViewDecl {
    /// An empty declaration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an event binding. `handler` is a closure wrapped via
    /// [`HandlerRef::callable`] or a method name (`&str` converts).
    pub fn on(mut self, key: impl Into<String>, handler: impl Into<HandlerRef>) -> Self {
        let key = key.into();
        let handler = handler.into();
        match self.events.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = handler,
            None => self.events.push((key, handler)),
        }
        self
    }

    /// Declare a method reachable from string handler references.
    pub fn method(
        mut self,
        name: impl Into<String>,
        body: impl Fn(&ViewInstance, &[Value]) + 'static,
    ) -> Self {
        let body: HandlerFn = std::rc::Rc::new(body);
        self.methods.push((name.into(), body));
        self
    }

    /// Declare required models by name.
    pub fn models<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models = ModelsDecl::List(names.into_iter().map(Into::into).collect());
        self
    }

    /// Declare models with explicit required flags.
    pub fn model_flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        self.models = ModelsDecl::Flags(
            flags
                .into_iter()
                .map(|(name, flag)| (name.into(), flag))
                .collect(),
        );
        self
    }
}

impl fmt::Debug for ViewDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewDecl")
            .field("events", &self.events.iter().map(|(k, _)| k).collect::<Vec<_>>())
            .field("methods", &self.methods.iter().map(|(k, _)| k).collect::<Vec<_>>())
            .field("models", &self.models)
            .finish()
    }
}
