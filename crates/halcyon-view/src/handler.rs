//! Handler references and their resolution into instance-bound callables.
//!
//! A view declares handlers either as closures or as method names; both
//! forms are carried as a [`HandlerRef`] and resolved uniformly when a
//! lifecycle phase is activated. Method names are looked up through the
//! instance's effective method set, a layered [`MethodTable`] that checks
//! the view's own methods before falling back to its parent chain. Parent
//! tables are shared and never mutated by children.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::events::{AppEventSpec, DomEventSpec};
use crate::instance::ViewInstance;

/// A view method body: receives the instance and the event arguments.
pub type HandlerFn = Rc<dyn Fn(&ViewInstance, &[Value])>;

/// A resolved callable with its receiver already bound.
///
/// The receiver is captured weakly: invoking a bound handler after its
/// instance has been dropped is a no-op.
pub type BoundHandler = Rc<dyn Fn(&[Value])>;

/// A handler as declared in a view definition.
#[derive(Clone)]
pub enum HandlerRef {
    /// A callable bound directly in the definition.
    Callable(HandlerFn),
    /// The name of a method on the view's effective method set.
    Method(String),
}

impl HandlerRef {
    /// Wrap a closure as a handler reference.
    pub fn callable(f: impl Fn(&ViewInstance, &[Value]) + 'static) -> Self {
        Self::Callable(Rc::new(f))
    }

    /// Reference a method by name.
    pub fn method(name: impl Into<String>) -> Self {
        Self::Method(name.into())
    }
}

impl fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Callable(_) => write!(f, "Callable(<fn>)"),
            Self::Method(name) => write!(f, "Method({name:?})"),
        }
    }
}

impl From<&str> for HandlerRef {
    fn from(name: &str) -> Self {
        Self::method(name)
    }
}

impl From<String> for HandlerRef {
    fn from(name: String) -> Self {
        Self::Method(name)
    }
}

/// The effective method set of a view definition.
///
/// Lookup checks the definition's own methods first and then walks the
/// parent chain. Overriding happens purely at lookup time, so a child's
/// methods never become visible through the parent's table.
pub struct MethodTable {
    own: HashMap<String, HandlerFn>,
    parent: Option<Rc<MethodTable>>,
}

impl MethodTable {
    pub(crate) fn new(own: HashMap<String, HandlerFn>, parent: Option<Rc<MethodTable>>) -> Self {
        Self { own, parent }
    }

    /// Look up a method by name, falling back through the parent chain.
    pub fn lookup(&self, name: &str) -> Option<HandlerFn> {
        self.own
            .get(name)
            .cloned()
            .or_else(|| self.parent.as_ref().and_then(|p| p.lookup(name)))
    }

    /// Whether the effective set contains `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Whether this table (ignoring parents) defines `name`.
    pub fn contains_own(&self, name: &str) -> bool {
        self.own.contains_key(name)
    }
}

impl fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodTable")
            .field("own", &self.own.keys().collect::<Vec<_>>())
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

/// Resolve a handler reference into a callable bound to `receiver`.
///
/// A [`HandlerRef::Callable`] is wrapped to forward its arguments with the
/// receiver bound; a [`HandlerRef::Method`] is first looked up through the
/// receiver's effective method set and fails with
/// [`Error::UnresolvedHandler`] when absent. Inputs are never mutated.
pub fn resolve(reference: &HandlerRef, receiver: &Rc<ViewInstance>) -> Result<BoundHandler> {
    let method = match reference {
        HandlerRef::Callable(f) => f.clone(),
        HandlerRef::Method(name) => receiver
            .method(name)
            .ok_or_else(|| Error::unresolved_handler(receiver.id(), name.clone()))?,
    };
    let weak = Rc::downgrade(receiver);
    Ok(Rc::new(move |args: &[Value]| {
        if let Some(view) = weak.upgrade() {
            (*method)(&view, args);
        }
    }))
}

/// A DOM-bound event with its handler materialized.
#[derive(Clone)]
pub struct BoundDomEvent {
    pub event: String,
    pub target: String,
    pub handler: BoundHandler,
}

/// An application-level event with its handler materialized.
#[derive(Clone)]
pub struct BoundAppEvent {
    pub event: String,
    pub handler: BoundHandler,
}

impl fmt::Debug for BoundDomEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoundDomEvent({:?}, {:?}, <bound>)", self.event, self.target)
    }
}

impl fmt::Debug for BoundAppEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoundAppEvent({:?}, <bound>)", self.event)
    }
}

/// Materializes event lists into bound handler lists during activation.
///
/// Both methods return a new vector of equal length and order; each entry
/// is identical to its input except for the resolved handler.
pub trait HandlerBinder {
    /// Bind a list of DOM-bound event entries.
    fn bind_dom(
        &self,
        events: &[DomEventSpec],
        receiver: &Rc<ViewInstance>,
    ) -> Result<Vec<BoundDomEvent>>;

    /// Bind a list of application-level event entries.
    fn bind_app(
        &self,
        events: &[AppEventSpec],
        receiver: &Rc<ViewInstance>,
    ) -> Result<Vec<BoundAppEvent>>;
}

/// The default binder: resolves through [`resolve`].
pub struct MethodResolver;

impl HandlerBinder for MethodResolver {
    fn bind_dom(
        &self,
        events: &[DomEventSpec],
        receiver: &Rc<ViewInstance>,
    ) -> Result<Vec<BoundDomEvent>> {
        events
            .iter()
            .map(|e| {
                Ok(BoundDomEvent {
                    event: e.event.clone(),
                    target: e.target.clone(),
                    handler: resolve(&e.handler, receiver)?,
                })
            })
            .collect()
    }

    fn bind_app(
        &self,
        events: &[AppEventSpec],
        receiver: &Rc<ViewInstance>,
    ) -> Result<Vec<BoundAppEvent>> {
        events
            .iter()
            .map(|e| {
                Ok(BoundAppEvent {
                    event: e.event.clone(),
                    handler: resolve(&e.handler, receiver)?,
                })
            })
            .collect()
    }
}
