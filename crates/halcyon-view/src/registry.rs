//! View definition registry.
//!
//! Definitions are registered once under a unique id and are immutable
//! afterwards; redefining an id is a hard error. Compiled metadata
//! ([`ViewInfo`]) is produced lazily on first access and memoized per id,
//! invalidated only by [`ViewRegistry::undefine`]. The registry assumes
//! single-threaded access; callers must not redefine a view while
//! instances of it are active.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use halcyon_model::{ModelSource, Params};

use crate::decl::ViewDecl;
use crate::error::{Error, Result};
use crate::events::{self, AppEvents, DomEventSet, DomEvents};
use crate::handler::{self, HandlerFn, HandlerRef, MethodTable};
use crate::instance::ViewInstance;

/// Compiled, cached metadata for one view definition.
///
/// Field names mirror the descriptor surface integrations key on:
/// `initEvents`, `showEvents`, `initNoevents`, `showNoevents`, `models`.
#[derive(Debug, Clone)]
pub struct ViewInfo {
    /// DOM events active from first attachment.
    pub init_events: DomEvents,
    /// DOM events active while visible.
    pub show_events: DomEvents,
    /// Application events active from first attachment.
    pub init_noevents: AppEvents,
    /// Application events active while visible.
    pub show_noevents: AppEvents,
    /// Model name → required flag.
    pub models: BTreeMap<String, bool>,
    /// Handler for the reserved `ns-init` lifecycle key, if declared.
    pub init_hook: Option<HandlerRef>,
}

/// One stored definition: the raw declaration plus its layered method table.
pub(crate) struct ViewDef {
    id: String,
    decl: ViewDecl,
    methods: Rc<MethodTable>,
}

/// Opaque handle returned by `define`, usable as the parent of further
/// definitions. Supports multi-level inheritance chains.
#[derive(Clone)]
pub struct DefHandle(Rc<ViewDef>);

impl DefHandle {
    /// The id this handle was defined under.
    pub fn id(&self) -> &str {
        &self.0.id
    }
}

impl std::fmt::Debug for DefHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("DefHandle").field(&self.0.id).finish()
    }
}

/// Registry of view definitions.
pub struct ViewRegistry {
    defs: RefCell<HashMap<String, Rc<ViewDef>>>,
    cache: RefCell<HashMap<String, Rc<ViewInfo>>>,
    dom_events: DomEventSet,
    models: Rc<dyn ModelSource>,
}

impl ViewRegistry {
    /// Create a registry resolving models through `models`, with the
    /// default recognized DOM event names.
    pub fn new(models: Rc<dyn ModelSource>) -> Self {
        Self::with_dom_events(models, DomEventSet::default())
    }

    /// Create a registry with a custom recognized-event-name table.
    pub fn with_dom_events(models: Rc<dyn ModelSource>, dom_events: DomEventSet) -> Self {
        Self {
            defs: RefCell::new(HashMap::new()),
            cache: RefCell::new(HashMap::new()),
            dom_events,
            models,
        }
    }

    /// Register a root view definition.
    ///
    /// Fails with [`Error::DuplicateDefinition`] if `id` is taken; the
    /// existing definition is never replaced and registry state is
    /// unchanged on failure.
    pub fn define(&self, id: impl Into<String>, decl: ViewDecl) -> Result<DefHandle> {
        self.define_inner(id.into(), decl, None)
    }

    /// Register a view inheriting `parent`'s methods.
    ///
    /// The child's methods override the parent's at lookup time; the
    /// parent's method set is never mutated.
    pub fn define_child(
        &self,
        id: impl Into<String>,
        decl: ViewDecl,
        parent: &DefHandle,
    ) -> Result<DefHandle> {
        self.define_inner(id.into(), decl, Some(parent))
    }

    fn define_inner(
        &self,
        id: String,
        decl: ViewDecl,
        parent: Option<&DefHandle>,
    ) -> Result<DefHandle> {
        let mut defs = self.defs.borrow_mut();
        if defs.contains_key(&id) {
            return Err(Error::duplicate_definition(id));
        }

        let own: HashMap<String, HandlerFn> = decl
            .methods
            .iter()
            .map(|(name, body)| (name.clone(), body.clone()))
            .collect();
        let methods = Rc::new(MethodTable::new(
            own,
            parent.map(|p| p.0.methods.clone()),
        ));

        let def = Rc::new(ViewDef {
            id: id.clone(),
            decl,
            methods,
        });
        defs.insert(id.clone(), def.clone());
        tracing::debug!(target: "halcyon::view", id = %id, "defined view");
        Ok(DefHandle(def))
    }

    /// Compiled metadata for `id`, computed on first access and memoized.
    pub fn info(&self, id: &str) -> Result<Rc<ViewInfo>> {
        if let Some(cached) = self.cache.borrow().get(id) {
            return Ok(cached.clone());
        }

        let def = self.lookup(id)?;
        let tables = events::compile(&def.decl.events, &self.dom_events)?;
        let info = Rc::new(ViewInfo {
            init_events: tables.init_events,
            show_events: tables.show_events,
            init_noevents: tables.init_noevents,
            show_noevents: tables.show_noevents,
            models: def.decl.models.normalize(),
            init_hook: tables.init_hook,
        });
        self.cache.borrow_mut().insert(id.to_owned(), info.clone());
        tracing::debug!(target: "halcyon::view", id, "compiled view info");
        Ok(info)
    }

    /// Create an instance of `id`, fetching its models.
    pub fn create(&self, id: &str, params: Params) -> Result<Rc<ViewInstance>> {
        self.create_with(id, params, true)
    }

    /// Create an instance of `id`.
    ///
    /// Every declared model, required and optional alike, is resolved
    /// through the registry's [`ModelSource`]; when `fetch_models` is set
    /// the source's fetch hook is invoked per model. The reserved
    /// `ns-init` handler, if declared, fires exactly once with the new
    /// instance as receiver before this returns.
    pub fn create_with(
        &self,
        id: &str,
        params: Params,
        fetch_models: bool,
    ) -> Result<Rc<ViewInstance>> {
        let def = self.lookup(id)?;
        let info = self.info(id)?;

        let mut models = BTreeMap::new();
        for name in info.models.keys() {
            let model = self.models.create(name, &params)?;
            if fetch_models {
                self.models.fetch(name, &model);
            }
            models.insert(name.clone(), model);
        }

        let instance = ViewInstance::new(id, info.clone(), def.methods.clone(), params, models);
        if let Some(hook) = &info.init_hook {
            let bound = handler::resolve(hook, &instance)?;
            (*bound)(&[]);
        }
        tracing::debug!(target: "halcyon::view", id, "created view instance");
        Ok(instance)
    }

    /// Remove one definition and its cached info, or everything when `id`
    /// is `None`. Administrative only; not steady-state operation.
    pub fn undefine(&self, id: Option<&str>) {
        match id {
            Some(id) => {
                self.defs.borrow_mut().remove(id);
                self.cache.borrow_mut().remove(id);
                tracing::debug!(target: "halcyon::view", id, "undefined view");
            }
            None => {
                self.defs.borrow_mut().clear();
                self.cache.borrow_mut().clear();
                tracing::debug!(target: "halcyon::view", "undefined all views");
            }
        }
    }

    fn lookup(&self, id: &str) -> Result<Rc<ViewDef>> {
        self.defs
            .borrow()
            .get(id)
            .cloned()
            .ok_or_else(|| Error::unknown_definition(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use halcyon_model::ModelRegistry;

    fn registry() -> ViewRegistry {
        ViewRegistry::new(Rc::new(ModelRegistry::new()))
    }

    #[test]
    fn define_twice_fails_and_keeps_first() {
        let views = registry();
        views
            .define("card", ViewDecl::new().on("my-event", "nop"))
            .unwrap();

        let err = views.define("card", ViewDecl::new()).unwrap_err();
        assert_eq!(err, Error::duplicate_definition("card"));

        // The first definition is still the one served.
        let info = views.info("card").unwrap();
        assert_eq!(info.init_noevents.global.len(), 1);
    }

    #[test]
    fn info_unknown_id_fails() {
        let views = registry();
        assert_eq!(
            views.info("ghost").unwrap_err(),
            Error::unknown_definition("ghost")
        );
        assert_eq!(
            views.create("ghost", Params::new()).unwrap_err(),
            Error::unknown_definition("ghost")
        );
    }

    #[test]
    fn info_is_memoized_until_undefine() {
        let views = registry();
        views.define("card", ViewDecl::new()).unwrap();

        let first = views.info("card").unwrap();
        let second = views.info("card").unwrap();
        assert!(Rc::ptr_eq(&first, &second));

        views.undefine(Some("card"));
        views
            .define("card", ViewDecl::new().on("other-event", "nop"))
            .unwrap();
        let recompiled = views.info("card").unwrap();
        assert!(!Rc::ptr_eq(&first, &recompiled));
        assert_eq!(recompiled.init_noevents.global.len(), 1);
    }

    #[test]
    fn undefine_all_clears_the_registry() {
        let views = registry();
        views.define("a", ViewDecl::new()).unwrap();
        views.define("b", ViewDecl::new()).unwrap();

        views.undefine(None);
        assert!(views.info("a").is_err());
        assert!(views.info("b").is_err());
    }

    #[test]
    fn child_inherits_parent_methods_without_polluting_parent() {
        let views = registry();
        let parent = views
            .define("parent", ViewDecl::new().method("super_method", |_, _| {}))
            .unwrap();
        let child = views
            .define_child("child", ViewDecl::new().method("one_more", |_, _| {}), &parent)
            .unwrap();
        views
            .define_child("grandchild", ViewDecl::new(), &child)
            .unwrap();

        let child_view = views.create("child", Params::new()).unwrap();
        assert!(child_view.method("super_method").is_some());
        assert!(child_view.method("one_more").is_some());

        // Multi-level chains resolve through every ancestor.
        let grandchild_view = views.create("grandchild", Params::new()).unwrap();
        assert!(grandchild_view.method("super_method").is_some());
        assert!(grandchild_view.method("one_more").is_some());

        // The parent's effective set never gains child methods.
        let parent_view = views.create("parent", Params::new()).unwrap();
        assert!(parent_view.method("one_more").is_none());
        assert!(!parent.0.methods.contains("one_more"));
    }

    #[test]
    fn child_overrides_shadow_parent_methods() {
        let views = registry();
        let parent = views
            .define("base", ViewDecl::new().method("render", |_, _| {}))
            .unwrap();
        views
            .define_child("leaf", ViewDecl::new().method("render", |_, _| {}), &parent)
            .unwrap();

        let leaf = views.create("leaf", Params::new()).unwrap();
        let own = leaf.method("render").unwrap();
        let parents = parent.0.methods.lookup("render").unwrap();
        assert!(!Rc::ptr_eq(&own, &parents));
    }

    #[test]
    fn malformed_event_key_fails_at_info_time() {
        let views = registry();
        views
            .define("broken", ViewDecl::new().on("scroll@hover", "nop"))
            .unwrap();

        assert!(matches!(
            views.info("broken").unwrap_err(),
            Error::InvalidEventKey { .. }
        ));
    }
}
