//! Runtime view instances.
//!
//! A [`ViewInstance`] ties a compiled definition to concrete params and
//! model instances. Phase activation materializes the compiled event
//! tables into bound handler bundles for the DOM-attachment layer; model
//! queries expose per-model snapshots and overall render validity.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use halcyon_model::{ModelRef, ModelStatus, Params};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::events::Phase;
use crate::handler::{
    BoundAppEvent, BoundDomEvent, HandlerBinder, HandlerFn, MethodResolver, MethodTable,
};
use crate::registry::ViewInfo;

/// Handlers materialized for one lifecycle phase.
///
/// `local` and `global` correspond to the `ns-local` / `ns-global`
/// application event channels.
#[derive(Debug, Clone)]
pub struct PhaseBindings {
    pub bind: Vec<BoundDomEvent>,
    pub delegate: Vec<BoundDomEvent>,
    pub local: Vec<BoundAppEvent>,
    pub global: Vec<BoundAppEvent>,
}

/// A live view: compiled metadata, params, and resolved models.
///
/// Instances are created by
/// [`ViewRegistry::create`](crate::registry::ViewRegistry::create) and
/// owned by the rendering/routing layer. Params are immutable for the
/// instance's lifetime; model objects are borrowed from the model layer,
/// not owned.
pub struct ViewInstance {
    id: String,
    info: Rc<ViewInfo>,
    methods: Rc<MethodTable>,
    params: Params,
    models: BTreeMap<String, ModelRef>,
    bindings: RefCell<HashMap<Phase, Rc<PhaseBindings>>>,
}

impl ViewInstance {
    pub(crate) fn new(
        id: &str,
        info: Rc<ViewInfo>,
        methods: Rc<MethodTable>,
        params: Params,
        models: BTreeMap<String, ModelRef>,
    ) -> Rc<Self> {
        Rc::new(Self {
            id: id.to_owned(),
            info,
            methods,
            params,
            models,
            bindings: RefCell::new(HashMap::new()),
        })
    }

    /// The definition id this instance was created from.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The params the instance was created with.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The shared compiled metadata.
    pub fn info(&self) -> &Rc<ViewInfo> {
        &self.info
    }

    /// Look up a method on the effective (own + inherited) method set.
    pub fn method(&self, name: &str) -> Option<HandlerFn> {
        self.methods.lookup(name)
    }

    /// Materialize the bound handler bundle for `phase`.
    ///
    /// The bundle is memoized per phase: the first activation resolves
    /// every handler in one pass per category (four binder invocations),
    /// and re-activating returns the same shared bundle without
    /// re-resolving. The caller hands the bundle to the DOM-attachment
    /// layer; nothing is attached here.
    pub fn activate(self: &Rc<Self>, phase: Phase) -> Result<Rc<PhaseBindings>> {
        if let Some(existing) = self.bindings.borrow().get(&phase) {
            return Ok(existing.clone());
        }
        let bundle = Rc::new(self.materialize(phase, &MethodResolver)?);
        self.bindings.borrow_mut().insert(phase, bundle.clone());
        tracing::trace!(target: "halcyon::view", id = %self.id, %phase, "activated phase");
        Ok(bundle)
    }

    /// Bind all four event categories of `phase` through `binder`.
    ///
    /// Exactly four binder invocations, one per category, regardless of
    /// list lengths.
    pub(crate) fn materialize(
        self: &Rc<Self>,
        phase: Phase,
        binder: &dyn HandlerBinder,
    ) -> Result<PhaseBindings> {
        let (events, noevents) = match phase {
            Phase::Init => (&self.info.init_events, &self.info.init_noevents),
            Phase::Show => (&self.info.show_events, &self.info.show_noevents),
        };
        Ok(PhaseBindings {
            bind: binder.bind_dom(&events.bind, self)?,
            delegate: binder.bind_dom(&events.delegate, self)?,
            local: binder.bind_app(&noevents.local, self)?,
            global: binder.bind_app(&noevents.global, self)?,
        })
    }

    /// The bound model instance for `name`.
    ///
    /// Fails with [`Error::UnknownModel`] if the view does not declare it.
    pub fn model(&self, name: &str) -> Result<ModelRef> {
        self.models
            .get(name)
            .cloned()
            .ok_or_else(|| Error::unknown_model(&self.id, name))
    }

    /// The current data snapshot of the model `name`.
    pub fn model_data(&self, name: &str) -> Result<Option<Value>> {
        Ok(self.model(name)?.data())
    }

    /// Whether every required model currently reports valid data.
    ///
    /// Optional models are ignored here entirely; a model that was never
    /// fetched counts as invalid.
    pub fn is_models_valid(&self) -> bool {
        self.info
            .models
            .iter()
            .filter(|(_, required)| **required)
            .all(|(name, _)| {
                self.models
                    .get(name)
                    .is_some_and(|m| m.status() == ModelStatus::Valid)
            })
    }

    /// Per-model snapshot for rendering: data when valid, the error
    /// payload otherwise.
    ///
    /// Unlike [`ViewInstance::is_models_valid`], optional models appear
    /// here too; downstream rendering decides whether to show their
    /// errors.
    pub fn models_data(&self) -> BTreeMap<String, Value> {
        self.models
            .iter()
            .map(|(name, model)| {
                let value = if model.status() == ModelStatus::Valid {
                    model.data().unwrap_or(Value::Null)
                } else {
                    model.error().unwrap_or(Value::Null)
                };
                (name.clone(), value)
            })
            .collect()
    }
}

impl std::fmt::Debug for ViewInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewInstance")
            .field("id", &self.id)
            .field("params", &self.params)
            .field("models", &self.models.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use halcyon_model::{ModelDecl, ModelRegistry};
    use serde_json::json;

    use crate::decl::ViewDecl;
    use crate::events::{AppEventSpec, DomEventSpec};
    use crate::registry::ViewRegistry;

    struct CountingBinder {
        dom_calls: Cell<u32>,
        app_calls: Cell<u32>,
    }

    impl CountingBinder {
        fn new() -> Self {
            Self {
                dom_calls: Cell::new(0),
                app_calls: Cell::new(0),
            }
        }
    }

    impl HandlerBinder for CountingBinder {
        fn bind_dom(
            &self,
            events: &[DomEventSpec],
            receiver: &Rc<ViewInstance>,
        ) -> Result<Vec<BoundDomEvent>> {
            self.dom_calls.set(self.dom_calls.get() + 1);
            MethodResolver.bind_dom(events, receiver)
        }

        fn bind_app(
            &self,
            events: &[AppEventSpec],
            receiver: &Rc<ViewInstance>,
        ) -> Result<Vec<BoundAppEvent>> {
            self.app_calls.set(self.app_calls.get() + 1);
            MethodResolver.bind_app(events, receiver)
        }
    }

    fn setup() -> (ViewRegistry, Rc<ModelRegistry>) {
        let models = Rc::new(ModelRegistry::new());
        let views = ViewRegistry::new(models.clone());
        (views, models)
    }

    #[test]
    fn materialize_invokes_binder_once_per_category() {
        let (views, _) = setup();
        views.define("empty", ViewDecl::new()).unwrap();
        let view = views.create("empty", Params::new()).unwrap();

        let binder = CountingBinder::new();
        let bundle = view.materialize(Phase::Init, &binder).unwrap();

        assert_eq!(binder.dom_calls.get() + binder.app_calls.get(), 4);
        assert!(bundle.bind.is_empty());
        assert!(bundle.delegate.is_empty());
        assert!(bundle.local.is_empty());
        assert!(bundle.global.is_empty());
    }

    #[test]
    fn activate_is_memoized_per_phase() {
        let (views, _) = setup();
        views
            .define("card", ViewDecl::new().method("nop", |_, _| {}).on("click", "nop"))
            .unwrap();
        let view = views.create("card", Params::new()).unwrap();

        let first = view.activate(Phase::Init).unwrap();
        let again = view.activate(Phase::Init).unwrap();
        let show = view.activate(Phase::Show).unwrap();

        assert!(Rc::ptr_eq(&first, &again));
        assert!(!Rc::ptr_eq(&first, &show));
        assert_eq!(first.delegate.len(), 1);
        assert!(show.delegate.is_empty());
    }

    #[test]
    fn activation_preserves_order_and_payload() {
        let (views, _) = setup();
        views
            .define(
                "list",
                ViewDecl::new()
                    .method("on_scroll", |_, _| {})
                    .on("scroll window", "on_scroll")
                    .on("scroll document", "on_scroll")
                    .on("click .item", "on_scroll"),
            )
            .unwrap();
        let view = views.create("list", Params::new()).unwrap();

        let bundle = view.activate(Phase::Init).unwrap();
        let delegates: Vec<_> = bundle
            .delegate
            .iter()
            .map(|e| (e.event.as_str(), e.target.as_str()))
            .collect();
        assert_eq!(delegates, vec![("scroll", "window"), ("scroll", "document")]);
        assert_eq!(bundle.bind.len(), 1);
        assert_eq!(bundle.bind[0].target, ".item");
    }

    #[test]
    fn unresolved_method_fails_at_activation() {
        let (views, _) = setup();
        views
            .define("bad", ViewDecl::new().on("click", "missing_method"))
            .unwrap();
        let view = views.create("bad", Params::new()).unwrap();

        assert_eq!(
            view.activate(Phase::Init).unwrap_err(),
            Error::unresolved_handler("bad", "missing_method")
        );
    }

    #[test]
    fn bound_handlers_receive_the_instance_and_args() {
        let (views, _) = setup();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        views
            .define(
                "recorder",
                ViewDecl::new().on(
                    "custom-event",
                    crate::handler::HandlerRef::callable(move |view, args| {
                        sink.borrow_mut().push((view.id().to_owned(), args.to_vec()));
                    }),
                ),
            )
            .unwrap();
        let view = views.create("recorder", Params::new()).unwrap();

        let bundle = view.activate(Phase::Init).unwrap();
        (*bundle.global[0].handler)(&[json!(1), json!("x")]);

        let calls = seen.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "recorder");
        assert_eq!(calls[0].1, vec![json!(1), json!("x")]);
    }

    #[test]
    fn bound_handler_is_inert_after_instance_drop() {
        let (views, _) = setup();
        let calls = Rc::new(Cell::new(0u32));
        let counter = calls.clone();
        views
            .define(
                "ephemeral",
                ViewDecl::new().on(
                    "ping",
                    crate::handler::HandlerRef::callable(move |_, _| {
                        counter.set(counter.get() + 1);
                    }),
                ),
            )
            .unwrap();

        let view = views.create("ephemeral", Params::new()).unwrap();
        let bundle = view.activate(Phase::Init).unwrap();
        let handler = bundle.global[0].handler.clone();

        (*handler)(&[]);
        assert_eq!(calls.get(), 1);

        drop(bundle);
        drop(view);
        (*handler)(&[]);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn model_queries_reject_undeclared_names() {
        let (views, models) = setup();
        models.define("a", ModelDecl::new()).unwrap();
        views.define("boxed", ViewDecl::new().models(["a"])).unwrap();
        let view = views.create("boxed", Params::new()).unwrap();

        assert!(view.model("a").is_ok());
        assert_eq!(
            view.model("b").map(|_| ()).unwrap_err(),
            Error::unknown_model("boxed", "b")
        );
        assert_eq!(
            view.model_data("b").unwrap_err(),
            Error::unknown_model("boxed", "b")
        );
    }

    #[test]
    fn model_data_returns_the_current_snapshot() {
        let (views, models) = setup();
        models.define("feed", ModelDecl::new()).unwrap();
        views.define("pane", ViewDecl::new().models(["feed"])).unwrap();

        let feed = models.get("feed", &Params::new()).unwrap();
        feed.set_data(json!({ "items": [1, 2, 3] }));

        let view = views.create("pane", Params::new()).unwrap();
        assert_eq!(
            view.model_data("feed").unwrap(),
            Some(json!({ "items": [1, 2, 3] }))
        );
    }

    #[test]
    fn validity_gates_on_required_models_only() {
        let (views, models) = setup();
        for name in ["a", "b", "c"] {
            models.define(name, ModelDecl::new()).unwrap();
        }
        views
            .define(
                "complex",
                ViewDecl::new().model_flags([
                    ("a", json!(true)),
                    ("b", json!(false)),
                    ("c", json!(null)),
                ]),
            )
            .unwrap();

        let a = models.get("a", &Params::new()).unwrap();
        let b = models.get("b", &Params::new()).unwrap();
        let c = models.get("c", &Params::new()).unwrap();

        // Required valid, optionals invalid: still renderable.
        a.set_data(json!({ "data": "a" }));
        b.set_error(json!({ "error": "b invalid" }));
        c.set_error(json!({ "error": "c invalid" }));
        let view = views.create_with("complex", Params::new(), false).unwrap();
        assert!(view.is_models_valid());

        // Required invalid, optionals valid: not renderable.
        a.set_error(json!({ "error": "a invalid" }));
        b.set_data(json!({ "data": "b" }));
        c.set_data(json!({ "data": "c" }));
        assert!(!view.is_models_valid());

        // Never-fetched required model counts as invalid.
        a.invalidate();
        assert!(!view.is_models_valid());
    }

    #[test]
    fn models_data_surfaces_errors_of_optional_models() {
        let (views, models) = setup();
        for name in ["a", "b", "c"] {
            models.define(name, ModelDecl::new()).unwrap();
        }
        views
            .define(
                "complex",
                ViewDecl::new().model_flags([
                    ("a", json!(true)),
                    ("b", json!(false)),
                    ("c", json!(null)),
                ]),
            )
            .unwrap();

        models
            .get("a", &Params::new())
            .unwrap()
            .set_data(json!({ "data": "a" }));
        models
            .get("b", &Params::new())
            .unwrap()
            .set_error(json!({ "error": "b invalid" }));
        models
            .get("c", &Params::new())
            .unwrap()
            .set_error(json!({ "error": "c invalid" }));

        let view = views.create_with("complex", Params::new(), false).unwrap();
        let snapshot = view.models_data();

        assert_eq!(snapshot["a"], json!({ "data": "a" }));
        assert_eq!(snapshot["b"], json!({ "error": "b invalid" }));
        assert_eq!(snapshot["c"], json!({ "error": "c invalid" }));
        assert_eq!(snapshot.len(), 3);
    }
}
