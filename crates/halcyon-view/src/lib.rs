//! View definitions, event binding, and model aggregation for Halcyon.
//!
//! A *view* is a reusable UI unit tied to zero or more data models. Views
//! form a single-inheritance hierarchy and declare, in a compact
//! descriptor language, which UI and application events they react to
//! during the `init` (first attachment) and `show` (becoming visible)
//! lifecycle phases. This crate provides:
//!
//! - **Registry**: define-once view definitions with inheritance
//!   resolution and lazy, memoized metadata compilation
//! - **Descriptor compiler**: the event key grammar, compiled into four
//!   phase-scoped lookup tables
//! - **Handler resolution**: closure or method-name references resolved
//!   into instance-bound callables at phase activation
//! - **Model aggregation**: per-model data/error snapshots and overall
//!   render validity
//!
//! DOM attachment, template rendering, and model transport are external
//! collaborators; models are consumed only through the narrow surface of
//! [`halcyon_model`].
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//!
//! use halcyon_model::{ModelDecl, ModelRegistry};
//! use halcyon_view::prelude::*;
//! use serde_json::json;
//!
//! let models = Rc::new(ModelRegistry::new());
//! models.define("note", ModelDecl::new()).unwrap();
//!
//! let views = ViewRegistry::new(models.clone());
//! views
//!     .define(
//!         "note-card",
//!         ViewDecl::new()
//!             .models(["note"])
//!             .method("on_click", |view, _args| {
//!                 tracing::debug!(id = view.id(), "clicked");
//!             })
//!             .on("click .title", "on_click")
//!             .on("note-updated@show", "on_click"),
//!     )
//!     .unwrap();
//!
//! let info = views.info("note-card").unwrap();
//! assert_eq!(info.init_events.bind.len(), 1);
//! assert_eq!(info.show_noevents.global.len(), 1);
//!
//! models
//!     .get("note", &Params::new())
//!     .unwrap()
//!     .set_data(json!({ "text": "hi" }));
//!
//! let view = views.create("note-card", Params::new()).unwrap();
//! assert!(view.is_models_valid());
//!
//! let bundle = view.activate(Phase::Init).unwrap();
//! assert_eq!(bundle.bind.len(), 1);
//! ```

pub mod decl;
pub mod events;
pub mod handler;
pub mod instance;
pub mod registry;

mod error;

pub use error::{Error, Result};

/// Prelude module with commonly used types.
pub mod prelude {
    pub use crate::decl::{ModelsDecl, ViewDecl};
    pub use crate::error::{Error, Result};
    pub use crate::events::{
        AppEventSpec, AppEvents, DomEventSet, DomEventSpec, DomEvents, INIT_HOOK, Phase,
    };
    pub use crate::handler::{
        BoundAppEvent, BoundDomEvent, BoundHandler, HandlerBinder, HandlerFn, HandlerRef,
        MethodResolver, MethodTable,
    };
    pub use crate::instance::{PhaseBindings, ViewInstance};
    pub use crate::registry::{DefHandle, ViewInfo, ViewRegistry};

    pub use halcyon_model::{Model, ModelRef, ModelSource, ModelStatus, Params};
}
