//! Model layer for Halcyon.
//!
//! Views consume models through a deliberately narrow surface: a validity
//! [`ModelStatus`], a data snapshot, and an error snapshot. This crate
//! defines that surface plus an in-memory [`ModelRegistry`] that implements
//! it, which is what tests and simple applications run against. Transports
//! that actually fetch data live behind the [`ModelSource`] trait and are
//! out of scope here.
//!
//! # Example
//!
//! ```
//! use halcyon_model::{Model, ModelDecl, ModelRegistry, ModelStatus, Params};
//! use serde_json::json;
//!
//! let registry = ModelRegistry::new();
//! registry.define("profile", ModelDecl::with_params(["id"])).unwrap();
//!
//! let params = Params::from([("id".to_string(), "42".to_string())]);
//! let profile = registry.get("profile", &params).unwrap();
//! profile.set_data(json!({ "name": "kolya" }));
//!
//! assert_eq!(profile.status(), ModelStatus::Valid);
//! ```

mod error;
mod model;
mod registry;

pub use error::{Error, Result};
pub use model::{Model, ModelRef, ModelSource, ModelStatus, Params};
pub use registry::{MemoryModel, ModelDecl, ModelRegistry};
