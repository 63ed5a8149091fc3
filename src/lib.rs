//! Resolution engine of a C++ to pybind11 binding generator.
//!
//! Declarations reported by a front end are ingested into a [`model::Registry`],
//! linked by the [`resolve`] passes (typedef aliases, template linkage, base
//! classes, ownership), ordered by the [`plan`]ner and rendered to pybind11
//! sources by [`emit`]. [`pipeline`] runs the whole chain.

pub mod config;
pub mod emit;
pub mod error;
pub mod frontend;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod plan;
pub mod policy;
pub mod resolve;
pub mod types;

// Explicit exports for better API clarity
pub use config::Settings;
pub use error::{BindError, BindResult, FrontendError, FrontendResult};
pub use frontend::{DeclSource, Declaration, HeaderScanner, JsonSource};
pub use model::Registry;
pub use pipeline::{PipelineOptions, PipelineOutput, generate, run, run_with_settings};
pub use plan::BindingPlan;
pub use policy::{AllowAll, ConfiguredPolicy, ExclusionPolicy};
pub use resolve::{Diagnostic, Diagnostics, ExclusionReason};
pub use types::{Access, ClassId, DeclKind, EntityRef, OwnershipKind, TemplateId, TypeRef, TypedefId};
