//! Whole-program resolution passes.
//!
//! The passes run strictly in order, each visiting every entity before the
//! next starts:
//!
//! 1. [`alias`]: typedefs whose canonical type is already owned become aliases
//! 2. [`templates`]: non-alias typedefs are linked to their class template
//! 3. [`bases`]: base references of classes, then of template bodies
//! 4. [`ownership`]: holder kind per top-level class, pushed down to nested ones
//!
//! Recoverable problems never abort a pass. They set an exclusion flag and
//! record a [`Diagnostic`]; only violations of the declaration model are
//! returned as errors.

pub mod alias;
pub mod bases;
pub mod ownership;
pub mod templates;

use crate::error::BindResult;
use crate::model::Registry;
use crate::policy::ExclusionPolicy;
use serde::Serialize;
use std::fmt;

/// Why an entity or base edge was excluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ExclusionReason {
    /// Excluded by configuration
    Configured,
    /// Free functions named `operator...` are never bound
    OperatorFunction,
    /// Typedef of a template that is not registered or is excluded
    TemplateUnavailable { template: String },
    /// Typedef of something other than a template instantiation
    UnsupportedType,
    /// Base not found in any registry
    UnresolvedBase { base: String },
    /// Base found but its superclass is excluded
    ExcludedSuperclass { base: String },
    /// Base listed in the configured excluded bases
    ConfiguredBase { base: String },
    /// Template parameter used as a base outside a template body
    PlaceholderOutsideTemplate { base: String },
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configured => write!(f, "excluded by configuration"),
            Self::OperatorFunction => write!(f, "operator function"),
            Self::TemplateUnavailable { template } => {
                write!(f, "unavailable template: {template}")
            }
            Self::UnsupportedType => write!(f, "unsupported type"),
            Self::UnresolvedBase { base } => write!(f, "unresolved base {base}"),
            Self::ExcludedSuperclass { base } => write!(f, "base {base} is excluded"),
            Self::ConfiguredBase { base } => write!(f, "base {base} excluded by configuration"),
            Self::PlaceholderOutsideTemplate { base } => {
                write!(f, "template parameter base {base} outside a template")
            }
        }
    }
}

/// A recorded exclusion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Register name of the excluded entity, or of the dependent for base edges
    pub subject: String,
    #[serde(flatten)]
    pub reason: ExclusionReason,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Excluding {} ({})", self.subject, self.reason)
    }
}

/// Exclusion diagnostics in the order they were recorded.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an exclusion and log it
    pub fn record(&mut self, subject: impl Into<String>, reason: ExclusionReason) {
        let diagnostic = Diagnostic {
            subject: subject.into(),
            reason,
        };
        tracing::warn!("{diagnostic}");
        self.items.push(diagnostic);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Diagnostics recorded for one subject
    pub fn for_subject<'a>(&'a self, subject: &'a str) -> impl Iterator<Item = &'a Diagnostic> {
        self.items.iter().filter(move |d| d.subject == subject)
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Options of the resolution passes that do not come from the exclusion policy.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Reference-counted root type
    pub handle_root: String,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            handle_root: "Standard_Transient".to_string(),
        }
    }
}

/// Counters reported after the passes ran.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolveStats {
    pub aliases: usize,
    pub linked_typedefs: usize,
    pub resolved_bases: usize,
    pub excluded_bases: usize,
    pub handle_classes: usize,
}

/// Run all four passes in order.
pub fn run_passes(
    registry: &mut Registry,
    policy: &dyn ExclusionPolicy,
    options: &ResolveOptions,
    diagnostics: &mut Diagnostics,
) -> BindResult<ResolveStats> {
    let aliases = alias::detect_aliases(registry);
    let linked_typedefs = templates::link_templates(registry, diagnostics);

    let mut edges = bases::resolve_class_bases(registry, policy, diagnostics)?;
    edges += bases::resolve_template_bases(registry, policy, diagnostics)?;

    let handle_classes = ownership::assign_ownership(registry, &options.handle_root);

    let stats = ResolveStats {
        aliases,
        linked_typedefs,
        resolved_bases: edges.resolved,
        excluded_bases: edges.excluded,
        handle_classes,
    };

    tracing::info!(
        "Resolution complete: {} aliases, {} linked typedefs, {} bases resolved, {} bases excluded, {} handle classes",
        stats.aliases,
        stats.linked_typedefs,
        stats.resolved_bases,
        stats.excluded_bases,
        stats.handle_classes
    );

    Ok(stats)
}
