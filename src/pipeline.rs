//! End-to-end driver: ingestion, resolution, planning and emission.

use crate::config::Settings;
use crate::emit::{self, EmitOptions, EmitReport};
use crate::error::BindResult;
use crate::frontend::DeclSource;
use crate::ingest::{IngestStats, ingest};
use crate::model::Registry;
use crate::plan::{BindingPlan, plan};
use crate::policy::{ConfiguredPolicy, ExclusionPolicy};
use crate::resolve::{Diagnostics, ResolveOptions, ResolveStats, run_passes};
use serde::Serialize;
use std::path::Path;

/// Options that do not come from the exclusion policy.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub root_module: String,
    pub resolve: ResolveOptions,
    pub emit: EmitOptions,
}

impl PipelineOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            root_module: settings.root_module.clone(),
            resolve: ResolveOptions {
                handle_root: settings.bind.handle_root.clone(),
            },
            emit: EmitOptions::from_settings(settings),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineStats {
    pub ingest: IngestStats,
    pub resolve: ResolveStats,
}

/// Result of [`run`]: the plan plus everything that was left out and why.
#[derive(Debug)]
pub struct PipelineOutput {
    pub plan: BindingPlan,
    pub registry: Registry,
    pub diagnostics: Diagnostics,
    pub stats: PipelineStats,
}

/// Ingest `source`, run the resolution passes and plan registration.
pub fn run<S: DeclSource>(
    source: S,
    policy: &dyn ExclusionPolicy,
    options: &PipelineOptions,
) -> BindResult<PipelineOutput> {
    let mut registry = Registry::new();
    let mut diagnostics = Diagnostics::new();

    let ingest_stats = ingest(source, policy, &mut registry, &mut diagnostics);
    let resolve_stats = run_passes(&mut registry, policy, &options.resolve, &mut diagnostics)?;
    let plan = plan(&registry, policy, &options.root_module)?;

    tracing::info!(
        "Planned {} modules, {} templates, {} types, {} aliases ({} exclusions)",
        plan.modules.len(),
        plan.templates.len(),
        plan.types.len(),
        plan.aliases.len(),
        diagnostics.len()
    );

    Ok(PipelineOutput {
        plan,
        registry,
        diagnostics,
        stats: PipelineStats {
            ingest: ingest_stats,
            resolve: resolve_stats,
        },
    })
}

/// [`run`] with the policy and options derived from `settings`. The header
/// set available for binding is the one the source reports.
pub fn run_with_settings<S: DeclSource>(source: S, settings: &Settings) -> BindResult<PipelineOutput> {
    let policy = ConfiguredPolicy::new(settings, source.available_headers())?;
    run(source, &policy, &PipelineOptions::from_settings(settings))
}

/// [`run`] followed by emission into `output_dir`.
pub fn generate<S: DeclSource>(
    source: S,
    policy: &dyn ExclusionPolicy,
    options: &PipelineOptions,
    output_dir: &Path,
) -> BindResult<(PipelineOutput, EmitReport)> {
    let output = run(source, policy, options)?;
    let report = emit::emit(&output.plan, &options.emit, output_dir)?;
    Ok((output, report))
}
