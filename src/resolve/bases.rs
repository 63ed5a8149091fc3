//! Base-class resolution.
//!
//! Every base reference starts excluded. An edge is included only when its
//! superclass is found in a registry and is not excluded; the dependent class
//! itself is never excluded because of a missing base. Edges that resolve to
//! a class template become extra bases: the template registration function
//! must run for the instantiation before the dependent is registered.

use super::{Diagnostics, ExclusionReason};
use crate::error::{BindError, BindResult};
use crate::model::{BaseKind, BaseReference, Registry, template_arguments};
use crate::policy::ExclusionPolicy;
use crate::types::{ClassId, DeclKind, EntityRef, TemplateId};
use std::ops::AddAssign;

/// Resolved and excluded edge counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeCounts {
    pub resolved: usize,
    pub excluded: usize,
}

impl AddAssign for EdgeCounts {
    fn add_assign(&mut self, other: Self) {
        self.resolved += other.resolved;
        self.excluded += other.excluded;
    }
}

/// Who receives the extra includes of template-resolved edges
#[derive(Debug, Clone, Copy)]
enum Dependent {
    Class,
    Template(TemplateId),
}

enum Outcome {
    Included {
        kind: BaseKind,
        target: Option<EntityRef>,
        /// Replacement base spelling when resolved through an alias
        base_name: Option<String>,
    },
    Excluded {
        kind: BaseKind,
        reason: ExclusionReason,
    },
}

/// Resolve the bases of every non-excluded registered class (nested included),
/// in ingestion order.
pub fn resolve_class_bases(
    registry: &mut Registry,
    policy: &dyn ExclusionPolicy,
    diagnostics: &mut Diagnostics,
) -> BindResult<EdgeCounts> {
    let mut counts = EdgeCounts::default();
    let classes = registry.ordered_classes().to_vec();

    for id in classes {
        if registry.class(id).is_excluded {
            continue;
        }
        counts += resolve_edges(registry, policy, diagnostics, id, Dependent::Class, false)?;
    }

    Ok(counts)
}

/// Resolve the bases of every non-excluded template body and of the nested
/// classes inside it. Template parameters used as bases are accepted here.
pub fn resolve_template_bases(
    registry: &mut Registry,
    policy: &dyn ExclusionPolicy,
    diagnostics: &mut Diagnostics,
) -> BindResult<EdgeCounts> {
    let mut counts = EdgeCounts::default();

    for template_id in registry.template_ids() {
        if registry.template(template_id).is_excluded {
            continue;
        }

        let mut pending = vec![registry.template(template_id).body];
        while let Some(class_id) = pending.pop() {
            let class = registry.class(class_id);
            if class.is_excluded {
                continue;
            }
            // Reverse so nested classes are visited in declaration order
            pending.extend(class.nested_classes.iter().rev());

            counts += resolve_edges(
                registry,
                policy,
                diagnostics,
                class_id,
                Dependent::Template(template_id),
                true,
            )?;
        }
    }

    Ok(counts)
}

fn resolve_edges(
    registry: &mut Registry,
    policy: &dyn ExclusionPolicy,
    diagnostics: &mut Diagnostics,
    class_id: ClassId,
    dependent: Dependent,
    in_template: bool,
) -> BindResult<EdgeCounts> {
    let subject = registry.class(class_id).register_name.clone();
    let outcomes = registry
        .class(class_id)
        .bases
        .iter()
        .map(|base| resolve_edge(registry, policy, &subject, base, in_template))
        .collect::<BindResult<Vec<_>>>()?;

    let mut counts = EdgeCounts::default();

    for (index, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Outcome::Included {
                kind,
                target,
                base_name,
            } => {
                let base = &mut registry.class_mut(class_id).bases[index];
                base.kind = Some(kind);
                base.target = target;
                base.is_excluded = false;
                if let Some(name) = base_name {
                    base.parameters = template_arguments(&name);
                    base.base_name = name;
                }

                if let Some(EntityRef::Template(template_id)) = target {
                    let include = registry.template(template_id).source_name.clone();
                    registry.class_mut(class_id).extra_bases.insert(0, index);
                    let includes = match dependent {
                        Dependent::Class => &mut registry.class_mut(class_id).extra_includes,
                        Dependent::Template(owner) => &mut registry.template_mut(owner).extra_includes,
                    };
                    if !includes.contains(&include) {
                        includes.push(include);
                    }
                }
                counts.resolved += 1;
            }
            Outcome::Excluded { kind, reason } => {
                registry.class_mut(class_id).bases[index].kind = Some(kind);
                diagnostics.record(subject.clone(), reason);
                counts.excluded += 1;
            }
        }
    }

    Ok(counts)
}

/// Classify a base by the kind of the declaration it references.
pub fn classify(entity: &str, base: &BaseReference) -> BindResult<BaseKind> {
    let Some(kind) = base.referenced_kind else {
        return Ok(BaseKind::TemplateParameterPlaceholder);
    };

    match kind {
        DeclKind::ClassDecl | DeclKind::StructDecl if base.specialization.is_some() => {
            Ok(BaseKind::ThroughTemplateInstantiation)
        }
        DeclKind::ClassDecl | DeclKind::StructDecl => Ok(BaseKind::DirectClass),
        DeclKind::TypedefDecl => Ok(BaseKind::ThroughTypedef),
        DeclKind::ClassTemplate => Ok(BaseKind::ThroughTemplateInstantiation),
        other => Err(BindError::UnknownBaseKind {
            entity: entity.to_string(),
            base: base.base_name.clone(),
            kind: other.to_string(),
        }),
    }
}

fn resolve_edge(
    registry: &Registry,
    policy: &dyn ExclusionPolicy,
    entity: &str,
    base: &BaseReference,
    in_template: bool,
) -> BindResult<Outcome> {
    let kind = classify(entity, base)?;

    if kind == BaseKind::TemplateParameterPlaceholder {
        return Ok(if in_template {
            Outcome::Included {
                kind,
                target: None,
                base_name: None,
            }
        } else {
            Outcome::Excluded {
                kind,
                reason: ExclusionReason::PlaceholderOutsideTemplate {
                    base: base.base_name.clone(),
                },
            }
        });
    }

    if policy.is_excluded_base(&base.base_name) || policy.is_excluded_base(&base.referenced_name) {
        return Ok(Outcome::Excluded {
            kind,
            reason: ExclusionReason::ConfiguredBase {
                base: base.base_name.clone(),
            },
        });
    }

    let Some((target, base_name)) = lookup(registry, base) else {
        return Ok(Outcome::Excluded {
            kind,
            reason: ExclusionReason::UnresolvedBase {
                base: base.base_name.clone(),
            },
        });
    };

    if registry.is_excluded(target) {
        return Ok(Outcome::Excluded {
            kind,
            reason: ExclusionReason::ExcludedSuperclass {
                base: base.base_name.clone(),
            },
        });
    }

    Ok(Outcome::Included {
        kind,
        target: Some(target),
        base_name,
    })
}

/// Find the superclass of an edge. The second value replaces the emitted base
/// name when the edge goes through an alias typedef.
fn lookup(registry: &Registry, base: &BaseReference) -> Option<(EntityRef, Option<String>)> {
    let direct = match base.referenced_kind {
        Some(DeclKind::ClassDecl | DeclKind::StructDecl) => registry
            .find_class(&base.referenced_name)
            .map(|id| (EntityRef::Class(id), None)),
        Some(DeclKind::TypedefDecl) => registry.find_typedef(&base.referenced_name).map(|id| {
            let typedef = registry.typedef(id);
            match typedef.alias_of {
                Some(owner) if typedef.is_alias => {
                    (owner, Some(registry.entity_name(owner).to_string()))
                }
                _ => (EntityRef::Typedef(id), None),
            }
        }),
        _ => None,
    };

    direct.or_else(|| {
        let template = base.specialization.as_deref().unwrap_or(&base.referenced_name);
        if base.specialization.is_none() && !base.references_template() {
            return None;
        }
        registry
            .find_template(template)
            .map(|id| (EntityRef::Template(id), None))
    })
}
