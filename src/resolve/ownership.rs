//! Ownership (holder) classification.

use crate::model::Registry;
use crate::types::{ClassId, OwnershipKind};

/// Assign an ownership kind to every top-level class and template body and
/// push it down to their nested classes and nested template bodies.
/// Returns the number of top-level entities that got handle ownership.
pub fn assign_ownership(registry: &mut Registry, handle_root: &str) -> usize {
    let mut handles = 0;

    let top_level: Vec<ClassId> = registry
        .ordered_classes()
        .iter()
        .copied()
        .filter(|&id| registry.class(id).parent.is_none())
        .collect();

    let template_bodies: Vec<ClassId> = registry
        .template_ids()
        .into_iter()
        .filter(|&id| registry.template(id).parent.is_none())
        .map(|id| registry.template(id).body)
        .collect();

    for id in top_level.into_iter().chain(template_bodies) {
        let kind = classify(registry, id, handle_root);
        if kind == OwnershipKind::Handle {
            handles += 1;
        }
        propagate(registry, id, kind);
    }

    handles
}

fn classify(registry: &Registry, id: ClassId, handle_root: &str) -> OwnershipKind {
    let class = registry.class(id);
    if registry.is_derived_from(id, handle_root) {
        OwnershipKind::Handle
    } else if class.has_hidden_destructor {
        OwnershipKind::NoDelete
    } else {
        OwnershipKind::Shared
    }
}

/// Set `kind` on a class, its nested classes and its nested template bodies
fn propagate(registry: &mut Registry, root: ClassId, kind: OwnershipKind) {
    let mut pending = vec![root];

    while let Some(id) = pending.pop() {
        let class = registry.class_mut(id);
        class.ownership = kind;
        pending.extend(class.nested_classes.iter().copied());

        let mut templates = class.nested_templates.clone();
        if let Some(template) = class.template {
            templates.extend(registry.template(template).nested_templates.iter().copied());
        }
        pending.extend(templates.into_iter().map(|t| registry.template(t).body));
    }
}
