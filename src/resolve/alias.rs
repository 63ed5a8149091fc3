//! Alias detection.
//!
//! Exactly one entity owns a canonical type. Classes claim theirs during
//! ingestion; typedefs are visited here in ingestion order and either claim an
//! unowned canonical type or become an alias of its owner. Owner selection is
//! first-writer-wins and therefore depends on ingestion order.

use crate::model::Registry;
use crate::types::EntityRef;

/// Mark alias typedefs. Returns the number of aliases.
///
/// Running the pass again yields the same result: a typedef that owns its
/// canonical type is never an alias of itself.
pub fn detect_aliases(registry: &mut Registry) -> usize {
    let mut aliases = 0;

    for id in registry.typedef_ids() {
        let canonical = registry.typedef(id).canonical_type.clone();
        let this = EntityRef::Typedef(id);
        let owner = registry.claim_canonical(&canonical, this);

        let typedef = registry.typedef_mut(id);
        if owner == this {
            typedef.is_alias = false;
            typedef.alias_of = None;
            continue;
        }

        typedef.is_alias = true;
        typedef.alias_of = Some(owner);
        aliases += 1;

        tracing::info!(
            "Alias: {} --> {}",
            registry.typedef(id).register_name,
            registry.entity_name(owner)
        );
    }

    aliases
}
