//! Template linkage: bind non-alias typedefs to the class template they
//! instantiate.

use super::{Diagnostics, ExclusionReason};
use crate::model::Registry;

/// Link every bindable typedef to its template registration function.
/// Returns the number of linked typedefs.
///
/// Aliases are skipped: they are emitted as attribute assignments and need
/// no registration function of their own.
pub fn link_templates(registry: &mut Registry, diagnostics: &mut Diagnostics) -> usize {
    let mut linked = 0;

    for id in registry.typedef_ids() {
        let typedef = registry.typedef(id);
        if typedef.is_excluded || typedef.is_alias {
            continue;
        }

        let Some(template_name) = typedef.underlying_template.clone() else {
            let subject = typedef.register_name.clone();
            registry.typedef_mut(id).is_excluded = true;
            diagnostics.record(subject, ExclusionReason::UnsupportedType);
            continue;
        };

        let template = registry
            .find_template(&template_name)
            .filter(|&t| !registry.template(t).is_excluded);

        match template {
            Some(template_id) => {
                let template = registry.template(template_id);
                let function_name = template.function_name.clone();
                let source_name = template.source_name.clone();

                let typedef = registry.typedef_mut(id);
                typedef.template = Some(template_id);
                typedef.function_name = function_name;
                typedef.extra_includes.push(source_name);
                linked += 1;
            }
            None => {
                let subject = registry.typedef(id).register_name.clone();
                registry.typedef_mut(id).is_excluded = true;
                diagnostics.record(
                    subject,
                    ExclusionReason::TemplateUnavailable {
                        template: template_name,
                    },
                );
            }
        }
    }

    linked
}
