//! Ingestion and partitioning of declaration cursors.
//!
//! Consumes a [`DeclSource`] once, wraps every bindable top-level declaration
//! into a model entity, assigns it to the module derived from its header and
//! registers it. Nothing is resolved here: base references are recorded as the
//! front end reported them and stay excluded until base resolution.

use crate::frontend::{BaseSpecifier, DeclSource, Declaration};
use crate::model::{
    BaseReference, ClassEntity, ConstructorEntity, EnumConstantEntity, EnumEntity, FunctionEntity,
    MethodEntity, ParameterEntity, Registry, TemplateEntity, TemplateParent, TypedefEntity,
    module_name_for_header, sanitize_name, template_arguments,
};
use crate::policy::ExclusionPolicy;
use crate::resolve::{Diagnostics, ExclusionReason};
use crate::types::{ClassId, DeclKind, EntityRef, OwnershipKind, TemplateId, TypeRef};
use serde::Serialize;

/// Counters reported after ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    pub declarations: usize,
    pub skipped: usize,
    pub duplicates: usize,
    pub enums: usize,
    pub functions: usize,
    pub classes: usize,
    pub templates: usize,
    pub typedefs: usize,
}

/// Ingest every declaration of `source` into `registry`.
pub fn ingest<S: DeclSource>(
    source: S,
    policy: &dyn ExclusionPolicy,
    registry: &mut Registry,
    diagnostics: &mut Diagnostics,
) -> IngestStats {
    let mut ingestor = Ingestor {
        policy,
        registry,
        diagnostics,
        stats: IngestStats::default(),
    };

    for decl in source.into_declarations() {
        ingestor.stats.declarations += 1;
        ingestor.ingest_declaration(decl);
    }

    let stats = ingestor.stats;
    tracing::info!(
        "Ingested {} declarations: {} classes, {} templates, {} typedefs, {} enums, {} functions ({} skipped, {} duplicates)",
        stats.declarations,
        stats.classes,
        stats.templates,
        stats.typedefs,
        stats.enums,
        stats.functions,
        stats.skipped,
        stats.duplicates
    );
    stats
}

struct Ingestor<'a> {
    policy: &'a dyn ExclusionPolicy,
    registry: &'a mut Registry,
    diagnostics: &'a mut Diagnostics,
    stats: IngestStats,
}

/// Docs are emitted inside raw string literals with double quotes elsewhere
fn clean_docs(docs: Option<&str>) -> String {
    docs.map(|d| d.replace('"', "'")).unwrap_or_default()
}

impl Ingestor<'_> {
    fn ingest_declaration(&mut self, decl: Declaration) {
        if !matches!(
            decl.kind,
            DeclKind::EnumDecl
                | DeclKind::FunctionDecl
                | DeclKind::ClassDecl
                | DeclKind::StructDecl
                | DeclKind::TypedefDecl
                | DeclKind::ClassTemplate
        ) {
            self.stats.skipped += 1;
            return;
        }

        if !decl.is_definition {
            self.stats.skipped += 1;
            return;
        }

        let header = match decl.header.as_deref() {
            Some(header) if self.policy.is_available_header(header) => header.to_string(),
            _ => {
                self.stats.skipped += 1;
                return;
            }
        };

        let module = module_name_for_header(&header);
        if self.policy.is_excluded_module(&module) {
            tracing::debug!("Skipping {} in excluded module {module}", decl.name());
            self.stats.skipped += 1;
            return;
        }

        match decl.kind {
            DeclKind::EnumDecl => self.ingest_enum(&decl, &module, &header),
            DeclKind::FunctionDecl => self.ingest_function(&decl, &module, &header),
            DeclKind::ClassDecl | DeclKind::StructDecl => {
                self.ingest_class(&decl, &module, &header)
            }
            DeclKind::TypedefDecl => self.ingest_typedef(&decl, &module, &header),
            DeclKind::ClassTemplate => self.ingest_template(&decl, &module, &header),
            _ => {}
        }
    }

    fn ingest_enum(&mut self, decl: &Declaration, module: &str, header: &str) {
        let entity = wrap_enum(decl, module, header, "mod", None);
        let target = self.registry.module_mut(module);
        target.add_header(header);
        target.enums.push(entity);
        self.stats.enums += 1;
    }

    fn ingest_function(&mut self, decl: &Declaration, module: &str, header: &str) {
        let mut function = FunctionEntity {
            register_name: decl.name().to_string(),
            python_name: decl.spelling.clone(),
            header: header.to_string(),
            module: module.to_string(),
            result_name: decl.result_type.clone().unwrap_or_else(|| "void".to_string()),
            parameters: wrap_parameters(decl),
            docs: clean_docs(decl.docs.as_deref()),
            is_excluded: false,
        };

        if decl.spelling.starts_with("operator") {
            function.is_excluded = true;
            self.diagnostics
                .record(&function.register_name, ExclusionReason::OperatorFunction);
        } else if self
            .policy
            .is_excluded_function(module, &function.register_name)
        {
            function.is_excluded = true;
            self.diagnostics
                .record(&function.register_name, ExclusionReason::Configured);
        }

        let target = self.registry.module_mut(module);
        target.add_header(header);
        target.functions.push(function);
        self.stats.functions += 1;
    }

    fn ingest_class(&mut self, decl: &Declaration, module: &str, header: &str) {
        let id = self.wrap_class(decl, module, header, false, None);
        if !self.registry.register_class(id) {
            tracing::debug!("Duplicate class definition skipped: {}", decl.type_name());
            self.stats.duplicates += 1;
            return;
        }
        self.claim_class_canonical(id);
        self.register_nested(id);

        self.registry.module_mut(module).add_header(header);
        self.registry.push_type(module, TypeRef::Class(id));
        self.stats.classes += 1;
    }

    /// Register the nested classes of a (non template) class, recursively
    fn register_nested(&mut self, id: ClassId) {
        let nested = self.registry.class(id).nested_classes.clone();
        for nested_id in nested {
            if !self.registry.register_class(nested_id) {
                tracing::debug!(
                    "Duplicate nested class skipped: {}",
                    self.registry.class(nested_id).register_name
                );
                self.stats.duplicates += 1;
                continue;
            }
            self.claim_class_canonical(nested_id);
            self.register_nested(nested_id);
        }
    }

    fn claim_class_canonical(&mut self, id: ClassId) {
        let canonical = self.registry.class(id).canonical_type.clone();
        if !canonical.is_empty() {
            self.registry.claim_canonical(&canonical, EntityRef::Class(id));
        }
    }

    fn ingest_typedef(&mut self, decl: &Declaration, module: &str, header: &str) {
        let register_name = decl.type_name().to_string();
        let canonical_type = decl.canonical().to_string();
        let parameters = if decl.specialization.is_some() {
            template_arguments(&canonical_type)
        } else {
            String::new()
        };

        let mut typedef = TypedefEntity {
            python_name: sanitize_name(&register_name),
            register_name,
            header: header.to_string(),
            module: module.to_string(),
            canonical_type,
            docs: clean_docs(decl.docs.as_deref()),
            underlying_template: decl.specialization.clone(),
            parameters,
            template: None,
            function_name: String::new(),
            bases: decl.bases.iter().map(wrap_base).collect(),
            is_alias: false,
            alias_of: None,
            is_excluded: false,
            extra_includes: Vec::new(),
        };

        if self.policy.is_excluded_typedef(module, &typedef.register_name) {
            typedef.is_excluded = true;
            self.diagnostics
                .record(&typedef.register_name, ExclusionReason::Configured);
        }

        let name = typedef.register_name.clone();
        let Some(id) = self.registry.add_typedef(typedef) else {
            tracing::debug!("Duplicate typedef skipped: {name}");
            self.stats.duplicates += 1;
            return;
        };

        self.registry.module_mut(module).add_header(header);
        self.registry.push_type(module, TypeRef::Typedef(id));
        self.stats.typedefs += 1;
    }

    fn ingest_template(&mut self, decl: &Declaration, module: &str, header: &str) {
        if self.wrap_template(decl, module, header, None).is_none() {
            self.stats.duplicates += 1;
        }
    }

    /// Wrap a class or struct. Template bodies (and their nested classes) are
    /// added to the arena but never registered under their name.
    fn wrap_class(
        &mut self,
        decl: &Declaration,
        module: &str,
        header: &str,
        is_template_body: bool,
        parent: Option<(ClassId, &str)>,
    ) -> ClassId {
        let (register_name, python_name, canonical_type) = if is_template_body {
            (
                decl.name().to_string(),
                sanitize_name(&decl.qualified_spelling()),
                String::new(),
            )
        } else {
            (
                decl.type_name().to_string(),
                sanitize_name(decl.type_name()),
                decl.canonical().to_string(),
            )
        };
        let object_name = format!("cls_{python_name}");
        // Nested classes are attributes of their parent, so the plain spelling suffices
        let python_name = match parent {
            Some(_) => decl.spelling.clone(),
            None => python_name,
        };

        let mut class = ClassEntity {
            object_name,
            register_name,
            python_name,
            canonical_type,
            header: header.to_string(),
            module: module.to_string(),
            container: parent
                .map(|(_, object)| object.to_string())
                .unwrap_or_else(|| "mod".to_string()),
            docs: clean_docs(decl.docs.as_deref()),
            bases: Vec::new(),
            extra_bases: Vec::new(),
            nested_classes: Vec::new(),
            nested_enums: Vec::new(),
            nested_templates: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
            pure_virtuals: Vec::new(),
            ownership: OwnershipKind::Shared,
            parent: parent.map(|(id, _)| id),
            template: None,
            is_template: is_template_body,
            is_nested: parent.is_some(),
            is_abstract: false,
            has_hidden_destructor: false,
            is_excluded: false,
            extra_includes: Vec::new(),
        };

        if self.policy.is_excluded_class(module, &class.register_name) {
            class.is_excluded = true;
            self.diagnostics
                .record(&class.register_name, ExclusionReason::Configured);
        }

        for child in &decl.children {
            if child.kind == DeclKind::Destructor && !child.access.is_public() {
                class.has_hidden_destructor = true;
            }
        }
        if class.has_hidden_destructor {
            class.ownership = OwnershipKind::NoDelete;
        }

        class.bases = decl
            .bases
            .iter()
            .filter(|b| b.access.is_public())
            .map(wrap_base)
            .collect();

        for child in decl.children.iter().filter(|c| c.access.is_public()) {
            match child.kind {
                DeclKind::EnumDecl => {
                    let scope = class.register_name.clone();
                    class.nested_enums.push(wrap_enum(
                        child,
                        module,
                        header,
                        &class.object_name,
                        Some(&scope),
                    ));
                }
                DeclKind::Method => {
                    let method = self.wrap_method(&class.register_name, child);
                    if method.is_pure_virtual {
                        class.is_abstract = true;
                        class.pure_virtuals.push(method.python_name.clone());
                    }
                    class.methods.push(method);
                }
                DeclKind::Constructor => {
                    let ctor = self.wrap_constructor(&class.register_name, child);
                    class.constructors.push(ctor);
                }
                _ => {}
            }
        }

        let object_name = class.object_name.clone();
        let id = self.registry.add_class(class);

        for child in decl.children.iter().filter(|c| c.access.is_public()) {
            if child.kind.is_record() && child.is_definition {
                let nested =
                    self.wrap_class(child, module, header, is_template_body, Some((id, &object_name)));
                self.registry.class_mut(id).nested_classes.push(nested);
            } else if child.kind == DeclKind::ClassTemplate
                && child.is_definition
                && !is_template_body
            {
                if let Some(nested) =
                    self.wrap_template(child, module, header, Some(TemplateParent::Class(id)))
                {
                    self.registry.class_mut(id).nested_templates.push(nested);
                }
            }
        }

        id
    }

    /// Wrap and register a class template. Returns `None` for duplicates.
    fn wrap_template(
        &mut self,
        decl: &Declaration,
        module: &str,
        header: &str,
        parent: Option<TemplateParent>,
    ) -> Option<TemplateId> {
        let body = self.wrap_class(decl, module, header, true, None);
        let body_python = self.registry.class(body).python_name.clone();

        let function_name = match parent {
            None => format!("bind_{}", sanitize_name(&decl.spelling)),
            Some(_) => format!("bind_{body_python}"),
        };
        let source_name = match parent {
            Some(TemplateParent::Template(parent_id)) => {
                self.registry.template(parent_id).source_name.clone()
            }
            _ => format!("{function_name}.hxx"),
        };

        let template = TemplateEntity {
            register_name: decl.name().to_string(),
            function_name,
            source_name,
            header: header.to_string(),
            module: module.to_string(),
            parameters: decl.template_parameters.clone(),
            body,
            nested_templates: Vec::new(),
            parent,
            is_nested: parent.is_some(),
            is_excluded: self.registry.class(body).is_excluded,
            extra_includes: Vec::new(),
        };

        let id = self.registry.add_template(template);
        self.registry.class_mut(body).template = Some(id);

        if !self.registry.register_template(id) {
            tracing::debug!("Duplicate class template skipped: {}", decl.name());
            return None;
        }
        self.stats.templates += 1;

        for child in decl.children.iter().filter(|c| c.access.is_public()) {
            if child.kind == DeclKind::ClassTemplate && child.is_definition {
                if let Some(nested) =
                    self.wrap_template(child, module, header, Some(TemplateParent::Template(id)))
                {
                    self.registry.template_mut(id).nested_templates.push(nested);
                }
            }
        }

        Some(id)
    }

    fn wrap_method(&mut self, class: &str, decl: &Declaration) -> MethodEntity {
        let mut method = MethodEntity {
            register_name: format!("{class}::{}", decl.spelling),
            python_name: decl.spelling.clone(),
            result_name: decl.result_type.clone().unwrap_or_else(|| "void".to_string()),
            parameters: wrap_parameters(decl),
            is_static: decl.is_static,
            is_const: decl.is_const,
            is_virtual: decl.is_virtual,
            is_pure_virtual: decl.is_pure_virtual,
            docs: clean_docs(decl.docs.as_deref()),
            is_excluded: false,
        };

        if decl.spelling.starts_with("operator") {
            method.is_excluded = true;
        } else if self.policy.is_excluded_method(class, &decl.spelling) {
            method.is_excluded = true;
            self.diagnostics
                .record(&method.register_name, ExclusionReason::Configured);
        }

        method
    }

    fn wrap_constructor(&mut self, class: &str, decl: &Declaration) -> ConstructorEntity {
        let parameters = wrap_parameters(decl);
        let signature = parameters
            .iter()
            .map(|p| p.type_name.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let is_excluded = self.policy.is_excluded_constructor(class, &signature);
        if is_excluded {
            self.diagnostics
                .record(format!("{class}({signature})"), ExclusionReason::Configured);
        }

        ConstructorEntity {
            spelling: decl.spelling.clone(),
            parameters,
            docs: clean_docs(decl.docs.as_deref()),
            is_excluded,
        }
    }
}

fn wrap_parameters(decl: &Declaration) -> Vec<ParameterEntity> {
    decl.children
        .iter()
        .filter(|c| c.kind == DeclKind::Parameter)
        .map(|p| ParameterEntity {
            type_name: p.type_name().to_string(),
            name: p.spelling.clone(),
            default_value: p.default_value.clone(),
        })
        .collect()
}

/// Wrap an enum. `scope` is the enclosing class for nested enums.
fn wrap_enum(
    decl: &Declaration,
    module: &str,
    header: &str,
    container: &str,
    scope: Option<&str>,
) -> EnumEntity {
    let register_name = decl.type_name().to_string();
    let python_name = match scope {
        Some(_) => decl.spelling.clone(),
        None => sanitize_name(&register_name),
    };

    // Constants of anonymous enums live in the enclosing scope
    let prefix = if decl.is_anonymous {
        scope.unwrap_or("").to_string()
    } else {
        register_name.clone()
    };

    let constants = decl
        .children
        .iter()
        .filter(|c| c.kind == DeclKind::EnumConstant)
        .map(|c| EnumConstantEntity {
            register_name: format!("{prefix}::{}", c.spelling),
            python_name: c.spelling.clone(),
        })
        .collect();

    EnumEntity {
        register_name,
        python_name,
        header: header.to_string(),
        module: module.to_string(),
        container: container.to_string(),
        docs: clean_docs(decl.docs.as_deref()),
        constants,
        is_anonymous: decl.is_anonymous,
        is_nested: scope.is_some(),
        is_excluded: false,
    }
}

/// Record a base specifier as reported. Placeholders have no referenced
/// declaration; their name is the spelled type.
fn wrap_base(spec: &BaseSpecifier) -> BaseReference {
    let Some(referenced) = spec.referenced.as_ref() else {
        return BaseReference {
            referenced_name: spec.type_spelling.clone(),
            base_name: spec.type_spelling.clone(),
            referenced_kind: None,
            specialization: None,
            parameters: String::new(),
            declared_bases: Vec::new(),
            kind: None,
            target: None,
            is_excluded: true,
        };
    };

    let base_name = if referenced.kind == DeclKind::ClassTemplate || referenced.type_spelling.is_empty()
    {
        spec.type_spelling.clone()
    } else {
        referenced.type_spelling.clone()
    };

    BaseReference {
        referenced_name: referenced.qualified_name.clone(),
        parameters: template_arguments(&base_name),
        base_name,
        referenced_kind: Some(referenced.kind),
        specialization: referenced.specialization.clone(),
        declared_bases: referenced
            .bases
            .iter()
            .filter(|b| b.access.is_public())
            .map(wrap_base)
            .collect(),
        kind: None,
        target: None,
        is_excluded: true,
    }
}
