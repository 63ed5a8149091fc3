//! Registration planning.
//!
//! Turns a resolved [`Registry`] into the read-only [`BindingPlan`] the
//! emitter consumes. The plan fixes the registration order of everything
//! that will be bound:
//!
//! - templates are ordered so a template comes after the templates its body
//!   registers as extra bases
//! - top-level types keep ingestion order except that a type comes after its
//!   bases, and a typedef binding an instantiation comes before every class
//!   that reaches the same instantiation as an extra base
//! - each template instantiation is registered at most once; later reachers
//!   take the guarded path that returns early when the type is already bound

mod order;

pub use order::{Ordering, stable_topological};

use crate::error::{BindError, BindResult};
use crate::model::{
    BaseReference, ClassEntity, ConstructorEntity, EnumEntity, FunctionEntity, MethodEntity,
    Registry, TemplateParent,
};
use crate::policy::ExclusionPolicy;
use crate::types::{ClassId, EntityRef, OwnershipKind, TemplateId, TypeRef, TypedefId};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Identity of a template instantiation: registration function plus the
/// argument list with all whitespace removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct InstantiationKey {
    pub function_name: String,
    pub parameters: String,
}

impl InstantiationKey {
    pub fn new(function_name: &str, parameters: &str) -> Self {
        Self {
            function_name: function_name.to_string(),
            parameters: parameters.chars().filter(|c| !c.is_whitespace()).collect(),
        }
    }
}

/// Name passed to a template registration function for an extra base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum NameArgument {
    /// Forward the enclosing registration function's `name` argument
    Forward,
    /// Literal Python name of the dependent
    Literal(String),
}

/// How an extra base call registers its instantiation.
///
/// Both modes emit the same guarded call (`is_base = true`); the registration
/// function itself returns early once the type is bound. The mode only picks
/// the comment written above the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationMode {
    /// First reacher: this call binds the instantiation
    Register,
    /// The instantiation is bound elsewhere; the call returns early when the
    /// type is already registered
    SkipIfBound,
}

/// Call of a template registration function that must run before the
/// dependent class is registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtraBaseCall {
    /// Base as spelled, `NCollection_List<TopoDS_Shape>`
    pub base: String,
    pub template: String,
    pub function_name: String,
    /// `<...>` argument list
    pub parameters: String,
    pub name: NameArgument,
    pub mode: RegistrationMode,
}

impl ExtraBaseCall {
    pub fn key(&self) -> InstantiationKey {
        InstantiationKey::new(&self.function_name, &self.parameters)
    }
}

/// A class registration, also used for template bodies.
#[derive(Debug, Clone, Serialize)]
pub struct ClassPlan {
    pub register_name: String,
    pub python_name: String,
    pub object_name: String,
    pub header: String,
    pub module: String,
    pub container: String,
    pub docs: String,
    pub ownership: OwnershipKind,
    /// Resolved base spellings in declaration order
    pub bases: Vec<String>,
    pub extra_bases: Vec<ExtraBaseCall>,
    /// Empty for abstract classes
    pub constructors: Vec<ConstructorEntity>,
    pub methods: Vec<MethodEntity>,
    pub enums: Vec<EnumEntity>,
    pub nested_classes: Vec<ClassPlan>,
    pub before: Vec<String>,
    pub after: Vec<String>,
    pub extra_includes: Vec<String>,
    pub is_template: bool,
    pub is_nested: bool,
    pub is_abstract: bool,
}

impl ClassPlan {
    /// Extra includes of this class and all its nested classes
    pub fn all_extra_includes(&self) -> Vec<&str> {
        let mut includes: Vec<&str> = self.extra_includes.iter().map(String::as_str).collect();
        for nested in &self.nested_classes {
            includes.extend(nested.all_extra_includes());
        }
        includes
    }

    /// Every extra base call of this class and its nested classes
    pub fn all_extra_bases(&self) -> Vec<&ExtraBaseCall> {
        let mut calls: Vec<&ExtraBaseCall> = self.extra_bases.iter().collect();
        for nested in &self.nested_classes {
            calls.extend(nested.all_extra_bases());
        }
        calls
    }
}

/// A class template registration function and its source unit.
#[derive(Debug, Clone, Serialize)]
pub struct TemplatePlan {
    pub register_name: String,
    pub function_name: String,
    pub source_name: String,
    pub header: String,
    pub module: String,
    /// Parameter tokens of the enclosing templates followed by this one's
    pub parameters: Vec<String>,
    pub body: ClassPlan,
    /// Templates nested in this one, emitted into the same unit
    pub nested_templates: Vec<TemplatePlan>,
    pub extra_includes: Vec<String>,
}

/// A typedef bound by calling its template registration function.
#[derive(Debug, Clone, Serialize)]
pub struct TypedefPlan {
    pub register_name: String,
    pub python_name: String,
    pub header: String,
    pub module: String,
    pub template: String,
    pub function_name: String,
    pub parameters: String,
    pub extra_includes: Vec<String>,
}

impl TypedefPlan {
    pub fn key(&self) -> InstantiationKey {
        InstantiationKey::new(&self.function_name, &self.parameters)
    }
}

/// A top-level type in registration order.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypePlan {
    Class(ClassPlan),
    Typedef(TypedefPlan),
}

impl TypePlan {
    pub fn register_name(&self) -> &str {
        match self {
            Self::Class(class) => &class.register_name,
            Self::Typedef(typedef) => &typedef.register_name,
        }
    }

    pub fn python_name(&self) -> &str {
        match self {
            Self::Class(class) => &class.python_name,
            Self::Typedef(typedef) => &typedef.python_name,
        }
    }

    pub fn module(&self) -> &str {
        match self {
            Self::Class(class) => &class.module,
            Self::Typedef(typedef) => &typedef.module,
        }
    }

    pub fn header(&self) -> &str {
        match self {
            Self::Class(class) => &class.header,
            Self::Typedef(typedef) => &typedef.header,
        }
    }

    /// Name of the generated registration function
    pub fn bind_function(&self) -> String {
        format!("bind_{}", self.python_name())
    }

    pub fn extra_includes(&self) -> Vec<&str> {
        match self {
            Self::Class(class) => class.all_extra_includes(),
            Self::Typedef(typedef) => typedef.extra_includes.iter().map(String::as_str).collect(),
        }
    }
}

/// Content of one module unit.
#[derive(Debug, Clone, Serialize)]
pub struct ModulePlan {
    pub name: String,
    /// Headers of the module content, first-seen order
    pub headers: Vec<String>,
    /// Configured extra headers
    pub extra_headers: Vec<String>,
    /// Template units and other includes required by the module's types, sorted
    pub extra_includes: Vec<String>,
    pub enums: Vec<EnumEntity>,
    /// Sorted by register name
    pub functions: Vec<FunctionEntity>,
    /// Register names of the module's types in registration order
    pub types: Vec<String>,
}

/// Alias typedef exposed as a second name of its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AliasPlan {
    pub register_name: String,
    pub module: String,
    pub python_name: String,
    pub owner: String,
    pub owner_module: String,
    /// Attribute path of the owner inside its module
    pub owner_path: Vec<String>,
}

/// Everything the emitter needs, in registration order.
#[derive(Debug, Clone, Serialize)]
pub struct BindingPlan {
    pub root_module: String,
    pub modules: Vec<ModulePlan>,
    pub templates: Vec<TemplatePlan>,
    pub types: Vec<TypePlan>,
    pub aliases: Vec<AliasPlan>,
}

impl BindingPlan {
    pub fn module(&self, name: &str) -> Option<&ModulePlan> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// Types of one module in registration order
    pub fn module_types<'a>(&'a self, module: &'a str) -> impl Iterator<Item = &'a TypePlan> {
        self.types.iter().filter(move |t| t.module() == module)
    }

    pub fn type_position(&self, register_name: &str) -> Option<usize> {
        self.types.iter().position(|t| t.register_name() == register_name)
    }
}

/// Build the binding plan of a resolved registry.
pub fn plan(
    registry: &Registry,
    policy: &dyn ExclusionPolicy,
    root_module: &str,
) -> BindResult<BindingPlan> {
    let planner = Planner::new(registry, policy);

    let templates = planner.plan_templates()?;

    let order = planner.order_types();
    let mut types = order
        .iter()
        .map(|&ty| planner.plan_type(ty))
        .collect::<BindResult<Vec<_>>>()?;
    assign_registration_modes(&mut types);

    let modules = planner.plan_modules(&types);
    let aliases = planner.plan_aliases();

    Ok(BindingPlan {
        root_module: root_module.to_string(),
        modules,
        templates,
        types,
        aliases,
    })
}

/// The first reacher of an instantiation registers it. Typedef bindings own
/// their instantiation, so every class reaching it takes the guarded path.
fn assign_registration_modes(types: &mut [TypePlan]) {
    let mut bound: HashSet<InstantiationKey> = types
        .iter()
        .filter_map(|ty| match ty {
            TypePlan::Typedef(typedef) => Some(typedef.key()),
            TypePlan::Class(_) => None,
        })
        .collect();

    for ty in types.iter_mut() {
        if let TypePlan::Class(class) = ty {
            mark_extra_bases(class, &mut bound);
        }
    }
}

fn mark_extra_bases(class: &mut ClassPlan, bound: &mut HashSet<InstantiationKey>) {
    for call in &mut class.extra_bases {
        call.mode = if bound.insert(call.key()) {
            RegistrationMode::Register
        } else {
            RegistrationMode::SkipIfBound
        };
    }
    for nested in &mut class.nested_classes {
        mark_extra_bases(nested, bound);
    }
}

/// Whether `parameters` is a well-formed `<...>` list without empty arguments
fn is_valid_argument_list(parameters: &str) -> bool {
    let trimmed = parameters.trim();
    let Some(inner) = trimmed
        .strip_prefix('<')
        .and_then(|rest| rest.strip_suffix('>'))
    else {
        return false;
    };

    let mut depth = 0i32;
    let mut current = String::new();
    let mut arguments = Vec::new();
    for c in inner.chars() {
        match c {
            '<' | '(' => depth += 1,
            '>' | ')' => depth -= 1,
            ',' if depth == 0 => {
                arguments.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        if depth < 0 {
            return false;
        }
        current.push(c);
    }
    arguments.push(current);

    depth == 0 && arguments.iter().all(|a| !a.trim().is_empty())
}

struct Planner<'a> {
    registry: &'a Registry,
    policy: &'a dyn ExclusionPolicy,
    /// Instantiations bound by typedefs, first typedef wins
    typedef_instantiations: HashMap<InstantiationKey, TypedefId>,
}

impl<'a> Planner<'a> {
    fn new(registry: &'a Registry, policy: &'a dyn ExclusionPolicy) -> Self {
        let mut typedef_instantiations = HashMap::new();
        for &ty in registry.ordered_types() {
            if let TypeRef::Typedef(id) = ty {
                if is_bindable_typedef(registry, id) {
                    let typedef = registry.typedef(id);
                    typedef_instantiations
                        .entry(InstantiationKey::new(&typedef.function_name, &typedef.parameters))
                        .or_insert(id);
                }
            }
        }

        Self {
            registry,
            policy,
            typedef_instantiations,
        }
    }

    // Templates

    /// Templates with their own source unit: top-level ones and those nested
    /// in a bound class
    fn emitted_templates(&self) -> Vec<TemplateId> {
        self.registry
            .template_ids()
            .into_iter()
            .filter(|&id| {
                let template = self.registry.template(id);
                if template.is_excluded {
                    return false;
                }
                match template.parent {
                    None => true,
                    Some(TemplateParent::Class(class)) => self.is_bound_class(class),
                    Some(TemplateParent::Template(_)) => false,
                }
            })
            .collect()
    }

    fn plan_templates(&self) -> BindResult<Vec<TemplatePlan>> {
        let templates = self.emitted_templates();

        let ordering = stable_topological(&templates, |id| {
            self.template_dependencies(id)
                .into_iter()
                .map(|dep| self.emitted_root(dep))
                .collect()
        });
        for (dependent, dependency) in &ordering.broken {
            tracing::warn!(
                "Template base cycle between {} and {}, keeping declaration order",
                self.registry.template(*dependent).register_name,
                self.registry.template(*dependency).register_name
            );
        }

        ordering
            .order
            .into_iter()
            .map(|id| self.plan_template(id, &[]))
            .collect()
    }

    /// Templates reached as extra bases anywhere inside a template
    fn template_dependencies(&self, id: TemplateId) -> Vec<TemplateId> {
        let mut dependencies = Vec::new();
        let mut pending_templates = vec![id];

        while let Some(template_id) = pending_templates.pop() {
            let template = self.registry.template(template_id);
            pending_templates.extend(template.nested_templates.iter().copied());

            let mut pending_classes = vec![template.body];
            while let Some(class_id) = pending_classes.pop() {
                let class = self.registry.class(class_id);
                pending_classes.extend(class.nested_classes.iter().copied());
                for base in class.extra_base_refs().filter(|b| !b.is_excluded) {
                    if let Some(EntityRef::Template(target)) = base.target {
                        dependencies.push(target);
                    }
                }
            }
        }

        dependencies
    }

    /// The template owning the source unit a (possibly nested) template is emitted in
    fn emitted_root(&self, mut id: TemplateId) -> TemplateId {
        let mut seen = HashSet::new();
        while let Some(TemplateParent::Template(parent)) = self.registry.template(id).parent {
            if !seen.insert(parent) {
                break;
            }
            id = parent;
        }
        id
    }

    fn plan_template(&self, id: TemplateId, inherited: &[String]) -> BindResult<TemplatePlan> {
        let template = self.registry.template(id);

        if let Some(token) = template.parameters.iter().find(|p| p.trim().is_empty()) {
            tracing::error!("Empty parameter token '{token}' in {}", template.register_name);
            return Err(BindError::EmptyTemplateParameter {
                entity: template.register_name.clone(),
                template: template.register_name.clone(),
            });
        }

        let mut parameters = inherited.to_vec();
        parameters.extend(template.parameters.iter().cloned());

        let body = self.plan_class(template.body, true)?;

        let nested_templates = template
            .nested_templates
            .iter()
            .filter(|&&nested| !self.registry.template(nested).is_excluded)
            .map(|&nested| self.plan_template(nested, &parameters))
            .collect::<BindResult<Vec<_>>>()?;

        Ok(TemplatePlan {
            register_name: template.register_name.clone(),
            function_name: template.function_name.clone(),
            source_name: template.source_name.clone(),
            header: template.header.clone(),
            module: template.module.clone(),
            parameters,
            body,
            nested_templates,
            extra_includes: template.extra_includes.clone(),
        })
    }

    // Types

    fn bindable_types(&self) -> Vec<TypeRef> {
        self.registry
            .ordered_types()
            .iter()
            .copied()
            .filter(|&ty| match ty {
                TypeRef::Class(id) => {
                    let class = self.registry.class(id);
                    !class.is_excluded && !class.is_template && class.parent.is_none()
                }
                TypeRef::Typedef(id) => is_bindable_typedef(self.registry, id),
            })
            .collect()
    }

    fn order_types(&self) -> Vec<TypeRef> {
        let types = self.bindable_types();
        let ordering = stable_topological(&types, |ty| self.type_dependencies(ty));

        for (dependent, dependency) in &ordering.broken {
            tracing::warn!(
                "Base cycle between {} and {}, keeping ingestion order",
                self.registry.entity_name((*dependent).into()),
                self.registry.entity_name((*dependency).into())
            );
        }

        ordering.order
    }

    /// Types that must be registered before `ty`
    fn type_dependencies(&self, ty: TypeRef) -> Vec<TypeRef> {
        let root = match ty {
            TypeRef::Class(id) => id,
            TypeRef::Typedef(id) => match self.registry.typedef(id).template {
                Some(template) => self.registry.template(template).body,
                None => return Vec::new(),
            },
        };

        let mut dependencies = Vec::new();
        let mut pending = vec![root];
        while let Some(class_id) = pending.pop() {
            let class = self.registry.class(class_id);
            if class.is_excluded {
                continue;
            }
            pending.extend(class.nested_classes.iter().copied());

            for base in class.resolved_bases() {
                match base.target {
                    Some(EntityRef::Class(target)) => {
                        dependencies.push(TypeRef::Class(self.registry.outermost_class(target)));
                    }
                    Some(EntityRef::Typedef(target)) => dependencies.push(TypeRef::Typedef(target)),
                    Some(EntityRef::Template(template)) => {
                        let function_name = &self.registry.template(template).function_name;
                        let key = InstantiationKey::new(function_name, &base.parameters);
                        if let Some(&owner) = self.typedef_instantiations.get(&key) {
                            dependencies.push(TypeRef::Typedef(owner));
                        }
                    }
                    None => {}
                }
            }
        }

        dependencies
    }

    fn plan_type(&self, ty: TypeRef) -> BindResult<TypePlan> {
        match ty {
            TypeRef::Class(id) => Ok(TypePlan::Class(self.plan_class(id, false)?)),
            TypeRef::Typedef(id) => Ok(TypePlan::Typedef(self.plan_typedef(id)?)),
        }
    }

    fn plan_typedef(&self, id: TypedefId) -> BindResult<TypedefPlan> {
        let typedef = self.registry.typedef(id);
        let template = typedef
            .template
            .map(|t| self.registry.template(t).register_name.clone())
            .unwrap_or_default();

        if !is_valid_argument_list(&typedef.parameters) {
            tracing::error!(
                "Malformed template arguments '{}' of {}",
                typedef.parameters,
                typedef.register_name
            );
            return Err(BindError::EmptyTemplateParameter {
                entity: typedef.register_name.clone(),
                template,
            });
        }

        Ok(TypedefPlan {
            register_name: typedef.register_name.clone(),
            python_name: typedef.python_name.clone(),
            header: typedef.header.clone(),
            module: typedef.module.clone(),
            template,
            function_name: typedef.function_name.clone(),
            parameters: typedef.parameters.clone(),
            extra_includes: typedef.extra_includes.clone(),
        })
    }

    fn plan_class(&self, id: ClassId, in_template: bool) -> BindResult<ClassPlan> {
        let class = self.registry.class(id);

        let extra_bases = class
            .extra_base_refs()
            .filter(|b| !b.is_excluded)
            .filter_map(|base| match base.target {
                Some(EntityRef::Template(template)) => Some((base, template)),
                _ => None,
            })
            .map(|(base, template)| self.extra_base_call(class, base, template, in_template))
            .collect::<BindResult<Vec<_>>>()?;

        let nested_classes = class
            .nested_classes
            .iter()
            .filter(|&&nested| !self.registry.class(nested).is_excluded)
            .map(|&nested| self.plan_class(nested, in_template))
            .collect::<BindResult<Vec<_>>>()?;

        let constructors = if class.is_abstract {
            Vec::new()
        } else {
            class
                .constructors
                .iter()
                .filter(|c| !c.is_excluded)
                .cloned()
                .collect()
        };

        Ok(ClassPlan {
            register_name: class.register_name.clone(),
            python_name: class.python_name.clone(),
            object_name: class.object_name.clone(),
            header: class.header.clone(),
            module: class.module.clone(),
            container: class.container.clone(),
            docs: class.docs.clone(),
            ownership: class.ownership,
            bases: class.resolved_bases().map(|b| b.base_name.clone()).collect(),
            extra_bases,
            constructors,
            methods: class.methods.iter().filter(|m| !m.is_excluded).cloned().collect(),
            enums: class
                .nested_enums
                .iter()
                .filter(|e| !e.is_excluded)
                .cloned()
                .collect(),
            nested_classes,
            before: self.policy.class_before(&class.register_name).to_vec(),
            after: self.policy.class_after(&class.register_name).to_vec(),
            extra_includes: class.extra_includes.clone(),
            is_template: class.is_template,
            is_nested: class.is_nested,
            is_abstract: class.is_abstract,
        })
    }

    fn extra_base_call(
        &self,
        class: &ClassEntity,
        base: &BaseReference,
        template: TemplateId,
        in_template: bool,
    ) -> BindResult<ExtraBaseCall> {
        let template = self.registry.template(template);

        if !is_valid_argument_list(&base.parameters) {
            tracing::error!(
                "Malformed template arguments '{}' in base {} of {}",
                base.parameters,
                base.base_name,
                class.register_name
            );
            return Err(BindError::EmptyTemplateParameter {
                entity: class.register_name.clone(),
                template: template.register_name.clone(),
            });
        }

        let name = if in_template && base.references_template() {
            NameArgument::Forward
        } else {
            NameArgument::Literal(class.python_name.clone())
        };

        // Calls inside template bodies run once per instantiation of the
        // enclosing template and are always guarded
        let mode = if in_template {
            RegistrationMode::SkipIfBound
        } else {
            RegistrationMode::Register
        };

        Ok(ExtraBaseCall {
            base: base.base_name.clone(),
            template: template.register_name.clone(),
            function_name: template.function_name.clone(),
            parameters: base.parameters.clone(),
            name,
            mode,
        })
    }

    // Modules

    fn plan_modules(&self, types: &[TypePlan]) -> Vec<ModulePlan> {
        self.registry
            .modules()
            .map(|module| {
                let module_types: Vec<&TypePlan> =
                    types.iter().filter(|t| t.module() == module.name).collect();

                let extra_includes: BTreeSet<String> = module_types
                    .iter()
                    .flat_map(|t| t.extra_includes())
                    .map(str::to_string)
                    .collect();

                let mut functions: Vec<FunctionEntity> = module
                    .functions
                    .iter()
                    .filter(|f| !f.is_excluded)
                    .cloned()
                    .collect();
                functions.sort_by(|a, b| a.register_name.cmp(&b.register_name));

                ModulePlan {
                    name: module.name.clone(),
                    headers: module.headers.clone(),
                    extra_headers: self.policy.module_extra_headers(&module.name).to_vec(),
                    extra_includes: extra_includes.into_iter().collect(),
                    enums: module.enums.iter().filter(|e| !e.is_excluded).cloned().collect(),
                    functions,
                    types: module_types
                        .iter()
                        .map(|t| t.register_name().to_string())
                        .collect(),
                }
            })
            .collect()
    }

    // Aliases

    fn plan_aliases(&self) -> Vec<AliasPlan> {
        let mut aliases = Vec::new();

        for id in self.registry.typedef_ids() {
            let typedef = self.registry.typedef(id);
            if !typedef.is_alias || typedef.is_excluded {
                continue;
            }
            let Some(owner) = typedef.alias_of else {
                continue;
            };
            let Some((owner_module, owner_path)) = self.owner_path(owner) else {
                tracing::debug!(
                    "Alias {} dropped, {} is not bound",
                    typedef.register_name,
                    self.registry.entity_name(owner)
                );
                continue;
            };

            aliases.push(AliasPlan {
                register_name: typedef.register_name.clone(),
                module: typedef.module.clone(),
                python_name: typedef.python_name.clone(),
                owner: self.registry.entity_name(owner).to_string(),
                owner_module,
                owner_path,
            });
        }

        aliases
    }

    /// Module and attribute path of a bound alias owner
    fn owner_path(&self, owner: EntityRef) -> Option<(String, Vec<String>)> {
        match owner {
            EntityRef::Class(id) => {
                if !self.is_bound_class(id) {
                    return None;
                }
                let mut path = Vec::new();
                let mut current = Some(id);
                while let Some(class_id) = current {
                    let class = self.registry.class(class_id);
                    path.push(class.python_name.clone());
                    current = class.parent;
                }
                path.reverse();
                let outermost = self.registry.outermost_class(id);
                Some((self.registry.class(outermost).module.clone(), path))
            }
            EntityRef::Typedef(id) if is_bindable_typedef(self.registry, id) => {
                let typedef = self.registry.typedef(id);
                Some((typedef.module.clone(), vec![typedef.python_name.clone()]))
            }
            _ => None,
        }
    }

    /// A class is bound when it and all enclosing classes are bound top-level
    /// or nested classes
    fn is_bound_class(&self, id: ClassId) -> bool {
        let mut seen = HashSet::new();
        let mut current = Some(id);
        while let Some(class_id) = current {
            if !seen.insert(class_id) {
                return false;
            }
            let class = self.registry.class(class_id);
            if class.is_excluded || class.is_template {
                return false;
            }
            current = class.parent;
        }
        true
    }
}

fn is_bindable_typedef(registry: &Registry, id: TypedefId) -> bool {
    let typedef = registry.typedef(id);
    !typedef.is_excluded && !typedef.is_alias && typedef.template.is_some()
}
