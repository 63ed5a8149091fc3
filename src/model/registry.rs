//! Arena registries shared by the resolution passes.
//!
//! Each entity kind lives in a `Vec` arena (ingestion order, used for
//! deterministic iteration) plus a register-name index for lookups. The
//! registry is passed explicitly to every pass as `&mut Registry`.

use super::{BaseReference, ClassEntity, EnumEntity, FunctionEntity, TemplateEntity, TypedefEntity};
use crate::types::{ClassId, EntityRef, TemplateId, TypeRef, TypedefId};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Logical namespace derived from a header name.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Module {
    pub name: String,
    pub enums: Vec<EnumEntity>,
    pub functions: Vec<FunctionEntity>,
    /// Classes and typedefs in ingestion order
    pub types: Vec<TypeRef>,
    /// Headers of the module content, first-seen order
    pub headers: Vec<String>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn add_header(&mut self, header: &str) {
        if !header.is_empty() && !self.headers.iter().any(|h| h == header) {
            self.headers.push(header.to_string());
        }
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    classes: Vec<ClassEntity>,
    class_index: HashMap<String, ClassId>,

    templates: Vec<TemplateEntity>,
    template_index: HashMap<String, TemplateId>,

    typedefs: Vec<TypedefEntity>,
    typedef_index: HashMap<String, TypedefId>,

    /// Available modules, sorted by name
    modules: BTreeMap<String, Module>,

    /// Registered classes (top-level and nested) in ingestion order
    ordered_classes: Vec<ClassId>,

    /// Top-level classes and typedefs in ingestion order
    ordered_types: Vec<TypeRef>,

    /// Canonical type spelling -> owning entity. First writer wins.
    canonical_types: HashMap<String, EntityRef>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    // Classes

    /// Add a class to the arena without registering its name
    pub fn add_class(&mut self, class: ClassEntity) -> ClassId {
        let id = ClassId::from_index(self.classes.len());
        self.classes.push(class);
        id
    }

    /// Register a class under its register name. Returns false (and leaves
    /// the index untouched) if the name is already taken.
    pub fn register_class(&mut self, id: ClassId) -> bool {
        let name = self.classes[id.index()].register_name.clone();
        if self.class_index.contains_key(&name) {
            return false;
        }
        self.class_index.insert(name, id);
        self.ordered_classes.push(id);
        true
    }

    pub fn class(&self, id: ClassId) -> &ClassEntity {
        &self.classes[id.index()]
    }

    pub fn class_mut(&mut self, id: ClassId) -> &mut ClassEntity {
        &mut self.classes[id.index()]
    }

    pub fn find_class(&self, name: &str) -> Option<ClassId> {
        self.class_index.get(name).copied()
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Registered classes in ingestion order (nested classes included)
    pub fn ordered_classes(&self) -> &[ClassId] {
        &self.ordered_classes
    }

    // Templates

    pub fn add_template(&mut self, template: TemplateEntity) -> TemplateId {
        let id = TemplateId::from_index(self.templates.len());
        self.templates.push(template);
        id
    }

    pub fn register_template(&mut self, id: TemplateId) -> bool {
        let name = self.templates[id.index()].register_name.clone();
        if self.template_index.contains_key(&name) {
            return false;
        }
        self.template_index.insert(name, id);
        true
    }

    pub fn template(&self, id: TemplateId) -> &TemplateEntity {
        &self.templates[id.index()]
    }

    pub fn template_mut(&mut self, id: TemplateId) -> &mut TemplateEntity {
        &mut self.templates[id.index()]
    }

    pub fn find_template(&self, name: &str) -> Option<TemplateId> {
        self.template_index.get(name).copied()
    }

    /// Registered templates in registration order
    pub fn template_ids(&self) -> Vec<TemplateId> {
        let mut ids: Vec<TemplateId> = self.template_index.values().copied().collect();
        ids.sort();
        ids
    }

    // Typedefs

    /// Add and register a typedef. Returns `None` if the name is taken.
    pub fn add_typedef(&mut self, typedef: TypedefEntity) -> Option<TypedefId> {
        if self.typedef_index.contains_key(&typedef.register_name) {
            return None;
        }
        let id = TypedefId::from_index(self.typedefs.len());
        self.typedef_index.insert(typedef.register_name.clone(), id);
        self.typedefs.push(typedef);
        Some(id)
    }

    pub fn typedef(&self, id: TypedefId) -> &TypedefEntity {
        &self.typedefs[id.index()]
    }

    pub fn typedef_mut(&mut self, id: TypedefId) -> &mut TypedefEntity {
        &mut self.typedefs[id.index()]
    }

    pub fn find_typedef(&self, name: &str) -> Option<TypedefId> {
        self.typedef_index.get(name).copied()
    }

    /// Typedefs in ingestion order
    pub fn typedef_ids(&self) -> impl Iterator<Item = TypedefId> + use<> {
        (0..self.typedefs.len()).map(TypedefId::from_index)
    }

    // Modules

    pub fn module_mut(&mut self, name: &str) -> &mut Module {
        self.modules
            .entry(name.to_string())
            .or_insert_with(|| Module::new(name))
    }

    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.get(name)
    }

    /// Modules in lexicographic order
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    pub fn available_modules(&self) -> Vec<&str> {
        self.modules.keys().map(String::as_str).collect()
    }

    /// Record a top-level type in its module and in the global ingestion order
    pub fn push_type(&mut self, module: &str, ty: TypeRef) {
        self.module_mut(module).types.push(ty);
        self.ordered_types.push(ty);
    }

    /// All top-level types in ingestion order across modules
    pub fn ordered_types(&self) -> &[TypeRef] {
        &self.ordered_types
    }

    // Canonical types

    pub fn canonical_owner(&self, canonical: &str) -> Option<EntityRef> {
        self.canonical_types.get(canonical).copied()
    }

    /// Claim ownership of a canonical type. Returns the owner after the call,
    /// which is the previous owner when one exists (first writer wins).
    pub fn claim_canonical(&mut self, canonical: &str, owner: EntityRef) -> EntityRef {
        *self
            .canonical_types
            .entry(canonical.to_string())
            .or_insert(owner)
    }

    // Generic entity queries

    pub fn entity_name(&self, entity: EntityRef) -> &str {
        match entity {
            EntityRef::Class(id) => &self.class(id).register_name,
            EntityRef::Typedef(id) => &self.typedef(id).register_name,
            EntityRef::Template(id) => &self.template(id).register_name,
        }
    }

    pub fn is_excluded(&self, entity: EntityRef) -> bool {
        match entity {
            EntityRef::Class(id) => self.class(id).is_excluded,
            EntityRef::Typedef(id) => self.typedef(id).is_excluded,
            EntityRef::Template(id) => self.template(id).is_excluded,
        }
    }

    pub fn module_of(&self, entity: EntityRef) -> &str {
        match entity {
            EntityRef::Class(id) => &self.class(id).module,
            EntityRef::Typedef(id) => &self.typedef(id).module,
            EntityRef::Template(id) => &self.template(id).module,
        }
    }

    pub fn python_name_of(&self, entity: EntityRef) -> &str {
        match entity {
            EntityRef::Class(id) => &self.class(id).python_name,
            EntityRef::Typedef(id) => &self.typedef(id).python_name,
            EntityRef::Template(id) => &self.class(self.template(id).body).python_name,
        }
    }

    /// Base edges declared on an entity
    pub fn bases_of(&self, entity: EntityRef) -> &[BaseReference] {
        match entity {
            EntityRef::Class(id) => &self.class(id).bases,
            EntityRef::Typedef(id) => &self.typedef(id).bases,
            EntityRef::Template(id) => &self.class(self.template(id).body).bases,
        }
    }

    /// Outermost enclosing class of a (possibly nested) class
    pub fn outermost_class(&self, mut id: ClassId) -> ClassId {
        let mut seen = HashSet::new();
        while let Some(parent) = self.class(id).parent {
            if !seen.insert(parent) {
                break;
            }
            id = parent;
        }
        id
    }

    /// Whether `class` is `root` or transitively derives from it.
    ///
    /// Walks declared bases, resolved targets and registry lookups with an
    /// explicit worklist. Names are visited once, so cyclic input terminates.
    pub fn is_derived_from(&self, class: ClassId, root: &str) -> bool {
        let start = self.class(class);
        if start.register_name == root {
            return true;
        }

        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(start.register_name.clone());
        let mut worklist: Vec<&BaseReference> = start.bases.iter().collect();

        while let Some(base) = worklist.pop() {
            if base.base_name == root || base.referenced_name == root {
                return true;
            }
            if !visited.insert(base.referenced_name.clone()) {
                continue;
            }

            worklist.extend(base.declared_bases.iter());

            if let Some(target) = base.target {
                worklist.extend(self.bases_of(target).iter());
                if self.entity_name(target) == root {
                    return true;
                }
            }
            if let Some(entity) = self.lookup_any(&base.referenced_name) {
                worklist.extend(self.bases_of(entity).iter());
            }
        }

        false
    }

    /// Look a name up in the class registry, then typedefs (following aliases)
    fn lookup_any(&self, name: &str) -> Option<EntityRef> {
        if let Some(id) = self.find_class(name) {
            return Some(EntityRef::Class(id));
        }
        let id = self.find_typedef(name)?;
        Some(self.typedef(id).alias_of.unwrap_or(EntityRef::Typedef(id)))
    }
}
