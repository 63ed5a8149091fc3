//! Declaration model: the entities the resolution passes operate on.
//!
//! Entities are created once by ingestion and afterwards only mutated by the
//! resolution passes (flags and links). Nothing is ever removed; exclusion is
//! a flag so a diagnostic can still say why something was dropped.
//!
//! Cross references between entities are plain arena ids ([`ClassId`],
//! [`TemplateId`], [`TypedefId`]) into the [`Registry`].

mod registry;

pub use registry::{Module, Registry};

use crate::types::{ClassId, DeclKind, EntityRef, OwnershipKind, TemplateId};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static TEMPLATE_ARGUMENTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(.*)>").expect("Invalid regex"));

/// Make a C++ spelling usable as a Python identifier.
pub fn sanitize_name(name: &str) -> String {
    name.replace("::", "_")
        .replace(['<', '>'], "_")
        .replace([',', ' ', '*', '&'], "")
        .trim_matches('_')
        .to_string()
}

/// Module a header belongs to: `gp_Pnt.hxx` -> `gp`, `Standard.hxx` -> `Standard`.
pub fn module_name_for_header(header: &str) -> String {
    let flat = header.replace('.', "_");
    match flat.split_once('_') {
        Some((first, _)) => first.to_string(),
        None => flat,
    }
}

/// The `<...>` argument list of a spelling, outermost and greedy, including
/// the angle brackets. Empty when the spelling has no arguments.
pub fn template_arguments(spelling: &str) -> String {
    TEMPLATE_ARGUMENTS
        .captures(spelling)
        .and_then(|caps| caps.get(1))
        .map(|m| format!("<{}>", m.as_str()))
        .unwrap_or_default()
}

/// How a base reference reaches its superclass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BaseKind {
    DirectClass,
    ThroughTypedef,
    ThroughTemplateInstantiation,
    TemplateParameterPlaceholder,
}

/// A directed inheritance edge from a class or template body to its superclass.
#[derive(Debug, Clone, Serialize)]
pub struct BaseReference {
    /// Qualified name of the referenced declaration
    pub referenced_name: String,

    /// Spelling used in the emitted base list
    pub base_name: String,

    /// Kind of the referenced declaration. `None` for template parameters.
    pub referenced_kind: Option<DeclKind>,

    /// Class template the referenced declaration specializes
    pub specialization: Option<String>,

    /// Template arguments of the base spelling (`<int>`), empty if none
    pub parameters: String,

    /// Public bases of the referenced declaration as declared by the front end
    pub declared_bases: Vec<BaseReference>,

    /// Set by base resolution
    pub kind: Option<BaseKind>,

    /// Resolved superclass, weak
    pub target: Option<EntityRef>,

    /// Excluded until resolution proves the superclass exists and is bound
    pub is_excluded: bool,
}

impl BaseReference {
    pub fn is_placeholder(&self) -> bool {
        self.referenced_kind.is_none()
    }

    /// Whether the edge was resolved through a template registration function
    pub fn is_through_template(&self) -> bool {
        matches!(self.target, Some(EntityRef::Template(_)))
    }

    /// Whether the referenced declaration is itself a class template
    /// (only possible inside template bodies)
    pub fn references_template(&self) -> bool {
        self.referenced_kind == Some(DeclKind::ClassTemplate)
    }
}

impl std::fmt::Display for BaseReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.base_name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ParameterEntity {
    pub type_name: String,
    pub name: String,
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConstructorEntity {
    pub spelling: String,
    pub parameters: Vec<ParameterEntity>,
    pub docs: String,
    pub is_excluded: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MethodEntity {
    /// `Class::method`
    pub register_name: String,
    pub python_name: String,
    pub result_name: String,
    pub parameters: Vec<ParameterEntity>,
    pub is_static: bool,
    pub is_const: bool,
    pub is_virtual: bool,
    pub is_pure_virtual: bool,
    pub docs: String,
    pub is_excluded: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnumConstantEntity {
    pub register_name: String,
    pub python_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnumEntity {
    pub register_name: String,
    pub python_name: String,
    pub header: String,
    pub module: String,
    pub container: String,
    pub docs: String,
    pub constants: Vec<EnumConstantEntity>,
    pub is_anonymous: bool,
    pub is_nested: bool,
    pub is_excluded: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionEntity {
    pub register_name: String,
    pub python_name: String,
    pub header: String,
    pub module: String,
    pub result_name: String,
    pub parameters: Vec<ParameterEntity>,
    pub docs: String,
    pub is_excluded: bool,
}

/// A class or struct, also used as the body of a class template.
#[derive(Debug, Clone, Serialize)]
pub struct ClassEntity {
    pub register_name: String,
    pub python_name: String,
    pub object_name: String,
    pub canonical_type: String,
    pub header: String,
    pub module: String,
    /// Expression the class is registered into (`mod` or the parent's object)
    pub container: String,
    pub docs: String,

    pub bases: Vec<BaseReference>,
    /// Indices into `bases` of edges resolved through a template, in
    /// registration order
    pub extra_bases: Vec<usize>,

    pub nested_classes: Vec<ClassId>,
    pub nested_enums: Vec<EnumEntity>,
    pub nested_templates: Vec<TemplateId>,
    pub constructors: Vec<ConstructorEntity>,
    pub methods: Vec<MethodEntity>,
    /// Pure virtual methods, kept for trampoline generation
    pub pure_virtuals: Vec<String>,

    pub ownership: OwnershipKind,
    pub parent: Option<ClassId>,
    /// Set on template bodies
    pub template: Option<TemplateId>,

    pub is_template: bool,
    pub is_nested: bool,
    pub is_abstract: bool,
    pub has_hidden_destructor: bool,
    pub is_excluded: bool,

    pub extra_includes: Vec<String>,
}

impl ClassEntity {
    /// Base edges that survived resolution
    pub fn resolved_bases(&self) -> impl Iterator<Item = &BaseReference> {
        self.bases.iter().filter(|b| !b.is_excluded)
    }

    pub fn extra_base_refs(&self) -> impl Iterator<Item = &BaseReference> {
        self.extra_bases.iter().filter_map(|&i| self.bases.get(i))
    }
}

/// What a template is nested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TemplateParent {
    Class(ClassId),
    Template(TemplateId),
}

/// A class template: a class body plus its parameter list.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateEntity {
    /// Qualified display name, `NCollection_List<TheItemType>`
    pub register_name: String,
    pub function_name: String,
    pub source_name: String,
    pub header: String,
    pub module: String,
    /// Parameter tokens declared by this template only
    pub parameters: Vec<String>,
    pub body: ClassId,
    pub nested_templates: Vec<TemplateId>,
    pub parent: Option<TemplateParent>,
    pub is_nested: bool,
    pub is_excluded: bool,
    pub extra_includes: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypedefEntity {
    pub register_name: String,
    pub python_name: String,
    pub header: String,
    pub module: String,
    pub canonical_type: String,
    pub docs: String,

    /// Class template the underlying type instantiates
    pub underlying_template: Option<String>,
    /// Template arguments of the underlying type, `<...>`
    pub parameters: String,
    /// Linked template registration, set by template linkage
    pub template: Option<TemplateId>,
    pub function_name: String,

    pub bases: Vec<BaseReference>,

    pub is_alias: bool,
    /// Owner of the canonical type when this typedef is an alias (weak)
    pub alias_of: Option<EntityRef>,
    pub is_excluded: bool,
    pub extra_includes: Vec<String>,
}

impl TypedefEntity {
    pub fn is_templated(&self) -> bool {
        self.underlying_template.is_some()
    }
}
