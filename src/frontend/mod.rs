//! Front end boundary: the declaration cursors consumed by ingestion.
//!
//! A front end turns header text into a flat sequence of top-level
//! [`Declaration`]s (children nested inside). Two front ends ship with the
//! crate:
//!
//! - [`json::JsonSource`] reads a declaration dump exported by a clang-based tool
//! - [`cpp::HeaderScanner`] parses headers directly with tree-sitter
//!
//! Ingestion only depends on the [`DeclSource`] trait, so tests feed plain
//! `Vec<Declaration>` values built with the constructors below.

pub mod cpp;
pub mod json;

use crate::types::{Access, DeclKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub use cpp::{HeaderScanner, ScannedHeaders};
pub use json::JsonSource;

fn default_true() -> bool {
    true
}

/// A declaration cursor as reported by the front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    pub kind: DeclKind,

    /// Unqualified spelling (`Iterator`, `NCollection_List`)
    pub spelling: String,

    /// Fully qualified display name (`NCollection_List<TheItemType>::Iterator`)
    #[serde(default)]
    pub qualified_name: String,

    /// Spelling of the declared type, defaults to the qualified name
    #[serde(default)]
    pub type_spelling: String,

    /// Canonical spelling. For typedefs this is the underlying type with all
    /// typedefs stripped.
    #[serde(default)]
    pub canonical_type: String,

    /// Base name of the header the declaration lives in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,

    #[serde(default)]
    pub access: Access,

    #[serde(default = "default_true")]
    pub is_definition: bool,

    #[serde(default)]
    pub is_anonymous: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs: Option<String>,

    /// Base specifiers in declaration order (all access levels)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bases: Vec<BaseSpecifier>,

    /// Template parameter tokens (`typename TheItemType`, `int N`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub template_parameters: Vec<String>,

    /// For typedefs: qualified display name of the class template the
    /// underlying type instantiates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,

    /// Result type spelling of functions and methods
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_type: Option<String>,

    /// Default argument text of a parameter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,

    #[serde(default)]
    pub is_static: bool,

    #[serde(default)]
    pub is_const: bool,

    #[serde(default)]
    pub is_virtual: bool,

    #[serde(default)]
    pub is_pure_virtual: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Declaration>,
}

/// A base specifier of a class, template or typedef'd class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseSpecifier {
    #[serde(default)]
    pub access: Access,

    /// The base type as spelled (`NCollection_List<int>`, `TheItemType`)
    pub type_spelling: String,

    /// The declaration the specifier references. `None` when the base is one
    /// of the enclosing template's own parameters.
    #[serde(default)]
    pub referenced: Option<ReferencedDecl>,
}

/// The declaration a base specifier points at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencedDecl {
    pub kind: DeclKind,

    pub qualified_name: String,

    #[serde(default)]
    pub type_spelling: String,

    /// Qualified display name of the class template this declaration
    /// specializes, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,

    /// Public bases of the referenced definition
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bases: Vec<BaseSpecifier>,
}

/// A single-pass source of top-level declarations.
pub trait DeclSource {
    type Iter: Iterator<Item = Declaration>;

    /// Headers the front end considers available for binding
    fn available_headers(&self) -> BTreeSet<String>;

    /// Consume the source in translation-unit order
    fn into_declarations(self) -> Self::Iter;
}

impl DeclSource for Vec<Declaration> {
    type Iter = std::vec::IntoIter<Declaration>;

    fn available_headers(&self) -> BTreeSet<String> {
        self.iter().filter_map(|d| d.header.clone()).collect()
    }

    fn into_declarations(self) -> Self::Iter {
        self.into_iter()
    }
}

/// Last `::` component of a qualified name with template arguments removed.
pub fn unqualified(name: &str) -> String {
    let stripped = strip_template_arguments(name);
    match stripped.rsplit_once("::") {
        Some((_, last)) => last.to_string(),
        None => stripped,
    }
}

/// Remove every `<...>` group (balanced) from a spelling.
pub fn strip_template_arguments(name: &str) -> String {
    let mut depth = 0usize;
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out.trim().to_string()
}

impl Declaration {
    /// Create a declaration with the given kind and qualified name
    pub fn new(kind: DeclKind, qualified_name: impl Into<String>) -> Self {
        let qualified_name = qualified_name.into();
        Self {
            kind,
            spelling: unqualified(&qualified_name),
            qualified_name,
            type_spelling: String::new(),
            canonical_type: String::new(),
            header: None,
            access: Access::Public,
            is_definition: true,
            is_anonymous: false,
            docs: None,
            bases: Vec::new(),
            template_parameters: Vec::new(),
            specialization: None,
            result_type: None,
            default_value: None,
            is_static: false,
            is_const: false,
            is_virtual: false,
            is_pure_virtual: false,
            children: Vec::new(),
        }
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::new(DeclKind::ClassDecl, name)
    }

    pub fn structure(name: impl Into<String>) -> Self {
        Self::new(DeclKind::StructDecl, name)
    }

    /// Class template named by its display name, e.g. `NCollection_List<TheItemType>`
    pub fn class_template(name: impl Into<String>, parameters: &[&str]) -> Self {
        let mut decl = Self::new(DeclKind::ClassTemplate, name);
        decl.template_parameters = parameters.iter().map(|p| p.to_string()).collect();
        decl
    }

    pub fn typedef(name: impl Into<String>, canonical: impl Into<String>) -> Self {
        let mut decl = Self::new(DeclKind::TypedefDecl, name);
        decl.canonical_type = canonical.into();
        decl
    }

    pub fn enumeration(name: impl Into<String>) -> Self {
        Self::new(DeclKind::EnumDecl, name)
    }

    pub fn enum_constant(name: impl Into<String>) -> Self {
        Self::new(DeclKind::EnumConstant, name)
    }

    pub fn function(name: impl Into<String>, result: impl Into<String>) -> Self {
        let mut decl = Self::new(DeclKind::FunctionDecl, name);
        decl.result_type = Some(result.into());
        decl
    }

    pub fn method(name: impl Into<String>, result: impl Into<String>) -> Self {
        let mut decl = Self::new(DeclKind::Method, name);
        decl.result_type = Some(result.into());
        decl
    }

    pub fn constructor(name: impl Into<String>) -> Self {
        Self::new(DeclKind::Constructor, name)
    }

    pub fn destructor(name: impl Into<String>) -> Self {
        Self::new(DeclKind::Destructor, name)
    }

    pub fn parameter(type_spelling: impl Into<String>, name: impl Into<String>) -> Self {
        let mut decl = Self::new(DeclKind::Parameter, name);
        decl.type_spelling = type_spelling.into();
        decl
    }

    pub fn in_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    pub fn with_access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    pub fn with_base(mut self, base: BaseSpecifier) -> Self {
        self.bases.push(base);
        self
    }

    pub fn with_child(mut self, child: Declaration) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_specialization(mut self, template: impl Into<String>) -> Self {
        self.specialization = Some(template.into());
        self
    }

    pub fn with_type_spelling(mut self, spelling: impl Into<String>) -> Self {
        self.type_spelling = spelling.into();
        self
    }

    pub fn with_canonical(mut self, canonical: impl Into<String>) -> Self {
        self.canonical_type = canonical.into();
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_docs(mut self, docs: impl Into<String>) -> Self {
        self.docs = Some(docs.into());
        self
    }

    pub fn declaration_only(mut self) -> Self {
        self.is_definition = false;
        self
    }

    pub fn anonymous(mut self) -> Self {
        self.is_anonymous = true;
        self
    }

    pub fn static_method(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn const_method(mut self) -> Self {
        self.is_const = true;
        self
    }

    pub fn pure_virtual(mut self) -> Self {
        self.is_virtual = true;
        self.is_pure_virtual = true;
        self
    }

    /// Qualified name, falling back to the spelling
    pub fn name(&self) -> &str {
        if self.qualified_name.is_empty() {
            &self.spelling
        } else {
            &self.qualified_name
        }
    }

    /// Spelling of the declared type, falling back to the qualified name
    pub fn type_name(&self) -> &str {
        if self.type_spelling.is_empty() {
            self.name()
        } else {
            &self.type_spelling
        }
    }

    /// Canonical spelling, falling back to the type spelling
    pub fn canonical(&self) -> &str {
        if self.canonical_type.is_empty() {
            self.type_name()
        } else {
            &self.canonical_type
        }
    }

    /// Qualified spelling without any template argument lists
    pub fn qualified_spelling(&self) -> String {
        strip_template_arguments(self.name())
    }

    /// Public children of the given kind
    pub fn public_children(&self, kind: DeclKind) -> impl Iterator<Item = &Declaration> {
        self.children
            .iter()
            .filter(move |c| c.kind == kind && c.access.is_public())
    }
}

impl BaseSpecifier {
    fn referencing(kind: DeclKind, spelled: &str, name: &str) -> Self {
        Self {
            access: Access::Public,
            type_spelling: spelled.to_string(),
            referenced: Some(ReferencedDecl {
                kind,
                qualified_name: name.to_string(),
                type_spelling: spelled.to_string(),
                specialization: None,
                bases: Vec::new(),
            }),
        }
    }

    /// Plain class base
    pub fn class(name: &str) -> Self {
        Self::referencing(DeclKind::ClassDecl, name, name)
    }

    /// Base named through a typedef
    pub fn typedef(name: &str) -> Self {
        Self::referencing(DeclKind::TypedefDecl, name, name)
    }

    /// Base that instantiates a class template, e.g. `NCollection_List<int>`
    /// specializing `NCollection_List<TheItemType>`
    pub fn instantiation(spelled: &str, template: &str) -> Self {
        let mut base = Self::referencing(DeclKind::ClassDecl, spelled, spelled);
        if let Some(referenced) = base.referenced.as_mut() {
            referenced.specialization = Some(template.to_string());
        }
        base
    }

    /// Base inside a template body that names another class template
    /// with dependent arguments, e.g. `Base<T>`
    pub fn template(spelled: &str, template: &str) -> Self {
        let mut base = Self::referencing(DeclKind::ClassTemplate, spelled, template);
        if let Some(referenced) = base.referenced.as_mut() {
            referenced.type_spelling = template.to_string();
            referenced.specialization = Some(template.to_string());
        }
        base
    }

    /// Base that is a template parameter of the enclosing template
    pub fn parameter(name: &str) -> Self {
        Self {
            access: Access::Public,
            type_spelling: name.to_string(),
            referenced: None,
        }
    }

    /// Base referencing a declaration of an arbitrary kind
    pub fn of_kind(kind: DeclKind, name: &str) -> Self {
        Self::referencing(kind, name, name)
    }

    pub fn with_access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    /// Attach the referenced definition's own bases
    pub fn with_inherited(mut self, bases: Vec<BaseSpecifier>) -> Self {
        if let Some(referenced) = self.referenced.as_mut() {
            referenced.bases = bases;
        }
        self
    }
}
