use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Index of a class in the registry arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClassId(pub u32);

/// Index of a class template in the registry arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TemplateId(pub u32);

/// Index of a typedef in the registry arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypedefId(pub u32);

macro_rules! arena_id {
    ($name:ident) => {
        impl $name {
            pub fn from_index(index: usize) -> Self {
                Self(index as u32)
            }

            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

arena_id!(ClassId);
arena_id!(TemplateId);
arena_id!(TypedefId);

/// Weak reference to a registered entity. Holds an id only, never ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityRef {
    Class(ClassId),
    Typedef(TypedefId),
    Template(TemplateId),
}

/// Reference to a bindable top-level type (what a module lists under "types").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeRef {
    Class(ClassId),
    Typedef(TypedefId),
}

impl From<TypeRef> for EntityRef {
    fn from(value: TypeRef) -> Self {
        match value {
            TypeRef::Class(id) => EntityRef::Class(id),
            TypeRef::Typedef(id) => EntityRef::Typedef(id),
        }
    }
}

/// Memory-management strategy of a bound class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OwnershipKind {
    /// Plain shared ownership (the default)
    #[default]
    Shared,
    /// Shared ownership that never calls the (inaccessible) destructor
    NoDelete,
    /// Intrusive reference counting rooted at the configured handle root type
    Handle,
}

impl OwnershipKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OwnershipKind::Shared => "shared",
            OwnershipKind::NoDelete => "nodelete",
            OwnershipKind::Handle => "handle",
        }
    }
}

impl fmt::Display for OwnershipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OwnershipKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shared" => Ok(OwnershipKind::Shared),
            "nodelete" => Ok(OwnershipKind::NoDelete),
            "handle" => Ok(OwnershipKind::Handle),
            _ => Err("Unknown ownership kind"),
        }
    }
}

/// C++ access specifier of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    #[default]
    Public,
    Protected,
    Private,
}

impl Access {
    pub fn is_public(self) -> bool {
        matches!(self, Access::Public)
    }
}

/// Declaration kinds reported by the front end.
///
/// Anything the front end reports that is not listed here deserializes to
/// `Unknown` and is skipped by ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclKind {
    ClassDecl,
    StructDecl,
    ClassTemplate,
    TypedefDecl,
    EnumDecl,
    EnumConstant,
    FunctionDecl,
    Method,
    Constructor,
    Destructor,
    Parameter,
    Namespace,
    #[serde(other)]
    Unknown,
}

impl DeclKind {
    /// Class or struct definition
    pub fn is_record(self) -> bool {
        matches!(self, DeclKind::ClassDecl | DeclKind::StructDecl)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeclKind::ClassDecl => "class_decl",
            DeclKind::StructDecl => "struct_decl",
            DeclKind::ClassTemplate => "class_template",
            DeclKind::TypedefDecl => "typedef_decl",
            DeclKind::EnumDecl => "enum_decl",
            DeclKind::EnumConstant => "enum_constant",
            DeclKind::FunctionDecl => "function_decl",
            DeclKind::Method => "method",
            DeclKind::Constructor => "constructor",
            DeclKind::Destructor => "destructor",
            DeclKind::Parameter => "parameter",
            DeclKind::Namespace => "namespace",
            DeclKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
