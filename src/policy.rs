//! Exclusion policy: the configuration capability injected into ingestion
//! and resolution.
//!
//! The core never reads [`Settings`] directly. It asks an [`ExclusionPolicy`],
//! which keeps the passes testable with [`AllowAll`] and lets the CLI plug in
//! the settings-backed [`ConfiguredPolicy`].

use crate::config::{ClassConfig, ModuleConfig, Settings};
use crate::error::{BindError, BindResult};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::{BTreeSet, HashSet};

/// Exclusion predicates and per-entity lookups used by the core passes.
pub trait ExclusionPolicy {
    fn is_available_header(&self, header: &str) -> bool;

    fn is_excluded_module(&self, module: &str) -> bool;

    fn is_excluded_class(&self, module: &str, name: &str) -> bool;

    fn is_excluded_function(&self, module: &str, name: &str) -> bool;

    fn is_excluded_typedef(&self, module: &str, name: &str) -> bool;

    /// `name` is the unqualified method spelling
    fn is_excluded_method(&self, class: &str, name: &str) -> bool;

    /// `signature` is the comma separated parameter type list
    fn is_excluded_constructor(&self, class: &str, signature: &str) -> bool;

    fn is_excluded_base(&self, name: &str) -> bool;

    /// Source lines injected before a class registration
    fn class_before(&self, _class: &str) -> &[String] {
        &[]
    }

    /// Source lines injected after a class registration
    fn class_after(&self, _class: &str) -> &[String] {
        &[]
    }

    /// Extra headers included by a module unit
    fn module_extra_headers(&self, _module: &str) -> &[String] {
        &[]
    }
}

/// Policy that binds everything it is given.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl ExclusionPolicy for AllowAll {
    fn is_available_header(&self, _header: &str) -> bool {
        true
    }

    fn is_excluded_module(&self, _module: &str) -> bool {
        false
    }

    fn is_excluded_class(&self, _module: &str, _name: &str) -> bool {
        false
    }

    fn is_excluded_function(&self, _module: &str, _name: &str) -> bool {
        false
    }

    fn is_excluded_typedef(&self, _module: &str, _name: &str) -> bool {
        false
    }

    fn is_excluded_method(&self, _class: &str, _name: &str) -> bool {
        false
    }

    fn is_excluded_constructor(&self, _class: &str, _signature: &str) -> bool {
        false
    }

    fn is_excluded_base(&self, _name: &str) -> bool {
        false
    }
}

/// Policy backed by [`Settings`] and the header set reported by the front end.
#[derive(Debug, Clone)]
pub struct ConfiguredPolicy {
    settings: Settings,
    available_headers: BTreeSet<String>,
    excluded_modules: HashSet<String>,
    class_patterns: GlobSet,
}

impl ConfiguredPolicy {
    /// Build a policy. Fails if a class pattern is not a valid glob.
    pub fn new(settings: &Settings, available_headers: BTreeSet<String>) -> BindResult<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &settings.exclude.classes {
            let glob = Glob::new(pattern).map_err(|e| BindError::ConfigError {
                reason: format!("Invalid class pattern '{pattern}': {e}"),
            })?;
            builder.add(glob);
        }
        let class_patterns = builder.build().map_err(|e| BindError::ConfigError {
            reason: format!("Failed to compile class patterns: {e}"),
        })?;

        let excluded_modules = settings.excluded_modules().cloned().collect();

        Ok(Self {
            settings: settings.clone(),
            available_headers,
            excluded_modules,
            class_patterns,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn module(&self, module: &str) -> Option<&ModuleConfig> {
        self.settings.modules.get(module)
    }

    fn class(&self, class: &str) -> Option<&ClassConfig> {
        self.settings.classes.get(class)
    }

    /// Header name filter: configured suffix and not explicitly excluded
    fn is_bindable_header(&self, header: &str) -> bool {
        if self.settings.parse.excluded_headers.iter().any(|h| h == header) {
            return false;
        }
        self.settings
            .parse
            .header_extensions
            .iter()
            .any(|ext| header.ends_with(ext.as_str()))
    }
}

fn contains(list: Option<&Vec<String>>, name: &str) -> bool {
    list.is_some_and(|items| items.iter().any(|item| item == name))
}

impl ExclusionPolicy for ConfiguredPolicy {
    fn is_available_header(&self, header: &str) -> bool {
        self.available_headers.contains(header) && self.is_bindable_header(header)
    }

    fn is_excluded_module(&self, module: &str) -> bool {
        self.excluded_modules.contains(module)
    }

    fn is_excluded_class(&self, module: &str, name: &str) -> bool {
        if self.class_patterns.is_match(name) {
            return true;
        }
        contains(self.module(module).map(|m| &m.excluded_classes), name)
    }

    fn is_excluded_function(&self, module: &str, name: &str) -> bool {
        contains(self.module(module).map(|m| &m.excluded_functions), name)
    }

    fn is_excluded_typedef(&self, module: &str, name: &str) -> bool {
        contains(self.module(module).map(|m| &m.excluded_typedefs), name)
    }

    fn is_excluded_method(&self, class: &str, name: &str) -> bool {
        contains(self.class(class).map(|c| &c.excluded_methods), name)
    }

    fn is_excluded_constructor(&self, class: &str, signature: &str) -> bool {
        contains(self.class(class).map(|c| &c.excluded_constructors), signature)
    }

    fn is_excluded_base(&self, name: &str) -> bool {
        self.settings.exclude.base_classes.iter().any(|b| b == name)
    }

    fn class_before(&self, class: &str) -> &[String] {
        self.class(class).map(|c| c.before.as_slice()).unwrap_or(&[])
    }

    fn class_after(&self, class: &str) -> &[String] {
        self.class(class).map(|c| c.after.as_slice()).unwrap_or(&[])
    }

    fn module_extra_headers(&self, module: &str) -> &[String] {
        self.module(module)
            .map(|m| m.extra_headers.as_slice())
            .unwrap_or(&[])
    }
}
