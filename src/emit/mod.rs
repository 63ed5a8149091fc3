//! Source emission.
//!
//! Renders a [`BindingPlan`] into pybind11 translation units:
//!
//! - `bind_<T>.hxx` per template source unit (nested templates share their
//!   parent's unit)
//! - `<module>.cxx` per module with its enums, functions and types
//! - `<root>.cxx` declaring every entry point and calling them in plan order
//!
//! Units are rendered in memory first and written into a staging directory
//! next to the output, which then replaces the output directory. A failed
//! run leaves the previous output untouched.

pub mod bind;

use crate::config::Settings;
use crate::error::{BindError, BindResult};
use crate::plan::{BindingPlan, ModulePlan, TemplatePlan, TypePlan};
use crate::types::OwnershipKind;
use bind::ClassRole;
use serde::Serialize;
use std::fmt::{self, Write};
use std::fs;
use std::path::{Path, PathBuf};

/// Holder template spellings per ownership kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holders {
    pub shared: String,
    pub nodelete: String,
    pub handle: String,
}

impl Holders {
    pub fn spelling(&self, kind: OwnershipKind) -> &str {
        match kind {
            OwnershipKind::Shared => &self.shared,
            OwnershipKind::NoDelete => &self.nodelete,
            OwnershipKind::Handle => &self.handle,
        }
    }
}

/// Settings the emitter needs.
#[derive(Debug, Clone)]
pub struct EmitOptions {
    /// Written verbatim at the top of every unit
    pub preamble: String,
    pub common_headers: Vec<String>,
    pub holders: Holders,
}

impl EmitOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            preamble: settings.preamble.clone(),
            common_headers: settings.bind.common_headers.clone(),
            holders: Holders {
                shared: settings.bind.shared_holder.clone(),
                nodelete: settings.bind.nodelete_holder.clone(),
                handle: settings.bind.handle_holder.clone(),
            },
        }
    }
}

/// One generated translation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    /// File name relative to the output directory
    pub name: String,
    pub contents: String,
}

/// What [`emit`] wrote.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EmitReport {
    pub output_dir: PathBuf,
    pub templates: usize,
    pub modules: usize,
    pub units: Vec<String>,
}

/// Render every unit of a plan: templates, modules, then the root unit.
pub fn render(plan: &BindingPlan, options: &EmitOptions) -> BindResult<Vec<SourceUnit>> {
    let mut units = Vec::new();

    for template in &plan.templates {
        units.push(unit(&template.source_name, |out| {
            render_template_unit(out, template, options)
        })?);
    }

    for module in &plan.modules {
        units.push(unit(&format!("{}.cxx", module.name), |out| {
            render_module_unit(out, plan, module, options)
        })?);
    }

    units.push(unit(&format!("{}.cxx", plan.root_module), |out| {
        render_root_unit(out, plan, options)
    })?);

    Ok(units)
}

fn unit(name: &str, render: impl FnOnce(&mut String) -> fmt::Result) -> BindResult<SourceUnit> {
    let mut contents = String::new();
    render(&mut contents).map_err(|e| BindError::EmitFailed {
        path: PathBuf::from(name),
        reason: e.to_string(),
    })?;
    Ok(SourceUnit {
        name: name.to_string(),
        contents,
    })
}

fn include_block(out: &mut String, label: &str, headers: &[impl AsRef<str>]) -> fmt::Result {
    if headers.is_empty() {
        return Ok(());
    }
    writeln!(out, "// {label}")?;
    for header in headers {
        writeln!(out, "#include <{}>", header.as_ref())?;
    }
    writeln!(out)
}

/// Extra includes of a template and the templates nested in it, first-seen order
fn template_includes<'a>(template: &'a TemplatePlan, includes: &mut Vec<&'a str>) {
    for include in &template.extra_includes {
        if include != &template.source_name && !includes.contains(&include.as_str()) {
            includes.push(include);
        }
    }
    for nested in &template.nested_templates {
        template_includes(nested, includes);
    }
}

fn render_template_unit(
    out: &mut String,
    template: &TemplatePlan,
    options: &EmitOptions,
) -> fmt::Result {
    out.push_str(&options.preamble);
    writeln!(out, "#pragma once")?;
    writeln!(out)?;

    include_block(out, "Common headers", &options.common_headers)?;
    include_block(out, "Headers for this template", &[&template.header])?;

    let mut includes = Vec::new();
    template_includes(template, &mut includes);
    include_block(out, "Extra includes", &includes)?;

    bind::bind_template(out, template, &options.holders)
}

fn render_module_unit(
    out: &mut String,
    plan: &BindingPlan,
    module: &ModulePlan,
    options: &EmitOptions,
) -> fmt::Result {
    out.push_str(&options.preamble);

    include_block(out, "Common includes", &options.common_headers)?;
    include_block(out, "Manually specified includes", &module.extra_headers)?;

    writeln!(out, "// Module includes")?;
    for header in &module.headers {
        writeln!(out, "#include <{header}>")?;
    }
    writeln!(out)?;

    include_block(out, "Extra includes", &module.extra_includes)?;

    writeln!(out, "void bind_{}_enums(py::module &main){{", module.name)?;
    writeln!(out)?;
    writeln!(out, "py::module mod = main.attr(\"{}\");", module.name)?;
    writeln!(out)?;
    for enumeration in &module.enums {
        bind::bind_enum(out, enumeration)?;
    }
    writeln!(out, "}}")?;
    writeln!(out)?;

    writeln!(out, "void bind_{}_functions(py::module &main){{", module.name)?;
    writeln!(out)?;
    writeln!(out, "py::module mod = main.attr(\"{}\");", module.name)?;
    writeln!(out)?;
    for function in &module.functions {
        bind::bind_function(out, function)?;
    }
    writeln!(out, "}}")?;
    writeln!(out)?;

    for ty in plan.module_types(&module.name) {
        match ty {
            TypePlan::Class(class) => {
                bind::bind_class(out, class, ClassRole::TopLevel, &options.holders)?
            }
            TypePlan::Typedef(typedef) => bind::bind_typedef(out, typedef)?,
        }
    }
    Ok(())
}

fn render_root_unit(out: &mut String, plan: &BindingPlan, options: &EmitOptions) -> fmt::Result {
    out.push_str(&options.preamble);
    include_block(out, "Common headers", &options.common_headers)?;

    writeln!(out, "// Enums")?;
    for module in &plan.modules {
        writeln!(out, "void bind_{}_enums(py::module&);", module.name)?;
    }
    writeln!(out, "// Functions")?;
    for module in &plan.modules {
        writeln!(out, "void bind_{}_functions(py::module&);", module.name)?;
    }
    writeln!(out, "// Types")?;
    for ty in &plan.types {
        writeln!(out, "void {}(py::module&);", ty.bind_function())?;
    }

    writeln!(out)?;
    writeln!(out, "PYBIND11_MODULE({}, main) {{", plan.root_module)?;
    writeln!(out)?;

    writeln!(out, "// Submodules")?;
    for module in &plan.modules {
        writeln!(
            out,
            "main.def_submodule(\"{0}\", \"The {0} module.\");",
            module.name
        )?;
    }
    writeln!(out)?;

    writeln!(out, "// Enums")?;
    for module in &plan.modules {
        writeln!(out, "bind_{}_enums(main);", module.name)?;
    }
    writeln!(out, "// Functions")?;
    for module in &plan.modules {
        writeln!(out, "bind_{}_functions(main);", module.name)?;
    }
    writeln!(out, "// Types")?;
    for ty in &plan.types {
        writeln!(out, "{}(main);", ty.bind_function())?;
    }

    writeln!(out, "// Aliases")?;
    for alias in &plan.aliases {
        let owner: String = alias
            .owner_path
            .iter()
            .map(|attr| format!(".attr(\"{attr}\")"))
            .collect();
        writeln!(
            out,
            "main.attr(\"{}\").attr(\"{}\") = main.attr(\"{}\"){owner};",
            alias.module, alias.python_name, alias.owner_module
        )?;
    }

    writeln!(out)?;
    writeln!(out, "}}")
}

/// Render a plan and replace `output_dir` with the generated units.
pub fn emit(plan: &BindingPlan, options: &EmitOptions, output_dir: &Path) -> BindResult<EmitReport> {
    let units = render(plan, options)?;
    write_units(&units, output_dir)?;

    tracing::info!(
        "Wrote {} units to {}",
        units.len(),
        output_dir.display()
    );

    Ok(EmitReport {
        output_dir: output_dir.to_path_buf(),
        templates: plan.templates.len(),
        modules: plan.modules.len(),
        units: units.into_iter().map(|u| u.name).collect(),
    })
}

/// Write units into a staging directory next to `output_dir`, then swap it in.
pub fn write_units(units: &[SourceUnit], output_dir: &Path) -> BindResult<()> {
    let parent = output_dir
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    fs::create_dir_all(parent).map_err(|source| BindError::FileWrite {
        path: parent.to_path_buf(),
        source,
    })?;

    let staging = tempfile::Builder::new()
        .prefix(".bindforge-staging-")
        .tempdir_in(parent)
        .map_err(|source| BindError::FileWrite {
            path: parent.to_path_buf(),
            source,
        })?;

    for unit in units {
        let path = staging.path().join(&unit.name);
        fs::write(&path, &unit.contents).map_err(|source| BindError::FileWrite { path, source })?;
        tracing::debug!("Staged {}", unit.name);
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(staging.path(), fs::Permissions::from_mode(0o755)).map_err(
            |source| BindError::FileWrite {
                path: staging.path().to_path_buf(),
                source,
            },
        )?;
    }

    swap_in(staging, parent, output_dir)
}

fn swap_in(staging: tempfile::TempDir, parent: &Path, output_dir: &Path) -> BindResult<()> {
    let swap_failed = |reason: String| BindError::EmitFailed {
        path: output_dir.to_path_buf(),
        reason,
    };

    // The previous output is moved aside and dropped only after the swap
    let previous = if output_dir.exists() {
        let holder = tempfile::Builder::new()
            .prefix(".bindforge-previous-")
            .tempdir_in(parent)
            .map_err(|e| swap_failed(e.to_string()))?;
        fs::rename(output_dir, holder.path().join("output"))
            .map_err(|e| swap_failed(format!("cannot move previous output aside: {e}")))?;
        Some(holder)
    } else {
        None
    };

    let staged = staging.keep();
    if let Err(e) = fs::rename(&staged, output_dir) {
        if let Some(holder) = &previous {
            if let Err(restore) = fs::rename(holder.path().join("output"), output_dir) {
                tracing::error!("Failed to restore previous output: {restore}");
            }
        }
        if let Err(cleanup) = fs::remove_dir_all(&staged) {
            tracing::warn!("Failed to remove staging directory {}: {cleanup}", staged.display());
        }
        return Err(swap_failed(e.to_string()));
    }

    Ok(())
}
