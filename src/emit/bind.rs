//! pybind11 text for single plan elements.

use super::Holders;
use crate::model::{ConstructorEntity, EnumEntity, FunctionEntity, MethodEntity, ParameterEntity};
use crate::plan::{ClassPlan, ExtraBaseCall, NameArgument, RegistrationMode, TemplatePlan, TypedefPlan};
use std::fmt::{self, Write};

/// Where a class registration is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassRole {
    /// Own `bind_<X>(py::module &main)` function
    TopLevel,
    /// Body of a template registration function
    TemplateBody,
    /// Inside the enclosing class registration
    Nested,
}

fn banner(out: &mut String, what: &str, source: &str) -> fmt::Result {
    let rule = "=".repeat(93);
    writeln!(out, "// {rule} //")?;
    writeln!(out, "// {what}")?;
    writeln!(out, "// Source: {source}")?;
    writeln!(out, "// {rule} //")
}

fn parameter_types(parameters: &[ParameterEntity]) -> String {
    parameters
        .iter()
        .map(|p| p.type_name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// `, py::arg("a")=1, py::arg("b"), ` (always starts and ends with a separator)
fn keyword_arguments(parameters: &[ParameterEntity]) -> String {
    let mut args = String::from(", ");
    for p in parameters {
        args.push_str(&format!("py::arg(\"{}\")", p.name));
        if let Some(default) = &p.default_value {
            args.push('=');
            args.push_str(default);
        }
        args.push_str(", ");
    }
    args
}

pub fn bind_function(out: &mut String, function: &FunctionEntity) -> fmt::Result {
    banner(out, &format!("Function: {}", function.register_name), &function.header)?;

    writeln!(out, "mod.def(\"{}\",", function.python_name)?;
    writeln!(
        out,
        "     ({} (*) ({})) &{},",
        function.result_name,
        parameter_types(&function.parameters),
        function.register_name
    )?;
    write!(out, "     R\"({})\"", function.docs)?;

    let args: Vec<String> = function
        .parameters
        .iter()
        .map(|p| format!("py::arg(\"{}\")", p.name))
        .collect();
    if args.is_empty() {
        writeln!(out, ");")?;
    } else {
        writeln!(out, ",")?;
        writeln!(out, "     {});", args.join(", "))?;
    }
    writeln!(out)
}

pub fn bind_enum(out: &mut String, enumeration: &EnumEntity) -> fmt::Result {
    if enumeration.is_nested {
        writeln!(out, "// Nested enum: {}", enumeration.register_name)?;
    } else if enumeration.is_anonymous {
        banner(out, "Anonymous Enum", &enumeration.header)?;
    } else {
        banner(
            out,
            &format!("Enum: {}", enumeration.register_name),
            &enumeration.header,
        )?;
    }

    // Anonymous enums become plain integer attributes
    if enumeration.is_anonymous {
        for constant in &enumeration.constants {
            writeln!(
                out,
                "{}.attr(\"{}\") = py::cast(int({}));",
                enumeration.container, constant.python_name, constant.register_name
            )?;
        }
        return writeln!(out);
    }

    writeln!(
        out,
        "py::enum_<{}>({}, \"{}\", R\"({})\")",
        enumeration.register_name, enumeration.container, enumeration.python_name, enumeration.docs
    )?;
    for constant in &enumeration.constants {
        writeln!(
            out,
            "\t.value(\"{}\", {})",
            constant.python_name, constant.register_name
        )?;
    }
    writeln!(out, "\t.export_values();")?;
    writeln!(out)
}

fn bind_constructor(out: &mut String, object: &str, constructor: &ConstructorEntity) -> fmt::Result {
    writeln!(
        out,
        "{object}.def(py::init<{}>(){}R\"({})\");",
        parameter_types(&constructor.parameters),
        keyword_arguments(&constructor.parameters),
        constructor.docs
    )
}

fn bind_method(out: &mut String, class: &ClassPlan, method: &MethodEntity) -> fmt::Result {
    let (suffix, pointer) = if method.is_static {
        ("_static", "*".to_string())
    } else {
        ("", format!("{}::*", class.register_name))
    };
    let constness = if method.is_const { " const" } else { "" };

    writeln!(
        out,
        "{}.def{suffix}(\"{}\", ({} ({pointer})({}){constness}) &{}{}R\"({})\");",
        class.object_name,
        method.python_name,
        method.result_name,
        parameter_types(&method.parameters),
        method.register_name,
        keyword_arguments(&method.parameters),
        method.docs
    )
}

fn bind_extra_base(out: &mut String, call: &ExtraBaseCall) -> fmt::Result {
    match call.mode {
        RegistrationMode::Register => writeln!(out, "// Register base: {}", call.base)?,
        RegistrationMode::SkipIfBound => {
            writeln!(out, "// Register base (skipped if bound): {}", call.base)?
        }
    }
    let name = match &call.name {
        NameArgument::Forward => "name".to_string(),
        NameArgument::Literal(python) => format!("\"{python}\""),
    };
    writeln!(
        out,
        "{}{}(mod, {name}, true);",
        call.function_name, call.parameters
    )?;
    writeln!(out)
}

fn injected(out: &mut String, label: &str, lines: &[String]) -> fmt::Result {
    if lines.is_empty() {
        return Ok(());
    }
    writeln!(out, "// {label}")?;
    for line in lines {
        writeln!(out, "{line}")?;
    }
    writeln!(out)
}

pub fn bind_class(
    out: &mut String,
    class: &ClassPlan,
    role: ClassRole,
    holders: &Holders,
) -> fmt::Result {
    match role {
        ClassRole::TopLevel => {
            banner(out, &format!("Class: {}", class.register_name), &class.header)?;
            writeln!(out, "void bind_{}(py::module &main){{", class.python_name)?;
            writeln!(out)?;
        }
        ClassRole::Nested => writeln!(out, "// Nested class: {}", class.register_name)?,
        ClassRole::TemplateBody => {}
    }

    injected(out, "Before", &class.before)?;

    if role == ClassRole::TopLevel {
        writeln!(out, "py::module mod = main.attr(\"{}\");", class.module)?;
    }

    if role == ClassRole::TemplateBody {
        writeln!(out, "// Register name")?;
        writeln!(out, "std::string register_name;")?;
        writeln!(out, "if (is_base) {{")?;
        writeln!(out, "\tregister_name = name + \"_{}\";", class.python_name)?;
        writeln!(out, "}} else {{")?;
        writeln!(out, "\tregister_name = name;")?;
        writeln!(out, "}}")?;
        writeln!(out)?;

        writeln!(out, "// Skip if a base class is already registered")?;
        writeln!(
            out,
            "if (py::detail::get_type_handle(typeid({}), false) && is_base) {{",
            class.register_name
        )?;
        writeln!(out, "\treturn;")?;
        writeln!(out, "}}")?;
        writeln!(out)?;
    }

    for call in &class.extra_bases {
        bind_extra_base(out, call)?;
    }

    let holder = format!("{}<{}>", holders.spelling(class.ownership), class.register_name);
    let bases: String = class.bases.iter().map(|b| format!(", {b}")).collect();
    let python_name = match role {
        ClassRole::TemplateBody => "register_name.c_str()".to_string(),
        _ => format!("\"{}\"", class.python_name),
    };
    let local = if role == ClassRole::Nested {
        ", py::module_local()"
    } else {
        ""
    };

    writeln!(
        out,
        "py::class_<{}, {holder}{bases}> {}({}, {python_name}, R\"({})\"{local});",
        class.register_name, class.object_name, class.container, class.docs
    )?;

    if !class.is_abstract {
        writeln!(out)?;
        writeln!(out, "// Constructors")?;
        for constructor in &class.constructors {
            bind_constructor(out, &class.object_name, constructor)?;
        }
    }

    writeln!(out)?;
    writeln!(out, "// Methods")?;
    for method in &class.methods {
        bind_method(out, class, method)?;
    }

    if !class.enums.is_empty() {
        writeln!(out)?;
    }
    for enumeration in &class.enums {
        bind_enum(out, enumeration)?;
    }

    if !class.nested_classes.is_empty() {
        writeln!(out)?;
    }
    for nested in &class.nested_classes {
        bind_class(out, nested, ClassRole::Nested, holders)?;
    }

    if !class.after.is_empty() {
        writeln!(out)?;
    }
    injected(out, "After", &class.after)?;

    if role != ClassRole::Nested {
        writeln!(out)?;
        writeln!(out, "}}")?;
        writeln!(out)?;
    }
    Ok(())
}

pub fn bind_typedef(out: &mut String, typedef: &TypedefPlan) -> fmt::Result {
    banner(out, &format!("Typedef: {}", typedef.register_name), &typedef.header)?;
    writeln!(out, "void bind_{}(py::module &main){{", typedef.python_name)?;
    writeln!(out)?;
    writeln!(out, "py::module mod = main.attr(\"{}\");", typedef.module)?;
    writeln!(
        out,
        "{}{}(mod, \"{}\");",
        typedef.function_name, typedef.parameters, typedef.python_name
    )?;
    writeln!(out)?;
    writeln!(out, "}}")?;
    writeln!(out)
}

/// A template registration function followed by its nested templates
pub fn bind_template(out: &mut String, template: &TemplatePlan, holders: &Holders) -> fmt::Result {
    banner(
        out,
        &format!("Template: {}", template.body.register_name),
        &template.header,
    )?;
    writeln!(out, "template<{}>", template.parameters.join(", "))?;
    writeln!(
        out,
        "void {}(py::module &mod, std::string const &name, bool const is_base=false){{",
        template.function_name
    )?;
    writeln!(out)?;

    bind_class(out, &template.body, ClassRole::TemplateBody, holders)?;

    for nested in &template.nested_templates {
        bind_template(out, nested, holders)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EnumConstantEntity;
    use crate::types::OwnershipKind;

    fn holders() -> Holders {
        Holders {
            shared: "std::shared_ptr".to_string(),
            nodelete: "shared_ptr_nodelete".to_string(),
            handle: "opencascade::handle".to_string(),
        }
    }

    fn parameter(type_name: &str, name: &str, default_value: Option<&str>) -> ParameterEntity {
        ParameterEntity {
            type_name: type_name.to_string(),
            name: name.to_string(),
            default_value: default_value.map(str::to_string),
        }
    }

    fn class(name: &str) -> ClassPlan {
        ClassPlan {
            register_name: name.to_string(),
            python_name: name.to_string(),
            object_name: format!("cls_{name}"),
            header: format!("{name}.hxx"),
            module: "gp".to_string(),
            container: "mod".to_string(),
            docs: String::new(),
            ownership: OwnershipKind::Shared,
            bases: Vec::new(),
            extra_bases: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
            enums: Vec::new(),
            nested_classes: Vec::new(),
            before: Vec::new(),
            after: Vec::new(),
            extra_includes: Vec::new(),
            is_template: false,
            is_nested: false,
            is_abstract: false,
        }
    }

    #[test]
    fn test_top_level_class() {
        let mut pnt = class("gp_Pnt");
        pnt.ownership = OwnershipKind::Handle;
        pnt.bases = vec!["gp_Base".to_string()];
        pnt.constructors.push(ConstructorEntity {
            spelling: "gp_Pnt".to_string(),
            parameters: vec![parameter("double", "x", Some("0.0"))],
            docs: "Ctor".to_string(),
            is_excluded: false,
        });
        pnt.methods.push(MethodEntity {
            register_name: "gp_Pnt::X".to_string(),
            python_name: "X".to_string(),
            result_name: "double".to_string(),
            parameters: Vec::new(),
            is_static: false,
            is_const: true,
            is_virtual: false,
            is_pure_virtual: false,
            docs: String::new(),
            is_excluded: false,
        });

        let mut out = String::new();
        bind_class(&mut out, &pnt, ClassRole::TopLevel, &holders()).unwrap();

        assert!(out.starts_with(&format!("// {} //\n// Class: gp_Pnt\n", "=".repeat(93))));
        assert!(out.contains("void bind_gp_Pnt(py::module &main){\n"));
        assert!(out.contains("py::module mod = main.attr(\"gp\");\n"));
        assert!(out.contains(
            "py::class_<gp_Pnt, opencascade::handle<gp_Pnt>, gp_Base> cls_gp_Pnt(mod, \"gp_Pnt\", R\"()\");\n"
        ));
        assert!(out.contains(
            "cls_gp_Pnt.def(py::init<double>(), py::arg(\"x\")=0.0, R\"(Ctor)\");\n"
        ));
        assert!(out.contains(
            "cls_gp_Pnt.def(\"X\", (double (gp_Pnt::*)() const) &gp_Pnt::X, R\"()\");\n"
        ));
        assert!(out.ends_with("\n}\n\n"));
    }

    #[test]
    fn test_abstract_class_has_no_constructor_section() {
        let mut shape = class("Shape");
        shape.is_abstract = true;

        let mut out = String::new();
        bind_class(&mut out, &shape, ClassRole::TopLevel, &holders()).unwrap();
        assert!(!out.contains("// Constructors"));
        assert!(out.contains("// Methods"));
    }

    #[test]
    fn test_template_body_and_extra_bases() {
        let mut body = class("Derived<T>");
        body.python_name = "Derived".to_string();
        body.object_name = "cls_Derived".to_string();
        body.extra_bases.push(ExtraBaseCall {
            base: "Base<T>".to_string(),
            template: "Base<T>".to_string(),
            function_name: "bind_Base".to_string(),
            parameters: "<T>".to_string(),
            name: NameArgument::Forward,
            mode: RegistrationMode::SkipIfBound,
        });
        body.bases = vec!["Base<T>".to_string()];
        let template = TemplatePlan {
            register_name: "Derived<T>".to_string(),
            function_name: "bind_Derived".to_string(),
            source_name: "bind_Derived.hxx".to_string(),
            header: "Derived.hxx".to_string(),
            module: "Derived".to_string(),
            parameters: vec!["typename T".to_string()],
            body,
            nested_templates: Vec::new(),
            extra_includes: Vec::new(),
        };

        let mut out = String::new();
        bind_template(&mut out, &template, &holders()).unwrap();

        assert!(out.contains("template<typename T>\nvoid bind_Derived(py::module &mod, std::string const &name, bool const is_base=false){\n"));
        assert!(out.contains("\tregister_name = name + \"_Derived\";\n"));
        assert!(out.contains("if (py::detail::get_type_handle(typeid(Derived<T>), false) && is_base) {\n\treturn;\n}\n"));
        assert!(out.contains("bind_Base<T>(mod, name, true);\n"));
        assert!(out.contains(
            "py::class_<Derived<T>, std::shared_ptr<Derived<T>>, Base<T>> cls_Derived(mod, register_name.c_str(), R\"()\");\n"
        ));
    }

    #[test]
    fn test_extra_base_modes_emit_the_same_guarded_call() {
        let call = |mode| ExtraBaseCall {
            base: "NCollection_List<TopoDS_Shape>".to_string(),
            template: "NCollection_List<TheItemType>".to_string(),
            function_name: "bind_NCollection_List".to_string(),
            parameters: "<TopoDS_Shape>".to_string(),
            name: NameArgument::Literal("TopTools_ShapeSet".to_string()),
            mode,
        };

        let mut register = String::new();
        bind_extra_base(&mut register, &call(RegistrationMode::Register)).unwrap();
        let mut skip = String::new();
        bind_extra_base(&mut skip, &call(RegistrationMode::SkipIfBound)).unwrap();

        let line = "bind_NCollection_List<TopoDS_Shape>(mod, \"TopTools_ShapeSet\", true);\n";
        assert!(register.starts_with("// Register base: NCollection_List<TopoDS_Shape>\n"));
        assert!(skip.starts_with("// Register base (skipped if bound): NCollection_List<TopoDS_Shape>\n"));
        assert!(register.contains(line));
        assert!(skip.contains(line));
    }

    #[test]
    fn test_nested_class_is_module_local() {
        let mut outer = class("Outer");
        let mut inner = class("Outer::Inner");
        inner.python_name = "Inner".to_string();
        inner.object_name = "cls_Outer_Inner".to_string();
        inner.container = "cls_Outer".to_string();
        outer.nested_classes.push(inner);
        outer.before = vec!["// custom".to_string()];

        let mut out = String::new();
        bind_class(&mut out, &outer, ClassRole::TopLevel, &holders()).unwrap();
        assert!(out.contains("// Nested class: Outer::Inner\n"));
        assert!(out.contains("cls_Outer_Inner(cls_Outer, \"Inner\", R\"()\", py::module_local());"));
        assert!(out.contains("// Before\n// custom\n"));
    }

    #[test]
    fn test_enums() {
        let named = EnumEntity {
            register_name: "gp_TrsfForm".to_string(),
            python_name: "gp_TrsfForm".to_string(),
            header: "gp_TrsfForm.hxx".to_string(),
            module: "gp".to_string(),
            container: "mod".to_string(),
            docs: String::new(),
            constants: vec![EnumConstantEntity {
                register_name: "gp_TrsfForm::gp_Identity".to_string(),
                python_name: "gp_Identity".to_string(),
            }],
            is_anonymous: false,
            is_nested: false,
            is_excluded: false,
        };
        let mut out = String::new();
        bind_enum(&mut out, &named).unwrap();
        assert!(out.contains("py::enum_<gp_TrsfForm>(mod, \"gp_TrsfForm\", R\"()\")\n\t.value(\"gp_Identity\", gp_TrsfForm::gp_Identity)\n\t.export_values();\n"));

        let anonymous = EnumEntity {
            is_anonymous: true,
            constants: vec![EnumConstantEntity {
                register_name: "gp::Resolution".to_string(),
                python_name: "Resolution".to_string(),
            }],
            ..named
        };
        let mut out = String::new();
        bind_enum(&mut out, &anonymous).unwrap();
        assert!(out.contains("// Anonymous Enum\n"));
        assert!(out.contains("mod.attr(\"Resolution\") = py::cast(int(gp::Resolution));\n"));
    }

    #[test]
    fn test_function_and_typedef() {
        let function = FunctionEntity {
            register_name: "gp::Origin".to_string(),
            python_name: "Origin".to_string(),
            header: "gp.hxx".to_string(),
            module: "gp".to_string(),
            result_name: "const gp_Pnt &".to_string(),
            parameters: vec![parameter("int", "i", None)],
            docs: "Origin".to_string(),
            is_excluded: false,
        };
        let mut out = String::new();
        bind_function(&mut out, &function).unwrap();
        assert!(out.contains(
            "mod.def(\"Origin\",\n     (const gp_Pnt & (*) (int)) &gp::Origin,\n     R\"(Origin)\",\n     py::arg(\"i\"));\n"
        ));

        let typedef = TypedefPlan {
            register_name: "TColStd_ListOfInteger".to_string(),
            python_name: "TColStd_ListOfInteger".to_string(),
            header: "TColStd_ListOfInteger.hxx".to_string(),
            module: "TColStd".to_string(),
            template: "NCollection_List<TheItemType>".to_string(),
            function_name: "bind_NCollection_List".to_string(),
            parameters: "<int>".to_string(),
            extra_includes: Vec::new(),
        };
        let mut out = String::new();
        bind_typedef(&mut out, &typedef).unwrap();
        assert!(out.contains("py::module mod = main.attr(\"TColStd\");\nbind_NCollection_List<int>(mod, \"TColStd_ListOfInteger\");\n"));
    }
}
