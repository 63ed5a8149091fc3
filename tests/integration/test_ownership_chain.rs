//! Holder classification across inheritance chains.

use super::common::{default_options, position, render, run_all, unit};
use bindforge::frontend::BaseSpecifier;
use bindforge::plan::TypePlan;
use bindforge::{AllowAll, Declaration, OwnershipKind, PipelineOutput};

fn ownership(output: &PipelineOutput, name: &str) -> OwnershipKind {
    match &output.plan.types[position(output, name)] {
        TypePlan::Class(class) => class.ownership,
        TypePlan::Typedef(_) => panic!("{name} is a typedef"),
    }
}

fn chain() -> Vec<Declaration> {
    vec![
        Declaration::class("Leaf")
            .in_header("Leaf.hxx")
            .with_base(BaseSpecifier::class("Mid")),
        Declaration::class("Mid")
            .in_header("Mid.hxx")
            .with_base(BaseSpecifier::class("Root")),
        Declaration::class("Root").in_header("Root.hxx"),
        Declaration::class("Other").in_header("Other.hxx"),
    ]
}

#[test]
fn test_handle_ownership_is_transitive() {
    let mut options = default_options();
    options.resolve.handle_root = "Root".to_string();
    let output = bindforge::run(chain(), &AllowAll, &options).unwrap();

    assert_eq!(output.stats.resolve.handle_classes, 3);
    for name in ["Root", "Mid", "Leaf"] {
        assert_eq!(ownership(&output, name), OwnershipKind::Handle, "{name}");
    }
    assert_eq!(ownership(&output, "Other"), OwnershipKind::Shared);

    // Bases are registered before their dependents
    assert!(position(&output, "Root") < position(&output, "Mid"));
    assert!(position(&output, "Mid") < position(&output, "Leaf"));

    let units = render(&output);
    let leaf = unit(&units, "Leaf.cxx");
    assert!(leaf.contains("py::class_<Leaf, opencascade::handle<Leaf>, Mid> cls_Leaf(mod, \"Leaf\""));
}

#[test]
fn test_hidden_destructor_uses_nodelete_holder() {
    let output = run_all(vec![
        Declaration::class("Message_Registry")
            .in_header("Message_Registry.hxx")
            .with_child(
                Declaration::destructor("~Message_Registry")
                    .with_access(bindforge::Access::Private),
            ),
    ]);

    assert_eq!(ownership(&output, "Message_Registry"), OwnershipKind::NoDelete);
    let units = render(&output);
    assert!(unit(&units, "Message.cxx").contains(
        "py::class_<Message_Registry, shared_ptr_nodelete<Message_Registry>>"
    ));
}

#[test]
fn test_nested_class_follows_outer_ownership() {
    let output = run_all(vec![
        Declaration::class("Standard_Transient").in_header("Standard_Transient.hxx"),
        Declaration::class("Geom_Curve")
            .in_header("Geom_Curve.hxx")
            .with_base(BaseSpecifier::class("Standard_Transient"))
            .with_child(Declaration::class("Geom_Curve::Cache")),
    ]);

    let registry = &output.registry;
    let nested = registry.class(registry.find_class("Geom_Curve::Cache").unwrap());
    assert_eq!(nested.ownership, OwnershipKind::Handle);
    assert!(nested.is_nested);
}

#[test]
fn test_inheritance_cycle_terminates() {
    let output = run_all(vec![
        Declaration::class("A").in_header("A.hxx").with_base(BaseSpecifier::class("B")),
        Declaration::class("B").in_header("B.hxx").with_base(BaseSpecifier::class("A")),
    ]);

    // Both still get planned exactly once, in ingestion order
    let names: Vec<_> = output.plan.types.iter().map(|t| t.register_name()).collect();
    assert_eq!(names, vec!["A", "B"]);
    assert_eq!(ownership(&output, "A"), OwnershipKind::Shared);
}
