//! Alias ownership and typedef-transparent bases, end to end.

use super::common::{render, run_all, unit};
use bindforge::frontend::BaseSpecifier;
use bindforge::{Declaration, EntityRef};

#[test]
fn test_class_first_owns_canonical_type() {
    let output = run_all(vec![
        Declaration::class("Foo").in_header("Foo.hxx"),
        Declaration::typedef("Alias1", "Foo").in_header("Foo_Alias1.hxx"),
    ]);

    let registry = &output.registry;
    let alias = registry.typedef(registry.find_typedef("Alias1").unwrap());
    assert!(alias.is_alias);
    assert_eq!(
        alias.alias_of,
        Some(EntityRef::Class(registry.find_class("Foo").unwrap()))
    );

    assert_eq!(output.plan.aliases.len(), 1);
    assert_eq!(output.plan.aliases[0].owner, "Foo");
    // Aliases never get a registration of their own
    assert!(output.plan.type_position("Alias1").is_none());
}

#[test]
fn test_reversed_order_stays_consistent() {
    let output = run_all(vec![
        Declaration::typedef("Alias1", "Foo").in_header("Foo_Alias1.hxx"),
        Declaration::class("Foo").in_header("Foo.hxx"),
    ]);

    let registry = &output.registry;
    let alias = registry.typedef(registry.find_typedef("Alias1").unwrap());
    let owner = alias.alias_of.expect("alias without owner");
    assert!(!registry.is_excluded(owner));
    assert_eq!(registry.entity_name(owner), "Foo");

    let units = render(&output);
    let root = unit(&units, "OCCT.cxx");
    assert!(root.contains("main.attr(\"Foo\").attr(\"Alias1\") = main.attr(\"Foo\").attr(\"Foo\");"));
}

#[test]
fn test_first_typedef_owns_shared_instantiation() {
    let output = run_all(vec![
        Declaration::class_template("NCollection_List<TheItemType>", &["typename TheItemType"])
            .in_header("NCollection_List.hxx"),
        Declaration::typedef("TColStd_ListOfInteger", "NCollection_List<int>")
            .in_header("TColStd_ListOfInteger.hxx")
            .with_specialization("NCollection_List<TheItemType>"),
        Declaration::typedef("TColStd_ListOfInt", "NCollection_List<int>")
            .in_header("TColStd_ListOfInt.hxx")
            .with_specialization("NCollection_List<TheItemType>"),
    ]);

    assert_eq!(output.stats.resolve.aliases, 1);
    assert!(output.plan.type_position("TColStd_ListOfInteger").is_some());
    assert!(output.plan.type_position("TColStd_ListOfInt").is_none());
    assert_eq!(output.plan.aliases[0].register_name, "TColStd_ListOfInt");
    assert_eq!(output.plan.aliases[0].owner, "TColStd_ListOfInteger");
}

#[test]
fn test_base_through_alias_resolves_to_owner() {
    let output = run_all(vec![
        Declaration::class("Base").in_header("Base.hxx"),
        Declaration::typedef("BaseAlias", "Base").in_header("Base_Alias.hxx"),
        Declaration::class("Derived")
            .in_header("Derived.hxx")
            .with_base(BaseSpecifier::typedef("BaseAlias")),
    ]);

    let registry = &output.registry;
    let derived = registry.class(registry.find_class("Derived").unwrap());
    let targets: Vec<_> = derived
        .resolved_bases()
        .filter_map(|b| b.target)
        .map(|target| registry.entity_name(target).to_string())
        .collect();
    assert_eq!(targets, vec!["Base"]);

    let units = render(&output);
    let module = unit(&units, "Derived.cxx");
    assert!(module.contains("py::class_<Derived, std::shared_ptr<Derived>, Base>"));
    assert!(output.plan.type_position("Base").unwrap() < output.plan.type_position("Derived").unwrap());
}

#[test]
fn test_alias_of_excluded_owner_is_dropped() {
    let mut settings = bindforge::Settings::default();
    settings.exclude.classes = vec!["Gone*".to_string()];

    let output = bindforge::run_with_settings(
        vec![
            Declaration::class("Gone").in_header("Gone.hxx"),
            Declaration::typedef("Gone_Alias", "Gone").in_header("Gone_Alias.hxx"),
        ],
        &settings,
    )
    .unwrap();

    assert!(output.plan.aliases.is_empty());
    assert!(output.plan.types.is_empty());
    assert_eq!(output.diagnostics.for_subject("Gone").count(), 1);
}
