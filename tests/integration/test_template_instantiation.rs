//! Shared template instantiations are registered at most once.

use super::common::{position, render, run_all, unit};
use bindforge::frontend::BaseSpecifier;
use bindforge::plan::{NameArgument, RegistrationMode, TypePlan};
use bindforge::Declaration;

fn list_template() -> Declaration {
    Declaration::class_template("NCollection_List<TheItemType>", &["typename TheItemType"])
        .in_header("NCollection_List.hxx")
        .with_base(BaseSpecifier::class("NCollection_BaseList"))
        .with_child(Declaration::method("Size", "Standard_Integer").const_method())
}

fn shape_list() -> Vec<Declaration> {
    vec![
        Declaration::class("NCollection_BaseList").in_header("NCollection_BaseList.hxx"),
        list_template(),
        Declaration::class("TopoDS_Shape").in_header("TopoDS_Shape.hxx"),
        Declaration::class("TopTools_ShapeSet")
            .in_header("TopTools_ShapeSet.hxx")
            .with_base(BaseSpecifier::instantiation(
                "NCollection_List<TopoDS_Shape>",
                "NCollection_List<TheItemType>",
            )),
        Declaration::typedef("TopTools_ListOfShape", "NCollection_List<TopoDS_Shape>")
            .in_header("TopTools_ListOfShape.hxx")
            .with_specialization("NCollection_List<TheItemType>"),
    ]
}

#[test]
fn test_typedef_registers_and_class_skips() {
    let output = run_all(shape_list());

    let typedef = position(&output, "TopTools_ListOfShape");
    let class = position(&output, "TopTools_ShapeSet");
    assert!(typedef < class, "typedef binding must own the instantiation");

    let TypePlan::Class(shape_set) = &output.plan.types[class] else {
        panic!("TopTools_ShapeSet is not a class");
    };
    assert_eq!(shape_set.extra_bases.len(), 1);
    let call = &shape_set.extra_bases[0];
    assert_eq!(call.function_name, "bind_NCollection_List");
    assert_eq!(call.parameters, "<TopoDS_Shape>");
    assert_eq!(call.mode, RegistrationMode::SkipIfBound);
    assert_eq!(call.name, NameArgument::Literal("TopTools_ShapeSet".to_string()));
}

#[test]
fn test_first_class_reacher_registers() {
    let mut decls = shape_list();
    decls.pop();
    let output = run_all(decls);

    let TypePlan::Class(shape_set) = &output.plan.types[position(&output, "TopTools_ShapeSet")] else {
        panic!("TopTools_ShapeSet is not a class");
    };
    assert_eq!(shape_set.extra_bases[0].mode, RegistrationMode::Register);
}

#[test]
fn test_emitted_units_share_one_template_unit() {
    let output = run_all(shape_list());
    let units = render(&output);

    let names: Vec<_> = units.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names.iter().filter(|n| n.starts_with("bind_")).count(), 1);
    assert!(names.contains(&"bind_NCollection_List.hxx"));

    let template = unit(&units, "bind_NCollection_List.hxx");
    assert!(template.contains("template<typename TheItemType>"));
    assert!(template.contains(
        "void bind_NCollection_List(py::module &mod, std::string const &name, bool const is_base=false){"
    ));

    let toptools = unit(&units, "TopTools.cxx");
    assert!(toptools.contains("bind_NCollection_List<TopoDS_Shape>(mod, \"TopTools_ListOfShape\");"));
    assert!(toptools.contains("// Register base (skipped if bound): NCollection_List<TopoDS_Shape>"));
    assert!(toptools.contains("#include <bind_NCollection_List.hxx>"));

    // The instantiation is registered by exactly one plain call
    assert_eq!(toptools.matches("// Register base: ").count(), 0);
}

#[test]
fn test_unregistered_template_excludes_typedef() {
    let output = run_all(vec![
        Declaration::class("TopoDS_Shape").in_header("TopoDS_Shape.hxx"),
        Declaration::typedef("TopTools_MapOfShape", "NCollection_Map<TopoDS_Shape>")
            .in_header("TopTools_MapOfShape.hxx")
            .with_specialization("NCollection_Map<TheKeyType>"),
    ]);

    assert!(output.plan.type_position("TopTools_MapOfShape").is_none());
    let reasons: Vec<_> = output
        .diagnostics
        .for_subject("TopTools_MapOfShape")
        .map(|d| d.reason.to_string())
        .collect();
    assert_eq!(reasons, vec!["unavailable template: NCollection_Map<TheKeyType>"]);
}
