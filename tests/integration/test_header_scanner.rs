//! The tree-sitter front end on a directory of real-looking headers.

use super::common::{TestProject, default_options, include_dir, position, unit};
use bindforge::emit::{EmitOptions, render};
use bindforge::plan::{RegistrationMode, TypePlan};
use bindforge::{AllowAll, DeclKind, HeaderScanner, OwnershipKind, Settings, run, run_with_settings};

fn scanner() -> HeaderScanner {
    HeaderScanner::from_settings(&Settings::default()).with_include_dir(include_dir())
}

#[test]
fn test_discovers_headers_case_insensitively() {
    let headers = scanner().discover().unwrap();
    let names: Vec<_> = headers
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();

    assert_eq!(names.first().map(String::as_str), Some("Geom_Geometry.hxx"));
    assert_eq!(names.last().map(String::as_str), Some("TopTools_ShapeSet.hxx"));
    assert!(!names.contains(&"README.txt".to_string()));
    assert_eq!(names.len(), 14);
}

#[test]
fn test_scanned_declarations() {
    let scanned = scanner().scan().unwrap();
    assert_eq!(scanned.headers().len(), 14);

    let find = |name: &str| {
        scanned
            .declarations()
            .iter()
            .find(|d| d.name() == name)
            .unwrap_or_else(|| panic!("{name} not scanned"))
    };

    let point = find("Geom_Point");
    assert_eq!(point.kind, DeclKind::ClassDecl);
    assert_eq!(point.header.as_deref(), Some("Geom_Point.hxx"));
    assert_eq!(point.bases[0].type_spelling, "Geom_Geometry");
    let inherited = &point.bases[0].referenced.as_ref().unwrap().bases;
    assert_eq!(inherited[0].type_spelling, "Standard_Transient");

    let list = find("NCollection_List<TheItemType>");
    assert_eq!(list.kind, DeclKind::ClassTemplate);
    assert_eq!(list.template_parameters, vec!["class TheItemType"]);

    let typedef = find("TopTools_ListOfShape");
    assert_eq!(typedef.canonical(), "NCollection_List<TopoDS_Shape>");
    assert_eq!(typedef.specialization.as_deref(), Some("NCollection_List<TheItemType>"));

    let shape = find("GeomAbs_Shape");
    assert_eq!(shape.kind, DeclKind::EnumDecl);
    assert_eq!(shape.children.len(), 3);

    let geometry = find("Geom_Geometry");
    assert!(geometry.children.iter().any(|c| c.is_pure_virtual));
}

#[test]
fn test_scanned_headers_run_through_pipeline() {
    let output = run(scanner().scan().unwrap(), &AllowAll, &default_options()).unwrap();

    // Handle chain through the export macros
    let TypePlan::Class(point) = &output.plan.types[position(&output, "Geom_Point")] else {
        panic!("Geom_Point is not a class");
    };
    assert_eq!(point.ownership, OwnershipKind::Handle);
    assert_eq!(point.bases, vec!["Geom_Geometry"]);
    assert!(position(&output, "Standard_Transient") < position(&output, "Geom_Geometry"));
    assert!(position(&output, "Geom_Geometry") < position(&output, "Geom_Point"));

    // The typedef owns the list instantiation, the class only reaches it
    assert!(position(&output, "TopTools_ListOfShape") < position(&output, "TopTools_ShapeSet"));
    let TypePlan::Class(shape_set) = &output.plan.types[position(&output, "TopTools_ShapeSet")] else {
        panic!("TopTools_ShapeSet is not a class");
    };
    assert_eq!(shape_set.extra_bases[0].mode, RegistrationMode::SkipIfBound);

    let alias = output
        .plan
        .aliases
        .iter()
        .find(|a| a.register_name == "gp_Point")
        .expect("gp_Point alias");
    assert_eq!(alias.owner, "gp_Pnt");

    let precision = output.plan.module("Precision").unwrap();
    let functions: Vec<_> = precision
        .functions
        .iter()
        .map(|f| f.register_name.as_str())
        .collect();
    assert_eq!(functions, vec!["Precision_Angular", "Precision_Confusion"]);

    let units = render(&output.plan, &EmitOptions::from_settings(&Settings::default())).unwrap();
    let geom = unit(&units, "Geom.cxx");
    assert!(geom.contains("py::class_<Geom_Point, opencascade::handle<Geom_Point>, Geom_Geometry>"));
    let root = unit(&units, "OCCT.cxx");
    assert!(root.contains("main.attr(\"gp\").attr(\"gp_Point\") = main.attr(\"gp\").attr(\"gp_Pnt\");"));
}

#[test]
fn test_configured_exclusions_apply_to_scanned_headers() {
    let mut settings = Settings::default();
    settings.parse.include_dir = include_dir();
    settings.parse.excluded_headers = vec!["Precision.hxx".to_string()];
    settings.exclude.classes = vec!["*_Internal".to_string()];

    let scanned = HeaderScanner::from_settings(&settings).scan().unwrap();
    assert!(!scanned.headers().contains(&"Precision.hxx".to_string()));

    let output = run_with_settings(scanned, &settings).unwrap();
    assert!(output.plan.module("Precision").is_none());
    assert!(output.plan.type_position("Standard_Internal").is_none());
    assert_eq!(output.diagnostics.for_subject("Standard_Internal").count(), 1);
}

#[test]
fn test_scan_inline_sources() {
    let project = TestProject::new();
    project.add_file(
        "inc/Bnd_Box.hxx",
        "class Bnd_Box {\npublic:\n  Standard_EXPORT void Add(const Bnd_Box& theOther);\n};\n",
    );

    let scanned = HeaderScanner::new(project.path().join("inc")).scan().unwrap();
    assert_eq!(scanned.len(), 1);
    let class = &scanned.declarations()[0];
    assert_eq!(class.name(), "Bnd_Box");
    assert_eq!(class.children[0].spelling, "Add");
    assert_eq!(class.children[0].children[0].spelling, "theOther");
}
