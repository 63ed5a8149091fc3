//! Generated source layout and determinism.

use super::common::{TestProject, decls_path, default_options, render, unit};
use bindforge::{AllowAll, JsonSource, generate, run};
use std::fs;

fn output() -> bindforge::PipelineOutput {
    let source = JsonSource::from_path(decls_path()).expect("fixture dump");
    run(source, &AllowAll, &default_options()).unwrap()
}

#[test]
fn test_json_dump_ingestion_stats() {
    let output = output();
    let stats = &output.stats;

    assert_eq!(stats.ingest.classes, 5);
    assert_eq!(stats.ingest.templates, 1);
    assert_eq!(stats.ingest.typedefs, 2);
    assert_eq!(stats.ingest.enums, 1);
    assert_eq!(stats.ingest.functions, 2);
    // var_decl is not bindable
    assert_eq!(stats.ingest.skipped, 1);

    assert_eq!(stats.resolve.aliases, 1);
    assert_eq!(stats.resolve.linked_typedefs, 1);
    assert_eq!(stats.resolve.handle_classes, 3);

    let reasons: Vec<_> = output.diagnostics.iter().map(|d| d.to_string()).collect();
    assert_eq!(reasons, vec!["Excluding operator<< (operator function)"]);
}

#[test]
fn test_modules_are_sorted() {
    let output = output();
    let modules: Vec<_> = output.plan.modules.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(
        modules,
        vec!["Geom", "GeomAbs", "Message", "Precision", "Standard", "TColgp", "gp"]
    );
}

#[test]
fn test_root_unit_layout() {
    let units = render(&output());
    let root = unit(&units, "OCCT.cxx");

    let submodules = root.find("// Submodules").unwrap();
    let enums = root.find("bind_GeomAbs_enums(main);").unwrap();
    let functions = root.find("bind_Precision_functions(main);").unwrap();
    let transient = root.find("bind_Standard_Transient(main);").unwrap();
    let geometry = root.find("bind_Geom_Geometry(main);").unwrap();
    let curve = root.find("bind_Geom_Curve(main);").unwrap();
    let aliases = root.find("// Aliases").unwrap();

    assert!(submodules < enums);
    assert!(enums < functions);
    assert!(functions < transient);
    assert!(transient < geometry);
    assert!(geometry < curve);
    assert!(curve < aliases);
    assert!(root.contains("main.attr(\"gp\").attr(\"gp_Vector\") = main.attr(\"gp\").attr(\"gp_Vec\");"));
}

#[test]
fn test_class_registration_lines() {
    let units = render(&output());

    let geom = unit(&units, "Geom.cxx");
    assert!(geom.contains(
        "py::class_<Geom_Curve, opencascade::handle<Geom_Curve>, Geom_Geometry> cls_Geom_Curve(mod, \"Geom_Curve\""
    ));
    // Abstract classes get no constructors
    let geometry = &geom[geom.find("void bind_Geom_Geometry(").unwrap()..];
    let geometry = &geometry[..geometry.find("\n}\n").unwrap()];
    assert!(!geometry.contains("// Constructors"));

    let gp = unit(&units, "gp.cxx");
    assert!(gp.contains("py::arg(\"theZ\")=0.0"));
    assert!(!gp.contains("operator<<"));

    let colgp = unit(&units, "TColgp.cxx");
    assert!(colgp.contains("bind_NCollection_Array1<gp_Vec>(mod, \"TColgp_Array1OfVec\");"));
}

#[test]
fn test_render_is_byte_identical() {
    let first = render(&output());
    let second = render(&output());
    assert_eq!(first, second);
}

#[test]
fn test_generate_replaces_stale_output() {
    let project = TestProject::new();
    project.add_file("src/stale.cxx", "// old");
    let output_dir = project.path().join("src");

    let source = JsonSource::from_path(decls_path()).unwrap();
    let (output, report) = generate(source, &AllowAll, &default_options(), &output_dir).unwrap();

    assert!(!output_dir.join("stale.cxx").exists());
    assert_eq!(report.units.len(), output.plan.modules.len() + output.plan.templates.len() + 1);
    assert!(output_dir.join("bind_NCollection_Array1.hxx").is_file());

    let root = fs::read_to_string(output_dir.join("OCCT.cxx")).unwrap();
    assert!(root.contains("PYBIND11_MODULE(OCCT, main) {"));
}
