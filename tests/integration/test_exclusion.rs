//! Exclusions made during ingestion or linkage survive every later pass.

use bindforge::config::ModuleConfig;
use bindforge::ingest::ingest;
use bindforge::plan::plan;
use bindforge::resolve::{ResolveOptions, run_passes};
use bindforge::{ConfiguredPolicy, DeclSource, Declaration, Diagnostics, Registry, Settings};

fn decls() -> Vec<Declaration> {
    vec![
        Declaration::class("Gone_Thing").in_header("Gone_Thing.hxx"),
        Declaration::class_template("NCollection_Map<TheKeyType>", &["class TheKeyType"])
            .in_header("NCollection_Map.hxx"),
        Declaration::class_template("NCollection_List<TheItemType>", &["class TheItemType"])
            .in_header("NCollection_List.hxx"),
        Declaration::typedef("TColStd_MapOfInteger", "NCollection_Map<int>")
            .in_header("TColStd_MapOfInteger.hxx")
            .with_specialization("NCollection_Map<TheKeyType>"),
        Declaration::typedef("TColStd_ListOfInteger", "NCollection_List<int>")
            .in_header("TColStd_ListOfInteger.hxx")
            .with_specialization("NCollection_List<TheItemType>"),
        Declaration::class("Keeper").in_header("Keeper.hxx"),
    ]
}

fn settings() -> Settings {
    let mut settings = Settings::default();
    settings.exclude.classes = vec!["Gone*".to_string(), "NCollection_Map*".to_string()];
    settings.modules.insert(
        "TColStd".to_string(),
        ModuleConfig {
            excluded_typedefs: vec!["TColStd_ListOfInteger".to_string()],
            ..Default::default()
        },
    );
    settings
}

#[test]
fn test_excluded_entities_stay_excluded() {
    let decls = decls();
    let policy = ConfiguredPolicy::new(&settings(), decls.available_headers()).unwrap();
    let options = ResolveOptions::default();

    let mut registry = Registry::new();
    let mut diagnostics = Diagnostics::new();
    ingest(decls, &policy, &mut registry, &mut diagnostics);

    // A second run of the passes must not clear anything the first one set
    run_passes(&mut registry, &policy, &options, &mut diagnostics).unwrap();
    run_passes(&mut registry, &policy, &options, &mut diagnostics).unwrap();

    let class = registry.find_class("Gone_Thing").unwrap();
    assert!(registry.class(class).is_excluded);

    let template = registry.find_template("NCollection_Map<TheKeyType>").unwrap();
    assert!(registry.template(template).is_excluded);

    // Unavailable template
    let map = registry.find_typedef("TColStd_MapOfInteger").unwrap();
    assert!(registry.typedef(map).is_excluded);
    assert!(registry.typedef(map).template.is_none());

    // Configured
    let list = registry.find_typedef("TColStd_ListOfInteger").unwrap();
    assert!(registry.typedef(list).is_excluded);

    let plan = plan(&registry, &policy, "OCCT").unwrap();
    let types: Vec<_> = plan.types.iter().map(|t| t.register_name()).collect();
    assert_eq!(types, vec!["Keeper"]);
    assert!(
        plan.templates
            .iter()
            .all(|t| t.register_name != "NCollection_Map<TheKeyType>")
    );
}
