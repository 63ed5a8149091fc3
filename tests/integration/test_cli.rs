//! Binary smoke tests, run inside a throwaway working directory.

use super::common::{TestProject, decls_path, include_dir};
use std::path::Path;
use std::process::{Command, Output};

fn bindforge(workspace: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bindforge"))
        .args(args)
        .current_dir(workspace)
        .env_remove("BF_ROOT_MODULE")
        .output()
        .expect("failed to run bindforge")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn test_init_writes_settings_once() {
    let project = TestProject::new();

    let first = bindforge(project.path(), &["init"]);
    assert!(first.status.success(), "{}", stderr(&first));
    assert!(project.path().join(".bindforge/settings.toml").is_file());

    let second = bindforge(project.path(), &["init"]);
    assert!(!second.status.success());

    let forced = bindforge(project.path(), &["init", "--force"]);
    assert!(forced.status.success(), "{}", stderr(&forced));
}

#[test]
fn test_config_reflects_settings_file() {
    let project = TestProject::new();
    project.add_file(".bindforge/settings.toml", "root_module = \"OCP\"\n");

    let output = bindforge(project.path(), &["config"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("root_module = \"OCP\""));
}

#[test]
fn test_plan_summary_from_dump() {
    let project = TestProject::new();
    let decls = decls_path();

    let output = bindforge(project.path(), &["plan", "--decls", decls.to_str().unwrap()]);
    assert!(output.status.success(), "{}", stderr(&output));

    let text = stdout(&output);
    assert!(text.contains("Registration order"));
    assert!(text.contains("gp_Vector -> gp_Vec"));
    assert!(text.contains("Excluding operator<< (operator function)"));
}

#[test]
fn test_plan_json_uses_env_root_module() {
    let project = TestProject::new();
    let decls = decls_path();

    let output = Command::new(env!("CARGO_BIN_EXE_bindforge"))
        .args(["plan", "--json", "--decls", decls.to_str().unwrap()])
        .current_dir(project.path())
        .env("BF_ROOT_MODULE", "OCP")
        .output()
        .expect("failed to run bindforge");
    assert!(output.status.success(), "{}", stderr(&output));

    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plan["root_module"], "OCP");
    assert_eq!(plan["aliases"][0]["owner"], "gp_Vec");
}

#[test]
fn test_generate_from_headers() {
    let project = TestProject::new();
    let headers = include_dir();

    let output = bindforge(
        project.path(),
        &["generate", "--headers", headers.to_str().unwrap(), "-o", "out"],
    );
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("Wrote"));

    let out = project.path().join("out");
    assert!(out.join("OCCT.cxx").is_file());
    assert!(out.join("bind_NCollection_List.hxx").is_file());
    assert!(out.join("Geom.cxx").is_file());
}

#[test]
fn test_missing_dump_reports_error_code() {
    let project = TestProject::new();

    let output = bindforge(project.path(), &["plan", "--decls", "missing.json"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("code: FILE_READ_ERROR"));
}

#[test]
fn test_input_source_is_required() {
    let project = TestProject::new();

    let output = bindforge(project.path(), &["plan"]);
    assert_eq!(output.status.code(), Some(2));
}
