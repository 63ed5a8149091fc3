#![allow(dead_code)]

use bindforge::emit::{self, EmitOptions, SourceUnit};
use bindforge::pipeline::{self, PipelineOptions, PipelineOutput};
use bindforge::{AllowAll, Declaration, Settings};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct TestProject {
    pub dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn add_file(&self, path: &str, content: &str) -> PathBuf {
        let file_path = self.dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

/// Header directory shaped like a small corner of OCCT
pub fn include_dir() -> PathBuf {
    fixtures_dir().join("inc")
}

pub fn decls_path() -> PathBuf {
    fixtures_dir().join("decls.json")
}

pub fn default_options() -> PipelineOptions {
    PipelineOptions::from_settings(&Settings::default())
}

/// Run the pipeline on in-memory declarations with nothing excluded
pub fn run_all(decls: Vec<Declaration>) -> PipelineOutput {
    pipeline::run(decls, &AllowAll, &default_options()).expect("pipeline failed")
}

pub fn render(output: &PipelineOutput) -> Vec<SourceUnit> {
    emit::render(&output.plan, &EmitOptions::from_settings(&Settings::default()))
        .expect("render failed")
}

pub fn unit<'a>(units: &'a [SourceUnit], name: &str) -> &'a str {
    &units
        .iter()
        .find(|u| u.name == name)
        .unwrap_or_else(|| panic!("missing unit {name}"))
        .contents
}

/// Register names of the planned types in registration order
pub fn registration_order(output: &PipelineOutput) -> Vec<String> {
    output
        .plan
        .types
        .iter()
        .map(|t| t.register_name().to_string())
        .collect()
}

pub fn position(output: &PipelineOutput, name: &str) -> usize {
    output
        .plan
        .type_position(name)
        .unwrap_or_else(|| panic!("{name} not planned"))
}
