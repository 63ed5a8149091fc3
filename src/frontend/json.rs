//! Declaration dumps produced by an external clang-based exporter.
//!
//! Two layouts are accepted: a single JSON array of top-level declarations,
//! or JSON lines (one declaration object per line).

use super::{DeclSource, Declaration};
use crate::error::{BindError, BindResult};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct JsonSource {
    path: PathBuf,
    declarations: Vec<Declaration>,
}

impl JsonSource {
    /// Read and decode a declaration dump
    pub fn from_path(path: impl AsRef<Path>) -> BindResult<Self> {
        let path = path.as_ref().to_path_buf();
        let text = std::fs::read_to_string(&path).map_err(|source| BindError::FileRead {
            path: path.clone(),
            source,
        })?;
        let declarations = Self::decode(&text).map_err(|source| BindError::InvalidDeclarations {
            path: path.clone(),
            source,
        })?;

        tracing::debug!(
            "Loaded {} top-level declarations from {}",
            declarations.len(),
            path.display()
        );

        Ok(Self { path, declarations })
    }

    /// Decode dump text (array or JSON lines)
    pub fn decode(text: &str) -> Result<Vec<Declaration>, serde_json::Error> {
        if text.trim_start().starts_with('[') {
            return serde_json::from_str(text);
        }

        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(serde_json::from_str)
            .collect()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

impl DeclSource for JsonSource {
    type Iter = std::vec::IntoIter<Declaration>;

    fn available_headers(&self) -> BTreeSet<String> {
        self.declarations
            .iter()
            .filter_map(|d| d.header.clone())
            .collect()
    }

    fn into_declarations(self) -> Self::Iter {
        self.declarations.into_iter()
    }
}
