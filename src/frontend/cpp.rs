//! Header front end built on tree-sitter-cpp.
//!
//! Scanning runs in two phases. The first walks every header and records
//! declarations together with a symbol table of the classes, class templates
//! and typedefs it met (keyed by qualified name without template arguments).
//! The second resolves what clang would have resolved for us: what each base
//! specifier references, typedef canonical types and the class template a
//! typedef instantiates. Forward references across headers therefore work
//! regardless of scan order.

use super::{BaseSpecifier, DeclSource, Declaration, ReferencedDecl, strip_template_arguments};
use crate::config::Settings;
use crate::error::{BindError, BindResult, FrontendError, FrontendResult};
use crate::types::{Access, DeclKind};
use ignore::WalkBuilder;
use regex::{Captures, Regex};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tree_sitter::{Node, Parser, Point, Tree};

/// Export, RTTI and attribute macros that would otherwise derail the grammar
static IGNORED_MACROS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\b(?:\w+_EXPORT|Standard_OVERRIDE|Standard_NODISCARD|Standard_FINAL|Standard_NOEXCEPT|DEFINE_STANDARD_ALLOC|DEFINE_NCOLLECTION_ALLOC|(?:DEFINE_STANDARD_RTTIEXT|DEFINE_STANDARD_RTTI_INLINE|Standard_DEPRECATED)\s*\((?:"[^"]*"|[^)])*\))"#,
    )
    .expect("Invalid regex")
});

/// Discovers and parses the headers of one include directory.
#[derive(Debug, Clone)]
pub struct HeaderScanner {
    include_dir: PathBuf,
    extensions: Vec<String>,
    excluded_headers: BTreeSet<String>,
}

/// Declarations of every scanned header plus the set of headers seen.
#[derive(Debug, Clone, Default)]
pub struct ScannedHeaders {
    headers: BTreeSet<String>,
    declarations: Vec<Declaration>,
}

impl HeaderScanner {
    pub fn new(include_dir: impl Into<PathBuf>) -> Self {
        Self {
            include_dir: include_dir.into(),
            extensions: vec![".hxx".to_string(), ".h".to_string()],
            excluded_headers: BTreeSet::new(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.parse.include_dir)
            .with_extensions(settings.parse.header_extensions.iter().cloned())
            .with_excluded_headers(settings.parse.excluded_headers.iter().cloned())
    }

    pub fn with_include_dir(mut self, include_dir: impl Into<PathBuf>) -> Self {
        self.include_dir = include_dir.into();
        self
    }

    pub fn with_extensions(mut self, extensions: impl IntoIterator<Item = String>) -> Self {
        self.extensions = extensions.into_iter().collect();
        self
    }

    pub fn with_excluded_headers(mut self, headers: impl IntoIterator<Item = String>) -> Self {
        self.excluded_headers = headers.into_iter().collect();
        self
    }

    pub fn include_dir(&self) -> &Path {
        &self.include_dir
    }

    fn is_candidate(&self, name: &str) -> bool {
        self.extensions.iter().any(|ext| name.ends_with(ext.as_str()))
            && !self.excluded_headers.contains(name)
    }

    /// Headers directly inside the include directory, sorted by lowercase
    /// file name.
    pub fn discover(&self) -> BindResult<Vec<PathBuf>> {
        if !self.include_dir.is_dir() {
            return Err(BindError::FileRead {
                path: self.include_dir.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "include directory does not exist",
                ),
            });
        }

        let mut headers: Vec<PathBuf> = WalkBuilder::new(&self.include_dir)
            .max_depth(Some(1))
            .standard_filters(false)
            .hidden(true)
            .build()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
            .map(|entry| entry.into_path())
            .filter(|path| self.is_candidate(file_name(path)))
            .collect();

        headers.sort_by_key(|path| file_name(path).to_lowercase());

        tracing::debug!(
            "Discovered {} headers in {}",
            headers.len(),
            self.include_dir.display()
        );
        Ok(headers)
    }

    /// Discover and parse every header
    pub fn scan(&self) -> BindResult<ScannedHeaders> {
        let mut sources = Vec::new();
        for path in self.discover()? {
            let bytes = std::fs::read(&path).map_err(|source| BindError::FileRead {
                path: path.clone(),
                source,
            })?;
            let name = file_name(&path).to_string();
            let text = match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(err) => {
                    tracing::debug!("{name} is not valid UTF-8, decoding lossily");
                    String::from_utf8_lossy(err.as_bytes()).into_owned()
                }
            };
            sources.push((name, text));
        }

        Self::scan_sources(sources)
    }

    /// Parse in-memory headers given as `(file name, text)` pairs, in order
    pub fn scan_sources<I, N, T>(sources: I) -> BindResult<ScannedHeaders>
    where
        I: IntoIterator<Item = (N, T)>,
        N: Into<String>,
        T: AsRef<str>,
    {
        let mut parser = cpp_parser().map_err(|source| BindError::Frontend {
            path: PathBuf::new(),
            source,
        })?;

        let mut collector = Collector::default();
        let mut headers = BTreeSet::new();

        for (name, text) in sources {
            let name: String = name.into();
            let code = blank_macros(text.as_ref());
            let tree = parse(&mut parser, &code).map_err(|source| BindError::Frontend {
                path: PathBuf::from(&name),
                source,
            })?;

            let root = tree.root_node();
            if let Some(point) = first_error(root) {
                tracing::debug!(
                    "{name}: syntax error at line {}, column {}; nearby declarations may be missing",
                    point.row + 1,
                    point.column + 1
                );
            }

            let context = Context::root(&name);
            let mut access = Access::Public;
            let mut declarations = Vec::new();
            collector.collect_items(root, &code, &context, &mut access, &mut declarations);
            collector.declarations.extend(declarations);
            headers.insert(name);
        }

        let declarations = collector.finish();
        tracing::info!(
            "Scanned {} headers: {} top-level declarations",
            headers.len(),
            declarations.len()
        );

        Ok(ScannedHeaders {
            headers,
            declarations,
        })
    }
}

fn cpp_parser() -> FrontendResult<Parser> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_cpp::LANGUAGE.into())
        .map_err(|e| FrontendError::ParserInit {
            language: "C++".to_string(),
            reason: e.to_string(),
        })?;
    Ok(parser)
}

fn parse(parser: &mut Parser, code: &str) -> FrontendResult<Tree> {
    parser.parse(code, None).ok_or_else(|| FrontendError::SyntaxError {
        line: 0,
        column: 0,
        reason: "parser produced no tree".to_string(),
    })
}

impl ScannedHeaders {
    pub fn headers(&self) -> &BTreeSet<String> {
        &self.headers
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

impl DeclSource for ScannedHeaders {
    type Iter = std::vec::IntoIter<Declaration>;

    fn available_headers(&self) -> BTreeSet<String> {
        self.headers.clone()
    }

    fn into_declarations(self) -> Self::Iter {
        self.declarations.into_iter()
    }
}

fn file_name(path: &Path) -> &str {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
}

/// Replace ignored macros with spaces so byte offsets stay valid
fn blank_macros(text: &str) -> String {
    IGNORED_MACROS
        .replace_all(text, |caps: &Captures| " ".repeat(caps[0].len()))
        .into_owned()
}

fn first_error(node: Node) -> Option<Point> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position());
    }
    if !node.has_error() {
        return None;
    }
    children(node).into_iter().find_map(first_error)
}

fn children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

fn text<'c>(node: Node, code: &'c str) -> &'c str {
    &code[node.byte_range()]
}

/// Collapse runs of whitespace into single spaces
fn squeeze(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_access(text: &str) -> Option<Access> {
    match text.trim_end_matches(':').trim() {
        "public" => Some(Access::Public),
        "protected" => Some(Access::Protected),
        "private" => Some(Access::Private),
        _ => None,
    }
}

/// Name declared by a template parameter token (`typename T` -> `T`)
fn parameter_name(token: &str) -> String {
    token
        .rsplit(|c: char| !(c.is_alphanumeric() || c == '_'))
        .find(|part| !part.is_empty())
        .unwrap_or(token)
        .to_string()
}

/// Scope components enclosing a qualified name
fn enclosing_scope(name: &str) -> Vec<String> {
    let stripped = strip_template_arguments(name);
    let mut parts: Vec<String> = stripped.split("::").map(str::to_string).collect();
    parts.pop();
    parts
}

fn mentions_parameter(spelled: &str, parameters: &[String]) -> bool {
    spelled
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .any(|token| parameters.iter().any(|p| p == token))
}

/// Index of the `>` closing the `<` at `open`
fn matching_close(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (index, c) in text.char_indices().skip_while(|(i, _)| *i < open) {
        match c {
            '<' => depth += 1,
            '>' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split template arguments on commas outside nested brackets
fn split_arguments(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in text.chars() {
        match c {
            '<' | '(' => depth += 1,
            '>' | ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(squeeze(&current));
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    if !current.trim().is_empty() {
        parts.push(squeeze(&current));
    }
    parts
}

/// Text of a declaration's leading comments with comment markers removed
fn leading_docs(node: Node, code: &str) -> Option<String> {
    let mut comments = Vec::new();
    let mut row = node.start_position().row;
    let mut current = node.prev_sibling();

    while let Some(sibling) = current {
        if sibling.kind() != "comment" || sibling.end_position().row + 1 < row {
            break;
        }
        comments.push(text(sibling, code));
        row = sibling.start_position().row;
        current = sibling.prev_sibling();
    }

    comments.reverse();
    let lines: Vec<&str> = comments
        .iter()
        .flat_map(|comment| comment.lines())
        .map(clean_comment_line)
        .filter(|line| !line.is_empty())
        .collect();

    (!lines.is_empty()).then(|| lines.join("\n"))
}

fn clean_comment_line(line: &str) -> &str {
    let mut line = line.trim();
    for marker in ["//!", "///", "//", "/**", "/*!", "/*"] {
        if let Some(rest) = line.strip_prefix(marker) {
            line = rest;
            break;
        }
    }
    line = line.strip_suffix("*/").unwrap_or(line).trim();
    line.strip_prefix('*').unwrap_or(line).trim()
}

fn find_function_declarator(node: Node) -> Option<Node> {
    match node.kind() {
        "function_declarator" => Some(node),
        "pointer_declarator" | "reference_declarator" => named_children(node)
            .into_iter()
            .find_map(find_function_declarator),
        _ => None,
    }
}

/// Innermost node of one of `kinds` inside a declarator
fn find_named<'t>(node: Node<'t>, kinds: &[&str]) -> Option<Node<'t>> {
    if kinds.contains(&node.kind()) {
        return Some(node);
    }
    named_children(node)
        .into_iter()
        .find_map(|child| find_named(child, kinds))
}

/// Declaration specifiers up to and including the type (`const gp_Pnt`)
fn specifier_start(node: Node, type_node: Node) -> usize {
    children(node)
        .into_iter()
        .take_while(|child| child.start_byte() < type_node.start_byte())
        .filter(|child| child.kind() == "type_qualifier")
        .map(|child| child.start_byte())
        .min()
        .unwrap_or(type_node.start_byte())
}

fn is_deleted(node: Node, code: &str) -> bool {
    children(node)
        .iter()
        .any(|child| child.kind() == "delete_method_clause")
        || text(node, code).replace(char::is_whitespace, "").ends_with("=delete;")
}

/// Naming scope while walking a header
#[derive(Debug, Clone)]
struct Context<'h> {
    header: &'h str,
    /// Display prefix, template parameters included (`ns::List<T>`)
    prefix: String,
    /// Scope components without template arguments
    scope: Vec<String>,
    /// Unqualified name of the enclosing class
    class: Option<String>,
}

impl<'h> Context<'h> {
    fn root(header: &'h str) -> Self {
        Self {
            header,
            prefix: String::new(),
            scope: Vec::new(),
            class: None,
        }
    }

    fn qualify(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}::{name}", self.prefix)
        }
    }

    fn key(&self, name: &str) -> String {
        if self.scope.is_empty() {
            name.to_string()
        } else {
            format!("{}::{name}", self.scope.join("::"))
        }
    }

    fn enter(&self, display: &str, name: &str, class: bool) -> Self {
        let mut scope = self.scope.clone();
        scope.push(name.to_string());
        Self {
            header: self.header,
            prefix: self.qualify(display),
            scope,
            class: class.then(|| name.to_string()),
        }
    }

    fn declaration(&self, kind: DeclKind, name: String, access: Access) -> Declaration {
        let mut decl = Declaration::new(kind, name);
        decl.header = Some(self.header.to_string());
        decl.access = access;
        decl
    }
}

#[derive(Debug, Clone)]
struct RecordInfo {
    kind: DeclKind,
    bases: Vec<(Access, String)>,
    scope: Vec<String>,
}

#[derive(Debug, Clone)]
struct TemplateInfo {
    display: String,
}

#[derive(Debug, Clone)]
struct AliasInfo {
    underlying: String,
    scope: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
enum Symbol<'a> {
    Record(&'a str, &'a RecordInfo),
    Template(&'a str, &'a TemplateInfo),
    Alias(&'a str, &'a AliasInfo),
}

/// Symbols seen while scanning, first definition wins
#[derive(Debug, Default)]
struct SymbolTable {
    records: HashMap<String, RecordInfo>,
    templates: HashMap<String, TemplateInfo>,
    aliases: HashMap<String, AliasInfo>,
}

struct TemplateHead {
    tokens: Vec<String>,
    names: Vec<String>,
}

#[derive(Default)]
struct Collector {
    declarations: Vec<Declaration>,
    symbols: SymbolTable,
}

impl Collector {
    fn collect_items(
        &mut self,
        container: Node,
        code: &str,
        context: &Context,
        access: &mut Access,
        out: &mut Vec<Declaration>,
    ) {
        for node in named_children(container) {
            match node.kind() {
                "access_specifier" => {
                    if let Some(parsed) = parse_access(text(node, code)) {
                        *access = parsed;
                    }
                }
                "preproc_ifdef" | "preproc_if" | "preproc_else" | "preproc_elif" => {
                    self.collect_items(node, code, context, access, out);
                }
                "linkage_specification" => {
                    if let Some(body) = node.child_by_field_name("body") {
                        self.collect_items(body, code, context, access, out);
                    }
                }
                "namespace_definition" if context.class.is_none() => {
                    let Some(body) = node.child_by_field_name("body") else {
                        continue;
                    };
                    let inner = match node.child_by_field_name("name") {
                        Some(name) => {
                            let name = text(name, code);
                            context.enter(name, name, false)
                        }
                        None => context.clone(),
                    };
                    let mut namespace_access = Access::Public;
                    self.collect_items(body, code, &inner, &mut namespace_access, out);
                }
                "class_specifier" | "struct_specifier" | "enum_specifier" => {
                    self.collect_specifier(node, code, context, *access, None, node, out);
                }
                "field_declaration" | "declaration" | "function_definition" => {
                    self.collect_member(node, code, context, *access, out);
                }
                "template_declaration" => {
                    self.collect_template(node, code, context, *access, out);
                }
                "type_definition" => self.collect_typedef(node, code, context, *access, out),
                "alias_declaration" => {
                    let (Some(name), Some(ty)) = (
                        node.child_by_field_name("name"),
                        node.child_by_field_name("type"),
                    ) else {
                        continue;
                    };
                    let docs = leading_docs(node, code);
                    self.push_alias(text(name, code), squeeze(text(ty, code)), context, *access, docs, out);
                }
                _ => {}
            }
        }
    }

    /// Class, struct or enum specifier with a body
    #[allow(clippy::too_many_arguments)]
    fn collect_specifier(
        &mut self,
        node: Node,
        code: &str,
        context: &Context,
        access: Access,
        name: Option<&str>,
        anchor: Node,
        out: &mut Vec<Declaration>,
    ) {
        let decl = if node.kind() == "enum_specifier" {
            self.collect_enum(node, code, context, access, name, anchor)
        } else {
            self.collect_record(node, code, context, access, name, None, anchor)
        };
        out.extend(decl);
    }

    fn collect_member(
        &mut self,
        node: Node,
        code: &str,
        context: &Context,
        access: Access,
        out: &mut Vec<Declaration>,
    ) {
        let type_node = node.child_by_field_name("type");

        if let Some(ty) = type_node {
            if matches!(ty.kind(), "class_specifier" | "struct_specifier" | "enum_specifier")
                && ty.child_by_field_name("body").is_some()
            {
                self.collect_specifier(ty, code, context, access, None, node, out);
                return;
            }
        }

        if is_deleted(node, code) {
            return;
        }

        let Some(function) = node
            .child_by_field_name("declarator")
            .and_then(find_function_declarator)
        else {
            // Variables and data members
            return;
        };
        let Some(name_node) = function.child_by_field_name("declarator") else {
            return;
        };
        // Out-of-class member definitions
        if name_node.kind() == "qualified_identifier" {
            return;
        }

        let name = text(name_node, code).trim();
        let kind = if name_node.kind() == "destructor_name" || name.starts_with('~') {
            DeclKind::Destructor
        } else if type_node.is_none() && context.class.as_deref() == Some(name) {
            DeclKind::Constructor
        } else if context.class.is_some() {
            DeclKind::Method
        } else {
            DeclKind::FunctionDecl
        };

        match kind {
            DeclKind::Destructor | DeclKind::Constructor if context.class.is_none() => return,
            // Macro invocations parse as untyped calls
            DeclKind::Method | DeclKind::FunctionDecl
                if type_node.is_none() && !name.starts_with("operator") =>
            {
                return;
            }
            _ => {}
        }

        let qualified = match kind {
            DeclKind::FunctionDecl => context.qualify(name),
            _ => name.to_string(),
        };
        let mut decl = context.declaration(kind, qualified, access);
        decl.is_definition = node.kind() == "function_definition";
        decl.docs = leading_docs(node, code);

        if matches!(kind, DeclKind::Method | DeclKind::FunctionDecl) {
            let result = match type_node {
                Some(ty) => {
                    let start = specifier_start(node, ty);
                    let end = function.start_byte().max(ty.end_byte());
                    squeeze(&code[start..end])
                }
                None => String::new(),
            };
            decl.result_type = Some(result);
        }

        for child in children(node) {
            match child.kind() {
                "storage_class_specifier" if text(child, code) == "static" => decl.is_static = true,
                "virtual" | "virtual_function_specifier" => decl.is_virtual = true,
                _ => {}
            }
        }
        decl.is_const = children(function)
            .iter()
            .any(|child| child.kind() == "type_qualifier" && text(*child, code) == "const");
        decl.is_pure_virtual = node
            .child_by_field_name("default_value")
            .is_some_and(|value| text(value, code).trim() == "0")
            || text(node, code).replace(char::is_whitespace, "").ends_with("=0;");

        decl.children = parameters(function, code);
        out.push(decl);
    }

    fn collect_template(
        &mut self,
        node: Node,
        code: &str,
        context: &Context,
        access: Access,
        out: &mut Vec<Declaration>,
    ) {
        let Some(list) = node.child_by_field_name("parameters") else {
            return;
        };
        let tokens: Vec<String> = named_children(list)
            .into_iter()
            .filter(|p| p.kind() != "comment")
            .map(|p| template_token(text(p, code)))
            .collect();

        if tokens.is_empty() {
            tracing::debug!(
                "Skipping explicit specialization in {} at line {}",
                context.header,
                node.start_position().row + 1
            );
            return;
        }

        let head = TemplateHead {
            names: tokens.iter().map(|t| parameter_name(t)).collect(),
            tokens,
        };

        // Function templates, alias templates and variable templates are not bound
        for child in named_children(node) {
            if matches!(child.kind(), "class_specifier" | "struct_specifier") {
                if let Some(decl) =
                    self.collect_record(child, code, context, access, None, Some(&head), node)
                {
                    out.push(decl);
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn collect_record(
        &mut self,
        node: Node,
        code: &str,
        context: &Context,
        access: Access,
        name_override: Option<&str>,
        template: Option<&TemplateHead>,
        anchor: Node,
    ) -> Option<Declaration> {
        let name_node = node.child_by_field_name("name");
        if let Some(name_node) = name_node {
            if name_node.kind() == "template_type" {
                tracing::debug!("Skipping specialization {}", text(name_node, code));
                return None;
            }
            if name_node.kind() == "qualified_type_identifier" {
                return None;
            }
        }
        let name = match (name_override, name_node) {
            (Some(name), _) => name.to_string(),
            (None, Some(node)) => text(node, code).to_string(),
            (None, None) => return None,
        };

        let is_struct = node.kind() == "struct_specifier";
        let record_kind = if is_struct {
            DeclKind::StructDecl
        } else {
            DeclKind::ClassDecl
        };
        let display = match template {
            Some(head) => format!("{name}<{}>", head.names.join(", ")),
            None => name.clone(),
        };
        let kind = if template.is_some() {
            DeclKind::ClassTemplate
        } else {
            record_kind
        };

        let body = node.child_by_field_name("body");
        let mut decl = context.declaration(kind, context.qualify(&display), access);
        decl.is_definition = body.is_some();
        decl.docs = leading_docs(anchor, code);
        if let Some(head) = template {
            decl.template_parameters = head.tokens.clone();
        }

        let bases = base_specifiers(node, code, is_struct);
        decl.bases = bases
            .iter()
            .map(|(access, spelled)| BaseSpecifier {
                access: *access,
                type_spelling: spelled.clone(),
                referenced: None,
            })
            .collect();

        let Some(body) = body else {
            return Some(decl);
        };

        let key = context.key(&name);
        if template.is_some() {
            self.symbols
                .templates
                .entry(key)
                .or_insert_with(|| TemplateInfo {
                    display: decl.qualified_name.clone(),
                });
        } else {
            self.symbols.records.entry(key).or_insert_with(|| RecordInfo {
                kind: record_kind,
                bases,
                scope: context.scope.clone(),
            });
        }

        let inner = context.enter(&display, &name, true);
        let mut member_access = if is_struct {
            Access::Public
        } else {
            Access::Private
        };
        let mut members = Vec::new();
        self.collect_items(body, code, &inner, &mut member_access, &mut members);
        decl.children = members;

        Some(decl)
    }

    fn collect_enum(
        &mut self,
        node: Node,
        code: &str,
        context: &Context,
        access: Access,
        name_override: Option<&str>,
        anchor: Node,
    ) -> Option<Declaration> {
        let name = name_override
            .map(str::to_string)
            .or_else(|| node.child_by_field_name("name").map(|n| text(n, code).to_string()));

        let mut decl = match &name {
            Some(name) => context.declaration(DeclKind::EnumDecl, context.qualify(name), access),
            None => context
                .declaration(DeclKind::EnumDecl, String::new(), access)
                .anonymous(),
        };
        decl.docs = leading_docs(anchor, code);

        let Some(body) = node.child_by_field_name("body") else {
            decl.is_definition = false;
            return Some(decl);
        };

        decl.children = named_children(body)
            .into_iter()
            .filter(|n| n.kind() == "enumerator")
            .filter_map(|n| n.child_by_field_name("name"))
            .map(|n| {
                let mut constant = Declaration::enum_constant(text(n, code));
                constant.header = Some(context.header.to_string());
                constant
            })
            .collect();

        Some(decl)
    }

    fn collect_typedef(
        &mut self,
        node: Node,
        code: &str,
        context: &Context,
        access: Access,
        out: &mut Vec<Declaration>,
    ) {
        let Some(ty) = node.child_by_field_name("type") else {
            return;
        };
        let declarators: Vec<Node> = {
            let mut cursor = node.walk();
            node.children_by_field_name("declarator", &mut cursor)
                .collect()
        };
        let docs = leading_docs(node, code);

        let mut specifier = squeeze(&code[specifier_start(node, ty)..ty.end_byte()]);

        // typedef struct {...} Name;
        if matches!(ty.kind(), "class_specifier" | "struct_specifier" | "enum_specifier")
            && ty.child_by_field_name("body").is_some()
        {
            match ty.child_by_field_name("name") {
                Some(name) => {
                    self.collect_specifier(ty, code, context, access, None, node, out);
                    specifier = text(name, code).to_string();
                }
                None => {
                    let first = declarators
                        .first()
                        .and_then(|d| find_named(*d, &["type_identifier"]));
                    if let Some(name) = first {
                        let name = text(name, code);
                        self.collect_specifier(ty, code, context, access, Some(name), node, out);
                    }
                    return;
                }
            }
        }

        for declarator in declarators {
            let Some(name) = find_named(declarator, &["type_identifier"]) else {
                continue;
            };
            let extra = format!(
                "{}{}",
                &code[declarator.start_byte()..name.start_byte()],
                &code[name.end_byte()..declarator.end_byte()]
            );
            let underlying = squeeze(&format!("{specifier} {extra}"));
            if underlying == text(name, code) {
                // typedef struct Foo Foo;
                continue;
            }
            self.push_alias(text(name, code), underlying, context, access, docs.clone(), out);
        }
    }

    fn push_alias(
        &mut self,
        name: &str,
        underlying: String,
        context: &Context,
        access: Access,
        docs: Option<String>,
        out: &mut Vec<Declaration>,
    ) {
        self.symbols
            .aliases
            .entry(context.key(name))
            .or_insert_with(|| AliasInfo {
                underlying: underlying.clone(),
                scope: context.scope.clone(),
            });

        // Member typedefs only feed lookups
        if context.class.is_some() {
            return;
        }

        // The canonical type is filled in once every header is known
        let mut decl = context.declaration(DeclKind::TypedefDecl, context.qualify(name), access);
        decl.canonical_type = underlying;
        decl.docs = docs;
        out.push(decl);
    }

    /// Resolve what needs the whole symbol table
    fn finish(self) -> Vec<Declaration> {
        let Collector {
            mut declarations,
            symbols,
        } = self;
        for decl in &mut declarations {
            symbols.resolve_declaration(decl, &[]);
        }
        declarations
    }
}

/// Template parameter token without its default (`int N = 3` -> `int N`)
fn template_token(text: &str) -> String {
    let mut depth = 0usize;
    for (index, c) in text.char_indices() {
        match c {
            '<' | '(' => depth += 1,
            '>' | ')' => depth = depth.saturating_sub(1),
            '=' if depth == 0 => return squeeze(&text[..index]),
            _ => {}
        }
    }
    squeeze(text)
}

fn base_specifiers(node: Node, code: &str, is_struct: bool) -> Vec<(Access, String)> {
    let Some(clause) = children(node)
        .into_iter()
        .find(|child| child.kind() == "base_class_clause")
    else {
        return Vec::new();
    };

    let default = if is_struct {
        Access::Public
    } else {
        Access::Private
    };
    let mut access = None;
    let mut bases = Vec::new();

    for child in children(clause) {
        match child.kind() {
            "access_specifier" => access = parse_access(text(child, code)),
            "type_identifier" | "qualified_type_identifier" | "template_type" => {
                bases.push((access.take().unwrap_or(default), squeeze(text(child, code))));
            }
            _ => {}
        }
    }

    bases
}

fn parameters(function: Node, code: &str) -> Vec<Declaration> {
    let Some(list) = function.child_by_field_name("parameters") else {
        return Vec::new();
    };

    named_children(list)
        .into_iter()
        .filter(|p| matches!(p.kind(), "parameter_declaration" | "optional_parameter_declaration"))
        .enumerate()
        .filter_map(|(index, p)| parameter(p, index, code))
        .collect()
}

fn parameter(node: Node, index: usize, code: &str) -> Option<Declaration> {
    let declarator = node.child_by_field_name("declarator");
    let name = declarator.and_then(|d| find_named(d, &["identifier"]));
    let end = match declarator {
        Some(d) => d.end_byte(),
        None => node.child_by_field_name("type")?.end_byte(),
    };

    let spelled = match name {
        Some(name) => format!(
            "{} {}",
            &code[node.start_byte()..name.start_byte()],
            &code[name.end_byte()..end]
        ),
        None => code[node.start_byte()..end].to_string(),
    };
    let type_spelling = squeeze(&spelled);

    // f(void)
    if name.is_none() && type_spelling == "void" {
        return None;
    }

    let name = name
        .map(|n| text(n, code).to_string())
        .unwrap_or_else(|| format!("arg{index}"));
    let mut decl = Declaration::parameter(type_spelling, name);
    decl.default_value = node
        .child_by_field_name("default_value")
        .map(|value| squeeze(text(value, code)));
    Some(decl)
}

impl SymbolTable {
    fn find(&self, key: &str, prefer_template: bool) -> Option<Symbol<'_>> {
        let template = self
            .templates
            .get_key_value(key)
            .map(|(k, v)| Symbol::Template(k, v));
        if prefer_template && template.is_some() {
            return template;
        }

        self.aliases
            .get_key_value(key)
            .map(|(k, v)| Symbol::Alias(k, v))
            .or_else(|| {
                self.records
                    .get_key_value(key)
                    .map(|(k, v)| Symbol::Record(k, v))
            })
            .or(template)
    }

    /// Look `name` up from the innermost scope outwards
    fn lookup(&self, scope: &[String], name: &str, prefer_template: bool) -> Option<Symbol<'_>> {
        let name = name.trim_start_matches("::");
        (0..=scope.len()).rev().find_map(|depth| {
            let key = if depth == 0 {
                name.to_string()
            } else {
                format!("{}::{name}", scope[..depth].join("::"))
            };
            self.find(&key, prefer_template)
        })
    }

    fn resolve_declaration(&self, decl: &mut Declaration, parameters: &[String]) {
        match decl.kind {
            DeclKind::ClassDecl | DeclKind::StructDecl | DeclKind::ClassTemplate => {
                let mut parameters = parameters.to_vec();
                parameters.extend(decl.template_parameters.iter().map(|t| parameter_name(t)));
                let scope = enclosing_scope(decl.name());

                decl.bases = decl
                    .bases
                    .iter()
                    .map(|base| self.resolve_base(base.access, &base.type_spelling, &scope, &parameters))
                    .collect();

                for child in &mut decl.children {
                    self.resolve_declaration(child, &parameters);
                }
            }
            DeclKind::TypedefDecl => {
                let scope = enclosing_scope(decl.name());
                let underlying = std::mem::take(&mut decl.canonical_type);
                let canonical = self.canonicalize(&underlying, &scope, &mut HashSet::new());
                decl.specialization = self.specialization_of(&canonical);
                decl.canonical_type = canonical;
            }
            _ => {}
        }
    }

    fn resolve_base(
        &self,
        access: Access,
        spelled: &str,
        scope: &[String],
        parameters: &[String],
    ) -> BaseSpecifier {
        let spelled = squeeze(spelled.trim_start_matches("::"));
        if !spelled.contains('<') && parameters.contains(&spelled) {
            return BaseSpecifier::parameter(&spelled).with_access(access);
        }

        let referenced = self.reference(&spelled, scope, parameters, &mut HashSet::new());
        BaseSpecifier {
            access,
            type_spelling: spelled,
            referenced: Some(referenced),
        }
    }

    fn reference(
        &self,
        spelled: &str,
        scope: &[String],
        parameters: &[String],
        visited: &mut HashSet<String>,
    ) -> ReferencedDecl {
        let head = strip_template_arguments(spelled);
        let has_arguments = spelled.contains('<');

        let unresolved = || ReferencedDecl {
            kind: DeclKind::ClassDecl,
            qualified_name: spelled.to_string(),
            type_spelling: spelled.to_string(),
            specialization: None,
            bases: Vec::new(),
        };

        match self.lookup(scope, &head, has_arguments) {
            Some(Symbol::Template(_, info)) if has_arguments => {
                if mentions_parameter(spelled, parameters) {
                    ReferencedDecl {
                        kind: DeclKind::ClassTemplate,
                        qualified_name: info.display.clone(),
                        type_spelling: info.display.clone(),
                        specialization: Some(info.display.clone()),
                        bases: Vec::new(),
                    }
                } else {
                    let canonical = self.canonicalize(spelled, scope, visited);
                    ReferencedDecl {
                        kind: DeclKind::ClassDecl,
                        qualified_name: canonical.clone(),
                        type_spelling: canonical,
                        specialization: Some(info.display.clone()),
                        bases: Vec::new(),
                    }
                }
            }
            Some(Symbol::Alias(key, _)) => ReferencedDecl {
                kind: DeclKind::TypedefDecl,
                qualified_name: key.to_string(),
                type_spelling: key.to_string(),
                specialization: None,
                bases: Vec::new(),
            },
            Some(Symbol::Record(key, info)) => ReferencedDecl {
                kind: info.kind,
                qualified_name: key.to_string(),
                type_spelling: key.to_string(),
                specialization: None,
                bases: self.inherited(key, info, visited),
            },
            _ => unresolved(),
        }
    }

    /// Public bases of a referenced record, recursively
    fn inherited(
        &self,
        key: &str,
        info: &RecordInfo,
        visited: &mut HashSet<String>,
    ) -> Vec<BaseSpecifier> {
        if !visited.insert(key.to_string()) {
            return Vec::new();
        }

        let bases = info
            .bases
            .iter()
            .filter(|(access, _)| access.is_public())
            .map(|(access, spelled)| {
                let spelled = squeeze(spelled.trim_start_matches("::"));
                let referenced = self.reference(&spelled, &info.scope, &[], visited);
                BaseSpecifier {
                    access: *access,
                    type_spelling: spelled,
                    referenced: Some(referenced),
                }
            })
            .collect();

        visited.remove(key);
        bases
    }

    /// Spelling with typedefs stripped and names fully qualified
    fn canonicalize(&self, spelled: &str, scope: &[String], visited: &mut HashSet<String>) -> String {
        let spelled = squeeze(spelled);

        if let Some(open) = spelled.find('<') {
            let Some(close) = matching_close(&spelled, open) else {
                return spelled;
            };
            let head = spelled[..open].trim();
            let head = match self.lookup(scope, head, true) {
                Some(Symbol::Template(key, _) | Symbol::Record(key, _)) => key.to_string(),
                _ => head.trim_start_matches("::").to_string(),
            };
            let arguments = split_arguments(&spelled[open + 1..close])
                .iter()
                .map(|argument| self.canonicalize(argument, scope, visited))
                .collect::<Vec<_>>()
                .join(", ");
            return format!("{head}<{arguments}>{}", &spelled[close + 1..]);
        }

        match self.lookup(scope, &spelled, false) {
            Some(Symbol::Alias(key, info)) if visited.insert(key.to_string()) => {
                let canonical = self.canonicalize(&info.underlying, &info.scope, visited);
                visited.remove(key);
                canonical
            }
            Some(Symbol::Record(key, _)) => key.to_string(),
            _ => spelled,
        }
    }

    /// Display name of the class template a canonical spelling instantiates
    fn specialization_of(&self, canonical: &str) -> Option<String> {
        if !canonical.ends_with('>') {
            return None;
        }
        let open = canonical.find('<')?;
        self.templates
            .get(canonical[..open].trim())
            .map(|info| info.display.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn scan(sources: &[(&str, &str)]) -> Vec<Declaration> {
        HeaderScanner::scan_sources(sources.iter().map(|(n, t)| (n.to_string(), *t)))
            .unwrap()
            .declarations
    }

    fn find<'a>(decls: &'a [Declaration], name: &str) -> &'a Declaration {
        decls
            .iter()
            .find(|d| d.name() == name)
            .unwrap_or_else(|| panic!("no declaration named {name}"))
    }

    const SHAPE: &str = r#"
#ifndef _Shape_HeaderFile
#define _Shape_HeaderFile

#include <Standard_Transient.hxx>

//! A shape with a size.
class Shape : public Standard_Transient
{
  DEFINE_STANDARD_RTTIEXT(Shape, Standard_Transient)
public:
  //! Creates a shape.
  Standard_EXPORT Shape(const Standard_Real theSize = 1.0);

  Standard_EXPORT virtual ~Shape();

  Standard_EXPORT static Standard_Integer Count();

  Standard_Real Size() const { return mySize; }

  Standard_EXPORT virtual void Build() = 0;

  enum Kind { Solid, Shell };

protected:
  void Helper();

private:
  Standard_Real mySize;
};

#endif
"#;

    #[test]
    fn test_class_members() {
        let decls = scan(&[("Shape.hxx", SHAPE)]);
        assert_eq!(decls.len(), 1);

        let shape = &decls[0];
        assert_eq!(shape.kind, DeclKind::ClassDecl);
        assert_eq!(shape.name(), "Shape");
        assert_eq!(shape.header.as_deref(), Some("Shape.hxx"));
        assert_eq!(shape.docs.as_deref(), Some("A shape with a size."));
        assert_eq!(shape.bases.len(), 1);
        assert_eq!(shape.bases[0].type_spelling, "Standard_Transient");

        let ctor = shape
            .children
            .iter()
            .find(|c| c.kind == DeclKind::Constructor)
            .unwrap();
        assert_eq!(ctor.docs.as_deref(), Some("Creates a shape."));
        assert_eq!(ctor.children.len(), 1);
        assert_eq!(ctor.children[0].type_spelling, "const Standard_Real");
        assert_eq!(ctor.children[0].spelling, "theSize");
        assert_eq!(ctor.children[0].default_value.as_deref(), Some("1.0"));

        let dtor = shape
            .children
            .iter()
            .find(|c| c.kind == DeclKind::Destructor)
            .unwrap();
        assert!(dtor.access.is_public());

        let count = find(&shape.children, "Count");
        assert!(count.is_static);
        assert_eq!(count.result_type.as_deref(), Some("Standard_Integer"));

        let size = find(&shape.children, "Size");
        assert!(size.is_const);
        assert_eq!(size.result_type.as_deref(), Some("Standard_Real"));

        let build = find(&shape.children, "Build");
        assert!(build.is_virtual);
        assert!(build.is_pure_virtual);

        let kind = find(&shape.children, "Shape::Kind");
        assert_eq!(kind.kind, DeclKind::EnumDecl);
        assert_eq!(kind.children.len(), 2);

        assert_eq!(find(&shape.children, "Helper").access, Access::Protected);
        assert!(shape.children.iter().all(|c| c.spelling != "mySize"));
    }

    const LISTS: &str = r#"
template <typename TheItemType>
class List : public BaseList
{
public:
  class Iterator {};
};

template <class T, int N = 3>
class Vec : public List<T> {};

template <class Base>
class Mixin : public Base {};

typedef List<int> IntList;
typedef IntList IntListAlias;
typedef Vec<double, 2> Vec2d;
"#;

    const USERS: &str = r#"
class BaseList {};
class Ints : public List<int> {};
class Holder : public IntList {};
"#;

    #[test]
    fn test_templates_and_typedefs() {
        // Users are scanned after the templates but BaseList is defined late
        let decls = scan(&[("List.hxx", LISTS), ("Users.hxx", USERS)]);

        let list = find(&decls, "List<TheItemType>");
        assert_eq!(list.kind, DeclKind::ClassTemplate);
        assert_eq!(list.template_parameters, vec!["typename TheItemType"]);
        let base = list.bases[0].referenced.as_ref().unwrap();
        assert_eq!(base.kind, DeclKind::ClassDecl);
        assert_eq!(base.qualified_name, "BaseList");
        assert_eq!(list.children[0].name(), "List<TheItemType>::Iterator");

        let vec = find(&decls, "Vec<T, N>");
        assert_eq!(vec.template_parameters, vec!["class T", "int N"]);
        let base = vec.bases[0].referenced.as_ref().unwrap();
        assert_eq!(base.kind, DeclKind::ClassTemplate);
        assert_eq!(base.specialization.as_deref(), Some("List<TheItemType>"));

        let mixin = find(&decls, "Mixin<Base>");
        assert!(mixin.bases[0].referenced.is_none());

        let int_list = find(&decls, "IntList");
        assert_eq!(int_list.canonical(), "List<int>");
        assert_eq!(int_list.specialization.as_deref(), Some("List<TheItemType>"));

        let alias = find(&decls, "IntListAlias");
        assert_eq!(alias.canonical(), "List<int>");

        let vec2d = find(&decls, "Vec2d");
        assert_eq!(vec2d.canonical(), "Vec<double, 2>");
        assert_eq!(vec2d.specialization.as_deref(), Some("Vec<T, N>"));

        let ints = find(&decls, "Ints");
        let base = ints.bases[0].referenced.as_ref().unwrap();
        assert_eq!(base.kind, DeclKind::ClassDecl);
        assert_eq!(base.specialization.as_deref(), Some("List<TheItemType>"));

        let holder = find(&decls, "Holder");
        let base = holder.bases[0].referenced.as_ref().unwrap();
        assert_eq!(base.kind, DeclKind::TypedefDecl);
        assert_eq!(base.qualified_name, "IntList");
    }

    #[test]
    fn test_inherited_bases_are_reported() {
        let decls = scan(&[(
            "Chain.hxx",
            "class Root {};\nclass Mid : public Root {};\nclass Leaf : public Mid {};\n",
        )]);

        let leaf = find(&decls, "Leaf");
        let mid = leaf.bases[0].referenced.as_ref().unwrap();
        assert_eq!(mid.qualified_name, "Mid");
        assert_eq!(mid.bases.len(), 1);
        assert_eq!(mid.bases[0].type_spelling, "Root");
    }

    #[test]
    fn test_namespaces_and_enums() {
        let decls = scan(&[(
            "geom_Point.hxx",
            r#"
namespace geom {
  enum Axis { X, Y };
  class Point {
  public:
    enum { Dim = 3 };
  };
  typedef Point Pnt;
  using Coord = double;
}
"#,
        )]);

        let axis = find(&decls, "geom::Axis");
        assert_eq!(axis.spelling, "Axis");
        assert_eq!(axis.children.len(), 2);

        let point = find(&decls, "geom::Point");
        let anonymous = &point.children[0];
        assert!(anonymous.is_anonymous);
        assert_eq!(anonymous.children[0].spelling, "Dim");

        assert_eq!(find(&decls, "geom::Pnt").canonical(), "geom::Point");
        assert_eq!(find(&decls, "geom::Coord").canonical(), "double");
    }

    #[test]
    fn test_free_functions() {
        let decls = scan(&[(
            "Util.hxx",
            "int Twice(int x);\ninline double Half(const double theValue) { return theValue / 2; }\n",
        )]);

        let twice = find(&decls, "Twice");
        assert_eq!(twice.kind, DeclKind::FunctionDecl);
        assert!(!twice.is_definition);

        let half = find(&decls, "Half");
        assert!(half.is_definition);
        assert_eq!(half.result_type.as_deref(), Some("double"));
        assert_eq!(half.children[0].type_spelling, "const double");
    }

    #[test]
    fn test_discover_filters_and_sorts() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["b.hxx", "A.hxx", "C.h", "d.cxx", "Skip.hxx"] {
            fs::write(temp_dir.path().join(name), "class X {};").unwrap();
        }
        fs::create_dir(temp_dir.path().join("nested")).unwrap();
        fs::write(temp_dir.path().join("nested/E.hxx"), "").unwrap();

        let scanner = HeaderScanner::new(temp_dir.path())
            .with_excluded_headers(["Skip.hxx".to_string()]);
        let names: Vec<String> = scanner
            .discover()
            .unwrap()
            .iter()
            .map(|p| file_name(p).to_string())
            .collect();

        assert_eq!(names, vec!["A.hxx", "b.hxx", "C.h"]);
    }

    #[test]
    fn test_scan_reports_available_headers() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("gp_Pnt.hxx"), "class gp_Pnt {};").unwrap();
        fs::write(temp_dir.path().join("gp.hxx"), "class gp {};").unwrap();

        let scanned = HeaderScanner::new(temp_dir.path()).scan().unwrap();
        assert_eq!(scanned.len(), 2);
        assert!(scanned.available_headers().contains("gp_Pnt.hxx"));
    }

    #[test]
    fn test_missing_include_dir() {
        let err = HeaderScanner::new("/nonexistent/inc").discover().unwrap_err();
        assert_eq!(err.status_code(), "FILE_READ_ERROR");
    }

    #[test]
    fn test_helpers() {
        assert_eq!(template_token("int N = 3"), "int N");
        assert_eq!(parameter_name("typename TheItemType"), "TheItemType");
        assert_eq!(split_arguments("A<B, C>, int"), vec!["A<B, C>", "int"]);
        assert_eq!(clean_comment_line("//! Some text"), "Some text");
        assert_eq!(clean_comment_line(" * more */"), "more");
        let blanked = blank_macros("Standard_EXPORT void f();");
        assert_eq!(blanked.len(), "Standard_EXPORT void f();".len());
        assert_eq!(blanked.trim_start(), "void f();");
    }
}
