//! Qualified-path documentation extraction.
//!
//! Each file contributes its module docstring, the docstrings of its
//! top-level functions and classes, and those of each class's direct
//! methods. Paths are dotted: `package.module.Class.method`.

use std::path::{Component, Path};
use std::rc::Rc;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use super::table::OrderedTable;
use super::walker::{walk, Visit, Visitor};
use super::{NodeKind, SyntaxNode, SyntaxTree};
use crate::error::AnalysisError;

/// File stem that names its enclosing package instead of a module.
const PACKAGE_INIT: &str = "__init__";

/// Dotted module path for a file.
///
/// `package` is the name of the analyzed root directory, if it has one, and
/// `relative` is the file's path below that root. The extension is dropped
/// and a trailing `__init__` collapses into its package:
/// `(pkg, sub/__init__.py)` gives `pkg.sub`.
pub fn module_path(package: Option<&str>, relative: &Path) -> String {
    let mut parts: Vec<String> = package
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .into_iter()
        .collect();

    let components: Vec<&Path> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(Path::new(part)),
            _ => None,
        })
        .collect();

    if let Some((file, dirs)) = components.split_last() {
        parts.extend(dirs.iter().map(|d| d.to_string_lossy().into_owned()));
        let stem = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        if stem != PACKAGE_INIT {
            parts.push(stem);
        }
    }

    parts.join(".")
}

/// Qualified path to documentation string. `None` means the symbol has no
/// docstring, which is distinct from an empty one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocstringTable {
    entries: OrderedTable<Option<String>>,
}

impl DocstringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite. An overwritten path keeps its original position.
    pub fn insert(&mut self, path: String, doc: Option<String>) -> Option<Option<String>> {
        self.entries.insert(path, doc)
    }

    /// `None` if the path was never recorded; `Some(None)` if it was
    /// recorded without a docstring.
    pub fn get(&self, path: &str) -> Option<Option<&str>> {
        self.entries.get(path).map(|doc| doc.as_deref())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries.iter().map(|(path, doc)| (path, doc.as_deref()))
    }

    /// Apply another table's entries on top of this one; later wins.
    pub fn merge(&mut self, other: DocstringTable) {
        for (path, doc) in other.entries {
            self.entries.insert(path, doc);
        }
    }
}

impl Serialize for DocstringTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (path, doc) in self.iter() {
            map.serialize_entry(path, &doc)?;
        }
        map.end()
    }
}

/// Visitor that records qualified paths and their docstrings.
///
/// The context is the dotted prefix for definitions below the current
/// node; the module node sets it to `module.`.
pub struct QualificationVisitor {
    module_path: String,
    table: DocstringTable,
}

impl QualificationVisitor {
    pub fn new(module_path: impl Into<String>) -> Self {
        Self {
            module_path: module_path.into(),
            table: DocstringTable::new(),
        }
    }

    pub fn into_table(self) -> DocstringTable {
        self.table
    }

    fn record_class(&mut self, path: String, body: Option<SyntaxNode<'_>>) {
        self.table
            .insert(path.clone(), SyntaxNode::body_docstring(body));

        let Some(body) = body else { return };
        for member in body.children() {
            if let NodeKind::FunctionDef { name, body } = member.undecorated().kind() {
                self.table.insert(
                    format!("{}.{}", path, name),
                    SyntaxNode::body_docstring(body),
                );
            }
        }
    }
}

impl<'t> Visitor<'t> for QualificationVisitor {
    type Context = Rc<str>;

    fn visit(
        &mut self,
        node: SyntaxNode<'t>,
        prefix: &Rc<str>,
    ) -> Result<Visit<Rc<str>>, AnalysisError> {
        match node.kind() {
            NodeKind::Module => {
                self.table
                    .insert(self.module_path.clone(), node.docstring());
                let prefix = if self.module_path.is_empty() {
                    String::new()
                } else {
                    format!("{}.", self.module_path)
                };
                Ok(Visit::Descend(Rc::from(prefix)))
            }
            NodeKind::FunctionDef { name, body } => {
                self.table.insert(
                    format!("{}{}", prefix, name),
                    SyntaxNode::body_docstring(body),
                );
                Ok(Visit::Skip)
            }
            NodeKind::ClassDef { name, body } => {
                self.record_class(format!("{}{}", prefix, name), body);
                Ok(Visit::Skip)
            }
            NodeKind::Call { .. }
            | NodeKind::Attribute { .. }
            | NodeKind::Subscript
            | NodeKind::Name(_)
            | NodeKind::Other => Ok(Visit::Continue),
        }
    }
}

/// Collect the docstrings of a parsed file under `module_path`.
pub fn collect_docstrings(
    tree: &SyntaxTree,
    module_path: &str,
) -> Result<DocstringTable, AnalysisError> {
    let mut visitor = QualificationVisitor::new(module_path);
    walk(tree.root(), &mut visitor, Rc::from(""))?;
    Ok(visitor.into_table())
}
