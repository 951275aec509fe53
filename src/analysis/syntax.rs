//! Parsed syntax trees and a typed view over their nodes.

use std::path::{Path, PathBuf};

use super::literal;

/// Holds a parsed tree-sitter tree and the source it was parsed from.
///
/// A tree is owned by the file that produced it and is never mutated after
/// parsing.
pub struct SyntaxTree {
    tree: tree_sitter::Tree,
    source: String,
    path: PathBuf,
}

impl SyntaxTree {
    pub(crate) fn new(tree: tree_sitter::Tree, source: String, path: PathBuf) -> Self {
        Self { tree, source, path }
    }

    /// The module node.
    pub fn root(&self) -> SyntaxNode<'_> {
        SyntaxNode {
            node: self.tree.root_node(),
            source: &self.source,
        }
    }

    /// The normalized source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The file path (for error reporting).
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// The closed set of node kinds the analysis distinguishes.
#[derive(Debug, Clone, Copy)]
pub enum NodeKind<'t> {
    Module,
    /// `def` or `async def`, decorated or not.
    FunctionDef {
        name: &'t str,
        body: Option<SyntaxNode<'t>>,
    },
    ClassDef {
        name: &'t str,
        body: Option<SyntaxNode<'t>>,
    },
    /// A call; `callee` has redundant parentheses removed.
    Call { callee: SyntaxNode<'t> },
    /// `value.attr`
    Attribute { attr: &'t str },
    /// `value[key]`
    Subscript,
    /// A bare identifier.
    Name(&'t str),
    Other,
}

/// A node of a [`SyntaxTree`], borrowed together with its source text.
#[derive(Clone, Copy)]
pub struct SyntaxNode<'t> {
    node: tree_sitter::Node<'t>,
    source: &'t str,
}

impl std::fmt::Debug for SyntaxNode<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.node.kind(), self.line())
    }
}

impl<'t> SyntaxNode<'t> {
    fn wrap(&self, node: tree_sitter::Node<'t>) -> Self {
        Self {
            node,
            source: self.source,
        }
    }

    fn field(&self, name: &str) -> Option<Self> {
        self.node.child_by_field_name(name).map(|n| self.wrap(n))
    }

    fn field_text(&self, name: &str) -> &'t str {
        self.field(name).map(|n| n.text()).unwrap_or("")
    }

    /// Classify this node.
    pub fn kind(&self) -> NodeKind<'t> {
        match self.node.kind() {
            "module" => NodeKind::Module,
            "function_definition" => NodeKind::FunctionDef {
                name: self.field_text("name"),
                body: self.field("body"),
            },
            "class_definition" => NodeKind::ClassDef {
                name: self.field_text("name"),
                body: self.field("body"),
            },
            "call" => match self.field("function") {
                Some(callee) => NodeKind::Call {
                    callee: callee.strip_parens(),
                },
                None => NodeKind::Other,
            },
            "attribute" => NodeKind::Attribute {
                attr: self.field_text("attribute"),
            },
            "subscript" => NodeKind::Subscript,
            "identifier" => NodeKind::Name(self.text()),
            _ => NodeKind::Other,
        }
    }

    /// The grammar's name for this node, e.g. `lambda`.
    pub fn raw_kind(&self) -> &'static str {
        self.node.kind()
    }

    /// Whether this node wraps a definition in decorators.
    pub fn is_decorated(&self) -> bool {
        self.node.kind() == "decorated_definition"
    }

    /// The definition inside a decorated definition, or the node itself.
    pub fn undecorated(&self) -> Self {
        if self.is_decorated() {
            if let Some(def) = self.field("definition") {
                return def;
            }
        }
        *self
    }

    /// Remove redundant parentheses, which Python's own AST does not keep.
    pub fn strip_parens(&self) -> Self {
        let mut current = *self;
        while current.node.kind() == "parenthesized_expression" {
            match current.children().into_iter().next() {
                Some(inner) if inner.node.kind() != "yield" => current = inner,
                _ => break,
            }
        }
        current
    }

    /// Named children in source order, comments excluded.
    pub fn children(&self) -> Vec<Self> {
        let mut cursor = self.node.walk();
        self.node
            .named_children(&mut cursor)
            .filter(|n| n.kind() != "comment")
            .map(|n| self.wrap(n))
            .collect()
    }

    pub fn text(&self) -> &'t str {
        self.source
            .get(self.node.start_byte()..self.node.end_byte())
            .unwrap_or("")
    }

    /// Line number (1-indexed).
    pub fn line(&self) -> usize {
        self.node.start_position().row + 1
    }

    /// The leading documentation string of this module or block.
    ///
    /// Present only when the first statement is an expression statement made
    /// of a single `str` literal (implicit concatenation allowed). The value
    /// is indentation-normalized.
    pub fn docstring(&self) -> Option<String> {
        let first = self.children().into_iter().next()?;
        if first.node.kind() != "expression_statement" {
            return None;
        }

        let mut exprs = first.children().into_iter();
        let expr = exprs.next()?;
        if exprs.next().is_some() {
            return None;
        }
        let expr = expr.strip_parens();

        let value = match expr.node.kind() {
            "string" => literal::str_constant([expr.text()]),
            "concatenated_string" => {
                let parts = expr.children();
                literal::str_constant(parts.iter().map(|p| p.text()))
            }
            _ => None,
        }?;
        Some(literal::clean_doc(&value))
    }

    /// Docstring of a definition's body, if it has one.
    pub fn body_docstring(body: Option<SyntaxNode<'t>>) -> Option<String> {
        body.and_then(|b| b.docstring())
    }
}
