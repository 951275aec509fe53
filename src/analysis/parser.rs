//! Python parser adapter backed by tree-sitter.

use std::fs;
use std::path::Path;

use once_cell::sync::OnceCell;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Node, Parser, Query, QueryCursor};

use super::SyntaxTree;
use crate::error::AnalysisError;

/// Tree-sitter query for locating syntax errors.
///
/// The grammar still accepts the Python 2 `print` and `exec` statements,
/// which are not valid Python 3.
const ERROR_QUERY: &str = "(ERROR) @error (print_statement) @error (exec_statement) @error";

/// Longest snippet of offending source quoted in a parse error.
const MAX_SNIPPET_LEN: usize = 40;

/// Static storage for the shared parser.
static PYTHON_PARSER: OnceCell<PythonParser> = OnceCell::new();

/// The process-wide Python parser, created on first use.
pub fn python_parser() -> Result<&'static PythonParser, AnalysisError> {
    PYTHON_PARSER.get_or_try_init(PythonParser::new)
}

/// Turns Python source text into a [`SyntaxTree`].
///
/// tree_sitter::Parser is not Sync, so a parser is created per call; the
/// grammar and the compiled error query are shared.
pub struct PythonParser {
    language: Language,
    error_query: Query,
}

impl PythonParser {
    pub fn new() -> Result<Self, AnalysisError> {
        let language: Language = tree_sitter_python::LANGUAGE.into();
        let error_query = Query::new(&language, ERROR_QUERY)?;
        Ok(Self {
            language,
            error_query,
        })
    }

    fn create_parser(&self) -> Result<Parser, AnalysisError> {
        let mut parser = Parser::new();
        parser.set_language(&self.language)?;
        Ok(parser)
    }

    /// Read and parse a file.
    ///
    /// Line endings are normalized to `\n` and a leading byte-order mark is
    /// dropped, matching how Python reads source in text mode.
    pub fn parse_file(&self, path: &Path) -> Result<SyntaxTree, AnalysisError> {
        let bytes = fs::read(path).map_err(|source| AnalysisError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8(bytes).map_err(|_| AnalysisError::Encoding {
            path: path.to_path_buf(),
        })?;

        let text = match text.strip_prefix('\u{feff}') {
            Some(rest) => rest.to_string(),
            None => text,
        };
        let text = if text.contains('\r') {
            text.replace("\r\n", "\n").replace('\r', "\n")
        } else {
            text
        };

        self.parse(path, text)
    }

    /// Parse source text. Fails if the text is not valid Python; no error
    /// recovery is attempted.
    pub fn parse(&self, path: &Path, source: String) -> Result<SyntaxTree, AnalysisError> {
        let mut parser = self.create_parser()?;
        let tree = parser
            .parse(source.as_bytes(), None)
            .ok_or_else(|| AnalysisError::Parse {
                path: path.to_path_buf(),
                line: 1,
                column: 1,
                message: "parser produced no tree".to_string(),
            })?;

        let root = tree.root_node();
        if let Some((node, message)) = self.first_error(root, &source) {
            let position = node.start_position();
            return Err(AnalysisError::Parse {
                path: path.to_path_buf(),
                line: position.row + 1,
                column: position.column + 1,
                message,
            });
        }

        Ok(SyntaxTree::new(tree, source, path.to_path_buf()))
    }

    /// Locate the earliest ERROR, MISSING or Python 2 statement node under
    /// `root`.
    fn first_error<'t>(&self, root: Node<'t>, source: &str) -> Option<(Node<'t>, String)> {
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&self.error_query, root, source.as_bytes());

        let mut error: Option<Node<'t>> = None;
        while let Some(m) = matches.next() {
            for capture in m.captures {
                if error.map_or(true, |e| capture.node.start_byte() < e.start_byte()) {
                    error = Some(capture.node);
                }
            }
        }

        let missing = if root.has_error() {
            find_missing(root)
        } else {
            None
        };
        match (error, missing) {
            (Some(e), Some(m)) if m.start_byte() < e.start_byte() => {
                Some((m, missing_message(m)))
            }
            (Some(e), _) => Some((e, error_message(e, source))),
            (None, Some(m)) => Some((m, missing_message(m))),
            (None, None) if root.has_error() => Some((root, "invalid syntax".to_string())),
            (None, None) => None,
        }
    }
}

fn find_missing(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error())
        .find_map(find_missing)
}

fn missing_message(node: Node<'_>) -> String {
    format!("missing `{}`", node.kind())
}

fn error_message(node: Node<'_>, source: &str) -> String {
    match node.kind() {
        "print_statement" => "`print` statement is not valid in Python 3".to_string(),
        "exec_statement" => "`exec` statement is not valid in Python 3".to_string(),
        _ => unexpected_message(node, source),
    }
}

fn unexpected_message(node: Node<'_>, source: &str) -> String {
    let text = source
        .get(node.start_byte()..node.end_byte())
        .unwrap_or("")
        .lines()
        .next()
        .unwrap_or("")
        .trim();
    if text.is_empty() {
        return "invalid syntax".to_string();
    }
    let snippet: String = text.chars().take(MAX_SNIPPET_LEN).collect();
    format!("unexpected `{}`", snippet)
}
