//! Syntax-tree analysis of Python projects.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ discovery    │────▶│ parser       │────▶│ SyntaxTree   │
//! │ (walkdir)    │     │ (tree-sitter)│     └──────┬───────┘
//! └──────────────┘     └──────────────┘            │ walker
//!                                                  ▼
//!                      ┌──────────────┐     ┌──────────────┐
//!                      │ project      │◀────│ calls /      │
//!                      │ (merge)      │     │ docstrings   │
//!                      └──────────────┘     └──────────────┘
//! ```
//!
//! Each file is parsed into its own [`SyntaxTree`] and walked by one
//! [`Visitor`]; the per-file tables are merged by [`ProjectAnalyzer`] in
//! discovery order.

mod calls;
mod discovery;
mod docstrings;
mod literal;
mod parser;
mod project;
mod syntax;
mod table;
mod walker;

pub use calls::{
    classify_callee, count_calls, CallShape, CallTable, CallTargetVisitor, UnclassifiedCall,
};
pub use discovery::{discover_files, FileFilter};
pub use docstrings::{collect_docstrings, module_path, DocstringTable, QualificationVisitor};
pub use literal::{clean_doc, StringLiteral};
pub use parser::{python_parser, PythonParser};
pub use project::{FailedFile, Merge, ProjectAnalyzer, Report};
pub use syntax::{NodeKind, SyntaxNode, SyntaxTree};
pub use walker::{walk, Visit, Visitor};
