//! pycensus - call-frequency and docstring census for Python projects.
//!
//! pycensus walks a directory of Python sources, parses each file with
//! tree-sitter, and produces one of two project-wide tables:
//! - how often each call-target name is invoked (`calls`)
//! - the docstring of every module, top-level function, class, and method,
//!   keyed by dotted qualified path (`docstrings`)
//!
//! # Architecture
//!
//! - `analysis`: discovery, parsing, tree walking, and the two extractions
//! - `config`: optional YAML configuration
//! - `error`: error types
//! - `report`: JSON output and terminal summaries
//! - `cli`: command-line entry points
//!
//! Only surface syntax is reported: called names are not resolved to their
//! definitions.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod report;

pub use analysis::{CallTable, DocstringTable, ProjectAnalyzer, Report};
pub use config::Config;
pub use error::{AnalysisError, ConfigError};
