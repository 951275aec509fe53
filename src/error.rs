//! Error types for analysis and configuration.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while discovering, parsing, or walking source files.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The file is not valid Python syntax.
    #[error("{}:{line}:{column}: syntax error: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    /// The file could not be decoded as UTF-8.
    #[error("{}: file is not valid UTF-8", path.display())]
    Encoding { path: PathBuf },

    /// A call expression whose callee shape is not classified.
    #[error("{}:{line}: unhandled call shape `{shape}`", path.display())]
    UnhandledCallShape {
        path: PathBuf,
        line: usize,
        shape: &'static str,
    },

    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("walking source tree: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("loading Python grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),

    #[error("compiling tree-sitter query: {0}")]
    Query(#[from] tree_sitter::QueryError),
}

impl AnalysisError {
    /// Whether this error means the file itself could not be parsed,
    /// as opposed to an environment or policy failure.
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, AnalysisError::Parse { .. } | AnalysisError::Encoding { .. })
    }
}

/// Errors raised while loading or validating a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("reading config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid exclusion glob: {0}")]
    Glob(#[from] globset::Error),

    #[error("config must list at least one source file extension")]
    NoExtensions,
}
