//! Source file discovery.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{AnalysisError, ConfigError};

/// Decides which files under a root are analyzed.
#[derive(Debug, Clone)]
pub struct FileFilter {
    extensions: Vec<String>,
    excluded: GlobSet,
}

impl FileFilter {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &config.excluded_paths {
            builder.add(Glob::new(pattern)?);
        }
        Ok(Self {
            extensions: config
                .extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_string())
                .collect(),
            excluded: builder.build()?,
        })
    }

    /// Whether `path` carries one of the configured extensions, ignoring case.
    pub fn matches_extension(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions.iter().any(|want| want.eq_ignore_ascii_case(ext))
    }

    /// Whether `relative` (a path below the root) matches an exclusion glob.
    pub fn is_excluded(&self, relative: &Path) -> bool {
        !self.excluded.is_empty() && self.excluded.is_match(relative)
    }
}

/// List the source files under `root`, sorted by name within each directory.
///
/// A missing root yields no files. Symlinks are not followed.
pub fn discover_files(root: &Path, filter: &FileFilter) -> Result<Vec<PathBuf>, AnalysisError> {
    if !root.exists() {
        warn!(root = %root.display(), "root does not exist, nothing to analyze");
        return Ok(Vec::new());
    }

    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            let relative = e.path().strip_prefix(root).unwrap_or(e.path());
            relative.as_os_str().is_empty() || !filter.is_excluded(relative)
        })
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if filter.matches_extension(path) {
            files.push(path.to_path_buf());
        }
    }

    debug!(root = %root.display(), count = files.len(), "discovered source files");
    Ok(files)
}
