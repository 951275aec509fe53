//! Project-wide aggregation.
//!
//! The analyzer discovers files under a root, runs one of the per-file
//! extractions over each (in parallel unless configured otherwise), and
//! merges the per-file tables in discovery order. Because merging is always
//! sequential, parallel and sequential runs produce identical reports.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::calls::{count_calls, CallTable};
use super::discovery::{discover_files, FileFilter};
use super::docstrings::{collect_docstrings, module_path, DocstringTable};
use super::parser::python_parser;
use crate::config::{Config, ParseErrorPolicy};
use crate::error::{AnalysisError, ConfigError};

/// A per-file result that can be folded into a project-wide one.
pub trait Merge: Default {
    fn merge(&mut self, other: Self);
}

impl Merge for CallTable {
    fn merge(&mut self, other: Self) {
        CallTable::merge(self, other);
    }
}

impl Merge for DocstringTable {
    fn merge(&mut self, other: Self) {
        DocstringTable::merge(self, other);
    }
}

/// A file left out of a report because it could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedFile {
    pub path: PathBuf,
    pub error: String,
}

/// Result of analyzing a project.
#[derive(Debug, Clone, Serialize)]
pub struct Report<T> {
    pub table: T,
    /// Files whose contribution is in `table`.
    pub files_analyzed: usize,
    /// Files skipped under [`ParseErrorPolicy::Skip`]; always empty otherwise.
    pub failed: Vec<FailedFile>,
}

impl<T> Report<T> {
    fn new(table: T) -> Self {
        Self {
            table,
            files_analyzed: 0,
            failed: Vec::new(),
        }
    }
}

/// Runs an analysis over every source file under a root.
pub struct ProjectAnalyzer {
    root: PathBuf,
    /// Leading module path segment; the root directory's name.
    package: Option<String>,
    config: Config,
    filter: FileFilter,
}

impl ProjectAnalyzer {
    pub fn new<P: AsRef<Path>>(root: P, config: Config) -> Result<Self, ConfigError> {
        let root = root.as_ref().to_path_buf();
        let filter = FileFilter::from_config(&config)?;
        let package = package_name(&root);
        Ok(Self {
            root,
            package,
            config,
            filter,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Source files under the root, in the order they are merged.
    pub fn discover(&self) -> Result<Vec<PathBuf>, AnalysisError> {
        discover_files(&self.root, &self.filter)
    }

    /// Dotted module path of a discovered file.
    pub fn module_path_for(&self, file: &Path) -> String {
        match file.strip_prefix(&self.root) {
            Ok(relative) if !relative.as_os_str().is_empty() => {
                module_path(self.package.as_deref(), relative)
            }
            // The root is the file itself.
            _ => module_path(None, Path::new(file.file_name().unwrap_or_default())),
        }
    }

    /// Count call targets across the project.
    pub fn analyze_calls(&self) -> Result<Report<CallTable>, AnalysisError> {
        self.analyze(|path| self.calls_in_file(path))
    }

    /// Collect qualified-path docstrings across the project.
    pub fn analyze_docstrings(&self) -> Result<Report<DocstringTable>, AnalysisError> {
        self.analyze(|path| self.docstrings_in_file(path))
    }

    pub fn calls_in_file(&self, path: &Path) -> Result<CallTable, AnalysisError> {
        debug!(file = %path.display(), "counting calls");
        let tree = python_parser()?.parse_file(path)?;
        count_calls(&tree, self.config.on_unhandled_call)
    }

    pub fn docstrings_in_file(&self, path: &Path) -> Result<DocstringTable, AnalysisError> {
        let module = self.module_path_for(path);
        debug!(file = %path.display(), module = %module, "collecting docstrings");
        let tree = python_parser()?.parse_file(path)?;
        collect_docstrings(&tree, &module)
    }

    fn analyze<T, F>(&self, per_file: F) -> Result<Report<T>, AnalysisError>
    where
        T: Merge + Send,
        F: Fn(&Path) -> Result<T, AnalysisError> + Sync,
    {
        let files = self.discover()?;
        let mut report = Report::new(T::default());

        if self.config.parallel {
            let results: Vec<_> = files
                .par_iter()
                .map(|path| per_file(path.as_path()))
                .collect();
            for (path, result) in files.iter().zip(results) {
                self.merge_result(&mut report, path, result)?;
            }
        } else {
            for path in &files {
                self.merge_result(&mut report, path, per_file(path.as_path()))?;
            }
        }

        info!(
            root = %self.root.display(),
            analyzed = report.files_analyzed,
            failed = report.failed.len(),
            "analysis complete"
        );
        Ok(report)
    }

    fn merge_result<T: Merge>(
        &self,
        report: &mut Report<T>,
        path: &Path,
        result: Result<T, AnalysisError>,
    ) -> Result<(), AnalysisError> {
        match result {
            Ok(table) => {
                report.table.merge(table);
                report.files_analyzed += 1;
                Ok(())
            }
            Err(err)
                if err.is_parse_failure()
                    && self.config.on_parse_error == ParseErrorPolicy::Skip =>
            {
                warn!(file = %path.display(), error = %err, "skipping unparseable file");
                report.failed.push(FailedFile {
                    path: path.to_path_buf(),
                    error: err.to_string(),
                });
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}

/// Name of the root directory, resolving `.` and `..` when possible.
fn package_name(root: &Path) -> Option<String> {
    if root.is_file() {
        return None;
    }
    let resolved = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    resolved
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UnhandledCallPolicy;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn package(files: &[(&str, &str)]) -> (TempDir, PathBuf) {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("pkg");
        fs::create_dir(&root).unwrap();
        for (relative, content) in files {
            write(&root, relative, content);
        }
        (temp, root)
    }

    fn sequential() -> Config {
        Config {
            parallel: false,
            ..Config::default()
        }
    }

    #[test]
    fn test_calls_merge_across_files() {
        let (_temp, root) = package(&[
            ("one.py", "foo()\nfoo()\n"),
            ("two.py", "foo()\nobj.foo()\n"),
        ]);
        let report = ProjectAnalyzer::new(&root, Config::default())
            .unwrap()
            .analyze_calls()
            .unwrap();
        assert_eq!(report.table.count("foo"), 4);
        assert_eq!(report.files_analyzed, 2);
        assert!(report.failed.is_empty());
    }

    #[test]
    fn test_direct_and_attribute_calls_share_a_name() {
        let (_temp, root) = package(&[("one.py", "foo()\nfoo()\n"), ("two.py", "obj.foo()\n")]);
        let table = ProjectAnalyzer::new(&root, sequential())
            .unwrap()
            .analyze_calls()
            .unwrap()
            .table;
        assert_eq!(table.count("foo"), 3);
        assert_eq!(table.most_common(), vec![("foo", 3)]);
    }

    #[test]
    fn test_docstrings_are_qualified_by_root_and_path() {
        let (_temp, root) = package(&[
            ("__init__.py", "\"\"\"Top package.\"\"\"\n"),
            ("a.py", "class C:\n    \"\"\"c doc\"\"\"\n    def m(self):\n        \"\"\"m doc\"\"\"\n        helper()\n    def m(self):\n        pass\n"),
            ("sub/__init__.py", ""),
            ("sub/b.py", "def f():\n    'f doc'\n"),
        ]);
        let analyzer = ProjectAnalyzer::new(&root, Config::default()).unwrap();
        let table = analyzer.analyze_docstrings().unwrap().table;

        assert_eq!(table.get("pkg"), Some(Some("Top package.")));
        assert_eq!(table.get("pkg.a"), Some(None));
        assert_eq!(table.get("pkg.a.C"), Some(Some("c doc")));
        assert_eq!(table.get("pkg.a.C.m"), Some(None));
        assert_eq!(table.get("pkg.sub"), Some(None));
        assert_eq!(table.get("pkg.sub.b.f"), Some(Some("f doc")));

        let calls = analyzer.analyze_calls().unwrap().table;
        assert_eq!(calls.count("helper"), 1);
    }

    #[test]
    fn test_cross_file_collision_last_file_wins() {
        // `pkg/mod.py` and `pkg/mod/__init__.py` both map to `pkg.mod`;
        // `mod` sorts before `mod.py`.
        let (_temp, root) = package(&[
            ("mod/__init__.py", "'package doc'\n"),
            ("mod.py", "'module doc'\n"),
        ]);
        let table = ProjectAnalyzer::new(&root, sequential())
            .unwrap()
            .analyze_docstrings()
            .unwrap()
            .table;
        assert_eq!(table.get("pkg.mod"), Some(Some("module doc")));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_parse_error_aborts_by_default() {
        let (_temp, root) = package(&[("good.py", "f()\n"), ("bad.py", "def broken(:\n")]);
        let err = ProjectAnalyzer::new(&root, Config::default())
            .unwrap()
            .analyze_calls()
            .err()
            .unwrap();
        match err {
            AnalysisError::Parse { path, line, .. } => {
                assert!(path.ends_with("bad.py"));
                assert_eq!(line, 1);
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_error_skipped_when_configured() {
        let (_temp, root) = package(&[("good.py", "f()\n"), ("bad.py", "def broken(:\n")]);
        let config = Config {
            on_parse_error: ParseErrorPolicy::Skip,
            ..Config::default()
        };
        let report = ProjectAnalyzer::new(&root, config)
            .unwrap()
            .analyze_calls()
            .unwrap();
        assert_eq!(report.table.count("f"), 1);
        assert_eq!(report.files_analyzed, 1);
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].path.ends_with("bad.py"));
    }

    #[test]
    fn test_strict_unhandled_call_is_not_skipped() {
        let (_temp, root) = package(&[("lam.py", "(lambda: 1)()\n")]);
        let config = Config {
            on_parse_error: ParseErrorPolicy::Skip,
            on_unhandled_call: UnhandledCallPolicy::Fail,
            ..Config::default()
        };
        let err = ProjectAnalyzer::new(&root, config)
            .unwrap()
            .analyze_calls()
            .err()
            .unwrap();
        assert!(matches!(err, AnalysisError::UnhandledCallShape { .. }));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let files: Vec<(String, String)> = (0..20)
            .map(|i| {
                (
                    format!("m{:02}.py", i),
                    format!("def f{i}():\n    'doc {i}'\n    shared()\n    only_{i}()\n"),
                )
            })
            .collect();
        let refs: Vec<(&str, &str)> = files.iter().map(|(p, c)| (p.as_str(), c.as_str())).collect();
        let (_temp, root) = package(&refs);

        let parallel = ProjectAnalyzer::new(&root, Config::default()).unwrap();
        let serial = ProjectAnalyzer::new(&root, sequential()).unwrap();

        assert_eq!(
            parallel.analyze_calls().unwrap().table,
            serial.analyze_calls().unwrap().table
        );
        assert_eq!(
            parallel.analyze_docstrings().unwrap().table,
            serial.analyze_docstrings().unwrap().table
        );
    }

    #[test]
    fn test_rerun_is_identical() {
        let (_temp, root) = package(&[("a.py", "x()\ny()\nx()\n")]);
        let analyzer = ProjectAnalyzer::new(&root, Config::default()).unwrap();
        let first = analyzer.analyze_calls().unwrap().table;
        let second = analyzer.analyze_calls().unwrap().table;
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_and_missing_roots() {
        let (temp, root) = package(&[]);
        let report = ProjectAnalyzer::new(&root, Config::default())
            .unwrap()
            .analyze_calls()
            .unwrap();
        assert!(report.table.is_empty());
        assert_eq!(report.files_analyzed, 0);

        let missing = temp.path().join("absent");
        let report = ProjectAnalyzer::new(&missing, Config::default())
            .unwrap()
            .analyze_docstrings()
            .unwrap();
        assert!(report.table.is_empty());
    }

    #[test]
    fn test_root_file_module_path() {
        let (_temp, root) = package(&[("tool.py", "def run():\n    'Run.'\n")]);
        let file = root.join("tool.py");
        let analyzer = ProjectAnalyzer::new(&file, Config::default()).unwrap();
        assert_eq!(analyzer.module_path_for(&file), "tool");

        let table = analyzer.analyze_docstrings().unwrap().table;
        assert_eq!(table.get("tool.run"), Some(Some("Run.")));
    }

    #[test]
    fn test_dot_root_uses_directory_name() {
        let (_temp, root) = package(&[("a.py", "")]);
        let analyzer = ProjectAnalyzer::new(root.join("."), Config::default()).unwrap();
        let file = analyzer.discover().unwrap().remove(0);
        assert_eq!(analyzer.module_path_for(&file), "pkg.a");
    }
}
