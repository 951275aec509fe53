//! Call-site target extraction.
//!
//! Every call expression is classified by the syntactic shape of its callee.
//! Only direct calls (`f()`) and attribute calls (`obj.method()`) name a
//! target. Attribute calls are counted under the bare attribute name, so
//! unrelated methods sharing a name are conflated; resolving the receiver
//! is left to consumers of the report.

use std::path::{Path, PathBuf};

use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;
use tracing::warn;

use super::table::OrderedTable;
use super::walker::{walk, Visit, Visitor};
use super::{NodeKind, SyntaxNode, SyntaxTree};
use crate::config::UnhandledCallPolicy;
use crate::error::AnalysisError;

/// Syntactic shape of a call's callee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallShape<'t> {
    /// `f(...)`
    Direct(&'t str),
    /// `obj.method(...)`
    Method(&'t str),
    /// `f()(...)`
    Chained,
    /// `obj[key](...)`
    Subscripted,
    /// Any other callee, e.g. `(lambda: 0)()`. Carries the grammar kind.
    Unhandled(&'static str),
}

impl<'t> CallShape<'t> {
    /// The name this call is counted under, if any.
    pub fn target(&self) -> Option<&'t str> {
        match self {
            CallShape::Direct(name) | CallShape::Method(name) => Some(name),
            CallShape::Chained | CallShape::Subscripted | CallShape::Unhandled(_) => None,
        }
    }
}

/// Classify a call's callee (already stripped of redundant parentheses).
pub fn classify_callee<'t>(callee: SyntaxNode<'t>) -> CallShape<'t> {
    match callee.kind() {
        NodeKind::Name(name) => CallShape::Direct(name),
        NodeKind::Attribute { attr } => CallShape::Method(attr),
        NodeKind::Call { .. } => CallShape::Chained,
        NodeKind::Subscript => CallShape::Subscripted,
        NodeKind::Module
        | NodeKind::FunctionDef { .. }
        | NodeKind::ClassDef { .. }
        | NodeKind::Other => CallShape::Unhandled(callee.raw_kind()),
    }
}

/// A call site whose callee shape is not classified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnclassifiedCall {
    pub path: PathBuf,
    pub line: usize,
    /// Grammar kind of the callee, e.g. `lambda`.
    pub shape: &'static str,
}

/// Call-target name to number of call sites.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallTable {
    counts: OrderedTable<u64>,
    unclassified: Vec<UnclassifiedCall>,
}

impl CallTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more call to `name`.
    pub fn record(&mut self, name: &str) {
        self.add(name, 1);
    }

    fn add(&mut self, name: &str, count: u64) {
        *self.counts.get_or_insert_with(name, || 0) += count;
    }

    pub fn record_unclassified(&mut self, call: UnclassifiedCall) {
        self.unclassified.push(call);
    }

    /// Calls to `name`; zero if never seen.
    pub fn count(&self, name: &str) -> u64 {
        self.counts.get(name).copied().unwrap_or(0)
    }

    /// Total number of counted call sites.
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|(_, c)| *c).sum()
    }

    /// Number of distinct names.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Counts in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(name, count)| (name, *count))
    }

    /// `(name, count)` pairs, most called first; ties keep first-seen order.
    pub fn most_common(&self) -> Vec<(&str, u64)> {
        let mut pairs: Vec<_> = self.iter().collect();
        pairs.sort_by(|a, b| b.1.cmp(&a.1));
        pairs
    }

    pub fn unclassified(&self) -> &[UnclassifiedCall] {
        &self.unclassified
    }

    /// Add another table's counts to this one.
    pub fn merge(&mut self, other: CallTable) {
        for (name, count) in other.counts {
            self.add(&name, count);
        }
        self.unclassified.extend(other.unclassified);
    }
}

/// Serializes as the `most_common` sequence of `[name, count]` pairs.
impl Serialize for CallTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let pairs = self.most_common();
        let mut seq = serializer.serialize_seq(Some(pairs.len()))?;
        for pair in &pairs {
            seq.serialize_element(pair)?;
        }
        seq.end()
    }
}

/// Visitor that counts call targets in one file.
pub struct CallTargetVisitor<'a> {
    path: &'a Path,
    policy: UnhandledCallPolicy,
    table: CallTable,
}

impl<'a> CallTargetVisitor<'a> {
    pub fn new(path: &'a Path, policy: UnhandledCallPolicy) -> Self {
        Self {
            path,
            policy,
            table: CallTable::new(),
        }
    }

    pub fn into_table(self) -> CallTable {
        self.table
    }
}

impl<'t> Visitor<'t> for CallTargetVisitor<'_> {
    type Context = ();

    fn visit(&mut self, node: SyntaxNode<'t>, _: &()) -> Result<Visit<()>, AnalysisError> {
        let NodeKind::Call { callee } = node.kind() else {
            return Ok(Visit::Continue);
        };

        match classify_callee(callee) {
            CallShape::Direct(name) | CallShape::Method(name) => self.table.record(name),
            // The inner call of `f()()` is visited on its own.
            CallShape::Chained | CallShape::Subscripted => {}
            CallShape::Unhandled(shape) => match self.policy {
                UnhandledCallPolicy::Record => {
                    warn!(
                        file = %self.path.display(),
                        line = node.line(),
                        shape,
                        "unclassified call shape"
                    );
                    self.table.record_unclassified(UnclassifiedCall {
                        path: self.path.to_path_buf(),
                        line: node.line(),
                        shape,
                    });
                }
                UnhandledCallPolicy::Fail => {
                    return Err(AnalysisError::UnhandledCallShape {
                        path: self.path.to_path_buf(),
                        line: node.line(),
                        shape,
                    });
                }
            },
        }

        // Arguments and callees may contain further calls.
        Ok(Visit::Continue)
    }
}

/// Count call targets in a parsed file.
pub fn count_calls(
    tree: &SyntaxTree,
    policy: UnhandledCallPolicy,
) -> Result<CallTable, AnalysisError> {
    let mut visitor = CallTargetVisitor::new(tree.path(), policy);
    walk(tree.root(), &mut visitor, ())?;
    Ok(visitor.into_table())
}
