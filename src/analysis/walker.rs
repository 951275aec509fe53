//! Generic pre-order traversal over a [`SyntaxTree`](super::SyntaxTree).
//!
//! The walker holds no state of its own. At every node it asks the visitor
//! what to do next and which context the node's children should see; the
//! context is how visitors thread structural information (such as the
//! current qualification prefix) downward.

use super::SyntaxNode;
use crate::error::AnalysisError;

/// Result of visiting a node - controls traversal behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visit<C> {
    /// Visit children with the same context.
    Continue,
    /// Visit children with the given context.
    Descend(C),
    /// Skip children, continue with siblings.
    Skip,
}

/// A per-node callback plugged into [`walk`].
pub trait Visitor<'t> {
    /// Context handed from a node to its children.
    type Context: Clone;

    /// Handle `node` and decide how the walk continues below it.
    fn visit(
        &mut self,
        node: SyntaxNode<'t>,
        context: &Self::Context,
    ) -> Result<Visit<Self::Context>, AnalysisError>;
}

/// Walk `root` depth-first in pre-order, children left to right.
///
/// Uses an explicit stack, so deeply nested source cannot exhaust the
/// thread stack. Stops at the first visitor error.
pub fn walk<'t, V>(
    root: SyntaxNode<'t>,
    visitor: &mut V,
    context: V::Context,
) -> Result<(), AnalysisError>
where
    V: Visitor<'t>,
{
    let mut stack = vec![(root, context)];

    while let Some((node, context)) = stack.pop() {
        let child_context = match visitor.visit(node, &context)? {
            Visit::Continue => context,
            Visit::Descend(next) => next,
            Visit::Skip => continue,
        };

        // Reversed so the leftmost child is popped first.
        for child in node.children().into_iter().rev() {
            stack.push((child, child_context.clone()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::parser::python_parser;
    use crate::analysis::{NodeKind, SyntaxTree};
    use std::path::Path;

    fn parse(source: &str) -> SyntaxTree {
        python_parser()
            .unwrap()
            .parse(Path::new("test.py"), source.to_string())
            .unwrap()
    }

    /// Records identifiers with the depth of enclosing functions.
    struct NameRecorder {
        seen: Vec<(String, usize)>,
        skip_functions: bool,
    }

    impl<'t> Visitor<'t> for NameRecorder {
        type Context = usize;

        fn visit(
            &mut self,
            node: SyntaxNode<'t>,
            depth: &usize,
        ) -> Result<Visit<usize>, AnalysisError> {
            match node.kind() {
                NodeKind::Name(name) => {
                    self.seen.push((name.to_string(), *depth));
                    Ok(Visit::Continue)
                }
                NodeKind::FunctionDef { .. } if self.skip_functions => Ok(Visit::Skip),
                NodeKind::FunctionDef { .. } => Ok(Visit::Descend(depth + 1)),
                _ => Ok(Visit::Continue),
            }
        }
    }

    #[test]
    fn test_preorder_left_to_right_with_context() {
        let tree = parse("a = b\ndef f():\n    c\n    def g():\n        d\ne\n");
        let mut recorder = NameRecorder {
            seen: Vec::new(),
            skip_functions: false,
        };
        walk(tree.root(), &mut recorder, 0).unwrap();

        let expected = [("a", 0), ("b", 0), ("f", 1), ("c", 1), ("g", 2), ("d", 2), ("e", 0)];
        let seen: Vec<_> = recorder.seen.iter().map(|(n, d)| (n.as_str(), *d)).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_skip_prunes_children() {
        let tree = parse("def f():\n    inner\nouter\n");
        let mut recorder = NameRecorder {
            seen: Vec::new(),
            skip_functions: true,
        };
        walk(tree.root(), &mut recorder, 0).unwrap();
        assert_eq!(recorder.seen, vec![("outer".to_string(), 0)]);
    }

    struct FailOnName;

    impl<'t> Visitor<'t> for FailOnName {
        type Context = ();

        fn visit(&mut self, node: SyntaxNode<'t>, _: &()) -> Result<Visit<()>, AnalysisError> {
            match node.kind() {
                NodeKind::Name(_) => Err(AnalysisError::UnhandledCallShape {
                    path: "test.py".into(),
                    line: node.line(),
                    shape: "identifier",
                }),
                _ => Ok(Visit::Continue),
            }
        }
    }

    #[test]
    fn test_visitor_error_stops_walk() {
        let tree = parse("x\n");
        assert!(walk(tree.root(), &mut FailOnName, ()).is_err());
    }

    #[test]
    fn test_deep_nesting_does_not_overflow() {
        let depth = 1000;
        let source = format!("x = {}1{}\n", "(".repeat(depth), ")".repeat(depth));
        let tree = parse(&source);
        let mut recorder = NameRecorder {
            seen: Vec::new(),
            skip_functions: false,
        };
        walk(tree.root(), &mut recorder, 0).unwrap();
        assert_eq!(recorder.seen, vec![("x".to_string(), 0)]);
    }
}
