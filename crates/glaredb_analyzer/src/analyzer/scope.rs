use std::sync::Arc;

use crate::expr::column_expr::{ColumnExpr, UnresolvedColumnExpr};
use crate::logical::operator::LogicalOperator;
use crate::logical::schema::ScopeColumn;

/// The chain of nodes enclosing the query currently being analyzed.
///
/// A scope is extended, never modified. Extending a scope shares all existing
/// frames with the original.
///
/// Rows seen by a query analyzed in this scope are laid out as the columns of
/// every frame, outermost first, followed by the columns of the query's own
/// inputs. New frames are appended to the end of that layout so a column index
/// lower than the length of a scope always points outside of the query
/// analyzed in that scope.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    innermost: Option<Arc<ScopeFrame>>,
    /// Number of nested derived tables between this scope and the top level
    /// query.
    depth: usize,
    /// Number of outermost frames only visible through outer scope
    /// visibility. Expression aliases in these frames can't be referenced.
    outer_frames: usize,
}

#[derive(Debug)]
struct ScopeFrame {
    node: &'static str,
    columns: Vec<ScopeColumn>,
    /// Index of the first column of this frame in the row layout.
    offset: usize,
    /// Position of this frame counting from the outermost frame.
    position: usize,
    outer: Option<Arc<ScopeFrame>>,
}

impl ScopeFrame {
    fn end(&self) -> usize {
        self.offset + self.columns.len()
    }
}

impl Scope {
    /// Scope for a top level query.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Scope of a subquery expression contained in `node`.
    ///
    /// The subquery sees this scope plus everything `node` can see: the
    /// columns of its inputs and any expression aliases it defines.
    pub fn new_scope(&self, node: &LogicalOperator) -> Scope {
        let (offset, position) = match &self.innermost {
            Some(frame) => (frame.end(), frame.position + 1),
            None => (0, 0),
        };

        Scope {
            innermost: Some(Arc::new(ScopeFrame {
                node: node.name(),
                columns: node.scope_columns(),
                offset,
                position,
                outer: self.innermost.clone(),
            })),
            depth: self.depth,
            outer_frames: self.outer_frames,
        }
    }

    /// Scope of a derived table defined in the query analyzed in this scope.
    ///
    /// One level deeper. Derived tables don't see the other tables in the FROM
    /// clause they're defined in, but do see the scopes enclosing the query.
    /// When there are such scopes, they're visible through outer scope
    /// visibility only.
    pub fn for_derived_table(&self) -> Scope {
        let frames = self.num_frames();
        Scope {
            innermost: self.innermost.clone(),
            depth: self.depth + 1,
            outer_frames: frames,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// If there are no enclosing nodes.
    pub fn is_empty(&self) -> bool {
        self.innermost.is_none()
    }

    /// If some enclosing nodes are only visible through outer scope
    /// visibility.
    pub fn outer_visibility(&self) -> bool {
        self.outer_frames > 0
    }

    /// Total number of columns across all frames.
    pub fn len(&self) -> usize {
        self.innermost.as_ref().map(|f| f.end()).unwrap_or(0)
    }

    fn num_frames(&self) -> usize {
        self.innermost
            .as_ref()
            .map(|f| f.position + 1)
            .unwrap_or(0)
    }

    fn frames_inner_to_outer(&self) -> impl Iterator<Item = &ScopeFrame> {
        std::iter::successors(self.innermost.as_deref(), |frame| frame.outer.as_deref())
    }

    /// Names of the enclosing nodes, innermost first.
    pub fn inner_to_outer(&self) -> Vec<&'static str> {
        self.frames_inner_to_outer().map(|f| f.node).collect()
    }

    /// All columns in row layout order.
    pub fn columns(&self) -> Vec<ScopeColumn> {
        let mut frames: Vec<_> = self.frames_inner_to_outer().collect();
        frames.reverse();
        frames
            .into_iter()
            .flat_map(|f| f.columns.iter().cloned())
            .collect()
    }

    /// Resolve a column reference against the scope, innermost frame first.
    pub fn resolve_column(&self, reference: &UnresolvedColumnExpr) -> Option<ColumnExpr> {
        for frame in self.frames_inner_to_outer() {
            let hide_aliases = frame.position < self.outer_frames;
            let found = frame.columns.iter().enumerate().find(|(_, col)| {
                !(hide_aliases && col.is_alias)
                    && reference.matches(&col.column.source, &col.column.name)
            });
            if let Some((idx, col)) = found {
                return Some(ColumnExpr::new(
                    frame.offset + idx,
                    col.column.source.clone(),
                    col.column.name.clone(),
                    col.column.datatype,
                ));
            }
        }
        None
    }
}
