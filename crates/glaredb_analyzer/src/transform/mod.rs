//! Bottom up rewriting of plan and expression trees.
//!
//! Every rewrite returns a [`Transformed`] carrying a [`TreeIdentity`] so that
//! callers can tell if anything changed without comparing trees. A node whose
//! children changed is always reported as a new tree, even if the rewrite
//! function left the node itself alone.

pub mod expr;
pub mod inspect;
pub mod plan;

use crate::errors::Result;

/// Marker for whether a rewrite produced a different tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeIdentity {
    SameTree,
    NewTree,
}

impl TreeIdentity {
    pub const fn is_same(self) -> bool {
        matches!(self, Self::SameTree)
    }

    pub const fn is_new(self) -> bool {
        matches!(self, Self::NewTree)
    }

    /// Combine two identities, the result is the same tree only if both are.
    pub const fn and(self, other: TreeIdentity) -> TreeIdentity {
        match (self, other) {
            (Self::SameTree, Self::SameTree) => Self::SameTree,
            _ => Self::NewTree,
        }
    }
}

/// Result of a rewrite along with its identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Transformed<T> {
    pub data: T,
    pub identity: TreeIdentity,
}

impl<T> Transformed<T> {
    pub fn new(data: T, identity: TreeIdentity) -> Self {
        Transformed { data, identity }
    }

    /// Wrap a value that was left untouched.
    pub fn same(data: T) -> Self {
        Self::new(data, TreeIdentity::SameTree)
    }

    /// Wrap a value that was rewritten.
    pub fn new_tree(data: T) -> Self {
        Self::new(data, TreeIdentity::NewTree)
    }

    pub fn is_new(&self) -> bool {
        self.identity.is_new()
    }

    pub fn map_data<U, F>(self, f: F) -> Transformed<U>
    where
        F: FnOnce(T) -> U,
    {
        Transformed::new(f(self.data), self.identity)
    }

    /// Fold in the identity of some other rewrite that happened to this value.
    pub fn with_identity(mut self, other: TreeIdentity) -> Self {
        self.identity = self.identity.and(other);
        self
    }
}

/// Trees that can be rewritten generically.
pub trait TreeNode: Sized {
    /// Rewrite every direct child with `f`.
    ///
    /// If every child comes back unchanged, the node is returned as is with
    /// `SameTree`. Otherwise the node is rebuilt once with all of the new
    /// children.
    fn map_children<F>(self, f: F) -> Result<Transformed<Self>>
    where
        F: FnMut(Self) -> Result<Transformed<Self>>;
}

/// Rewrite a tree bottom up.
///
/// Children are rewritten before their parent is handed to `f`.
pub fn transform_up<T, F>(node: T, f: &mut F) -> Result<Transformed<T>>
where
    T: TreeNode,
    F: FnMut(T) -> Result<Transformed<T>>,
{
    let children = node.map_children(|child| transform_up(child, f))?;
    let identity = children.identity;
    Ok(f(children.data)?.with_identity(identity))
}

/// Rewrite every element of a list, tracking if any changed.
pub fn map_list<T, F>(items: Vec<T>, mut f: F) -> Result<Transformed<Vec<T>>>
where
    F: FnMut(T) -> Result<Transformed<T>>,
{
    let mut identity = TreeIdentity::SameTree;
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let transformed = f(item)?;
        identity = identity.and(transformed.identity);
        out.push(transformed.data);
    }
    Ok(Transformed::new(out, identity))
}
