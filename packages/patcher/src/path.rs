//! # Child Paths
//!
//! A node is addressed by the sibling index of each ancestor from the root
//! down: `[1, 0, 3]` is the fourth child of the first child of the root's
//! second child. The empty path is the root itself.
//!
//! Paths are compared structurally, never by node identity, which is what lets
//! edits described against a serialized snapshot be resolved against a tree
//! that has since been mutated.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use treeweave_dom::{NodeId, TreeTraversal};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChildPath(Vec<usize>);

/// Where one path lies relative to another in document order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    /// Proper prefix of the reference path
    Ancestor,
    /// Earlier in document order, outside the reference's ancestry
    Before,
    Equal,
    /// Later in document order, outside the reference's subtree
    After,
    /// Inside the reference's subtree
    Descendant,
}

impl Position {
    /// Signed rank: `Ancestor=-2`, `Before=-1`, `Equal=0`, `After=1`,
    /// `Descendant=2`.
    pub fn rank(self) -> i8 {
        match self {
            Position::Ancestor => -2,
            Position::Before => -1,
            Position::Equal => 0,
            Position::After => 1,
            Position::Descendant => 2,
        }
    }

    /// The answer for the same pair of paths with their roles swapped
    pub fn inverse(self) -> Position {
        match self {
            Position::Ancestor => Position::Descendant,
            Position::Before => Position::After,
            Position::Equal => Position::Equal,
            Position::After => Position::Before,
            Position::Descendant => Position::Ancestor,
        }
    }

    /// Reached already: before, above, or at the reference point
    pub fn is_behind(self) -> bool {
        self.rank() <= 0
    }

    pub fn is_ahead(self) -> bool {
        self.rank() > 0
    }
}

impl ChildPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new(components: Vec<usize>) -> Self {
        Self(components)
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Path of this node's child at `index`
    pub fn child(&self, index: usize) -> ChildPath {
        let mut components = self.0.clone();
        components.push(index);
        ChildPath(components)
    }

    pub fn parent(&self) -> Option<ChildPath> {
        let (_, init) = self.0.split_last()?;
        Some(ChildPath(init.to_vec()))
    }

    pub fn last_index(&self) -> Option<usize> {
        self.0.last().copied()
    }

    /// Where `other` lies relative to `self`.
    ///
    /// The first differing component decides `Before`/`After`; when all shared
    /// components agree, the longer path is inside the shorter one.
    pub fn compare(&self, other: &ChildPath) -> Position {
        for (mine, theirs) in self.0.iter().zip(other.0.iter()) {
            if theirs < mine {
                return Position::Before;
            }
            if theirs > mine {
                return Position::After;
            }
        }
        match self.0.len().cmp(&other.0.len()) {
            std::cmp::Ordering::Less => Position::Descendant,
            std::cmp::Ordering::Equal => Position::Equal,
            std::cmp::Ordering::Greater => Position::Ancestor,
        }
    }

    /// True iff `self` is a proper prefix of `other`
    pub fn is_strict_prefix_of(&self, other: &ChildPath) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }

    pub(crate) fn component_mut(&mut self, depth: usize) -> Option<&mut usize> {
        self.0.get_mut(depth)
    }

    pub fn into_inner(self) -> Vec<usize> {
        self.0
    }
}

impl Deref for ChildPath {
    type Target = [usize];

    fn deref(&self) -> &[usize] {
        &self.0
    }
}

impl From<Vec<usize>> for ChildPath {
    fn from(components: Vec<usize>) -> Self {
        Self(components)
    }
}

impl<const N: usize> From<[usize; N]> for ChildPath {
    fn from(components: [usize; N]) -> Self {
        Self(components.to_vec())
    }
}

impl fmt::Display for ChildPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, component) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{component}")?;
        }
        f.write_str("]")
    }
}

/// Pointwise equality where an absent path never equals anything
pub fn paths_equal(a: Option<&ChildPath>, b: Option<&ChildPath>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a == b)
}

/// Derive the path of a live node by walking parent links up to the root.
///
/// Returns `None` when the walk never reaches the root (the node is detached).
pub fn path_of<T: TreeTraversal + ?Sized>(tree: &T, node: NodeId) -> Option<ChildPath> {
    let root = tree.root();
    let mut components = Vec::new();
    let mut current = node;
    while current != root {
        let parent = tree.parent(current)?;
        components.push(tree.index_in_parent(current)?);
        current = parent;
    }
    components.reverse();
    Some(ChildPath(components))
}

/// Walk `path` down from the root; `None` once a component exceeds the live
/// child count.
pub fn resolve<T: TreeTraversal + ?Sized>(tree: &T, path: &ChildPath) -> Option<NodeId> {
    path.iter()
        .try_fold(tree.root(), |node, index| tree.child_at(node, *index))
}
