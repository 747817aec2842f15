//! Handles to nodes of the term graph.
//!
//! - [`Node`] is a plain 32-bit id. It is `Copy`, does not touch reference
//!   counts and is only valid while some [`Term`] keeps the node alive. Use it
//!   in recursive algorithms and as a map key.
//! - [`Term`] is the owning handle. Cloning it increments the node's reference
//!   count, dropping it decrements the count, and the node is collected when
//!   the count reaches zero.

use std::cmp::Ordering;
use std::fmt::{self, Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::ops::Deref;

use crate::manager::NodeManager;

/// Non-owning node handle.
///
/// Ids are assigned at creation in increasing order, so comparing handles
/// orders every subterm before any term containing it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Node(u32);

impl Node {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Return the creation id of the node.
    pub const fn id(self) -> u32 {
        self.0
    }

    /// Return the index of the node in the unique table.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Owning node handle, tied to the manager that created it.
pub struct Term<'nm> {
    node: Node,
    nm: &'nm NodeManager,
}

impl<'nm> Term<'nm> {
    /// Wrap a node whose reference count was already incremented on behalf of
    /// the new handle.
    pub(crate) fn adopt(nm: &'nm NodeManager, node: Node) -> Self {
        Self { node, nm }
    }

    pub fn node(&self) -> Node {
        self.node
    }

    pub fn manager(&self) -> &'nm NodeManager {
        self.nm
    }
}

impl Deref for Term<'_> {
    type Target = Node;

    fn deref(&self) -> &Self::Target {
        &self.node
    }
}

impl Clone for Term<'_> {
    fn clone(&self) -> Self {
        self.nm.inc_ref(self.node);
        Self {
            node: self.node,
            nm: self.nm,
        }
    }
}

impl Drop for Term<'_> {
    fn drop(&mut self) {
        self.nm.dec_ref(self.node);
    }
}

impl PartialEq for Term<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node && std::ptr::eq(self.nm, other.nm)
    }
}

impl Eq for Term<'_> {}

impl PartialEq<Node> for Term<'_> {
    fn eq(&self, other: &Node) -> bool {
        self.node == *other
    }
}

impl PartialOrd for Term<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Orders by node id, then by manager address, so that terms of different
/// managers never compare `Equal`.
impl Ord for Term<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        let (lhs, rhs): (*const NodeManager, *const NodeManager) = (self.nm, other.nm);
        self.node.cmp(&other.node).then_with(|| lhs.cmp(&rhs))
    }
}

impl Hash for Term<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.node.hash(state)
    }
}

impl From<&Node> for Node {
    fn from(node: &Node) -> Self {
        *node
    }
}

impl From<&Term<'_>> for Node {
    fn from(term: &Term<'_>) -> Self {
        term.node
    }
}

impl Debug for Term<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.node, self.nm.to_sexpr(self.node))
    }
}

impl Display for Term<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.nm.to_sexpr(self.node))
    }
}
