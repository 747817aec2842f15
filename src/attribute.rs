//! Typed side tables attached to nodes.
//!
//! An attribute kind is a Rust type implementing [`Attribute`]; its associated
//! `Value` type fixes what can be stored under it, so a lookup can never
//! return a value of the wrong type. Attributes are not part of a node's
//! identity and are dropped together with the node.
//!
//! The store is owned by the [`NodeManager`][crate::manager::NodeManager] and
//! reached through it:
//!
//! ```
//! use smt_proof::attribute::Attribute;
//! use smt_proof::manager::NodeManager;
//!
//! struct Weight;
//! impl Attribute for Weight {
//!     type Value = u32;
//! }
//!
//! let nm = NodeManager::default();
//! let x = nm.mk_var("x", nm.bool_sort());
//! assert!(!nm.has_attribute::<Weight>(&x));
//! nm.set_attribute::<Weight>(&x, 7);
//! assert_eq!(nm.get_attribute::<Weight>(&x), Some(7));
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;

use crate::reference::Node;

/// An attribute kind.
pub trait Attribute: 'static {
    type Value: Clone + 'static;
}

/// Memoized sort of a term.
pub struct TypeAttr;

impl Attribute for TypeAttr {
    type Value = Node;
}

#[derive(Default)]
pub struct AttributeStore {
    tables: HashMap<Node, HashMap<TypeId, Box<dyn Any>>>,
}

impl AttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<A: Attribute>(&self, node: Node) -> Option<A::Value> {
        self.tables
            .get(&node)?
            .get(&TypeId::of::<A>())?
            .downcast_ref::<A::Value>()
            .cloned()
    }

    pub fn has<A: Attribute>(&self, node: Node) -> bool {
        self.tables
            .get(&node)
            .is_some_and(|t| t.contains_key(&TypeId::of::<A>()))
    }

    pub fn set<A: Attribute>(&mut self, node: Node, value: A::Value) {
        self.tables
            .entry(node)
            .or_default()
            .insert(TypeId::of::<A>(), Box::new(value));
    }

    /// Drop every attribute of the node.
    pub fn clear(&mut self, node: Node) {
        self.tables.remove(&node);
    }

    /// Number of nodes carrying at least one attribute.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
