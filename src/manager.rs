//! The node manager: hash-consed construction and lifetime of terms and sorts.
//!
//! Every node is built through [`NodeManager::mk_node`] (or one of the `mk_*`
//! helpers), which returns the existing node when one with the same kind,
//! children and payload is alive. Hence two terms are structurally equal iff
//! they are the same node, and equality is an id comparison.
//!
//! Nodes are reference counted. A node holds a reference on each of its
//! children (and a variable on its sort); [`Term`] handles hold the rest.
//! When the last reference goes away the node leaves the unique table, its
//! attributes are dropped and the references it held are released in turn.
//!
//! # Examples
//!
//! ```
//! use smt_proof::manager::NodeManager;
//!
//! let nm = NodeManager::default();
//! let u = nm.mk_sort("U");
//! let a = nm.mk_var("a", &u);
//! let b = nm.mk_var("b", &u);
//!
//! let e1 = nm.mk_eq(&a, &b);
//! let e2 = nm.mk_eq(&a, &b);
//! assert_eq!(e1, e2);
//! assert!(a.id() < e1.id());
//! ```

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt::{self, Debug, Write};

use log::debug;
use num_bigint::BigUint;

use crate::attribute::{Attribute, AttributeStore, TypeAttr};
use crate::error::{Error, Result};
use crate::kind::{Kind, Payload};
use crate::node::NodeData;
use crate::reference::{Node, Term};
use crate::table::Table;
use crate::types::VarId;

type Storage = Table<NodeData>;

/// Declared name and sort of a variable.
#[derive(Debug, Clone)]
struct VarInfo {
    name: String,
    sort: Node,
}

pub struct NodeManager {
    storage: RefCell<Storage>,
    /// Reference counts, indexed by node id.
    refs: RefCell<Vec<u32>>,
    vars: RefCell<Vec<VarInfo>>,
    /// Slots of `vars` whose variable was collected.
    free_vars: RefCell<Vec<VarId>>,
    attributes: RefCell<AttributeStore>,
    bool_sort: Node,
    int_sort: Node,
    true_node: Node,
    false_node: Node,
}

impl NodeManager {
    /// Create a manager whose unique table starts with `2^storage_bits` buckets.
    pub fn with_capacity(storage_bits: usize) -> Self {
        let mut nm = Self {
            storage: RefCell::new(Storage::new(storage_bits)),
            refs: RefCell::new(vec![0]),
            vars: RefCell::new(Vec::new()),
            free_vars: RefCell::new(Vec::new()),
            attributes: RefCell::new(AttributeStore::new()),
            bool_sort: Node::new(0),
            int_sort: Node::new(0),
            true_node: Node::new(0),
            false_node: Node::new(0),
        };
        // Built-in nodes are pinned: their reference is never released.
        nm.bool_sort = nm.intern(NodeData::leaf(Kind::BoolSort, Payload::None));
        nm.int_sort = nm.intern(NodeData::leaf(Kind::IntSort, Payload::None));
        nm.true_node = nm.intern(NodeData::leaf(Kind::ConstBool, Payload::Bool(true)));
        nm.false_node = nm.intern(NodeData::leaf(Kind::ConstBool, Payload::Bool(false)));
        nm
    }
}

impl Default for NodeManager {
    fn default() -> Self {
        NodeManager::with_capacity(12)
    }
}

impl Debug for NodeManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let storage = self.storage.borrow();
        f.debug_struct("NodeManager")
            .field("capacity", &storage.capacity())
            .field("size", &storage.size())
            .field("real_size", &storage.real_size())
            .finish()
    }
}

// Reference counting
impl NodeManager {
    /// Insert (or find) a node and take one reference on it.
    fn intern(&self, data: NodeData) -> Node {
        let (kind, min_max) = (data.kind, data.kind.arity());
        let n = data.children.len();
        assert!(
            min_max.0 <= n && n <= min_max.1,
            "Kind {} does not accept {} children",
            kind,
            n
        );
        for &c in &data.children {
            assert!(self.is_alive(c), "Child {} is not a live node", c);
        }

        let (index, is_new) = self.storage.borrow_mut().put(data);
        let node = Node::new(index as u32);
        if is_new {
            debug!("mk: new node {} of kind {}", node, kind);
            {
                let mut refs = self.refs.borrow_mut();
                if refs.len() <= index {
                    refs.resize(index + 1, 0);
                }
            }
            // The new node holds a reference on each child.
            for c in self.children(node) {
                self.inc_ref(c);
            }
        }
        self.inc_ref(node);
        node
    }

    pub(crate) fn inc_ref(&self, node: Node) {
        let mut refs = self.refs.borrow_mut();
        refs[node.index()] += 1;
    }

    pub(crate) fn dec_ref(&self, node: Node) {
        let mut worklist = vec![node];
        while let Some(n) = worklist.pop() {
            let count = {
                let mut refs = self.refs.borrow_mut();
                let count = &mut refs[n.index()];
                assert!(*count > 0, "Reference count of {} underflows", n);
                *count -= 1;
                *count
            };
            if count > 0 {
                continue;
            }

            debug!("collect: {}", n);
            let data = self.storage.borrow_mut().remove(n.index());
            self.attributes.borrow_mut().clear(n);
            if let Payload::Var(v) = data.payload {
                let sort = {
                    let mut vars = self.vars.borrow_mut();
                    let info = &mut vars[v.index()];
                    info.name = String::new();
                    info.sort
                };
                self.free_vars.borrow_mut().push(v);
                worklist.push(sort);
            }
            worklist.extend(data.children);
        }
    }

    /// Current reference count of a node (0 for collected nodes).
    pub fn ref_count(&self, node: impl Into<Node>) -> u32 {
        let node = node.into();
        self.refs.borrow().get(node.index()).copied().unwrap_or(0)
    }

    pub fn is_alive(&self, node: Node) -> bool {
        node.index() != 0 && self.storage.borrow().is_occupied(node.index())
    }

    /// Upgrade a borrowed handle to an owning one.
    ///
    /// Panics if the node has been collected.
    pub fn term(&self, node: impl Into<Node>) -> Term<'_> {
        let node = node.into();
        assert!(self.is_alive(node), "Node {} is not alive", node);
        self.inc_ref(node);
        Term::adopt(self, node)
    }

    /// Number of live nodes.
    pub fn live_nodes(&self) -> usize {
        self.storage.borrow().real_size()
    }

    /// Number of buckets of the unique table.
    pub fn capacity(&self) -> usize {
        self.storage.borrow().capacity()
    }
}

// Construction
impl NodeManager {
    pub fn mk_node(
        &self,
        kind: Kind,
        children: impl IntoIterator<Item = impl Into<Node>>,
        payload: Payload,
    ) -> Term<'_> {
        assert!(
            !matches!(payload, Payload::Var(_)),
            "Variables must be created with mk_var"
        );
        let children = children.into_iter().map(Into::into).collect();
        let node = self.intern(NodeData::new(kind, children, payload));
        Term::adopt(self, node)
    }

    fn mk_leaf(&self, kind: Kind, payload: Payload) -> Term<'_> {
        let node = self.intern(NodeData::leaf(kind, payload));
        Term::adopt(self, node)
    }

    fn mk_var_of_kind(&self, kind: Kind, name: &str, sort: Node) -> Term<'_> {
        assert!(self.kind(sort).is_sort(), "{} is not a sort", self.to_sexpr(sort));
        let info = VarInfo {
            name: name.to_string(),
            sort,
        };
        let id = {
            let mut vars = self.vars.borrow_mut();
            match self.free_vars.borrow_mut().pop() {
                Some(id) => {
                    vars[id.index()] = info;
                    id
                }
                None => {
                    vars.push(info);
                    VarId::new((vars.len() - 1) as u32)
                }
            }
        };
        // The variable keeps its sort alive.
        self.inc_ref(sort);
        debug!("mk_var: {} : {}", name, self.to_sexpr(sort));
        self.mk_leaf(kind, Payload::Var(id))
    }

    /// Create a fresh free variable. Variables with equal names are distinct.
    pub fn mk_var(&self, name: &str, sort: impl Into<Node>) -> Term<'_> {
        self.mk_var_of_kind(Kind::Variable, name, sort.into())
    }

    /// Create a fresh variable for use under a quantifier.
    pub fn mk_bound_var(&self, name: &str, sort: impl Into<Node>) -> Term<'_> {
        self.mk_var_of_kind(Kind::BoundVariable, name, sort.into())
    }

    /// Create a fresh variable with exactly the given name (used for let-bindings).
    pub fn mk_skolem(&self, name: &str, sort: impl Into<Node>) -> Term<'_> {
        self.mk_var(name, sort)
    }

    pub fn mk_bool(&self, value: bool) -> Term<'_> {
        self.term(if value { self.true_node } else { self.false_node })
    }

    pub fn mk_integer(&self, value: i64) -> Term<'_> {
        self.mk_leaf(Kind::ConstInt, Payload::Integer(value))
    }

    /// The Boolean sort. Built-in sorts are pinned, so a plain handle suffices.
    pub fn bool_sort(&self) -> Node {
        self.bool_sort
    }

    pub fn int_sort(&self) -> Node {
        self.int_sort
    }

    /// Uninterpreted sort. Sorts with equal names are the same node.
    pub fn mk_sort(&self, name: &str) -> Term<'_> {
        self.mk_leaf(Kind::SortType, Payload::Name(name.to_string()))
    }

    pub fn mk_array_sort(&self, index: impl Into<Node>, element: impl Into<Node>) -> Term<'_> {
        self.mk_node(Kind::ArraySort, [index.into(), element.into()], Payload::None)
    }

    pub fn mk_function_sort(
        &self,
        args: impl IntoIterator<Item = impl Into<Node>>,
        range: impl Into<Node>,
    ) -> Term<'_> {
        let mut children: Vec<Node> = args.into_iter().map(Into::into).collect();
        children.push(range.into());
        self.mk_node(Kind::FunctionSort, children, Payload::None)
    }

    pub fn mk_not(&self, a: impl Into<Node>) -> Term<'_> {
        self.mk_node(Kind::Not, [a.into()], Payload::None)
    }

    pub fn mk_and(&self, children: impl IntoIterator<Item = impl Into<Node>>) -> Term<'_> {
        self.mk_node(Kind::And, children, Payload::None)
    }

    pub fn mk_or(&self, children: impl IntoIterator<Item = impl Into<Node>>) -> Term<'_> {
        self.mk_node(Kind::Or, children, Payload::None)
    }

    pub fn mk_eq(&self, a: impl Into<Node>, b: impl Into<Node>) -> Term<'_> {
        self.mk_node(Kind::Equal, [a.into(), b.into()], Payload::None)
    }

    pub fn mk_ite(&self, c: impl Into<Node>, t: impl Into<Node>, e: impl Into<Node>) -> Term<'_> {
        self.mk_node(Kind::Ite, [c.into(), t.into(), e.into()], Payload::None)
    }

    /// Chained relational operator, e.g. `(= a b c)`.
    pub fn mk_chain(&self, op: Kind, children: impl IntoIterator<Item = impl Into<Node>>) -> Term<'_> {
        self.mk_node(Kind::Chain, children, Payload::Op(op))
    }

    /// Apply an uninterpreted function symbol to arguments.
    pub fn mk_apply(&self, f: impl Into<Node>, args: impl IntoIterator<Item = impl Into<Node>>) -> Term<'_> {
        let mut children = vec![f.into()];
        children.extend(args.into_iter().map(Into::into));
        self.mk_node(Kind::ApplyUf, children, Payload::None)
    }

    pub fn mk_select(&self, a: impl Into<Node>, i: impl Into<Node>) -> Term<'_> {
        self.mk_node(Kind::Select, [a.into(), i.into()], Payload::None)
    }

    pub fn mk_store(&self, a: impl Into<Node>, i: impl Into<Node>, v: impl Into<Node>) -> Term<'_> {
        self.mk_node(Kind::Store, [a.into(), i.into(), v.into()], Payload::None)
    }

    fn mk_binder(
        &self,
        kind: Kind,
        vars: impl IntoIterator<Item = impl Into<Node>>,
        body: impl Into<Node>,
    ) -> Term<'_> {
        let list = self.mk_node(Kind::BoundVarList, vars, Payload::None);
        for &v in &self.children(*list) {
            assert_eq!(self.kind(v), Kind::BoundVariable, "{} is not a bound variable", v);
        }
        self.mk_node(kind, [list.node(), body.into()], Payload::None)
    }

    pub fn mk_forall(&self, vars: impl IntoIterator<Item = impl Into<Node>>, body: impl Into<Node>) -> Term<'_> {
        self.mk_binder(Kind::Forall, vars, body)
    }

    pub fn mk_exists(&self, vars: impl IntoIterator<Item = impl Into<Node>>, body: impl Into<Node>) -> Term<'_> {
        self.mk_binder(Kind::Exists, vars, body)
    }
}

// Structural accessors
impl NodeManager {
    fn with_data<R>(&self, node: Node, f: impl FnOnce(&NodeData) -> R) -> R {
        let storage = self.storage.borrow();
        f(storage.value(node.index()))
    }

    pub fn kind(&self, node: impl Into<Node>) -> Kind {
        self.with_data(node.into(), |d| d.kind)
    }

    pub fn num_children(&self, node: impl Into<Node>) -> usize {
        self.with_data(node.into(), |d| d.children.len())
    }

    /// The `i`-th child. Panics when `i` is out of range.
    pub fn child(&self, node: impl Into<Node>, i: usize) -> Node {
        let node = node.into();
        self.with_data(node, |d| match d.children.get(i) {
            Some(&c) => c,
            None => panic!(
                "Child index {} out of range for {} with {} children",
                i,
                node,
                d.children.len()
            ),
        })
    }

    pub fn children(&self, node: impl Into<Node>) -> Vec<Node> {
        self.with_data(node.into(), |d| d.children.clone())
    }

    pub fn payload(&self, node: impl Into<Node>) -> Payload {
        self.with_data(node.into(), |d| d.payload.clone())
    }

    pub fn is_var(&self, node: impl Into<Node>) -> bool {
        self.kind(node).is_variable()
    }

    pub fn is_const(&self, node: impl Into<Node>) -> bool {
        self.kind(node).is_constant()
    }

    pub fn is_true(&self, node: impl Into<Node>) -> bool {
        node.into() == self.true_node
    }

    pub fn is_false(&self, node: impl Into<Node>) -> bool {
        node.into() == self.false_node
    }

    fn var_info(&self, node: Node) -> Option<VarInfo> {
        match self.payload(node) {
            Payload::Var(v) => Some(self.vars.borrow()[v.index()].clone()),
            _ => None,
        }
    }

    /// Declared name of a variable, or the name of an uninterpreted sort.
    pub fn name(&self, node: impl Into<Node>) -> Option<String> {
        let node = node.into();
        match self.payload(node) {
            Payload::Name(name) => Some(name),
            Payload::Var(_) => self.var_info(node).map(|v| v.name),
            _ => None,
        }
    }
}

// Attributes
impl NodeManager {
    pub fn get_attribute<A: Attribute>(&self, node: impl Into<Node>) -> Option<A::Value> {
        self.attributes.borrow().get::<A>(node.into())
    }

    pub fn has_attribute<A: Attribute>(&self, node: impl Into<Node>) -> bool {
        self.attributes.borrow().has::<A>(node.into())
    }

    pub fn set_attribute<A: Attribute>(&self, node: impl Into<Node>, value: A::Value) {
        let node = node.into();
        assert!(self.is_alive(node), "Cannot attach attributes to dead node {}", node);
        self.attributes.borrow_mut().set::<A>(node, value)
    }
}

// Typing
impl NodeManager {
    /// Sort of a term, computed once and memoized in [`TypeAttr`].
    pub fn type_of(&self, node: impl Into<Node>) -> Result<Node> {
        let node = node.into();
        if let Some(sort) = self.get_attribute::<TypeAttr>(node) {
            return Ok(sort);
        }
        let sort = self.compute_type(node)?;
        self.set_attribute::<TypeAttr>(node, sort);
        Ok(sort)
    }

    fn compute_type(&self, node: Node) -> Result<Node> {
        let kind = self.kind(node);
        let children = self.children(node);
        let ill = |reason: &str| Error::ill_typed(self.to_sexpr(node), reason);
        let expect_all = |sort: Node| -> Result<()> {
            for &c in &children {
                if self.type_of(c)? != sort {
                    return Err(ill(&format!("expected {} arguments", self.to_sexpr(sort))));
                }
            }
            Ok(())
        };

        match kind {
            k if k.is_sort() => Err(ill("sorts have no type")),
            Kind::BoundVarList => Err(ill("bound variable lists have no type")),
            Kind::Variable | Kind::BoundVariable => match self.var_info(node) {
                Some(info) => Ok(info.sort),
                None => Err(ill("variable without declaration")),
            },
            Kind::ConstBool => Ok(self.bool_sort),
            Kind::ConstInt => Ok(self.int_sort),
            Kind::Not | Kind::And | Kind::Or | Kind::Xor | Kind::Implies | Kind::Iff => {
                expect_all(self.bool_sort)?;
                Ok(self.bool_sort)
            }
            Kind::Equal | Kind::Distinct | Kind::Chain => {
                expect_all(self.type_of(children[0])?)?;
                Ok(self.bool_sort)
            }
            Kind::Ite => {
                if self.type_of(children[0])? != self.bool_sort {
                    return Err(ill("condition is not Boolean"));
                }
                let t = self.type_of(children[1])?;
                if self.type_of(children[2])? != t {
                    return Err(ill("branches have different sorts"));
                }
                Ok(t)
            }
            Kind::ApplyUf => {
                let f = self.type_of(children[0])?;
                if self.kind(f) != Kind::FunctionSort {
                    return Err(ill("applied symbol is not a function"));
                }
                let sig = self.children(f);
                let (range, args) = sig.split_last().ok_or_else(|| ill("function sort without range"))?;
                if args.len() != children.len() - 1 {
                    return Err(ill("wrong number of arguments"));
                }
                for (&a, &s) in children[1..].iter().zip(args) {
                    if self.type_of(a)? != s {
                        return Err(ill("argument sort mismatch"));
                    }
                }
                Ok(*range)
            }
            Kind::Select | Kind::Store => {
                let a = self.type_of(children[0])?;
                if self.kind(a) != Kind::ArraySort {
                    return Err(ill("not an array"));
                }
                let (index, element) = (self.child(a, 0), self.child(a, 1));
                if self.type_of(children[1])? != index {
                    return Err(ill("index sort mismatch"));
                }
                if kind == Kind::Select {
                    return Ok(element);
                }
                if self.type_of(children[2])? != element {
                    return Err(ill("element sort mismatch"));
                }
                Ok(a)
            }
            Kind::Uminus | Kind::Plus => {
                expect_all(self.int_sort)?;
                Ok(self.int_sort)
            }
            Kind::Lt => {
                expect_all(self.int_sort)?;
                Ok(self.bool_sort)
            }
            Kind::Forall | Kind::Exists => {
                if self.type_of(children[1])? != self.bool_sort {
                    return Err(ill("quantifier body is not Boolean"));
                }
                Ok(self.bool_sort)
            }
            _ => unreachable!("all kinds handled"),
        }
    }

    pub fn is_boolean(&self, node: impl Into<Node>) -> bool {
        self.type_of(node).is_ok_and(|s| s == self.bool_sort)
    }
}

// Substitution and traversal
impl NodeManager {
    /// Simultaneously replace every occurrence of `from[i]` by `to[i]`.
    ///
    /// Replacements are not themselves traversed. Cost is linear in the DAG
    /// size of `node`, independent of its (possibly exponential) tree size.
    pub fn substitute(&self, node: impl Into<Node>, from: &[Node], to: &[Node]) -> Term<'_> {
        assert_eq!(from.len(), to.len(), "Substitution domain and range differ in length");
        let map: HashMap<Node, Node> = from.iter().copied().zip(to.iter().copied()).collect();
        let mut cache = HashMap::new();
        self.substitute_with(node.into(), &mut |n| map.get(&n).copied(), &mut cache)
    }

    /// Substitution driven by a lookup function, shared with substitution maps.
    pub(crate) fn substitute_with<'a>(
        &'a self,
        node: Node,
        lookup: &mut dyn FnMut(Node) -> Option<Node>,
        cache: &mut HashMap<Node, Term<'a>>,
    ) -> Term<'a> {
        if let Some(r) = lookup(node) {
            return self.term(r);
        }
        if let Some(t) = cache.get(&node) {
            return t.clone();
        }

        let children = self.children(node);
        let res = if children.is_empty() {
            self.term(node)
        } else {
            let new_children: Vec<Term<'a>> = children
                .iter()
                .map(|&c| self.substitute_with(c, lookup, cache))
                .collect();
            if new_children.iter().zip(&children).all(|(t, &c)| t.node() == c) {
                self.term(node)
            } else {
                let kind = self.kind(node);
                let payload = self.payload(node);
                self.mk_node(kind, new_children.iter(), payload)
            }
        };
        cache.insert(node, res.clone());
        res
    }

    /// Number of distinct nodes reachable from `node`.
    pub fn dag_size(&self, node: impl Into<Node>) -> usize {
        let mut seen = HashSet::new();
        let mut stack = vec![node.into()];
        while let Some(n) = stack.pop() {
            if seen.insert(n) {
                stack.extend(self.children(n));
            }
        }
        seen.len()
    }

    /// Number of nodes of the fully unfolded tree.
    pub fn tree_size(&self, node: impl Into<Node>) -> BigUint {
        let mut cache = HashMap::new();
        self.tree_size_(node.into(), &mut cache)
    }

    fn tree_size_(&self, node: Node, cache: &mut HashMap<Node, BigUint>) -> BigUint {
        if let Some(size) = cache.get(&node) {
            return size.clone();
        }
        let mut size = BigUint::from(1u32);
        for c in self.children(node) {
            size += self.tree_size_(c, cache);
        }
        cache.insert(node, size.clone());
        size
    }
}

// Printing
impl NodeManager {
    /// Render a node as an S-expression (SMT-LIB flavoured), for logs and tests.
    pub fn to_sexpr(&self, node: Node) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_sexpr(node, &mut out);
        out
    }

    fn write_sexpr(&self, node: Node, out: &mut String) -> fmt::Result {
        if !self.is_alive(node) {
            return write!(out, "<dead {}>", node);
        }
        let kind = self.kind(node);
        let children = self.children(node);
        match (kind, self.payload(node)) {
            (Kind::BoolSort | Kind::IntSort, _) => write!(out, "{}", kind),
            (Kind::SortType, Payload::Name(name)) => write!(out, "{}", name),
            (Kind::Variable | Kind::BoundVariable, _) => {
                write!(out, "{}", self.name(node).unwrap_or_default())
            }
            (Kind::ConstBool, Payload::Bool(b)) => write!(out, "{}", b),
            (Kind::ConstInt, Payload::Integer(i)) => write!(out, "{}", i),
            (Kind::ApplyUf, _) => {
                write!(out, "(")?;
                for (i, &c) in children.iter().enumerate() {
                    if i > 0 {
                        write!(out, " ")?;
                    }
                    self.write_sexpr(c, out)?;
                }
                write!(out, ")")
            }
            (Kind::Forall | Kind::Exists, _) => {
                write!(out, "({} (", kind)?;
                for (i, &v) in self.children(children[0]).iter().enumerate() {
                    if i > 0 {
                        write!(out, " ")?;
                    }
                    write!(out, "(")?;
                    self.write_sexpr(v, out)?;
                    write!(out, " ")?;
                    self.write_sexpr(self.type_of(v).unwrap_or(v), out)?;
                    write!(out, ")")?;
                }
                write!(out, ") ")?;
                self.write_sexpr(children[1], out)?;
                write!(out, ")")
            }
            (Kind::Chain, Payload::Op(op)) => {
                write!(out, "({}", op)?;
                for &c in &children {
                    write!(out, " ")?;
                    self.write_sexpr(c, out)?;
                }
                write!(out, ")")
            }
            _ => {
                write!(out, "({}", kind)?;
                for &c in &children {
                    write!(out, " ")?;
                    self.write_sexpr(c, out)?;
                }
                write!(out, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_hash_consing() {
        let nm = NodeManager::default();
        let u = nm.mk_sort("U");
        let a = nm.mk_var("a", &u);
        let b = nm.mk_var("b", &u);

        let e1 = nm.mk_eq(&a, &b);
        let e2 = nm.mk_eq(&a, &b);
        let e3 = nm.mk_eq(&b, &a);
        assert_eq!(e1, e2);
        assert_ne!(e1, e3);
        assert_eq!(nm.mk_sort("U"), u);
    }

    #[test]
    fn test_variables_are_fresh() {
        let nm = NodeManager::default();
        let x1 = nm.mk_var("x", nm.bool_sort());
        let x2 = nm.mk_var("x", nm.bool_sort());
        assert_ne!(x1, x2);
        assert_eq!(nm.name(&x1).as_deref(), Some("x"));
    }

    #[test]
    fn test_children_precede_parent() {
        let nm = NodeManager::default();
        let p = nm.mk_var("p", nm.bool_sort());
        let q = nm.mk_var("q", nm.bool_sort());
        let f = nm.mk_and([&p, &q]);
        let g = nm.mk_or([&f, &p]);
        for t in [&f, &g] {
            for c in nm.children(t) {
                assert!(c < t.node());
            }
        }
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_child_out_of_range() {
        let nm = NodeManager::default();
        let p = nm.mk_var("p", nm.bool_sort());
        let n = nm.mk_not(&p);
        nm.child(&n, 1);
    }

    #[test]
    #[should_panic(expected = "does not accept")]
    fn test_arity_checked() {
        let nm = NodeManager::default();
        let p = nm.mk_var("p", nm.bool_sort());
        nm.mk_and([&p]);
    }

    #[test]
    fn test_reference_counting_collects() {
        let nm = NodeManager::default();
        let p = nm.mk_var("p", nm.bool_sort());
        let before = nm.live_nodes();
        let id = {
            let n = nm.mk_not(&p);
            assert_eq!(nm.ref_count(&n), 1);
            let n2 = n.clone();
            assert_eq!(nm.ref_count(&n2), 2);
            n.node()
        };
        assert!(!nm.is_alive(id));
        assert_eq!(nm.live_nodes(), before);
        assert_eq!(nm.ref_count(&p), 1);
    }

    #[test]
    fn test_collection_cascades() {
        let nm = NodeManager::default();
        let before = nm.live_nodes();
        {
            let u = nm.mk_sort("V");
            let a = nm.mk_var("a", &u);
            let b = nm.mk_var("b", &u);
            let _e = nm.mk_eq(&a, &b);
        }
        assert_eq!(nm.live_nodes(), before);
    }

    #[test]
    fn test_ids_not_reused() {
        let nm = NodeManager::default();
        let p = nm.mk_var("p", nm.bool_sort());
        let first = nm.mk_not(&p).node();
        let second = nm.mk_not(&p).node();
        assert!(second > first);
    }

    #[test]
    fn test_substitute() {
        let nm = NodeManager::default();
        let u = nm.mk_sort("U");
        let a = nm.mk_var("a", &u);
        let b = nm.mk_var("b", &u);
        let c = nm.mk_var("c", &u);
        let f = nm.mk_var("f", &nm.mk_function_sort([&u, &u], &u));
        let t = nm.mk_apply(&f, [&a, &b]);

        let s = nm.substitute(&t, &[*a], &[*c]);
        assert_eq!(s, nm.mk_apply(&f, [&c, &b]));

        // Simultaneous: a -> b and b -> a swaps the arguments.
        let swapped = nm.substitute(&t, &[*a, *b], &[*b, *a]);
        assert_eq!(swapped, nm.mk_apply(&f, [&b, &a]));
    }

    #[test]
    fn test_substitute_identity() {
        let nm = NodeManager::default();
        let p = nm.mk_var("p", nm.bool_sort());
        let q = nm.mk_var("q", nm.bool_sort());
        let t = nm.mk_or([&p, &q]);
        assert_eq!(nm.substitute(&t, &[], &[]), t);
        assert_eq!(nm.substitute(&t, &[*p], &[*p]), t);
    }

    #[test]
    fn test_type_of() {
        let nm = NodeManager::default();
        let u = nm.mk_sort("U");
        let arr = nm.mk_array_sort(&u, &u);
        let a = nm.mk_var("a", &arr);
        let i = nm.mk_var("i", &u);
        let sel = nm.mk_select(&a, &i);
        assert_eq!(nm.type_of(&sel).unwrap(), u.node());
        assert!(nm.has_attribute::<TypeAttr>(&sel));
        let st = nm.mk_store(&a, &i, &i);
        assert_eq!(nm.type_of(&st).unwrap(), arr.node());
        assert!(nm.is_boolean(&nm.mk_eq(&i, &sel)));
    }

    #[test]
    fn test_type_error() {
        let nm = NodeManager::default();
        let u = nm.mk_sort("U");
        let a = nm.mk_var("a", &u);
        let p = nm.mk_var("p", nm.bool_sort());
        let bad = nm.mk_eq(&a, &p);
        assert!(matches!(nm.type_of(&bad), Err(Error::IllTyped { .. })));
    }

    #[test]
    fn test_tree_size_is_exponential() {
        let nm = NodeManager::default();
        let mut t = nm.mk_var("p", nm.bool_sort());
        for _ in 0..70 {
            t = nm.mk_and([&t, &t]);
        }
        assert_eq!(nm.dag_size(&t), 71);
        let expected = (BigUint::from(1u32) << 71usize) - BigUint::from(1u32);
        assert_eq!(nm.tree_size(&t), expected);
    }

    #[test]
    fn test_to_sexpr() {
        let nm = NodeManager::default();
        let u = nm.mk_sort("U");
        let a = nm.mk_var("a", &u);
        let b = nm.mk_var("b", &u);
        let e = nm.mk_not(&nm.mk_eq(&a, &b));
        assert_eq!(e.to_string(), "(not (= a b))");
    }
}
