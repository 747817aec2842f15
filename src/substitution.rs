//! Ordered term-to-term substitutions.
//!
//! Used by the dagifier to hold let-bindings: each binding maps a shared
//! subterm to the let variable naming it. Bindings keep insertion order, which
//! for let-bindings is also dependency order (a later right-hand side may
//! mention an earlier let variable, never the other way round).

use std::collections::HashMap;

use crate::manager::NodeManager;
use crate::reference::{Node, Term};

pub struct SubstitutionMap<'nm> {
    nm: &'nm NodeManager,
    bindings: Vec<(Term<'nm>, Term<'nm>)>,
    index: HashMap<Node, usize>,
}

impl<'nm> SubstitutionMap<'nm> {
    pub fn new(nm: &'nm NodeManager) -> Self {
        Self {
            nm,
            bindings: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Add the binding `from -> to`. Panics if `from` is already bound.
    pub fn add_substitution(&mut self, from: impl Into<Node>, to: impl Into<Node>) {
        let (from, to) = (from.into(), to.into());
        assert!(
            !self.index.contains_key(&from),
            "{} already has a substitution",
            self.nm.to_sexpr(from)
        );
        self.index.insert(from, self.bindings.len());
        self.bindings.push((self.nm.term(from), self.nm.term(to)));
    }

    pub fn has_substitution(&self, node: impl Into<Node>) -> bool {
        self.index.contains_key(&node.into())
    }

    pub fn get(&self, node: impl Into<Node>) -> Option<Node> {
        self.index.get(&node.into()).map(|&i| self.bindings[i].1.node())
    }

    /// Replace every bound subterm of `node` by its image.
    ///
    /// Outermost matches win, and images are not traversed again.
    pub fn apply(&self, node: impl Into<Node>) -> Term<'nm> {
        let mut cache = HashMap::new();
        self.nm
            .substitute_with(node.into(), &mut |n| self.get(n), &mut cache)
    }

    /// Fully expand the images in `node`: every occurrence of a binding's
    /// target is replaced by its (recursively expanded) source.
    pub fn inline(&self, node: impl Into<Node>) -> Term<'nm> {
        let mut expanded: HashMap<Node, Term<'nm>> = HashMap::new();
        for (from, to) in &self.bindings {
            let mut cache = HashMap::new();
            let rhs = self.nm.substitute_with(
                from.node(),
                &mut |n| expanded.get(&n).map(|t| t.node()),
                &mut cache,
            );
            expanded.insert(to.node(), rhs);
        }
        let mut cache = HashMap::new();
        self.nm
            .substitute_with(node.into(), &mut |n| expanded.get(&n).map(|t| t.node()), &mut cache)
    }

    /// Bindings in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Node, Node)> + '_ {
        self.bindings.iter().map(|(from, to)| (from.node(), to.node()))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_apply_replaces_outermost() {
        let nm = NodeManager::default();
        let p = nm.mk_var("p", nm.bool_sort());
        let q = nm.mk_var("q", nm.bool_sort());
        let pq = nm.mk_or([&p, &q]);
        let f = nm.mk_and([&pq, &p]);
        let x = nm.mk_skolem("x", nm.bool_sort());

        let mut subs = SubstitutionMap::new(&nm);
        subs.add_substitution(&pq, &x);
        assert!(subs.has_substitution(&pq));
        assert!(!subs.has_substitution(&p));
        assert_eq!(subs.apply(&f), nm.mk_and([&x, &p]));
        assert_eq!(subs.apply(&pq), x);
    }

    #[test]
    fn test_empty_map_is_identity() {
        let nm = NodeManager::default();
        let p = nm.mk_var("p", nm.bool_sort());
        let f = nm.mk_not(&p);
        let subs = SubstitutionMap::new(&nm);
        assert!(subs.is_empty());
        assert_eq!(subs.apply(&f), f);
    }

    #[test]
    fn test_inline_cascades() {
        let nm = NodeManager::default();
        let p = nm.mk_var("p", nm.bool_sort());
        let q = nm.mk_var("q", nm.bool_sort());
        let x0 = nm.mk_skolem("x0", nm.bool_sort());
        let x1 = nm.mk_skolem("x1", nm.bool_sort());
        let inner = nm.mk_or([&p, &q]);
        let outer_rhs = nm.mk_and([&x0, &p]);

        let mut subs = SubstitutionMap::new(&nm);
        subs.add_substitution(&inner, &x0);
        subs.add_substitution(&outer_rhs, &x1);
        assert_eq!(subs.len(), 2);

        let body = nm.mk_or([&x1, &x0]);
        let expected = nm.mk_or([&nm.mk_and([&inner, &p]), &inner]);
        assert_eq!(subs.inline(&body), expected);
    }

    #[test]
    #[should_panic(expected = "already has a substitution")]
    fn test_duplicate_binding_panics() {
        let nm = NodeManager::default();
        let p = nm.mk_var("p", nm.bool_sort());
        let x = nm.mk_skolem("x", nm.bool_sort());
        let mut subs = SubstitutionMap::new(&nm);
        subs.add_substitution(&p, &x);
        subs.add_substitution(&p, &x);
    }
}
