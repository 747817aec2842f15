//! Common-subexpression extraction for output ("dagification").
//!
//! A term printed as a tree can be exponentially larger than its DAG. The
//! [`DagificationVisitor`] counts how often each subterm occurs in the tree
//! rendering of a term and introduces a let-binding for every subterm that
//! occurs more than `threshold` times:
//!
//! - variables, constants, sorts, and `not`/unary minus applied to a leaf are
//!   never let-bound, and neither are quantifiers or their variable lists;
//! - a candidate whose only parent is itself let-bound is folded into the
//!   parent's binding;
//! - a candidate mentioning variables bound by a quantifier is bound inside
//!   the innermost such quantifier, everything else at top level;
//! - bindings are created in increasing id order, so the right-hand side of a
//!   later binding may refer to an earlier let variable.
//!
//! The visitor is single-use: run it once with [`run`], then query
//! [`get_lets`][DagificationVisitor::get_lets] and
//! [`get_dagified_body`][DagificationVisitor::get_dagified_body].
//!
//! # Examples
//!
//! ```
//! use smt_proof::dagify::DagificationVisitor;
//! use smt_proof::manager::NodeManager;
//! use smt_proof::visitor::run;
//!
//! let nm = NodeManager::default();
//! let a = nm.mk_var("a", nm.bool_sort());
//! let b = nm.mk_var("b", nm.bool_sort());
//! let ab = nm.mk_or([&a, &b]);
//! let f = nm.mk_and([&ab, &ab, &ab, &ab]);
//!
//! let mut dag = DagificationVisitor::new(&nm, 3);
//! run(&nm, &mut dag, f.node());
//!
//! let lets = dag.get_lets(None).unwrap();
//! assert_eq!(lets.len(), 1);
//! assert_eq!(dag.get_dagified_body(None).to_string(), "(and _let_0 _let_0 _let_0 _let_0)");
//! ```

use std::collections::{BTreeSet, HashMap};

use log::{debug, warn};

use crate::kind::Kind;
use crate::manager::NodeManager;
use crate::reference::{Node, Term};
use crate::substitution::SubstitutionMap;
use crate::visitor::{run, NodeVisitor};

pub const DEFAULT_LET_PREFIX: &str = "_let_";

/// Quantifiers and their variable lists are counted but never let-bound.
fn is_scope(kind: Kind) -> bool {
    kind.is_binder() || kind == Kind::BoundVarList
}

pub struct DagificationVisitor<'nm> {
    nm: &'nm NodeManager,
    threshold: usize,
    parallel_let: bool,
    let_prefix: String,

    /// Occurrence count of each visited node.
    node_count: HashMap<Node, usize>,
    /// The single parent of a node, or `None` once a second parent is seen.
    unique_parent: HashMap<Node, Option<Node>>,
    /// Nodes whose count exceeded the threshold.
    subst_nodes: Vec<Node>,
    binders: BTreeSet<Node>,
    /// Bound variable -> its binder.
    bound_vars: HashMap<Node, Node>,

    top: Option<Term<'nm>>,
    top_level: Option<SubstitutionMap<'nm>>,
    binder_maps: Vec<SubstitutionMap<'nm>>,
    binder_index: HashMap<Node, usize>,
    /// Rewritten binders registered in `binder_index`, kept alive.
    binder_keys: Vec<Term<'nm>>,
    let_var: usize,
    done: bool,
}

impl<'nm> DagificationVisitor<'nm> {
    /// Panics if `threshold` is zero.
    pub fn new(nm: &'nm NodeManager, threshold: usize) -> Self {
        Self::with_options(nm, threshold, false, DEFAULT_LET_PREFIX)
    }

    pub fn with_options(nm: &'nm NodeManager, threshold: usize, parallel_let: bool, let_prefix: &str) -> Self {
        assert!(threshold > 0, "Dagification threshold must be positive");
        Self {
            nm,
            threshold,
            parallel_let,
            let_prefix: let_prefix.to_string(),
            node_count: HashMap::new(),
            unique_parent: HashMap::new(),
            subst_nodes: Vec::new(),
            binders: BTreeSet::new(),
            bound_vars: HashMap::new(),
            top: None,
            top_level: None,
            binder_maps: Vec::new(),
            binder_index: HashMap::new(),
            binder_keys: Vec::new(),
            let_var: 0,
            done: false,
        }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn parallel_let(&self) -> bool {
        self.parallel_let
    }

    pub fn let_prefix(&self) -> &str {
        &self.let_prefix
    }

    /// Binders as they appear in the dagified output, where they differ
    /// from the original ones.
    pub fn rewritten_binders(&self) -> impl Iterator<Item = Node> + '_ {
        self.binder_keys.iter().map(|t| t.node())
    }

    fn count(&self, node: Node) -> usize {
        self.node_count.get(&node).copied().unwrap_or(0)
    }

    fn bound_var_list(&self, binder: Node) -> Vec<Node> {
        self.nm.children(self.nm.child(binder, 0))
    }

    /// Innermost binder whose variables occur in `node`, if any.
    ///
    /// Binders nested inside `node` shadow their own variables while their
    /// body is searched.
    fn find_bound_vars_in(&mut self, node: Node) -> Option<Node> {
        let mut found: Option<Node> = None;
        for child in self.nm.children(node) {
            let binder = if self.nm.is_var(child) {
                self.bound_vars.get(&child).copied()
            } else if self.nm.kind(child).is_binder() {
                let vars = self.bound_var_list(child);
                for v in &vars {
                    self.bound_vars.remove(v);
                }
                let binder = self.find_bound_vars_in(self.nm.child(child, 1));
                for v in vars {
                    self.bound_vars.insert(v, child);
                }
                binder
            } else {
                self.find_bound_vars_in(child)
            };

            match (found, binder) {
                (Some(f), Some(b)) if b < f => found = Some(b),
                (None, Some(b)) => found = Some(b),
                _ => {}
            }
        }
        found
    }

    fn map_for(&mut self, binder: Option<Node>) -> &mut SubstitutionMap<'nm> {
        match binder {
            None => self.top_level.get_or_insert_with(|| SubstitutionMap::new(self.nm)),
            Some(b) => {
                let i = match self.binder_index.get(&b) {
                    Some(&i) => i,
                    None => {
                        self.binder_maps.push(SubstitutionMap::new(self.nm));
                        let i = self.binder_maps.len() - 1;
                        self.binder_index.insert(b, i);
                        i
                    }
                };
                &mut self.binder_maps[i]
            }
        }
    }

    fn assert_done(&self) {
        assert!(
            self.done,
            "DagificationVisitor must be used as a visitor before getting the dagified version out"
        );
    }

    /// Let-bindings of the top level (`None`) or of a binder.
    pub fn get_lets(&self, binder: Option<Node>) -> Option<&SubstitutionMap<'nm>> {
        self.assert_done();
        match binder {
            None => self.top_level.as_ref(),
            Some(b) => self.binder_index.get(&b).map(|&i| &self.binder_maps[i]),
        }
    }

    /// The top term (`None`) or a binder's body with its let variables substituted in.
    pub fn get_dagified_body(&self, binder: Option<Node>) -> Term<'nm> {
        self.assert_done();
        match binder {
            None => {
                let top = self.top.as_ref().expect("top is set when the visitor is done");
                match &self.top_level {
                    Some(subs) => subs.apply(top),
                    None => top.clone(),
                }
            }
            Some(b) => {
                assert!(self.nm.kind(b).is_binder(), "{} is not a binder", self.nm.to_sexpr(b));
                let body = self.nm.child(b, 1);
                match self.get_lets(Some(b)) {
                    Some(subs) => {
                        debug!("dagified body of binder {}", b);
                        subs.apply(body)
                    }
                    None => self.nm.term(body),
                }
            }
        }
    }
}

impl NodeVisitor for DagificationVisitor<'_> {
    type Output = ();

    fn start(&mut self, node: Node) {
        assert!(!self.done, "DagificationVisitor cannot be re-used");
        self.top = Some(self.nm.term(node));
    }

    fn already_visited(&self, nm: &NodeManager, current: Node, _parent: Option<Node>) -> bool {
        let kind = nm.kind(current);
        nm.is_var(current)
            || nm.is_const(current)
            || nm.num_children(current) == 0
            || (matches!(kind, Kind::Not | Kind::Uminus) && {
                let c = nm.child(current, 0);
                nm.is_var(c) || nm.is_const(c)
            })
            || kind.is_sort()
            || (self.count(current) > self.threshold && !is_scope(kind))
    }

    fn visit(&mut self, nm: &NodeManager, current: Node, parent: Option<Node>) {
        if nm.kind(current).is_binder() {
            for v in self.bound_var_list(current) {
                self.bound_vars.insert(v, current);
            }
            self.binders.insert(current);
        }

        match self.unique_parent.get_mut(&current) {
            Some(unique) => {
                if unique.is_some() && *unique != parent {
                    *unique = None;
                }
                let count = self.node_count.entry(current).or_insert(0);
                *count += 1;
                if *count > self.threshold && !is_scope(nm.kind(current)) {
                    debug!("found dagification candidate: {}", nm.to_sexpr(current));
                    self.subst_nodes.push(current);
                }
            }
            None => {
                self.node_count.insert(current, 1);
                self.unique_parent.insert(current, parent);
            }
        }
    }

    fn done(&mut self, nm: &NodeManager, _node: Node) {
        assert!(!self.done, "DagificationVisitor cannot be re-used");
        self.done = true;
        self.top_level = Some(SubstitutionMap::new(self.nm));

        // Subterms before the terms containing them, for cascading lets.
        let mut candidates = std::mem::take(&mut self.subst_nodes);
        candidates.sort();
        candidates.dedup();

        for current in candidates {
            if let Some(&Some(parent)) = self.unique_parent.get(&current) {
                if self.count(parent) > self.threshold && !is_scope(nm.kind(parent)) {
                    // Folded into the parent's binding.
                    continue;
                }
            }

            let sort = match nm.type_of(current) {
                Ok(sort) => sort,
                Err(e) => {
                    warn!("not let-binding {}: {}", nm.to_sexpr(current), e);
                    continue;
                }
            };
            let binder = self.find_bound_vars_in(current);
            let name = format!("{}{}", self.let_prefix, self.let_var);
            self.let_var += 1;
            let let_var = self.nm.mk_skolem(&name, sort);

            let subs = self.map_for(binder);
            let rhs = subs.apply(current);
            assert!(!subs.has_substitution(&rhs));
            subs.add_substitution(&rhs, &let_var);
        }

        // Register each binder's map under the binder as it appears in the
        // dagified output too.
        let binders: Vec<Node> = self.binders.iter().copied().collect();
        for (k, &b) in binders.iter().enumerate() {
            let Some(&i) = self.binder_index.get(&b) else {
                continue;
            };
            let mut rewritten = match &self.top_level {
                Some(top) => top.apply(b),
                None => self.nm.term(b),
            };
            for outer in &binders[..k] {
                if let Some(&j) = self.binder_index.get(outer) {
                    rewritten = self.binder_maps[j].apply(&rewritten);
                }
            }
            debug!("binder {} turned into {}", nm.to_sexpr(b), rewritten);
            if rewritten.node() != b {
                self.binder_index.insert(rewritten.node(), i);
                self.binder_keys.push(rewritten);
            }
        }
    }
}

/// Run a fresh [`DagificationVisitor`] over `node`.
pub fn dagify(nm: &NodeManager, node: impl Into<Node>, threshold: usize) -> DagificationVisitor<'_> {
    let mut visitor = DagificationVisitor::new(nm, threshold);
    run(nm, &mut visitor, node.into());
    visitor
}
