//! A small proof-producing congruence closure, used as the replay target of
//! proof reconstruction.
//!
//! Terms are merged into equivalence classes (union-find with explicit member
//! lists). Every merge also adds an edge to a proof forest, labelled with the
//! reason of the merge, from which [`EqProof`]s are extracted. Boolean atoms
//! are merged with the constants `true`/`false`, which are kept apart by a
//! permanent disequality, so predicate conflicts and equality conflicts are
//! detected the same way.
//!
//! With arrays enabled, read-over-write is handled lazily:
//! `(select (store a i v) i)` is merged with `v` on registration, and
//! `(select (store a i v) j)` with `(select a j)` once `(not (= i j))` has been
//! asserted. Otherwise a full check reports the lemma
//! `(or (= i j) (= (select (store a i v) j) (select a j)))`.

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::eq_proof::EqProof;
use crate::kind::Kind;
use crate::manager::NodeManager;
use crate::proof_manager::ProofRule;
use crate::reference::{Node, Term};
use crate::theory::{Effort, OutputChannel, Theory};

#[derive(Debug, Clone)]
enum Reason {
    /// An asserted equality.
    Assume(Node),
    PredTrue(Node),
    PredFalse(Node),
    Congruence(usize, usize),
    Row1(usize),
    Row { read: usize, diseq: Node },
}

/// Proof-forest edge. The reason proves `(= lhs other)` where `other` is the
/// other endpoint; rerooting flips the direction but keeps `lhs`.
#[derive(Debug, Clone)]
struct Edge {
    to: usize,
    reason: Reason,
    lhs: usize,
}

#[derive(Debug)]
struct Diseq {
    a: usize,
    b: usize,
    /// `None` for the built-in `true != false`.
    literal: Option<Node>,
}

pub struct TheoryUf<'nm> {
    nm: &'nm NodeManager,
    arrays: bool,

    terms: Vec<Term<'nm>>,
    ids: HashMap<Node, usize>,
    rep: Vec<usize>,
    members: Vec<Vec<usize>>,
    /// For a representative, the applications with an argument in its class.
    uses: Vec<Vec<usize>>,
    forest: Vec<Option<Edge>>,

    diseqs: Vec<Diseq>,
    pending: Vec<(usize, usize, Reason)>,

    /// Reads `(select (store a i v) j)` with `i` and `j` distinct nodes.
    row_candidates: Vec<usize>,
    emitted: HashSet<Node>,
    owned: Vec<Term<'nm>>,

    true_id: usize,
    false_id: usize,
}

fn is_app(kind: Kind) -> bool {
    matches!(kind, Kind::ApplyUf | Kind::Select | Kind::Store)
}

impl<'nm> TheoryUf<'nm> {
    pub fn new(nm: &'nm NodeManager, arrays: bool) -> Self {
        let mut uf = Self {
            nm,
            arrays,
            terms: Vec::new(),
            ids: HashMap::new(),
            rep: Vec::new(),
            members: Vec::new(),
            uses: Vec::new(),
            forest: Vec::new(),
            diseqs: Vec::new(),
            pending: Vec::new(),
            row_candidates: Vec::new(),
            emitted: HashSet::new(),
            owned: Vec::new(),
            true_id: 0,
            false_id: 0,
        };
        uf.true_id = uf.register(*nm.mk_bool(true));
        uf.false_id = uf.register(*nm.mk_bool(false));
        uf.diseqs.push(Diseq {
            a: uf.true_id,
            b: uf.false_id,
            literal: None,
        });
        uf
    }

    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }

    pub fn are_equal(&self, a: Node, b: Node) -> bool {
        match (self.ids.get(&a), self.ids.get(&b)) {
            (Some(&x), Some(&y)) => self.rep[x] == self.rep[y],
            _ => a == b,
        }
    }

    fn node(&self, id: usize) -> Node {
        self.terms[id].node()
    }

    fn id(&self, node: Node) -> usize {
        match self.ids.get(&node) {
            Some(&id) => id,
            None => panic!("{} is not registered", self.nm.to_sexpr(node)),
        }
    }

    fn register(&mut self, node: Node) -> usize {
        if let Some(&id) = self.ids.get(&node) {
            return id;
        }

        let kind = self.nm.kind(node);
        let children = if is_app(kind) { self.nm.children(node) } else { Vec::new() };
        let child_ids: Vec<usize> = children.iter().map(|&c| self.register(c)).collect();

        let id = self.terms.len();
        self.terms.push(self.nm.term(node));
        self.ids.insert(node, id);
        self.rep.push(id);
        self.members.push(vec![id]);
        self.uses.push(Vec::new());
        self.forest.push(None);

        if let Some(&first) = child_ids.first() {
            let r = self.rep[first];
            let congruent = self.uses[r].iter().copied().find(|&u| self.congruent(u, id));
            for &c in &child_ids {
                let r = self.rep[c];
                if !self.uses[r].contains(&id) {
                    self.uses[r].push(id);
                }
            }
            if let Some(u) = congruent {
                self.pending.push((id, u, Reason::Congruence(id, u)));
            }
        }

        if self.arrays && kind == Kind::Select && self.nm.kind(children[0]) == Kind::Store {
            let store = self.nm.children(children[0]);
            let (i, v, j) = (store[1], store[2], children[1]);
            if i == j {
                let v = self.id(v);
                self.pending.push((id, v, Reason::Row1(id)));
            } else {
                self.row_candidates.push(id);
            }
        }

        self.propagate();
        id
    }

    fn congruent(&self, p: usize, q: usize) -> bool {
        let (p, q) = (self.node(p), self.node(q));
        if self.nm.kind(p) != self.nm.kind(q) {
            return false;
        }
        let (cp, cq) = (self.nm.children(p), self.nm.children(q));
        cp.len() == cq.len()
            && cp
                .iter()
                .zip(&cq)
                .all(|(&a, &b)| self.rep[self.id(a)] == self.rep[self.id(b)])
    }

    /// Make `x` the root of its proof tree.
    fn reroot(&mut self, x: usize) {
        let mut cur = x;
        let mut incoming: Option<Edge> = None;
        loop {
            let outgoing = self.forest[cur].take();
            self.forest[cur] = incoming;
            match outgoing {
                None => break,
                Some(edge) => {
                    let next = edge.to;
                    incoming = Some(Edge { to: cur, ..edge });
                    cur = next;
                }
            }
        }
    }

    fn propagate(&mut self) {
        while let Some((a, b, reason)) = self.pending.pop() {
            let (ra, rb) = (self.rep[a], self.rep[b]);
            if ra == rb {
                continue;
            }
            debug!(
                "merge {} and {} ({:?})",
                self.nm.to_sexpr(self.node(a)),
                self.nm.to_sexpr(self.node(b)),
                reason
            );

            self.reroot(a);
            self.forest[a] = Some(Edge { to: b, reason, lhs: a });

            let (from, into) = if self.members[ra].len() > self.members[rb].len() {
                (rb, ra)
            } else {
                (ra, rb)
            };
            let moved = std::mem::take(&mut self.members[from]);
            for &m in &moved {
                self.rep[m] = into;
            }
            self.members[into].extend(moved);

            let from_uses = std::mem::take(&mut self.uses[from]);
            let mut found = Vec::new();
            for &p in &from_uses {
                for &q in &self.uses[into] {
                    if self.rep[p] != self.rep[q] && self.congruent(p, q) {
                        found.push((p, q, Reason::Congruence(p, q)));
                    }
                }
            }
            for p in from_uses {
                if !self.uses[into].contains(&p) {
                    self.uses[into].push(p);
                }
            }
            self.pending.extend(found);
        }
    }

    /// Proof of `(= node(x) parent(x))` for the forest edge leaving `x`.
    fn edge_proof(&self, x: usize) -> EqProof<'nm> {
        let edge = match &self.forest[x] {
            Some(edge) => edge,
            None => panic!("{} has no outgoing proof edge", self.nm.to_sexpr(self.node(x))),
        };
        let proof = self.reason_proof(&edge.reason);
        if edge.lhs == x {
            proof
        } else {
            proof.symm()
        }
    }

    fn reason_proof(&self, reason: &Reason) -> EqProof<'nm> {
        let nm = self.nm;
        match *reason {
            Reason::Assume(lit) => EqProof::Assume(nm.term(lit)),
            Reason::PredTrue(lit) => EqProof::PredTrue(nm.term(lit)),
            Reason::PredFalse(lit) => EqProof::PredFalse(nm.term(lit)),
            Reason::Congruence(p, q) => {
                let (p, q) = (self.node(p), self.node(q));
                let (cp, cq) = (self.nm.children(p), self.nm.children(q));
                let kind = self.nm.kind(p);
                let (mut proof, start) = if kind == Kind::ApplyUf {
                    (self.explain(self.id(cp[0]), self.id(cq[0])), 1)
                } else {
                    (EqProof::ReflOp(kind), 0)
                };
                for k in start..cp.len() {
                    proof = EqProof::cong(proof, self.explain(self.id(cp[k]), self.id(cq[k])));
                }
                proof
            }
            Reason::Row1(read) => {
                let store = self.nm.child(self.node(read), 0);
                let s = self.nm.children(store);
                EqProof::Row1 {
                    array: nm.term(s[0]),
                    index: nm.term(s[1]),
                    value: nm.term(s[2]),
                }
            }
            Reason::Row { read, diseq } => {
                let read = self.node(read);
                let store = self.nm.child(read, 0);
                let s = self.nm.children(store);
                // The disequality is `(not (= i j))` or `(not (= j i))`.
                let flipped = nm.child(nm.child(diseq, 0), 0) != s[1];
                EqProof::Row {
                    i: nm.term(s[1]),
                    j: nm.term(self.nm.child(read, 1)),
                    array: nm.term(s[0]),
                    value: nm.term(s[2]),
                    diseq: nm.term(diseq),
                    flipped,
                }
            }
        }
    }

    /// Proof of `(= node(x) node(y))` for two terms of the same class.
    fn explain(&self, x: usize, y: usize) -> EqProof<'nm> {
        if x == y {
            return EqProof::Refl(self.terms[x].clone());
        }
        assert_eq!(self.rep[x], self.rep[y], "Cannot explain terms of different classes");

        let mut path_x = vec![x];
        let mut cur = x;
        while let Some(edge) = &self.forest[cur] {
            cur = edge.to;
            path_x.push(cur);
        }
        let position: HashMap<usize, usize> = path_x.iter().enumerate().map(|(k, &n)| (n, k)).collect();

        let mut path_y = Vec::new();
        cur = y;
        while !position.contains_key(&cur) {
            path_y.push(cur);
            cur = match &self.forest[cur] {
                Some(edge) => edge.to,
                None => unreachable!("terms of one class share a proof tree"),
            };
        }
        let lca = position[&cur];

        let mut proofs: Vec<EqProof<'nm>> = path_x[..lca].iter().map(|&n| self.edge_proof(n)).collect();
        proofs.extend(path_y.iter().rev().map(|&n| self.edge_proof(n).symm()));
        EqProof::trans_chain(proofs).unwrap_or_else(|| EqProof::Refl(self.terms[x].clone()))
    }

    fn find_conflict(&self) -> Option<EqProof<'nm>> {
        self.diseqs
            .iter()
            .find(|d| self.rep[d.a] == self.rep[d.b])
            .map(|d| EqProof::contra(self.explain(d.a, d.b), d.literal.map(|l| self.nm.term(l))))
    }

    /// Merge reads over writes whose index disequality has been asserted.
    fn instantiate_row(&mut self) {
        let mut ready = Vec::new();
        self.row_candidates.retain(|&read| {
            let read_node = self.terms[read].node();
            let j = self.nm.child(read_node, 1);
            let i = self.nm.child(self.nm.child(read_node, 0), 1);
            let diseq = self.diseqs.iter().find_map(|d| {
                let (a, b) = (self.terms[d.a].node(), self.terms[d.b].node());
                match d.literal {
                    Some(lit) if (a, b) == (i, j) || (a, b) == (j, i) => Some(lit),
                    _ => None,
                }
            });
            match diseq {
                Some(lit) => {
                    ready.push((read, lit));
                    false
                }
                None => true,
            }
        });

        for (read, diseq) in ready {
            let read_node = self.node(read);
            let array = self.nm.child(self.nm.child(read_node, 0), 0);
            let j = self.nm.child(read_node, 1);
            let other = self.nm.mk_select(array, j);
            let o = self.register(*other);
            self.pending.push((read, o, Reason::Row { read, diseq }));
            self.propagate();
        }
    }

    fn next_row_lemma(&mut self) -> Option<Term<'nm>> {
        for k in 0..self.row_candidates.len() {
            let read = self.node(self.row_candidates[k]);
            let store = self.nm.child(read, 0);
            let (array, i) = (self.nm.child(store, 0), self.nm.child(store, 1));
            let j = self.nm.child(read, 1);
            if self.are_equal(i, j) {
                continue;
            }
            let lemma = self.nm.mk_or([
                &self.nm.mk_eq(i, j),
                &self.nm.mk_eq(read, &self.nm.mk_select(array, j)),
            ]);
            if self.emitted.insert(lemma.node()) {
                self.owned.push(lemma.clone());
                return Some(lemma);
            }
        }
        None
    }
}

impl<'nm> Theory<'nm> for TheoryUf<'nm> {
    fn pre_register_term(&mut self, term: Node) {
        match self.nm.kind(term) {
            Kind::Not | Kind::And | Kind::Or => {
                for c in self.nm.children(term) {
                    self.pre_register_term(c);
                }
            }
            Kind::Equal => {
                for c in self.nm.children(term) {
                    self.register(c);
                }
            }
            _ => {
                self.register(term);
            }
        }
    }

    fn assert_fact(&mut self, fact: Node) {
        debug!("assert {}", self.nm.to_sexpr(fact));
        let nm = self.nm;
        match nm.kind(fact) {
            Kind::Not => {
                let inner = nm.child(fact, 0);
                match nm.kind(inner) {
                    Kind::Equal => {
                        let a = self.register(nm.child(inner, 0));
                        let b = self.register(nm.child(inner, 1));
                        self.diseqs.push(Diseq {
                            a,
                            b,
                            literal: Some(fact),
                        });
                    }
                    Kind::Or => {
                        for d in nm.children(inner) {
                            let negated = nm.mk_not(d);
                            self.assert_fact(*negated);
                            self.owned.push(negated);
                        }
                    }
                    Kind::Not => self.assert_fact(nm.child(inner, 0)),
                    _ => {
                        let p = self.register(inner);
                        self.pending.push((p, self.false_id, Reason::PredFalse(fact)));
                        self.propagate();
                    }
                }
            }
            Kind::Equal => {
                let a = self.register(nm.child(fact, 0));
                let b = self.register(nm.child(fact, 1));
                self.pending.push((a, b, Reason::Assume(fact)));
                self.propagate();
            }
            Kind::And => {
                for c in nm.children(fact) {
                    self.assert_fact(c);
                }
            }
            _ => {
                let p = self.register(fact);
                self.pending.push((p, self.true_id, Reason::PredTrue(fact)));
                self.propagate();
            }
        }
    }

    fn check(&mut self, effort: Effort, out: &mut dyn OutputChannel<'nm>) {
        if effort == Effort::Full && self.arrays {
            self.instantiate_row();
        }

        if let Some(proof) = self.find_conflict() {
            let literals = proof.assumptions();
            let conflict = match literals.len() {
                0 => self.nm.mk_bool(false),
                1 => self.nm.term(literals[0]),
                _ => self.nm.mk_and(&literals),
            };
            out.conflict(conflict, proof);
            return;
        }

        if effort == Effort::Full && self.arrays {
            if let Some(lemma) = self.next_row_lemma() {
                out.lemma(lemma, ProofRule::ArraysRow);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::theory::ProofOutputChannel;

    #[test]
    fn test_transitivity_conflict() {
        let nm = NodeManager::default();
        let u = nm.mk_sort("U");
        let a = nm.mk_var("a", &u);
        let b = nm.mk_var("b", &u);
        let c = nm.mk_var("c", &u);
        let ab = nm.mk_eq(&a, &b);
        let bc = nm.mk_eq(&b, &c);
        let nac = nm.mk_not(&nm.mk_eq(&a, &c));

        let mut uf = TheoryUf::new(&nm, false);
        let mut out = ProofOutputChannel::new();
        for lit in [&ab, &bc, &nac] {
            uf.pre_register_term(**lit);
            uf.assert_fact(**lit);
        }
        uf.check(Effort::Full, &mut out);

        let (conflict, proof) = out.take_conflict().unwrap();
        assert_eq!(conflict, nm.mk_and([&ab, &bc, &nac]));
        assert_eq!(
            proof,
            EqProof::contra(
                EqProof::trans_chain(vec![EqProof::Assume(ab.clone()), EqProof::Assume(bc.clone())]).unwrap(),
                Some(nac.clone())
            )
        );
    }

    #[test]
    fn test_no_conflict() {
        let nm = NodeManager::default();
        let u = nm.mk_sort("U");
        let a = nm.mk_var("a", &u);
        let b = nm.mk_var("b", &u);
        let nab = nm.mk_not(&nm.mk_eq(&a, &b));

        let mut uf = TheoryUf::new(&nm, false);
        let mut out = ProofOutputChannel::new();
        uf.assert_fact(*nab);
        uf.check(Effort::Full, &mut out);
        assert!(!out.has_conflict());
        assert!(out.take_lemma().is_none());
    }

    #[test]
    fn test_predicate_congruence() {
        let nm = NodeManager::default();
        let u = nm.mk_sort("U");
        let a = nm.mk_var("a", &u);
        let b = nm.mk_var("b", &u);
        let p = nm.mk_var("P", &nm.mk_function_sort([&u], nm.bool_sort()));
        let pa = nm.mk_apply(&p, [&a]);
        let pb = nm.mk_apply(&p, [&b]);
        let ab = nm.mk_eq(&a, &b);
        let npb = nm.mk_not(&pb);

        let mut uf = TheoryUf::new(&nm, false);
        let mut out = ProofOutputChannel::new();
        for lit in [&ab, &pa, &npb] {
            uf.pre_register_term(**lit);
            uf.assert_fact(**lit);
        }
        assert!(uf.are_equal(*pa, *pb));
        uf.check(Effort::Full, &mut out);

        let (_, proof) = out.take_conflict().unwrap();
        let mut assumptions = proof.assumptions();
        assumptions.sort();
        let mut expected = vec![*ab, *pa, *npb];
        expected.sort();
        assert_eq!(assumptions, expected);
    }

    #[test]
    fn test_row_lemma_then_conflict() {
        let nm = NodeManager::default();
        let u = nm.mk_sort("U");
        let arr = nm.mk_array_sort(&u, &u);
        let a = nm.mk_var("a", &arr);
        let i = nm.mk_var("i", &u);
        let j = nm.mk_var("j", &u);
        let v = nm.mk_var("v", &u);
        let read = nm.mk_select(&nm.mk_store(&a, &i, &v), &j);
        let other = nm.mk_select(&a, &j);
        let fact = nm.mk_not(&nm.mk_eq(&read, &other));

        let mut uf = TheoryUf::new(&nm, true);
        let mut out = ProofOutputChannel::new();
        uf.pre_register_term(*fact);
        uf.assert_fact(*fact);
        uf.check(Effort::Full, &mut out);
        assert!(!out.has_conflict());
        let (lemma, rule) = out.take_lemma().unwrap();
        assert_eq!(rule, ProofRule::ArraysRow);
        assert_eq!(lemma, nm.mk_or([&nm.mk_eq(&i, &j), &nm.mk_eq(&read, &other)]));

        let negated = nm.mk_not(&lemma);
        uf.pre_register_term(*negated);
        uf.assert_fact(*negated);
        uf.check(Effort::Full, &mut out);
        let (_, proof) = out.take_conflict().unwrap();
        let nij = nm.mk_not(&nm.mk_eq(&i, &j));
        assert_eq!(proof.assumptions(), vec![*nij, *fact]);
    }

    #[test]
    fn test_row_with_swapped_disequality() {
        let nm = NodeManager::default();
        let u = nm.mk_sort("U");
        let a = nm.mk_var("a", &nm.mk_array_sort(&u, &u));
        let i = nm.mk_var("i", &u);
        let j = nm.mk_var("j", &u);
        let v = nm.mk_var("v", &u);
        let read = nm.mk_select(&nm.mk_store(&a, &i, &v), &j);
        let fact = nm.mk_not(&nm.mk_eq(&read, &nm.mk_select(&a, &j)));
        let nji = nm.mk_not(&nm.mk_eq(&j, &i));

        let mut uf = TheoryUf::new(&nm, true);
        let mut out = ProofOutputChannel::new();
        for lit in [&fact, &nji] {
            uf.pre_register_term(**lit);
            uf.assert_fact(**lit);
        }
        uf.check(Effort::Full, &mut out);
        assert!(out.take_lemma().is_none());
        let (_, proof) = out.take_conflict().unwrap();
        assert_eq!(proof.assumptions(), vec![*nji, *fact]);
        match &proof {
            EqProof::Contra { eq, .. } => assert!(matches!(**eq, EqProof::Row { flipped: true, .. })),
            other => panic!("unexpected proof: {:?}", other),
        }
    }

    #[test]
    fn test_row1_on_registration() {
        let nm = NodeManager::default();
        let u = nm.mk_sort("U");
        let arr = nm.mk_array_sort(&u, &u);
        let a = nm.mk_var("a", &arr);
        let i = nm.mk_var("i", &u);
        let v = nm.mk_var("v", &u);
        let read = nm.mk_select(&nm.mk_store(&a, &i, &v), &i);

        let mut uf = TheoryUf::new(&nm, true);
        uf.pre_register_term(*read);
        assert!(uf.are_equal(*read, *v));
    }
}
