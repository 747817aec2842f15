//! The narrow interface through which theory solvers are replayed.
//!
//! A [`Theory`] receives facts and reports its findings on an
//! [`OutputChannel`] passed to [`Theory::check`]. Proof reconstruction drives
//! a fresh theory instance through a [`ProofOutputChannel`] and inspects which
//! callback fired.
//!
//! Replay relies on theories being deterministic: a fresh instance fed the
//! same facts must reach the same conflict (or lemma) every time, and asserting
//! the negation of a reported lemma followed by another check must not depend
//! on hidden state such as random seeds.

use log::debug;

use crate::eq_proof::EqProof;
use crate::proof_manager::ProofRule;
use crate::reference::{Node, Term};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub enum Effort {
    Standard,
    Full,
}

pub trait OutputChannel<'nm> {
    /// The conjunction `conflict` of asserted literals is unsatisfiable, as
    /// shown by `proof`.
    fn conflict(&mut self, conflict: Term<'nm>, proof: EqProof<'nm>);

    fn propagate(&mut self, literal: Node) -> bool;

    /// `lemma` holds in the theory.
    fn lemma(&mut self, lemma: Term<'nm>, rule: ProofRule);
}

pub trait Theory<'nm> {
    /// Make the theory aware of the subterms of `term` before it is asserted.
    fn pre_register_term(&mut self, term: Node);

    fn assert_fact(&mut self, fact: Node);

    fn check(&mut self, effort: Effort, out: &mut dyn OutputChannel<'nm>);
}

/// Captures what a theory reports during proof replay.
#[derive(Default)]
pub struct ProofOutputChannel<'nm> {
    conflict: Option<(Term<'nm>, EqProof<'nm>)>,
    lemma: Option<(Term<'nm>, ProofRule)>,
    propagated: Vec<Node>,
}

impl<'nm> ProofOutputChannel<'nm> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_conflict(&self) -> bool {
        self.conflict.is_some()
    }

    pub fn take_conflict(&mut self) -> Option<(Term<'nm>, EqProof<'nm>)> {
        self.conflict.take()
    }

    pub fn take_lemma(&mut self) -> Option<(Term<'nm>, ProofRule)> {
        self.lemma.take()
    }

    pub fn propagated(&self) -> &[Node] {
        &self.propagated
    }
}

impl<'nm> OutputChannel<'nm> for ProofOutputChannel<'nm> {
    fn conflict(&mut self, conflict: Term<'nm>, proof: EqProof<'nm>) {
        assert!(self.conflict.is_none(), "Conflict reported twice during replay");
        debug!("replay conflict: {}", conflict);
        self.conflict = Some((conflict, proof));
    }

    fn propagate(&mut self, literal: Node) -> bool {
        self.propagated.push(literal);
        true
    }

    fn lemma(&mut self, lemma: Term<'nm>, rule: ProofRule) {
        debug!("replay lemma ({:?}): {}", rule, lemma);
        self.lemma = Some((lemma, rule));
    }
}
