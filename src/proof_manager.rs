//! The proof manager: registry of everything a final proof is built from.
//!
//! While the SAT engine runs, it registers clauses (tagged by [`ClauseKind`]),
//! atoms and resolution chains; the front end registers input assertions.
//! [`ProofManager::get_proof`] then assembles the proof document once and
//! caches it.
//!
//! Theory clauses are justified by replay: [`ProofManager::print_proof`]
//! feeds the negation of the clause to a fresh theory instance, captures the
//! conflict it reports and prints its equality proof. The replay instance is
//! a local value, dropped on every exit path.
//!
//! # Examples
//!
//! ```
//! use smt_proof::config::ProofOptions;
//! use smt_proof::error::Error;
//! use smt_proof::manager::NodeManager;
//! use smt_proof::proof_manager::{ClauseKind, ProofManager};
//! use smt_proof::sat::SatClause;
//!
//! let nm = NodeManager::default();
//! let mut pm = ProofManager::new(&nm, ProofOptions::default());
//! let id = pm.next_id().unwrap();
//! pm.add_clause(id, SatClause::from_dimacs(&[1, -2]), ClauseKind::Input).unwrap();
//! assert!(matches!(
//!     pm.add_clause(id, SatClause::from_dimacs(&[1, -2]), ClauseKind::TheoryLemma),
//!     Err(Error::ClauseKindConflict { .. })
//! ));
//! assert_eq!(pm.num_input_clauses(), 1);
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display, Formatter, Write};

use log::{debug, info};

use crate::cnf_proof::CnfProof;
use crate::config::ProofOptions;
use crate::eq_proof::{EqProof, ProofPrinter};
use crate::error::{Error, Result};
use crate::logic::LogicInfo;
use crate::manager::NodeManager;
use crate::reference::{Node, Term};
use crate::sat::{SatClause, SatLiteral, SatVariable};
use crate::sat_proof::{ResolutionChain, SatProof};
use crate::theory::{Effort, ProofOutputChannel, Theory};
use crate::theory_proof::TheoryProof;
use crate::types::ClauseId;
use crate::uf::TheoryUf;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ClauseKind {
    /// A clause of the input problem.
    Input,
    TheoryLemma,
    TheoryPropagation,
    /// Derived by the SAT engine through resolution.
    Learnt,
}

impl Display for ClauseKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            ClauseKind::Input => "input",
            ClauseKind::TheoryLemma => "lemma",
            ClauseKind::TheoryPropagation => "propagation",
            ClauseKind::Learnt => "learnt",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum ProofFormat {
    /// Checkable LFSC document.
    #[default]
    Lfsc,
    /// Line-oriented dump for debugging.
    Native,
}

/// How a theory justifies a fact it reports.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ProofRule {
    Given,
    Derived,
    Reconstruct,
    Trust,
    Invalid,
    Conflict,
    ArraysExt,
    ArraysRow,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ProofState {
    /// Nothing registered yet.
    Uninitialized,
    Collecting,
    /// The document is being assembled.
    Finalizing,
    Emitted,
}

pub struct ProofManager<'nm> {
    nm: &'nm NodeManager,
    format: ProofFormat,
    options: ProofOptions,
    logic: LogicInfo,
    state: ProofState,

    clauses: BTreeMap<ClauseId, (SatClause, ClauseKind)>,
    next_clause: u64,
    prop_vars: BTreeSet<SatVariable>,
    assertions: Vec<Term<'nm>>,

    cnf: CnfProof<'nm>,
    sat: SatProof,
    theory: TheoryProof<'nm>,

    proof: Option<String>,
}

impl<'nm> ProofManager<'nm> {
    pub fn new(nm: &'nm NodeManager, options: ProofOptions) -> Self {
        Self {
            nm,
            format: options.format,
            options,
            logic: LogicInfo::default(),
            state: ProofState::Uninitialized,
            clauses: BTreeMap::new(),
            next_clause: 1,
            prop_vars: BTreeSet::new(),
            assertions: Vec::new(),
            cnf: CnfProof::new(nm),
            sat: SatProof::new(),
            theory: TheoryProof::new(nm),
            proof: None,
        }
    }

    pub fn with_format(nm: &'nm NodeManager, format: ProofFormat) -> Self {
        Self::new(
            nm,
            ProofOptions {
                format,
                ..ProofOptions::default()
            },
        )
    }

    pub fn node_manager(&self) -> &'nm NodeManager {
        self.nm
    }

    pub fn format(&self) -> ProofFormat {
        self.format
    }

    pub fn options(&self) -> &ProofOptions {
        &self.options
    }

    pub fn state(&self) -> ProofState {
        self.state
    }

    pub fn logic(&self) -> &LogicInfo {
        &self.logic
    }

    pub fn set_logic(&mut self, logic: LogicInfo) {
        debug!("proof logic: {}", logic);
        self.logic = logic;
    }

    pub fn cnf_proof(&self) -> &CnfProof<'nm> {
        &self.cnf
    }

    pub fn sat_proof(&self) -> &SatProof {
        &self.sat
    }

    pub fn theory_proof(&self) -> &TheoryProof<'nm> {
        &self.theory
    }

    /// A fresh clause id, larger than any id seen so far.
    pub fn next_id(&mut self) -> Result<ClauseId> {
        let id = u32::try_from(self.next_clause).map_err(|_| Error::IdOverflow("clause id"))?;
        self.next_clause += 1;
        Ok(ClauseId::new(id))
    }

    fn begin_registration(&mut self) -> Result<()> {
        match self.state {
            ProofState::Uninitialized => {
                self.state = ProofState::Collecting;
                Ok(())
            }
            ProofState::Collecting => Ok(()),
            ProofState::Finalizing | ProofState::Emitted => Err(Error::ProofFinalized),
        }
    }
}

// Registration
impl<'nm> ProofManager<'nm> {
    /// Register the body of clause `id`.
    ///
    /// Registering an id again with the same kind does nothing; with another
    /// kind it is an error, and the first registration stays.
    pub fn add_clause(&mut self, id: ClauseId, clause: SatClause, kind: ClauseKind) -> Result<()> {
        self.begin_registration()?;
        if let Some((_, existing)) = self.clauses.get(&id) {
            if *existing == kind {
                return Ok(());
            }
            return Err(Error::ClauseKindConflict {
                id,
                existing: *existing,
                requested: kind,
            });
        }
        debug!("add_clause: {} {} {}", kind, id, clause);
        self.prop_vars.extend(clause.variables());
        self.clauses.insert(id, (clause, kind));
        self.next_clause = self.next_clause.max(u64::from(id.id()) + 1);
        Ok(())
    }

    pub fn add_assertion(&mut self, term: impl Into<Node>) -> Result<()> {
        self.begin_registration()?;
        let term = self.nm.term(term);
        debug!("add_assertion: {}", term);
        self.assertions.push(term);
        Ok(())
    }

    pub fn register_atom(&mut self, atom: impl Into<Node>) -> Result<SatVariable> {
        self.begin_registration()?;
        self.cnf.register_atom(atom)
    }

    pub fn register_atom_as(&mut self, atom: impl Into<Node>, var: SatVariable) -> Result<()> {
        self.begin_registration()?;
        self.cnf.register_atom_as(atom, var);
        Ok(())
    }

    /// Record how the learnt clause `id` was derived.
    pub fn add_resolution(&mut self, id: ClauseId, chain: ResolutionChain) -> Result<()> {
        self.begin_registration()?;
        self.sat.add_chain(id, chain);
        Ok(())
    }

    /// Record the derivation of the empty clause.
    pub fn set_refutation(&mut self, chain: ResolutionChain) -> Result<()> {
        self.begin_registration()?;
        self.sat.set_final_chain(chain);
        Ok(())
    }
}

// Queries
impl<'nm> ProofManager<'nm> {
    pub fn clause(&self, id: ClauseId) -> Option<&SatClause> {
        self.clauses.get(&id).map(|(c, _)| c)
    }

    pub fn clause_kind(&self, id: ClauseId) -> Option<ClauseKind> {
        self.clauses.get(&id).map(|&(_, k)| k)
    }

    /// Registered clauses of one kind, in ascending id order.
    pub fn clauses_of(&self, kind: ClauseKind) -> impl Iterator<Item = (ClauseId, &SatClause)> + '_ {
        self.clauses
            .iter()
            .filter(move |(_, (_, k))| *k == kind)
            .map(|(&id, (c, _))| (id, c))
    }

    fn count(&self, kind: ClauseKind) -> usize {
        self.clauses.values().filter(|(_, k)| *k == kind).count()
    }

    pub fn num_input_clauses(&self) -> usize {
        self.count(ClauseKind::Input)
    }

    pub fn num_lemmas(&self) -> usize {
        self.count(ClauseKind::TheoryLemma)
    }

    pub fn num_propagations(&self) -> usize {
        self.count(ClauseKind::TheoryPropagation)
    }

    pub fn num_learnt(&self) -> usize {
        self.count(ClauseKind::Learnt)
    }

    pub fn num_assertions(&self) -> usize {
        self.assertions.len()
    }

    pub fn assertions(&self) -> impl Iterator<Item = Node> + '_ {
        self.assertions.iter().map(Term::node)
    }

    /// SAT variables occurring in registered clauses, in ascending order.
    pub fn prop_vars(&self) -> impl Iterator<Item = SatVariable> + '_ {
        self.prop_vars.iter().copied()
    }
}

// Names
impl ProofManager<'_> {
    pub fn input_clause_name(id: ClauseId) -> String {
        format!("pb{}", id)
    }

    pub fn lemma_clause_name(id: ClauseId) -> String {
        format!("lem{}", id)
    }

    pub fn propagation_clause_name(id: ClauseId) -> String {
        format!("tp{}", id)
    }

    pub fn learnt_clause_name(id: ClauseId) -> String {
        format!("cl{}", id)
    }

    pub fn var_name(var: SatVariable) -> String {
        format!("v{}", var)
    }

    pub fn atom_name(var: SatVariable) -> String {
        format!("a{}", var)
    }

    pub fn lit_name(lit: SatLiteral) -> String {
        format!("l{}", lit.to_int())
    }

    /// Name of a registered clause, by its kind.
    pub fn clause_name(&self, id: ClauseId) -> Option<String> {
        self.clause_kind(id).map(|kind| match kind {
            ClauseKind::Input => Self::input_clause_name(id),
            ClauseKind::TheoryLemma => Self::lemma_clause_name(id),
            ClauseKind::TheoryPropagation => Self::propagation_clause_name(id),
            ClauseKind::Learnt => Self::learnt_clause_name(id),
        })
    }

    pub fn atom_name_of(&self, atom: impl Into<Node>) -> Result<String> {
        let lit = self.cnf.get_literal(atom)?;
        Ok(Self::atom_name(lit.variable()))
    }

    pub fn lit_name_of(&self, literal: impl Into<Node>) -> Result<String> {
        Ok(Self::lit_name(self.cnf.get_literal(literal)?))
    }
}

/// Prints assumptions under the names bound by the enclosing `satlem`.
struct LfscPrinter<'a, 'nm> {
    pm: &'a ProofManager<'nm>,
}

impl ProofPrinter for LfscPrinter<'_, '_> {
    fn assumption(&self, literal: Node, out: &mut dyn Write) -> Result<()> {
        // The clause binds the negation of each of its literals, which is the
        // conflict literal itself.
        let lit = self.pm.cnf.get_literal(literal)?;
        write!(out, "{}", ProofManager::lit_name(lit.negate()))?;
        Ok(())
    }

    fn term(&self, term: Node, out: &mut dyn Write) -> Result<()> {
        self.pm.theory.print_term(term, out)
    }
}

// Reconstruction
impl<'nm> ProofManager<'nm> {
    /// Replay the theory on `conflict`, a set of literals that is jointly
    /// unsatisfiable, and print the resulting proof of `false`.
    pub fn print_proof(&self, out: &mut dyn Write, conflict: &[Node]) -> Result<()> {
        let proof = self.replay(conflict)?;
        debug!("replayed proof of size {}", proof.size());
        proof.print(&LfscPrinter { pm: self }, out)
    }

    /// The equality proof of a conflict, found by a fresh theory instance.
    ///
    /// Every hypothesis of the returned proof is one of the `conflict`
    /// literals. A proof that needs anything else, such as a literal of a
    /// lemma the theory asked for, is rejected with
    /// [`Error::UnboundHypothesis`].
    pub fn replay(&self, conflict: &[Node]) -> Result<EqProof<'nm>> {
        if !self.logic.supports_replay() {
            return Err(Error::UnsupportedLogic(self.logic.name().to_string()));
        }
        let nm = self.nm;
        let mut theory = TheoryUf::new(nm, self.logic.has_arrays());
        let mut out = ProofOutputChannel::new();

        for &lit in conflict {
            theory.pre_register_term(lit);
            theory.assert_fact(lit);
        }
        theory.check(Effort::Full, &mut out);
        if let Some((_, proof)) = out.take_conflict() {
            return Self::bound(nm, proof, conflict);
        }

        // The theory may only report a lemma the conflict violates.
        if let Some((lemma, rule)) = out.take_lemma() {
            debug!("replay produced lemma ({:?}) {}", rule, lemma);
            let negated = nm.mk_not(&lemma);
            theory.pre_register_term(*negated);
            theory.assert_fact(*negated);
            theory.check(Effort::Full, &mut out);
            if let Some((_, proof)) = out.take_conflict() {
                return Self::bound(nm, proof, conflict);
            }
        }

        let literals: Vec<String> = conflict.iter().map(|&l| nm.to_sexpr(l)).collect();
        Err(Error::ReplayDiverged(literals.join(" ")))
    }

    fn bound(nm: &NodeManager, proof: EqProof<'nm>, conflict: &[Node]) -> Result<EqProof<'nm>> {
        match proof.assumptions().into_iter().find(|lit| !conflict.contains(lit)) {
            Some(lit) => Err(Error::UnboundHypothesis(nm.to_sexpr(lit))),
            None => Ok(proof),
        }
    }
}

// Emission
impl<'nm> ProofManager<'nm> {
    /// The proof document, built on first request and cached.
    ///
    /// No registrations are accepted once the document has been requested.
    pub fn get_proof(&mut self) -> Result<&str> {
        if self.proof.is_none() {
            self.state = ProofState::Finalizing;
            let document = match self.build() {
                Ok(document) => document,
                Err(e) => {
                    self.state = ProofState::Collecting;
                    return Err(e);
                }
            };
            info!("Proof document has {} bytes", document.len());
            self.proof = Some(document);
            self.state = ProofState::Emitted;
        }
        Ok(self.proof.as_deref().unwrap_or_default())
    }

    fn build(&mut self) -> Result<String> {
        for k in 0..self.assertions.len() {
            let a = self.assertions[k].node();
            self.theory.add_declaration(a)?;
        }
        let atoms = self
            .prop_vars
            .iter()
            .map(|&v| self.cnf.get_atom(v))
            .collect::<Result<Vec<_>>>()?;
        for atom in atoms {
            self.theory.add_declaration(atom)?;
        }

        let mut out = String::new();
        match self.format {
            ProofFormat::Lfsc => self.print_lfsc(&mut out)?,
            ProofFormat::Native => self.print_native(&mut out)?,
        }
        Ok(out)
    }

    fn print_lfsc(&self, out: &mut String) -> Result<()> {
        let mut paren = String::new();
        out.push_str("(check\n");
        self.theory.print_declarations(out, &mut paren)?;
        let assertions: Vec<Node> = self.assertions().collect();
        self.theory.print_assertions(&assertions, out, &mut paren)?;
        out.push_str("(: (holds cln)\n");
        self.cnf.print_atom_mapping(self, out, &mut paren)?;
        self.cnf.print_clauses(self, out, &mut paren)?;
        self.sat.print_resolutions(self, out, &mut paren)?;
        paren.push_str(")))\n;;");
        out.push_str(&paren);
        out.push('\n');
        Ok(())
    }

    fn print_native(&self, out: &mut String) -> Result<()> {
        let nm = self.nm;
        writeln!(out, "; proof ({})", self.logic)?;
        writeln!(out, "assertions:")?;
        for (k, a) in self.assertions().enumerate() {
            writeln!(out, "  A{}: {}", k, nm.to_sexpr(a))?;
        }
        writeln!(out, "atoms:")?;
        for var in self.prop_vars() {
            writeln!(out, "  {}: {}", Self::atom_name(var), nm.to_sexpr(self.cnf.get_atom(var)?))?;
        }
        writeln!(out, "clauses:")?;
        for kind in [ClauseKind::TheoryLemma, ClauseKind::Input, ClauseKind::TheoryPropagation] {
            for (id, clause) in self.clauses_of(kind) {
                let name = self.clause_name(id).unwrap_or_default();
                write!(out, "  {} {} {}", name, kind, clause)?;
                if kind != ClauseKind::Input {
                    let conflict = self.cnf.negated_clause(clause)?;
                    let literals: Vec<Node> = conflict.iter().map(Term::node).collect();
                    write!(out, " := ")?;
                    self.print_proof(out, &literals)?;
                }
                writeln!(out)?;
            }
        }
        writeln!(out, "resolutions:")?;
        self.sat.print_native(out)
    }
}

/// A solving session, optionally producing proofs.
///
/// The proof manager is reached through the session rather than a global.
pub struct Session<'nm> {
    nm: &'nm NodeManager,
    options: ProofOptions,
    proof_manager: Option<ProofManager<'nm>>,
}

impl<'nm> Session<'nm> {
    pub fn new(nm: &'nm NodeManager, options: ProofOptions) -> Self {
        Self {
            nm,
            options,
            proof_manager: None,
        }
    }

    pub fn with_proofs(nm: &'nm NodeManager, options: ProofOptions) -> Self {
        let pm = ProofManager::new(nm, options.clone());
        Self {
            nm,
            options,
            proof_manager: Some(pm),
        }
    }

    pub fn node_manager(&self) -> &'nm NodeManager {
        self.nm
    }

    pub fn options(&self) -> &ProofOptions {
        &self.options
    }

    pub fn produces_proofs(&self) -> bool {
        self.proof_manager.is_some()
    }

    pub fn proof_manager(&self) -> Result<&ProofManager<'nm>> {
        self.proof_manager.as_ref().ok_or(Error::NoManagerInScope)
    }

    pub fn proof_manager_mut(&mut self) -> Result<&mut ProofManager<'nm>> {
        self.proof_manager.as_mut().ok_or(Error::NoManagerInScope)
    }
}
