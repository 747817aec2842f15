//! The bridge between SAT-level clauses and term-level atoms.
//!
//! Each SAT variable stands for exactly one (non-negated) Boolean atom;
//! polarity lives in the literal. Theory clauses are justified by turning
//! their literals back into terms and replaying the theory on the negation
//! of the clause, through [`ProofManager::print_proof`].

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;

use log::{debug, info};

use crate::error::{Error, Result};
use crate::kind::Kind;
use crate::manager::NodeManager;
use crate::proof_manager::{ClauseKind, ProofManager};
use crate::reference::{Node, Term};
use crate::sat::{SatClause, SatLiteral, SatVariable};

pub struct CnfProof<'nm> {
    nm: &'nm NodeManager,
    atoms: BTreeMap<SatVariable, Term<'nm>>,
    vars: HashMap<Node, SatVariable>,
    next_var: u64,
}

impl<'nm> CnfProof<'nm> {
    pub fn new(nm: &'nm NodeManager) -> Self {
        Self {
            nm,
            atoms: BTreeMap::new(),
            vars: HashMap::new(),
            next_var: 1,
        }
    }

    pub fn num_atoms(&self) -> usize {
        self.atoms.len()
    }

    /// SAT variable of `atom`, allocating a fresh one on first sight.
    pub fn register_atom(&mut self, atom: impl Into<Node>) -> Result<SatVariable> {
        let atom = atom.into();
        if let Some(&var) = self.vars.get(&atom) {
            return Ok(var);
        }
        let var = u32::try_from(self.next_var)
            .ok()
            .and_then(SatVariable::checked)
            .ok_or(Error::IdOverflow("SAT variable"))?;
        self.register_atom_as(atom, var);
        Ok(var)
    }

    /// Bind `atom` to a variable chosen by the SAT engine.
    pub fn register_atom_as(&mut self, atom: impl Into<Node>, var: SatVariable) {
        let atom = atom.into();
        assert_ne!(self.nm.kind(atom), Kind::Not, "Atoms are never negated");
        if let Some(existing) = self.atoms.get(&var) {
            assert_eq!(
                existing.node(),
                atom,
                "SAT variable {} is already bound to {}",
                var,
                existing
            );
            return;
        }
        debug!("atom {} := {}", var, self.nm.to_sexpr(atom));
        self.atoms.insert(var, self.nm.term(atom));
        self.vars.insert(atom, var);
        self.next_var = self.next_var.max(u64::from(var.id()) + 1);
    }

    pub fn get_atom(&self, var: SatVariable) -> Result<Node> {
        self.atoms
            .get(&var)
            .map(|t| t.node())
            .ok_or(Error::UnregisteredVariable(var))
    }

    /// SAT literal of a possibly negated atom.
    pub fn get_literal(&self, literal: impl Into<Node>) -> Result<SatLiteral> {
        let literal = literal.into();
        let (atom, negated) = if self.nm.kind(literal) == Kind::Not {
            (self.nm.child(literal, 0), true)
        } else {
            (literal, false)
        };
        match self.vars.get(&atom) {
            Some(&var) => Ok(SatLiteral::new(var, negated)),
            None => Err(Error::UnregisteredAtom(self.nm.to_sexpr(atom))),
        }
    }

    /// Term-level literals whose conjunction is the negation of `clause`.
    pub fn negated_clause(&self, clause: &SatClause) -> Result<Vec<Term<'nm>>> {
        clause
            .iter()
            .map(|lit| {
                let atom = self.get_atom(lit.variable())?;
                Ok(if lit.is_negated() {
                    self.nm.term(atom)
                } else {
                    self.nm.mk_not(atom)
                })
            })
            .collect()
    }

    /// Binds the negation of each literal of `clause`: `ast` assumes the atom
    /// of a negated literal, `asf` the negation of a positive one's atom.
    pub fn print_clause(&self, clause: &SatClause, out: &mut dyn Write, paren: &mut String) -> Result<()> {
        for lit in clause.iter() {
            let rule = if lit.is_negated() { "ast" } else { "asf" };
            write!(
                out,
                "({} _ _ _ {} (\\ {} ",
                rule,
                ProofManager::atom_name(lit.variable()),
                ProofManager::lit_name(lit)
            )?;
            paren.push_str("))");
        }
        Ok(())
    }

    /// `(decl_atom ...)` for every variable occurring in a registered clause.
    pub fn print_atom_mapping(&self, pm: &ProofManager<'nm>, out: &mut dyn Write, paren: &mut String) -> Result<()> {
        let print_atoms = pm.logic().prints_atoms();
        for var in pm.prop_vars() {
            write!(out, "(decl_atom ")?;
            if print_atoms {
                pm.theory_proof().print_term(self.get_atom(var)?, out)?;
            } else {
                write!(out, "true")?;
            }
            writeln!(
                out,
                " (\\ {} (\\ {}",
                ProofManager::var_name(var),
                ProofManager::atom_name(var)
            )?;
            paren.push_str(")))");
        }
        Ok(())
    }

    /// Justify theory lemmas, then input clauses, then theory propagations,
    /// each group in ascending id order.
    pub fn print_clauses(&self, pm: &ProofManager<'nm>, out: &mut dyn Write, paren: &mut String) -> Result<()> {
        let total = pm.num_lemmas() + pm.num_input_clauses() + pm.num_propagations();
        let interval = pm.options().progress_interval.max(1);
        let mut done = 0;

        for kind in [ClauseKind::TheoryLemma, ClauseKind::Input, ClauseKind::TheoryPropagation] {
            for (id, clause) in pm.clauses_of(kind) {
                write!(out, "(satlem _ _ ")?;
                let mut clause_paren = String::new();
                self.print_clause(clause, out, &mut clause_paren)?;
                write!(out, "(clausify_false ")?;
                match kind {
                    ClauseKind::Input => write!(out, "trust")?,
                    _ => {
                        let conflict = self.negated_clause(clause)?;
                        let literals: Vec<Node> = conflict.iter().map(Term::node).collect();
                        pm.print_proof(out, &literals)?;
                    }
                }
                write!(out, "){}", clause_paren)?;
                let name = match kind {
                    ClauseKind::Input => ProofManager::input_clause_name(id),
                    ClauseKind::TheoryLemma => ProofManager::lemma_clause_name(id),
                    _ => ProofManager::propagation_clause_name(id),
                };
                writeln!(out, " (\\ {}", name)?;
                paren.push_str("))");

                done += 1;
                if done % interval == 0 {
                    info!("Printed {} of {} clauses", done, total);
                }
            }
        }
        Ok(())
    }
}
