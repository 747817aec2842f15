//! The resolution trace of the SAT engine.
//!
//! Each learnt clause is derived by a linear chain of resolutions starting
//! from one clause. The final chain derives the empty clause. Resolvents are
//! recomputed while printing, which both checks the pivots and determines the
//! side each pivot occurs on: `R` when the accumulated clause holds the pivot
//! positively, `Q` when it holds it negated.

use std::collections::HashMap;
use std::fmt::Write;

use log::debug;

use crate::error::{Error, Result};
use crate::proof_manager::{ClauseKind, ProofManager};
use crate::sat::{SatClause, SatLiteral, SatVariable};
use crate::types::ClauseId;

/// `start`, resolved in turn with each step's clause on the step's pivot.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ResolutionChain {
    start: ClauseId,
    steps: Vec<(ClauseId, SatVariable)>,
}

impl ResolutionChain {
    pub fn new(start: ClauseId) -> Self {
        Self { start, steps: Vec::new() }
    }

    pub fn resolve(mut self, clause: ClauseId, pivot: SatVariable) -> Self {
        self.steps.push((clause, pivot));
        self
    }

    pub fn start(&self) -> ClauseId {
        self.start
    }

    pub fn steps(&self) -> &[(ClauseId, SatVariable)] {
        &self.steps
    }

    /// Clauses the chain refers to, in order.
    pub fn clauses(&self) -> impl Iterator<Item = ClauseId> + '_ {
        std::iter::once(self.start).chain(self.steps.iter().map(|&(c, _)| c))
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Side {
    /// The accumulated clause holds the pivot positively.
    R,
    Q,
}

/// Body of a clause: derived earlier in the trace, or registered.
///
/// A learnt clause is only bound once its own chain has been printed.
fn lookup<'a>(
    pm: &'a ProofManager<'_>,
    derived: &'a HashMap<ClauseId, SatClause>,
    id: ClauseId,
) -> Result<&'a SatClause> {
    if let Some(clause) = derived.get(&id) {
        return Ok(clause);
    }
    match pm.clause_kind(id) {
        Some(ClauseKind::Learnt) => Err(Error::UnderivedClause(id)),
        _ => pm.clause(id).ok_or(Error::UnknownClause(id)),
    }
}

#[derive(Debug, Default)]
pub struct SatProof {
    chains: Vec<(ClauseId, ResolutionChain)>,
    final_chain: Option<ResolutionChain>,
}

impl SatProof {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the derivation of the learnt clause `id`.
    pub fn add_chain(&mut self, id: ClauseId, chain: ResolutionChain) {
        debug!("resolution chain for {}: {:?}", id, chain);
        self.chains.push((id, chain));
    }

    pub fn set_final_chain(&mut self, chain: ResolutionChain) {
        self.final_chain = Some(chain);
    }

    pub fn num_chains(&self) -> usize {
        self.chains.len()
    }

    pub fn has_refutation(&self) -> bool {
        self.final_chain.is_some()
    }

    /// Replay `chain`, returning the resolvent and the side of every step.
    fn simulate(
        &self,
        chain: &ResolutionChain,
        pm: &ProofManager<'_>,
        derived: &HashMap<ClauseId, SatClause>,
    ) -> Result<(SatClause, Vec<Side>)> {
        let mut acc: Vec<SatLiteral> = lookup(pm, derived, chain.start)?.literals().to_vec();
        let mut sides = Vec::with_capacity(chain.steps.len());
        for &(id, pivot) in &chain.steps {
            let clause = lookup(pm, derived, id)?;
            let side = if acc.contains(&pivot.pos()) && clause.contains(pivot.neg()) {
                Side::R
            } else if acc.contains(&pivot.neg()) && clause.contains(pivot.pos()) {
                Side::Q
            } else {
                return Err(Error::BadPivot(pivot));
            };
            sides.push(side);
            acc.retain(|l| l.variable() != pivot);
            for lit in clause.iter() {
                if lit.variable() != pivot && !acc.contains(&lit) {
                    acc.push(lit);
                }
            }
        }
        Ok((SatClause::new(acc), sides))
    }

    fn print_chain(
        &self,
        chain: &ResolutionChain,
        pm: &ProofManager<'_>,
        derived: &HashMap<ClauseId, SatClause>,
        out: &mut dyn Write,
    ) -> Result<SatClause> {
        let (resolvent, sides) = self.simulate(chain, pm, derived)?;
        let name = |id: ClauseId| -> Result<String> {
            if derived.contains_key(&id) {
                Ok(ProofManager::learnt_clause_name(id))
            } else {
                pm.clause_name(id).ok_or(Error::UnknownClause(id))
            }
        };

        for side in sides.iter().rev() {
            write!(out, "({:?} _ _ ", side)?;
        }
        write!(out, "{}", name(chain.start)?)?;
        for &(id, pivot) in &chain.steps {
            write!(out, " {} {})", name(id)?, ProofManager::var_name(pivot))?;
        }
        Ok(resolvent)
    }

    /// `(satlem_simplify ...)` for each learnt clause, then the refutation.
    ///
    /// The refutation opens a scope that is closed by the document's final
    /// parenthesis run, so it pushes nothing onto `paren`.
    pub fn print_resolutions(&self, pm: &ProofManager<'_>, out: &mut dyn Write, paren: &mut String) -> Result<()> {
        let mut derived = HashMap::new();
        for (id, chain) in &self.chains {
            write!(out, "(satlem_simplify _ _ _ ")?;
            let clause = self.print_chain(chain, pm, &derived, out)?;
            writeln!(out, " (\\ {}", ProofManager::learnt_clause_name(*id))?;
            paren.push_str("))");
            derived.insert(*id, clause);
        }

        let chain = self.final_chain.as_ref().ok_or(Error::MissingRefutation)?;
        let mut text = String::new();
        let clause = self.print_chain(chain, pm, &derived, &mut text)?;
        if !clause.is_empty() {
            return Err(Error::MissingRefutation);
        }
        write!(out, "(satlem_simplify _ _ _ {} (\\ empty empty)", text)?;
        Ok(())
    }

    /// One line per chain, for the native format.
    pub fn print_native(&self, out: &mut dyn Write) -> Result<()> {
        let render = |chain: &ResolutionChain| {
            let mut s = chain.start.to_string();
            for (id, pivot) in &chain.steps {
                s.push_str(&format!(" [{}] {}", pivot, id));
            }
            s
        };
        for (id, chain) in &self.chains {
            writeln!(out, "  {} <- {}", id, render(chain))?;
        }
        match &self.final_chain {
            Some(chain) => writeln!(out, "  empty <- {}", render(chain))?,
            None => return Err(Error::MissingRefutation),
        }
        Ok(())
    }
}
