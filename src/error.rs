//! Error types for proof construction and checking.

use thiserror::Error;

use crate::kind::Kind;
use crate::proof_manager::ClauseKind;
use crate::sat::SatVariable;
use crate::types::ClauseId;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A proof-session operation was requested without a proof manager.
    #[error("no proof manager in scope")]
    NoManagerInScope,

    #[error("clause {id} already registered as {existing:?}, cannot re-register as {requested:?}")]
    ClauseKindConflict {
        id: ClauseId,
        existing: ClauseKind,
        requested: ClauseKind,
    },

    #[error("clause {0} is referenced by the resolution trace but was never registered")]
    UnknownClause(ClauseId),

    #[error("learnt clause {0} is used before its resolution chain")]
    UnderivedClause(ClauseId),

    #[error("SAT variable {0} has no registered atom")]
    UnregisteredVariable(SatVariable),

    #[error("atom `{0}` has no SAT literal")]
    UnregisteredAtom(String),

    #[error("pivot {0} does not occur with opposite polarities in the resolved clauses")]
    BadPivot(SatVariable),

    #[error("resolution trace does not derive the empty clause")]
    MissingRefutation,

    #[error("proof is already finalized; no more registrations accepted")]
    ProofFinalized,

    #[error("ill-typed term `{term}`: {reason}")]
    IllTyped { term: String, reason: String },

    #[error("cannot print terms of kind `{0}`")]
    UnsupportedKind(Kind),

    #[error("proof reconstruction is not supported for logic {0}")]
    UnsupportedLogic(String),

    #[error("theory replay of `{0}` produced neither a conflict nor a lemma")]
    ReplayDiverged(String),

    /// The replayed proof depends on a literal the justified clause does not
    /// bind, typically one introduced by a theory lemma.
    #[error("replayed proof assumes `{0}`, which the clause does not bind")]
    UnboundHypothesis(String),

    #[error("{0} space exhausted")]
    IdOverflow(&'static str),

    #[error("symbol `{0}` is declared twice with different identities")]
    DuplicateSymbol(String),

    #[error("There was a proof-checking failure:\n{message}")]
    ProofCheckFailed { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("formatting error")]
    Fmt(#[from] std::fmt::Error),
}

impl Error {
    pub fn ill_typed(term: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::IllTyped {
            term: term.into(),
            reason: reason.into(),
        }
    }

    pub fn check_failed(message: impl Into<String>) -> Self {
        Self::ProofCheckFailed {
            message: message.into(),
        }
    }

    /// Errors meaning "this input is outside what proofs support", after which
    /// proof checking may be skipped rather than aborted.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedKind(_)
                | Self::UnsupportedLogic(_)
                | Self::UnboundHypothesis(_)
                | Self::DuplicateSymbol(_)
        )
    }
}
