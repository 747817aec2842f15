//! Options of a proof-producing session.

use crate::dagify::DEFAULT_LET_PREFIX;
use crate::proof_manager::ProofFormat;

/// Settings for proof production. Use `ProofOptions::default()` for standard settings.
///
/// # Examples
///
/// ```
/// use smt_proof::config::ProofOptions;
/// use smt_proof::proof_manager::ProofFormat;
///
/// let options = ProofOptions {
///     format: ProofFormat::Native,
///     progress_interval: 10,
///     ..ProofOptions::default()
/// };
/// assert_eq!(options.dag_threshold, 1);
/// ```
#[derive(Debug, Clone)]
pub struct ProofOptions {
    /// Output format of the proof document (default: LFSC)
    pub format: ProofFormat,
    /// Occurrence count above which a subterm is let-bound (default: 1)
    pub dag_threshold: usize,
    /// Prefix of let variables (default: "_let_")
    pub let_prefix: String,
    /// Whether let-bindings are printed with parallel semantics (default: false)
    pub parallel_let: bool,
    /// Number of clauses between progress messages (default: 100)
    pub progress_interval: usize,
    /// Initial size of the term sharing table, as a power of two (default: 12)
    pub storage_bits: usize,
}

impl Default for ProofOptions {
    fn default() -> Self {
        Self {
            format: ProofFormat::Lfsc,
            dag_threshold: 1,
            let_prefix: DEFAULT_LET_PREFIX.to_string(),
            parallel_let: false,
            progress_interval: 100,
            storage_bits: 12,
        }
    }
}
