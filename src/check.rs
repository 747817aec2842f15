//! Independent checking of emitted proofs.
//!
//! A [`ProofChecker`] either accepts a proof document or reports why not, as
//! [`Error::ProofCheckFailed`]. [`check_proof`] is the top-level entry point:
//! inputs that proofs do not support yet are skipped with a warning instead
//! of failing the run.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

use log::{debug, warn};
use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::proof_manager::ProofManager;

pub trait ProofChecker {
    fn check(&self, proof: &str) -> Result<()>;
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum CheckOutcome {
    Checked,
    /// Proof checking was not attempted, for the given reason.
    Skipped(String),
}

/// Checks that a document is one well-formed `(check ...)` form with balanced
/// parentheses. Text after `;` on a line is a comment.
#[derive(Debug, Default, Copy, Clone)]
pub struct BalanceChecker;

impl ProofChecker for BalanceChecker {
    fn check(&self, proof: &str) -> Result<()> {
        if !proof.trim_start().starts_with("(check") {
            return Err(Error::check_failed("document does not start with `(check`"));
        }
        let mut depth = 0usize;
        let mut closed = false;
        for (n, line) in proof.lines().enumerate() {
            let code = line.split(';').next().unwrap_or("");
            for c in code.chars() {
                match c {
                    '(' if closed => {
                        return Err(Error::check_failed(format!("line {}: text after the end of the proof", n + 1)));
                    }
                    '(' => depth += 1,
                    ')' => {
                        if depth == 0 {
                            return Err(Error::check_failed(format!("line {}: unmatched `)`", n + 1)));
                        }
                        depth -= 1;
                        closed = depth == 0;
                    }
                    _ => {}
                }
            }
        }
        if depth > 0 {
            return Err(Error::check_failed(format!("{} unclosed `(`", depth)));
        }
        Ok(())
    }
}

/// Runs an external program on a temporary file holding the signatures
/// followed by the proof. The file is removed when the check returns. A non-zero exit status is a failed check, with the
/// program's output as the message.
#[derive(Debug, Clone)]
pub struct ExternalChecker {
    program: PathBuf,
    args: Vec<String>,
    signatures: Vec<PathBuf>,
}

impl ExternalChecker {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            signatures: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Prepend the contents of a signature file to every checked proof.
    pub fn signature(mut self, path: impl Into<PathBuf>) -> Self {
        self.signatures.push(path.into());
        self
    }
}

impl ProofChecker for ExternalChecker {
    fn check(&self, proof: &str) -> Result<()> {
        let mut file: NamedTempFile = tempfile::Builder::new()
            .prefix("smt-proof-")
            .suffix(".plf")
            .tempfile()?;
        for sig in &self.signatures {
            file.write_all(fs::read_to_string(sig)?.as_bytes())?;
            file.write_all(b"\n")?;
        }
        file.write_all(proof.as_bytes())?;
        file.flush()?;

        debug!("running {} on {}", self.program.display(), file.path().display());
        let output = Command::new(&self.program).args(&self.args).arg(file.path()).output()?;
        if output.status.success() {
            return Ok(());
        }
        let mut message = String::from_utf8_lossy(&output.stdout).into_owned();
        message.push_str(&String::from_utf8_lossy(&output.stderr));
        Err(Error::check_failed(message.trim_end()))
    }
}

/// Build the proof of `pm` and run `checker` on it.
///
/// Logics and term kinds outside what proofs support degrade to
/// [`CheckOutcome::Skipped`]; every other error propagates.
pub fn check_proof(pm: &mut ProofManager<'_>, checker: &dyn ProofChecker) -> Result<CheckOutcome> {
    if !pm.logic().supports_checking() {
        let reason = format!("proof checking is not supported for logic {}", pm.logic());
        warn!("{}", reason);
        return Ok(CheckOutcome::Skipped(reason));
    }
    let proof = match pm.get_proof() {
        Ok(proof) => proof,
        Err(e) if e.is_unsupported() => {
            warn!("Skipping proof check: {}", e);
            return Ok(CheckOutcome::Skipped(e.to_string()));
        }
        Err(e) => return Err(e),
    };
    checker.check(proof)?;
    Ok(CheckOutcome::Checked)
}
