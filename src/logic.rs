//! SMT-LIB logic names, reduced to what proof production needs to know.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::error::Error;

/// The theories a logic enables, plus its name.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LogicInfo {
    name: String,
    quantifier_free: bool,
    uf: bool,
    arrays: bool,
    arithmetic: bool,
    bitvectors: bool,
}

impl LogicInfo {
    /// Parse a logic name such as `QF_UF` or `QF_AUFLIA`.
    ///
    /// `ALL` enables every theory this crate knows about.
    pub fn new(name: &str) -> Self {
        if name == "ALL" {
            return Self {
                name: name.to_string(),
                quantifier_free: false,
                uf: true,
                arrays: true,
                arithmetic: true,
                bitvectors: true,
            };
        }
        let (quantifier_free, mut rest) = match name.strip_prefix("QF_") {
            Some(rest) => (true, rest),
            None => (false, name),
        };
        let mut eat = |prefix: &str| match rest.strip_prefix(prefix) {
            Some(r) => {
                rest = r;
                true
            }
            None => false,
        };
        let arrays = eat("AX") || eat("A");
        let uf = eat("UF");
        let bitvectors = eat("BV");
        let arithmetic = ["LIA", "LRA", "NIA", "NRA", "IDL", "RDL", "LIRA"].into_iter().any(&mut eat);
        Self {
            name: name.to_string(),
            quantifier_free,
            uf,
            arrays,
            arithmetic,
            bitvectors,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_quantified(&self) -> bool {
        !self.quantifier_free
    }

    pub fn has_uf(&self) -> bool {
        self.uf
    }

    pub fn has_arrays(&self) -> bool {
        self.arrays
    }

    pub fn has_arithmetic(&self) -> bool {
        self.arithmetic
    }

    /// Only propositional reasoning (`QF_SAT`, or a logic enabling no theory).
    pub fn is_pure_bool(&self) -> bool {
        self.quantifier_free && !self.uf && !self.arrays && !self.arithmetic && !self.bitvectors
    }

    /// Whether atom terms are rendered in the atom mapping, as opposed to a
    /// `true` placeholder.
    pub fn prints_atoms(&self) -> bool {
        self.name == "QF_UF" || self.name == "QF_SAT"
    }

    /// Whether theory lemmas of this logic can be replayed into proofs.
    pub fn supports_replay(&self) -> bool {
        self.quantifier_free && !self.arithmetic && !self.bitvectors
    }

    /// Whether emitted proofs of this logic can be checked: pure Boolean,
    /// pure UF or pure arrays.
    pub fn supports_checking(&self) -> bool {
        self.is_pure_bool() || (self.supports_replay() && self.uf != self.arrays)
    }
}

impl Default for LogicInfo {
    fn default() -> Self {
        Self::new("QF_UF")
    }
}

impl Display for LogicInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl FromStr for LogicInfo {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(Error::UnsupportedLogic(s.to_string()));
        }
        Ok(Self::new(s))
    }
}
