//! SAT-level variables, literals and clauses.

use std::fmt::{self, Display, Formatter};
use std::ops::Neg;

/// A Boolean variable of the SAT engine.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SatVariable(u32);

impl SatVariable {
    /// Largest variable id; literals pack `2 * id + 1` into a `u32` and
    /// convert to DIMACS as an `i32`.
    pub const MAX_ID: u32 = i32::MAX as u32;

    /// Panics if `id` exceeds [`SatVariable::MAX_ID`].
    pub const fn new(id: u32) -> Self {
        assert!(id <= Self::MAX_ID, "SAT variable id out of range");
        Self(id)
    }

    pub const fn checked(id: u32) -> Option<Self> {
        if id <= Self::MAX_ID {
            Some(Self(id))
        } else {
            None
        }
    }

    pub const fn id(self) -> u32 {
        self.0
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn pos(self) -> SatLiteral {
        SatLiteral::new(self, false)
    }

    pub const fn neg(self) -> SatLiteral {
        SatLiteral::new(self, true)
    }
}

impl Display for SatVariable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A SAT variable with a polarity, packed as `2 * var + negated`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SatLiteral(u32);

impl SatLiteral {
    pub const fn new(var: SatVariable, negated: bool) -> Self {
        Self((var.0 << 1) | negated as u32)
    }

    /// Literal from a DIMACS-style signed integer: `-3` is variable 3 negated.
    ///
    /// Panics on `0` and on `i32::MIN`, which has no variable.
    pub fn from_dimacs(value: i32) -> Self {
        assert_ne!(value, 0, "0 is not a literal");
        assert_ne!(value, i32::MIN, "{} is not a literal", value);
        Self::new(SatVariable::new(value.unsigned_abs()), value < 0)
    }

    pub const fn variable(self) -> SatVariable {
        SatVariable(self.0 >> 1)
    }

    pub const fn is_negated(self) -> bool {
        self.0 & 1 == 1
    }

    pub const fn negate(self) -> Self {
        Self(self.0 ^ 1)
    }

    /// The packed representation, used for literal names.
    pub const fn to_int(self) -> u32 {
        self.0
    }

    pub fn to_dimacs(self) -> i32 {
        let v = self.variable().id() as i32;
        if self.is_negated() {
            -v
        } else {
            v
        }
    }
}

impl Neg for SatLiteral {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.negate()
    }
}

impl Display for SatLiteral {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            if self.is_negated() { "~" } else { "" },
            self.variable()
        )
    }
}

/// A disjunction of literals, in the order the SAT engine produced them.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Default)]
pub struct SatClause(Vec<SatLiteral>);

impl SatClause {
    pub fn new(literals: Vec<SatLiteral>) -> Self {
        Self(literals)
    }

    pub fn from_dimacs(literals: &[i32]) -> Self {
        literals.iter().map(|&v| SatLiteral::from_dimacs(v)).collect()
    }

    pub fn literals(&self) -> &[SatLiteral] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = SatLiteral> + '_ {
        self.0.iter().copied()
    }

    pub fn contains(&self, lit: SatLiteral) -> bool {
        self.0.contains(&lit)
    }

    pub fn variables(&self) -> impl Iterator<Item = SatVariable> + '_ {
        self.0.iter().map(|lit| lit.variable())
    }
}

impl FromIterator<SatLiteral> for SatClause {
    fn from_iter<I: IntoIterator<Item = SatLiteral>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<SatLiteral>> for SatClause {
    fn from(literals: Vec<SatLiteral>) -> Self {
        Self(literals)
    }
}

impl Display for SatClause {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, lit) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", lit)?;
        }
        write!(f, ")")
    }
}
