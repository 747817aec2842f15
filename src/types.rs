//! Type-safe wrappers for variable and clause identifiers.
//!
//! Newtypes keep variable identities (part of a leaf's hash-consing key) and
//! clause ids (handles into the proof manager) from being mixed up with node
//! ids or SAT variables.

use std::fmt;

/// Identity of a declared variable.
///
/// Live variables never share a `VarId`, so two variables with the same name
/// and sort are still distinct nodes. The id of a collected variable may be
/// handed to a later one.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VarId(u32);

impl VarId {
    pub fn new(id: u32) -> Self {
        VarId(id)
    }

    pub fn id(self) -> u32 {
        self.0
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "var{}", self.0)
    }
}

/// Handle of a clause registered with the proof manager.
///
/// Unique within a proof session; assigned monotonically by
/// [`ProofManager::next_id`][crate::proof_manager::ProofManager::next_id].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ClauseId(u32);

impl ClauseId {
    pub fn new(id: u32) -> Self {
        ClauseId(id)
    }

    pub fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ClauseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ClauseId {
    fn from(id: u32) -> Self {
        ClauseId(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clause_id_order() {
        let c1 = ClauseId::new(1);
        let c2 = ClauseId::from(2);
        assert!(c1 < c2);
        assert_eq!(c2.id(), 2);
        assert_eq!(c1.to_string(), "1");
    }

    #[test]
    fn test_var_id() {
        let v = VarId::new(3);
        assert_eq!(v.index(), 3);
        assert_eq!(v.to_string(), "var3");
    }
}
