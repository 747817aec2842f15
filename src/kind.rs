//! Node kinds and leaf payloads.

use std::fmt;

use crate::types::VarId;
use crate::utils::hash_value;

/// The discriminant of a node: which operator, constant, variable or sort it is.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Kind {
    // Sorts
    BoolSort,
    IntSort,
    /// Uninterpreted sort, named by a [`Payload::Name`].
    SortType,
    /// `(Array index element)`
    ArraySort,
    /// `(-> arg1 ... argN range)`
    FunctionSort,

    // Leaves
    Variable,
    BoundVariable,
    ConstBool,
    ConstInt,

    // Boolean structure
    Not,
    And,
    Or,
    Xor,
    Implies,
    Iff,
    Equal,
    Distinct,
    Ite,
    /// Chained relational operator, e.g. `(= a b c)`; the operator is a [`Payload::Op`].
    Chain,

    // Uninterpreted functions: child 0 is the function symbol.
    ApplyUf,

    // Arrays
    Select,
    Store,

    // Arithmetic (only what the dagifier and printer need to know about)
    Uminus,
    Plus,
    Lt,

    // Quantifiers: children are a `BoundVarList` and the body.
    BoundVarList,
    Forall,
    Exists,
}

impl Kind {
    pub fn is_sort(self) -> bool {
        matches!(
            self,
            Kind::BoolSort | Kind::IntSort | Kind::SortType | Kind::ArraySort | Kind::FunctionSort
        )
    }

    pub fn is_variable(self) -> bool {
        matches!(self, Kind::Variable | Kind::BoundVariable)
    }

    pub fn is_constant(self) -> bool {
        matches!(self, Kind::ConstBool | Kind::ConstInt)
    }

    pub fn is_binder(self) -> bool {
        matches!(self, Kind::Forall | Kind::Exists)
    }

    /// Allowed number of children as an inclusive range `(min, max)`.
    pub fn arity(self) -> (usize, usize) {
        const N: usize = usize::MAX;
        match self {
            Kind::BoolSort | Kind::IntSort | Kind::SortType => (0, 0),
            Kind::ArraySort => (2, 2),
            Kind::FunctionSort => (2, N),
            Kind::Variable | Kind::BoundVariable | Kind::ConstBool | Kind::ConstInt => (0, 0),
            Kind::Not | Kind::Uminus => (1, 1),
            Kind::And | Kind::Or | Kind::Xor | Kind::Plus => (2, N),
            Kind::Implies | Kind::Iff | Kind::Equal | Kind::Lt => (2, 2),
            Kind::Distinct => (2, N),
            Kind::Ite => (3, 3),
            Kind::Chain => (2, N),
            Kind::ApplyUf => (2, N),
            Kind::Select => (2, 2),
            Kind::Store => (3, 3),
            Kind::BoundVarList => (1, N),
            Kind::Forall | Kind::Exists => (2, 2),
        }
    }

    /// SMT-LIB style operator name, used in debug output.
    pub fn name(self) -> &'static str {
        match self {
            Kind::BoolSort => "Bool",
            Kind::IntSort => "Int",
            Kind::SortType => "sort",
            Kind::ArraySort => "Array",
            Kind::FunctionSort => "->",
            Kind::Variable => "var",
            Kind::BoundVariable => "bound_var",
            Kind::ConstBool => "const_bool",
            Kind::ConstInt => "const_int",
            Kind::Not => "not",
            Kind::And => "and",
            Kind::Or => "or",
            Kind::Xor => "xor",
            Kind::Implies => "=>",
            Kind::Iff => "iff",
            Kind::Equal => "=",
            Kind::Distinct => "distinct",
            Kind::Ite => "ite",
            Kind::Chain => "chain",
            Kind::ApplyUf => "apply",
            Kind::Select => "select",
            Kind::Store => "store",
            Kind::Uminus => "-",
            Kind::Plus => "+",
            Kind::Lt => "<",
            Kind::BoundVarList => "bound_vars",
            Kind::Forall => "forall",
            Kind::Exists => "exists",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Extra data carried by leaves (and chains). Part of the hash-consing key.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Default)]
pub enum Payload {
    #[default]
    None,
    Bool(bool),
    Integer(i64),
    Var(VarId),
    Name(String),
    Op(Kind),
}

impl Payload {
    pub(crate) fn signature(&self) -> u64 {
        match self {
            Payload::None => 0,
            other => hash_value(other),
        }
    }
}
