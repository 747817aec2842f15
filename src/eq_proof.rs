//! Equality proofs produced by the replay theory.
//!
//! An [`EqProof`] is a tree of equality-reasoning steps. It owns a [`Term`]
//! for every node it mentions, so it stays printable after the theory that
//! produced it is gone. It knows nothing about names: printing goes through a [`ProofPrinter`], which maps
//! assumed literals to the names under which the enclosing clause proof binds
//! them and renders terms in the target syntax.

use std::fmt::Write;

use crate::error::Result;
use crate::kind::Kind;
use crate::reference::{Node, Term};

/// Rendering of the leaves of an [`EqProof`].
pub trait ProofPrinter {
    /// Name of the hypothesis proving the literal.
    fn assumption(&self, literal: Node, out: &mut dyn Write) -> Result<()>;

    fn term(&self, term: Node, out: &mut dyn Write) -> Result<()>;
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum EqProof<'nm> {
    /// An asserted equality `(= a b)`.
    Assume(Term<'nm>),
    /// `p` is equal to `true`, from the asserted literal `p`.
    PredTrue(Term<'nm>),
    /// `p` is equal to `false`, from the asserted literal `(not p)`.
    PredFalse(Term<'nm>),
    /// `(= t t)`.
    Refl(Term<'nm>),
    /// `(= op op)` for the array operator `op` (`Select` or `Store`).
    ReflOp(Kind),
    Symm(Box<EqProof<'nm>>),
    Trans(Box<EqProof<'nm>>, Box<EqProof<'nm>>),
    /// Curried congruence: from `(= f g)` and `(= a b)`, `(= (f a) (g b))`.
    Cong(Box<EqProof<'nm>>, Box<EqProof<'nm>>),
    /// `(= (select (store a i v) i) v)`.
    Row1 {
        array: Term<'nm>,
        index: Term<'nm>,
        value: Term<'nm>,
    },
    /// `(= (select (store a i v) j) (select a j))` given `(not (= i j))`.
    /// `flipped` when the asserted disequality is `(not (= j i))`.
    Row {
        i: Term<'nm>,
        j: Term<'nm>,
        array: Term<'nm>,
        value: Term<'nm>,
        diseq: Term<'nm>,
        flipped: bool,
    },
    /// Contradiction between a proven equality and an asserted disequality,
    /// or `(= true false)` when `diseq` is `None`.
    Contra {
        eq: Box<EqProof<'nm>>,
        diseq: Option<Term<'nm>>,
    },
}

impl<'nm> EqProof<'nm> {
    pub fn symm(self) -> Self {
        match self {
            // Symmetry of a symmetry cancels out.
            EqProof::Symm(p) => *p,
            p @ EqProof::Refl(_) => p,
            p => EqProof::Symm(Box::new(p)),
        }
    }

    /// Chain proofs of `a = b`, `b = c`, ... into a proof of `a = z`.
    pub fn trans_chain(proofs: Vec<EqProof<'nm>>) -> Option<Self> {
        let mut proofs = proofs.into_iter().filter(|p| !matches!(p, EqProof::Refl(_)));
        let first = proofs.next()?;
        Some(proofs.fold(first, |acc, p| EqProof::Trans(Box::new(acc), Box::new(p))))
    }

    pub fn cong(function: EqProof<'nm>, argument: EqProof<'nm>) -> Self {
        EqProof::Cong(Box::new(function), Box::new(argument))
    }

    pub fn contra(eq: EqProof<'nm>, diseq: Option<Term<'nm>>) -> Self {
        EqProof::Contra {
            eq: Box::new(eq),
            diseq,
        }
    }

    /// The asserted literals this proof depends on, in first-use order.
    pub fn assumptions(&self) -> Vec<Node> {
        let mut acc = Vec::new();
        self.collect_assumptions(&mut acc);
        acc
    }

    fn collect_assumptions(&self, acc: &mut Vec<Node>) {
        let mut add = |n: Node| {
            if !acc.contains(&n) {
                acc.push(n);
            }
        };
        match self {
            EqProof::Assume(lit) | EqProof::PredTrue(lit) | EqProof::PredFalse(lit) => add(lit.node()),
            EqProof::Row { diseq, .. } => add(diseq.node()),
            EqProof::Refl(_) | EqProof::ReflOp(_) | EqProof::Row1 { .. } => {}
            EqProof::Symm(p) => p.collect_assumptions(acc),
            EqProof::Trans(p, q) | EqProof::Cong(p, q) => {
                p.collect_assumptions(acc);
                q.collect_assumptions(acc);
            }
            EqProof::Contra { eq, diseq } => {
                eq.collect_assumptions(acc);
                if let Some(d) = diseq {
                    if !acc.contains(&d.node()) {
                        acc.push(d.node());
                    }
                }
            }
        }
    }

    /// Number of inference steps.
    pub fn size(&self) -> usize {
        match self {
            EqProof::Symm(p) => 1 + p.size(),
            EqProof::Trans(p, q) | EqProof::Cong(p, q) => 1 + p.size() + q.size(),
            EqProof::Contra { eq, .. } => 1 + eq.size(),
            _ => 1,
        }
    }

    /// Render in LFSC syntax, leaving inferable arguments as holes.
    pub fn print(&self, printer: &dyn ProofPrinter, out: &mut dyn Write) -> Result<()> {
        match self {
            EqProof::Assume(lit) => printer.assumption(lit.node(), out)?,
            EqProof::PredTrue(lit) => {
                write!(out, "(pred_eq_t _ ")?;
                printer.assumption(lit.node(), out)?;
                write!(out, ")")?;
            }
            EqProof::PredFalse(lit) => {
                write!(out, "(pred_eq_f _ ")?;
                printer.assumption(lit.node(), out)?;
                write!(out, ")")?;
            }
            EqProof::Refl(t) => {
                write!(out, "(refl _ ")?;
                printer.term(t.node(), out)?;
                write!(out, ")")?;
            }
            EqProof::ReflOp(kind) => {
                let op = if *kind == Kind::Select { "read" } else { "write" };
                write!(out, "(refl _ ({} _ _))", op)?;
            }
            EqProof::Symm(p) => {
                write!(out, "(symm _ _ _ ")?;
                p.print(printer, out)?;
                write!(out, ")")?;
            }
            EqProof::Trans(p, q) => {
                write!(out, "(trans _ _ _ _ ")?;
                p.print(printer, out)?;
                write!(out, " ")?;
                q.print(printer, out)?;
                write!(out, ")")?;
            }
            EqProof::Cong(p, q) => {
                write!(out, "(cong _ _ _ _ _ _ ")?;
                p.print(printer, out)?;
                write!(out, " ")?;
                q.print(printer, out)?;
                write!(out, ")")?;
            }
            EqProof::Row1 { array, index, value } => {
                write!(out, "(row1 _ _ ")?;
                for (k, t) in [array, index, value].into_iter().enumerate() {
                    if k > 0 {
                        write!(out, " ")?;
                    }
                    printer.term(t.node(), out)?;
                }
                write!(out, ")")?;
            }
            EqProof::Row {
                i,
                j,
                array,
                value,
                diseq,
                flipped,
            } => {
                write!(out, "(row _ _ ")?;
                for t in [i, j, array, value] {
                    printer.term(t.node(), out)?;
                    write!(out, " ")?;
                }
                if *flipped {
                    write!(out, "(negsymm _ _ _ ")?;
                    printer.assumption(diseq.node(), out)?;
                    write!(out, ")")?;
                } else {
                    printer.assumption(diseq.node(), out)?;
                }
                write!(out, ")")?;
            }
            EqProof::Contra { eq, diseq } => {
                write!(out, "(contra _ ")?;
                eq.print(printer, out)?;
                write!(out, " ")?;
                match diseq {
                    Some(d) => printer.assumption(d.node(), out)?,
                    None => write!(out, "t_t_neq_f")?,
                }
                write!(out, ")")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::manager::NodeManager;

    /// Prints hypotheses as `h<id>` and terms as s-expressions.
    struct Plain<'a>(&'a NodeManager);

    impl ProofPrinter for Plain<'_> {
        fn assumption(&self, literal: Node, out: &mut dyn Write) -> Result<()> {
            write!(out, "h{}", literal.id())?;
            Ok(())
        }

        fn term(&self, term: Node, out: &mut dyn Write) -> Result<()> {
            write!(out, "{}", self.0.to_sexpr(term))?;
            Ok(())
        }
    }

    fn render(nm: &NodeManager, p: &EqProof<'_>) -> String {
        let mut s = String::new();
        p.print(&Plain(nm), &mut s).unwrap();
        s
    }

    #[test]
    fn test_print_trans_symm() {
        let nm = NodeManager::default();
        let u = nm.mk_sort("U");
        let (a, b, c) = (nm.mk_var("a", &u), nm.mk_var("b", &u), nm.mk_var("c", &u));
        let ab = nm.mk_eq(&a, &b);
        let cb = nm.mk_eq(&c, &b);
        let p = EqProof::trans_chain(vec![EqProof::Assume(ab.clone()), EqProof::Assume(cb.clone()).symm()]).unwrap();
        assert_eq!(
            render(&nm, &p),
            format!("(trans _ _ _ _ h{} (symm _ _ _ h{}))", ab.id(), cb.id())
        );
    }

    #[test]
    fn test_symm_cancels() {
        let nm = NodeManager::default();
        let p = EqProof::Assume(nm.mk_var("p", nm.bool_sort()));
        assert_eq!(p.clone().symm().symm(), p);
    }

    #[test]
    fn test_trans_chain_drops_refl() {
        let nm = NodeManager::default();
        let x = nm.mk_var("x", nm.bool_sort());
        let y = nm.mk_var("y", nm.bool_sort());
        assert_eq!(EqProof::trans_chain(vec![EqProof::Refl(x.clone())]), None);
        let p = EqProof::trans_chain(vec![EqProof::Refl(x), EqProof::Assume(y.clone())]);
        assert_eq!(p, Some(EqProof::Assume(y)));
    }

    #[test]
    fn test_contra_and_assumptions() {
        let nm = NodeManager::default();
        let u = nm.mk_sort("U");
        let f = nm.mk_var("f", &nm.mk_function_sort([&u], nm.bool_sort()));
        let (a, b) = (nm.mk_var("a", &u), nm.mk_var("b", &u));
        let ab = nm.mk_eq(&a, &b);
        let fa = nm.mk_apply(&f, [&a]);
        let nfb = nm.mk_not(&nm.mk_apply(&f, [&b]));

        let eq = EqProof::cong(EqProof::Refl(f.clone()), EqProof::Assume(ab.clone()));
        let p = EqProof::contra(
            EqProof::trans_chain(vec![EqProof::PredTrue(fa.clone()).symm(), eq, EqProof::PredFalse(nfb.clone())])
                .unwrap(),
            None,
        );
        assert_eq!(p.assumptions(), vec![*fa, *ab, *nfb]);
        assert_eq!(
            render(&nm, &p),
            format!(
                "(contra _ (trans _ _ _ _ (trans _ _ _ _ (symm _ _ _ (pred_eq_t _ h{})) \
                 (cong _ _ _ _ _ _ (refl _ f) h{})) (pred_eq_f _ h{})) t_t_neq_f)",
                fa.id(),
                ab.id(),
                nfb.id()
            )
        );
        assert_eq!(p.size(), 9);
    }

    #[test]
    fn test_proof_keeps_terms_alive() {
        let nm = NodeManager::default();
        let u = nm.mk_sort("U");
        let (a, b) = (nm.mk_var("a", &u), nm.mk_var("b", &u));
        let p = EqProof::Assume(nm.mk_eq(&a, &b));
        let lit = p.assumptions()[0];
        assert_eq!(nm.ref_count(lit), 1);
        assert_eq!(render(&nm, &p), format!("h{}", lit.id()));
        drop(p);
        assert!(!nm.is_alive(lit));
    }

    #[test]
    fn test_flipped_row() {
        let nm = NodeManager::default();
        let u = nm.mk_sort("U");
        let arr = nm.mk_var("arr", &nm.mk_array_sort(&u, &u));
        let (i, j, v) = (nm.mk_var("i", &u), nm.mk_var("j", &u), nm.mk_var("v", &u));
        let ji = nm.mk_not(&nm.mk_eq(&j, &i));
        let p = EqProof::Row {
            i,
            j,
            array: arr,
            value: v,
            diseq: ji.clone(),
            flipped: true,
        };
        assert_eq!(render(&nm, &p), format!("(row _ _ i j arr v (negsymm _ _ _ h{}))", ji.id()));
    }
}
