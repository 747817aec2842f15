//! LFSC rendering of terms and sorts, and collection of the symbols a proof
//! has to declare before using them.
//!
//! LFSC only has fixed-arity operators, so n-ary connectives are flattened
//! into right-nested binary ones and chains become conjunctions of binary
//! comparisons. Function application is curried through `apply`.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::Write;

use log::debug;

use crate::error::{Error, Result};
use crate::kind::{Kind, Payload};
use crate::manager::NodeManager;
use crate::reference::{Node, Term};

/// Identifiers starting with `_` are reserved in LFSC.
pub fn sanitize(name: &str) -> String {
    if name.starts_with('_') {
        format!("lfsc{}", name)
    } else {
        name.to_string()
    }
}

fn connective(kind: Kind) -> Option<&'static str> {
    match kind {
        Kind::Not => Some("not"),
        Kind::And => Some("and"),
        Kind::Or => Some("or"),
        Kind::Xor => Some("xor"),
        Kind::Iff => Some("iff"),
        Kind::Implies => Some("impl"),
        _ => None,
    }
}

/// Collects declarations and prints terms.
pub struct TheoryProof<'nm> {
    nm: &'nm NodeManager,
    /// Uninterpreted sorts, in id order.
    sorts: BTreeSet<Term<'nm>>,
    /// Free variables and function symbols, in id order.
    terms: BTreeSet<Term<'nm>>,
    seen: HashSet<Node>,
    /// Printed name of every declared sort and symbol.
    symbols: HashMap<String, Node>,
    roots: Vec<Term<'nm>>,
}

impl<'nm> TheoryProof<'nm> {
    pub fn new(nm: &'nm NodeManager) -> Self {
        Self {
            nm,
            sorts: BTreeSet::new(),
            terms: BTreeSet::new(),
            seen: HashSet::new(),
            symbols: HashMap::new(),
            roots: Vec::new(),
        }
    }

    pub fn num_sorts(&self) -> usize {
        self.sorts.len()
    }

    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }

    pub fn is_declared(&self, node: impl Into<Node>) -> bool {
        let node = node.into();
        self.sorts.iter().chain(&self.terms).any(|t| t.node() == node)
    }

    /// Record every sort and free symbol occurring in `term`.
    ///
    /// Subterms already walked by an earlier call are skipped.
    pub fn add_declaration(&mut self, term: impl Into<Node>) -> Result<()> {
        let term = term.into();
        if self.seen.contains(&term) {
            return Ok(());
        }
        self.roots.push(self.nm.term(term));
        self.collect(term)
    }

    fn collect(&mut self, node: Node) -> Result<()> {
        if !self.seen.insert(node) {
            return Ok(());
        }
        let kind = self.nm.kind(node);
        if kind.is_sort() {
            return self.add_sort(node);
        }
        if kind.is_variable() {
            let sort = self.nm.type_of(node)?;
            self.add_sort(sort)?;
            if kind == Kind::Variable {
                self.claim_name(node)?;
                debug!("declare {}", self.nm.to_sexpr(node));
                self.terms.insert(self.nm.term(node));
            }
            return Ok(());
        }
        for c in self.nm.children(node) {
            self.collect(c)?;
        }
        Ok(())
    }

    fn add_sort(&mut self, sort: Node) -> Result<()> {
        match self.nm.kind(sort) {
            Kind::SortType => {
                self.claim_name(sort)?;
                self.sorts.insert(self.nm.term(sort));
            }
            Kind::ArraySort | Kind::FunctionSort => {
                for c in self.nm.children(sort) {
                    self.add_sort(c)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Sorts and symbols share one LFSC scope, so two of them must not print
    /// the same name.
    fn claim_name(&mut self, node: Node) -> Result<()> {
        let name = self.name_of(node);
        match self.symbols.get(&name) {
            Some(&owner) if owner != node => Err(Error::DuplicateSymbol(name)),
            Some(_) => Ok(()),
            None => {
                self.symbols.insert(name, node);
                Ok(())
            }
        }
    }

    fn name_of(&self, node: Node) -> String {
        sanitize(&self.nm.name(node).unwrap_or_else(|| format!("n{}", node.id())))
    }

    pub fn print_sort(&self, sort: Node, out: &mut dyn Write) -> Result<()> {
        match self.nm.kind(sort) {
            Kind::BoolSort => write!(out, "Bool")?,
            Kind::IntSort => write!(out, "Int")?,
            Kind::SortType => write!(out, "{}", self.name_of(sort))?,
            Kind::ArraySort => {
                write!(out, "(array ")?;
                self.print_sort(self.nm.child(sort, 0), out)?;
                write!(out, " ")?;
                self.print_sort(self.nm.child(sort, 1), out)?;
                write!(out, ")")?;
            }
            Kind::FunctionSort => {
                let children = self.nm.children(sort);
                let (range, args) = children.split_last().ok_or(Error::UnsupportedKind(Kind::FunctionSort))?;
                for &a in args {
                    write!(out, "(arrow ")?;
                    self.print_sort(a, out)?;
                    write!(out, " ")?;
                }
                self.print_sort(*range, out)?;
                for _ in args {
                    write!(out, ")")?;
                }
            }
            other => return Err(Error::UnsupportedKind(other)),
        }
        Ok(())
    }

    pub fn print_term(&self, term: Node, out: &mut dyn Write) -> Result<()> {
        let nm = self.nm;
        let kind = nm.kind(term);
        match kind {
            Kind::Variable | Kind::BoundVariable => {
                if nm.is_boolean(term) {
                    write!(out, "(p_app {})", self.name_of(term))?;
                } else {
                    write!(out, "{}", self.name_of(term))?;
                }
            }
            Kind::ConstBool => {
                write!(out, "{}", if nm.is_true(term) { "true" } else { "false" })?;
            }
            Kind::ApplyUf => {
                let children = nm.children(term);
                let boolean = nm.is_boolean(term);
                if boolean {
                    write!(out, "(p_app ")?;
                }
                for _ in 1..children.len() {
                    write!(out, "(apply _ _ ")?;
                }
                self.print_term(children[0], out)?;
                for &arg in &children[1..] {
                    write!(out, " ")?;
                    self.print_term(arg, out)?;
                    write!(out, ")")?;
                }
                if boolean {
                    write!(out, ")")?;
                }
            }
            Kind::Ite => {
                if nm.is_boolean(term) {
                    write!(out, "(ifte ")?;
                } else {
                    write!(out, "(ite _ ")?;
                }
                for (k, c) in nm.children(term).into_iter().enumerate() {
                    if k > 0 {
                        write!(out, " ")?;
                    }
                    self.print_term(c, out)?;
                }
                write!(out, ")")?;
            }
            Kind::Equal => self.print_eq(nm.child(term, 0), nm.child(term, 1), out)?,
            Kind::Distinct => {
                if nm.num_children(term) != 2 {
                    return Err(Error::UnsupportedKind(Kind::Distinct));
                }
                write!(out, "(not ")?;
                self.print_eq(nm.child(term, 0), nm.child(term, 1), out)?;
                write!(out, ")")?;
            }
            Kind::Not | Kind::And | Kind::Or | Kind::Xor | Kind::Iff | Kind::Implies => {
                let op = connective(kind).ok_or(Error::UnsupportedKind(kind))?;
                let children = nm.children(term);
                let (last, init) = match children.split_last() {
                    Some(split) => split,
                    None => return Err(Error::UnsupportedKind(kind)),
                };
                if init.is_empty() {
                    write!(out, "({} ", op)?;
                    self.print_term(*last, out)?;
                    write!(out, ")")?;
                } else {
                    for &c in init {
                        write!(out, "({} ", op)?;
                        self.print_term(c, out)?;
                        write!(out, " ")?;
                    }
                    self.print_term(*last, out)?;
                    for _ in init {
                        write!(out, ")")?;
                    }
                }
            }
            Kind::Chain => {
                let op = match nm.payload(term) {
                    Payload::Op(op) => op,
                    _ => return Err(Error::UnsupportedKind(Kind::Chain)),
                };
                if op != Kind::Equal {
                    return Err(Error::UnsupportedKind(op));
                }
                let children = nm.children(term);
                let pairs: Vec<&[Node]> = children.windows(2).collect();
                let (last, init) = match pairs.split_last() {
                    Some(split) => split,
                    None => return Err(Error::UnsupportedKind(Kind::Chain)),
                };
                for pair in init {
                    write!(out, "(and ")?;
                    self.print_eq(pair[0], pair[1], out)?;
                    write!(out, " ")?;
                }
                self.print_eq(last[0], last[1], out)?;
                for _ in init {
                    write!(out, ")")?;
                }
            }
            Kind::Select | Kind::Store => {
                let children = nm.children(term);
                let sort = nm.type_of(children[0])?;
                if nm.kind(sort) != Kind::ArraySort {
                    return Err(Error::ill_typed(nm.to_sexpr(term), "array operator on a non-array"));
                }
                for _ in &children {
                    write!(out, "(apply _ _ ")?;
                }
                write!(out, "({} ", if kind == Kind::Select { "read" } else { "write" })?;
                self.print_sort(nm.child(sort, 0), out)?;
                write!(out, " ")?;
                self.print_sort(nm.child(sort, 1), out)?;
                write!(out, ")")?;
                for &c in &children {
                    write!(out, " ")?;
                    self.print_term(c, out)?;
                    write!(out, ")")?;
                }
            }
            other => return Err(Error::UnsupportedKind(other)),
        }
        Ok(())
    }

    fn print_eq(&self, a: Node, b: Node, out: &mut dyn Write) -> Result<()> {
        write!(out, "(= ")?;
        self.print_sort(self.nm.type_of(a)?, out)?;
        write!(out, " ")?;
        self.print_term(a, out)?;
        write!(out, " ")?;
        self.print_term(b, out)?;
        write!(out, ")")?;
        Ok(())
    }

    /// Sorts first, then terms, each in id order. Every declaration opens a
    /// scope closed through `paren`.
    pub fn print_declarations(&self, out: &mut dyn Write, paren: &mut String) -> Result<()> {
        for sort in &self.sorts {
            writeln!(out, "(% {} sort", self.name_of(sort.node()))?;
            paren.push(')');
        }
        for term in &self.terms {
            write!(out, "(% {} (term ", self.name_of(term.node()))?;
            self.print_sort(self.nm.type_of(term)?, out)?;
            writeln!(out, ")")?;
            paren.push(')');
        }
        Ok(())
    }

    /// `(% A<n> (th_holds ...)` for each input assertion.
    pub fn print_assertions(&self, assertions: &[Node], out: &mut dyn Write, paren: &mut String) -> Result<()> {
        for (n, &a) in assertions.iter().enumerate() {
            write!(out, "(% A{} (th_holds ", n)?;
            self.print_term(a, out)?;
            writeln!(out, ")")?;
            paren.push(')');
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn render(tp: &TheoryProof, term: Node) -> Result<String> {
        let mut s = String::new();
        tp.print_term(term, &mut s)?;
        Ok(s)
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("_let_0"), "lfsc_let_0");
        assert_eq!(sanitize("x"), "x");
    }

    #[test]
    fn test_print_connectives() {
        let nm = NodeManager::default();
        let p = nm.mk_var("p", nm.bool_sort());
        let q = nm.mk_var("q", nm.bool_sort());
        let r = nm.mk_var("r", nm.bool_sort());
        let tp = TheoryProof::new(&nm);

        let f = nm.mk_and([&p, &q, &r]);
        assert_eq!(
            render(&tp, *f).unwrap(),
            "(and (p_app p) (and (p_app q) (p_app r)))"
        );
        let g = nm.mk_not(&nm.mk_bool(true));
        assert_eq!(render(&tp, *g).unwrap(), "(not true)");
        let h = nm.mk_node(Kind::Implies, [&p, &q], Payload::None);
        assert_eq!(render(&tp, *h).unwrap(), "(impl (p_app p) (p_app q))");
    }

    #[test]
    fn test_print_uf() {
        let nm = NodeManager::default();
        let u = nm.mk_sort("U");
        let a = nm.mk_var("a", &u);
        let b = nm.mk_var("b", &u);
        let f = nm.mk_var("f", &nm.mk_function_sort([&u, &u], &u));
        let p = nm.mk_var("P", &nm.mk_function_sort([&u], nm.bool_sort()));
        let tp = TheoryProof::new(&nm);

        let fab = nm.mk_apply(&f, [&a, &b]);
        assert_eq!(render(&tp, *fab).unwrap(), "(apply _ _ (apply _ _ f a) b)");
        let pa = nm.mk_apply(&p, [&a]);
        assert_eq!(render(&tp, *pa).unwrap(), "(p_app (apply _ _ P a))");
        let eq = nm.mk_eq(&fab, &a);
        assert_eq!(render(&tp, *eq).unwrap(), "(= U (apply _ _ (apply _ _ f a) b) a)");
        let ite = nm.mk_ite(&pa, &a, &b);
        assert_eq!(render(&tp, *ite).unwrap(), "(ite _ (p_app (apply _ _ P a)) a b)");

        let mut s = String::new();
        tp.print_sort(nm.type_of(&f).unwrap(), &mut s).unwrap();
        assert_eq!(s, "(arrow U (arrow U U))");
    }

    #[test]
    fn test_print_arrays() {
        let nm = NodeManager::default();
        let u = nm.mk_sort("U");
        let a = nm.mk_var("a", &nm.mk_array_sort(&u, &u));
        let i = nm.mk_var("i", &u);
        let v = nm.mk_var("v", &u);
        let tp = TheoryProof::new(&nm);

        let sel = nm.mk_select(&a, &i);
        assert_eq!(render(&tp, *sel).unwrap(), "(apply _ _ (apply _ _ (read U U) a) i)");
        let st = nm.mk_store(&a, &i, &v);
        assert_eq!(
            render(&tp, *st).unwrap(),
            "(apply _ _ (apply _ _ (apply _ _ (write U U) a) i) v)"
        );
    }

    #[test]
    fn test_print_chain_and_distinct() {
        let nm = NodeManager::default();
        let u = nm.mk_sort("U");
        let a = nm.mk_var("a", &u);
        let b = nm.mk_var("b", &u);
        let c = nm.mk_var("c", &u);
        let tp = TheoryProof::new(&nm);

        let chain = nm.mk_chain(Kind::Equal, [&a, &b, &c]);
        assert_eq!(render(&tp, *chain).unwrap(), "(and (= U a b) (= U b c))");
        let d = nm.mk_node(Kind::Distinct, [&a, &b], Payload::None);
        assert_eq!(render(&tp, *d).unwrap(), "(not (= U a b))");
    }

    #[test]
    fn test_unsupported_kinds() {
        let nm = NodeManager::default();
        let u = nm.mk_sort("U");
        let a = nm.mk_var("a", &u);
        let b = nm.mk_var("b", &u);
        let c = nm.mk_var("c", &u);
        let tp = TheoryProof::new(&nm);

        let d = nm.mk_node(Kind::Distinct, [&a, &b, &c], Payload::None);
        assert!(matches!(render(&tp, *d), Err(Error::UnsupportedKind(Kind::Distinct))));
        let sum = nm.mk_node(Kind::Plus, [&nm.mk_integer(1), &nm.mk_integer(2)], Payload::None);
        assert!(matches!(render(&tp, *sum), Err(Error::UnsupportedKind(_))));
        let lt = nm.mk_chain(Kind::Lt, [&nm.mk_integer(1), &nm.mk_integer(2), &nm.mk_integer(3)]);
        assert!(matches!(render(&tp, *lt), Err(Error::UnsupportedKind(Kind::Lt))));
    }

    #[test]
    fn test_declarations_sorted() {
        let nm = NodeManager::default();
        let u = nm.mk_sort("U");
        let v = nm.mk_sort("V");
        let a = nm.mk_var("a", &u);
        let f = nm.mk_var("f", &nm.mk_function_sort([&u], &v));
        let p = nm.mk_var("_p", nm.bool_sort());
        let fa = nm.mk_apply(&f, [&a]);
        let t = nm.mk_and([&nm.mk_eq(&fa, &fa), &p]);

        let mut tp = TheoryProof::new(&nm);
        tp.add_declaration(&t).unwrap();
        tp.add_declaration(&t).unwrap();
        assert_eq!(tp.num_sorts(), 2);
        assert_eq!(tp.num_terms(), 3);
        assert!(tp.is_declared(&f));

        let mut out = String::new();
        let mut paren = String::new();
        tp.print_declarations(&mut out, &mut paren).unwrap();
        assert_eq!(
            out,
            "(% U sort\n(% V sort\n(% a (term U)\n(% f (term (arrow U V))\n(% lfsc_p (term Bool)\n"
        );
        assert_eq!(paren, ")))))");
    }

    #[test]
    fn test_same_name_symbols_rejected() {
        let nm = NodeManager::default();
        let u = nm.mk_sort("U");
        let x1 = nm.mk_var("x", &u);
        let x2 = nm.mk_var("x", &u);
        let mut tp = TheoryProof::new(&nm);
        tp.add_declaration(&x1).unwrap();
        tp.add_declaration(&x1).unwrap();
        let err = tp.add_declaration(&nm.mk_eq(&x1, &x2)).unwrap_err();
        assert!(matches!(&err, Error::DuplicateSymbol(name) if name == "x"));
        assert!(err.is_unsupported());
        assert_eq!(tp.num_terms(), 1);

        // `_q` prints as `lfsc_q`.
        let mut tp = TheoryProof::new(&nm);
        tp.add_declaration(&nm.mk_var("lfsc_q", nm.bool_sort())).unwrap();
        assert!(matches!(
            tp.add_declaration(&nm.mk_var("_q", nm.bool_sort())),
            Err(Error::DuplicateSymbol(name)) if name == "lfsc_q"
        ));

        // A sort and a symbol share the scope.
        let mut tp = TheoryProof::new(&nm);
        tp.add_declaration(&nm.mk_var("U", nm.bool_sort())).unwrap();
        assert!(matches!(tp.add_declaration(&x1), Err(Error::DuplicateSymbol(_))));
    }

    #[test]
    fn test_assertions() {
        let nm = NodeManager::default();
        let p = nm.mk_var("p", nm.bool_sort());
        let tp = TheoryProof::new(&nm);
        let mut out = String::new();
        let mut paren = String::new();
        tp.print_assertions(&[*nm.mk_not(&p)], &mut out, &mut paren).unwrap();
        assert_eq!(out, "(% A0 (th_holds (not (p_app p)))\n");
        assert_eq!(paren, ")");
    }
}
