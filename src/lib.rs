//! # smt-proof: proof-producing term graphs for SMT solvers
//!
//! **`smt-proof`** provides the two halves of proof production in an SMT solver:
//! a reference-counted, hash-consed **term DAG** (terms and sorts share one graph),
//! and a **proof manager** that rebuilds a checkable LFSC proof from the clauses,
//! resolution steps and theory conflicts recorded during solving.
//!
//! ## Key Features
//!
//! - **Manager-Centric Architecture**: All terms are built through the [`NodeManager`][crate::manager::NodeManager].
//!   Structurally equal terms are the same node, so equality is an id comparison.
//! - **Cheap handles**: [`Node`][crate::reference::Node] is a plain id for traversal,
//!   [`Term`][crate::reference::Term] owns a reference and releases it on drop.
//! - **Let-binding**: [`dagify`] extracts shared subterms into (possibly cascading) let-bindings,
//!   scoped under the quantifiers whose variables they use.
//! - **Proof reconstruction**: theory clauses are justified by replaying a congruence-closure
//!   theory on the negated clause and printing its equality proof.
//!
//! ## Basic Usage
//!
//! ```rust
//! use smt_proof::dagify::dagify;
//! use smt_proof::manager::NodeManager;
//!
//! let nm = NodeManager::default();
//! let a = nm.mk_var("a", nm.bool_sort());
//! let b = nm.mk_var("b", nm.bool_sort());
//! let ab = nm.mk_or([&a, &b]);
//! let f = nm.mk_and([&ab, &ab, &ab, &ab]);
//!
//! let dag = dagify(&nm, &f, 3);
//! let lets = dag.get_lets(None).unwrap();
//! assert_eq!(lets.len(), 1);
//! assert_eq!(nm.to_sexpr(*dag.get_dagified_body(None)), "(and _let_0 _let_0 _let_0 _let_0)");
//! ```
//!
//! ## Core Components
//!
//! - **[`manager`]**: the [`NodeManager`][crate::manager::NodeManager], construction, typing and substitution.
//! - **[`dagify`]**: let-binding of shared subterms.
//! - **[`proof_manager`]**: clause registry, replay and emission of the proof document.
//! - **[`cnf_proof`]**, **[`sat_proof`]**: the atom mapping and the resolution trace.
//! - **[`theory_proof`]**: LFSC rendering of terms and their declarations.
//! - **[`check`]**: running checkers on emitted proofs.

pub mod attribute;
pub mod check;
pub mod cnf_proof;
pub mod config;
pub mod dagify;
pub mod eq_proof;
pub mod error;
pub mod kind;
pub mod logic;
pub mod manager;
pub mod node;
pub mod proof_manager;
pub mod reference;
pub mod sat;
pub mod sat_proof;
pub mod substitution;
pub mod table;
pub mod theory;
pub mod theory_proof;
pub mod types;
pub mod uf;
pub mod utils;
pub mod visitor;
