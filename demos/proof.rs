//! Proof of a congruence conflict over a chain of equalities.
//!
//! Asserts `a0 = a1`, ..., `a(n-1) = an`, `P(a0)` and `not P(an)` as unit
//! input clauses, justifies the theory lemma refuting them by replay, and
//! prints the resulting LFSC proof.
//!
//! Run with:
//! ```bash
//! cargo run --example proof -- 3
//! cargo run --example proof -- 3 --checker lfscc --signature sat.plf --signature smt.plf
//! ```

use std::path::PathBuf;

use clap::Parser;
use smt_proof::check::{check_proof, BalanceChecker, ExternalChecker, ProofChecker};
use smt_proof::config::ProofOptions;
use smt_proof::manager::NodeManager;
use smt_proof::proof_manager::{ClauseKind, ProofFormat, Session};
use smt_proof::sat::{SatClause, SatLiteral};
use smt_proof::sat_proof::ResolutionChain;

#[derive(Debug, Parser)]
#[command(author, version, about = "Build and check a congruence proof")]
struct Cli {
    /// Length of the equality chain
    #[arg(default_value = "3")]
    n: usize,

    /// Print the native format instead of LFSC
    #[arg(long)]
    native: bool,

    /// External proof checker to run on the proof
    #[arg(long)]
    checker: Option<PathBuf>,

    /// Signature files passed to the checker before the proof
    #[arg(long)]
    signature: Vec<PathBuf>,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let args = Cli::parse();
    println!("args = {:?}", args);

    let nm = NodeManager::default();
    let options = ProofOptions {
        format: if args.native { ProofFormat::Native } else { ProofFormat::Lfsc },
        ..ProofOptions::default()
    };
    let mut session = Session::with_proofs(&nm, options);
    let pm = session.proof_manager_mut()?;

    let u = nm.mk_sort("U");
    let p = nm.mk_var("P", &nm.mk_function_sort([&u], nm.bool_sort()));
    let a: Vec<_> = (0..=args.n).map(|k| nm.mk_var(&format!("a{}", k), &u)).collect();

    // Unit clauses: the chain, P(a0) and not P(an).
    let mut literals: Vec<SatLiteral> = Vec::new();
    for k in 0..args.n {
        let eq = nm.mk_eq(&a[k], &a[k + 1]);
        pm.add_assertion(&eq)?;
        literals.push(pm.register_atom(&eq)?.pos());
    }
    let first = nm.mk_apply(&p, [&a[0]]);
    pm.add_assertion(&first)?;
    literals.push(pm.register_atom(&first)?.pos());
    let last = nm.mk_apply(&p, [&a[args.n]]);
    pm.add_assertion(&nm.mk_not(&last))?;
    literals.push(pm.register_atom(&last)?.neg());

    let mut units = Vec::new();
    for &lit in &literals {
        let id = pm.next_id()?;
        pm.add_clause(id, SatClause::new(vec![lit]), ClauseKind::Input)?;
        units.push(id);
    }
    let lemma = pm.next_id()?;
    pm.add_clause(lemma, literals.iter().map(|&l| -l).collect(), ClauseKind::TheoryLemma)?;

    let mut chain = ResolutionChain::new(lemma);
    for (&id, &lit) in units.iter().zip(&literals) {
        chain = chain.resolve(id, lit.variable());
    }
    pm.set_refutation(chain)?;

    let time = std::time::Instant::now();
    let proof = pm.get_proof()?.to_string();
    println!("proof built in {:?}", time.elapsed());
    println!("{}", proof);

    if !args.native {
        let checker: Box<dyn ProofChecker> = match &args.checker {
            Some(program) => {
                let mut checker = ExternalChecker::new(program);
                for sig in &args.signature {
                    checker = checker.signature(sig);
                }
                Box::new(checker)
            }
            None => Box::new(BalanceChecker),
        };
        let outcome = check_proof(pm, checker.as_ref())?;
        println!("check: {:?}", outcome);
    }

    Ok(())
}
