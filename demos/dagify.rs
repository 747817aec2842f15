//! Let-binding of a term whose tree rendering is exponential in its DAG size.
//!
//! Run with:
//! ```bash
//! cargo run --example dagify -- 12 --threshold 1
//! ```

use clap::Parser;
use smt_proof::dagify::DagificationVisitor;
use smt_proof::manager::NodeManager;
use smt_proof::visitor::run;

#[derive(Debug, Parser)]
#[command(author, version, about = "Dagify a term with exponential tree size")]
struct Cli {
    /// Nesting depth
    #[arg(default_value = "10")]
    depth: usize,

    /// Occurrence count above which a subterm is let-bound
    #[arg(long, default_value = "1")]
    threshold: usize,

    /// Prefix of let variables
    #[arg(long, default_value = "_let_")]
    prefix: String,
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
    let u = nm.mk_sort("U");
    let f = nm.mk_var("f", &nm.mk_function_sort([&u, &u], &u));
    let x = nm.mk_var("x", &u);
    let y = nm.mk_var("y", &u);

    let mut t = nm.mk_apply(&f, [&x, &y]);
    for _ in 0..args.depth {
        t = nm.mk_apply(&f, [&t, &t]);
    }
    let root = nm.mk_eq(&t, &x);
    println!("dag size: {}", nm.dag_size(&root));
    println!("tree size: {}", nm.tree_size(&root));

    let time = std::time::Instant::now();
    let mut dag = DagificationVisitor::with_options(&nm, args.threshold, false, &args.prefix);
    run(&nm, &mut dag, root.node());
    println!("dagified in {:?}", time.elapsed());

    if let Some(lets) = dag.get_lets(None) {
        println!("{} let-bindings:", lets.len());
        for (term, var) in lets.iter() {
            println!("  {} := {}", nm.to_sexpr(var), nm.to_sexpr(term));
        }
        let body = dag.get_dagified_body(None);
        println!("body: {}", body);
        assert_eq!(lets.inline(&body), root);
    }
    println!("{:?}", nm);

    Ok(())
}
