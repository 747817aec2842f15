use smt_proof::dagify::{dagify, DagificationVisitor};
use smt_proof::kind::Kind;
use smt_proof::manager::NodeManager;
use smt_proof::visitor::run;
use test_log::test;

#[test]
fn test_scenario_four_copies() {
    let nm = NodeManager::default();
    let a = nm.mk_var("a", nm.bool_sort());
    let b = nm.mk_var("b", nm.bool_sort());
    let ab = nm.mk_or([&a, &b]);
    let f = nm.mk_and([&ab, &ab, &ab, &ab]);

    let dag = dagify(&nm, &f, 3);
    let lets = dag.get_lets(None).unwrap();
    assert_eq!(lets.len(), 1);
    let (from, to) = lets.iter().next().unwrap();
    assert_eq!(from, *ab);
    assert_eq!(nm.name(to).as_deref(), Some("_let_0"));

    let body = dag.get_dagified_body(None);
    assert_eq!(nm.children(&body), vec![to; 4]);
    assert_eq!(lets.inline(&body), f);
}

#[test]
fn test_round_trip_cascading() {
    let nm = NodeManager::default();
    let u = nm.mk_sort("U");
    let x = nm.mk_var("x", &u);
    let y = nm.mk_var("y", &u);
    let f = nm.mk_var("f", &nm.mk_function_sort([&u, &u], &u));
    let fxy = nm.mk_apply(&f, [&x, &y]);
    let g = nm.mk_apply(&f, [&fxy, &fxy]);
    let h = nm.mk_apply(&f, [&g, &fxy]);
    let t = nm.mk_and([&nm.mk_eq(&h, &g), &nm.mk_eq(&g, &h), &nm.mk_eq(&h, &h)]);

    for threshold in 1..=4 {
        let dag = dagify(&nm, &t, threshold);
        let body = dag.get_dagified_body(None);
        let restored = match dag.get_lets(None) {
            Some(lets) => lets.inline(&body),
            None => body,
        };
        assert_eq!(restored, t, "threshold {}", threshold);
    }
}

#[test]
fn test_exclusion_list() {
    let nm = NodeManager::default();
    let p = nm.mk_var("p", nm.bool_sort());
    let i = nm.mk_var("i", nm.int_sort());
    let tt = nm.mk_bool(true);
    let np = nm.mk_not(&p);
    let mi = nm.mk_node(Kind::Uminus, [&i], Default::default());
    let lt = nm.mk_node(Kind::Lt, [&mi, &mi], Default::default());
    let t = nm.mk_and([&p, &p, &tt, &tt, &np, &np, &lt, &lt]);

    let dag = dagify(&nm, &t, 1);
    let lets = dag.get_lets(None).unwrap();
    for leaf in [&p, &tt, &np, &mi, &i] {
        assert!(!lets.has_substitution(leaf), "{} was let-bound", leaf);
    }
    assert!(lets.has_substitution(&lt));
    assert_eq!(lets.len(), 1);
}

#[test]
fn test_unique_parent_folding() {
    let nm = NodeManager::default();
    let a = nm.mk_var("a", nm.bool_sort());
    let b = nm.mk_var("b", nm.bool_sort());
    let c = nm.mk_var("c", nm.bool_sort());
    let inner = nm.mk_or([&a, &b]);
    let outer = nm.mk_and([&inner, &c]);
    let t = nm.mk_or([&outer, &outer, &outer]);

    let dag = dagify(&nm, &t, 2);
    let lets = dag.get_lets(None).unwrap();
    // `inner` only occurs below `outer`, which is let-bound itself.
    assert!(lets.has_substitution(&outer));
    assert!(!lets.has_substitution(&inner));
    assert_eq!(lets.len(), 1);
}

#[test]
fn test_binder_scoping() {
    let nm = NodeManager::default();
    let u = nm.mk_sort("U");
    let x = nm.mk_bound_var("x", &u);
    let f = nm.mk_var("f", &nm.mk_function_sort([&u], &u));
    let p = nm.mk_var("P", &nm.mk_function_sort([&u], nm.bool_sort()));
    let fx = nm.mk_apply(&f, [&x]);
    let t = nm.mk_apply(&p, [&fx]);
    let q = nm.mk_forall([&x], &nm.mk_and([&t, &t, &t]));

    let p1 = nm.mk_var("p1", nm.bool_sort());
    let p2 = nm.mk_var("p2", nm.bool_sort());
    let s = nm.mk_or([&p1, &p2]);
    let top = nm.mk_and([&q, &s, &s]);

    let mut dag = DagificationVisitor::new(&nm, 1);
    run(&nm, &mut dag, top.node());

    // `s` is hoisted, `t` stays under the quantifier binding `x`.
    let lets = dag.get_lets(None).unwrap();
    assert!(lets.has_substitution(&s));
    assert!(!lets.has_substitution(&t));
    assert_eq!(lets.len(), 1);

    let local = dag.get_lets(Some(*q)).unwrap();
    assert!(local.has_substitution(&t));
    assert!(!local.has_substitution(&fx));
    assert_eq!(local.len(), 1);

    let body = dag.get_dagified_body(Some(*q));
    let t_var = local.get(&t).unwrap();
    assert_eq!(nm.children(&body), vec![t_var; 3]);

    assert_eq!(local.inline(&body), nm.child(&q, 1));

    let top_body = dag.get_dagified_body(None);
    assert_eq!(nm.child(&top_body, 0), *q);
}

#[test]
fn test_quantifiers_are_never_let_bound() {
    let nm = NodeManager::default();
    let u = nm.mk_sort("U");
    let x = nm.mk_bound_var("x", &u);
    let p = nm.mk_var("P", &nm.mk_function_sort([&u], nm.bool_sort()));
    let px = nm.mk_apply(&p, [&x]);
    let body = nm.mk_or([&px, &px]);
    let q = nm.mk_forall([&x], &body);
    let top = nm.mk_and([&q, &q]);

    let dag = dagify(&nm, &top, 1);
    let scopes = [None, Some(*q)];
    for scope in scopes {
        if let Some(lets) = dag.get_lets(scope) {
            for (from, _) in lets.iter() {
                let kind = nm.kind(from);
                assert!(
                    !kind.is_binder() && kind != Kind::BoundVarList,
                    "{} was let-bound",
                    nm.to_sexpr(from)
                );
            }
        }
    }

    let lets = dag.get_lets(None).unwrap();
    assert!(lets.is_empty());
    assert_eq!(dag.get_dagified_body(None), top);

    // The repeated body is bound inside the quantifier, and inlines back.
    let local = dag.get_lets(Some(*q)).unwrap();
    assert!(local.has_substitution(&body));
    assert!(!local.has_substitution(&q));
    let dagified = dag.get_dagified_body(Some(*q));
    assert_eq!(local.inline(&dagified), body);
}
