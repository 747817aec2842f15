use num_bigint::BigUint;
use smt_proof::attribute::TypeAttr;
use smt_proof::kind::{Kind, Payload};
use smt_proof::manager::NodeManager;
use smt_proof::reference::Node;
use test_log::test;

fn assert_children_precede(nm: &NodeManager, node: Node) {
    for c in nm.children(node) {
        assert!(c < node, "child {} of {} has a larger id", c, node);
        assert_children_precede(nm, c);
    }
}

#[test]
fn test_hash_consing_varies_each_component() {
    let nm = NodeManager::default();
    let u = nm.mk_sort("U");
    let a = nm.mk_var("a", &u);
    let b = nm.mk_var("b", &u);

    let e1 = nm.mk_node(Kind::Equal, [&a, &b], Payload::None);
    let e2 = nm.mk_eq(&a, &b);
    assert_eq!(e1, e2);

    // Different kind, child order and payload each give a distinct node.
    assert_ne!(e1, nm.mk_node(Kind::Distinct, [&a, &b], Payload::None));
    assert_ne!(e1, nm.mk_eq(&b, &a));
    assert_ne!(nm.mk_integer(1), nm.mk_integer(2));
    assert_eq!(nm.mk_integer(1), nm.mk_integer(1));
    assert_ne!(
        nm.mk_chain(Kind::Equal, [&a, &b]),
        nm.mk_chain(Kind::Distinct, [&a, &b])
    );
}

#[test]
fn test_id_order_after_substitution() {
    let nm = NodeManager::default();
    let u = nm.mk_sort("U");
    let a = nm.mk_var("a", &u);
    let b = nm.mk_var("b", &u);
    let f = nm.mk_var("f", &nm.mk_function_sort([&u, &u], &u));
    let fab = nm.mk_apply(&f, [&a, &b]);
    let t = nm.mk_eq(&nm.mk_apply(&f, [&fab, &a]), &b);
    assert_children_precede(&nm, *t);

    // The replacement is created after everything it ends up below.
    let c = nm.mk_var("c", &u);
    let s = nm.substitute(&t, &[*a], &[*c]);
    assert_ne!(s, t);
    assert_children_precede(&nm, *s);
    assert_eq!(nm.to_sexpr(*s), "(= (f (f c b) c) b)");
}

#[test]
fn test_substitution_idempotence() {
    let nm = NodeManager::default();
    let p = nm.mk_var("p", nm.bool_sort());
    let q = nm.mk_var("q", nm.bool_sort());
    let t = nm.mk_or([&p, &nm.mk_not(&q)]);

    assert_eq!(nm.substitute(&t, &[*p], &[*p]), t);
    assert_eq!(nm.substitute(&t, &[], &[]), t);
}

#[test]
fn test_collection_releases_subterms() {
    let nm = NodeManager::default();
    let before = nm.live_nodes();
    {
        let u = nm.mk_sort("U");
        let a = nm.mk_var("a", &u);
        let b = nm.mk_var("b", &u);
        let e = nm.mk_eq(&a, &b);
        assert!(nm.type_of(&e).is_ok());
        assert!(nm.has_attribute::<TypeAttr>(&e));
        assert!(nm.live_nodes() > before);
    }
    assert_eq!(nm.live_nodes(), before);
}

#[test]
fn test_shared_dag_sizes() {
    let nm = NodeManager::default();
    let p = nm.mk_var("p", nm.bool_sort());
    let mut t = nm.mk_and([&p, &p]);
    for _ in 0..9 {
        t = nm.mk_and([&t, &t]);
    }
    assert_eq!(nm.dag_size(&t), 11);
    assert_eq!(nm.tree_size(&t), BigUint::from(2047u32));
}

#[test]
fn test_order_agrees_with_equality() {
    let nm1 = NodeManager::default();
    let nm2 = NodeManager::default();
    let a1 = nm1.mk_var("a", nm1.bool_sort());
    let a2 = nm2.mk_var("a", nm2.bool_sort());
    assert_eq!(a1.node(), a2.node());
    assert_ne!(a1, a2);
    assert_ne!(a1.cmp(&a2), std::cmp::Ordering::Equal);
    assert_eq!(a1.cmp(&a2), a2.cmp(&a1).reverse());

    let b1 = nm1.mk_var("b", nm1.bool_sort());
    assert!(a1 < b1);
    assert_eq!(a1.cmp(&a1.clone()), std::cmp::Ordering::Equal);
}

#[test]
fn test_collected_variable_slot_is_recycled() {
    let nm = NodeManager::default();
    let u = nm.mk_sort("U");
    let keep = nm.mk_var("keep", &u);
    let slot = {
        let a = nm.mk_var("a", &u);
        nm.payload(&a)
    };
    let b = nm.mk_var("b", &u);
    assert_eq!(nm.payload(&b), slot);
    assert_eq!(nm.name(&b).as_deref(), Some("b"));
    assert_eq!(nm.name(&keep).as_deref(), Some("keep"));
    assert_ne!(nm.payload(&keep), nm.payload(&b));

    let c = nm.mk_var("c", &u);
    assert!(matches!(nm.payload(&c), Payload::Var(_)));
    assert_ne!(nm.payload(&c), slot);
}
