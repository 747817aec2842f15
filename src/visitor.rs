//! Generic post-order traversal of a term DAG.

use crate::manager::NodeManager;
use crate::reference::Node;

/// Callbacks of a traversal driven by [`run`].
///
/// `visit` is called for a node after all its children have been visited (or
/// skipped), once per occurrence along the parent edge it was reached by.
/// Nodes for which `already_visited` holds are pruned together with their
/// subterms.
pub trait NodeVisitor {
    type Output;

    fn start(&mut self, node: Node);

    fn already_visited(&self, nm: &NodeManager, current: Node, parent: Option<Node>) -> bool;

    fn visit(&mut self, nm: &NodeManager, current: Node, parent: Option<Node>);

    fn done(&mut self, nm: &NodeManager, node: Node) -> Self::Output;
}

struct Frame {
    node: Node,
    parent: Option<Node>,
    children_added: bool,
}

/// Drive `visitor` over the DAG rooted at `node`.
pub fn run<V: NodeVisitor>(nm: &NodeManager, visitor: &mut V, node: Node) -> V::Output {
    visitor.start(node);

    let mut stack = vec![Frame {
        node,
        parent: None,
        children_added: false,
    }];

    while let Some(frame) = stack.last_mut() {
        let (current, parent) = (frame.node, frame.parent);
        if visitor.already_visited(nm, current, parent) {
            stack.pop();
        } else if frame.children_added {
            visitor.visit(nm, current, parent);
            stack.pop();
        } else {
            frame.children_added = true;
            for child in nm.children(current) {
                if !visitor.already_visited(nm, child, Some(current)) {
                    stack.push(Frame {
                        node: child,
                        parent: Some(current),
                        children_added: false,
                    });
                }
            }
        }
    }

    visitor.done(nm, node)
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    /// Records the order of visits, skipping variables.
    #[derive(Default)]
    struct Trace {
        visited: Vec<(Node, Option<Node>)>,
        started: Option<Node>,
    }

    impl NodeVisitor for Trace {
        type Output = usize;

        fn start(&mut self, node: Node) {
            self.started = Some(node);
        }

        fn already_visited(&self, nm: &NodeManager, current: Node, _parent: Option<Node>) -> bool {
            nm.is_var(current)
        }

        fn visit(&mut self, _nm: &NodeManager, current: Node, parent: Option<Node>) {
            self.visited.push((current, parent));
        }

        fn done(&mut self, _nm: &NodeManager, _node: Node) -> usize {
            self.visited.len()
        }
    }

    #[test]
    fn test_children_before_parents() {
        let nm = NodeManager::default();
        let p = nm.mk_var("p", nm.bool_sort());
        let q = nm.mk_var("q", nm.bool_sort());
        let np = nm.mk_not(&p);
        let f = nm.mk_and([&np, &q]);

        let mut trace = Trace::default();
        let n = run(&nm, &mut trace, *f);
        assert_eq!(trace.started, Some(*f));
        assert_eq!(n, 2);
        assert_eq!(trace.visited, vec![(*np, Some(*f)), (*f, None)]);
    }

    #[test]
    fn test_shared_child_visited_per_occurrence() {
        let nm = NodeManager::default();
        let p = nm.mk_var("p", nm.bool_sort());
        let np = nm.mk_not(&p);
        let f = nm.mk_or([&np, &np, &np]);

        let mut trace = Trace::default();
        run(&nm, &mut trace, *f);
        let count = trace.visited.iter().filter(|(n, _)| *n == *np).count();
        assert_eq!(count, 3);
    }
}
