use crate::kind::{Kind, Payload};
use crate::reference::Node;
use crate::utils::{pairing3, pairing_seq, MyHash};

/// The structural signature of a node: what hash-consing compares.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct NodeData {
    pub kind: Kind,
    pub children: Vec<Node>,
    pub payload: Payload,
}

impl NodeData {
    pub fn new(kind: Kind, children: Vec<Node>, payload: Payload) -> Self {
        Self {
            kind,
            children,
            payload,
        }
    }

    pub fn leaf(kind: Kind, payload: Payload) -> Self {
        Self::new(kind, Vec::new(), payload)
    }
}

impl MyHash for NodeData {
    fn hash(&self) -> u64 {
        let x = self.kind as u64;
        let y = pairing_seq(self.children.len() as u64, self.children.iter().map(|c| c.id() as u64));
        let z = self.payload.signature();
        pairing3(x, y, z)
    }
}
