use ordered_float::OrderedFloat;

use crate::hypergraph::NodeId;

/// Derivation cost with a total order, smaller is better.
pub type Cost = OrderedFloat<f64>;

/// One derivation of a node: a hyperedge of that node (identified by its
/// position in the node's edge list) together with the 1-based rank of the
/// sub-derivation chosen at each antecedent. The rank vector is empty for
/// axioms. `cost` accumulates the edge's best-derivation cost plus the
/// surcharge of every antecedent rank above one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DerivationState {
    pub cost: Cost,
    pub node: NodeId,
    pub edge_pos: usize,
    pub ranks: Vec<usize>,
}

impl DerivationState {
    pub fn signature(&self) -> String {
        signature(self.edge_pos, &self.ranks)
    }
}

/// Identifies a derivation state among all states of one parent node. The
/// edge position stands in for the hyperedge itself so the signature never
/// depends on object identity.
pub fn signature(edge_pos: usize, ranks: &[usize]) -> String {
    let mut sig = edge_pos.to_string();
    for r in ranks {
        sig.push(' ');
        sig.push_str(&r.to_string());
    }
    sig
}
