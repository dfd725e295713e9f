//! Per-node bookkeeping and the lazy enumeration itself. Seeding only
//! requires that every hyperedge carries its best-derivation cost; no edge
//! list has to be sorted, the candidate heap establishes the order.

use fnv::FnvHashSet;
use once_heap::FnvOnceHeap;
use tracing::trace;

use super::state::{signature, Cost, DerivationState};
use super::{ExtractionError, KBestExtractor};
use crate::hypergraph::{HyperGraph, NodeId};
use crate::vocabulary::SymbolTable;

/// Extraction state of one hypergraph node, created lazily on first
/// access through the extractor's lookup table.
pub(super) struct VirtualNode {
    /// Entry `i` is the `(i+1)`-best derivation; grows monotonically.
    pub nbests: Vec<DerivationState>,
    /// Frontier of candidate states, `None` until seeded. Its spent keys
    /// double as the table of signatures ever enqueued, so a rank vector
    /// reachable along several increment paths is expanded once.
    pub cand: Option<FnvOnceHeap<String, DerivationState, Cost>>,
    /// Flat yields already ranked; only consulted in unique mode.
    pub nbest_strings: FnvHashSet<String>,
}

impl VirtualNode {
    pub fn new() -> Self {
        VirtualNode {
            nbests: Vec::new(),
            cand: None,
            nbest_strings: FnvHashSet::default(),
        }
    }
}

impl<'a, S: SymbolTable> KBestExtractor<'a, S> {
    /// Fills the ranked list of `node` until it holds `k` entries or the
    /// candidate frontier runs dry. Returns whether rank `k` exists.
    pub(super) fn lazy_kbest_at_node(
        &mut self,
        hg: &HyperGraph,
        node: NodeId,
        k: usize,
    ) -> Result<bool, ExtractionError> {
        if self.virtual_node(node).nbests.len() >= k {
            return Ok(true);
        }
        if self.virtual_nodes[&node].cand.is_none() {
            self.seed_candidates(hg, node)?;
        }

        while self.virtual_nodes[&node].nbests.len() < k {
            let popped = self
                .virtual_nodes
                .get_mut(&node)
                .unwrap()
                .cand
                .as_mut()
                .unwrap()
                .pop();
            let res = match popped {
                Some((res, _)) => res,
                None => break,
            };

            if self.config.unique_nbest {
                // ranks are assigned to distinct surface strings; a state
                // that repeats an already ranked yield is dropped here but
                // its successors are still expanded below
                let mut flat = String::new();
                self.numeric_yield(hg, &res, false, &mut flat)?;
                let vn = self.virtual_nodes.get_mut(&node).unwrap();
                if vn.nbest_strings.insert(flat) {
                    vn.nbests.push(res.clone());
                }
            } else {
                self.virtual_nodes
                    .get_mut(&node)
                    .unwrap()
                    .nbests
                    .push(res.clone());
            }

            self.lazy_next(hg, node, &res)?;
        }

        Ok(self.virtual_nodes[&node].nbests.len() >= k)
    }

    /// Seeds the candidate frontier of `node` with the best derivation of
    /// every incoming hyperedge; cascades rank-1 requests to the leaves.
    fn seed_candidates(&mut self, hg: &HyperGraph, node: NodeId) -> Result<(), ExtractionError> {
        let edge_count = hg.node(node).edges.len();
        if edge_count == 0 {
            return Err(ExtractionError::HypergraphCorrupt {
                reason: format!("node {} has no incoming hyperedges", node),
            });
        }
        trace!("seeding {} candidate derivations at node {}", edge_count, node);

        let mut cand = FnvOnceHeap::default();
        for edge_pos in 0..edge_count {
            let best = self.best_derivation(hg, node, edge_pos)?;
            let sig = best.signature();
            if cand.spent(&sig) {
                return Err(ExtractionError::HypergraphCorrupt {
                    reason: format!(
                        "duplicate derivation signature {:?} among the {} hyperedges of node {}",
                        sig, edge_count, node
                    ),
                });
            }
            let cost = best.cost;
            cand.push(sig, best, cost);
        }

        self.virtual_node(node).cand = Some(cand);
        Ok(())
    }

    /// The best derivation rooted at one hyperedge: rank one everywhere,
    /// cost as stored on the edge. Materialises the 1-best of every
    /// antecedent first.
    fn best_derivation(
        &mut self,
        hg: &HyperGraph,
        node: NodeId,
        edge_pos: usize,
    ) -> Result<DerivationState, ExtractionError> {
        let edge = &hg.node(node).edges[edge_pos];
        for &child in &edge.tail {
            self.lazy_kbest_at_node(hg, child, 1)?;
        }
        Ok(DerivationState {
            cost: edge.best_cost.into(),
            node,
            edge_pos,
            ranks: vec![1; edge.tail.len()],
        })
    }

    /// Enqueues every successor of `last`: one state per antecedent
    /// position, with that position's rank incremented by one.
    fn lazy_next(
        &mut self,
        hg: &HyperGraph,
        node: NodeId,
        last: &DerivationState,
    ) -> Result<(), ExtractionError> {
        let edge = &hg.node(node).edges[last.edge_pos];
        for (i, &child) in edge.tail.iter().enumerate() {
            let mut ranks = last.ranks.clone();
            ranks[i] += 1;

            let sig = signature(last.edge_pos, &ranks);
            if self.virtual_nodes[&node].cand.as_ref().unwrap().spent(&sig) {
                continue;
            }
            if !self.lazy_kbest_at_node(hg, child, ranks[i])? {
                continue;
            }

            let child_nbests = &self.virtual_nodes[&child].nbests;
            let cost =
                last.cost - child_nbests[last.ranks[i] - 1].cost + child_nbests[ranks[i] - 1].cost;
            let succ = DerivationState {
                cost,
                node,
                edge_pos: last.edge_pos,
                ranks,
            };
            self.virtual_nodes
                .get_mut(&node)
                .unwrap()
                .cand
                .as_mut()
                .unwrap()
                .push(sig, succ, cost);
        }
        Ok(())
    }

    /// The already materialised sub-derivation of `node` at the given
    /// 1-based rank.
    pub(super) fn materialised(
        &self,
        node: NodeId,
        rank: usize,
    ) -> Result<&DerivationState, ExtractionError> {
        self.virtual_nodes
            .get(&node)
            .and_then(|vn| vn.nbests.get(rank - 1))
            .ok_or_else(|| {
                ExtractionError::DerivationOverflow(format!(
                    "rank {} of node {} was never materialised",
                    rank, node
                ))
            })
    }
}
