//! Lazy k-best extraction. The extractor owns one piece of bookkeeping per
//! hypergraph node it has visited (a *virtual node*) and fills each node's
//! ranked derivation list on demand, recursing into antecedents only as far
//! as the requested rank forces it to.

mod hypothesis;
mod state;
mod virtual_node;

pub use self::state::{signature, Cost, DerivationState};

use std::io;

use fnv::FnvHashMap;
use thiserror::Error;
use tracing::debug;

use self::virtual_node::VirtualNode;
use crate::features::FeatureFunction;
use crate::hypergraph::{HyperGraph, NodeId};
use crate::vocabulary::{SymId, SymbolTable};

/// Label of the synthetic nonterminal used for goal-level tree brackets.
pub const ROOT_LABEL: &str = "ROOT";

/// Extraction behaviour, fixed at construction of a `KBestExtractor`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractorConfig {
    /// Deduplicate derivations by their flat yield.
    pub unique_nbest: bool,
    /// Emit labelled parse trees instead of flat yields.
    pub extract_tree: bool,
    /// Annotate each tree label with the `{i-j}` span of its node.
    pub include_alignment: bool,
    /// Append the combined-cost field to each line.
    pub add_combined_score: bool,
    /// Read the source side of rules instead of the target side.
    pub monolingual: bool,
    /// Verify that per-feature costs reproduce the derivation cost.
    pub sanity_check: bool,
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("hypergraph is corrupt: {reason}")]
    HypergraphCorrupt { reason: String },
    /// The weighted sum of the reconstructed per-feature costs differs from
    /// the derivation cost by more than the tolerance of `1e-2`.
    #[error("derivation cost {derivation_cost} does not match the accumulated model cost {accumulated}; (weight, cost) pairs: {models:?}")]
    CostMismatch {
        derivation_cost: f64,
        accumulated: f64,
        models: Vec<(f64, f64)>,
    },
    #[error("consumer failed to accept a hypothesis")]
    Sink(#[from] io::Error),
    #[error("derivation bookkeeping violated: {0}")]
    DerivationOverflow(String),
}

/// The sink hypotheses are pushed into, one formatted line at a time.
/// `finish` is called exactly once when extraction ends, on every exit
/// path.
pub trait HypothesisConsumer {
    fn deliver(&mut self, line: &str) -> io::Result<()>;
    fn finish(&mut self);
}

impl HypothesisConsumer for Vec<String> {
    fn deliver(&mut self, line: &str) -> io::Result<()> {
        self.push(line.to_owned());
        Ok(())
    }

    fn finish(&mut self) {}
}

/// Writes each hypothesis as one line into an underlying byte sink.
pub struct LineWriter<W: io::Write> {
    writer: W,
}

impl<W: io::Write> LineWriter<W> {
    pub fn new(writer: W) -> Self {
        LineWriter { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: io::Write> HypothesisConsumer for LineWriter<W> {
    fn deliver(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.writer, "{}", line)
    }

    fn finish(&mut self) {
        let _ = self.writer.flush();
    }
}

/// Enumerates the k least-cost derivations of a hypergraph, best first.
///
/// The virtual-node table inside is keyed by `NodeId` and therefore only
/// meaningful for one hypergraph at a time; call [`reset`](Self::reset)
/// before touching a different one.
pub struct KBestExtractor<'a, S: SymbolTable> {
    symbols: &'a mut S,
    root: SymId,
    config: ExtractorConfig,
    virtual_nodes: FnvHashMap<NodeId, VirtualNode>,
}

impl<'a, S: SymbolTable> KBestExtractor<'a, S> {
    pub fn new(symbols: &'a mut S, config: ExtractorConfig) -> Self {
        let root = symbols.add_nonterminal(ROOT_LABEL);
        KBestExtractor {
            symbols,
            root,
            config,
            virtual_nodes: FnvHashMap::default(),
        }
    }

    /// Extracts up to `top_n` hypotheses rooted at the goal node of `hg`
    /// into `consumer`. Emits nothing if the hypergraph has no goal, and
    /// fewer than `top_n` lines if the forest holds fewer derivations.
    pub fn extract(
        &mut self,
        hg: &HyperGraph,
        models: &[Box<dyn FeatureFunction>],
        top_n: usize,
        sent: Option<usize>,
        consumer: &mut dyn HypothesisConsumer,
    ) -> Result<(), ExtractionError> {
        self.reset();
        let res = self.extract_into(hg, models, top_n, sent, consumer);
        consumer.finish();
        res
    }

    /// Convenience wrapper collecting the extracted lines into a vector.
    pub fn extract_to_vec(
        &mut self,
        hg: &HyperGraph,
        models: &[Box<dyn FeatureFunction>],
        top_n: usize,
        sent: Option<usize>,
    ) -> Result<Vec<String>, ExtractionError> {
        let mut lines = Vec::new();
        self.extract(hg, models, top_n, sent, &mut lines)?;
        Ok(lines)
    }

    fn extract_into(
        &mut self,
        hg: &HyperGraph,
        models: &[Box<dyn FeatureFunction>],
        top_n: usize,
        sent: Option<usize>,
        consumer: &mut dyn HypothesisConsumer,
    ) -> Result<(), ExtractionError> {
        let goal = match hg.goal() {
            Some(goal) => goal,
            None => return Ok(()),
        };

        for k in 1..=top_n {
            match self.kth_hypothesis(hg, goal, k, sent, models)? {
                Some(line) => {
                    debug!("hypothesis {}: {}", k, line);
                    consumer.deliver(&line)?;
                }
                None => break,
            }
        }
        Ok(())
    }

    /// The `k`-th best hypothesis rooted at `node` (`k` counts from one),
    /// or `None` if fewer than `k` derivations exist. Results are memoised:
    /// repeated queries for the same rank return identical lines until
    /// [`reset`](Self::reset).
    pub fn kth_hypothesis(
        &mut self,
        hg: &HyperGraph,
        node: NodeId,
        k: usize,
        sent: Option<usize>,
        models: &[Box<dyn FeatureFunction>],
    ) -> Result<Option<String>, ExtractionError> {
        if k == 0 || !self.lazy_kbest_at_node(hg, node, k)? {
            return Ok(None);
        }
        let state = self.virtual_nodes[&node].nbests[k - 1].clone();
        self.hypothesis_line(hg, &state, sent, models).map(Some)
    }

    /// Discards all per-node extraction state. Required before extracting
    /// from a different hypergraph with the same extractor.
    pub fn reset(&mut self) {
        self.virtual_nodes.clear();
    }

    fn virtual_node(&mut self, node: NodeId) -> &mut VirtualNode {
        self.virtual_nodes
            .entry(node)
            .or_insert_with(VirtualNode::new)
    }
}
