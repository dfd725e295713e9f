//! Feature functions score the application of a single hyperedge. The
//! extractor only ever needs the transition cost a feature charges at one
//! edge and the weight it enters the linear model with; everything else
//! about a feature stays outside this crate.

use crate::hypergraph::{HyperEdge, HyperGraph};

/// One component of the linear scoring model.
pub trait FeatureFunction {
    fn weight(&self) -> f64;

    /// The cost this feature charges for applying `edge` below a parent
    /// node with the given `span`. Goal edges carry no rule; features
    /// treat them as the final transition of a derivation.
    fn transition_cost(
        &self,
        hg: &HyperGraph,
        edge: &HyperEdge,
        span: (usize, usize),
        sent: Option<usize>,
    ) -> f64;
}

/// Computes the transition-cost vector of `edge` under all `models`.
pub fn transition_costs(
    models: &[Box<dyn FeatureFunction>],
    hg: &HyperGraph,
    edge: &HyperEdge,
    span: (usize, usize),
    sent: Option<usize>,
) -> Vec<f64> {
    models
        .iter()
        .map(|m| m.transition_cost(hg, edge, span, sent))
        .collect()
}

/// Recovers the transition cost of an edge from the stored best-derivation
/// costs: the edge's best cost minus the best cost of each antecedent.
/// With weight `1.0` this feature reproduces the combined derivation cost
/// exactly, which makes it the stock model for extraction from hypergraphs
/// whose per-feature scores were not kept.
#[derive(Debug, Clone, Copy)]
pub struct DerivationCostFeature {
    weight: f64,
}

impl DerivationCostFeature {
    pub fn new(weight: f64) -> Self {
        DerivationCostFeature { weight }
    }
}

impl FeatureFunction for DerivationCostFeature {
    fn weight(&self) -> f64 {
        self.weight
    }

    fn transition_cost(
        &self,
        hg: &HyperGraph,
        edge: &HyperEdge,
        _span: (usize, usize),
        _sent: Option<usize>,
    ) -> f64 {
        edge.tail
            .iter()
            .fold(edge.best_cost, |cost, &child| cost - hg.best_cost(child))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hypergraph::HyperEdge;

    fn edge(tail: Vec<usize>, best_cost: f64) -> HyperEdge {
        HyperEdge {
            tail,
            rule: None,
            source_path: None,
            best_cost,
        }
    }

    #[test]
    fn recovers_transition_cost_from_best_costs() {
        let mut hg = HyperGraph::new();
        let a = hg.add_node((0, 1));
        let b = hg.add_node((1, 2));
        hg.add_edge(a, edge(vec![], 1.0));
        hg.add_edge(a, edge(vec![], 3.0));
        hg.add_edge(b, edge(vec![], 2.0));

        let top = edge(vec![a, b], 3.5);
        let feature = DerivationCostFeature::new(1.0);
        // 3.5 - 1.0 - 2.0
        assert_eq!(feature.transition_cost(&hg, &top, (0, 2), None), 0.5);

        let axiom = edge(vec![], 1.0);
        assert_eq!(feature.transition_cost(&hg, &axiom, (0, 1), None), 1.0);
    }

    #[test]
    fn cost_vector_has_one_entry_per_model() {
        let hg = HyperGraph::new();
        let models: Vec<Box<dyn FeatureFunction>> = vec![
            Box::new(DerivationCostFeature::new(1.0)),
            Box::new(DerivationCostFeature::new(0.5)),
        ];
        let e = edge(vec![], 2.0);
        assert_eq!(transition_costs(&models, &hg, &e, (0, 1), Some(0)), vec![2.0, 2.0]);
    }
}
