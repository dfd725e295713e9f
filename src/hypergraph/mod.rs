//! The packed forest handed over by a decoder. Nodes and rules live in
//! arenas inside the `HyperGraph` and are referred to by index, so every
//! consumer of the structure can address them without owning them.

use crate::vocabulary::SymId;

mod from_str;

pub use self::from_str::read_hypergraph;

/// Index of a node in its hypergraph.
pub type NodeId = usize;
/// Index of a rule in its hypergraph.
pub type RuleId = usize;

/// A synchronous grammar rule. Entries of `source` and `target` are
/// vocabulary ids; nonterminal entries are placeholders selecting an
/// antecedent of the hyperedge the rule is applied at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub lhs: SymId,
    pub source: Vec<SymId>,
    pub target: Vec<SymId>,
}

/// One way of deriving the parent node: an ordered list of antecedent
/// nodes, an optional rule (edges below the goal node carry none), and the
/// least cost any derivation rooted at this edge can achieve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperEdge {
    pub tail: Vec<NodeId>,
    pub rule: Option<RuleId>,
    pub source_path: Option<usize>,
    pub best_cost: f64,
}

impl HyperEdge {
    pub fn is_axiom(&self) -> bool {
        self.tail.is_empty()
    }
}

/// A recognised span together with all hyperedges deriving it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HgNode {
    pub span: (usize, usize),
    pub edges: Vec<HyperEdge>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HyperGraph {
    nodes: Vec<HgNode>,
    rules: Vec<Rule>,
    goal: Option<NodeId>,
}

impl HyperGraph {
    pub fn new() -> Self {
        HyperGraph::default()
    }

    pub fn add_node(&mut self, span: (usize, usize)) -> NodeId {
        self.nodes.push(HgNode {
            span,
            edges: Vec::new(),
        });
        self.nodes.len() - 1
    }

    pub fn add_rule(&mut self, rule: Rule) -> RuleId {
        self.rules.push(rule);
        self.rules.len() - 1
    }

    pub fn add_edge(&mut self, head: NodeId, edge: HyperEdge) {
        self.nodes[head].edges.push(edge);
    }

    pub fn set_goal(&mut self, goal: NodeId) {
        self.goal = Some(goal);
    }

    pub fn goal(&self) -> Option<NodeId> {
        self.goal
    }

    pub fn node(&self, id: NodeId) -> &HgNode {
        &self.nodes[id]
    }

    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id]
    }

    pub fn nodes(&self) -> &[HgNode] {
        &self.nodes
    }

    /// The least best-derivation cost over the incoming edges of `id`,
    /// i.e. the cost of the node's 1-best derivation.
    pub fn best_cost(&self, id: NodeId) -> f64 {
        self.nodes[id]
            .edges
            .iter()
            .map(|e| e.best_cost)
            .fold(f64::INFINITY, f64::min)
    }
}
