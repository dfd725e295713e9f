//! Turning a derivation state into its output line. The recursive walk
//! first produces a *numeric* yield (vocabulary ids, optionally wrapped in
//! tree brackets); the line formatter then resolves every id through the
//! symbol table and appends the score fields.

use super::state::DerivationState;
use super::{ExtractionError, KBestExtractor};
use crate::features::{self, FeatureFunction};
use crate::hypergraph::{HyperGraph, NodeId};
use crate::vocabulary::{SymId, SymbolTable};

/// Cost reconstruction must reproduce the derivation cost up to this slack.
const COST_TOLERANCE: f64 = 1e-2;

impl<'a, S: SymbolTable> KBestExtractor<'a, S> {
    /// Formats `state` as one output line:
    /// `[sent ||| ] yield [ ||| f1 … fK] [ ||| combined]`.
    pub(super) fn hypothesis_line(
        &self,
        hg: &HyperGraph,
        state: &DerivationState,
        sent: Option<usize>,
        models: &[Box<dyn FeatureFunction>],
    ) -> Result<String, ExtractionError> {
        let model_costs = if models.is_empty() {
            None
        } else {
            let mut costs = vec![0.0; models.len()];
            self.accumulate_model_costs(hg, state, sent, models, &mut costs)?;
            Some(costs)
        };

        let mut numeric = String::new();
        self.numeric_yield(hg, state, self.config.extract_tree, &mut numeric)?;

        self.format_line(state, &numeric, sent, models, model_costs.as_deref())
    }

    /// Writes the numeric yield of `state` into `out`. In tree mode every
    /// rule application opens a bracket labelled with the rule's left-hand
    /// side (goal edges use the synthetic root label).
    pub(super) fn numeric_yield(
        &self,
        hg: &HyperGraph,
        state: &DerivationState,
        tree: bool,
        out: &mut String,
    ) -> Result<(), ExtractionError> {
        let node = hg.node(state.node);
        let edge = &node.edges[state.edge_pos];

        let label = match edge.rule {
            None => self.root,
            Some(rid) => hg.rule(rid).lhs,
        };
        if tree {
            out.push('(');
            out.push_str(&label.to_string());
            if self.config.include_alignment {
                out.push_str(&format!("{{{}-{}}}", node.span.0, node.span.1));
            }
            out.push(' ');
        }

        match edge.rule {
            None => {
                // edges below the goal node carry no rule; their yield is
                // the concatenation of the chosen antecedent derivations
                for (pos, &child) in edge.tail.iter().enumerate() {
                    let sub = self.materialised(child, state.ranks[pos])?.clone();
                    self.numeric_yield(hg, &sub, tree, out)?;
                    if pos < edge.tail.len() - 1 {
                        out.push(' ');
                    }
                }
            }
            Some(rid) => {
                let rule = hg.rule(rid);
                if !self.config.monolingual {
                    for (c, &sym) in rule.target.iter().enumerate() {
                        if self.symbols.is_nonterminal(sym) {
                            let pos = self.symbols.target_nonterminal_index(sym).ok_or_else(
                                || ExtractionError::HypergraphCorrupt {
                                    reason: format!(
                                        "nonterminal symbol {} has no target antecedent index",
                                        sym
                                    ),
                                },
                            )?;
                            self.substitute(hg, state, pos, tree, out)?;
                        } else {
                            out.push_str(&sym.to_string());
                        }
                        if c < rule.target.len() - 1 {
                            out.push(' ');
                        }
                    }
                } else {
                    // antecedents appear in source order
                    let mut pos = 0;
                    for (c, &sym) in rule.source.iter().enumerate() {
                        if self.symbols.is_nonterminal(sym) {
                            self.substitute(hg, state, pos, tree, out)?;
                            pos += 1;
                        } else {
                            out.push_str(&sym.to_string());
                        }
                        if c < rule.source.len() - 1 {
                            out.push(' ');
                        }
                    }
                }
            }
        }

        if tree {
            out.push(')');
        }
        Ok(())
    }

    /// Recurses into the sub-derivation selected at antecedent position
    /// `pos` of the edge behind `state`.
    fn substitute(
        &self,
        hg: &HyperGraph,
        state: &DerivationState,
        pos: usize,
        tree: bool,
        out: &mut String,
    ) -> Result<(), ExtractionError> {
        let edge = &hg.node(state.node).edges[state.edge_pos];
        let child: NodeId =
            *edge
                .tail
                .get(pos)
                .ok_or_else(|| ExtractionError::HypergraphCorrupt {
                    reason: format!(
                        "rule at node {} substitutes antecedent {} but the hyperedge has {}",
                        state.node,
                        pos,
                        edge.tail.len()
                    ),
                })?;
        let sub = self.materialised(child, state.ranks[pos])?.clone();
        self.numeric_yield(hg, &sub, tree, out)
    }

    /// Adds the transition-cost vector of every hyperedge along the
    /// derivation of `state` into `acc`.
    fn accumulate_model_costs(
        &self,
        hg: &HyperGraph,
        state: &DerivationState,
        sent: Option<usize>,
        models: &[Box<dyn FeatureFunction>],
        acc: &mut [f64],
    ) -> Result<(), ExtractionError> {
        let node = hg.node(state.node);
        let edge = &node.edges[state.edge_pos];

        let transitions = features::transition_costs(models, hg, edge, node.span, sent);
        for (a, c) in acc.iter_mut().zip(transitions) {
            *a += c;
        }

        for (pos, &child) in edge.tail.iter().enumerate() {
            let sub = self.materialised(child, state.ranks[pos])?.clone();
            self.accumulate_model_costs(hg, &sub, sent, models, acc)?;
        }
        Ok(())
    }

    /// Resolves the numeric yield through the symbol table and appends the
    /// score fields. Scores are negated costs with three fractional
    /// digits.
    fn format_line(
        &self,
        state: &DerivationState,
        numeric: &str,
        sent: Option<usize>,
        models: &[Box<dyn FeatureFunction>],
        model_costs: Option<&[f64]>,
    ) -> Result<String, ExtractionError> {
        let mut line = String::new();
        if let Some(sid) = sent {
            line.push_str(&sid.to_string());
            line.push_str(" ||| ");
        }

        let tokens: Vec<&str> = numeric.split_whitespace().collect();
        for (t, token) in tokens.iter().enumerate() {
            if self.config.extract_tree && (token.starts_with('(') || token.ends_with(')')) {
                if let Some(rest) = token.strip_prefix('(') {
                    // tree opening: "(<id>" or "(<id>{i-j}"
                    line.push('(');
                    if self.config.include_alignment {
                        let brace = rest.find('{').ok_or_else(|| {
                            ExtractionError::DerivationOverflow(format!(
                                "tree label {:?} lacks its alignment annotation",
                                token
                            ))
                        })?;
                        line.push_str(self.resolve(&rest[..brace])?);
                        line.push_str(&rest[brace..]);
                    } else {
                        line.push_str(self.resolve(rest)?);
                    }
                } else {
                    // last leaf of a subtree: "<id>)" with possibly more
                    // closing brackets
                    let close = token.find(')').ok_or_else(|| {
                        ExtractionError::DerivationOverflow(format!(
                            "unbracketed tree token {:?}",
                            token
                        ))
                    })?;
                    line.push_str(self.resolve(&token[..close])?);
                    line.push_str(&token[close..]);
                }
            } else {
                line.push_str(self.resolve(token)?);
            }
            if t < tokens.len() - 1 {
                line.push(' ');
            }
        }

        if let Some(costs) = model_costs {
            line.push_str(" |||");
            let mut accumulated = 0.0;
            for (model, &cost) in models.iter().zip(costs) {
                line.push_str(&format!(" {:.3}", -cost));
                accumulated += cost * model.weight();
            }
            if self.config.sanity_check
                && (state.cost.into_inner() - accumulated).abs() > COST_TOLERANCE
            {
                return Err(ExtractionError::CostMismatch {
                    derivation_cost: state.cost.into_inner(),
                    accumulated,
                    models: models
                        .iter()
                        .zip(costs)
                        .map(|(m, &c)| (m.weight(), c))
                        .collect(),
                });
            }
        }

        if self.config.add_combined_score {
            line.push_str(&format!(" ||| {:.3}", -state.cost.into_inner()));
        }

        Ok(line)
    }

    /// Maps one numeric token to its surface form.
    fn resolve(&self, token: &str) -> Result<&str, ExtractionError> {
        let id: SymId = token.parse().map_err(|_| {
            ExtractionError::DerivationOverflow(format!(
                "malformed token {:?} in a numeric yield",
                token
            ))
        })?;
        self.symbols
            .word_of(id)
            .ok_or_else(|| ExtractionError::HypergraphCorrupt {
                reason: format!("unknown symbol id {}", id),
            })
    }
}
