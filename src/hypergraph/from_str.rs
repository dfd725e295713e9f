use nom::{is_space, IResult};

use super::{HyperEdge, HyperGraph, Rule};
use crate::util::parsing::{parse_token, parse_usize};
use crate::vocabulary::{Symbol, Vocabulary};

/// Reads a hypergraph from its line-oriented text format, interning all
/// surface symbols into `vocab`. The format consists of
///
/// * `node <i> <j>` lines declaring the recognised spans (nodes are
///   numbered in order of declaration, starting from `0`),
/// * `edge <head> (<tail>, …) [@ <path>] [<lhs> [ <src> … ] [ <tgt> … ]] # <cost>`
///   lines attaching a hyperedge to the already declared node `<head>`
///   (edges below the goal node omit the rule part),
/// * a `goal <node>` line, and
/// * blank lines and `%` comments.
///
/// Nonterminal symbols inside a rule are written `[<label>,<position>]`
/// where `<position>` is the antecedent selected on the target side.
pub fn read_hypergraph(s: &str, vocab: &mut Vocabulary) -> Result<HyperGraph, String> {
    let mut hg = HyperGraph::new();

    for (n, line) in s.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('%') {
            continue;
        }

        if line.starts_with("node") {
            match parse_node_decl(line.as_bytes()) {
                IResult::Done(_, span) => {
                    hg.add_node(span);
                }
                _ => return Err(format!("malformed node declaration in line {}", n + 1)),
            }
        } else if line.starts_with("edge") {
            let (head, tail, source_path, rule, best_cost) = match parse_edge_decl(line.as_bytes())
            {
                IResult::Done(_, parts) => parts,
                _ => return Err(format!("malformed edge declaration in line {}", n + 1)),
            };
            if head >= hg.nodes().len() {
                return Err(format!("unknown head node {} in line {}", head, n + 1));
            }
            if let Some(&t) = tail.iter().find(|&&t| t >= hg.nodes().len()) {
                return Err(format!("unknown tail node {} in line {}", t, n + 1));
            }
            let rule = rule.map(|(lhs, source, target)| {
                let interned = Rule {
                    lhs: vocab.add_nonterminal_at(&lhs, 0),
                    source: source.into_iter().map(|s| vocab.intern(s)).collect(),
                    target: target.into_iter().map(|s| vocab.intern(s)).collect(),
                };
                hg.add_rule(interned)
            });
            hg.add_edge(
                head,
                HyperEdge {
                    tail,
                    rule,
                    source_path,
                    best_cost,
                },
            );
        } else if line.starts_with("goal") {
            match parse_goal_decl(line.as_bytes()) {
                IResult::Done(_, goal) if goal < hg.nodes().len() => hg.set_goal(goal),
                IResult::Done(_, goal) => {
                    return Err(format!("unknown goal node {} in line {}", goal, n + 1))
                }
                _ => return Err(format!("malformed goal declaration in line {}", n + 1)),
            }
        } else {
            return Err(format!("unrecognised declaration in line {}", n + 1));
        }
    }

    Ok(hg)
}

named!(
    parse_node_decl<(usize, usize)>,
    do_parse!(
        tag!("node")
            >> take_while1!(is_space)
            >> i: parse_usize
            >> take_while1!(is_space)
            >> j: parse_usize
            >> ((i, j))
    )
);

named!(
    parse_goal_decl<usize>,
    do_parse!(tag!("goal") >> take_while1!(is_space) >> goal: parse_usize >> (goal))
);

type RawRule = (String, Vec<Symbol>, Vec<Symbol>);

#[allow(clippy::type_complexity)]
named!(
    parse_edge_decl<(usize, Vec<usize>, Option<usize>, Option<RawRule>, f64)>,
    do_parse!(
        tag!("edge")
            >> take_while1!(is_space)
            >> head: parse_usize
            >> take_while!(is_space)
            >> tail: parse_tail_nodes
            >> take_while!(is_space)
            >> source_path:
                opt!(complete!(do_parse!(
                    tag!("@")
                        >> take_while!(is_space)
                        >> path: parse_usize
                        >> take_while!(is_space)
                        >> (path)
                )))
            >> rule: opt!(complete!(parse_rule))
            >> take_while!(is_space)
            >> tag!("#")
            >> take_while!(is_space)
            >> best_cost: map!(map_res!(is_not!(" "), ::std::str::from_utf8), |c: &str| c
                .parse()
                .unwrap())
            >> ((head, tail, source_path, rule, best_cost))
    )
);

named!(
    parse_rule<RawRule>,
    do_parse!(
        lhs: parse_token
            >> take_while!(is_space)
            >> source: parse_rule_symbols
            >> take_while!(is_space)
            >> target: parse_rule_symbols
            >> ((lhs, source, target))
    )
);

named!(
    list_comma<()>,
    do_parse!(take_while!(is_space) >> char!(',') >> take_while!(is_space) >> (()))
);

/// The antecedent list of an edge: node ids between `(` and `)`, separated
/// by commas.
named!(
    parse_tail_nodes<Vec<usize>>,
    do_parse!(
        char!('(')
            >> take_while!(is_space)
            >> nodes: separated_list!(list_comma, parse_usize)
            >> take_while!(is_space)
            >> char!(')')
            >> (nodes)
    )
);

/// One side of a rule: symbols between `[` and `]`, separated by spaces.
named!(
    parse_rule_symbols<Vec<Symbol>>,
    do_parse!(
        char!('[')
            >> symbols:
                many0!(do_parse!(
                    take_while!(is_space) >> symbol: parse_symbol >> (symbol)
                ))
            >> take_while!(is_space)
            >> char!(']')
            >> (symbols)
    )
);

named!(
    parse_symbol<Symbol>,
    alt!(
        do_parse!(
            char!('[')
                >> label: map_res!(is_not!(",]"), ::std::str::from_utf8)
                >> char!(',')
                >> take_while!(is_space)
                >> index: parse_usize
                >> char!(']')
                >> (Symbol::Nonterminal(label.to_owned(), index))
        ) | map!(parse_token, Symbol::Terminal)
    )
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabulary::SymbolTable;

    #[test]
    fn read_a_small_hypergraph() {
        let input = "% two spans and a goal\n\
                     node 0 1\n\
                     node 1 2\n\
                     node 0 2\n\
                     \n\
                     edge 0 () A [ a ] [ a ] # 1.0\n\
                     edge 1 () B [ b ] [ b ] # 2.0\n\
                     edge 2 (0, 1) @ 4 S [ [A,0] [B,1] ] [ [A,0] [B,1] ] # 3.0\n\
                     goal 2\n";

        let mut vocab = Vocabulary::new();
        let hg = read_hypergraph(input, &mut vocab).unwrap();

        assert_eq!(hg.nodes().len(), 3);
        assert_eq!(hg.goal(), Some(2));
        assert_eq!(hg.node(1).span, (1, 2));

        let top = &hg.node(2).edges[0];
        assert_eq!(top.tail, vec![0, 1]);
        assert_eq!(top.source_path, Some(4));
        assert_eq!(top.best_cost, 3.0);

        let rule = hg.rule(top.rule.unwrap());
        assert_eq!(vocab.word_of(rule.lhs), Some("S"));
        assert_eq!(rule.target.len(), 2);
        assert!(vocab.is_nonterminal(rule.target[0]));
        assert_eq!(vocab.target_nonterminal_index(rule.target[1]), Some(1));

        let axiom = &hg.node(0).edges[0];
        assert!(axiom.is_axiom());
        let axiom_rule = hg.rule(axiom.rule.unwrap());
        assert!(!vocab.is_nonterminal(axiom_rule.target[0]));
        assert_eq!(vocab.word_of(axiom_rule.target[0]), Some("a"));
    }

    #[test]
    fn goal_edges_carry_no_rule() {
        let input = "node 0 1\nnode 0 1\nedge 0 () X [ a ] [ a ] # 0.5\nedge 1 (0) # 0.5\ngoal 1\n";
        let mut vocab = Vocabulary::new();
        let hg = read_hypergraph(input, &mut vocab).unwrap();
        assert_eq!(hg.node(1).edges[0].rule, None);
        assert_eq!(hg.node(1).edges[0].tail, vec![0]);
    }

    #[test]
    fn tail_lists_are_comma_separated() {
        let legal_inputs = vec![
            ("()x", "x", vec![]),
            ("(0, 1)", "", vec![0, 1]),
            ("( 2 ,3 )", "", vec![2, 3]),
        ];

        for (legal_input, control_rest, control_parsed) in legal_inputs {
            assert_eq!(
                (control_rest.as_bytes(), control_parsed),
                parse_tail_nodes(legal_input.as_bytes()).unwrap()
            );
        }
    }

    #[test]
    fn rule_symbol_lists_are_space_separated() {
        let (rest, symbols) = parse_rule_symbols("[ a [B,1] ]x".as_bytes()).unwrap();
        assert_eq!(rest, "x".as_bytes());
        assert_eq!(
            symbols,
            vec![
                Symbol::Terminal("a".to_owned()),
                Symbol::Nonterminal("B".to_owned(), 1),
            ]
        );

        let (rest, symbols) = parse_rule_symbols("[]".as_bytes()).unwrap();
        assert_eq!(rest, "".as_bytes());
        assert_eq!(symbols, vec![]);
    }

    #[test]
    fn rejects_dangling_references() {
        let mut vocab = Vocabulary::new();
        assert!(read_hypergraph("edge 0 () # 1.0\n", &mut vocab).is_err());
        assert!(read_hypergraph("node 0 1\ngoal 4\n", &mut vocab).is_err());
        assert!(read_hypergraph("node 0 1\nedge 0 (7) # 1.0\n", &mut vocab).is_err());
        assert!(read_hypergraph("nonsense\n", &mut vocab).is_err());
    }
}
