/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Deterministic shortest-path search over an unweighted multigraph.
//!
//! Breadth-first: the outgoing edges of a vertex are expanded in ascending `order`
//! (the gate number for gate edges), then in edge insertion order. The first edge
//! discovering a vertex wins, so among several equally short paths the one whose
//! earliest differing hop has the lowest gate number is returned.

use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, VecDeque};

/// Returns the edges of a shortest path from `source` to `target`, using only edges
/// accepted by `admit`.
///
/// `Some` of an empty path means `source == target`; `None` means no path exists.
pub fn shortest_path<N, E, A, K, O>(
    graph: &StableDiGraph<N, E>,
    source: NodeIndex,
    target: NodeIndex,
    mut admit: A,
    order: K,
) -> Option<Vec<EdgeIndex>>
where
    A: FnMut(&E) -> bool,
    K: Fn(&E) -> O,
    O: Ord,
{
    if source == target {
        return Some(Vec::new());
    }

    let mut predecessor: HashMap<NodeIndex, (NodeIndex, EdgeIndex)> = HashMap::new();
    let mut queue = VecDeque::from([source]);

    while let Some(current) = queue.pop_front() {
        let mut outgoing: Vec<_> = graph
            .edges_directed(current, Direction::Outgoing)
            .filter(|edge| admit(edge.weight()))
            .collect();
        outgoing.sort_by(|a, b| {
            order(a.weight())
                .cmp(&order(b.weight()))
                .then(a.id().cmp(&b.id()))
        });

        for edge in outgoing {
            let next = edge.target();
            if next == source || predecessor.contains_key(&next) {
                continue;
            }
            predecessor.insert(next, (current, edge.id()));
            if next == target {
                return Some(unwind(&predecessor, source, target));
            }
            queue.push_back(next);
        }
    }

    None
}

fn unwind(
    predecessor: &HashMap<NodeIndex, (NodeIndex, EdgeIndex)>,
    source: NodeIndex,
    target: NodeIndex,
) -> Vec<EdgeIndex> {
    let mut path = Vec::new();
    let mut at = target;
    while at != source {
        let Some((previous, edge)) = predecessor.get(&at) else {
            break;
        };
        path.push(*edge);
        at = *previous;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::shortest_path;
    use petgraph::stable_graph::StableDiGraph;

    fn weights(graph: &StableDiGraph<&str, u32>, path: &[petgraph::stable_graph::EdgeIndex]) -> Vec<u32> {
        path.iter().map(|edge| graph[*edge]).collect()
    }

    #[test]
    fn equal_length_paths_prefer_lowest_gate_number() {
        let mut graph = StableDiGraph::new();
        let a = graph.add_node("a");
        let b = graph.add_node("b");
        let c = graph.add_node("c");
        let d = graph.add_node("d");
        graph.add_edge(a, c, 7);
        graph.add_edge(a, b, 2);
        graph.add_edge(b, d, 9);
        graph.add_edge(c, d, 1);

        let path = shortest_path(&graph, a, d, |_| true, |gate| *gate).expect("path");

        assert_eq!(weights(&graph, &path), vec![2, 9]);
    }

    #[test]
    fn parallel_edges_prefer_lowest_gate_number() {
        let mut graph = StableDiGraph::new();
        let a = graph.add_node("a");
        let b = graph.add_node("b");
        graph.add_edge(a, b, 5);
        graph.add_edge(a, b, 3);

        let path = shortest_path(&graph, a, b, |_| true, |gate| *gate).expect("path");

        assert_eq!(weights(&graph, &path), vec![3]);
    }

    #[test]
    fn source_equal_to_target_is_the_empty_path() {
        let mut graph: StableDiGraph<&str, u32> = StableDiGraph::new();
        let a = graph.add_node("a");

        assert_eq!(shortest_path(&graph, a, a, |_| true, |gate| *gate), Some(vec![]));
    }

    #[test]
    fn rejected_edges_are_not_traversed() {
        let mut graph = StableDiGraph::new();
        let a = graph.add_node("a");
        let b = graph.add_node("b");
        let c = graph.add_node("c");
        graph.add_edge(a, c, 1);
        graph.add_edge(a, b, 2);
        graph.add_edge(b, c, 3);

        let direct = shortest_path(&graph, a, c, |_| true, |gate| *gate).expect("path");
        let detour = shortest_path(&graph, a, c, |gate| *gate != 1, |gate| *gate).expect("path");

        assert_eq!(weights(&graph, &direct), vec![1]);
        assert_eq!(weights(&graph, &detour), vec![2, 3]);
        assert!(shortest_path(&graph, c, a, |_| true, |gate| *gate).is_none());
    }
}
