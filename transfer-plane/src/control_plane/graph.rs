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

//! Local directed multigraph of forwarding elements.
//!
//! Vertices are [`ForwardingElement`]s addressed through an [`ElementId`] index; edges are
//! gate links keyed by their owning element and gate number, or display-only links that
//! carry a label and never take part in forwarding.

use crate::error::TransferError;
use crate::gate::GateId;
use crate::node::{ElementId, ForwardingElement, ForwardingNode, NodeId};
use crate::observability::events;
use crate::routing::{search, Description, Route, RouteSegment};
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, error};

const TRANSFER_GRAPH_TAG: &str = "TransferGraph:";
const TRANSFER_GRAPH_FN_REMOVE_ELEMENT_TAG: &str = "remove_element():";
const TRANSFER_GRAPH_FN_ROUTE_TAG: &str = "route():";

const COMPONENT: &str = "transfer_graph";

/// Edge payload of a gate link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct GateLink {
    pub(crate) owner: ElementId,
    pub(crate) gate: GateId,
    pub(crate) description: Description,
    /// Whether the routing service was told about this link.
    pub(crate) exported: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Link {
    Gate(GateLink),
    /// Cosmetic edge for topology rendering.
    Display(String),
}

impl Link {
    fn order_key(&self) -> (u8, u32) {
        match self {
            Link::Gate(link) => (0, link.gate.value()),
            Link::Display(_) => (1, 0),
        }
    }

    fn admitted_by(&self, requirements: &Description) -> bool {
        match self {
            Link::Gate(link) => requirements.admits(&link.description),
            Link::Display(_) => true,
        }
    }
}

pub(crate) struct TransferGraph {
    graph: StableDiGraph<ForwardingElement, Link>,
    index: HashMap<ElementId, NodeIndex>,
    gate_edges: HashMap<(ElementId, GateId), EdgeIndex>,
    exported: HashSet<NodeId>,
}

impl TransferGraph {
    /// Creates a graph holding only the dev/null sink.
    pub(crate) fn new() -> Self {
        let mut graph = StableDiGraph::new();
        let dev_null = graph.add_node(ForwardingElement::DevNull);
        Self {
            graph,
            index: HashMap::from([(ElementId::DevNull, dev_null)]),
            gate_edges: HashMap::new(),
            exported: HashSet::new(),
        }
    }

    pub(crate) fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    pub(crate) fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub(crate) fn contains(&self, id: &ElementId) -> bool {
        self.index.contains_key(id)
    }

    pub(crate) fn node(&self, id: &NodeId) -> Option<Arc<ForwardingNode>> {
        let index = self.index.get(&ElementId::Node(*id))?;
        self.graph[*index].as_node().cloned()
    }

    pub(crate) fn elements(&self) -> impl Iterator<Item = &ForwardingElement> {
        self.graph.node_weights()
    }

    /// Adds `element` unless an element with the same id is present; returns whether it
    /// was added.
    pub(crate) fn add_element(&mut self, element: ForwardingElement) -> bool {
        let id = element.id();
        if self.index.contains_key(&id) {
            return false;
        }
        let index = self.graph.add_node(element);
        self.index.insert(id, index);
        true
    }

    /// Removes the element and every link touching it. The dev/null sink stays.
    pub(crate) fn remove_element(&mut self, id: &ElementId) -> Option<ForwardingElement> {
        if *id == ElementId::DevNull {
            return None;
        }
        let index = self.index.remove(id)?;

        let incident: Vec<EdgeIndex> = self
            .graph
            .edges_directed(index, Direction::Outgoing)
            .chain(self.graph.edges_directed(index, Direction::Incoming))
            .map(|edge| edge.id())
            .collect();
        for edge in &incident {
            if let Some(Link::Gate(link)) = self.graph.edge_weight(*edge) {
                self.gate_edges.remove(&(link.owner.clone(), link.gate));
            }
        }
        debug!(
            "{}:{} removing {} with {} incident link(s)",
            TRANSFER_GRAPH_TAG,
            TRANSFER_GRAPH_FN_REMOVE_ELEMENT_TAG,
            id,
            incident.len()
        );

        if let ElementId::Node(node_id) = id {
            self.exported.remove(node_id);
        }
        self.graph.remove_node(index)
    }

    pub(crate) fn set_exported(&mut self, node: NodeId) {
        self.exported.insert(node);
    }

    pub(crate) fn is_exported(&self, node: &NodeId) -> bool {
        self.exported.contains(node)
    }

    #[cfg(test)]
    fn contains_gate_link(&self, owner: &ElementId, gate: GateId) -> bool {
        self.gate_edges.contains_key(&(owner.clone(), gate))
    }

    /// Inserts the link of gate `link.gate` from `from` to `to`. A gate carries at most one link.
    pub(crate) fn insert_gate_link(
        &mut self,
        from: &ElementId,
        to: &ElementId,
        link: GateLink,
    ) -> Result<(), TransferError> {
        let key = (link.owner.clone(), link.gate);
        if self.gate_edges.contains_key(&key) {
            return Err(TransferError::Consistency(format!(
                "gate {} of {} is already linked",
                link.gate, link.owner
            )));
        }
        let (source, target) = self.endpoints(from, to)?;
        let edge = self.graph.add_edge(source, target, Link::Gate(link));
        self.gate_edges.insert(key, edge);
        Ok(())
    }

    pub(crate) fn remove_gate_link(&mut self, owner: &ElementId, gate: GateId) -> Option<GateLink> {
        let edge = self.gate_edges.remove(&(owner.clone(), gate))?;
        match self.graph.remove_edge(edge) {
            Some(Link::Gate(link)) => Some(link),
            Some(Link::Display(_)) | None => None,
        }
    }

    pub(crate) fn insert_display_link(
        &mut self,
        from: &ElementId,
        to: &ElementId,
        label: &str,
    ) -> Result<(), TransferError> {
        let (source, target) = self.endpoints(from, to)?;
        self.graph
            .add_edge(source, target, Link::Display(label.to_string()));
        Ok(())
    }

    fn endpoints(
        &self,
        from: &ElementId,
        to: &ElementId,
    ) -> Result<(NodeIndex, NodeIndex), TransferError> {
        let source = self.index_of(from)?;
        let target = self.index_of(to)?;
        Ok((source, target))
    }

    fn index_of(&self, id: &ElementId) -> Result<NodeIndex, TransferError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| TransferError::UnknownElement(id.to_string()))
    }

    /// Shortest gate route from `source` to `target` meeting `requirements`.
    ///
    /// Fails with [`TransferError::NoRoute`] if no path exists at all and with
    /// [`TransferError::Requirements`] if paths exist but none meets the requirements.
    pub(crate) fn route(
        &self,
        source: &ElementId,
        target: &ElementId,
        requirements: &Description,
    ) -> Result<Route, TransferError> {
        let (from, to) = self.endpoints(source, target)?;

        let path = search::shortest_path(&self.graph, from, to, |_| true, Link::order_key)
            .ok_or_else(|| TransferError::no_route(source, target))?;
        let (route, _) = self.gate_route(&path)?;
        if requirements.is_empty() {
            return Ok(route);
        }

        let unsatisfied = || TransferError::Requirements {
            destination: target.to_string(),
            requirements: requirements.to_string(),
        };
        let path = search::shortest_path(
            &self.graph,
            from,
            to,
            |link| link.admitted_by(requirements),
            Link::order_key,
        )
        .ok_or_else(unsatisfied)?;
        let (route, delay) = self.gate_route(&path)?;
        if !requirements.within_delay(delay) {
            debug!(
                "{}:{} route {} to {} exceeds delay budget with {}ms",
                TRANSFER_GRAPH_TAG, TRANSFER_GRAPH_FN_ROUTE_TAG, route, target, delay
            );
            return Err(unsatisfied());
        }
        Ok(route)
    }

    /// Translates a path into gate segments and sums the announced gate delays.
    fn gate_route(&self, path: &[EdgeIndex]) -> Result<(Route, u64), TransferError> {
        let mut route = Route::new();
        let mut delay = 0u64;
        for edge in path {
            match self.graph.edge_weight(*edge) {
                Some(Link::Gate(link)) => {
                    route.add_last(RouteSegment::Gate(link.gate));
                    delay += link.description.delay().map_or(0, u64::from);
                }
                Some(Link::Display(label)) => {
                    error!(
                        event = events::CONSISTENCY_VIOLATION,
                        component = COMPONENT,
                        link = %label,
                        "display-only link on a forwarding path"
                    );
                    return Err(TransferError::Consistency(format!(
                        "display-only link '{label}' is not a gate"
                    )));
                }
                None => {
                    return Err(TransferError::Consistency(format!(
                        "path edge {} vanished during route search",
                        edge.index()
                    )));
                }
            }
        }
        Ok((route, delay))
    }
}

#[cfg(test)]
mod tests {
    use super::{GateLink, TransferGraph};
    use crate::error::ErrorKind;
    use crate::gate::GateId;
    use crate::node::{ElementId, ForwardingElement, ForwardingNode};
    use crate::routing::{Description, Property, Route};

    fn link(owner: &ElementId, gate: u32, description: Description) -> GateLink {
        GateLink {
            owner: owner.clone(),
            gate: GateId::new(gate),
            description,
            exported: false,
        }
    }

    fn with_nodes(names: &[&str]) -> (TransferGraph, Vec<ElementId>) {
        let mut graph = TransferGraph::new();
        let ids = names
            .iter()
            .map(|name| {
                let node = ForwardingNode::builder(name).build();
                let id = node.element_id();
                assert!(graph.add_element(ForwardingElement::Node(node)));
                id
            })
            .collect();
        (graph, ids)
    }

    #[test]
    fn starts_with_dev_null_only() {
        let graph = TransferGraph::new();

        assert_eq!(graph.vertex_count(), 1);
        assert!(graph.contains(&ElementId::DevNull));
    }

    #[test]
    fn removing_a_vertex_drops_its_links() {
        let (mut graph, ids) = with_nodes(&["a", "b"]);
        graph
            .insert_gate_link(&ids[0], &ids[1], link(&ids[0], 1, Description::new()))
            .expect("a -> b");
        graph
            .insert_gate_link(&ids[1], &ids[0], link(&ids[1], 1, Description::new()))
            .expect("b -> a");

        assert!(graph.remove_element(&ids[1]).is_some());

        assert_eq!(graph.edge_count(), 0);
        assert!(!graph.contains_gate_link(&ids[0], GateId::new(1)));
        assert!(graph.remove_element(&ElementId::DevNull).is_none());
    }

    #[test]
    fn gate_is_linked_at_most_once() {
        let (mut graph, ids) = with_nodes(&["a", "b"]);
        graph
            .insert_gate_link(&ids[0], &ids[1], link(&ids[0], 1, Description::new()))
            .expect("first link");

        let err = graph
            .insert_gate_link(&ids[0], &ElementId::DevNull, link(&ids[0], 1, Description::new()))
            .expect_err("second link");

        assert_eq!(err.kind(), ErrorKind::Consistency);
    }

    #[test]
    fn route_to_self_is_empty() {
        let (graph, ids) = with_nodes(&["a"]);

        assert_eq!(graph.route(&ids[0], &ids[0], &Description::new()), Ok(Route::new()));
    }

    #[test]
    fn unsatisfiable_requirements_differ_from_missing_path() {
        let (mut graph, ids) = with_nodes(&["a", "b"]);
        graph
            .insert_gate_link(&ids[0], &ids[1], link(&ids[0], 1, Description::new()))
            .expect("a -> b");
        let lossless = Description::new().with(Property::Lossless);

        let unsatisfied = graph.route(&ids[0], &ids[1], &lossless).expect_err("lossy link");
        let unreachable = graph.route(&ids[1], &ids[0], &lossless).expect_err("no way back");

        assert_eq!(unsatisfied.kind(), ErrorKind::Requirements);
        assert_eq!(unreachable.kind(), ErrorKind::Routing);
    }

    #[test]
    fn delay_budget_covers_the_whole_route() {
        let (mut graph, ids) = with_nodes(&["a", "b", "c"]);
        let slow = Description::new().with(Property::Delay { ms: 15 });
        graph
            .insert_gate_link(&ids[0], &ids[1], link(&ids[0], 1, slow.clone()))
            .expect("a -> b");
        graph
            .insert_gate_link(&ids[1], &ids[2], link(&ids[1], 1, slow))
            .expect("b -> c");

        let tight = Description::new().with(Property::Delay { ms: 20 });
        let loose = Description::new().with(Property::Delay { ms: 30 });

        assert_eq!(
            graph.route(&ids[0], &ids[2], &tight).map_err(|err| err.kind()),
            Err(ErrorKind::Requirements)
        );
        assert_eq!(graph.route(&ids[0], &ids[2], &loose).map(|route| route.size()), Ok(2));
    }

    #[test]
    fn display_link_on_path_is_a_consistency_violation() {
        let (mut graph, ids) = with_nodes(&["a", "b"]);
        graph
            .insert_display_link(&ids[0], &ids[1], "cable")
            .expect("display link");

        let err = graph
            .route(&ids[0], &ids[1], &Description::new())
            .expect_err("cosmetic edge");

        assert_eq!(err.kind(), ErrorKind::Consistency);
    }
}
