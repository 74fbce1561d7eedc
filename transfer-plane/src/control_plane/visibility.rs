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

//! Export rules for the routing-service mirror.
//!
//! A node is exported unless it is private to the transfer service and registered
//! without a visible name. A link is exported only if its source is an exported node and
//! it leads either to another exported node or, through a named remote gate, out of the
//! host. Links into display-only elements never leave the local graph.

use crate::control_plane::graph::TransferGraph;
use crate::gate::Gate;
use crate::node::{ElementId, ForwardingElement, ForwardingNode};
use crate::routing::NamingLevel;

pub(crate) fn exports_node(node: &ForwardingNode, level: NamingLevel) -> bool {
    !node.is_private_to_transfer() || level != NamingLevel::None
}

pub(crate) fn exports_link(
    graph: &TransferGraph,
    from: &ForwardingElement,
    target: &ElementId,
    gate: &Gate,
) -> bool {
    let ForwardingElement::Node(node) = from else {
        return false;
    };
    if !graph.is_exported(&node.id()) {
        return false;
    }
    match target {
        ElementId::Node(id) => graph.is_exported(id),
        ElementId::DevNull => gate.remote_name().is_some(),
        ElementId::PassThrough(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{exports_link, exports_node};
    use crate::control_plane::graph::TransferGraph;
    use crate::gate::{Gate, GateKind};
    use crate::node::{ElementId, ForwardingElement, ForwardingNode};
    use crate::routing::{Name, Namespace, NamingLevel};

    #[test]
    fn private_node_needs_a_visible_name() {
        let private = ForwardingNode::builder("relay").private_to_transfer(true).build();
        let public = ForwardingNode::builder("app").build();

        assert!(!exports_node(&private, NamingLevel::None));
        assert!(exports_node(&private, NamingLevel::Announces));
        assert!(exports_node(&public, NamingLevel::None));
    }

    #[test]
    fn links_follow_the_exported_endpoints() {
        let mut graph = TransferGraph::new();
        let exported = ForwardingNode::builder("app").build();
        let hidden = ForwardingNode::builder("relay").private_to_transfer(true).build();
        graph.add_element(ForwardingElement::Node(exported.clone()));
        graph.add_element(ForwardingElement::Node(hidden.clone()));
        graph.set_exported(exported.id());

        let from_exported = ForwardingElement::Node(exported.clone());
        let from_hidden = ForwardingElement::Node(hidden.clone());
        let local_gate = Gate::builder(GateKind::Horizontal)
            .next_hop(hidden.element_id())
            .build();
        let remote_gate = Gate::builder(GateKind::Down)
            .remote_name(Name::new(Namespace::new("fog"), "peer"))
            .build();
        let dangling_gate = Gate::builder(GateKind::Down).build();

        assert!(!exports_link(&graph, &from_exported, &hidden.element_id(), &local_gate));
        assert!(!exports_link(&graph, &from_hidden, &exported.element_id(), &local_gate));
        assert!(exports_link(&graph, &from_exported, &ElementId::DevNull, &remote_gate));
        assert!(!exports_link(&graph, &from_exported, &ElementId::DevNull, &dangling_gate));
        assert!(!exports_link(
            &graph,
            &from_exported,
            &ElementId::PassThrough("eth0".to_string()),
            &remote_gate
        ));

        graph.set_exported(hidden.id());
        assert!(exports_link(&graph, &from_exported, &hidden.element_id(), &local_gate));
    }
}
