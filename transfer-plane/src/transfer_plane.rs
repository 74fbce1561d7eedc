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

//! Host-local transfer plane: local graph, export filter and route resolution.

use crate::control_plane::graph::{GateLink, TransferGraph};
use crate::control_plane::visibility;
use crate::data_plane::route_walker;
use crate::data_plane::{Delivery, Packet};
use crate::error::TransferError;
use crate::gate::Gate;
use crate::node::{ElementId, ForwardingElement, ForwardingNode, NodeId};
use crate::observability::diagnostics::{
    DiagnosticsSink, NoopDiagnostics, RouteMode, RouteRecord,
};
use crate::observability::{events, fields};
use crate::routing::{Description, Identity, Name, NamingLevel, Route, RoutingService};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

const TRANSFER_PLANE_TAG: &str = "TransferPlane:";
const TRANSFER_PLANE_FN_REGISTER_NODE_TAG: &str = "register_node():";
const TRANSFER_PLANE_FN_UPDATE_NODE_TAG: &str = "update_node():";
const TRANSFER_PLANE_FN_UNREGISTER_NODE_TAG: &str = "unregister_node():";
const TRANSFER_PLANE_FN_REGISTER_LINK_TAG: &str = "register_link():";
const TRANSFER_PLANE_FN_UNREGISTER_LINK_TAG: &str = "unregister_link():";
const TRANSFER_PLANE_FN_REPLACE_LINK_TAG: &str = "replace_link():";
const TRANSFER_PLANE_FN_GET_ROUTE_TAG: &str = "get_route():";

const COMPONENT: &str = "transfer_plane";

/// Per-host registry of forwarding elements and the links between them.
///
/// Every mutation of the local graph that is visible outside the host is mirrored to the
/// [`RoutingService`]. If the service rejects a registration, the local change is rolled
/// back so both sides stay consistent. Removals always succeed locally.
pub struct TransferPlane {
    name: String,
    graph: RwLock<TransferGraph>,
    routing_service: Arc<dyn RoutingService>,
    diagnostics: Arc<dyn DiagnosticsSink>,
}

impl TransferPlane {
    pub fn new(name: &str, routing_service: Arc<dyn RoutingService>) -> Self {
        Self {
            name: name.to_string(),
            graph: RwLock::new(TransferGraph::new()),
            routing_service,
            diagnostics: Arc::new(NoopDiagnostics),
        }
    }

    /// Replaces the sink receiving one record per [`TransferPlane::get_route`] call.
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Host name used in logs and diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn routing_service(&self) -> &Arc<dyn RoutingService> {
        &self.routing_service
    }

    /// Adds `node` to the local graph and, unless it stays graph-private, to the routing
    /// service.
    ///
    /// Registering a present node again does not duplicate the vertex but still forwards the
    /// additional name to the routing service. If the routing service fails, a vertex added
    /// by this call is removed again.
    pub async fn register_node(
        &self,
        node: &Arc<ForwardingNode>,
        name: Option<&Name>,
        level: NamingLevel,
        description: &Description,
    ) -> Result<(), TransferError> {
        let mut graph = self.graph.write().await;
        self.register_node_locked(&mut graph, node, name, level, description)
            .await
    }

    async fn register_node_locked(
        &self,
        graph: &mut TransferGraph,
        node: &Arc<ForwardingNode>,
        name: Option<&Name>,
        level: NamingLevel,
        description: &Description,
    ) -> Result<(), TransferError> {
        debug!(
            "{}:{}:{} registering {} as {}",
            self.name,
            TRANSFER_PLANE_TAG,
            TRANSFER_PLANE_FN_REGISTER_NODE_TAG,
            fields::format_node(node),
            fields::format_name(name)
        );

        let added = graph.add_element(ForwardingElement::Node(node.clone()));
        if !added {
            debug!(
                event = events::NODE_ALREADY_PRESENT,
                component = COMPONENT,
                host = %self.name,
                node = %fields::format_node(node),
                "node already in local graph"
            );
        }

        if !visibility::exports_node(node, level) {
            debug!(
                event = events::NODE_EXPORT_SKIPPED,
                component = COMPONENT,
                host = %self.name,
                node = %fields::format_node(node),
                "graph-private node kept local"
            );
            return Ok(());
        }

        if let Err(err) = self
            .routing_service
            .register_node(node, name, level, description)
            .await
        {
            if added {
                graph.remove_element(&node.element_id());
            }
            warn!(
                event = events::NODE_REGISTER_ROLLBACK,
                component = COMPONENT,
                host = %self.name,
                node = %fields::format_node(node),
                removed_vertex = added,
                err = %err,
                "routing service rejected node"
            );
            return Err(err);
        }

        graph.set_exported(node.id());
        info!(
            event = events::NODE_REGISTERED,
            component = COMPONENT,
            host = %self.name,
            node = %fields::format_node(node),
            name = %fields::format_name(name),
            level = ?level,
            "node registered"
        );
        Ok(())
    }

    /// Publishes new capabilities of `node`, registering it first if it is unknown.
    ///
    /// The node keeps its previous capabilities if the routing service refuses them.
    pub async fn update_node(
        &self,
        node: &Arc<ForwardingNode>,
        capabilities: Description,
    ) -> Result<(), TransferError> {
        let mut graph = self.graph.write().await;

        if !graph.contains(&node.element_id()) {
            debug!(
                "{}:{}:{} {} unknown, registering it implicitly",
                self.name,
                TRANSFER_PLANE_TAG,
                TRANSFER_PLANE_FN_UPDATE_NODE_TAG,
                fields::format_node(node)
            );
            self.register_node_locked(&mut graph, node, None, NamingLevel::None, &capabilities)
                .await?;
            node.set_capabilities(capabilities);
            return Ok(());
        }

        if graph.is_exported(&node.id()) {
            self.routing_service
                .update_node(node, &capabilities)
                .await?;
        }
        node.set_capabilities(capabilities.clone());
        debug!(
            event = events::NODE_UPDATED,
            component = COMPONENT,
            host = %self.name,
            node = %fields::format_node(node),
            capabilities = %capabilities,
            "node capabilities updated"
        );
        Ok(())
    }

    /// Removes `node` and all links touching it. Returns `false` if it was not registered.
    ///
    /// A routing-service failure is logged; the local removal stands.
    pub async fn unregister_node(&self, node: &Arc<ForwardingNode>) -> Result<bool, TransferError> {
        let mut graph = self.graph.write().await;
        let exported = graph.is_exported(&node.id());
        if graph.remove_element(&node.element_id()).is_none() {
            debug!(
                "{}:{}:{} {} not registered",
                self.name,
                TRANSFER_PLANE_TAG,
                TRANSFER_PLANE_FN_UNREGISTER_NODE_TAG,
                fields::format_node(node)
            );
            return Ok(false);
        }

        if exported {
            if let Err(err) = self.routing_service.unregister_node(node).await {
                warn!(
                    event = events::ROUTING_SERVICE_SYNC_FAILED,
                    component = COMPONENT,
                    host = %self.name,
                    node = %fields::format_node(node),
                    err = %err,
                    "routing service kept a node removed locally"
                );
            }
        }

        info!(
            event = events::NODE_UNREGISTERED,
            component = COMPONENT,
            host = %self.name,
            node = %fields::format_node(node),
            exported,
            "node unregistered"
        );
        Ok(true)
    }

    /// Adds the link formed by `gate` of `from` towards the gate's next hop.
    ///
    /// Gates without a next hop lead to dev/null. A named pass-through next hop is added
    /// to the graph on first use. Links visible outside the host are forwarded to the
    /// routing service and removed again if it fails.
    pub async fn register_link(
        &self,
        from: &ForwardingElement,
        gate: &Arc<Gate>,
    ) -> Result<(), TransferError> {
        let binding = gate.binding().ok_or_else(|| {
            TransferError::Consistency(format!("{} is not owned by any node", gate.label()))
        })?;
        match from {
            ForwardingElement::Node(node) if node.id() != binding.node => {
                return Err(TransferError::Consistency(format!(
                    "gate {binding} does not belong to {}",
                    fields::format_node(node)
                )));
            }
            ForwardingElement::DevNull => {
                return Err(TransferError::Consistency(
                    "dev/null has no outgoing gates".to_string(),
                ));
            }
            _ => {}
        }

        if let Some(remote) = gate.remote_name() {
            let namespace = self.routing_service.namespace();
            if remote.namespace() != namespace {
                return Err(TransferError::RemoteNameMismatch {
                    gate: binding.to_string(),
                    name: remote.to_string(),
                    namespace: namespace.to_string(),
                });
            }
        }

        let from_id = from.id();
        let target = gate.next_hop().cloned().unwrap_or(ElementId::DevNull);
        debug!(
            "{}:{}:{} {} via gate {} to {}",
            self.name,
            TRANSFER_PLANE_TAG,
            TRANSFER_PLANE_FN_REGISTER_LINK_TAG,
            from_id,
            binding.gate,
            target
        );

        let mut graph = self.graph.write().await;
        if !graph.contains(&from_id) {
            return Err(TransferError::UnknownElement(from_id.to_string()));
        }
        let added_pass_through = match &target {
            ElementId::PassThrough(name) => {
                graph.add_element(ForwardingElement::PassThrough(name.clone()))
            }
            _ => false,
        };

        let exported = visibility::exports_link(&graph, from, &target, gate);
        if let Err(err) = graph.insert_gate_link(
            &from_id,
            &target,
            GateLink {
                owner: from_id.clone(),
                gate: binding.gate,
                description: gate.description().clone(),
                exported,
            },
        ) {
            if added_pass_through {
                graph.remove_element(&target);
            }
            return Err(err);
        }

        if let (true, Some(node)) = (exported, from.as_node()) {
            if let Err(err) = self.routing_service.register_link(node, gate).await {
                graph.remove_gate_link(&from_id, binding.gate);
                warn!(
                    event = events::LINK_REGISTER_ROLLBACK,
                    component = COMPONENT,
                    host = %self.name,
                    gate = %binding,
                    err = %err,
                    "routing service rejected link"
                );
                return Err(err);
            }
        }

        info!(
            event = events::LINK_REGISTERED,
            component = COMPONENT,
            host = %self.name,
            gate = %binding,
            target = %fields::format_element(&target),
            exported,
            "link registered"
        );
        Ok(())
    }

    /// Removes the link of `gate`. Returns `false`, without contacting the routing
    /// service, if no such link is registered.
    pub async fn unregister_link(
        &self,
        from: &ForwardingElement,
        gate: &Arc<Gate>,
    ) -> Result<bool, TransferError> {
        let Some(gate_id) = gate.gate_id() else {
            return Ok(false);
        };
        let from_id = from.id();

        let mut graph = self.graph.write().await;
        let Some(link) = graph.remove_gate_link(&from_id, gate_id) else {
            debug!(
                event = events::LINK_UNREGISTER_MISSING,
                component = COMPONENT,
                host = %self.name,
                element = %from_id,
                gate = %gate_id,
                "no such link"
            );
            return Ok(false);
        };

        if let (true, Some(node)) = (link.exported, from.as_node()) {
            if let Err(err) = self.routing_service.unregister_link(node, gate).await {
                warn!(
                    event = events::ROUTING_SERVICE_SYNC_FAILED,
                    component = COMPONENT,
                    host = %self.name,
                    element = %from_id,
                    gate = %gate_id,
                    err = %err,
                    "routing service kept a link removed locally"
                );
            }
        }

        debug!(
            "{}:{}:{} removed gate {} of {}",
            self.name, TRANSFER_PLANE_TAG, TRANSFER_PLANE_FN_UNREGISTER_LINK_TAG, gate_id, from_id
        );
        info!(
            event = events::LINK_UNREGISTERED,
            component = COMPONENT,
            host = %self.name,
            element = %from_id,
            gate = %gate_id,
            "link unregistered"
        );
        Ok(true)
    }

    /// Swaps the linked gate `old` of `from` for `new`, which keeps the gate number and the
    /// next hop. The link takes over the description of `new`.
    ///
    /// Returns `false` if `old` is not registered on `from`. A routing-service failure is
    /// logged; the local replacement stands.
    pub async fn replace_link(
        &self,
        from: &Arc<ForwardingNode>,
        old: &Arc<Gate>,
        new: Arc<Gate>,
    ) -> Result<bool, TransferError> {
        let from_id = from.element_id();
        let mut graph = self.graph.write().await;
        if !from.replace_gate(old, new.clone())? {
            return Ok(false);
        }
        let Some(binding) = new.binding() else {
            return Err(TransferError::Consistency(format!(
                "{} lost its binding during replacement",
                new.label()
            )));
        };

        let Some(previous) = graph.remove_gate_link(&from_id, binding.gate) else {
            debug!(
                "{}:{}:{} gate {} of {} was not linked",
                self.name,
                TRANSFER_PLANE_TAG,
                TRANSFER_PLANE_FN_REPLACE_LINK_TAG,
                binding.gate,
                from_id
            );
            return Ok(true);
        };
        let target = new.next_hop().cloned().unwrap_or(ElementId::DevNull);
        graph.insert_gate_link(
            &from_id,
            &target,
            GateLink {
                description: new.description().clone(),
                ..previous
            },
        )?;

        if previous.exported {
            let synced = match self.routing_service.unregister_link(from, old).await {
                Ok(_) => self.routing_service.register_link(from, &new).await,
                Err(err) => Err(err),
            };
            if let Err(err) = synced {
                warn!(
                    event = events::ROUTING_SERVICE_SYNC_FAILED,
                    component = COMPONENT,
                    host = %self.name,
                    gate = %binding,
                    err = %err,
                    "routing service kept the replaced link"
                );
            }
        }

        info!(
            event = events::LINK_REPLACED,
            component = COMPONENT,
            host = %self.name,
            gate = %binding,
            description = %new.description(),
            "link replaced"
        );
        Ok(true)
    }

    /// Adds a display-only element. Returns `false` if it is already present.
    pub async fn register_pass_through(&self, name: &str) -> bool {
        self.graph
            .write()
            .await
            .add_element(ForwardingElement::PassThrough(name.to_string()))
    }

    /// Adds a cosmetic link that is rendered but never routed over.
    pub async fn register_display_link(
        &self,
        from: &ElementId,
        to: &ElementId,
        label: &str,
    ) -> Result<(), TransferError> {
        self.graph
            .write()
            .await
            .insert_display_link(from, to, label)?;
        debug!(
            event = events::DISPLAY_LINK_REGISTERED,
            component = COMPONENT,
            host = %self.name,
            from = %from,
            to = %to,
            label,
            "display link registered"
        );
        Ok(())
    }

    /// Resolves a route from `source` to `destination`.
    ///
    /// Destinations the routing service maps to a node of this host are searched in the
    /// local graph, so graph-private elements stay reachable; all others are delegated.
    /// Every call produces one diagnostics record.
    pub async fn get_route(
        &self,
        source: &Arc<ForwardingNode>,
        destination: &Name,
        requirements: &Description,
        requester: &Identity,
    ) -> Result<Route, TransferError> {
        let local = self.routing_service.get_local_element(destination).await;
        let (mode, result, vertices, edges, size) = match local {
            Some(target) => {
                debug!(
                    "{}:{}:{} {} is local node {}",
                    self.name,
                    TRANSFER_PLANE_TAG,
                    TRANSFER_PLANE_FN_GET_ROUTE_TAG,
                    destination,
                    fields::format_node(&target)
                );
                let graph = self.graph.read().await;
                let result =
                    graph.route(&source.element_id(), &target.element_id(), requirements);
                (
                    RouteMode::Internal,
                    result,
                    graph.vertex_count(),
                    graph.edge_count(),
                    graph.vertex_count(),
                )
            }
            None => {
                let result = self
                    .routing_service
                    .get_route(source, destination, requirements, requester)
                    .await;
                (
                    RouteMode::Delegated,
                    result,
                    self.routing_service.number_vertices(),
                    self.routing_service.number_edges(),
                    self.routing_service.size(),
                )
            }
        };

        match &result {
            Ok(route) => info!(
                event = events::ROUTE_RESOLVED,
                component = COMPONENT,
                host = %self.name,
                source = %fields::format_node(source),
                destination = %destination,
                requester = %requester,
                mode = ?mode,
                route = %fields::format_route(route),
                "route resolved"
            ),
            Err(err) => warn!(
                event = events::ROUTE_FAILED,
                component = COMPONENT,
                host = %self.name,
                source = %fields::format_node(source),
                destination = %destination,
                requester = %requester,
                mode = ?mode,
                kind = ?err.kind(),
                err = %err,
                "route query failed"
            ),
        }

        let record = RouteRecord {
            timestamp: Utc::now(),
            host: self.name.clone(),
            source: fields::format_node(source),
            destination: destination.to_string(),
            mode,
            vertices,
            edges,
            size,
            gate_hops: result.as_ref().map_or(0, Route::size_number_gates),
            segments: result.as_ref().map_or(0, Route::size),
            success: result.is_ok(),
        };
        if let Err(err) = self.diagnostics.record(&record) {
            warn!(
                event = events::DIAGNOSTICS_SINK_FAILED,
                component = COMPONENT,
                host = %self.name,
                err = %err,
                "route diagnostics record dropped"
            );
        }

        result
    }

    /// Searches the local graph only, including graph-private elements.
    pub async fn internal_route(
        &self,
        source: &ElementId,
        target: &ElementId,
        requirements: &Description,
    ) -> Result<Route, TransferError> {
        self.graph.read().await.route(source, target, requirements)
    }

    /// Replays `route` from `source` and hands `packet` to the node it ends at.
    pub async fn forward(
        &self,
        source: &Arc<ForwardingNode>,
        route: &Route,
        packet: Packet,
    ) -> Result<Delivery, TransferError> {
        let walk = {
            let graph = self.graph.read().await;
            route_walker::walk(&graph, source, route)?
        };
        if let Some((receiver, last_hop)) = walk.receiver {
            receiver.handle_packet(packet, last_hop).await;
        }
        Ok(walk.delivery)
    }

    /// Number of local vertices, dev/null and display-only elements included.
    pub async fn number_vertices(&self) -> usize {
        self.graph.read().await.vertex_count()
    }

    pub async fn number_edges(&self) -> usize {
        self.graph.read().await.edge_count()
    }

    pub async fn contains(&self, element: &ElementId) -> bool {
        self.graph.read().await.contains(element)
    }

    /// Whether `node` is mirrored to the routing service.
    pub async fn is_exported(&self, node: &NodeId) -> bool {
        self.graph.read().await.is_exported(node)
    }

    /// Ids of all local vertices.
    pub async fn elements(&self) -> Vec<ElementId> {
        self.graph
            .read()
            .await
            .elements()
            .map(ForwardingElement::id)
            .collect()
    }
}
