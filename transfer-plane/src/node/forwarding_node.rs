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

//! Addressable forwarding endpoint that owns gates.

use crate::data_plane::{Packet, PacketHandler};
use crate::error::RegistryError;
use crate::gate::{Gate, GateId, GateKind};
use crate::node::gate_registry::{GateIter, GateRegistry};
use crate::node::{ElementId, NodeId};
use crate::routing::{Description, Identity};
use arc_swap::ArcSwap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use tracing::debug;

const FORWARDING_NODE_TAG: &str = "ForwardingNode:";
const FORWARDING_NODE_FN_HANDLE_PACKET_TAG: &str = "handle_packet():";

pub struct ForwardingNode {
    id: NodeId,
    name: String,
    owner: Identity,
    private_to_transfer: bool,
    capabilities: ArcSwap<Description>,
    gates: GateRegistry,
    handler: Option<Arc<dyn PacketHandler>>,
}

pub struct ForwardingNodeBuilder {
    name: String,
    owner: Option<Identity>,
    private_to_transfer: bool,
    capabilities: Description,
    handler: Option<Arc<dyn PacketHandler>>,
}

impl ForwardingNodeBuilder {
    /// Defaults to an identity named after the node.
    pub fn owner(mut self, owner: Identity) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Private nodes are only exported when registered under a visible name.
    pub fn private_to_transfer(mut self, private: bool) -> Self {
        self.private_to_transfer = private;
        self
    }

    pub fn capabilities(mut self, capabilities: Description) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn handler(mut self, handler: Arc<dyn PacketHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn build(self) -> Arc<ForwardingNode> {
        let id = NodeId::random();
        let owner = self
            .owner
            .unwrap_or_else(|| Identity::new(self.name.as_str()));

        Arc::new(ForwardingNode {
            id,
            name: self.name,
            owner,
            private_to_transfer: self.private_to_transfer,
            capabilities: ArcSwap::from_pointee(self.capabilities),
            gates: GateRegistry::new(id),
            handler: self.handler,
        })
    }
}

impl ForwardingNode {
    pub fn builder(name: &str) -> ForwardingNodeBuilder {
        ForwardingNodeBuilder {
            name: name.to_string(),
            owner: None,
            private_to_transfer: false,
            capabilities: Description::default(),
            handler: None,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn element_id(&self) -> ElementId {
        ElementId::Node(self.id)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> &Identity {
        &self.owner
    }

    pub fn is_private_to_transfer(&self) -> bool {
        self.private_to_transfer
    }

    pub fn capabilities(&self) -> Arc<Description> {
        self.capabilities.load_full()
    }

    pub(crate) fn set_capabilities(&self, capabilities: Description) {
        self.capabilities.store(Arc::new(capabilities));
    }

    /// Binds `gate` to this node under a fresh gate number.
    pub fn register_gate(&self, gate: Arc<Gate>) -> Result<GateId, RegistryError> {
        self.gates.register(gate)
    }

    /// Binds `gate` under a number obtained from [`ForwardingNode::free_gate_number`].
    pub fn register_gate_as(&self, gate_id: GateId, gate: Arc<Gate>) -> Result<(), RegistryError> {
        self.gates.register_reserved(gate_id, gate)
    }

    /// Reserves a gate number ahead of registration.
    pub fn free_gate_number(&self) -> Result<GateId, RegistryError> {
        self.gates.reserve()
    }

    /// Returns `Ok(false)` if `old` is not registered here. A replacement leading to a
    /// different next hop or remote name is refused.
    ///
    /// Linked gates are replaced through [`crate::TransferPlane::replace_link`], which also
    /// refreshes the link description.
    pub fn replace_gate(&self, old: &Arc<Gate>, new: Arc<Gate>) -> Result<bool, RegistryError> {
        self.gates.replace(old, new)
    }

    /// Removes the binding only; shutting the gate down is up to the caller.
    pub fn unregister_gate(&self, gate: &Arc<Gate>) -> bool {
        self.gates.unregister(gate)
    }

    pub fn gate(&self, gate_id: GateId) -> Option<Arc<Gate>> {
        self.gates.get(gate_id)
    }

    pub fn gates(&self, filter: Option<GateKind>) -> GateIter<'_> {
        self.gates.iter(filter)
    }

    pub fn number_of_gates(&self) -> usize {
        self.gates.len()
    }

    /// Delivers a packet that reached this node at the end of a route.
    pub async fn handle_packet(&self, packet: Packet, last_hop: Option<ElementId>) {
        debug!(
            "{}:{} node {} received packet {} from {:?}",
            FORWARDING_NODE_TAG,
            FORWARDING_NODE_FN_HANDLE_PACKET_TAG,
            self.name,
            packet.id(),
            last_hop
        );
        if let Some(handler) = &self.handler {
            handler.on_packet(self.id, packet, last_hop).await;
        }
    }
}

impl Debug for ForwardingNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForwardingNode")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("private_to_transfer", &self.private_to_transfer)
            .field("gates", &self.gates.len())
            .finish_non_exhaustive()
    }
}
