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

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;
use transfer_plane::{
    Description, ElementId, ForwardingNode, Gate, GateId, Identity, Name, Namespace,
    NamingLevel, NodeId, Route, RoutingService, TransferError,
};

const RECORDING_ROUTING_SERVICE_TAG: &str = "RecordingRoutingService:";

/// One call received by [`RecordingRoutingService`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoutingCall {
    RegisterNode {
        node: NodeId,
        name: Option<Name>,
        level: NamingLevel,
    },
    UpdateNode {
        node: NodeId,
        capabilities: Description,
    },
    UnregisterNode {
        node: NodeId,
    },
    RegisterLink {
        from: NodeId,
        gate: Option<GateId>,
        to: Option<ElementId>,
    },
    UnregisterLink {
        from: NodeId,
        gate: Option<GateId>,
    },
    GetRoute {
        source: NodeId,
        destination: Name,
    },
}

impl RoutingCall {
    /// Whether `node` appears anywhere in this call.
    pub fn mentions(&self, node: NodeId) -> bool {
        match self {
            RoutingCall::RegisterNode { node: id, .. }
            | RoutingCall::UpdateNode { node: id, .. }
            | RoutingCall::UnregisterNode { node: id }
            | RoutingCall::UnregisterLink { from: id, .. }
            | RoutingCall::GetRoute { source: id, .. } => *id == node,
            RoutingCall::RegisterLink { from, to, .. } => {
                *from == node || *to == Some(ElementId::Node(node))
            }
        }
    }
}

/// Routing service double that records every call.
///
/// Local names and remote routes are configured up front; registrations can be made to
/// fail on demand.
pub struct RecordingRoutingService {
    namespace: Namespace,
    calls: Mutex<Vec<RoutingCall>>,
    nodes: Mutex<HashSet<NodeId>>,
    links: Mutex<HashSet<(NodeId, GateId)>>,
    local: Mutex<HashMap<Name, Arc<ForwardingNode>>>,
    remote: Mutex<HashMap<Name, Route>>,
    refuse_nodes: AtomicBool,
    refuse_links: AtomicBool,
    fail_unregistrations: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RecordingRoutingService {
    pub fn new(namespace: Namespace) -> Arc<Self> {
        Arc::new(Self {
            namespace,
            calls: Mutex::new(Vec::new()),
            nodes: Mutex::new(HashSet::new()),
            links: Mutex::new(HashSet::new()),
            local: Mutex::new(HashMap::new()),
            remote: Mutex::new(HashMap::new()),
            refuse_nodes: AtomicBool::new(false),
            refuse_links: AtomicBool::new(false),
            fail_unregistrations: AtomicBool::new(false),
        })
    }

    pub fn calls(&self) -> Vec<RoutingCall> {
        lock(&self.calls).clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    /// Number of recorded calls matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&RoutingCall) -> bool) -> usize {
        lock(&self.calls).iter().filter(|call| predicate(call)).count()
    }

    /// Makes `name` resolve to `node` on this host.
    pub fn set_local(&self, name: Name, node: Arc<ForwardingNode>) {
        lock(&self.local).insert(name, node);
    }

    /// Answers delegated queries for `destination` with `route`.
    pub fn set_remote_route(&self, destination: Name, route: Route) {
        lock(&self.remote).insert(destination, route);
    }

    pub fn refuse_node_registrations(&self, refuse: bool) {
        self.refuse_nodes.store(refuse, Ordering::SeqCst);
    }

    pub fn refuse_link_registrations(&self, refuse: bool) {
        self.refuse_links.store(refuse, Ordering::SeqCst);
    }

    pub fn fail_unregistrations(&self, fail: bool) {
        self.fail_unregistrations.store(fail, Ordering::SeqCst);
    }

    fn record(&self, call: RoutingCall) {
        debug!("{} {:?}", RECORDING_ROUTING_SERVICE_TAG, call);
        lock(&self.calls).push(call);
    }

    fn refusal(flag: &AtomicBool, what: &str) -> Result<(), TransferError> {
        if flag.load(Ordering::SeqCst) {
            Err(TransferError::Network(format!("{what} refused")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RoutingService for RecordingRoutingService {
    fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    async fn register_node(
        &self,
        node: &Arc<ForwardingNode>,
        name: Option<&Name>,
        level: NamingLevel,
        _description: &Description,
    ) -> Result<(), TransferError> {
        self.record(RoutingCall::RegisterNode {
            node: node.id(),
            name: name.cloned(),
            level,
        });
        Self::refusal(&self.refuse_nodes, "node registration")?;
        lock(&self.nodes).insert(node.id());
        Ok(())
    }

    async fn update_node(
        &self,
        node: &Arc<ForwardingNode>,
        capabilities: &Description,
    ) -> Result<(), TransferError> {
        self.record(RoutingCall::UpdateNode {
            node: node.id(),
            capabilities: capabilities.clone(),
        });
        Ok(())
    }

    async fn unregister_node(&self, node: &Arc<ForwardingNode>) -> Result<bool, TransferError> {
        self.record(RoutingCall::UnregisterNode { node: node.id() });
        Self::refusal(&self.fail_unregistrations, "node removal")?;
        let id = node.id();
        lock(&self.links).retain(|(from, _)| *from != id);
        Ok(lock(&self.nodes).remove(&id))
    }

    async fn register_link(
        &self,
        from: &Arc<ForwardingNode>,
        gate: &Arc<Gate>,
    ) -> Result<(), TransferError> {
        self.record(RoutingCall::RegisterLink {
            from: from.id(),
            gate: gate.gate_id(),
            to: gate.next_hop().cloned(),
        });
        Self::refusal(&self.refuse_links, "link registration")?;
        if let Some(gate_id) = gate.gate_id() {
            lock(&self.links).insert((from.id(), gate_id));
        }
        Ok(())
    }

    async fn unregister_link(
        &self,
        from: &Arc<ForwardingNode>,
        gate: &Arc<Gate>,
    ) -> Result<bool, TransferError> {
        self.record(RoutingCall::UnregisterLink {
            from: from.id(),
            gate: gate.gate_id(),
        });
        Self::refusal(&self.fail_unregistrations, "link removal")?;
        Ok(gate
            .gate_id()
            .is_some_and(|gate_id| lock(&self.links).remove(&(from.id(), gate_id))))
    }

    async fn get_route(
        &self,
        source: &Arc<ForwardingNode>,
        destination: &Name,
        _requirements: &Description,
        _requester: &Identity,
    ) -> Result<Route, TransferError> {
        self.record(RoutingCall::GetRoute {
            source: source.id(),
            destination: destination.clone(),
        });
        lock(&self.remote)
            .get(destination)
            .cloned()
            .ok_or_else(|| TransferError::no_route(source.name(), destination))
    }

    async fn get_local_element(&self, destination: &Name) -> Option<Arc<ForwardingNode>> {
        lock(&self.local).get(destination).cloned()
    }

    fn number_vertices(&self) -> usize {
        lock(&self.nodes).len()
    }

    fn number_edges(&self) -> usize {
        lock(&self.links).len()
    }

    fn size(&self) -> usize {
        lock(&self.local).len() + lock(&self.remote).len()
    }
}
