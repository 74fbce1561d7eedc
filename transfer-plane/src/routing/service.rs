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

//! Contract of a pluggable routing service.

use crate::error::TransferError;
use crate::gate::Gate;
use crate::node::ForwardingNode;
use crate::routing::{Description, Identity, Name, Namespace, NamingLevel, Route};
use async_trait::async_trait;
use std::sync::Arc;

/// Resolves destination names to routes and mirrors the exported topology of a host.
///
/// The transfer plane calls the registration methods for externally visible elements
/// only. Implementations answer from local or administrative state; services living out
/// of process apply their own timeouts.
#[async_trait]
pub trait RoutingService: Send + Sync {
    /// Namespace of the addresses this service understands.
    fn namespace(&self) -> &Namespace;

    async fn register_node(
        &self,
        node: &Arc<ForwardingNode>,
        name: Option<&Name>,
        level: NamingLevel,
        description: &Description,
    ) -> Result<(), TransferError>;

    async fn update_node(
        &self,
        node: &Arc<ForwardingNode>,
        capabilities: &Description,
    ) -> Result<(), TransferError>;

    /// Drops the node together with all of its name bindings.
    async fn unregister_node(&self, node: &Arc<ForwardingNode>) -> Result<bool, TransferError>;

    async fn register_link(
        &self,
        from: &Arc<ForwardingNode>,
        gate: &Arc<Gate>,
    ) -> Result<(), TransferError>;

    async fn unregister_link(
        &self,
        from: &Arc<ForwardingNode>,
        gate: &Arc<Gate>,
    ) -> Result<bool, TransferError>;

    async fn get_route(
        &self,
        source: &Arc<ForwardingNode>,
        destination: &Name,
        requirements: &Description,
        requester: &Identity,
    ) -> Result<Route, TransferError>;

    /// Returns the node of this host that `destination` names, if any.
    async fn get_local_element(&self, destination: &Name) -> Option<Arc<ForwardingNode>>;

    fn number_vertices(&self) -> usize;

    fn number_edges(&self) -> usize;

    /// Implementation-defined size of the service's state, for diagnostics.
    fn size(&self) -> usize;
}
