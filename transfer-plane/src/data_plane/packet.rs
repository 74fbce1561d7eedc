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

//! Packets and their delivery outcome.

use crate::gate::GateId;
use crate::node::{ElementId, NodeId};
use crate::routing::Name;
use async_trait::async_trait;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Packet {
    id: Uuid,
    payload: Vec<u8>,
}

impl Packet {
    pub fn new(payload: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            payload,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}

/// Application binding of a forwarding node.
#[async_trait]
pub trait PacketHandler: Send + Sync {
    async fn on_packet(&self, node: NodeId, packet: Packet, last_hop: Option<ElementId>);
}

/// Where a forwarded packet ended up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// Handed to the node at the end of the route.
    Local { node: NodeId, gate_hops: usize },
    /// Reached an address segment leading into another routing domain.
    Boundary { exit: Name, gate_hops: usize },
    /// Left through a gate without a known next hop.
    Dropped {
        node: NodeId,
        gate: GateId,
        gate_hops: usize,
    },
}

impl Delivery {
    pub fn gate_hops(&self) -> usize {
        match self {
            Delivery::Local { gate_hops, .. }
            | Delivery::Boundary { gate_hops, .. }
            | Delivery::Dropped { gate_hops, .. } => *gate_hops,
        }
    }
}
