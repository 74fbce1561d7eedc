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
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Notify;
use transfer_plane::{ElementId, NodeId, Packet, PacketHandler};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Received {
    pub node: NodeId,
    pub packet: Packet,
    pub last_hop: Option<ElementId>,
}

/// Packet handler that keeps every packet handed to it.
#[derive(Default)]
pub struct CollectingHandler {
    received: Mutex<Vec<Received>>,
    arrived: Notify,
}

impl CollectingHandler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn received(&self) -> Vec<Received> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolves once at least `count` packets arrived.
    pub async fn wait_for(&self, count: usize) {
        loop {
            let arrived = self.arrived.notified();
            if self.len() >= count {
                return;
            }
            arrived.await;
        }
    }
}

#[async_trait]
impl PacketHandler for CollectingHandler {
    async fn on_packet(&self, node: NodeId, packet: Packet, last_hop: Option<ElementId>) {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Received {
                node,
                packet,
                last_hop,
            });
        self.arrived.notify_waiters();
    }
}
