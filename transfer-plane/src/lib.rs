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

//! # transfer-plane
//!
//! `transfer-plane` is the forwarding core of a gate-based network simulator. Every host
//! owns one [`TransferPlane`]: a local graph of [`ForwardingNode`]s connected through
//! [`Gate`]s, mirrored to a pluggable [`RoutingService`] as far as it is visible outside
//! the host.
//!
//! ## Quick start
//!
//! ```
//! use std::sync::Arc;
//! use routing_service_flat::FlatRoutingService;
//! use transfer_plane::{
//!     Description, ElementId, ForwardingElement, ForwardingNode, Gate, GateKind, Identity,
//!     Name, Namespace, NamingLevel, RouteSegment, TransferPlane,
//! };
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let namespace = Namespace::new("fog");
//! let routing = Arc::new(FlatRoutingService::new(namespace.clone(), "host-a"));
//! let plane = TransferPlane::new("host-a", routing);
//!
//! let app = ForwardingNode::builder("app").build();
//! let printer = ForwardingNode::builder("printer").build();
//! let printer_name = Name::new(namespace, "printer");
//! plane
//!     .register_node(&app, None, NamingLevel::None, &Description::new())
//!     .await
//!     .unwrap();
//! plane
//!     .register_node(&printer, Some(&printer_name), NamingLevel::Names, &Description::new())
//!     .await
//!     .unwrap();
//!
//! let gate = Gate::builder(GateKind::Horizontal)
//!     .next_hop(ElementId::Node(printer.id()))
//!     .build();
//! let gate_id = app.register_gate(gate.clone()).unwrap();
//! plane
//!     .register_link(&ForwardingElement::Node(app.clone()), &gate)
//!     .await
//!     .unwrap();
//!
//! let route = plane
//!     .get_route(&app, &printer_name, &Description::new(), &Identity::new("app"))
//!     .await
//!     .unwrap();
//! assert_eq!(route.first(), Some(&RouteSegment::Gate(gate_id)));
//! # });
//! ```
//!
//! ## Internal architecture map
//!
//! - Gate: gate identity, lifecycle state machine and handshake policy
//! - Node: element variants, forwarding nodes and their gate registries
//! - Routing: route segments, names, requirements, routing-service contract and search
//! - Control plane: the local graph and the export filter towards the routing service
//! - Data plane: hop-by-hop route replay and packet hand-off
//!
//! ## Observability model
//!
//! Library code emits `tracing` events with stable names from
//! [`observability::events`] and never installs a global subscriber. Binaries and tests
//! are responsible for one-time `tracing_subscriber` initialization. Route queries
//! additionally produce one [`observability::diagnostics::RouteRecord`] each.

mod control_plane;
mod data_plane;
mod error;
mod gate;
mod node;
pub mod observability;
mod routing;

mod transfer_plane;
pub use transfer_plane::TransferPlane;

pub use data_plane::{Delivery, Packet, PacketHandler};
pub use error::{ErrorKind, GateError, RegistryError, TransferError};
pub use gate::{
    Gate, GateBinding, GateBuilder, GateId, GateKind, GateState, Handshake, StateChange,
};
pub use node::{
    ElementId, ForwardingElement, ForwardingNode, ForwardingNodeBuilder, GateIter, NodeId,
};
pub use routing::search;
pub use routing::{
    Description, Identity, Name, NameParseError, Namespace, NamingLevel, Property, Route,
    RouteSegment, RoutingService,
};
