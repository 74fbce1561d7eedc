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

//! Hop-by-hop replay of a route over the local graph.

use crate::control_plane::graph::TransferGraph;
use crate::data_plane::Delivery;
use crate::error::TransferError;
use crate::node::{ElementId, ForwardingNode};
use crate::observability::{events, fields};
use crate::routing::{Route, RouteSegment};
use std::sync::Arc;
use tracing::{debug, error};

const COMPONENT: &str = "route_walker";

/// Outcome of a walk; `receiver` is set when the packet must be handed to a node.
pub(crate) struct Walk {
    pub(crate) delivery: Delivery,
    pub(crate) receiver: Option<(Arc<ForwardingNode>, Option<ElementId>)>,
}

/// Follows `route` from `source`, counting the packet on every gate it traverses.
///
/// A leading address segment marks the entry into this domain and is skipped; any other
/// address segment ends the walk at the domain boundary.
pub(crate) fn walk(
    graph: &TransferGraph,
    source: &Arc<ForwardingNode>,
    route: &Route,
) -> Result<Walk, TransferError> {
    if !graph.contains(&source.element_id()) {
        return Err(TransferError::UnknownElement(fields::format_node(source)));
    }

    let mut current = source.clone();
    let mut last_hop = None;
    let mut gate_hops = 0;
    let last_position = route.size().saturating_sub(1);

    for (position, segment) in route.segments().enumerate() {
        match segment {
            RouteSegment::Address(_) if position == 0 && position != last_position => continue,
            RouteSegment::Address(exit) => {
                debug!(
                    event = events::PACKET_AT_BOUNDARY,
                    component = COMPONENT,
                    node = %fields::format_node(&current),
                    exit = %exit,
                    gate_hops,
                    "packet reached routing domain boundary"
                );
                return Ok(Walk {
                    delivery: Delivery::Boundary {
                        exit: exit.clone(),
                        gate_hops,
                    },
                    receiver: None,
                });
            }
            RouteSegment::Gate(gate_id) => {
                let gate = current.gate(*gate_id).ok_or_else(|| {
                    TransferError::Routing(format!(
                        "stale route {}: node {} has no gate {}",
                        fields::format_route(route),
                        fields::format_node(&current),
                        gate_id
                    ))
                })?;
                gate.handle_payload()?;
                gate_hops += 1;

                match gate.next_hop() {
                    None | Some(ElementId::DevNull) => {
                        debug!(
                            event = events::PACKET_DROPPED,
                            component = COMPONENT,
                            node = %fields::format_node(&current),
                            gate = %gate_id,
                            "packet left through a gate without next hop"
                        );
                        return Ok(Walk {
                            delivery: Delivery::Dropped {
                                node: current.id(),
                                gate: *gate_id,
                                gate_hops,
                            },
                            receiver: None,
                        });
                    }
                    Some(ElementId::Node(next)) => {
                        let next = graph.node(next).ok_or_else(|| {
                            TransferError::UnknownElement(ElementId::Node(*next).to_string())
                        })?;
                        last_hop = Some(current.element_id());
                        current = next;
                    }
                    Some(ElementId::PassThrough(name)) => {
                        error!(
                            event = events::CONSISTENCY_VIOLATION,
                            component = COMPONENT,
                            gate = %gate_id,
                            element = %name,
                            "route leads into a display-only element"
                        );
                        return Err(TransferError::Consistency(format!(
                            "gate {gate_id} of {} leads into display-only element {name}",
                            fields::format_node(&current)
                        )));
                    }
                }
            }
        }
    }

    debug!(
        event = events::PACKET_DELIVERED,
        component = COMPONENT,
        node = %fields::format_node(&current),
        gate_hops,
        "packet reached end of route"
    );
    Ok(Walk {
        delivery: Delivery::Local {
            node: current.id(),
            gate_hops,
        },
        receiver: Some((current, last_hop)),
    })
}
