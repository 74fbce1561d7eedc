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

//! Stable event names carried in the `event` field of tracing records.

pub const NODE_REGISTERED: &str = "node_registered";
pub const NODE_ALREADY_PRESENT: &str = "node_already_present";
pub const NODE_EXPORT_SKIPPED: &str = "node_export_skipped";
pub const NODE_REGISTER_ROLLBACK: &str = "node_register_rollback";
pub const NODE_UPDATED: &str = "node_updated";
pub const NODE_UNREGISTERED: &str = "node_unregistered";

pub const LINK_REGISTERED: &str = "link_registered";
pub const LINK_REGISTER_ROLLBACK: &str = "link_register_rollback";
pub const LINK_UNREGISTERED: &str = "link_unregistered";
pub const LINK_UNREGISTER_MISSING: &str = "link_unregister_missing";
pub const LINK_REPLACED: &str = "link_replaced";
pub const DISPLAY_LINK_REGISTERED: &str = "display_link_registered";

pub const ROUTE_RESOLVED: &str = "route_resolved";
pub const ROUTE_FAILED: &str = "route_failed";

pub const ROUTING_SERVICE_SYNC_FAILED: &str = "routing_service_sync_failed";
pub const DIAGNOSTICS_SINK_FAILED: &str = "diagnostics_sink_failed";
pub const CONSISTENCY_VIOLATION: &str = "consistency_violation";

pub const GATE_STATE_CHANGED: &str = "gate_state_changed";
pub const GATE_ACK_IGNORED: &str = "gate_ack_ignored";
pub const GATE_FAILED: &str = "gate_failed";
pub const GATE_CONTRACT_VIOLATION: &str = "gate_contract_violation";

pub const PACKET_DELIVERED: &str = "packet_delivered";
pub const PACKET_AT_BOUNDARY: &str = "packet_at_boundary";
pub const PACKET_DROPPED: &str = "packet_dropped";
