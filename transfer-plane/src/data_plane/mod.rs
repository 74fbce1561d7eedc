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

//! Data-plane layer.
//!
//! Replays a resolved [`crate::Route`] hop by hop. Every traversed gate must be
//! operational and counts the packet; the walk ends at the final node's
//! [`PacketHandler`], at a routing-domain boundary, or at dev/null.

pub(crate) mod packet;
pub(crate) mod route_walker;

pub use packet::{Delivery, Packet, PacketHandler};
