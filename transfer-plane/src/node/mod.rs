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

//! Forwarding elements.
//!
//! Owns the closed set of element variants the transfer plane knows about, the
//! [`ForwardingNode`] endpoint and its gate registry.

pub(crate) mod element;
pub(crate) mod forwarding_node;
pub(crate) mod gate_registry;

pub use element::{ElementId, ForwardingElement, NodeId};
pub use forwarding_node::{ForwardingNode, ForwardingNodeBuilder};
pub use gate_registry::GateIter;
