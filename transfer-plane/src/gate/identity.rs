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

//! Gate numbering and classification.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Node-local gate number.
///
/// Numbers are allocated monotonically per node and never handed out twice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GateId(u32);

impl GateId {
    /// Hard allocation limit per node.
    pub const MAX: u32 = i32::MAX as u32;

    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u32 {
        self.0
    }
}

impl Display for GateId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of a gate, used to filter a node's gate registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateKind {
    /// Forwards within one host without any processing.
    Transparent,
    /// Connects peers on the same layer.
    Horizontal,
    /// Leads directly onto a lower layer link.
    DirectDown,
    Down,
    Up,
    /// Applies a function (encryption, ordering, ...) to the traffic.
    Functional,
}

/// Ownership record written into a gate when a node registers it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GateBinding {
    pub node: NodeId,
    pub gate: GateId,
}

impl Display for GateBinding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.node, self.gate)
    }
}
