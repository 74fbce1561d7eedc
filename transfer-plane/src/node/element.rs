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

//! Element identities and the closed element variant set.

use crate::node::ForwardingNode;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;
use uuid::Uuid;

/// Identity of a [`ForwardingNode`], unique across hosts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(Uuid);

impl NodeId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Index-style reference to a graph element.
///
/// Gates refer to their next hop through this value instead of holding a pointer.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ElementId {
    Node(NodeId),
    /// Opaque display-only element such as a physical link terminus.
    PassThrough(String),
    /// The shared "dev/null" sink for gates without a known next hop.
    DevNull,
}

impl Display for ElementId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ElementId::Node(id) => write!(f, "node:{id}"),
            ElementId::PassThrough(name) => write!(f, "pass-through:{name}"),
            ElementId::DevNull => f.write_str("dev/null"),
        }
    }
}

/// A vertex of the transfer-plane graph.
#[derive(Clone)]
pub enum ForwardingElement {
    Node(Arc<ForwardingNode>),
    PassThrough(String),
    DevNull,
}

impl ForwardingElement {
    pub fn id(&self) -> ElementId {
        match self {
            ForwardingElement::Node(node) => ElementId::Node(node.id()),
            ForwardingElement::PassThrough(name) => ElementId::PassThrough(name.clone()),
            ForwardingElement::DevNull => ElementId::DevNull,
        }
    }

    pub fn as_node(&self) -> Option<&Arc<ForwardingNode>> {
        match self {
            ForwardingElement::Node(node) => Some(node),
            _ => None,
        }
    }
}

impl From<Arc<ForwardingNode>> for ForwardingElement {
    fn from(node: Arc<ForwardingNode>) -> Self {
        ForwardingElement::Node(node)
    }
}

impl Debug for ForwardingElement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ForwardingElement::Node(node) => f
                .debug_tuple("Node")
                .field(&node.name())
                .field(&node.id())
                .finish(),
            ForwardingElement::PassThrough(name) => f.debug_tuple("PassThrough").field(name).finish(),
            ForwardingElement::DevNull => f.write_str("DevNull"),
        }
    }
}
