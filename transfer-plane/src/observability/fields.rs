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

//! Field formatting helpers for tracing events.

use crate::node::{ElementId, ForwardingNode};
use crate::routing::{Name, Route};

pub fn format_node(node: &ForwardingNode) -> String {
    format!("{}({})", node.name(), node.id())
}

pub fn format_element(element: &ElementId) -> String {
    element.to_string()
}

pub fn format_name(name: Option<&Name>) -> String {
    name.map_or_else(|| "<unnamed>".to_string(), ToString::to_string)
}

pub fn format_route(route: &Route) -> String {
    route.to_string()
}

#[cfg(test)]
mod tests {
    use super::{format_name, format_node};
    use crate::node::ForwardingNode;
    use crate::routing::{Name, Namespace};

    #[test]
    fn node_field_carries_name_and_id() {
        let node = ForwardingNode::builder("app").build();

        assert_eq!(format_node(&node), format!("app({})", node.id()));
    }

    #[test]
    fn missing_name_is_rendered_explicitly() {
        let name = Name::new(Namespace::new("fog"), "app");

        assert_eq!(format_name(None), "<unnamed>");
        assert_eq!(format_name(Some(&name)), "fog://app");
    }
}
