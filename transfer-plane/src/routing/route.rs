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

//! Route segment model.

use crate::gate::GateId;
use crate::routing::Name;
use std::collections::VecDeque;
use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RouteSegment {
    /// Traverse this gate of the current node.
    Gate(GateId),
    /// Boundary marker towards another routing domain.
    Address(Name),
}

impl Display for RouteSegment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteSegment::Gate(gate_id) => write!(f, "G{gate_id}"),
            RouteSegment::Address(name) => write!(f, "{name}"),
        }
    }
}

/// Ordered sequence of route segments.
///
/// A route is a value: once returned from a query it does not change with the topology
/// that produced it, though replaying it may fail later.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Route {
    segments: VecDeque<RouteSegment>,
}

impl Route {
    /// The empty route, reaching the source itself.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_gates(gates: impl IntoIterator<Item = GateId>) -> Self {
        gates.into_iter().map(RouteSegment::Gate).collect()
    }

    pub fn add_first(&mut self, segment: RouteSegment) {
        self.segments.push_front(segment);
    }

    pub fn add_last(&mut self, segment: RouteSegment) {
        self.segments.push_back(segment);
    }

    /// Appends all segments of `other`.
    pub fn append(&mut self, other: Route) {
        self.segments.extend(other.segments);
    }

    /// Number of segments, address markers included.
    pub fn size(&self) -> usize {
        self.segments.len()
    }

    /// Number of actual forwarding hops.
    pub fn size_number_gates(&self) -> usize {
        self.gate_ids().count()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn first(&self) -> Option<&RouteSegment> {
        self.segments.front()
    }

    pub fn last(&self) -> Option<&RouteSegment> {
        self.segments.back()
    }

    pub fn segments(&self) -> impl Iterator<Item = &RouteSegment> {
        self.segments.iter()
    }

    pub fn gate_ids(&self) -> impl Iterator<Item = GateId> + '_ {
        self.segments.iter().filter_map(|segment| match segment {
            RouteSegment::Gate(gate_id) => Some(*gate_id),
            RouteSegment::Address(_) => None,
        })
    }

    /// `true` if the route contains gate segments only.
    pub fn is_local(&self) -> bool {
        self.segments
            .iter()
            .all(|segment| matches!(segment, RouteSegment::Gate(_)))
    }
}

impl FromIterator<RouteSegment> for Route {
    fn from_iter<T: IntoIterator<Item = RouteSegment>>(iter: T) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Route {
    type Item = &'a RouteSegment;
    type IntoIter = std::collections::vec_deque::Iter<'a, RouteSegment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

impl Display for Route {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let rendered: Vec<String> = self.segments.iter().map(ToString::to_string).collect();
        write!(f, "[{}]", rendered.join(", "))
    }
}
