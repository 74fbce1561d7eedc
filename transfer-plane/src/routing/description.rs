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

//! Capability descriptions and route requirements.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// A single capability or requirement.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Property {
    Bandwidth { kbit_per_s: u32 },
    Delay { ms: u32 },
    Lossless,
    Ordered,
}

/// A set of properties.
///
/// The same type describes what a gate or node provides and what a route request
/// requires. An empty description means best effort.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Description {
    properties: BTreeSet<Property>,
}

impl Description {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, property: Property) -> Self {
        self.properties.insert(property);
        self
    }

    pub fn insert(&mut self, property: Property) -> bool {
        self.properties.insert(property)
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter()
    }

    /// Declared bandwidth; `None` is unlimited for a gate and unconstrained for a request.
    pub fn bandwidth(&self) -> Option<u32> {
        self.properties
            .iter()
            .filter_map(|property| match property {
                Property::Bandwidth { kbit_per_s } => Some(*kbit_per_s),
                _ => None,
            })
            .max()
    }

    pub fn delay(&self) -> Option<u32> {
        self.properties
            .iter()
            .filter_map(|property| match property {
                Property::Delay { ms } => Some(*ms),
                _ => None,
            })
            .min()
    }

    pub fn lossless(&self) -> bool {
        self.properties.contains(&Property::Lossless)
    }

    pub fn ordered(&self) -> bool {
        self.properties.contains(&Property::Ordered)
    }

    /// Whether a single gate offering `provided` can carry traffic with these requirements.
    ///
    /// The delay requirement applies to a whole route and is not checked here.
    pub fn admits(&self, provided: &Description) -> bool {
        if let (Some(required), Some(offered)) = (self.bandwidth(), provided.bandwidth()) {
            if offered < required {
                return false;
            }
        }
        (!self.lossless() || provided.lossless()) && (!self.ordered() || provided.ordered())
    }

    /// Whether a route with the summed gate delay `total_ms` meets the delay requirement.
    pub fn within_delay(&self, total_ms: u64) -> bool {
        self.delay()
            .map_or(true, |budget| total_ms <= u64::from(budget))
    }
}

impl FromIterator<Property> for Description {
    fn from_iter<T: IntoIterator<Item = Property>>(iter: T) -> Self {
        Self {
            properties: iter.into_iter().collect(),
        }
    }
}

impl Display for Description {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.properties.is_empty() {
            return f.write_str("best-effort");
        }
        let rendered: Vec<String> = self
            .properties
            .iter()
            .map(|property| match property {
                Property::Bandwidth { kbit_per_s } => format!("bandwidth>={kbit_per_s}kbit/s"),
                Property::Delay { ms } => format!("delay<={ms}ms"),
                Property::Lossless => "lossless".to_string(),
                Property::Ordered => "ordered".to_string(),
            })
            .collect();
        write!(f, "{{{}}}", rendered.join(", "))
    }
}
