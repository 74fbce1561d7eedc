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

//! Routing layer.
//!
//! Holds the route segment model, the naming and requirement vocabulary shared with
//! routing services, the [`RoutingService`] contract itself and the deterministic
//! shortest-path search used for intra-host routes.
//!
//! ```
//! use transfer_plane::{GateId, Name, Namespace, Route, RouteSegment};
//!
//! let namespace = Namespace::new("fog");
//! let mut route = Route::from_gates([GateId::new(4), GateId::new(7)]);
//! route.add_first(RouteSegment::Address(Name::new(namespace.clone(), "host-a")));
//! route.add_last(RouteSegment::Address(Name::new(namespace, "printer")));
//!
//! assert_eq!(route.size(), 4);
//! assert_eq!(route.size_number_gates(), 2);
//! ```

pub(crate) mod description;
pub(crate) mod name;
pub(crate) mod route;
pub mod search;
pub(crate) mod service;

pub use description::{Description, Property};
pub use name::{Identity, Name, NameParseError, Namespace, NamingLevel};
pub use route::{Route, RouteSegment};
pub use service::RoutingService;
