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

//! Test doubles shared by the workspace's integration tests.

mod collecting_handler;
mod recording_routing_service;
mod tracing_init;

pub use collecting_handler::{CollectingHandler, Received};
pub use recording_routing_service::{RecordingRoutingService, RoutingCall};
pub use tracing_init::init_tracing;
