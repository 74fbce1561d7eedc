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

//! Gate layer.
//!
//! A gate is one directed hop of a forwarding path. It is owned by exactly one
//! [`crate::ForwardingNode`] and moves through an explicit lifecycle:
//!
//! ```text
//! START -> INIT -> OPERATE <-> ERROR
//! START | INIT | OPERATE | ERROR -> SHUTDOWN -> DELETED
//! ```
//!
//! ```
//! use transfer_plane::{Gate, GateKind, GateState, Handshake};
//!
//! let gate = Gate::builder(GateKind::Transparent)
//!     .handshake(Handshake::Immediate)
//!     .build();
//!
//! assert_eq!(gate.initialise().unwrap(), GateState::Operate);
//! assert!(gate.initialise().is_err());
//! assert_eq!(gate.shutdown(), GateState::Deleted);
//! ```

pub(crate) mod identity;
pub(crate) mod lifecycle;
pub(crate) mod state;

pub use identity::{GateBinding, GateId, GateKind};
pub use lifecycle::{Gate, GateBuilder, Handshake, StateChange};
pub use state::GateState;
