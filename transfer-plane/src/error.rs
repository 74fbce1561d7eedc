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

//! Caller-visible error taxonomy.

use crate::gate::{GateId, GateState};
use std::time::Duration;
use thiserror::Error;

/// Violations of the gate lifecycle contract.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GateError {
    #[error("gate {gate} was already initialised (state {state})")]
    AlreadyInitialised { gate: String, state: GateState },
    #[error("gate {gate} has not been initialised yet")]
    NotInitialised { gate: String },
    #[error("gate {gate} is not operational (state {state})")]
    NotOperational { gate: String, state: GateState },
    #[error("gate {gate} is deleted")]
    Deleted { gate: String },
    #[error("no state change of gate {gate} within {waited:?}")]
    Timeout { gate: String, waited: Duration },
    #[error("gate {gate} was dropped before changing state")]
    WaiterDropped { gate: String },
}

/// Failures of a forwarding node's gate registry.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("gate numbers of node {node} are exhausted")]
    Exhausted { node: String },
    #[error("gate number {gate} is already in use on node {node}")]
    DuplicateGateId { node: String, gate: GateId },
    #[error("gate number {gate} was not reserved on node {node}")]
    NotReserved { node: String, gate: GateId },
    #[error("gate is already owned by {owner}")]
    AlreadyOwned { owner: String },
    #[error("replacement of gate {gate} on node {node} leads elsewhere")]
    EndpointMismatch { node: String, gate: GateId },
}

/// Classification of a [`TransferError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No path exists or a routing precondition is violated.
    Routing,
    /// The destination exists but not under the requested requirements.
    Requirements,
    /// Link registration failed.
    Network,
    /// An internal invariant was broken elsewhere.
    Consistency,
    Gate,
    Registry,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransferError {
    #[error("no route from {from} to {to}")]
    NoRoute { from: String, to: String },
    #[error("{0} is not registered")]
    UnknownElement(String),
    #[error("routing failed: {0}")]
    Routing(String),
    #[error("{destination} is reachable but no route satisfies {requirements}")]
    Requirements {
        destination: String,
        requirements: String,
    },
    #[error("gate {gate} names {name}, which is not an address of namespace {namespace}")]
    RemoteNameMismatch {
        gate: String,
        name: String,
        namespace: String,
    },
    #[error("network failure: {0}")]
    Network(String),
    #[error("internal consistency violation: {0}")]
    Consistency(String),
    #[error(transparent)]
    Gate(#[from] GateError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl TransferError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransferError::NoRoute { .. }
            | TransferError::UnknownElement(_)
            | TransferError::Routing(_) => ErrorKind::Routing,
            TransferError::Requirements { .. } => ErrorKind::Requirements,
            TransferError::RemoteNameMismatch { .. } | TransferError::Network(_) => {
                ErrorKind::Network
            }
            TransferError::Consistency(_) => ErrorKind::Consistency,
            TransferError::Gate(_) => ErrorKind::Gate,
            TransferError::Registry(_) => ErrorKind::Registry,
        }
    }

    pub fn no_route(from: impl ToString, to: impl ToString) -> Self {
        TransferError::NoRoute {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, RegistryError, TransferError};
    use crate::gate::GateId;

    #[test]
    fn kinds_separate_unreachable_from_unsatisfiable() {
        let unreachable = TransferError::no_route("x", "y");
        let unsatisfiable = TransferError::Requirements {
            destination: "y".to_string(),
            requirements: "lossless".to_string(),
        };

        assert_eq!(unreachable.kind(), ErrorKind::Routing);
        assert_eq!(unsatisfiable.kind(), ErrorKind::Requirements);
    }

    #[test]
    fn registry_errors_convert_transparently() {
        let err: TransferError = RegistryError::DuplicateGateId {
            node: "x".to_string(),
            gate: GateId::new(3),
        }
        .into();

        assert_eq!(err.kind(), ErrorKind::Registry);
        assert_eq!(err.to_string(), "gate number 3 is already in use on node x");
    }
}
