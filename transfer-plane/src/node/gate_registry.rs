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

//! Per-node gate registry with monotonic gate numbering.

use crate::error::RegistryError;
use crate::gate::{Gate, GateBinding, GateId, GateKind};
use crate::node::NodeId;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

const GATE_REGISTRY_TAG: &str = "GateRegistry:";
const GATE_REGISTRY_FN_REGISTER_TAG: &str = "register():";
const GATE_REGISTRY_FN_REPLACE_TAG: &str = "replace():";
const GATE_REGISTRY_FN_UNREGISTER_TAG: &str = "unregister():";

#[derive(Default)]
struct RegistryEntries {
    gates: BTreeMap<GateId, Arc<Gate>>,
    reserved: BTreeSet<GateId>,
    next_free: u32,
}

pub(crate) struct GateRegistry {
    owner: NodeId,
    entries: RwLock<RegistryEntries>,
}

impl GateRegistry {
    pub(crate) fn new(owner: NodeId) -> Self {
        Self {
            owner,
            entries: RwLock::new(RegistryEntries::default()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryEntries> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryEntries> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn allocate(&self, entries: &mut RegistryEntries) -> Result<GateId, RegistryError> {
        if entries.next_free >= GateId::MAX {
            return Err(RegistryError::Exhausted {
                node: self.owner.to_string(),
            });
        }
        let gate_id = GateId::new(entries.next_free);
        entries.next_free += 1;
        Ok(gate_id)
    }

    fn ensure_unowned(gate: &Gate) -> Result<(), RegistryError> {
        match gate.binding() {
            Some(binding) => Err(RegistryError::AlreadyOwned {
                owner: binding.to_string(),
            }),
            None => Ok(()),
        }
    }

    fn bind(&self, gate_id: GateId, gate: &Gate) -> Result<(), RegistryError> {
        gate.bind(GateBinding {
            node: self.owner,
            gate: gate_id,
        })
    }

    pub(crate) fn register(&self, gate: Arc<Gate>) -> Result<GateId, RegistryError> {
        Self::ensure_unowned(&gate)?;

        let mut entries = self.write();
        let gate_id = self.allocate(&mut entries)?;
        self.bind(gate_id, &gate)?;
        entries.gates.insert(gate_id, gate);

        debug!(
            "{}:{} node {} registered gate {}",
            GATE_REGISTRY_TAG, GATE_REGISTRY_FN_REGISTER_TAG, self.owner, gate_id
        );
        Ok(gate_id)
    }

    pub(crate) fn reserve(&self) -> Result<GateId, RegistryError> {
        let mut entries = self.write();
        let gate_id = self.allocate(&mut entries)?;
        entries.reserved.insert(gate_id);
        Ok(gate_id)
    }

    pub(crate) fn register_reserved(
        &self,
        gate_id: GateId,
        gate: Arc<Gate>,
    ) -> Result<(), RegistryError> {
        Self::ensure_unowned(&gate)?;

        let mut entries = self.write();
        if entries.gates.contains_key(&gate_id) {
            return Err(RegistryError::DuplicateGateId {
                node: self.owner.to_string(),
                gate: gate_id,
            });
        }
        if !entries.reserved.remove(&gate_id) {
            return Err(RegistryError::NotReserved {
                node: self.owner.to_string(),
                gate: gate_id,
            });
        }
        if let Err(err) = self.bind(gate_id, &gate) {
            entries.reserved.insert(gate_id);
            return Err(err);
        }
        entries.gates.insert(gate_id, gate);

        debug!(
            "{}:{} node {} registered reserved gate {}",
            GATE_REGISTRY_TAG, GATE_REGISTRY_FN_REGISTER_TAG, self.owner, gate_id
        );
        Ok(())
    }

    /// Swaps `old` for `new`, which inherits the gate number of `old`.
    ///
    /// Both gates must lead to the same next hop and remote name.
    pub(crate) fn replace(&self, old: &Arc<Gate>, new: Arc<Gate>) -> Result<bool, RegistryError> {
        let Some(binding) = old.binding().filter(|binding| binding.node == self.owner) else {
            return Ok(false);
        };
        Self::ensure_unowned(&new)?;
        if old.next_hop() != new.next_hop() || old.remote_name() != new.remote_name() {
            return Err(RegistryError::EndpointMismatch {
                node: self.owner.to_string(),
                gate: binding.gate,
            });
        }

        let mut entries = self.write();
        match entries.gates.get(&binding.gate) {
            Some(current) if Arc::ptr_eq(current, old) => {}
            _ => return Ok(false),
        }
        self.bind(binding.gate, &new)?;
        entries.gates.insert(binding.gate, new);

        debug!(
            "{}:{} node {} replaced gate {}",
            GATE_REGISTRY_TAG, GATE_REGISTRY_FN_REPLACE_TAG, self.owner, binding.gate
        );
        Ok(true)
    }

    pub(crate) fn unregister(&self, gate: &Arc<Gate>) -> bool {
        let Some(binding) = gate.binding().filter(|binding| binding.node == self.owner) else {
            return false;
        };

        let mut entries = self.write();
        let removed = match entries.gates.get(&binding.gate) {
            Some(current) if Arc::ptr_eq(current, gate) => {
                entries.gates.remove(&binding.gate);
                true
            }
            _ => false,
        };

        debug!(
            "{}:{} node {} unregistered gate {}: {}",
            GATE_REGISTRY_TAG, GATE_REGISTRY_FN_UNREGISTER_TAG, self.owner, binding.gate, removed
        );
        removed
    }

    pub(crate) fn get(&self, gate_id: GateId) -> Option<Arc<Gate>> {
        self.read().gates.get(&gate_id).cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.read().gates.len()
    }

    pub(crate) fn iter(&self, filter: Option<GateKind>) -> GateIter<'_> {
        GateIter {
            registry: self,
            filter,
            cursor: None,
        }
    }
}

/// Lazy enumeration of the gates of one node.
///
/// Each step looks at the registry as it is at that moment, so gates removed
/// meanwhile are skipped and never reappear, and no lock is held between steps.
pub struct GateIter<'a> {
    registry: &'a GateRegistry,
    filter: Option<GateKind>,
    cursor: Option<GateId>,
}

impl GateIter<'_> {
    /// Starts over from the lowest gate number.
    pub fn restart(&mut self) {
        self.cursor = None;
    }
}

impl Iterator for GateIter<'_> {
    type Item = Arc<Gate>;

    fn next(&mut self) -> Option<Self::Item> {
        let entries = self.registry.read();
        let lower = match self.cursor {
            Some(cursor) => Bound::Excluded(cursor),
            None => Bound::Unbounded,
        };

        let (gate_id, gate) = entries
            .gates
            .range((lower, Bound::Unbounded))
            .find(|(_, gate)| self.filter.map_or(true, |kind| gate.kind() == kind))?;

        self.cursor = Some(*gate_id);
        Some(gate.clone())
    }
}
