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

//! The gate lifecycle state machine.

use crate::error::{GateError, RegistryError};
use crate::gate::identity::{GateBinding, GateId, GateKind};
use crate::gate::state::GateState;
use crate::node::ElementId;
use crate::observability::events;
use crate::routing::{Description, Name};
use futures::future::{BoxFuture, FutureExt};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, warn};

const COMPONENT: &str = "gate";

/// Resolves with the next state a gate enters, or fails on timeout.
pub type StateChange = BoxFuture<'static, Result<GateState, GateError>>;

/// How a gate leaves `INIT`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Handshake {
    /// Operational as soon as it is initialised.
    #[default]
    Immediate,
    /// Stays in `INIT` until [`Gate::complete_handshake`] is called.
    Deferred,
}

struct GateCell {
    state: GateState,
    waiters: Vec<oneshot::Sender<GateState>>,
}

pub struct Gate {
    kind: GateKind,
    handshake: Handshake,
    next_hop: Option<ElementId>,
    remote_name: Option<Name>,
    description: Description,
    binding: OnceLock<GateBinding>,
    cell: Mutex<GateCell>,
    messages: AtomicU64,
}

pub struct GateBuilder {
    kind: GateKind,
    handshake: Handshake,
    next_hop: Option<ElementId>,
    remote_name: Option<Name>,
    description: Description,
}

impl GateBuilder {
    pub fn handshake(mut self, handshake: Handshake) -> Self {
        self.handshake = handshake;
        self
    }

    pub fn next_hop(mut self, next_hop: ElementId) -> Self {
        self.next_hop = Some(next_hop);
        self
    }

    /// Name of the remote destination this gate leads to.
    pub fn remote_name(mut self, name: Name) -> Self {
        self.remote_name = Some(name);
        self
    }

    pub fn description(mut self, description: Description) -> Self {
        self.description = description;
        self
    }

    pub fn build(self) -> Arc<Gate> {
        Arc::new(Gate {
            kind: self.kind,
            handshake: self.handshake,
            next_hop: self.next_hop,
            remote_name: self.remote_name,
            description: self.description,
            binding: OnceLock::new(),
            cell: Mutex::new(GateCell {
                state: GateState::Start,
                waiters: Vec::new(),
            }),
            messages: AtomicU64::new(0),
        })
    }
}

impl Gate {
    pub fn builder(kind: GateKind) -> GateBuilder {
        GateBuilder {
            kind,
            handshake: Handshake::default(),
            next_hop: None,
            remote_name: None,
            description: Description::default(),
        }
    }

    pub fn kind(&self) -> GateKind {
        self.kind
    }

    /// Next hop of this gate; `None` means the gate leads nowhere known.
    pub fn next_hop(&self) -> Option<&ElementId> {
        self.next_hop.as_ref()
    }

    pub fn remote_name(&self) -> Option<&Name> {
        self.remote_name.as_ref()
    }

    pub fn description(&self) -> &Description {
        &self.description
    }

    pub fn binding(&self) -> Option<GateBinding> {
        self.binding.get().copied()
    }

    pub fn gate_id(&self) -> Option<GateId> {
        self.binding().map(|binding| binding.gate)
    }

    pub(crate) fn bind(&self, binding: GateBinding) -> Result<(), RegistryError> {
        self.binding
            .set(binding)
            .map_err(|_| RegistryError::AlreadyOwned {
                owner: self.label(),
            })
    }

    pub(crate) fn label(&self) -> String {
        match self.binding.get() {
            Some(binding) => binding.to_string(),
            None => format!("unbound-{:?}", self.kind),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GateCell> {
        self.cell.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, cell: &mut GateCell, next: GateState) {
        debug_assert!(cell.state.can_transition_to(next));
        let previous = cell.state;
        cell.state = next;
        debug!(
            event = events::GATE_STATE_CHANGED,
            component = COMPONENT,
            gate = %self.label(),
            from = %previous,
            to = %next,
            "gate changed state"
        );
        for waiter in cell.waiters.drain(..) {
            // a waiter that timed out has dropped its receiver
            let _ = waiter.send(next);
        }
    }

    pub fn state(&self) -> GateState {
        self.lock().state
    }

    pub fn is_ready_to_receive(&self) -> bool {
        self.state().is_operational()
    }

    pub fn is_operational(&self) -> bool {
        self.state().is_operational()
    }

    /// Moves the gate out of `START`.
    ///
    /// Must be called exactly once, after the gate was linked into the graph. Returns the
    /// state reached before returning, which is `OPERATE` for [`Handshake::Immediate`] and
    /// `INIT` for [`Handshake::Deferred`].
    pub fn initialise(&self) -> Result<GateState, GateError> {
        let mut cell = self.lock();
        if cell.state != GateState::Start {
            warn!(
                event = events::GATE_CONTRACT_VIOLATION,
                component = COMPONENT,
                gate = %self.label(),
                state = %cell.state,
                "initialise() called on a gate past START"
            );
            return Err(GateError::AlreadyInitialised {
                gate: self.label(),
                state: cell.state,
            });
        }

        self.transition(&mut cell, GateState::Init);
        if self.handshake == Handshake::Immediate {
            self.transition(&mut cell, GateState::Operate);
        }
        Ok(cell.state)
    }

    /// Reports the outcome of the peer handshake.
    ///
    /// Moves `INIT` or `ERROR` to `OPERATE` on success and to `ERROR` on failure.
    /// Acknowledgements arriving after [`Gate::shutdown`] are ignored.
    pub fn complete_handshake(&self, success: bool) -> Result<GateState, GateError> {
        let mut cell = self.lock();
        match (cell.state, success) {
            (GateState::Start, _) => Err(GateError::NotInitialised { gate: self.label() }),
            (GateState::Shutdown | GateState::Deleted, _) => {
                debug!(
                    event = events::GATE_ACK_IGNORED,
                    component = COMPONENT,
                    gate = %self.label(),
                    state = %cell.state,
                    "ignoring handshake result after shutdown"
                );
                Ok(cell.state)
            }
            (GateState::Init | GateState::Error, true) => {
                self.transition(&mut cell, GateState::Operate);
                Ok(cell.state)
            }
            (GateState::Init | GateState::Operate, false) => {
                self.transition(&mut cell, GateState::Error);
                Ok(cell.state)
            }
            (GateState::Operate, true) | (GateState::Error, false) => Ok(cell.state),
        }
    }

    /// Puts an operating gate into `ERROR`.
    pub fn fail(&self, reason: &str) -> Result<GateState, GateError> {
        let mut cell = self.lock();
        match cell.state {
            GateState::Start => Err(GateError::NotInitialised { gate: self.label() }),
            GateState::Init | GateState::Operate => {
                warn!(
                    event = events::GATE_FAILED,
                    component = COMPONENT,
                    gate = %self.label(),
                    reason,
                    "gate failed"
                );
                self.transition(&mut cell, GateState::Error);
                Ok(cell.state)
            }
            GateState::Error | GateState::Shutdown | GateState::Deleted => Ok(cell.state),
        }
    }

    /// Releases the gate. Always ends in `DELETED`; repeated calls are no-ops.
    pub fn shutdown(&self) -> GateState {
        let mut cell = self.lock();
        if cell.state.is_closing() {
            return cell.state;
        }
        self.transition(&mut cell, GateState::Shutdown);
        self.transition(&mut cell, GateState::Deleted);
        cell.state
    }

    /// Subscribes once to the next state transition.
    ///
    /// The subscription is taken when this method is called, so a transition happening
    /// before the returned future is first polled is still observed.
    pub fn wait_for_state_change(&self, max_wait: Duration) -> StateChange {
        let label = self.label();
        let receiver = {
            let mut cell = self.lock();
            if cell.state == GateState::Deleted {
                return futures::future::ready(Err(GateError::Deleted { gate: label })).boxed();
            }
            let (sender, receiver) = oneshot::channel();
            cell.waiters.push(sender);
            receiver
        };

        async move {
            match tokio::time::timeout(max_wait, receiver).await {
                Ok(Ok(state)) => Ok(state),
                Ok(Err(_)) => Err(GateError::WaiterDropped { gate: label }),
                Err(_) => Err(GateError::Timeout {
                    gate: label,
                    waited: max_wait,
                }),
            }
        }
        .boxed()
    }

    /// Counts one payload message; only legal while `OPERATE`.
    pub fn handle_payload(&self) -> Result<u64, GateError> {
        let cell = self.lock();
        if !cell.state.is_operational() {
            return Err(GateError::NotOperational {
                gate: self.label(),
                state: cell.state,
            });
        }
        Ok(self.messages.fetch_add(1, Ordering::AcqRel) + 1)
    }

    pub fn number_messages(&self, reset: bool) -> u64 {
        if reset {
            self.messages.swap(0, Ordering::AcqRel)
        } else {
            self.messages.load(Ordering::Acquire)
        }
    }
}

impl std::fmt::Debug for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gate")
            .field("binding", &self.binding.get())
            .field("kind", &self.kind)
            .field("state", &self.state())
            .field("next_hop", &self.next_hop)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::{Gate, Handshake};
    use crate::error::GateError;
    use crate::gate::{GateKind, GateState};
    use std::time::Duration;

    fn deferred_gate() -> std::sync::Arc<Gate> {
        Gate::builder(GateKind::Horizontal)
            .handshake(Handshake::Deferred)
            .build()
    }

    #[test]
    fn second_initialise_is_rejected() {
        let gate = Gate::builder(GateKind::Transparent).build();

        assert_eq!(gate.initialise(), Ok(GateState::Operate));
        assert!(matches!(
            gate.initialise(),
            Err(GateError::AlreadyInitialised {
                state: GateState::Operate,
                ..
            })
        ));
    }

    #[test]
    fn deferred_gate_waits_for_acknowledgement() {
        let gate = deferred_gate();

        assert_eq!(gate.initialise(), Ok(GateState::Init));
        assert!(!gate.is_operational());
        assert_eq!(gate.complete_handshake(true), Ok(GateState::Operate));
        assert!(gate.is_ready_to_receive());
    }

    #[test]
    fn failed_handshake_can_be_retried() {
        let gate = deferred_gate();
        gate.initialise().expect("first initialise");

        assert_eq!(gate.complete_handshake(false), Ok(GateState::Error));
        assert_eq!(gate.complete_handshake(true), Ok(GateState::Operate));
    }

    #[test]
    fn acknowledgement_before_initialise_is_rejected() {
        let gate = deferred_gate();

        assert!(matches!(
            gate.complete_handshake(true),
            Err(GateError::NotInitialised { .. })
        ));
        assert_eq!(gate.state(), GateState::Start);
    }

    #[test]
    fn shutdown_wins_over_late_acknowledgement() {
        let gate = deferred_gate();
        gate.initialise().expect("first initialise");

        assert_eq!(gate.shutdown(), GateState::Deleted);
        assert_eq!(gate.complete_handshake(true), Ok(GateState::Deleted));
        assert_eq!(gate.state(), GateState::Deleted);
    }

    #[test]
    fn shutdown_is_idempotent_from_every_state() {
        let never_started = deferred_gate();
        let erroneous = deferred_gate();
        erroneous.initialise().expect("initialise");
        erroneous.fail("link lost").expect("fail");

        for gate in [never_started, erroneous] {
            assert_eq!(gate.shutdown(), GateState::Deleted);
            assert_eq!(gate.shutdown(), GateState::Deleted);
        }
    }

    #[test]
    fn payload_is_only_counted_while_operating() {
        let gate = deferred_gate();
        gate.initialise().expect("initialise");
        assert!(gate.handle_payload().is_err());

        gate.complete_handshake(true).expect("ack");
        assert_eq!(gate.handle_payload(), Ok(1));
        assert_eq!(gate.handle_payload(), Ok(2));
        assert_eq!(gate.number_messages(true), 2);
        assert_eq!(gate.number_messages(false), 0);

        gate.shutdown();
        assert!(gate.handle_payload().is_err());
    }

    #[tokio::test]
    async fn waiter_observes_next_transition() {
        let gate = deferred_gate();
        gate.initialise().expect("initialise");

        let change = gate.wait_for_state_change(Duration::from_secs(1));
        gate.complete_handshake(true).expect("ack");

        assert_eq!(change.await, Ok(GateState::Operate));
    }

    #[tokio::test(start_paused = true)]
    async fn waiter_times_out_without_transition() {
        let gate = deferred_gate();
        gate.initialise().expect("initialise");

        let change = gate.wait_for_state_change(Duration::from_millis(50));

        assert!(matches!(change.await, Err(GateError::Timeout { .. })));
        assert_eq!(gate.state(), GateState::Init);
    }

    #[tokio::test]
    async fn waiting_on_deleted_gate_fails_immediately() {
        let gate = deferred_gate();
        gate.shutdown();

        let change = gate.wait_for_state_change(Duration::from_secs(10));

        assert!(matches!(change.await, Err(GateError::Deleted { .. })));
    }
}
