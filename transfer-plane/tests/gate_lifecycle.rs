use integration_test_utils::init_tracing;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use transfer_plane::{
    ForwardingNode, Gate, GateError, GateKind, GateState, Handshake,
};

fn deferred() -> Arc<Gate> {
    Gate::builder(GateKind::Down)
        .handshake(Handshake::Deferred)
        .build()
}

#[test]
fn second_initialise_is_a_contract_violation() {
    init_tracing();
    let gate = Gate::builder(GateKind::Transparent).build();

    assert_eq!(gate.initialise(), Ok(GateState::Operate));
    assert!(matches!(
        gate.initialise(),
        Err(GateError::AlreadyInitialised {
            state: GateState::Operate,
            ..
        })
    ));
    assert_eq!(gate.state(), GateState::Operate);
}

#[tokio::test]
async fn acknowledgement_from_another_thread_wakes_the_waiter() {
    init_tracing();
    let gate = deferred();
    assert_eq!(gate.initialise(), Ok(GateState::Init));

    let change = gate.wait_for_state_change(Duration::from_secs(5));
    let peer = gate.clone();
    let ack = thread::spawn(move || peer.complete_handshake(true));

    assert_eq!(change.await, Ok(GateState::Operate));
    assert_eq!(ack.join().expect("peer thread"), Ok(GateState::Operate));
    assert!(gate.is_ready_to_receive());
    assert!(gate.is_operational());
}

#[test]
fn shutdown_always_wins_against_pending_handshakes() {
    init_tracing();
    for _ in 0..64 {
        let gate = deferred();
        gate.initialise().expect("initialise");

        let peer = gate.clone();
        let ack = thread::spawn(move || peer.complete_handshake(true));
        let closer = gate.clone();
        let close = thread::spawn(move || closer.shutdown());

        ack.join().expect("ack thread").expect("ack accepted or ignored");
        close.join().expect("shutdown thread");

        assert_eq!(gate.state(), GateState::Deleted);
        assert_eq!(gate.complete_handshake(true), Ok(GateState::Deleted));
        assert!(gate.handle_payload().is_err());
    }
}

#[test]
fn repeated_shutdown_from_every_state_ends_deleted() {
    init_tracing();
    let fresh = deferred();
    let initialising = deferred();
    initialising.initialise().expect("initialise");
    let failed = deferred();
    failed.initialise().expect("initialise");
    failed.complete_handshake(false).expect("handshake failure");

    for gate in [fresh, initialising, failed] {
        assert_eq!(gate.shutdown(), GateState::Deleted);
        assert_eq!(gate.shutdown(), GateState::Deleted);
        assert!(gate.initialise().is_err());
    }
}

#[tokio::test]
async fn waiter_observes_only_the_next_transition() {
    init_tracing();
    let gate = deferred();
    let first = gate.wait_for_state_change(Duration::from_secs(5));
    gate.initialise().expect("initialise");
    let second = gate.wait_for_state_change(Duration::from_secs(5));
    gate.shutdown();

    assert_eq!(first.await, Ok(GateState::Init));
    assert_eq!(second.await, Ok(GateState::Shutdown));
    assert!(matches!(
        gate.wait_for_state_change(Duration::from_secs(5)).await,
        Err(GateError::Deleted { .. })
    ));
}

#[test]
fn message_counter_reads_and_resets_atomically() {
    let gate = Gate::builder(GateKind::Transparent).build();
    gate.initialise().expect("initialise");
    let workers: Vec<_> = (0..4)
        .map(|_| {
            let gate = gate.clone();
            thread::spawn(move || {
                for _ in 0..250 {
                    gate.handle_payload().expect("operational");
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("worker");
    }

    assert_eq!(gate.number_messages(true), 1000);
    assert_eq!(gate.number_messages(false), 0);
}

#[test]
fn concurrent_registrations_get_distinct_numbers() {
    let node = ForwardingNode::builder("mux").build();
    let workers: Vec<_> = (0..8)
        .map(|_| {
            let node = node.clone();
            thread::spawn(move || {
                let mut kept = Vec::new();
                for round in 0..50 {
                    let gate = Gate::builder(GateKind::Horizontal).build();
                    node.register_gate(gate.clone()).expect("gate id");
                    if round % 2 == 0 {
                        assert!(node.unregister_gate(&gate));
                    } else {
                        kept.push(gate);
                    }
                    for _ in node.gates(None) {}
                }
                kept
            })
        })
        .collect();

    let kept: Vec<Arc<Gate>> = workers
        .into_iter()
        .flat_map(|worker| worker.join().expect("worker"))
        .collect();
    let numbers: HashSet<_> = node.gates(None).filter_map(|gate| gate.gate_id()).collect();

    assert_eq!(kept.len(), 200);
    assert_eq!(node.number_of_gates(), 200);
    assert_eq!(numbers.len(), 200);
}

#[test]
fn iteration_skips_gates_removed_meanwhile() {
    let node = ForwardingNode::builder("mux").build();
    let gates: Vec<_> = (0..4)
        .map(|_| {
            let gate = Gate::builder(GateKind::Up).build();
            node.register_gate(gate.clone()).expect("gate id");
            gate
        })
        .collect();
    node.register_gate(Gate::builder(GateKind::Down).build())
        .expect("gate id");

    let mut iter = node.gates(Some(GateKind::Up));
    let first = iter.next().expect("first gate");
    assert!(node.unregister_gate(&gates[1]));
    let rest: Vec<_> = iter.by_ref().collect();

    assert_eq!(first.gate_id(), gates[0].gate_id());
    assert_eq!(rest.len(), 2);
    assert!(rest.iter().all(|gate| !Arc::ptr_eq(gate, &gates[1])));

    iter.restart();
    assert_eq!(iter.count(), 3);
}
