use integration_test_utils::{init_tracing, RecordingRoutingService, RoutingCall};
use std::sync::{Arc, Mutex};
use transfer_plane::observability::diagnostics::{
    DiagnosticsError, DiagnosticsSink, RouteMode, RouteRecord,
};
use transfer_plane::{
    Description, ElementId, ErrorKind, ForwardingElement, ForwardingNode, Gate, GateId, GateKind,
    Identity, Name, Namespace, NamingLevel, Property, Route, RouteSegment, TransferPlane,
};

fn fog(name: &str) -> Name {
    Name::new(Namespace::new("fog"), name)
}

#[derive(Default)]
struct CapturingDiagnostics {
    records: Mutex<Vec<RouteRecord>>,
}

impl DiagnosticsSink for CapturingDiagnostics {
    fn record(&self, record: &RouteRecord) -> Result<(), DiagnosticsError> {
        self.records.lock().expect("records lock").push(record.clone());
        Ok(())
    }
}

struct BrokenDiagnostics;

impl DiagnosticsSink for BrokenDiagnostics {
    fn record(&self, _record: &RouteRecord) -> Result<(), DiagnosticsError> {
        Err(DiagnosticsError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk full",
        )))
    }
}

struct Host {
    plane: TransferPlane,
    routing: Arc<RecordingRoutingService>,
    diagnostics: Arc<CapturingDiagnostics>,
}

impl Host {
    fn new() -> Self {
        init_tracing();
        let routing = RecordingRoutingService::new(Namespace::new("fog"));
        let diagnostics = Arc::new(CapturingDiagnostics::default());
        let plane =
            TransferPlane::new("host-a", routing.clone()).with_diagnostics(diagnostics.clone());
        Self {
            plane,
            routing,
            diagnostics,
        }
    }

    /// Registers a node that the routing service resolves locally under its own name.
    async fn node(&self, name: &str) -> Arc<ForwardingNode> {
        let node = ForwardingNode::builder(name).build();
        self.plane
            .register_node(&node, Some(&fog(name)), NamingLevel::Names, &Description::new())
            .await
            .expect("register node");
        self.routing.set_local(fog(name), node.clone());
        node
    }

    async fn link(
        &self,
        from: &Arc<ForwardingNode>,
        to: &Arc<ForwardingNode>,
        description: Description,
    ) -> Arc<Gate> {
        let gate = Gate::builder(GateKind::Horizontal)
            .next_hop(to.element_id())
            .description(description)
            .build();
        from.register_gate(gate.clone()).expect("gate id");
        self.plane
            .register_link(&ForwardingElement::Node(from.clone()), &gate)
            .await
            .expect("register link");
        gate
    }

    async fn route(&self, source: &Arc<ForwardingNode>, to: &str) -> Result<Route, ErrorKind> {
        self.route_with(source, to, &Description::new()).await
    }

    async fn route_with(
        &self,
        source: &Arc<ForwardingNode>,
        to: &str,
        requirements: &Description,
    ) -> Result<Route, ErrorKind> {
        self.plane
            .get_route(source, &fog(to), requirements, &Identity::new("tester"))
            .await
            .map_err(|err| err.kind())
    }
}

fn gate_route(gates: &[&Arc<Gate>]) -> Route {
    Route::from_gates(gates.iter().filter_map(|gate| gate.gate_id()))
}

#[tokio::test]
async fn single_link_yields_single_gate_route() {
    let host = Host::new();
    let x = host.node("x").await;
    let y = host.node("y").await;
    let g = host.link(&x, &y, Description::new()).await;

    let route = host.route(&x, "y").await.expect("route");

    assert_eq!(route, gate_route(&[&g]));
    assert_eq!(route.size(), 1);
}

#[tokio::test]
async fn unlinked_nodes_have_no_route() {
    let host = Host::new();
    let x = host.node("x").await;
    let y = host.node("y").await;
    let g = host.link(&x, &y, Description::new()).await;

    host.plane
        .unregister_link(&ForwardingElement::Node(x.clone()), &g)
        .await
        .expect("unlink");

    assert_eq!(host.route(&x, "y").await, Err(ErrorKind::Routing));
}

#[tokio::test]
async fn route_to_self_is_empty() {
    let host = Host::new();
    let x = host.node("x").await;

    let route = host.route(&x, "x").await.expect("route to self");

    assert!(route.is_empty());
    assert_eq!(route.size_number_gates(), 0);
}

#[tokio::test]
async fn unregistered_target_is_a_routing_error() {
    let host = Host::new();
    let x = host.node("x").await;
    let ghost = ForwardingNode::builder("ghost").build();
    host.routing.set_local(fog("ghost"), ghost.clone());

    let err = host
        .plane
        .internal_route(&x.element_id(), &ghost.element_id(), &Description::new())
        .await
        .expect_err("ghost is not a vertex");

    assert_eq!(err.kind(), ErrorKind::Routing);
    assert_eq!(host.route(&x, "ghost").await, Err(ErrorKind::Routing));
}

#[tokio::test]
async fn equal_length_routes_prefer_lowest_gate_numbers() {
    let host = Host::new();
    let x = host.node("x").await;
    let upper = host.node("upper").await;
    let lower = host.node("lower").await;
    let y = host.node("y").await;
    let reserved = x.free_gate_number().expect("reserve number");
    let via_upper = host.link(&x, &upper, Description::new()).await;
    let via_lower = Gate::builder(GateKind::Horizontal)
        .next_hop(lower.element_id())
        .build();
    x.register_gate_as(reserved, via_lower.clone())
        .expect("reserved number");
    host.plane
        .register_link(&ForwardingElement::Node(x.clone()), &via_lower)
        .await
        .expect("link");
    let upper_out = host.link(&upper, &y, Description::new()).await;
    let lower_out = host.link(&lower, &y, Description::new()).await;

    let route = host.route(&x, "y").await.expect("route");

    assert!(via_lower.gate_id() < via_upper.gate_id());
    assert_eq!(route, gate_route(&[&via_lower, &lower_out]));
    assert_ne!(route, gate_route(&[&via_upper, &upper_out]));
}

#[tokio::test]
async fn private_relay_is_used_for_local_destinations() {
    let host = Host::new();
    let x = host.node("x").await;
    let y = host.node("y").await;
    let relay = ForwardingNode::builder("relay")
        .private_to_transfer(true)
        .build();
    host.plane
        .register_node(&relay, None, NamingLevel::None, &Description::new())
        .await
        .expect("relay");
    let into_relay = host.link(&x, &relay, Description::new()).await;
    let out_of_relay = host.link(&relay, &y, Description::new()).await;

    let route = host.route(&x, "y").await.expect("route through relay");

    assert_eq!(route, gate_route(&[&into_relay, &out_of_relay]));
    assert_eq!(
        host.routing
            .count(|call| matches!(call, RoutingCall::GetRoute { .. })),
        0
    );
}

#[tokio::test]
async fn requirements_select_a_longer_route() {
    let host = Host::new();
    let x = host.node("x").await;
    let relay = host.node("relay").await;
    let y = host.node("y").await;
    host.link(&x, &y, Description::new()).await;
    let lossless = Description::new().with(Property::Lossless);
    let first = host.link(&x, &relay, lossless.clone()).await;
    let second = host.link(&relay, &y, lossless.clone()).await;

    assert_eq!(host.route(&x, "y").await.map(|route| route.size()), Ok(1));
    assert_eq!(
        host.route_with(&x, "y", &lossless).await,
        Ok(gate_route(&[&first, &second]))
    );
}

#[tokio::test]
async fn unsatisfiable_requirements_are_not_a_missing_route() {
    let host = Host::new();
    let x = host.node("x").await;
    let y = host.node("y").await;
    host.link(
        &x,
        &y,
        Description::new().with(Property::Bandwidth { kbit_per_s: 64 }),
    )
    .await;

    let broadband = Description::new().with(Property::Bandwidth { kbit_per_s: 10_000 });

    assert_eq!(
        host.route_with(&x, "y", &broadband).await,
        Err(ErrorKind::Requirements)
    );
    assert_eq!(
        host.route_with(&y, "x", &broadband).await,
        Err(ErrorKind::Routing)
    );
}

#[tokio::test]
async fn cosmetic_link_on_the_path_is_a_consistency_violation() {
    let host = Host::new();
    let x = host.node("x").await;
    let y = host.node("y").await;
    host.plane
        .register_display_link(&x.element_id(), &y.element_id(), "drawn by hand")
        .await
        .expect("display link");

    assert_eq!(host.route(&x, "y").await, Err(ErrorKind::Consistency));
}

#[tokio::test]
async fn non_local_destination_is_delegated_unchanged() {
    let host = Host::new();
    let x = host.node("x").await;
    let mut remote = Route::new();
    remote.add_last(RouteSegment::Address(fog("host-a")));
    remote.add_last(RouteSegment::Gate(GateId::new(3)));
    remote.add_last(RouteSegment::Address(fog("host-b")));
    host.routing.set_remote_route(fog("printer-b"), remote.clone());

    assert_eq!(host.route(&x, "printer-b").await, Ok(remote));
    assert_eq!(host.route(&x, "nowhere").await, Err(ErrorKind::Routing));
    assert_eq!(
        host.routing
            .count(|call| matches!(call, RoutingCall::GetRoute { .. })),
        2
    );
}

#[tokio::test]
async fn every_query_is_recorded_once() {
    let host = Host::new();
    let x = host.node("x").await;
    let y = host.node("y").await;
    host.link(&x, &y, Description::new()).await;

    host.route(&x, "y").await.expect("internal");
    host.route(&x, "remote").await.expect_err("delegated");

    let records = host.diagnostics.records.lock().expect("records lock").clone();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].mode, RouteMode::Internal);
    assert!(records[0].success);
    assert_eq!((records[0].gate_hops, records[0].segments), (1, 1));
    assert_eq!(records[0].vertices, host.plane.number_vertices().await);
    assert_eq!(records[1].mode, RouteMode::Delegated);
    assert!(!records[1].success);
    assert_eq!((records[1].gate_hops, records[1].segments), (0, 0));
    assert_eq!(records[1].destination, "fog://remote");
}

#[tokio::test]
async fn failing_diagnostics_never_change_the_result() {
    init_tracing();
    let routing = RecordingRoutingService::new(Namespace::new("fog"));
    let plane =
        TransferPlane::new("host-a", routing.clone()).with_diagnostics(Arc::new(BrokenDiagnostics));
    let x = ForwardingNode::builder("x").build();
    plane
        .register_node(&x, Some(&fog("x")), NamingLevel::Names, &Description::new())
        .await
        .expect("register");
    routing.set_local(fog("x"), x.clone());

    let route = plane
        .get_route(&x, &fog("x"), &Description::new(), &Identity::new("tester"))
        .await;

    assert_eq!(route, Ok(Route::new()));
    assert!(plane.contains(&ElementId::Node(x.id())).await);
}

#[tokio::test]
async fn returned_routes_survive_topology_changes() {
    let host = Host::new();
    let x = host.node("x").await;
    let y = host.node("y").await;
    let g = host.link(&x, &y, Description::new()).await;
    let route = host.route(&x, "y").await.expect("route");

    host.plane.unregister_node(&y).await.expect("unregister");

    assert_eq!(route, gate_route(&[&g]));
    assert_eq!(host.route(&x, "y").await, Err(ErrorKind::Routing));
}
