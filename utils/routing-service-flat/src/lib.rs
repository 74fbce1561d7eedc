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

//! Single-domain routing service for simulations.
//!
//! Keeps a name directory and a mirror of the exported topology of one host. Destinations
//! outside the host are resolved through static remote routes, each naming the local
//! gateway node and the exit address of the neighbouring domain.

use async_trait::async_trait;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::{self, canonicalize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tracing::{debug, error, warn};
use transfer_plane::search::shortest_path;
use transfer_plane::{
    Description, ElementId, ForwardingNode, Gate, GateId, Identity, Name, Namespace,
    NamingLevel, NodeId, Route, RouteSegment, RoutingService, TransferError,
};

const FLAT_ROUTING_SERVICE_TAG: &str = "FlatRoutingService:";
const FLAT_ROUTING_SERVICE_FN_REGISTER_NODE_TAG: &str = "register_node():";
const FLAT_ROUTING_SERVICE_FN_REGISTER_LINK_TAG: &str = "register_link():";
const FLAT_ROUTING_SERVICE_FN_GET_ROUTE_TAG: &str = "get_route():";

#[derive(Debug, Error)]
pub enum StaticRoutesError {
    #[error("static routes file {path} not found: {source}")]
    NotFound {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("unable to read static routes file: {0}")]
    Read(#[from] std::io::Error),
    #[error("unable to parse static routes file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("static routes file must be a JSON object mapping destination names to routes")]
    Shape,
}

/// Remote destination reachable through a local gateway node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaticRoute {
    pub gateway: Name,
    pub exit: Name,
}

#[derive(Clone, Debug)]
struct MirrorLink {
    gate: GateId,
    description: Description,
}

struct NameBinding {
    node: NodeId,
    level: NamingLevel,
}

#[derive(Default)]
struct Directory {
    graph: StableDiGraph<NodeId, MirrorLink>,
    vertices: HashMap<NodeId, NodeIndex>,
    nodes: HashMap<NodeId, Arc<ForwardingNode>>,
    capabilities: HashMap<NodeId, Description>,
    links: HashMap<(NodeId, GateId), EdgeIndex>,
    remote_links: HashMap<(NodeId, GateId), Name>,
    names: BTreeMap<Name, Vec<NameBinding>>,
}

impl Directory {
    /// Removes the mirror edge of `key`, if the stored index still designates that edge.
    fn remove_link(&mut self, key: &(NodeId, GateId)) -> bool {
        let Some(edge) = self.links.remove(key) else {
            return false;
        };
        let owned = match (self.graph.edge_endpoints(edge), self.graph.edge_weight(edge)) {
            (Some((source, _)), Some(link)) => {
                self.graph[source] == key.0 && link.gate == key.1
            }
            _ => false,
        };
        if owned {
            self.graph.remove_edge(edge);
        }
        owned
    }

    fn resolve(&self, name: &Name) -> Option<NodeId> {
        self.names.get(name)?.iter().find_map(|binding| {
            (binding.level != NamingLevel::None).then_some(binding.node)
        })
    }

    fn gate_path(
        &self,
        from: &NodeId,
        to: &NodeId,
        requirements: &Description,
    ) -> Option<Route> {
        let source = *self.vertices.get(from)?;
        let target = *self.vertices.get(to)?;
        let path = shortest_path(
            &self.graph,
            source,
            target,
            |link: &MirrorLink| requirements.admits(&link.description),
            |link: &MirrorLink| link.gate,
        )?;

        let mut delay = 0u64;
        let mut route = Route::new();
        for edge in path {
            let link = self.graph.edge_weight(edge)?;
            delay += link.description.delay().map_or(0, u64::from);
            route.add_last(RouteSegment::Gate(link.gate));
        }
        requirements.within_delay(delay).then_some(route)
    }
}

/// Routing service of a single flat routing domain.
pub struct FlatRoutingService {
    namespace: Namespace,
    domain: Name,
    static_routes: HashMap<Name, StaticRoute>,
    directory: RwLock<Directory>,
}

impl FlatRoutingService {
    /// Creates a service for `namespace`; `domain` names this host's routing domain and
    /// opens every route leaving the host.
    pub fn new(namespace: Namespace, domain: &str) -> Self {
        let domain = Name::new(namespace.clone(), domain);
        Self {
            namespace,
            domain,
            static_routes: HashMap::new(),
            directory: RwLock::new(Directory::default()),
        }
    }

    /// Like [`FlatRoutingService::new`], seeded with the remote destinations listed in the
    /// JSON file at `path`.
    pub fn with_static_routes(
        namespace: Namespace,
        domain: &str,
        path: impl AsRef<Path>,
    ) -> Result<Self, StaticRoutesError> {
        let mut service = Self::new(namespace, domain);
        service.static_routes = read_static_routes(path.as_ref())?;
        debug!(
            "{} loaded {} static route(s)",
            FLAT_ROUTING_SERVICE_TAG,
            service.static_routes.len()
        );
        Ok(service)
    }

    pub fn domain(&self) -> &Name {
        &self.domain
    }

    /// Adds or replaces the remote route towards `destination`.
    pub fn add_static_route(&mut self, destination: Name, route: StaticRoute) {
        self.static_routes.insert(destination, route);
    }

    /// Names resolvable directly (registered with [`NamingLevel::Names`]).
    pub fn names(&self) -> Vec<Name> {
        self.read()
            .names
            .iter()
            .filter(|(_, bindings)| {
                bindings
                    .iter()
                    .any(|binding| binding.level == NamingLevel::Names)
            })
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Last capabilities announced for `node`.
    pub fn capabilities(&self, node: &NodeId) -> Option<Description> {
        self.read().capabilities.get(node).cloned()
    }

    fn read(&self) -> RwLockReadGuard<'_, Directory> {
        self.directory.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Directory> {
        self.directory.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_namespace(&self, name: &Name) -> Result<(), TransferError> {
        if name.namespace() == &self.namespace {
            Ok(())
        } else {
            Err(TransferError::Routing(format!(
                "{name} is outside namespace {}",
                self.namespace
            )))
        }
    }
}

fn read_static_routes(path: &Path) -> Result<HashMap<Name, StaticRoute>, StaticRoutesError> {
    let canonical = canonicalize(path).map_err(|source| StaticRoutesError::NotFound {
        path: path.to_path_buf(),
        source,
    })?;
    let data = fs::read_to_string(canonical)?;
    let value: Value = serde_json::from_str(&data)?;
    let Some(entries) = value.as_object() else {
        return Err(StaticRoutesError::Shape);
    };

    let mut routes = HashMap::new();
    for (destination_key, entry) in entries {
        let destination = match Name::from_str(destination_key) {
            Ok(name) => name,
            Err(err) => {
                error!("Error parsing destination '{destination_key}': {err}");
                continue;
            }
        };
        let (Some(gateway), Some(exit)) = (
            entry.get("gateway").and_then(Value::as_str),
            entry.get("exit").and_then(Value::as_str),
        ) else {
            warn!("Ignoring route for '{destination_key}' without gateway and exit");
            continue;
        };
        match (Name::from_str(gateway), Name::from_str(exit)) {
            (Ok(gateway), Ok(exit)) => {
                routes.insert(destination, StaticRoute { gateway, exit });
            }
            (Err(err), _) | (_, Err(err)) => {
                error!("Error parsing route for '{destination_key}': {err}");
            }
        }
    }
    Ok(routes)
}

#[async_trait]
impl RoutingService for FlatRoutingService {
    fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    async fn register_node(
        &self,
        node: &Arc<ForwardingNode>,
        name: Option<&Name>,
        level: NamingLevel,
        description: &Description,
    ) -> Result<(), TransferError> {
        if let Some(name) = name {
            self.check_namespace(name)?;
        }
        debug!(
            "{}:{} {}({}) as {:?} at {:?}",
            FLAT_ROUTING_SERVICE_TAG,
            FLAT_ROUTING_SERVICE_FN_REGISTER_NODE_TAG,
            node.name(),
            node.id(),
            name,
            level
        );

        let mut directory = self.write();
        let id = node.id();
        if !directory.vertices.contains_key(&id) {
            let index = directory.graph.add_node(id);
            directory.vertices.insert(id, index);
        }
        directory.nodes.insert(id, node.clone());
        directory.capabilities.insert(id, description.clone());
        if let Some(name) = name {
            let bindings = directory.names.entry(name.clone()).or_default();
            bindings.retain(|binding| binding.node != id);
            bindings.push(NameBinding { node: id, level });
        }
        Ok(())
    }

    async fn update_node(
        &self,
        node: &Arc<ForwardingNode>,
        capabilities: &Description,
    ) -> Result<(), TransferError> {
        let mut directory = self.write();
        if !directory.nodes.contains_key(&node.id()) {
            return Err(TransferError::UnknownElement(node.id().to_string()));
        }
        directory
            .capabilities
            .insert(node.id(), capabilities.clone());
        Ok(())
    }

    async fn unregister_node(&self, node: &Arc<ForwardingNode>) -> Result<bool, TransferError> {
        let id = node.id();
        let mut directory = self.write();
        let Some(index) = directory.vertices.remove(&id) else {
            return Ok(false);
        };
        let incident: HashSet<EdgeIndex> = directory
            .graph
            .edges_directed(index, Direction::Incoming)
            .chain(directory.graph.edges_directed(index, Direction::Outgoing))
            .map(|edge| edge.id())
            .collect();
        directory.graph.remove_node(index);
        directory.nodes.remove(&id);
        directory.capabilities.remove(&id);
        directory
            .links
            .retain(|(owner, _), edge| *owner != id && !incident.contains(&*edge));
        directory.remote_links.retain(|(owner, _), _| *owner != id);
        directory.names.retain(|_, bindings| {
            bindings.retain(|binding| binding.node != id);
            !bindings.is_empty()
        });
        Ok(true)
    }

    async fn register_link(
        &self,
        from: &Arc<ForwardingNode>,
        gate: &Arc<Gate>,
    ) -> Result<(), TransferError> {
        let gate_id = gate.gate_id().ok_or_else(|| {
            TransferError::Consistency(format!("gate of {} has no number", from.name()))
        })?;
        let from_id = from.id();
        let mut directory = self.write();
        let source = *directory
            .vertices
            .get(&from_id)
            .ok_or_else(|| TransferError::UnknownElement(from_id.to_string()))?;

        match (gate.next_hop(), gate.remote_name()) {
            (Some(ElementId::Node(next)), _) => {
                let target = *directory
                    .vertices
                    .get(next)
                    .ok_or_else(|| TransferError::UnknownElement(next.to_string()))?;
                let link = MirrorLink {
                    gate: gate_id,
                    description: gate.description().clone(),
                };
                directory.remove_link(&(from_id, gate_id));
                let edge = directory.graph.add_edge(source, target, link);
                directory.links.insert((from_id, gate_id), edge);
            }
            (None | Some(ElementId::DevNull), Some(remote)) => {
                directory
                    .remote_links
                    .insert((from_id, gate_id), remote.clone());
            }
            (next_hop, _) => {
                return Err(TransferError::Network(format!(
                    "gate {gate_id} of {} leads to {next_hop:?}, which is not routable",
                    from.name()
                )));
            }
        }
        debug!(
            "{}:{} {} via {}",
            FLAT_ROUTING_SERVICE_TAG,
            FLAT_ROUTING_SERVICE_FN_REGISTER_LINK_TAG,
            from.name(),
            gate_id
        );
        Ok(())
    }

    async fn unregister_link(
        &self,
        from: &Arc<ForwardingNode>,
        gate: &Arc<Gate>,
    ) -> Result<bool, TransferError> {
        let Some(gate_id) = gate.gate_id() else {
            return Ok(false);
        };
        let key = (from.id(), gate_id);
        let mut directory = self.write();
        if directory.remove_link(&key) {
            return Ok(true);
        }
        Ok(directory.remote_links.remove(&key).is_some())
    }

    async fn get_route(
        &self,
        source: &Arc<ForwardingNode>,
        destination: &Name,
        requirements: &Description,
        requester: &Identity,
    ) -> Result<Route, TransferError> {
        self.check_namespace(destination)?;
        debug!(
            "{}:{} {} asks for {} from {}",
            FLAT_ROUTING_SERVICE_TAG,
            FLAT_ROUTING_SERVICE_FN_GET_ROUTE_TAG,
            requester,
            destination,
            source.name()
        );

        let directory = self.read();
        if let Some(local) = directory.resolve(destination) {
            return directory
                .gate_path(&source.id(), &local, requirements)
                .ok_or_else(|| TransferError::no_route(source.name(), destination));
        }

        let remote = self
            .static_routes
            .get(destination)
            .ok_or_else(|| TransferError::no_route(source.name(), destination))?;
        let gateway = directory.resolve(&remote.gateway).ok_or_else(|| {
            TransferError::Routing(format!(
                "gateway {} towards {destination} is not registered",
                remote.gateway
            ))
        })?;
        let gates = directory
            .gate_path(&source.id(), &gateway, requirements)
            .ok_or_else(|| TransferError::no_route(source.name(), &remote.gateway))?;

        let mut route = Route::new();
        route.add_last(RouteSegment::Address(self.domain.clone()));
        route.append(gates);
        route.add_last(RouteSegment::Address(remote.exit.clone()));
        Ok(route)
    }

    async fn get_local_element(&self, destination: &Name) -> Option<Arc<ForwardingNode>> {
        let directory = self.read();
        let node = directory.resolve(destination)?;
        directory.nodes.get(&node).cloned()
    }

    fn number_vertices(&self) -> usize {
        self.read().graph.node_count()
    }

    fn number_edges(&self) -> usize {
        let directory = self.read();
        directory.graph.edge_count() + directory.remote_links.len()
    }

    /// Directory entries plus static routes.
    fn size(&self) -> usize {
        let directory = self.read();
        directory.names.values().map(Vec::len).sum::<usize>() + self.static_routes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::{FlatRoutingService, StaticRoute};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use transfer_plane::{
        Description, ElementId, ErrorKind, ForwardingNode, Gate, GateKind, Identity, Name,
        Namespace, NamingLevel, RouteSegment, RoutingService,
    };

    static TEST_FILE_COUNTER: AtomicUsize = AtomicUsize::new(0);

    fn temp_json_path() -> PathBuf {
        let mut path = std::env::temp_dir();
        let counter = TEST_FILE_COUNTER.fetch_add(1, Ordering::Relaxed);
        path.push(format!(
            "routing-service-flat-test-{}-{}.json",
            std::process::id(),
            counter
        ));
        path
    }

    fn fog(name: &str) -> Name {
        Name::new(Namespace::new("fog"), name)
    }

    async fn register(
        service: &FlatRoutingService,
        node: &Arc<ForwardingNode>,
        name: &str,
        level: NamingLevel,
    ) {
        service
            .register_node(node, Some(&fog(name)), level, &Description::new())
            .await
            .expect("register node");
    }

    async fn link(service: &FlatRoutingService, from: &Arc<ForwardingNode>, to: &Arc<ForwardingNode>) {
        let gate = Gate::builder(GateKind::Horizontal)
            .next_hop(ElementId::Node(to.id()))
            .build();
        from.register_gate(gate.clone()).expect("gate id");
        service.register_link(from, &gate).await.expect("register link");
    }

    #[tokio::test]
    async fn announced_names_resolve_but_are_not_listed() {
        let service = FlatRoutingService::new(Namespace::new("fog"), "host-a");
        let printer = ForwardingNode::builder("printer").build();
        let spooler = ForwardingNode::builder("spooler").build();
        register(&service, &printer, "printer", NamingLevel::Names).await;
        register(&service, &spooler, "spooler", NamingLevel::Announces).await;

        assert_eq!(service.names(), vec![fog("printer")]);
        assert!(service.get_local_element(&fog("spooler")).await.is_some());
        assert!(service.get_local_element(&fog("scanner")).await.is_none());
    }

    #[tokio::test]
    async fn unregistering_a_node_drops_its_names_and_links() {
        let service = FlatRoutingService::new(Namespace::new("fog"), "host-a");
        let app = ForwardingNode::builder("app").build();
        let printer = ForwardingNode::builder("printer").build();
        register(&service, &app, "app", NamingLevel::Names).await;
        register(&service, &printer, "printer", NamingLevel::Names).await;
        link(&service, &app, &printer).await;

        assert_eq!(service.unregister_node(&printer).await, Ok(true));

        assert_eq!(service.names(), vec![fog("app")]);
        assert_eq!(service.number_vertices(), 1);
        assert_eq!(service.number_edges(), 0);
        assert_eq!(service.unregister_node(&printer).await, Ok(false));
    }

    #[tokio::test]
    async fn relinking_after_unregister_keeps_other_links() {
        let mut service = FlatRoutingService::new(Namespace::new("fog"), "host-a");
        service.add_static_route(
            fog("printer-b"),
            StaticRoute {
                gateway: fog("c"),
                exit: fog("host-b"),
            },
        );
        let a = ForwardingNode::builder("a").build();
        let b = ForwardingNode::builder("b").build();
        let c = ForwardingNode::builder("c").build();
        for (node, name) in [(&a, "a"), (&b, "b"), (&c, "c")] {
            register(&service, node, name, NamingLevel::Names).await;
        }
        let to_b = Gate::builder(GateKind::Horizontal)
            .next_hop(ElementId::Node(b.id()))
            .build();
        a.register_gate(to_b.clone()).expect("gate id");
        service.register_link(&a, &to_b).await.expect("a -> b");

        assert_eq!(service.unregister_node(&b).await, Ok(true));
        link(&service, &a, &c).await;
        register(&service, &b, "b", NamingLevel::Names).await;
        service.register_link(&a, &to_b).await.expect("a -> b again");

        assert_eq!(service.number_edges(), 2);
        let route = service
            .get_route(&a, &fog("printer-b"), &Description::new(), &Identity::new("a"))
            .await
            .expect("remote route via c");
        assert_eq!(route.size_number_gates(), 1);
        assert_eq!(service.unregister_link(&a, &to_b).await, Ok(true));
        assert_eq!(service.number_edges(), 1);
        assert!(service
            .get_route(&a, &fog("c"), &Description::new(), &Identity::new("a"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn remote_destination_is_bracketed_by_domain_addresses() {
        let mut service = FlatRoutingService::new(Namespace::new("fog"), "host-a");
        service.add_static_route(
            fog("printer-b"),
            StaticRoute {
                gateway: fog("uplink"),
                exit: fog("host-b"),
            },
        );
        let app = ForwardingNode::builder("app").build();
        let uplink = ForwardingNode::builder("uplink").build();
        register(&service, &app, "app", NamingLevel::Names).await;
        register(&service, &uplink, "uplink", NamingLevel::Announces).await;
        link(&service, &app, &uplink).await;

        let route = service
            .get_route(&app, &fog("printer-b"), &Description::new(), &Identity::new("app"))
            .await
            .expect("remote route");

        assert_eq!(route.size(), 3);
        assert_eq!(route.first(), Some(&RouteSegment::Address(fog("host-a"))));
        assert_eq!(route.last(), Some(&RouteSegment::Address(fog("host-b"))));
        assert_eq!(route.size_number_gates(), 1);
    }

    #[tokio::test]
    async fn unknown_destination_has_no_route() {
        let service = FlatRoutingService::new(Namespace::new("fog"), "host-a");
        let app = ForwardingNode::builder("app").build();
        register(&service, &app, "app", NamingLevel::Names).await;

        let err = service
            .get_route(&app, &fog("nowhere"), &Description::new(), &Identity::new("app"))
            .await
            .expect_err("unknown destination");

        assert_eq!(err.kind(), ErrorKind::Routing);
    }

    #[tokio::test]
    async fn foreign_namespace_is_refused() {
        let service = FlatRoutingService::new(Namespace::new("fog"), "host-a");
        let app = ForwardingNode::builder("app").build();

        let err = service
            .register_node(
                &app,
                Some(&Name::new(Namespace::new("ip"), "10.0.0.1")),
                NamingLevel::Names,
                &Description::new(),
            )
            .await
            .expect_err("foreign name");

        assert_eq!(err.kind(), ErrorKind::Routing);
        assert_eq!(service.number_vertices(), 0);
    }

    #[test]
    fn static_routes_skip_malformed_entries() {
        let path = temp_json_path();
        std::fs::write(
            &path,
            r#"{
                "fog://printer-b": { "gateway": "fog://uplink", "exit": "fog://host-b" },
                "not-a-name": { "gateway": "fog://uplink", "exit": "fog://host-b" },
                "fog://broken": { "gateway": "fog://uplink" }
            }"#,
        )
        .expect("write static routes");

        let service =
            FlatRoutingService::with_static_routes(Namespace::new("fog"), "host-a", &path);
        std::fs::remove_file(&path).expect("remove static routes");

        let service = service.expect("load static routes");
        assert_eq!(service.size(), 1);
    }

    #[test]
    fn missing_static_routes_file_is_reported() {
        let path = temp_json_path();

        assert!(
            FlatRoutingService::with_static_routes(Namespace::new("fog"), "host-a", &path).is_err()
        );
    }

    #[test]
    fn bundled_static_routes_load() {
        let service = FlatRoutingService::with_static_routes(
            Namespace::new("fog"),
            "host-a",
            concat!(env!("CARGO_MANIFEST_DIR"), "/static-configs/remote-routes.json"),
        )
        .expect("bundled routes");

        assert_eq!(service.size(), 2);
    }
}
