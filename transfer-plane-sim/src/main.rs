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

mod config;

use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use clap::Parser;
use config::{HandshakeMode, LinkConfig, SimConfig};
use routing_service_flat::FlatRoutingService;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use transfer_plane::observability::diagnostics::{CsvDiagnostics, TracingDiagnostics};
use transfer_plane::{
    ElementId, ForwardingElement, ForwardingNode, Gate, GateState, Identity, Name, Namespace,
    NamingLevel, NodeId, Packet, PacketHandler, TransferPlane,
};

const SIM_TAG: &str = "transfer-plane-sim:";

#[derive(Debug, Parser)]
#[command(name = "transfer-plane-sim")]
#[command(about = "Builds one host's transfer plane from a topology file and replays route queries")]
struct Cli {
    /// JSON5 topology file
    #[arg(long)]
    config: PathBuf,
    /// Write one CSV row per route query instead of logging it
    #[arg(long)]
    diagnostics: Option<PathBuf>,
    #[arg(long, default_value_t = 1000)]
    handshake_timeout_ms: u64,
}

/// Logs every packet that reaches its final node.
struct LoggingHandler;

#[async_trait]
impl PacketHandler for LoggingHandler {
    async fn on_packet(&self, node: NodeId, packet: Packet, last_hop: Option<ElementId>) {
        info!(
            "{SIM_TAG} node {node} received packet {} ({} bytes) from {}",
            packet.id(),
            packet.payload().len(),
            last_hop.map_or_else(|| "nowhere".to_string(), |hop| hop.to_string())
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = SimConfig::load(&cli.config)?;
    let namespace = Namespace::new(&config.namespace);

    let routing = match &config.static_routes {
        Some(path) => FlatRoutingService::with_static_routes(namespace.clone(), &config.host, path)
            .with_context(|| format!("unable to load static routes from {}", path.display()))?,
        None => FlatRoutingService::new(namespace.clone(), &config.host),
    };
    let routing = Arc::new(routing);
    let mut plane = TransferPlane::new(&config.host, routing.clone());
    plane = match &cli.diagnostics {
        Some(path) => plane.with_diagnostics(Arc::new(CsvDiagnostics::create(path)?)),
        None => plane.with_diagnostics(Arc::new(TracingDiagnostics)),
    };

    let handler: Arc<dyn PacketHandler> = Arc::new(LoggingHandler);
    let mut nodes: HashMap<String, Arc<ForwardingNode>> = HashMap::new();
    for node_config in &config.nodes {
        let node = ForwardingNode::builder(&node_config.name)
            .owner(Identity::new(&config.host))
            .private_to_transfer(node_config.private)
            .handler(handler.clone())
            .build();
        let name = (node_config.naming != NamingLevel::None)
            .then(|| Name::new(namespace.clone(), &node_config.name));
        plane
            .register_node(
                &node,
                name.as_ref(),
                node_config.naming,
                &node_config.capabilities,
            )
            .await
            .with_context(|| format!("unable to register node {}", node_config.name))?;
        nodes.insert(node_config.name.clone(), node);
    }

    let handshake_timeout = Duration::from_millis(cli.handshake_timeout_ms);
    for link in &config.links {
        open_link(&plane, &nodes, link, handshake_timeout)
            .await
            .with_context(|| format!("unable to open link from {}", link.from))?;
    }
    info!(
        "{SIM_TAG} host {} is up with {} vertices, {} edges; routing service knows {} names",
        plane.name(),
        plane.number_vertices().await,
        plane.number_edges().await,
        routing.names().len()
    );

    let requester = Identity::new(&config.host);
    for query in &config.routes {
        let source = nodes
            .get(&query.from)
            .ok_or_else(|| anyhow!("route query starts at unknown node {}", query.from))?;
        let route = match plane
            .get_route(source, &query.to, &query.requirements, &requester)
            .await
        {
            Ok(route) => route,
            Err(err) => {
                warn!("{SIM_TAG} {} -> {}: {err}", query.from, query.to);
                continue;
            }
        };
        info!("{SIM_TAG} {} -> {}: {route}", query.from, query.to);

        if let Some(payload) = &query.payload {
            match plane
                .forward(source, &route, Packet::new(payload.as_bytes().to_vec()))
                .await
            {
                Ok(delivery) => info!("{SIM_TAG} {} -> {}: {delivery:?}", query.from, query.to),
                Err(err) => warn!(
                    "{SIM_TAG} {} -> {}: forwarding failed: {err}",
                    query.from, query.to
                ),
            }
        }
    }

    for node in nodes.values() {
        for gate in node.gates(None) {
            gate.shutdown();
        }
        plane.unregister_node(node).await?;
    }
    Ok(())
}

/// Builds the gate described by `link`, links it and brings it into `OPERATE`.
///
/// Deferred gates are acknowledged by a spawned task standing in for the peer.
async fn open_link(
    plane: &TransferPlane,
    nodes: &HashMap<String, Arc<ForwardingNode>>,
    link: &LinkConfig,
    handshake_timeout: Duration,
) -> anyhow::Result<()> {
    let owner = nodes
        .get(&link.from)
        .ok_or_else(|| anyhow!("unknown node {}", link.from))?;
    let mut builder = Gate::builder(link.kind)
        .handshake(link.handshake.into())
        .description(link.provides.clone());
    if let Some(to) = &link.to {
        let next = nodes.get(to).ok_or_else(|| anyhow!("unknown node {to}"))?;
        builder = builder.next_hop(next.element_id());
    } else if let Some(pass_through) = &link.pass_through {
        builder = builder.next_hop(ElementId::PassThrough(pass_through.clone()));
    }
    if let Some(remote) = &link.remote {
        builder = builder.remote_name(remote.clone());
    }
    let gate = builder.build();

    let gate_id = owner.register_gate(gate.clone())?;
    plane
        .register_link(&ForwardingElement::Node(owner.clone()), &gate)
        .await?;

    if gate.initialise()? == GateState::Init && link.handshake == HandshakeMode::Deferred {
        let change = gate.wait_for_state_change(handshake_timeout);
        let peer = gate.clone();
        tokio::spawn(async move {
            if let Err(err) = peer.complete_handshake(true) {
                warn!("{SIM_TAG} peer acknowledgement rejected: {err}");
            }
        });
        let state = change.await?;
        if state != GateState::Operate {
            bail!("gate {gate_id} of {} settled in {state}", link.from);
        }
    }
    info!("{SIM_TAG} {} gate {gate_id} is {}", link.from, gate.state());
    Ok(())
}
