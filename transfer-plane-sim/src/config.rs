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

//! Topology files for the simulator.

use anyhow::{bail, Context};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use transfer_plane::{Description, GateKind, Handshake, Name, NamingLevel};

/// One host: its nodes, the gates between them and the route queries to replay.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimConfig {
    pub host: String,
    pub namespace: String,
    /// Relative paths are resolved against the directory of the topology file.
    #[serde(default)]
    pub static_routes: Option<PathBuf>,
    pub nodes: Vec<NodeConfig>,
    #[serde(default)]
    pub links: Vec<LinkConfig>,
    #[serde(default)]
    pub routes: Vec<RouteQuery>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    pub name: String,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub naming: NamingLevel,
    #[serde(default)]
    pub capabilities: Description,
}

/// A gate owned by `from`.
///
/// `to` names another node of the host, `pass_through` a display-only element. With
/// neither the gate ends at dev/null, typically together with a `remote` name.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkConfig {
    pub from: String,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub pass_through: Option<String>,
    #[serde(default = "default_gate_kind")]
    pub kind: GateKind,
    #[serde(default)]
    pub handshake: HandshakeMode,
    #[serde(default)]
    pub provides: Description,
    #[serde(default)]
    pub remote: Option<Name>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandshakeMode {
    #[default]
    Immediate,
    /// The simulator plays the peer and acknowledges after start-up.
    Deferred,
}

impl From<HandshakeMode> for Handshake {
    fn from(mode: HandshakeMode) -> Self {
        match mode {
            HandshakeMode::Immediate => Handshake::Immediate,
            HandshakeMode::Deferred => Handshake::Deferred,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteQuery {
    pub from: String,
    pub to: Name,
    #[serde(default)]
    pub requirements: Description,
    /// Forwarded along the route when present.
    #[serde(default)]
    pub payload: Option<String>,
}

fn default_gate_kind() -> GateKind {
    GateKind::Horizontal
}

impl SimConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("unable to read topology file {}", path.display()))?;
        let mut config: SimConfig = json5::from_str(&text)
            .with_context(|| format!("unable to parse topology file {}", path.display()))?;
        if let (Some(routes), Some(dir)) = (config.static_routes.as_mut(), path.parent()) {
            if routes.is_relative() {
                *routes = dir.join(&*routes);
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Rejects duplicate node names and links or queries that mention unknown nodes.
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut names = HashSet::new();
        for node in &self.nodes {
            if !names.insert(node.name.as_str()) {
                bail!("node {} is declared twice", node.name);
            }
        }
        for link in &self.links {
            if !names.contains(link.from.as_str()) {
                bail!("link starts at unknown node {}", link.from);
            }
            if let Some(to) = &link.to {
                if !names.contains(to.as_str()) {
                    bail!("link from {} ends at unknown node {to}", link.from);
                }
                if link.pass_through.is_some() {
                    bail!("link from {} names both a node and a pass-through", link.from);
                }
            }
        }
        for route in &self.routes {
            if !names.contains(route.from.as_str()) {
                bail!("route query starts at unknown node {}", route.from);
            }
        }
        Ok(())
    }
}
