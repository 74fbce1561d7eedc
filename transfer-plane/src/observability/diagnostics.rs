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

//! Route diagnostics: one record per route query.
//!
//! Sinks are injected into the transfer plane. A failing sink never fails the routing
//! operation that produced the record; the transfer plane downgrades it to a warning.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::File;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tracing::info;

/// Which side answered a route query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteMode {
    /// Local graph search.
    Internal,
    /// Answered by the routing service.
    Delegated,
}

/// Shape of a route diagnostics record.
///
/// Counts describe whichever side answered. Hop and segment counts are zero on failure.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RouteRecord {
    pub timestamp: DateTime<Utc>,
    pub host: String,
    pub source: String,
    pub destination: String,
    pub mode: RouteMode,
    pub vertices: usize,
    pub edges: usize,
    pub size: usize,
    pub gate_hops: usize,
    pub segments: usize,
    pub success: bool,
}

#[derive(Debug, Error)]
pub enum DiagnosticsError {
    #[error("diagnostics sink i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("diagnostics record rejected: {0}")]
    Csv(#[from] csv::Error),
}

pub trait DiagnosticsSink: Send + Sync {
    fn record(&self, record: &RouteRecord) -> Result<(), DiagnosticsError>;
}

/// Discards every record.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopDiagnostics;

impl DiagnosticsSink for NoopDiagnostics {
    fn record(&self, _record: &RouteRecord) -> Result<(), DiagnosticsError> {
        Ok(())
    }
}

/// Emits every record as an `info` event.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingDiagnostics;

impl DiagnosticsSink for TracingDiagnostics {
    fn record(&self, record: &RouteRecord) -> Result<(), DiagnosticsError> {
        info!(
            host = %record.host,
            source = %record.source,
            destination = %record.destination,
            mode = ?record.mode,
            vertices = record.vertices,
            edges = record.edges,
            size = record.size,
            gate_hops = record.gate_hops,
            segments = record.segments,
            success = record.success,
            "route diagnostics"
        );
        Ok(())
    }
}

/// Appends one CSV row per record to a file.
pub struct CsvDiagnostics {
    writer: Mutex<csv::Writer<File>>,
}

impl CsvDiagnostics {
    /// Creates (or truncates) the file at `path`; the header row is written with the
    /// first record.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, DiagnosticsError> {
        let writer = csv::Writer::from_path(path)?;
        Ok(Self {
            writer: Mutex::new(writer),
        })
    }
}

impl DiagnosticsSink for CsvDiagnostics {
    fn record(&self, record: &RouteRecord) -> Result<(), DiagnosticsError> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.serialize(record)?;
        writer.flush()?;
        Ok(())
    }
}
