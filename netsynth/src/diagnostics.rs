// NetSynth: Synthesizing BGP Session Topologies and Router Configurations
// Copyright (C) 2021  Tibor Schneider
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! # Diagnostics
//!
//! The synthesizer and the compiler never stop the run for problems that only affect a single AS
//! or a single router. Instead, they record a [`Diagnostic`] in the sink that is passed into them.
//! Every recorded diagnostic is also emitted through the `log` facade.

use crate::topology::{AsId, RouterId};

use log::*;
use serde::Serialize;

/// What part of the network a diagnostic is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Scope {
    /// The entire run
    Run,
    /// A single autonomous system
    As(AsId),
    /// A single router, with its fully qualified name
    Router(#[serde(skip)] RouterId, String),
}

/// Kind of the diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticKind {
    /// Only some routers of an AS have the level set. The AS falls back to a full mesh.
    PartialLevel,
    /// Some router has a level that is not supported. No internal sessions are built for the AS.
    UnsupportedLevel,
    /// Synthesis was started on a session graph that already contains something.
    SessionGraphNotEmpty,
    /// The router has more links than the platform offers interfaces.
    InterfaceLimit,
    /// The emulation lab has more bridges than supported.
    BridgeLimit,
    /// An iBGP neighbor has no loopback address. The neighbor is left out of the configuration.
    MissingNeighborLoopback,
    /// Compilation of the router failed.
    CompileFailure,
}

impl DiagnosticKind {
    /// Returns true if the condition is fatal for its scope.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::SessionGraphNotEmpty | Self::CompileFailure)
    }
}

/// A single structured diagnostic record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Scope of the record
    pub scope: Scope,
    /// Kind of the record
    pub kind: DiagnosticKind,
    /// Human readable message
    pub message: String,
}

/// Sink collecting all diagnostics of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    records: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new diagnostic, and emit it as a log message.
    pub fn record(&mut self, scope: Scope, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        let prefix = match &scope {
            Scope::Run => String::new(),
            Scope::As(asn) => format!("[AS{}] ", asn),
            Scope::Router(_, name) => format!("[{}] ", name),
        };
        if kind.is_fatal() {
            error!("{}{}", prefix, message);
        } else {
            warn!("{}{}", prefix, message);
        }
        self.records.push(Diagnostic { scope, kind, message });
    }

    /// Move all records of `other` into `self`.
    pub fn merge(&mut self, other: Diagnostics) {
        self.records.extend(other.records);
    }

    /// Iterate over all records
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.records.iter()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns all records of the given kind
    pub fn of_kind(&self, kind: DiagnosticKind) -> Vec<&Diagnostic> {
        self.records.iter().filter(|d| d.kind == kind).collect()
    }

    /// Returns all records about the given router
    pub fn of_router(&self, router: RouterId) -> Vec<&Diagnostic> {
        self.records
            .iter()
            .filter(|d| matches!(d.scope, Scope::Router(r, _) if r == router))
            .collect()
    }

    /// Returns true if any fatal record was recorded
    pub fn has_fatal(&self) -> bool {
        self.records.iter().any(|d| d.kind.is_fatal())
    }
}
