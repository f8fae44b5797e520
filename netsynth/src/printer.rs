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

//! # Helper (printer) functions
//! Module containing helper functions to get formatted strings of sessions, session graphs and
//! compile reports, with the names of the routers inserted.

use crate::compiler::CompileReport;
use crate::diagnostics::Scope;
use crate::sessions::route_map::RouteMap;
use crate::sessions::{SessionGraph, SessionKind};
use crate::topology::{RouterId, Topology};
use crate::Error;

/// Returns the formatted string of the directed session `source -> target`.
pub fn session(
    topology: &Topology,
    sessions: &SessionGraph,
    source: RouterId,
    target: RouterId,
) -> Result<String, Error> {
    let s = sessions.session(source, target).ok_or(Error::NoSession(source, target))?;
    let kind = match (s.kind, s.direction) {
        (SessionKind::External, _) => String::from("eBGP"),
        (SessionKind::Internal, Some(dir)) => format!("iBGP {}", dir),
        (SessionKind::Internal, None) => String::from("iBGP"),
    };
    let mut result = format!("{} -> {}: {}", topology.fqdn(source), topology.fqdn(target), kind);
    if !s.ingress.is_empty() {
        result.push_str(&format!(", in: [{}]", route_map_names(&s.ingress)));
    }
    if !s.egress.is_empty() {
        result.push_str(&format!(", out: [{}]", route_map_names(&s.egress)));
    }
    Ok(result)
}

fn route_map_names(maps: &[RouteMap]) -> String {
    maps.iter().map(|m| m.name()).collect::<Vec<_>>().join(", ")
}

/// Returns one line per directed session, eBGP sessions first.
pub fn session_graph(topology: &Topology, sessions: &SessionGraph) -> Result<Vec<String>, Error> {
    let mut result = Vec::new();
    for (a, b) in sessions.ebgp_sessions() {
        result.push(session(topology, sessions, a, b)?);
    }
    for (a, b, _) in sessions.ibgp_sessions() {
        result.push(session(topology, sessions, a, b)?);
    }
    Ok(result)
}

/// Returns a summary of the compile report: all failed routers and all diagnostics.
pub fn report_summary(report: &CompileReport) -> Vec<String> {
    let mut result = vec![format!(
        "{} routers compiled, {} failed",
        report.configs.len(),
        report.failures.len()
    )];
    for f in report.failures.iter() {
        result.push(format!("FAILED {}: {}", f.hostname, f.error));
    }
    for d in report.diagnostics.iter() {
        let scope = match &d.scope {
            Scope::Run => String::from("run"),
            Scope::As(asn) => format!("AS{}", asn),
            Scope::Router(_, name) => name.clone(),
        };
        result.push(format!("{:?} [{}] {}", d.kind, scope, d.message));
    }
    result
}
