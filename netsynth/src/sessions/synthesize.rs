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

//! # Session synthesis
//!
//! Synthesis runs in two passes. [`resolve_attributes`] computes the effective level and clusters
//! of every router, without touching the topology. Then, the sessions are built from the
//! resolved attributes only.
//!
//! ## Route-reflection hierarchy
//!
//! | level pair | cluster      | sessions       |
//! |------------|--------------|----------------|
//! | 1 - 1      | (max level 1)| peer           |
//! | 1 - 2      | l2 cluster   | up / down      |
//! | 2 - 2      | l2 cluster   | peer           |
//! | 2 - 3      | l3 cluster   | up / down      |
//! | 3 - 3      | l3 cluster   | peer           |
//!
//! Empty clusters are treated as unset, and get the default. Clusters only match if both are set,
//! non-empty and equal.

use super::{Direction, PolicyStore, ResolvedAttributes, Session, SessionGraph, SessionNode};
use crate::diagnostics::{DiagnosticKind, Diagnostics, Scope};
use crate::topology::{AsId, RouterId, Topology};
use crate::Error;

use itertools::Itertools;
use log::*;
use std::collections::{BTreeMap, BTreeSet};

/// Result of the attribute resolution pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Resolved attributes of every router
    pub attrs: BTreeMap<RouterId, ResolvedAttributes>,
    /// Highest level of every supported AS
    pub max_level: BTreeMap<AsId, u32>,
    /// ASes with unsupported levels. They get no iBGP sessions.
    pub unsupported: BTreeSet<AsId>,
}

/// Synthesize all eBGP and iBGP sessions of the topology into the empty session graph.
///
/// If the session graph is not empty, nothing is changed and [`Error::SessionGraphNotEmpty`] is
/// returned. Problems of single ASes are recorded in `diag` and never abort the synthesis.
pub fn synthesize(
    topology: &Topology,
    sessions: &mut SessionGraph,
    diag: &mut Diagnostics,
) -> Result<(), Error> {
    if !sessions.is_empty() {
        diag.record(
            Scope::Run,
            DiagnosticKind::SessionGraphNotEmpty,
            "Session graph is not empty! Refusing to synthesize into it.",
        );
        return Err(Error::SessionGraphNotEmpty);
    }

    let resolution = resolve_attributes(topology, diag)?;

    for router in topology.routers() {
        let attrs = match resolution.attrs.get(&router) {
            Some(a) => a.clone(),
            None => continue,
        };
        sessions.insert_router(
            router,
            SessionNode { asn: topology.asn(router)?, attrs, policy: PolicyStore::default() },
        );
    }

    build_external(topology, sessions)?;
    for (asn, max_level) in resolution.max_level.iter() {
        build_internal(topology, &resolution, *asn, *max_level, sessions);
    }

    info!(
        "Synthesized {} eBGP and {} iBGP sessions",
        sessions.ebgp_sessions().len(),
        sessions.ibgp_sessions().len()
    );
    Ok(())
}

/// Compute the effective hierarchy attributes of every router.
///
/// - If only some routers of an AS have a level, a diagnostic is recorded and every router of the
///   AS gets level 1. If none have a level, all get level 1.
/// - If the highest level is at least 2, the level-2 cluster defaults to the point of presence,
///   and otherwise to the AS id.
/// - If the highest level is 3, the level-3 cluster defaults to the AS id.
/// - Empty clusters are treated as unset.
/// - Levels outside of `1..=3` mark the AS as unsupported.
pub fn resolve_attributes(
    topology: &Topology,
    diag: &mut Diagnostics,
) -> Result<Resolution, Error> {
    let mut resolution = Resolution::default();

    for asn in topology.as_ids() {
        let routers = topology.routers_of_as(asn);
        let configured: Vec<Option<u32>> = routers
            .iter()
            .map(|r| topology.router(*r).map(|r| r.level()))
            .collect::<Result<_, _>>()?;
        let num_set = configured.iter().filter(|l| l.is_some()).count();

        let levels: Vec<u32> = if num_set == routers.len() {
            configured.iter().map(|l| l.unwrap_or(1)).collect()
        } else {
            if num_set > 0 {
                let missing = routers
                    .iter()
                    .zip(configured.iter())
                    .filter(|(_, l)| l.is_none())
                    .map(|(r, _)| topology.router_name(*r))
                    .join(", ");
                diag.record(
                    Scope::As(asn),
                    DiagnosticKind::PartialLevel,
                    format!("Level not set for {}; using full mesh", missing),
                );
            }
            vec![1; routers.len()]
        };

        if let Some(bad) = levels.iter().find(|l| !(1..=3).contains(*l)) {
            diag.record(
                Scope::As(asn),
                DiagnosticKind::UnsupportedLevel,
                format!("Level {} is not supported; no iBGP sessions are built", bad),
            );
            resolution.unsupported.insert(asn);
        }

        let max_level = levels.iter().copied().max().unwrap_or(1);
        let asn_str = asn.to_string();

        for (router, level) in routers.iter().zip(levels.iter()) {
            let r = topology.router(*router)?;
            // an empty cluster counts as unset
            let mut l2_cluster = r.l2_cluster().filter(|c| !c.is_empty()).map(String::from);
            let mut l3_cluster = r.l3_cluster().filter(|c| !c.is_empty()).map(String::from);
            if max_level >= 2 && l2_cluster.is_none() {
                l2_cluster = Some(r.pop().map(String::from).unwrap_or_else(|| asn_str.clone()));
            }
            if max_level == 3 && l3_cluster.is_none() {
                l3_cluster = Some(asn_str.clone());
            }
            resolution
                .attrs
                .insert(*router, ResolvedAttributes { level: *level, l2_cluster, l3_cluster });
        }

        if !resolution.unsupported.contains(&asn) {
            debug!("AS{} uses {} levels of route reflection", asn, max_level);
            resolution.max_level.insert(asn, max_level);
        }
    }

    Ok(resolution)
}

/// eBGP session for every physical link between two ASes, in both directions.
fn build_external(topology: &Topology, sessions: &mut SessionGraph) -> Result<(), Error> {
    let links: Vec<(RouterId, RouterId)> = topology.links_symmetric().collect();
    for (a, b) in links {
        if topology.asn(a)? != topology.asn(b)? {
            trace!("eBGP session {} <-> {}", topology.fqdn(a), topology.fqdn(b));
            sessions.insert_session(a, b, Session::external());
            sessions.insert_session(b, a, Session::external());
        }
    }
    Ok(())
}

fn same_cluster(a: &Option<String>, b: &Option<String>) -> bool {
    matches!((a, b), (Some(x), Some(y)) if !x.is_empty() && x == y)
}

/// Direction of the iBGP session `s -> t`, or `None` if there is no session.
fn internal_direction(
    s: &ResolvedAttributes,
    t: &ResolvedAttributes,
    max_level: u32,
) -> Option<Direction> {
    if max_level == 1 {
        return Some(Direction::Peer);
    }
    let l2 = same_cluster(&s.l2_cluster, &t.l2_cluster);
    let l3 = same_cluster(&s.l3_cluster, &t.l3_cluster);
    match (s.level, t.level) {
        (1, 2) if l2 => Some(Direction::Up),
        (2, 1) if l2 => Some(Direction::Down),
        (2, 2) if l2 => Some(Direction::Peer),
        (2, 3) if l3 && max_level == 3 => Some(Direction::Up),
        (3, 2) if l3 && max_level == 3 => Some(Direction::Down),
        (3, 3) if l3 && max_level == 3 => Some(Direction::Peer),
        _ => None,
    }
}

fn build_internal(
    topology: &Topology,
    resolution: &Resolution,
    asn: AsId,
    max_level: u32,
    sessions: &mut SessionGraph,
) {
    let routers: Vec<(RouterId, &ResolvedAttributes)> = topology
        .routers_of_as(asn)
        .into_iter()
        .filter_map(|r| resolution.attrs.get(&r).map(|a| (r, a)))
        .collect();

    let mut count = 0;
    for ((s, s_attr), (t, t_attr)) in routers.iter().cartesian_product(routers.iter()) {
        if s == t {
            continue;
        }
        if let Some(dir) = internal_direction(s_attr, t_attr, max_level) {
            sessions.insert_session(*s, *t, Session::internal(dir));
            count += 1;
        }
    }
    debug!("AS{}: {} directed iBGP sessions", asn, count);
}
