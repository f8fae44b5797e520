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

//! # Device Configuration Compiler
//!
//! The compiler projects the physical topology, the IGP graph and the session graph onto a single
//! router, and produces a [`DeviceConfig`]. It never formats any configuration text.
//!
//! Compilation of a router either succeeds, or fails for this router only. Use
//! [`Compiler::compile_all`] to compile every router of the topology on multiple threads, and to
//! collect the results in a [`CompileReport`].
//!
//! ```
//! use netsynth::compiler::{Compiler, CompilerSettings};
//! use netsynth::example_networks::{ExampleTopology, MultiAs};
//! use netsynth::sessions::SessionGraph;
//! use netsynth::Diagnostics;
//!
//! let topology = MultiAs::topology();
//! let mut diag = Diagnostics::new();
//! let sessions = SessionGraph::synthesize(&topology, &mut diag).unwrap();
//!
//! let compiler = Compiler::new(&topology, &sessions, CompilerSettings::default());
//! let report = compiler.compile_all();
//! assert!(report.is_success());
//! assert_eq!(report.configs.len(), topology.num_routers());
//! ```

mod descriptor;
mod lab;
mod platform;

pub use descriptor::*;
pub use lab::{LabInterface, LabRouter, LabTopology, MAX_BRIDGES};
pub use platform::{CompilerSettings, IgpProtocol, Platform};

use crate::diagnostics::{DiagnosticKind, Diagnostics, Scope};
use crate::sessions::route_map::RouteMap;
use crate::sessions::{Direction, PolicyStore, Session, SessionGraph};
use crate::topology::{net_entity_title, IgpNetwork, RouterId, Topology, TopologyError};
use crate::Error;

use itertools::Itertools;
use log::*;
use petgraph::visit::EdgeRef;
use serde::Serialize;
use std::net::Ipv4Addr;
use std::thread;

/// # Compiler
/// Holds all graphs needed to compile the routers. The iBGP and eBGP session graphs are derived
/// once when the compiler is created.
#[derive(Debug)]
pub struct Compiler<'a> {
    topology: &'a Topology,
    sessions: &'a SessionGraph,
    igp: IgpNetwork,
    ibgp: SessionGraph,
    ebgp: SessionGraph,
    settings: CompilerSettings,
}

impl<'a> Compiler<'a> {
    /// Create a compiler, using the IGP graph derived from the topology.
    pub fn new(
        topology: &'a Topology,
        sessions: &'a SessionGraph,
        settings: CompilerSettings,
    ) -> Self {
        Self::with_igp_graph(topology, sessions, topology.igp_graph(), settings)
    }

    /// Create a compiler with an explicit IGP graph. The node indices of the IGP graph must be the
    /// router ids of the topology.
    pub fn with_igp_graph(
        topology: &'a Topology,
        sessions: &'a SessionGraph,
        igp: IgpNetwork,
        settings: CompilerSettings,
    ) -> Self {
        Self {
            topology,
            sessions,
            igp,
            ibgp: sessions.internal_session_graph(),
            ebgp: sessions.external_session_graph(),
            settings,
        }
    }

    /// Returns the settings of the compiler
    pub fn settings(&self) -> &CompilerSettings {
        &self.settings
    }

    /// Compile the configuration of a single router.
    ///
    /// A router without a loopback address, or with a link without an address, cannot be compiled.
    /// iBGP neighbors without a loopback address are left out, and a warning is recorded.
    /// If the router has more links than the platform offers interfaces, a warning is recorded, but
    /// the configuration is still produced.
    pub fn compile_router(
        &self,
        router: RouterId,
        diag: &mut Diagnostics,
    ) -> Result<DeviceConfig, Error> {
        let r = self.topology.router(router)?;
        let hostname = self.topology.fqdn(router);
        debug!("Compiling {}", hostname);

        let platform = self.settings.platform;
        let in_degree = self.topology.in_degree(router);
        if in_degree > platform.max_interfaces() {
            diag.record(
                Scope::Router(router, hostname.clone()),
                DiagnosticKind::InterfaceLimit,
                format!(
                    "{} exceeds interface count: {} (max {})",
                    hostname,
                    in_degree,
                    platform.max_interfaces()
                ),
            );
        }

        let lo_ip = r.loopback().ok_or_else(|| Error::MissingLoopback(hostname.clone()))?;

        let interfaces = self.interfaces(router)?;
        let igp_interfaces = self.igp_interfaces(router)?;
        let (bgp_groups, route_maps) = self.bgp_groups(router, lo_ip.ip(), diag)?;

        let policy = match self.sessions.node(router) {
            Some(n) => n.policy.clone(),
            None => PolicyStore::default(),
        };
        let policy_options = PolicyOptions {
            community_lists: policy.tags,
            prefix_lists: policy.prefixes,
            route_maps,
        };

        Ok(DeviceConfig {
            hostname,
            asn: r.asn(),
            lo_ip,
            router_id: lo_ip.ip(),
            network_list: self.topology.as_block(r.asn()).into_iter().collect(),
            igp_protocol: self.settings.igp_protocol,
            interfaces,
            igp_interfaces,
            bgp_groups,
            policy_options,
        })
    }

    fn link_description(&self, src: RouterId, dst: RouterId) -> String {
        format!("Interface {} -> {}", self.topology.fqdn(src), self.topology.fqdn(dst))
    }

    fn interfaces(&self, router: RouterId) -> Result<Vec<InterfaceConfig>, Error> {
        let lo = self
            .topology
            .router(router)?
            .loopback()
            .ok_or_else(|| Error::MissingLoopback(self.topology.fqdn(router)))?;

        let mut interfaces = vec![InterfaceConfig {
            id: String::from("lo0"),
            ip: lo.ip(),
            netmask: Some(lo.mask()),
            prefixlen: lo.prefix(),
            broadcast: None,
            net_ent_title: Some(net_entity_title(lo.ip())),
            description: String::from("Loopback"),
        }];

        for (neighbor, iface) in self.topology.links(router) {
            let ip = iface.ip.ok_or_else(|| {
                Error::MissingLinkAddress(self.topology.fqdn(router), self.topology.fqdn(neighbor))
            })?;
            interfaces.push(InterfaceConfig {
                id: self.settings.platform.interface_name(iface.index),
                ip: ip.ip(),
                netmask: None,
                prefixlen: ip.prefix(),
                broadcast: Some(ip.broadcast()),
                net_ent_title: None,
                description: self.link_description(router, neighbor),
            });
        }

        Ok(interfaces)
    }

    fn igp_interfaces(&self, router: RouterId) -> Result<Vec<IgpInterface>, Error> {
        if !self.igp.contains_node(router) || self.igp.edges(router).next().is_none() {
            return Ok(Vec::new());
        }
        let platform = self.settings.platform;

        let mut igp_interfaces = vec![IgpInterface {
            id: String::from("lo0"),
            weight: None,
            description: None,
            passive: true,
        }];

        let mut igp_links: Vec<(u32, RouterId, u32)> = Vec::new();
        for e in self.igp.edges(router) {
            let neighbor = e.target();
            let iface = self
                .topology
                .interface(router, neighbor)
                .ok_or(TopologyError::RoutersNotConnected(router, neighbor))?;
            igp_links.push((iface.index, neighbor, *e.weight()));
        }
        igp_links.sort();
        for (index, neighbor, weight) in igp_links {
            igp_interfaces.push(IgpInterface {
                id: platform.logical_interface_name(index),
                weight: Some(weight),
                description: Some(self.link_description(router, neighbor)),
                passive: false,
            });
        }

        // eBGP links are advertised, but never form an adjacency
        for neighbor in self.ebgp.neighbors(router) {
            let iface = self
                .topology
                .interface(router, neighbor)
                .ok_or(TopologyError::RoutersNotConnected(router, neighbor))?;
            igp_interfaces.push(IgpInterface {
                id: platform.logical_interface_name(iface.index),
                weight: Some(iface.weight()),
                description: Some(self.link_description(router, neighbor)),
                passive: true,
            });
        }

        Ok(igp_interfaces)
    }

    /// Route maps of the session pair between `router` and `neighbor`: ingress from the edge
    /// `neighbor -> router`, egress from the edge `router -> neighbor`.
    fn route_maps(&self, router: RouterId, neighbor: RouterId) -> (&[RouteMap], &[RouteMap]) {
        let ingress =
            self.sessions.session(neighbor, router).map(|s| s.ingress.as_slice()).unwrap_or(&[]);
        let egress =
            self.sessions.session(router, neighbor).map(|s| s.egress.as_slice()).unwrap_or(&[]);
        (ingress, egress)
    }

    fn neighbor(
        &self,
        id: Ipv4Addr,
        description: String,
        ingress: &[RouteMap],
        egress: &[RouteMap],
    ) -> BgpNeighbor {
        BgpNeighbor {
            id,
            description,
            route_maps_in: ingress.iter().map(|r| r.name().to_string()).unique().collect(),
            route_maps_out: egress.iter().map(|r| r.name().to_string()).unique().collect(),
            peer_as: None,
        }
    }

    fn bgp_groups(
        &self,
        router: RouterId,
        lo: Ipv4Addr,
        diag: &mut Diagnostics,
    ) -> Result<(BgpGroups, Vec<RouteMap>), Error> {
        let mut route_maps: Vec<RouteMap> = Vec::new();
        let mut peers: Vec<BgpNeighbor> = Vec::new();
        let mut clients: Vec<BgpNeighbor> = Vec::new();

        for neighbor in self.ibgp.neighbors(router) {
            let direction = self.ibgp.session(router, neighbor).and_then(|s: &Session| s.direction);
            let neighbor_lo = match self.topology.router(neighbor)?.loopback() {
                Some(lo) => lo,
                None => {
                    let hostname = self.topology.fqdn(router);
                    diag.record(
                        Scope::Router(router, hostname.clone()),
                        DiagnosticKind::MissingNeighborLoopback,
                        format!(
                            "{}: iBGP neighbor {} has no loopback address; skipping it",
                            hostname,
                            self.topology.fqdn(neighbor)
                        ),
                    );
                    continue;
                }
            };
            let (ingress, egress) = self.route_maps(router, neighbor);
            route_maps.extend(ingress.iter().cloned());
            route_maps.extend(egress.iter().cloned());
            let description = format!(
                "{} to {}",
                direction.unwrap_or(Direction::Peer),
                self.topology.fqdn(neighbor)
            );
            let n = self.neighbor(neighbor_lo.ip(), description, ingress, egress);
            match direction {
                Some(Direction::Down) => clients.push(n),
                _ => peers.push(n),
            }
        }

        let mut external: Vec<BgpNeighbor> = Vec::new();
        for neighbor in self.ebgp.neighbors(router) {
            let peer_ip = self
                .topology
                .interface(neighbor, router)
                .and_then(|i| i.ip)
                .ok_or_else(|| {
                    Error::MissingLinkAddress(
                        self.topology.fqdn(neighbor),
                        self.topology.fqdn(router),
                    )
                })?;
            let (ingress, egress) = self.route_maps(router, neighbor);
            route_maps.extend(ingress.iter().cloned());
            route_maps.extend(egress.iter().cloned());
            let description = format!("eBGP to {}", self.topology.fqdn(neighbor));
            let mut n = self.neighbor(peer_ip.ip(), description, ingress, egress);
            n.peer_as = Some(self.topology.asn(neighbor)?);
            external.push(n);
        }

        let internal_rr = if clients.is_empty() {
            None
        } else {
            let mut group = BgpGroup::new(GroupType::Internal, clients);
            group.cluster = Some(lo);
            Some(group)
        };
        let external_peers = if self.ebgp.contains_router(router) {
            Some(BgpGroup::new(GroupType::External, external))
        } else {
            None
        };

        let groups = BgpGroups {
            internal_peers: BgpGroup::new(GroupType::Internal, peers),
            internal_rr,
            external_peers,
        };

        // route maps are identified by their name
        let route_maps = route_maps.into_iter().unique().collect();

        Ok((groups, route_maps))
    }

    /// Compile all routers of the topology, using the configured number of worker threads. The
    /// report lists the routers in ascending order, independent of the number of threads.
    pub fn compile_all(&self) -> CompileReport {
        let routers: Vec<RouterId> = self.topology.routers().collect();
        let n_threads = self.settings.threads.unwrap_or_else(num_cpus::get).max(1);
        let chunk_size = ((routers.len() + n_threads - 1) / n_threads).max(1);
        info!("Compiling {} routers on {} threads", routers.len(), n_threads);

        type WorkerResult = (RouterId, Result<DeviceConfig, Error>, Diagnostics);
        let results: Vec<WorkerResult> = thread::scope(|s| {
            let handles = routers
                .chunks(chunk_size)
                .map(|chunk| {
                    let handle = s.spawn(move || {
                        chunk
                            .iter()
                            .map(|r| {
                                let mut diag = Diagnostics::new();
                                let result = self.compile_router(*r, &mut diag);
                                (*r, result, diag)
                            })
                            .collect::<Vec<_>>()
                    });
                    (chunk, handle)
                })
                .collect::<Vec<_>>();

            handles
                .into_iter()
                .flat_map(|(chunk, handle)| match handle.join() {
                    Ok(results) => results,
                    Err(_) => {
                        error!("Worker thread panicked!");
                        chunk
                            .iter()
                            .map(|r| (*r, Err(Error::WorkerPanicked(*r)), Diagnostics::new()))
                            .collect()
                    }
                })
                .collect()
        });

        let mut report = CompileReport::default();
        for (router, result, diag) in results {
            report.diagnostics.merge(diag);
            match result {
                Ok(config) => report.configs.push(config),
                Err(e) => {
                    let hostname = self.topology.fqdn(router);
                    report.diagnostics.record(
                        Scope::Router(router, hostname.clone()),
                        DiagnosticKind::CompileFailure,
                        format!("Cannot compile {}: {}", hostname, e),
                    );
                    report.failures.push(CompileFailure { router, hostname, error: e });
                }
            }
        }

        info!("Compiled {} routers, {} failed", report.configs.len(), report.failures.len());
        report
    }
}

/// A router that could not be compiled
#[derive(Debug, Clone, PartialEq)]
pub struct CompileFailure {
    /// Router id
    pub router: RouterId,
    /// Fully qualified name of the router
    pub hostname: String,
    /// Reason
    pub error: Error,
}

/// Result of compiling all routers
#[derive(Debug, Clone, Default)]
pub struct CompileReport {
    /// Configurations of all successfully compiled routers, in ascending order of the router id
    pub configs: Vec<DeviceConfig>,
    /// All routers that could not be compiled
    pub failures: Vec<CompileFailure>,
    /// Diagnostics recorded while compiling
    pub diagnostics: Diagnostics,
}

impl CompileReport {
    /// Returns true if every router was compiled.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Put the diagnostics recorded before compiling (e.g., during synthesis) in front of the
    /// diagnostics of the compiler.
    pub fn prepend_diagnostics(&mut self, mut earlier: Diagnostics) {
        earlier.merge(std::mem::take(&mut self.diagnostics));
        self.diagnostics = earlier;
    }

    /// Returns the configuration of the router with the given hostname
    pub fn config(&self, hostname: &str) -> Option<&DeviceConfig> {
        self.configs.iter().find(|c| c.hostname == hostname)
    }

    /// End-of-run summary, suitable for writing as JSON.
    pub fn summary(&self) -> ReportSummary<'_> {
        ReportSummary {
            compiled: self.configs.iter().map(|c| c.hostname.as_str()).collect(),
            failed: self
                .failures
                .iter()
                .map(|f| FailureSummary {
                    hostname: f.hostname.as_str(),
                    reason: f.error.to_string(),
                })
                .collect(),
            diagnostics: &self.diagnostics,
        }
    }
}

/// Serializable end-of-run summary
#[derive(Debug, Serialize)]
pub struct ReportSummary<'a> {
    /// Hostnames of all compiled routers
    pub compiled: Vec<&'a str>,
    /// All failed routers
    pub failed: Vec<FailureSummary<'a>>,
    /// All diagnostics of the run
    pub diagnostics: &'a Diagnostics,
}

/// Serializable failure of a single router
#[derive(Debug, Serialize)]
pub struct FailureSummary<'a> {
    /// Hostname of the router
    pub hostname: &'a str,
    /// Reason for the failure
    pub reason: String,
}
