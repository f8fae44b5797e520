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

//! # Physical Topology
//!
//! This module contains the physical network: all routers with their attributes, and all links
//! between them. Every link is stored as two directed edges, where each edge carries the
//! [`Interface`] of its source router. This way, the address and the interface index used by a
//! router on a link are found by looking at the edge `router -> neighbor`.
//!
//! ```rust
//! use netsynth::topology::{Topology, AsId};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut t = Topology::new();
//!
//!     let r1 = t.add_router("r1", AsId(1));
//!     let r2 = t.add_router("r2", AsId(1));
//!     t.add_link(r1, r2)?;
//!     t.set_link_subnet(r1, r2, "10.0.0.0/30".parse()?)?;
//!
//!     assert_eq!(t.interface(r1, r2).unwrap().index, 0);
//!     assert_eq!(t.interface(r1, r2).unwrap().ip.unwrap().ip().to_string(), "10.0.0.1");
//!     assert_eq!(t.interface(r2, r1).unwrap().ip.unwrap().ip().to_string(), "10.0.0.2");
//!     Ok(())
//! }
//! ```

mod addressing;
mod types;

pub use addressing::{allocate_addresses, net_entity_title};
pub use types::*;

use ipnetwork::Ipv4Network;
use log::*;
use petgraph::prelude::*;
use petgraph::stable_graph::StableGraph;
use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;

/// # Router
/// A node of the physical topology. Apart from the AS id, all hierarchy attributes are optional.
/// They are read by the session synthesizer, but never modified by it.
#[derive(Debug, Clone, PartialEq)]
pub struct Router {
    name: String,
    router_id: RouterId,
    asn: AsId,
    level: Option<u32>,
    pop: Option<String>,
    l2_cluster: Option<String>,
    l3_cluster: Option<String>,
    loopback: Option<Ipv4Network>,
    next_iface: u32,
}

impl Router {
    fn new(name: String, router_id: RouterId, asn: AsId) -> Self {
        Self {
            name,
            router_id,
            asn,
            level: None,
            pop: None,
            l2_cluster: None,
            l3_cluster: None,
            loopback: None,
            next_iface: 0,
        }
    }

    /// Return the name of the router
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the router id
    pub fn router_id(&self) -> RouterId {
        self.router_id
    }

    /// Return the AS id
    pub fn asn(&self) -> AsId {
        self.asn
    }

    /// Route-reflection tier, if configured
    pub fn level(&self) -> Option<u32> {
        self.level
    }

    /// Point of presence, if configured
    pub fn pop(&self) -> Option<&str> {
        self.pop.as_deref()
    }

    /// Configured level-2 cluster
    pub fn l2_cluster(&self) -> Option<&str> {
        self.l2_cluster.as_deref()
    }

    /// Configured level-3 cluster
    pub fn l3_cluster(&self) -> Option<&str> {
        self.l3_cluster.as_deref()
    }

    /// Loopback address (including the prefix length)
    pub fn loopback(&self) -> Option<Ipv4Network> {
        self.loopback
    }
}

/// Interface of a router towards one of its neighbors.
#[derive(Debug, Clone, PartialEq)]
pub struct Interface {
    /// Interface index, assigned once when the link is created. Platform interface names are
    /// derived from it.
    pub index: u32,
    /// Address of this interface, together with the prefix length of the link subnet.
    pub ip: Option<Ipv4Network>,
    /// Weight of the link in the IGP. If unset, [`DEFAULT_LINK_WEIGHT`] is used.
    pub weight: Option<LinkWeight>,
}

impl Interface {
    /// Returns the configured weight, or the default weight.
    pub fn weight(&self) -> LinkWeight {
        self.weight.unwrap_or(DEFAULT_LINK_WEIGHT)
    }
}

/// # Topology
/// The physical network. Routers are never removed, which guarantees that the [`RouterId`]s of the
/// topology can be used as indices into every graph derived from it.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    graph: StableGraph<Router, Interface, Directed, u32>,
    as_blocks: BTreeMap<AsId, Ipv4Network>,
}

impl Topology {
    /// Generate an empty topology
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new router to the topology, and return its id.
    pub fn add_router<S: Into<String>>(&mut self, name: S, asn: AsId) -> RouterId {
        let name = name.into();
        let router_id = self.graph.add_node(Router::new(name.clone(), 0.into(), asn));
        self.graph[router_id].router_id = router_id;
        trace!("Added router {} (AS{}) as {:?}", name, asn, router_id);
        router_id
    }

    /// Returns the number of routers
    pub fn num_routers(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns an iterator over all router ids, in ascending order.
    pub fn routers(&self) -> impl Iterator<Item = RouterId> + '_ {
        self.graph.node_indices()
    }

    /// Returns a reference to the router
    pub fn router(&self, router: RouterId) -> Result<&Router, TopologyError> {
        self.graph.node_weight(router).ok_or(TopologyError::RouterNotFound(router))
    }

    fn router_mut(&mut self, router: RouterId) -> Result<&mut Router, TopologyError> {
        self.graph.node_weight_mut(router).ok_or(TopologyError::RouterNotFound(router))
    }

    /// Get the router id from the name
    pub fn get_router_id(&self, name: impl AsRef<str>) -> Result<RouterId, TopologyError> {
        self.graph
            .node_indices()
            .find(|r| self.graph[*r].name == name.as_ref())
            .ok_or_else(|| TopologyError::RouterNameNotFound(name.as_ref().to_string()))
    }

    /// Get the name of the router, or `"?"` if the router does not exist.
    pub fn router_name(&self, router: RouterId) -> &str {
        self.graph.node_weight(router).map(|r| r.name.as_str()).unwrap_or("?")
    }

    /// Set the route-reflection level of a router
    pub fn set_level(&mut self, router: RouterId, level: u32) -> Result<(), TopologyError> {
        self.router_mut(router)?.level = Some(level);
        Ok(())
    }

    /// Set the point of presence of a router
    pub fn set_pop(
        &mut self,
        router: RouterId,
        pop: impl Into<String>,
    ) -> Result<(), TopologyError> {
        self.router_mut(router)?.pop = Some(pop.into());
        Ok(())
    }

    /// Set the level-2 cluster of a router
    pub fn set_l2_cluster(
        &mut self,
        router: RouterId,
        cluster: impl Into<String>,
    ) -> Result<(), TopologyError> {
        self.router_mut(router)?.l2_cluster = Some(cluster.into());
        Ok(())
    }

    /// Set the level-3 cluster of a router
    pub fn set_l3_cluster(
        &mut self,
        router: RouterId,
        cluster: impl Into<String>,
    ) -> Result<(), TopologyError> {
        self.router_mut(router)?.l3_cluster = Some(cluster.into());
        Ok(())
    }

    /// Set the loopback address of a router
    pub fn set_loopback(
        &mut self,
        router: RouterId,
        loopback: Ipv4Network,
    ) -> Result<(), TopologyError> {
        self.router_mut(router)?.loopback = Some(loopback);
        Ok(())
    }

    /// Returns the AS of a router.
    pub fn asn(&self, router: RouterId) -> Result<AsId, TopologyError> {
        Ok(self.router(router)?.asn)
    }

    /// Fully qualified name of the router: `<name>.AS<asn>`
    pub fn fqdn(&self, router: RouterId) -> String {
        match self.graph.node_weight(router) {
            Some(r) => format!("{}.AS{}", r.name, r.asn),
            None => String::from("?"),
        }
    }

    /// Add a physical link between two routers. Both routers get the next free interface index
    /// assigned for this link. No addresses are set; use [`Topology::set_link_subnet`] or
    /// [`allocate_addresses`] for that.
    pub fn add_link(&mut self, a: RouterId, b: RouterId) -> Result<(), TopologyError> {
        if a == b {
            return Err(TopologyError::SelfLoop(a));
        }
        self.router(a)?;
        self.router(b)?;
        if self.graph.find_edge(a, b).is_some() {
            return Err(TopologyError::LinkAlreadyExists(a, b));
        }
        let iface_a = self.next_interface(a)?;
        let iface_b = self.next_interface(b)?;
        self.graph.add_edge(a, b, Interface { index: iface_a, ip: None, weight: None });
        self.graph.add_edge(b, a, Interface { index: iface_b, ip: None, weight: None });
        trace!(
            "Added link {} [{}] -- {} [{}]",
            self.router_name(a),
            iface_a,
            self.router_name(b),
            iface_b
        );
        Ok(())
    }

    fn next_interface(&mut self, router: RouterId) -> Result<u32, TopologyError> {
        let r = self.router_mut(router)?;
        let idx = r.next_iface;
        r.next_iface += 1;
        Ok(idx)
    }

    /// Number a link with the given subnet. The router with the lower id gets the first host
    /// address, the other one the second host address. On a `/31`, the two addresses of the subnet
    /// are used.
    pub fn set_link_subnet(
        &mut self,
        a: RouterId,
        b: RouterId,
        subnet: Ipv4Network,
    ) -> Result<(), TopologyError> {
        let (first, second) = match subnet.prefix() {
            31 => (0, 1),
            p if p <= 30 => (1, 2),
            _ => return Err(TopologyError::SubnetTooSmall(subnet)),
        };
        let base = u32::from(subnet.network());
        let host = |offset: u32| {
            Ipv4Network::new(Ipv4Addr::from(base + offset), subnet.prefix())
                .map_err(|_| TopologyError::SubnetTooSmall(subnet))
        };
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let lo_ip = host(first)?;
        let hi_ip = host(second)?;
        self.interface_mut(lo, hi)?.ip = Some(lo_ip);
        self.interface_mut(hi, lo)?.ip = Some(hi_ip);
        Ok(())
    }

    /// Set the IGP weight of a link (in both directions).
    pub fn set_link_weight(
        &mut self,
        a: RouterId,
        b: RouterId,
        weight: LinkWeight,
    ) -> Result<(), TopologyError> {
        self.interface_mut(a, b)?.weight = Some(weight);
        self.interface_mut(b, a)?.weight = Some(weight);
        Ok(())
    }

    /// Returns the interface of `router` towards `neighbor`.
    pub fn interface(&self, router: RouterId, neighbor: RouterId) -> Option<&Interface> {
        self.graph.find_edge(router, neighbor).map(|e| &self.graph[e])
    }

    fn interface_mut(
        &mut self,
        router: RouterId,
        neighbor: RouterId,
    ) -> Result<&mut Interface, TopologyError> {
        let e = self
            .graph
            .find_edge(router, neighbor)
            .ok_or(TopologyError::RoutersNotConnected(router, neighbor))?;
        Ok(&mut self.graph[e])
    }

    /// Returns all links of a router, as `(neighbor, interface)`, sorted by the interface index.
    pub fn links(&self, router: RouterId) -> Vec<(RouterId, &Interface)> {
        let mut links: Vec<(RouterId, &Interface)> =
            self.graph.edges(router).map(|e| (e.target(), e.weight())).collect();
        links.sort_by_key(|(_, iface)| iface.index);
        links
    }

    /// Returns an iterator over all links, where every link is reported only once as `(a, b)` with
    /// `a < b`.
    pub fn links_symmetric(&self) -> impl Iterator<Item = (RouterId, RouterId)> + '_ {
        self.graph
            .edge_indices()
            .filter_map(move |e| self.graph.edge_endpoints(e))
            .filter(|(a, b)| a < b)
    }

    /// Number of links that terminate at the router
    pub fn in_degree(&self, router: RouterId) -> usize {
        self.graph.neighbors_directed(router, Incoming).count()
    }

    /// Returns the set of all AS ids present in the topology.
    pub fn as_ids(&self) -> BTreeSet<AsId> {
        self.graph.node_indices().map(|r| self.graph[r].asn).collect()
    }

    /// Returns all routers of an AS, in ascending order.
    pub fn routers_of_as(&self, asn: AsId) -> Vec<RouterId> {
        self.graph.node_indices().filter(|r| self.graph[*r].asn == asn).collect()
    }

    /// Address block assigned to an AS by [`allocate_addresses`].
    pub fn as_block(&self, asn: AsId) -> Option<Ipv4Network> {
        self.as_blocks.get(&asn).copied()
    }

    pub(crate) fn set_as_block(&mut self, asn: AsId, block: Ipv4Network) {
        self.as_blocks.insert(asn, block);
    }

    /// Build the IGP graph: all physical links between routers of the same AS, weighted with the
    /// link weight. Router ids are the same as in the topology.
    pub fn igp_graph(&self) -> IgpNetwork {
        let mut igp: IgpNetwork = self.graph.map(|_, _| (), |_, iface| iface.weight());
        let inter_as: Vec<_> = self
            .graph
            .edge_indices()
            .filter(|e| match self.graph.edge_endpoints(*e) {
                Some((a, b)) => self.graph[a].asn != self.graph[b].asn,
                None => false,
            })
            .collect();
        for e in inter_as {
            igp.remove_edge(e);
        }
        debug!("IGP graph has {} directed edges", igp.edge_count());
        igp
    }
}
