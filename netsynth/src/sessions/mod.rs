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

//! # BGP Session Graph
//!
//! The session graph is a directed graph over the routers of a
//! [`Topology`](crate::topology::Topology). Every BGP session is present as two directed edges,
//! one per endpoint. Each edge carries a [`Session`] with the kind of the session, the
//! route-reflection direction (for iBGP), and the ingress and egress route maps. Every router
//! additionally carries a [`SessionNode`] with the resolved hierarchy attributes and the policy
//! store (community lists and prefix lists).
//!
//! The graph is built by [`synthesize`]. Afterwards, the policy engine may attach route maps and
//! fill the policy stores. The compiler only reads the graph.

pub mod route_map;
mod synthesize;

pub use synthesize::{resolve_attributes, synthesize, Resolution};

use crate::diagnostics::Diagnostics;
use crate::topology::{AsId, RouterId, Topology};
use crate::Error;
use route_map::RouteMap;

use ipnetwork::Ipv4Network;
use petgraph::graphmap::DiGraphMap;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Kind of a BGP session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SessionKind {
    /// Session between two different ASes
    External,
    /// Session inside an AS
    Internal,
}

/// Role of a directed iBGP session in the route-reflection hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Both routers are on the same tier
    Peer,
    /// Client to route reflector
    Up,
    /// Route reflector to client
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Peer => write!(f, "peer"),
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
        }
    }
}

/// Directed session edge
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Kind of the session
    pub kind: SessionKind,
    /// Route-reflection direction. Always `None` for external sessions.
    pub direction: Option<Direction>,
    /// Route maps applied at the target of this edge, on routes received from the source.
    pub ingress: Vec<RouteMap>,
    /// Route maps applied at the source of this edge, on routes advertised to the target.
    pub egress: Vec<RouteMap>,
}

impl Session {
    /// New eBGP session without any route maps
    pub fn external() -> Self {
        Self {
            kind: SessionKind::External,
            direction: None,
            ingress: Vec::new(),
            egress: Vec::new(),
        }
    }

    /// New iBGP session without any route maps
    pub fn internal(direction: Direction) -> Self {
        Self {
            kind: SessionKind::Internal,
            direction: Some(direction),
            ingress: Vec::new(),
            egress: Vec::new(),
        }
    }

    /// Returns true if the session is an eBGP session
    pub fn is_external(&self) -> bool {
        self.kind == SessionKind::External
    }

    /// Returns true if the session is an iBGP session
    pub fn is_internal(&self) -> bool {
        self.kind == SessionKind::Internal
    }
}

/// Hierarchy attributes of a router after all defaults are applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedAttributes {
    /// Route-reflection tier
    pub level: u32,
    /// Level-2 cluster
    pub l2_cluster: Option<String>,
    /// Level-3 cluster
    pub l3_cluster: Option<String>,
}

impl ResolvedAttributes {
    /// Returns true if the router reflects routes to some lower tier.
    pub fn route_reflector(&self) -> bool {
        self.level > 1
    }
}

/// Named community lists and prefix lists of a router.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PolicyStore {
    /// Community lists, mapping the name to the community
    pub tags: BTreeMap<String, String>,
    /// Prefix lists, mapping the name to the list of prefixes
    pub prefixes: BTreeMap<String, Vec<Ipv4Network>>,
}

/// Per-router data of the session graph
#[derive(Debug, Clone, PartialEq)]
pub struct SessionNode {
    /// AS of the router
    pub asn: AsId,
    /// Resolved hierarchy attributes
    pub attrs: ResolvedAttributes,
    /// Policy store
    pub policy: PolicyStore,
}

/// # Session Graph
#[derive(Debug, Clone)]
pub struct SessionGraph {
    graph: DiGraphMap<RouterId, Session>,
    nodes: BTreeMap<RouterId, SessionNode>,
}

impl Default for SessionGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionGraph {
    /// Create an empty session graph
    pub fn new() -> Self {
        Self { graph: DiGraphMap::new(), nodes: BTreeMap::new() }
    }

    /// Create a new session graph and synthesize all sessions of the topology into it.
    pub fn synthesize(topology: &Topology, diag: &mut Diagnostics) -> Result<Self, Error> {
        let mut g = Self::new();
        synthesize(topology, &mut g, diag)?;
        Ok(g)
    }

    /// Returns true if the graph contains neither routers nor sessions.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.graph.node_count() == 0
    }

    pub(crate) fn insert_router(&mut self, router: RouterId, node: SessionNode) {
        self.graph.add_node(router);
        self.nodes.insert(router, node);
    }

    pub(crate) fn insert_session(&mut self, source: RouterId, target: RouterId, session: Session) {
        self.graph.add_edge(source, target, session);
    }

    /// Returns all routers in ascending order
    pub fn routers(&self) -> impl Iterator<Item = RouterId> + '_ {
        self.nodes.keys().copied()
    }

    /// Returns true if the router is part of the graph
    pub fn contains_router(&self, router: RouterId) -> bool {
        self.nodes.contains_key(&router)
    }

    /// Returns the node data of a router
    pub fn node(&self, router: RouterId) -> Option<&SessionNode> {
        self.nodes.get(&router)
    }

    /// Returns the number of directed session edges
    pub fn num_sessions(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns the directed session `source -> target`
    pub fn session(&self, source: RouterId, target: RouterId) -> Option<&Session> {
        self.graph.edge_weight(source, target)
    }

    /// All session neighbors of a router, in ascending order.
    pub fn neighbors(&self, router: RouterId) -> Vec<RouterId> {
        if !self.graph.contains_node(router) {
            return Vec::new();
        }
        let mut n: Vec<RouterId> = self.graph.neighbors(router).collect();
        n.sort();
        n
    }

    /// Policy store of a router
    pub fn policy_store(&self, router: RouterId) -> Result<&PolicyStore, Error> {
        self.nodes
            .get(&router)
            .map(|n| &n.policy)
            .ok_or(Error::RouterNotInSessionGraph(router))
    }

    /// Mutable policy store of a router, used by the policy engine.
    pub fn policy_store_mut(&mut self, router: RouterId) -> Result<&mut PolicyStore, Error> {
        self.nodes
            .get_mut(&router)
            .map(|n| &mut n.policy)
            .ok_or(Error::RouterNotInSessionGraph(router))
    }

    /// Append a route map to the ingress list of the session `source -> target`. It is applied by
    /// `target` on all routes received from `source`.
    pub fn add_ingress(
        &mut self,
        source: RouterId,
        target: RouterId,
        route_map: RouteMap,
    ) -> Result<(), Error> {
        self.graph
            .edge_weight_mut(source, target)
            .ok_or(Error::NoSession(source, target))?
            .ingress
            .push(route_map);
        Ok(())
    }

    /// Append a route map to the egress list of the session `source -> target`. It is applied by
    /// `source` on all routes advertised to `target`.
    pub fn add_egress(
        &mut self,
        source: RouterId,
        target: RouterId,
        route_map: RouteMap,
    ) -> Result<(), Error> {
        self.graph
            .edge_weight_mut(source, target)
            .ok_or(Error::NoSession(source, target))?
            .egress
            .push(route_map);
        Ok(())
    }

    /// All directed eBGP sessions, sorted.
    pub fn ebgp_sessions(&self) -> Vec<(RouterId, RouterId)> {
        let mut s: Vec<_> = self
            .graph
            .all_edges()
            .filter(|(_, _, e)| e.is_external())
            .map(|(a, b, _)| (a, b))
            .collect();
        s.sort();
        s
    }

    /// All directed iBGP sessions with their direction, sorted.
    pub fn ibgp_sessions(&self) -> Vec<(RouterId, RouterId, Option<Direction>)> {
        let mut s: Vec<_> = self
            .graph
            .all_edges()
            .filter(|(_, _, e)| e.is_internal())
            .map(|(a, b, e)| (a, b, e.direction))
            .collect();
        s.sort_by_key(|(a, b, _)| (*a, *b));
        s
    }

    fn routers_with(&self, kind: SessionKind) -> BTreeSet<RouterId> {
        self.graph
            .all_edges()
            .filter(|(_, _, e)| e.kind == kind)
            .flat_map(|(a, b, _)| vec![a, b])
            .collect()
    }

    /// Routers with at least one eBGP session
    pub fn external_routers(&self) -> BTreeSet<RouterId> {
        self.routers_with(SessionKind::External)
    }

    /// Routers with at least one iBGP session
    pub fn internal_routers(&self) -> BTreeSet<RouterId> {
        self.routers_with(SessionKind::Internal)
    }

    fn induced(&self, kind: SessionKind) -> SessionGraph {
        let mut g = SessionGraph::new();
        for r in self.routers_with(kind) {
            if let Some(node) = self.nodes.get(&r) {
                g.insert_router(r, node.clone());
            }
        }
        for (a, b, e) in self.graph.all_edges() {
            if e.kind == kind {
                g.insert_session(a, b, e.clone());
            }
        }
        g
    }

    /// Subgraph induced on the external routers, containing only the eBGP sessions.
    pub fn external_session_graph(&self) -> SessionGraph {
        self.induced(SessionKind::External)
    }

    /// Subgraph induced on the internal routers, containing only the iBGP sessions.
    pub fn internal_session_graph(&self) -> SessionGraph {
        self.induced(SessionKind::Internal)
    }
}
