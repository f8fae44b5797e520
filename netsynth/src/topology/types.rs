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

//! Module containing all type definitions

use ipnetwork::Ipv4Network;
use petgraph::prelude::*;
use petgraph::stable_graph::StableGraph;
use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

type IndexType = u32;
/// Router Identification (and index into the graph)
pub type RouterId = NodeIndex<IndexType>;
/// AS Number
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct AsId(pub u32);
/// Link Weight for the IGP graph
pub type LinkWeight = u32;
/// IGP Network graph. The node indices are the same as in the physical [`Topology`].
///
/// [`Topology`]: crate::topology::Topology
pub type IgpNetwork = StableGraph<(), LinkWeight, Directed, IndexType>;

/// Default weight of a link in the IGP, if nothing else is configured.
pub const DEFAULT_LINK_WEIGHT: LinkWeight = 1;

impl fmt::Display for AsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for AsId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.0)
    }
}

/// Topology Errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TopologyError {
    /// Router is not present in the topology
    #[error("Router was not found in topology: {0:?}")]
    RouterNotFound(RouterId),
    /// Router name is not present in the topology
    #[error("Router name was not found in topology: {0}")]
    RouterNameNotFound(String),
    /// A link cannot connect a router with itself
    #[error("Cannot add a link from {0:?} to itself")]
    SelfLoop(RouterId),
    /// The two routers are already connected
    #[error("Link already exists: {0:?} -- {1:?}")]
    LinkAlreadyExists(RouterId, RouterId),
    /// Two routers are not adjacent
    #[error("Link does not exist: {0:?} -- {1:?}")]
    RoutersNotConnected(RouterId, RouterId),
    /// The subnet does not contain enough addresses for both link endpoints
    #[error("Subnet {0} is too small for a point-to-point link")]
    SubnetTooSmall(Ipv4Network),
    /// The address pool has no space left
    #[error("Address pool {0} is exhausted")]
    PoolExhausted(Ipv4Network),
}
