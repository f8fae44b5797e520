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

//! # Device configuration descriptor
//!
//! Plain records handed to the renderer. They carry no behavior, and serialize to JSON with the
//! field names used by the renderer templates.

use super::IgpProtocol;
use crate::sessions::route_map::RouteMap;
use crate::topology::{AsId, LinkWeight};

use ipnetwork::Ipv4Network;
use serde::Serialize;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

/// Configuration of a single router
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceConfig {
    /// Fully qualified name of the router
    pub hostname: String,
    /// AS of the router
    pub asn: AsId,
    /// Loopback address
    pub lo_ip: Ipv4Network,
    /// BGP router id
    pub router_id: Ipv4Addr,
    /// Networks advertised into BGP
    pub network_list: Vec<Ipv4Network>,
    /// IGP used in the AS
    pub igp_protocol: IgpProtocol,
    /// All interfaces, loopback first
    pub interfaces: Vec<InterfaceConfig>,
    /// Interfaces enabled in the IGP. Empty if the router has no IGP links.
    pub igp_interfaces: Vec<IgpInterface>,
    /// BGP neighbor groups
    pub bgp_groups: BgpGroups,
    /// Community lists, prefix lists and route maps
    pub policy_options: PolicyOptions,
}

/// A physical or loopback interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceConfig {
    /// Platform interface name
    pub id: String,
    /// Address of the interface
    pub ip: Ipv4Addr,
    /// Netmask, only set on the loopback
    #[serde(skip_serializing_if = "Option::is_none")]
    pub netmask: Option<Ipv4Addr>,
    /// Prefix length
    pub prefixlen: u8,
    /// Broadcast address of the link subnet, only set on physical interfaces
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broadcast: Option<Ipv4Addr>,
    /// IS-IS network entity title, only set on the loopback
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_ent_title: Option<String>,
    /// Description
    pub description: String,
}

/// An interface enabled in the IGP
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IgpInterface {
    /// Logical interface name
    pub id: String,
    /// IGP weight (not set on the loopback)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<LinkWeight>,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Passive interfaces are advertised, but never form an adjacency.
    pub passive: bool,
}

/// Type of a BGP group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupType {
    /// iBGP group
    Internal,
    /// eBGP group
    External,
}

/// A BGP neighbor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BgpNeighbor {
    /// Address of the neighbor. The loopback for iBGP, the link address for eBGP.
    pub id: Ipv4Addr,
    /// Description, naming the direction and the neighbor
    pub description: String,
    /// Names of the route maps applied on routes from the neighbor
    pub route_maps_in: Vec<String>,
    /// Names of the route maps applied on routes to the neighbor
    pub route_maps_out: Vec<String>,
    /// AS of the neighbor, only set for eBGP neighbors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer_as: Option<AsId>,
}

/// A group of BGP neighbors
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BgpGroup {
    /// Type of the group
    #[serde(rename = "type")]
    pub group_type: GroupType,
    /// Neighbors, in ascending order of the router id
    pub neighbors: Vec<BgpNeighbor>,
    /// Cluster id, only set on the route-reflector client group
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<Ipv4Addr>,
}

impl BgpGroup {
    pub(crate) fn new(group_type: GroupType, neighbors: Vec<BgpNeighbor>) -> Self {
        Self { group_type, neighbors, cluster: None }
    }
}

/// The BGP groups of a router
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BgpGroups {
    /// iBGP peers and route reflectors of this router. Always present.
    pub internal_peers: BgpGroup,
    /// Route-reflector clients of this router
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_rr: Option<BgpGroup>,
    /// eBGP neighbors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_peers: Option<BgpGroup>,
}

/// Policy options block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyOptions {
    /// Community lists of the router
    pub community_lists: BTreeMap<String, String>,
    /// Prefix lists of the router
    pub prefix_lists: BTreeMap<String, Vec<Ipv4Network>>,
    /// Every route map referenced by some neighbor, once per name, in first-seen order.
    pub route_maps: Vec<RouteMap>,
}
