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

//! # Emulation lab
//!
//! Describes how the routers are wired together in the emulator. Every link subnet gets its own
//! bridge, named `private<N>`, where `N` counts up in the order the subnets are first seen.

use super::Platform;
use crate::diagnostics::{DiagnosticKind, Diagnostics, Scope};
use crate::topology::Topology;
use crate::Error;

use ipnetwork::Ipv4Network;
use log::*;
use serde::Serialize;
use std::collections::HashMap;

/// Maximum number of bridges supported by the emulator
pub const MAX_BRIDGES: usize = 64;

/// Interface of a router in the lab
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabInterface {
    /// Emulator interface id (`em<index + 1>`)
    pub id: String,
    /// Platform interface name, as used in the router configuration
    pub platform_id: String,
    /// Bridge to which the interface is connected
    pub bridge_id: String,
    /// Description
    pub description: String,
}

/// Router in the lab
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabRouter {
    /// Fully qualified name of the router
    pub hostname: String,
    /// Name of the configuration file
    pub config: String,
    /// Interfaces, sorted by interface index
    pub interfaces: Vec<LabInterface>,
}

/// Topology of the emulation lab
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabTopology {
    /// All routers, in ascending order of the router id
    pub routers: Vec<LabRouter>,
    /// Number of allocated bridges
    pub num_bridges: usize,
}

impl LabTopology {
    /// Build the lab topology. If more than [`MAX_BRIDGES`] bridges are needed, a warning is
    /// recorded. Every link must have an address.
    pub fn build(
        topology: &Topology,
        platform: Platform,
        diag: &mut Diagnostics,
    ) -> Result<Self, Error> {
        let mut bridges: HashMap<Ipv4Network, String> = HashMap::new();
        let mut routers = Vec::new();

        for router in topology.routers() {
            let hostname = topology.fqdn(router);
            let mut interfaces = Vec::new();
            for (neighbor, iface) in topology.links(router) {
                let missing =
                    || Error::MissingLinkAddress(hostname.clone(), topology.fqdn(neighbor));
                let ip = iface.ip.ok_or_else(missing)?;
                let subnet = Ipv4Network::new(ip.network(), ip.prefix()).map_err(|_| missing())?;
                let next_id = bridges.len();
                let bridge_id =
                    bridges.entry(subnet).or_insert_with(|| format!("private{}", next_id)).clone();
                interfaces.push(LabInterface {
                    id: format!("em{}", iface.index + 1),
                    platform_id: platform.interface_name(iface.index),
                    bridge_id,
                    description: format!("Interface {} -> {}", hostname, topology.fqdn(neighbor)),
                });
            }
            routers.push(LabRouter { config: format!("{}.conf", hostname), hostname, interfaces });
        }

        if bridges.len() > MAX_BRIDGES {
            diag.record(
                Scope::Run,
                DiagnosticKind::BridgeLimit,
                format!(
                    "Lab needs {} bridges, but at most {} are supported",
                    bridges.len(),
                    MAX_BRIDGES
                ),
            );
        }
        debug!("Lab topology uses {} bridges", bridges.len());

        Ok(Self { routers, num_bridges: bridges.len() })
    }
}
