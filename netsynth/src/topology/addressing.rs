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

//! # Address allocation
//!
//! ## IP Convention
//!
//! The pool is split into equally sized blocks, one per AS (in ascending order of the AS id). The
//! blocks are 8 bits longer than the pool, e.g. a `/8` pool is split into `/16` blocks.
//!
//! - **Loopback addresses** are taken as `/32` from the first 256 addresses of the AS block,
//!   starting with the second address.
//! - **Links inside an AS** are numbered as `/30` subnets out of the rest of the AS block.
//! - **Links between two ASes** are numbered out of the block of the AS with the lower id.
//!
//! Addresses that are already configured are kept.

use super::{AsId, RouterId, Topology, TopologyError};

use ipnetwork::Ipv4Network;
use log::*;
use std::collections::HashMap;
use std::net::Ipv4Addr;

const LOOPBACK_RANGE: u32 = 256;
const LINK_SUBNET_SIZE: u32 = 4;
const LINK_PREFIX: u8 = 30;

/// Allocate loopback addresses and link subnets for all routers and links that don't have one
/// yet. See the [module documentation](self) for the address plan.
pub fn allocate_addresses(topology: &mut Topology, pool: Ipv4Network) -> Result<(), TopologyError> {
    let as_ids: Vec<AsId> = topology.as_ids().into_iter().collect();
    let block_prefix = pool.prefix() + 8;
    if block_prefix > 22 || as_ids.len() > 256 {
        return Err(TopologyError::PoolExhausted(pool));
    }
    let block_size: u32 = 1 << (32 - block_prefix);
    let pool_base = u32::from(pool.network());

    // (next free link address, end of the block) per AS
    let mut cursors: HashMap<AsId, (u32, u32)> = HashMap::new();

    for (i, asn) in as_ids.iter().enumerate() {
        let base = pool_base + i as u32 * block_size;
        let block = Ipv4Network::new(Ipv4Addr::from(base), block_prefix)
            .map_err(|_| TopologyError::PoolExhausted(pool))?;
        topology.set_as_block(*asn, block);
        cursors.insert(*asn, (base + LOOPBACK_RANGE, base + block_size));
        debug!("AS{} gets address block {}", asn, block);

        let mut next_loopback = base + 1;
        for router in topology.routers_of_as(*asn) {
            if topology.router(router)?.loopback().is_some() {
                continue;
            }
            if next_loopback >= base + LOOPBACK_RANGE - 1 {
                return Err(TopologyError::PoolExhausted(block));
            }
            let lo = Ipv4Network::new(Ipv4Addr::from(next_loopback), 32)
                .map_err(|_| TopologyError::PoolExhausted(block))?;
            topology.set_loopback(router, lo)?;
            next_loopback += 1;
        }
    }

    let links: Vec<(RouterId, RouterId)> = topology.links_symmetric().collect();
    for (a, b) in links {
        let numbered = topology.interface(a, b).map(|i| i.ip.is_some()).unwrap_or(false);
        if numbered {
            continue;
        }
        let owner = std::cmp::min(topology.asn(a)?, topology.asn(b)?);
        let (next, end) = cursors.get_mut(&owner).ok_or(TopologyError::PoolExhausted(pool))?;
        if *next + LINK_SUBNET_SIZE > *end {
            let block = topology.as_block(owner).unwrap_or(pool);
            return Err(TopologyError::PoolExhausted(block));
        }
        let subnet = Ipv4Network::new(Ipv4Addr::from(*next), LINK_PREFIX)
            .map_err(|_| TopologyError::PoolExhausted(pool))?;
        *next += LINK_SUBNET_SIZE;
        topology.set_link_subnet(a, b, subnet)?;
        trace!(
            "Link {} -- {} gets subnet {}",
            topology.router_name(a),
            topology.router_name(b),
            subnet
        );
    }

    Ok(())
}

/// Converts an IP address into an OSI Network Entity Title, suitable for IS-IS. The area is always
/// `49`, and the system id is built from the four octets, each padded to three digits.
///
/// ```
/// # use netsynth::topology::net_entity_title;
/// assert_eq!(net_entity_title("192.168.19.1".parse().unwrap()), "49.1921.6801.9001.00");
/// assert_eq!(net_entity_title("10.0.0.1".parse().unwrap()), "49.0100.0000.0001.00");
/// ```
pub fn net_entity_title(addr: Ipv4Addr) -> String {
    let digits: String = addr.octets().iter().map(|o| format!("{:03}", o)).collect();
    format!("49.{}.{}.{}.00", &digits[0..4], &digits[4..8], &digits[8..12])
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn allocate_two_ases() {
        let mut t = Topology::new();
        let a = t.add_router("a", AsId(2));
        let b = t.add_router("b", AsId(2));
        let c = t.add_router("c", AsId(1));
        t.add_link(a, b).unwrap();
        t.add_link(b, c).unwrap();
        t.set_loopback(b, "172.16.0.1/32".parse().unwrap()).unwrap();

        allocate_addresses(&mut t, "10.0.0.0/8".parse().unwrap()).unwrap();

        assert_eq!(t.as_block(AsId(1)), Some("10.0.0.0/16".parse().unwrap()));
        assert_eq!(t.as_block(AsId(2)), Some("10.1.0.0/16".parse().unwrap()));

        assert_eq!(t.router(a).unwrap().loopback(), Some("10.1.0.1/32".parse().unwrap()));
        assert_eq!(t.router(b).unwrap().loopback(), Some("172.16.0.1/32".parse().unwrap()));
        assert_eq!(t.router(c).unwrap().loopback(), Some("10.0.0.1/32".parse().unwrap()));

        // internal link out of AS2, external link out of AS1
        assert_eq!(t.interface(a, b).unwrap().ip, Some("10.1.1.1/30".parse().unwrap()));
        assert_eq!(t.interface(b, a).unwrap().ip, Some("10.1.1.2/30".parse().unwrap()));
        assert_eq!(t.interface(b, c).unwrap().ip, Some("10.0.1.1/30".parse().unwrap()));
        assert_eq!(t.interface(c, b).unwrap().ip, Some("10.0.1.2/30".parse().unwrap()));
    }

    #[test]
    fn pool_too_small() {
        let mut t = Topology::new();
        t.add_router("a", AsId(1));
        let pool: Ipv4Network = "10.0.0.0/24".parse().unwrap();
        assert_eq!(allocate_addresses(&mut t, pool), Err(TopologyError::PoolExhausted(pool)));
    }
}
