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

//! # Multi AS

use super::{ExampleTopology, EXAMPLE_POOL};
use crate::sessions::route_map::RouteMapBuilder;
use crate::sessions::SessionGraph;
use crate::topology::{allocate_addresses, AsId, Topology};
use crate::Error;

/// # Multi AS
///
/// Three ASes. AS 1 is a full mesh of three routers, AS 2 has two route-reflection levels, and
/// AS 3 consists of a single router.
///
/// ```text
///   AS1           AS2          AS3
/// r1 -- r2
///  | \   |
///  |   r3 ------- r4 -- r5 ---- r6
///  |                            |
///  +----------------------------+
/// ```
///
/// `r4` is the route reflector of `r5`. Both eBGP sessions of AS 1 export with the route map
/// `export-policy`, and `r1` tags routes from AS 3 with the community list `from-as3`.
pub struct MultiAs {}

impl ExampleTopology for MultiAs {
    fn topology() -> Topology {
        let mut t = Topology::new();

        let r1 = t.add_router("r1", AsId(1));
        let r2 = t.add_router("r2", AsId(1));
        let r3 = t.add_router("r3", AsId(1));
        let r4 = t.add_router("r4", AsId(2));
        let r5 = t.add_router("r5", AsId(2));
        let r6 = t.add_router("r6", AsId(3));

        t.set_level(r4, 2).unwrap();
        t.set_level(r5, 1).unwrap();
        t.set_pop(r4, "zurich").unwrap();
        t.set_pop(r5, "zurich").unwrap();

        t.add_link(r1, r2).unwrap();
        t.add_link(r1, r3).unwrap();
        t.add_link(r2, r3).unwrap();
        t.add_link(r3, r4).unwrap();
        t.add_link(r4, r5).unwrap();
        t.add_link(r5, r6).unwrap();
        t.add_link(r1, r6).unwrap();

        allocate_addresses(&mut t, EXAMPLE_POOL.parse().unwrap()).unwrap();
        t
    }

    fn attach_policies(topology: &Topology, sessions: &mut SessionGraph) -> Result<(), Error> {
        let r1 = topology.get_router_id("r1")?;
        let r3 = topology.get_router_id("r3")?;
        let r4 = topology.get_router_id("r4")?;
        let r6 = topology.get_router_id("r6")?;

        let export = || {
            RouteMapBuilder::new("export-policy")
                .order(10)
                .allow()
                .match_prefix_list("own-prefixes")
                .next_term()
                .order(20)
                .deny()
                .build()
        };
        sessions.add_egress(r1, r6, export())?;
        sessions.add_egress(r3, r4, export())?;

        let tag_as3 = RouteMapBuilder::new("tag-as3")
            .allow()
            .match_neighbor_as(AsId(3))
            .add_community("from-as3")
            .set_local_pref(50)
            .build();
        sessions.add_ingress(r6, r1, tag_as3)?;

        for r in &[r1, r3] {
            let store = sessions.policy_store_mut(*r)?;
            store.tags.insert("from-as3".to_string(), "1:300".to_string());
            if let Some(block) = topology.as_block(AsId(1)) {
                store.prefixes.insert("own-prefixes".to_string(), vec![block]);
            }
        }

        Ok(())
    }
}
