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

//! # Single AS

use super::{ExampleTopology, EXAMPLE_POOL};
use crate::topology::{allocate_addresses, AsId, Topology};

/// # Single AS
///
/// Four routers in AS 1, without any hierarchy, resulting in a full iBGP mesh.
///
/// ```text
/// r1 ---- r2
///  |    /  |
///  |  /    |
/// r3 ---- r4
/// ```
pub struct SingleAs {}

impl ExampleTopology for SingleAs {
    fn topology() -> Topology {
        let mut t = Topology::new();

        let r1 = t.add_router("r1", AsId(1));
        let r2 = t.add_router("r2", AsId(1));
        let r3 = t.add_router("r3", AsId(1));
        let r4 = t.add_router("r4", AsId(1));

        t.add_link(r1, r2).unwrap();
        t.add_link(r1, r3).unwrap();
        t.add_link(r2, r3).unwrap();
        t.add_link(r2, r4).unwrap();
        t.add_link(r3, r4).unwrap();

        t.set_link_weight(r2, r3, 5).unwrap();

        allocate_addresses(&mut t, EXAMPLE_POOL.parse().unwrap()).unwrap();
        t
    }
}
