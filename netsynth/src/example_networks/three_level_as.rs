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

//! # Three-level AS

use super::{ExampleTopology, EXAMPLE_POOL};
use crate::topology::{allocate_addresses, AsId, Topology};

/// # Three-level AS
///
/// AS 100 with three levels of route reflection, connected to a single router `x` in AS 200.
///
/// | router | level | l2 cluster | l3 cluster |
/// |--------|-------|------------|------------|
/// | a      | 1     | pop1       |            |
/// | b      | 1     | pop1       |            |
/// | c      | 2     | pop1       | core       |
/// | d      | 2     | pop2       | core       |
/// | e      | 3     |            | core       |
///
/// ```text
/// a --- c --- e --- x
/// |   /     /
/// b       d
/// ```
pub struct ThreeLevelAs {}

impl ExampleTopology for ThreeLevelAs {
    fn topology() -> Topology {
        let mut t = Topology::new();

        let a = t.add_router("a", AsId(100));
        let b = t.add_router("b", AsId(100));
        let c = t.add_router("c", AsId(100));
        let d = t.add_router("d", AsId(100));
        let e = t.add_router("e", AsId(100));
        let x = t.add_router("x", AsId(200));

        for (r, level) in &[(a, 1), (b, 1), (c, 2), (d, 2), (e, 3)] {
            t.set_level(*r, *level).unwrap();
        }
        t.set_l2_cluster(a, "pop1").unwrap();
        t.set_l2_cluster(b, "pop1").unwrap();
        t.set_l2_cluster(c, "pop1").unwrap();
        t.set_l2_cluster(d, "pop2").unwrap();
        t.set_l3_cluster(c, "core").unwrap();
        t.set_l3_cluster(d, "core").unwrap();
        t.set_l3_cluster(e, "core").unwrap();

        t.add_link(a, b).unwrap();
        t.add_link(a, c).unwrap();
        t.add_link(b, c).unwrap();
        t.add_link(c, e).unwrap();
        t.add_link(d, e).unwrap();
        t.add_link(e, x).unwrap();

        allocate_addresses(&mut t, EXAMPLE_POOL.parse().unwrap()).unwrap();
        t
    }
}
