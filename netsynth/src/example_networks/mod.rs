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

//! Topologies for testing

use crate::sessions::SessionGraph;
use crate::topology::Topology;
use crate::Error;

mod single_as;
pub use single_as::SingleAs;

mod multi_as;
pub use multi_as::MultiAs;

mod three_level_as;
pub use three_level_as::ThreeLevelAs;

/// Address pool used by all example topologies
pub const EXAMPLE_POOL: &str = "10.0.0.0/8";

/// Trait for easier access to example topologies.
pub trait ExampleTopology {
    /// Get the physical topology, with all addresses allocated.
    fn topology() -> Topology;

    /// Attach the route maps and the policy stores to the synthesized session graph. The default
    /// does not attach anything.
    fn attach_policies(_topology: &Topology, _sessions: &mut SessionGraph) -> Result<(), Error> {
        Ok(())
    }
}
