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

#![deny(missing_docs)]

//! # NetSynth: Synthesizing BGP Session Topologies and Router Configurations
//! This is a library for deriving the BGP sessions of a network from its physical topology, and
//! for compiling a structured configuration descriptor for every router.
//!
//! ## Problem Statement
//! Given
//! - a physical topology, where every router belongs to an AS, and optionally carries the
//!   route-reflection level and cluster attributes,
//! - a target platform,
//!
//! find all eBGP sessions between neighboring ASes, all iBGP sessions inside every AS (either a
//! full mesh, or a route-reflection hierarchy of up to three levels), and compile the interfaces,
//! the IGP interfaces, the BGP groups and the policy options of every router.
//!
//! ## Structure
//!
//! - **[`Topology`](topology)**: The physical network. See the main structure
//!   [`Topology`](topology::Topology), and [`allocate_addresses`](topology::allocate_addresses)
//!   for numbering the routers and links.
//!
//! - **[`Sessions`](sessions)**: The [`SessionGraph`](sessions::SessionGraph) and the synthesis
//!   of all BGP sessions. Route maps are defined in [`route_map`](sessions::route_map).
//!
//! - **[`Compiler`](compiler)**: Projects the topology and the session graph onto every router,
//!   producing a [`DeviceConfig`](compiler::DeviceConfig). The target platform is chosen with
//!   [`Platform`](compiler::Platform).
//!
//! - **[`Diagnostics`](diagnostics)**: Structured records of every degraded or failed AS and
//!   router.
//!
//! - **[`ExampleNetworks`](example_networks)**: Collection of prepared topologies.
//!
//! ## Usage
//!
//! ```
//! use netsynth::compiler::{Compiler, CompilerSettings, Platform};
//! use netsynth::sessions::SessionGraph;
//! use netsynth::topology::{allocate_addresses, AsId, Topology};
//! use netsynth::Diagnostics;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // prepare the topology
//!     let mut t = Topology::new();
//!     let r1 = t.add_router("r1", AsId(1));
//!     let r2 = t.add_router("r2", AsId(1));
//!     let e1 = t.add_router("e1", AsId(2));
//!     t.add_link(r1, r2)?;
//!     t.add_link(r1, e1)?;
//!     allocate_addresses(&mut t, "10.0.0.0/8".parse()?)?;
//!
//!     // synthesize the sessions
//!     let mut diag = Diagnostics::new();
//!     let sessions = SessionGraph::synthesize(&t, &mut diag)?;
//!     assert_eq!(sessions.ebgp_sessions(), vec![(r1, e1), (e1, r1)]);
//!
//!     // compile all routers
//!     let settings = CompilerSettings { platform: Platform::Olive, ..Default::default() };
//!     let report = Compiler::new(&t, &sessions, settings).compile_all();
//!     assert!(report.is_success());
//!     println!("{:#?}", report.config("r1.AS1"));
//!
//!     Ok(())
//! }
//! ```

// test modules
pub mod example_networks;
mod test;

pub mod compiler;
pub mod diagnostics;
mod error;
pub mod printer;
pub mod sessions;
pub mod topology;

pub use diagnostics::Diagnostics;
pub use error::Error;
