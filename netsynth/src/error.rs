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

//! Module containing all error types

use crate::topology::{RouterId, TopologyError};
use thiserror::Error;

/// Main error type
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Error propagated from the topology
    #[error("Topology Error: {0}")]
    TopologyError(#[from] TopologyError),
    /// Synthesis was started on a session graph that already contains sessions or routers.
    #[error("Session graph is not empty! Was a session graph already specified?")]
    SessionGraphNotEmpty,
    /// The session does not exist in the session graph
    #[error("BGP session does not exist: {0:?} -> {1:?}")]
    NoSession(RouterId, RouterId),
    /// The router is not part of the session graph
    #[error("Router is not part of the session graph: {0:?}")]
    RouterNotInSessionGraph(RouterId),
    /// A router has no loopback address configured.
    #[error("Router {0} has no loopback address")]
    MissingLoopback(String),
    /// A link has no address configured.
    #[error("Link {0} -> {1} has no address")]
    MissingLinkAddress(String, String),
    /// The worker thread compiling the router panicked.
    #[error("Worker thread panicked while compiling {0:?}")]
    WorkerPanicked(RouterId),
}
