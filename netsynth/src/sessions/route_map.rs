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

//! # Route-Maps
//!
//! This module contains the named routing policies, which can be attached to the ingress or egress
//! side of a BGP session. The content of a route map is produced by the policy engine; the
//! compiler only reads it.
//!
//! A route map is identified by its **name**: two route maps with the same name are considered to
//! be the same policy, no matter what their terms look like. `PartialEq` and `Hash` only look at
//! the name.

use crate::topology::AsId;

use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};

/// # Main RouteMap structure
/// A route map is a list of terms, which are checked in ascending order. Use the
/// [`RouteMapBuilder`] type to conveniently build a route map:
///
/// ```
/// # use netsynth::sessions::route_map::*;
/// # use netsynth::topology::AsId;
/// let map = RouteMapBuilder::new("prefer-customers")
///     .order(10)
///     .allow()
///     .match_community("customers")
///     .set_local_pref(200)
///     .next_term()
///     .order(20)
///     .deny()
///     .match_neighbor_as(AsId(65000))
///     .build();
/// assert_eq!(map.name(), "prefer-customers");
/// assert_eq!(map.terms().len(), 2);
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct RouteMap {
    name: String,
    terms: Vec<RouteMapTerm>,
}

impl RouteMap {
    /// Generate a new route map
    pub fn new(name: impl Into<String>, terms: Vec<RouteMapTerm>) -> Self {
        Self { name: name.into(), terms }
    }

    /// Returns the name of the route map
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns all terms, in ascending order
    pub fn terms(&self) -> &[RouteMapTerm] {
        &self.terms
    }
}

impl PartialEq for RouteMap {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for RouteMap {}

impl Hash for RouteMap {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// Single term of a route map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteMapTerm {
    /// In which order should the terms be checked. Lower values mean that they are checked
    /// earlier.
    pub order: usize,
    /// Either Allow or Deny.
    pub state: RouteMapState,
    /// Match statements of the term, connected in an and
    pub conds: Vec<RouteMapMatch>,
    /// Set actions of the term
    pub set: Vec<RouteMapSet>,
}

/// # Route Map Builder
///
/// Convenience type to build a route map. Every call to `next_term` closes the current term and
/// starts a new one. Terms without explicit order get the order `10 * position`, and terms without
/// explicit state are allowing. Deny terms drop their set actions.
#[derive(Debug)]
pub struct RouteMapBuilder {
    name: String,
    terms: Vec<RouteMapTerm>,
    order: Option<usize>,
    state: Option<RouteMapState>,
    conds: Vec<RouteMapMatch>,
    set: Vec<RouteMapSet>,
}

impl RouteMapBuilder {
    /// Create an empty RouteMapBuilder for a route map with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            terms: Vec::new(),
            order: None,
            state: None,
            conds: Vec::new(),
            set: Vec::new(),
        }
    }

    /// Set the order of the current term.
    pub fn order(&mut self, order: usize) -> &mut Self {
        self.order = Some(order);
        self
    }

    /// Set the state of the current term.
    pub fn state(&mut self, state: RouteMapState) -> &mut Self {
        self.state = Some(state);
        self
    }

    /// Set the state of the current term to allow.
    pub fn allow(&mut self) -> &mut Self {
        self.state = Some(RouteMapState::Allow);
        self
    }

    /// Set the state of the current term to deny.
    pub fn deny(&mut self) -> &mut Self {
        self.state = Some(RouteMapState::Deny);
        self
    }

    /// Add a match condition to the current term.
    pub fn cond(&mut self, cond: RouteMapMatch) -> &mut Self {
        self.conds.push(cond);
        self
    }

    /// Match on routes tagged with a community of the named community list
    pub fn match_community(&mut self, community_list: impl Into<String>) -> &mut Self {
        self.conds.push(RouteMapMatch::Community(community_list.into()));
        self
    }

    /// Match on routes whose prefix is in the named prefix list
    pub fn match_prefix_list(&mut self, prefix_list: impl Into<String>) -> &mut Self {
        self.conds.push(RouteMapMatch::PrefixList(prefix_list.into()));
        self
    }

    /// Match on routes learned from a neighbor in the given AS
    pub fn match_neighbor_as(&mut self, as_id: AsId) -> &mut Self {
        self.conds.push(RouteMapMatch::NeighborAs(as_id));
        self
    }

    /// Add a set expression to the current term.
    pub fn add_set(&mut self, set: RouteMapSet) -> &mut Self {
        self.set.push(set);
        self
    }

    /// Overwrite the Local-Pref
    pub fn set_local_pref(&mut self, local_pref: u32) -> &mut Self {
        self.set.push(RouteMapSet::LocalPref(local_pref));
        self
    }

    /// Overwrite the MED
    pub fn set_med(&mut self, med: u32) -> &mut Self {
        self.set.push(RouteMapSet::Med(med));
        self
    }

    /// Tag the route with the named community
    pub fn add_community(&mut self, community_list: impl Into<String>) -> &mut Self {
        self.set.push(RouteMapSet::AddCommunity(community_list.into()));
        self
    }

    /// Remove the named community from the route
    pub fn remove_community(&mut self, community_list: impl Into<String>) -> &mut Self {
        self.set.push(RouteMapSet::RemoveCommunity(community_list.into()));
        self
    }

    /// Prepend the AS `count` times to the AS path
    pub fn prepend(&mut self, as_id: AsId, count: usize) -> &mut Self {
        self.set.push(RouteMapSet::Prepend(as_id, count));
        self
    }

    /// Close the current term and start a new one.
    pub fn next_term(&mut self) -> &mut Self {
        let term = self.take_term();
        self.terms.push(term);
        self
    }

    fn take_term(&mut self) -> RouteMapTerm {
        let order = self.order.take().unwrap_or(10 * (self.terms.len() + 1));
        let state = self.state.take().unwrap_or(RouteMapState::Allow);
        let conds = std::mem::take(&mut self.conds);
        let set = std::mem::take(&mut self.set);
        let set = if state.is_deny() { vec![] } else { set };
        RouteMapTerm { order, state, conds, set }
    }

    /// Build the route-map. The currently open term is added if it contains anything.
    pub fn build(&mut self) -> RouteMap {
        if self.order.is_some()
            || self.state.is_some()
            || !self.conds.is_empty()
            || !self.set.is_empty()
        {
            self.next_term();
        }
        let mut terms = std::mem::take(&mut self.terms);
        terms.sort_by_key(|t| t.order);
        RouteMap::new(self.name.clone(), terms)
    }
}

/// State of a route map term, which can either be allow or deny
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RouteMapState {
    /// Accept the route
    Allow,
    /// Reject the route
    Deny,
}

impl RouteMapState {
    /// Returns `true` if the state is set to `Deny`.
    pub fn is_deny(&self) -> bool {
        self == &Self::Deny
    }
}

impl fmt::Display for RouteMapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => write!(f, "accept"),
            Self::Deny => write!(f, "reject"),
        }
    }
}

/// Match statement of a route map term. Community lists and prefix lists are referenced by name,
/// and are defined in the policy store of the router.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RouteMapMatch {
    /// Matches on a named community list
    Community(String),
    /// Matches on a named prefix list
    PrefixList(String),
    /// Matches on the AS of the neighbor that sent the route
    NeighborAs(AsId),
}

impl fmt::Display for RouteMapMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Community(c) => write!(f, "community {}", c),
            Self::PrefixList(p) => write!(f, "prefix-list {}", p),
            Self::NeighborAs(a) => write!(f, "neighbor-as {}", a),
        }
    }
}

/// Set action, if a term matches
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RouteMapSet {
    /// overwrite the local preference
    LocalPref(u32),
    /// overwrite the MED attribute
    Med(u32),
    /// add the named community
    AddCommunity(String),
    /// remove the named community
    RemoveCommunity(String),
    /// prepend the AS a number of times
    Prepend(AsId, usize),
}

impl fmt::Display for RouteMapSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocalPref(lp) => write!(f, "local-preference {}", lp),
            Self::Med(med) => write!(f, "metric {}", med),
            Self::AddCommunity(c) => write!(f, "community add {}", c),
            Self::RemoveCommunity(c) => write!(f, "community delete {}", c),
            Self::Prepend(a, n) => write!(f, "as-path-prepend {}x{}", a, n),
        }
    }
}
