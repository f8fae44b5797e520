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

//! Target platforms and compiler settings

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Target platform of the compiled configuration. The platform decides how interface indices are
/// mapped to interface names, and how many interfaces a router can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    /// Emulated Junos routers (`ge-0/0/<index + 1>`)
    Junosphere,
    /// Olive routers. `em1` is reserved, so all indices above 1 are shifted by one.
    Olive,
    /// Olive routers with a patched qemu, where all `em` interfaces can be used.
    OlivePatched,
}

impl Platform {
    /// Name of the physical interface with the given index
    ///
    /// ```
    /// # use netsynth::compiler::Platform;
    /// assert_eq!(Platform::Junosphere.interface_name(0), "ge-0/0/1");
    /// assert_eq!(Platform::Olive.interface_name(1), "em1");
    /// assert_eq!(Platform::Olive.interface_name(2), "em3");
    /// assert_eq!(Platform::OlivePatched.interface_name(2), "em2");
    /// ```
    pub fn interface_name(&self, index: u32) -> String {
        match self {
            Self::Junosphere => format!("ge-0/0/{}", index + 1),
            Self::Olive if index > 1 => format!("em{}", index + 1),
            Self::Olive | Self::OlivePatched => format!("em{}", index),
        }
    }

    /// Name of the logical unit on the physical interface with the given index
    pub fn logical_interface_name(&self, index: u32) -> String {
        format!("{}.0", self.interface_name(index))
    }

    /// Maximum number of interfaces a router can have
    pub fn max_interfaces(&self) -> usize {
        match self {
            Self::Junosphere => 32,
            Self::Olive => 5,
            Self::OlivePatched => 6,
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::Junosphere
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Junosphere => write!(f, "junosphere"),
            Self::Olive => write!(f, "olive"),
            Self::OlivePatched => write!(f, "olive-patched"),
        }
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "junosphere" => Ok(Self::Junosphere),
            "olive" => Ok(Self::Olive),
            "olive-patched" | "olive_patched" => Ok(Self::OlivePatched),
            x => Err(format!("Unknown platform: {}", x)),
        }
    }
}

/// Interior gateway protocol used inside every AS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IgpProtocol {
    /// OSPF
    Ospf,
    /// IS-IS
    Isis,
}

impl Default for IgpProtocol {
    fn default() -> Self {
        Self::Ospf
    }
}

impl fmt::Display for IgpProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ospf => write!(f, "ospf"),
            Self::Isis => write!(f, "isis"),
        }
    }
}

impl FromStr for IgpProtocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ospf" => Ok(Self::Ospf),
            "isis" | "is-is" => Ok(Self::Isis),
            x => Err(format!("Unknown IGP: {}", x)),
        }
    }
}

/// Settings of the compiler, chosen once when the compiler is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompilerSettings {
    /// Target platform
    pub platform: Platform,
    /// IGP written into every descriptor
    pub igp_protocol: IgpProtocol,
    /// Number of worker threads. `None` uses one thread per CPU.
    pub threads: Option<usize>,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self { platform: Platform::default(), igp_protocol: IgpProtocol::default(), threads: None }
    }
}
