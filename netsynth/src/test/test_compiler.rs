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

//! Test the device configuration compiler

use crate::compiler::*;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::example_networks::{ExampleTopology, MultiAs, SingleAs, ThreeLevelAs};
use crate::printer;
use crate::sessions::route_map::RouteMapBuilder;
use crate::sessions::SessionGraph;
use crate::topology::{allocate_addresses, AsId, RouterId, Topology};
use crate::Error;
use lazy_static::lazy_static;
use maplit::btreemap;
use std::net::Ipv4Addr;

lazy_static! {
    static ref R1: RouterId = 0.into();
    static ref R2: RouterId = 1.into();
    static ref R3: RouterId = 2.into();
    static ref R4: RouterId = 3.into();
    static ref R5: RouterId = 4.into();
    static ref R6: RouterId = 5.into();
}

fn ip(s: &str) -> Ipv4Addr {
    s.parse().unwrap()
}

fn settings(platform: Platform) -> CompilerSettings {
    CompilerSettings { platform, igp_protocol: IgpProtocol::Ospf, threads: Some(2) }
}

fn multi_as() -> (Topology, SessionGraph) {
    let t = MultiAs::topology();
    let mut diag = Diagnostics::new();
    let mut g = SessionGraph::synthesize(&t, &mut diag).unwrap();
    MultiAs::attach_policies(&t, &mut g).unwrap();
    (t, g)
}

/// Star with `n` leaves in AS 2 around a hub in AS 1.
fn star(n: usize) -> (Topology, RouterId) {
    let mut t = Topology::new();
    let hub = t.add_router("hub", AsId(1));
    for i in 0..n {
        let leaf = t.add_router(format!("leaf{}", i), AsId(2));
        t.add_link(hub, leaf).unwrap();
    }
    allocate_addresses(&mut t, "10.0.0.0/8".parse().unwrap()).unwrap();
    (t, hub)
}

#[test]
fn interfaces() {
    let (t, g) = multi_as();
    let c = Compiler::new(&t, &g, settings(Platform::Junosphere));
    let mut diag = Diagnostics::new();
    let cfg = c.compile_router(*R1, &mut diag).unwrap();
    assert!(diag.is_empty());

    assert_eq!(cfg.hostname, "r1.AS1");
    assert_eq!(cfg.asn, AsId(1));
    assert_eq!(cfg.router_id, ip("10.0.0.1"));
    assert_eq!(cfg.network_list, vec!["10.0.0.0/16".parse().unwrap()]);

    assert_eq!(
        cfg.interfaces[0],
        InterfaceConfig {
            id: "lo0".to_string(),
            ip: ip("10.0.0.1"),
            netmask: Some(ip("255.255.255.255")),
            prefixlen: 32,
            broadcast: None,
            net_ent_title: Some("49.0100.0000.0001.00".to_string()),
            description: "Loopback".to_string(),
        }
    );
    let ids: Vec<&str> = cfg.interfaces.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["lo0", "ge-0/0/1", "ge-0/0/2", "ge-0/0/3"]);

    let to_r6 = &cfg.interfaces[3];
    assert_eq!(to_r6.ip, ip("10.0.1.17"));
    assert_eq!(to_r6.prefixlen, 30);
    assert_eq!(to_r6.broadcast, Some(ip("10.0.1.19")));
    assert_eq!(to_r6.description, "Interface r1.AS1 -> r6.AS3");
}

#[test]
fn igp_interfaces() {
    let (t, g) = multi_as();
    let c = Compiler::new(&t, &g, settings(Platform::OlivePatched));
    let cfg = c.compile_router(*R1, &mut Diagnostics::new()).unwrap();

    assert_eq!(
        cfg.igp_interfaces,
        vec![
            IgpInterface { id: "lo0".to_string(), weight: None, description: None, passive: true },
            IgpInterface {
                id: "em0.0".to_string(),
                weight: Some(1),
                description: Some("Interface r1.AS1 -> r2.AS1".to_string()),
                passive: false,
            },
            IgpInterface {
                id: "em1.0".to_string(),
                weight: Some(1),
                description: Some("Interface r1.AS1 -> r3.AS1".to_string()),
                passive: false,
            },
            IgpInterface {
                id: "em2.0".to_string(),
                weight: Some(1),
                description: Some("Interface r1.AS1 -> r6.AS3".to_string()),
                passive: true,
            },
        ]
    );

    // r6 is alone in its AS: no IGP at all
    let cfg = c.compile_router(*R6, &mut Diagnostics::new()).unwrap();
    assert!(cfg.igp_interfaces.is_empty());
}

#[test]
fn igp_link_weight() {
    let t = SingleAs::topology();
    let r2 = t.get_router_id("r2").unwrap();
    let mut diag = Diagnostics::new();
    let g = SessionGraph::synthesize(&t, &mut diag).unwrap();
    let c = Compiler::new(&t, &g, settings(Platform::Olive));
    let cfg = c.compile_router(r2, &mut diag).unwrap();

    let weights: Vec<(&str, Option<u32>)> =
        cfg.igp_interfaces.iter().map(|i| (i.id.as_str(), i.weight)).collect();
    assert_eq!(
        weights,
        vec![("lo0", None), ("em0.0", Some(1)), ("em1.0", Some(5)), ("em3.0", Some(1))]
    );
}

#[test]
fn bgp_groups() {
    let (t, g) = multi_as();
    let c = Compiler::new(&t, &g, settings(Platform::Junosphere));
    let cfg = c.compile_router(*R1, &mut Diagnostics::new()).unwrap();

    let peers = &cfg.bgp_groups.internal_peers;
    assert_eq!(peers.group_type, GroupType::Internal);
    assert_eq!(
        peers.neighbors.iter().map(|n| (n.id, n.description.as_str())).collect::<Vec<_>>(),
        vec![(ip("10.0.0.2"), "peer to r2.AS1"), (ip("10.0.0.3"), "peer to r3.AS1")]
    );
    assert!(cfg.bgp_groups.internal_rr.is_none());

    let external = cfg.bgp_groups.external_peers.as_ref().unwrap();
    assert_eq!(external.group_type, GroupType::External);
    assert_eq!(
        external.neighbors,
        vec![BgpNeighbor {
            id: ip("10.0.1.18"),
            description: "eBGP to r6.AS3".to_string(),
            route_maps_in: vec!["tag-as3".to_string()],
            route_maps_out: vec!["export-policy".to_string()],
            peer_as: Some(AsId(3)),
        }]
    );

    // r2 has no eBGP session
    let cfg = c.compile_router(*R2, &mut Diagnostics::new()).unwrap();
    assert!(cfg.bgp_groups.external_peers.is_none());
}

#[test]
fn route_reflector_clients() {
    let (t, g) = multi_as();
    let c = Compiler::new(&t, &g, settings(Platform::Junosphere));

    let rr = c.compile_router(*R4, &mut Diagnostics::new()).unwrap();
    assert!(rr.bgp_groups.internal_peers.neighbors.is_empty());
    let clients = rr.bgp_groups.internal_rr.as_ref().unwrap();
    assert_eq!(clients.cluster, Some(ip("10.1.0.1")));
    assert_eq!(clients.neighbors.len(), 1);
    assert_eq!(clients.neighbors[0].id, ip("10.1.0.2"));
    assert_eq!(clients.neighbors[0].description, "down to r5.AS2");

    let client = c.compile_router(*R5, &mut Diagnostics::new()).unwrap();
    assert!(client.bgp_groups.internal_rr.is_none());
    assert_eq!(client.bgp_groups.internal_peers.neighbors[0].description, "up to r4.AS2");
    assert_eq!(client.bgp_groups.internal_peers.cluster, None);
}

#[test]
fn policy_options() {
    let (t, g) = multi_as();
    let c = Compiler::new(&t, &g, settings(Platform::Junosphere));
    let cfg = c.compile_router(*R1, &mut Diagnostics::new()).unwrap();

    assert_eq!(cfg.policy_options.community_lists, btreemap! {
        "from-as3".to_string() => "1:300".to_string(),
    });
    assert_eq!(cfg.policy_options.prefix_lists, btreemap! {
        "own-prefixes".to_string() => vec!["10.0.0.0/16".parse().unwrap()],
    });
    let names: Vec<&str> = cfg.policy_options.route_maps.iter().map(|r| r.name()).collect();
    assert_eq!(names, vec!["tag-as3", "export-policy"]);

    let cfg = c.compile_router(*R2, &mut Diagnostics::new()).unwrap();
    assert!(cfg.policy_options.route_maps.is_empty());
    assert!(cfg.policy_options.community_lists.is_empty());
}

#[test]
fn route_maps_deduplicated_by_name() {
    let (t, mut g) = multi_as();
    let first = RouteMapBuilder::new("export-policy").set_med(10).build();
    let second = RouteMapBuilder::new("export-policy").set_med(20).build();
    g.add_egress(*R1, *R2, first).unwrap();
    g.add_egress(*R1, *R3, second.clone()).unwrap();
    g.add_ingress(*R3, *R1, second).unwrap();

    let c = Compiler::new(&t, &g, settings(Platform::Junosphere));
    let cfg = c.compile_router(*R1, &mut Diagnostics::new()).unwrap();

    let names: Vec<&str> = cfg.policy_options.route_maps.iter().map(|r| r.name()).collect();
    assert_eq!(names.iter().filter(|n| **n == "export-policy").count(), 1);
    assert_eq!(names, vec!["export-policy", "tag-as3"]);
    // first seen wins
    assert_eq!(cfg.policy_options.route_maps[0].terms()[0].set.len(), 1);
    assert_eq!(
        cfg.policy_options.route_maps[0].terms()[0].set[0],
        crate::sessions::route_map::RouteMapSet::Med(10)
    );

    let to_r3 = &cfg.bgp_groups.internal_peers.neighbors[1];
    assert_eq!(to_r3.route_maps_in, vec!["export-policy"]);
    assert_eq!(to_r3.route_maps_out, vec!["export-policy"]);
}

#[test]
fn compile_is_idempotent() {
    let (t, g) = multi_as();
    let a = Compiler::new(&t, &g, settings(Platform::Junosphere)).compile_all();
    let b = Compiler::new(
        &t,
        &g,
        CompilerSettings { threads: Some(5), ..settings(Platform::Junosphere) },
    )
    .compile_all();
    assert!(a.is_success());
    assert_eq!(a.configs.len(), 6);

    let json_a = serde_json::to_string(&a.configs).unwrap();
    let json_b = serde_json::to_string(&b.configs).unwrap();
    assert_eq!(json_a, json_b);

    let again = Compiler::new(&t, &g, settings(Platform::Junosphere)).compile_all();
    assert_eq!(serde_json::to_string(&again.configs).unwrap(), json_a);

    let hostnames: Vec<&str> = a.configs.iter().map(|c| c.hostname.as_str()).collect();
    assert_eq!(hostnames, vec!["r1.AS1", "r2.AS1", "r3.AS1", "r4.AS2", "r5.AS2", "r6.AS3"]);
}

#[test]
fn interface_limit_boundary() {
    let limit = Platform::Olive.max_interfaces();

    let (t, hub) = star(limit);
    let mut diag = Diagnostics::new();
    let g = SessionGraph::synthesize(&t, &mut diag).unwrap();
    let report = Compiler::new(&t, &g, settings(Platform::Olive)).compile_all();
    assert!(report.is_success());
    assert!(report.diagnostics.of_kind(DiagnosticKind::InterfaceLimit).is_empty());

    let (t, hub_2) = star(limit + 1);
    assert_eq!(hub, hub_2);
    let g = SessionGraph::synthesize(&t, &mut diag).unwrap();
    let report = Compiler::new(&t, &g, settings(Platform::Olive)).compile_all();
    assert!(report.is_success());
    let warnings = report.diagnostics.of_kind(DiagnosticKind::InterfaceLimit);
    assert_eq!(warnings.len(), 1);
    assert_eq!(report.diagnostics.of_router(hub).len(), 1);
    assert!(warnings[0].message.contains("hub.AS1"));

    let cfg = report.config("hub.AS1").unwrap();
    assert_eq!(cfg.interfaces.len(), limit + 2);
    assert_eq!(cfg.bgp_groups.external_peers.as_ref().unwrap().neighbors.len(), limit + 1);
}

#[test]
fn synthesis_diagnostics_come_first() {
    let (mut t, hub) = star(Platform::Olive.max_interfaces() + 1);
    let leaf = t.get_router_id("leaf0").unwrap();
    t.set_level(leaf, 1).unwrap();

    let mut diag = Diagnostics::new();
    let g = SessionGraph::synthesize(&t, &mut diag).unwrap();
    let mut report = Compiler::new(&t, &g, settings(Platform::Olive)).compile_all();
    report.prepend_diagnostics(diag);

    let kinds: Vec<DiagnosticKind> = report.diagnostics.iter().map(|d| d.kind).collect();
    assert_eq!(kinds, vec![DiagnosticKind::PartialLevel, DiagnosticKind::InterfaceLimit]);
    assert_eq!(report.diagnostics.of_router(hub).len(), 1);

    let summary = serde_json::to_value(report.summary()).unwrap();
    assert_eq!(summary["diagnostics"]["records"][0]["kind"], "PartialLevel");
}

#[test]
fn missing_loopback_only_fails_that_router() {
    let mut t = Topology::new();
    let r1 = t.add_router("r1", AsId(1));
    let r2 = t.add_router("r2", AsId(2));
    t.add_link(r1, r2).unwrap();
    t.set_link_subnet(r1, r2, "192.168.0.0/30".parse().unwrap()).unwrap();
    t.set_loopback(r1, "192.168.255.1/32".parse().unwrap()).unwrap();

    let mut diag = Diagnostics::new();
    let g = SessionGraph::synthesize(&t, &mut diag).unwrap();
    let report = Compiler::new(&t, &g, settings(Platform::Junosphere)).compile_all();

    assert!(!report.is_success());
    assert_eq!(report.configs.len(), 1);
    assert_eq!(report.configs[0].hostname, "r1.AS1");
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].router, r2);
    assert_eq!(report.failures[0].error, Error::MissingLoopback("r2.AS2".to_string()));
    assert_eq!(report.diagnostics.of_kind(DiagnosticKind::CompileFailure).len(), 1);
    assert!(report.diagnostics.has_fatal());

    let external = report.configs[0].bgp_groups.external_peers.as_ref().unwrap();
    assert_eq!(external.neighbors[0].id, ip("192.168.0.2"));
    // no AS block was allocated
    assert!(report.configs[0].network_list.is_empty());

    let summary = printer::report_summary(&report);
    assert_eq!(summary[0], "1 routers compiled, 1 failed");
    assert_eq!(summary[1], "FAILED r2.AS2: Router r2.AS2 has no loopback address");
}

#[test]
fn missing_loopback_in_full_mesh() {
    let mut t = Topology::new();
    let r1 = t.add_router("r1", AsId(1));
    let r2 = t.add_router("r2", AsId(1));
    let r3 = t.add_router("r3", AsId(1));
    t.add_link(r1, r2).unwrap();
    t.add_link(r2, r3).unwrap();
    t.set_link_subnet(r1, r2, "192.168.0.0/30".parse().unwrap()).unwrap();
    t.set_link_subnet(r2, r3, "192.168.0.4/30".parse().unwrap()).unwrap();
    t.set_loopback(r1, "192.168.255.1/32".parse().unwrap()).unwrap();
    t.set_loopback(r2, "192.168.255.2/32".parse().unwrap()).unwrap();

    let mut diag = Diagnostics::new();
    let g = SessionGraph::synthesize(&t, &mut diag).unwrap();
    assert_eq!(g.neighbors(r1), vec![r2, r3]);
    let report = Compiler::new(&t, &g, settings(Platform::Junosphere)).compile_all();

    assert!(!report.is_success());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].router, r3);
    let hostnames: Vec<&str> = report.configs.iter().map(|c| c.hostname.as_str()).collect();
    assert_eq!(hostnames, vec!["r1.AS1", "r2.AS1"]);

    let peers = &report.config("r1.AS1").unwrap().bgp_groups.internal_peers.neighbors;
    assert_eq!(peers.iter().map(|n| n.id).collect::<Vec<_>>(), vec![ip("192.168.255.2")]);
    let peers = &report.config("r2.AS1").unwrap().bgp_groups.internal_peers.neighbors;
    assert_eq!(peers.iter().map(|n| n.id).collect::<Vec<_>>(), vec![ip("192.168.255.1")]);

    let warnings = report.diagnostics.of_kind(DiagnosticKind::MissingNeighborLoopback);
    assert_eq!(warnings.len(), 2);
    assert!(warnings.iter().all(|d| !d.kind.is_fatal() && d.message.contains("r3.AS1")));
    assert_eq!(report.diagnostics.of_router(r1).len(), 1);
    assert_eq!(report.diagnostics.of_kind(DiagnosticKind::CompileFailure).len(), 1);
}

#[test]
fn missing_link_address() {
    let mut t = Topology::new();
    let r1 = t.add_router("r1", AsId(1));
    let r2 = t.add_router("r2", AsId(1));
    t.add_link(r1, r2).unwrap();
    t.set_loopback(r1, "192.168.255.1/32".parse().unwrap()).unwrap();
    t.set_loopback(r2, "192.168.255.2/32".parse().unwrap()).unwrap();

    let mut diag = Diagnostics::new();
    let g = SessionGraph::synthesize(&t, &mut diag).unwrap();
    let c = Compiler::new(&t, &g, settings(Platform::Junosphere));
    assert_eq!(
        c.compile_router(r1, &mut diag),
        Err(Error::MissingLinkAddress("r1.AS1".to_string(), "r2.AS1".to_string()))
    );
}

#[test]
fn descriptor_json() {
    let (t, g) = multi_as();
    let c = Compiler::new(
        &t,
        &g,
        CompilerSettings { igp_protocol: IgpProtocol::Isis, ..settings(Platform::Junosphere) },
    );
    let cfg = c.compile_router(*R4, &mut Diagnostics::new()).unwrap();
    let json = serde_json::to_value(&cfg).unwrap();

    assert_eq!(json["hostname"], "r4.AS2");
    assert_eq!(json["asn"], 2);
    assert_eq!(json["igp_protocol"], "isis");
    assert_eq!(json["lo_ip"], "10.1.0.1/32");
    assert_eq!(json["bgp_groups"]["internal_rr"]["type"], "internal");
    assert_eq!(json["bgp_groups"]["internal_rr"]["cluster"], "10.1.0.1");
    assert_eq!(json["bgp_groups"]["external_peers"]["neighbors"][0]["peer_as"], 1);
    assert!(json["bgp_groups"]["internal_peers"].get("cluster").is_none());
    assert!(json["interfaces"][1].get("net_ent_title").is_none());
}

#[test]
fn lab_topology() {
    let t = ThreeLevelAs::topology();
    let mut diag = Diagnostics::new();
    let lab = LabTopology::build(&t, Platform::Junosphere, &mut diag).unwrap();
    assert!(diag.is_empty());
    assert_eq!(lab.num_bridges, t.links_symmetric().count());
    assert_eq!(lab.routers.len(), 6);

    let a = &lab.routers[0];
    assert_eq!(a.hostname, "a.AS100");
    assert_eq!(a.interfaces[0].id, "em1");
    assert_eq!(a.interfaces[0].platform_id, "ge-0/0/1");
    assert_eq!(a.interfaces[0].bridge_id, "private0");
    // both ends of a link share the bridge
    let b = &lab.routers[1];
    assert_eq!(b.interfaces[0].bridge_id, "private0");
    assert_eq!(b.interfaces[0].description, "Interface b.AS100 -> a.AS100");
}

#[test]
fn lab_bridge_limit() {
    let (t, _) = star(MAX_BRIDGES + 1);
    let mut diag = Diagnostics::new();
    let lab = LabTopology::build(&t, Platform::Junosphere, &mut diag).unwrap();
    assert_eq!(lab.num_bridges, MAX_BRIDGES + 1);
    assert_eq!(diag.of_kind(DiagnosticKind::BridgeLimit).len(), 1);

    let (t, _) = star(MAX_BRIDGES);
    let mut diag = Diagnostics::new();
    LabTopology::build(&t, Platform::Junosphere, &mut diag).unwrap();
    assert!(diag.is_empty());
}
