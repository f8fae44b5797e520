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

use netsynth::compiler::{Compiler, CompilerSettings, IgpProtocol, LabTopology, Platform};
use netsynth::example_networks::{ExampleTopology, MultiAs, SingleAs, ThreeLevelAs};
use netsynth::printer;
use netsynth::sessions::SessionGraph;
use netsynth::topology::Topology;
use netsynth::Diagnostics;

use clap::{Parser, Subcommand, ValueEnum};
use log::*;
use serde::Serialize;
use std::error::Error;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

fn main() -> Result<(), Box<dyn Error>> {
    // initialize the env logger
    pretty_env_logger::init();
    // run clap
    let args = CommandLineArguments::parse();

    match args.cmd {
        MainCommand::Compile { network, platform, igp, out, threads } => {
            let mut diag = Diagnostics::new();
            let (topology, sessions) = network.build(&mut diag)?;

            let settings = CompilerSettings { platform, igp_protocol: igp, threads };
            let mut report = Compiler::new(&topology, &sessions, settings).compile_all();
            report.prepend_diagnostics(diag);
            let lab = LabTopology::build(&topology, platform, &mut report.diagnostics)?;

            fs::create_dir_all(&out)?;
            for config in report.configs.iter() {
                write_json(&out.join(format!("{}.json", config.hostname)), config)?;
            }
            write_json(&out.join("lab.json"), &lab)?;
            write_json(&out.join("summary.json"), &report.summary())?;
            info!("Wrote {} configurations to {}", report.configs.len(), out.display());

            for line in printer::report_summary(&report) {
                println!("{}", line);
            }
            if !report.is_success() {
                error!("{} routers could not be compiled", report.failures.len());
                std::process::exit(1);
            }
        }
        MainCommand::Sessions { network } => {
            let mut diag = Diagnostics::new();
            let (topology, sessions) = network.build(&mut diag)?;
            for line in printer::session_graph(&topology, &sessions)? {
                println!("{}", line);
            }
        }
    }

    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), Box<dyn Error>> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, value)?;
    debug!("Wrote {}", path.display());
    Ok(())
}

#[derive(Parser, Debug)]
#[clap(name = "NetSynth", author = "Tibor Schneider")]
struct CommandLineArguments {
    /// Action to perform
    #[clap(subcommand)]
    cmd: MainCommand,
}

#[derive(Subcommand, Debug)]
enum MainCommand {
    /// Synthesize the sessions and compile the configuration of every router
    #[clap(name = "compile")]
    Compile {
        /// Example network to use
        #[clap(value_enum, short = 'e', long = "example")]
        network: ExampleNetwork,
        /// Target platform (junosphere, olive or olive-patched)
        #[clap(short = 'p', long, default_value = "junosphere")]
        platform: Platform,
        /// IGP used inside every AS (ospf or isis)
        #[clap(short = 'i', long, default_value = "ospf")]
        igp: IgpProtocol,
        /// Directory to which the descriptors are written
        #[clap(short = 'o', long, default_value = "out")]
        out: PathBuf,
        /// Number of worker threads (one per CPU if not set)
        #[clap(short = 't', long)]
        threads: Option<usize>,
    },
    /// Synthesize and print the BGP sessions
    #[clap(name = "sessions")]
    Sessions {
        /// Example network to use
        #[clap(value_enum, short = 'e', long = "example")]
        network: ExampleNetwork,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum ExampleNetwork {
    /// Four routers in a single AS, iBGP full mesh
    SingleAs,
    /// Three ASes, one of them using a route reflector
    MultiAs,
    /// One AS with three levels of route reflection
    ThreeLevel,
}

impl ExampleNetwork {
    /// Returns the topology and the synthesized session graph, with all policies attached.
    fn build(self, diag: &mut Diagnostics) -> Result<(Topology, SessionGraph), Box<dyn Error>> {
        match self {
            Self::SingleAs => prepare::<SingleAs>(diag),
            Self::MultiAs => prepare::<MultiAs>(diag),
            Self::ThreeLevel => prepare::<ThreeLevelAs>(diag),
        }
    }
}

fn prepare<T: ExampleTopology>(
    diag: &mut Diagnostics,
) -> Result<(Topology, SessionGraph), Box<dyn Error>> {
    let topology = T::topology();
    let mut sessions = SessionGraph::synthesize(&topology, diag)?;
    T::attach_policies(&topology, &mut sessions)?;
    Ok((topology, sessions))
}
