// PNR: 2-D Digital-Circuit Place-and-Route Engine
// Copyright (C) 2024  PNR contributors
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

//! Command-line driver: ingest a synthesized design, place it on a square
//! grid, anneal or descend the placement, route every net, and optionally
//! dump the routed layers to disk.

use clap::{Parser, ValueEnum};
use log::{info, warn};
use pnr::geometry::Point2;
use pnr::grid::GatesGrid;
use pnr::ingest::ingest;
use pnr::placer::{Placer, RandomDescent, SimulatedAnnealing};
use pnr::router::Router;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PlacerKind {
    /// Accept a mutation only if it strictly lowers cost.
    RandomDescent,
    /// Metropolis-criterion annealing with a quadratic cooling schedule.
    Annealing,
}

/// 2-D digital-circuit place-and-route engine.
#[derive(Parser, Debug)]
#[command(name = "pnr", author = "PNR contributors", version, about)]
struct Cli {
    /// Technology library used by the upstream synthesis step. Accepted for
    /// compatibility with the synthesis pipeline's argument order; this
    /// engine only reads the already-synthesized design source.
    tech_lib: PathBuf,

    /// Synthesized design, as a JSON netlist dump.
    design_source: PathBuf,

    /// Name of the module within `design_source` to place and route.
    module: String,

    /// Side length of the square placement grid, in tiles.
    grid_side: i64,

    /// Random seed driving placement and routing.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Placement strategy.
    #[arg(long, value_enum, default_value_t = PlacerKind::Annealing)]
    placer: PlacerKind,

    /// Number of placement steps.
    #[arg(long, default_value_t = 20_000)]
    max_steps: u64,

    /// Initial annealing temperature (ignored by `random-descent`).
    #[arg(long, default_value_t = 50.0)]
    init_temp: f64,

    /// Floor annealing temperature (ignored by `random-descent`).
    #[arg(long, default_value_t = 0.01)]
    min_temp: f64,

    /// Number of routing layers.
    #[arg(long, default_value_t = 2)]
    layers: i64,

    /// Directory to write `routes-layer<k>` dump files into. Skipped if
    /// omitted.
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();
    run(&cli)?;
    Ok(())
}

fn run(cli: &Cli) -> Result<(), pnr::Error> {
    let mut rng = StdRng::seed_from_u64(cli.seed);

    if cli.tech_lib.as_os_str() != "-" && !cli.tech_lib.exists() {
        warn!(
            "technology library {} not found; proceeding anyway, it is unused by this engine",
            cli.tech_lib.display()
        );
    }

    info!("reading design source {}", cli.design_source.display());
    let json = std::fs::read_to_string(&cli.design_source)?;
    let netlist = ingest(&json, &cli.module)?;
    info!(
        "module {}: {} gates, {} nets",
        cli.module,
        netlist.num_gates(),
        netlist.net_to_gates().len()
    );

    let dim = Point2::new(cli.grid_side, cli.grid_side);
    let mut grid = GatesGrid::new(dim, &netlist, &mut rng)?;
    info!("initial placement cost: {:.2}", grid.cost());

    match cli.placer {
        PlacerKind::RandomDescent => {
            let mut placer = RandomDescent::new(&grid, cli.max_steps);
            run_placer(&mut placer, &mut grid, &mut rng)?;
        }
        PlacerKind::Annealing => {
            let mut placer =
                SimulatedAnnealing::new(&grid, cli.init_temp, cli.min_temp, cli.max_steps);
            run_placer(&mut placer, &mut grid, &mut rng)?;
        }
    }
    info!("final placement cost: {:.2}", grid.cost());

    let router = Router::new(dim, cli.layers);
    let routes = router.route(&netlist, &grid)?;
    info!("routed {} nets", routes.routed_nets().count());

    if let Some(dir) = &cli.out_dir {
        std::fs::create_dir_all(dir)?;
        routes.write_layers(dir)?;
        info!("wrote layer dumps to {}", dir.display());
    }

    Ok(())
}

fn run_placer<P: Placer>(
    placer: &mut P,
    grid: &mut GatesGrid,
    rng: &mut StdRng,
) -> Result<(), pnr::Error> {
    loop {
        let done = placer.step(grid, rng)?;
        if done || placer.telemetry().steps % 500 == 0 {
            println!("{}", placer.hud_text());
        }
        if done {
            break;
        }
    }
    Ok(())
}
