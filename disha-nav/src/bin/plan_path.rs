//! Debug planner: load a map file and print the path between two points.
//!
//! ```text
//! plan_path maps/gdc1.txt --start 0,0 --goal 5,2 --resolution 0.25
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use log::info;

use disha_nav::planning::{GlobalPlanner, GlobalPlannerConfig};
use rekha_map::{Point2D, VectorMap};

#[derive(Parser, Debug)]
#[command(about = "Plan a global path on a vector map")]
struct Args {
    /// Path to the map file (`x0 y0 x1 y1` per line).
    map: PathBuf,

    /// Start location as `x,y` (meters).
    #[arg(long, value_parser = parse_point, default_value = "0,0")]
    start: Point2D,

    /// Goal location as `x,y` (meters).
    #[arg(long, value_parser = parse_point)]
    goal: Point2D,

    /// Lattice resolution (meters).
    #[arg(long, default_value_t = 0.25)]
    resolution: f32,

    /// Cushion clearance offset (meters).
    #[arg(long, default_value_t = 0.25)]
    clearance: f32,
}

fn parse_point(s: &str) -> Result<Point2D, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got {:?}", s))?;
    let x: f32 = x.trim().parse().map_err(|e| format!("bad x: {}", e))?;
    let y: f32 = y.trim().parse().map_err(|e| format!("bad y: {}", e))?;
    Ok(Point2D::new(x, y))
}

fn main() -> disha_nav::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let map = Arc::new(VectorMap::load(&args.map)?);
    info!("map {:?}: {} segments", args.map, map.len());

    let config = GlobalPlannerConfig {
        resolution: args.resolution,
        clearance_offset: args.clearance,
    };
    let mut planner = GlobalPlanner::new(config, map);
    planner.initialize(args.start);

    let path = planner.plan(args.goal);
    if path.is_empty() {
        println!("no path found");
        return Ok(());
    }

    let locations = planner.path_locations(&path);
    println!("{} waypoints:", locations.len());
    for (key, loc) in path.iter().zip(&locations) {
        println!("  {:>8}  ({:7.3}, {:7.3})", key, loc.x, loc.y);
    }
    let length: f32 = locations
        .windows(2)
        .map(|pair| pair[0].distance(&pair[1]))
        .sum();
    println!("total length: {:.3} m", length);

    Ok(())
}
