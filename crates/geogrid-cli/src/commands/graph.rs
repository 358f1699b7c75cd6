use std::fs;

use anyhow::Result;
use geogrid_cli::GraphCommands;
use geogrid_core::graph_utils;

use super::load_model;

pub fn handle(command: &GraphCommands) -> Result<()> {
    match command {
        GraphCommands::Stats { inputs } => {
            let (model, _) = load_model(inputs)?;
            let stats = graph_utils::graph_stats(&model);
            println!("Graph statistics:");
            println!("  Buses         : {}", stats.bus_count);
            println!("  Branches      : {}", stats.branch_count);
            println!("  Components    : {}", stats.connected_components);
            println!(
                "  Degree [min/avg/max]: {}/{:.2}/{}",
                stats.min_degree, stats.avg_degree, stats.max_degree
            );
            println!("  Density       : {:.4}", stats.density);
            Ok(())
        }
        GraphCommands::Islands { inputs, emit } => {
            let (model, _) = load_model(inputs)?;
            let analysis = graph_utils::find_islands(&model);
            for summary in &analysis.islands {
                println!("Island {}: {} bus(es)", summary.island_id, summary.bus_count);
            }
            if *emit {
                println!("\nBus → Island assignments:");
                for assignment in &analysis.assignments {
                    println!(
                        "  idx {:>3}: {:<20} -> island {}",
                        assignment.node_index, assignment.label, assignment.island_id
                    );
                }
            }
            Ok(())
        }
        GraphCommands::Export {
            inputs,
            format,
            out,
        } => {
            let (model, _) = load_model(inputs)?;
            let dot = graph_utils::export_graph(&model, format)?;
            if let Some(path) = out {
                fs::write(path, &dot)?;
                println!("Graph exported to {}", path.display());
            } else {
                println!("{dot}");
            }
            Ok(())
        }
    }
}
