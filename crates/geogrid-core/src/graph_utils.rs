use crate::{DistributionModel, Edge, Node};
use anyhow::{anyhow, Result};
use petgraph::algo::connected_components;
use petgraph::visit::EdgeRef;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};

/// Summary statistics over the bus-level topology
#[derive(Debug, Serialize)]
pub struct GraphStats {
    pub bus_count: usize,
    pub branch_count: usize,
    /// Components of the full graph, attached elements counted as their own nodes
    pub connected_components: usize,
    pub min_degree: usize,
    pub avg_degree: f64,
    pub max_degree: usize,
    pub density: f64,
}

#[derive(Debug, Serialize)]
pub struct IslandSummary {
    pub island_id: usize,
    pub bus_count: usize,
}

/// Island membership of a single bus
#[derive(Debug, Serialize)]
pub struct BusAssignment {
    pub node_index: usize,
    pub label: String,
    pub island_id: usize,
}

#[derive(Debug, Serialize)]
pub struct IslandAnalysis {
    pub islands: Vec<IslandSummary>,
    pub assignments: Vec<BusAssignment>,
}

impl IslandAnalysis {
    pub fn island_of(&self, bus: &str) -> Option<usize> {
        self.assignments
            .iter()
            .find(|a| a.label == bus)
            .map(|a| a.island_id)
    }
}

fn is_bus(model: &DistributionModel, idx: petgraph::graph::NodeIndex) -> bool {
    matches!(model.graph()[idx], Node::Bus(_))
}

/// Degree and density figures over buses and the lines/transformers between them.
pub fn graph_stats(model: &DistributionModel) -> GraphStats {
    let graph = model.graph();
    let buses: Vec<_> = graph.node_indices().filter(|n| is_bus(model, *n)).collect();
    let bus_count = buses.len();
    let branch_count = graph.edge_count();

    let degrees: Vec<usize> = buses.iter().map(|n| graph.edges(*n).count()).collect();
    let min_degree = degrees.iter().copied().min().unwrap_or(0);
    let max_degree = degrees.iter().copied().max().unwrap_or(0);
    let avg_degree = if bus_count == 0 {
        0.0
    } else {
        degrees.iter().sum::<usize>() as f64 / bus_count as f64
    };
    let density = if bus_count < 2 {
        0.0
    } else {
        2.0 * branch_count as f64 / (bus_count as f64 * (bus_count as f64 - 1.0))
    };

    GraphStats {
        bus_count,
        branch_count,
        connected_components: connected_components(graph),
        min_degree,
        avg_degree,
        max_degree,
        density,
    }
}

/// Breadth-first labelling of bus islands. Loads, capacitors and generators
/// belong to the island of their bus and are not listed.
pub fn find_islands(model: &DistributionModel) -> IslandAnalysis {
    let graph = model.graph();
    let mut visited = HashSet::new();
    let mut islands = Vec::new();
    let mut assignments = Vec::new();
    let mut island_id = 0;

    for start in graph.node_indices().filter(|n| is_bus(model, *n)) {
        if visited.contains(&start) {
            continue;
        }
        let mut queue = VecDeque::from([start]);
        let mut members = Vec::new();
        while let Some(node) = queue.pop_front() {
            if !visited.insert(node) {
                continue;
            }
            members.push(node);
            for neighbor in graph.neighbors(node) {
                if !visited.contains(&neighbor) && is_bus(model, neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
        islands.push(IslandSummary {
            island_id,
            bus_count: members.len(),
        });
        for node in members {
            assignments.push(BusAssignment {
                node_index: node.index(),
                label: graph[node].label().to_string(),
                island_id,
            });
        }
        island_id += 1;
    }

    assignments.sort_by_key(|assignment| assignment.node_index);
    IslandAnalysis {
        islands,
        assignments,
    }
}

/// Export the bus topology to DOT (Graphviz).
pub fn export_graph(model: &DistributionModel, format: &str) -> Result<String> {
    match format.to_ascii_lowercase().as_str() {
        "graphviz" | "dot" => Ok(render_dot(model)),
        other => Err(anyhow!("unsupported graph export format '{other}'")),
    }
}

fn render_dot(model: &DistributionModel) -> String {
    let graph = model.graph();
    let mut buffer = String::new();
    buffer.push_str("graph distribution_model {\n");
    for node in graph.node_indices().filter(|n| is_bus(model, *n)) {
        let label = sanitize_label(graph[node].label());
        buffer.push_str(&format!("  n{} [label=\"{}\"];\n", node.index(), label));
    }
    for edge in graph.edge_references() {
        let source = edge.source().index();
        let target = edge.target().index();
        let style = match edge.weight() {
            Edge::Line(_) => "",
            Edge::Transformer(_) => " [style=bold]",
        };
        let label = sanitize_label(edge.weight().label());
        buffer.push_str(&format!(
            "  n{source} -- n{target}{style}; // {label}\n"
        ));
    }
    buffer.push('}');
    buffer
}

fn sanitize_label(label: &str) -> String {
    label.replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Bus, Connection, Kilovars, Kilowatts, Line, Load, LoadModel, Meters};

    fn model_with_islands() -> DistributionModel {
        let mut model = DistributionModel::new();
        for name in ["A", "B", "C", "D"] {
            model.add_bus(Bus::new(name)).unwrap();
        }
        model
            .add_line(Line {
                name: "AB".into(),
                from_bus: "A".into(),
                to_bus: "B".into(),
                length: Meters(10.0),
                ..Line::default()
            })
            .unwrap();
        model
            .add_line(Line {
                name: "CD".into(),
                from_bus: "C".into(),
                to_bus: "D".into(),
                length: Meters(10.0),
                ..Line::default()
            })
            .unwrap();
        model
            .add_load(Load {
                name: "LD".into(),
                bus: "B".into(),
                feature_id: "LD".into(),
                active_power: Kilowatts(1.0),
                reactive_power: Kilovars(0.0),
                phases: vec![],
                nominal_voltage: None,
                connection: Connection::Wye,
                model: LoadModel::ConstantPower,
            })
            .unwrap();
        model
    }

    #[test]
    fn islands_only_count_buses() {
        let model = model_with_islands();
        let analysis = find_islands(&model);
        assert_eq!(analysis.islands.len(), 2);
        assert_eq!(analysis.assignments.len(), 4);
        assert_eq!(analysis.island_of("A"), analysis.island_of("B"));
        assert_ne!(analysis.island_of("A"), analysis.island_of("C"));
        assert_eq!(analysis.island_of("LD"), None);
    }

    #[test]
    fn stats_over_buses() {
        let stats = graph_stats(&model_with_islands());
        assert_eq!(stats.bus_count, 4);
        assert_eq!(stats.branch_count, 2);
        assert_eq!(stats.max_degree, 1);
        assert!((stats.avg_degree - 1.0).abs() < 1e-12);
    }

    #[test]
    fn dot_export() {
        let dot = export_graph(&model_with_islands(), "dot").unwrap();
        assert!(dot.starts_with("graph distribution_model {"));
        assert!(dot.contains("label=\"A\""));
        assert!(!dot.contains("label=\"LD\""));
        assert!(export_graph(&model_with_islands(), "svg").is_err());
    }
}
