//! # geogrid-core: distribution network model
//!
//! Provides the in-memory model that readers populate: buses, lines,
//! transformers, capacitors, loads and distributed generation, held in an
//! undirected `petgraph` graph.
//!
//! ## Design
//!
//! - **Nodes**: buses plus the elements attached to a bus (loads, capacitors,
//!   generators). Attached elements name their bus rather than hanging off an
//!   edge, so topology queries only ever walk bus-to-bus edges.
//! - **Edges**: lines and transformers between two buses.
//! - **Names**: every element has a unique name (usually the GeoJSON feature
//!   id). Inserting a name that already exists is reported as
//!   [`InsertOutcome::Duplicate`] and leaves the model untouched, which makes
//!   re-reading the same input idempotent.
//!
//! ## Quick Start
//!
//! ```rust
//! use geogrid_core::*;
//!
//! let mut model = DistributionModel::new();
//! model.add_bus(Bus::new("J1").with_voltage(Kilovolts(13.2))).unwrap();
//! model.add_bus(Bus::new("J2")).unwrap();
//! model
//!     .add_line(Line {
//!         name: "L1".to_string(),
//!         from_bus: "J1".to_string(),
//!         to_bus: "J2".to_string(),
//!         length: Meters(120.0),
//!         ..Line::default()
//!     })
//!     .unwrap();
//!
//! let feeder = model.finalize();
//! assert_eq!(feeder.source_bus.as_deref(), Some("J1"));
//! assert_eq!(model.stats().lines, 1);
//! ```

use std::collections::{HashMap, VecDeque};
use std::fmt;

use petgraph::graph::{EdgeIndex, Graph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Undirected;
use serde::{Deserialize, Serialize};

pub mod diagnostics;
pub mod error;
pub mod graph_utils;
pub mod units;

pub use diagnostics::{DiagnosticIssue, Diagnostics, ImportDiagnostics, ImportStats, Severity};
pub use error::{GridError, GridResult};
pub use graph_utils::*;
pub use units::{
    Amperes, KilovoltAmperes, Kilovars, Kilovolts, Kilowatts, Meters, Ohms, Percent,
};

// ============================================================================
// Enumerations
// ============================================================================

/// Conductor phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phase {
    A,
    B,
    C,
    N,
}

impl Phase {
    /// The three power-carrying phases in order
    pub const ABC: [Phase; 3] = [Phase::A, Phase::B, Phase::C];
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::A => "A",
            Phase::B => "B",
            Phase::C => "C",
            Phase::N => "N",
        };
        write!(f, "{s}")
    }
}

/// Winding or element connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connection {
    #[default]
    Wye,
    Delta,
}

/// Construction class of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineClass {
    #[default]
    Overhead,
    Underground,
}

/// Voltage dependence of a load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadModel {
    #[default]
    ConstantPower,
    ConstantImpedance,
    ConstantCurrent,
}

/// Technology of a distributed generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorKind {
    #[default]
    Photovoltaic,
    Generic,
}

/// Kind tag for any element stored in the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Bus,
    Line,
    Transformer,
    Capacitor,
    Load,
    Generator,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ElementKind::Bus => "bus",
            ElementKind::Line => "line",
            ElementKind::Transformer => "transformer",
            ElementKind::Capacitor => "capacitor",
            ElementKind::Load => "load",
            ElementKind::Generator => "generator",
        };
        write!(f, "{s}")
    }
}

// ============================================================================
// Element structs
// ============================================================================

/// Geographic position (WGS84 degrees)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub longitude: f64,
    pub latitude: f64,
}

impl Position {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bus {
    pub name: String,
    /// Human-readable name from the source data
    pub display_name: Option<String>,
    pub position: Option<Position>,
    /// Nominal line-to-line voltage
    pub nominal_voltage: Option<Kilovolts>,
    /// Feeder head / substation bus
    pub is_source: bool,
}

impl Bus {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_voltage(mut self, voltage: Kilovolts) -> Self {
        self.nominal_voltage = Some(voltage);
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn as_source(mut self) -> Self {
        self.is_source = true;
        self
    }
}

/// One conductor of a line
#[derive(Debug, Clone, PartialEq)]
pub struct Wire {
    /// Catalog name of the conductor
    pub name: String,
    pub phase: Phase,
    pub resistance_per_km: Ohms,
    pub reactance_per_km: Ohms,
    pub ampacity: Option<Amperes>,
    pub diameter_mm: Option<f64>,
    pub gmr_mm: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub name: String,
    pub from_bus: String,
    pub to_bus: String,
    /// Catalog line type the parameters came from
    pub line_type: String,
    pub length: Meters,
    pub phases: Vec<Phase>,
    pub wires: Vec<Wire>,
    /// Total series resistance of a phase conductor over the line length
    pub resistance: Ohms,
    /// Total series reactance of a phase conductor over the line length
    pub reactance: Ohms,
    pub nominal_voltage: Option<Kilovolts>,
    pub line_class: LineClass,
    pub ampacity: Option<Amperes>,
    /// Geographic route as drawn in the source data
    pub route: Vec<Position>,
}

impl Default for Line {
    fn default() -> Self {
        Self {
            name: String::new(),
            from_bus: String::new(),
            to_bus: String::new(),
            line_type: String::new(),
            length: Meters::ZERO,
            phases: Phase::ABC.to_vec(),
            wires: Vec::new(),
            resistance: Ohms(0.0),
            reactance: Ohms(0.0),
            nominal_voltage: None,
            line_class: LineClass::Overhead,
            ampacity: None,
            route: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Winding {
    pub voltage: Kilovolts,
    pub connection: Connection,
    /// Winding resistance on the transformer rating
    pub resistance: Percent,
    pub rated_power: KilovoltAmperes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transformer {
    pub name: String,
    /// Primary (first winding) side
    pub from_bus: String,
    /// Secondary (second winding) side
    pub to_bus: String,
    pub equipment: String,
    pub rated_power: KilovoltAmperes,
    /// Leakage reactance between the first two windings
    pub reactance: Percent,
    pub phases: Vec<Phase>,
    pub windings: Vec<Winding>,
    pub position: Option<Position>,
}

/// Shunt capacitor bank connected to a bus
#[derive(Debug, Clone, PartialEq)]
pub struct Capacitor {
    pub name: String,
    pub bus: String,
    pub equipment: String,
    /// Rated three-phase reactive power at nominal voltage
    pub reactive_power: Kilovars,
    pub nominal_voltage: Kilovolts,
    pub phases: Vec<Phase>,
    pub connection: Connection,
    pub position: Option<Position>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Load {
    pub name: String,
    pub bus: String,
    /// GeoJSON feature the load was assigned to (building or junction)
    pub feature_id: String,
    pub active_power: Kilowatts,
    pub reactive_power: Kilovars,
    pub phases: Vec<Phase>,
    pub nominal_voltage: Option<Kilovolts>,
    pub connection: Connection,
    pub model: LoadModel,
}

/// Distributed generator (e.g. rooftop PV)
#[derive(Debug, Clone, PartialEq)]
pub struct Generator {
    pub name: String,
    pub bus: String,
    pub kind: GeneratorKind,
    pub equipment: Option<String>,
    pub rated_power: Kilowatts,
    pub apparent_power: Option<KilovoltAmperes>,
    pub power_factor: f64,
    pub phases: Vec<Phase>,
    pub position: Option<Position>,
}

// Enum to represent different types of nodes in the graph
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Bus(Bus),
    Load(Load),
    Capacitor(Capacitor),
    Generator(Generator),
}

// Enum to represent different types of edges in the graph
#[derive(Debug, Clone, PartialEq)]
pub enum Edge {
    Line(Line),
    Transformer(Transformer),
}

impl Node {
    /// Unique element name
    pub fn label(&self) -> &str {
        match self {
            Node::Bus(bus) => &bus.name,
            Node::Load(load) => &load.name,
            Node::Capacitor(cap) => &cap.name,
            Node::Generator(g) => &g.name,
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            Node::Bus(_) => ElementKind::Bus,
            Node::Load(_) => ElementKind::Load,
            Node::Capacitor(_) => ElementKind::Capacitor,
            Node::Generator(_) => ElementKind::Generator,
        }
    }

    /// Bus an attached element is connected to (`None` for buses)
    pub fn attached_bus(&self) -> Option<&str> {
        match self {
            Node::Bus(_) => None,
            Node::Load(load) => Some(&load.bus),
            Node::Capacitor(cap) => Some(&cap.bus),
            Node::Generator(g) => Some(&g.bus),
        }
    }
}

impl Edge {
    pub fn label(&self) -> &str {
        match self {
            Edge::Line(line) => &line.name,
            Edge::Transformer(tx) => &tx.name,
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            Edge::Line(_) => ElementKind::Line,
            Edge::Transformer(_) => ElementKind::Transformer,
        }
    }

    /// (from, to) bus names
    pub fn endpoints(&self) -> (&str, &str) {
        match self {
            Edge::Line(line) => (&line.from_bus, &line.to_bus),
            Edge::Transformer(tx) => (&tx.from_bus, &tx.to_bus),
        }
    }
}

// ============================================================================
// Model container
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ElementRef {
    Node(NodeIndex),
    Edge(EdgeIndex),
}

/// Result of inserting an element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Element was added
    Inserted,
    /// An element of the same kind and name already exists; nothing changed
    Duplicate,
}

/// Counts returned by [`DistributionModel::absorb`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AbsorbSummary {
    pub inserted: usize,
    pub duplicates: usize,
}

/// Feeder-level metadata set by [`DistributionModel::finalize`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeederMetadata {
    pub name: String,
    pub source_bus: Option<String>,
    pub nominal_voltage: Option<Kilovolts>,
    /// Number of electrically separate bus groups
    pub islands: usize,
    /// Buses whose nominal voltage was inferred from a neighbour
    pub voltages_inferred: usize,
}

/// The shared distribution network model readers write into
#[derive(Debug, Clone)]
pub struct DistributionModel {
    graph: Graph<Node, Edge, Undirected>,
    index: HashMap<String, ElementRef>,
    feeder: Option<FeederMetadata>,
    valid: bool,
}

impl Default for DistributionModel {
    fn default() -> Self {
        Self::new()
    }
}

impl DistributionModel {
    pub fn new() -> Self {
        Self {
            graph: Graph::new_undirected(),
            index: HashMap::new(),
            feeder: None,
            valid: true,
        }
    }

    /// Read-only access to the underlying graph
    pub fn graph(&self) -> &Graph<Node, Edge, Undirected> {
        &self.graph
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of named elements of all kinds
    pub fn element_count(&self) -> usize {
        self.index.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Kind of the element stored under `name`
    pub fn kind_of(&self, name: &str) -> Option<ElementKind> {
        self.index.get(name).map(|r| match r {
            ElementRef::Node(idx) => self.graph[*idx].kind(),
            ElementRef::Edge(idx) => self.graph[*idx].kind(),
        })
    }

    pub fn bus_index(&self, name: &str) -> Option<NodeIndex> {
        match self.index.get(name) {
            Some(ElementRef::Node(idx)) if matches!(self.graph[*idx], Node::Bus(_)) => Some(*idx),
            _ => None,
        }
    }

    pub fn bus(&self, name: &str) -> Option<&Bus> {
        self.bus_index(name).and_then(|idx| match &self.graph[idx] {
            Node::Bus(bus) => Some(bus),
            _ => None,
        })
    }

    pub fn bus_mut(&mut self, name: &str) -> Option<&mut Bus> {
        let idx = self.bus_index(name)?;
        match &mut self.graph[idx] {
            Node::Bus(bus) => Some(bus),
            _ => None,
        }
    }

    /// Look up a line or transformer by name
    pub fn edge(&self, name: &str) -> Option<&Edge> {
        match self.index.get(name) {
            Some(ElementRef::Edge(idx)) => Some(&self.graph[*idx]),
            _ => None,
        }
    }

    /// Look up any node element by name
    pub fn node(&self, name: &str) -> Option<&Node> {
        match self.index.get(name) {
            Some(ElementRef::Node(idx)) => Some(&self.graph[*idx]),
            _ => None,
        }
    }

    /// Returns `Some(Duplicate)` if `name` already holds an element of `kind`,
    /// an error if it holds a different kind, `None` if it is free.
    fn check_name(&self, name: &str, kind: ElementKind) -> GridResult<Option<InsertOutcome>> {
        if name.is_empty() {
            return Err(GridError::Validation(format!("{kind} without a name")));
        }
        match self.kind_of(name) {
            None => Ok(None),
            Some(existing) if existing == kind => Ok(Some(InsertOutcome::Duplicate)),
            Some(existing) => Err(GridError::Conflict(format!(
                "'{name}' is already used by a {existing}, cannot add a {kind}"
            ))),
        }
    }

    fn require_bus(&self, bus: &str, element: &str, kind: ElementKind) -> GridResult<NodeIndex> {
        self.bus_index(bus).ok_or_else(|| {
            GridError::Reference(format!("{kind} '{element}' references unknown bus '{bus}'"))
        })
    }

    pub fn add_bus(&mut self, bus: Bus) -> GridResult<InsertOutcome> {
        if let Some(outcome) = self.check_name(&bus.name, ElementKind::Bus)? {
            return Ok(outcome);
        }
        let name = bus.name.clone();
        let idx = self.graph.add_node(Node::Bus(bus));
        self.index.insert(name, ElementRef::Node(idx));
        Ok(InsertOutcome::Inserted)
    }

    pub fn add_line(&mut self, line: Line) -> GridResult<InsertOutcome> {
        self.add_edge(Edge::Line(line))
    }

    pub fn add_transformer(&mut self, transformer: Transformer) -> GridResult<InsertOutcome> {
        self.add_edge(Edge::Transformer(transformer))
    }

    fn add_edge(&mut self, edge: Edge) -> GridResult<InsertOutcome> {
        let kind = edge.kind();
        if let Some(outcome) = self.check_name(edge.label(), kind)? {
            return Ok(outcome);
        }
        let (from, to) = edge.endpoints();
        let from_idx = self.require_bus(from, edge.label(), kind)?;
        let to_idx = self.require_bus(to, edge.label(), kind)?;
        let name = edge.label().to_string();
        let idx = self.graph.add_edge(from_idx, to_idx, edge);
        self.index.insert(name, ElementRef::Edge(idx));
        Ok(InsertOutcome::Inserted)
    }

    pub fn add_capacitor(&mut self, capacitor: Capacitor) -> GridResult<InsertOutcome> {
        self.add_attached(Node::Capacitor(capacitor))
    }

    pub fn add_load(&mut self, load: Load) -> GridResult<InsertOutcome> {
        self.add_attached(Node::Load(load))
    }

    pub fn add_generator(&mut self, generator: Generator) -> GridResult<InsertOutcome> {
        self.add_attached(Node::Generator(generator))
    }

    fn add_attached(&mut self, node: Node) -> GridResult<InsertOutcome> {
        let kind = node.kind();
        if let Some(outcome) = self.check_name(node.label(), kind)? {
            return Ok(outcome);
        }
        if let Some(bus) = node.attached_bus() {
            self.require_bus(bus, node.label(), kind)?;
        }
        let name = node.label().to_string();
        let idx = self.graph.add_node(node);
        self.index.insert(name, ElementRef::Node(idx));
        Ok(InsertOutcome::Inserted)
    }

    /// Merge a staged model into this one.
    ///
    /// Elements whose name already exists with the same kind are skipped and
    /// counted as duplicates. A name clash with a different kind fails before
    /// anything is inserted, so on error `self` is unchanged.
    pub fn absorb(&mut self, staged: DistributionModel) -> GridResult<AbsorbSummary> {
        for name in staged.index.keys() {
            if let (Some(existing), Some(incoming)) = (self.kind_of(name), staged.kind_of(name)) {
                if existing != incoming {
                    return Err(GridError::Conflict(format!(
                        "'{name}' is a {existing} in the model but a {incoming} in the input"
                    )));
                }
            }
        }

        let (nodes, edges) = staged.graph.into_nodes_edges();
        let (buses, attached): (Vec<Node>, Vec<Node>) = nodes
            .into_iter()
            .map(|n| n.weight)
            .partition(|n| matches!(n, Node::Bus(_)));

        let mut summary = AbsorbSummary::default();
        let mut tally = |outcome: InsertOutcome| match outcome {
            InsertOutcome::Inserted => summary.inserted += 1,
            InsertOutcome::Duplicate => summary.duplicates += 1,
        };

        for node in buses {
            if let Node::Bus(bus) = node {
                tally(self.add_bus(bus)?);
            }
        }
        for edge in edges {
            tally(self.add_edge(edge.weight)?);
        }
        for node in attached {
            tally(self.add_attached(node)?);
        }

        Ok(summary)
    }

    /// Post-processing after a read: pick the source bus, infer missing bus
    /// voltages across lines and count islands.
    pub fn finalize(&mut self) -> &FeederMetadata {
        let voltages_inferred = self.propagate_voltages();
        let source_bus = self.find_source_bus();
        let nominal_voltage = source_bus
            .as_deref()
            .and_then(|name| self.bus(name))
            .and_then(|bus| bus.nominal_voltage);
        let islands = graph_utils::find_islands(self).islands.len();

        let name = match &source_bus {
            Some(bus) => format!("feeder_{bus}"),
            None => "feeder".to_string(),
        };

        self.feeder.insert(FeederMetadata {
            name,
            source_bus,
            nominal_voltage,
            islands,
            voltages_inferred,
        })
    }

    pub fn feeder(&self) -> Option<&FeederMetadata> {
        self.feeder.as_ref()
    }

    fn find_source_bus(&self) -> Option<String> {
        if let Some(bus) = self.buses().into_iter().find(|b| b.is_source) {
            return Some(bus.name.clone());
        }
        // Primary side of the highest-voltage transformer
        let mut transformers = self.transformers();
        transformers.sort_by(|a, b| {
            let va = a.windings.first().map(|w| w.voltage.value()).unwrap_or(0.0);
            let vb = b.windings.first().map(|w| w.voltage.value()).unwrap_or(0.0);
            vb.total_cmp(&va).then_with(|| a.name.cmp(&b.name))
        });
        if let Some(tx) = transformers.first() {
            return Some(tx.from_bus.clone());
        }
        self.graph.node_weights().find_map(|n| match n {
            Node::Bus(b) => Some(b.name.clone()),
            _ => None,
        })
    }

    /// Breadth-first fill of missing bus voltages across lines (not transformers)
    fn propagate_voltages(&mut self) -> usize {
        let mut queue: VecDeque<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|idx| matches!(&self.graph[*idx], Node::Bus(b) if b.nominal_voltage.is_some()))
            .collect();
        let mut inferred = 0;

        while let Some(idx) = queue.pop_front() {
            let voltage = match &self.graph[idx] {
                Node::Bus(b) => b.nominal_voltage,
                _ => None,
            };
            let Some(voltage) = voltage else { continue };

            let neighbours: Vec<NodeIndex> = self
                .graph
                .edges(idx)
                .filter(|e| matches!(e.weight(), Edge::Line(_)))
                .map(|e| if e.source() == idx { e.target() } else { e.source() })
                .collect();

            for next in neighbours {
                if let Node::Bus(bus) = &mut self.graph[next] {
                    if bus.nominal_voltage.is_none() {
                        bus.nominal_voltage = Some(voltage);
                        inferred += 1;
                        queue.push_back(next);
                    }
                }
            }
        }
        inferred
    }

    /// A model is invalid once a reader has given up on it mid-way
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn mark_invalid(&mut self) {
        self.valid = false;
    }

    /// Number of lines and transformers connected to a bus
    pub fn bus_degree(&self, name: &str) -> usize {
        self.bus_index(name)
            .map(|idx| self.graph.edges(idx).count())
            .unwrap_or(0)
    }

    pub fn buses(&self) -> Vec<&Bus> {
        self.graph
            .node_weights()
            .filter_map(|n| match n {
                Node::Bus(b) => Some(b),
                _ => None,
            })
            .collect()
    }

    pub fn lines(&self) -> Vec<&Line> {
        self.graph
            .edge_weights()
            .filter_map(|e| match e {
                Edge::Line(l) => Some(l),
                _ => None,
            })
            .collect()
    }

    pub fn transformers(&self) -> Vec<&Transformer> {
        self.graph
            .edge_weights()
            .filter_map(|e| match e {
                Edge::Transformer(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    pub fn capacitors(&self) -> Vec<&Capacitor> {
        self.graph
            .node_weights()
            .filter_map(|n| match n {
                Node::Capacitor(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    pub fn loads(&self) -> Vec<&Load> {
        self.graph
            .node_weights()
            .filter_map(|n| match n {
                Node::Load(l) => Some(l),
                _ => None,
            })
            .collect()
    }

    pub fn generators(&self) -> Vec<&Generator> {
        self.graph
            .node_weights()
            .filter_map(|n| match n {
                Node::Generator(g) => Some(g),
                _ => None,
            })
            .collect()
    }

    pub fn loads_at_bus(&self, bus: &str) -> Vec<&Load> {
        self.loads().into_iter().filter(|l| l.bus == bus).collect()
    }

    /// Compute basic statistics about the model
    pub fn stats(&self) -> ModelStats {
        let mut stats = ModelStats::default();

        for node in self.graph.node_weights() {
            match node {
                Node::Bus(_) => stats.buses += 1,
                Node::Load(l) => {
                    stats.loads += 1;
                    stats.total_load_kw += l.active_power.value();
                    stats.total_load_kvar += l.reactive_power.value();
                }
                Node::Capacitor(c) => {
                    stats.capacitors += 1;
                    stats.total_capacitor_kvar += c.reactive_power.value();
                }
                Node::Generator(g) => {
                    stats.generators += 1;
                    stats.total_generation_kw += g.rated_power.value();
                }
            }
        }
        for edge in self.graph.edge_weights() {
            match edge {
                Edge::Line(l) => {
                    stats.lines += 1;
                    stats.total_line_length_m += l.length.value();
                }
                Edge::Transformer(_) => stats.transformers += 1,
            }
        }
        stats
    }

    /// Structural checks on the whole model
    pub fn validate_into(&self, diag: &mut Diagnostics) {
        let stats = self.stats();

        if stats.buses == 0 {
            diag.add_warning("structure", "Model has no buses");
            return;
        }

        if stats.buses > 1 && stats.lines + stats.transformers == 0 {
            diag.add_warning(
                "structure",
                "Model has multiple buses but no lines or transformers",
            );
        }

        if stats.loads == 0 {
            diag.add_warning("structure", "Model has no loads");
        }
    }
}

/// Statistics about a model's size and totals
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModelStats {
    pub buses: usize,
    pub lines: usize,
    pub transformers: usize,
    pub capacitors: usize,
    pub loads: usize,
    pub generators: usize,
    pub total_load_kw: f64,
    pub total_load_kvar: f64,
    pub total_capacitor_kvar: f64,
    pub total_generation_kw: f64,
    pub total_line_length_m: f64,
}

impl fmt::Display for ModelStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} buses, {} lines ({:.0} m), {} transformers, {} capacitors, {} loads ({:.1} kW), {} generators ({:.1} kW)",
            self.buses,
            self.lines,
            self.total_line_length_m,
            self.transformers,
            self.capacitors,
            self.loads,
            self.total_load_kw,
            self.generators,
            self.total_generation_kw
        )
    }
}
