//! # geogrid-io: urban network readers
//!
//! Populates a [`geogrid_core::DistributionModel`] from a GeoJSON urban
//! power network description plus an equipment catalog and a load
//! assignment file.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use geogrid_core::DistributionModel;
//! use geogrid_io::{GeoJsonReader, ModelReader};
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut reader = GeoJsonReader::builder()
//!         .geojson_file("feeder.geojson")
//!         .equipment_file("equipment.json")
//!         .load_file("loads.json")
//!         .build()?;
//!
//!     let mut model = DistributionModel::new();
//!     let report = reader.parse(&mut model)?;
//!     println!("{}", report.diagnostics.summary());
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! 1. **Load** the three documents (each read fully, then closed)
//! 2. **Index** features, catalog entries and load records, recording malformed input
//! 3. **Sub-parsers**: lines, nodes, transformers, capacitors, loads, distributed generation
//! 4. **Validate** the staged model (islands, voltages, lengths, attachments)
//! 5. **Merge** into the caller's model and run feeder post-processing
//!
//! Malformed input and unresolved references are collected across steps 2
//! and 3 and reported together; configuration and I/O errors abort at once.

pub mod config;
pub mod equipment;
pub mod error;
pub mod geojson;
pub mod helpers;
pub mod loads;
pub mod reader;

pub use config::{InputPaths, ReaderInputs, ReaderOptions};
pub use equipment::{EquipmentCatalog, LengthUnit};
pub use error::{IssueKind, ParseIssue, ReaderError, Stage};
pub use geojson::{GeoJsonReader, GeoJsonReaderBuilder};
pub use loads::{LoadAssignments, LoadRecord};
pub use reader::{ModelReader, ParseReport};
