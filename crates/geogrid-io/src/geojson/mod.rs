//! GeoJSON urban network reader.
//!
//! A read takes three documents: the network geometry (a GeoJSON
//! FeatureCollection), the equipment catalog, and the load assignments.
//! Sub-parsers run in a fixed order (lines, nodes, transformers,
//! capacitors, loads, distributed generation) against a staged model which
//! is validated and then merged into the caller's model in one step.

pub mod features;
mod session;
pub mod topology;

use std::fs;
use std::path::{Path, PathBuf};

use geogrid_core::DistributionModel;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::{InputPaths, ReaderInputs, ReaderOptions};
use crate::equipment::{EquipmentCatalog, EquipmentIndex};
use crate::error::{IssueLog, ReaderError};
use crate::helpers::{validate_model, ValidationConfig};
use crate::loads::{LoadAssignments, LoadIndex};
use crate::reader::{ModelReader, ParseReport};

pub use features::{Feature, FeatureCollection, FeatureIndex, FeatureKind};
use session::ParseSession;

/// Read a whole file and decode it as JSON
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ReaderError> {
    let contents = fs::read_to_string(path).map_err(|source| ReaderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ReaderError::Json {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Clone)]
pub struct GeoJsonReader {
    inputs: InputPaths,
    options: ReaderOptions,
}

impl GeoJsonReader {
    /// Fails with [`ReaderError::Config`] naming the first missing input.
    pub fn new(inputs: ReaderInputs) -> Result<Self, ReaderError> {
        let paths = inputs.require()?;
        Ok(Self {
            inputs: paths,
            options: inputs.options,
        })
    }

    pub fn builder() -> GeoJsonReaderBuilder {
        GeoJsonReaderBuilder::default()
    }

    /// Reader configured from a TOML file
    pub fn from_config(path: &Path) -> Result<Self, ReaderError> {
        Self::new(ReaderInputs::load_from(path)?)
    }

    pub fn inputs(&self) -> &InputPaths {
        &self.inputs
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    pub fn load_geometry_data(path: &Path) -> Result<FeatureCollection, ReaderError> {
        read_json(path)
    }

    pub fn load_equipment_data(path: &Path) -> Result<EquipmentCatalog, ReaderError> {
        read_json(path)
    }

    pub fn load_assignment_data(path: &Path) -> Result<LoadAssignments, ReaderError> {
        read_json(path)
    }

    /// Parse all inputs into a fresh model without touching any caller state.
    fn stage(&self) -> Result<(DistributionModel, ParseReport), ReaderError> {
        let collection = Self::load_geometry_data(&self.inputs.geojson_file)?;
        let catalog = Self::load_equipment_data(&self.inputs.equipment_file)?;
        let assignments = Self::load_assignment_data(&self.inputs.load_file)?;
        debug!(
            features = collection.features.len(),
            loads = assignments.loads.len(),
            "loaded inputs"
        );

        let mut issues = IssueLog::new();
        let features = FeatureIndex::build(&collection, &mut issues);
        let equipment = EquipmentIndex::build(&catalog, &mut issues);
        let loads = LoadIndex::build(&assignments, &mut issues);
        if features.ignored() > 0 {
            debug!(ignored = features.ignored(), "skipped features of unhandled types");
        }

        let mut staged = DistributionModel::new();
        let mut session = ParseSession::new(&features, &equipment, &loads, &self.options, issues);
        session.parse_lines(&mut staged);
        session.parse_nodes(&mut staged);
        session.parse_transformers(&mut staged);
        session.parse_capacitors(&mut staged);
        session.parse_loads(&mut staged);
        session.parse_dg(&mut staged);

        // Propagate voltages before falling back to the configured default
        staged.finalize();
        session.apply_default_voltage(&mut staged);

        let (issues, mut diagnostics) = session.finish();
        if !issues.is_empty() {
            warn!(count = issues.len(), "input has unresolved or malformed features");
        }
        issues.into_result()?;

        let stats = staged.stats();
        diagnostics.stats.buses = stats.buses;
        diagnostics.stats.lines = stats.lines;
        diagnostics.stats.transformers = stats.transformers;
        diagnostics.stats.capacitors = stats.capacitors;
        diagnostics.stats.loads = stats.loads;
        diagnostics.stats.generators = stats.generators;

        let findings = validate_model(&staged, &mut diagnostics, &ValidationConfig::default());
        if findings > 0 {
            if self.options.strict {
                return Err(ReaderError::Validation(diagnostics));
            }
            warn!(findings, "model validation reported warnings");
        }

        Ok((
            staged,
            ParseReport {
                diagnostics,
                ..ParseReport::default()
            },
        ))
    }
}

impl ModelReader for GeoJsonReader {
    fn parse(&mut self, model: &mut DistributionModel) -> Result<ParseReport, ReaderError> {
        info!(
            geojson = %self.inputs.geojson_file.display(),
            equipment = %self.inputs.equipment_file.display(),
            loads = %self.inputs.load_file.display(),
            "reading urban network"
        );

        let (staged, mut report) = self.stage()?;

        let summary = match model.absorb(staged) {
            Ok(summary) => summary,
            Err(err) => {
                model.mark_invalid();
                return Err(err.into());
            }
        };
        report.inserted = summary.inserted;
        report.duplicates = summary.duplicates;
        report.diagnostics.stats.duplicates_skipped = summary.duplicates;
        report.feeder = Some(model.finalize().clone());

        info!(
            inserted = report.inserted,
            duplicates = report.duplicates,
            "{}",
            report.diagnostics.summary()
        );
        Ok(report)
    }
}

/// Builder for [`GeoJsonReader`]
#[derive(Debug, Clone, Default)]
pub struct GeoJsonReaderBuilder {
    inputs: ReaderInputs,
}

impl GeoJsonReaderBuilder {
    pub fn geojson_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.inputs.geojson_file = Some(path.into());
        self
    }

    pub fn equipment_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.inputs.equipment_file = Some(path.into());
        self
    }

    pub fn load_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.inputs.load_file = Some(path.into());
        self
    }

    pub fn options(mut self, options: ReaderOptions) -> Self {
        self.inputs.options = options;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.inputs.options.strict = strict;
        self
    }

    pub fn snap_tolerance_m(mut self, meters: f64) -> Self {
        self.inputs.options.snap_tolerance_m = meters;
        self
    }

    pub fn build(self) -> Result<GeoJsonReader, ReaderError> {
        GeoJsonReader::new(self.inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_requires_every_input() {
        let err = GeoJsonReader::builder()
            .geojson_file("feeder.geojson")
            .equipment_file("equipment.json")
            .build()
            .unwrap_err();
        assert!(matches!(err, ReaderError::Config(ref m) if m.contains("load_file")));

        let reader = GeoJsonReader::builder()
            .geojson_file("feeder.geojson")
            .equipment_file("equipment.json")
            .load_file("loads.json")
            .strict(true)
            .build()
            .unwrap();
        assert!(reader.options().strict);
        assert_eq!(reader.inputs().load_file, PathBuf::from("loads.json"));
    }

    #[test]
    fn loaders_reject_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{\"type\": \"FeatureCollection\", ").unwrap();

        assert!(matches!(
            GeoJsonReader::load_geometry_data(&path),
            Err(ReaderError::Json { .. })
        ));
        assert!(matches!(
            GeoJsonReader::load_equipment_data(&path),
            Err(ReaderError::Json { .. })
        ));
        assert!(matches!(
            GeoJsonReader::load_assignment_data(&path),
            Err(ReaderError::Json { .. })
        ));
    }

    #[test]
    fn loaders_report_missing_files() {
        let err = GeoJsonReader::load_geometry_data(Path::new("/nonexistent/feeder.geojson"))
            .unwrap_err();
        match err {
            ReaderError::Io { path, .. } => assert!(path.ends_with("feeder.geojson")),
            other => panic!("expected I/O error, got {other:?}"),
        }
    }
}
