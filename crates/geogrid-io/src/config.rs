//! Reader inputs and tuning options.
//!
//! Inputs can be given directly or loaded from a TOML file:
//!
//! ```toml
//! geojson_file = "feeder.geojson"
//! equipment_file = "equipment.json"
//! load_file = "loads.json"
//!
//! [options]
//! snap_tolerance_m = 1.0
//! strict = true
//! ```
//!
//! Relative paths in a TOML file are resolved against the file's directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ReaderError;

/// Tuning knobs for topology resolution and validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderOptions {
    /// Max distance between a line end and a junction for coordinate snapping.
    pub snap_tolerance_m: f64,

    /// Max distance from a building centroid to the junction that serves it.
    pub max_service_distance_m: f64,

    /// Voltage given to buses that end up with none after parsing.
    pub default_voltage_kv: Option<f64>,

    /// Treat validation warnings as errors.
    pub strict: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            snap_tolerance_m: 0.5,
            max_service_distance_m: 250.0,
            default_voltage_kv: None,
            strict: false,
        }
    }
}

/// The three named inputs of a GeoJSON read plus options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReaderInputs {
    pub geojson_file: Option<PathBuf>,
    pub equipment_file: Option<PathBuf>,
    pub load_file: Option<PathBuf>,
    #[serde(default)]
    pub options: ReaderOptions,
}

/// Inputs after the presence check
#[derive(Debug, Clone, PartialEq)]
pub struct InputPaths {
    pub geojson_file: PathBuf,
    pub equipment_file: PathBuf,
    pub load_file: PathBuf,
}

impl ReaderInputs {
    pub fn new(
        geojson_file: impl Into<PathBuf>,
        equipment_file: impl Into<PathBuf>,
        load_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            geojson_file: Some(geojson_file.into()),
            equipment_file: Some(equipment_file.into()),
            load_file: Some(load_file.into()),
            options: ReaderOptions::default(),
        }
    }

    /// Load inputs from a TOML file.
    pub fn load_from(path: &Path) -> Result<Self, ReaderError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ReaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut inputs: Self = toml::from_str(&contents).map_err(|e| {
            ReaderError::Config(format!("invalid reader config {}: {e}", path.display()))
        })?;

        if let Some(base) = path.parent() {
            for file in [
                &mut inputs.geojson_file,
                &mut inputs.equipment_file,
                &mut inputs.load_file,
            ]
            .into_iter()
            .flatten()
            {
                if file.is_relative() {
                    *file = base.join(&*file);
                }
            }
        }
        Ok(inputs)
    }

    /// Save inputs to a TOML file.
    pub fn save_to(&self, path: &Path) -> Result<(), ReaderError> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ReaderError::Config(format!("cannot serialize reader config: {e}")))?;
        std::fs::write(path, contents).map_err(|source| ReaderError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Fill any input missing here from `other` (command line over file).
    pub fn merge_missing(mut self, other: ReaderInputs) -> Self {
        self.geojson_file = self.geojson_file.or(other.geojson_file);
        self.equipment_file = self.equipment_file.or(other.equipment_file);
        self.load_file = self.load_file.or(other.load_file);
        self
    }

    /// Check that all three inputs are present.
    pub fn require(&self) -> Result<InputPaths, ReaderError> {
        fn need(value: &Option<PathBuf>, name: &str) -> Result<PathBuf, ReaderError> {
            value
                .clone()
                .ok_or_else(|| ReaderError::Config(format!("missing required input '{name}'")))
        }

        Ok(InputPaths {
            geojson_file: need(&self.geojson_file, "geojson_file")?,
            equipment_file: need(&self.equipment_file, "equipment_file")?,
            load_file: need(&self.load_file, "load_file")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_is_named() {
        let inputs = ReaderInputs {
            geojson_file: Some("a.geojson".into()),
            load_file: Some("loads.json".into()),
            ..Default::default()
        };
        let err = inputs.require().unwrap_err();
        assert!(matches!(err, ReaderError::Config(_)));
        assert!(err.to_string().contains("equipment_file"));
    }

    #[test]
    fn toml_roundtrip_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reader.toml");
        std::fs::write(
            &path,
            r#"
geojson_file = "feeder.geojson"
equipment_file = "/abs/equipment.json"
load_file = "loads.json"

[options]
snap_tolerance_m = 2.0
strict = true
"#,
        )
        .unwrap();

        let inputs = ReaderInputs::load_from(&path).unwrap();
        assert_eq!(inputs.geojson_file, Some(dir.path().join("feeder.geojson")));
        assert_eq!(inputs.equipment_file, Some(PathBuf::from("/abs/equipment.json")));
        assert_eq!(inputs.options.snap_tolerance_m, 2.0);
        assert_eq!(inputs.options.max_service_distance_m, 250.0);
        assert!(inputs.options.strict);

        let saved = dir.path().join("saved.toml");
        inputs.save_to(&saved).unwrap();
        let reloaded = ReaderInputs::load_from(&saved).unwrap();
        assert_eq!(reloaded, inputs);
    }

    #[test]
    fn config_without_path_fails_on_require() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reader.toml");
        std::fs::write(&path, "geojson_file = \"f.geojson\"\n").unwrap();

        let inputs = ReaderInputs::load_from(&path).unwrap();
        let err = inputs.require().unwrap_err();
        assert!(err.to_string().contains("equipment_file"));
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reader.toml");
        std::fs::write(&path, "geojson_file = [").unwrap();
        assert!(matches!(
            ReaderInputs::load_from(&path),
            Err(ReaderError::Config(_))
        ));
    }

    #[test]
    fn merge_prefers_existing() {
        let cli = ReaderInputs {
            geojson_file: Some("cli.geojson".into()),
            ..Default::default()
        };
        let file = ReaderInputs::new("file.geojson", "eq.json", "loads.json");
        let merged = cli.merge_missing(file);
        assert_eq!(merged.geojson_file, Some(PathBuf::from("cli.geojson")));
        assert_eq!(merged.load_file, Some(PathBuf::from("loads.json")));
    }
}
