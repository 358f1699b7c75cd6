//! Equipment catalog: conductor, line type, transformer, capacitor and
//! generator specifications referenced by name from GeoJSON features.

use std::collections::HashMap;

use geogrid_core::{
    Amperes, Connection, KilovoltAmperes, Kilovars, Kilovolts, Kilowatts, LineClass, Meters,
    Ohms, Percent, Phase, Wire, Winding,
};
use serde::{Deserialize, Serialize};

use crate::error::{IssueLog, Stage};

/// Length unit of the per-length impedances used by a line type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    #[default]
    Km,
    Mi,
    Kft,
    M,
}

impl LengthUnit {
    /// Kilometers in one unit
    pub fn kilometers(self) -> f64 {
        match self {
            LengthUnit::Km => 1.0,
            LengthUnit::Mi => 1.609_344,
            LengthUnit::Kft => 0.304_8,
            LengthUnit::M => 0.001,
        }
    }

    /// Number of units in a length
    pub fn units_in(self, length: Meters) -> f64 {
        length.to_kilometers() / self.kilometers()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireSpec {
    pub name: String,
    pub resistance_ohm_per_km: f64,
    pub reactance_ohm_per_km: f64,
    pub ampacity_a: f64,
    #[serde(default)]
    pub diameter_mm: Option<f64>,
    #[serde(default)]
    pub gmr_mm: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LineTypeSpec {
    pub name: String,
    pub phases: Vec<Phase>,
    pub wire: String,
    #[serde(default)]
    pub neutral_wire: Option<String>,
    pub nominal_voltage_kv: f64,
    #[serde(default)]
    pub line_class: LineClass,
    /// Unit the wire impedances are expressed per
    #[serde(default)]
    pub length_unit: LengthUnit,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WindingSpec {
    pub voltage_kv: f64,
    #[serde(default)]
    pub connection: Connection,
    #[serde(default)]
    pub resistance_percent: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransformerSpec {
    pub name: String,
    pub rated_kva: f64,
    pub phases: Vec<Phase>,
    pub reactance_percent: f64,
    pub windings: Vec<WindingSpec>,
}

impl TransformerSpec {
    pub fn model_windings(&self) -> Vec<Winding> {
        self.windings
            .iter()
            .map(|w| Winding {
                voltage: Kilovolts(w.voltage_kv),
                connection: w.connection,
                resistance: Percent(w.resistance_percent.unwrap_or(0.0)),
                rated_power: KilovoltAmperes(self.rated_kva),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CapacitorSpec {
    pub name: String,
    pub kvar: f64,
    pub nominal_voltage_kv: f64,
    pub phases: Vec<Phase>,
    #[serde(default)]
    pub connection: Connection,
}

impl CapacitorSpec {
    pub fn reactive_power(&self) -> Kilovars {
        Kilovars(self.kvar)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorSpec {
    pub name: String,
    pub rated_kw: f64,
    #[serde(default)]
    pub rated_kva: Option<f64>,
    #[serde(default)]
    pub power_factor: Option<f64>,
    #[serde(default)]
    pub phases: Option<Vec<Phase>>,
}

/// Equipment catalog document
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EquipmentCatalog {
    pub wires: Vec<WireSpec>,
    pub line_types: Vec<LineTypeSpec>,
    pub transformers: Vec<TransformerSpec>,
    pub capacitors: Vec<CapacitorSpec>,
    pub generators: Vec<GeneratorSpec>,
}

/// Electrical parameters of one line derived from its type and length
#[derive(Debug, Clone, PartialEq)]
pub struct LineParameters {
    pub phases: Vec<Phase>,
    pub wires: Vec<Wire>,
    pub resistance: Ohms,
    pub reactance: Ohms,
    pub ampacity: Amperes,
    pub nominal_voltage: Kilovolts,
    pub line_class: LineClass,
}

fn index_by_name<'a, T>(
    items: &'a [T],
    name: impl Fn(&T) -> &str,
    section: &str,
    issues: &mut IssueLog,
) -> HashMap<&'a str, &'a T> {
    let mut map = HashMap::with_capacity(items.len());
    for item in items {
        let key = name(item);
        if key.is_empty() {
            issues.malformed_input(Stage::Equipment, format!("{section} entry without a name"));
        } else if map.insert(key, item).is_some() {
            issues.malformed(
                Stage::Equipment,
                key,
                format!("duplicate {section} entry '{key}'"),
            );
        }
    }
    map
}

fn non_negative(value: f64, what: &str, entity: &str, issues: &mut IssueLog) {
    if !value.is_finite() || value < 0.0 {
        issues.malformed(
            Stage::Equipment,
            entity,
            format!("{what} must be a non-negative number, got {value}"),
        );
    }
}

fn positive(value: f64, what: &str, entity: &str, issues: &mut IssueLog) {
    if !value.is_finite() || value <= 0.0 {
        issues.malformed(
            Stage::Equipment,
            entity,
            format!("{what} must be positive, got {value}"),
        );
    }
}

/// Name lookup over a loaded catalog
#[derive(Debug)]
pub struct EquipmentIndex<'a> {
    wires: HashMap<&'a str, &'a WireSpec>,
    line_types: HashMap<&'a str, &'a LineTypeSpec>,
    transformers: HashMap<&'a str, &'a TransformerSpec>,
    capacitors: HashMap<&'a str, &'a CapacitorSpec>,
    generators: HashMap<&'a str, &'a GeneratorSpec>,
}

impl<'a> EquipmentIndex<'a> {
    /// Index the catalog, recording duplicates, out-of-range values and
    /// line types whose conductors are missing.
    pub fn build(catalog: &'a EquipmentCatalog, issues: &mut IssueLog) -> Self {
        let index = Self {
            wires: index_by_name(&catalog.wires, |w| w.name.as_str(), "wire", issues),
            line_types: index_by_name(
                &catalog.line_types,
                |l| l.name.as_str(),
                "line type",
                issues,
            ),
            transformers: index_by_name(
                &catalog.transformers,
                |t| t.name.as_str(),
                "transformer",
                issues,
            ),
            capacitors: index_by_name(
                &catalog.capacitors,
                |c| c.name.as_str(),
                "capacitor",
                issues,
            ),
            generators: index_by_name(
                &catalog.generators,
                |g| g.name.as_str(),
                "generator",
                issues,
            ),
        };

        for wire in &catalog.wires {
            non_negative(wire.resistance_ohm_per_km, "resistance", &wire.name, issues);
            non_negative(wire.ampacity_a, "ampacity", &wire.name, issues);
        }

        for line_type in &catalog.line_types {
            if line_type.phases.is_empty() {
                issues.malformed(Stage::Equipment, &line_type.name, "line type has no phases");
            }
            positive(line_type.nominal_voltage_kv, "nominal voltage", &line_type.name, issues);
            let wires = std::iter::once(&line_type.wire).chain(line_type.neutral_wire.as_ref());
            for wire in wires {
                if !index.wires.contains_key(wire.as_str()) {
                    issues.unresolved(
                        Stage::Equipment,
                        &line_type.name,
                        format!("line type references unknown wire '{wire}'"),
                    );
                }
            }
        }

        for tx in &catalog.transformers {
            if tx.windings.len() < 2 {
                issues.malformed(
                    Stage::Equipment,
                    &tx.name,
                    format!("transformer needs at least 2 windings, found {}", tx.windings.len()),
                );
            }
            positive(tx.rated_kva, "rated_kva", &tx.name, issues);
            for winding in &tx.windings {
                positive(winding.voltage_kv, "winding voltage", &tx.name, issues);
            }
        }

        for cap in &catalog.capacitors {
            non_negative(cap.kvar, "kvar", &cap.name, issues);
            positive(cap.nominal_voltage_kv, "nominal voltage", &cap.name, issues);
        }

        for gen in &catalog.generators {
            non_negative(gen.rated_kw, "rated_kw", &gen.name, issues);
            if let Some(pf) = gen.power_factor {
                if !(pf > 0.0 && pf <= 1.0) {
                    issues.malformed(
                        Stage::Equipment,
                        &gen.name,
                        format!("power_factor must be in (0, 1], got {pf}"),
                    );
                }
            }
        }

        index
    }

    pub fn wire(&self, name: &str) -> Option<&'a WireSpec> {
        self.wires.get(name).copied()
    }

    pub fn line_type(&self, name: &str) -> Option<&'a LineTypeSpec> {
        self.line_types.get(name).copied()
    }

    pub fn transformer(&self, name: &str) -> Option<&'a TransformerSpec> {
        self.transformers.get(name).copied()
    }

    pub fn capacitor(&self, name: &str) -> Option<&'a CapacitorSpec> {
        self.capacitors.get(name).copied()
    }

    pub fn generator(&self, name: &str) -> Option<&'a GeneratorSpec> {
        self.generators.get(name).copied()
    }

    /// Conductors and total series impedance of a line of the given type
    /// and length. `None` when the line type's phase wire is not in the
    /// catalog (already recorded while indexing).
    pub fn line_parameters(
        &self,
        line_type: &LineTypeSpec,
        length: Meters,
    ) -> Option<LineParameters> {
        let phase_wire = self.wire(&line_type.wire)?;
        let unit = line_type.length_unit;
        let per_km = |per_unit: f64| Ohms(per_unit / unit.kilometers());

        let to_wire = |spec: &WireSpec, phase: Phase| Wire {
            name: spec.name.clone(),
            phase,
            resistance_per_km: per_km(spec.resistance_ohm_per_km),
            reactance_per_km: per_km(spec.reactance_ohm_per_km),
            ampacity: Some(Amperes(spec.ampacity_a)),
            diameter_mm: spec.diameter_mm,
            gmr_mm: spec.gmr_mm,
        };

        let mut wires: Vec<Wire> = line_type
            .phases
            .iter()
            .map(|phase| to_wire(phase_wire, *phase))
            .collect();
        if let Some(neutral) = line_type.neutral_wire.as_deref().and_then(|n| self.wire(n)) {
            if !line_type.phases.contains(&Phase::N) {
                wires.push(to_wire(neutral, Phase::N));
            }
        }

        let units = unit.units_in(length);
        Some(LineParameters {
            phases: line_type.phases.clone(),
            wires,
            resistance: Ohms(phase_wire.resistance_ohm_per_km * units),
            reactance: Ohms(phase_wire.reactance_ohm_per_km * units),
            ampacity: Amperes(phase_wire.ampacity_a),
            nominal_voltage: Kilovolts(line_type.nominal_voltage_kv),
            line_class: line_type.line_class,
        })
    }
}

impl GeneratorSpec {
    pub fn rated_power(&self) -> Kilowatts {
        Kilowatts(self.rated_kw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IssueKind;

    fn catalog(json: &str) -> EquipmentCatalog {
        serde_json::from_str(json).unwrap()
    }

    const CATALOG: &str = r#"{
        "wires": [
            {"name": "336_ACSR", "resistance_ohm_per_km": 0.306, "reactance_ohm_per_km": 0.4, "ampacity_a": 530.0},
            {"name": "4/0_AA", "resistance_ohm_per_km": 0.592, "reactance_ohm_per_km": 0.6, "ampacity_a": 340.0, "gmr_mm": 5.2}
        ],
        "line_types": [
            {"name": "OH3P", "phases": ["A", "B", "C"], "wire": "336_ACSR", "neutral_wire": "4/0_AA", "nominal_voltage_kv": 13.2},
            {"name": "UG1P", "phases": ["A"], "wire": "4/0_AA", "nominal_voltage_kv": 0.24, "line_class": "underground", "length_unit": "mi"}
        ],
        "transformers": [
            {"name": "T500", "rated_kva": 500.0, "phases": ["A", "B", "C"], "reactance_percent": 5.75,
             "windings": [{"voltage_kv": 13.2, "connection": "delta"}, {"voltage_kv": 0.48, "resistance_percent": 0.6}]}
        ],
        "capacitors": [{"name": "C300", "kvar": 300.0, "nominal_voltage_kv": 13.2, "phases": ["A", "B", "C"]}],
        "generators": [{"name": "PV50", "rated_kw": 50.0, "power_factor": 0.95}]
    }"#;

    #[test]
    fn builds_index_without_issues() {
        let catalog = catalog(CATALOG);
        let mut issues = IssueLog::new();
        let index = EquipmentIndex::build(&catalog, &mut issues);
        assert!(issues.is_empty());
        assert!(index.line_type("OH3P").is_some());
        assert!(index.transformer("T500").is_some());
        assert!(index.generator("PV50").is_some());
        assert!(index.capacitor("missing").is_none());
    }

    #[test]
    fn line_parameters_scale_with_length() {
        let catalog = catalog(CATALOG);
        let mut issues = IssueLog::new();
        let index = EquipmentIndex::build(&catalog, &mut issues);
        let params = index
            .line_parameters(index.line_type("OH3P").unwrap(), Meters(2000.0))
            .unwrap();

        assert!((params.resistance.value() - 0.612).abs() < 1e-9);
        assert!((params.reactance.value() - 0.8).abs() < 1e-9);
        assert_eq!(params.wires.len(), 4);
        assert_eq!(params.wires[3].phase, Phase::N);
        assert_eq!(params.wires[3].gmr_mm, Some(5.2));
        assert_eq!(params.line_class, LineClass::Overhead);
    }

    #[test]
    fn per_mile_impedance_is_converted() {
        let catalog = catalog(CATALOG);
        let mut issues = IssueLog::new();
        let index = EquipmentIndex::build(&catalog, &mut issues);
        // One mile of 0.592 ohm/mi conductor
        let params = index
            .line_parameters(index.line_type("UG1P").unwrap(), Meters(1609.344))
            .unwrap();

        assert!((params.resistance.value() - 0.592).abs() < 1e-9);
        assert!((params.wires[0].resistance_per_km.value() - 0.592 / 1.609_344).abs() < 1e-12);
        assert_eq!(params.line_class, LineClass::Underground);
    }

    #[test]
    fn duplicate_and_dangling_entries_are_reported() {
        let catalog = catalog(
            r#"{
            "wires": [
                {"name": "W", "resistance_ohm_per_km": 0.1, "reactance_ohm_per_km": 0.1, "ampacity_a": 100},
                {"name": "W", "resistance_ohm_per_km": 0.2, "reactance_ohm_per_km": 0.1, "ampacity_a": 100}
            ],
            "line_types": [{"name": "LT", "phases": ["A"], "wire": "NOPE", "nominal_voltage_kv": 0.4}],
            "transformers": [{"name": "T", "rated_kva": 10, "phases": ["A"], "reactance_percent": 2, "windings": [{"voltage_kv": 0.4}]}]
        }"#,
        );
        let mut issues = IssueLog::new();
        EquipmentIndex::build(&catalog, &mut issues);

        assert_eq!(issues.count(IssueKind::Malformed), 2);
        assert_eq!(issues.count(IssueKind::Unresolved), 1);
    }

    #[test]
    fn non_positive_voltages_are_malformed() {
        let catalog = catalog(
            r#"{
            "wires": [{"name": "W", "resistance_ohm_per_km": 0.1, "reactance_ohm_per_km": 0.1, "ampacity_a": 100}],
            "line_types": [{"name": "LT0", "phases": ["A"], "wire": "W", "nominal_voltage_kv": 0.0}],
            "transformers": [{"name": "TX", "rated_kva": 25, "phases": ["A"], "reactance_percent": 2,
                              "windings": [{"voltage_kv": 0.0}, {"voltage_kv": -0.24}]}],
            "capacitors": [{"name": "CN", "kvar": 50, "nominal_voltage_kv": -13.2, "phases": ["A"]}]
        }"#,
        );
        let mut issues = IssueLog::new();
        EquipmentIndex::build(&catalog, &mut issues);

        assert_eq!(issues.count(IssueKind::Malformed), 4);
        let err = issues.into_result().unwrap_err();
        let entities: Vec<_> = err.issues().iter().filter_map(|i| i.entity.as_deref()).collect();
        assert_eq!(entities, vec!["LT0", "TX", "TX", "CN"]);
    }

    #[test]
    fn length_units() {
        assert_eq!(LengthUnit::default(), LengthUnit::Km);
        assert!((LengthUnit::Kft.units_in(Meters(304.8)) - 1.0).abs() < 1e-12);
        assert!((LengthUnit::M.units_in(Meters(12.5)) - 12.5).abs() < 1e-12);
    }

    #[test]
    fn unknown_enum_is_schema_error() {
        let result: Result<EquipmentCatalog, _> = serde_json::from_str(
            r#"{"line_types": [{"name": "X", "phases": ["Q"], "wire": "W", "nominal_voltage_kv": 1}]}"#,
        );
        assert!(result.is_err());
    }
}
