//! Load assignment document: demand per building or junction feature.

use std::collections::HashMap;

use geogrid_core::{Connection, Kilovars, Kilovolts, Kilowatts, LoadModel, Phase};
use serde::Deserialize;

use crate::error::{IssueLog, Stage};

/// One demand record
#[derive(Debug, Clone, Deserialize)]
pub struct LoadRecord {
    /// Building or junction feature the demand belongs to
    pub feature_id: String,
    pub kw: f64,
    #[serde(default)]
    pub kvar: Option<f64>,
    #[serde(default)]
    pub power_factor: Option<f64>,
    #[serde(default)]
    pub phases: Option<Vec<Phase>>,
    #[serde(default)]
    pub nominal_voltage_kv: Option<f64>,
    #[serde(default)]
    pub connection: Option<Connection>,
    #[serde(default)]
    pub model: Option<LoadModel>,
}

impl LoadRecord {
    pub fn active_power(&self) -> Kilowatts {
        Kilowatts(self.kw)
    }

    /// Explicit kvar wins over power factor; with neither the load is purely resistive.
    pub fn reactive_power(&self) -> Result<Kilovars, String> {
        if let Some(kvar) = self.kvar {
            return if kvar.is_finite() {
                Ok(Kilovars(kvar))
            } else {
                Err(format!("kvar must be finite, got {kvar}"))
            };
        }
        match self.power_factor {
            Some(pf) if pf > 0.0 && pf <= 1.0 => {
                Ok(self.active_power().reactive_at_power_factor(pf))
            }
            Some(pf) => Err(format!("power_factor must be in (0, 1], got {pf}")),
            None => Ok(Kilovars(0.0)),
        }
    }

    pub fn nominal_voltage(&self) -> Option<Kilovolts> {
        self.nominal_voltage_kv.map(Kilovolts)
    }

    pub fn phases(&self) -> Vec<Phase> {
        self.phases.clone().unwrap_or_else(|| Phase::ABC.to_vec())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoadAssignments {
    #[serde(default)]
    pub loads: Vec<LoadRecord>,
}

/// Records by feature id, in document order
#[derive(Debug)]
pub struct LoadIndex<'a> {
    records: Vec<&'a LoadRecord>,
    by_feature: HashMap<&'a str, &'a LoadRecord>,
}

impl<'a> LoadIndex<'a> {
    pub fn build(assignments: &'a LoadAssignments, issues: &mut IssueLog) -> Self {
        let mut records = Vec::with_capacity(assignments.loads.len());
        let mut by_feature = HashMap::with_capacity(assignments.loads.len());

        for record in &assignments.loads {
            let id = record.feature_id.as_str();
            if id.is_empty() {
                issues.malformed_input(Stage::Assignments, "load record without feature_id");
                continue;
            }
            if !record.kw.is_finite() {
                let message = format!("kw must be finite, got {}", record.kw);
                issues.malformed(Stage::Assignments, id, message);
                continue;
            }
            if let Some(kv) = record.nominal_voltage_kv {
                if !(kv.is_finite() && kv > 0.0) {
                    let message = format!("nominal_voltage_kv must be positive, got {kv}");
                    issues.malformed(Stage::Assignments, id, message);
                    continue;
                }
            }
            if by_feature.contains_key(id) {
                issues.malformed(Stage::Assignments, id, "multiple load records for one feature");
                continue;
            }
            by_feature.insert(id, record);
            records.push(record);
        }

        Self {
            records,
            by_feature,
        }
    }

    pub fn records(&self) -> impl Iterator<Item = &'a LoadRecord> + '_ {
        self.records.iter().copied()
    }

    pub fn get(&self, feature_id: &str) -> Option<&'a LoadRecord> {
        self.by_feature.get(feature_id).copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: &str) -> LoadRecord {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn kvar_wins_over_power_factor() {
        let r = record(r#"{"feature_id": "b1", "kw": 100, "kvar": 10, "power_factor": 0.8}"#);
        assert_eq!(r.reactive_power().unwrap(), Kilovars(10.0));
    }

    #[test]
    fn power_factor_derives_kvar() {
        let r = record(r#"{"feature_id": "b1", "kw": 80, "power_factor": 0.8}"#);
        assert!((r.reactive_power().unwrap().value() - 60.0).abs() < 1e-9);
        let r = record(r#"{"feature_id": "b1", "kw": 80}"#);
        assert_eq!(r.reactive_power().unwrap(), Kilovars(0.0));
        let r = record(r#"{"feature_id": "b1", "kw": 80, "power_factor": 1.3}"#);
        assert!(r.reactive_power().is_err());
    }

    #[test]
    fn defaults() {
        let r = record(r#"{"feature_id": "b1", "kw": 5, "model": "constant_impedance"}"#);
        assert_eq!(r.phases(), Phase::ABC.to_vec());
        assert_eq!(r.model, Some(LoadModel::ConstantImpedance));
        assert_eq!(r.connection, None);
    }

    #[test]
    fn duplicate_feature_records_are_malformed() {
        let assignments: LoadAssignments = serde_json::from_str(
            r#"{"loads": [
                {"feature_id": "b1", "kw": 5},
                {"feature_id": "b2", "kw": 7},
                {"feature_id": "b1", "kw": 9}
            ]}"#,
        )
        .unwrap();
        let mut issues = IssueLog::new();
        let index = LoadIndex::build(&assignments, &mut issues);

        assert_eq!(index.len(), 2);
        assert_eq!(issues.len(), 1);
        assert_eq!(index.get("b1").unwrap().kw, 5.0);
        let kept: Vec<f64> = index.records().map(|r| r.kw).collect();
        assert_eq!(kept, vec![5.0, 7.0]);
    }

    #[test]
    fn non_positive_voltage_is_malformed() {
        let assignments: LoadAssignments = serde_json::from_str(
            r#"{"loads": [
                {"feature_id": "b1", "kw": 5, "nominal_voltage_kv": -0.48},
                {"feature_id": "b2", "kw": 7, "nominal_voltage_kv": 0.0},
                {"feature_id": "b3", "kw": 3, "nominal_voltage_kv": 0.24}
            ]}"#,
        )
        .unwrap();
        let mut issues = IssueLog::new();
        let index = LoadIndex::build(&assignments, &mut issues);

        assert_eq!(issues.count(crate::error::IssueKind::Malformed), 2);
        assert!(index.get("b1").is_none());
        assert!(index.get("b2").is_none());
        assert_eq!(index.get("b3").unwrap().nominal_voltage(), Some(Kilovolts(0.24)));
    }

    #[test]
    fn empty_document() {
        let assignments: LoadAssignments = serde_json::from_str("{}").unwrap();
        let mut issues = IssueLog::new();
        assert!(LoadIndex::build(&assignments, &mut issues).is_empty());
    }
}
