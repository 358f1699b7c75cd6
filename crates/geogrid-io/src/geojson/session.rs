//! The per-category sub-parsers of one GeoJSON read.
//!
//! Each sub-parser walks the features of its category, resolves junctions
//! and catalog entries, and inserts typed elements into the staged model.
//! Problems are recorded in the session's [`IssueLog`] and the offending
//! feature is left out; the reader turns a non-empty log into an error once
//! every sub-parser has run.

use geo::{LineString, Point};
use geogrid_core::{
    Bus, Capacitor, DistributionModel, Generator, GeneratorKind, GridError, GridResult,
    ImportDiagnostics, InsertOutcome, KilovoltAmperes, Kilovolts, Kilowatts, Line, Load, Meters,
    Percent, Phase, Transformer,
};
use tracing::debug;

use super::features::{Feature, FeatureIndex, FeatureKind};
use super::topology::{anchor_point, endpoints, position, route, route_length, JunctionLocator};
use crate::config::ReaderOptions;
use crate::equipment::EquipmentIndex;
use crate::error::{IssueLog, Stage};
use crate::loads::LoadIndex;

struct GeneratorRating {
    equipment: Option<String>,
    rated_power: Kilowatts,
    apparent_power: Option<KilovoltAmperes>,
    power_factor: f64,
    phases: Vec<Phase>,
}

pub(crate) struct ParseSession<'a> {
    features: &'a FeatureIndex,
    equipment: &'a EquipmentIndex<'a>,
    loads: &'a LoadIndex<'a>,
    options: &'a ReaderOptions,
    locator: JunctionLocator<'a>,
    issues: IssueLog,
    diag: ImportDiagnostics,
}

impl<'a> ParseSession<'a> {
    pub fn new(
        features: &'a FeatureIndex,
        equipment: &'a EquipmentIndex<'a>,
        loads: &'a LoadIndex<'a>,
        options: &'a ReaderOptions,
        issues: IssueLog,
    ) -> Self {
        Self {
            features,
            equipment,
            loads,
            options,
            locator: JunctionLocator::new(features),
            issues,
            diag: ImportDiagnostics::new(),
        }
    }

    pub fn finish(self) -> (IssueLog, ImportDiagnostics) {
        (self.issues, self.diag)
    }

    // ------------------------------------------------------------------
    // Sub-parsers
    // ------------------------------------------------------------------

    pub fn parse_lines(&mut self, model: &mut DistributionModel) {
        let features = self.features;
        for feature in features.of_kind(FeatureKind::Connector) {
            let Some(path) = feature.line_string() else {
                continue;
            };
            let ends = endpoints(path);
            let snap = self.options.snap_tolerance_m;
            let from = self.resolve_junction(
                Stage::Lines,
                feature,
                "startJunctionId",
                ends.map(|e| e.0),
                snap,
            );
            let to = self.resolve_junction(
                Stage::Lines,
                feature,
                "endJunctionId",
                ends.map(|e| e.1),
                snap,
            );
            let line_type = self.equipment_ref(
                Stage::Lines,
                feature,
                "line_type",
                "line type",
                EquipmentIndex::line_type,
            );
            let length = self.line_length(feature, path);

            let (Some(from), Some(to), Some(line_type), Some(length)) =
                (from, to, line_type, length)
            else {
                continue;
            };
            if from == to {
                self.issues.malformed(
                    Stage::Lines,
                    &feature.id,
                    format!("connector joins junction '{from}' to itself"),
                );
                continue;
            }
            // A missing conductor was reported while indexing the catalog
            let Some(params) = self.equipment.line_parameters(line_type, length) else {
                continue;
            };

            let voltage = Some(params.nominal_voltage);
            let from = self.ensure_bus(model, Stage::Lines, &feature.id, &from, voltage);
            let to = self.ensure_bus(model, Stage::Lines, &feature.id, &to, voltage);
            let (Some(from_bus), Some(to_bus)) = (from, to) else {
                continue;
            };

            let line = Line {
                name: feature.id.clone(),
                from_bus,
                to_bus,
                line_type: line_type.name.clone(),
                length,
                phases: params.phases,
                wires: params.wires,
                resistance: params.resistance,
                reactance: params.reactance,
                nominal_voltage: voltage,
                line_class: params.line_class,
                ampacity: Some(params.ampacity),
                route: route(path),
            };
            self.insert(Stage::Lines, &feature.id, model.add_line(line));
        }
        debug!(lines = model.stats().lines, "parsed lines");
    }

    pub fn parse_nodes(&mut self, model: &mut DistributionModel) {
        let features = self.features;
        for junction in features.of_kind(FeatureKind::Junction) {
            self.ensure_bus(model, Stage::Nodes, &junction.id, &junction.id, None);
        }
        debug!(buses = model.stats().buses, "parsed nodes");
    }

    pub fn parse_transformers(&mut self, model: &mut DistributionModel) {
        let features = self.features;
        for feature in features.of_kind(FeatureKind::Transformer) {
            let spec = self.equipment_ref(
                Stage::Transformers,
                feature,
                "equipment",
                "transformer",
                EquipmentIndex::transformer,
            );
            // Point transformers carry explicit junction ids only
            let ends = feature.line_string().and_then(endpoints);
            let snap = self.options.snap_tolerance_m;
            let from = self.resolve_junction(
                Stage::Transformers,
                feature,
                "startJunctionId",
                ends.map(|e| e.0),
                snap,
            );
            let to = self.resolve_junction(
                Stage::Transformers,
                feature,
                "endJunctionId",
                ends.map(|e| e.1),
                snap,
            );

            let (Some(spec), Some(from), Some(to)) = (spec, from, to) else {
                continue;
            };
            if from == to {
                self.issues.malformed(
                    Stage::Transformers,
                    &feature.id,
                    format!("transformer joins junction '{from}' to itself"),
                );
                continue;
            }
            let windings = spec.model_windings();
            if windings.len() < 2 {
                continue;
            }

            let primary = Some(windings[0].voltage);
            let secondary = Some(windings[1].voltage);
            let from = self.ensure_bus(model, Stage::Transformers, &feature.id, &from, primary);
            let to = self.ensure_bus(model, Stage::Transformers, &feature.id, &to, secondary);
            let (Some(from_bus), Some(to_bus)) = (from, to) else {
                continue;
            };

            let transformer = Transformer {
                name: feature.id.clone(),
                from_bus,
                to_bus,
                equipment: spec.name.clone(),
                rated_power: KilovoltAmperes(spec.rated_kva),
                reactance: Percent(spec.reactance_percent),
                phases: spec.phases.clone(),
                windings,
                position: anchor_point(&feature.geometry).map(position),
            };
            self.insert(Stage::Transformers, &feature.id, model.add_transformer(transformer));
        }
        debug!(transformers = model.stats().transformers, "parsed transformers");
    }

    pub fn parse_capacitors(&mut self, model: &mut DistributionModel) {
        let features = self.features;
        for feature in features.of_kind(FeatureKind::Capacitor) {
            let spec = self.equipment_ref(
                Stage::Capacitors,
                feature,
                "equipment",
                "capacitor",
                EquipmentIndex::capacitor,
            );
            let snap = self.options.snap_tolerance_m;
            let junction = self.resolve_junction(
                Stage::Capacitors,
                feature,
                "junctionId",
                feature.point(),
                snap,
            );
            let (Some(spec), Some(junction)) = (spec, junction) else {
                continue;
            };

            let voltage = Kilovolts(spec.nominal_voltage_kv);
            let Some(bus) =
                self.ensure_bus(model, Stage::Capacitors, &feature.id, &junction, Some(voltage))
            else {
                continue;
            };

            let capacitor = Capacitor {
                name: feature.id.clone(),
                bus,
                equipment: spec.name.clone(),
                reactive_power: spec.reactive_power(),
                nominal_voltage: voltage,
                phases: spec.phases.clone(),
                connection: spec.connection,
                position: feature.point().map(position),
            };
            self.insert(Stage::Capacitors, &feature.id, model.add_capacitor(capacitor));
        }
        debug!(capacitors = model.stats().capacitors, "parsed capacitors");
    }

    pub fn parse_loads(&mut self, model: &mut DistributionModel) {
        let features = self.features;
        let loads = self.loads;

        for record in loads.records() {
            let feature_id = record.feature_id.as_str();
            let Some(target) = features.get(feature_id) else {
                self.issues.unresolved(
                    Stage::Loads,
                    feature_id,
                    format!("load references unknown feature '{feature_id}'"),
                );
                continue;
            };

            let junction = match target.kind {
                FeatureKind::Junction => Some(target.id.clone()),
                FeatureKind::Building => {
                    let centroid = anchor_point(&target.geometry);
                    let reach = self.options.max_service_distance_m;
                    self.resolve_junction(Stage::Loads, target, "junctionId", centroid, reach)
                }
                _ => {
                    self.issues.unresolved(
                        Stage::Loads,
                        feature_id,
                        format!(
                            "load feature is a {}, expected a Building or ElectricalJunction",
                            target.feature_type
                        ),
                    );
                    None
                }
            };
            let reactive_power = match record.reactive_power() {
                Ok(q) => Some(q),
                Err(message) => {
                    self.issues.malformed(Stage::Loads, feature_id, message);
                    None
                }
            };

            let (Some(junction), Some(reactive_power)) = (junction, reactive_power) else {
                continue;
            };
            let voltage = record.nominal_voltage();
            let Some(bus) = self.ensure_bus(model, Stage::Loads, feature_id, &junction, voltage)
            else {
                continue;
            };

            let load = Load {
                name: format!("load_{feature_id}"),
                bus,
                feature_id: feature_id.to_string(),
                active_power: record.active_power(),
                reactive_power,
                phases: record.phases(),
                nominal_voltage: record.nominal_voltage(),
                connection: record.connection.unwrap_or_default(),
                model: record.model.unwrap_or_default(),
            };
            self.insert(Stage::Loads, feature_id, model.add_load(load));
        }

        for building in features.of_kind(FeatureKind::Building) {
            if loads.get(&building.id).is_none() {
                self.diag
                    .add_warning_with_entity("loads", "building has no load record", &building.id);
            }
        }
        debug!(loads = model.stats().loads, "parsed loads");
    }

    pub fn parse_dg(&mut self, model: &mut DistributionModel) {
        let features = self.features;
        for feature in features.of_kind(FeatureKind::Generation) {
            let reach = self.options.max_service_distance_m;
            let junction = self.resolve_junction(
                Stage::Generation,
                feature,
                "junctionId",
                feature.point(),
                reach,
            );
            let rating = self.generator_rating(feature);
            let (Some(junction), Some(rating)) = (junction, rating) else {
                continue;
            };
            let Some(bus) = self.ensure_bus(model, Stage::Generation, &feature.id, &junction, None)
            else {
                continue;
            };

            let kind = if feature.feature_type == "PV" {
                GeneratorKind::Photovoltaic
            } else {
                GeneratorKind::Generic
            };
            let generator = Generator {
                name: feature.id.clone(),
                bus,
                kind,
                equipment: rating.equipment,
                rated_power: rating.rated_power,
                apparent_power: rating.apparent_power,
                power_factor: rating.power_factor,
                phases: rating.phases,
                position: feature.point().map(position),
            };
            self.insert(Stage::Generation, &feature.id, model.add_generator(generator));
        }
        debug!(generators = model.stats().generators, "parsed distributed generation");
    }

    /// Give every bus still without a voltage the configured default
    pub fn apply_default_voltage(&mut self, model: &mut DistributionModel) {
        let Some(kv) = self.options.default_voltage_kv else {
            return;
        };
        let missing: Vec<String> = model
            .buses()
            .into_iter()
            .filter(|b| b.nominal_voltage.is_none())
            .map(|b| b.name.clone())
            .collect();
        for name in missing {
            if let Some(bus) = model.bus_mut(&name) {
                bus.nominal_voltage = Some(Kilovolts(kv));
                self.diag
                    .add_default(&name, &format!("nominal voltage defaulted to {kv} kV"));
            }
        }
    }

    // ------------------------------------------------------------------
    // Shared resolution helpers
    // ------------------------------------------------------------------

    /// Junction referenced by `key`, or the nearest junction to `snap_from`
    /// within `tolerance_m` when the property is absent.
    fn resolve_junction(
        &mut self,
        stage: Stage,
        feature: &Feature,
        key: &str,
        snap_from: Option<Point<f64>>,
        tolerance_m: f64,
    ) -> Option<String> {
        if let Some(id) = feature.id_prop(key) {
            if self.features.junction(&id).is_some() {
                return Some(id);
            }
            self.issues.unresolved(
                stage,
                &feature.id,
                format!("{key} references unknown junction '{id}'"),
            );
            return None;
        }

        let Some(point) = snap_from else {
            self.issues
                .malformed(stage, &feature.id, format!("missing '{key}'"));
            return None;
        };
        match self.locator.nearest(&point, tolerance_m) {
            Some(snap) => {
                self.diag.add_default(
                    &feature.id,
                    &format!(
                        "{key} resolved to junction '{}' ({:.2} m away)",
                        snap.junction,
                        snap.distance.value()
                    ),
                );
                Some(snap.junction.to_string())
            }
            None => {
                self.issues.unresolved(
                    stage,
                    &feature.id,
                    format!("no '{key}' and no junction within {tolerance_m} m"),
                );
                None
            }
        }
    }

    /// Catalog entry named by property `key`
    fn equipment_ref<T: 'a>(
        &mut self,
        stage: Stage,
        feature: &Feature,
        key: &str,
        what: &str,
        lookup: fn(&EquipmentIndex<'a>, &str) -> Option<&'a T>,
    ) -> Option<&'a T> {
        let Some(name) = feature.id_prop(key) else {
            self.issues
                .malformed(stage, &feature.id, format!("missing '{key}'"));
            return None;
        };
        let found = lookup(self.equipment, &name);
        if found.is_none() {
            self.issues.unresolved(
                stage,
                &feature.id,
                format!("unknown {what} '{name}' in equipment catalog"),
            );
        }
        found
    }

    fn line_length(&mut self, feature: &Feature, path: &LineString<f64>) -> Option<Meters> {
        match feature.f64_prop("length_m") {
            Ok(Some(m)) if m.is_finite() && m >= 0.0 => Some(Meters(m)),
            Ok(Some(m)) => {
                self.issues.malformed(
                    Stage::Lines,
                    &feature.id,
                    format!("length_m must be non-negative, got {m}"),
                );
                None
            }
            Ok(None) => {
                let length = route_length(path);
                self.diag.add_default(
                    &feature.id,
                    &format!("length {:.1} m computed from geometry", length.value()),
                );
                Some(length)
            }
            Err(message) => {
                self.issues.malformed(Stage::Lines, &feature.id, message);
                None
            }
        }
    }

    fn generator_rating(&mut self, feature: &Feature) -> Option<GeneratorRating> {
        if feature.properties.contains_key("equipment") {
            let spec = self.equipment_ref(
                Stage::Generation,
                feature,
                "equipment",
                "generator",
                EquipmentIndex::generator,
            )?;
            return Some(GeneratorRating {
                equipment: Some(spec.name.clone()),
                rated_power: spec.rated_power(),
                apparent_power: spec.rated_kva.map(KilovoltAmperes),
                power_factor: spec.power_factor.unwrap_or(1.0),
                phases: spec.phases.clone().unwrap_or_else(|| Phase::ABC.to_vec()),
            });
        }

        match feature.f64_prop("rated_kw") {
            Ok(Some(kw)) if kw.is_finite() && kw >= 0.0 => Some(GeneratorRating {
                equipment: None,
                rated_power: Kilowatts(kw),
                apparent_power: None,
                power_factor: 1.0,
                phases: Phase::ABC.to_vec(),
            }),
            Ok(Some(kw)) => {
                self.issues.malformed(
                    Stage::Generation,
                    &feature.id,
                    format!("rated_kw must be non-negative, got {kw}"),
                );
                None
            }
            Ok(None) => {
                self.issues.malformed(
                    Stage::Generation,
                    &feature.id,
                    "generator needs 'equipment' or 'rated_kw'",
                );
                None
            }
            Err(message) => {
                self.issues.malformed(Stage::Generation, &feature.id, message);
                None
            }
        }
    }

    fn bus_from_junction(
        &mut self,
        stage: Stage,
        junction: &Feature,
        fallback: Option<Kilovolts>,
    ) -> Bus {
        let voltage = match junction.f64_prop("nominal_voltage_kv") {
            Ok(Some(kv)) if kv.is_finite() && kv > 0.0 => Some(Kilovolts(kv)),
            Ok(Some(kv)) => {
                self.issues.malformed(
                    stage,
                    &junction.id,
                    format!("nominal_voltage_kv must be positive, got {kv}"),
                );
                None
            }
            Ok(None) => None,
            Err(message) => {
                self.issues.malformed(stage, &junction.id, message);
                None
            }
        };

        Bus {
            name: junction.id.clone(),
            display_name: junction.id_prop("name"),
            position: junction.point().map(position),
            nominal_voltage: voltage.or(fallback),
            is_source: junction.bool_prop("is_source"),
        }
    }

    /// Bus for a junction, created from the junction feature on first use.
    /// A bus without a nominal voltage takes `fallback`.
    fn ensure_bus(
        &mut self,
        model: &mut DistributionModel,
        stage: Stage,
        owner: &str,
        junction_id: &str,
        fallback: Option<Kilovolts>,
    ) -> Option<String> {
        let features = self.features;
        let Some(junction) = features.junction(junction_id) else {
            self.issues
                .unresolved(stage, owner, format!("unknown junction '{junction_id}'"));
            return None;
        };

        if let Some(bus) = model.bus_mut(junction_id) {
            if bus.nominal_voltage.is_none() {
                bus.nominal_voltage = fallback;
            }
            return Some(junction_id.to_string());
        }

        let bus = self.bus_from_junction(stage, junction, fallback);
        self.insert(stage, junction_id, model.add_bus(bus))
            .then(|| junction_id.to_string())
    }

    fn insert(&mut self, stage: Stage, entity: &str, result: GridResult<InsertOutcome>) -> bool {
        match result {
            Ok(InsertOutcome::Inserted) => true,
            Ok(InsertOutcome::Duplicate) => {
                self.issues.malformed(stage, entity, "duplicate element name");
                false
            }
            Err(GridError::Reference(message)) => {
                self.issues.unresolved(stage, entity, message);
                false
            }
            Err(err) => {
                self.issues.malformed(stage, entity, err.to_string());
                false
            }
        }
    }
}
