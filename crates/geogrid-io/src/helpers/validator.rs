//! Graph consistency checks run on a parsed model before it is merged.
//!
//! Findings are reported as validation warnings; the caller decides whether
//! they are fatal (strict mode).

use geogrid_core::{find_islands, Diagnostics, DistributionModel, ImportDiagnostics, Node};

/// Configuration for model validation
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Relative voltage difference tolerated between connected elements
    pub voltage_tolerance: f64,
    /// Skip island detection (for partial feeders)
    pub skip_topology: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            voltage_tolerance: 0.01,
            skip_topology: false,
        }
    }
}

/// Validate a model and add findings to `diag`. Returns the number of
/// findings added.
pub fn validate_model(
    model: &DistributionModel,
    diag: &mut ImportDiagnostics,
    config: &ValidationConfig,
) -> usize {
    let before = diag.warning_count();

    // Phase 1: structure
    let mut structure = Diagnostics::new();
    model.validate_into(&mut structure);
    diag.extend_from(structure);

    if model.buses().is_empty() {
        return diag.warning_count() - before;
    }

    // Phase 2: topology
    if !config.skip_topology {
        validate_topology(model, diag);
    }

    // Phase 3: source
    validate_source(model, diag);

    // Phase 4: voltages and lengths
    validate_lines(model, diag, config);
    validate_transformers(model, diag, config);

    // Phase 5: attached elements
    validate_attachments(model, diag);

    diag.warning_count() - before
}

fn validate_topology(model: &DistributionModel, diag: &mut ImportDiagnostics) {
    let analysis = find_islands(model);
    if analysis.islands.len() <= 1 {
        return;
    }

    diag.add_validation_warning(
        "Model",
        &format!("Model has {} electrical islands", analysis.islands.len()),
    );

    for assignment in &analysis.assignments {
        let size = analysis
            .islands
            .iter()
            .find(|i| i.island_id == assignment.island_id)
            .map_or(0, |i| i.bus_count);
        if size == 1 {
            diag.add_validation_warning(
                &assignment.label,
                "Isolated bus with no line or transformer",
            );
        }
    }
}

fn validate_source(model: &DistributionModel, diag: &mut ImportDiagnostics) {
    let sources: Vec<&str> = model
        .buses()
        .into_iter()
        .filter(|b| b.is_source)
        .map(|b| b.name.as_str())
        .collect();
    match sources.as_slice() {
        [] => diag.add_validation_warning(
            "Model",
            "No junction is flagged as source; the feeder head will be inferred",
        ),
        [_] => {}
        [first, rest @ ..] => diag.add_validation_warning(
            "Model",
            &format!(
                "{} junctions are flagged as source ({}); using {first}",
                rest.len() + 1,
                sources.join(", ")
            ),
        ),
    }
}

fn validate_lines(
    model: &DistributionModel,
    diag: &mut ImportDiagnostics,
    config: &ValidationConfig,
) {
    for line in model.lines() {
        if line.length.value() <= 0.0 {
            diag.add_validation_warning(&line.name, "Line has zero length");
        }

        let from = model.bus(&line.from_bus).and_then(|b| b.nominal_voltage);
        let to = model.bus(&line.to_bus).and_then(|b| b.nominal_voltage);
        if let (Some(from), Some(to)) = (from, to) {
            if from.relative_difference(to) > config.voltage_tolerance {
                diag.add_validation_warning(
                    &line.name,
                    &format!(
                        "Line joins buses at different voltages ({} at {}, {} at {})",
                        from, line.from_bus, to, line.to_bus
                    ),
                );
            }
        }
    }
}

fn validate_transformers(
    model: &DistributionModel,
    diag: &mut ImportDiagnostics,
    config: &ValidationConfig,
) {
    for tx in model.transformers() {
        for (winding, bus_name) in tx.windings.iter().zip([&tx.from_bus, &tx.to_bus]) {
            let Some(bus_kv) = model.bus(bus_name).and_then(|b| b.nominal_voltage) else {
                continue;
            };
            if winding.voltage.relative_difference(bus_kv) > config.voltage_tolerance {
                diag.add_validation_warning(
                    &tx.name,
                    &format!(
                        "Winding rated {} connects to bus {} at {}",
                        winding.voltage, bus_name, bus_kv
                    ),
                );
            }
        }
    }
}

fn validate_attachments(model: &DistributionModel, diag: &mut ImportDiagnostics) {
    if model.graph().edge_count() == 0 && model.buses().len() <= 1 {
        return;
    }
    for node in model.graph().node_weights() {
        let (kind, name, bus) = match node {
            Node::Load(l) => ("Load", &l.name, &l.bus),
            Node::Capacitor(c) => ("Capacitor", &c.name, &c.bus),
            _ => continue,
        };
        if model.bus_degree(bus) == 0 {
            diag.add_validation_warning(
                name,
                &format!("{kind} is on bus {bus}, which has no line or transformer"),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geogrid_core::{
        Bus, Connection, KilovoltAmperes, Kilovars, Kilovolts, Kilowatts, Line, Load, LoadModel,
        Meters, Percent, Phase, Transformer, Winding,
    };

    fn winding(kv: f64) -> Winding {
        Winding {
            voltage: Kilovolts(kv),
            connection: Connection::Wye,
            resistance: Percent(0.5),
            rated_power: KilovoltAmperes(500.0),
        }
    }

    fn base_model() -> DistributionModel {
        let mut model = DistributionModel::new();
        model
            .add_bus(Bus::new("SUB").with_voltage(Kilovolts(13.2)).as_source())
            .unwrap();
        model.add_bus(Bus::new("J1").with_voltage(Kilovolts(13.2))).unwrap();
        model.add_bus(Bus::new("J2").with_voltage(Kilovolts(0.48))).unwrap();
        model
            .add_line(Line {
                name: "L1".into(),
                from_bus: "SUB".into(),
                to_bus: "J1".into(),
                length: Meters(150.0),
                ..Line::default()
            })
            .unwrap();
        model
            .add_transformer(Transformer {
                name: "T1".into(),
                from_bus: "J1".into(),
                to_bus: "J2".into(),
                equipment: "T500".into(),
                rated_power: KilovoltAmperes(500.0),
                reactance: Percent(5.75),
                phases: Phase::ABC.to_vec(),
                windings: vec![winding(13.2), winding(0.48)],
                position: None,
            })
            .unwrap();
        model
            .add_load(Load {
                name: "load_b1".into(),
                bus: "J2".into(),
                feature_id: "b1".into(),
                active_power: Kilowatts(50.0),
                reactive_power: Kilovars(10.0),
                phases: Phase::ABC.to_vec(),
                nominal_voltage: None,
                connection: Connection::Wye,
                model: LoadModel::ConstantPower,
            })
            .unwrap();
        model
    }

    #[test]
    fn clean_model_has_no_findings() {
        let mut diag = ImportDiagnostics::new();
        let findings = validate_model(&base_model(), &mut diag, &ValidationConfig::default());
        assert_eq!(findings, 0, "{diag}");
    }

    #[test]
    fn detects_islands_and_mismatches() {
        let mut model = base_model();
        model.add_bus(Bus::new("ISO").with_voltage(Kilovolts(0.24))).unwrap();
        model
            .add_line(Line {
                name: "L2".into(),
                from_bus: "J1".into(),
                to_bus: "J2".into(),
                length: Meters(0.0),
                ..Line::default()
            })
            .unwrap();

        let mut diag = ImportDiagnostics::new();
        let findings = validate_model(&model, &mut diag, &ValidationConfig::default());

        let messages: Vec<_> = diag.issues.iter().map(|i| i.message.as_str()).collect();
        assert!(messages.iter().any(|m| m.contains("2 electrical islands")));
        assert!(messages.iter().any(|m| m.contains("Isolated bus")));
        assert!(messages.iter().any(|m| m.contains("zero length")));
        assert!(messages.iter().any(|m| m.contains("different voltages")));
        assert_eq!(findings, 4);
    }

    #[test]
    fn winding_mismatch_and_missing_source() {
        let mut model = DistributionModel::new();
        model.add_bus(Bus::new("A").with_voltage(Kilovolts(12.47))).unwrap();
        model.add_bus(Bus::new("B").with_voltage(Kilovolts(0.48))).unwrap();
        model
            .add_transformer(Transformer {
                name: "T".into(),
                from_bus: "A".into(),
                to_bus: "B".into(),
                equipment: "X".into(),
                rated_power: KilovoltAmperes(75.0),
                reactance: Percent(2.0),
                phases: Phase::ABC.to_vec(),
                windings: vec![winding(13.2), winding(0.48)],
                position: None,
            })
            .unwrap();

        let mut diag = ImportDiagnostics::new();
        validate_model(&model, &mut diag, &ValidationConfig::default());
        assert!(diag.issues.iter().any(|i| i.message.contains("Winding rated")));
        assert!(diag.issues.iter().any(|i| i.message.contains("flagged as source")));
    }

    #[test]
    fn several_flagged_sources_are_reported() {
        let mut model = base_model();
        model
            .add_bus(Bus::new("SUB2").with_voltage(Kilovolts(13.2)).as_source())
            .unwrap();
        model
            .add_line(Line {
                name: "L9".into(),
                from_bus: "SUB2".into(),
                to_bus: "J1".into(),
                length: Meters(80.0),
                ..Line::default()
            })
            .unwrap();

        let mut diag = ImportDiagnostics::new();
        let findings = validate_model(&model, &mut diag, &ValidationConfig::default());
        assert_eq!(findings, 1, "{diag}");
        assert_eq!(
            diag.issues[0].message,
            "2 junctions are flagged as source (SUB, SUB2); using SUB"
        );
    }

    #[test]
    fn load_on_isolated_bus() {
        let mut model = base_model();
        model.add_bus(Bus::new("FAR").with_voltage(Kilovolts(0.48))).unwrap();
        model
            .add_load(Load {
                name: "load_far".into(),
                bus: "FAR".into(),
                feature_id: "far".into(),
                active_power: Kilowatts(5.0),
                reactive_power: Kilovars(0.0),
                phases: vec![Phase::A],
                nominal_voltage: None,
                connection: Connection::Wye,
                model: LoadModel::ConstantPower,
            })
            .unwrap();

        let mut diag = ImportDiagnostics::new();
        validate_model(&model, &mut diag, &ValidationConfig::default());
        assert!(diag
            .issues
            .iter()
            .any(|i| i.entity.as_deref() == Some("load_far") && i.message.contains("no line")));
    }
}
