use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, to_string_pretty};
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn repo_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join(relative)
}

fn fixture_args() -> Vec<String> {
    [
        ("--geojson", "test_data/urban/feeder.geojson"),
        ("--equipment", "test_data/urban/equipment.json"),
        ("--loads", "test_data/urban/loads.json"),
    ]
    .into_iter()
    .flat_map(|(flag, path)| {
        [
            flag.to_string(),
            repo_path(path).to_str().unwrap().to_string(),
        ]
    })
    .collect()
}

#[test]
fn import_prints_element_counts() {
    let mut cmd = Command::cargo_bin("geogrid").unwrap();
    cmd.arg("import")
        .args(fixture_args())
        .assert()
        .success()
        .stdout(predicate::str::contains("buses"))
        .stdout(predicate::str::contains("Feeder feeder_SUB (source SUB, 1 island(s))"))
        .stdout(predicate::str::contains("Inserted 14 element(s)"));
}

#[test]
fn import_json_report() {
    let mut cmd = Command::cargo_bin("geogrid").unwrap();
    let output = cmd
        .args(["import", "--format", "json"])
        .args(fixture_args())
        .output()
        .unwrap();
    assert!(output.status.success());
    let payload: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(payload["stats"]["lines"], 3);
    assert_eq!(payload["stats"]["generators"], 2);
    assert_eq!(payload["report"]["feeder"]["source_bus"], "SUB");
}

#[test]
fn import_from_config_file() {
    let config = repo_path("test_data/urban/reader.toml");
    let mut cmd = Command::cargo_bin("geogrid").unwrap();
    cmd.args(["import", "--strict", "--config", config.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Inserted 14 element(s)"));
}

#[test]
fn import_fails_on_unknown_line_type() {
    let dir = tempdir().unwrap();
    let geojson = dir.path().join("feeder.geojson");
    let equipment = dir.path().join("equipment.json");
    let loads = dir.path().join("loads.json");
    let feeder = json!({
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [-105.0, 39.74]},
             "properties": {"id": "N1", "type": "ElectricalJunction"}},
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [-105.001, 39.74]},
             "properties": {"id": "N2", "type": "ElectricalJunction"}},
            {"type": "Feature",
             "geometry": {"type": "LineString", "coordinates": [[-105.0, 39.74], [-105.001, 39.74]]},
             "properties": {"id": "L1", "type": "ElectricalConnector",
                            "startJunctionId": "N1", "endJunctionId": "N2", "line_type": "LT9"}}
        ]
    });
    fs::write(&geojson, to_string_pretty(&feeder).unwrap()).unwrap();
    fs::write(&equipment, "{}").unwrap();
    fs::write(&loads, "{\"loads\": []}").unwrap();

    let mut cmd = Command::cargo_bin("geogrid").unwrap();
    cmd.args([
        "import",
        "--geojson",
        geojson.to_str().unwrap(),
        "--equipment",
        equipment.to_str().unwrap(),
        "--loads",
        loads.to_str().unwrap(),
    ])
    .assert()
    .failure()
    .stderr(predicate::str::contains("LT9"));
}

#[test]
fn import_requires_all_inputs() {
    let geojson = repo_path("test_data/urban/feeder.geojson");
    let mut cmd = Command::cargo_bin("geogrid").unwrap();
    cmd.args(["import", "--geojson", geojson.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("equipment_file"));
}

#[test]
fn graph_islands_and_export() {
    let mut cmd = Command::cargo_bin("geogrid").unwrap();
    cmd.args(["graph", "islands", "--emit"])
        .args(fixture_args())
        .assert()
        .success()
        .stdout(predicate::str::contains("Island 0: 5 bus(es)"))
        .stdout(predicate::str::contains("SUB"));

    let out_dir = tempdir().unwrap();
    let out = out_dir.path().join("feeder.dot");
    let mut cmd = Command::cargo_bin("geogrid").unwrap();
    cmd.args(["graph", "export", "-o", out.to_str().unwrap()])
        .args(fixture_args())
        .assert()
        .success();
    let dot = fs::read_to_string(&out).unwrap();
    assert!(dot.starts_with("graph distribution_model {"));
    assert!(dot.contains("[style=bold]"));
}
