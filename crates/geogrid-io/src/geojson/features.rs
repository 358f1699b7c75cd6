//! GeoJSON document model and the classified feature index.

use std::collections::HashMap;

use geo::{Coord, Geometry, LineString, MultiPolygon, Point, Polygon};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{IssueLog, Stage};

/// Raw FeatureCollection as read from disk
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub features: Vec<RawFeature>,
}

/// Feature before classification; geometry and properties are checked later
/// so one bad feature does not hide the others.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFeature {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub geometry: Option<Value>,
    #[serde(default)]
    pub properties: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    Junction,
    Connector,
    Transformer,
    Capacitor,
    Building,
    Generation,
}

impl FeatureKind {
    pub fn from_type(value: &str) -> Option<Self> {
        match value {
            "ElectricalJunction" => Some(FeatureKind::Junction),
            "ElectricalConnector" => Some(FeatureKind::Connector),
            "Transformer" => Some(FeatureKind::Transformer),
            "Capacitor" => Some(FeatureKind::Capacitor),
            "Building" => Some(FeatureKind::Building),
            "PV" | "DistributedGeneration" => Some(FeatureKind::Generation),
            _ => None,
        }
    }

    fn accepts(self, geometry: &Geometry<f64>) -> bool {
        match self {
            FeatureKind::Junction | FeatureKind::Capacitor | FeatureKind::Generation => {
                matches!(geometry, Geometry::Point(_))
            }
            FeatureKind::Connector => matches!(geometry, Geometry::LineString(_)),
            FeatureKind::Transformer => {
                matches!(geometry, Geometry::Point(_) | Geometry::LineString(_))
            }
            FeatureKind::Building => {
                matches!(geometry, Geometry::Polygon(_) | Geometry::MultiPolygon(_))
            }
        }
    }

    fn expected_geometry(self) -> &'static str {
        match self {
            FeatureKind::Junction | FeatureKind::Capacitor | FeatureKind::Generation => "Point",
            FeatureKind::Connector => "LineString",
            FeatureKind::Transformer => "Point or LineString",
            FeatureKind::Building => "Polygon or MultiPolygon",
        }
    }
}

fn geometry_name(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        _ => "other",
    }
}

// ============================================================================
// Geometry decoding
// ============================================================================

fn coord(value: &Value) -> Option<Coord<f64>> {
    let pair = value.as_array()?;
    if pair.len() < 2 {
        return None;
    }
    Some(Coord {
        x: pair[0].as_f64()?,
        y: pair[1].as_f64()?,
    })
}

fn line_string(value: &Value) -> Option<LineString<f64>> {
    value
        .as_array()?
        .iter()
        .map(coord)
        .collect::<Option<Vec<_>>>()
        .map(LineString::new)
}

fn polygon(value: &Value) -> Option<Polygon<f64>> {
    let mut rings = value.as_array()?.iter().map(line_string);
    let exterior = rings.next()??;
    let interiors = rings.collect::<Option<Vec<_>>>()?;
    Some(Polygon::new(exterior, interiors))
}

/// Decode a GeoJSON geometry object
pub fn parse_geometry(value: &Value) -> Result<Geometry<f64>, String> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or("geometry has no type")?;
    let coordinates = value
        .get("coordinates")
        .ok_or_else(|| format!("{kind} geometry has no coordinates"))?;
    let invalid = || format!("invalid {kind} coordinates");

    match kind {
        "Point" => coord(coordinates)
            .map(|c| Geometry::Point(Point::from(c)))
            .ok_or_else(invalid),
        "LineString" => {
            let line = line_string(coordinates).ok_or_else(invalid)?;
            if line.0.len() < 2 {
                return Err("LineString needs at least 2 coordinates".to_string());
            }
            Ok(Geometry::LineString(line))
        }
        "Polygon" => polygon(coordinates)
            .map(Geometry::Polygon)
            .ok_or_else(invalid),
        "MultiPolygon" => coordinates
            .as_array()
            .and_then(|parts| parts.iter().map(polygon).collect::<Option<Vec<_>>>())
            .map(|parts| Geometry::MultiPolygon(MultiPolygon::new(parts)))
            .ok_or_else(invalid),
        other => Err(format!("unsupported geometry type '{other}'")),
    }
}

// ============================================================================
// Classified features
// ============================================================================

fn id_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct Feature {
    pub id: String,
    pub kind: FeatureKind,
    /// `properties.type` as written
    pub feature_type: String,
    pub geometry: Geometry<f64>,
    pub properties: Map<String, Value>,
}

impl Feature {
    /// Identifier-like property (string or number)
    pub fn id_prop(&self, key: &str) -> Option<String> {
        self.properties.get(key).and_then(id_value)
    }

    /// Numeric property; numeric strings are accepted, null counts as absent
    pub fn f64_prop(&self, key: &str) -> Result<Option<f64>, String> {
        match self.properties.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => Ok(n.as_f64()),
            Some(Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| format!("property '{key}' is not a number: '{s}'")),
            Some(other) => Err(format!("property '{key}' is not a number: {other}")),
        }
    }

    pub fn bool_prop(&self, key: &str) -> bool {
        match self.properties.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    pub fn point(&self) -> Option<Point<f64>> {
        match &self.geometry {
            Geometry::Point(p) => Some(*p),
            _ => None,
        }
    }

    pub fn line_string(&self) -> Option<&LineString<f64>> {
        match &self.geometry {
            Geometry::LineString(l) => Some(l),
            _ => None,
        }
    }
}

/// Recognised features of one document, in document order
#[derive(Debug, Default)]
pub struct FeatureIndex {
    features: Vec<Feature>,
    by_id: HashMap<String, usize>,
    ignored: usize,
}

impl FeatureIndex {
    /// Classify every feature, recording malformed ones. Features with an
    /// unrecognised `type` are skipped.
    pub fn build(collection: &FeatureCollection, issues: &mut IssueLog) -> Self {
        let mut index = Self::default();

        if collection.kind != "FeatureCollection" {
            issues.malformed_input(
                Stage::Features,
                format!("expected a FeatureCollection, found '{}'", collection.kind),
            );
        }

        for (position, raw) in collection.features.iter().enumerate() {
            let fallback = format!("feature[{position}]");

            let Some(properties) = raw.properties.as_ref().and_then(Value::as_object) else {
                issues.malformed(Stage::Features, &fallback, "feature has no properties");
                continue;
            };
            let Some(feature_type) = properties.get("type").and_then(Value::as_str) else {
                issues.malformed(Stage::Features, &fallback, "feature has no 'type' property");
                continue;
            };
            let Some(kind) = FeatureKind::from_type(feature_type) else {
                debug!(feature_type, "ignoring feature of unhandled type");
                index.ignored += 1;
                continue;
            };

            let id = properties
                .get("id")
                .and_then(id_value)
                .or_else(|| raw.id.as_ref().and_then(id_value));
            let Some(id) = id else {
                issues.malformed(Stage::Features, &fallback, format!("{feature_type} has no id"));
                continue;
            };

            let geometry = match raw.geometry.as_ref().filter(|g| !g.is_null()) {
                None => {
                    issues.malformed(Stage::Features, &id, "feature has no geometry");
                    continue;
                }
                Some(value) => match parse_geometry(value) {
                    Ok(geometry) => geometry,
                    Err(message) => {
                        issues.malformed(Stage::Features, &id, message);
                        continue;
                    }
                },
            };
            if !kind.accepts(&geometry) {
                issues.malformed(
                    Stage::Features,
                    &id,
                    format!(
                        "{feature_type} geometry must be {}, found {}",
                        kind.expected_geometry(),
                        geometry_name(&geometry)
                    ),
                );
                continue;
            }

            if index.by_id.contains_key(&id) {
                issues.malformed(Stage::Features, &id, "duplicate feature id");
                continue;
            }

            index.by_id.insert(id.clone(), index.features.len());
            index.features.push(Feature {
                id,
                kind,
                feature_type: feature_type.to_string(),
                geometry,
                properties: properties.clone(),
            });
        }

        index
    }

    pub fn get(&self, id: &str) -> Option<&Feature> {
        self.by_id.get(id).map(|i| &self.features[*i])
    }

    /// Junction feature with the given id
    pub fn junction(&self, id: &str) -> Option<&Feature> {
        self.get(id).filter(|f| f.kind == FeatureKind::Junction)
    }

    pub fn of_kind(&self, kind: FeatureKind) -> impl Iterator<Item = &Feature> {
        self.features.iter().filter(move |f| f.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Features skipped because their type is not part of the network
    pub fn ignored(&self) -> usize {
        self.ignored
    }
}
