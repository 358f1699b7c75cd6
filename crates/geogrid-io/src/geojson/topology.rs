//! Geometry to topology: geodesic lengths, endpoint snapping, footprint
//! centroids.

use geo::{Centroid, Geometry, HaversineDistance, HaversineLength, LineString, Point};
use geogrid_core::{Meters, Position};

use super::features::{FeatureIndex, FeatureKind};

pub fn distance(a: &Point<f64>, b: &Point<f64>) -> Meters {
    Meters(a.haversine_distance(b))
}

/// Geodesic length of a route
pub fn route_length(line: &LineString<f64>) -> Meters {
    Meters(line.haversine_length())
}

pub fn endpoints(line: &LineString<f64>) -> Option<(Point<f64>, Point<f64>)> {
    let first = line.0.first()?;
    let last = line.0.last()?;
    Some((Point::from(*first), Point::from(*last)))
}

/// Point used to place a feature on the map: the point itself, or the
/// centroid of a line or footprint.
pub fn anchor_point(geometry: &Geometry<f64>) -> Option<Point<f64>> {
    match geometry {
        Geometry::Point(p) => Some(*p),
        Geometry::LineString(l) => l.centroid(),
        Geometry::Polygon(p) => p.centroid(),
        Geometry::MultiPolygon(mp) => mp.centroid(),
        _ => None,
    }
}

pub fn position(point: Point<f64>) -> Position {
    Position::new(point.x(), point.y())
}

pub fn route(line: &LineString<f64>) -> Vec<Position> {
    line.points().map(position).collect()
}

/// Nearest junction to a point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snap<'a> {
    pub junction: &'a str,
    pub distance: Meters,
}

/// Linear-scan nearest-junction lookup over all junction features
#[derive(Debug)]
pub struct JunctionLocator<'a> {
    junctions: Vec<(&'a str, Point<f64>)>,
}

impl<'a> JunctionLocator<'a> {
    pub fn new(features: &'a FeatureIndex) -> Self {
        let junctions = features
            .of_kind(FeatureKind::Junction)
            .filter_map(|f| f.point().map(|p| (f.id.as_str(), p)))
            .collect();
        Self { junctions }
    }

    /// Closest junction within `max_distance_m`; ties go to the junction
    /// listed first in the document.
    pub fn nearest(&self, point: &Point<f64>, max_distance_m: f64) -> Option<Snap<'a>> {
        let mut best: Option<Snap<'a>> = None;
        for &(id, location) in &self.junctions {
            let d = distance(point, &location);
            if d.value() > max_distance_m {
                continue;
            }
            if best.map_or(true, |b| d < b.distance) {
                best = Some(Snap {
                    junction: id,
                    distance: d,
                });
            }
        }
        best
    }

    pub fn len(&self) -> usize {
        self.junctions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.junctions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IssueLog;
    use crate::geojson::features::FeatureCollection;
    use geo::{polygon, Polygon};
    use serde_json::json;

    #[test]
    fn haversine_distances() {
        // One arc-minute of latitude is close to one nautical mile
        let a = Point::new(-105.0, 39.0);
        let b = Point::new(-105.0, 39.0 + 1.0 / 60.0);
        assert!((distance(&a, &b).value() - 1853.0).abs() < 5.0);

        let line = LineString::from(vec![
            (-105.0, 39.0),
            (-105.0, 39.0 + 1.0 / 60.0),
            (-105.0, 39.0),
        ]);
        assert!((route_length(&line).value() - 2.0 * distance(&a, &b).value()).abs() < 1e-6);
    }

    #[test]
    fn centroid_of_footprint() {
        let square: Polygon<f64> = polygon![
            (x: 0.0, y: 0.0),
            (x: 2.0, y: 0.0),
            (x: 2.0, y: 2.0),
            (x: 0.0, y: 2.0),
            (x: 0.0, y: 0.0),
        ];
        let c = anchor_point(&Geometry::Polygon(square)).unwrap();
        assert!((c.x() - 1.0).abs() < 1e-12 && (c.y() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn snaps_within_tolerance() {
        let fc: FeatureCollection = serde_json::from_value(json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [-105.0, 39.0]},
                 "properties": {"id": "J1", "type": "ElectricalJunction"}},
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [-105.001, 39.0]},
                 "properties": {"id": "J2", "type": "ElectricalJunction"}}
            ]
        }))
        .unwrap();
        let mut issues = IssueLog::new();
        let index = FeatureIndex::build(&fc, &mut issues);
        let locator = JunctionLocator::new(&index);
        assert_eq!(locator.len(), 2);

        let near_j1 = Point::new(-105.000_001, 39.0);
        let snap = locator.nearest(&near_j1, 0.5).unwrap();
        assert_eq!(snap.junction, "J1");
        assert!(snap.distance.value() < 0.5);

        let between = Point::new(-105.0004, 39.0);
        assert!(locator.nearest(&between, 0.5).is_none());
        assert_eq!(locator.nearest(&between, 100.0).unwrap().junction, "J1");
    }
}
