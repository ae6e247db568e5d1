//! Camera footprint geometry.
//!
//! The focal plane of the survey camera is a mosaic of detector chips with
//! gaps between them; light landing in a gap is never recorded. Each chip
//! is described by an ordered polygon of corner points in the shared
//! focal-plane frame (radians), loaded once from the detector-corner table
//! and shared read-only across all exposures.
//!
//! Containment semantics: a point exactly on a polygon edge or vertex
//! counts as contained. The test checks edges explicitly before ray
//! casting, so detections on the shared boundary of two adjacent chips are
//! retained, and retained once: the footprint filter only asks whether
//! *any* chip saw the point.

use std::path::Path;

use crate::error::{PostProcessError, Result};

/// Tolerance for the on-edge containment check, in focal-plane radians.
/// Well below a pixel at any plausible plate scale.
const EDGE_EPS: f64 = 1e-12;

/// Axis-aligned bounding box in focal-plane coordinates.
///
/// Used as a cheap pre-filter in front of the full point-in-polygon test:
/// a point outside a chip's bounding box cannot be on the chip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Aabb {
    /// Empty box; invalid until points are added via `expand_to_include`.
    pub fn new() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    /// Smallest box containing all the given points.
    pub fn from_points(points: &[(f64, f64)]) -> Self {
        let mut aabb = Self::new();
        for &(x, y) in points {
            aabb.expand_to_include(x, y);
        }
        aabb
    }

    /// Grow the box to contain the point.
    pub fn expand_to_include(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// Merge with another box.
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Bounds test, inclusive on all edges.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    pub fn is_valid(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::new()
    }
}

/// One detector chip: an ordered, simple (possibly non-convex) polygon of
/// corner points in the focal-plane frame, with a cached bounding box.
#[derive(Debug, Clone)]
pub struct DetectorPolygon {
    corners: Vec<(f64, f64)>,
    bounds: Aabb,
}

impl DetectorPolygon {
    /// Build a polygon from ordered corners.
    ///
    /// # Errors
    /// Fewer than three corners cannot bound an area.
    pub fn new(corners: Vec<(f64, f64)>) -> Result<Self> {
        if corners.len() < 3 {
            return Err(PostProcessError::Config(format!(
                "detector polygon needs at least 3 corners, got {}",
                corners.len()
            )));
        }
        let bounds = Aabb::from_points(&corners);
        Ok(Self { corners, bounds })
    }

    pub fn corners(&self) -> &[(f64, f64)] {
        &self.corners
    }

    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    /// Arithmetic mean of the corners. Interior for the convex-ish chip
    /// outlines this pipeline deals with; used by tests and diagnostics.
    pub fn centroid(&self) -> (f64, f64) {
        let n = self.corners.len() as f64;
        let (sx, sy) = self
            .corners
            .iter()
            .fold((0.0, 0.0), |(sx, sy), &(x, y)| (sx + x, sy + y));
        (sx / n, sy / n)
    }

    /// Point-in-polygon test, boundary-inclusive.
    ///
    /// Bounding-box rejection first, then an explicit on-edge check, then
    /// an even-odd ray cast for the interior. The edge check is what makes
    /// the boundary rule deterministic; ray casting alone is inconsistent
    /// for points exactly on an edge.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        if !self.bounds.contains_point(x, y) {
            return false;
        }

        let n = self.corners.len();
        for i in 0..n {
            let a = self.corners[i];
            let b = self.corners[(i + 1) % n];
            if point_on_segment(x, y, a, b) {
                return true;
            }
        }

        // Even-odd ray cast along +x
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let (xi, yi) = self.corners[i];
            let (xj, yj) = self.corners[j];
            if (yi > y) != (yj > y) {
                let x_cross = xj + (y - yj) * (xi - xj) / (yi - yj);
                if x < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }
}

/// Is the point within `EDGE_EPS` of the segment a-b?
fn point_on_segment(x: f64, y: f64, a: (f64, f64), b: (f64, f64)) -> bool {
    let (ax, ay) = a;
    let (bx, by) = b;
    let cross = (bx - ax) * (y - ay) - (by - ay) * (x - ax);
    if cross.abs() > EDGE_EPS {
        return false;
    }
    // Collinear; check the point lies between the endpoints
    let dot = (x - ax) * (bx - ax) + (y - ay) * (by - ay);
    let len_sq = (bx - ax).powi(2) + (by - ay).powi(2);
    (-EDGE_EPS..=len_sq + EDGE_EPS).contains(&dot)
}

/// The full instrument footprint: every detector chip polygon.
#[derive(Debug, Clone)]
pub struct CameraFootprint {
    detectors: Vec<DetectorPolygon>,
    envelope: Aabb,
}

impl CameraFootprint {
    /// Load the footprint from a detector-corner CSV (`detector, x, y`),
    /// corners grouped by detector index in file order.
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)?;

        let headers = reader.headers()?.clone();
        let col = |name: &str| -> Result<usize> {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| PostProcessError::MissingColumn {
                    column: name.to_string(),
                    path: path.to_path_buf(),
                })
        };
        let det_col = col("detector")?;
        let x_col = col("x")?;
        let y_col = col("y")?;

        // Corners arrive grouped by detector; a change of index starts a
        // new polygon.
        let mut groups: Vec<(u64, Vec<(f64, f64)>)> = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            let record = record?;
            let line = idx + 2;
            let parse_f64 = |value: &str| -> Result<f64> {
                value.parse::<f64>().map_err(|_| PostProcessError::Parse {
                    value: value.to_string(),
                    expected: "f64",
                    path: path.to_path_buf(),
                    line,
                })
            };
            let detector = record[det_col]
                .parse::<f64>()
                .map_err(|_| PostProcessError::Parse {
                    value: record[det_col].to_string(),
                    expected: "detector index",
                    path: path.to_path_buf(),
                    line,
                })? as u64;
            let corner = (parse_f64(&record[x_col])?, parse_f64(&record[y_col])?);

            match groups.last_mut() {
                Some((current, corners)) if *current == detector => corners.push(corner),
                _ => groups.push((detector, vec![corner])),
            }
        }

        let detectors = groups
            .into_iter()
            .map(|(_, corners)| DetectorPolygon::new(corners))
            .collect::<Result<Vec<_>>>()?;
        Self::from_detectors(detectors)
    }

    /// Build a footprint from polygons (tests, synthetic instruments).
    pub fn from_detectors(detectors: Vec<DetectorPolygon>) -> Result<Self> {
        if detectors.is_empty() {
            return Err(PostProcessError::Config(
                "camera footprint has no detectors".into(),
            ));
        }
        let envelope = detectors
            .iter()
            .fold(Aabb::new(), |acc, d| acc.merge(d.bounds()));
        Ok(Self {
            detectors,
            envelope,
        })
    }

    pub fn detectors(&self) -> &[DetectorPolygon] {
        &self.detectors
    }

    /// Union bounding box of all chips.
    pub fn envelope(&self) -> &Aabb {
        &self.envelope
    }

    /// True iff the focal-plane point lands on at least one chip.
    pub fn on_sensor(&self, x: f64, y: f64) -> bool {
        if !self.envelope.contains_point(x, y) {
            return false;
        }
        self.detectors.iter().any(|d| d.contains(x, y))
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn unit_square(offset_x: f64) -> DetectorPolygon {
        DetectorPolygon::new(vec![
            (offset_x, 0.0),
            (offset_x + 1.0, 0.0),
            (offset_x + 1.0, 1.0),
            (offset_x, 1.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_aabb_from_points() {
        let aabb = Aabb::from_points(&[(0.0, 2.0), (-1.0, 0.5), (3.0, 1.0)]);
        assert_eq!(aabb.min_x, -1.0);
        assert_eq!(aabb.max_x, 3.0);
        assert_eq!(aabb.min_y, 0.5);
        assert_eq!(aabb.max_y, 2.0);
        assert!(aabb.contains_point(0.0, 1.0));
        assert!(!aabb.contains_point(0.0, 3.0));
        assert!(!Aabb::new().is_valid());
    }

    #[test]
    fn test_polygon_interior_and_exterior() {
        let square = unit_square(0.0);
        assert!(square.contains(0.5, 0.5));
        assert!(!square.contains(1.5, 0.5));
        assert!(!square.contains(0.5, -0.1));
        // Far outside the bounding box short-circuits
        assert!(!square.contains(100.0, 100.0));
    }

    #[test]
    fn test_polygon_boundary_is_contained() {
        let square = unit_square(0.0);
        // Edge midpoints and corners all count as inside
        assert!(square.contains(0.5, 0.0));
        assert!(square.contains(1.0, 0.5));
        assert!(square.contains(0.0, 0.0));
        assert!(square.contains(1.0, 1.0));
    }

    #[test]
    fn test_centroid_is_contained() {
        let square = unit_square(2.0);
        let (cx, cy) = square.centroid();
        assert_eq!((cx, cy), (2.5, 0.5));
        assert!(square.contains(cx, cy));
    }

    #[test]
    fn test_nonconvex_polygon() {
        // L-shape: the notch at the top right is outside
        let poly = DetectorPolygon::new(vec![
            (0.0, 0.0),
            (2.0, 0.0),
            (2.0, 1.0),
            (1.0, 1.0),
            (1.0, 2.0),
            (0.0, 2.0),
        ])
        .unwrap();
        assert!(poly.contains(0.5, 1.5));
        assert!(poly.contains(1.5, 0.5));
        assert!(!poly.contains(1.5, 1.5));
    }

    #[test]
    fn test_shared_edge_retained_exactly_once() {
        // Two chips sharing the x = 1 edge
        let footprint =
            CameraFootprint::from_detectors(vec![unit_square(0.0), unit_square(1.0)]).unwrap();

        let (x, y) = (1.0, 0.5);
        let hits = footprint
            .detectors()
            .iter()
            .filter(|d| d.contains(x, y))
            .count();
        assert_eq!(hits, 2, "both chips claim their shared edge");
        // But the footprint answers once: the point is on-sensor
        assert!(footprint.on_sensor(x, y));
    }

    #[test]
    fn test_gap_between_chips_is_off_sensor() {
        let footprint =
            CameraFootprint::from_detectors(vec![unit_square(0.0), unit_square(1.5)]).unwrap();
        assert!(footprint.on_sensor(0.5, 0.5));
        assert!(footprint.on_sensor(2.0, 0.5));
        // Inside the envelope but in the inter-chip gap
        assert!(!footprint.on_sensor(1.25, 0.5));
        // Far outside the envelope
        assert!(!footprint.on_sensor(10.0, 10.0));
    }

    #[test]
    fn test_degenerate_polygon_rejected() {
        assert!(DetectorPolygon::new(vec![(0.0, 0.0), (1.0, 1.0)]).is_err());
    }

    #[test]
    fn test_load_corner_table() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"detector,x,y\n\
              0,0.0,0.0\n\
              0,0.01,0.0\n\
              0,0.01,0.01\n\
              0,0.0,0.01\n\
              1,0.02,0.0\n\
              1,0.03,0.0\n\
              1,0.03,0.01\n\
              1,0.02,0.01\n",
        )
        .unwrap();

        let footprint = CameraFootprint::load(file.path()).unwrap();
        assert_eq!(footprint.len(), 2);
        assert!(footprint.on_sensor(0.005, 0.005));
        assert!(!footprint.on_sensor(0.015, 0.005));
    }
}
