use geo::{BoundingRect, Destination, Geodesic, LineString, Point, Polygon};

use super::BoundingBox;
use crate::error::{Error, Result};

/// Number of vertices on a buffer ring.
pub const BUFFER_VERTICES: usize = 64;

/// Polygon approximating a circle of `radius_m` meters around a point on the
/// WGS84 ellipsoid.
///
/// Vertex `i` sits at azimuth `360 - i * 360 / 64` degrees, so the ring starts
/// due north and walks counter-clockwise. The ring is closed implicitly.
#[derive(Clone, Debug, PartialEq)]
pub struct GeodesicBuffer {
    center: Point<f64>,
    radius_m: f64,
    vertices: Vec<Point<f64>>,
}

impl GeodesicBuffer {
    /// Computes the ring around `center`, `x` = longitude.
    pub fn new(center: Point<f64>, radius_m: f64) -> Self {
        let step = 360.0 / BUFFER_VERTICES as f64;
        let vertices = (0..BUFFER_VERTICES)
            .map(|i| Geodesic::destination(center, 360.0 - i as f64 * step, radius_m))
            .collect();
        Self {
            center,
            radius_m,
            vertices,
        }
    }

    /// Point the buffer is centered on.
    pub fn center(&self) -> Point<f64> {
        self.center
    }

    /// Radius in meters.
    pub fn radius_m(&self) -> f64 {
        self.radius_m
    }

    /// The ring vertices, without the closing repeat of the first one.
    pub fn vertices(&self) -> &[Point<f64>] {
        &self.vertices
    }

    /// The ring as a polygon.
    pub fn polygon(&self) -> Polygon<f64> {
        Polygon::new(LineString::from(self.vertices.clone()), vec![])
    }

    /// Axis-aligned bounds of the ring; the search box of an address query.
    pub fn bounding_box(&self) -> Result<BoundingBox> {
        let rect = self.polygon().bounding_rect().ok_or_else(|| {
            Error::InvalidBoundingBox(format!("empty buffer around {:?}", self.center))
        })?;
        BoundingBox::from_rect(rect)
    }
}

/// Buffer polygon of `radius_m` meters around `(lon, lat)`.
pub fn buffer(lon: f64, lat: f64, radius_m: f64) -> Polygon<f64> {
    GeodesicBuffer::new(Point::new(lon, lat), radius_m).polygon()
}

#[cfg(test)]
mod tests {
    use geo::Distance;

    use super::*;

    const TOLERANCE: f64 = 1e-9;

    #[test]
    fn ring_has_sixty_four_vertices_starting_north() {
        let center = Point::new(-73.9857, 40.7484);
        let ring = GeodesicBuffer::new(center, 500.0);
        let vertices = ring.vertices();
        assert_eq!(vertices.len(), BUFFER_VERTICES);

        // 360 degrees: due north.
        assert!((vertices[0].x() - center.x()).abs() < TOLERANCE);
        assert!(vertices[0].y() > center.y());
        // 270 degrees: west.
        assert!(vertices[16].x() < center.x());
        assert!((vertices[16].y() - center.y()).abs() < 1e-4);
        // 180 degrees: south.
        assert!(vertices[32].y() < center.y());
        // 90 degrees: east.
        assert!(vertices[48].x() > center.x());
    }

    #[test]
    fn vertices_lie_on_the_radius() {
        let center = Point::new(2.2945, 48.8584);
        for vertex in GeodesicBuffer::new(center, 500.0).vertices() {
            let distance = Geodesic::distance(center, *vertex);
            assert!((distance - 500.0).abs() < 1e-6, "{distance}");
        }
    }

    #[test]
    fn polygon_closes_the_ring() {
        let polygon = buffer(0.0, 0.0, 100.0);
        let exterior = polygon.exterior();
        assert_eq!(exterior.0.len(), BUFFER_VERTICES + 1);
        assert_eq!(exterior.0.first(), exterior.0.last());
    }

    #[test]
    fn zero_radius_collapses_to_the_center() {
        let center = Point::new(13.4050, 52.5200);
        let ring = GeodesicBuffer::new(center, 0.0);
        assert_eq!(ring.vertices().len(), BUFFER_VERTICES);
        for vertex in ring.vertices() {
            assert!((vertex.x() - center.x()).abs() < TOLERANCE);
            assert!((vertex.y() - center.y()).abs() < TOLERANCE);
        }
        let bbox = ring.bounding_box().unwrap();
        assert!((bbox.max_x() - bbox.min_x()).abs() < TOLERANCE);
        assert!((bbox.max_y() - bbox.min_y()).abs() < TOLERANCE);
    }

    #[test]
    fn bounding_box_spans_about_a_kilometre() {
        let bbox = GeodesicBuffer::new(Point::new(0.0, 0.0), 500.0)
            .bounding_box()
            .unwrap();
        // One degree of latitude at the equator is roughly 110.6 km.
        let height_km = (bbox.max_y() - bbox.min_y()) * 110.574;
        assert!((height_km - 1.0).abs() < 0.01, "{height_km}");
    }
}
