//! Search areas: validated bounding boxes, geodesic buffers and place regions.

mod buffer;

use geo::{BoundingRect, Geometry, Polygon, Rect, Relate};
use geoplaces_predicate::{Predicate, PredicateBuilder};

pub use buffer::{buffer, GeodesicBuffer, BUFFER_VERTICES};

use crate::error::{Error, Result};

/// Axis-aligned `(min_x, min_y, max_x, max_y)` rectangle in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl BoundingBox {
    /// Validates and creates a box. Boxes crossing the antimeridian are not
    /// representable.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Result<Self> {
        if ![min_x, min_y, max_x, max_y].iter().all(|v| v.is_finite()) {
            return Err(Error::InvalidBoundingBox(format!(
                "coordinates must be finite, got ({min_x}, {min_y}, {max_x}, {max_y})"
            )));
        }
        if min_x < -180.0 || max_x > 180.0 {
            return Err(Error::InvalidBoundingBox(format!(
                "longitudes must lie within [-180, 180], got {min_x}..{max_x}"
            )));
        }
        if min_y < -90.0 || max_y > 90.0 {
            return Err(Error::InvalidBoundingBox(format!(
                "latitudes must lie within [-90, 90], got {min_y}..{max_y}"
            )));
        }
        if min_x > max_x || min_y > max_y {
            return Err(Error::InvalidBoundingBox(format!(
                "minimum exceeds maximum in ({min_x}, {min_y}, {max_x}, {max_y})"
            )));
        }
        Ok(Self {
            min_x,
            min_y,
            max_x,
            max_y,
        })
    }

    pub(crate) fn from_rect(rect: Rect<f64>) -> Result<Self> {
        Self::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
    }

    /// Western edge.
    pub fn min_x(&self) -> f64 {
        self.min_x
    }

    /// Southern edge.
    pub fn min_y(&self) -> f64 {
        self.min_y
    }

    /// Eastern edge.
    pub fn max_x(&self) -> f64 {
        self.max_x
    }

    /// Northern edge.
    pub fn max_y(&self) -> f64 {
        self.max_y
    }

    /// The box as a closed polygon ring.
    pub fn to_polygon(&self) -> Polygon<f64> {
        Rect::new((self.min_x, self.min_y), (self.max_x, self.max_y)).to_polygon()
    }

    /// Rows whose per-row bbox struct overlaps this box.
    ///
    /// Overlap rather than containment: a row straddling the edge is kept.
    pub fn overlap_predicate(&self, column: &str) -> Predicate {
        PredicateBuilder::and()
            .less_than(format!("{column}.xmin"), self.max_x)
            .greater_than(format!("{column}.xmax"), self.min_x)
            .less_than(format!("{column}.ymin"), self.max_y)
            .greater_than(format!("{column}.ymax"), self.min_y)
            .build()
    }

    /// True when the two boxes share interior area.
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }
}

impl TryFrom<(f64, f64, f64, f64)> for BoundingBox {
    type Error = Error;

    fn try_from((min_x, min_y, max_x, max_y): (f64, f64, f64, f64)) -> Result<Self> {
        Self::new(min_x, min_y, max_x, max_y)
    }
}

impl From<BoundingBox> for (f64, f64, f64, f64) {
    fn from(bbox: BoundingBox) -> Self {
        (bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y)
    }
}

/// Exact outline of a named place together with its bounding box.
#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    geometry: Geometry<f64>,
    bbox: BoundingBox,
}

impl Region {
    /// Wraps an outline; fails when it has no extent.
    pub fn new(geometry: impl Into<Geometry<f64>>) -> Result<Self> {
        let geometry = geometry.into();
        let rect = geometry
            .bounding_rect()
            .ok_or_else(|| Error::InvalidBoundingBox("region geometry is empty".to_owned()))?;
        let bbox = BoundingBox::from_rect(rect)?;
        Ok(Self { geometry, bbox })
    }

    /// The outline.
    pub fn geometry(&self) -> &Geometry<f64> {
        &self.geometry
    }

    /// Bounding box of the outline.
    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    /// True when `geometry` lies within the region: no point of it is
    /// exterior and at least one interior point is shared.
    pub fn contains(&self, geometry: &Geometry<f64>) -> bool {
        geometry.relate(&self.geometry).is_within()
    }
}

impl From<BoundingBox> for Region {
    fn from(bbox: BoundingBox) -> Self {
        Self {
            geometry: Geometry::Polygon(bbox.to_polygon()),
            bbox,
        }
    }
}

#[cfg(test)]
mod tests {
    use geo::{point, polygon};

    use super::*;

    #[test]
    fn rejects_out_of_range_and_inverted_boxes() {
        assert!(BoundingBox::new(-74.0, 40.7, -73.9, 40.8).is_ok());
        for (min_x, min_y, max_x, max_y) in [
            (-181.0, 0.0, 0.0, 1.0),
            (0.0, -91.0, 1.0, 1.0),
            (1.0, 0.0, 0.0, 1.0),
            (0.0, 1.0, 1.0, 0.0),
            (f64::NAN, 0.0, 1.0, 1.0),
            (0.0, 0.0, f64::INFINITY, 1.0),
        ] {
            assert!(
                matches!(
                    BoundingBox::new(min_x, min_y, max_x, max_y),
                    Err(Error::InvalidBoundingBox(_))
                ),
                "({min_x}, {min_y}, {max_x}, {max_y}) should be rejected"
            );
        }
    }

    #[test]
    fn degenerate_boxes_are_valid() {
        let bbox = BoundingBox::new(10.0, 20.0, 10.0, 20.0).unwrap();
        assert_eq!(<(f64, f64, f64, f64)>::from(bbox), (10.0, 20.0, 10.0, 20.0));
    }

    #[test]
    fn overlap_predicate_targets_struct_fields() {
        let bbox = BoundingBox::new(1.0, 2.0, 3.0, 4.0).unwrap();
        assert_eq!(
            bbox.overlap_predicate("bbox").to_string(),
            "(bbox.xmin < 3 AND bbox.xmax > 1 AND bbox.ymin < 4 AND bbox.ymax > 2)"
        );
        let roots: Vec<_> = bbox.overlap_predicate("bbox").root_columns().into_iter().collect();
        assert_eq!(roots, vec!["bbox".to_owned()]);
    }

    #[test]
    fn region_takes_the_bounds_of_its_outline() {
        let triangle = polygon![(x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 0.0, y: 3.0)];
        let region = Region::new(triangle).unwrap();
        assert_eq!(region.bbox(), BoundingBox::new(0.0, 0.0, 4.0, 3.0).unwrap());
        assert!(region.contains(&point!(x: 1.0, y: 1.0).into()));
        // Inside the bounding box but outside the triangle.
        assert!(!region.contains(&point!(x: 3.5, y: 2.5).into()));
    }
}
