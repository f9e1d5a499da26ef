//! Address and place resolution.
//!
//! Geocoding is consumed through the [`Geocoder`] trait; [`NominatimGeocoder`]
//! is the HTTP implementation and [`StaticGeocoder`] serves fixed answers.

#[cfg(feature = "nominatim")]
mod nominatim;

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use geo::{Coord, Point};
#[cfg(feature = "nominatim")]
pub use nominatim::{NominatimGeocoder, NominatimOptions};

use crate::{
    error::{Error, Result},
    spatial::Region,
};

/// Where an address query is centered.
#[derive(Clone, Debug, PartialEq)]
pub enum Address {
    /// Free text handed to the geocoder.
    Text(String),
    /// Coordinates used as-is, `x` = longitude and `y` = latitude.
    Point(Point<f64>),
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Address::Text(value.to_owned())
    }
}

impl From<String> for Address {
    fn from(value: String) -> Self {
        Address::Text(value)
    }
}

impl From<Point<f64>> for Address {
    fn from(value: Point<f64>) -> Self {
        Address::Point(value)
    }
}

impl From<Coord<f64>> for Address {
    fn from(value: Coord<f64>) -> Self {
        Address::Point(value.into())
    }
}

/// `(longitude, latitude)`.
impl From<(f64, f64)> for Address {
    fn from((lon, lat): (f64, f64)) -> Self {
        Address::Point(Point::new(lon, lat))
    }
}

/// Resolves free text into coordinates or place outlines.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolves an address into a `(lon, lat)` point.
    async fn geocode(&self, address: &str) -> Result<Point<f64>>;

    /// Resolves a place name into its outline and bounding box.
    async fn geocode_to_region(&self, place: &str) -> Result<Region>;
}

#[async_trait]
impl<G> Geocoder for Arc<G>
where
    G: Geocoder + ?Sized,
{
    async fn geocode(&self, address: &str) -> Result<Point<f64>> {
        (**self).geocode(address).await
    }

    async fn geocode_to_region(&self, place: &str) -> Result<Region> {
        (**self).geocode_to_region(place).await
    }
}

/// Geocoder answering from a fixed table; useful offline and in tests.
#[derive(Clone, Debug, Default)]
pub struct StaticGeocoder {
    points: HashMap<String, Point<f64>>,
    regions: HashMap<String, Region>,
}

impl StaticGeocoder {
    /// An empty table; every lookup fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `address` with `point`.
    #[must_use]
    pub fn with_point(mut self, address: impl Into<String>, point: Point<f64>) -> Self {
        self.points.insert(address.into(), point);
        self
    }

    /// Answers `place` with `region`.
    #[must_use]
    pub fn with_region(mut self, place: impl Into<String>, region: Region) -> Self {
        self.regions.insert(place.into(), region);
        self
    }
}

#[async_trait]
impl Geocoder for StaticGeocoder {
    async fn geocode(&self, address: &str) -> Result<Point<f64>> {
        self.points
            .get(address)
            .copied()
            .ok_or_else(|| Error::GeocodingFailed {
                query: address.to_owned(),
                reason: "no result".to_owned(),
            })
    }

    async fn geocode_to_region(&self, place: &str) -> Result<Region> {
        self.regions
            .get(place)
            .cloned()
            .ok_or_else(|| Error::GeocodingFailed {
                query: place.to_owned(),
                reason: "no result".to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    use geo::point;

    use super::*;
    use crate::spatial::BoundingBox;

    #[test]
    fn tuples_are_lon_lat() {
        assert_eq!(
            Address::from((-73.98, 40.75)),
            Address::Point(point!(x: -73.98, y: 40.75))
        );
    }

    #[tokio::test]
    async fn static_geocoder_answers_known_queries() {
        let region = Region::from(BoundingBox::new(0.0, 0.0, 1.0, 1.0).unwrap());
        let geocoder = StaticGeocoder::new()
            .with_point("Empire State Building", point!(x: -73.9857, y: 40.7484))
            .with_region("Null Island", region.clone());

        let point = geocoder.geocode("Empire State Building").await.unwrap();
        assert_eq!(point.x(), -73.9857);
        assert_eq!(
            geocoder.geocode_to_region("Null Island").await.unwrap(),
            region
        );
        assert!(matches!(
            geocoder.geocode("Atlantis").await,
            Err(Error::GeocodingFailed { query, .. }) if query == "Atlantis"
        ));
    }
}
