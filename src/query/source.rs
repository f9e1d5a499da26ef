use arrow::array::RecordBatch;
use async_trait::async_trait;

use super::{Client, Locator, QueryOptions};
use crate::{
    dataset::{DatasetDescriptor, FoursquareTheme, OvertureTheme},
    error::Result,
    geocode::{Address, Geocoder},
    spatial::BoundingBox,
    table::GeoTable,
};

/// The three ways of selecting rows from a spatial dataset.
#[async_trait]
#[allow(clippy::wrong_self_convention)]
pub trait DataSource: Send + Sync {
    /// Resolves `release` (or the default) against the dataset's allow-list.
    fn validate_release(&self, release: Option<&str>) -> Result<String>;

    /// Rows overlapping a geodesic buffer around `address`.
    async fn from_address(&self, address: Address, options: QueryOptions) -> Result<GeoTable>;

    /// Rows within the outline of the named place.
    async fn from_place(&self, place: &str, options: QueryOptions) -> Result<GeoTable>;

    /// Rows whose bbox overlaps `bbox`.
    async fn from_bbox(&self, bbox: BoundingBox, options: QueryOptions) -> Result<GeoTable>;
}

/// A client bound to one dataset.
pub struct Dataset<G> {
    client: Client<G>,
    descriptor: DatasetDescriptor,
}

impl<G> Clone for Dataset<G> {
    fn clone(&self) -> Self {
        Dataset {
            client: self.client.clone(),
            descriptor: self.descriptor.clone(),
        }
    }
}

impl<G> Dataset<G> {
    pub(crate) fn new(client: Client<G>, descriptor: DatasetDescriptor) -> Self {
        Dataset { client, descriptor }
    }

    /// The dataset this handle reads.
    pub fn descriptor(&self) -> &DatasetDescriptor {
        &self.descriptor
    }
}

#[async_trait]
impl<G> DataSource for Dataset<G>
where
    G: Geocoder,
{
    fn validate_release(&self, release: Option<&str>) -> Result<String> {
        self.descriptor.validate_release(release)
    }

    async fn from_address(&self, address: Address, options: QueryOptions) -> Result<GeoTable> {
        self.client
            .query(&self.descriptor, Locator::Address(address), &options)
            .await
    }

    async fn from_place(&self, place: &str, options: QueryOptions) -> Result<GeoTable> {
        self.client
            .query(&self.descriptor, Locator::Place(place.to_owned()), &options)
            .await
    }

    async fn from_bbox(&self, bbox: BoundingBox, options: QueryOptions) -> Result<GeoTable> {
        self.client
            .query(&self.descriptor, Locator::BoundingBox(bbox), &options)
            .await
    }
}

/// Overture Maps themes.
pub struct OvertureMaps<G> {
    client: Client<G>,
}

impl<G> OvertureMaps<G>
where
    G: Geocoder,
{
    pub(crate) fn new(client: Client<G>) -> Self {
        OvertureMaps { client }
    }

    /// Any theme; base types are checked against the allow-list.
    pub fn theme(&self, theme: OvertureTheme) -> Result<Dataset<G>> {
        Ok(self.client.dataset(theme.descriptor()?))
    }

    /// Points of interest.
    pub fn places(&self) -> Dataset<G> {
        self.fixed(OvertureTheme::Places)
    }

    /// Building footprints.
    pub fn buildings(&self) -> Dataset<G> {
        self.fixed(OvertureTheme::Buildings)
    }

    /// Parts of buildings, such as towers on a podium.
    pub fn building_parts(&self) -> Dataset<G> {
        self.fixed(OvertureTheme::BuildingParts)
    }

    /// Address points.
    pub fn addresses(&self) -> Dataset<G> {
        self.fixed(OvertureTheme::Addresses)
    }

    /// Transportation segments.
    pub fn segments(&self) -> Dataset<G> {
        self.fixed(OvertureTheme::Segments)
    }

    /// Transportation connectors.
    pub fn connectors(&self) -> Dataset<G> {
        self.fixed(OvertureTheme::Connectors)
    }

    /// A base-theme type such as `water` or `land_use`.
    pub fn base(&self, base_type: impl Into<String>) -> Result<Dataset<G>> {
        self.theme(OvertureTheme::Base(base_type.into()))
    }

    fn fixed(&self, theme: OvertureTheme) -> Dataset<G> {
        self.client.dataset(theme.unchecked_descriptor())
    }
}

/// Foursquare Open Places.
pub struct FoursquarePlaces<G> {
    client: Client<G>,
}

impl<G> FoursquarePlaces<G>
where
    G: Geocoder,
{
    pub(crate) fn new(client: Client<G>) -> Self {
        FoursquarePlaces { client }
    }

    /// Points of interest.
    pub fn places(&self) -> Dataset<G> {
        self.client.dataset(FoursquareTheme::Places.descriptor())
    }

    /// The category taxonomy as a plain table.
    pub async fn categories(&self, options: &QueryOptions) -> Result<RecordBatch> {
        self.client
            .read_table(&FoursquareTheme::Categories.descriptor(), options)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::Error, geocode::StaticGeocoder, option::ClientOptions};

    fn client() -> Client<StaticGeocoder> {
        Client::new(StaticGeocoder::new(), ClientOptions::default())
    }

    #[test]
    fn overture_themes_resolve_their_locations() {
        let places = client().overture().places();
        assert_eq!(
            places.descriptor().location("2025-01-22.0"),
            "s3://overturemaps-us-west-2/release/2025-01-22.0/theme=places/type=place/"
        );

        let water = client().overture().base("water").unwrap();
        assert_eq!(
            water.validate_release(None).unwrap(),
            crate::dataset::OVERTURE_LATEST_RELEASE
        );
    }

    #[test]
    fn unknown_base_type_is_rejected() {
        assert!(matches!(
            client().overture().base("lava"),
            Err(Error::InvalidBaseType { base_type, .. }) if base_type == "lava"
        ));
    }

    #[tokio::test]
    async fn categories_validate_the_release_first() {
        let options = QueryOptions::new().release("1999-01-01");
        assert!(matches!(
            client().foursquare().categories(&options).await,
            Err(Error::InvalidRelease { .. })
        ));
    }
}
