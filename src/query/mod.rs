//! Query façade: one generic scan per locator kind, wrapped per dataset.

mod source;

use std::sync::Arc;

use arrow::array::RecordBatch;
use futures_util::TryStreamExt;
use geoplaces_predicate::{FilterStructure, Predicate};

pub use self::source::{DataSource, Dataset, FoursquarePlaces, OvertureMaps};
#[cfg(feature = "nominatim")]
use crate::geocode::{NominatimGeocoder, NominatimOptions};
use crate::{
    dataset::DatasetDescriptor,
    error::Result,
    geocode::{Address, Geocoder},
    observability::log_debug,
    option::ClientOptions,
    scan::Scan,
    spatial::{BoundingBox, GeodesicBuffer},
    table::GeoTable,
    units::DistanceUnit,
};

/// Per-query parameters; anything left unset falls back to the client's
/// [`ClientOptions`] or the dataset's default release.
#[derive(Clone, Debug, Default)]
pub struct QueryOptions {
    pub(crate) columns: Option<Vec<String>>,
    pub(crate) filter: Option<FilterStructure>,
    pub(crate) release: Option<String>,
    pub(crate) distance: Option<f64>,
    pub(crate) unit: Option<String>,
}

impl QueryOptions {
    /// Options that defer everything to the client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Root columns to read. The geometry column is always kept.
    pub fn columns<I, S>(self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        QueryOptions {
            columns: Some(columns.into_iter().map(Into::into).collect()),
            ..self
        }
    }

    /// Attribute filter ANDed with the spatial predicate.
    pub fn filter(self, filter: impl Into<FilterStructure>) -> Self {
        QueryOptions {
            filter: Some(filter.into()),
            ..self
        }
    }

    /// Release to read instead of the dataset default.
    pub fn release(self, release: impl Into<String>) -> Self {
        QueryOptions {
            release: Some(release.into()),
            ..self
        }
    }

    /// Buffer radius around an address.
    pub fn distance(self, distance: f64) -> Self {
        QueryOptions {
            distance: Some(distance),
            ..self
        }
    }

    /// Unit symbol of [`QueryOptions::distance`].
    pub fn unit(self, unit: impl Into<String>) -> Self {
        QueryOptions {
            unit: Some(unit.into()),
            ..self
        }
    }
}

/// How a query selects its search area.
#[derive(Clone, Debug)]
pub enum Locator {
    /// Bounds of a geodesic buffer around the address.
    Address(Address),
    /// Bounds of the named place, clipped to its outline afterwards.
    Place(String),
    /// A caller-supplied box.
    BoundingBox(BoundingBox),
}

/// Entry point for queries; cheap to clone.
pub struct Client<G> {
    geocoder: Arc<G>,
    options: ClientOptions,
}

impl<G> Clone for Client<G> {
    fn clone(&self) -> Self {
        Client {
            geocoder: Arc::clone(&self.geocoder),
            options: self.options.clone(),
        }
    }
}

#[cfg(feature = "nominatim")]
impl Client<NominatimGeocoder> {
    /// Client geocoding through a Nominatim endpoint.
    pub fn nominatim(options: ClientOptions, nominatim: NominatimOptions) -> Result<Self> {
        Ok(Client::new(NominatimGeocoder::new(nominatim)?, options))
    }
}

impl<G> Client<G>
where
    G: Geocoder,
{
    /// Client resolving addresses and places through `geocoder`.
    pub fn new(geocoder: G, options: ClientOptions) -> Self {
        Client {
            geocoder: Arc::new(geocoder),
            options,
        }
    }

    /// Defaults applied to every query.
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Binds the client to an arbitrary dataset.
    pub fn dataset(&self, descriptor: DatasetDescriptor) -> Dataset<G> {
        Dataset::new(self.clone(), descriptor)
    }

    /// Overture Maps themes.
    pub fn overture(&self) -> OvertureMaps<G> {
        OvertureMaps::new(self.clone())
    }

    /// Foursquare Open Places.
    pub fn foursquare(&self) -> FoursquarePlaces<G> {
        FoursquarePlaces::new(self.clone())
    }

    /// Reads the rows of `descriptor` selected by `locator` and `options`.
    ///
    /// Release, filter shape and distance unit are validated before the
    /// geocoder or the object store is contacted.
    pub async fn query(
        &self,
        descriptor: &DatasetDescriptor,
        locator: Locator,
        options: &QueryOptions,
    ) -> Result<GeoTable> {
        let release = descriptor.validate_release(options.release.as_deref())?;
        let filter = lower_filter(options)?;

        let (bbox, region) = match locator {
            Locator::BoundingBox(bbox) => (bbox, None),
            Locator::Address(address) => {
                let unit: DistanceUnit = options
                    .unit
                    .as_deref()
                    .unwrap_or(&self.options.unit)
                    .parse()?;
                let meters = unit.to_meters(options.distance.unwrap_or(self.options.distance));
                let center = match address {
                    Address::Text(text) => self.geocoder.geocode(&text).await?,
                    Address::Point(point) => point,
                };
                let bbox = GeodesicBuffer::new(center, meters).bounding_box()?;
                (bbox, None)
            }
            Locator::Place(place) => {
                let region = self.geocoder.geocode_to_region(&place).await?;
                (region.bbox(), Some(region))
            }
        };

        let table = self
            .read(descriptor, &release, Some(&bbox), filter, options)
            .await?;
        match region {
            Some(region) => {
                let clipped = table.within(&region)?;
                log_debug!(
                    component = "query",
                    event = "place_clip",
                    before = table.num_rows(),
                    after = clipped.num_rows(),
                );
                Ok(clipped)
            }
            None => Ok(table),
        }
    }

    /// Reads a dataset without any spatial predicate.
    pub async fn read_table(
        &self,
        descriptor: &DatasetDescriptor,
        options: &QueryOptions,
    ) -> Result<RecordBatch> {
        let release = descriptor.validate_release(options.release.as_deref())?;
        let filter = lower_filter(options)?;
        let table = self
            .read(descriptor, &release, None, filter, options)
            .await?;
        Ok(table.into_batch())
    }

    async fn read(
        &self,
        descriptor: &DatasetDescriptor,
        release: &str,
        bbox: Option<&BoundingBox>,
        filter: Option<Predicate>,
        options: &QueryOptions,
    ) -> Result<GeoTable> {
        let location = descriptor.location(release);
        let store_options = self.options.store_options_for(descriptor.region_name());
        let scan = Scan::open(&location, &store_options, descriptor.is_spatial()).await?;

        let plan = scan.plan(
            bbox.map(|bbox| (bbox, descriptor.bbox_column_name())),
            filter,
            options.columns.as_deref(),
            self.options.batch_size,
        )?;
        let schema = plan.output_schema();
        let batches: Vec<RecordBatch> = scan.execute(plan).try_collect().await?;
        GeoTable::try_new(schema, &batches)
    }
}

fn lower_filter(options: &QueryOptions) -> Result<Option<Predicate>> {
    Ok(options
        .filter
        .as_ref()
        .map(FilterStructure::to_predicate)
        .transpose()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dataset::ReleaseCatalog, error::Error, geocode::StaticGeocoder};

    fn missing_dataset() -> DatasetDescriptor {
        DatasetDescriptor::new(
            "missing",
            "file:///nonexistent/geoplaces/{release}/",
            "theme=places/",
            ReleaseCatalog::new(["2024-01-01"]),
        )
    }

    fn client() -> Client<StaticGeocoder> {
        Client::new(StaticGeocoder::new(), ClientOptions::default())
    }

    #[tokio::test]
    async fn release_is_checked_before_anything_else() {
        let options = QueryOptions::new()
            .release("1999-01-01")
            .unit("furlong")
            .filter(("confidence", "~", 0.5));
        let err = client()
            .query(
                &missing_dataset(),
                Locator::Address("nowhere".into()),
                &options,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRelease { .. }));
    }

    #[tokio::test]
    async fn unit_is_checked_before_geocoding() {
        let options = QueryOptions::new().unit("furlong");
        let err = client()
            .query(
                &missing_dataset(),
                Locator::Address("nowhere".into()),
                &options,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidUnit { .. }));
    }

    #[tokio::test]
    async fn operator_is_checked_before_the_scan() {
        let options = QueryOptions::new().filter(("confidence", "~", 0.5));
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0).unwrap();
        let err = client()
            .query(&missing_dataset(), Locator::BoundingBox(bbox), &options)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperator(_)));
    }

    #[tokio::test]
    async fn geocoding_failure_surfaces() {
        let err = client()
            .query(
                &missing_dataset(),
                Locator::Place("Atlantis".to_owned()),
                &QueryOptions::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::GeocodingFailed { .. }));
    }

    #[tokio::test]
    async fn missing_location_is_unavailable() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0).unwrap();
        let err = client()
            .query(
                &missing_dataset(),
                Locator::BoundingBox(bbox),
                &QueryOptions::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DatasetUnavailable { .. }));
    }
}
