#![deny(missing_docs)]
//! Filtered, geometry-aware reads of remote open geospatial datasets.
//!
//! A query picks a search area (an address plus a distance, a named place, or
//! a bounding box), turns it into an overlap predicate on each row's bbox
//! struct, ANDs it with an optional user filter and pushes both down into a
//! streaming parquet scan. Place queries are clipped to the place outline
//! afterwards.
//!
//! ```ignore
//! use geoplaces::{Client, ClientOptions, DataSource, QueryOptions};
//!
//! let client = Client::nominatim(ClientOptions::default(), Default::default())?;
//! let places = client
//!     .overture()
//!     .places()
//!     .from_address(
//!         "Empire State Building".into(),
//!         QueryOptions::new().filter(("confidence", ">", 0.9)),
//!     )
//!     .await?;
//! ```

mod observability;

/// Dataset descriptors and release allow-lists.
pub mod dataset;
mod error;
mod fs;
/// Address and place resolution.
pub mod geocode;
mod option;
mod query;
mod scan;
/// Bounding boxes, geodesic buffers and place regions.
pub mod spatial;
mod table;
mod units;

pub use geoplaces_predicate as predicate;
pub use geoplaces_predicate::{FilterOp, FilterStructure, FilterValue, Triplet};

#[cfg(feature = "nominatim")]
pub use crate::geocode::{NominatimGeocoder, NominatimOptions};
pub use crate::{
    dataset::{DatasetDescriptor, FoursquareTheme, OvertureTheme, ReleaseCatalog},
    error::{Error, Result},
    geocode::{Address, Geocoder, StaticGeocoder},
    option::ClientOptions,
    query::{
        Client, DataSource, Dataset, FoursquarePlaces, Locator, OvertureMaps, QueryOptions,
    },
    scan::BatchStream,
    spatial::{buffer, BoundingBox, GeodesicBuffer, Region},
    table::GeoTable,
    units::{to_meters, DistanceUnit},
};
