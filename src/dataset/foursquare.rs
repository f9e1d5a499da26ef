use once_cell::sync::Lazy;

use super::{DatasetDescriptor, ReleaseCatalog};

/// Bucket layout of a Foursquare release; `{release}` is a date.
pub const FOURSQUARE_PATH_TEMPLATE: &str = "s3://fsq-os-places-us-east-1/release/dt={release}/";
/// Region of the Foursquare bucket.
pub const FOURSQUARE_REGION: &str = "us-east-1";
/// Release read when a query names none.
pub const FOURSQUARE_LATEST_RELEASE: &str = "2025-02-06";

static RELEASES: Lazy<ReleaseCatalog> =
    Lazy::new(|| ReleaseCatalog::parse(include_str!("../../releases/foursquare/releases.txt")));

/// Known Foursquare releases.
pub fn foursquare_releases() -> &'static ReleaseCatalog {
    &RELEASES
}

/// Foursquare Open Places partitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FoursquareTheme {
    /// Points of interest with geometry.
    Places,
    /// Category taxonomy; tabular, no geometry.
    Categories,
}

impl FoursquareTheme {
    /// Partition directory below the release root.
    pub fn prefix(self) -> &'static str {
        match self {
            FoursquareTheme::Places => "places/parquet/",
            FoursquareTheme::Categories => "categories/parquet/",
        }
    }

    /// Descriptor of the partition; categories are read as plain tabular data.
    pub fn descriptor(self) -> DatasetDescriptor {
        let descriptor = DatasetDescriptor::new(
            format!("foursquare/{}", self.prefix().trim_end_matches('/')),
            FOURSQUARE_PATH_TEMPLATE,
            self.prefix(),
            RELEASES.clone(),
        )
        .region(FOURSQUARE_REGION)
        .default_release(FOURSQUARE_LATEST_RELEASE);
        match self {
            FoursquareTheme::Places => descriptor,
            FoursquareTheme::Categories => descriptor.non_spatial(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn releases_drop_the_partition_key() {
        assert_eq!(foursquare_releases().latest(), Some(FOURSQUARE_LATEST_RELEASE));
        assert!(foursquare_releases().contains("2024-11-19"));
    }

    #[test]
    fn locations_keep_the_partition_key() {
        assert_eq!(
            FoursquareTheme::Categories
                .descriptor()
                .location("2025-02-06"),
            "s3://fsq-os-places-us-east-1/release/dt=2025-02-06/categories/parquet/"
        );
        assert!(!FoursquareTheme::Categories.descriptor().is_spatial());
        assert!(FoursquareTheme::Places.descriptor().is_spatial());
    }
}
