use once_cell::sync::Lazy;

use super::{DatasetDescriptor, ReleaseCatalog};
use crate::error::{Error, Result};

/// Bucket layout of an Overture release.
pub const OVERTURE_PATH_TEMPLATE: &str = "s3://overturemaps-us-west-2/release/{release}/";
/// Region of the Overture bucket.
pub const OVERTURE_REGION: &str = "us-west-2";
/// Release read when a query names none.
pub const OVERTURE_LATEST_RELEASE: &str = "2025-01-22.0";

static RELEASES: Lazy<ReleaseCatalog> =
    Lazy::new(|| ReleaseCatalog::parse(include_str!("../../releases/overture/releases.txt")));

static BASE_TYPES: Lazy<ReleaseCatalog> =
    Lazy::new(|| ReleaseCatalog::parse(include_str!("../../releases/overture/base_types.txt")));

/// Known Overture releases.
pub fn overture_releases() -> &'static ReleaseCatalog {
    &RELEASES
}

/// Types accepted by [`OvertureTheme::Base`].
pub fn overture_base_types() -> &'static ReleaseCatalog {
    &BASE_TYPES
}

/// Overture Maps theme/type partitions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OvertureTheme {
    /// `places/place`.
    Places,
    /// `buildings/building`.
    Buildings,
    /// `buildings/building_part`.
    BuildingParts,
    /// `addresses/address`.
    Addresses,
    /// `transportation/segment`.
    Segments,
    /// `transportation/connector`.
    Connectors,
    /// A type of the `base` theme such as `land` or `water`.
    Base(String),
}

impl OvertureTheme {
    /// Hive partition path of the theme and type.
    pub fn prefix(&self) -> String {
        match self {
            OvertureTheme::Places => "theme=places/type=place/".to_owned(),
            OvertureTheme::Buildings => "theme=buildings/type=building/".to_owned(),
            OvertureTheme::BuildingParts => "theme=buildings/type=building_part/".to_owned(),
            OvertureTheme::Addresses => "theme=addresses/type=address/".to_owned(),
            OvertureTheme::Segments => "theme=transportation/type=segment/".to_owned(),
            OvertureTheme::Connectors => "theme=transportation/type=connector/".to_owned(),
            OvertureTheme::Base(base_type) => format!("theme=base/type={base_type}/"),
        }
    }

    /// Checks base types against the allow-list; other themes always pass.
    pub fn validate(&self) -> Result<()> {
        match self {
            OvertureTheme::Base(base_type) if !BASE_TYPES.contains(base_type) => {
                Err(Error::InvalidBaseType {
                    base_type: base_type.clone(),
                    valid: BASE_TYPES.to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Descriptor of the partition, after [`OvertureTheme::validate`].
    pub fn descriptor(&self) -> Result<DatasetDescriptor> {
        self.validate()?;
        Ok(self.unchecked_descriptor())
    }

    pub(crate) fn unchecked_descriptor(&self) -> DatasetDescriptor {
        let prefix = self.prefix();
        DatasetDescriptor::new(
            format!("overture/{}", prefix.trim_end_matches('/')),
            OVERTURE_PATH_TEMPLATE,
            prefix,
            RELEASES.clone(),
        )
        .region(OVERTURE_REGION)
        .default_release(OVERTURE_LATEST_RELEASE)
    }
}
