//! Descriptors of the remote datasets a query can target.

mod foursquare;
mod overture;
mod release;

pub use foursquare::{
    foursquare_releases, FoursquareTheme, FOURSQUARE_LATEST_RELEASE, FOURSQUARE_PATH_TEMPLATE,
    FOURSQUARE_REGION,
};
pub use overture::{
    overture_base_types, overture_releases, OvertureTheme, OVERTURE_LATEST_RELEASE,
    OVERTURE_PATH_TEMPLATE, OVERTURE_REGION,
};
pub use release::ReleaseCatalog;

use crate::{
    error::{Error, Result},
    observability::log_warn,
};

/// Where a dataset lives and which releases of it may be read.
///
/// The storage location of a release is `path_template` with `{release}`
/// substituted, followed by `theme_prefix`.
#[derive(Clone, Debug)]
pub struct DatasetDescriptor {
    name: String,
    path_template: String,
    theme_prefix: String,
    region: Option<String>,
    default_release: Option<String>,
    releases: ReleaseCatalog,
    bbox_column: String,
    spatial: bool,
}

impl DatasetDescriptor {
    /// Creates a spatial descriptor whose bbox struct column is `bbox`.
    pub fn new(
        name: impl Into<String>,
        path_template: impl Into<String>,
        theme_prefix: impl Into<String>,
        releases: ReleaseCatalog,
    ) -> Self {
        DatasetDescriptor {
            name: name.into(),
            path_template: path_template.into(),
            theme_prefix: theme_prefix.into(),
            region: None,
            default_release: None,
            releases,
            bbox_column: "bbox".to_owned(),
            spatial: true,
        }
    }

    /// Object-store region the bucket lives in.
    pub fn region(self, region: impl Into<String>) -> Self {
        DatasetDescriptor {
            region: Some(region.into()),
            ..self
        }
    }

    /// Release used when a query names none; the newest catalog entry otherwise.
    pub fn default_release(self, release: impl Into<String>) -> Self {
        DatasetDescriptor {
            default_release: Some(release.into()),
            ..self
        }
    }

    /// Struct column holding per-row `xmin`/`xmax`/`ymin`/`ymax`.
    pub fn bbox_column(self, column: impl Into<String>) -> Self {
        DatasetDescriptor {
            bbox_column: column.into(),
            ..self
        }
    }

    /// Marks the dataset as plain tabular data without a geometry column.
    pub fn non_spatial(self) -> Self {
        DatasetDescriptor {
            spatial: false,
            ..self
        }
    }

    /// Name used in logs and errors.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Releases a query may name.
    pub fn releases(&self) -> &ReleaseCatalog {
        &self.releases
    }

    pub(crate) fn region_name(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub(crate) fn bbox_column_name(&self) -> &str {
        &self.bbox_column
    }

    pub(crate) fn is_spatial(&self) -> bool {
        self.spatial
    }

    /// Checks `release` (or the default release) against the allow-list.
    pub fn validate_release(&self, release: Option<&str>) -> Result<String> {
        let release = release
            .or(self.default_release.as_deref())
            .or_else(|| self.releases.latest())
            .unwrap_or_default();
        if self.releases.contains(release) {
            return Ok(release.to_owned());
        }
        log_warn!(
            component = "query",
            event = "release_rejected",
            dataset = %self.name,
            release = %release,
        );
        Err(Error::InvalidRelease {
            release: release.to_owned(),
            valid: self.releases.to_string(),
        })
    }

    /// Storage location of `release`.
    pub fn location(&self, release: &str) -> String {
        format!(
            "{}{}",
            self.path_template.replace("{release}", release),
            self.theme_prefix
        )
    }
}
