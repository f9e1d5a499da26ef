//! Object-store resolution and listing of dataset files.

use std::sync::Arc;

use futures_util::TryStreamExt;
use object_store::{parse_url_opts, path::Path, ObjectMeta, ObjectStore};
use url::Url;

use crate::error::{Error, Result};

/// A dataset location resolved to the store that serves it.
pub(crate) struct DatasetStore {
    store: Arc<dyn ObjectStore>,
    prefix: Path,
    location: String,
}

impl DatasetStore {
    /// Resolves `location` (`s3://`, `file://`, ...) with the given builder
    /// options. Keys a store does not understand are ignored by it.
    pub(crate) fn open(location: &str, options: &[(String, String)]) -> Result<Self> {
        let url = Url::parse(location).map_err(|err| unavailable(location, err))?;
        let (store, prefix) = parse_url_opts(
            &url,
            options
                .iter()
                .map(|(key, value)| (key.as_str(), value.as_str())),
        )
        .map_err(|err| unavailable(location, err))?;

        Ok(DatasetStore {
            store: Arc::from(store),
            prefix,
            location: location.to_owned(),
        })
    }

    pub(crate) fn store(&self) -> Arc<dyn ObjectStore> {
        Arc::clone(&self.store)
    }

    pub(crate) fn location(&self) -> &str {
        &self.location
    }

    /// Lists the data files under the prefix in path order.
    ///
    /// Hidden objects (`_SUCCESS`, `.crc` and the like) and zero-length
    /// objects are skipped. An empty listing is an error.
    pub(crate) async fn data_files(&self) -> Result<Vec<ObjectMeta>> {
        let mut objects: Vec<ObjectMeta> = self
            .store
            .list(Some(&self.prefix))
            .try_filter(|meta| futures_util::future::ready(is_data_file(meta)))
            .try_collect()
            .await
            .map_err(|err| unavailable(&self.location, err))?;

        if objects.is_empty() {
            return Err(unavailable(&self.location, "no data files found"));
        }
        objects.sort_by(|a, b| a.location.cmp(&b.location));
        Ok(objects)
    }
}

fn is_data_file(meta: &ObjectMeta) -> bool {
    meta.size > 0
        && meta
            .location
            .filename()
            .is_some_and(|name| !name.starts_with('_') && !name.starts_with('.'))
}

pub(crate) fn unavailable(location: &str, reason: impl ToString) -> Error {
    Error::DatasetUnavailable {
        path: location.to_owned(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn file_url(dir: &std::path::Path) -> String {
        Url::from_directory_path(dir).unwrap().to_string()
    }

    #[tokio::test]
    async fn lists_visible_non_empty_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("part-1.parquet"), b"x").unwrap();
        fs::write(dir.path().join("part-0.parquet"), b"x").unwrap();
        fs::write(dir.path().join("_SUCCESS"), b"x").unwrap();
        fs::write(dir.path().join(".part-0.parquet.crc"), b"x").unwrap();
        fs::write(dir.path().join("empty.parquet"), b"").unwrap();

        let store = DatasetStore::open(&file_url(dir.path()), &[]).unwrap();
        let names: Vec<_> = store
            .data_files()
            .await
            .unwrap()
            .into_iter()
            .filter_map(|meta| meta.location.filename().map(str::to_owned))
            .collect();
        assert_eq!(names, vec!["part-0.parquet", "part-1.parquet"]);
    }

    #[tokio::test]
    async fn empty_location_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let store = DatasetStore::open(&file_url(dir.path()), &[]).unwrap();
        assert!(matches!(
            store.data_files().await,
            Err(Error::DatasetUnavailable { .. })
        ));
    }

    #[test]
    fn malformed_location_is_unavailable() {
        assert!(matches!(
            DatasetStore::open("not a url", &[]),
            Err(Error::DatasetUnavailable { .. })
        ));
    }
}
