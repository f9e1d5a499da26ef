//! Streaming scan of a partitioned parquet dataset with predicate pushdown.

mod arrows;
pub(crate) mod geometa;
mod stream;

use std::{collections::BTreeSet, pin::Pin, sync::Arc};

use arrow::{
    array::RecordBatch,
    datatypes::{Schema, SchemaRef},
};
use async_stream::try_stream;
use futures_core::Stream;
use futures_util::{pin_mut, StreamExt};
use geoplaces_predicate::{evaluate, Predicate};
use object_store::{ObjectMeta, ObjectStore};
use parquet::arrow::{
    async_reader::{ParquetObjectReader, ParquetRecordBatchStream},
    ParquetRecordBatchStreamBuilder, ProjectionMask,
};

use self::{
    arrows::{root_indices, row_filter},
    geometa::{primary_geometry_column, tag_geometry},
    stream::FileBatches,
};
use crate::{
    error::{translate_arrow, translate_parquet, Result},
    fs::{unavailable, DatasetStore},
    observability::{log_debug, log_info},
    spatial::BoundingBox,
};

/// Pull-based stream of non-empty record batches.
pub type BatchStream = Pin<Box<dyn Stream<Item = Result<RecordBatch>> + Send>>;

/// An opened dataset: its data files and the schema of the first of them.
pub(crate) struct Scan {
    store: Arc<dyn ObjectStore>,
    objects: Vec<ObjectMeta>,
    schema: SchemaRef,
    geometry: Option<String>,
    location: String,
}

/// What to read from an opened dataset, checked against its schema.
#[derive(Debug)]
pub(crate) struct ScanPlan {
    predicate: Option<Predicate>,
    projection: Option<Vec<String>>,
    output_schema: SchemaRef,
    batch_size: usize,
}

impl ScanPlan {
    /// Schema of every batch the scan yields.
    pub(crate) fn output_schema(&self) -> SchemaRef {
        Arc::clone(&self.output_schema)
    }
}

impl Scan {
    /// Lists the dataset and reads the footer of its first file.
    ///
    /// Any failure here is reported as [`crate::Error::DatasetUnavailable`].
    pub(crate) async fn open(
        location: &str,
        store_options: &[(String, String)],
        spatial: bool,
    ) -> Result<Self> {
        let dataset = DatasetStore::open(location, store_options)?;
        let objects = dataset.data_files().await?;
        let store = dataset.store();

        let first = objects
            .first()
            .cloned()
            .ok_or_else(|| unavailable(location, "no data files found"))?;
        let builder = ParquetRecordBatchStreamBuilder::new(ParquetObjectReader::new(
            Arc::clone(&store),
            first,
        ))
        .await
        .map_err(|err| unavailable(location, err))?;
        let schema = Arc::clone(builder.schema());
        let geometry = if spatial {
            primary_geometry_column(&schema)
        } else {
            None
        };

        log_info!(
            component = "scan",
            event = "scan_open",
            path = %dataset.location(),
            objects = objects.len(),
        );

        Ok(Scan {
            store,
            objects,
            schema,
            geometry,
            location: location.to_owned(),
        })
    }

    pub(crate) fn schema(&self) -> SchemaRef {
        Arc::clone(&self.schema)
    }

    /// Combines the spatial and user predicates, resolves the projection and
    /// checks both against the dataset schema before any row is read.
    ///
    /// The geo predicate is the overlap test of `bbox` against the per-row
    /// bbox struct named by the second tuple element.
    pub(crate) fn plan(
        &self,
        bbox: Option<(&BoundingBox, &str)>,
        filter: Option<Predicate>,
        columns: Option<&[String]>,
        batch_size: usize,
    ) -> Result<ScanPlan> {
        let spatial = bbox.map(|(bbox, column)| bbox.overlap_predicate(column));
        let predicate = match (spatial, filter) {
            (Some(spatial), Some(filter)) => Some(spatial.and_with(filter)),
            (spatial, filter) => spatial.or(filter),
        };
        if let Some(predicate) = &predicate {
            evaluate(predicate, &RecordBatch::new_empty(self.schema()))?;
        }

        let projection = columns.map(|columns| self.projection(columns)).transpose()?;
        let projected = match &projection {
            Some(names) => {
                let indices = root_indices(&self.schema, names)?;
                Arc::new(self.schema.project(&indices).map_err(translate_arrow)?)
            }
            None => self.schema(),
        };
        let output_schema = tag_geometry(&projected, self.geometry.as_deref());

        Ok(ScanPlan {
            predicate,
            projection,
            output_schema,
            batch_size,
        })
    }

    /// Requested columns in file order, with the geometry column retained.
    fn projection(&self, columns: &[String]) -> Result<Vec<String>> {
        let mut indices: BTreeSet<usize> =
            root_indices(&self.schema, columns)?.into_iter().collect();
        if let Some(geometry) = &self.geometry {
            indices.extend(self.schema.index_of(geometry).ok());
        }
        Ok(indices
            .into_iter()
            .map(|index| self.schema.field(index).name().clone())
            .collect())
    }

    /// Streams the planned rows file by file. Each file is opened only once
    /// the previous one is exhausted.
    pub(crate) fn execute(self, plan: ScanPlan) -> BatchStream {
        Box::pin(scan_objects(self.store, self.objects, self.location, plan))
    }
}

fn scan_objects(
    store: Arc<dyn ObjectStore>,
    objects: Vec<ObjectMeta>,
    location: String,
    plan: ScanPlan,
) -> impl Stream<Item = Result<RecordBatch>> + Send {
    try_stream! {
        let mut total_batches = 0usize;
        let mut total_rows = 0usize;
        for object in objects {
            let batches = open_object(&store, &object, &plan).await?;
            pin_mut!(batches);
            let mut rows = 0usize;
            while let Some(batch) = batches.next().await {
                let batch = batch?;
                rows += batch.num_rows();
                total_batches += 1;
                yield batch;
            }
            log_debug!(
                component = "scan",
                event = "scan_file",
                object = %object.location,
                rows = rows,
            );
            total_rows += rows;
        }
        log_info!(
            component = "scan",
            event = "scan_complete",
            path = %location,
            batches = total_batches,
            rows = total_rows,
        );
    }
}

async fn open_object(
    store: &Arc<dyn ObjectStore>,
    object: &ObjectMeta,
    plan: &ScanPlan,
) -> Result<FileBatches<ParquetRecordBatchStream<ParquetObjectReader>>> {
    let reader = ParquetObjectReader::new(Arc::clone(store), object.clone());
    let builder = ParquetRecordBatchStreamBuilder::new(reader)
        .await
        .map_err(translate_parquet)?;
    let file_schema: &Schema = builder.schema();

    let projection = match &plan.projection {
        Some(names) => Some(ProjectionMask::roots(
            builder.parquet_schema(),
            root_indices(file_schema, names)?,
        )),
        None => None,
    };
    let filter = match &plan.predicate {
        Some(predicate) => Some(row_filter(
            builder.parquet_schema(),
            file_schema,
            predicate,
        )?),
        None => None,
    };

    let mut builder = builder.with_batch_size(plan.batch_size);
    if let Some(projection) = projection {
        builder = builder.with_projection(projection);
    }
    if let Some(filter) = filter {
        builder = builder.with_row_filter(filter);
    }
    let stream = builder.build().map_err(translate_parquet)?;
    Ok(FileBatches::new(stream, plan.output_schema()))
}
