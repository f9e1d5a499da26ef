use std::{
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use arrow::{array::RecordBatch, datatypes::SchemaRef};
use futures_core::{ready, Stream};
use parquet::errors::ParquetError;
use pin_project_lite::pin_project;

use crate::error::{translate_parquet, Error, Result};

pin_project! {
    /// Batches of one data file, conformed to the scan's output schema.
    ///
    /// Zero-row batches left behind by the row filter are dropped.
    #[derive(Debug)]
    pub(crate) struct FileBatches<S> {
        #[pin]
        stream: S,
        schema: SchemaRef,
    }
}

impl<S> FileBatches<S> {
    pub(crate) fn new(stream: S, schema: SchemaRef) -> Self {
        FileBatches { stream, schema }
    }
}

impl<S> Stream for FileBatches<S>
where
    S: Stream<Item = Result<RecordBatch, ParquetError>>,
{
    type Item = Result<RecordBatch>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        loop {
            let record_batch = ready!(this.stream.as_mut().poll_next(cx))
                .transpose()
                .map_err(translate_parquet)?;
            let record_batch = match record_batch {
                Some(record_batch) => record_batch,
                None => return Poll::Ready(None),
            };
            if record_batch.num_rows() == 0 {
                continue;
            }
            return Poll::Ready(Some(conform(this.schema, record_batch)));
        }
    }
}

/// Reorders the batch's columns by name into `schema`, which also carries the
/// geometry extension tag.
fn conform(schema: &SchemaRef, record_batch: RecordBatch) -> Result<RecordBatch> {
    let columns = schema
        .fields()
        .iter()
        .map(|field| {
            record_batch
                .column_by_name(field.name())
                .cloned()
                .ok_or_else(|| Error::InvalidColumn(field.name().clone()))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(RecordBatch::try_new(Arc::clone(schema), columns)?)
}
