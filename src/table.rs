use arrow::{
    array::{Array, AsArray, BooleanArray, RecordBatch},
    compute::{cast, concat_batches, filter_record_batch},
    datatypes::{DataType, SchemaRef},
    error::ArrowError,
};
use geo::Geometry;
use geo_traits::to_geo::ToGeoGeometry;

use crate::{
    error::{Error, Result},
    scan::geometa::tagged_geometry,
    spatial::Region,
};

/// Materialized query result.
///
/// The geometry column, when present, holds WKB bytes and is tagged with the
/// `geoarrow.wkb` extension name.
#[derive(Clone, Debug)]
pub struct GeoTable {
    batch: RecordBatch,
    geometry: Option<usize>,
}

impl GeoTable {
    pub(crate) fn try_new(schema: SchemaRef, batches: &[RecordBatch]) -> Result<Self> {
        let batch = concat_batches(&schema, batches)?;
        Ok(Self::from_batch(batch))
    }

    /// Wraps a batch, picking up its `geoarrow.wkb` field if any.
    pub fn from_batch(batch: RecordBatch) -> Self {
        let geometry = tagged_geometry(&batch.schema());
        GeoTable { batch, geometry }
    }

    /// The rows as a single batch.
    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Unwraps the result batch.
    pub fn into_batch(self) -> RecordBatch {
        self.batch
    }

    /// Output schema, geometry tag included.
    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// True when no row matched.
    pub fn is_empty(&self) -> bool {
        self.batch.num_rows() == 0
    }

    /// Name of the `geoarrow.wkb` column, if any.
    pub fn geometry_column(&self) -> Option<&str> {
        self.geometry
            .map(|index| self.batch.schema_ref().field(index).name().as_str())
    }

    /// Decodes the geometry column; null or empty geometries decode to `None`.
    pub fn geometries(&self) -> Result<Vec<Option<Geometry<f64>>>> {
        let index = self
            .geometry
            .ok_or_else(|| Error::InvalidColumn("geometry".to_owned()))?;
        let column = self.batch.column(index);
        let column = match column.data_type() {
            DataType::Binary => column.clone(),
            _ => cast(column, &DataType::Binary)?,
        };

        column
            .as_binary::<i32>()
            .iter()
            .map(|bytes| match bytes {
                Some(bytes) => {
                    let wkb = wkb::reader::read_wkb(bytes)
                        .map_err(|err| Error::Arrow(ArrowError::ParseError(err.to_string())))?;
                    Ok(wkb.try_to_geometry())
                }
                None => Ok(None),
            })
            .collect()
    }

    /// Rows whose geometry lies within `region`.
    pub fn within(&self, region: &Region) -> Result<GeoTable> {
        let mask: BooleanArray = self
            .geometries()?
            .iter()
            .map(|geometry| Some(geometry.as_ref().is_some_and(|g| region.contains(g))))
            .collect();
        Ok(GeoTable {
            batch: filter_record_batch(&self.batch, &mask)?,
            geometry: self.geometry,
        })
    }
}

impl From<GeoTable> for RecordBatch {
    fn from(table: GeoTable) -> Self {
        table.batch
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Arc};

    use arrow::{
        array::{ArrayRef, BinaryArray, StringArray},
        datatypes::{Field, Schema},
    };
    use geo::polygon;

    use super::*;
    use crate::scan::geometa::{EXTENSION_NAME_KEY, GEOARROW_WKB};

    fn wkb_point(x: f64, y: f64) -> Vec<u8> {
        let mut bytes = vec![1u8];
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&x.to_le_bytes());
        bytes.extend_from_slice(&y.to_le_bytes());
        bytes
    }

    fn table() -> GeoTable {
        let schema = Arc::new(Schema::new(vec![
            Field::new("name", DataType::Utf8, true),
            Field::new("geometry", DataType::Binary, true).with_metadata(HashMap::from([(
                EXTENSION_NAME_KEY.to_owned(),
                GEOARROW_WKB.to_owned(),
            )])),
        ]));
        let inside = wkb_point(0.5, 0.5);
        let outside = wkb_point(2.0, 2.0);
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec!["in", "out", "none"])) as ArrayRef,
                Arc::new(BinaryArray::from(vec![
                    Some(inside.as_slice()),
                    Some(outside.as_slice()),
                    None,
                ])) as ArrayRef,
            ],
        )
        .unwrap();
        GeoTable::from_batch(batch)
    }

    #[test]
    fn decodes_wkb_points() {
        let table = table();
        assert_eq!(table.geometry_column(), Some("geometry"));

        let geometries = table.geometries().unwrap();
        assert_eq!(
            geometries[0],
            Some(Geometry::Point(geo::Point::new(0.5, 0.5)))
        );
        assert!(geometries[2].is_none());
    }

    #[test]
    fn within_keeps_rows_inside_the_region() {
        let region = Region::new(polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0),
        ])
        .unwrap();
        let clipped = table().within(&region).unwrap();

        assert_eq!(clipped.num_rows(), 1);
        let names = clipped.batch().column(0).as_string::<i32>();
        assert_eq!(names.value(0), "in");
    }

    #[test]
    fn untagged_tables_have_no_geometries() {
        let batch = RecordBatch::try_from_iter([(
            "name",
            Arc::new(StringArray::from(vec!["a"])) as ArrayRef,
        )])
        .unwrap();
        let table = GeoTable::from_batch(batch);
        assert_eq!(table.geometry_column(), None);
        assert!(matches!(table.geometries(), Err(Error::InvalidColumn(_))));
    }
}
