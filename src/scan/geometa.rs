//! GeoParquet `geo` schema metadata and the geoarrow extension tag.

use std::{collections::HashMap, sync::Arc};

use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use serde::Deserialize;

use crate::observability::log_warn;

/// Schema metadata key holding the GeoParquet JSON document.
pub const GEO_METADATA_KEY: &str = "geo";
/// Field metadata key naming an arrow extension type.
pub const EXTENSION_NAME_KEY: &str = "ARROW:extension:name";
/// Extension name of well-known-binary geometry columns.
pub const GEOARROW_WKB: &str = "geoarrow.wkb";

const FALLBACK_GEOMETRY_COLUMN: &str = "geometry";

#[derive(Debug, Deserialize)]
struct GeoMetadata {
    primary_column: String,
}

/// Column the dataset designates as its geometry.
///
/// Falls back to a column literally named `geometry` when the `geo` document
/// is missing or unreadable.
pub(crate) fn primary_geometry_column(schema: &Schema) -> Option<String> {
    let declared = schema.metadata().get(GEO_METADATA_KEY).and_then(|raw| {
        match serde_json::from_str::<GeoMetadata>(raw) {
            Ok(metadata) => Some(metadata.primary_column),
            Err(err) => {
                log_warn!(
                    component = "scan",
                    event = "geo_metadata_unreadable",
                    error = %err,
                );
                None
            }
        }
    });
    declared
        .or_else(|| Some(FALLBACK_GEOMETRY_COLUMN.to_owned()))
        .filter(|name| schema.field_with_name(name).is_ok())
}

/// Copy of `schema` whose geometry field carries the `geoarrow.wkb` extension
/// name. Only binary columns are tagged; the column data is not touched.
pub(crate) fn tag_geometry(schema: &Schema, geometry: Option<&str>) -> SchemaRef {
    let fields = schema
        .fields()
        .iter()
        .map(|field| match geometry {
            Some(name) if field.name() == name && is_binary(field.data_type()) => {
                let mut metadata: HashMap<String, String> = field.metadata().clone();
                metadata.insert(EXTENSION_NAME_KEY.to_owned(), GEOARROW_WKB.to_owned());
                Arc::new(field.as_ref().clone().with_metadata(metadata))
            }
            _ => Arc::clone(field),
        })
        .collect::<Vec<Arc<Field>>>();
    Arc::new(Schema::new_with_metadata(fields, schema.metadata().clone()))
}

/// Index of the field tagged as `geoarrow.wkb`, if any.
pub(crate) fn tagged_geometry(schema: &Schema) -> Option<usize> {
    schema.fields().iter().position(|field| {
        field
            .metadata()
            .get(EXTENSION_NAME_KEY)
            .is_some_and(|name| name == GEOARROW_WKB)
    })
}

fn is_binary(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Binary | DataType::LargeBinary | DataType::BinaryView
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(geo: Option<&str>) -> Schema {
        let fields = vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("geometry", DataType::Binary, true),
            Field::new("shape", DataType::Binary, true),
        ];
        let metadata = geo
            .map(|raw| HashMap::from([(GEO_METADATA_KEY.to_owned(), raw.to_owned())]))
            .unwrap_or_default();
        Schema::new_with_metadata(fields, metadata)
    }

    #[test]
    fn primary_column_comes_from_geo_metadata() {
        let schema = schema(Some(r#"{"version":"1.1.0","primary_column":"shape"}"#));
        assert_eq!(primary_geometry_column(&schema).as_deref(), Some("shape"));
    }

    #[test]
    fn falls_back_to_geometry_column() {
        assert_eq!(
            primary_geometry_column(&schema(None)).as_deref(),
            Some("geometry")
        );
        assert_eq!(
            primary_geometry_column(&schema(Some("not json"))).as_deref(),
            Some("geometry")
        );

        let plain = Schema::new(vec![Field::new("id", DataType::Utf8, false)]);
        assert_eq!(primary_geometry_column(&plain), None);
    }

    #[test]
    fn tagging_rewrites_only_the_geometry_field() {
        let schema = schema(Some(r#"{"primary_column":"geometry"}"#));
        let tagged = tag_geometry(&schema, Some("geometry"));

        assert_eq!(tagged_geometry(&tagged), Some(1));
        assert!(tagged.field(2).metadata().is_empty());
        assert_eq!(tagged.field(1).data_type(), &DataType::Binary);
        assert_eq!(tagged.metadata(), schema.metadata());
    }

    #[test]
    fn non_binary_geometry_is_left_alone() {
        let schema = Schema::new(vec![Field::new("geometry", DataType::Utf8, true)]);
        let tagged = tag_geometry(&schema, Some("geometry"));
        assert_eq!(tagged_geometry(&tagged), None);
    }
}
