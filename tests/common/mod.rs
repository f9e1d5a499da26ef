#![allow(dead_code)]

use std::{collections::HashMap, fs::File, path::Path, sync::Arc};

use arrow::{
    array::{
        Array, ArrayRef, AsArray, BinaryArray, Float64Array, RecordBatch, StringArray,
        StructArray,
    },
    datatypes::{DataType, Field, Schema},
};
use geoplaces::{
    Client, ClientOptions, DatasetDescriptor, GeoTable, ReleaseCatalog, StaticGeocoder,
};
use parquet::{
    arrow::ArrowWriter,
    file::{metadata::KeyValue, properties::WriterProperties},
};
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;
use url::Url;

pub const RELEASE: &str = "2024-01-01";
const GEO: &str = r#"{"version":"1.1.0","primary_column":"geometry","columns":{"geometry":{"encoding":"WKB","geometry_types":["Point"]}}}"#;

/// `(id, name, confidence, lon, lat)`.
pub type Place = (&'static str, &'static str, f64, f64, f64);

/// Near the origin, all within a few hundred meters except `far`.
pub const NEAR_ORIGIN: [Place; 4] = [
    ("a", "Cafe A", 0.95, 0.0, 0.0),
    ("b", "Bar B", 0.5, 0.002, 0.001),
    ("far", "Far Away", 0.99, 0.5, 0.5),
    ("e", "Cafe E", 0.92, -0.003, -0.002),
];

/// Nothing here survives a query around the origin.
pub const REMOTE: [Place; 2] = [
    ("d", "Remote D", 0.97, 10.0, 10.0),
    ("f", "Remote F", 0.3, 20.0, 20.0),
];

pub struct LocalDataset {
    pub dir: TempDir,
    pub descriptor: DatasetDescriptor,
}

/// Writes `release/<RELEASE>/theme=places/part-{0,1}.parquet` into a tempdir.
pub fn local_dataset() -> LocalDataset {
    init_tracing();
    let dir = tempfile::tempdir().expect("tempdir");
    let partition = dir
        .path()
        .join("release")
        .join(RELEASE)
        .join("theme=places");
    std::fs::create_dir_all(&partition).expect("partition dir");
    write_places(&partition.join("part-0.parquet"), &NEAR_ORIGIN);
    write_places(&partition.join("part-1.parquet"), &REMOTE);

    let root = Url::from_directory_path(dir.path()).expect("directory url");
    let descriptor = DatasetDescriptor::new(
        "local",
        format!("{root}release/{{release}}/"),
        "theme=places/",
        ReleaseCatalog::new([RELEASE]),
    );
    LocalDataset { dir, descriptor }
}

/// Descriptor whose only release points at a directory that does not exist.
pub fn missing_dataset() -> DatasetDescriptor {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = Url::from_directory_path(dir.path().join("absent")).expect("directory url");
    DatasetDescriptor::new(
        "missing",
        format!("{root}release/{{release}}/"),
        "theme=places/",
        ReleaseCatalog::new([RELEASE]),
    )
}

/// Honors `RUST_LOG`; repeated calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn client(geocoder: StaticGeocoder) -> Client<StaticGeocoder> {
    Client::new(geocoder, ClientOptions::default().batch_size(2))
}

pub fn wkb_point(x: f64, y: f64) -> Vec<u8> {
    let mut bytes = vec![1u8];
    bytes.extend_from_slice(&1u32.to_le_bytes());
    bytes.extend_from_slice(&x.to_le_bytes());
    bytes.extend_from_slice(&y.to_le_bytes());
    bytes
}

fn write_places(path: &Path, places: &[Place]) {
    let coordinate = |values: Vec<f64>| Arc::new(Float64Array::from(values)) as ArrayRef;
    let xs: Vec<f64> = places.iter().map(|place| place.3).collect();
    let ys: Vec<f64> = places.iter().map(|place| place.4).collect();
    let bbox = StructArray::from(vec![
        (Arc::new(Field::new("xmin", DataType::Float64, false)), coordinate(xs.clone())),
        (Arc::new(Field::new("xmax", DataType::Float64, false)), coordinate(xs)),
        (Arc::new(Field::new("ymin", DataType::Float64, false)), coordinate(ys.clone())),
        (Arc::new(Field::new("ymax", DataType::Float64, false)), coordinate(ys)),
    ]);
    let geometries: Vec<Vec<u8>> = places
        .iter()
        .map(|place| wkb_point(place.3, place.4))
        .collect();

    let schema = Arc::new(Schema::new_with_metadata(
        vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("name", DataType::Utf8, true),
            Field::new("confidence", DataType::Float64, true),
            Field::new("bbox", bbox.data_type().clone(), false),
            Field::new("geometry", DataType::Binary, true),
        ],
        HashMap::from([("geo".to_owned(), GEO.to_owned())]),
    ));
    let batch = RecordBatch::try_new(
        Arc::clone(&schema),
        vec![
            Arc::new(StringArray::from_iter_values(places.iter().map(|p| p.0))) as ArrayRef,
            Arc::new(StringArray::from_iter_values(places.iter().map(|p| p.1))) as ArrayRef,
            Arc::new(Float64Array::from_iter_values(places.iter().map(|p| p.2))) as ArrayRef,
            Arc::new(bbox) as ArrayRef,
            Arc::new(BinaryArray::from_iter_values(geometries.iter())) as ArrayRef,
        ],
    )
    .expect("record batch");

    let properties = WriterProperties::builder()
        .set_key_value_metadata(Some(vec![KeyValue::new("geo".to_owned(), GEO.to_owned())]))
        .build();
    let file = File::create(path).expect("create parquet file");
    let mut writer = ArrowWriter::try_new(file, schema, Some(properties)).expect("writer");
    writer.write(&batch).expect("write batch");
    writer.close().expect("close writer");
}

/// Sorted values of the `id` column.
pub fn ids(table: &GeoTable) -> Vec<String> {
    let column = table
        .batch()
        .column_by_name("id")
        .expect("id column")
        .as_string::<i32>();
    let mut ids: Vec<String> = (0..column.len())
        .map(|row| column.value(row).to_owned())
        .collect();
    ids.sort();
    ids
}
