use arrow::error::ArrowError;
use geoplaces_predicate::{FilterError, FilterOp};
use once_cell::sync::Lazy;
use parquet::errors::ParquetError;
use regex::Regex;
use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error returned by every geoplaces query.
#[derive(Debug, Error)]
pub enum Error {
    /// Distance unit symbol outside the supported table.
    #[error("invalid unit `{unit}`, valid units are: {valid}")]
    InvalidUnit {
        /// Symbol as given.
        unit: String,
        /// Comma-separated supported symbols.
        valid: String,
    },
    /// Release not present in the dataset's allow-list.
    #[error("invalid release `{release}`, valid releases are: {valid}")]
    InvalidRelease {
        /// Release as given.
        release: String,
        /// Comma-separated allow-list, newest first.
        valid: String,
    },
    /// Base-theme type not present in the allow-list.
    #[error("invalid base type `{base_type}`, valid base types are: {valid}")]
    InvalidBaseType {
        /// Type as given.
        base_type: String,
        /// Comma-separated allow-list.
        valid: String,
    },
    /// Filter that is neither a triplet nor a non-empty group.
    #[error("invalid filter structure: {0}")]
    InvalidFilterStructure(String),
    /// Operator symbol unknown, or not applicable to the column type.
    #[error("unsupported operator: {0}")]
    UnsupportedOperator(String),
    /// Column path that does not exist in the dataset schema.
    #[error("invalid column name: \"{0}\"")]
    InvalidColumn(String),
    /// Literal whose type does not match the column it is compared against.
    #[error("incorrect type used for value in filter: value {value} should be of type {expected}")]
    InvalidFilterValue {
        /// The offending literal, rendered as written in the filter.
        value: String,
        /// Arrow type of the column.
        expected: String,
    },
    /// Type mismatch reported after the literal itself was lost, as happens
    /// when the engine hands back only a message.
    #[error("incorrect type used for value in filter: a {found} value should be of type {expected}")]
    InvalidFilterType {
        /// Arrow type the literal was coerced to.
        found: String,
        /// Arrow type of the column.
        expected: String,
    },
    /// Remote dataset could not be listed or opened.
    #[error("dataset unavailable at {path}: {reason}")]
    DatasetUnavailable {
        /// Dataset location.
        path: String,
        /// Underlying failure.
        reason: String,
    },
    /// Geocoder returned no usable result.
    #[error("geocoding `{query}` failed: {reason}")]
    GeocodingFailed {
        /// Address or place name as given.
        query: String,
        /// Underlying failure.
        reason: String,
    },
    /// Bounding box with out-of-range, inverted or non-finite coordinates.
    #[error("invalid bounding box: {0}")]
    InvalidBoundingBox(String),
    /// Arrow failure outside the classified kinds.
    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),
    /// Parquet failure outside the classified kinds.
    #[error("parquet error: {0}")]
    Parquet(#[from] ParquetError),
    /// Object store failure once the dataset was found.
    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),
}

static FIELD_NOT_FOUND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"Unable to get field named "([^"]+)""#).expect("valid regex"));

static TYPE_MISMATCH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:Invalid comparison operation|Nested comparison): (.+?) (?:==|!=|<=|>=|<|>|IS DISTINCT FROM|IS NOT DISTINCT FROM) (.+?)(?: \(hint:.*\))?$",
    )
    .expect("valid regex")
});

static NOT_IMPLEMENTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)not (?:yet )?implemented").expect("valid regex"));

impl From<FilterError> for Error {
    fn from(err: FilterError) -> Self {
        match err {
            FilterError::InvalidStructure(message) => Error::InvalidFilterStructure(message),
            FilterError::UnsupportedOperator(op) => Error::UnsupportedOperator(format!(
                "`{op}`, valid operators are: {}",
                FilterOp::ALL.map(FilterOp::as_str).join(", ")
            )),
            FilterError::OperatorNotApplicable {
                op,
                column,
                data_type,
            } => Error::UnsupportedOperator(format!(
                "`{op}` cannot be applied to column `{column}` of type {data_type}"
            )),
            FilterError::InvalidColumn(name) => Error::InvalidColumn(name),
            FilterError::InvalidValue { value, expected } => {
                Error::InvalidFilterValue { value, expected }
            }
            FilterError::Engine {
                column,
                literal,
                source,
            } => translate_engine(&column, literal, source),
            FilterError::Arrow(source) => translate_arrow(source),
        }
    }
}

/// Classifies an engine failure raised while evaluating one predicate leaf.
fn translate_engine(column: &str, literal: String, source: ArrowError) -> Error {
    match source {
        ArrowError::InvalidArgumentError(message) => match TYPE_MISMATCH.captures(&message) {
            Some(captures) => Error::InvalidFilterValue {
                value: literal,
                expected: captures[1].to_owned(),
            },
            None => Error::Arrow(ArrowError::InvalidArgumentError(message)),
        },
        ArrowError::SchemaError(message) => match FIELD_NOT_FOUND.captures(&message) {
            Some(captures) => Error::InvalidColumn(captures[1].to_owned()),
            None => Error::InvalidColumn(column.to_owned()),
        },
        ArrowError::NotYetImplemented(message) => Error::UnsupportedOperator(message),
        other => Error::Arrow(other),
    }
}

/// Maps an arrow failure into the taxonomy; unknown kinds pass through.
pub(crate) fn translate_arrow(err: ArrowError) -> Error {
    match err {
        ArrowError::ExternalError(source) => match source.downcast::<FilterError>() {
            Ok(filter) => Error::from(*filter),
            Err(source) => Error::Arrow(ArrowError::ExternalError(source)),
        },
        ArrowError::SchemaError(message) => match FIELD_NOT_FOUND.captures(&message) {
            Some(captures) => Error::InvalidColumn(captures[1].to_owned()),
            None => Error::Arrow(ArrowError::SchemaError(message)),
        },
        ArrowError::InvalidArgumentError(message) => match TYPE_MISMATCH.captures(&message) {
            Some(captures) => Error::InvalidFilterType {
                found: captures[2].to_owned(),
                expected: captures[1].to_owned(),
            },
            None => Error::Arrow(ArrowError::InvalidArgumentError(message)),
        },
        ArrowError::NotYetImplemented(message) => Error::UnsupportedOperator(message),
        other => Error::Arrow(other),
    }
}

/// Maps a parquet failure into the taxonomy.
///
/// Row-filter errors come back boxed inside [`ParquetError::External`]; errors
/// that crossed the boundary as plain strings are classified by message.
pub(crate) fn translate_parquet(err: ParquetError) -> Error {
    match err {
        ParquetError::External(source) => match source.downcast::<ArrowError>() {
            Ok(arrow) => translate_arrow(*arrow),
            Err(source) => match source.downcast::<FilterError>() {
                Ok(filter) => Error::from(*filter),
                Err(source) => Error::Parquet(ParquetError::External(source)),
            },
        },
        ParquetError::ArrowError(message) => {
            if let Some(captures) = FIELD_NOT_FOUND.captures(&message) {
                Error::InvalidColumn(captures[1].to_owned())
            } else if let Some(captures) = TYPE_MISMATCH.captures(&message) {
                Error::InvalidFilterType {
                    found: captures[2].to_owned(),
                    expected: captures[1].to_owned(),
                }
            } else if NOT_IMPLEMENTED.is_match(&message) {
                Error::UnsupportedOperator(message)
            } else {
                Error::Parquet(ParquetError::ArrowError(message))
            }
        }
        other => Error::Parquet(other),
    }
}

#[cfg(test)]
mod tests {
    use arrow::datatypes::DataType;

    use super::*;

    fn engine(source: ArrowError) -> FilterError {
        FilterError::Engine {
            column: "confidence".to_owned(),
            literal: "\"high\"".to_owned(),
            source,
        }
    }

    #[test]
    fn type_mismatch_names_the_declared_type() {
        let err = Error::from(engine(ArrowError::InvalidArgumentError(
            "Invalid comparison operation: Float64 > Utf8".to_owned(),
        )));
        match err {
            Error::InvalidFilterValue { value, expected } => {
                assert_eq!(value, "\"high\"");
                assert_eq!(expected, "Float64");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_field_is_parsed_from_the_message() {
        let err = translate_arrow(ArrowError::SchemaError(
            "Unable to get field named \"nmae\". Valid fields: [\"name\"]".to_owned(),
        ));
        assert!(matches!(err, Error::InvalidColumn(name) if name == "nmae"));
    }

    #[test]
    fn not_implemented_becomes_unsupported_operator() {
        let err = Error::from(engine(ArrowError::NotYetImplemented(
            "comparison of Interval".to_owned(),
        )));
        assert!(matches!(err, Error::UnsupportedOperator(_)));
    }

    #[test]
    fn row_filter_errors_unwrap_through_parquet() {
        let inner = ArrowError::ExternalError(Box::new(FilterError::InvalidColumn(
            "bbox.xmin".to_owned(),
        )));
        let err = translate_parquet(ParquetError::External(Box::new(inner)));
        assert!(matches!(err, Error::InvalidColumn(name) if name == "bbox.xmin"));
    }

    #[test]
    fn stringly_parquet_errors_are_classified() {
        let err = translate_parquet(ParquetError::ArrowError(
            "Invalid comparison operation: Int64 == Utf8".to_owned(),
        ));
        match err {
            Error::InvalidFilterType { found, expected } => {
                assert_eq!(found, "Utf8");
                assert_eq!(expected, "Int64");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn lost_literal_names_both_types() {
        let err = translate_arrow(ArrowError::InvalidArgumentError(
            "Invalid comparison operation: Float64 > Utf8".to_owned(),
        ));
        assert_eq!(
            err.to_string(),
            "incorrect type used for value in filter: a Utf8 value should be of type Float64"
        );
    }

    #[test]
    fn other_failures_pass_through() {
        let err = translate_arrow(ArrowError::ComputeError("overflow".to_owned()));
        assert!(matches!(err, Error::Arrow(ArrowError::ComputeError(_))));

        let err = translate_parquet(ParquetError::EOF("truncated".to_owned()));
        assert!(matches!(err, Error::Parquet(ParquetError::EOF(_))));
    }

    #[test]
    fn our_own_unsupported_operator_lists_the_valid_set() {
        let err = Error::from(FilterError::UnsupportedOperator("~".to_owned()));
        let message = err.to_string();
        assert!(message.contains("`~`"));
        assert!(message.contains("isin"));

        let err = Error::from(FilterError::OperatorNotApplicable {
            op: "is_nan".to_owned(),
            column: "name".to_owned(),
            data_type: DataType::Utf8,
        });
        assert!(matches!(err, Error::UnsupportedOperator(_)));
    }
}
