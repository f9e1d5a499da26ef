use arrow::{datatypes::DataType, error::ArrowError};
use thiserror::Error;

/// Failures raised while lowering or evaluating a filter.
#[derive(Debug, Error)]
pub enum FilterError {
    /// The filter is neither a triplet nor a non-empty group of filters.
    #[error("invalid filter structure: {0}")]
    InvalidStructure(String),
    /// The operator symbol is not one of the supported operators.
    #[error("unsupported operator `{0}`")]
    UnsupportedOperator(String),
    /// The operator exists but cannot be applied to the column's type.
    #[error("operator `{op}` is not supported for column `{column}` of type {data_type}")]
    OperatorNotApplicable {
        /// Operator symbol.
        op: String,
        /// Dotted column path.
        column: String,
        /// Declared Arrow type of the column.
        data_type: DataType,
    },
    /// A column path does not resolve against the batch schema.
    #[error("invalid column name: \"{0}\"")]
    InvalidColumn(String),
    /// A literal does not fit the column it is compared against.
    #[error("incorrect type used for value in filter: {value} should be of type {expected}")]
    InvalidValue {
        /// Rendered literal.
        value: String,
        /// Expected type, as the engine names it.
        expected: String,
    },
    /// A compute kernel rejected the leaf.
    #[error("evaluating `{column}` against {literal}: {source}")]
    Engine {
        /// Dotted column path of the failing leaf.
        column: String,
        /// Rendered literal of the failing leaf.
        literal: String,
        /// Underlying kernel error.
        #[source]
        source: ArrowError,
    },
    /// A kernel failed while combining leaf results.
    #[error(transparent)]
    Arrow(#[from] ArrowError),
}
