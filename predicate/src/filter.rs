//! Nested filter structures and their lowering into [`Predicate`] trees.
//!
//! A filter is either a single triplet `(field, op, value)` or a group of
//! filters. Groups alternate their combinator with nesting depth: the
//! outermost group ORs its items, a group nested inside it ANDs its items, a
//! group nested inside that ORs again, and so on.

use std::{fmt, str::FromStr};

use serde_json::Value;

use crate::{ComparisonOp, FilterError, Predicate, PredicateBuilder, ScalarValue};

/// Operators accepted in filter triplets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterOp {
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `contains`: element match on list columns, substring on strings.
    Contains,
    /// `isin`: membership in a literal list.
    IsIn,
    /// `is_nan`
    IsNan,
    /// `is_null`
    IsNull,
    /// `is_valid`: the complement of `is_null`.
    IsValid,
}

impl FilterOp {
    /// Every supported operator, in documentation order.
    pub const ALL: [FilterOp; 11] = [
        FilterOp::Eq,
        FilterOp::NotEq,
        FilterOp::Lt,
        FilterOp::LtEq,
        FilterOp::Gt,
        FilterOp::GtEq,
        FilterOp::Contains,
        FilterOp::IsIn,
        FilterOp::IsNan,
        FilterOp::IsNull,
        FilterOp::IsValid,
    ];

    /// Symbol as written in a triplet.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FilterOp::Eq => "==",
            FilterOp::NotEq => "!=",
            FilterOp::Lt => "<",
            FilterOp::LtEq => "<=",
            FilterOp::Gt => ">",
            FilterOp::GtEq => ">=",
            FilterOp::Contains => "contains",
            FilterOp::IsIn => "isin",
            FilterOp::IsNan => "is_nan",
            FilterOp::IsNull => "is_null",
            FilterOp::IsValid => "is_valid",
        }
    }

    fn comparison(self) -> Option<ComparisonOp> {
        match self {
            FilterOp::Eq => Some(ComparisonOp::Equal),
            FilterOp::NotEq => Some(ComparisonOp::NotEqual),
            FilterOp::Lt => Some(ComparisonOp::LessThan),
            FilterOp::LtEq => Some(ComparisonOp::LessThanOrEqual),
            FilterOp::Gt => Some(ComparisonOp::GreaterThan),
            FilterOp::GtEq => Some(ComparisonOp::GreaterThanOrEqual),
            _ => None,
        }
    }
}

impl FromStr for FilterOp {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterOp::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| FilterError::UnsupportedOperator(s.to_owned()))
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Right-hand side of a triplet.
#[derive(Clone, Debug, PartialEq)]
pub enum FilterValue {
    /// No value; used by the unary operators.
    Null,
    /// A single literal.
    Scalar(ScalarValue),
    /// A list of literals, for `isin` and `contains`.
    List(Vec<ScalarValue>),
}

impl FilterValue {
    fn into_list(self) -> Vec<ScalarValue> {
        match self {
            FilterValue::Null => vec![ScalarValue::Null],
            FilterValue::Scalar(value) => vec![value],
            FilterValue::List(values) => values,
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Null => f.write_str("null"),
            FilterValue::Scalar(value) => write!(f, "{value}"),
            FilterValue::List(values) => {
                f.write_str("[")?;
                for (idx, value) in values.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<ScalarValue> for FilterValue {
    fn from(value: ScalarValue) -> Self {
        if value.is_null() {
            FilterValue::Null
        } else {
            FilterValue::Scalar(value)
        }
    }
}

macro_rules! filter_value_from_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for FilterValue {
                fn from(value: $ty) -> Self {
                    FilterValue::from(ScalarValue::from(value))
                }
            }
        )*
    };
}

filter_value_from_scalar!(bool, i32, i64, u32, u64, f32, f64, String, &str);

impl<T> From<Vec<T>> for FilterValue
where
    T: Into<ScalarValue>,
{
    fn from(values: Vec<T>) -> Self {
        FilterValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T> From<Option<T>> for FilterValue
where
    T: Into<FilterValue>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(FilterValue::Null, Into::into)
    }
}

/// A single `(field, op, value)` condition.
#[derive(Clone, Debug, PartialEq)]
pub struct Triplet {
    /// Dotted column path.
    pub field: String,
    /// Operator symbol, validated when the triplet is lowered.
    pub op: String,
    /// Right-hand side.
    pub value: FilterValue,
}

impl Triplet {
    /// Creates a triplet.
    pub fn new<F, O, V>(field: F, op: O, value: V) -> Self
    where
        F: Into<String>,
        O: Into<String>,
        V: Into<FilterValue>,
    {
        Self {
            field: field.into(),
            op: op.into(),
            value: value.into(),
        }
    }

    /// Lowers the triplet into a single predicate leaf.
    pub fn to_predicate(&self) -> Result<Predicate, FilterError> {
        let op: FilterOp = self.op.parse()?;
        if self.field.is_empty() || self.field.split('.').any(str::is_empty) {
            return Err(FilterError::InvalidColumn(self.field.clone()));
        }
        let field = self.field.as_str();
        let builder = PredicateBuilder::leaf();
        let builder = match op {
            FilterOp::IsNull => builder.is_null(field),
            FilterOp::IsValid => builder.is_not_null(field),
            FilterOp::IsNan => builder.is_nan(field),
            FilterOp::IsIn => builder.in_list(field, self.value.clone().into_list()),
            FilterOp::Contains => match &self.value {
                FilterValue::Null => return Err(self.invalid_value("a non-null value")),
                value => builder.contains(field, value.clone().into_list()),
            },
            comparison => {
                let Some(cmp) = comparison.comparison() else {
                    return Err(FilterError::UnsupportedOperator(self.op.clone()));
                };
                match &self.value {
                    FilterValue::Null => builder.compare(field, cmp, ScalarValue::Null),
                    FilterValue::Scalar(value) => builder.compare(field, cmp, value.clone()),
                    FilterValue::List(_) => return Err(self.invalid_value("a scalar")),
                }
            }
        };
        Ok(builder.build())
    }

    fn invalid_value(&self, expected: &str) -> FilterError {
        FilterError::InvalidValue {
            value: self.value.to_string(),
            expected: expected.to_owned(),
        }
    }
}

impl fmt::Display for Triplet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.field, self.op, self.value)
    }
}

/// A triplet or an arbitrarily nested group of filters.
#[derive(Clone, Debug, PartialEq)]
pub enum FilterStructure {
    /// A single condition.
    Triplet(Triplet),
    /// A group whose combinator depends on its nesting depth.
    Group(Vec<FilterStructure>),
}

impl FilterStructure {
    /// Creates a bare triplet filter.
    pub fn triplet<F, O, V>(field: F, op: O, value: V) -> Self
    where
        F: Into<String>,
        O: Into<String>,
        V: Into<FilterValue>,
    {
        FilterStructure::Triplet(Triplet::new(field, op, value))
    }

    /// Creates a group from anything convertible into filters.
    pub fn group<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<FilterStructure>,
    {
        FilterStructure::Group(items.into_iter().map(Into::into).collect())
    }

    /// Parses a filter from its JSON form, e.g. `[["a", ">", 1], [["b", "==", "x"]]]`.
    pub fn from_json_str(input: &str) -> Result<Self, FilterError> {
        let value: Value = serde_json::from_str(input)
            .map_err(|err| FilterError::InvalidStructure(err.to_string()))?;
        Self::try_from(&value)
    }

    /// Lowers the structure into a predicate; the outermost group is an OR.
    pub fn to_predicate(&self) -> Result<Predicate, FilterError> {
        self.lower(0)
    }

    fn lower(&self, depth: usize) -> Result<Predicate, FilterError> {
        match self {
            FilterStructure::Triplet(triplet) => triplet.to_predicate(),
            FilterStructure::Group(items) => {
                if items.is_empty() {
                    return Err(FilterError::InvalidStructure(
                        "filter groups must not be empty".to_owned(),
                    ));
                }
                let children = items
                    .iter()
                    .map(|item| item.lower(depth + 1))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(if depth % 2 == 0 {
                    Predicate::or(children)
                } else {
                    Predicate::and(children)
                })
            }
        }
    }
}

impl From<Triplet> for FilterStructure {
    fn from(value: Triplet) -> Self {
        FilterStructure::Triplet(value)
    }
}

impl From<Vec<FilterStructure>> for FilterStructure {
    fn from(value: Vec<FilterStructure>) -> Self {
        FilterStructure::Group(value)
    }
}

impl<F, O, V> From<(F, O, V)> for FilterStructure
where
    F: Into<String>,
    O: Into<String>,
    V: Into<FilterValue>,
{
    fn from((field, op, value): (F, O, V)) -> Self {
        FilterStructure::triplet(field, op, value)
    }
}

impl TryFrom<&Value> for FilterStructure {
    type Error = FilterError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let Value::Array(items) = value else {
            return Err(FilterError::InvalidStructure(format!(
                "expected a triplet or a list of filters, found {value}"
            )));
        };
        match items.as_slice() {
            [Value::String(field), Value::String(op), rhs] => Ok(FilterStructure::Triplet(
                Triplet::new(field.as_str(), op.as_str(), json_filter_value(rhs)?),
            )),
            _ => items
                .iter()
                .map(FilterStructure::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map(FilterStructure::Group),
        }
    }
}

impl TryFrom<Value> for FilterStructure {
    type Error = FilterError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        FilterStructure::try_from(&value)
    }
}

fn json_filter_value(value: &Value) -> Result<FilterValue, FilterError> {
    match value {
        Value::Null => Ok(FilterValue::Null),
        Value::Array(items) => items
            .iter()
            .map(json_scalar)
            .collect::<Result<Vec<_>, _>>()
            .map(FilterValue::List),
        scalar => json_scalar(scalar).map(FilterValue::from),
    }
}

fn json_scalar(value: &Value) -> Result<ScalarValue, FilterError> {
    match value {
        Value::Null => Ok(ScalarValue::Null),
        Value::Bool(v) => Ok(ScalarValue::Boolean(*v)),
        Value::String(v) => Ok(ScalarValue::Utf8(v.clone())),
        Value::Number(number) => number
            .as_i64()
            .map(ScalarValue::Int64)
            .or_else(|| number.as_u64().map(ScalarValue::UInt64))
            .or_else(|| number.as_f64().map(ScalarValue::Float64))
            .ok_or_else(|| {
                FilterError::InvalidStructure(format!("unrepresentable number {number}"))
            }),
        other => Err(FilterError::InvalidStructure(format!(
            "filter values must be scalars or lists of scalars, found {other}"
        ))),
    }
}
