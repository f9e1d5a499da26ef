//! Evaluation of predicates against Arrow record batches.

use std::{fmt::Display, sync::Arc};

use arrow::{
    array::{
        make_array, Array, ArrayRef, AsArray, BinaryArray, BooleanArray, Float64Array,
        GenericListArray, Int64Array, OffsetSizeTrait, Scalar, StringArray, UInt64Array,
    },
    buffer::{BooleanBuffer, NullBuffer},
    compute::{self, kernels::cmp},
    datatypes::{DataType, Float64Type},
    error::ArrowError,
    record_batch::RecordBatch,
};

use crate::{
    ColumnRef, ComparisonOp, FilterError, FilterStructure, Predicate, PredicateNode,
    PredicateVisitor, ScalarValue,
};

/// Evaluates `predicate` against `batch`, producing one mask slot per row.
///
/// Null slots in the mask mean "unknown" under Kleene logic and are treated as
/// unselected by [`filter_batch`] and by parquet row filters.
pub fn evaluate(predicate: &Predicate, batch: &RecordBatch) -> Result<BooleanArray, FilterError> {
    let mut evaluator = BatchEvaluator::new(batch);
    predicate.accept(&mut evaluator)
}

/// Keeps only the rows of `batch` selected by `predicate`.
pub fn filter_batch(predicate: &Predicate, batch: &RecordBatch) -> Result<RecordBatch, FilterError> {
    let mask = evaluate(predicate, batch)?;
    Ok(compute::filter_record_batch(batch, &mask)?)
}

impl FilterStructure {
    /// Lowers the structure and evaluates it against `batch`.
    pub fn evaluate(&self, batch: &RecordBatch) -> Result<BooleanArray, FilterError> {
        evaluate(&self.to_predicate()?, batch)
    }
}

/// [`PredicateVisitor`] producing boolean masks over a single batch.
pub struct BatchEvaluator<'a> {
    batch: &'a RecordBatch,
}

impl<'a> BatchEvaluator<'a> {
    /// Creates an evaluator bound to `batch`.
    #[must_use]
    pub fn new(batch: &'a RecordBatch) -> Self {
        Self { batch }
    }

    /// Resolves a dotted path, descending struct columns and folding parent
    /// validity into the child.
    fn resolve(&self, column: &ColumnRef) -> Result<ArrayRef, FilterError> {
        let invalid = || FilterError::InvalidColumn(column.name.to_string());
        let mut segments = column.segments();
        let root = segments.next().ok_or_else(invalid)?;
        let mut array = Arc::clone(self.batch.column_by_name(root).ok_or_else(invalid)?);
        for segment in segments {
            let parent = array.as_struct_opt().ok_or_else(invalid)?;
            let child = Arc::clone(parent.column_by_name(segment).ok_or_else(invalid)?);
            array = with_parent_nulls(child, parent.nulls())?;
        }
        Ok(array)
    }

    fn rows(&self) -> usize {
        self.batch.num_rows()
    }

    fn compare(
        &self,
        column: &ColumnRef,
        op: ComparisonOp,
        value: &ScalarValue,
    ) -> Result<BooleanArray, FilterError> {
        let array = self.resolve(column)?;
        if value.is_null() {
            return Ok(BooleanArray::new_null(self.rows()));
        }
        compare_values(&array, op, value).map_err(engine(column, value))
    }

    fn in_list(
        &self,
        column: &ColumnRef,
        list: &[ScalarValue],
        negated: bool,
    ) -> Result<BooleanArray, FilterError> {
        let array = self.resolve(column)?;
        let mut hits = any_equal(&array, list, column)?
            .unwrap_or_else(|| BooleanArray::from(vec![false; self.rows()]));
        if negated {
            hits = compute::not(&hits)?;
        }
        Ok(hits)
    }

    fn is_null(&self, column: &ColumnRef, negated: bool) -> Result<BooleanArray, FilterError> {
        let array = self.resolve(column)?;
        let mask = if negated {
            compute::is_not_null(array.as_ref())?
        } else {
            compute::is_null(array.as_ref())?
        };
        Ok(mask)
    }

    fn is_nan(&self, column: &ColumnRef) -> Result<BooleanArray, FilterError> {
        let array = self.resolve(column)?;
        match array.data_type() {
            DataType::Float16 | DataType::Float32 | DataType::Float64 => {
                let floats = compute::cast(&array, &DataType::Float64)?;
                Ok(floats
                    .as_primitive::<Float64Type>()
                    .iter()
                    .map(|value| value.map(f64::is_nan))
                    .collect())
            }
            data_type if data_type.is_numeric() => Ok((0..array.len())
                .map(|idx| array.is_valid(idx).then_some(false))
                .collect()),
            data_type => Err(not_applicable("is_nan", column, data_type)),
        }
    }

    fn contains(
        &self,
        column: &ColumnRef,
        values: &[ScalarValue],
    ) -> Result<BooleanArray, FilterError> {
        let array = self.resolve(column)?;
        match array.data_type() {
            DataType::List(_) => list_contains(array.as_list::<i32>(), values, column),
            DataType::LargeList(_) => list_contains(array.as_list::<i64>(), values, column),
            data_type if is_string_like(data_type) => string_contains(&array, values, column),
            data_type => Err(not_applicable("contains", column, data_type)),
        }
    }
}

impl PredicateVisitor for BatchEvaluator<'_> {
    type Error = FilterError;
    type Value = BooleanArray;

    fn visit_leaf(&mut self, leaf: &PredicateNode) -> Result<BooleanArray, FilterError> {
        match leaf {
            PredicateNode::Compare { column, op, value } => self.compare(column, *op, value),
            PredicateNode::InList {
                column,
                list,
                negated,
            } => self.in_list(column, list, *negated),
            PredicateNode::IsNull { column, negated } => self.is_null(column, *negated),
            PredicateNode::IsNaN { column } => self.is_nan(column),
            PredicateNode::Contains { column, values } => self.contains(column, values),
            PredicateNode::And(_) | PredicateNode::Or(_) => self.visit_node(leaf),
        }
    }

    fn combine_and(&mut self, children: Vec<BooleanArray>) -> Result<BooleanArray, FilterError> {
        fold_masks(children, self.rows(), compute::and_kleene)
    }

    fn combine_or(&mut self, children: Vec<BooleanArray>) -> Result<BooleanArray, FilterError> {
        fold_masks(children, self.rows(), compute::or_kleene)
    }
}

fn fold_masks(
    children: Vec<BooleanArray>,
    rows: usize,
    combine: fn(&BooleanArray, &BooleanArray) -> Result<BooleanArray, ArrowError>,
) -> Result<BooleanArray, FilterError> {
    let mut children = children.into_iter();
    let Some(mut acc) = children.next() else {
        return Ok(BooleanArray::new_null(rows));
    };
    for child in children {
        acc = combine(&acc, &child)?;
    }
    Ok(acc)
}

fn with_parent_nulls(
    child: ArrayRef,
    parent: Option<&NullBuffer>,
) -> Result<ArrayRef, FilterError> {
    if parent.is_none() {
        return Ok(child);
    }
    let nulls = NullBuffer::union(parent, child.nulls());
    let data = child.to_data().into_builder().nulls(nulls).build()?;
    Ok(make_array(data))
}

/// Compares `array` against a literal, coercing both sides to a shared type.
///
/// Unsigned columns meet non-negative integer literals as `UInt64`, other
/// integer pairs meet as `Int64`, and anything involving a float meets as
/// `Float64` under IEEE 754 rules: NaN is unordered and `-0.0 == 0.0`. Every
/// string encoding meets as `Utf8`. Anything else is handed to the kernel
/// untouched, which reports the type mismatch.
fn compare_values(
    array: &ArrayRef,
    op: ComparisonOp,
    value: &ScalarValue,
) -> Result<BooleanArray, ArrowError> {
    if let ScalarValue::Int64(v) = value {
        if *v < 0 && array.data_type().is_unsigned_integer() {
            return Ok(below_unsigned(array, op));
        }
    }
    let (left, literal) = coerce(array, value)?;
    if let (Some(left), Some(right)) = (
        left.as_primitive_opt::<Float64Type>(),
        literal.as_primitive_opt::<Float64Type>(),
    ) {
        return Ok(compare_floats(left, op, right.value(0)));
    }
    let right = Scalar::new(literal);
    match op {
        ComparisonOp::Equal => cmp::eq(&left, &right),
        ComparisonOp::NotEqual => cmp::neq(&left, &right),
        ComparisonOp::LessThan => cmp::lt(&left, &right),
        ComparisonOp::LessThanOrEqual => cmp::lt_eq(&left, &right),
        ComparisonOp::GreaterThan => cmp::gt(&left, &right),
        ComparisonOp::GreaterThanOrEqual => cmp::gt_eq(&left, &right),
    }
}

/// Arrow's float kernels order by `total_cmp`; filters follow IEEE 754.
fn compare_floats(left: &Float64Array, op: ComparisonOp, right: f64) -> BooleanArray {
    let test: fn(f64, f64) -> bool = match op {
        ComparisonOp::Equal => |l, r| l == r,
        ComparisonOp::NotEqual => |l, r| l != r,
        ComparisonOp::LessThan => |l, r| l < r,
        ComparisonOp::LessThanOrEqual => |l, r| l <= r,
        ComparisonOp::GreaterThan => |l, r| l > r,
        ComparisonOp::GreaterThanOrEqual => |l, r| l >= r,
    };
    left.iter()
        .map(|value| value.map(|value| test(value, right)))
        .collect()
}

/// Every valid slot of an unsigned column lies above a negative literal.
fn below_unsigned(array: &ArrayRef, op: ComparisonOp) -> BooleanArray {
    let above = matches!(
        op,
        ComparisonOp::NotEqual | ComparisonOp::GreaterThan | ComparisonOp::GreaterThanOrEqual
    );
    let values = if above {
        BooleanBuffer::new_set(array.len())
    } else {
        BooleanBuffer::new_unset(array.len())
    };
    BooleanArray::new(values, array.nulls().cloned())
}

fn coerce(array: &ArrayRef, value: &ScalarValue) -> Result<(ArrayRef, ArrayRef), ArrowError> {
    let data_type = array.data_type();
    let literal: ArrayRef = match value {
        ScalarValue::Int64(_) | ScalarValue::UInt64(_) | ScalarValue::Float64(_)
            if data_type.is_numeric() =>
        {
            let integer: Option<(DataType, ArrayRef)> = match value {
                ScalarValue::Int64(v) if data_type.is_unsigned_integer() => u64::try_from(*v)
                    .ok()
                    .map(|v| (DataType::UInt64, Arc::new(UInt64Array::from(vec![v])) as ArrayRef)),
                ScalarValue::UInt64(v) if data_type.is_unsigned_integer() => Some((
                    DataType::UInt64,
                    Arc::new(UInt64Array::from(vec![*v])) as ArrayRef,
                )),
                ScalarValue::Int64(v) if data_type.is_integer() => Some((
                    DataType::Int64,
                    Arc::new(Int64Array::from(vec![*v])) as ArrayRef,
                )),
                ScalarValue::UInt64(v) if data_type.is_integer() => i64::try_from(*v)
                    .ok()
                    .map(|v| (DataType::Int64, Arc::new(Int64Array::from(vec![v])) as ArrayRef)),
                _ => None,
            };
            return match integer {
                Some((domain, literal)) => Ok((compute::cast(array, &domain)?, literal)),
                None => Ok((
                    compute::cast(array, &DataType::Float64)?,
                    Arc::new(Float64Array::from(vec![value.as_f64().unwrap_or(f64::NAN)]))
                        as ArrayRef,
                )),
            };
        }
        ScalarValue::Utf8(v) if is_string_like(data_type) => {
            return Ok((
                compute::cast(array, &DataType::Utf8)?,
                Arc::new(StringArray::from(vec![v.as_str()])) as ArrayRef,
            ));
        }
        ScalarValue::Binary(v) if is_binary_like(data_type) => {
            return Ok((
                compute::cast(array, &DataType::Binary)?,
                Arc::new(BinaryArray::from(vec![v.as_slice()])) as ArrayRef,
            ));
        }
        other => other.to_array(),
    };
    Ok((Arc::clone(array), literal))
}

fn any_equal(
    array: &ArrayRef,
    values: &[ScalarValue],
    column: &ColumnRef,
) -> Result<Option<BooleanArray>, FilterError> {
    let mut hits: Option<BooleanArray> = None;
    for value in values.iter().filter(|value| !value.is_null()) {
        let mask =
            compare_values(array, ComparisonOp::Equal, value).map_err(engine(column, value))?;
        hits = Some(match hits {
            Some(acc) => compute::or_kleene(&acc, &mask)?,
            None => mask,
        });
    }
    Ok(hits)
}

fn list_contains<O: OffsetSizeTrait>(
    list: &GenericListArray<O>,
    values: &[ScalarValue],
    column: &ColumnRef,
) -> Result<BooleanArray, FilterError> {
    let hits = any_equal(list.values(), values, column)?;
    let offsets = list.value_offsets();
    Ok((0..list.len())
        .map(|row| {
            if list.is_null(row) {
                return None;
            }
            let Some(hits) = hits.as_ref() else {
                return Some(false);
            };
            let (start, end) = (offsets[row].as_usize(), offsets[row + 1].as_usize());
            Some((start..end).any(|idx| hits.is_valid(idx) && hits.value(idx)))
        })
        .collect())
}

fn string_contains(
    array: &ArrayRef,
    values: &[ScalarValue],
    column: &ColumnRef,
) -> Result<BooleanArray, FilterError> {
    let needles = values
        .iter()
        .filter(|value| !value.is_null())
        .map(|value| match value {
            ScalarValue::Utf8(needle) => Ok(needle.as_str()),
            other => Err(FilterError::InvalidValue {
                value: other.to_string(),
                expected: array.data_type().to_string(),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;
    let strings = compute::cast(array, &DataType::Utf8).map_err(engine(column, &"contains"))?;
    Ok(strings
        .as_string::<i32>()
        .iter()
        .map(|haystack| haystack.map(|haystack| needles.iter().any(|n| haystack.contains(n))))
        .collect())
}

fn is_string_like(data_type: &DataType) -> bool {
    match data_type {
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => true,
        DataType::Dictionary(_, values) => is_string_like(values),
        _ => false,
    }
}

fn is_binary_like(data_type: &DataType) -> bool {
    match data_type {
        DataType::Binary | DataType::LargeBinary | DataType::BinaryView => true,
        DataType::Dictionary(_, values) => is_binary_like(values),
        _ => false,
    }
}

fn engine<'a, L>(column: &'a ColumnRef, literal: &'a L) -> impl FnOnce(ArrowError) -> FilterError + 'a
where
    L: Display + ?Sized,
{
    move |source| FilterError::Engine {
        column: column.name.to_string(),
        literal: literal.to_string(),
        source,
    }
}

fn not_applicable(op: &str, column: &ColumnRef, data_type: &DataType) -> FilterError {
    FilterError::OperatorNotApplicable {
        op: op.to_owned(),
        column: column.name.to_string(),
        data_type: data_type.clone(),
    }
}
