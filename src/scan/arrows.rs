use arrow::{datatypes::Schema, error::ArrowError};
use geoplaces_predicate::{evaluate, Predicate, PredicateNode};
use parquet::{
    arrow::{
        arrow_reader::{ArrowPredicate, ArrowPredicateFn, RowFilter},
        ProjectionMask,
    },
    schema::types::SchemaDescriptor,
};

use crate::error::{translate_arrow, Result};

/// Builds the parquet row filter for `predicate`.
///
/// Each conjunct becomes its own [`ArrowPredicate`] reading only the root
/// columns it references, so later conjuncts decode only the rows that
/// survived earlier ones.
pub(crate) fn row_filter(
    schema_descriptor: &SchemaDescriptor,
    file_schema: &Schema,
    predicate: &Predicate,
) -> Result<RowFilter> {
    let conjuncts = match predicate.kind() {
        PredicateNode::And(children) => children.clone(),
        _ => vec![predicate.clone()],
    };

    let mut predictions: Vec<Box<dyn ArrowPredicate>> = Vec::with_capacity(conjuncts.len());
    for conjunct in conjuncts {
        let roots = root_indices(file_schema, conjunct.root_columns())?;
        predictions.push(Box::new(ArrowPredicateFn::new(
            ProjectionMask::roots(schema_descriptor, roots),
            move |record_batch| {
                evaluate(&conjunct, &record_batch)
                    .map_err(|err| ArrowError::ExternalError(Box::new(err)))
            },
        )));
    }
    Ok(RowFilter::new(predictions))
}

/// Positions of the named root columns in `file_schema`.
pub(crate) fn root_indices<I, S>(file_schema: &Schema, names: I) -> Result<Vec<usize>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| file_schema.index_of(name.as_ref()).map_err(translate_arrow))
        .collect()
}

#[cfg(test)]
mod tests {
    use arrow::datatypes::{DataType, Field};

    use super::*;
    use crate::error::Error;

    #[test]
    fn unknown_root_is_an_invalid_column() {
        let schema = Schema::new(vec![Field::new("name", DataType::Utf8, true)]);
        assert_eq!(root_indices(&schema, ["name"]).unwrap(), vec![0]);
        assert!(matches!(
            root_indices(&schema, ["nmae"]),
            Err(Error::InvalidColumn(name)) if name == "nmae"
        ));
    }
}
