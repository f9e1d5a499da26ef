use std::{collections::BTreeSet, fmt};

use super::{ColumnRef, PredicateVisitor, ScalarValue};

/// Comparison operator used by binary predicates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    /// Equals (`==`).
    Equal,
    /// Not equals (`!=`).
    NotEqual,
    /// Less than (`<`).
    LessThan,
    /// Less than or equal to (`<=`).
    LessThanOrEqual,
    /// Greater than (`>`).
    GreaterThan,
    /// Greater than or equal to (`>=`).
    GreaterThanOrEqual,
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ComparisonOp::Equal => "==",
            ComparisonOp::NotEqual => "!=",
            ComparisonOp::LessThan => "<",
            ComparisonOp::LessThanOrEqual => "<=",
            ComparisonOp::GreaterThan => ">",
            ComparisonOp::GreaterThanOrEqual => ">=",
        })
    }
}

/// Recursive predicate node; leaf and branch variants coexist.
#[derive(Clone, Debug, PartialEq)]
pub enum PredicateNode {
    /// Binary comparison between a column and a literal.
    Compare {
        /// Column under test.
        column: ColumnRef,
        /// Operator.
        op: ComparisonOp,
        /// Literal right-hand side.
        value: ScalarValue,
    },
    /// Membership test against a literal list.
    InList {
        /// Column under test.
        column: ColumnRef,
        /// Literal candidates.
        list: Vec<ScalarValue>,
        /// True when representing `NOT IN`.
        negated: bool,
    },
    /// Null check (`IS NULL` / `IS NOT NULL`).
    IsNull {
        /// Column under inspection.
        column: ColumnRef,
        /// True when representing `IS NOT NULL`.
        negated: bool,
    },
    /// Floating point NaN check.
    IsNaN {
        /// Column under inspection.
        column: ColumnRef,
    },
    /// Element membership for list columns, substring match for string columns.
    Contains {
        /// Column under inspection.
        column: ColumnRef,
        /// Needles; any match selects the row.
        values: Vec<ScalarValue>,
    },
    /// Conjunction over multiple predicates.
    And(Vec<Predicate>),
    /// Disjunction over multiple predicates.
    Or(Vec<Predicate>),
}

impl PredicateNode {
    /// Returns true when the node has no child predicates.
    #[must_use]
    pub(crate) fn is_leaf(&self) -> bool {
        !matches!(self, PredicateNode::And(_) | PredicateNode::Or(_))
    }

    /// Column referenced by a leaf node.
    #[must_use]
    pub fn column(&self) -> Option<&ColumnRef> {
        match self {
            PredicateNode::Compare { column, .. }
            | PredicateNode::InList { column, .. }
            | PredicateNode::IsNull { column, .. }
            | PredicateNode::IsNaN { column }
            | PredicateNode::Contains { column, .. } => Some(column),
            PredicateNode::And(_) | PredicateNode::Or(_) => None,
        }
    }
}

/// Logical predicate evaluated against Arrow record batches.
#[derive(Clone, Debug, PartialEq)]
pub struct Predicate {
    kind: PredicateNode,
}

impl Predicate {
    /// Returns a reference to the underlying node.
    #[must_use]
    pub fn kind(&self) -> &PredicateNode {
        &self.kind
    }

    /// Builds a conjunction from the supplied clauses, flattening nested `AND`s.
    ///
    /// # Panics
    ///
    /// Panics if no clauses are provided.
    #[must_use]
    pub fn and<I>(clauses: I) -> Self
    where
        I: IntoIterator<Item = Predicate>,
    {
        let mut acc = Vec::new();
        for clause in clauses {
            match clause.into_kind() {
                PredicateNode::And(mut nested) => acc.append(&mut nested),
                other => acc.push(Predicate::from_kind(other)),
            }
        }
        Self::collapse(acc, PredicateNode::And, "Predicate::and requires at least one clause")
    }

    /// Builds a disjunction from the supplied clauses, flattening nested `OR`s.
    ///
    /// # Panics
    ///
    /// Panics if no clauses are provided.
    #[must_use]
    pub fn or<I>(clauses: I) -> Self
    where
        I: IntoIterator<Item = Predicate>,
    {
        let mut acc = Vec::new();
        for clause in clauses {
            match clause.into_kind() {
                PredicateNode::Or(mut nested) => acc.append(&mut nested),
                other => acc.push(Predicate::from_kind(other)),
            }
        }
        Self::collapse(acc, PredicateNode::Or, "Predicate::or requires at least one clause")
    }

    /// Conjunction of `self` and `other`.
    #[must_use]
    pub fn and_with(self, other: Predicate) -> Self {
        Self::and([self, other])
    }

    /// Root column names referenced anywhere in the tree.
    ///
    /// Nested paths contribute their top-level column, which is the unit a
    /// parquet projection mask works with.
    #[must_use]
    pub fn root_columns(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        collect_root_columns(self, &mut out);
        out
    }

    /// Walks the predicate with the supplied visitor.
    pub fn accept<V>(&self, visitor: &mut V) -> Result<V::Value, V::Error>
    where
        V: PredicateVisitor + ?Sized,
    {
        visitor.visit_predicate(self)
    }

    /// Consumes the predicate and returns its node.
    #[must_use]
    pub fn into_kind(self) -> PredicateNode {
        self.kind
    }

    pub(crate) fn from_kind(kind: PredicateNode) -> Self {
        Self { kind }
    }

    fn collapse(
        mut acc: Vec<Predicate>,
        wrap: fn(Vec<Predicate>) -> PredicateNode,
        message: &str,
    ) -> Self {
        assert!(!acc.is_empty(), "{message}");
        if acc.len() == 1 {
            if let Some(only) = acc.pop() {
                return only;
            }
        }
        Self::from_kind(wrap(acc))
    }
}

fn collect_root_columns(predicate: &Predicate, out: &mut BTreeSet<String>) {
    match predicate.kind() {
        PredicateNode::And(children) | PredicateNode::Or(children) => {
            for child in children {
                collect_root_columns(child, out);
            }
        }
        leaf => {
            if let Some(column) = leaf.column() {
                out.insert(column.root().to_owned());
            }
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            PredicateNode::Compare { column, op, value } => write!(f, "{column} {op} {value}"),
            PredicateNode::InList {
                column,
                list,
                negated,
            } => {
                write!(f, "{column} {}IN (", if *negated { "NOT " } else { "" })?;
                write_joined(f, list, ", ")?;
                f.write_str(")")
            }
            PredicateNode::IsNull { column, negated } => {
                write!(f, "{column} IS {}NULL", if *negated { "NOT " } else { "" })
            }
            PredicateNode::IsNaN { column } => write!(f, "{column} IS NAN"),
            PredicateNode::Contains { column, values } => {
                write!(f, "{column} CONTAINS (")?;
                write_joined(f, values, ", ")?;
                f.write_str(")")
            }
            PredicateNode::And(children) => {
                f.write_str("(")?;
                write_joined(f, children, " AND ")?;
                f.write_str(")")
            }
            PredicateNode::Or(children) => {
                f.write_str("(")?;
                write_joined(f, children, " OR ")?;
                f.write_str(")")
            }
        }
    }
}

fn write_joined<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    items: &[T],
    separator: &str,
) -> fmt::Result {
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gt(column: &str, value: f64) -> Predicate {
        Predicate::from_kind(PredicateNode::Compare {
            column: ColumnRef::new(column),
            op: ComparisonOp::GreaterThan,
            value: ScalarValue::Float64(value),
        })
    }

    #[test]
    fn and_flattens_nested_conjunctions() {
        let nested = Predicate::and([gt("a", 1.0), gt("b", 2.0)]);
        let flat = Predicate::and([nested, gt("c", 3.0)]);
        match flat.kind() {
            PredicateNode::And(children) => assert_eq!(children.len(), 3),
            other => panic!("expected AND, got {other:?}"),
        }
    }

    #[test]
    fn single_clause_collapses_to_itself() {
        assert_eq!(Predicate::or([gt("a", 1.0)]), gt("a", 1.0));
    }

    #[test]
    #[should_panic(expected = "requires at least one clause")]
    fn empty_conjunction_panics() {
        let _ = Predicate::and(Vec::new());
    }

    #[test]
    fn root_columns_keep_top_level_names() {
        let predicate = Predicate::or([gt("bbox.xmin", 1.0), gt("confidence", 0.5)]);
        let columns: Vec<_> = predicate.root_columns().into_iter().collect();
        assert_eq!(columns, vec!["bbox".to_owned(), "confidence".to_owned()]);
    }

    #[test]
    fn display_renders_infix() {
        let predicate = Predicate::or([gt("a", 1.0), Predicate::and([gt("b", 2.0), gt("c", 3.0)])]);
        assert_eq!(predicate.to_string(), "(a > 1 OR (b > 2 AND c > 3))");
    }
}
