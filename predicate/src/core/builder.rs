//! Builder for composing predicate trees.

use super::{ColumnRef, ComparisonOp, Predicate, PredicateNode, ScalarValue};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BuilderCombine {
    Leaf,
    Conjunction,
    Disjunction,
}

/// Builder for composing predicates incrementally.
#[derive(Debug)]
pub struct PredicateBuilder {
    combine: BuilderCombine,
    clauses: Vec<Predicate>,
}

impl PredicateBuilder {
    const fn new(combine: BuilderCombine) -> Self {
        Self {
            combine,
            clauses: Vec::new(),
        }
    }

    /// Creates a builder that expects a single clause.
    #[must_use]
    pub fn leaf() -> Self {
        Self::new(BuilderCombine::Leaf)
    }

    /// Creates a builder that emits an `AND` of all clauses.
    #[must_use]
    pub fn and() -> Self {
        Self::new(BuilderCombine::Conjunction)
    }

    /// Creates a builder that emits an `OR` of all clauses.
    #[must_use]
    pub fn or() -> Self {
        Self::new(BuilderCombine::Disjunction)
    }

    /// Adds an existing predicate to the builder.
    #[must_use]
    pub fn predicate(mut self, predicate: Predicate) -> Self {
        self.clauses.push(predicate);
        self
    }

    /// Adds a comparison predicate.
    #[must_use]
    pub fn compare<C, V>(mut self, column: C, op: ComparisonOp, value: V) -> Self
    where
        C: Into<ColumnRef>,
        V: Into<ScalarValue>,
    {
        self.push_leaf(PredicateNode::Compare {
            column: column.into(),
            op,
            value: value.into(),
        });
        self
    }

    /// Adds an equality predicate.
    #[must_use]
    pub fn equals<C, V>(self, column: C, value: V) -> Self
    where
        C: Into<ColumnRef>,
        V: Into<ScalarValue>,
    {
        self.compare(column, ComparisonOp::Equal, value)
    }

    /// Adds a `<` comparison predicate.
    #[must_use]
    pub fn less_than<C, V>(self, column: C, value: V) -> Self
    where
        C: Into<ColumnRef>,
        V: Into<ScalarValue>,
    {
        self.compare(column, ComparisonOp::LessThan, value)
    }

    /// Adds a `>` comparison predicate.
    #[must_use]
    pub fn greater_than<C, V>(self, column: C, value: V) -> Self
    where
        C: Into<ColumnRef>,
        V: Into<ScalarValue>,
    {
        self.compare(column, ComparisonOp::GreaterThan, value)
    }

    /// Adds an `IN` predicate.
    #[must_use]
    pub fn in_list<C, I>(mut self, column: C, list: I) -> Self
    where
        C: Into<ColumnRef>,
        I: IntoIterator<Item = ScalarValue>,
    {
        self.push_leaf(PredicateNode::InList {
            column: column.into(),
            list: list.into_iter().collect(),
            negated: false,
        });
        self
    }

    /// Adds an `IS NULL` predicate.
    #[must_use]
    pub fn is_null<C>(mut self, column: C) -> Self
    where
        C: Into<ColumnRef>,
    {
        self.push_leaf(PredicateNode::IsNull {
            column: column.into(),
            negated: false,
        });
        self
    }

    /// Adds an `IS NOT NULL` predicate.
    #[must_use]
    pub fn is_not_null<C>(mut self, column: C) -> Self
    where
        C: Into<ColumnRef>,
    {
        self.push_leaf(PredicateNode::IsNull {
            column: column.into(),
            negated: true,
        });
        self
    }

    /// Adds a NaN check.
    #[must_use]
    pub fn is_nan<C>(mut self, column: C) -> Self
    where
        C: Into<ColumnRef>,
    {
        self.push_leaf(PredicateNode::IsNaN {
            column: column.into(),
        });
        self
    }

    /// Adds a `contains` predicate over list elements or substrings.
    #[must_use]
    pub fn contains<C, I>(mut self, column: C, values: I) -> Self
    where
        C: Into<ColumnRef>,
        I: IntoIterator<Item = ScalarValue>,
    {
        self.push_leaf(PredicateNode::Contains {
            column: column.into(),
            values: values.into_iter().collect(),
        });
        self
    }

    fn branch<F>(mut self, combine: BuilderCombine, build: F) -> Self
    where
        F: FnOnce(PredicateBuilder) -> PredicateBuilder,
    {
        let predicate = build(PredicateBuilder::new(combine)).build();
        self.clauses.push(predicate);
        self
    }

    /// Adds a nested conjunction built by the supplied closure.
    #[must_use]
    pub fn and_group<F>(self, build: F) -> Self
    where
        F: FnOnce(PredicateBuilder) -> PredicateBuilder,
    {
        self.branch(BuilderCombine::Conjunction, build)
    }

    /// Adds a nested disjunction built by the supplied closure.
    #[must_use]
    pub fn or_group<F>(self, build: F) -> Self
    where
        F: FnOnce(PredicateBuilder) -> PredicateBuilder,
    {
        self.branch(BuilderCombine::Disjunction, build)
    }

    fn push_leaf(&mut self, leaf: PredicateNode) {
        self.clauses.push(Predicate::from_kind(leaf));
    }

    /// Consumes the builder and returns the composed predicate.
    ///
    /// # Panics
    ///
    /// Panics when no clause was added, or when a leaf builder holds more
    /// than one clause.
    #[must_use]
    pub fn build(self) -> Predicate {
        assert!(
            !self.clauses.is_empty(),
            "PredicateBuilder requires at least one clause"
        );
        match self.combine {
            BuilderCombine::Leaf => {
                assert!(
                    self.clauses.len() == 1,
                    "PredicateBuilder::leaf must contain exactly one clause"
                );
                Predicate::and(self.clauses)
            }
            BuilderCombine::Conjunction => Predicate::and(self.clauses),
            BuilderCombine::Disjunction => Predicate::or(self.clauses),
        }
    }
}

impl Default for PredicateBuilder {
    fn default() -> Self {
        Self::leaf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "PredicateBuilder requires at least one clause")]
    fn leaf_builder_requires_clause() {
        let _ = PredicateBuilder::leaf().build();
    }

    #[test]
    #[should_panic(expected = "PredicateBuilder::leaf must contain exactly one clause")]
    fn leaf_builder_rejects_multiple_clauses() {
        let _ = PredicateBuilder::leaf()
            .equals("col", 1_i64)
            .equals("col", 2_i64)
            .build();
    }

    #[test]
    #[should_panic(expected = "PredicateBuilder requires at least one clause")]
    fn or_builder_requires_clause() {
        let _ = PredicateBuilder::or().build();
    }

    #[test]
    fn groups_nest_under_the_outer_combinator() {
        let predicate = PredicateBuilder::or()
            .equals("kind", "cafe")
            .and_group(|group| group.greater_than("confidence", 0.5).is_not_null("name"))
            .build();
        let PredicateNode::Or(children) = predicate.kind() else {
            panic!("expected OR at the top");
        };
        assert_eq!(children.len(), 2);
        assert!(matches!(children[1].kind(), PredicateNode::And(inner) if inner.len() == 2));
    }
}
