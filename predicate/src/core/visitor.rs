use super::{Predicate, PredicateNode};

/// Visitor that walks predicate trees bottom-up and emits custom results.
pub trait PredicateVisitor {
    /// Error type used when evaluation fails.
    type Error;
    /// Concrete value type produced while walking the predicate.
    type Value;

    /// Evaluates a leaf predicate and returns its result.
    fn visit_leaf(&mut self, leaf: &PredicateNode) -> Result<Self::Value, Self::Error>;

    /// Combines an `AND` clause from the supplied child results.
    fn combine_and(&mut self, children: Vec<Self::Value>) -> Result<Self::Value, Self::Error>;

    /// Combines an `OR` clause from the supplied child results.
    fn combine_or(&mut self, children: Vec<Self::Value>) -> Result<Self::Value, Self::Error>;

    /// Visits the supplied predicate by walking the expression tree.
    fn visit_predicate(&mut self, predicate: &Predicate) -> Result<Self::Value, Self::Error> {
        self.visit_node(predicate.kind())
    }

    /// Internal helper that evaluates a predicate node recursively.
    fn visit_node(&mut self, node: &PredicateNode) -> Result<Self::Value, Self::Error> {
        match node {
            PredicateNode::And(clauses) => {
                debug_assert!(
                    !clauses.is_empty(),
                    "Predicate::and enforces at least one clause"
                );
                let mut children = Vec::with_capacity(clauses.len());
                for clause in clauses {
                    children.push(self.visit_predicate(clause)?);
                }
                self.combine_and(children)
            }
            PredicateNode::Or(clauses) => {
                debug_assert!(
                    !clauses.is_empty(),
                    "Predicate::or enforces at least one clause"
                );
                let mut children = Vec::with_capacity(clauses.len());
                for clause in clauses {
                    children.push(self.visit_predicate(clause)?);
                }
                self.combine_or(children)
            }
            leaf => {
                debug_assert!(leaf.is_leaf(), "non-leaf nodes handled earlier");
                self.visit_leaf(leaf)
            }
        }
    }
}
