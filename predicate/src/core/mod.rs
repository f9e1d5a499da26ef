//! Core predicate structures shared by the filter lowering and the evaluator.

mod builder;
mod node;
mod operand;
mod value;
mod visitor;

pub use builder::PredicateBuilder;
pub use node::{ComparisonOp, Predicate, PredicateNode};
pub use operand::ColumnRef;
pub use value::ScalarValue;
pub use visitor::PredicateVisitor;
