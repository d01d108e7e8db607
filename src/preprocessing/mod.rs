/// Модуль подготовки входных данных

pub mod coordination;
pub mod expression;
pub mod properties;

pub use coordination::{CoordinationClassifier, CutoffClassifier, PrecomputedClassifier};
pub use expression::{Block, ColumnOp, Expr, Reduction, UnaryOp};
pub use properties::{ElementTable, PropertyLookup};
