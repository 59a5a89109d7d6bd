//! Scalar expression trees attached to plan nodes
//!
//! Expressions are strict trees: every child is owned by exactly one
//! parent. Equality and hashing are structural and derived over the
//! variant, so two independently built trees with the same shape and
//! payloads are equal and hash identically. Cloning is a deep copy.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::{ColumnOid, TableOid};
use crate::planner::error::{PlannerError, PlannerResult};
use crate::types::{TypeId, Value};

/// Expression type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpressionType {
    ValueConstant,
    ValueParameter,
    Star,
    ColumnValue,

    OperatorPlus,
    OperatorMinus,
    OperatorMultiply,
    OperatorDivide,
    OperatorUnaryMinus,
    OperatorNot,

    CompareEqual,
    CompareNotEqual,
    CompareLessThan,
    CompareGreaterThan,
    CompareLessThanOrEqualTo,
    CompareGreaterThanOrEqualTo,

    ConjunctionAnd,
    ConjunctionOr,

    AggregateCount,
    AggregateSum,
    AggregateMin,
    AggregateMax,
    AggregateAvg,

    Function,
}

impl ExpressionType {
    /// Check if this tag names an aggregate function
    pub fn is_aggregate(&self) -> bool {
        matches!(
            self,
            ExpressionType::AggregateCount
                | ExpressionType::AggregateSum
                | ExpressionType::AggregateMin
                | ExpressionType::AggregateMax
                | ExpressionType::AggregateAvg
        )
    }

    /// Check if this tag names a comparison
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            ExpressionType::CompareEqual
                | ExpressionType::CompareNotEqual
                | ExpressionType::CompareLessThan
                | ExpressionType::CompareGreaterThan
                | ExpressionType::CompareLessThanOrEqualTo
                | ExpressionType::CompareGreaterThanOrEqualTo
        )
    }

    /// Check if this tag belongs to a leaf variant rather than an operator
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            ExpressionType::ValueConstant
                | ExpressionType::ValueParameter
                | ExpressionType::Star
                | ExpressionType::ColumnValue
        )
    }

    /// Check if this tag names a boolean conjunction
    pub fn is_conjunction(&self) -> bool {
        matches!(self, ExpressionType::ConjunctionAnd | ExpressionType::ConjunctionOr)
    }

    /// Short operator symbol used in EXPLAIN output
    pub fn symbol(&self) -> &'static str {
        match self {
            ExpressionType::ValueConstant => "CONST",
            ExpressionType::ValueParameter => "PARAM",
            ExpressionType::Star => "*",
            ExpressionType::ColumnValue => "COLUMN",
            ExpressionType::OperatorPlus => "+",
            ExpressionType::OperatorMinus | ExpressionType::OperatorUnaryMinus => "-",
            ExpressionType::OperatorMultiply => "*",
            ExpressionType::OperatorDivide => "/",
            ExpressionType::OperatorNot => "NOT",
            ExpressionType::CompareEqual => "=",
            ExpressionType::CompareNotEqual => "<>",
            ExpressionType::CompareLessThan => "<",
            ExpressionType::CompareGreaterThan => ">",
            ExpressionType::CompareLessThanOrEqualTo => "<=",
            ExpressionType::CompareGreaterThanOrEqualTo => ">=",
            ExpressionType::ConjunctionAnd => "AND",
            ExpressionType::ConjunctionOr => "OR",
            ExpressionType::AggregateCount => "COUNT",
            ExpressionType::AggregateSum => "SUM",
            ExpressionType::AggregateMin => "MIN",
            ExpressionType::AggregateMax => "MAX",
            ExpressionType::AggregateAvg => "AVG",
            ExpressionType::Function => "FUNC",
        }
    }
}

/// Scalar expression node
///
/// An `Operator` never carries a leaf tag; deserialization rejects one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(
    tag = "expression_type",
    rename_all = "SCREAMING_SNAKE_CASE",
    try_from = "ExpressionRepr"
)]
pub enum Expression {
    /// Literal value; its result type is the value's type
    Constant { value: Value },

    /// Placeholder for the `value_idx`-th statement parameter
    Parameter { value_idx: u32 },

    /// `*`, as in `COUNT(*)`
    Star,

    /// Reference to a table column
    ColumnValue {
        table_oid: TableOid,
        column_oid: ColumnOid,
        return_type: TypeId,
    },

    /// Operator, comparison, conjunction, aggregate or function call
    Operator {
        op: ExpressionType,
        return_type: TypeId,
        children: Vec<Expression>,
    },
}

/// Wire shape of [`Expression`], checked on the way in
#[derive(Deserialize)]
#[serde(tag = "expression_type", rename_all = "SCREAMING_SNAKE_CASE")]
enum ExpressionRepr {
    Constant {
        value: Value,
    },
    Parameter {
        value_idx: u32,
    },
    Star,
    ColumnValue {
        table_oid: TableOid,
        column_oid: ColumnOid,
        return_type: TypeId,
    },
    Operator {
        op: ExpressionType,
        return_type: TypeId,
        children: Vec<Expression>,
    },
}

impl TryFrom<ExpressionRepr> for Expression {
    type Error = String;

    fn try_from(repr: ExpressionRepr) -> Result<Self, String> {
        Ok(match repr {
            ExpressionRepr::Constant { value } => Expression::Constant { value },
            ExpressionRepr::Parameter { value_idx } => Expression::Parameter { value_idx },
            ExpressionRepr::Star => Expression::Star,
            ExpressionRepr::ColumnValue {
                table_oid,
                column_oid,
                return_type,
            } => Expression::ColumnValue {
                table_oid,
                column_oid,
                return_type,
            },
            ExpressionRepr::Operator {
                op,
                return_type,
                children,
            } => {
                if op.is_leaf() {
                    return Err(leaf_operator_message(op));
                }
                Expression::Operator {
                    op,
                    return_type,
                    children,
                }
            }
        })
    }
}

fn leaf_operator_message(op: ExpressionType) -> String {
    format!("{:?} is a leaf expression type, not an operator", op)
}

impl Expression {
    pub fn constant(value: impl Into<Value>) -> Self {
        Expression::Constant {
            value: value.into(),
        }
    }

    pub fn parameter(value_idx: u32) -> Self {
        Expression::Parameter { value_idx }
    }

    pub fn star() -> Self {
        Expression::Star
    }

    pub fn column(table_oid: TableOid, column_oid: ColumnOid, return_type: TypeId) -> Self {
        Expression::ColumnValue {
            table_oid,
            column_oid,
            return_type,
        }
    }

    /// Operator node. Fails with [`PlannerError::BuilderValidation`] for a
    /// leaf tag such as `Star` or `ValueConstant`.
    pub fn operator(
        op: ExpressionType,
        return_type: TypeId,
        children: Vec<Expression>,
    ) -> PlannerResult<Self> {
        if op.is_leaf() {
            return Err(PlannerError::BuilderValidation(leaf_operator_message(op)));
        }
        Ok(Expression::Operator {
            op,
            return_type,
            children,
        })
    }

    /// Binary comparison producing a boolean
    pub fn compare(op: ExpressionType, left: Expression, right: Expression) -> PlannerResult<Self> {
        Self::operator(op, TypeId::Boolean, vec![left, right])
    }

    /// Conjunction of two predicates
    pub fn and(left: Expression, right: Expression) -> Self {
        Expression::Operator {
            op: ExpressionType::ConjunctionAnd,
            return_type: TypeId::Boolean,
            children: vec![left, right],
        }
    }

    /// Expression type tag
    pub fn expression_type(&self) -> ExpressionType {
        match self {
            Expression::Constant { .. } => ExpressionType::ValueConstant,
            Expression::Parameter { .. } => ExpressionType::ValueParameter,
            Expression::Star => ExpressionType::Star,
            Expression::ColumnValue { .. } => ExpressionType::ColumnValue,
            Expression::Operator { op, .. } => *op,
        }
    }

    /// Type of the value this expression produces
    pub fn return_value_type(&self) -> TypeId {
        match self {
            Expression::Constant { value } => value.type_id(),
            Expression::Parameter { .. } => TypeId::ParameterOffset,
            Expression::Star => TypeId::Invalid,
            Expression::ColumnValue { return_type, .. }
            | Expression::Operator { return_type, .. } => *return_type,
        }
    }

    /// Owned children, empty for leaves
    pub fn children(&self) -> &[Expression] {
        match self {
            Expression::Operator { children, .. } => children,
            _ => &[],
        }
    }

    pub fn child(&self, idx: usize) -> Option<&Expression> {
        self.children().get(idx)
    }

    /// Height of the tree; leaves have depth 1
    pub fn depth(&self) -> usize {
        1 + self.children().iter().map(Expression::depth).max().unwrap_or(0)
    }

    /// Visit this expression and all descendants in pre-order
    pub fn walk<F: FnMut(&Expression)>(&self, f: &mut F) {
        f(self);
        for child in self.children() {
            child.walk(f);
        }
    }

    /// Find an operator node carrying a leaf tag anywhere in the tree
    pub(crate) fn check_operators(&self) -> Result<(), String> {
        let mut bad = None;
        self.walk(&mut |e| {
            if let Expression::Operator { op, .. } = e {
                if op.is_leaf() && bad.is_none() {
                    bad = Some(*op);
                }
            }
        });
        match bad {
            Some(op) => Err(leaf_operator_message(op)),
            None => Ok(()),
        }
    }

    /// Check if any node in the tree is a parameter placeholder
    pub fn has_parameters(&self) -> bool {
        let mut found = false;
        self.walk(&mut |e| {
            if matches!(e, Expression::Parameter { .. }) {
                found = true;
            }
        });
        found
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Constant { value } => write!(f, "{}", value),
            Expression::Parameter { value_idx } => write!(f, "${}", value_idx),
            Expression::Star => write!(f, "*"),
            Expression::ColumnValue {
                table_oid,
                column_oid,
                ..
            } => write!(f, "#{}.{}", table_oid, column_oid),
            Expression::Operator { op, children, .. } => match children.as_slice() {
                [left, right] if !op.is_aggregate() && *op != ExpressionType::Function => {
                    write!(f, "({} {} {})", left, op.symbol(), right)
                }
                _ => {
                    write!(f, "{}(", op.symbol())?;
                    for (i, child) in children.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", child)?;
                    }
                    write!(f, ")")
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    use super::*;

    fn hash_of(e: &Expression) -> u64 {
        let mut hasher = DefaultHasher::new();
        e.hash(&mut hasher);
        hasher.finish()
    }

    fn age_gt(n: i32) -> Expression {
        Expression::compare(
            ExpressionType::CompareGreaterThan,
            Expression::column(TableOid(1), ColumnOid(3), TypeId::Integer),
            Expression::constant(n),
        )
        .unwrap()
    }

    #[test]
    fn test_expression_types() {
        assert_eq!(Expression::constant(1).expression_type(), ExpressionType::ValueConstant);
        assert_eq!(Expression::constant(1).return_value_type(), TypeId::Integer);
        assert_eq!(Expression::parameter(0).return_value_type(), TypeId::ParameterOffset);
        assert_eq!(Expression::star().return_value_type(), TypeId::Invalid);
        assert_eq!(age_gt(1).expression_type(), ExpressionType::CompareGreaterThan);
        assert_eq!(age_gt(1).return_value_type(), TypeId::Boolean);
    }

    #[test]
    fn test_constant_equality() {
        assert_eq!(Expression::constant(5), Expression::constant(5));
        assert_ne!(Expression::constant(5), Expression::constant(6));
        // Same payload, different value type
        assert_ne!(Expression::constant(5), Expression::constant(5i64));
        assert_ne!(
            Expression::constant(Value::Null(TypeId::Integer)),
            Expression::constant(Value::Null(TypeId::Varchar))
        );
    }

    #[test]
    fn test_parameter_and_star_equality() {
        assert_eq!(Expression::parameter(2), Expression::parameter(2));
        assert_ne!(Expression::parameter(2), Expression::parameter(3));
        assert_eq!(Expression::star(), Expression::star());
        assert_eq!(hash_of(&Expression::star()), hash_of(&Expression::star()));
        assert_ne!(Expression::star(), Expression::parameter(0));
    }

    #[test]
    fn test_structural_hash_and_equality() {
        let a = age_gt(18);
        let b = age_gt(18);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));

        let c = age_gt(21);
        assert_ne!(a, c);
        assert_ne!(hash_of(&a), hash_of(&c));
    }

    #[test]
    fn test_clone_is_deep() {
        let a = Expression::and(age_gt(1), age_gt(2));
        let b = a.clone();
        assert_eq!(a, b);
        assert!(!std::ptr::eq(a.children().as_ptr(), b.children().as_ptr()));
    }

    #[test]
    fn test_walk_and_depth() {
        let e = Expression::and(age_gt(1), Expression::parameter(0));
        assert_eq!(e.depth(), 3);
        let mut count = 0;
        e.walk(&mut |_| count += 1);
        assert_eq!(count, 5);
        assert!(e.has_parameters());
        assert!(!age_gt(1).has_parameters());
    }

    #[test]
    fn test_display() {
        assert_eq!(age_gt(18).to_string(), "(#1.3 > 18)");
        let count = Expression::operator(
            ExpressionType::AggregateCount,
            TypeId::BigInt,
            vec![Expression::star()],
        )
        .unwrap();
        assert_eq!(count.to_string(), "COUNT(*)");
    }

    #[test]
    fn test_serde_tagged_form() {
        let json = serde_json::to_value(Expression::parameter(3)).unwrap();
        assert_eq!(json["expression_type"], "PARAMETER");
        assert_eq!(json["value_idx"], 3);

        let back: Expression = serde_json::from_value(json).unwrap();
        assert_eq!(back, Expression::parameter(3));
    }

    #[test]
    fn test_leaf_tags_are_not_operators() {
        for op in [
            ExpressionType::ValueConstant,
            ExpressionType::ValueParameter,
            ExpressionType::Star,
            ExpressionType::ColumnValue,
        ] {
            assert!(op.is_leaf());
            assert!(matches!(
                Expression::operator(op, TypeId::Integer, vec![]),
                Err(PlannerError::BuilderValidation(_))
            ));
        }
        assert!(!ExpressionType::AggregateCount.is_leaf());
        assert!(Expression::compare(
            ExpressionType::Star,
            Expression::constant(1),
            Expression::constant(2)
        )
        .is_err());
    }

    #[test]
    fn test_serde_rejects_leaf_operator() {
        let json = serde_json::json!({
            "expression_type": "OPERATOR",
            "op": "STAR",
            "return_type": "INVALID",
            "children": []
        });
        let err = serde_json::from_value::<Expression>(json).unwrap_err();
        assert!(err.to_string().contains("Star"), "{}", err);

        // Nested under a valid operator
        let json = serde_json::json!({
            "expression_type": "OPERATOR",
            "op": "CONJUNCTION_AND",
            "return_type": "BOOLEAN",
            "children": [
                {"expression_type": "PARAMETER", "value_idx": 0},
                {
                    "expression_type": "OPERATOR",
                    "op": "VALUE_CONSTANT",
                    "return_type": "INTEGER",
                    "children": []
                }
            ]
        });
        assert!(serde_json::from_value::<Expression>(json).is_err());

        let ok = serde_json::to_value(age_gt(3)).unwrap();
        assert_eq!(serde_json::from_value::<Expression>(ok).unwrap(), age_gt(3));
    }

    #[test]
    fn test_check_operators_finds_literal_leaf_tag() {
        let bad = Expression::and(
            age_gt(1),
            Expression::Operator {
                op: ExpressionType::ColumnValue,
                return_type: TypeId::Integer,
                children: vec![],
            },
        );
        assert!(bad.check_operators().is_err());
        assert!(age_gt(1).check_operators().is_ok());
    }
}
