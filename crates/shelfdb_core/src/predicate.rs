//! Comparison predicates and the ranges built from them.
//!
//! Ranges are built with the free constructor functions of this module:
//!
//! ```
//! use shelfdb_core::predicate::{crange, eq, gt, range};
//!
//! let adults = gt(17);
//! let teens = range(13, 20);    // 13 <= key < 20
//! let decade = crange(20, 29);  // 20 <= key <= 29
//! let exact = eq("alice");
//! assert_eq!(teens.predicates().len(), 2);
//! # let _ = (adults, decade, exact);
//! ```
//!
//! Constructors never validate operand types. Incompatible comparisons are
//! detected when a range is evaluated against a key.

use crate::error::{CoreError, CoreResult};
use crate::value::Value;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Comparison operator of a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `==`
    Eq,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl Operator {
    /// Returns the operator symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
        }
    }

    /// Returns true for `>` and `>=`.
    pub fn is_lower_bound(self) -> bool {
        matches!(self, Operator::Gt | Operator::Ge)
    }

    /// Returns true for `<` and `<=`.
    pub fn is_upper_bound(self) -> bool {
        matches!(self, Operator::Lt | Operator::Le)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Operator {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "==" => Ok(Operator::Eq),
            "<" => Ok(Operator::Lt),
            "<=" => Ok(Operator::Le),
            ">" => Ok(Operator::Gt),
            ">=" => Ok(Operator::Ge),
            other => Err(CoreError::invalid_range(format!(
                "unknown operator {other:?}"
            ))),
        }
    }
}

/// One comparison: operator plus operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    operator: Operator,
    operand: Value,
}

impl Predicate {
    /// Creates a predicate.
    pub fn new(operator: Operator, operand: impl Into<Value>) -> Self {
        Self {
            operator,
            operand: operand.into(),
        }
    }

    /// Returns the operator.
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// Returns the operand.
    pub fn operand(&self) -> &Value {
        &self.operand
    }

    /// Tests a key against this predicate.
    pub fn test(&self, key: &Value) -> CoreResult<bool> {
        Ok(self.position(key)? == Position::Inside)
    }

    fn position(&self, key: &Value) -> CoreResult<Position> {
        let ord = key
            .compare(&self.operand)
            .ok_or(CoreError::TypeMismatch {
                expected: self.operand.type_name(),
                found: key.type_name(),
            })?;

        let position = match (self.operator, ord) {
            (Operator::Eq, Ordering::Less) => Position::Below,
            (Operator::Eq, Ordering::Greater) => Position::Above,
            (Operator::Gt, Ordering::Less | Ordering::Equal) => Position::Below,
            (Operator::Ge, Ordering::Less) => Position::Below,
            (Operator::Lt, Ordering::Greater | Ordering::Equal) => Position::Above,
            (Operator::Le, Ordering::Greater) => Position::Above,
            _ => Position::Inside,
        };
        Ok(position)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.operator, self.operand)
    }
}

/// Where a key sits relative to a range, in ascending key order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Position {
    /// Before the lower bound.
    Below,
    /// Satisfies every predicate.
    Inside,
    /// Past the upper bound; no larger key can match.
    Above,
}

/// A sequence of one or two predicates bounding a scan.
///
/// Two-predicate ranges always pair one lower bound (`>`/`>=`) with one
/// upper bound (`<`/`<=`). A lower operand above the upper operand is not
/// an error; the range simply matches nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    predicates: Vec<Predicate>,
}

impl Range {
    /// Builds a range from an arbitrary predicate list.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRange` unless the list holds one predicate, or a
    /// lower and an upper bound (in either order; they are stored lower
    /// first).
    pub fn new(mut predicates: Vec<Predicate>) -> CoreResult<Self> {
        match predicates.len() {
            1 => Ok(Self { predicates }),
            2 => {
                let (a, b) = (predicates[0].operator, predicates[1].operator);
                if a.is_upper_bound() && b.is_lower_bound() {
                    predicates.swap(0, 1);
                } else if !(a.is_lower_bound() && b.is_upper_bound()) {
                    return Err(CoreError::invalid_range(format!(
                        "a two-predicate range needs one lower and one upper bound, got {a} and {b}"
                    )));
                }
                Ok(Self { predicates })
            }
            n => Err(CoreError::invalid_range(format!(
                "a range holds one or two predicates, got {n}"
            ))),
        }
    }

    fn single(operator: Operator, operand: Value) -> Self {
        Self {
            predicates: vec![Predicate { operator, operand }],
        }
    }

    fn pair(lower: Operator, lo: Value, upper: Operator, hi: Value) -> Self {
        Self {
            predicates: vec![
                Predicate {
                    operator: lower,
                    operand: lo,
                },
                Predicate {
                    operator: upper,
                    operand: hi,
                },
            ],
        }
    }

    /// Returns the predicates of this range.
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Returns true for a single `==` predicate.
    pub fn is_point(&self) -> bool {
        matches!(self.predicates.as_slice(), [p] if p.operator == Operator::Eq)
    }

    /// Returns the operand a forward scan may seek to, if any.
    ///
    /// This is the operand of the `==`, `>` or `>=` predicate. Keys before
    /// it can never match.
    pub fn seek_operand(&self) -> Option<&Value> {
        self.predicates
            .iter()
            .find(|p| p.operator == Operator::Eq || p.operator.is_lower_bound())
            .map(|p| &p.operand)
    }

    /// Returns the operand past which a forward scan can stop, if any.
    ///
    /// This is the operand of the `==`, `<` or `<=` predicate.
    pub(crate) fn limit_operand(&self) -> Option<&Value> {
        self.predicates
            .iter()
            .find(|p| p.operator == Operator::Eq || p.operator.is_upper_bound())
            .map(|p| &p.operand)
    }

    /// Tests whether a key satisfies every predicate.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if the key cannot be compared with an operand.
    pub fn matches(&self, key: &Value) -> CoreResult<bool> {
        Ok(self.locate(key)? == Position::Inside)
    }

    /// Places a key relative to the range.
    pub(crate) fn locate(&self, key: &Value) -> CoreResult<Position> {
        let mut below = false;
        for predicate in &self.predicates {
            match predicate.position(key)? {
                Position::Above => return Ok(Position::Above),
                Position::Below => below = true,
                Position::Inside => {}
            }
        }
        Ok(if below {
            Position::Below
        } else {
            Position::Inside
        })
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, predicate) in self.predicates.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{predicate}")?;
        }
        write!(f, "]")
    }
}

/// Keys equal to `value`.
pub fn eq(value: impl Into<Value>) -> Range {
    Range::single(Operator::Eq, value.into())
}

/// Keys less than `value`.
pub fn lt(value: impl Into<Value>) -> Range {
    Range::single(Operator::Lt, value.into())
}

/// Keys less than or equal to `value`.
pub fn le(value: impl Into<Value>) -> Range {
    Range::single(Operator::Le, value.into())
}

/// Keys greater than `value`.
pub fn gt(value: impl Into<Value>) -> Range {
    Range::single(Operator::Gt, value.into())
}

/// Keys greater than or equal to `value`.
pub fn ge(value: impl Into<Value>) -> Range {
    Range::single(Operator::Ge, value.into())
}

/// Left-closed, right-open range: `lo <= key < hi`.
pub fn range(lo: impl Into<Value>, hi: impl Into<Value>) -> Range {
    Range::pair(Operator::Ge, lo.into(), Operator::Lt, hi.into())
}

/// Open range: `lo < key < hi`.
pub fn orange(lo: impl Into<Value>, hi: impl Into<Value>) -> Range {
    Range::pair(Operator::Gt, lo.into(), Operator::Lt, hi.into())
}

/// Closed range: `lo <= key <= hi`.
pub fn crange(lo: impl Into<Value>, hi: impl Into<Value>) -> Range {
    Range::pair(Operator::Ge, lo.into(), Operator::Le, hi.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn members(r: &Range) -> Vec<i64> {
        (0..=20)
            .filter(|k| r.matches(&Value::Integer(*k)).unwrap())
            .collect()
    }

    #[test]
    fn constructors_build_expected_predicates() {
        let r = range(5, 15);
        assert_eq!(
            r.predicates(),
            &[
                Predicate::new(Operator::Ge, 5),
                Predicate::new(Operator::Lt, 15)
            ]
        );
        assert_eq!(orange(1, 2).predicates()[0].operator(), Operator::Gt);
        assert_eq!(crange(1, 2).predicates()[1].operator(), Operator::Le);
        assert!(eq(3).is_point());
        assert!(!le(3).is_point());
    }

    #[test]
    fn inclusivity() {
        assert_eq!(members(&range(5, 8)), vec![5, 6, 7]);
        assert_eq!(members(&orange(5, 8)), vec![6, 7]);
        assert_eq!(members(&crange(5, 8)), vec![5, 6, 7, 8]);
        assert_eq!(members(&eq(4)), vec![4]);
        assert_eq!(members(&lt(2)), vec![0, 1]);
        assert_eq!(members(&le(2)), vec![0, 1, 2]);
        assert_eq!(members(&gt(19)), vec![20]);
        assert_eq!(members(&ge(19)), vec![19, 20]);
    }

    #[test]
    fn inverted_range_is_empty() {
        assert!(members(&range(10, 5)).is_empty());
        assert!(members(&crange(6, 5)).is_empty());
    }

    #[test]
    fn type_mismatch_is_reported() {
        let err = gt(5).matches(&Value::from("five")).unwrap_err();
        assert_eq!(
            err,
            CoreError::TypeMismatch {
                expected: "integer",
                found: "text"
            }
        );
    }

    #[test]
    fn locate_positions() {
        let r = range(5, 10);
        assert_eq!(r.locate(&Value::Integer(4)).unwrap(), Position::Below);
        assert_eq!(r.locate(&Value::Integer(5)).unwrap(), Position::Inside);
        assert_eq!(r.locate(&Value::Integer(10)).unwrap(), Position::Above);
    }

    #[test]
    fn new_validates_shape() {
        let swapped = Range::new(vec![
            Predicate::new(Operator::Lt, 10),
            Predicate::new(Operator::Ge, 1),
        ])
        .unwrap();
        assert_eq!(swapped, range(1, 10));

        assert!(Range::new(vec![]).is_err());
        assert!(Range::new(vec![
            Predicate::new(Operator::Gt, 1),
            Predicate::new(Operator::Ge, 2),
        ])
        .is_err());
        assert!(Range::new(vec![
            Predicate::new(Operator::Eq, 1),
            Predicate::new(Operator::Lt, 2),
        ])
        .is_err());
    }

    #[test]
    fn operator_symbols_roundtrip() {
        for op in [
            Operator::Eq,
            Operator::Lt,
            Operator::Le,
            Operator::Gt,
            Operator::Ge,
        ] {
            assert_eq!(op.symbol().parse::<Operator>().unwrap(), op);
        }
        assert!("!=".parse::<Operator>().is_err());
    }

    #[test]
    fn display() {
        assert_eq!(range(5, 15).to_string(), "[>= 5, < 15]");
        assert_eq!(eq("a").to_string(), "[== \"a\"]");
    }
}
