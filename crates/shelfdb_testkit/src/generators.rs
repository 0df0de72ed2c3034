//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random test data
//! that maintains required invariants.

use proptest::prelude::*;
use shelfdb_core::predicate::{self, Range};
use shelfdb_core::Value;

/// Strategy for generating valid collection names.
pub fn collection_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z][a-zA-Z0-9_]{0,31}").expect("Invalid regex")
}

/// Strategy for generating scalar values of every kind.
pub fn scalar_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        "[a-z]{0,8}".prop_map(Value::Text),
        prop::collection::vec(any::<u8>(), 0..8).prop_map(Value::Bytes),
    ]
}

/// Strategy for generating nested values.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    scalar_value_strategy().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::vec(("[a-z]{1,4}", inner), 0..4).prop_map(|fields| Value::object(fields)),
        ]
    })
}

/// Strategy for small integer keys, so generated ranges hit some of them.
pub fn key_strategy() -> impl Strategy<Value = i64> {
    -50i64..50
}

/// Strategy for lists of integer keys.
pub fn keys_strategy(max_len: usize) -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(key_strategy(), 0..max_len)
}

/// The shape of a generated range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeShape {
    /// `key == lo`
    Eq,
    /// `key < lo`
    Lt,
    /// `key <= lo`
    Le,
    /// `key > lo`
    Gt,
    /// `key >= lo`
    Ge,
    /// `lo <= key < hi`
    Range,
    /// `lo < key < hi`
    Orange,
    /// `lo <= key <= hi`
    Crange,
}

impl RangeShape {
    /// Every shape.
    pub const ALL: [RangeShape; 8] = [
        RangeShape::Eq,
        RangeShape::Lt,
        RangeShape::Le,
        RangeShape::Gt,
        RangeShape::Ge,
        RangeShape::Range,
        RangeShape::Orange,
        RangeShape::Crange,
    ];

    /// Builds the range. One-sided shapes ignore `hi`.
    pub fn build(self, lo: i64, hi: i64) -> Range {
        match self {
            RangeShape::Eq => predicate::eq(lo),
            RangeShape::Lt => predicate::lt(lo),
            RangeShape::Le => predicate::le(lo),
            RangeShape::Gt => predicate::gt(lo),
            RangeShape::Ge => predicate::ge(lo),
            RangeShape::Range => predicate::range(lo, hi),
            RangeShape::Orange => predicate::orange(lo, hi),
            RangeShape::Crange => predicate::crange(lo, hi),
        }
    }

    /// Returns true for shapes with an upper limit or a point match.
    pub fn is_limited(self) -> bool {
        !matches!(self, RangeShape::Gt | RangeShape::Ge)
    }

    /// Reference membership test on plain integers.
    pub fn contains(self, lo: i64, hi: i64, key: i64) -> bool {
        match self {
            RangeShape::Eq => key == lo,
            RangeShape::Lt => key < lo,
            RangeShape::Le => key <= lo,
            RangeShape::Gt => key > lo,
            RangeShape::Ge => key >= lo,
            RangeShape::Range => lo <= key && key < hi,
            RangeShape::Orange => lo < key && key < hi,
            RangeShape::Crange => lo <= key && key <= hi,
        }
    }
}

/// Strategy for a range shape with its operands.
pub fn range_strategy() -> impl Strategy<Value = (RangeShape, i64, i64)> {
    (
        prop::sample::select(RangeShape::ALL.to_vec()),
        key_strategy(),
        key_strategy(),
    )
}

/// Strategy for a limited range shape with its operands.
pub fn limited_range_strategy() -> impl Strategy<Value = (RangeShape, i64, i64)> {
    range_strategy().prop_filter("shape has a limit", |(shape, _, _)| shape.is_limited())
}

/// Strategy for text that does not start with `<digits>/<digits>`.
pub fn malformed_handle_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z_ ]{0,8}",
        "[0-9]{1,4}",
        "[0-9]{1,4}/",
        "[0-9]{1,4}/[a-z]{1,3}",
        "/[0-9]{1,4}",
        "[a-z]{1,3}/[0-9]{1,4}",
    ]
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
