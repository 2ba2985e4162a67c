// src/transition.rs
//! Transition glue (C11): the only two ways a document crosses between the tree and finalized
//! representations, plus equality across them. Every other module stays on one side or the
//! other; `finalize`/`lift` are the sole bridge, and it is always an explicit call (§1, §5).

use alloc::string::ToString;

use crate::buffer::{FinalizedBuffer, RefCount};
use crate::error::DartError;
use crate::navigator::Value;
use crate::raw_type::LogicalType;
use crate::tree::Tree;
use crate::write;

/// Sizes, allocates, and writes `tree` into a finalized buffer (§4.7, §4.11).
pub fn finalize<R: RefCount>(tree: &Tree) -> Result<FinalizedBuffer<R>, DartError> {
    let _span = tracing::debug_span!("dart::finalize").entered();
    let (bytes, root_type) = write::encode_root(tree)?;
    Ok(FinalizedBuffer::wrap_trusted(bytes, root_type))
}

/// Walks a finalized buffer, constructing an owned tree. Strings and primitives copy their
/// values; objects/arrays recurse (§4.11).
pub fn lift<R: RefCount>(buffer: &FinalizedBuffer<R>) -> Tree {
    let _span = tracing::debug_span!("dart::lift").entered();
    lift_value(&Value::from_buffer(buffer))
}

fn lift_value<R: RefCount>(value: &Value<R>) -> Tree {
    match value.logical_type() {
        LogicalType::Null => Tree::Null,
        LogicalType::Boolean => Tree::Bool(value.as_bool().expect("logical_type matched")),
        LogicalType::Integer => Tree::Integer(value.as_i64().expect("logical_type matched")),
        LogicalType::Decimal => Tree::Decimal(value.as_f64().expect("logical_type matched")),
        LogicalType::String => Tree::Str(value.as_str().expect("logical_type matched").to_string()),
        LogicalType::Array => {
            let items = value.iter_array().expect("logical_type matched").map(|v| lift_value(&v)).collect();
            Tree::Array(items)
        }
        LogicalType::Object => {
            let pairs = value
                .iter_object()
                .expect("logical_type matched")
                .map(|(k, v)| (k, lift_value(&v)))
                .collect();
            Tree::Object(pairs)
        }
    }
}

/// Cross-representation equality (§4.11): if logical types differ, unequal. Scalars compare by
/// logical value, ignoring which raw width stored them. Aggregates recurse structurally.
pub fn tree_eq_value<R: RefCount>(tree: &Tree, value: &Value<R>) -> bool {
    match tree {
        Tree::Null => value.logical_type() == LogicalType::Null,
        Tree::Bool(b) => value.as_bool().map(|v| v == *b).unwrap_or(false),
        Tree::Integer(i) => value.as_i64().map(|v| v == *i).unwrap_or(false),
        Tree::Decimal(d) => value.as_f64().map(|v| v == *d).unwrap_or(false),
        Tree::Str(s) => value.as_str().map(|v| v == s).unwrap_or(false),
        Tree::Array(items) => match value.iter_array() {
            Ok(iter) => {
                let values: alloc::vec::Vec<_> = iter.collect();
                values.len() == items.len() && items.iter().zip(values.iter()).all(|(t, v)| tree_eq_value(t, v))
            }
            Err(_) => false,
        },
        Tree::Object(pairs) => {
            if value.logical_type() != LogicalType::Object {
                return false;
            }
            let count = match value.len() {
                Ok(count) => count,
                Err(_) => return false,
            };
            if count != pairs.len() {
                return false;
            }
            pairs.iter().all(|(key, expected)| match value.at(key) {
                Ok(actual) => tree_eq_value(expected, &actual),
                Err(_) => false,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Atomic;
    use alloc::string::ToString;
    use alloc::vec;

    #[test]
    fn round_trips_through_lift_under_logical_equality() {
        let tree = Tree::Object(vec![
            ("a".to_string(), Tree::Integer(1)),
            ("b".to_string(), Tree::Bool(true)),
            ("c".to_string(), Tree::Null),
            ("d".to_string(), Tree::Str("hi".to_string())),
        ]);
        let buffer: FinalizedBuffer<Atomic> = finalize(&tree).unwrap();
        let lifted = lift(&buffer);
        assert_eq!(lifted, tree);
    }

    #[test]
    fn logical_equality_ignores_raw_width() {
        let tree = Tree::Integer(5);
        let buffer: FinalizedBuffer<Atomic> = finalize(&tree).unwrap();
        let root = Value::from_buffer(&buffer);
        assert!(tree_eq_value(&Tree::Integer(5), &root));
        assert!(!tree_eq_value(&Tree::Integer(6), &root));
    }

    #[test]
    fn byte_round_trip_is_exact_for_canonical_construction() {
        let tree = Tree::Object(vec![("k".to_string(), Tree::Integer(42))]);
        let first: FinalizedBuffer<Atomic> = finalize(&tree).unwrap();
        let lifted = lift(&first);
        let second: FinalizedBuffer<Atomic> = finalize(&lifted).unwrap();
        assert_eq!(first, second);
    }
}
