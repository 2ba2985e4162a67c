// src/size_estimate.rs
//! Size estimator (C6): an upper bound on the bytes a tree will need once finalized.
//!
//! The bound is deliberately loose (§4.6 allows over-estimating) so it can be computed in a
//! single top-down pass without knowing final child offsets. It exists to pre-check the
//! 24-bit offset ceiling early and to size the writer's initial allocation (`write::encode_root`
//! and `write::write_object_entries` both reserve against this estimate before writing); the
//! writer (C7) grows its buffer on demand if a node turns out to need more than its estimate,
//! so an imprecise bound never corrupts a finalized buffer, it just costs a reallocation.

use crate::error::DartError;
use crate::raw_type::{identify_decimal, identify_integer, identify_string, RawType};
use crate::tree::Tree;
use crate::vtable::{Entry, KeyEntry, MAX_OFFSET};

/// §3 invariant 8: a single node plus its inline children cannot exceed `2^24 - 1` bytes.
pub const MAX_NODE_SIZE: usize = MAX_OFFSET as usize;

const OBJECT_HEADER_SIZE: usize = 8;
const ARRAY_HEADER_SIZE: usize = 8;

fn string_payload_size(len: usize) -> usize {
    let len_field = if len <= u16::MAX as usize { 2 } else { 4 };
    len_field + len + 1
}

fn primitive_size(raw_type: RawType) -> usize {
    match raw_type {
        RawType::ShortInteger => 2,
        RawType::Integer | RawType::Decimal => 4,
        RawType::LongInteger | RawType::LongDecimal => 8,
        RawType::Boolean => 1,
        RawType::Null => 0,
        RawType::Object | RawType::Array | RawType::SmallString | RawType::String | RawType::BigString => {
            unreachable!("primitive_size called on a non-primitive raw type")
        }
    }
}

/// Upper bound, in bytes, of the finalized encoding of `tree`. Fails with `BufferTooLarge` if an
/// intermediate object/array would need an offset beyond the 24-bit field (§3 invariant 8).
pub fn estimate(tree: &Tree) -> Result<usize, DartError> {
    match tree {
        Tree::Null => Ok(0),
        Tree::Bool(_) => Ok(1),
        Tree::Integer(v) => Ok(primitive_size(identify_integer(*v))),
        Tree::Decimal(v) => Ok(primitive_size(identify_decimal(*v))),
        Tree::Str(s) => Ok(string_payload_size(s.len())),
        Tree::Array(items) => estimate_array(items),
        Tree::Object(pairs) => estimate_object(pairs),
    }
}

fn estimate_array(items: &[Tree]) -> Result<usize, DartError> {
    let count = items.len();
    let mut total = ARRAY_HEADER_SIZE + (count + 1) * Entry::SIZE;
    for item in items {
        let child = estimate(item)?;
        let align = child_alignment(item);
        total += child + align - 1;
    }
    let total = round_up(total, 8);
    check_node_size(total)
}

fn estimate_object(pairs: &[(alloc::string::String, Tree)]) -> Result<usize, DartError> {
    let count = pairs.len();
    let mut total =
        OBJECT_HEADER_SIZE + (count + 1) * KeyEntry::SIZE + (count + 1) * Entry::SIZE;
    for (key, value) in pairs {
        if key.len() > u16::MAX as usize {
            return Err(DartError::KeyTooLong(key.len()));
        }
        let key_size = string_payload_size(key.len());
        let key_align = child_alignment_of_raw(identify_string(key.len()));
        total += key_size + key_align - 1;

        let value_size = estimate(value)?;
        let value_align = child_alignment(value);
        total += value_size + value_align - 1;
    }
    let total = round_up(total, 8);
    check_node_size(total)
}

fn child_alignment(tree: &Tree) -> usize {
    match tree {
        Tree::Null => RawType::Null.alignment(),
        Tree::Bool(_) => RawType::Boolean.alignment(),
        Tree::Integer(v) => identify_integer(*v).alignment(),
        Tree::Decimal(v) => identify_decimal(*v).alignment(),
        Tree::Str(s) => identify_string(s.len()).alignment(),
        Tree::Array(_) => RawType::Array.alignment(),
        Tree::Object(_) => RawType::Object.alignment(),
    }
}

fn child_alignment_of_raw(raw_type: RawType) -> usize {
    raw_type.alignment()
}

fn round_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}

fn check_node_size(total: usize) -> Result<usize, DartError> {
    if total > MAX_NODE_SIZE {
        Err(DartError::BufferTooLarge(total))
    } else {
        Ok(total)
    }
}
