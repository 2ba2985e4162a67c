// src/validator.rs
//! The validator (C10): the sole gate between untrusted bytes and a navigable buffer. Both
//! `FinalizedBuffer::from_bytes` and `from_bytes_as` run this before the bytes are trusted.
//!
//! Mirrors §4.10's seven checks node by node: length, self-consistency, vtable bounds, type
//! well-formedness, child offset bounds/monotonicity/alignment, string NUL termination, and
//! recursion into every child.

use core::convert::TryFrom;

use crate::endian;
use crate::error::{DartError, ValidationFailure};
use crate::key_order::compare_keys;
use crate::raw_type::{LogicalType, RawType};
use crate::vtable::{Entry, KeyEntry};

const OBJECT_HEADER_SIZE: usize = 8;
const ARRAY_HEADER_SIZE: usize = 8;

fn fail(reason: ValidationFailure) -> DartError {
    tracing::warn!(reason = %reason, "finalized buffer failed validation");
    DartError::ValidationFailed(reason)
}

/// Validates `bytes` as a finalized document whose root is `root_type`.
pub fn validate(bytes: &[u8], root_type: RawType) -> Result<(), DartError> {
    let _span = tracing::debug_span!("dart::validate", bytes = bytes.len()).entered();
    validate_node(bytes, 0, bytes.len(), root_type)?;
    Ok(())
}

/// The `silent_bool` validation mode (§4.10): same checks as `validate`, collapsed to a
/// boolean for callers that only want a yes/no answer and don't care which check failed.
pub fn validate_silent(bytes: &[u8], root_type: RawType) -> bool {
    validate(bytes, root_type).is_ok()
}

/// Validates the node of type `raw_type` starting at `at`, which must end at or before
/// `outer_end`. Returns the node's own byte size on success.
fn validate_node(bytes: &[u8], at: usize, outer_end: usize, raw_type: RawType) -> Result<usize, DartError> {
    match raw_type.logical_type() {
        LogicalType::Object => validate_object(bytes, at, outer_end),
        LogicalType::Array => validate_array(bytes, at, outer_end),
        LogicalType::String => validate_string(bytes, at, outer_end, raw_type),
        LogicalType::Integer | LogicalType::Decimal | LogicalType::Boolean | LogicalType::Null => {
            validate_fixed(bytes, at, outer_end, raw_type)
        }
    }
}

fn need(bytes_remaining: usize, needed: usize, at: usize) -> Result<(), DartError> {
    if bytes_remaining < needed {
        Err(fail(ValidationFailure::Truncated { at, needed }))
    } else {
        Ok(())
    }
}

fn validate_fixed(bytes: &[u8], at: usize, outer_end: usize, raw_type: RawType) -> Result<usize, DartError> {
    let size = match raw_type {
        RawType::ShortInteger => 2,
        RawType::Integer | RawType::Decimal => 4,
        RawType::LongInteger | RawType::LongDecimal => 8,
        RawType::Boolean => 1,
        RawType::Null => 0,
        _ => unreachable!("validate_fixed called on a container or string raw type"),
    };
    need(outer_end.saturating_sub(at), size, at)?;
    let _ = bytes;
    Ok(size)
}

fn validate_string(bytes: &[u8], at: usize, outer_end: usize, raw_type: RawType) -> Result<usize, DartError> {
    let len_field_size = if raw_type == RawType::BigString { 4 } else { 2 };
    need(outer_end.saturating_sub(at), len_field_size, at)?;
    let len = if len_field_size == 4 {
        endian::read_u32(&bytes[at..at + 4]) as usize
    } else {
        endian::read_u16(&bytes[at..at + 2]) as usize
    };
    let total = len_field_size + len + 1;
    need(outer_end.saturating_sub(at), total, at)?;
    let nul_at = at + len_field_size + len;
    if bytes[nul_at] != 0 {
        return Err(fail(ValidationFailure::MissingStringNul { at }));
    }
    Ok(total)
}

fn string_payload<'a>(bytes: &'a [u8], at: usize, raw_type: RawType) -> &'a [u8] {
    let len_field_size = if raw_type == RawType::BigString { 4 } else { 2 };
    let len = if len_field_size == 4 {
        endian::read_u32(&bytes[at..at + 4]) as usize
    } else {
        endian::read_u16(&bytes[at..at + 2]) as usize
    };
    &bytes[at + len_field_size..at + len_field_size + len]
}

/// Validates one child reached through a vtable entry. `min_child_at` is the first byte past
/// the containing node's own header/vtable region -- a child offset landing before it would
/// alias the node's own framing rather than reaching real payload, offset `0` included (§3
/// invariant: "0 is reserved/invalid; first real child must start after the vtable").
fn check_child(
    bytes: &[u8],
    node_at: usize,
    min_child_at: usize,
    node_end: usize,
    child_offset: u32,
    raw_type_byte: u8,
) -> Result<(RawType, usize, usize), DartError> {
    let raw_type = RawType::try_from(raw_type_byte)
        .map_err(|_| fail(ValidationFailure::UnknownRawType { at: node_at, byte: raw_type_byte }))?;
    let child_at = node_at + child_offset as usize;
    if child_at % raw_type.alignment() != 0 {
        return Err(fail(ValidationFailure::Misaligned { at: node_at, offset: child_offset }));
    }
    if child_at < min_child_at || child_at > node_end {
        return Err(fail(ValidationFailure::ChildOutOfBounds { at: node_at, offset: child_offset }));
    }
    let size = validate_node(bytes, child_at, node_end, raw_type)?;
    if child_at + size > node_end {
        return Err(fail(ValidationFailure::ChildOutOfBounds { at: node_at, offset: child_offset }));
    }
    Ok((raw_type, child_at, size))
}

fn validate_array(bytes: &[u8], at: usize, outer_end: usize) -> Result<usize, DartError> {
    need(outer_end.saturating_sub(at), ARRAY_HEADER_SIZE, at)?;
    let total_bytes = endian::read_u32(&bytes[at..at + 4]) as usize;
    let count = endian::read_u32(&bytes[at + 4..at + 8]) as usize;
    let remaining = outer_end.saturating_sub(at);
    if total_bytes > remaining {
        return Err(fail(ValidationFailure::TotalExceedsRemaining { at, total: total_bytes, remaining }));
    }
    let node_end = at + total_bytes;
    let vtable_start = at + ARRAY_HEADER_SIZE;
    let vtable_end = vtable_start + count * Entry::SIZE;
    if vtable_end > node_end {
        return Err(fail(ValidationFailure::VtableOutOfBounds { at }));
    }

    // `last_offset` starts at 0, and 0 is itself the reserved/invalid offset, so this check
    // also rejects an `i == 0` entry whose offset is 0 without needing a separate case.
    let mut last_offset: u32 = 0;
    for i in 0..count {
        let entry_at = vtable_start + i * Entry::SIZE;
        let entry = Entry::read_from(&bytes[entry_at..entry_at + Entry::SIZE]);
        let offset = entry.offset();
        if offset <= last_offset {
            return Err(fail(ValidationFailure::NonMonotonicOffset { at, index: i }));
        }
        last_offset = offset;
        check_child(bytes, at, vtable_end, node_end, offset, entry.raw_type_byte())?;
    }
    Ok(total_bytes)
}

fn validate_object(bytes: &[u8], at: usize, outer_end: usize) -> Result<usize, DartError> {
    need(outer_end.saturating_sub(at), OBJECT_HEADER_SIZE, at)?;
    let total_bytes = endian::read_u32(&bytes[at..at + 4]) as usize;
    let count = endian::read_u32(&bytes[at + 4..at + 8]) as usize;
    let remaining = outer_end.saturating_sub(at);
    if total_bytes > remaining {
        return Err(fail(ValidationFailure::TotalExceedsRemaining { at, total: total_bytes, remaining }));
    }
    let node_end = at + total_bytes;
    let key_vtable_start = at + OBJECT_HEADER_SIZE;
    let value_vtable_start = key_vtable_start + count * KeyEntry::SIZE;
    let vtable_end = value_vtable_start + count * Entry::SIZE;
    if vtable_end > node_end {
        return Err(fail(ValidationFailure::VtableOutOfBounds { at }));
    }

    let mut last_key_offset: u32 = 0;
    let mut last_key_bytes: Option<&[u8]> = None;
    for i in 0..count {
        let entry_at = key_vtable_start + i * KeyEntry::SIZE;
        let key_entry = KeyEntry::read_from(&bytes[entry_at..entry_at + KeyEntry::SIZE]);
        let offset = key_entry.offset();
        if offset <= last_key_offset {
            return Err(fail(ValidationFailure::NonMonotonicOffset { at, index: i }));
        }
        last_key_offset = offset;
        let (key_raw_type, key_at, _) = check_child(bytes, at, vtable_end, node_end, offset, key_entry.raw_type_byte())?;
        if key_raw_type.logical_type() != LogicalType::String {
            return Err(fail(ValidationFailure::UnknownRawType { at, byte: key_entry.raw_type_byte() }));
        }
        let key_bytes = string_payload(bytes, key_at, key_raw_type);
        if let Some(prev) = last_key_bytes {
            if compare_keys(prev, key_bytes) != core::cmp::Ordering::Less {
                return Err(fail(ValidationFailure::KeyOrderViolation { at, index: i }));
            }
        }
        last_key_bytes = Some(key_bytes);
    }

    let mut last_value_offset: u32 = 0;
    for i in 0..count {
        let entry_at = value_vtable_start + i * Entry::SIZE;
        let entry = Entry::read_from(&bytes[entry_at..entry_at + Entry::SIZE]);
        let offset = entry.offset();
        if offset <= last_value_offset {
            return Err(fail(ValidationFailure::NonMonotonicOffset { at, index: i }));
        }
        last_value_offset = offset;
        check_child(bytes, at, vtable_end, node_end, offset, entry.raw_type_byte())?;
    }
    Ok(total_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_object;
    use crate::tree::Tree;
    use alloc::string::ToString;
    use alloc::vec;

    #[test]
    fn empty_object_validates() {
        let buf = build_object(vec![]).unwrap();
        validate(buf.as_bytes(), RawType::Object).unwrap();
    }

    #[test]
    fn silent_mode_agrees_with_throwing_mode() {
        let buf = build_object(vec![("a".to_string(), Tree::Integer(1))]).unwrap();
        assert!(validate_silent(buf.as_bytes(), RawType::Object));
        assert!(!validate_silent(&buf.as_bytes()[..4], RawType::Object));
    }

    #[test]
    fn rewritten_vtable_offset_is_rejected() {
        let buf = build_object(vec![
            ("a".to_string(), Tree::Integer(1)),
            ("b".to_string(), Tree::Integer(2)),
        ])
        .unwrap();
        let mut bytes = buf.as_bytes().to_vec();
        // Corrupt the first value-vtable entry's offset to point past total_bytes.
        let total_bytes = endian::read_u32(&bytes[0..4]) as usize;
        let value_vtable_start = 8 + 2 * KeyEntry::SIZE;
        let corrupt_offset = (total_bytes as u32) + 100;
        let meta = (RawType::ShortInteger.as_u8() as u32) << 24 | (corrupt_offset & 0x00FF_FFFF);
        endian::write_u32(&mut bytes[value_vtable_start..value_vtable_start + 4], meta);
        assert!(validate(&bytes, RawType::Object).is_err());
    }

    #[test]
    fn first_entry_zero_offset_is_rejected() {
        let buf = build_object(vec![
            ("a".to_string(), Tree::Integer(1)),
            ("b".to_string(), Tree::Integer(2)),
        ])
        .unwrap();
        let mut bytes = buf.as_bytes().to_vec();
        let value_vtable_start = 8 + 2 * KeyEntry::SIZE;
        // Zero out the first value-vtable entry's offset while keeping a zero-sized raw type
        // (`Null`), so every downstream bounds/alignment check in `check_child` would otherwise
        // trivially pass and let the entry alias the object's own header/vtable region.
        let meta = (RawType::Null.as_u8() as u32) << 24;
        endian::write_u32(&mut bytes[value_vtable_start..value_vtable_start + 4], meta);
        assert!(validate(&bytes, RawType::Object).is_err());
    }

    #[test]
    fn entry_pointing_into_own_vtable_is_rejected() {
        let buf = build_object(vec![
            ("a".to_string(), Tree::Integer(1)),
            ("b".to_string(), Tree::Integer(2)),
        ])
        .unwrap();
        let mut bytes = buf.as_bytes().to_vec();
        let value_vtable_start = 8 + 2 * KeyEntry::SIZE;
        // A non-zero offset that still lands inside the object's own key/value vtable region
        // must be rejected too, not just a literal offset of 0.
        let alias_offset = 1u32;
        let meta = (RawType::Null.as_u8() as u32) << 24 | (alias_offset & 0x00FF_FFFF);
        endian::write_u32(&mut bytes[value_vtable_start..value_vtable_start + 4], meta);
        assert!(validate(&bytes, RawType::Object).is_err());
    }
}
