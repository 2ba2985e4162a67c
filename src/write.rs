// src/write.rs
//! The layout writer (C7): serializes a tree, or a mix of fresh values and already-encoded raw
//! byte spans, into a flat buffer following §4.7's algorithm. A single pass appends each node
//! at the current write cursor, padding first to the node's required alignment, then patches
//! the node's vtable slots once every child's offset is known.
//!
//! Values can come from two places: a live `Tree` node (recursed and encoded from scratch) or
//! an already-finalized byte span borrowed from another buffer (`ValueSource::Raw`). A child
//! node is self-contained -- every offset inside it is relative to its own base -- so relocating
//! one is a verbatim byte copy with no need to re-parse or re-encode it. `merge_buffers` and
//! `project_keys` (src/builder.rs) rely on exactly this to avoid lifting through the tree form.

use alloc::vec::Vec;

use crate::endian;
use crate::error::DartError;
use crate::raw_type::{identify_decimal, identify_integer, identify_string, RawType};
use crate::size_estimate::{self, MAX_NODE_SIZE};
use crate::tree::Tree;
use crate::vtable::{Entry, KeyEntry};

const OBJECT_HEADER_SIZE: usize = 8;
const ARRAY_HEADER_SIZE: usize = 8;

/// Where an object/array's value comes from: a tree node to encode fresh, or a byte span
/// already in a finalized representation to copy verbatim.
pub enum ValueSource<'a> {
    Tree(&'a Tree),
    Raw { raw_type: RawType, bytes: &'a [u8] },
}

impl<'a> ValueSource<'a> {
    fn alignment(&self) -> usize {
        match self {
            ValueSource::Tree(tree) => tree_alignment(tree),
            ValueSource::Raw { raw_type, .. } => raw_type.alignment(),
        }
    }
}

fn tree_alignment(tree: &Tree) -> usize {
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

fn pad_to(out: &mut Vec<u8>, align: usize) {
    let rem = out.len() % align;
    if rem != 0 {
        out.resize(out.len() + (align - rem), 0);
    }
}

fn check_node_size(out_len_before: usize, out_len_after: usize) -> Result<usize, DartError> {
    let size = out_len_after - out_len_before;
    if size > MAX_NODE_SIZE {
        Err(DartError::BufferTooLarge(size))
    } else {
        Ok(size)
    }
}

/// Encodes the root value of a brand-new finalized buffer. Returns the bytes and the root's
/// chosen raw type (tracked alongside the bytes, since a root has no containing vtable entry
/// to record it in -- see `buffer::FinalizedBuffer`). Pre-sizes the buffer from the size
/// estimator (C6) so the common case needs no reallocation; the estimator's bound can be loose,
/// so `resize`/`extend_from_slice` below still grow the `Vec` if a node needs more than its
/// share of the estimate.
pub fn encode_root(tree: &Tree) -> Result<(Vec<u8>, RawType), DartError> {
    let mut out = Vec::with_capacity(size_estimate::estimate(tree)?);
    let raw_type = encode_value(tree, &mut out)?;
    Ok((out, raw_type))
}

fn encode_value(tree: &Tree, out: &mut Vec<u8>) -> Result<RawType, DartError> {
    match tree {
        Tree::Null => Ok(RawType::Null),
        Tree::Bool(b) => {
            out.push(if *b { 1 } else { 0 });
            Ok(RawType::Boolean)
        }
        Tree::Integer(v) => Ok(encode_integer(*v, out)),
        Tree::Decimal(v) => Ok(encode_decimal(*v, out)),
        Tree::Str(s) => Ok(encode_string(s.as_bytes(), out)),
        Tree::Array(items) => encode_array(items, out),
        Tree::Object(pairs) => encode_object_from_tree(pairs, out),
    }
}

fn encode_integer(value: i64, out: &mut Vec<u8>) -> RawType {
    let raw_type = identify_integer(value);
    let base = out.len();
    match raw_type {
        RawType::ShortInteger => {
            out.resize(base + 2, 0);
            endian::write_i16(&mut out[base..base + 2], value as i16);
        }
        RawType::Integer => {
            out.resize(base + 4, 0);
            endian::write_i32(&mut out[base..base + 4], value as i32);
        }
        RawType::LongInteger => {
            out.resize(base + 8, 0);
            endian::write_i64(&mut out[base..base + 8], value);
        }
        _ => unreachable!("identify_integer returned a non-integer raw type"),
    }
    raw_type
}

fn encode_decimal(value: f64, out: &mut Vec<u8>) -> RawType {
    let raw_type = identify_decimal(value);
    let base = out.len();
    match raw_type {
        RawType::Decimal => {
            out.resize(base + 4, 0);
            endian::write_f32(&mut out[base..base + 4], value as f32);
        }
        RawType::LongDecimal => {
            out.resize(base + 8, 0);
            endian::write_f64(&mut out[base..base + 8], value);
        }
        _ => unreachable!("identify_decimal returned a non-decimal raw type"),
    }
    raw_type
}

fn encode_string(bytes: &[u8], out: &mut Vec<u8>) -> RawType {
    let raw_type = identify_string(bytes.len());
    let len_field_size = if raw_type == RawType::BigString { 4 } else { 2 };
    let base = out.len();
    out.resize(base + len_field_size + bytes.len() + 1, 0);
    if len_field_size == 4 {
        endian::write_u32(&mut out[base..base + 4], bytes.len() as u32);
    } else {
        endian::write_u16(&mut out[base..base + 2], bytes.len() as u16);
    }
    let payload_start = base + len_field_size;
    out[payload_start..payload_start + bytes.len()].copy_from_slice(bytes);
    out[payload_start + bytes.len()] = 0;
    raw_type
}

fn encode_array(items: &[Tree], out: &mut Vec<u8>) -> Result<RawType, DartError> {
    let base = out.len();
    let count = items.len();
    out.resize(base + ARRAY_HEADER_SIZE, 0);
    let vtable_start = out.len();
    out.resize(vtable_start + count * Entry::SIZE, 0);

    let mut offsets_and_types = Vec::with_capacity(count);
    for item in items {
        pad_to(out, tree_alignment(item));
        let child_base = out.len();
        let raw_type = encode_value(item, out)?;
        offsets_and_types.push(((child_base - base) as u32, raw_type));
    }
    pad_to(out, RawType::Array.alignment());
    let total_bytes = check_node_size(base, out.len())?;

    endian::write_u32(&mut out[base..base + 4], total_bytes as u32);
    endian::write_u32(&mut out[base + 4..base + 8], count as u32);
    for (i, (offset, raw_type)) in offsets_and_types.into_iter().enumerate() {
        let entry = Entry::new(raw_type, offset)?;
        let pos = vtable_start + i * Entry::SIZE;
        entry.write_to(&mut out[pos..pos + Entry::SIZE]);
    }
    Ok(RawType::Array)
}

fn encode_object_from_tree(pairs: &[(alloc::string::String, Tree)], out: &mut Vec<u8>) -> Result<RawType, DartError> {
    let mut sorted: Vec<&(alloc::string::String, Tree)> = pairs.iter().collect();
    sorted.sort_by(|a, b| crate::key_order::compare_keys(a.0.as_bytes(), b.0.as_bytes()));
    for pair in sorted.windows(2) {
        if crate::key_order::compare_keys(pair[0].0.as_bytes(), pair[1].0.as_bytes()) == core::cmp::Ordering::Equal {
            return Err(DartError::DuplicateKey);
        }
    }
    for (key, _) in &sorted {
        if key.len() > u16::MAX as usize {
            return Err(DartError::KeyTooLong(key.len()));
        }
    }
    let entries: Vec<(Vec<u8>, ValueSource)> = sorted
        .into_iter()
        .map(|(key, value)| (key.as_bytes().to_vec(), ValueSource::Tree(value)))
        .collect();
    write_object_entries(&entries, out)
}

/// Upper bound on the bytes `entries` will need, for pre-sizing `out` before writing. Raw
/// spans already have a known exact size; a fresh tree value still goes through the size
/// estimator (C6), same as `encode_root`.
fn estimate_entries_capacity(entries: &[(Vec<u8>, ValueSource)]) -> Result<usize, DartError> {
    let count = entries.len();
    let mut total = OBJECT_HEADER_SIZE + count * (KeyEntry::SIZE + Entry::SIZE);
    for (key, value) in entries {
        total += key.len() + 3 + 8; // length field + NUL terminator, plus alignment slack
        total += match value {
            ValueSource::Tree(tree) => size_estimate::estimate(tree)?,
            ValueSource::Raw { bytes, .. } => bytes.len(),
        } + 8;
    }
    Ok(total)
}

/// Writes an object node from entries that are already sorted and deduplicated (§4.8's
/// contract, upheld by `builder::build_object`/`merge_buffers`/`project_keys` before calling
/// this). Each value may be a fresh tree or a raw byte span copied from an existing buffer.
pub fn write_object_entries(entries: &[(Vec<u8>, ValueSource)], out: &mut Vec<u8>) -> Result<RawType, DartError> {
    out.reserve(estimate_entries_capacity(entries)?);
    let base = out.len();
    let count = entries.len();
    out.resize(base + OBJECT_HEADER_SIZE, 0);
    let key_vtable_start = out.len();
    out.resize(key_vtable_start + count * KeyEntry::SIZE, 0);
    let value_vtable_start = out.len();
    out.resize(value_vtable_start + count * Entry::SIZE, 0);

    let mut key_offsets = Vec::with_capacity(count);
    for (key, _) in entries {
        pad_to(out, identify_string(key.len()).alignment());
        let key_base = out.len();
        encode_string(key, out);
        key_offsets.push((key_base - base) as u32);
    }

    let mut value_offsets_and_types = Vec::with_capacity(count);
    for (_, value) in entries {
        pad_to(out, value.alignment());
        let value_base = out.len();
        let raw_type = match value {
            ValueSource::Tree(tree) => encode_value(tree, out)?,
            ValueSource::Raw { raw_type, bytes } => {
                out.extend_from_slice(bytes);
                *raw_type
            }
        };
        value_offsets_and_types.push(((value_base - base) as u32, raw_type));
    }

    pad_to(out, RawType::Object.alignment());
    let total_bytes = check_node_size(base, out.len())?;

    endian::write_u32(&mut out[base..base + 4], total_bytes as u32);
    endian::write_u32(&mut out[base + 4..base + 8], count as u32);
    for (i, (key, _)) in entries.iter().enumerate() {
        let entry = KeyEntry::new(key_offsets[i], key)?;
        let pos = key_vtable_start + i * KeyEntry::SIZE;
        entry.write_to(&mut out[pos..pos + KeyEntry::SIZE]);
    }
    for (i, (offset, raw_type)) in value_offsets_and_types.into_iter().enumerate() {
        let entry = Entry::new(raw_type, offset)?;
        let pos = value_vtable_start + i * Entry::SIZE;
        entry.write_to(&mut out[pos..pos + Entry::SIZE]);
    }
    Ok(RawType::Object)
}
