// src/builder.rs
//! The buffer builder (C8): construct a root object from tree pairs, and perform `merge`/
//! `project` directly on already-finalized buffers, without lifting either side through the
//! tree form (§4.8). A merged or projected value's bytes are relocated verbatim; only the
//! parent object's header, vtables, and sorted key region are freshly written.

use alloc::string::String;
use alloc::vec::Vec;

use crate::buffer::{FinalizedBuffer, RefCount};
use crate::error::DartError;
use crate::key_order::compare_keys;
use crate::navigator::object_entries;
use crate::raw_type::RawType;
use crate::tree::Tree;
use crate::write::{self, ValueSource};

/// Sorts, checks for duplicates, and writes `pairs` as a root object (§4.7, §4.8).
pub fn build_object<R: RefCount>(pairs: Vec<(String, Tree)>) -> Result<FinalizedBuffer<R>, DartError> {
    let _span = tracing::debug_span!("dart::build", pairs = pairs.len()).entered();
    let (bytes, raw_type) = write::encode_root(&Tree::Object(pairs))?;
    debug_assert_eq!(raw_type, RawType::Object);
    Ok(FinalizedBuffer::wrap_trusted(bytes, RawType::Object))
}

/// Merges `incoming` over `base`: keys unique to either side pass through, keys present in both
/// take `incoming`'s value (§4.8, §8 properties 8-9). Both buffers must be root objects.
pub fn merge_buffers<R: RefCount>(
    base: &FinalizedBuffer<R>,
    incoming: &FinalizedBuffer<R>,
) -> Result<FinalizedBuffer<R>, DartError> {
    let _span = tracing::debug_span!("dart::merge").entered();
    if base.root_type() != RawType::Object || incoming.root_type() != RawType::Object {
        return Err(DartError::TypeMismatch);
    }
    let base_entries = object_entries(base.as_bytes(), 0);
    let incoming_entries = object_entries(incoming.as_bytes(), 0);

    let mut merged: Vec<(Vec<u8>, ValueSource)> = Vec::with_capacity(base_entries.len() + incoming_entries.len());
    let mut i = 0;
    let mut j = 0;
    while i < base_entries.len() || j < incoming_entries.len() {
        if j >= incoming_entries.len() {
            let (key, raw_type, bytes) = &base_entries[i];
            merged.push((key.clone(), ValueSource::Raw { raw_type: *raw_type, bytes }));
            i += 1;
        } else if i >= base_entries.len() {
            let (key, raw_type, bytes) = &incoming_entries[j];
            merged.push((key.clone(), ValueSource::Raw { raw_type: *raw_type, bytes }));
            j += 1;
        } else {
            match compare_keys(&base_entries[i].0, &incoming_entries[j].0) {
                core::cmp::Ordering::Less => {
                    let (key, raw_type, bytes) = &base_entries[i];
                    merged.push((key.clone(), ValueSource::Raw { raw_type: *raw_type, bytes }));
                    i += 1;
                }
                core::cmp::Ordering::Equal => {
                    let (key, raw_type, bytes) = &incoming_entries[j];
                    merged.push((key.clone(), ValueSource::Raw { raw_type: *raw_type, bytes }));
                    i += 1;
                    j += 1;
                }
                core::cmp::Ordering::Greater => {
                    let (key, raw_type, bytes) = &incoming_entries[j];
                    merged.push((key.clone(), ValueSource::Raw { raw_type: *raw_type, bytes }));
                    j += 1;
                }
            }
        }
    }

    let mut out = Vec::new();
    write::write_object_entries(&merged, &mut out)?;
    Ok(FinalizedBuffer::wrap_trusted(out, RawType::Object))
}

/// Retains only the keys in `keys` that are present in `base`, in sorted order (§4.8, §8
/// property 10).
pub fn project_keys<R: RefCount>(base: &FinalizedBuffer<R>, keys: &[&str]) -> Result<FinalizedBuffer<R>, DartError> {
    let _span = tracing::debug_span!("dart::project", keys = keys.len()).entered();
    if base.root_type() != RawType::Object {
        return Err(DartError::TypeMismatch);
    }
    let mut wanted: Vec<&[u8]> = keys.iter().map(|k| k.as_bytes()).collect();
    wanted.sort_by(|a, b| compare_keys(a, b));
    wanted.dedup_by(|a, b| compare_keys(a, b) == core::cmp::Ordering::Equal);

    let base_entries = object_entries(base.as_bytes(), 0);
    let mut projected: Vec<(Vec<u8>, ValueSource)> = Vec::new();
    let mut i = 0;
    let mut k = 0;
    while i < base_entries.len() && k < wanted.len() {
        match compare_keys(&base_entries[i].0, wanted[k]) {
            core::cmp::Ordering::Less => i += 1,
            core::cmp::Ordering::Greater => k += 1,
            core::cmp::Ordering::Equal => {
                let (key, raw_type, bytes) = &base_entries[i];
                projected.push((key.clone(), ValueSource::Raw { raw_type: *raw_type, bytes }));
                i += 1;
                k += 1;
            }
        }
    }

    let mut out = Vec::new();
    write::write_object_entries(&projected, &mut out)?;
    Ok(FinalizedBuffer::wrap_trusted(out, RawType::Object))
}
