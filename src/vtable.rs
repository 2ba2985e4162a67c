// src/vtable.rs
//! Vtable entries (C2): the offset/type directory at the head of every object and array node.
//!
//! §4.2/§6 normatively select a single encoding — `meta = (raw_type << 24) | (offset & 0x00FFFFFF)`,
//! little-endian on the wire — over the source's second, non-wire-compatible `{u8, u32}` layout.
//! Object key entries additionally carry a 4-byte prefix cache plus a saturating 1-byte length,
//! packed into a second `u32` so the whole entry stays 8 bytes.

use core::cmp::Ordering;

use crate::endian;
use crate::error::DartError;
use crate::key_order::compare_keys;
use crate::raw_type::RawType;

/// 24 bits of offset -> the largest offset (and therefore node size) a vtable can address.
pub const MAX_OFFSET: u32 = 0x00FF_FFFF;
const TYPE_SHIFT: u32 = 24;
const OFFSET_MASK: u32 = 0x00FF_FFFF;

/// A plain 4-byte vtable entry: used for array element entries and object *value* entries,
/// neither of which carries a key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    meta: u32,
}

/// The prefix cache packs into a single `u32` alongside the meta word, so it holds 3 verbatim
/// prefix bytes plus the 1-byte saturating length (§6: `prefix_and_len`), not a full 4 bytes
/// of prefix -- that is the one place this crate departs from a literal reading of "up to 4
/// bytes of the key's leading characters" in favor of what the wire struct in §6 actually fits.
const PREFIX_BYTES: usize = 3;
/// Below this length, `prefix_compare` alone can always resolve the comparison outright
/// (either by length or by a prefix byte) or at worst a single tie on all 3 cached bytes.
const SATURATED_LEN: u8 = 255;

impl Entry {
    pub const SIZE: usize = 4;

    /// Builds an entry from a raw type and an offset from the containing node's base.
    /// `offset` must be nonzero (0 is reserved/invalid, §4.2) and fit in 24 bits (§3 invariant 8).
    pub fn new(raw_type: RawType, offset: u32) -> Result<Self, DartError> {
        if offset == 0 || offset > MAX_OFFSET {
            return Err(DartError::BufferTooLarge(offset as usize));
        }
        let meta = ((raw_type.persisted_in_object_vtable().as_u8() as u32) << TYPE_SHIFT)
            | (offset & OFFSET_MASK);
        Ok(Self { meta })
    }

    pub fn write_to(&self, out: &mut [u8]) {
        endian::write_u32(out, self.meta);
    }

    pub fn read_from(bytes: &[u8]) -> Self {
        Self { meta: endian::read_u32(bytes) }
    }

    pub fn raw_type_byte(&self) -> u8 {
        (self.meta >> TYPE_SHIFT) as u8
    }

    pub fn offset(&self) -> u32 {
        self.meta & OFFSET_MASK
    }
}

/// An 8-byte object key entry: the 4-byte `Entry` meta plus a 4-byte prefix cache and a
/// saturating 1-byte length, used to accelerate `get`/`at`/`has_key` (§4.5, §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEntry {
    entry: Entry,
    prefix: [u8; PREFIX_BYTES],
    prefix_len: u8,
}

impl KeyEntry {
    pub const SIZE: usize = 8;

    pub fn new(offset: u32, key: &[u8]) -> Result<Self, DartError> {
        let entry = Entry::new(RawType::String, offset)?;
        let mut prefix = [0u8; PREFIX_BYTES];
        let copy_len = core::cmp::min(PREFIX_BYTES, key.len());
        prefix[..copy_len].copy_from_slice(&key[..copy_len]);
        let prefix_len = if key.len() >= SATURATED_LEN as usize {
            SATURATED_LEN
        } else {
            key.len() as u8
        };
        Ok(Self { entry, prefix, prefix_len })
    }

    pub fn write_to(&self, out: &mut [u8]) {
        self.entry.write_to(&mut out[0..4]);
        out[4..7].copy_from_slice(&self.prefix);
        out[7] = self.prefix_len;
    }

    pub fn read_from(bytes: &[u8]) -> Self {
        let entry = Entry::read_from(&bytes[0..4]);
        let mut prefix = [0u8; PREFIX_BYTES];
        prefix.copy_from_slice(&bytes[4..7]);
        let prefix_len = bytes[7];
        Self { entry, prefix, prefix_len }
    }

    pub fn offset(&self) -> u32 {
        self.entry.offset()
    }

    pub fn raw_type_byte(&self) -> u8 {
        self.entry.raw_type_byte()
    }

    /// §4.2 / §9: compares the cached prefix against `query` using the object comparator.
    /// Returns `Some(ordering)` when the cache alone resolves the comparison, `None` when the
    /// caller must load the real key bytes and compare in full (an "indeterminate" result).
    pub fn prefix_compare(&self, query: &[u8]) -> Option<Ordering> {
        let saturated = self.prefix_len == SATURATED_LEN;
        if saturated && query.len() >= SATURATED_LEN as usize {
            // Neither side's true length is known here: force a full compare.
            return None;
        }
        if !saturated {
            let cached_len = self.prefix_len as usize;
            if cached_len != query.len() {
                return Some(cached_len.cmp(&query.len()));
            }
        } else if query.len() < SATURATED_LEN as usize {
            // Cached key's real length is >= 255, query is shorter: cached key sorts after.
            return Some(Ordering::Greater);
        }
        let probe_len = core::cmp::min(PREFIX_BYTES, query.len());
        match self.prefix[..probe_len].cmp(&query[..probe_len]) {
            // All of `query`'s bytes fell within the cached prefix, lengths already matched
            // above, so this is a genuine verdict rather than a truncated comparison.
            Ordering::Equal if query.len() <= PREFIX_BYTES => Some(Ordering::Equal),
            Ordering::Equal => None,
            other => Some(other),
        }
    }
}

/// Full key comparison against a real, loaded key slice (used once a prefix compare is
/// indeterminate, or whenever the caller already has both key byte strings in hand).
pub fn compare_loaded_key(loaded: &[u8], query: &[u8]) -> Ordering {
    compare_keys(loaded, query)
}
