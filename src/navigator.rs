// src/navigator.rs
//! The finalized navigator (C9): zero-copy typed accessors over a validated buffer. Every
//! accessor returns a `Value<R>` pointing into the shared backing bytes, or an explicit error;
//! nothing here ever mutates. Extracting a sub-value clones the buffer's strong reference only
//! (O(1), allocation-free) -- it never copies the underlying bytes (§5, §4.9).

use core::convert::TryFrom;

use alloc::string::String;
use alloc::vec::Vec;

use crate::buffer::{FinalizedBuffer, RefCount};
use crate::endian;
use crate::error::DartError;
use crate::key_order::compare_keys;
use crate::raw_type::{LogicalType, RawType};
use crate::vtable::{Entry, KeyEntry};

const OBJECT_HEADER_SIZE: usize = 8;
const ARRAY_HEADER_SIZE: usize = 8;

/// A value reachable from a finalized buffer: either its root, or a child reached through
/// `get`/`at`/iteration. Cheap to clone; shares the parent buffer's strong reference.
#[derive(Clone)]
pub struct Value<R: RefCount> {
    buffer: R,
    raw_type: RawType,
    /// Absolute byte offset into `buffer`'s bytes. Meaningless when `raw_type` is `Null`.
    offset: usize,
}

impl<R: RefCount> Value<R> {
    pub fn from_buffer(buffer: &FinalizedBuffer<R>) -> Self {
        Self { buffer: buffer.ref_handle(), raw_type: buffer.root_type(), offset: 0 }
    }

    fn bytes(&self) -> &[u8] {
        self.buffer.bytes()
    }

    pub fn raw_type(&self) -> RawType {
        self.raw_type
    }

    pub fn logical_type(&self) -> LogicalType {
        self.raw_type.logical_type()
    }

    pub fn is_null(&self) -> bool {
        self.raw_type == RawType::Null
    }

    pub fn as_bool(&self) -> Result<bool, DartError> {
        if self.logical_type() != LogicalType::Boolean {
            return Err(DartError::TypeMismatch);
        }
        Ok(self.bytes()[self.offset] != 0)
    }

    pub fn as_i64(&self) -> Result<i64, DartError> {
        if self.logical_type() != LogicalType::Integer {
            return Err(DartError::TypeMismatch);
        }
        let bytes = self.bytes();
        Ok(match self.raw_type {
            RawType::ShortInteger => endian::read_i16(&bytes[self.offset..self.offset + 2]) as i64,
            RawType::Integer => endian::read_i32(&bytes[self.offset..self.offset + 4]) as i64,
            RawType::LongInteger => endian::read_i64(&bytes[self.offset..self.offset + 8]),
            _ => unreachable!("logical_type() guard above guarantees an integer raw type"),
        })
    }

    pub fn as_f64(&self) -> Result<f64, DartError> {
        if self.logical_type() != LogicalType::Decimal {
            return Err(DartError::TypeMismatch);
        }
        let bytes = self.bytes();
        Ok(match self.raw_type {
            RawType::Decimal => endian::read_f32(&bytes[self.offset..self.offset + 4]) as f64,
            RawType::LongDecimal => endian::read_f64(&bytes[self.offset..self.offset + 8]),
            _ => unreachable!("logical_type() guard above guarantees a decimal raw type"),
        })
    }

    pub fn as_str(&self) -> Result<&str, DartError> {
        if self.logical_type() != LogicalType::String {
            return Err(DartError::TypeMismatch);
        }
        let payload = string_payload(self.bytes(), self.offset, self.raw_type);
        core::str::from_utf8(payload).map_err(|_| DartError::TypeMismatch)
    }

    /// Number of entries in an object or array. `TypeMismatch` otherwise.
    pub fn len(&self) -> Result<usize, DartError> {
        match self.logical_type() {
            LogicalType::Object | LogicalType::Array => {
                Ok(endian::read_u32(&self.bytes()[self.offset + 4..self.offset + 8]) as usize)
            }
            _ => Err(DartError::TypeMismatch),
        }
    }

    pub fn is_empty(&self) -> Result<bool, DartError> {
        Ok(self.len()? == 0)
    }

    /// Absent-tolerant object field access: returns a `Null` value, not an error, when `key`
    /// is not present (§7: "`get` is absent-tolerant").
    pub fn get(&self, key: &str) -> Value<R> {
        self.lookup(key).unwrap_or_else(|| self.null_sibling())
    }

    /// Strict object field access: `KeyMissing` when `key` is not present.
    pub fn at(&self, key: &str) -> Result<Value<R>, DartError> {
        self.lookup(key).ok_or(DartError::KeyMissing)
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    /// Absent-tolerant array indexing: returns a `Null` value when `index` is out of range.
    pub fn get_index(&self, index: usize) -> Value<R> {
        self.index(index).unwrap_or_else(|| self.null_sibling())
    }

    /// Strict array indexing: `IndexOutOfRange` when `index >= count`.
    pub fn at_index(&self, index: usize) -> Result<Value<R>, DartError> {
        let count = self.len().unwrap_or(0);
        self.index(index).ok_or(DartError::IndexOutOfRange { index, count })
    }

    pub fn iter_object(&self) -> Result<ObjectIter<R>, DartError> {
        if self.logical_type() != LogicalType::Object {
            return Err(DartError::TypeMismatch);
        }
        Ok(ObjectIter { value: self.clone(), index: 0, count: self.len()? })
    }

    pub fn iter_array(&self) -> Result<ArrayIter<R>, DartError> {
        if self.logical_type() != LogicalType::Array {
            return Err(DartError::TypeMismatch);
        }
        Ok(ArrayIter { value: self.clone(), index: 0, count: self.len()? })
    }

    fn null_sibling(&self) -> Value<R> {
        Value { buffer: self.buffer.clone(), raw_type: RawType::Null, offset: 0 }
    }

    fn child_at(&self, raw_type_byte: u8, offset: u32) -> Value<R> {
        let raw_type = RawType::try_from(raw_type_byte).expect("validated buffer has valid raw types");
        Value { buffer: self.buffer.clone(), raw_type, offset: self.offset + offset as usize }
    }

    /// Binary search over the object's key vtable, using each entry's cached prefix first and
    /// only loading the real key bytes when the cache is indeterminate (§4.2, §9).
    fn lookup(&self, key: &str) -> Option<Value<R>> {
        if self.logical_type() != LogicalType::Object {
            return None;
        }
        let bytes = self.bytes();
        let base = self.offset;
        let count = self.len().ok()?;
        let key_vtable_start = base + OBJECT_HEADER_SIZE;
        let query = key.as_bytes();

        let mut lo = 0usize;
        let mut hi = count;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let entry_at = key_vtable_start + mid * KeyEntry::SIZE;
            let key_entry = KeyEntry::read_from(&bytes[entry_at..entry_at + KeyEntry::SIZE]);
            let ordering = key_entry.prefix_compare(query).unwrap_or_else(|| {
                let key_at = base + key_entry.offset() as usize;
                let raw_type = RawType::try_from(key_entry.raw_type_byte())
                    .expect("validated buffer has valid raw types");
                let loaded = string_payload(bytes, key_at, raw_type);
                compare_keys(loaded, query)
            });
            match ordering {
                core::cmp::Ordering::Less => lo = mid + 1,
                core::cmp::Ordering::Greater => hi = mid,
                core::cmp::Ordering::Equal => {
                    let value_vtable_start = key_vtable_start + count * KeyEntry::SIZE;
                    let value_entry_at = value_vtable_start + mid * Entry::SIZE;
                    let value_entry = Entry::read_from(&bytes[value_entry_at..value_entry_at + Entry::SIZE]);
                    return Some(self.child_at(value_entry.raw_type_byte(), value_entry.offset()));
                }
            }
        }
        None
    }

    fn index(&self, index: usize) -> Option<Value<R>> {
        if self.logical_type() != LogicalType::Array {
            return None;
        }
        let count = self.len().ok()?;
        if index >= count {
            return None;
        }
        let bytes = self.bytes();
        let vtable_start = self.offset + ARRAY_HEADER_SIZE;
        let entry_at = vtable_start + index * Entry::SIZE;
        let entry = Entry::read_from(&bytes[entry_at..entry_at + Entry::SIZE]);
        Some(self.child_at(entry.raw_type_byte(), entry.offset()))
    }
}

pub(crate) fn string_payload(bytes: &[u8], at: usize, raw_type: RawType) -> &[u8] {
    let len_field_size = if raw_type == RawType::BigString { 4 } else { 2 };
    let len = if len_field_size == 4 {
        endian::read_u32(&bytes[at..at + 4]) as usize
    } else {
        endian::read_u16(&bytes[at..at + 2]) as usize
    };
    &bytes[at + len_field_size..at + len_field_size + len]
}

/// Extracts every `(key_bytes, raw_type, value_bytes)` triple of an object node, in wire
/// (sorted) order. Used by `builder::merge_buffers`/`project_keys` to walk two objects in
/// lockstep without reparsing into the tree form.
pub(crate) fn object_entries(bytes: &[u8], base: usize) -> Vec<(Vec<u8>, RawType, &[u8])> {
    let count = endian::read_u32(&bytes[base + 4..base + 8]) as usize;
    let key_vtable_start = base + OBJECT_HEADER_SIZE;
    let value_vtable_start = key_vtable_start + count * KeyEntry::SIZE;
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let key_entry_at = key_vtable_start + i * KeyEntry::SIZE;
        let key_entry = KeyEntry::read_from(&bytes[key_entry_at..key_entry_at + KeyEntry::SIZE]);
        let key_raw_type = RawType::try_from(key_entry.raw_type_byte()).expect("validated");
        let key_at = base + key_entry.offset() as usize;
        let key_bytes = string_payload(bytes, key_at, key_raw_type).to_vec();

        let value_entry_at = value_vtable_start + i * Entry::SIZE;
        let value_entry = Entry::read_from(&bytes[value_entry_at..value_entry_at + Entry::SIZE]);
        let value_raw_type = RawType::try_from(value_entry.raw_type_byte()).expect("validated");
        let value_at = base + value_entry.offset() as usize;
        let value_size = node_size(bytes, value_at, value_raw_type);
        out.push((key_bytes, value_raw_type, &bytes[value_at..value_at + value_size]));
    }
    out
}

/// Byte size of a single already-validated node, used to carve out a verbatim slice for a
/// raw-value relocation during merge/project.
pub(crate) fn node_size(bytes: &[u8], at: usize, raw_type: RawType) -> usize {
    match raw_type.logical_type() {
        LogicalType::Object | LogicalType::Array => endian::read_u32(&bytes[at..at + 4]) as usize,
        LogicalType::String => {
            let len_field_size = if raw_type == RawType::BigString { 4 } else { 2 };
            let len = if len_field_size == 4 {
                endian::read_u32(&bytes[at..at + 4]) as usize
            } else {
                endian::read_u16(&bytes[at..at + 2]) as usize
            };
            len_field_size + len + 1
        }
        LogicalType::Integer => match raw_type {
            RawType::ShortInteger => 2,
            RawType::Integer => 4,
            RawType::LongInteger => 8,
            _ => unreachable!(),
        },
        LogicalType::Decimal => match raw_type {
            RawType::Decimal => 4,
            RawType::LongDecimal => 8,
            _ => unreachable!(),
        },
        LogicalType::Boolean => 1,
        LogicalType::Null => 0,
    }
}

/// Iterator over an object's sorted `(key, value)` pairs. Amortized O(1) per step (§4.9).
pub struct ObjectIter<R: RefCount> {
    value: Value<R>,
    index: usize,
    count: usize,
}

impl<R: RefCount> Iterator for ObjectIter<R> {
    type Item = (String, Value<R>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.count {
            return None;
        }
        let bytes = self.value.bytes();
        let base = self.value.offset;
        let key_vtable_start = base + OBJECT_HEADER_SIZE;
        let key_entry_at = key_vtable_start + self.index * KeyEntry::SIZE;
        let key_entry = KeyEntry::read_from(&bytes[key_entry_at..key_entry_at + KeyEntry::SIZE]);
        let key_raw_type = RawType::try_from(key_entry.raw_type_byte()).expect("validated");
        let key_at = base + key_entry.offset() as usize;
        let key = String::from_utf8_lossy(string_payload(bytes, key_at, key_raw_type)).into_owned();

        let value_vtable_start = key_vtable_start + self.count * KeyEntry::SIZE;
        let value_entry_at = value_vtable_start + self.index * Entry::SIZE;
        let value_entry = Entry::read_from(&bytes[value_entry_at..value_entry_at + Entry::SIZE]);
        let value = self.value.child_at(value_entry.raw_type_byte(), value_entry.offset());

        self.index += 1;
        Some((key, value))
    }
}

/// Iterator over an array's elements, in order (§4.9).
pub struct ArrayIter<R: RefCount> {
    value: Value<R>,
    index: usize,
    count: usize,
}

impl<R: RefCount> Iterator for ArrayIter<R> {
    type Item = Value<R>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.count {
            return None;
        }
        let item = self.value.index(self.index);
        self.index += 1;
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_object;
    use crate::buffer::Atomic;
    use crate::tree::Tree;
    use alloc::string::ToString;
    use alloc::vec;

    #[test]
    fn get_and_at_agree_on_present_keys() {
        let buf: FinalizedBuffer<Atomic> = build_object(vec![
            ("a".to_string(), Tree::Integer(1)),
            ("d".to_string(), Tree::Str("hi".to_string())),
        ])
        .unwrap();
        let root = Value::from_buffer(&buf);
        assert_eq!(root.get("a").as_i64().unwrap(), 1);
        assert_eq!(root.at("a").unwrap().as_i64().unwrap(), 1);
        assert_eq!(root.at("d").unwrap().as_str().unwrap(), "hi");
    }

    #[test]
    fn get_is_absent_tolerant_at_is_strict() {
        let buf: FinalizedBuffer<Atomic> = build_object(vec![("a".to_string(), Tree::Integer(1))]).unwrap();
        let root = Value::from_buffer(&buf);
        assert!(root.get("missing").is_null());
        assert_eq!(root.at("missing"), Err(DartError::KeyMissing));
    }

    #[test]
    fn array_iteration_preserves_order() {
        let tree = Tree::Array(vec![Tree::Integer(1), Tree::Decimal(2.5), Tree::Str("x".to_string())]);
        let (bytes, raw_type) = crate::write::encode_root(&tree).unwrap();
        let buf: FinalizedBuffer<Atomic> = FinalizedBuffer::wrap_trusted(bytes, raw_type);
        let root = Value::from_buffer(&buf);
        let items: Vec<_> = root.iter_array().unwrap().collect();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_i64().unwrap(), 1);
        assert_eq!(items[2].as_str().unwrap(), "x");
    }
}
