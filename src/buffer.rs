// src/buffer.rs
//! The finalized buffer (A6, §5, §6): an immutable, zero-copy byte region plus the refcount
//! policy that owns it. The policy is a type parameter, not a trait object, so that mixing an
//! atomic-backed and a non-atomic-backed buffer is a compile error rather than a runtime one
//! (§5: "the choice is part of the document's type identity and must not be crossed at runtime").

use alloc::sync::Arc;
use alloc::rc::Rc;
use alloc::vec::Vec;

use crate::error::DartError;
use crate::raw_type::RawType;
use crate::validator;

/// A strong-reference policy over the backing byte store. Two zero-cost implementations exist;
/// there is deliberately no third "pick at runtime" implementation.
pub trait RefCount: Clone {
    fn new(bytes: Vec<u8>) -> Self;
    fn bytes(&self) -> &[u8];
}

/// Thread-safe strong reference, backed by `Arc<[u8]>`. Use for documents shared across threads.
#[derive(Debug, Clone)]
pub struct Atomic(Arc<[u8]>);

impl RefCount for Atomic {
    fn new(bytes: Vec<u8>) -> Self {
        Atomic(Arc::from(bytes))
    }

    fn bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Single-threaded strong reference, backed by `Rc<[u8]>`. Cheaper than `Atomic` when a
/// document never crosses a thread boundary.
#[derive(Debug, Clone)]
pub struct NonAtomic(Rc<[u8]>);

impl RefCount for NonAtomic {
    fn new(bytes: Vec<u8>) -> Self {
        NonAtomic(Rc::from(bytes))
    }

    fn bytes(&self) -> &[u8] {
        &self.0
    }
}

/// §6: "Finalized buffers must be stored at an address aligned to 8 bytes; this is the
/// library's contract with the embedder and is checked on entry." Checked whenever bytes enter
/// the crate from outside its own builder/writer.
pub fn assert_entry_alignment(bytes: &[u8]) -> Result<(), DartError> {
    if (bytes.as_ptr() as usize) % 8 != 0 {
        Err(DartError::MisalignedBuffer)
    } else {
        Ok(())
    }
}

/// An immutable, validated, self-describing byte buffer plus the logical type of its root
/// value. The root's type lives here rather than in the bytes themselves: a root has no
/// containing vtable entry to record it in, unlike every other node (§6).
#[derive(Debug, Clone)]
pub struct FinalizedBuffer<R: RefCount = Atomic> {
    bytes: R,
    root_type: RawType,
}

impl<R: RefCount> FinalizedBuffer<R> {
    /// Validates `bytes` as a finalized document and wraps it -- the one path by which
    /// untrusted bytes become navigable (§7: "skipping validation and dereferencing malformed
    /// bytes is undefined behavior by contract"). Assumes an object root, the shape every
    /// document the builder (C8) produces actually has; use `from_bytes_as` for a tree whose
    /// root was some other logical type (finalize's round-trip property covers those too).
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, DartError> {
        Self::from_bytes_as(bytes, RawType::Object)
    }

    /// As `from_bytes`, but for a finalized value whose root is not necessarily an object.
    pub fn from_bytes_as(bytes: Vec<u8>, root_type: RawType) -> Result<Self, DartError> {
        assert_entry_alignment(&bytes)?;
        validator::validate(&bytes, root_type)?;
        Ok(Self { bytes: R::new(bytes), root_type })
    }

    /// Wraps already-validated bytes without re-running the validator. Only used internally by
    /// the builder/writer, which constructs these bytes under its own invariants.
    pub(crate) fn wrap_trusted(bytes: Vec<u8>, root_type: RawType) -> Self {
        Self { bytes: R::new(bytes), root_type }
    }

    /// The `silent_bool` validation mode (§4.10): checks `bytes` without allocating an error
    /// value, for callers that only need a yes/no answer. `from_bytes_as` is the `throw_on_error`
    /// mode over the same checks.
    pub fn is_valid(bytes: &[u8], root_type: RawType) -> bool {
        assert_entry_alignment(bytes).is_ok() && validator::validate_silent(bytes, root_type)
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.bytes.bytes()
    }

    pub fn root_type(&self) -> RawType {
        self.root_type
    }

    pub fn total_bytes(&self) -> usize {
        self.bytes.bytes().len()
    }

    /// Clones the strong reference to the backing bytes without copying them -- the basis for
    /// every O(1), allocation-free sub-value extraction in `navigator::Value`.
    pub(crate) fn ref_handle(&self) -> R {
        self.bytes.clone()
    }
}

impl<R: RefCount> PartialEq for FinalizedBuffer<R> {
    /// §8 property 3: byte equality and structural equality coincide for buffers on the
    /// canonical construction path, so plain byte comparison is a correct, O(n) equality check.
    fn eq(&self, other: &Self) -> bool {
        self.root_type == other.root_type && self.as_bytes() == other.as_bytes()
    }
}

impl<R: RefCount> Eq for FinalizedBuffer<R> {}
