// src/error.rs

/// Every way a Dart operation can fail, spanning construction, navigation, and validation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DartError {
    /// Accessing a value as the wrong logical type (e.g. integer on a string).
    TypeMismatch,

    /// `at(key)` on an object that does not contain `key`.
    KeyMissing,

    /// `at(i)` with `i >= count`.
    IndexOutOfRange { index: usize, count: usize },

    /// Building an object with the same key supplied twice.
    DuplicateKey,

    /// Key length exceeded `u16::MAX`.
    KeyTooLong(usize),

    /// A node would need an offset past the 24-bit field's `2^24 - 1` limit.
    BufferTooLarge(usize),

    /// The top-level buffer's address is not 8-byte aligned.
    MisalignedBuffer,

    /// The validator rejected the byte sequence; see `ValidationFailure` for the reason.
    ValidationFailed(ValidationFailure),

    /// An operation is not permitted in the representation it was called on
    /// (e.g. attempting to mutate a finalized buffer).
    StateError,

    /// Crossing reference-count policies (atomic <-> non-atomic) on the same document.
    RefCountPolicyMismatch,

    /// The JSON bridge (A5) was given text that is not well-formed JSON.
    InvalidJson,
}

/// The specific reason a finalized buffer failed validation (C10).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    /// Fewer bytes remain than the node's fixed header requires.
    Truncated { at: usize, needed: usize },
    /// `total_bytes` claims more than the bytes actually remaining.
    TotalExceedsRemaining { at: usize, total: usize, remaining: usize },
    /// The vtable's end falls outside `total_bytes`.
    VtableOutOfBounds { at: usize },
    /// A vtable entry's raw type byte is not one of the recognized raw types.
    UnknownRawType { at: usize, byte: u8 },
    /// A child offset plus its size would exceed the parent's `total_bytes`.
    ChildOutOfBounds { at: usize, offset: u32 },
    /// Offsets within one vtable are not strictly increasing (cycle/back-reference risk).
    NonMonotonicOffset { at: usize, index: usize },
    /// A child's offset does not satisfy its type's required alignment.
    Misaligned { at: usize, offset: u32 },
    /// The byte at a string's declared length was not NUL.
    MissingStringNul { at: usize },
    /// An object's keys are not in `(length, lexicographic)` order, or are not unique.
    KeyOrderViolation { at: usize, index: usize },
}

impl core::fmt::Display for DartError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TypeMismatch => write!(f, "value accessed as the wrong logical type"),
            Self::KeyMissing => write!(f, "key not present in object"),
            Self::IndexOutOfRange { index, count } => {
                write!(f, "index {} out of range (count = {})", index, count)
            }
            Self::DuplicateKey => write!(f, "duplicate key in object construction"),
            Self::KeyTooLong(len) => write!(f, "key length {} exceeds u16::MAX", len),
            Self::BufferTooLarge(len) => {
                write!(f, "node size {} exceeds the 24-bit offset limit", len)
            }
            Self::MisalignedBuffer => write!(f, "buffer is not 8-byte aligned"),
            Self::ValidationFailed(reason) => write!(f, "validation failed: {}", reason),
            Self::StateError => write!(f, "operation not permitted in current representation"),
            Self::RefCountPolicyMismatch => {
                write!(f, "cannot mix atomic and non-atomic refcount policies")
            }
            Self::InvalidJson => write!(f, "input is not well-formed JSON"),
        }
    }
}

impl core::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Truncated { at, needed } => {
                write!(f, "at {}: need {} more bytes than remain", at, needed)
            }
            Self::TotalExceedsRemaining { at, total, remaining } => write!(
                f,
                "at {}: declared total_bytes {} exceeds {} remaining",
                at, total, remaining
            ),
            Self::VtableOutOfBounds { at } => write!(f, "at {}: vtable end exceeds total_bytes", at),
            Self::UnknownRawType { at, byte } => {
                write!(f, "at {}: unrecognized raw type byte 0x{:02x}", at, byte)
            }
            Self::ChildOutOfBounds { at, offset } => {
                write!(f, "at {}: child at offset {} exceeds total_bytes", at, offset)
            }
            Self::NonMonotonicOffset { at, index } => write!(
                f,
                "at {}: vtable entry {} offset is not strictly greater than the previous one",
                at, index
            ),
            Self::Misaligned { at, offset } => {
                write!(f, "at {}: child offset {} violates its type's alignment", at, offset)
            }
            Self::MissingStringNul { at } => {
                write!(f, "at {}: string is missing its trailing NUL byte", at)
            }
            Self::KeyOrderViolation { at, index } => write!(
                f,
                "at {}: key {} violates the (length, lexicographic) sort order or uniqueness",
                at, index
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DartError {}

#[cfg(feature = "std")]
impl std::error::Error for ValidationFailure {}
