// src/raw_type.rs
use crate::error::DartError;

/// The seven logical value types observed through the public API (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalType {
    Object,
    Array,
    String,
    Integer,
    Decimal,
    Boolean,
    Null,
}

/// The narrower machine-level type tag stored in a vtable entry's high byte.
///
/// Several raw types map to the same logical type (`short_integer`/`integer`/`long_integer`
/// are all `LogicalType::Integer`); the writer picks the narrowest one that fits.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawType {
    Object = 0x01,
    Array = 0x02,
    SmallString = 0x03,
    String = 0x04,
    BigString = 0x05,
    ShortInteger = 0x06,
    Integer = 0x07,
    LongInteger = 0x08,
    Decimal = 0x09,
    LongDecimal = 0x0a,
    Boolean = 0x0b,
    Null = 0x0c,
}

impl RawType {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    pub const fn logical_type(self) -> LogicalType {
        match self {
            Self::Object => LogicalType::Object,
            Self::Array => LogicalType::Array,
            Self::SmallString | Self::String | Self::BigString => LogicalType::String,
            Self::ShortInteger | Self::Integer | Self::LongInteger => LogicalType::Integer,
            Self::Decimal | Self::LongDecimal => LogicalType::Decimal,
            Self::Boolean => LogicalType::Boolean,
            Self::Null => LogicalType::Null,
        }
    }

    /// §4.2: a `small_string` is persisted in an object vtable entry as plain `string` —
    /// the SSO distinction only matters during construction/dispatch, never on the wire.
    pub const fn persisted_in_object_vtable(self) -> RawType {
        match self {
            Self::SmallString => Self::String,
            other => other,
        }
    }

    /// Required alignment of this raw type's payload, per §3's alignment table.
    pub const fn alignment(self) -> usize {
        match self {
            Self::Object | Self::Array | Self::LongInteger | Self::LongDecimal => 8,
            Self::Integer | Self::Decimal | Self::BigString => 4,
            Self::ShortInteger | Self::String => 2,
            Self::SmallString | Self::Boolean | Self::Null => 1,
        }
    }
}

impl core::convert::TryFrom<u8> for RawType {
    type Error = DartError;
    fn try_from(byte: u8) -> Result<Self, DartError> {
        match byte {
            0x01 => Ok(Self::Object),
            0x02 => Ok(Self::Array),
            0x03 => Ok(Self::SmallString),
            0x04 => Ok(Self::String),
            0x05 => Ok(Self::BigString),
            0x06 => Ok(Self::ShortInteger),
            0x07 => Ok(Self::Integer),
            0x08 => Ok(Self::LongInteger),
            0x09 => Ok(Self::Decimal),
            0x0a => Ok(Self::LongDecimal),
            0x0b => Ok(Self::Boolean),
            0x0c => Ok(Self::Null),
            _ => Err(DartError::ValidationFailed(
                crate::error::ValidationFailure::UnknownRawType { at: 0, byte },
            )),
        }
    }
}

/// SSO threshold: strings at or under this length use `small_string`'s 1-byte-aligned layout
/// (same physical layout as `string`, flagged only in the parent vtable entry).
pub const SSO_THRESHOLD: usize = 15;

/// §9: the correct narrowing rule is "smallest signed type that represents the value" —
/// the source's `identify_integer` has a visible boundary bug at INT16_MAX that is not mirrored.
pub const fn identify_integer(value: i64) -> RawType {
    if value >= i16::MIN as i64 && value <= i16::MAX as i64 {
        RawType::ShortInteger
    } else if value >= i32::MIN as i64 && value <= i32::MAX as i64 {
        RawType::Integer
    } else {
        RawType::LongInteger
    }
}

/// §3/§9: `decimal` (f32) is chosen only when the value round-trips losslessly through `f32`
/// and is neither NaN nor infinite; NaN/infinite values always use `long_decimal`.
pub fn identify_decimal(value: f64) -> RawType {
    if value.is_nan() || value.is_infinite() {
        return RawType::LongDecimal;
    }
    let narrowed = value as f32;
    if narrowed as f64 == value {
        RawType::Decimal
    } else {
        RawType::LongDecimal
    }
}

/// String width selection rule (§3).
pub fn identify_string(len: usize) -> RawType {
    if len <= SSO_THRESHOLD {
        RawType::SmallString
    } else if len <= u16::MAX as usize {
        RawType::String
    } else {
        RawType::BigString
    }
}
