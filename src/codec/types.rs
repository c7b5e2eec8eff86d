use crate::error::CodecError;

/// Byte width of each wire type, indexed by its 4-bit tag
///
/// Tags without an assigned type have width 0.
pub const TYPE_SIZE: [u8; 16] = [0, 1, 2, 4, 8, 4, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0];

/// Missing value marker for integers once widened to 32 bits
pub const MISSING_INT: i32 = i32::MIN;

/// Bit pattern of the missing float value (a signalling NaN)
#[allow(clippy::unreadable_literal)]
pub const MISSING_FLOAT_BITS: u32 = 0x7F800001;

/// Returns the float used to mark a missing value
#[must_use]
pub fn missing_float() -> f32 {
    f32::from_bits(MISSING_FLOAT_BITS)
}

/// Checks a float against the missing bit pattern
///
/// Ordinary NaNs are not missing; only the exact reserved pattern is.
#[must_use]
pub fn is_missing_float(x: f32) -> bool {
    x.to_bits() == MISSING_FLOAT_BITS
}

/// Element types that can appear in the low nibble of a descriptor byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireType {
    /// Presence-only value without payload
    Flag = 0,
    Int8 = 1,
    Int16 = 2,
    Int32 = 3,
    Int64 = 4,
    Float = 5,
    Bool = 8,
    /// Character bytes, one per element
    CStr = 9,
    UInt8 = 13,
}
impl WireType {
    /// Parses the type from the low nibble of a descriptor byte
    pub fn from_tag(tag: u8) -> Result<Self, CodecError> {
        match tag & 0x0f {
            0 => Ok(Self::Flag),
            1 => Ok(Self::Int8),
            2 => Ok(Self::Int16),
            3 => Ok(Self::Int32),
            4 => Ok(Self::Int64),
            5 => Ok(Self::Float),
            8 => Ok(Self::Bool),
            9 => Ok(Self::CStr),
            13 => Ok(Self::UInt8),
            x => Err(CodecError::UnsupportedType(x)),
        }
    }

    /// The 4-bit tag of this type
    #[must_use]
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// The number of bytes a single element occupies
    #[must_use]
    pub fn size(self) -> usize {
        TYPE_SIZE[self.tag() as usize] as usize
    }

    /// Whether the type is one of the signed integer widths used for values
    #[must_use]
    pub fn is_int(self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32)
    }

    /// A short human readable name used in error messages
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Flag => "flag",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::CStr => "string",
            Self::UInt8 => "uint8",
        }
    }
}

/// An inline single value
///
/// Vectors are never materialized through this type; see the field views in
/// [`crate::record`] for borrowed access to vector payloads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Int(i32),
    Float(f32),
}
impl Scalar {
    /// Whether the scalar holds the missing marker of its type
    #[must_use]
    pub fn is_missing(&self) -> bool {
        match *self {
            Self::Int(x) => x == MISSING_INT,
            Self::Float(x) => is_missing_float(x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_sizes() {
        assert_eq!(WireType::Flag.size(), 0);
        assert_eq!(WireType::Int8.size(), 1);
        assert_eq!(WireType::Int16.size(), 2);
        assert_eq!(WireType::Int32.size(), 4);
        assert_eq!(WireType::Int64.size(), 8);
        assert_eq!(WireType::Float.size(), 4);
        assert_eq!(WireType::Bool.size(), 0);
        assert_eq!(WireType::CStr.size(), 1);
        assert_eq!(WireType::UInt8.size(), 1);
    }

    #[test]
    fn test_from_tag() {
        assert_eq!(WireType::from_tag(0x11).unwrap(), WireType::Int8); // upper bits ignored
        assert_eq!(WireType::from_tag(13).unwrap(), WireType::UInt8);
        assert_eq!(
            WireType::from_tag(7).unwrap_err(),
            CodecError::UnsupportedType(7)
        );
    }

    #[test]
    fn test_missing_float() {
        assert!(is_missing_float(missing_float()));
        assert!(!is_missing_float(f32::NAN));
        assert!(Scalar::Float(missing_float()).is_missing());
        assert!(Scalar::Int(MISSING_INT).is_missing());
        assert!(!Scalar::Int(0).is_missing());
    }
}
