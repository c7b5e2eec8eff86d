//! Encoding half of the typed-value codec
//!
//! Every function appends to a growable byte buffer. Descriptors are written
//! before their payloads, and a failing call never leaves a partial value behind.

use super::types::{is_missing_float, WireType, MISSING_FLOAT_BITS, MISSING_INT};
use crate::error::CodecError;

/// Largest element count the escaped descriptor can express
pub const MAX_COUNT: usize = u8::MAX as usize;

/// Counts at or above this value use the escaped descriptor
const ESCAPE: usize = 15;

/// Appends the descriptor byte for `count` elements of type `ty`
///
/// Counts of 15 or more are written as a nibble of 15 followed by an inline
/// `uint8` descriptor and a literal count byte.
///
/// # Errors
///
/// Returns [`CodecError::CountTooLarge`] if `count` exceeds 255.
pub fn encode_size(buf: &mut Vec<u8>, count: usize, ty: WireType) -> Result<(), CodecError> {
    if count >= ESCAPE {
        if count > MAX_COUNT {
            return Err(CodecError::CountTooLarge(count));
        }
        buf.push((ESCAPE as u8) << 4 | ty.tag());
        buf.push(1 << 4 | WireType::UInt8.tag());
        buf.push(count as u8);
    } else {
        buf.push((count as u8) << 4 | ty.tag());
    }
    Ok(())
}

/// Selects the narrowest integer type for a single value
///
/// The minimum of each width is reserved as its missing marker and is
/// therefore never chosen for a real value.
#[must_use]
pub fn int_type(x: i32) -> WireType {
    if x <= i32::from(i8::MAX) && x > i32::from(i8::MIN) {
        WireType::Int8
    } else if x <= i32::from(i16::MAX) && x > i32::from(i16::MIN) {
        WireType::Int16
    } else {
        WireType::Int32
    }
}

/// Selects the narrowest integer type covering every non-missing value
#[must_use]
pub fn int_type_for(values: &[i32]) -> WireType {
    values
        .iter()
        .filter(|&&x| x != MISSING_INT)
        .map(|&x| int_type(x))
        .max_by_key(|ty| ty.size())
        .unwrap_or(WireType::Int8)
}

/// Appends a single integer with its own descriptor
///
/// The missing sentinel is always stored as the reserved `int8` marker.
pub fn encode_int1(buf: &mut Vec<u8>, x: i32) {
    let ty = if x == MISSING_INT {
        WireType::Int8
    } else {
        int_type(x)
    };
    buf.push(1 << 4 | ty.tag());
    put_int_payload(buf, &[x], ty);
}

/// Appends a dictionary key id as a single integer
pub fn encode_key(buf: &mut Vec<u8>, key: usize) {
    encode_int1(buf, key as i32);
}

/// Appends an integer vector using the narrowest width covering all values
pub fn encode_ints(buf: &mut Vec<u8>, values: &[i32]) -> Result<(), CodecError> {
    let ty = int_type_for(values);
    encode_size(buf, values.len(), ty)?;
    put_int_payload(buf, values, ty);
    Ok(())
}

/// Appends a float vector
pub fn encode_floats(buf: &mut Vec<u8>, values: &[f32]) -> Result<(), CodecError> {
    encode_size(buf, values.len(), WireType::Float)?;
    put_floats(buf, values);
    Ok(())
}

/// Appends a character vector
pub fn encode_str(buf: &mut Vec<u8>, value: &[u8]) -> Result<(), CodecError> {
    encode_size(buf, value.len(), WireType::CStr)?;
    buf.extend_from_slice(value);
    Ok(())
}

/// Appends a presence-only value
pub fn encode_flag(buf: &mut Vec<u8>) {
    buf.push(WireType::Flag.tag());
}

/// Appends integer payload bytes of width `ty` without a descriptor
///
/// Missing values are written as the minimum of the chosen width.
///
/// # Errors
///
/// Returns [`CodecError::UnsupportedType`] if `ty` is not one of the signed
/// 8/16/32-bit integer types.
pub fn put_ints(buf: &mut Vec<u8>, values: &[i32], ty: WireType) -> Result<(), CodecError> {
    if !ty.is_int() {
        return Err(CodecError::UnsupportedType(ty.tag()));
    }
    put_int_payload(buf, values, ty);
    Ok(())
}

/// `ty` must be an integer width; 32 bits are written for anything wider than 16
fn put_int_payload(buf: &mut Vec<u8>, values: &[i32], ty: WireType) {
    buf.reserve(values.len() * ty.size());
    for &x in values {
        let missing = x == MISSING_INT;
        match ty {
            WireType::Int8 => {
                let z = if missing { i8::MIN } else { x as i8 };
                buf.extend_from_slice(&z.to_le_bytes());
            }
            WireType::Int16 => {
                let z = if missing { i16::MIN } else { x as i16 };
                buf.extend_from_slice(&z.to_le_bytes());
            }
            _ => buf.extend_from_slice(&x.to_le_bytes()),
        }
    }
}

/// Appends float payload bytes without a descriptor
pub fn put_floats(buf: &mut Vec<u8>, values: &[f32]) {
    buf.reserve(values.len() * WireType::Float.size());
    for &x in values {
        let bits = if is_missing_float(x) {
            MISSING_FLOAT_BITS
        } else {
            x.to_bits()
        };
        buf.extend_from_slice(&bits.to_le_bytes());
    }
}
