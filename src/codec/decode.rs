//! Decoding half of the typed-value codec
//!
//! All functions take a buffer and an absolute position and validate bounds
//! before touching payload bytes, so a successfully decoded [`Descriptor`]
//! can be sliced without further checks.

use byteorder::{ByteOrder, LittleEndian};

use super::types::{Scalar, WireType, MISSING_INT};
use crate::error::CodecError;

/// A decoded size-descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    /// Number of elements in the payload
    pub count: usize,
    /// Element type
    pub ty: WireType,
    /// Absolute position of the first payload byte
    pub payload: usize,
}
impl Descriptor {
    /// Number of payload bytes
    #[must_use]
    pub fn payload_len(&self) -> usize {
        self.count * self.ty.size()
    }

    /// Absolute position just past the payload
    #[must_use]
    pub fn end(&self) -> usize {
        self.payload + self.payload_len()
    }

    /// The payload bytes within `buf`
    ///
    /// `buf` must be the buffer the descriptor was decoded from.
    #[must_use]
    pub fn bytes<'a>(&self, buf: &'a [u8]) -> &'a [u8] {
        &buf[self.payload..self.end()]
    }
}

fn ensure(buf: &[u8], offset: usize, needed: usize) -> Result<(), CodecError> {
    if offset.checked_add(needed).is_some_and(|end| end <= buf.len()) {
        Ok(())
    } else {
        Err(CodecError::TruncatedInput {
            needed,
            offset,
            available: buf.len(),
        })
    }
}

/// Decodes the descriptor at `pos`
///
/// A count nibble of 15 is always resolved through the escaped integer that
/// follows the descriptor byte; every smaller nibble, including 8 through 14,
/// is the literal count.
///
/// # Errors
///
/// * [`CodecError::TruncatedInput`] if the descriptor or its payload runs past the buffer
/// * [`CodecError::UnsupportedType`] if the type tag is unassigned
/// * [`CodecError::InvalidCount`] if an escaped count is negative
pub fn decode_size(buf: &[u8], pos: usize) -> Result<Descriptor, CodecError> {
    ensure(buf, pos, 1)?;
    let byte = buf[pos];
    let ty = WireType::from_tag(byte)?;
    let nibble = byte >> 4;
    let (count, payload) = if nibble == 15 {
        decode_count(buf, pos + 1)?
    } else {
        (nibble as usize, pos + 1)
    };
    let desc = Descriptor { count, ty, payload };
    ensure(buf, payload, desc.payload_len())?;
    Ok(desc)
}

/// Decodes the escaped element count that follows a descriptor with nibble 15
fn decode_count(buf: &[u8], pos: usize) -> Result<(usize, usize), CodecError> {
    ensure(buf, pos, 1)?;
    let ty = WireType::from_tag(buf[pos])?;
    if buf[pos] >> 4 != 1 {
        return Err(CodecError::InvalidCount(i32::from(buf[pos] >> 4)));
    }
    ensure(buf, pos + 1, ty.size())?;
    let count = match ty {
        WireType::UInt8 => i32::from(buf[pos + 1]),
        WireType::Int8 | WireType::Int16 | WireType::Int32 => read_int(buf, pos + 1, ty),
        other => return Err(CodecError::UnsupportedType(other.tag())),
    };
    if count < 0 {
        return Err(CodecError::InvalidCount(count));
    }
    Ok((count as usize, pos + 1 + ty.size()))
}

/// Decodes a single integer with its own descriptor
///
/// Returns the value sign-extended to 32 bits and the position after it.
///
/// # Errors
///
/// * [`CodecError::UnsupportedType`] if the value is not an 8/16/32-bit integer
/// * [`CodecError::InvalidCount`] if the descriptor does not hold exactly one value
/// * [`CodecError::TruncatedInput`] if the buffer ends early
pub fn decode_int1(buf: &[u8], pos: usize) -> Result<(i32, usize), CodecError> {
    let desc = decode_size(buf, pos)?;
    if !desc.ty.is_int() {
        return Err(CodecError::UnsupportedType(desc.ty.tag()));
    }
    if desc.count != 1 {
        return Err(CodecError::InvalidCount(desc.count as i32));
    }
    Ok((read_int(buf, desc.payload, desc.ty), desc.end()))
}

/// Reads one integer of width `ty` at `at`, mapping the width's missing marker
/// to [`MISSING_INT`]
///
/// The caller must have validated the bounds.
fn read_int(buf: &[u8], at: usize, ty: WireType) -> i32 {
    match ty {
        WireType::Int8 => match i8::from_le_bytes([buf[at]]) {
            i8::MIN => MISSING_INT,
            x => i32::from(x),
        },
        WireType::Int16 => match LittleEndian::read_i16(&buf[at..]) {
            i16::MIN => MISSING_INT,
            x => i32::from(x),
        },
        _ => LittleEndian::read_i32(&buf[at..]),
    }
}

/// Iterates over the integer payload of `desc`
///
/// # Errors
///
/// Returns [`CodecError::UnsupportedType`] for non-integer descriptors.
pub fn ints<'a>(
    buf: &'a [u8],
    desc: &Descriptor,
) -> Result<impl Iterator<Item = i32> + 'a, CodecError> {
    if !desc.ty.is_int() {
        return Err(CodecError::UnsupportedType(desc.ty.tag()));
    }
    let ty = desc.ty;
    let width = ty.size();
    let start = desc.payload;
    Ok((0..desc.count).map(move |i| read_int(buf, start + i * width, ty)))
}

/// Iterates over the float payload of `desc`
///
/// # Errors
///
/// Returns [`CodecError::UnsupportedType`] for non-float descriptors.
pub fn floats<'a>(
    buf: &'a [u8],
    desc: &Descriptor,
) -> Result<impl Iterator<Item = f32> + 'a, CodecError> {
    if desc.ty != WireType::Float {
        return Err(CodecError::UnsupportedType(desc.ty.tag()));
    }
    Ok(desc
        .bytes(buf)
        .chunks_exact(4)
        .map(|c| f32::from_bits(LittleEndian::read_u32(c))))
}

/// Reads element `index` of a numeric payload as an inline scalar
///
/// Returns `None` for non-numeric types or an out-of-range index.
#[must_use]
pub fn scalar_at(buf: &[u8], desc: &Descriptor, index: usize) -> Option<Scalar> {
    if index >= desc.count {
        return None;
    }
    let at = desc.payload + index * desc.ty.size();
    match desc.ty {
        ty if ty.is_int() => Some(Scalar::Int(read_int(buf, at, ty))),
        WireType::Float => Some(Scalar::Float(f32::from_bits(LittleEndian::read_u32(
            &buf[at..],
        )))),
        _ => None,
    }
}

/// A forward-only reader over a sequence of typed values
#[derive(Debug, Clone, Copy)]
pub struct TypedCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}
impl<'a> TypedCursor<'a> {
    #[must_use]
    pub fn new(buf: &'a [u8], pos: usize) -> Self {
        Self { buf, pos }
    }

    /// Current absolute position
    #[must_use]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// The underlying buffer
    #[must_use]
    pub fn buffer(&self) -> &'a [u8] {
        self.buf
    }

    /// Decodes the next descriptor and skips past its payload
    pub fn next_value(&mut self) -> Result<Descriptor, CodecError> {
        let desc = decode_size(self.buf, self.pos)?;
        self.pos = desc.end();
        Ok(desc)
    }

    /// Decodes the next descriptor without skipping its payload
    pub fn next_descriptor(&mut self) -> Result<Descriptor, CodecError> {
        let desc = decode_size(self.buf, self.pos)?;
        self.pos = desc.payload;
        Ok(desc)
    }

    /// Decodes the next single integer
    pub fn next_int1(&mut self) -> Result<i32, CodecError> {
        let (x, next) = decode_int1(self.buf, self.pos)?;
        self.pos = next;
        Ok(x)
    }

    /// Skips `n` raw bytes
    pub fn skip(&mut self, n: usize) -> Result<(), CodecError> {
        ensure(self.buf, self.pos, n)?;
        self.pos += n;
        Ok(())
    }
}
