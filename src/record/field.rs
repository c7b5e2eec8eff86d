//! Borrowed views over INFO and FORMAT values inside a record buffer

use crate::codec::{
    encode_flag, encode_floats, encode_ints, encode_str, floats, ints, scalar_at, Descriptor,
    Scalar, WireType,
};
use crate::error::{CodecError, Result};
use crate::header::ValueKind;

/// An owned, decoded field value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Presence-only value
    Flag,
    Int(Vec<i32>),
    Float(Vec<f32>),
    Str(String),
}
impl Value {
    /// Decodes the payload of `desc` into an owned value
    ///
    /// String payloads have their trailing NUL padding removed.
    pub fn decode(buf: &[u8], desc: &Descriptor) -> Result<Self> {
        match desc.ty {
            WireType::Flag => Ok(Self::Flag),
            ty if ty.is_int() => Ok(Self::Int(ints(buf, desc)?.collect())),
            WireType::Float => Ok(Self::Float(floats(buf, desc)?.collect())),
            WireType::CStr => {
                let s = std::str::from_utf8(trim_nul(desc.bytes(buf)))?;
                Ok(Self::Str(s.to_string()))
            }
            other => Err(CodecError::UnsupportedType(other.tag()).into()),
        }
    }

    /// Appends the value with its own descriptor
    pub fn encode(&self, buf: &mut Vec<u8>) -> Result<()> {
        match self {
            Self::Flag => encode_flag(buf),
            Self::Int(v) => encode_ints(buf, v)?,
            Self::Float(v) => encode_floats(buf, v)?,
            Self::Str(s) => encode_str(buf, s.as_bytes())?,
        }
        Ok(())
    }

    /// The declared kind this value satisfies
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Flag => ValueKind::Flag,
            Self::Int(_) => ValueKind::Integer,
            Self::Float(_) => ValueKind::Float,
            Self::Str(_) => ValueKind::String,
        }
    }

    /// Number of elements the value carries on the wire
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Flag => 0,
            Self::Int(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Str(s) => s.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Strips trailing NUL padding from a string payload
pub(crate) fn trim_nul(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    &bytes[..end]
}

/// A single INFO key/value pair
#[derive(Debug, Clone, Copy)]
pub struct InfoField<'a> {
    key: usize,
    desc: Descriptor,
    scalar: Option<Scalar>,
    buf: &'a [u8],
}
impl<'a> InfoField<'a> {
    pub(crate) fn new(key: usize, desc: Descriptor, buf: &'a [u8]) -> Self {
        let scalar = if desc.count == 1 {
            scalar_at(buf, &desc, 0)
        } else {
            None
        };
        Self {
            key,
            desc,
            scalar,
            buf,
        }
    }

    /// Dictionary id of the key
    #[must_use]
    pub fn key(&self) -> usize {
        self.key
    }

    #[must_use]
    pub fn ty(&self) -> WireType {
        self.desc.ty
    }

    /// Number of elements
    #[must_use]
    pub fn count(&self) -> usize {
        self.desc.count
    }

    #[must_use]
    pub fn is_vector(&self) -> bool {
        self.desc.count != 1
    }

    /// The inline value when the field holds exactly one number
    #[must_use]
    pub fn scalar(&self) -> Option<Scalar> {
        self.scalar
    }

    /// Raw payload bytes within the owning record's buffer
    #[must_use]
    pub fn payload(&self) -> &'a [u8] {
        self.desc.bytes(self.buf)
    }

    pub fn value(&self) -> Result<Value> {
        Value::decode(self.buf, &self.desc)
    }
}

/// One FORMAT key with its values for every sample
///
/// All samples share one element type and per-sample count; shorter sample
/// vectors are padded with the missing marker (NUL for strings).
#[derive(Debug, Clone, Copy)]
pub struct FormatField<'a> {
    key: usize,
    desc: Descriptor,
    n_sample: usize,
    buf: &'a [u8],
}
impl<'a> FormatField<'a> {
    pub(crate) fn new(key: usize, desc: Descriptor, n_sample: usize, buf: &'a [u8]) -> Self {
        Self {
            key,
            desc,
            n_sample,
            buf,
        }
    }

    /// Dictionary id of the key
    #[must_use]
    pub fn key(&self) -> usize {
        self.key
    }

    #[must_use]
    pub fn ty(&self) -> WireType {
        self.desc.ty
    }

    /// Number of elements per sample
    #[must_use]
    pub fn count(&self) -> usize {
        self.desc.count
    }

    #[must_use]
    pub fn is_vector(&self) -> bool {
        self.desc.count != 1
    }

    #[must_use]
    pub fn n_sample(&self) -> usize {
        self.n_sample
    }

    /// Raw payload bytes of all samples
    #[must_use]
    pub fn payload(&self) -> &'a [u8] {
        let start = self.desc.payload;
        &self.buf[start..start + self.n_sample * self.desc.payload_len()]
    }

    /// Descriptor addressing the block of sample `sid`
    fn sample_desc(&self, sid: usize) -> Option<Descriptor> {
        (sid < self.n_sample).then(|| Descriptor {
            payload: self.desc.payload + sid * self.desc.payload_len(),
            ..self.desc
        })
    }

    /// Raw payload bytes of sample `sid`
    #[must_use]
    pub fn sample_bytes(&self, sid: usize) -> Option<&'a [u8]> {
        self.sample_desc(sid).map(|desc| desc.bytes(self.buf))
    }

    /// The inline value of sample `sid` when each sample holds one number
    #[must_use]
    pub fn scalar(&self, sid: usize) -> Option<Scalar> {
        if self.desc.count != 1 {
            return None;
        }
        self.sample_desc(sid)
            .and_then(|desc| scalar_at(self.buf, &desc, 0))
    }

    /// Integer values of sample `sid`, padding included
    pub fn ints(&self, sid: usize) -> Result<Option<Vec<i32>>> {
        match self.sample_desc(sid) {
            Some(desc) => Ok(Some(ints(self.buf, &desc)?.collect())),
            None => Ok(None),
        }
    }

    /// Decoded value of sample `sid`
    pub fn value(&self, sid: usize) -> Result<Option<Value>> {
        self.sample_desc(sid)
            .map(|desc| Value::decode(self.buf, &desc))
            .transpose()
    }
}
