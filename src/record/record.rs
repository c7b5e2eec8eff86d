use std::io::Write;

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};

use super::field::{trim_nul, FormatField, InfoField};
use crate::codec::{
    decode_size, ints, is_missing_float, missing_float, Descriptor, TypedCursor, WireType,
};
use crate::error::{CodecError, Error, RecordError, Result};
use crate::header::{Category, ExpectedCount, KeyDictionary, KeyInfo, ValueKind};

/// Size of the fixed record prefix in bytes
///
/// `l_str` (u32), `rid` (i32), `pos` (i32), `qual` (f32), `n_alt` (u16), `n_fmt` (u16)
pub const SIZE_RECORD_PREFIX: usize = 20;

/// The FORMAT key whose values are stored as encoded alleles
pub const GENOTYPE_KEY: &str = "GT";

/// Start positions of each section within the record buffer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SectionOffsets {
    pub id: usize,
    pub reference: usize,
    pub alt: usize,
    pub filter: usize,
    pub info: usize,
    pub format: usize,
    pub genotype: usize,
    pub end: usize,
}

/// Wraps a codec failure at section position `pos`
fn malformed(pos: usize) -> impl FnOnce(CodecError) -> Error {
    move |source| {
        RecordError::MalformedRecord {
            offset: SIZE_RECORD_PREFIX + pos,
            source,
        }
        .into()
    }
}

/// Returns the length of the record starting with `prefix`
///
/// `prefix` must hold at least the four bytes of `l_str`.
#[must_use]
pub fn record_size(prefix: &[u8]) -> usize {
    SIZE_RECORD_PREFIX + LittleEndian::read_u32(prefix) as usize
}

/// A single variant record
///
/// The fixed columns are decoded eagerly; everything else stays encoded in
/// one byte buffer and is decoded on access from the recorded section offsets.
/// A record can be reused across reads, in which case [`clear`](Self::clear)
/// keeps its allocation.
#[derive(Debug, Clone)]
pub struct VariantRecord {
    rid: i32,
    /// 0-based position
    pos: i32,
    qual: f32,
    n_alt: u16,
    n_fmt: u16,
    n_info: usize,
    n_sample: usize,
    buffer: Vec<u8>,
    offsets: SectionOffsets,
}
impl Default for VariantRecord {
    fn default() -> Self {
        Self {
            rid: 0,
            pos: 0,
            qual: missing_float(),
            n_alt: 0,
            n_fmt: 0,
            n_info: 0,
            n_sample: 0,
            buffer: Vec::new(),
            offsets: SectionOffsets::default(),
        }
    }
}
impl PartialEq for VariantRecord {
    fn eq(&self, other: &Self) -> bool {
        self.rid == other.rid
            && self.pos == other.pos
            && self.qual.to_bits() == other.qual.to_bits()
            && self.n_alt == other.n_alt
            && self.n_fmt == other.n_fmt
            && self.buffer == other.buffer
    }
}
impl VariantRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assembles a record from encoded sections and validates it
    pub(crate) fn from_parts(
        rid: i32,
        pos: i32,
        qual: f32,
        n_alt: u16,
        n_fmt: u16,
        buffer: Vec<u8>,
        dict: &KeyDictionary,
    ) -> Result<Self> {
        let mut record = Self {
            rid,
            pos,
            qual,
            n_alt,
            n_fmt,
            buffer,
            ..Self::default()
        };
        record.index(dict)?;
        Ok(record)
    }

    /// Decodes a complete record (fixed prefix and sections) from `bytes`
    pub fn from_bytes(bytes: &[u8], dict: &KeyDictionary) -> Result<Self> {
        let mut record = Self::default();
        record.load(bytes, dict)?;
        Ok(record)
    }

    /// Replaces the contents of this record with the record encoded in `bytes`
    ///
    /// # Errors
    ///
    /// * [`RecordError::Truncated`] if `bytes` is shorter than the record it describes
    /// * [`RecordError::TrailingBytes`] if `bytes` is longer
    /// * Any malformed-record error raised while indexing the sections
    ///
    /// A record that fails to index is left empty, as after [`clear`](Self::clear).
    pub fn load(&mut self, bytes: &[u8], dict: &KeyDictionary) -> Result<()> {
        if bytes.len() < SIZE_RECORD_PREFIX {
            return Err(RecordError::Truncated {
                expected: SIZE_RECORD_PREFIX,
                found: bytes.len(),
            }
            .into());
        }
        let size = record_size(bytes);
        if bytes.len() < size {
            return Err(RecordError::Truncated {
                expected: size,
                found: bytes.len(),
            }
            .into());
        }
        if bytes.len() > size {
            return Err(RecordError::TrailingBytes {
                offset: size,
                found: bytes.len() - size,
            }
            .into());
        }

        self.rid = LittleEndian::read_i32(&bytes[4..]);
        self.pos = LittleEndian::read_i32(&bytes[8..]);
        self.qual = LittleEndian::read_f32(&bytes[12..]);
        self.n_alt = LittleEndian::read_u16(&bytes[16..]);
        self.n_fmt = LittleEndian::read_u16(&bytes[18..]);
        self.buffer.clear();
        self.buffer.extend_from_slice(&bytes[SIZE_RECORD_PREFIX..]);
        if let Err(e) = self.index(dict) {
            self.clear();
            return Err(e);
        }
        Ok(())
    }

    /// Walks every section once, recording offsets and validating keys,
    /// declared types, and cardinalities against the dictionary
    fn index(&mut self, dict: &KeyDictionary) -> Result<()> {
        if usize::try_from(self.rid)
            .ok()
            .and_then(|rid| dict.contig_key(rid))
            .is_none()
        {
            return Err(RecordError::UnknownKey {
                category: Category::Contig,
                key: i64::from(self.rid),
                offset: 4,
            }
            .into());
        }

        let buf = self.buffer.as_slice();
        let n_alt = usize::from(self.n_alt);
        let n_sample = dict.n_sample();
        let mut offsets = SectionOffsets::default();
        let mut cursor = TypedCursor::new(buf, 0);

        offsets.id = cursor.pos();
        next_string(&mut cursor, "ID")?;
        offsets.reference = cursor.pos();
        next_string(&mut cursor, "REF")?;
        offsets.alt = cursor.pos();
        for _ in 0..n_alt {
            next_string(&mut cursor, "ALT")?;
        }

        offsets.filter = cursor.pos();
        let filters = next_key_vector(&mut cursor)?;
        for key in ints(buf, &filters).map_err(malformed(offsets.filter))? {
            check_key(dict, Category::Filter, key, offsets.filter)?;
        }

        offsets.info = cursor.pos();
        let n_info = cursor.next_int1().map_err(malformed(offsets.info))?;
        let n_info = usize::try_from(n_info)
            .map_err(|_| malformed(offsets.info)(CodecError::InvalidCount(n_info)))?;
        for _ in 0..n_info {
            let at = cursor.pos();
            let key = cursor.next_int1().map_err(malformed(at))?;
            let id = check_key(dict, Category::Info, key, at)?;
            let at = cursor.pos();
            let desc = cursor.next_value().map_err(malformed(at))?;
            check_value(dict, id, Category::Info, &desc, n_alt)?;
        }

        offsets.format = cursor.pos();
        let keys = next_key_vector(&mut cursor)?;
        if keys.count != usize::from(self.n_fmt) {
            return Err(RecordError::CardinalityMismatch {
                key: "FORMAT".to_string(),
                expected: usize::from(self.n_fmt),
                found: keys.count,
            }
            .into());
        }

        offsets.genotype = cursor.pos();
        for key in ints(buf, &keys).map_err(malformed(offsets.format))? {
            let id = check_key(dict, Category::Format, key, offsets.format)?;
            let at = cursor.pos();
            let desc = cursor.next_descriptor().map_err(malformed(at))?;
            check_value(dict, id, Category::Format, &desc, n_alt)?;
            cursor
                .skip(n_sample * desc.payload_len())
                .map_err(malformed(desc.payload))?;
        }

        offsets.end = cursor.pos();
        if offsets.end != buf.len() {
            return Err(RecordError::TrailingBytes {
                offset: SIZE_RECORD_PREFIX + offsets.end,
                found: buf.len() - offsets.end,
            }
            .into());
        }

        self.offsets = offsets;
        self.n_info = n_info;
        self.n_sample = n_sample;
        Ok(())
    }

    /// Writes the fixed prefix and the section buffer
    pub fn write_bytes<W: Write>(&self, writer: &mut W) -> Result<()> {
        let l_str = u32::try_from(self.buffer.len())
            .map_err(|_| RecordError::TooLarge(self.buffer.len()))?;
        writer.write_u32::<LittleEndian>(l_str)?;
        writer.write_i32::<LittleEndian>(self.rid)?;
        writer.write_i32::<LittleEndian>(self.pos)?;
        writer.write_f32::<LittleEndian>(self.qual)?;
        writer.write_u16::<LittleEndian>(self.n_alt)?;
        writer.write_u16::<LittleEndian>(self.n_fmt)?;
        writer.write_all(&self.buffer)?;
        Ok(())
    }

    /// Resets the record while keeping the buffer allocation
    pub fn clear(&mut self) {
        self.rid = 0;
        self.pos = 0;
        self.qual = missing_float();
        self.n_alt = 0;
        self.n_fmt = 0;
        self.n_info = 0;
        self.n_sample = 0;
        self.buffer.clear();
        self.offsets = SectionOffsets::default();
    }

    /// Contig index
    #[must_use]
    pub fn rid(&self) -> usize {
        self.rid as usize
    }

    /// 0-based position
    #[must_use]
    pub fn pos(&self) -> i32 {
        self.pos
    }

    /// Quality, or `None` when missing
    #[must_use]
    pub fn qual(&self) -> Option<f32> {
        (!is_missing_float(self.qual)).then_some(self.qual)
    }

    /// Number of alternate alleles
    #[must_use]
    pub fn n_alt(&self) -> usize {
        usize::from(self.n_alt)
    }

    /// Number of FORMAT keys
    #[must_use]
    pub fn n_fmt(&self) -> usize {
        usize::from(self.n_fmt)
    }

    /// Number of INFO pairs
    #[must_use]
    pub fn n_info(&self) -> usize {
        self.n_info
    }

    /// Number of samples the genotype blocks were indexed with
    #[must_use]
    pub fn n_sample(&self) -> usize {
        self.n_sample
    }

    /// The encoded section buffer
    #[must_use]
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    #[must_use]
    pub fn offsets(&self) -> SectionOffsets {
        self.offsets
    }

    /// Size of the record on the wire
    #[must_use]
    pub fn size(&self) -> usize {
        SIZE_RECORD_PREFIX + self.buffer.len()
    }

    /// Name of the record's contig
    #[must_use]
    pub fn contig<'d>(&self, dict: &'d KeyDictionary) -> Option<&'d str> {
        dict.contig_name(self.rid())
    }

    fn str_at(&self, pos: usize) -> Result<&str> {
        let desc = decode_size(&self.buffer, pos)?;
        Ok(std::str::from_utf8(trim_nul(desc.bytes(&self.buffer)))?)
    }

    /// Variant identifier; empty when missing
    pub fn id(&self) -> Result<&str> {
        self.str_at(self.offsets.id)
    }

    /// Reference allele
    pub fn reference(&self) -> Result<&str> {
        self.str_at(self.offsets.reference)
    }

    /// Alternate alleles in order
    pub fn alts(&self) -> Result<Vec<&str>> {
        let mut cursor = TypedCursor::new(&self.buffer, self.offsets.alt);
        (0..self.n_alt())
            .map(|_| {
                let desc = cursor.next_value()?;
                Ok(std::str::from_utf8(trim_nul(desc.bytes(&self.buffer)))?)
            })
            .collect()
    }

    /// FILTER key ids
    pub fn filters(&self) -> Result<Vec<usize>> {
        let desc = decode_size(&self.buffer, self.offsets.filter)?;
        Ok(ints(&self.buffer, &desc)?.map(|k| k as usize).collect())
    }

    /// Whether the record carries exactly the PASS filter
    pub fn is_pass(&self) -> Result<bool> {
        Ok(self.filters()? == [0])
    }

    /// All INFO pairs in wire order
    pub fn info_fields(&self) -> Result<Vec<InfoField<'_>>> {
        let mut cursor = TypedCursor::new(&self.buffer, self.offsets.info);
        cursor.next_int1()?;
        (0..self.n_info)
            .map(|_| {
                let key = cursor.next_int1()? as usize;
                let desc = cursor.next_value()?;
                Ok(InfoField::new(key, desc, &self.buffer))
            })
            .collect()
    }

    /// The INFO value of key `key`, if the record carries it
    pub fn info(&self, key: usize) -> Result<Option<InfoField<'_>>> {
        let mut cursor = TypedCursor::new(&self.buffer, self.offsets.info);
        cursor.next_int1()?;
        for _ in 0..self.n_info {
            let id = cursor.next_int1()? as usize;
            let desc = cursor.next_value()?;
            if id == key {
                return Ok(Some(InfoField::new(key, desc, &self.buffer)));
            }
        }
        Ok(None)
    }

    /// FORMAT key ids in wire order
    pub fn format_keys(&self) -> Result<Vec<usize>> {
        let desc = decode_size(&self.buffer, self.offsets.format)?;
        Ok(ints(&self.buffer, &desc)?.map(|k| k as usize).collect())
    }

    /// All FORMAT fields in wire order
    pub fn format_fields(&self) -> Result<Vec<FormatField<'_>>> {
        let mut cursor = TypedCursor::new(&self.buffer, self.offsets.genotype);
        self.format_keys()?
            .into_iter()
            .map(|key| {
                let desc = cursor.next_descriptor()?;
                cursor.skip(self.n_sample * desc.payload_len())?;
                Ok(FormatField::new(key, desc, self.n_sample, &self.buffer))
            })
            .collect()
    }

    /// The FORMAT field of key `key`, if the record carries it
    pub fn format(&self, key: usize) -> Result<Option<FormatField<'_>>> {
        Ok(self.format_fields()?.into_iter().find(|f| f.key() == key))
    }
}

/// Decodes the next value and requires it to be a string
fn next_string(cursor: &mut TypedCursor<'_>, section: &str) -> Result<()> {
    let at = cursor.pos();
    let desc = cursor.next_value().map_err(malformed(at))?;
    if desc.ty != WireType::CStr && desc.count > 0 {
        return Err(RecordError::TypeMismatch {
            key: section.to_string(),
            expected: "string",
            found: desc.ty.name(),
        }
        .into());
    }
    Ok(())
}

/// Decodes the next value and requires it to be an integer vector
fn next_key_vector(cursor: &mut TypedCursor<'_>) -> Result<Descriptor> {
    let at = cursor.pos();
    let desc = cursor.next_value().map_err(malformed(at))?;
    if !desc.ty.is_int() {
        return Err(malformed(at)(CodecError::UnsupportedType(desc.ty.tag())));
    }
    Ok(desc)
}

/// Resolves a wire key id that must be declared in `category`
fn check_key(dict: &KeyDictionary, category: Category, key: i32, pos: usize) -> Result<usize> {
    usize::try_from(key)
        .ok()
        .filter(|&id| dict.definition(id, category).is_some())
        .ok_or_else(|| {
            RecordError::UnknownKey {
                category,
                key: i64::from(key),
                offset: SIZE_RECORD_PREFIX + pos,
            }
            .into()
        })
}

/// Whether a FORMAT key stores encoded alleles rather than its declared type
pub(crate) fn is_genotype(dict: &KeyDictionary, id: usize, category: Category) -> bool {
    category == Category::Format && dict.resolve(id).is_ok_and(|e| e.key() == GENOTYPE_KEY)
}

/// Checks a value descriptor against the declared type and cardinality
///
/// Empty values stand for missing and always pass. String lengths are byte
/// counts and are not compared against the cardinality.
fn check_value(
    dict: &KeyDictionary,
    id: usize,
    category: Category,
    desc: &Descriptor,
    n_alt: usize,
) -> Result<()> {
    if desc.count == 0 {
        return Ok(());
    }
    let entry = dict.resolve(id)?;
    let Some(info) = entry.definition(category) else {
        return Err(RecordError::UnknownKey {
            category,
            key: id as i64,
            offset: SIZE_RECORD_PREFIX + desc.payload,
        }
        .into());
    };

    if is_genotype(dict, id, category) {
        if !desc.ty.is_int() {
            return Err(RecordError::TypeMismatch {
                key: entry.key().to_string(),
                expected: "genotype",
                found: desc.ty.name(),
            }
            .into());
        }
        return Ok(());
    }

    if !kind_matches(info, desc.ty) {
        return Err(RecordError::TypeMismatch {
            key: entry.key().to_string(),
            expected: info.kind.name(),
            found: desc.ty.name(),
        }
        .into());
    }
    if let ExpectedCount::Exactly(n) = info.expected_count(n_alt) {
        if info.kind != ValueKind::String && desc.count != n {
            return Err(RecordError::CardinalityMismatch {
                key: entry.key().to_string(),
                expected: n,
                found: desc.count,
            }
            .into());
        }
    }
    Ok(())
}

fn kind_matches(info: &KeyInfo, ty: WireType) -> bool {
    match info.kind {
        ValueKind::Flag => ty == WireType::Flag,
        ValueKind::Integer => ty.is_int(),
        ValueKind::Float => ty == WireType::Float,
        ValueKind::String => ty == WireType::CStr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{encode_flag, encode_int1, encode_ints, encode_key, encode_str, Scalar};
    use crate::record::RecordBuilder;
    use crate::testing::HEADER;

    fn dict() -> KeyDictionary {
        KeyDictionary::from_text(HEADER).unwrap()
    }

    /// Hand-encodes a record with at most one INFO pair
    fn raw_record(info: impl FnOnce(&mut Vec<u8>)) -> Vec<u8> {
        let mut pair = Vec::new();
        info(&mut pair);

        let mut sections = Vec::new();
        encode_str(&mut sections, b"rs1").unwrap();
        encode_str(&mut sections, b"A").unwrap();
        encode_str(&mut sections, b"T").unwrap();
        encode_ints(&mut sections, &[0]).unwrap();
        encode_int1(&mut sections, i32::from(!pair.is_empty()));
        sections.extend_from_slice(&pair);
        encode_ints(&mut sections, &[]).unwrap();

        let record = VariantRecord {
            rid: 0,
            pos: 99,
            qual: 30.0,
            n_alt: 1,
            n_fmt: 0,
            buffer: sections,
            ..VariantRecord::default()
        };
        let mut bytes = Vec::new();
        record.write_bytes(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_decode_hand_encoded() -> anyhow::Result<()> {
        let dict = dict();
        let dp = dict.id_in(Category::Info, "DP")?;
        let bytes = raw_record(|buf| {
            encode_key(buf, dp);
            encode_int1(buf, 37);
        });
        let record = VariantRecord::from_bytes(&bytes, &dict)?;
        assert_eq!(record.size(), bytes.len());
        assert_eq!(record.pos(), 99);
        assert_eq!(record.qual(), Some(30.0));
        assert_eq!(record.id()?, "rs1");
        assert_eq!(record.reference()?, "A");
        assert_eq!(record.alts()?, vec!["T"]);
        assert!(record.is_pass()?);
        assert_eq!(record.n_info(), 1);

        let field = record.info(dp)?.expect("DP present");
        assert_eq!(field.scalar(), Some(Scalar::Int(37)));
        assert!(record.info(dict.id_in(Category::Info, "AF")?)?.is_none());
        Ok(())
    }

    #[test]
    fn test_offsets_are_monotonic() -> anyhow::Result<()> {
        let dict = dict();
        let record = RecordBuilder::default()
            .contig("chr1")
            .pos(10)
            .alleles("A", &["C", "G"])
            .info_ints("DP", &[5])
            .format_ints("DP", &[vec![1], vec![2]])
            .build(&dict)?;
        let o = record.offsets();
        assert!(o.id <= o.reference);
        assert!(o.reference < o.alt);
        assert!(o.alt < o.filter);
        assert!(o.filter < o.info);
        assert!(o.info < o.format);
        assert!(o.format < o.genotype);
        assert!(o.genotype < o.end);
        assert_eq!(o.end, record.buffer().len());
        Ok(())
    }

    #[test]
    fn test_unknown_info_key() -> anyhow::Result<()> {
        let dict = dict();
        // key 0 is PASS, which is not an INFO key
        let bytes = raw_record(|buf| {
            encode_key(buf, 0);
            encode_flag(buf);
        });
        let err = VariantRecord::from_bytes(&bytes, &dict).unwrap_err();
        assert!(err.is_malformed());
        assert!(matches!(
            err,
            Error::RecordError(RecordError::UnknownKey {
                category: Category::Info,
                key: 0,
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn test_info_type_mismatch() -> anyhow::Result<()> {
        let dict = dict();
        let dp = dict.id_in(Category::Info, "DP")?;
        let bytes = raw_record(|buf| {
            encode_key(buf, dp);
            encode_str(buf, b"deep").unwrap();
        });
        let err = VariantRecord::from_bytes(&bytes, &dict).unwrap_err();
        assert!(err.is_malformed());
        assert!(matches!(
            err,
            Error::RecordError(RecordError::TypeMismatch {
                expected: "Integer",
                found: "string",
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn test_info_cardinality_mismatch() -> anyhow::Result<()> {
        let dict = dict();
        let af = dict.id_in(Category::Info, "AF")?;
        // one ALT allele, two AF values
        let bytes = raw_record(|buf| {
            encode_key(buf, af);
            crate::codec::encode_floats(buf, &[0.1, 0.2]).unwrap();
        });
        let err = VariantRecord::from_bytes(&bytes, &dict).unwrap_err();
        assert!(matches!(
            err,
            Error::RecordError(RecordError::CardinalityMismatch {
                expected: 1,
                found: 2,
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn test_truncated_sections() -> anyhow::Result<()> {
        let dict = dict();
        let dp = dict.id_in(Category::Info, "DP")?;
        let mut bytes = raw_record(|buf| {
            encode_key(buf, dp);
            encode_int1(buf, 37);
        });

        // the length prefix claims more bytes than are present
        bytes.pop();
        let err = VariantRecord::from_bytes(&bytes, &dict).unwrap_err();
        assert!(matches!(
            err,
            Error::RecordError(RecordError::Truncated { .. })
        ));

        // shrink the length prefix so the FORMAT section is cut off
        let l_str = LittleEndian::read_u32(&bytes) - 1;
        LittleEndian::write_u32(&mut bytes, l_str);
        let err = VariantRecord::from_bytes(&bytes, &dict).unwrap_err();
        assert!(err.is_malformed());
        assert!(matches!(
            err,
            Error::RecordError(RecordError::MalformedRecord {
                source: CodecError::TruncatedInput { .. },
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn test_unknown_contig() {
        let dict = dict();
        let mut bytes = raw_record(|_| {});
        assert!(VariantRecord::from_bytes(&bytes, &dict).is_ok());

        LittleEndian::write_i32(&mut bytes[4..], 42);
        let err = VariantRecord::from_bytes(&bytes, &dict).unwrap_err();
        assert!(matches!(
            err,
            Error::RecordError(RecordError::UnknownKey {
                category: Category::Contig,
                key: 42,
                offset: 4
            })
        ));
    }

    #[test]
    fn test_failed_load_leaves_record_empty() -> anyhow::Result<()> {
        let dict = dict();
        let mut record = RecordBuilder::default()
            .contig("chr1")
            .pos(5)
            .alleles("A", &["T"])
            .info_ints("DP", &[12])
            .genotypes(&["0/1", "1/1"])
            .build(&dict)?;
        let mut bytes = Vec::new();
        record.write_bytes(&mut bytes)?;
        record.load(&bytes, &dict)?;
        assert_eq!(record.n_info(), 1);

        // key 0 is PASS, which is not an INFO key
        let bad = raw_record(|buf| {
            encode_key(buf, 0);
            encode_flag(buf);
        });
        assert!(record.load(&bad, &dict).is_err());
        assert_eq!(record.pos(), 0);
        assert_eq!(record.n_info(), 0);
        assert_eq!(record.n_sample(), 0);
        assert!(record.buffer().is_empty());
        assert_eq!(record.offsets(), SectionOffsets::default());

        // the same record is still usable for the next load
        record.load(&bytes, &dict)?;
        assert_eq!(record.pos(), 5);
        assert_eq!(record.n_info(), 1);
        Ok(())
    }

    #[test]
    fn test_clear_keeps_capacity() -> anyhow::Result<()> {
        let dict = dict();
        let mut record = RecordBuilder::default()
            .contig("chr1")
            .pos(1)
            .alleles("A", &["T"])
            .build(&dict)?;
        let capacity = record.buffer.capacity();
        record.clear();
        assert!(record.buffer().is_empty());
        assert_eq!(record.buffer.capacity(), capacity);
        assert_eq!(record.qual(), None);
        Ok(())
    }
}
