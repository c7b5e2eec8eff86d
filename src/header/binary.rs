//! Binary form of the header block
//!
//! | Offset | Size (bytes) | Name    | Description                         | Type   |
//! | ------ | ------------ | ------- | ----------------------------------- | ------ |
//! | 0      | 4            | magic   | Magic number ("BCF\x02")            | uint32 |
//! | 4      | 1            | format  | Format version (currently 1)        | uint8  |
//! | 5      | 4            | l_dict  | Length of the dictionary section    | uint32 |
//! | 9      | 4            | l_text  | Length of the header text           | uint32 |
//! | 13     | l_dict       | dict    | Dictionary definitions              | bytes  |
//! | ..     | l_text       | text    | Verbatim header text                | bytes  |
//!
//! The dictionary section holds `n_key`, `n_ref`, and `n_sample` as typed
//! integers, followed by one definition per key in id order: the key name as a
//! typed string, three little-endian packed key-info words (FILTER, INFO,
//! FORMAT), then `rid`, `sid`, and `rlen` as typed integers (missing when unset).

use std::io::{Read, Write};

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};

use super::dictionary::{Category, KeyDictionary, KeyInfo};
use crate::codec::{encode_int1, encode_str, TypedCursor, WireType, MISSING_INT};
use crate::error::{CodecError, HeaderError, Result};

/// Magic number: "BCF\x02" in ASCII (in little-endian byte order)
#[allow(clippy::unreadable_literal)]
pub const MAGIC: u32 = 0x02464342;

/// Current format version of the binary header
pub const FORMAT: u8 = 1;

/// Size of the fixed prefix of the header block in bytes
pub const SIZE_HEADER_PREFIX: usize = 13;

fn optional_int(x: Option<usize>) -> i32 {
    x.map_or(MISSING_INT, |x| x as i32)
}

/// Reads exactly `len` bytes, growing the buffer only as data arrives
fn read_block<R: Read>(reader: &mut R, len: u32) -> Result<Vec<u8>> {
    let mut block = Vec::new();
    reader.by_ref().take(u64::from(len)).read_to_end(&mut block)?;
    if block.len() != len as usize {
        return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
    }
    Ok(block)
}

fn to_length(x: i32) -> Result<usize> {
    usize::try_from(x).map_err(|_| HeaderError::InvalidLength(x).into())
}

impl KeyDictionary {
    /// Encodes the dictionary definitions section
    pub fn encode_definitions(&self, buf: &mut Vec<u8>) -> Result<()> {
        encode_int1(buf, self.n_key() as i32);
        encode_int1(buf, self.n_ref() as i32);
        encode_int1(buf, self.n_sample() as i32);
        for entry in self.entries() {
            encode_str(buf, entry.key().as_bytes())?;
            for word in entry.info_words() {
                buf.extend_from_slice(&word.to_le_bytes());
            }
            encode_int1(buf, optional_int(entry.rid()));
            encode_int1(buf, optional_int(entry.sid()));
            encode_int1(
                buf,
                entry
                    .rlen()
                    .and_then(|l| i32::try_from(l).ok())
                    .unwrap_or(MISSING_INT),
            );
        }
        Ok(())
    }

    /// Rebuilds a dictionary from its definitions section and header text
    pub fn decode_definitions(buf: &[u8], text: String) -> Result<Self> {
        let mut cursor = TypedCursor::new(buf, 0);
        let n_key = to_length(cursor.next_int1()?)?;
        let n_ref = to_length(cursor.next_int1()?)?;
        let n_sample = to_length(cursor.next_int1()?)?;
        if n_ref > n_key || n_sample > n_key {
            return Err(HeaderError::InvalidLength(n_ref.max(n_sample) as i32).into());
        }

        let mut dict = KeyDictionary::default();
        let mut contigs = vec![None; n_ref];
        let mut samples = vec![None; n_sample];
        for id in 0..n_key {
            let name = cursor.next_value().map_err(HeaderError::InvalidKeyName)?;
            if name.ty != WireType::CStr {
                let err = CodecError::UnsupportedType(name.ty.tag());
                return Err(HeaderError::InvalidKeyName(err).into());
            }
            let name = std::str::from_utf8(name.bytes(buf))?;
            if dict.intern(name) != id {
                return Err(HeaderError::InvalidIndex {
                    kind: "key",
                    index: id as i32,
                }
                .into());
            }

            let at = cursor.pos();
            cursor.skip(12)?;
            for (i, category) in Category::DEFINED.into_iter().enumerate() {
                let word = LittleEndian::read_u32(&buf[at + 4 * i..]);
                if let Some(info) = KeyInfo::unpack(word)? {
                    if info.category != category {
                        return Err(HeaderError::InvalidInfoWord(word).into());
                    }
                    dict.define(id, info);
                }
            }

            let rid = cursor.next_int1()?;
            let sid = cursor.next_int1()?;
            let rlen = cursor.next_int1()?;
            if rid != MISSING_INT {
                let slot = usize::try_from(rid)
                    .ok()
                    .and_then(|r| contigs.get_mut(r))
                    .filter(|slot| slot.is_none())
                    .ok_or(HeaderError::InvalidIndex {
                        kind: "contig",
                        index: rid,
                    })?;
                *slot = Some((id, u32::try_from(rlen).ok()));
            }
            if sid != MISSING_INT {
                let slot = usize::try_from(sid)
                    .ok()
                    .and_then(|s| samples.get_mut(s))
                    .filter(|slot| slot.is_none())
                    .ok_or(HeaderError::InvalidIndex {
                        kind: "sample",
                        index: sid,
                    })?;
                *slot = Some(id);
            }
        }

        for (rid, slot) in contigs.into_iter().enumerate() {
            let (id, rlen) = slot.ok_or(HeaderError::InvalidIndex {
                kind: "contig",
                index: rid as i32,
            })?;
            dict.add_contig(id, rlen);
        }
        for (sid, slot) in samples.into_iter().enumerate() {
            let id = slot.ok_or(HeaderError::InvalidIndex {
                kind: "sample",
                index: sid as i32,
            })?;
            dict.add_sample(id);
        }
        dict.set_text(text);
        Ok(dict)
    }

    /// Writes the complete header block to a writer
    pub fn write_bytes<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut definitions = Vec::new();
        self.encode_definitions(&mut definitions)?;
        let text = self.text().as_bytes();
        let l_dict = u32::try_from(definitions.len())
            .map_err(|_| HeaderError::TextTooLarge(definitions.len()))?;
        let l_text =
            u32::try_from(text.len()).map_err(|_| HeaderError::TextTooLarge(text.len()))?;

        writer.write_u32::<LittleEndian>(MAGIC)?;
        writer.write_u8(FORMAT)?;
        writer.write_u32::<LittleEndian>(l_dict)?;
        writer.write_u32::<LittleEndian>(l_text)?;
        writer.write_all(&definitions)?;
        writer.write_all(text)?;
        Ok(())
    }

    /// Reads a complete header block from a reader
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * Reading from the reader fails (typically an I/O error)
    /// * The magic number or format version is wrong
    /// * The dictionary section is inconsistent
    pub fn from_reader<R: Read>(reader: &mut R) -> Result<Self> {
        let magic = reader.read_u32::<LittleEndian>()?;
        if magic != MAGIC {
            return Err(HeaderError::InvalidMagicNumber(magic).into());
        }
        let format = reader.read_u8()?;
        if format != FORMAT {
            return Err(HeaderError::InvalidFormatVersion(format).into());
        }
        let l_dict = reader.read_u32::<LittleEndian>()?;
        let l_text = reader.read_u32::<LittleEndian>()?;

        let definitions = read_block(reader, l_dict)?;
        let text = read_block(reader, l_text)?;
        let text = String::from_utf8(text).map_err(|e| e.utf8_error())?;

        Self::decode_definitions(&definitions, text)
    }
}
