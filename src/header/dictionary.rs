use std::collections::HashMap;
use std::fmt;

use crate::error::{HeaderError, Result};

/// Largest literal `Number` that fits the 20-bit field of a packed key-info word
pub const MAX_FIXED_NUMBER: u32 = (1 << 20) - 1;

/// Longest contig the binary header can record; `rlen` is stored as a typed int32
#[allow(clippy::cast_sign_loss)]
pub const MAX_CONTIG_LENGTH: u32 = i32::MAX as u32;

/// Category nibble marking an unused definition slot in a packed key-info word
pub const UNDEFINED_INFO: u32 = 0xf;

/// The header section a key is declared in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Category {
    Filter = 0,
    Info = 1,
    Format = 2,
    Contig = 3,
}
impl Category {
    /// The three categories that carry a typed definition
    pub const DEFINED: [Category; 3] = [Category::Filter, Category::Info, Category::Format];

    fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Filter),
            1 => Some(Self::Info),
            2 => Some(Self::Format),
            3 => Some(Self::Contig),
            _ => None,
        }
    }

    /// Slot index within [`KeyEntry`] for categories with a definition
    fn slot(self) -> Option<usize> {
        match self {
            Self::Filter => Some(0),
            Self::Info => Some(1),
            Self::Format => Some(2),
            Self::Contig => None,
        }
    }
}
impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Filter => "FILTER",
            Self::Info => "INFO",
            Self::Format => "FORMAT",
            Self::Contig => "contig",
        })
    }
}

/// How many values a key carries (the `Number` attribute)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// A literal count
    Fixed(u32),
    /// One value per alternate allele (`A`)
    PerAllele,
    /// One value per possible genotype (`G`)
    PerGenotype,
    /// Any other token; the count is read from the wire
    Unbounded,
}
impl Cardinality {
    fn code(self) -> u32 {
        match self {
            Self::Fixed(_) => 0,
            Self::Unbounded => 1,
            Self::PerAllele => 2,
            Self::PerGenotype => 3,
        }
    }
}
impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(n) => write!(f, "{n}"),
            Self::PerAllele => f.write_str("A"),
            Self::PerGenotype => f.write_str("G"),
            Self::Unbounded => f.write_str("."),
        }
    }
}

/// The declared value type of a key (the `Type` attribute)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ValueKind {
    Flag = 0,
    Integer = 1,
    Float = 2,
    String = 3,
}
impl ValueKind {
    fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Flag),
            1 => Some(Self::Integer),
            2 => Some(Self::Float),
            3 => Some(Self::String),
            _ => None,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Flag => "Flag",
            Self::Integer => "Integer",
            Self::Float => "Float",
            Self::String => "String",
        }
    }
}

/// The count a record field is expected to carry, resolved against a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedCount {
    /// Exactly this many values
    Exactly(usize),
    /// Depends on ploidy and allele count, computed by the caller
    PerGenotype,
    /// Only the wire knows
    FromWire,
}

/// The definition of a key within one category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInfo {
    pub category: Category,
    pub cardinality: Cardinality,
    pub kind: ValueKind,
}
impl KeyInfo {
    #[must_use]
    pub fn new(category: Category, cardinality: Cardinality, kind: ValueKind) -> Self {
        Self {
            category,
            cardinality,
            kind,
        }
    }

    /// Packs the definition as `number:20 | var:4 | type:4 | category:4`
    #[must_use]
    pub fn pack(&self) -> u32 {
        let number = match self.cardinality {
            Cardinality::Fixed(n) => n.min(MAX_FIXED_NUMBER),
            _ => 0,
        };
        number << 12 | self.cardinality.code() << 8 | (self.kind as u32) << 4 | self.category as u32
    }

    /// Unpacks a word written by [`KeyInfo::pack`]
    ///
    /// Returns `Ok(None)` for the undefined slot marker.
    pub fn unpack(word: u32) -> Result<Option<Self>> {
        let category = word & 0xf;
        if category == UNDEFINED_INFO {
            return Ok(None);
        }
        let kind = (word >> 4) & 0xf;
        let var = (word >> 8) & 0xf;
        let number = word >> 12;
        let (Some(category), Some(kind)) =
            (Category::from_code(category), ValueKind::from_code(kind))
        else {
            return Err(HeaderError::InvalidInfoWord(word).into());
        };
        let cardinality = match var {
            0 => Cardinality::Fixed(number),
            1 => Cardinality::Unbounded,
            2 => Cardinality::PerAllele,
            3 => Cardinality::PerGenotype,
            _ => return Err(HeaderError::InvalidInfoWord(word).into()),
        };
        Ok(Some(Self::new(category, cardinality, kind)))
    }

    /// Resolves the cardinality for a record with `n_alt` alternate alleles
    #[must_use]
    pub fn expected_count(&self, n_alt: usize) -> ExpectedCount {
        match self.cardinality {
            Cardinality::Fixed(n) => ExpectedCount::Exactly(n as usize),
            Cardinality::PerAllele => ExpectedCount::Exactly(n_alt),
            Cardinality::PerGenotype => ExpectedCount::PerGenotype,
            Cardinality::Unbounded => ExpectedCount::FromWire,
        }
    }
}

/// One interned key string and everything the header says about it
///
/// A key owns a single id even when it is declared in several categories,
/// e.g. `DP` as both an INFO and a FORMAT key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEntry {
    key: String,
    id: usize,
    defs: [Option<KeyInfo>; 3],
    rid: Option<usize>,
    sid: Option<usize>,
    rlen: Option<u32>,
}
impl KeyEntry {
    fn new(key: String, id: usize) -> Self {
        Self {
            key,
            id,
            defs: [None; 3],
            rid: None,
            sid: None,
            rlen: None,
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    /// The definition of this key in `category`, if it is declared there
    #[must_use]
    pub fn definition(&self, category: Category) -> Option<&KeyInfo> {
        category.slot().and_then(|slot| self.defs[slot].as_ref())
    }

    /// Packed definition words for the FILTER, INFO, and FORMAT slots
    #[must_use]
    pub fn info_words(&self) -> [u32; 3] {
        self.defs.map(|def| def.map_or(UNDEFINED_INFO, |info| info.pack()))
    }

    /// Contig index if the key names a contig
    #[must_use]
    pub fn rid(&self) -> Option<usize> {
        self.rid
    }

    /// Sample index if the key names a sample
    #[must_use]
    pub fn sid(&self) -> Option<usize> {
        self.sid
    }

    /// Declared reference length if the key names a contig
    #[must_use]
    pub fn rlen(&self) -> Option<u32> {
        self.rlen
    }

    #[must_use]
    pub fn is_contig(&self) -> bool {
        self.rid.is_some()
    }

    #[must_use]
    pub fn is_sample(&self) -> bool {
        self.sid.is_some()
    }
}

/// The per-file mapping from key strings to dense integer ids
///
/// Built once from the header and immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyDictionary {
    entries: Vec<KeyEntry>,
    index: HashMap<String, usize>,
    /// Contig index to key id
    contigs: Vec<usize>,
    /// Sample index to key id
    samples: Vec<usize>,
    text: String,
}
impl KeyDictionary {
    /// Returns the id of `key`, inserting it if it is new
    pub(crate) fn intern(&mut self, key: &str) -> usize {
        if let Some(&id) = self.index.get(key) {
            return id;
        }
        let id = self.entries.len();
        self.entries.push(KeyEntry::new(key.to_string(), id));
        self.index.insert(key.to_string(), id);
        id
    }

    /// Stores the definition of `id` in the slot of its category
    ///
    /// Returns false if the slot was already filled.
    pub(crate) fn define(&mut self, id: usize, info: KeyInfo) -> bool {
        let Some(slot) = info.category.slot() else {
            return false;
        };
        let def = &mut self.entries[id].defs[slot];
        if def.is_some() {
            return false;
        }
        *def = Some(info);
        true
    }

    /// Marks `id` as the next contig
    ///
    /// Returns false if the key already names a contig.
    pub(crate) fn add_contig(&mut self, id: usize, rlen: Option<u32>) -> bool {
        let entry = &mut self.entries[id];
        if entry.rid.is_some() {
            return false;
        }
        entry.rid = Some(self.contigs.len());
        entry.rlen = rlen;
        self.contigs.push(id);
        true
    }

    /// Marks `id` as the next sample
    ///
    /// Returns false if the key already names a sample.
    pub(crate) fn add_sample(&mut self, id: usize) -> bool {
        let entry = &mut self.entries[id];
        if entry.sid.is_some() {
            return false;
        }
        entry.sid = Some(self.samples.len());
        self.samples.push(id);
        true
    }

    pub(crate) fn set_text(&mut self, text: String) {
        self.text = text;
    }

    /// Looks up the entry for a key id
    pub fn resolve(&self, id: usize) -> Result<&KeyEntry> {
        self.entries
            .get(id)
            .ok_or_else(|| HeaderError::UnknownKey(id).into())
    }

    /// Looks up the id of a key string
    #[must_use]
    pub fn key_id(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// Looks up the id of a key that must be declared in `category`
    pub fn id_in(&self, category: Category, key: &str) -> Result<usize> {
        match self.key_id(key) {
            Some(id) if self.definition(id, category).is_some() => Ok(id),
            _ => Err(HeaderError::MissingKey {
                category,
                key: key.to_string(),
            }
            .into()),
        }
    }

    /// The definition of `id` within `category`, if any
    #[must_use]
    pub fn definition(&self, id: usize, category: Category) -> Option<&KeyInfo> {
        self.entries.get(id).and_then(|e| e.definition(category))
    }

    /// Resolves how many values key `id` carries in `category` for a record with
    /// `n_alt` alternate alleles
    pub fn cardinality_for(
        &self,
        id: usize,
        category: Category,
        n_alt: usize,
    ) -> Result<ExpectedCount> {
        let entry = self.resolve(id)?;
        let info = entry
            .definition(category)
            .ok_or_else(|| HeaderError::MissingKey {
                category,
                key: entry.key.clone(),
            })?;
        Ok(info.expected_count(n_alt))
    }

    /// All entries in id order
    #[must_use]
    pub fn entries(&self) -> &[KeyEntry] {
        &self.entries
    }

    /// Number of distinct keys
    #[must_use]
    pub fn n_key(&self) -> usize {
        self.entries.len()
    }

    /// Number of contigs
    #[must_use]
    pub fn n_ref(&self) -> usize {
        self.contigs.len()
    }

    /// Number of samples
    #[must_use]
    pub fn n_sample(&self) -> usize {
        self.samples.len()
    }

    /// Key id of contig `rid`
    #[must_use]
    pub fn contig_key(&self, rid: usize) -> Option<usize> {
        self.contigs.get(rid).copied()
    }

    /// Name of contig `rid`
    #[must_use]
    pub fn contig_name(&self, rid: usize) -> Option<&str> {
        self.contig_key(rid).map(|id| self.entries[id].key())
    }

    /// Declared length of contig `rid`
    #[must_use]
    pub fn contig_length(&self, rid: usize) -> Option<u32> {
        self.contig_key(rid).and_then(|id| self.entries[id].rlen)
    }

    /// Contig index of a contig name
    #[must_use]
    pub fn contig_id(&self, name: &str) -> Option<usize> {
        self.key_id(name).and_then(|id| self.entries[id].rid)
    }

    /// Key id of sample `sid`
    #[must_use]
    pub fn sample_key(&self, sid: usize) -> Option<usize> {
        self.samples.get(sid).copied()
    }

    /// Name of sample `sid`
    #[must_use]
    pub fn sample_name(&self, sid: usize) -> Option<&str> {
        self.sample_key(sid).map(|id| self.entries[id].key())
    }

    /// Sample names in column order
    pub fn sample_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.samples.iter().map(|&id| self.entries[id].key())
    }

    /// The verbatim header text the dictionary was built from
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}
