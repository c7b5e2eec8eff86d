use super::field::Value;
use super::genotype::{allele, parse_genotype};
use super::record::{VariantRecord, GENOTYPE_KEY};
use crate::codec::{
    encode_int1, encode_ints, encode_key, encode_size, encode_str, int_type_for, missing_float,
    put_floats, put_ints, WireType, MISSING_INT,
};
use crate::error::{CodecError, HeaderError, RecordError, Result};
use crate::header::{Category, ExpectedCount, KeyDictionary, KeyInfo, ValueKind};

/// Assembles a [`VariantRecord`] from plain values
///
/// Keys are given by name and resolved against the dictionary in
/// [`build`](Self::build), which also checks declared types, fixed
/// cardinalities, and that every FORMAT key carries one value per sample.
///
/// ```
/// use binvcf::header::KeyDictionary;
/// use binvcf::record::RecordBuilder;
///
/// let dict = KeyDictionary::from_text(
///     "##INFO=<ID=DP,Number=1,Type=Integer,Description=\"Depth\">\n\
///      ###contig=<ID=chr1>\n",
/// )
/// .unwrap();
///
/// let record = RecordBuilder::default()
///     .contig("chr1")
///     .pos(99)
///     .alleles("A", &["T"])
///     .info_ints("DP", &[37])
///     .build(&dict)
///     .unwrap();
/// assert_eq!(record.n_info(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordBuilder {
    contig: Option<String>,
    pos: Option<i32>,
    qual: Option<f32>,
    id: Option<String>,
    reference: String,
    alts: Vec<String>,
    filters: Vec<String>,
    info: Vec<(String, Value)>,
    format: Vec<(String, Vec<Value>)>,
}
impl RecordBuilder {
    #[must_use]
    pub fn contig(mut self, name: impl Into<String>) -> Self {
        self.contig = Some(name.into());
        self
    }

    /// Sets the 0-based position
    #[must_use]
    pub fn pos(mut self, pos: i32) -> Self {
        self.pos = Some(pos);
        self
    }

    #[must_use]
    pub fn qual(mut self, qual: f32) -> Self {
        self.qual = Some(qual);
        self
    }

    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the reference allele and the alternate alleles
    #[must_use]
    pub fn alleles(mut self, reference: &str, alts: &[&str]) -> Self {
        self.reference = reference.to_string();
        self.alts = alts.iter().map(ToString::to_string).collect();
        self
    }

    /// Adds a FILTER by name
    #[must_use]
    pub fn filter(mut self, name: impl Into<String>) -> Self {
        self.filters.push(name.into());
        self
    }

    /// Adds an INFO pair
    #[must_use]
    pub fn info(mut self, key: impl Into<String>, value: Value) -> Self {
        self.info.push((key.into(), value));
        self
    }

    #[must_use]
    pub fn info_flag(self, key: impl Into<String>) -> Self {
        self.info(key, Value::Flag)
    }

    #[must_use]
    pub fn info_ints(self, key: impl Into<String>, values: &[i32]) -> Self {
        self.info(key, Value::Int(values.to_vec()))
    }

    #[must_use]
    pub fn info_floats(self, key: impl Into<String>, values: &[f32]) -> Self {
        self.info(key, Value::Float(values.to_vec()))
    }

    #[must_use]
    pub fn info_str(self, key: impl Into<String>, value: &str) -> Self {
        self.info(key, Value::Str(value.to_string()))
    }

    /// Adds a FORMAT key with one value per sample, in sample order
    #[must_use]
    pub fn format(mut self, key: impl Into<String>, samples: Vec<Value>) -> Self {
        self.format.push((key.into(), samples));
        self
    }

    #[must_use]
    pub fn format_ints(self, key: impl Into<String>, samples: &[Vec<i32>]) -> Self {
        let samples = samples.iter().cloned().map(Value::Int).collect();
        self.format(key, samples)
    }

    #[must_use]
    pub fn format_floats(self, key: impl Into<String>, samples: &[Vec<f32>]) -> Self {
        let samples = samples.iter().cloned().map(Value::Float).collect();
        self.format(key, samples)
    }

    #[must_use]
    pub fn format_strs(self, key: impl Into<String>, samples: &[&str]) -> Self {
        let samples = samples.iter().map(|s| Value::Str((*s).to_string())).collect();
        self.format(key, samples)
    }

    /// Adds the `GT` key from genotype strings such as `0/1` or `1|1`
    #[must_use]
    pub fn genotypes(self, samples: &[&str]) -> Self {
        self.format_strs(GENOTYPE_KEY, samples)
    }

    /// Encodes and validates the record
    ///
    /// # Errors
    ///
    /// * [`RecordError::IncompleteRecord`] if the contig or position is unset
    /// * [`HeaderError::MissingKey`] if a contig or key name is not declared
    /// * [`RecordError::TypeMismatch`], [`RecordError::CardinalityMismatch`], or
    ///   [`RecordError::SampleCountMismatch`] if a value contradicts its declaration
    /// * [`RecordError::InvalidGenotype`] if a `GT` string cannot be parsed
    pub fn build(&self, dict: &KeyDictionary) -> Result<VariantRecord> {
        let contig = self
            .contig
            .as_deref()
            .ok_or(RecordError::IncompleteRecord("contig"))?;
        let pos = self.pos.ok_or(RecordError::IncompleteRecord("pos"))?;
        let rid = dict
            .contig_id(contig)
            .ok_or_else(|| HeaderError::MissingKey {
                category: Category::Contig,
                key: contig.to_string(),
            })?;
        let n_alt = u16::try_from(self.alts.len())
            .map_err(|_| CodecError::CountTooLarge(self.alts.len()))?;
        let n_fmt = u16::try_from(self.format.len())
            .map_err(|_| CodecError::CountTooLarge(self.format.len()))?;

        let mut buf = Vec::new();
        encode_str(&mut buf, self.id.as_deref().unwrap_or_default().as_bytes())?;
        encode_str(&mut buf, self.reference.as_bytes())?;
        for alt in &self.alts {
            encode_str(&mut buf, alt.as_bytes())?;
        }

        let filters = self
            .filters
            .iter()
            .map(|name| dict.id_in(Category::Filter, name).map(|id| id as i32))
            .collect::<Result<Vec<_>>>()?;
        encode_ints(&mut buf, &filters)?;

        encode_int1(&mut buf, self.info.len() as i32);
        for (key, value) in &self.info {
            let id = dict.id_in(Category::Info, key)?;
            let info = declared(dict, id, Category::Info)?;
            check_value(key, info, value, usize::from(n_alt))?;
            encode_key(&mut buf, id);
            value.encode(&mut buf)?;
        }

        let keys = self
            .format
            .iter()
            .map(|(key, _)| dict.id_in(Category::Format, key))
            .collect::<Result<Vec<_>>>()?;
        let ids: Vec<i32> = keys.iter().map(|&id| id as i32).collect();
        encode_ints(&mut buf, &ids)?;
        for ((key, samples), &id) in self.format.iter().zip(&keys) {
            if samples.len() != dict.n_sample() {
                return Err(RecordError::SampleCountMismatch {
                    key: key.clone(),
                    expected: dict.n_sample(),
                    found: samples.len(),
                }
                .into());
            }
            if key == GENOTYPE_KEY {
                let calls = samples
                    .iter()
                    .map(|value| genotype_call(key, value, usize::from(n_alt)))
                    .collect::<Result<Vec<_>>>()?;
                encode_sample_ints(&mut buf, &calls)?;
                continue;
            }

            let info = declared(dict, id, Category::Format)?;
            for value in samples {
                check_value(key, info, value, usize::from(n_alt))?;
            }
            match info.kind {
                ValueKind::Integer => {
                    let rows: Vec<Vec<i32>> = samples
                        .iter()
                        .map(|v| match v {
                            Value::Int(x) => x.clone(),
                            _ => Vec::new(),
                        })
                        .collect();
                    encode_sample_ints(&mut buf, &rows)?;
                }
                ValueKind::Float => {
                    let rows: Vec<&[f32]> = samples
                        .iter()
                        .map(|v| match v {
                            Value::Float(x) => x.as_slice(),
                            _ => &[],
                        })
                        .collect();
                    encode_sample_floats(&mut buf, &rows)?;
                }
                ValueKind::String => {
                    let rows: Vec<&[u8]> = samples
                        .iter()
                        .map(|v| match v {
                            Value::Str(s) => s.as_bytes(),
                            _ => &[],
                        })
                        .collect();
                    encode_sample_strs(&mut buf, &rows)?;
                }
                ValueKind::Flag => encode_size(&mut buf, 0, WireType::Flag)?,
            }
        }

        VariantRecord::from_parts(
            rid as i32,
            pos,
            self.qual.unwrap_or_else(missing_float),
            n_alt,
            n_fmt,
            buf,
            dict,
        )
    }
}

fn declared(dict: &KeyDictionary, id: usize, category: Category) -> Result<&KeyInfo> {
    let entry = dict.resolve(id)?;
    entry.definition(category).ok_or_else(|| {
        HeaderError::MissingKey {
            category,
            key: entry.key().to_string(),
        }
        .into()
    })
}

/// Checks a value against its declaration; empty values stand for missing
fn check_value(key: &str, info: &KeyInfo, value: &Value, n_alt: usize) -> Result<()> {
    if value.kind() != info.kind {
        return Err(RecordError::TypeMismatch {
            key: key.to_string(),
            expected: info.kind.name(),
            found: value.kind().name(),
        }
        .into());
    }
    if info.kind == ValueKind::String || value.is_empty() {
        return Ok(());
    }
    match info.expected_count(n_alt) {
        ExpectedCount::Exactly(n) if n != value.len() => Err(RecordError::CardinalityMismatch {
            key: key.to_string(),
            expected: n,
            found: value.len(),
        }
        .into()),
        _ => Ok(()),
    }
}

/// Parses one sample's genotype and checks its alleles against the record
fn genotype_call(key: &str, value: &Value, n_alt: usize) -> Result<Vec<i32>> {
    let Value::Str(gt) = value else {
        return Err(RecordError::TypeMismatch {
            key: key.to_string(),
            expected: "genotype",
            found: value.kind().name(),
        }
        .into());
    };
    let call = parse_genotype(gt)?;
    if call
        .iter()
        .filter_map(|&x| allele(x))
        .any(|a| a as usize > n_alt)
    {
        return Err(RecordError::InvalidGenotype(gt.clone()).into());
    }
    Ok(call)
}

/// Writes one descriptor shared by all samples, then each sample padded
/// with the missing marker to the longest sample
fn encode_sample_ints(buf: &mut Vec<u8>, rows: &[Vec<i32>]) -> Result<()> {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let ty = rows
        .iter()
        .map(|row| int_type_for(row))
        .max_by_key(|ty| ty.size())
        .unwrap_or(WireType::Int8);
    encode_size(buf, width, ty)?;
    for row in rows {
        put_ints(buf, row, ty)?;
        for _ in row.len()..width {
            put_ints(buf, &[MISSING_INT], ty)?;
        }
    }
    Ok(())
}

fn encode_sample_floats(buf: &mut Vec<u8>, rows: &[&[f32]]) -> Result<()> {
    let width = rows.iter().map(|row| row.len()).max().unwrap_or(0);
    encode_size(buf, width, WireType::Float)?;
    for row in rows {
        put_floats(buf, row);
        for _ in row.len()..width {
            put_floats(buf, &[missing_float()]);
        }
    }
    Ok(())
}

fn encode_sample_strs(buf: &mut Vec<u8>, rows: &[&[u8]]) -> Result<()> {
    let width = rows.iter().map(|row| row.len()).max().unwrap_or(0);
    encode_size(buf, width, WireType::CStr)?;
    for row in rows {
        buf.extend_from_slice(row);
        buf.resize(buf.len() + width - row.len(), 0);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Scalar;
    use crate::error::Error;
    use crate::testing::HEADER;

    fn dict() -> KeyDictionary {
        KeyDictionary::from_text(HEADER).unwrap()
    }

    fn base() -> RecordBuilder {
        RecordBuilder::default()
            .contig("chr1")
            .pos(99)
            .alleles("A", &["T"])
    }

    #[test]
    fn test_incomplete_record() {
        let dict = dict();
        let err = RecordBuilder::default().pos(1).build(&dict).unwrap_err();
        assert!(matches!(
            err,
            Error::RecordError(RecordError::IncompleteRecord("contig"))
        ));
        let err = RecordBuilder::default()
            .contig("chr1")
            .build(&dict)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::RecordError(RecordError::IncompleteRecord("pos"))
        ));
    }

    #[test]
    fn test_unknown_names() {
        let dict = dict();
        let err = base().contig("chr9").build(&dict).unwrap_err();
        assert!(matches!(
            err,
            Error::HeaderError(HeaderError::MissingKey {
                category: Category::Contig,
                ..
            })
        ));
        let err = base().info_ints("XX", &[1]).build(&dict).unwrap_err();
        assert!(matches!(
            err,
            Error::HeaderError(HeaderError::MissingKey {
                category: Category::Info,
                ..
            })
        ));
        // q10 is a FILTER, not an INFO key
        assert!(base().info_flag("q10").build(&dict).is_err());
        assert!(base().filter("q10").build(&dict).is_ok());
    }

    #[test]
    fn test_type_and_cardinality_checks() {
        let dict = dict();
        let err = base().info_floats("DP", &[1.0]).build(&dict).unwrap_err();
        assert!(matches!(
            err,
            Error::RecordError(RecordError::TypeMismatch {
                expected: "Integer",
                found: "Float",
                ..
            })
        ));

        let err = base().info_ints("DP", &[1, 2]).build(&dict).unwrap_err();
        assert!(matches!(
            err,
            Error::RecordError(RecordError::CardinalityMismatch {
                expected: 1,
                found: 2,
                ..
            })
        ));

        // AF is per allele: one ALT, one value
        assert!(base().info_floats("AF", &[0.5]).build(&dict).is_ok());
        assert!(base().info_floats("AF", &[0.5, 0.5]).build(&dict).is_err());
    }

    #[test]
    fn test_per_allele_with_three_alts() -> anyhow::Result<()> {
        let dict = dict();
        let af = dict.id_in(Category::Info, "AF")?;
        assert_eq!(
            dict.cardinality_for(af, Category::Info, 3)?,
            ExpectedCount::Exactly(3)
        );
        let record = base()
            .alleles("A", &["C", "G", "T"])
            .info_floats("AF", &[0.1, 0.2, 0.3])
            .build(&dict)?;
        let field = record.info(af)?.expect("AF present");
        assert_eq!(field.count(), 3);
        assert!(field.is_vector());
        Ok(())
    }

    #[test]
    fn test_sample_count_mismatch() {
        let dict = dict();
        let err = base()
            .format_ints("DP", &[vec![3]])
            .build(&dict)
            .unwrap_err();
        assert!(err.is_malformed());
        assert!(matches!(
            err,
            Error::RecordError(RecordError::SampleCountMismatch {
                expected: 2,
                found: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_genotypes() -> anyhow::Result<()> {
        let dict = dict();
        let record = base().genotypes(&["0/1", "1|1"]).build(&dict)?;
        let gt = record
            .format(dict.id_in(Category::Format, "GT")?)?
            .expect("GT present");
        assert_eq!(gt.ty(), WireType::Int8);
        assert_eq!(gt.count(), 2);
        assert_eq!(gt.ints(0)?, Some(vec![2, 4]));
        assert_eq!(gt.ints(1)?, Some(vec![4, 5]));

        // allele 2 does not exist with a single ALT
        let err = base().genotypes(&["0/2", "0/0"]).build(&dict).unwrap_err();
        assert!(matches!(
            err,
            Error::RecordError(RecordError::InvalidGenotype(_))
        ));
        Ok(())
    }

    #[test]
    fn test_mixed_ploidy_is_padded() -> anyhow::Result<()> {
        let dict = dict();
        let record = base().genotypes(&["0", "0/1"]).build(&dict)?;
        let gt = record
            .format(dict.id_in(Category::Format, "GT")?)?
            .expect("GT present");
        assert_eq!(gt.ints(0)?, Some(vec![2, MISSING_INT]));
        Ok(())
    }

    #[test]
    fn test_format_ints_widen_to_largest_sample() -> anyhow::Result<()> {
        let dict = dict();
        let dp = dict.id_in(Category::Format, "DP")?;
        let record = base()
            .format_ints("DP", &[vec![3], vec![1000]])
            .build(&dict)?;
        let field = record.format(dp)?.expect("DP present");
        assert_eq!(field.ty(), WireType::Int16);
        assert_eq!(field.scalar(0), Some(Scalar::Int(3)));
        assert_eq!(field.scalar(1), Some(Scalar::Int(1000)));
        Ok(())
    }

    #[test]
    fn test_missing_values_are_accepted() -> anyhow::Result<()> {
        let dict = dict();
        let dp = dict.id_in(Category::Format, "DP")?;
        let record = base().format_ints("DP", &[vec![], vec![7]]).build(&dict)?;
        let field = record.format(dp)?.expect("DP present");
        assert_eq!(field.ints(0)?, Some(vec![MISSING_INT]));
        assert_eq!(field.ints(1)?, Some(vec![7]));
        Ok(())
    }
}
