//! Building a [`KeyDictionary`] from VCF header text

use memchr::memchr2;
use tracing::{debug, warn};

use super::dictionary::{
    Cardinality, Category, KeyDictionary, KeyInfo, ValueKind, MAX_CONTIG_LENGTH, MAX_FIXED_NUMBER,
};
use crate::error::{HeaderError, Result};

/// Name of the filter that is always present with id 0
pub const PASS: &str = "PASS";

/// Number of fixed columns before the sample columns on the `#CHROM` line
const FIXED_COLUMNS: usize = 9;

/// Splits the body of a structured header line on commas outside of quotes
struct AttrSplitter<'a> {
    data: &'a str,
}
impl<'a> Iterator for AttrSplitter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.is_empty() {
            return None;
        }
        let bytes = self.data.as_bytes();
        let mut in_quotes = false;
        let mut at = 0;
        while let Some(i) = memchr2(b',', b'"', &bytes[at..]) {
            let i = at + i;
            if bytes[i] == b'"' {
                in_quotes = !in_quotes;
            } else if !in_quotes {
                let (out, rest) = self.data.split_at(i);
                self.data = &rest[1..];
                return Some(out);
            }
            at = i + 1;
        }
        let out = self.data;
        self.data = "";
        Some(out)
    }
}

/// Parses `##TAG=<K=V,...>` into its tag and an attribute lookup
fn structured_line(line: &str) -> Option<(&str, Vec<(&str, &str)>)> {
    let rest = line.strip_prefix("##")?;
    let (tag, body) = rest.split_once('=')?;
    let body = body.strip_prefix('<')?.strip_suffix('>')?;
    let attrs = AttrSplitter { data: body }
        .filter_map(|kv| kv.split_once('='))
        .map(|(k, v)| (k.trim(), v.trim()))
        .collect();
    Some((tag, attrs))
}

fn attr<'a>(attrs: &[(&'a str, &'a str)], key: &str) -> Option<&'a str> {
    attrs.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Maps a `Number` attribute to its cardinality rule
#[must_use]
pub fn parse_number(token: Option<&str>) -> Cardinality {
    match token {
        Some("A") => Cardinality::PerAllele,
        Some("G") => Cardinality::PerGenotype,
        Some(t) => match t.parse::<u32>() {
            Ok(n) if n <= MAX_FIXED_NUMBER => Cardinality::Fixed(n),
            _ => Cardinality::Unbounded,
        },
        None => Cardinality::Unbounded,
    }
}

/// Maps a `Type` attribute to its value kind
#[must_use]
pub fn parse_type(token: Option<&str>) -> Option<ValueKind> {
    match token? {
        "Flag" => Some(ValueKind::Flag),
        "Integer" => Some(ValueKind::Integer),
        "Float" => Some(ValueKind::Float),
        "String" | "Character" => Some(ValueKind::String),
        _ => None,
    }
}

/// Reads a contig `length` attribute
///
/// A non-numeric length is ignored; one the binary header cannot hold is an error.
fn contig_length(key: &str, token: Option<&str>) -> Result<Option<u32>> {
    let Some(token) = token else {
        return Ok(None);
    };
    match token.parse::<u64>() {
        Ok(l) if l <= u64::from(MAX_CONTIG_LENGTH) => Ok(Some(l as u32)),
        Ok(_) => Err(HeaderError::InvalidContigLength {
            key: key.to_string(),
            length: token.to_string(),
        }
        .into()),
        Err(_) => {
            warn!("contig {key} has non-numeric length {token}, ignoring it");
            Ok(None)
        }
    }
}

impl KeyDictionary {
    /// Builds the dictionary from VCF header text
    ///
    /// Keys receive ids in the order they are first seen. `PASS` is always
    /// FILTER key 0, whether or not the text declares it. Sample names are read
    /// from the `#CHROM` line and interned as keys as well.
    ///
    /// # Errors
    ///
    /// * [`HeaderError::DuplicateKey`] if a key is declared twice in one category
    /// * [`HeaderError::DuplicateSample`] if a sample column is repeated
    pub fn from_text(text: &str) -> Result<Self> {
        let mut dict = KeyDictionary::default();
        let pass = dict.intern(PASS);
        dict.define(
            pass,
            KeyInfo::new(Category::Filter, Cardinality::Fixed(0), ValueKind::Flag),
        );

        for line in text.lines() {
            if let Some(columns) = line.strip_prefix("#CHROM") {
                for name in columns.split('\t').skip(FIXED_COLUMNS) {
                    let id = dict.intern(name);
                    if !dict.add_sample(id) {
                        return Err(HeaderError::DuplicateSample(name.to_string()).into());
                    }
                }
                continue;
            }
            let Some((tag, attrs)) = structured_line(line) else {
                continue;
            };
            let category = match tag {
                "FILTER" => Category::Filter,
                "INFO" => Category::Info,
                "FORMAT" => Category::Format,
                "contig" => Category::Contig,
                _ => continue,
            };
            let Some(key) = attr(&attrs, "ID").filter(|k| !k.is_empty()) else {
                warn!("Skipping {category} header line without ID: {line}");
                continue;
            };
            dict.declare(category, key, &attrs)?;
        }

        dict.set_text(text.to_string());
        debug!(
            "Built key dictionary: {} keys, {} contigs, {} samples",
            dict.n_key(),
            dict.n_ref(),
            dict.n_sample()
        );
        Ok(dict)
    }

    fn declare(&mut self, category: Category, key: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let duplicate = || HeaderError::DuplicateKey {
            category,
            key: key.to_string(),
        };
        let id = self.intern(key);
        match category {
            Category::Contig => {
                let rlen = contig_length(key, attr(attrs, "length"))?;
                if !self.add_contig(id, rlen) {
                    return Err(duplicate().into());
                }
            }
            Category::Filter => {
                let info = KeyInfo::new(category, Cardinality::Fixed(0), ValueKind::Flag);
                if !self.define(id, info) && key != PASS {
                    return Err(duplicate().into());
                }
            }
            Category::Info | Category::Format => {
                let kind = parse_type(attr(attrs, "Type")).unwrap_or_else(|| {
                    warn!("{category} key {key} has no usable Type, treating it as String");
                    ValueKind::String
                });
                let cardinality = if kind == ValueKind::Flag {
                    Cardinality::Fixed(0)
                } else {
                    parse_number(attr(attrs, "Number"))
                };
                if !self.define(id, KeyInfo::new(category, cardinality, kind)) {
                    return Err(duplicate().into());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::ExpectedCount;
    use crate::Error;

    const HEADER: &str = "\
##fileformat=VCFv4.2
##FILTER=<ID=PASS,Description=\"All filters passed\">
##FILTER=<ID=LowQual,Description=\"Low quality, really\">
##INFO=<ID=DP,Number=1,Type=Integer,Description=\"Total Depth\">
##INFO=<ID=AF,Number=A,Type=Float,Description=\"Allele Frequency\">
##INFO=<ID=DB,Number=0,Type=Flag,Description=\"dbSNP membership\">
##INFO=<ID=NOTE,Number=.,Type=String,Description=\"Free text\">
##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">
##FORMAT=<ID=DP,Number=1,Type=Integer,Description=\"Read Depth\">
##FORMAT=<ID=PL,Number=G,Type=Integer,Description=\"Phred likelihoods\">
##contig=<ID=chr1,length=248956422>
##contig=<ID=chr2,length=242193529>
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tNA001\tNA002
";

    #[test]
    fn test_from_text_ids_in_first_seen_order() -> anyhow::Result<()> {
        let dict = KeyDictionary::from_text(HEADER)?;
        let order = [
            "PASS", "LowQual", "DP", "AF", "DB", "NOTE", "GT", "PL", "chr1", "chr2", "NA001",
            "NA002",
        ];
        for (i, key) in order.iter().enumerate() {
            assert_eq!(dict.key_id(key), Some(i), "key {key}");
        }
        assert_eq!(dict.n_key(), order.len());
        assert_eq!(dict.n_ref(), 2);
        assert_eq!(dict.n_sample(), 2);
        assert_eq!(dict.text(), HEADER);
        Ok(())
    }

    #[test]
    fn test_shared_key_across_categories() -> anyhow::Result<()> {
        let dict = KeyDictionary::from_text(HEADER)?;
        let dp = dict.key_id("DP").unwrap();
        assert_eq!(dict.id_in(Category::Info, "DP")?, dp);
        assert_eq!(dict.id_in(Category::Format, "DP")?, dp);
        assert!(dict.id_in(Category::Filter, "DP").is_err());
        Ok(())
    }

    #[test]
    fn test_cardinality_rules() -> anyhow::Result<()> {
        let dict = KeyDictionary::from_text(HEADER)?;
        let dp = dict.key_id("DP").unwrap();
        let af = dict.key_id("AF").unwrap();
        let db = dict.key_id("DB").unwrap();
        let note = dict.key_id("NOTE").unwrap();
        let pl = dict.key_id("PL").unwrap();

        assert_eq!(dict.cardinality_for(dp, Category::Info, 5)?, ExpectedCount::Exactly(1));
        assert_eq!(dict.cardinality_for(af, Category::Info, 3)?, ExpectedCount::Exactly(3));
        assert_eq!(dict.cardinality_for(db, Category::Info, 3)?, ExpectedCount::Exactly(0));
        assert_eq!(dict.cardinality_for(note, Category::Info, 3)?, ExpectedCount::FromWire);
        assert_eq!(dict.cardinality_for(pl, Category::Format, 1)?, ExpectedCount::PerGenotype);
        assert!(dict.cardinality_for(pl, Category::Info, 1).is_err());
        assert!(matches!(
            dict.cardinality_for(999, Category::Info, 1),
            Err(Error::HeaderError(HeaderError::UnknownKey(999)))
        ));
        Ok(())
    }

    #[test]
    fn test_contigs_and_samples() -> anyhow::Result<()> {
        let dict = KeyDictionary::from_text(HEADER)?;
        assert_eq!(dict.contig_name(0), Some("chr1"));
        assert_eq!(dict.contig_name(1), Some("chr2"));
        assert_eq!(dict.contig_length(1), Some(242_193_529));
        assert_eq!(dict.contig_id("chr2"), Some(1));
        assert_eq!(dict.contig_name(2), None);
        assert_eq!(dict.sample_names().collect::<Vec<_>>(), vec!["NA001", "NA002"]);
        let entry = dict.resolve(dict.key_id("NA002").unwrap())?;
        assert_eq!(entry.sid(), Some(1));
        assert!(!entry.is_contig());
        Ok(())
    }

    #[test]
    fn test_lookup_is_stable() -> anyhow::Result<()> {
        let dict = KeyDictionary::from_text(HEADER)?;
        let first = dict.key_id("AF");
        for _ in 0..100 {
            assert_eq!(dict.key_id("AF"), first);
            assert_eq!(dict.resolve(first.unwrap())?.key(), "AF");
        }
        Ok(())
    }

    #[test]
    fn test_implicit_pass() -> anyhow::Result<()> {
        let dict = KeyDictionary::from_text("##FILTER=<ID=q10,Description=\"x\">\n")?;
        assert_eq!(dict.key_id(PASS), Some(0));
        assert_eq!(dict.id_in(Category::Filter, "q10")?, 1);
        Ok(())
    }

    #[test]
    fn test_duplicate_declarations() {
        let text = "##INFO=<ID=DP,Number=1,Type=Integer>\n##INFO=<ID=DP,Number=1,Type=Integer>\n";
        assert!(matches!(
            KeyDictionary::from_text(text),
            Err(Error::HeaderError(HeaderError::DuplicateKey {
                category: Category::Info,
                ..
            }))
        ));

        let text = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tA\tA\n";
        assert!(matches!(
            KeyDictionary::from_text(text),
            Err(Error::HeaderError(HeaderError::DuplicateSample(_)))
        ));
    }

    #[test]
    fn test_skips_lines_without_id() -> anyhow::Result<()> {
        let dict = KeyDictionary::from_text("##INFO=<Number=1,Type=Integer>\n##source=test\n")?;
        assert_eq!(dict.n_key(), 1); // PASS only
        Ok(())
    }

    #[test]
    fn test_quoted_commas() {
        let (tag, attrs) =
            structured_line("##INFO=<ID=X,Number=1,Type=Float,Description=\"a, b=c\">").unwrap();
        assert_eq!(tag, "INFO");
        assert_eq!(attr(&attrs, "Description"), Some("\"a, b=c\""));
        assert_eq!(attr(&attrs, "Type"), Some("Float"));
    }

    #[test]
    fn test_contig_length_limit() -> anyhow::Result<()> {
        let dict = KeyDictionary::from_text("##contig=<ID=big,length=2147483647>\n")?;
        assert_eq!(dict.contig_length(0), Some(MAX_CONTIG_LENGTH));

        let dict = KeyDictionary::from_text("##contig=<ID=odd,length=unknown>\n")?;
        assert_eq!(dict.contig_length(0), None);

        assert!(matches!(
            KeyDictionary::from_text("##contig=<ID=huge,length=3000000000>\n"),
            Err(Error::HeaderError(HeaderError::InvalidContigLength { key, length }))
                if key == "huge" && length == "3000000000"
        ));
        Ok(())
    }

    #[test]
    fn test_parse_number_tokens() {
        assert_eq!(parse_number(Some("2")), Cardinality::Fixed(2));
        assert_eq!(parse_number(Some("A")), Cardinality::PerAllele);
        assert_eq!(parse_number(Some("G")), Cardinality::PerGenotype);
        assert_eq!(parse_number(Some("R")), Cardinality::Unbounded);
        assert_eq!(parse_number(Some(".")), Cardinality::Unbounded);
        assert_eq!(parse_number(Some("-1")), Cardinality::Unbounded);
        assert_eq!(parse_number(None), Cardinality::Unbounded);
    }
}
