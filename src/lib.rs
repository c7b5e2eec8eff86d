//! # binvcf
//!
//! A binary codec and record model for variant-call data.
//!
//! The crate is layered bottom-up:
//!
//! * [`codec`] - the self-describing typed-value encoding every other layer is built on
//! * [`header`] - the [`KeyDictionary`] that maps names to dense integer keys,
//!   built from header text and serialized as the binary header block
//! * [`record`] - [`VariantRecord`], its section layout, validation against a
//!   dictionary, the [`RecordBuilder`] and the text projection
//! * [`session`] - [`VariantReader`] and [`VariantWriter`] for streaming records
//!   behind a single header

pub mod codec;
mod error;
pub mod header;
pub mod record;
pub mod session;

pub use error::{CodecError, Error, HeaderError, RecordError, Result, SessionError};
pub use header::{Category, KeyDictionary};
pub use record::{format_record, RecordBuilder, Value, VariantRecord};
pub use session::{Format, State, VariantReader, VariantWriter, VariantWriterBuilder};

#[cfg(test)]
pub(crate) mod testing {

    use super::*;
    use anyhow::Result;
    use std::io::Cursor;
    use std::sync::Arc;

    /// Header shared by the crate's tests: two samples, two contigs and a
    /// handful of keys covering every value kind
    pub(crate) const HEADER: &str = "##fileformat=VCFv4.3
##FILTER=<ID=q10,Description=\"Quality below 10\">
##FILTER=<ID=s50,Description=\"Less than 50% of samples have data\">
##INFO=<ID=DP,Number=1,Type=Integer,Description=\"Total depth\">
##INFO=<ID=AF,Number=A,Type=Float,Description=\"Allele frequency\">
##INFO=<ID=DB,Number=0,Type=Flag,Description=\"dbSNP membership\">
##INFO=<ID=NOTE,Number=1,Type=String,Description=\"Free text\">
##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">
##FORMAT=<ID=DP,Number=1,Type=Integer,Description=\"Read depth\">
##FORMAT=<ID=FT,Number=1,Type=String,Description=\"Sample filter\">
##contig=<ID=chr1,length=248956422>
##contig=<ID=chrM>
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\ts1\ts2
";

    fn dict() -> Result<Arc<KeyDictionary>> {
        Ok(Arc::new(KeyDictionary::from_text(HEADER)?))
    }

    #[test]
    fn test_fixture_dictionary() -> Result<()> {
        let dict = dict()?;
        assert_eq!(dict.n_ref(), 2);
        assert_eq!(dict.n_sample(), 2);
        assert_eq!(dict.sample_names().collect::<Vec<_>>(), vec!["s1", "s2"]);
        assert_eq!(dict.contig_length(0), Some(248_956_422));
        assert_eq!(dict.key_id("PASS"), Some(0));
        // DP is one key with an INFO and a FORMAT definition
        let dp = dict.id_in(Category::Info, "DP")?;
        assert_eq!(dict.id_in(Category::Format, "DP")?, dp);
        Ok(())
    }

    #[test]
    fn test_record_roundtrip() -> Result<()> {
        let dict = dict()?;
        let record = RecordBuilder::default()
            .contig("chr1")
            .pos(100)
            .alleles("A", &["T"])
            .info_ints("DP", &[37])
            .build(&dict)?;

        let mut bytes = Vec::new();
        record.write_bytes(&mut bytes)?;
        let decoded = VariantRecord::from_bytes(&bytes, &dict)?;
        assert_eq!(decoded, record);

        let mut reencoded = Vec::new();
        decoded.write_bytes(&mut reencoded)?;
        assert_eq!(reencoded, bytes);

        assert_eq!(decoded.rid(), 0);
        assert_eq!(decoded.pos(), 100);
        let dp = dict.id_in(Category::Info, "DP")?;
        let field = decoded.info(dp)?.expect("DP present");
        assert_eq!(field.value()?, Value::Int(vec![37]));
        Ok(())
    }

    #[test]
    fn test_stream_text_and_binary() -> Result<()> {
        let dict = dict()?;
        let records = (0..4)
            .map(|i| {
                RecordBuilder::default()
                    .contig(if i % 2 == 0 { "chr1" } else { "chrM" })
                    .pos(i * 1000)
                    .alleles("G", &["C"])
                    .qual(i as f32 + 0.5)
                    .genotypes(&["0|1", "./."])
                    .build(&dict)
            })
            .collect::<crate::Result<Vec<_>>>()?;

        let mut writer = VariantWriterBuilder::default()
            .header(dict.clone())
            .build(Vec::new())?;
        for record in &records {
            writer.write_record(record)?;
        }
        let bytes = writer.into_inner()?;

        let mut text = VariantWriterBuilder::default()
            .format(Format::Text)
            .header(dict.clone())
            .build(Vec::new())?;
        let reader = VariantReader::new(Cursor::new(bytes));
        for record in reader {
            text.write_record(&record?)?;
        }
        let text = String::from_utf8(text.into_inner()?)?;
        let lines: Vec<&str> = text.lines().filter(|l| !l.starts_with('#')).collect();
        assert_eq!(lines.len(), records.len());
        assert_eq!(lines[1], "chrM\t1001\t.\tG\tC\t1.5\t.\t.\tGT\t0|1\t./.");
        assert_eq!(lines[1], format_record(&dict, &records[1])?);
        Ok(())
    }

    #[test]
    fn test_closed_session() -> Result<()> {
        let dict = dict()?;
        let mut writer = VariantWriter::new(Vec::new(), Format::Binary);
        writer.write_header(dict)?;
        writer.close()?;
        assert_eq!(writer.state(), State::Closed);
        assert!(matches!(
            writer.flush(),
            Err(Error::SessionError(SessionError::SessionClosed))
        ));
        Ok(())
    }
}
