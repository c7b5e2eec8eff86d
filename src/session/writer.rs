use std::io::{BufWriter, Write};
use std::sync::Arc;

use tracing::{debug, trace};

use super::State;
use crate::error::{Result, SessionError};
use crate::header::KeyDictionary;
use crate::record::{write_record, VariantRecord};

/// Default size of the output buffer
pub const DEFAULT_CAPACITY: usize = 8192;

/// Output encoding of a [`VariantWriter`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    /// Header block and records in the binary wire layout
    #[default]
    Binary,
    /// Verbatim header text followed by one tab-separated line per record
    Text,
}

/// Streaming writer for variant data
///
/// Output is buffered through a [`BufWriter`]. The header must be written
/// before the first record.
pub struct VariantWriter<W: Write> {
    /// The buffered sink
    inner: BufWriter<W>,

    format: Format,

    /// Dictionary every record is rendered against
    header: Option<Arc<KeyDictionary>>,

    state: State,

    /// Reusable line buffer for text output
    line: String,

    /// Number of records written so far
    n_records: usize,
}
impl<W: Write> VariantWriter<W> {
    /// Creates a new `VariantWriter` with the default buffer size
    pub fn new(inner: W, format: Format) -> Self {
        Self::with_capacity(inner, DEFAULT_CAPACITY, format)
    }

    /// Creates a new `VariantWriter` with a specified buffer capacity
    pub fn with_capacity(inner: W, capacity: usize, format: Format) -> Self {
        Self {
            inner: BufWriter::with_capacity(capacity, inner),
            format,
            header: None,
            state: State::Unopened,
            line: String::new(),
            n_records: 0,
        }
    }

    /// Writes the header and fixes the dictionary for the rest of the session
    ///
    /// # Errors
    ///
    /// * [`SessionError::SessionClosed`] if the session is closed
    /// * [`SessionError::HeaderAlreadyLoaded`] if a header was already written
    /// * Any I/O error from the sink
    pub fn write_header(&mut self, dict: Arc<KeyDictionary>) -> Result<()> {
        self.state.ensure_open()?;
        if self.header.is_some() {
            return Err(SessionError::HeaderAlreadyLoaded.into());
        }
        match self.format {
            Format::Binary => dict.write_bytes(&mut self.inner)?,
            Format::Text => {
                let text = dict.text();
                self.inner.write_all(text.as_bytes())?;
                if !text.is_empty() && !text.ends_with('\n') {
                    self.inner.write_all(b"\n")?;
                }
            }
        }
        debug!(
            format = ?self.format,
            n_key = dict.n_key(),
            n_sample = dict.n_sample(),
            "wrote variant header"
        );
        self.header = Some(dict);
        self.state = State::HeaderLoaded;
        Ok(())
    }

    /// Writes one record
    ///
    /// # Errors
    ///
    /// * [`SessionError::SessionClosed`] if the session is closed
    /// * [`SessionError::HeaderNotLoaded`] if no header was written yet
    /// * Any error raised while rendering the record or writing to the sink
    pub fn write_record(&mut self, record: &VariantRecord) -> Result<()> {
        self.state.ensure_open()?;
        let Some(dict) = self.header.as_deref() else {
            return Err(SessionError::HeaderNotLoaded.into());
        };
        match self.format {
            Format::Binary => record.write_bytes(&mut self.inner)?,
            Format::Text => {
                self.line.clear();
                write_record(dict, record, &mut self.line)?;
                self.line.push('\n');
                self.inner.write_all(self.line.as_bytes())?;
            }
        }
        self.n_records += 1;
        self.state = State::Streaming;
        trace!(
            record = self.n_records,
            rid = record.rid(),
            pos = record.pos(),
            "wrote variant record"
        );
        Ok(())
    }

    /// Flushes any buffered data to the underlying writer
    pub fn flush(&mut self) -> Result<()> {
        self.state.ensure_open()?;
        self.inner.flush()?;
        Ok(())
    }

    /// Flushes and closes the session; every later call fails with `SessionClosed`
    pub fn close(&mut self) -> Result<()> {
        self.state.ensure_open()?;
        self.inner.flush()?;
        self.state = State::Closed;
        debug!(n_records = self.n_records, "closed variant writer");
        Ok(())
    }

    /// The dictionary, once the header has been written
    #[must_use]
    pub fn header(&self) -> Option<&Arc<KeyDictionary>> {
        self.header.as_ref()
    }

    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    #[must_use]
    pub fn format(&self) -> Format {
        self.format
    }

    /// Number of records written so far
    #[must_use]
    pub fn n_records(&self) -> usize {
        self.n_records
    }

    /// Consumes the writer and returns the inner writer after flushing
    pub fn into_inner(self) -> Result<W> {
        match self.inner.into_inner() {
            Ok(inner) => Ok(inner),
            Err(e) => Err(std::io::Error::from(e).into()),
        }
    }
}

/// Builder for `VariantWriter` instances
///
/// When a header is given, [`build`](Self::build) writes it right away.
#[derive(Debug, Default)]
pub struct VariantWriterBuilder {
    /// Optional header written at construction
    header: Option<Arc<KeyDictionary>>,
    /// Optional output format, binary by default
    format: Option<Format>,
    /// Optional buffer capacity setting
    buffer_capacity: Option<usize>,
}
impl VariantWriterBuilder {
    #[must_use]
    pub fn header(mut self, header: Arc<KeyDictionary>) -> Self {
        self.header = Some(header);
        self
    }

    #[must_use]
    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    /// Sets the buffer capacity for the writer
    #[must_use]
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = Some(capacity);
        self
    }

    /// Builds a `VariantWriter` with the configured settings
    pub fn build<W: Write>(self, inner: W) -> Result<VariantWriter<W>> {
        let capacity = self.buffer_capacity.unwrap_or(DEFAULT_CAPACITY);
        let mut writer =
            VariantWriter::with_capacity(inner, capacity, self.format.unwrap_or_default());
        if let Some(header) = self.header {
            writer.write_header(header)?;
        }
        Ok(writer)
    }
}

#[cfg(test)]
mod testing {
    use std::io::Cursor;

    use super::*;
    use crate::error::Error;
    use crate::record::RecordBuilder;
    use crate::session::VariantReader;
    use crate::testing::HEADER;

    fn dict() -> Arc<KeyDictionary> {
        Arc::new(KeyDictionary::from_text(HEADER).unwrap())
    }

    fn record(dict: &KeyDictionary) -> VariantRecord {
        RecordBuilder::default()
            .contig("chr1")
            .pos(99)
            .alleles("A", &["T"])
            .info_ints("DP", &[37])
            .genotypes(&["0/1", "0/0"])
            .build(dict)
            .unwrap()
    }

    #[test]
    fn test_write_before_header() {
        let dict = dict();
        let mut writer = VariantWriter::new(Vec::new(), Format::Binary);
        assert!(matches!(
            writer.write_record(&record(&dict)),
            Err(Error::SessionError(SessionError::HeaderNotLoaded))
        ));
        assert_eq!(writer.state(), State::Unopened);
    }

    #[test]
    fn test_header_twice() -> anyhow::Result<()> {
        let dict = dict();
        let mut writer = VariantWriterBuilder::default()
            .header(dict.clone())
            .build(Vec::new())?;
        assert_eq!(writer.state(), State::HeaderLoaded);
        assert!(matches!(
            writer.write_header(dict),
            Err(Error::SessionError(SessionError::HeaderAlreadyLoaded))
        ));
        Ok(())
    }

    #[test]
    fn test_binary_roundtrip() -> anyhow::Result<()> {
        let dict = dict();
        let record = record(&dict);
        let mut writer = VariantWriterBuilder::default()
            .header(dict.clone())
            .buffer_capacity(16)
            .build(Vec::new())?;
        writer.write_record(&record)?;
        writer.write_record(&record)?;
        assert_eq!(writer.n_records(), 2);
        assert_eq!(writer.state(), State::Streaming);

        let mut reader = VariantReader::new(Cursor::new(writer.into_inner()?));
        assert_eq!(reader.read_header()?.as_ref(), dict.as_ref());
        let records = reader.collect::<Result<Vec<_>>>()?;
        assert_eq!(records, vec![record.clone(), record]);
        Ok(())
    }

    #[test]
    fn test_text_output() -> anyhow::Result<()> {
        let dict = dict();
        let mut writer = VariantWriterBuilder::default()
            .format(Format::Text)
            .header(dict.clone())
            .build(Vec::new())?;
        writer.write_record(&record(&dict))?;
        let text = String::from_utf8(writer.into_inner()?)?;

        assert!(text.starts_with(dict.text()));
        let line = text.lines().last().expect("a record line");
        assert_eq!(line, "chr1\t100\t.\tA\tT\t.\t.\tDP=37\tGT\t0/1\t0/0");
        Ok(())
    }

    #[test]
    fn test_closed_writer() -> anyhow::Result<()> {
        let dict = dict();
        let mut writer = VariantWriterBuilder::default()
            .header(dict.clone())
            .build(Vec::new())?;
        writer.close()?;
        assert!(writer.write_record(&record(&dict)).unwrap_err().is_closed());
        assert!(writer.write_header(dict).unwrap_err().is_closed());
        assert!(writer.flush().unwrap_err().is_closed());
        assert!(writer.close().unwrap_err().is_closed());
        Ok(())
    }
}
