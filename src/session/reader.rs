use std::io::Read;
use std::sync::Arc;

use tracing::{debug, trace};

use super::State;
use crate::error::{CodecError, Error, RecordError, Result};
use crate::header::KeyDictionary;
use crate::record::{record_size, VariantRecord, SIZE_RECORD_PREFIX};

/// Default size of the internal read buffer
pub const DEFAULT_CAPACITY: usize = 8192;

/// Streaming reader over binary variant data
///
/// Records are pulled from any [`Read`] through an internal buffer that grows
/// when a record is larger than its current capacity. The header is read
/// lazily on the first record if [`read_header`](Self::read_header) was not
/// called explicitly.
pub struct VariantReader<R: Read> {
    /// The underlying byte source
    reader: R,

    /// Dictionary loaded from the header block
    header: Option<Arc<KeyDictionary>>,

    state: State,

    /// Buffer for holding data read from the source
    buffer: Vec<u8>,

    /// Current position in the buffer
    buffer_pos: usize,

    /// Number of valid bytes in the buffer
    buffer_len: usize,

    /// Number of records returned so far
    n_records: usize,
}
impl<R: Read> VariantReader<R> {
    /// Creates a new `VariantReader` with the default buffer capacity
    pub fn new(reader: R) -> Self {
        Self::with_capacity(reader, DEFAULT_CAPACITY)
    }

    /// Creates a new `VariantReader` with a specified initial buffer capacity
    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Self {
            reader,
            header: None,
            state: State::Unopened,
            buffer: vec![0; capacity],
            buffer_pos: 0,
            buffer_len: 0,
            n_records: 0,
        }
    }

    /// Reads the header block and builds the dictionary
    ///
    /// Returns the cached dictionary if the header was already read.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The session is closed
    /// * There is an I/O error when reading from the source, including an
    ///   end of stream before the header is complete
    /// * The header block is invalid
    pub fn read_header(&mut self) -> Result<Arc<KeyDictionary>> {
        self.state.ensure_open()?;
        if let Some(header) = &self.header {
            return Ok(Arc::clone(header));
        }

        // nothing is buffered before the header, so it can be read directly
        let dict = Arc::new(KeyDictionary::from_reader(&mut self.reader)?);
        debug!(
            n_key = dict.n_key(),
            n_ref = dict.n_ref(),
            n_sample = dict.n_sample(),
            "loaded variant header"
        );
        self.header = Some(Arc::clone(&dict));
        self.state = State::HeaderLoaded;
        Ok(dict)
    }

    /// Fills the internal buffer with more data from the reader
    ///
    /// Returns `false` once the reader is exhausted.
    fn fill_buffer(&mut self) -> Result<bool> {
        // Move remaining data to beginning of buffer if needed
        if self.buffer_pos > 0 && self.buffer_pos < self.buffer_len {
            self.buffer.copy_within(self.buffer_pos..self.buffer_len, 0);
            self.buffer_len -= self.buffer_pos;
            self.buffer_pos = 0;
        } else if self.buffer_pos == self.buffer_len {
            self.buffer_len = 0;
            self.buffer_pos = 0;
        }

        if self.buffer_len == self.buffer.len() {
            let grown = (2 * self.buffer.len()).max(SIZE_RECORD_PREFIX);
            self.buffer.resize(grown, 0);
        }

        let bytes_read = self.reader.read(&mut self.buffer[self.buffer_len..])?;
        if bytes_read == 0 {
            return Ok(false);
        }
        self.buffer_len += bytes_read;
        Ok(true)
    }

    fn available(&self) -> usize {
        self.buffer_len - self.buffer_pos
    }

    /// Buffers at least `n` bytes, returning `false` if the stream ends first
    fn ensure(&mut self, n: usize) -> Result<bool> {
        while self.available() < n {
            if !self.fill_buffer()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Discards the partial record left at the end of the stream
    ///
    /// The source is exhausted at this point, so the next call reports a
    /// clean end of stream.
    fn truncated(&mut self, needed: usize) -> Error {
        let available = self.available();
        self.buffer_pos = self.buffer_len;
        debug!(
            n_records = self.n_records,
            needed,
            available,
            "variant stream ends inside a record"
        );
        RecordError::MalformedRecord {
            offset: available,
            source: CodecError::TruncatedInput {
                needed,
                offset: 0,
                available,
            },
        }
        .into()
    }

    /// Reads the next record into `record`, reusing its allocation
    ///
    /// Returns `Ok(false)` when the stream ends at a record boundary. A record
    /// that fails validation is consumed from the stream, so the caller may
    /// continue with the next one. A partial record at the end of the stream
    /// is reported once and discarded; the call after it returns `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The session is closed
    /// * The header cannot be read
    /// * The stream ends inside a record: [`RecordError::MalformedRecord`]
    ///   wrapping [`CodecError::TruncatedInput`], with `needed` the record size
    ///   and `available` the bytes that arrived
    /// * The record is malformed against the dictionary; `record` is left empty
    pub fn read_record(&mut self, record: &mut VariantRecord) -> Result<bool> {
        self.state.ensure_open()?;
        let dict = match self.header.clone() {
            Some(header) => header,
            None => self.read_header()?,
        };

        if !self.ensure(SIZE_RECORD_PREFIX)? {
            if self.available() > 0 {
                return Err(self.truncated(SIZE_RECORD_PREFIX));
            }
            debug!(n_records = self.n_records, "reached end of variant stream");
            return Ok(false);
        }

        let size = record_size(&self.buffer[self.buffer_pos..self.buffer_len]);
        if !self.ensure(size)? {
            return Err(self.truncated(size));
        }

        let start = self.buffer_pos;
        self.buffer_pos += size;
        self.state = State::Streaming;
        record.load(&self.buffer[start..start + size], &dict)?;
        self.n_records += 1;
        trace!(
            record = self.n_records,
            rid = record.rid(),
            pos = record.pos(),
            size,
            "read variant record"
        );
        Ok(true)
    }

    /// Retrieves the next record from the stream
    ///
    /// # Returns
    ///
    /// * `Some(Ok(VariantRecord))` - The next record was successfully read
    /// * `None` - End of stream was reached
    /// * `Some(Err(Error))` - If an error occurred during reading
    pub fn next_record(&mut self) -> Option<Result<VariantRecord>> {
        let mut record = VariantRecord::new();
        match self.read_record(&mut record) {
            Ok(true) => Some(Ok(record)),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }

    /// Closes the session; every later call fails with `SessionClosed`
    pub fn close(&mut self) -> Result<()> {
        self.state.ensure_open()?;
        self.state = State::Closed;
        self.buffer = Vec::new();
        self.buffer_pos = 0;
        self.buffer_len = 0;
        debug!(n_records = self.n_records, "closed variant reader");
        Ok(())
    }

    /// The dictionary, once the header has been read
    #[must_use]
    pub fn header(&self) -> Option<&Arc<KeyDictionary>> {
        self.header.as_ref()
    }

    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    /// Number of records read so far
    #[must_use]
    pub fn n_records(&self) -> usize {
        self.n_records
    }

    /// Consumes the reader and returns the inner byte source
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> Iterator for VariantReader<R> {
    type Item = Result<VariantRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == State::Closed {
            return None;
        }
        self.next_record()
    }
}
