//! # session
//!
//! Streaming access to a variant file.
//!
//! A session owns one [`KeyDictionary`](crate::header::KeyDictionary) for its
//! whole lifetime and moves through the states of [`State`]. Reading and
//! writing are separate types, so a read session can never write and a write
//! session can never read.
//!
//! ```
//! use std::io::Cursor;
//! use std::sync::Arc;
//!
//! use binvcf::header::KeyDictionary;
//! use binvcf::record::{RecordBuilder, VariantRecord};
//! use binvcf::session::{VariantReader, VariantWriterBuilder};
//!
//! let dict = Arc::new(
//!     KeyDictionary::from_text(
//!         "##INFO=<ID=DP,Number=1,Type=Integer,Description=\"Depth\">\n\
//!          ###contig=<ID=chr1>\n",
//!     )
//!     .unwrap(),
//! );
//! let record = RecordBuilder::default()
//!     .contig("chr1")
//!     .pos(99)
//!     .alleles("A", &["T"])
//!     .info_ints("DP", &[37])
//!     .build(&dict)
//!     .unwrap();
//!
//! let mut writer = VariantWriterBuilder::default()
//!     .header(dict.clone())
//!     .build(Vec::new())
//!     .unwrap();
//! writer.write_record(&record).unwrap();
//! let bytes = writer.into_inner().unwrap();
//!
//! let mut reader = VariantReader::new(Cursor::new(bytes));
//! let mut decoded = VariantRecord::new();
//! assert!(reader.read_record(&mut decoded).unwrap());
//! assert_eq!(decoded, record);
//! assert!(!reader.read_record(&mut decoded).unwrap());
//! ```

mod reader;
mod writer;

pub use reader::VariantReader;
pub use writer::{Format, VariantWriter, VariantWriterBuilder};

use crate::error::{Result, SessionError};

/// Lifecycle of a session
///
/// `Unopened -> HeaderLoaded -> Streaming -> Closed`; `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    /// No header has been read or written yet
    #[default]
    Unopened,
    /// The dictionary is built and no record has passed yet
    HeaderLoaded,
    /// At least one record has been read or written
    Streaming,
    /// The session has been closed
    Closed,
}
impl State {
    /// Fails with [`SessionError::SessionClosed`] once the session is closed
    pub(crate) fn ensure_open(self) -> Result<()> {
        if self == Self::Closed {
            Err(SessionError::SessionClosed.into())
        } else {
            Ok(())
        }
    }
}
