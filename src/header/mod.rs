//! # header
//!
//! The key dictionary shared between the header and every record.
//!
//! Every FILTER, INFO, FORMAT, contig, and sample name in a file is interned
//! into a dense integer id in the order it first appears in the header text.
//! Records refer to keys exclusively through these ids, so a dictionary must be
//! fully built before the first record can be encoded or decoded, and it never
//! changes afterwards.
//!
//! ```
//! use binvcf::header::{Category, ExpectedCount, KeyDictionary};
//!
//! let text = "##INFO=<ID=AF,Number=A,Type=Float,Description=\"Allele Frequency\">\n";
//! let dict = KeyDictionary::from_text(text).unwrap();
//!
//! // PASS is always FILTER key 0
//! let af = dict.id_in(Category::Info, "AF").unwrap();
//! assert_eq!(af, 1);
//! assert_eq!(
//!     dict.cardinality_for(af, Category::Info, 2).unwrap(),
//!     ExpectedCount::Exactly(2)
//! );
//! ```

mod binary;
mod dictionary;
mod parse;

pub use binary::{FORMAT, MAGIC, SIZE_HEADER_PREFIX};
pub use dictionary::{
    Cardinality, Category, ExpectedCount, KeyDictionary, KeyEntry, KeyInfo, ValueKind,
    MAX_CONTIG_LENGTH, MAX_FIXED_NUMBER, UNDEFINED_INFO,
};
pub use parse::{parse_number, parse_type, PASS};
