//! # record
//!
//! The variant record and its wire layout.
//!
//! ## Record layout
//!
//! | Offset | Size (bytes) | Name    | Description                               | Type   |
//! | ------ | ------------ | ------- | ----------------------------------------- | ------ |
//! | 0      | 4            | l_str   | Length of the section buffer              | uint32 |
//! | 4      | 4            | rid     | Contig index                              | int32  |
//! | 8      | 4            | pos     | 0-based position                          | int32  |
//! | 12     | 4            | qual    | Quality (`0x7F800001` when missing)       | float  |
//! | 16     | 2            | n_alt   | Number of alternate alleles               | uint16 |
//! | 18     | 2            | n_fmt   | Number of FORMAT keys                     | uint16 |
//! | 20     | l_str        | str     | Section buffer                            | bytes  |
//!
//! The section buffer holds typed values in a fixed order:
//!
//! 1. ID as a string
//! 2. REF as a string
//! 3. `n_alt` ALT strings
//! 4. FILTER key ids as an integer vector
//! 5. INFO as a pair count followed by (key id, value) pairs
//! 6. FORMAT key ids as an integer vector of length `n_fmt`
//! 7. One genotype block per FORMAT key: a descriptor with the per-sample
//!    count and type, then the values of every sample back to back
//!
//! Only the fixed columns are decoded eagerly. Field accessors rescan the
//! buffer from the offset of their section.

mod builder;
mod field;
mod format;
mod genotype;
mod record;

pub use builder::RecordBuilder;
pub use field::{FormatField, InfoField, Value};
pub use format::{format_record, write_record};
pub use genotype::{allele, is_phased, parse_genotype, write_genotype};
pub use record::{record_size, SectionOffsets, VariantRecord, GENOTYPE_KEY, SIZE_RECORD_PREFIX};
