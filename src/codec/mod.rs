//! # codec
//!
//! The typed-value wire codec shared by the binary header and every record.
//!
//! ## Value layout
//!
//! Each value starts with a single descriptor byte:
//!
//! | Bits | Meaning                                  |
//! | ---- | ---------------------------------------- |
//! | 7-4  | element count (15 = escaped count)       |
//! | 3-0  | element type tag (see [`WireType`])      |
//!
//! When the count is 15 or larger the nibble is set to 15 and the descriptor is
//! followed by a `uint8` descriptor (`0x1d`) and one literal count byte, which
//! limits vectors to 255 elements. The payload follows as `count` little-endian
//! elements of the type's width with no per-element descriptor.
//!
//! ## Integers
//!
//! Integers are written with the narrowest of `int8`/`int16`/`int32` that holds
//! them. The minimum of each width is reserved as its missing marker, and the
//! 32-bit missing value always encodes as `int8` `0x80`.
//!
//! ```
//! use binvcf::codec::{decode_int1, encode_int1};
//!
//! let mut buf = Vec::new();
//! encode_int1(&mut buf, 300);
//! assert_eq!(buf, [0x12, 0x2c, 0x01]);
//!
//! let (value, next) = decode_int1(&buf, 0).unwrap();
//! assert_eq!(value, 300);
//! assert_eq!(next, buf.len());
//! ```

mod decode;
mod encode;
mod types;

pub use decode::{decode_int1, decode_size, floats, ints, scalar_at, Descriptor, TypedCursor};
pub use encode::{
    encode_flag, encode_floats, encode_int1, encode_ints, encode_key, encode_size, encode_str,
    int_type, int_type_for, put_floats, put_ints, MAX_COUNT,
};
pub use types::{
    is_missing_float, missing_float, Scalar, WireType, MISSING_FLOAT_BITS, MISSING_INT, TYPE_SIZE,
};
