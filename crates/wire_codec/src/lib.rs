//! # Wire Codec
//!
//! Record-to-bytes encoding for the measurement stream.
//!
//! Every field is an IEEE-754 `f32` in network (big-endian) byte order:
//!
//! | Kind | Bytes | Layout |
//! |---|---|---|
//! | Fixation | 24 | `[20, timestamp, 7, subtype, x, y]` |
//! | GazePoint | 20 | `[16, timestamp, 1, x, y]` |
//! | EyePosition | 36 | `[32, timestamp, 3, lx, ly, lz, rx, ry, rz]` |
//! | Terminate | 4 | `[-1]` |
//!
//! The leading field is the number of bytes that follow it. Terminate has no
//! length prefix and is recognised by its `-1` value at a frame boundary.
//!
//! ```
//! use contracts::{FixationSubtype, MeasurementRecord};
//!
//! let record = MeasurementRecord::Fixation {
//!     timestamp_ms: 1000.0,
//!     subtype: FixationSubtype::Begin,
//!     x: 0.5,
//!     y: 0.5,
//! };
//! let bytes = wire_codec::encode(&record);
//! assert_eq!(bytes.len(), 24);
//! assert_eq!(wire_codec::decode(&bytes).unwrap(), record);
//! ```

mod decode;
mod encode;
mod error;

pub use decode::{decode, FrameDecoder};
pub use encode::{encode, encode_frame, encode_into, encoded_len, fields, FIELD_WIDTH};
pub use error::{CodecError, Result};
