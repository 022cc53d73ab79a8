//! Receiver-side decoder
//!
//! Splits a byte stream back into records. The kind of a length-prefixed
//! frame is taken from its behavior code and cross-checked against the
//! declared byte count.

use bytes::{Buf, BytesMut};
use contracts::{FixationSubtype, MeasurementRecord, Point3, RecordKind, TERMINATE_SENTINEL};

use crate::encode::FIELD_WIDTH;
use crate::error::{CodecError, Result};

/// Decode exactly one frame
///
/// # Errors
/// Fails on incomplete input, malformed header fields, or trailing bytes.
pub fn decode(buf: &[u8]) -> Result<MeasurementRecord> {
    let (record, used) = decode_prefix(buf)?;
    if used != buf.len() {
        return Err(CodecError::TrailingBytes(buf.len() - used));
    }
    Ok(record)
}

/// Decode the frame at the start of `buf`, returning it and its length
fn decode_prefix(buf: &[u8]) -> Result<(MeasurementRecord, usize)> {
    if buf.len() < FIELD_WIDTH {
        return Err(CodecError::Incomplete {
            needed: FIELD_WIDTH,
            available: buf.len(),
        });
    }

    let mut cursor = buf;
    let first = cursor.get_f32();
    if first == TERMINATE_SENTINEL {
        return Ok((MeasurementRecord::Terminate, FIELD_WIDTH));
    }

    let declared = byte_count(first)?;
    let total = FIELD_WIDTH + declared;
    if buf.len() < total {
        return Err(CodecError::Incomplete {
            needed: total,
            available: buf.len(),
        });
    }

    let timestamp_ms = cursor.get_f32();
    let code = cursor.get_f32();
    let kind = RecordKind::from_behavior_code(code).ok_or(CodecError::UnknownBehavior(code))?;

    let expected = kind.field_count() * FIELD_WIDTH;
    if declared != expected {
        return Err(CodecError::LengthMismatch {
            behavior: code,
            declared,
            expected,
        });
    }

    let record = match kind {
        RecordKind::Fixation => {
            let raw_subtype = cursor.get_f32();
            let subtype = FixationSubtype::from_code(raw_subtype)
                .ok_or(CodecError::InvalidSubtype(raw_subtype))?;
            MeasurementRecord::Fixation {
                timestamp_ms,
                subtype,
                x: cursor.get_f32(),
                y: cursor.get_f32(),
            }
        }
        RecordKind::GazePoint => MeasurementRecord::GazePoint {
            timestamp_ms,
            x: cursor.get_f32(),
            y: cursor.get_f32(),
        },
        RecordKind::EyePosition => MeasurementRecord::EyePosition {
            timestamp_ms,
            left: read_point(&mut cursor),
            right: read_point(&mut cursor),
        },
        // from_behavior_code never yields Terminate
        RecordKind::Terminate => MeasurementRecord::Terminate,
    };

    Ok((record, total))
}

fn read_point(cursor: &mut &[u8]) -> Point3 {
    Point3 {
        x: cursor.get_f32(),
        y: cursor.get_f32(),
        z: cursor.get_f32(),
    }
}

/// Validate the leading byte count field
fn byte_count(value: f32) -> Result<usize> {
    let valid = [RecordKind::Fixation, RecordKind::GazePoint, RecordKind::EyePosition]
        .iter()
        .map(|k| k.field_count() * FIELD_WIDTH)
        .find(|&count| count as f32 == value);
    valid.ok_or(CodecError::InvalidByteCount(value))
}

/// Incremental stream decoder
///
/// Feed bytes as they arrive from the socket and pull complete records out.
/// Frames split across reads are held until complete.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: BytesMut,
}

impl FrameDecoder {
    /// Create an empty decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Append received bytes
    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Number of buffered bytes not yet decoded
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Pull the next complete record
    ///
    /// Returns `Ok(None)` when more bytes are needed. On error the buffer is
    /// left untouched; the stream is out of sync at that point.
    pub fn next_record(&mut self) -> Result<Option<MeasurementRecord>> {
        match decode_prefix(&self.buf) {
            Ok((record, used)) => {
                self.buf.advance(used);
                Ok(Some(record))
            }
            Err(CodecError::Incomplete { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Decode a complete captured stream
    ///
    /// # Errors
    /// Fails on malformed frames or a truncated final frame.
    pub fn decode_all(data: &[u8]) -> Result<Vec<MeasurementRecord>> {
        let mut decoder = Self::new();
        decoder.extend(data);

        let mut records = Vec::new();
        while let Some(record) = decoder.next_record()? {
            records.push(record);
        }

        match decode_prefix(&decoder.buf) {
            Err(e @ CodecError::Incomplete { .. }) if decoder.buffered() > 0 => Err(e),
            _ => Ok(records),
        }
    }
}
