//! Record encoder
//!
//! Pure transform from a `MeasurementRecord` to its wire fields.

use bytes::{BufMut, Bytes, BytesMut};
use contracts::{
    MeasurementRecord, OutboundFrame, RecordKind, EYE_POSITION_BEHAVIOR_CODE,
    FIXATION_BEHAVIOR_CODE, GAZE_POINT_BEHAVIOR_CODE, TERMINATE_SENTINEL,
};

/// Width of every wire field in bytes
pub const FIELD_WIDTH: usize = 4;

/// Wire fields of a record, in transmission order
///
/// Length-prefixed kinds start with the byte count of the fields that follow;
/// terminate is the bare sentinel.
pub fn fields(record: &MeasurementRecord) -> Vec<f32> {
    match *record {
        MeasurementRecord::Fixation {
            timestamp_ms,
            subtype,
            x,
            y,
        } => length_prefixed(&[timestamp_ms, FIXATION_BEHAVIOR_CODE, subtype.code(), x, y]),
        MeasurementRecord::GazePoint { timestamp_ms, x, y } => {
            length_prefixed(&[timestamp_ms, GAZE_POINT_BEHAVIOR_CODE, x, y])
        }
        MeasurementRecord::EyePosition {
            timestamp_ms,
            left,
            right,
        } => length_prefixed(&[
            timestamp_ms,
            EYE_POSITION_BEHAVIOR_CODE,
            left.x,
            left.y,
            left.z,
            right.x,
            right.y,
            right.z,
        ]),
        MeasurementRecord::Terminate => vec![TERMINATE_SENTINEL],
    }
}

fn length_prefixed(body: &[f32]) -> Vec<f32> {
    let mut out = Vec::with_capacity(body.len() + 1);
    out.push((body.len() * FIELD_WIDTH) as f32);
    out.extend_from_slice(body);
    out
}

/// Encoded size of a record kind in bytes
pub fn encoded_len(kind: RecordKind) -> usize {
    match kind {
        RecordKind::Terminate => FIELD_WIDTH,
        other => (other.field_count() + 1) * FIELD_WIDTH,
    }
}

/// Append the encoded record to `buf`
pub fn encode_into(record: &MeasurementRecord, buf: &mut BytesMut) {
    let fields = fields(record);
    buf.reserve(fields.len() * FIELD_WIDTH);
    for value in fields {
        // put_f32 writes big-endian regardless of host order
        buf.put_f32(value);
    }
}

/// Encode a record into a standalone buffer
pub fn encode(record: &MeasurementRecord) -> Bytes {
    let mut buf = BytesMut::with_capacity(encoded_len(record.kind()));
    encode_into(record, &mut buf);
    buf.freeze()
}

/// Encode a record into a frame for the stream writer
pub fn encode_frame(record: &MeasurementRecord) -> OutboundFrame {
    OutboundFrame::new(record.kind(), encode(record))
}
