//! OutboundFrame - encoded record queued for the stream writer

use bytes::Bytes;

use crate::RecordKind;

/// Encoded record ready to be written to the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundFrame {
    /// Kind of the encoded record
    pub kind: RecordKind,

    /// Wire bytes (big-endian `f32` fields)
    pub bytes: Bytes,
}

impl OutboundFrame {
    /// Wrap encoded bytes
    pub fn new(kind: RecordKind, bytes: Bytes) -> Self {
        Self { kind, bytes }
    }

    /// Whether this is the shutdown sentinel
    pub fn is_terminate(&self) -> bool {
        self.kind == RecordKind::Terminate
    }

    /// Encoded length in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the frame carries no bytes
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
