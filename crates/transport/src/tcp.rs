//! TcpTransport - the single outbound TCP connection

use std::fmt;

use tokio::io::AsyncWriteExt;
use tokio::net::{lookup_host, TcpStream};
use tracing::{debug, info, instrument, warn};

use contracts::{ContractError, OutboundFrame, StreamSink};

use crate::error::TransportError;

/// Connection state as seen by the writer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    /// Socket open, writes go to the peer
    Connected,
    /// A write failed; later writes fail without touching the socket
    Disconnected,
    /// Socket released
    Closed,
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Sink writing frames to one TCP peer
///
/// Opened once per process. There is no reconnect: after the first failed
/// write the transport stays `Disconnected` until closed.
pub struct TcpTransport {
    name: String,
    peer: String,
    stream: Option<TcpStream>,
    state: TransportState,
}

impl TcpTransport {
    /// Resolve `host` and connect to the first address that accepts
    #[instrument(name = "tcp_transport_open")]
    pub async fn open(host: &str, port: u16) -> Result<Self, TransportError> {
        let addrs = lookup_host((host, port))
            .await
            .map_err(|source| TransportError::Resolve {
                host: host.to_string(),
                port,
                source,
            })?;

        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect(addr).await {
                Ok(stream) => {
                    // Records are tiny; don't let Nagle hold them back
                    if let Err(e) = stream.set_nodelay(true) {
                        debug!(peer = %addr, error = %e, "Failed to set TCP_NODELAY");
                    }
                    info!(peer = %addr, "Connected to stream consumer");
                    return Ok(Self {
                        name: "tcp".to_string(),
                        peer: addr.to_string(),
                        stream: Some(stream),
                        state: TransportState::Connected,
                    });
                }
                Err(e) => {
                    debug!(peer = %addr, error = %e, "Connect attempt failed");
                    last_err = Some(TransportError::connect(addr.to_string(), e));
                }
            }
        }

        Err(last_err.unwrap_or_else(|| TransportError::NoAddress {
            host: host.to_string(),
            port,
        }))
    }

    /// Remote address
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Current state
    pub fn state(&self) -> TransportState {
        self.state
    }

    fn stream(&mut self) -> Result<&mut TcpStream, ContractError> {
        match (self.state, self.stream.as_mut()) {
            (TransportState::Connected, Some(stream)) => Ok(stream),
            (state, _) => Err(ContractError::sink_write(
                &self.name,
                format!("transport {state}"),
            )),
        }
    }
}

impl StreamSink for TcpTransport {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "tcp_transport_write",
        skip(self, frame),
        fields(peer = %self.peer, kind = %frame.kind, bytes = frame.len())
    )]
    async fn write(&mut self, frame: &OutboundFrame) -> Result<(), ContractError> {
        let stream = self.stream()?;
        if let Err(e) = stream.write_all(&frame.bytes).await {
            self.state = TransportState::Disconnected;
            warn!(peer = %self.peer, error = %e, "Peer connection lost");
            return Err(ContractError::sink_write(&self.name, e.to_string()));
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        if self.state != TransportState::Connected {
            return Ok(());
        }
        let stream = self.stream()?;
        if let Err(e) = stream.flush().await {
            self.state = TransportState::Disconnected;
            return Err(ContractError::sink_write(&self.name, e.to_string()));
        }
        Ok(())
    }

    #[instrument(name = "tcp_transport_close", skip(self), fields(peer = %self.peer))]
    async fn close(&mut self) -> Result<(), ContractError> {
        let Some(mut stream) = self.stream.take() else {
            return Ok(());
        };
        self.state = TransportState::Closed;

        stream
            .shutdown()
            .await
            .map_err(|e| ContractError::SinkConnection {
                sink_name: self.name.clone(),
                message: e.to_string(),
            })?;

        debug!(peer = %self.peer, "Transport closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use contracts::RecordKind;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    fn frame(bytes: &'static [u8]) -> OutboundFrame {
        OutboundFrame::new(RecordKind::GazePoint, Bytes::from_static(bytes))
    }

    #[tokio::test]
    async fn test_open_write_close() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let reader = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            socket.read_to_end(&mut received).await.unwrap();
            received
        });

        let mut transport = TcpTransport::open("127.0.0.1", port).await.unwrap();
        assert_eq!(transport.state(), TransportState::Connected);

        transport.write(&frame(&[1, 2, 3, 4])).await.unwrap();
        transport.write(&frame(&[5, 6])).await.unwrap();
        transport.flush().await.unwrap();
        transport.close().await.unwrap();
        assert_eq!(transport.state(), TransportState::Closed);

        assert_eq!(reader.await.unwrap(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[tokio::test]
    async fn test_open_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = TcpTransport::open("127.0.0.1", port).await;
        assert!(matches!(result, Err(TransportError::Connect { .. })));
    }

    #[tokio::test]
    async fn test_open_unresolvable_host() {
        let result = TcpTransport::open("host.invalid", 4242).await;
        assert!(matches!(
            result,
            Err(TransportError::Resolve { .. } | TransportError::NoAddress { .. })
        ));
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_blocks_writes() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let accept = tokio::spawn(async move { listener.accept().await });

        let mut transport = TcpTransport::open("127.0.0.1", port).await.unwrap();
        let _peer = accept.await.unwrap().unwrap();

        transport.close().await.unwrap();
        transport.close().await.unwrap();
        assert!(transport.write(&frame(&[0; 4])).await.is_err());
        assert!(transport.flush().await.is_ok());
    }
}
