//! # Integration Tests
//!
//! End-to-end tests over a loopback TCP consumer.
//!
//! Covers:
//! - Byte-exact frames for every record kind
//! - Terminate sentinel as the final bytes on the wire
//! - Degraded (non-streaming) runs
//! - Malformed payloads skipped without stopping the stream
//! - Concurrent producers sharing one writer queue
//! - Bounded shutdown when the consumer stops reading

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use bytes::Bytes;
    use contracts::{
        BehaviorPayload, BehaviorType, EngineEvent, FixationSubtype, MeasurementRecord,
        OutboundFrame, RecordKind,
    };
    use ingestion::{EventAdapter, SessionContext};
    use session::{SessionConfig, SessionController, SessionReport, StreamTarget};
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;
    use transport::{StreamWriter, TcpTransport};
    use tracking_engine::{RecordedEvent, ReplayConfig, ReplayTrackingEngine};
    use wire_codec::FrameDecoder;

    /// Loopback consumer collecting everything until the peer closes
    async fn spawn_consumer() -> (u16, JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            socket.read_to_end(&mut received).await.unwrap();
            received
        });

        (port, handle)
    }

    fn session_config(port: Option<u16>) -> SessionConfig {
        SessionConfig {
            target: port.map(|port| StreamTarget::new("127.0.0.1", port)),
            startup_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    /// Run a replay session until every recorded event has been delivered
    async fn run_replay(events: Vec<RecordedEvent>, port: Option<u16>) -> SessionReport {
        let engine = Arc::new(ReplayTrackingEngine::from_events(
            events,
            ReplayConfig::default(),
        ));
        let controller = SessionController::new(session_config(port), Arc::clone(&engine));

        let finished = async move {
            while !engine.is_finished() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        };

        tokio::time::timeout(Duration::from_secs(10), controller.run(finished))
            .await
            .expect("session should finish")
    }

    fn be(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_be_bytes()).collect()
    }

    fn fixation(timestamp: f64, event_type: &str, x: f64, y: f64) -> BehaviorPayload {
        BehaviorPayload::new(BehaviorType::Fixation)
            .with("timestamp", timestamp)
            .with("event_type", event_type)
            .with("x", x)
            .with("y", y)
    }

    fn gaze_point(timestamp: f64, x: f64, y: f64) -> BehaviorPayload {
        BehaviorPayload::new(BehaviorType::GazePoint)
            .with("timestamp", timestamp)
            .with("x", x)
            .with("y", y)
    }

    fn eye_position(timestamp: f64) -> BehaviorPayload {
        BehaviorPayload::new(BehaviorType::EyePosition)
            .with("timestamp", timestamp)
            .with("left_x", -30.0)
            .with("left_y", 1.0)
            .with("left_z", 600.0)
            .with("right_x", 30.0)
            .with("right_y", 2.0)
            .with("right_z", 601.0)
    }

    fn event(at_ms: f64, behaviors: Vec<BehaviorPayload>) -> RecordedEvent {
        RecordedEvent::new(at_ms, EngineEvent::new("", behaviors))
    }

    /// Fixation Begin at t=1000 at (0.5, 0.5) streams exactly one frame, then -1
    #[tokio::test]
    async fn test_e2e_fixation_begin_byte_exact() {
        let (port, consumer) = spawn_consumer().await;

        let report = run_replay(
            vec![event(0.0, vec![fixation(1000.0, "begin", 0.5, 0.5)])],
            Some(port),
        )
        .await;
        let received = consumer.await.unwrap();

        let mut expected = be(&[20.0, 1000.0, 7.0, 1.0, 0.5, 0.5]);
        expected.extend(be(&[-1.0]));
        assert_eq!(received, expected);

        assert!(report.streaming_enabled);
        assert!(report.engine_setup_ok());
        let writer = report.writer.expect("writer report");
        assert_eq!(writer.metrics.frames_written, 2);
        assert_eq!(writer.metrics.bytes_written, 28);
        assert!(writer.metrics.terminate_written);
    }

    /// All three behaviors in one notification, in fixation/gaze/eye order
    #[tokio::test]
    async fn test_e2e_every_record_kind() {
        let (port, consumer) = spawn_consumer().await;

        run_replay(
            vec![event(
                0.0,
                vec![
                    eye_position(12.0),
                    gaze_point(11.0, 640.0, 360.0),
                    fixation(10.0, "data", 100.0, 200.0),
                ],
            )],
            Some(port),
        )
        .await;
        let received = consumer.await.unwrap();

        assert_eq!(received.len(), 24 + 20 + 36 + 4);
        assert_eq!(&received[24..44], be(&[16.0, 11.0, 1.0, 640.0, 360.0]).as_slice());
        assert_eq!(
            &received[44..80],
            be(&[32.0, 12.0, 3.0, -30.0, 1.0, 600.0, 30.0, 2.0, 601.0]).as_slice()
        );

        let records = FrameDecoder::decode_all(&received).unwrap();
        let kinds: Vec<RecordKind> = records.iter().map(MeasurementRecord::kind).collect();
        assert_eq!(
            kinds,
            vec![
                RecordKind::Fixation,
                RecordKind::GazePoint,
                RecordKind::EyePosition,
                RecordKind::Terminate,
            ]
        );
        assert_eq!(
            records[0],
            MeasurementRecord::Fixation {
                timestamp_ms: 10.0,
                subtype: FixationSubtype::Data,
                x: 100.0,
                y: 200.0,
            }
        );
    }

    /// Many events keep their order and the sentinel is the last 4 bytes
    #[tokio::test]
    async fn test_e2e_terminate_is_last() {
        let (port, consumer) = spawn_consumer().await;

        let events: Vec<RecordedEvent> = (0..50)
            .map(|i| {
                let t = f64::from(i);
                event(t * 0.1, vec![gaze_point(1000.0 + t, t, t * 2.0)])
            })
            .collect();
        run_replay(events, Some(port)).await;
        let received = consumer.await.unwrap();

        assert_eq!(received.len(), 50 * 20 + 4);
        assert_eq!(&received[received.len() - 4..], be(&[-1.0]).as_slice());

        let records = FrameDecoder::decode_all(&received).unwrap();
        assert_eq!(records.len(), 51);
        let timestamps: Vec<f32> = records.iter().filter_map(|r| r.timestamp_ms()).collect();
        let mut sorted = timestamps.clone();
        sorted.sort_by(f32::total_cmp);
        assert_eq!(timestamps, sorted);
        assert_eq!(records.last(), Some(&MeasurementRecord::Terminate));
    }

    /// A payload missing a field is skipped; the next event still streams
    #[tokio::test]
    async fn test_e2e_malformed_payload_skipped() {
        let (port, consumer) = spawn_consumer().await;

        let malformed = BehaviorPayload::new(BehaviorType::GazePoint)
            .with("timestamp", 1.0)
            .with("y", 5.0);
        let report = run_replay(
            vec![
                event(0.0, vec![malformed]),
                event(1.0, vec![gaze_point(2.0, 3.0, 4.0)]),
            ],
            Some(port),
        )
        .await;
        let received = consumer.await.unwrap();

        let mut expected = be(&[16.0, 2.0, 1.0, 3.0, 4.0]);
        expected.extend(be(&[-1.0]));
        assert_eq!(received, expected);

        assert_eq!(report.ingestion.events_received, 2);
        assert_eq!(report.ingestion.parse_errors, 1);
        assert_eq!(report.ingestion.records_forwarded, 1);
    }

    /// Nobody listening: events are processed, nothing is sent, no failure
    #[tokio::test]
    async fn test_e2e_connection_refused_runs_degraded() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let report = run_replay(
            vec![
                event(0.0, vec![fixation(1000.0, "begin", 0.5, 0.5)]),
                event(1.0, vec![fixation(1001.0, "end", 0.5, 0.5)]),
            ],
            Some(port),
        )
        .await;

        assert!(!report.streaming_enabled);
        assert!(report.writer.is_none());
        assert!(report.engine_setup_ok());
        assert_eq!(report.ingestion.records_produced, 2);
        assert_eq!(report.ingestion.records_forwarded, 0);
    }

    /// No target at all behaves the same as an unreachable one
    #[tokio::test]
    async fn test_e2e_no_target_runs_degraded() {
        let report = run_replay(vec![event(0.0, vec![gaze_point(1.0, 2.0, 3.0)])], None).await;

        assert!(!report.streaming_enabled);
        assert!(report.target.is_none());
        assert_eq!(report.ingestion.records_produced, 1);
    }

    /// Consumer hanging up mid-session does not stop the session
    #[tokio::test]
    async fn test_e2e_consumer_disconnect_is_not_fatal() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let hang_up = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            drop(socket);
        });

        let events: Vec<RecordedEvent> = (0..20)
            .map(|i| {
                let t = f64::from(i);
                event(t * 2.0, vec![gaze_point(t, t, t)])
            })
            .collect();
        let report = run_replay(events, Some(port)).await;
        hang_up.await.unwrap();

        assert!(report.streaming_enabled);
        assert_eq!(report.ingestion.records_produced, 20);
        let writer = report.writer.expect("writer report");
        assert_eq!(
            writer.metrics.frames_written + writer.metrics.write_failures,
            21
        );
    }

    /// Callbacks from several engine threads land as whole frames
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_e2e_concurrent_producers_stay_framed() {
        const PRODUCERS: usize = 8;
        const EVENTS_PER_PRODUCER: usize = 250;

        let (port, consumer) = spawn_consumer().await;
        let transport = TcpTransport::open("127.0.0.1", port).await.unwrap();
        let writer = StreamWriter::spawn(transport, 8192);
        let adapter = Arc::new(EventAdapter::new(SessionContext::streaming(writer.sender())));
        let callback = adapter.callback();

        let producers: Vec<_> = (0..PRODUCERS)
            .map(|producer| {
                let callback = Arc::clone(&callback);
                thread::spawn(move || {
                    for i in 0..EVENTS_PER_PRODUCER {
                        callback(EngineEvent::new(
                            "",
                            vec![
                                eye_position(i as f64),
                                gaze_point(i as f64, producer as f64, 0.0),
                            ],
                        ));
                    }
                })
            })
            .collect();
        tokio::task::spawn_blocking(move || {
            for producer in producers {
                producer.join().unwrap();
            }
        })
        .await
        .unwrap();
        drop(callback);

        let report = writer.finish(Duration::from_secs(5)).await;
        let received = consumer.await.unwrap();
        let records = FrameDecoder::decode_all(&received).unwrap();

        let total = PRODUCERS * EVENTS_PER_PRODUCER * 2;
        assert_eq!(records.len(), total + 1);
        assert_eq!(records.last(), Some(&MeasurementRecord::Terminate));
        assert_eq!(adapter.metrics().snapshot().records_dropped, 0);
        assert!(report.metrics.terminate_written);

        let eye_positions = records
            .iter()
            .filter(|r| r.kind() == RecordKind::EyePosition)
            .count();
        assert_eq!(eye_positions, PRODUCERS * EVENTS_PER_PRODUCER);

        // Each producer's gaze points arrive in the order it produced them
        let mut last_seen = vec![None; PRODUCERS];
        for record in &records {
            if let MeasurementRecord::GazePoint { timestamp_ms, x, .. } = *record {
                let producer = x as usize;
                assert!(last_seen[producer].is_none_or(|last| last < timestamp_ms));
                last_seen[producer] = Some(timestamp_ms);
            }
        }
        assert!(
            last_seen
                .iter()
                .all(|last| *last == Some((EVENTS_PER_PRODUCER - 1) as f32))
        );
    }

    /// A peer that accepts but never reads cannot hold shutdown open
    #[tokio::test]
    async fn test_e2e_stalled_consumer_shutdown_is_bounded() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let consumer = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(60)).await;
            drop(socket);
        });

        let transport = TcpTransport::open("127.0.0.1", port).await.unwrap();
        let writer = StreamWriter::spawn(transport, 4);
        let tx = writer.sender();

        // Fill the socket buffers until the queue stops accepting
        let chunk = Bytes::from(vec![0u8; 256 * 1024]);
        let mut backed_up = false;
        for _ in 0..1024 {
            let frame = OutboundFrame::new(RecordKind::EyePosition, chunk.clone());
            if tokio::time::timeout(Duration::from_millis(200), tx.send(frame))
                .await
                .is_err()
            {
                backed_up = true;
                break;
            }
        }
        assert!(backed_up);

        let report = tokio::time::timeout(
            Duration::from_secs(10),
            writer.finish(Duration::from_millis(300)),
        )
        .await
        .expect("finish should be bounded by the grace period");

        assert!(!report.metrics.terminate_written);
        assert!(report.metrics.discarded > 0);
        consumer.abort();
    }
}
