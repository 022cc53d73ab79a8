//! SessionController - startup, streaming and teardown sequencing

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{ConnectionState, ContractError, EngineStep, TrackingEngine};
use ingestion::{EventAdapter, SessionContext};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};
use transport::{StreamWriter, TcpTransport};

use crate::config::SessionConfig;
use crate::report::SessionReport;

/// How long teardown waits for the connection-state consumer
const MONITOR_GRACE: Duration = Duration::from_secs(1);

/// Session controller
pub struct SessionController<E> {
    config: SessionConfig,
    engine: Arc<E>,
}

impl<E: TrackingEngine + 'static> SessionController<E> {
    pub fn new(config: SessionConfig, engine: Arc<E>) -> Self {
        Self { config, engine }
    }

    /// Run the session until `exit` resolves
    #[instrument(name = "session_run", skip_all, fields(engine = %self.engine.name()))]
    pub async fn run<F>(self, exit: F) -> SessionReport
    where
        F: Future<Output = ()>,
    {
        let started = Instant::now();

        // 1. Connecting
        let writer = self.connect().await;
        let session = match &writer {
            Some(writer) => SessionContext::streaming(writer.sender()),
            None => SessionContext::degraded(),
        };
        observability::record_streaming_enabled(session.is_streaming());

        // 2. Startup delay
        if !self.config.startup_delay.is_zero() {
            debug!(delay_ms = self.config.startup_delay.as_millis() as u64, "Startup delay");
            tokio::time::sleep(self.config.startup_delay).await;
        }

        // 3. Engine setup
        let adapter = Arc::new(EventAdapter::new(session.clone()));
        let ingestion_metrics = adapter.metrics();
        let (state_tx, state_rx) = mpsc::unbounded_channel();
        let monitor = tokio::spawn(monitor_connection(Arc::clone(&self.engine), state_rx));
        let mut failed_steps = self.setup_engine(&adapter, state_tx);
        drop(adapter);

        if failed_steps.is_empty() {
            info!("Initialization was successful");
        } else {
            warn!(failed_steps = ?failed_steps, "Initialization failed");
        }

        // 4. Streaming
        info!(streaming = session.is_streaming(), "Session running, waiting for exit signal");
        exit.await;
        info!("Exiting");

        // 5. Teardown
        self.teardown_engine().await;
        drop(session);

        let writer = match writer {
            Some(writer) => Some(writer.finish(self.config.shutdown_grace).await),
            None => None,
        };

        failed_steps.extend(join_monitor(monitor).await);

        SessionReport {
            streaming_enabled: writer.is_some(),
            target: self.config.target.as_ref().map(ToString::to_string),
            failed_steps,
            ingestion: ingestion_metrics.snapshot(),
            writer,
            duration: started.elapsed(),
        }
    }

    /// Open the transport and spawn the writer, or `None` for degraded mode
    async fn connect(&self) -> Option<StreamWriter> {
        let Some(target) = &self.config.target else {
            warn!("No stream target given, eye tracking data will not be streamed");
            return None;
        };

        info!(%target, "Trying connection with stream consumer");
        match TcpTransport::open(&target.host, target.port).await {
            Ok(transport) => {
                info!(%target, peer = %transport.peer(), "Successful connection with stream consumer");
                Some(StreamWriter::spawn(transport, self.config.queue_capacity))
            }
            Err(e) => {
                warn!(%target, error = %e, "Unable to connect, eye tracking data will not be streamed");
                None
            }
        }
    }

    /// Run every setup step, collecting the ones that failed
    fn setup_engine(
        &self,
        adapter: &Arc<EventAdapter>,
        state_tx: mpsc::UnboundedSender<ConnectionState>,
    ) -> Vec<EngineStep> {
        let engine = &self.engine;
        let mut failed = Vec::new();

        let mut attempt = |step: EngineStep, result: Result<(), ContractError>| {
            match result {
                Ok(()) => debug!(%step, "Engine setup step done"),
                Err(e) => {
                    warn!(%step, error = %e, "Engine setup step failed");
                    failed.push(step);
                }
            }
        };

        attempt(EngineStep::Initialize, engine.initialize());
        attempt(
            EngineStep::RegisterInteractor,
            engine.register_global_interactor(&self.config.interactor),
        );
        attempt(
            EngineStep::RegisterConnectionHandler,
            engine.register_connection_state_handler(Arc::new(move |state| {
                // Receiver gone means the session is tearing down
                let _ = state_tx.send(state);
            })),
        );
        attempt(
            EngineStep::RegisterEventHandler,
            engine.register_event_handler(adapter.callback()),
        );
        attempt(EngineStep::EnableConnection, engine.enable_connection());

        failed
    }

    /// Disable the connection and release the engine
    ///
    /// Engine calls may join notification threads, so they run off the
    /// async worker.
    async fn teardown_engine(&self) {
        let engine = Arc::clone(&self.engine);
        let result = tokio::task::spawn_blocking(move || {
            engine.disable_connection();
            engine.shutdown();
        })
        .await;

        match result {
            Ok(()) => debug!("Engine shut down"),
            Err(e) => error!(error = ?e, "Engine teardown panicked"),
        }
    }
}

/// Consume connection-state changes; commits the subscription on `Connected`
///
/// Ends when the engine drops its state handler. Returns the steps that
/// failed here.
async fn monitor_connection<E: TrackingEngine>(
    engine: Arc<E>,
    mut states: mpsc::UnboundedReceiver<ConnectionState>,
) -> Vec<EngineStep> {
    let mut failed = Vec::new();

    while let Some(state) = states.recv().await {
        observability::record_connection_state(state);
        match state {
            ConnectionState::Connected => {
                info!(%state, "The connection state is now {state} ({})", state.describe());
                match engine.commit_subscription() {
                    Ok(()) => info!("Waiting for fixation data to start streaming..."),
                    Err(e) => {
                        warn!(error = %e, "Failed to initialize the data stream");
                        failed.push(EngineStep::CommitSubscription);
                    }
                }
            }
            ConnectionState::ServerVersionTooLow | ConnectionState::ServerVersionTooHigh => {
                warn!(%state, "The connection state is now {state}: {}", state.describe());
            }
            ConnectionState::Disconnected | ConnectionState::TryingToConnect => {
                info!(%state, "The connection state is now {state} ({})", state.describe());
            }
        }
    }

    failed
}

async fn join_monitor(monitor: JoinHandle<Vec<EngineStep>>) -> Vec<EngineStep> {
    let abort = monitor.abort_handle();
    match tokio::time::timeout(MONITOR_GRACE, monitor).await {
        Ok(Ok(failed)) => failed,
        Ok(Err(e)) => {
            if !e.is_cancelled() {
                error!(error = ?e, "Connection monitor panicked");
            }
            Vec::new()
        }
        Err(_) => {
            warn!("Engine kept its connection handler after shutdown");
            abort.abort();
            Vec::new()
        }
    }
}
