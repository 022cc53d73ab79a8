//! EngineContext - lifecycle state shared by the engine implementations
//!
//! Holds registered handlers and the connection thread. Callbacks are cloned
//! out of their mutex before being invoked, so a handler may call back into
//! the engine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use contracts::{
    ConnectionState, ConnectionStateCallback, ContractError, EngineEvent, EngineEventCallback,
    EngineStep, InteractorSpec,
};
use tracing::{debug, trace, warn};

/// Poll interval while waiting for a commit or a stop request
const POLL_INTERVAL: Duration = Duration::from_millis(5);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) struct EngineContext {
    name: String,
    created_at: Instant,
    fail_on: Option<EngineStep>,
    initialized: AtomicBool,
    running: AtomicBool,
    connected: AtomicBool,
    committed: AtomicBool,
    interactor: Mutex<Option<InteractorSpec>>,
    state_handler: Mutex<Option<ConnectionStateCallback>>,
    event_handler: Mutex<Option<EngineEventCallback>>,
    connection_thread: Mutex<Option<JoinHandle<()>>>,
}

impl EngineContext {
    pub(crate) fn new(name: impl Into<String>, fail_on: Option<EngineStep>) -> Self {
        Self {
            name: name.into(),
            created_at: Instant::now(),
            fail_on,
            initialized: AtomicBool::new(false),
            running: AtomicBool::new(false),
            connected: AtomicBool::new(false),
            committed: AtomicBool::new(false),
            interactor: Mutex::new(None),
            state_handler: Mutex::new(None),
            event_handler: Mutex::new(None),
            connection_thread: Mutex::new(None),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Milliseconds since the engine was created
    pub(crate) fn now_ms(&self) -> f64 {
        self.created_at.elapsed().as_secs_f64() * 1000.0
    }

    /// Gate shared by every setup step
    fn check(&self, step: EngineStep) -> Result<(), ContractError> {
        if self.fail_on == Some(step) {
            return Err(ContractError::engine(step, "simulated failure"));
        }
        if step != EngineStep::Initialize && !self.initialized.load(Ordering::SeqCst) {
            return Err(ContractError::engine(step, "engine context not initialized"));
        }
        Ok(())
    }

    pub(crate) fn initialize(&self) -> Result<(), ContractError> {
        self.check(EngineStep::Initialize)?;
        if self.initialized.swap(true, Ordering::SeqCst) {
            return Err(ContractError::engine(
                EngineStep::Initialize,
                "engine context already initialized",
            ));
        }
        debug!(engine = %self.name, "Engine context initialized");
        Ok(())
    }

    pub(crate) fn register_interactor(&self, spec: &InteractorSpec) -> Result<(), ContractError> {
        self.check(EngineStep::RegisterInteractor)?;
        if spec.id.is_empty() {
            return Err(ContractError::engine(
                EngineStep::RegisterInteractor,
                "interactor id must not be empty",
            ));
        }
        debug!(engine = %self.name, interactor = %spec.id, behaviors = ?spec.behaviors, "Global interactor registered");
        *lock(&self.interactor) = Some(spec.clone());
        Ok(())
    }

    pub(crate) fn register_state_handler(
        &self,
        callback: ConnectionStateCallback,
    ) -> Result<(), ContractError> {
        self.check(EngineStep::RegisterConnectionHandler)?;
        *lock(&self.state_handler) = Some(callback);
        Ok(())
    }

    pub(crate) fn register_event_handler(
        &self,
        callback: EngineEventCallback,
    ) -> Result<(), ContractError> {
        self.check(EngineStep::RegisterEventHandler)?;
        *lock(&self.event_handler) = Some(callback);
        Ok(())
    }

    /// Start the connection thread running `body`
    ///
    /// The thread reports `TryingToConnect` then `Connected` before handing
    /// over to `body`.
    pub(crate) fn enable<F>(self: &Arc<Self>, body: F) -> Result<(), ContractError>
    where
        F: FnOnce(&EngineContext) + Send + 'static,
    {
        self.check(EngineStep::EnableConnection)?;
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(ContractError::engine(
                EngineStep::EnableConnection,
                "connection already enabled",
            ));
        }

        let context = Arc::clone(self);
        let handle = thread::Builder::new()
            .name(format!("{}-connection", self.name))
            .spawn(move || {
                context.notify_state(ConnectionState::TryingToConnect);
                if !context.is_running() {
                    return;
                }
                context.connected.store(true, Ordering::SeqCst);
                context.notify_state(ConnectionState::Connected);

                body(&*context);

                debug!(engine = %context.name, "Connection thread finished");
            })
            .map_err(|e| ContractError::engine(EngineStep::EnableConnection, e.to_string()))?;

        *lock(&self.connection_thread) = Some(handle);
        Ok(())
    }

    pub(crate) fn commit(&self) -> Result<(), ContractError> {
        self.check(EngineStep::CommitSubscription)?;
        if !self.connected.load(Ordering::SeqCst) {
            return Err(ContractError::engine(
                EngineStep::CommitSubscription,
                "not connected to the engine",
            ));
        }
        if lock(&self.interactor).is_none() {
            return Err(ContractError::engine(
                EngineStep::CommitSubscription,
                "no interactor registered",
            ));
        }
        self.committed.store(true, Ordering::SeqCst);
        debug!(engine = %self.name, "Interactor subscription committed");
        Ok(())
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Block until the subscription is committed; `false` if stopped first
    pub(crate) fn wait_for_commit(&self) -> bool {
        while self.is_running() {
            if self.committed.load(Ordering::SeqCst) {
                return true;
            }
            thread::sleep(POLL_INTERVAL);
        }
        false
    }

    /// Sleep up to `duration`, waking early on stop; `false` if stopped
    ///
    /// A deadline past what `Instant` can represent is never reached.
    pub(crate) fn sleep_while_running(&self, duration: Duration) -> bool {
        let deadline = Instant::now().checked_add(duration);
        loop {
            if !self.is_running() {
                return false;
            }
            let now = Instant::now();
            let pause = match deadline {
                Some(deadline) if now >= deadline => return true,
                Some(deadline) => (deadline - now).min(POLL_INTERVAL),
                None => POLL_INTERVAL,
            };
            thread::sleep(pause);
        }
    }

    pub(crate) fn notify_state(&self, state: ConnectionState) {
        let handler = lock(&self.state_handler).clone();
        trace!(engine = %self.name, %state, "Connection state changed");
        if let Some(handler) = handler {
            handler(state);
        }
    }

    /// Deliver an event to the event handler
    ///
    /// Only behaviors the committed interactor subscribed to are delivered;
    /// an empty interactor id is filled in with the registered one.
    pub(crate) fn emit(&self, mut event: EngineEvent) {
        if !self.committed.load(Ordering::SeqCst) {
            return;
        }
        let Some(spec) = lock(&self.interactor).clone() else {
            return;
        };

        event
            .behaviors
            .retain(|payload| spec.behaviors.contains(&payload.behavior_type));
        if event.interactor_id.is_empty() {
            event.interactor_id = spec.id;
        } else if event.interactor_id != spec.id {
            trace!(engine = %self.name, interactor = %event.interactor_id, "Event for unknown interactor ignored");
            return;
        }

        let handler = lock(&self.event_handler).clone();
        if let Some(handler) = handler {
            handler(event);
        }
    }

    /// Stop the connection thread and wait for it
    pub(crate) fn disable(&self) {
        let was_running = self.running.swap(false, Ordering::SeqCst);
        if let Some(handle) = lock(&self.connection_thread).take() {
            if handle.join().is_err() {
                warn!(engine = %self.name, "Connection thread panicked");
            }
        }
        self.committed.store(false, Ordering::SeqCst);
        if was_running && self.connected.swap(false, Ordering::SeqCst) {
            self.notify_state(ConnectionState::Disconnected);
        }
    }

    /// Release handlers and the context
    pub(crate) fn shutdown(&self) {
        self.disable();
        lock(&self.state_handler).take();
        lock(&self.event_handler).take();
        lock(&self.interactor).take();
        if self.initialized.swap(false, Ordering::SeqCst) {
            debug!(engine = %self.name, "Engine context shut down");
        }
    }
}
