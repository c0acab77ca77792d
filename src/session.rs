//! Capture session lifecycle and record fusion.
//!
//! [`SensorSession`] owns the sensor handles for one capture attempt. It
//! probes capability, constructs the required handle set, arms and disarms
//! it, and folds reading events into an append-only buffer of
//! [`SensorReading`] records.
//!
//! # Lifecycle
//!
//! ```text
//! new → init → Ready → start → Capturing → stop → Stopped → finish
//!         │
//!         ├── NotSupported (missing sensor kind, nothing constructed)
//!         └── InitError    (construction failed, partial set discarded)
//! ```
//!
//! One session per capture attempt. Sessions are not reused and not
//! reconfigured; a new capture gets a new session, created only after the
//! previous one is stopped and released.
//!
//! # Fusion
//!
//! The gyroscope is the driving sensor: its reading event triggers record
//! assembly, and the other handles are sampled for their instantaneous
//! values at that tick. A single driver keeps the buffer free of duplicate
//! near-simultaneous records when several sensors emit independently.
//!
//! # The teardown race
//!
//! A caller may lose interest while `init` is still in flight and tear the
//! session down before it ever reached `Ready`. The contracts are
//! asymmetric on purpose: [`SensorSession::stop`] on a handle-less session
//! is a safe no-op, while [`SensorSession::start`] on one is a contract
//! violation that fails loudly. Silently "starting" with no handles would
//! leave the app believing it is recording nothing into nothing.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, error, warn};

use crate::host::{AxisReading, HostError, PermissionOutcome, SensorHost, SharedHandle};
use crate::types::{Axes, InitStatus, SensorConfig, SensorKind, SensorReading, SessionState};

/// Lifecycle-misuse errors. These indicate bugs in the caller, not runtime
/// conditions, and are never swallowed.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("sensors are not initialized; init() must succeed before start()")]
    NotInitialized,
}

/// A runtime fault reported by one armed sensor.
///
/// Faults are recorded on the session and forwarded to the fault observer;
/// they never interrupt fusion of the remaining sensors' data.
#[derive(Debug, Clone)]
pub struct SensorFault {
    pub kind: SensorKind,
    pub message: String,
}

/// Observer for runtime sensor faults, registered by the surrounding
/// application (an explicit observer, not a global logging patch).
pub type FaultObserver = Box<dyn FnMut(&SensorFault)>;

/// The required handles, all-or-nothing: either every kind the config
/// demands was constructed, or the session holds no set at all. The
/// magnetometer slot is populated iff the config enables it, which is fixed
/// for the session's lifetime.
struct HandleSet {
    acceleration: SharedHandle,
    gyroscope: SharedHandle,
    magnetometer: Option<SharedHandle>,
}

impl HandleSet {
    fn all(&self) -> impl Iterator<Item = &SharedHandle> {
        [&self.acceleration, &self.gyroscope]
            .into_iter()
            .chain(self.magnetometer.as_ref())
    }
}

/// One capture session over the host's motion sensors.
pub struct SensorSession {
    config: SensorConfig,
    state: SessionState,
    handles: Option<HandleSet>,
    buffer: Rc<RefCell<Vec<SensorReading>>>,
    faults: Rc<RefCell<Vec<SensorFault>>>,
    fault_observer: Rc<RefCell<Option<FaultObserver>>>,
    /// Origin for the wall-clock timestamp fallback.
    epoch: Instant,
}

impl SensorSession {
    /// Creates an uninitialized session. No sensor is touched until
    /// [`init`](Self::init).
    pub fn new(config: SensorConfig) -> Self {
        Self {
            config,
            state: SessionState::Uninitialized,
            handles: None,
            buffer: Rc::new(RefCell::new(Vec::new())),
            faults: Rc::new(RefCell::new(Vec::new())),
            fault_observer: Rc::new(RefCell::new(None)),
            epoch: Instant::now(),
        }
    }

    /// Registers the fault observer. Effective immediately, including for
    /// handles wired by an earlier `init`.
    pub fn set_fault_observer(&mut self, observer: FaultObserver) {
        *self.fault_observer.borrow_mut() = Some(observer);
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    /// Probes capability and constructs the required handle set.
    ///
    /// Permission denial (or a host without a permission capability) is not
    /// itself fatal; construction is the authoritative check. A missing
    /// sensor kind yields [`InitStatus::NotSupported`] before anything is
    /// constructed, so failure never leaves a partial handle set behind.
    pub async fn init(&mut self, host: &dyn SensorHost) -> InitStatus {
        self.state = SessionState::Initializing;
        let required = self.config.required_kinds();

        for kind in &required {
            match host.query_permission(*kind).await {
                PermissionOutcome::Granted => debug!(sensor = %kind, "permission granted"),
                PermissionOutcome::Denied => {
                    warn!(sensor = %kind, "permission denied, deferring to construction")
                }
                PermissionOutcome::Unavailable => {
                    debug!(sensor = %kind, "no permission capability on this host")
                }
            }
        }

        for kind in &required {
            if !host.supports(*kind) {
                warn!(sensor = %kind, "host does not support required sensor");
                self.state = SessionState::NotSupported;
                return InitStatus::NotSupported;
            }
        }

        let mut constructed: Vec<SharedHandle> = Vec::with_capacity(required.len());
        for kind in &required {
            match host.create(*kind, self.config.frequency_hz) {
                Ok(handle) => {
                    debug!(sensor = %kind, frequency_hz = self.config.frequency_hz, "constructed handle");
                    constructed.push(handle);
                }
                Err(err) => {
                    // Partially-constructed handles are dropped unarmed.
                    error!(sensor = %kind, %err, "handle construction failed");
                    self.state = SessionState::InitError;
                    return InitStatus::Error;
                }
            }
        }

        // required_kinds() ordering: acceleration, gyroscope, [magnetometer].
        let magnetometer = if self.config.magnetometer {
            constructed.pop()
        } else {
            None
        };
        let (acceleration, gyroscope) = match (constructed.first(), constructed.get(1)) {
            (Some(a), Some(g)) => (Rc::clone(a), Rc::clone(g)),
            _ => {
                self.state = SessionState::InitError;
                return InitStatus::Error;
            }
        };

        let set = HandleSet {
            acceleration,
            gyroscope,
            magnetometer,
        };
        self.wire_fault_callbacks(&set);
        self.install_fusion(&set);
        self.handles = Some(set);
        self.state = SessionState::Ready;
        InitStatus::Success
    }

    /// Arms every handle and begins buffering.
    ///
    /// Fails with [`SessionError::NotInitialized`] when the handle set is
    /// missing: calling `start` without a successful `init` is a caller
    /// bug. Double-start without an intervening stop is handle-defined and
    /// not a contract of this component.
    pub fn start(&mut self) -> Result<(), SessionError> {
        let handles = self.handles.as_ref().ok_or(SessionError::NotInitialized)?;
        for handle in handles.all() {
            handle.borrow_mut().start();
        }
        debug!("capture started");
        self.state = SessionState::Capturing;
        Ok(())
    }

    /// Disarms every handle that exists. Tolerant: a no-op on a session
    /// that never initialized, so teardown paths can call it
    /// unconditionally. Does not clear the buffer.
    pub fn stop(&mut self) {
        if let Some(handles) = &self.handles {
            for handle in handles.all() {
                handle.borrow_mut().stop();
            }
            debug!(records = self.buffer.borrow().len(), "capture stopped");
            self.state = SessionState::Stopped;
        }
    }

    /// Snapshot of the buffer accumulated so far. Inclusive of records
    /// captured before a `stop`; `stop` never clears.
    pub fn data(&self) -> Vec<SensorReading> {
        self.buffer.borrow().clone()
    }

    /// Runtime faults recorded so far.
    pub fn faults(&self) -> Vec<SensorFault> {
        self.faults.borrow().clone()
    }

    /// Stops the session, releases every handle, and hands the buffer off
    /// by value. The fusion callback holds only a weak reference, so a
    /// late reading event delivered after handoff finds a dead buffer and
    /// is skipped; the handed-off data can never be mutated again.
    pub fn finish(mut self) -> Vec<SensorReading> {
        self.stop();
        self.handles = None;
        match Rc::try_unwrap(self.buffer) {
            Ok(cell) => cell.into_inner(),
            // Another strong reference would mean a foreign clone of the
            // buffer Rc; fall back to copying out.
            Err(shared) => shared.borrow().clone(),
        }
    }

    /// Registers the fusion callback on the driving sensor (the
    /// gyroscope). Only weak references are captured: the closure lives
    /// inside the handle, which the host may outlive the session.
    fn install_fusion(&self, set: &HandleSet) {
        let buffer = Rc::downgrade(&self.buffer);
        let acceleration = Rc::downgrade(&set.acceleration);
        let gyroscope = Rc::downgrade(&set.gyroscope);
        let magnetometer = set.magnetometer.as_ref().map(Rc::downgrade);
        let epoch = self.epoch;

        set.gyroscope
            .borrow_mut()
            .set_on_reading(Box::new(move |event| {
                // A dead upgrade means teardown won the race; skip the tick
                // rather than emit a partial record.
                let (Some(buffer), Some(acceleration), Some(gyroscope)) = (
                    buffer.upgrade(),
                    acceleration.upgrade(),
                    gyroscope.upgrade(),
                ) else {
                    return;
                };
                let magnetometer = match &magnetometer {
                    Some(weak) => match weak.upgrade() {
                        Some(handle) => Some(handle),
                        None => return,
                    },
                    None => None,
                };

                let timestamp_ms = event
                    .timestamp_ms
                    .unwrap_or_else(|| epoch.elapsed().as_secs_f64() * 1000.0);

                let reading = SensorReading {
                    acceleration: axes_or_zero(acceleration.borrow().read()),
                    angular_velocity: axes_or_zero(gyroscope.borrow().read()),
                    magnetometer: magnetometer.map(|m| axes_or_zero(m.borrow().read())),
                    timestamp_ms,
                };
                buffer.borrow_mut().push(reading);
            }));
    }

    /// Routes per-handle runtime faults into the fault log and observer.
    /// A faulting sensor never interrupts fusion of the others.
    fn wire_fault_callbacks(&self, set: &HandleSet) {
        for handle in set.all() {
            let kind = handle.borrow().kind();
            let faults = Rc::clone(&self.faults);
            let observer = Rc::clone(&self.fault_observer);
            handle.borrow_mut().set_on_error(Box::new(move |err: &HostError| {
                error!(sensor = %kind, %err, "sensor fault");
                let fault = SensorFault {
                    kind,
                    message: err.to_string(),
                };
                if let Some(observer) = observer.borrow_mut().as_mut() {
                    observer(&fault);
                }
                faults.borrow_mut().push(fault);
            }));
        }
    }
}

/// Normalizes nullable host axes into a dense record field: an axis the
/// sensor reported nothing for becomes `0.0`, never a gap.
fn axes_or_zero(reading: AxisReading) -> Axes {
    Axes {
        x: reading.x.unwrap_or(0.0),
        y: reading.y.unwrap_or(0.0),
        z: reading.z.unwrap_or(0.0),
    }
}
