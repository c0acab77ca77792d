//! Scripted in-memory sensor host.
//!
//! [`SimHost`] implements [`SensorHost`] with no hardware behind it: the
//! test (or the demo binary) decides which kinds exist, sets instantaneous
//! axis values, and fires reading events by hand. Event delivery is
//! synchronous, like the single-threaded host loop it stands in for.
//!
//! `emit_reading` delivers regardless of armed state: a real host can have
//! one last event in flight when a handle is stopped, and the session must
//! survive that straggler.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use async_trait::async_trait;

use crate::host::{
    AxisReading, ErrorCallback, HostError, PermissionOutcome, ReadingCallback, ReadingEvent,
    SensorHandle, SensorHost, SharedHandle,
};
use crate::types::SensorKind;

/// One simulated sensor.
pub struct SimHandle {
    kind: SensorKind,
    frequency_hz: f64,
    axes: AxisReading,
    running: bool,
    starts: usize,
    stops: usize,
    // Callback slots live behind their own Rc so delivery can run a
    // callback without holding the handle borrowed (the fusion callback
    // reads this very handle).
    on_reading: Rc<RefCell<Option<ReadingCallback>>>,
    on_error: Rc<RefCell<Option<ErrorCallback>>>,
}

impl SimHandle {
    fn new(kind: SensorKind, frequency_hz: f64) -> Self {
        Self {
            kind,
            frequency_hz,
            axes: AxisReading::default(),
            running: false,
            starts: 0,
            stops: 0,
            on_reading: Rc::new(RefCell::new(None)),
            on_error: Rc::new(RefCell::new(None)),
        }
    }

    pub fn frequency_hz(&self) -> f64 {
        self.frequency_hz
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl SensorHandle for SimHandle {
    fn kind(&self) -> SensorKind {
        self.kind
    }

    fn start(&mut self) {
        self.running = true;
        self.starts += 1;
    }

    fn stop(&mut self) {
        self.running = false;
        self.stops += 1;
    }

    fn read(&self) -> AxisReading {
        self.axes
    }

    fn set_on_reading(&mut self, callback: ReadingCallback) {
        *self.on_reading.borrow_mut() = Some(callback);
    }

    fn set_on_error(&mut self, callback: ErrorCallback) {
        *self.on_error.borrow_mut() = Some(callback);
    }
}

/// A scriptable host: construct, declare capability, set values, fire
/// events.
pub struct SimHost {
    available: HashSet<SensorKind>,
    failing: HashSet<SensorKind>,
    permission: PermissionOutcome,
    constructed: Cell<usize>,
    handles: RefCell<HashMap<SensorKind, Rc<RefCell<SimHandle>>>>,
}

impl SimHost {
    /// Host exposing every sensor kind with permissions granted.
    pub fn new() -> Self {
        Self::with_kinds(&[
            SensorKind::Accelerometer,
            SensorKind::LinearAcceleration,
            SensorKind::Gyroscope,
            SensorKind::Magnetometer,
        ])
    }

    /// Host exposing only the given kinds.
    pub fn with_kinds(kinds: &[SensorKind]) -> Self {
        Self {
            available: kinds.iter().copied().collect(),
            failing: HashSet::new(),
            permission: PermissionOutcome::Granted,
            constructed: Cell::new(0),
            handles: RefCell::new(HashMap::new()),
        }
    }

    /// Make construction of `kind` fail even though the kind is available,
    /// mimicking a host API that throws from the constructor.
    pub fn fail_construction_of(&mut self, kind: SensorKind) {
        self.failing.insert(kind);
    }

    /// Answer every permission query with `outcome`.
    pub fn set_permission(&mut self, outcome: PermissionOutcome) {
        self.permission = outcome;
    }

    /// Total handles constructed over the host's lifetime.
    pub fn constructed(&self) -> usize {
        self.constructed.get()
    }

    /// Times `start()` was called on the current handle for `kind`
    /// (0 when no handle was ever constructed).
    pub fn started(&self, kind: SensorKind) -> usize {
        self.handle(kind).map_or(0, |h| h.borrow().starts)
    }

    /// Times `stop()` was called on the current handle for `kind`.
    pub fn stopped(&self, kind: SensorKind) -> usize {
        self.handle(kind).map_or(0, |h| h.borrow().stops)
    }

    pub fn is_running(&self, kind: SensorKind) -> bool {
        self.handle(kind).is_some_and(|h| h.borrow().is_running())
    }

    /// Set the instantaneous axis values of an existing handle. `None`
    /// models an axis the sensor has not reported.
    pub fn set_axes(&self, kind: SensorKind, x: Option<f64>, y: Option<f64>, z: Option<f64>) {
        if let Some(handle) = self.handle(kind) {
            handle.borrow_mut().axes = AxisReading { x, y, z };
        }
    }

    /// Deliver one reading event on the handle for `kind`.
    pub fn emit_reading(&self, kind: SensorKind, event: ReadingEvent) {
        let Some(handle) = self.handle(kind) else {
            return;
        };
        let slot = Rc::clone(&handle.borrow().on_reading);
        if let Some(callback) = slot.borrow_mut().as_mut() {
            callback(&event);
        };
    }

    /// Deliver one runtime fault on the handle for `kind`.
    pub fn emit_error(&self, kind: SensorKind, error: HostError) {
        let Some(handle) = self.handle(kind) else {
            return;
        };
        let slot = Rc::clone(&handle.borrow().on_error);
        if let Some(callback) = slot.borrow_mut().as_mut() {
            callback(&error);
        };
    }

    fn handle(&self, kind: SensorKind) -> Option<Rc<RefCell<SimHandle>>> {
        self.handles.borrow().get(&kind).cloned()
    }
}

impl Default for SimHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl SensorHost for SimHost {
    fn supports(&self, kind: SensorKind) -> bool {
        self.available.contains(&kind)
    }

    async fn query_permission(&self, _kind: SensorKind) -> PermissionOutcome {
        self.permission
    }

    fn create(&self, kind: SensorKind, frequency_hz: f64) -> Result<SharedHandle, HostError> {
        if !self.available.contains(&kind) {
            return Err(HostError::Unavailable(kind));
        }
        if self.failing.contains(&kind) {
            return Err(HostError::Construction {
                kind,
                reason: "simulated constructor failure".into(),
            });
        }
        let handle = Rc::new(RefCell::new(SimHandle::new(kind, frequency_hz)));
        self.handles.borrow_mut().insert(kind, Rc::clone(&handle));
        self.constructed.set(self.constructed.get() + 1);
        Ok(handle)
    }
}
