//! Host sensor abstraction.
//!
//! A [`SensorHost`] is whatever the platform provides for instantiating
//! motion sensors: per kind, a constructor taking a frequency, start/stop
//! controls, a reading-event subscription, and nullable per-axis
//! instantaneous values. Platform adapters implement these traits; so does
//! the scripted host in [`crate::sim`], which is what the tests and the demo
//! binary run against.
//!
//! The model is single-threaded and event-driven, like the sensor APIs it
//! abstracts: handles are shared `Rc<RefCell<…>>` values and callbacks are
//! plain `FnMut` closures invoked on the host's event loop. Nothing here is
//! `Send`.

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::SensorKind;

/// Errors reported by the host sensor layer.
#[derive(Debug, Clone, Error)]
pub enum HostError {
    /// The host does not expose this sensor kind at all.
    #[error("sensor kind {0} is not available on this host")]
    Unavailable(SensorKind),

    /// Handle construction failed (the host API threw).
    #[error("failed to construct {kind} handle: {reason}")]
    Construction { kind: SensorKind, reason: String },

    /// A runtime fault reported by an armed sensor.
    #[error("sensor {kind} fault: {reason}")]
    Fault { kind: SensorKind, reason: String },
}

/// Result of a permission query for one sensor kind.
///
/// `Unavailable` means the host has no permission capability; per the
/// session contract that is not fatal, construction is the authoritative
/// check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionOutcome {
    Granted,
    Denied,
    Unavailable,
}

/// A reading event delivered by a sensor handle.
///
/// `timestamp_ms` is the host's monotonic event time; `None` when the host
/// event carries no usable timestamp, in which case the session falls back
/// to a wall-clock read.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReadingEvent {
    pub timestamp_ms: Option<f64>,
}

/// Instantaneous per-axis values of one sensor.
///
/// Axes are individually nullable: a sensor that has not produced a value
/// yet (or dropped one) reports `None` for that axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisReading {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

/// Callback invoked on each reading event of a handle.
pub type ReadingCallback = Box<dyn FnMut(&ReadingEvent)>;

/// Callback invoked when an armed handle reports a runtime fault.
pub type ErrorCallback = Box<dyn FnMut(&HostError)>;

/// A live connection to one physical or virtual motion sensor.
pub trait SensorHandle {
    /// The kind this handle connects to.
    fn kind(&self) -> SensorKind;

    /// Begin physical sampling. Reading events start arriving after this.
    fn start(&mut self);

    /// Stop physical sampling. Safe to call on a handle that never started.
    fn stop(&mut self);

    /// Latest instantaneous values, each axis `None` until the sensor has
    /// reported one.
    fn read(&self) -> AxisReading;

    /// Register the reading-event subscriber. At most one subscriber per
    /// handle; a second registration replaces the first.
    fn set_on_reading(&mut self, callback: ReadingCallback);

    /// Register a runtime-fault subscriber. Hosts without fault reporting
    /// may ignore the registration.
    fn set_on_error(&mut self, _callback: ErrorCallback) {}
}

/// Shared ownership of a handle between the session and the host event
/// dispatch. Single-threaded by construction.
pub type SharedHandle = Rc<RefCell<dyn SensorHandle>>;

/// The platform's sensor-instantiation capability.
#[async_trait(?Send)]
pub trait SensorHost {
    /// Capability probe: does this host expose `kind` at all? Must be
    /// checked for every required kind before constructing anything.
    fn supports(&self, kind: SensorKind) -> bool;

    /// Query authorization for `kind`, suspending while the host resolves
    /// it (e.g. a prompt). Hosts without a permission capability return
    /// [`PermissionOutcome::Unavailable`].
    async fn query_permission(&self, _kind: SensorKind) -> PermissionOutcome {
        PermissionOutcome::Unavailable
    }

    /// Construct a handle for `kind` sampling at `frequency_hz`. The handle
    /// is not armed; the caller arms it with [`SensorHandle::start`].
    fn create(&self, kind: SensorKind, frequency_hz: f64) -> Result<SharedHandle, HostError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_reading_defaults_to_absent() {
        let r = AxisReading::default();
        assert_eq!(r.x, None);
        assert_eq!(r.y, None);
        assert_eq!(r.z, None);
    }

    #[test]
    fn test_host_error_display_names_kind() {
        let err = HostError::Unavailable(SensorKind::Gyroscope);
        assert!(err.to_string().contains("gyroscope"));

        let err = HostError::Construction {
            kind: SensorKind::Magnetometer,
            reason: "bus busy".into(),
        };
        assert!(err.to_string().contains("magnetometer"));
        assert!(err.to_string().contains("bus busy"));
    }
}
