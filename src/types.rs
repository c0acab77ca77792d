//! Core data types for the sensor capture session manager.
//!
//! This module defines the types shared across capability probing, session
//! lifecycle, record fusion, and export. Types are small, owned values;
//! nothing here touches a sensor.
//!
//! Design principle: if a concept exists, it gets a type. Sensor kinds,
//! session states, and init outcomes are all enums rather than strings or
//! booleans so the lifecycle invariants stay checkable in one place.

use serde::{Deserialize, Serialize};

/// A three-axis vector in the device frame.
///
/// Units depend on the producing sensor: m/s² for acceleration, rad/s for
/// angular velocity, μT for magnetic field.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Axes {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Axes {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean magnitude, handy for quick motion checks in tests and demos.
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// One normalized sample fused from the active sensors.
///
/// Every record carries all configured channels. An axis the sensor did not
/// report at read time is `0.0`, never a gap: downstream consumers can rely
/// on a dense, uniform series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Linear acceleration, gravity-compensated or raw per [`SensorConfig`].
    pub acceleration: Axes,

    /// Rotation rate from the gyroscope.
    pub angular_velocity: Axes,

    /// Magnetic field, present only when the configuration enables the
    /// magnetometer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub magnetometer: Option<Axes>,

    /// Monotonic capture time in milliseconds, sourced from the reading
    /// event that triggered fusion.
    pub timestamp_ms: f64,
}

/// Which physical/virtual sensor a handle connects to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SensorKind {
    /// Raw accelerometer, gravity included.
    Accelerometer,
    /// Gravity-compensated acceleration sensor.
    LinearAcceleration,
    Gyroscope,
    Magnetometer,
}

impl SensorKind {
    /// Name used for permission queries and log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKind::Accelerometer => "accelerometer",
            SensorKind::LinearAcceleration => "linear-acceleration",
            SensorKind::Gyroscope => "gyroscope",
            SensorKind::Magnetometer => "magnetometer",
        }
    }
}

impl std::fmt::Display for SensorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capture configuration, immutable for the lifetime of a session.
///
/// Changing any field requires discarding the session and creating a new
/// one; there is no reconfiguration path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Requested sampling rate in Hz, applied identically to every sensor.
    /// Typical values: 30, 60, 100, 200.
    pub frequency_hz: f64,

    /// Use the gravity-compensated acceleration sensor instead of the raw
    /// accelerometer.
    pub remove_gravity: bool,

    /// Include the magnetometer in the required sensor set.
    pub magnetometer: bool,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 60.0,
            remove_gravity: false,
            magnetometer: false,
        }
    }
}

impl SensorConfig {
    /// The kind that satisfies the acceleration channel for this config.
    pub fn acceleration_kind(&self) -> SensorKind {
        if self.remove_gravity {
            SensorKind::LinearAcceleration
        } else {
            SensorKind::Accelerometer
        }
    }

    /// The full required sensor set, all-or-nothing: a session either
    /// constructs every kind listed here or constructs none of them.
    pub fn required_kinds(&self) -> Vec<SensorKind> {
        let mut kinds = vec![self.acceleration_kind(), SensorKind::Gyroscope];
        if self.magnetometer {
            kinds.push(SensorKind::Magnetometer);
        }
        kinds
    }
}

/// Lifecycle state of a capture session.
///
/// Linear progression `Uninitialized → Initializing → Ready → Capturing →
/// Stopped`, with `NotSupported` and `InitError` as terminal failure states
/// entered from `Initializing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initializing,
    /// All required handles constructed and wired, none armed yet.
    Ready,
    /// Handles armed; reading events are being fused into the buffer.
    Capturing,
    /// Handles disarmed. The buffer is retained, not cleared.
    Stopped,
    /// The host lacks one or more required sensor kinds. Terminal.
    NotSupported,
    /// Handle construction or the permission flow failed. Terminal for this
    /// session; the caller may retry with a fresh one.
    InitError,
}

/// Typed outcome of [`init`](crate::session::SensorSession::init).
///
/// Capability and construction failures are expected outcomes the caller
/// branches on, so they come back as a status rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStatus {
    Success,
    /// Non-retryable on this host: a required sensor kind is missing.
    NotSupported,
    /// Potentially transient (dismissed permission prompt, flaky handle
    /// construction); retrying with a new session is reasonable.
    Error,
}
