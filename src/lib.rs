//! In-memory capture sessions for host motion sensors.
//!
//! This library buffers time-series readings from a device's motion
//! sensors (accelerometer, gyroscope, optional magnetometer) for the
//! duration of a user-controlled capture session, and exports the buffer
//! as a JSON dataset.
//!
//! # Design Philosophy
//!
//! - **One session per capture**: a [`session::SensorSession`] is created,
//!   initialized, run, and discarded. No pooling, no reconfiguration.
//! - **All-or-nothing capability**: either every sensor kind the config
//!   requires is constructed, or none is. Capability gaps come back as a
//!   typed status, not an error.
//! - **Loud start, tolerant stop**: starting an uninitialized session is a
//!   contract violation; stopping one is a safe no-op. Teardown paths may
//!   always call stop.
//! - **Dense records**: an axis the sensor did not report is `0.0` in the
//!   record, never a gap.
//!
//! # Example
//!
//! ```
//! use futures::executor::block_on;
//! use imu_capture::host::ReadingEvent;
//! use imu_capture::session::SensorSession;
//! use imu_capture::sim::SimHost;
//! use imu_capture::types::{InitStatus, SensorConfig, SensorKind};
//!
//! let host = SimHost::new();
//! let mut session = SensorSession::new(SensorConfig::default());
//! assert_eq!(block_on(session.init(&host)), InitStatus::Success);
//! session.start().unwrap();
//!
//! host.set_axes(SensorKind::Accelerometer, Some(0.1), Some(0.2), Some(9.8));
//! host.emit_reading(SensorKind::Gyroscope, ReadingEvent { timestamp_ms: Some(16.0) });
//!
//! session.stop();
//! assert_eq!(session.data().len(), 1);
//! ```

pub mod export;
pub mod host;
pub mod session;
pub mod sim;
pub mod types;

#[cfg(test)]
mod integration_tests;

pub use session::{SensorFault, SensorSession, SessionError};
pub use types::{Axes, InitStatus, SensorConfig, SensorKind, SensorReading, SessionState};
