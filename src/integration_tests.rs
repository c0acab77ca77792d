//! End-to-end tests for the capture session manager.
//!
//! Exercises full lifecycles against the scripted host: init through
//! export, the ordering guarantee, and the teardown races the component is
//! built around.

use futures::executor::block_on;
use pretty_assertions::assert_eq;

use crate::export::{write_capture, CaptureDocument};
use crate::host::ReadingEvent;
use crate::session::SensorSession;
use crate::sim::SimHost;
use crate::types::{Axes, InitStatus, SensorConfig, SensorKind, SessionState};

fn event(timestamp_ms: f64) -> ReadingEvent {
    ReadingEvent {
        timestamp_ms: Some(timestamp_ms),
    }
}

/// The reference scenario: constant acceleration, varying rotation, three
/// driving ticks at 60 Hz spacing.
#[test]
fn test_three_tick_capture_scenario() {
    let host = SimHost::new();
    let config = SensorConfig {
        frequency_hz: 60.0,
        remove_gravity: false,
        magnetometer: false,
    };
    let mut session = SensorSession::new(config);
    assert_eq!(block_on(session.init(&host)), InitStatus::Success);
    session.start().unwrap();

    host.set_axes(SensorKind::Accelerometer, Some(1.0), Some(2.0), Some(3.0));
    let gyro_ticks = [
        (0.0, (0.0, 0.0, 0.0)),
        (16.0, (0.0, 1.0, 0.0)),
        (33.0, (0.0, 0.0, 1.0)),
    ];
    for (t, (gx, gy, gz)) in gyro_ticks {
        host.set_axes(SensorKind::Gyroscope, Some(gx), Some(gy), Some(gz));
        host.emit_reading(SensorKind::Gyroscope, event(t));
    }

    let data = session.data();
    assert_eq!(data.len(), 3);
    for record in &data {
        assert_eq!(record.acceleration, Axes::new(1.0, 2.0, 3.0));
    }
    assert_eq!(data[0].angular_velocity, Axes::new(0.0, 0.0, 0.0));
    assert_eq!(data[1].angular_velocity, Axes::new(0.0, 1.0, 0.0));
    assert_eq!(data[2].angular_velocity, Axes::new(0.0, 0.0, 1.0));
    assert_eq!(
        data.iter().map(|r| r.timestamp_ms).collect::<Vec<_>>(),
        vec![0.0, 16.0, 33.0]
    );
}

/// N driving events in order produce exactly N records in that order.
#[test]
fn test_buffer_order_matches_event_delivery_order() {
    let host = SimHost::new();
    let mut session = SensorSession::new(SensorConfig::default());
    assert_eq!(block_on(session.init(&host)), InitStatus::Success);
    session.start().unwrap();

    let n = 200;
    for i in 0..n {
        let t = i as f64 * (1000.0 / 60.0);
        host.set_axes(SensorKind::Gyroscope, Some(i as f64), None, None);
        host.emit_reading(SensorKind::Gyroscope, event(t));
    }

    let data = session.data();
    assert_eq!(data.len(), n);
    for (i, pair) in data.windows(2).enumerate() {
        assert!(pair[0].timestamp_ms <= pair[1].timestamp_ms);
        assert_eq!(pair[0].angular_velocity.x, i as f64);
    }
}

/// Full path: capture, finish, export, read the document back.
#[test]
fn test_capture_to_export_round_trip() {
    let host = SimHost::new();
    let config = SensorConfig {
        magnetometer: true,
        ..SensorConfig::default()
    };
    let mut session = SensorSession::new(config);
    assert_eq!(block_on(session.init(&host)), InitStatus::Success);
    session.start().unwrap();

    host.set_axes(SensorKind::Accelerometer, Some(0.3), Some(-0.1), Some(9.8));
    host.set_axes(SensorKind::Magnetometer, Some(22.0), Some(-4.0), Some(40.0));
    for i in 0..5 {
        host.emit_reading(SensorKind::Gyroscope, event(i as f64 * 16.0));
    }
    session.stop();

    let readings = session.finish();
    let dir = tempfile::tempdir().unwrap();
    let path = write_capture(dir.path(), config, readings, chrono::Utc::now()).unwrap();

    let back: CaptureDocument =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(back.reading_count, 5);
    assert_eq!(back.config, config);
    assert_eq!(back.readings[0].magnetometer, Some(Axes::new(22.0, -4.0, 40.0)));
}

/// A caller that abandons interest right after init tears down without
/// ever arming; nothing is buffered and every handle ends disarmed.
#[test]
fn test_abandoned_session_tears_down_unarmed() {
    let host = SimHost::new();
    let mut session = SensorSession::new(SensorConfig::default());
    assert_eq!(block_on(session.init(&host)), InitStatus::Success);

    session.stop();
    let data = session.finish();
    assert!(data.is_empty());
    assert_eq!(host.started(SensorKind::Gyroscope), 0);
    assert!(!host.is_running(SensorKind::Gyroscope));
    assert!(!host.is_running(SensorKind::Accelerometer));
}

/// One session at a time: the old session is stopped and released before
/// its replacement captures.
#[test]
fn test_new_session_replaces_stopped_predecessor() {
    let host = SimHost::new();

    let mut first = SensorSession::new(SensorConfig::default());
    assert_eq!(block_on(first.init(&host)), InitStatus::Success);
    first.start().unwrap();
    host.emit_reading(SensorKind::Gyroscope, event(0.0));
    let first_data = first.finish();
    assert_eq!(first_data.len(), 1);
    assert!(!host.is_running(SensorKind::Gyroscope));

    let mut second = SensorSession::new(SensorConfig::default());
    assert_eq!(block_on(second.init(&host)), InitStatus::Success);
    second.start().unwrap();
    assert_eq!(second.state(), SessionState::Capturing);
    host.set_axes(SensorKind::Gyroscope, Some(0.25), None, None);
    host.emit_reading(SensorKind::Gyroscope, event(100.0));

    let second_data = second.finish();
    assert_eq!(second_data.len(), 1);
    assert_eq!(second_data[0].angular_velocity.x, 0.25);
}
