//! Demo binary: run a simulated capture session and export it.
//!
//! Stands in for the application shell around the session manager: it
//! configures a session, drives a scripted host through a capture, and
//! writes the resulting dataset next to where you ran it.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use futures::executor::block_on;
use tracing::info;
use tracing_subscriber::EnvFilter;

use imu_capture::export::write_capture;
use imu_capture::host::ReadingEvent;
use imu_capture::session::SensorSession;
use imu_capture::sim::SimHost;
use imu_capture::types::{InitStatus, SensorConfig, SensorKind};

#[derive(Debug, Parser)]
#[command(name = "imu-capture", about = "Capture simulated motion sensor data to a JSON file")]
struct Args {
    /// Sampling rate in Hz (typical: 30, 60, 100, 200)
    #[arg(long, default_value_t = 60.0)]
    frequency: f64,

    /// Use the gravity-compensated acceleration sensor
    #[arg(long)]
    remove_gravity: bool,

    /// Include the magnetometer channel
    #[arg(long)]
    magnetometer: bool,

    /// Number of driving-sensor ticks to simulate
    #[arg(long, default_value_t = 300)]
    ticks: usize,

    /// Directory for the capture file
    #[arg(long, default_value = ".")]
    out: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let config = SensorConfig {
        frequency_hz: args.frequency,
        remove_gravity: args.remove_gravity,
        magnetometer: args.magnetometer,
    };

    let host = SimHost::new();
    let mut session = SensorSession::new(config);
    match block_on(session.init(&host)) {
        InitStatus::Success => {}
        InitStatus::NotSupported => bail!("host lacks a required sensor kind"),
        InitStatus::Error => bail!("sensor initialization failed"),
    }
    session.start()?;

    info!(ticks = args.ticks, frequency = config.frequency_hz, "simulating capture");
    run_script(&host, &config, args.ticks);
    session.stop();

    let readings = session.finish();
    let path = write_capture(&args.out, config, readings, chrono::Utc::now())
        .context("exporting capture")?;
    println!("{}", path.display());
    Ok(())
}

/// Feeds the host a gentle synthetic motion profile: gravity on Z with a
/// slow sway on X/Y, a periodic rotation, and a steady field for the
/// magnetometer when enabled.
fn run_script(host: &SimHost, config: &SensorConfig, ticks: usize) {
    let interval_ms = 1000.0 / config.frequency_hz;
    let gravity_z = if config.remove_gravity { 0.0 } else { 9.81 };

    for i in 0..ticks {
        let t = i as f64 * interval_ms;
        let phase = t / 1000.0 * std::f64::consts::TAU * 0.5;

        host.set_axes(
            config.acceleration_kind(),
            Some(0.6 * phase.sin()),
            Some(0.4 * phase.cos()),
            Some(gravity_z + 0.05 * (2.0 * phase).sin()),
        );
        host.set_axes(
            SensorKind::Gyroscope,
            Some(0.2 * phase.cos()),
            Some(0.0),
            Some(0.1 * phase.sin()),
        );
        if config.magnetometer {
            host.set_axes(SensorKind::Magnetometer, Some(22.0), Some(-4.0), Some(41.0));
        }

        host.emit_reading(
            SensorKind::Gyroscope,
            ReadingEvent {
                timestamp_ms: Some(t),
            },
        );
    }
}
