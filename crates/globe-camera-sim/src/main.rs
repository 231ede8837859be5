//! Headless camera navigation driver.
//!
//! Replays a scripted gesture or flight against a bare WGS84 globe and
//! prints the camera pose for every frame as CSV on stdout. Useful for tuning
//! controller settings without a renderer.
//!
//! Run with: cargo run -p globe-camera-sim -- --scenario zoom --frames 120
//! Example: RUST_LOG=globe_camera=debug cargo run -p globe-camera-sim -- --scenario tilt --altitude 5000

mod scenario;

use std::{fmt, fs, path::PathBuf, process::ExitCode};

use clap::Parser;
use globe_camera::{
    ControllerSettings, EllipsoidScene, FlightEvent, GestureKind, ScreenSpaceCameraController,
    Viewport,
};
use globe_geometry::Cartographic;
use web_time::Instant;

use scenario::{Action, Scenario, frame_time};

/// Default starting latitude (NYC).
const DEFAULT_LAT: f64 = 40.7;
/// Default starting longitude (NYC).
const DEFAULT_LON: f64 = -74.0;
/// Default starting altitude in meters.
const DEFAULT_ALTITUDE: f64 = 20_000.0;

#[derive(Parser)]
#[command(about = "Replay scripted camera input against a bare globe")]
struct CliArgs {
    /// Starting latitude in degrees.
    #[arg(long, default_value_t = DEFAULT_LAT)]
    lat: f64,

    /// Starting longitude in degrees.
    #[arg(long, default_value_t = DEFAULT_LON)]
    lon: f64,

    /// Starting altitude above the ellipsoid in meters.
    #[arg(long, default_value_t = DEFAULT_ALTITUDE)]
    altitude: f64,

    /// Starting pitch in degrees.
    #[arg(long, default_value_t = -45.0, allow_hyphen_values = true)]
    pitch: f64,

    /// Interaction to replay.
    #[arg(long, value_enum, default_value_t = Scenario::default())]
    scenario: Scenario,

    /// Number of 60 Hz frames to simulate.
    #[arg(long, default_value_t = 120)]
    frames: u32,

    /// Viewport width in pixels.
    #[arg(long, default_value_t = 1280.0)]
    width: f64,

    /// Viewport height in pixels.
    #[arg(long, default_value_t = 720.0)]
    height: f64,

    /// Controller settings as JSON. Missing fields keep their defaults.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Allow the camera below the surface.
    #[arg(long)]
    under_ground: bool,

    /// Flight destination latitude in degrees.
    #[arg(long, default_value_t = 48.85)]
    to_lat: f64,

    /// Flight destination longitude in degrees.
    #[arg(long, default_value_t = 2.35)]
    to_lon: f64,

    /// Flight destination altitude in meters.
    #[arg(long, default_value_t = 15_000.0)]
    to_altitude: f64,

    /// Flight duration in seconds. Derived from the distance when omitted.
    #[arg(long)]
    duration: Option<f64>,
}

/// Errors that stop the driver before the simulation starts.
#[derive(Debug)]
enum SimError {
    Io(PathBuf, std::io::Error),
    Settings(PathBuf, serde_json::Error),
    Camera(globe_camera::Error),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::Io(path, e) => write!(f, "failed to read {}: {e}", path.display()),
            SimError::Settings(path, e) => {
                write!(f, "invalid settings in {}: {e}", path.display())
            }
            SimError::Camera(e) => write!(f, "camera error: {e}"),
        }
    }
}

impl std::error::Error for SimError {}

impl From<globe_camera::Error> for SimError {
    fn from(e: globe_camera::Error) -> Self {
        SimError::Camera(e)
    }
}

fn load_settings(path: Option<&PathBuf>) -> Result<ControllerSettings, SimError> {
    let Some(path) = path else {
        return Ok(ControllerSettings::default());
    };
    let text = fs::read_to_string(path).map_err(|e| SimError::Io(path.clone(), e))?;
    let settings =
        serde_json::from_str(&text).map_err(|e| SimError::Settings(path.clone(), e))?;
    tracing::info!(path = %path.display(), "loaded controller settings");
    Ok(settings)
}

fn log_flight_events(frame: u32, events: &[FlightEvent]) {
    for event in events {
        tracing::info!(frame, ?event, "flight event");
    }
}

fn print_header() {
    println!("frame,lon_deg,lat_deg,height_m,heading_deg,pitch_deg,roll_deg,spin,zoom,tilt");
}

fn print_pose(frame: u32, controller: &mut ScreenSpaceCameraController) {
    let cartographic = controller.position_cartographic().unwrap_or_default();
    let heading = controller.heading().to_degrees();
    let pitch = controller.pitch().to_degrees();
    let roll = controller.roll().to_degrees();
    println!(
        "{frame},{:.6},{:.6},{:.3},{heading:.3},{pitch:.3},{roll:.3},{},{},{}",
        cartographic.longitude.to_degrees(),
        cartographic.latitude.to_degrees(),
        cartographic.height,
        controller.mode(GestureKind::Spin).name(),
        controller.mode(GestureKind::Zoom).name(),
        controller.mode(GestureKind::Tilt).name(),
    );
}

fn run(args: &CliArgs) -> Result<(), SimError> {
    let settings = load_settings(args.settings.as_ref())?;
    let viewport = Viewport::new(args.width, args.height)?;
    let mut controller =
        ScreenSpaceCameraController::with_settings(viewport, EllipsoidScene::default(), settings);
    controller.set_enable_under_ground(args.under_ground);

    let start = Cartographic::from_degrees(args.lon, args.lat, args.altitude);
    let destination = controller.camera().ellipsoid().cartographic_to_cartesian(&start);
    controller.set_view(destination, 0.0, args.pitch.to_radians(), 0.0);

    tracing::info!(
        scenario = ?args.scenario,
        frames = args.frames,
        lat = args.lat,
        lon = args.lon,
        altitude = args.altitude,
        "starting simulation"
    );

    let t0 = Instant::now();
    if args.scenario == Scenario::Fly {
        let target = Cartographic::from_degrees(args.to_lon, args.to_lat, args.to_altitude);
        let events = controller.fly_to_cartographic(
            &target,
            0.0,
            args.pitch.to_radians(),
            0.0,
            args.duration,
        );
        log_flight_events(0, &events);
    }

    let script = args.scenario.script(viewport.center(), args.frames, t0);
    print_header();
    for (frame, actions) in (0..args.frames).zip(script) {
        for action in actions {
            match action {
                Action::Input(event) => controller.handle_input(&event),
                Action::Press(key) => controller.press_key(key),
                Action::Release(key) => controller.release_key(key),
            }
        }

        let events = controller.update(frame_time(t0, frame));
        log_flight_events(frame, &events);
        print_pose(frame, &mut controller);
    }

    if controller.is_flying() {
        tracing::warn!("simulation ended before the flight completed");
    }
    tracing::info!("simulation complete");
    Ok(())
}

fn main() -> ExitCode {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let args = CliArgs::parse_from(["globe-camera-sim"]);
        assert_eq!(args.scenario, Scenario::Spin);
        assert_eq!(args.frames, 120);
        assert!((args.pitch + 45.0).abs() < 1e-12);
        assert!(args.settings.is_none());
    }

    #[test]
    fn test_cli_scenario_and_negative_pitch() {
        let args = CliArgs::parse_from([
            "globe-camera-sim",
            "--scenario",
            "fly",
            "--pitch",
            "-90",
            "--duration",
            "2.5",
        ]);
        assert_eq!(args.scenario, Scenario::Fly);
        assert!((args.pitch + 90.0).abs() < 1e-12);
        assert_eq!(args.duration, Some(2.5));
    }

    #[test]
    fn test_missing_settings_file_is_reported() {
        let path = PathBuf::from("/nonexistent/globe-camera-settings.json");
        let error = load_settings(Some(&path)).unwrap_err();
        assert!(matches!(error, SimError::Io(..)));
        assert!(error.to_string().contains("globe-camera-settings.json"));
    }

    #[test]
    fn test_run_spin_scenario() {
        let args = CliArgs::parse_from(["globe-camera-sim", "--frames", "10"]);
        run(&args).unwrap();
    }
}
