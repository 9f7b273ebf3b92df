mod parser;

use netcam::{fourcc, Device, Frame, PerformanceCounter, PropertyId, SessionMode};

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use std::sync::Arc;
use std::time::{Duration, Instant};

const RETRY_DELAY: Duration = Duration::from_secs(2);
const SLOW_READ: Duration = Duration::from_millis(500);
const REPORT_WINDOW: usize = 300;

/// Opens the camera if needed and applies the requested settings. Returns
/// `false` if the camera could not be opened or refused a setting that
/// matters.
fn open_camera(camera: &Device, mode: SessionMode, args: &parser::Cli) -> bool {
    if camera.is_opened(mode) {
        info!("camera is already open");
    } else if !camera.open(mode) {
        error!("failed to open the camera");
        return false;
    }

    let width = args.frame_width as f64;
    let height = args.frame_height as f64;
    let fps = args.fps as f64;
    let mjpg = fourcc('M', 'J', 'P', 'G');

    camera.set(PropertyId::FRAME_WIDTH, width, mode);
    camera.set(PropertyId::FRAME_HEIGHT, height, mode);
    camera.set(PropertyId::FOURCC, mjpg, mode);
    camera.set(PropertyId::FPS, fps, mode);

    let checks = [
        (PropertyId::FRAME_WIDTH, width, "frame width"),
        (PropertyId::FRAME_HEIGHT, height, "frame height"),
        (PropertyId::FOURCC, mjpg, "MJPG encoding"),
    ];
    for (property, wanted, what) in checks {
        match camera.get(property, mode) {
            (true, value) if value == wanted => info!("{} set", what),
            _ => {
                error!("failed to set {}", what);
                return false;
            }
        }
    }

    // not every camera has auto focus, so a refusal here is fine
    match args.auto_focus {
        parser::AutoFocus::On => {
            info!("setting auto focus on");
            camera.set(PropertyId::AUTOFOCUS, 1.0, mode);
        }
        parser::AutoFocus::Off => {
            info!("setting auto focus off");
            camera.set(PropertyId::AUTOFOCUS, 0.0, mode);
        }
        parser::AutoFocus::Default => {}
    }

    match camera.get(PropertyId::FPS, mode) {
        (true, actual) if (actual - fps).abs() < 0.1 => info!(fps, "camera accepted the frame rate"),
        _ => warn!(fps, "camera does not seem to run at the requested frame rate, carrying on"),
    }
    true
}

fn open_until_ready(camera: &Device, mode: SessionMode, args: &parser::Cli, attempt: &mut u32) {
    while !open_camera(camera, mode, args) {
        error!(attempt = *attempt, "failed to open camera");
        *attempt += 1;
        std::thread::sleep(RETRY_DELAY);
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = parser::Cli::parse();

    let camera = Arc::new(Device::new(&args.address, args.port)?);

    let handler_camera = camera.clone();
    ctrlc::set_handler(move || {
        info!("releasing camera");
        handler_camera.abort();
        handler_camera.release(SessionMode::PerCall);
        std::process::exit(0);
    })
    .context("could not install signal handler")?;

    info!(device = %camera.endpoint(), "trying to reach the camera");
    if !camera.ping(SessionMode::PerCall) {
        anyhow::bail!("camera at {} did not reply", camera.endpoint());
    }
    info!("camera replied");

    let mode = SessionMode::from(!args.no_keep_alive);
    for i in 1..=10 {
        if camera.ping(mode) {
            info!("camera replied to ping {}", i);
        }
    }

    let mut attempt = 1;
    open_until_ready(&camera, mode, &args, &mut attempt);

    let mut counter = PerformanceCounter::new(REPORT_WINDOW);
    let mut frame = Frame::empty();
    let title = camera.endpoint().to_string();
    let max_iterations = args.max_iterations.max(1);
    let step = if max_iterations > 1 { 1 } else { 0 };

    let mut i = 0;
    while i < max_iterations {
        let started = Instant::now();
        let grabbed = camera.retrieve(&mut frame, mode);
        let spent = started.elapsed();
        if spent > SLOW_READ {
            warn!("{} - took {} milliseconds to read a frame", title, spent.as_millis());
        }

        if grabbed {
            if counter.tick(frame.size()) {
                info!(
                    "{} - fps: {:.1}, mean data read size: {:.1}",
                    title,
                    counter.fps(),
                    counter.mean_data_size()
                );
            }
        } else {
            error!("{} - failed to grab frame {}", title, i);
            counter.reset();
            open_until_ready(&camera, mode, &args, &mut attempt);
        }
        i += step;
    }

    // last call, so close the conversation too
    if camera.release(SessionMode::PerCall) {
        info!("camera released");
    } else {
        anyhow::bail!("failed to release the camera");
    }
    Ok(())
}
