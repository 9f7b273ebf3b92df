mod parser;

use netcam_camera_server::{CameraServer, SimulatedCamera};
use netcam_protocol::PropertyId;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = parser::Cli::parse();

    let mut camera = SimulatedCamera::new()
        .with_size(args.width, args.height)
        .with_format(args.format.into())
        .with_frame_delay(Duration::from_millis(args.frame_delay_ms));
    if let Some(limit) = args.frame_limit {
        camera = camera.with_frame_limit(limit);
    }
    for id in args.unsupported {
        camera = camera.with_unsupported(PropertyId(id));
    }

    let running = Arc::new(AtomicBool::new(true));
    let handler_running = running.clone();
    ctrlc::set_handler(move || handler_running.store(false, Ordering::Release))
        .context("could not install signal handler")?;

    let server = CameraServer::launch((args.address.as_str(), args.port), camera)
        .with_context(|| format!("could not listen on {}:{}", args.address, args.port))?;
    info!(addr = %server.local_addr(), format = %args.format, "serving");

    while running.load(Ordering::Acquire) && server.is_running() {
        std::thread::sleep(Duration::from_millis(100));
    }

    info!(connections = server.connections_accepted(), "shutting down");
    server.stop()?;
    Ok(())
}
