//! Grabs a handful of frames and prints their sizes.
//!
//! ```text
//! cargo run --example grab -- 192.168.2.2 4001
//! ```

use netcam::{fourcc, Device, PropertyId, SessionMode};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let address = args.next().unwrap_or_else(|| "192.168.2.2".to_string());
    let port = match args.next() {
        Some(port) => port.parse()?,
        None => 4001,
    };

    let camera = Device::new(&address, port)?;
    let mode = SessionMode::KeepAlive;

    if !camera.ping(mode) {
        anyhow::bail!("no answer from {}", camera.endpoint());
    }
    if !camera.open(mode) {
        anyhow::bail!("could not open the camera");
    }

    camera.set(PropertyId::FRAME_WIDTH, 1280.0, mode);
    camera.set(PropertyId::FRAME_HEIGHT, 720.0, mode);
    camera.set(PropertyId::FOURCC, fourcc('M', 'J', 'P', 'G'), mode);

    for i in 0..10 {
        let frame = camera.try_read(mode)?;
        println!(
            "frame {}: {}x{} {} ({} bytes)",
            i,
            frame.width(),
            frame.height(),
            frame.format(),
            frame.size()
        );
    }

    camera.release(SessionMode::PerCall);
    Ok(())
}
