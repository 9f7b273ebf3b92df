use clap::{Parser, ValueEnum};

#[derive(Parser)]
#[command(version, about = "Simulated network camera", long_about = None)]
pub(crate) struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0")]
    pub address: String,
    /// Port to listen on
    #[arg(long, default_value_t = 4001)]
    pub port: u16,

    /// Frame width, in pixels
    #[arg(long, default_value_t = 640)]
    pub width: u32,
    /// Frame height, in pixels
    #[arg(long, default_value_t = 480)]
    pub height: u32,
    /// FourCC describing the frame format
    #[arg(long, value_enum, default_value_t = Format::YUYV, value_name = "FOURCC")]
    pub format: Format,

    /// Property id the camera should refuse. May be repeated.
    #[arg(long, value_name = "ID")]
    pub unsupported: Vec<u32>,
    /// Delay before answering each frame read, in milliseconds
    #[arg(long, default_value_t = 0)]
    pub frame_delay_ms: u64,
    /// End the stream after this many frames
    #[arg(long)]
    pub frame_limit: Option<u64>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum Format {
    #[value(alias = "yuyv")]
    YUYV,
    #[value(alias = "mjpg")]
    MJPG,
    #[value(alias = "rgb3")]
    RGB3,
}

impl From<Format> for netcam_protocol::FourCC {
    fn from(format: Format) -> netcam_protocol::FourCC {
        match format {
            Format::YUYV => netcam_protocol::FourCC::YUYV,
            Format::MJPG => netcam_protocol::FourCC::MJPG,
            Format::RGB3 => netcam_protocol::FourCC::RGB3,
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
