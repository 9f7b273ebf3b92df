use clap::{Parser, ValueEnum};

#[derive(Parser)]
#[command(version, about = "Grab frames from a network camera", long_about = None)]
pub(crate) struct Cli {
    /// Camera address, such as 192.168.2.2
    #[arg(long, default_value = "192.168.2.2")]
    pub address: String,
    /// Camera port
    #[arg(long, default_value_t = 4001)]
    pub port: u16,

    /// Requested frame width, in pixels
    #[arg(long, default_value_t = 320)]
    pub frame_width: u32,
    /// Requested frame height, in pixels
    #[arg(long, default_value_t = 240)]
    pub frame_height: u32,
    /// Requested frame rate
    #[arg(long, default_value_t = 30)]
    pub fps: u32,

    /// Number of frames to grab. 1 or less grabs until interrupted.
    #[arg(long, default_value_t = 1000)]
    pub max_iterations: i64,
    /// Turn auto focus on or off, or leave it as the camera has it
    #[arg(long, value_enum, default_value_t = AutoFocus::Default)]
    pub auto_focus: AutoFocus,

    /// Open a new connection for every call
    #[arg(long)]
    pub no_keep_alive: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AutoFocus {
    On,
    Off,
    Default,
}
