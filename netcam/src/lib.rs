//! Client for remote cameras served over TCP.
//!
//! A [`Device`] talks to one camera at one address. Each call either rides a
//! persistent keep-alive connection or opens a connection of its own, and
//! reports success as a plain flag so callers can branch on return values.
//! [`PerformanceCounter`] measures the frame rate a read loop achieves.

pub mod config;
pub mod device;
pub mod error;
pub mod frame;
pub mod perf;
pub mod session;
pub mod transport;

pub use crate::config::{DeviceConfig, Endpoint};
pub use crate::device::Device;
pub use crate::error::{Error, Result};
pub use crate::frame::Frame;
pub use crate::perf::PerformanceCounter;
pub use crate::session::SessionMode;
pub use netcam_protocol::{fourcc, FourCC, PropertyId};
