//! A stand-in camera device speaking the netcam wire protocol.
//!
//! [`SimulatedCamera`] keeps properties in memory and makes up frames;
//! [`CameraServer`] puts it on a TCP port. Useful for exercising clients
//! without hardware.

pub mod camera;
pub mod error;
pub mod server;
pub mod worker;

pub use crate::camera::SimulatedCamera;
pub use crate::error::{Error, Result};
pub use crate::server::CameraServer;
