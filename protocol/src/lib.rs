//! Wire protocol spoken between a netcam client and a camera device.
//!
//! Every exchange is one request message followed by one response message.
//! A message is framed as `[command id: u8][body length: u32 BE][body]`, where
//! the body is MessagePack. Responses echo the command id of their request.

pub mod command;
pub mod error;
pub mod message;
pub mod property;

pub use crate::command::{Command, FramePayload, Payload, Request, Response};
pub use crate::error::{Error, Result};
pub use crate::message::{Message, HEADER_LEN, MAX_BODY_LEN};
pub use crate::property::{fourcc, FourCC, PropertyId, ValueKind};
