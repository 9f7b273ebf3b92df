use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use std::io::Cursor;

use crate::error::{Error, Result};
use crate::message::Message;
use crate::property::{FourCC, PropertyId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum Command {
    Ping,
    Open,
    IsOpened,
    GetProp,
    SetProp,
    ReadFrame,
    Release,
}

impl Command {
    pub fn id(&self) -> u8 {
        match self {
            Command::Ping => 0,
            Command::Open => 1,
            Command::IsOpened => 2,
            Command::GetProp => 3,
            Command::SetProp => 4,
            Command::ReadFrame => 5,
            Command::Release => 6,
        }
    }

    pub fn from_id(id: u8) -> Option<Command> {
        match id {
            0 => Some(Command::Ping),
            1 => Some(Command::Open),
            2 => Some(Command::IsOpened),
            3 => Some(Command::GetProp),
            4 => Some(Command::SetProp),
            5 => Some(Command::ReadFrame),
            6 => Some(Command::Release),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Request {
    Ping,
    Open,
    IsOpened,
    Get { property: PropertyId },
    Set { property: PropertyId, value: f64 },
    ReadFrame,
    Release,
}

impl Request {
    pub fn command(&self) -> Command {
        match self {
            Request::Ping => Command::Ping,
            Request::Open => Command::Open,
            Request::IsOpened => Command::IsOpened,
            Request::Get { .. } => Command::GetProp,
            Request::Set { .. } => Command::SetProp,
            Request::ReadFrame => Command::ReadFrame,
            Request::Release => Command::Release,
        }
    }

    pub fn to_message(&self) -> Result<Message> {
        let body = match self {
            Request::Get { property } => rmp_serde::to_vec(property)?,
            Request::Set { property, value } => rmp_serde::to_vec(&(property, value))?,
            _ => Vec::new(),
        };
        Ok(Message::new(self.command(), body))
    }

    pub fn from_message(message: &Message) -> Result<Request> {
        let body = message.body();
        let request = match message.command() {
            Command::GetProp => Request::Get { property: decode_body(body)? },
            Command::SetProp => {
                let (property, value) = decode_body(body)?;
                Request::Set { property, value }
            }
            Command::Ping => empty(body, Request::Ping)?,
            Command::Open => empty(body, Request::Open)?,
            Command::IsOpened => empty(body, Request::IsOpened)?,
            Command::ReadFrame => empty(body, Request::ReadFrame)?,
            Command::Release => empty(body, Request::Release)?,
        };
        Ok(request)
    }
}

/// One captured frame as carried on the wire. `ok == false` means the device
/// had nothing to give (stream ended, capture failed), and `data` is empty.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FramePayload {
    pub ok: bool,
    pub width: u32,
    pub height: u32,
    pub format: FourCC,
    pub data: Vec<u8>,
}

impl FramePayload {
    pub fn empty() -> FramePayload {
        FramePayload::default()
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    None,
    Boolean(bool),
    Numeric(f64),
    Frame(FramePayload),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Response {
    pub ok: bool,
    pub payload: Payload,
}

// Frame bodies borrow on the way out so large buffers are not copied before
// being written to the socket.
#[derive(Serialize)]
struct FrameBodyRef<'a> {
    ok: bool,
    width: u32,
    height: u32,
    format: FourCC,
    size: u64,
    #[serde(with = "serde_bytes")]
    data: &'a [u8],
}

#[derive(Deserialize)]
struct FrameBody {
    ok: bool,
    width: u32,
    height: u32,
    format: FourCC,
    size: u64,
    #[serde(with = "serde_bytes")]
    data: Vec<u8>,
}

impl Response {
    /// Plain success flag, the shape of ping, open, set and release.
    pub fn ack(ok: bool) -> Response {
        Response { ok, payload: Payload::None }
    }

    pub fn opened(opened: bool) -> Response {
        Response { ok: opened, payload: Payload::Boolean(opened) }
    }

    pub fn value(ok: bool, value: f64) -> Response {
        Response { ok, payload: Payload::Numeric(value) }
    }

    pub fn frame(frame: FramePayload) -> Response {
        Response { ok: frame.ok, payload: Payload::Frame(frame) }
    }

    /// The failure shape for a given command.
    pub fn failure(command: Command) -> Response {
        match command {
            Command::IsOpened => Response::opened(false),
            Command::GetProp => Response::value(false, 0.0),
            Command::ReadFrame => Response::frame(FramePayload::empty()),
            Command::Ping | Command::Open | Command::SetProp | Command::Release => Response::ack(false),
        }
    }

    pub fn to_message(&self, command: Command) -> Result<Message> {
        let body = match (command, &self.payload) {
            (Command::Ping | Command::Open | Command::SetProp | Command::Release, Payload::None) => {
                rmp_serde::to_vec(&self.ok)?
            }
            (Command::IsOpened, Payload::Boolean(opened)) => rmp_serde::to_vec(opened)?,
            (Command::GetProp, Payload::Numeric(value)) => rmp_serde::to_vec(&(self.ok, value))?,
            (Command::ReadFrame, Payload::Frame(frame)) => {
                let body = FrameBodyRef {
                    ok: frame.ok,
                    width: frame.width,
                    height: frame.height,
                    format: frame.format,
                    size: frame.data.len() as u64,
                    data: &frame.data,
                };
                rmp_serde::to_vec_named(&body)?
            }
            _ => return Err(Error::PayloadMismatch(command)),
        };
        Ok(Message::new(command, body))
    }

    /// Decodes the response to a request of kind `expected`.
    pub fn from_message(expected: Command, message: &Message) -> Result<Response> {
        if message.command() != expected {
            return Err(Error::CommandMismatch { expected, actual: message.command() });
        }
        let body = message.body();
        let response = match expected {
            Command::Ping | Command::Open | Command::SetProp | Command::Release => {
                Response::ack(decode_body(body)?)
            }
            Command::IsOpened => Response::opened(decode_body(body)?),
            Command::GetProp => {
                let (ok, value) = decode_body(body)?;
                Response::value(ok, value)
            }
            Command::ReadFrame => {
                let frame: FrameBody = decode_body(body)?;
                if frame.size != frame.data.len() as u64 {
                    return Err(Error::FrameSize { declared: frame.size, actual: frame.data.len() });
                }
                Response::frame(FramePayload {
                    ok: frame.ok,
                    width: frame.width,
                    height: frame.height,
                    format: frame.format,
                    data: frame.data,
                })
            }
        };
        Ok(response)
    }
}

fn empty(body: &[u8], request: Request) -> Result<Request> {
    if !body.is_empty() {
        return Err(Error::TrailingBytes(body.len()));
    }
    Ok(request)
}

/// Decodes a complete body. Bytes left over after the value are an error, so a
/// body is either consumed exactly or rejected.
fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let mut cursor = Cursor::new(body);
    let value = {
        let mut deserializer = rmp_serde::Deserializer::new(&mut cursor);
        T::deserialize(&mut deserializer)?
    };
    let consumed = cursor.position() as usize;
    if consumed != body.len() {
        return Err(Error::TrailingBytes(body.len() - consumed));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_ids_are_stable() {
        for id in 0..=6 {
            let command = Command::from_id(id).unwrap();
            assert_eq!(command.id(), id);
        }
        assert_eq!(Command::from_id(7), None);
        assert_eq!(Command::from_id(0xff), None);
    }

    #[test]
    fn set_request_carries_property_and_value() {
        let request = Request::Set { property: PropertyId::FRAME_WIDTH, value: 1280.0 };
        let message = request.to_message().unwrap();
        assert_eq!(message.command(), Command::SetProp);
        assert_eq!(Request::from_message(&message).unwrap(), request);
    }

    #[test]
    fn argumentless_requests_have_empty_bodies() {
        for request in [Request::Ping, Request::Open, Request::IsOpened, Request::ReadFrame, Request::Release] {
            let message = request.to_message().unwrap();
            assert!(message.body().is_empty());
        }
    }

    #[test]
    fn argumentless_request_with_body_is_rejected() {
        let message = Message::new(Command::Ping, vec![0xc3]);
        assert!(matches!(Request::from_message(&message), Err(Error::TrailingBytes(1))));
    }

    #[test]
    fn get_request_with_garbage_body_is_rejected() {
        let message = Message::new(Command::GetProp, vec![0xc1]);
        assert!(matches!(Request::from_message(&message), Err(Error::Decode(_))));

        let message = Message::new(Command::GetProp, Vec::new());
        assert!(matches!(Request::from_message(&message), Err(Error::Decode(_))));
    }

    #[test]
    fn frame_response_keeps_metadata() {
        let frame = FramePayload {
            ok: true,
            width: 4,
            height: 2,
            format: FourCC::YUYV,
            data: (0u8..16).collect(),
        };
        let message = Response::frame(frame.clone()).to_message(Command::ReadFrame).unwrap();
        let response = Response::from_message(Command::ReadFrame, &message).unwrap();
        assert!(response.ok);
        assert_eq!(response.payload, Payload::Frame(frame));
    }

    #[test]
    fn frame_size_must_match_data() {
        let body = FrameBodyRef {
            ok: true,
            width: 1,
            height: 1,
            format: FourCC::MJPG,
            size: 10,
            data: &[1, 2, 3],
        };
        let message = Message::new(Command::ReadFrame, rmp_serde::to_vec_named(&body).unwrap());
        assert!(matches!(
            Response::from_message(Command::ReadFrame, &message),
            Err(Error::FrameSize { declared: 10, actual: 3 })
        ));
    }

    #[test]
    fn truncated_frame_body_is_rejected() {
        let frame = FramePayload { ok: true, data: vec![7; 64], ..FramePayload::default() };
        let message = Response::frame(frame).to_message(Command::ReadFrame).unwrap();
        let short = Message::new(Command::ReadFrame, message.body()[..message.body().len() - 8].to_vec());
        assert!(matches!(Response::from_message(Command::ReadFrame, &short), Err(Error::Decode(_))));
    }

    #[test]
    fn response_must_echo_the_request() {
        let message = Response::ack(true).to_message(Command::Ping).unwrap();
        assert!(matches!(
            Response::from_message(Command::Open, &message),
            Err(Error::CommandMismatch { expected: Command::Open, actual: Command::Ping })
        ));
    }

    #[test]
    fn payload_kind_must_fit_the_command() {
        assert!(matches!(
            Response::value(true, 1.0).to_message(Command::Ping),
            Err(Error::PayloadMismatch(Command::Ping))
        ));
        // a get response is a (bool, f64) pair, a bare bool is not enough
        let message = Response::ack(true).to_message(Command::Ping).unwrap();
        let message = Message::new(Command::GetProp, message.body().to_vec());
        assert!(Response::from_message(Command::GetProp, &message).is_err());
    }

    #[test]
    fn failure_shapes() {
        assert_eq!(Response::failure(Command::GetProp), Response::value(false, 0.0));
        assert!(!Response::failure(Command::ReadFrame).ok);
        for id in 0..=6 {
            let command = Command::from_id(id).unwrap();
            assert!(Response::failure(command).to_message(command).is_ok());
        }
    }
}
