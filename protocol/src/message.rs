use std::io::{Read, Write};

use crate::command::Command;
use crate::error::{Error, Result};

/// Command id byte plus the big-endian body length.
pub const HEADER_LEN: usize = 5;

/// Upper bound on a single body. Anything declaring more than this is treated
/// as a corrupted stream rather than allocated.
pub const MAX_BODY_LEN: usize = 64 * 1024 * 1024;

/// One framed unit on the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    command: Command,
    body: Vec<u8>,
}

impl Message {
    pub fn new(command: Command, body: Vec<u8>) -> Message {
        Message { command, body }
    }

    pub fn command(&self) -> Command {
        self.command
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    fn header(&self) -> Result<[u8; HEADER_LEN]> {
        if self.body.len() > MAX_BODY_LEN {
            return Err(Error::TooLarge(self.body.len()));
        }
        let len = u32::try_from(self.body.len()).map_err(|_| Error::TooLarge(self.body.len()))?;
        let mut header = [0u8; HEADER_LEN];
        header[0] = self.command.id();
        header[1..].copy_from_slice(&len.to_be_bytes());
        Ok(header)
    }

    fn parse_header(header: &[u8; HEADER_LEN]) -> Result<(Command, usize)> {
        let command = Command::from_id(header[0]).ok_or(Error::UnknownCommand(header[0]))?;
        let len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]) as usize;
        if len > MAX_BODY_LEN {
            return Err(Error::TooLarge(len));
        }
        Ok((command, len))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.body.len());
        out.extend(self.header()?);
        out.extend_from_slice(&self.body);
        Ok(out)
    }

    /// Parses exactly one message. Missing and extra bytes are both errors.
    pub fn from_bytes(bytes: &[u8]) -> Result<Message> {
        let header: &[u8; HEADER_LEN] = bytes
            .get(..HEADER_LEN)
            .and_then(|h| h.try_into().ok())
            .ok_or(Error::Truncated { expected: HEADER_LEN, actual: bytes.len() })?;
        let (command, len) = Message::parse_header(header)?;
        let body = &bytes[HEADER_LEN..];
        if body.len() < len {
            return Err(Error::Truncated { expected: HEADER_LEN + len, actual: bytes.len() });
        }
        if body.len() > len {
            return Err(Error::TrailingBytes(body.len() - len));
        }
        Ok(Message::new(command, body.to_vec()))
    }

    /// Reads one message from a stream, accumulating partial reads until the
    /// declared body length is satisfied.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Message> {
        let mut header = [0u8; HEADER_LEN];
        reader.read_exact(&mut header)?;
        let (command, len) = Message::parse_header(&header)?;
        let mut body = vec![0u8; len];
        reader.read_exact(&mut body)?;
        Ok(Message::new(command, body))
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.header()?)?;
        writer.write_all(&self.body)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Request, Response};
    use crate::property::PropertyId;

    use std::io::{self, Cursor};

    /// Hands out at most `chunk` bytes per read, like a slow socket.
    struct Trickle<'a> {
        data: &'a [u8],
        chunk: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.chunk.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn header_layout() {
        let message = Message::new(Command::SetProp, vec![1, 2, 3]);
        assert_eq!(message.to_bytes().unwrap(), vec![4, 0, 0, 0, 3, 1, 2, 3]);
    }

    #[test]
    fn read_accumulates_partial_reads() {
        let request = Request::Get { property: PropertyId::FPS };
        let bytes = request.to_message().unwrap().to_bytes().unwrap();
        let mut reader = Trickle { data: &bytes, chunk: 1 };
        let message = Message::read_from(&mut reader).unwrap();
        assert_eq!(Request::from_message(&message).unwrap(), request);
    }

    #[test]
    fn consecutive_messages_on_one_stream() {
        let mut wire = Vec::new();
        Response::ack(true).to_message(Command::Ping).unwrap().write_to(&mut wire).unwrap();
        Response::value(true, 30.0).to_message(Command::GetProp).unwrap().write_to(&mut wire).unwrap();

        let mut cursor = Cursor::new(wire);
        let first = Message::read_from(&mut cursor).unwrap();
        let second = Message::read_from(&mut cursor).unwrap();
        assert_eq!(Response::from_message(Command::Ping, &first).unwrap(), Response::ack(true));
        assert_eq!(Response::from_message(Command::GetProp, &second).unwrap(), Response::value(true, 30.0));
    }

    #[test]
    fn truncated_input_is_rejected() {
        let bytes = Request::Set { property: PropertyId::FPS, value: 60.0 }
            .to_message()
            .unwrap()
            .to_bytes()
            .unwrap();

        for cut in 0..bytes.len() {
            assert!(
                matches!(Message::from_bytes(&bytes[..cut]), Err(Error::Truncated { .. })),
                "accepted {} of {} bytes",
                cut,
                bytes.len()
            );
        }
        assert!(matches!(
            Message::read_from(&mut Cursor::new(&bytes[..bytes.len() - 1])),
            Err(Error::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof
        ));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut bytes = Message::new(Command::Ping, Vec::new()).to_bytes().unwrap();
        bytes.push(0);
        assert!(matches!(Message::from_bytes(&bytes), Err(Error::TrailingBytes(1))));
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert!(matches!(Message::from_bytes(&[0x42, 0, 0, 0, 0]), Err(Error::UnknownCommand(0x42))));
    }

    #[test]
    fn oversized_length_is_rejected_before_reading_the_body() {
        let header = [Command::ReadFrame.id(), 0xff, 0xff, 0xff, 0xff];
        assert!(matches!(
            Message::read_from(&mut Cursor::new(header)),
            Err(Error::TooLarge(len)) if len == u32::MAX as usize
        ));
    }
}
