use netcam_protocol::{Command, PropertyId};

use std::io;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("could not connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: io::Error,
    },
    #[error("device did not answer in time")]
    Timeout,
    #[error("connection closed by the device")]
    ConnectionReset,
    #[error("device rejected {0}")]
    UnsupportedProperty(PropertyId),
    #[error("device answered {0:?} with an unexpected payload")]
    UnexpectedResponse(Command),
    #[error("device had no frame to give")]
    NoFrame,
    #[error("call aborted")]
    Aborted,

    #[error("protocol error: {0}")]
    Protocol(#[source] netcam_protocol::Error),

    #[error(transparent)]
    IO(io::Error),
}

impl Error {
    /// Sorts socket errors into the taxonomy callers care about.
    pub fn from_io(e: io::Error) -> Error {
        match e.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Error::Timeout,
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::NotConnected => Error::ConnectionReset,
            _ => Error::IO(e),
        }
    }

    /// Failures that mean the peer went away, as opposed to the peer being slow
    /// or speaking nonsense. Only these earn a reconnect.
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, Error::ConnectionReset | Error::IO(_))
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Error {
        Error::from_io(e)
    }
}

impl From<netcam_protocol::Error> for Error {
    fn from(e: netcam_protocol::Error) -> Error {
        match e {
            netcam_protocol::Error::Io(e) => Error::from_io(e),
            e => Error::Protocol(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
