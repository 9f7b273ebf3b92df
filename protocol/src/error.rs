use crate::command::Command;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("unknown command id {0:#04x}")]
    UnknownCommand(u8),
    #[error("message truncated (expected {expected} bytes, got {actual})")]
    Truncated { expected: usize, actual: usize },
    #[error("{0} unexpected trailing bytes")]
    TrailingBytes(usize),
    #[error("message body of {0} bytes exceeds the protocol limit")]
    TooLarge(usize),
    #[error("response to {actual:?} received while waiting for {expected:?}")]
    CommandMismatch { expected: Command, actual: Command },
    #[error("payload does not fit a {0:?} response")]
    PayloadMismatch(Command),
    #[error("frame declares {declared} bytes but carries {actual}")]
    FrameSize { declared: u64, actual: usize },

    #[error(transparent)]
    Encode(#[from] rmp_serde::encode::Error),
    #[error(transparent)]
    Decode(#[from] rmp_serde::decode::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
