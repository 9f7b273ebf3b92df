#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("server worker panicked")]
    WorkerPanicked,

    #[error(transparent)]
    Protocol(#[from] netcam_protocol::Error),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
