use thiserror::Error;

use crate::scpi::scpi_error::ScpiError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to connect to {address}: {source}")]
    Connection {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("session is already connected to {0}")]
    AlreadyConnected(String),
    #[error("session is not connected")]
    NotConnected,
    #[error("invalid command: {0}")]
    InvalidCommand(String),
    #[error("transfer layer error: {0}")]
    Transport(#[from] std::io::Error),
    #[error("response is not valid text: {0}")]
    Decode(#[from] std::string::FromUtf8Error),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("scpi error: {0}")]
    Scpi(#[from] ScpiError),
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl Error {
    pub fn is_timeout(&self) -> bool {
        let e = match self {
            Error::Transport(e) => e,
            Error::Connection { source, .. } => source,
            _ => return false,
        };
        // Read timeouts surface as WouldBlock on unix sockets.
        matches!(
            e.kind(),
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
        )
    }

    /// Instrument-reported errors, if this is a failed error-check round.
    pub fn scpi(&self) -> Option<&ScpiError> {
        match self {
            Error::Scpi(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
