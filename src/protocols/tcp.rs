use super::Protocol;
use std::{
    io::{Error, ErrorKind},
    net::{TcpStream, ToSocketAddrs},
    time::Duration,
};

#[derive(Clone, Copy, Debug, Default)]
pub struct Tcp;

impl Protocol for Tcp {
    type IO = TcpStream;
    type Address = (String, u16);
    type Error = Error;

    /// Tries every resolved address in turn; the same timeout also bounds
    /// every later read and write on the stream.
    fn connect(
        self,
        address: Self::Address,
        time_out: Duration,
    ) -> Result<Self::IO, Self::Error> {
        let mut last_err = None;
        for addr in address.to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, time_out) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(time_out))?;
                    stream.set_write_timeout(Some(time_out))?;
                    stream.set_nodelay(true)?;
                    return Ok(stream);
                }
                Err(e) => {
                    log::debug!("connecting to {} failed: {}", addr, e);
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| {
            Error::new(
                ErrorKind::InvalidInput,
                format!("could not resolve {}:{}", address.0, address.1),
            )
        }))
    }
}
