use std::{
    fmt,
    net::{Shutdown, SocketAddr, TcpStream},
};

use log::{debug, info, warn};

use super::{com_cmd, config::SessionConfig, scpi_error::ScpiError, ToCommand};
use crate::{
    error::{Error, Result},
    protocols::{LineStream, Protocol, Tcp},
};

/// One SCPI instrument reached over a raw TCP socket.
///
/// Every [`send`](Session::send) and [`query`](Session::query) is followed by
/// draining the instrument's error queue; anything found there is returned as
/// [`Error::Scpi`]. The session is closed on drop.
///
/// ```no_run
/// use scpi_tcp::{Session, SessionConfig};
///
/// let mut session = Session::new(SessionConfig::new("192.168.1.20"));
/// let idn = session.scoped(|s| s.query("*IDN?"))?;
/// println!("{}", idn);
/// # Ok::<(), scpi_tcp::Error>(())
/// ```
pub struct Session {
    config: SessionConfig,
    link: Option<LineStream<TcpStream>>,
}

impl Session {
    /// No I/O happens until [`connect`](Session::connect).
    pub fn new(config: SessionConfig) -> Self {
        Self { config, link: None }
    }

    pub fn with_host<S: Into<String>>(host: S) -> Self {
        Self::new(SessionConfig::new(host))
    }

    /// Creates a session and connects it.
    pub fn open(config: SessionConfig) -> Result<Self> {
        let mut session = Self::new(config);
        session.connect()?;
        Ok(session)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.link.as_ref().and_then(|l| l.get_ref().peer_addr().ok())
    }

    fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    pub fn connect(&mut self) -> Result<()> {
        if self.link.is_some() {
            return Err(Error::AlreadyConnected(self.address()));
        }
        self.config.validate()?;
        let stream = Tcp
            .connect(
                (self.config.host.clone(), self.config.port),
                self.config.timeout(),
            )
            .map_err(|source| Error::Connection {
                address: self.address(),
                source,
            })?;
        info!("connected to {}", self.address());
        self.link = Some(LineStream::new(stream, self.config.terminator.as_bytes()));
        Ok(())
    }

    /// Writes a command, then checks the error queue.
    ///
    /// An [`Error::Scpi`] here means the command did reach the instrument.
    pub fn send<C: AsRef<str>>(&mut self, command: C) -> Result<()> {
        let link = self.link.as_mut().ok_or(Error::NotConnected)?;
        let command = checked(command.as_ref())?;
        debug!("sending {:?}", command);
        link.write_line(command.as_bytes())?;
        self.check_errors()
    }

    /// Writes a query, reads one reply line, then checks the error queue.
    ///
    /// When the error check fails the reply is kept in the error, see
    /// [`ScpiError::response`].
    pub fn query<C: AsRef<str>>(&mut self, command: C) -> Result<String> {
        let link = self.link.as_mut().ok_or(Error::NotConnected)?;
        let command = checked(command.as_ref())?;
        debug!("sending {:?}", command);
        link.write_line(command.as_bytes())?;
        let response = read_text(link)?;
        debug!("received {:?}", response);
        match self.check_errors() {
            Ok(()) => Ok(response),
            Err(Error::Scpi(e)) => Err(Error::Scpi(e.with_response(response))),
            Err(e) => Err(e),
        }
    }

    pub fn identify(&mut self) -> Result<String> {
        let mut idn = com_cmd::IDN.to_command();
        self.query(idn.query())
    }

    pub fn reset(&mut self) -> Result<()> {
        self.send(com_cmd::RST.to_command())
    }

    pub fn clear_status(&mut self) -> Result<()> {
        self.send(com_cmd::CLS.to_command())
    }

    /// Drains the error queue one entry per query until the no-error reply.
    fn check_errors(&mut self) -> Result<()> {
        let link = self.link.as_mut().ok_or(Error::NotConnected)?;
        let config = &self.config;
        let mut messages = Vec::new();
        for _ in 0..config.max_error_reads {
            link.write_line(config.error_query.as_bytes())?;
            let reply = read_text(link)?;
            let reply = reply.trim();
            if reply == config.no_error {
                return if messages.is_empty() {
                    Ok(())
                } else {
                    Err(ScpiError::new(messages).into())
                };
            }
            warn!("instrument at {}:{} reported {:?}", config.host, config.port, reply);
            messages.push(reply.to_string());
        }
        Err(Error::Protocol(format!(
            "no {:?} reply after {} reads of {:?}",
            config.no_error, config.max_error_reads, config.error_query
        )))
    }

    /// Releases the connection. Does nothing when not connected.
    pub fn close(&mut self) {
        if let Some(link) = self.link.take() {
            if let Err(e) = link.into_inner().shutdown(Shutdown::Both) {
                debug!("shutdown of {} failed: {}", self.address(), e);
            }
            info!("closed connection to {}", self.address());
        }
    }

    /// Connects, runs `f`, and closes again on every exit path.
    pub fn scoped<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        self.connect()?;
        let result = f(self);
        self.close();
        result
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Session(host={:?}, port={}, timeout={}, terminator={:?})",
            self.config.host, self.config.port, self.config.timeout_secs, self.config.terminator
        )
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("connected", &self.is_connected())
            .finish()
    }
}

fn checked(command: &str) -> Result<&str> {
    if command.trim().is_empty() {
        Err(Error::InvalidCommand("empty command".to_string()))
    } else {
        Ok(command)
    }
}

fn read_text(link: &mut LineStream<TcpStream>) -> Result<String> {
    let line = link.read_line()?;
    let text = String::from_utf8(line.to_vec())?;
    Ok(text.trim_end_matches(&['\r', '\n'][..]).to_string())
}
