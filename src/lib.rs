//! Blocking SCPI client over a raw TCP socket.
//!
//! A [`Session`] writes line-terminated ASCII commands to one instrument and
//! follows every command with a drain of the instrument's error queue
//! (`:SYSTem:ERRor?` by default), so instrument-side faults come back as
//! [`Error::Scpi`].
//!
//! A session is not meant to be shared between threads without external
//! serialization; wrap it in a mutex or give it to one worker thread.

pub mod error;
pub mod protocols;
pub mod scpi;

pub use error::{Error, Result};
pub use scpi::{
    load_config, Command, ErrorClass, ErrorEntry, ScpiError, Session, SessionConfig, ToCommand,
};
