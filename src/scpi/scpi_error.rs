use std::fmt;

use thiserror::Error;

/// Everything one error-check round drained from the instrument's error queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScpiError {
    messages: Vec<String>,
    response: Option<String>,
}

impl ScpiError {
    pub fn new(messages: Vec<String>) -> Self {
        Self {
            messages,
            response: None,
        }
    }

    pub(crate) fn with_response(mut self, response: String) -> Self {
        self.response = Some(response);
        self
    }

    /// Raw error lines, oldest first.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// The reply of the query that preceded the failing error check.
    ///
    /// Always `None` for errors raised by `send`.
    pub fn response(&self) -> Option<&str> {
        self.response.as_deref()
    }

    pub fn into_response(self) -> Option<String> {
        self.response
    }

    pub fn entries(&self) -> impl Iterator<Item = ErrorEntry<'_>> {
        self.messages.iter().map(|m| ErrorEntry::parse(m))
    }
}

impl fmt::Display for ScpiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instrument reported {} error(s): ", self.messages.len())?;
        for (i, m) in self.messages.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            f.write_str(m)?;
        }
        Ok(())
    }
}

impl std::error::Error for ScpiError {}

/// An error-queue line split into `<code>,"<description>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorEntry<'a> {
    pub code: Option<i32>,
    pub message: &'a str,
}

impl<'a> ErrorEntry<'a> {
    /// Lines that do not start with a number keep their full text as message.
    pub fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if let Some((code, rest)) = line.split_once(',') {
            if let Ok(code) = code.trim().parse() {
                return Self {
                    code: Some(code),
                    message: rest.trim().trim_matches('"'),
                };
            }
        }
        Self {
            code: None,
            message: line,
        }
    }

    pub fn class(&self) -> ErrorClass {
        self.code.map(ErrorClass::of).unwrap_or(ErrorClass::Other)
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    #[error("command error")]
    CommandError,
    #[error("execution error")]
    ExecutionError,
    #[error("device-dependent error")]
    DevDependError,
    #[error("query error")]
    QueryError,
    #[error("other error")]
    Other,
}

impl ErrorClass {
    pub fn of(code: i32) -> Self {
        use ErrorClass::*;
        match code {
            -199..=-100 => CommandError,
            -299..=-200 => ExecutionError,
            -399..=-300 => DevDependError,
            c if c > 0 => DevDependError,
            -499..=-400 => QueryError,
            _ => Other,
        }
    }
}
