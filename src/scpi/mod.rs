pub mod com_cmd;
pub mod config;
pub mod scpi_error;
pub mod session;

pub use self::config::{load_config, SessionConfig};
pub use self::scpi_error::{ErrorClass, ErrorEntry, ScpiError};
pub use self::session::Session;

use std::fmt;

/// A SCPI program message under construction, e.g. `:VOLTage 1.5` or `*ESE?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command(String);

impl Command {
    pub fn new<S: ToString>(s: S) -> Self {
        Self(s.to_string())
    }
    pub fn query(&mut self) -> &mut Self {
        self.0.push('?');
        self
    }
    /// Appends a parameter; the first is separated by a space, later ones by commas.
    pub fn para<P: AsRef<str>>(&mut self, para: P) -> &mut Self {
        if self.0.contains(' ') {
            self.0.push(',');
        } else {
            self.0.push(' ');
        }
        self.0.push_str(para.as_ref());
        self
    }
    pub fn into_inner(self) -> String {
        self.0
    }
}
impl AsRef<str> for Command {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}
impl AsRef<[u8]> for Command {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
impl From<&str> for Command {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
impl From<String> for Command {
    fn from(s: String) -> Self {
        Self(s)
    }
}

pub trait ToCommand {
    fn to_command(&self) -> Command;
}
impl<T> ToCommand for T
where
    T: fmt::Display,
{
    fn to_command(&self) -> Command {
        Command(self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_query_and_parameters() {
        let mut c = Command::new(":SOURce:VOLTage");
        c.para("1.5");
        assert_eq!(c.to_string(), ":SOURce:VOLTage 1.5");

        let mut c = Command::new(":MEASure:VOLTage:DC");
        c.query().para("10").para("0.001");
        assert_eq!(AsRef::<str>::as_ref(&c), ":MEASure:VOLTage:DC? 10,0.001");
    }

    #[test]
    fn common_command_to_command() {
        let mut c = com_cmd::ESE.to_command();
        c.query();
        assert_eq!(c.into_inner(), "*ESE?");
    }
}
