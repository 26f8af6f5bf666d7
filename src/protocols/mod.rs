pub mod line;
pub mod tcp;

pub use self::line::LineStream;
pub use self::tcp::Tcp;

use std::time::Duration;

pub trait Protocol {
    type Address;
    type Error;
    type IO: std::io::Read + std::io::Write;
    fn connect(self, address: Self::Address, time_out: Duration) -> Result<Self::IO, Self::Error>;
}
