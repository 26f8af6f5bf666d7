//! IEEE 488.2 common commands understood by every SCPI instrument.

use std::fmt;

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComCmd {
    ///Clear status
    CLS,
    ///Event status enable
    ESE,
    ///Event status register
    ESR,
    ///Identification
    IDN,
    ///Operation complete
    OPC,
    ///Reset
    RST,
    ///Service request enable
    SRE,
    ///Read status byte
    STB,
    ///Self-test
    TST,
    ///Wait to complete
    WAI,
}

pub use ComCmd::*;

impl ComCmd {
    pub fn mnemonic(self) -> &'static str {
        match self {
            CLS => "*CLS",
            ESE => "*ESE",
            ESR => "*ESR",
            IDN => "*IDN",
            OPC => "*OPC",
            RST => "*RST",
            SRE => "*SRE",
            STB => "*STB",
            TST => "*TST",
            WAI => "*WAI",
        }
    }
}

impl fmt::Display for ComCmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
