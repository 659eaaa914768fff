//! I2C bus-scan reply parser.
//!
//! The `p` command answers with a header line followed by one row per
//! address block:
//!
//! ```text
//!     0  1  2  3 ...
//! 10 00 01 00 ...
//! 20 00 00 00 ...
//! ```
//!
//! The first token of a row is the block base; the remaining cells are flags.

use log::trace;

use crate::protocol::I2cScanPolicy;
use crate::protocol::hex;

/// Position of the parser within the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Next line is the column header.
    AwaitingHeader,
    /// Next line is an address row.
    ReadingBody,
    /// The stream ended.
    Done,
}

/// Incremental scan parser, fed one reply line at a time.
#[derive(Debug, Clone)]
pub struct I2cScan {
    state: ScanState,
    policy: I2cScanPolicy,
    found: Vec<u8>,
}

impl I2cScan {
    /// Start parsing a fresh reply.
    pub fn new(policy: I2cScanPolicy) -> Self {
        Self {
            state: ScanState::AwaitingHeader,
            policy,
            found: Vec::new(),
        }
    }

    /// Current parser state.
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Feed one line as read from the port. An empty line means the stream
    /// produced nothing more.
    pub fn feed(&mut self, line: &[u8]) {
        if line.is_empty() {
            self.state = ScanState::Done;
            return;
        }
        match self.state {
            ScanState::AwaitingHeader => {
                trace!("I2C scan header: {:?}", String::from_utf8_lossy(line));
                self.state = ScanState::ReadingBody;
            },
            ScanState::ReadingBody => self.parse_row(line),
            ScanState::Done => {},
        }
    }

    fn parse_row(&mut self, line: &[u8]) {
        let tokens = hex::decode_line(line);
        let Some((&base, cells)) = tokens.split_first() else {
            return;
        };
        for (column, &cell) in cells.iter().enumerate() {
            if cell == 0 {
                continue;
            }
            match self.policy {
                I2cScanPolicy::LiteralValue => self.found.push(cell),
                I2cScanPolicy::BaseOffset => {
                    match u8::try_from(column)
                        .ok()
                        .and_then(|c| base.checked_add(c))
                    {
                        Some(address) => self.found.push(address),
                        None => trace!("I2C scan cell past 0xFF: base {base:#04x} + {column}"),
                    }
                },
            }
        }
    }

    /// Addresses found so far, in reply order.
    pub fn addresses(&self) -> &[u8] {
        &self.found
    }

    /// Consume the parser.
    pub fn into_addresses(self) -> Vec<u8> {
        self.found
    }
}
