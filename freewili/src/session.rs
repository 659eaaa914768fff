//! Session lifecycle around every device operation.
//!
//! A [`Session`] is acquired at the start of each public operation on a
//! [`FreeWili`](crate::FreeWili) handle. It opens the transport when needed,
//! performs the one-time menu initialization, and on drop closes the
//! transport again unless the handle is in stay-open mode.

use std::thread;
use std::time::{Duration, Instant};

use log::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::port::{self, Port};
use crate::protocol::{Command, ProtocolOptions};

/// Poll interval while waiting for the first byte of a reply.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Per-handle channel bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelState {
    initialized: bool,
    menu_enabled: bool,
    stay_open: bool,
}

impl ChannelState {
    /// Whether the menu mode has been set since the transport was opened.
    pub fn initialized(&self) -> bool {
        self.initialized
    }

    /// Menu mode of the live session.
    pub fn menu_enabled(&self) -> bool {
        self.menu_enabled
    }

    /// Whether the transport outlives individual operations.
    pub fn stay_open(&self) -> bool {
        self.stay_open
    }

    pub(crate) fn set_stay_open(&mut self, stay_open: bool) {
        self.stay_open = stay_open;
    }

    pub(crate) fn reset(&mut self) {
        self.initialized = false;
        self.menu_enabled = false;
    }
}

/// Scoped access to an open, initialized transport.
pub(crate) struct Session<'a, P: Port> {
    port: &'a mut P,
    state: &'a mut ChannelState,
    options: &'a ProtocolOptions,
}

impl<'a, P: Port> Session<'a, P> {
    /// Open the transport if needed and bring the menu into the requested
    /// mode.
    pub(crate) fn begin(
        port: &'a mut P,
        state: &'a mut ChannelState,
        options: &'a ProtocolOptions,
        menu_enabled: bool,
    ) -> Result<Self> {
        Self::start(port, state, options, menu_enabled, false)
    }

    /// Like [`begin`](Self::begin), but clears the buffers and resends the
    /// menu frame even when the live session is already in that mode.
    pub(crate) fn begin_fresh(
        port: &'a mut P,
        state: &'a mut ChannelState,
        options: &'a ProtocolOptions,
        menu_enabled: bool,
    ) -> Result<Self> {
        Self::start(port, state, options, menu_enabled, true)
    }

    fn start(
        port: &'a mut P,
        state: &'a mut ChannelState,
        options: &'a ProtocolOptions,
        menu_enabled: bool,
        force_menu: bool,
    ) -> Result<Self> {
        if !port.is_open() {
            debug!("Opening {}", port.name());
            state.reset();
            port.open()?;
        }

        let mut session = Self {
            port,
            state,
            options,
        };

        if force_menu
            || !session.state.initialized
            || session.state.menu_enabled != menu_enabled
        {
            session.set_menu(menu_enabled)?;
        }
        Ok(session)
    }

    fn set_menu(&mut self, enabled: bool) -> Result<()> {
        debug!(
            "{} menu on {}",
            if enabled { "Enabling" } else { "Disabling" },
            self.port.name()
        );
        self.port.clear_buffers()?;
        self.send(&Command::Menu { enabled })?;
        self.state.initialized = true;
        self.state.menu_enabled = enabled;
        Ok(())
    }

    pub(crate) fn options(&self) -> &ProtocolOptions {
        self.options
    }

    pub(crate) fn port(&mut self) -> &mut P {
        self.port
    }

    /// Encode and write one command frame.
    pub(crate) fn send(&mut self, command: &Command<'_>) -> Result<()> {
        let frame = command.encode(self.options.line_ending);
        trace!("TX {:?}", String::from_utf8_lossy(&frame));
        let written = std::io::Write::write(&mut *self.port, &frame)?;
        if written < frame.len() {
            return Err(Error::ShortWrite {
                written,
                expected: frame.len(),
            });
        }
        std::io::Write::flush(&mut *self.port)?;
        Ok(())
    }

    /// One reply line, terminator included. Empty once the stream is quiet.
    pub(crate) fn read_line(&mut self) -> Result<Vec<u8>> {
        let line = port::read_line(self.port)?;
        trace!("RX {:?}", String::from_utf8_lossy(&line));
        Ok(line)
    }

    pub(crate) fn read_up_to(&mut self, len: usize) -> Result<Vec<u8>> {
        port::read_up_to(self.port, len)
    }

    pub(crate) fn read_to_quiet(&mut self) -> Result<Vec<u8>> {
        port::read_to_quiet(self.port)
    }

    pub(crate) fn drain(&mut self) -> Result<Vec<u8>> {
        port::drain_available(self.port)
    }

    /// Block until at least one byte is buffered or `timeout` elapses.
    pub(crate) fn wait_for_data(&mut self, timeout: Duration) -> Result<()> {
        let start = Instant::now();
        while self.port.bytes_to_read()? == 0 {
            if start.elapsed() >= timeout {
                return Err(Error::Timeout(format!(
                    "no data from {} within {timeout:?}",
                    self.port.name()
                )));
            }
            thread::sleep(POLL_INTERVAL);
        }
        Ok(())
    }
}

impl<P: Port> Drop for Session<'_, P> {
    fn drop(&mut self) {
        if self.state.stay_open {
            return;
        }
        self.state.reset();
        if let Err(e) = self.port.close() {
            warn!("Failed to close {}: {e}", self.port.name());
        }
    }
}

/// Restores the original baud rate when dropped.
pub(crate) struct BaudRestore<'a, P: Port> {
    port: &'a mut P,
    baud_rate: u32,
}

impl<'a, P: Port> BaudRestore<'a, P> {
    pub(crate) fn new(port: &'a mut P) -> Self {
        let baud_rate = port.baud_rate();
        Self { port, baud_rate }
    }

    pub(crate) fn port(&mut self) -> &mut P {
        self.port
    }
}

impl<P: Port> Drop for BaudRestore<'_, P> {
    fn drop(&mut self) {
        if let Err(e) = self.port.set_baud_rate(self.baud_rate) {
            warn!("Failed to restore baud rate {}: {e}", self.baud_rate);
        }
    }
}
