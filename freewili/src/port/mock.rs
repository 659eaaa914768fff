//! Scripted in-memory port for unit tests.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::port::{DEFAULT_BAUD, Port};

#[derive(Debug, Default)]
pub(crate) struct MockState {
    /// Bytes waiting to be read.
    pub rx: VecDeque<u8>,
    /// Everything written while open.
    pub tx: Vec<u8>,
    /// Replies released when the written stream ends with the trigger.
    pub replies: VecDeque<(Vec<u8>, Vec<u8>)>,
    pending: Vec<u8>,
    pub open: bool,
    pub opens: usize,
    pub closes: usize,
    pub baud: u32,
    /// Baud rate in effect at each open.
    pub baud_at_open: Vec<u32>,
    /// Cap on bytes accepted per `write` call.
    pub write_limit: Option<usize>,
    /// Total bytes accepted before every further write returns 0.
    pub accept_total: Option<usize>,
    pub fail_open: bool,
    pub clears: usize,
}

/// Cloneable handle; clones share the same state so a test can keep one
/// while the device handle owns the other.
#[derive(Debug, Clone)]
pub(crate) struct MockPort {
    name: String,
    state: Arc<Mutex<MockState>>,
}

impl MockPort {
    pub fn new(name: &str) -> Self {
        let state = MockState {
            baud: DEFAULT_BAUD,
            ..MockState::default()
        };
        Self {
            name: name.to_string(),
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    /// Make bytes available for reading right away.
    pub fn preload(&self, data: &[u8]) {
        self.state().rx.extend(data);
    }

    /// Queue `reply` to arrive once the host has written `trigger`.
    pub fn reply_to(&self, trigger: &[u8], reply: &[u8]) {
        self.state()
            .replies
            .push_back((trigger.to_vec(), reply.to_vec()));
    }

    pub fn written(&self) -> Vec<u8> {
        self.state().tx.clone()
    }
}

impl Port for MockPort {
    fn open(&mut self) -> Result<()> {
        let mut state = self.state();
        if state.open {
            return Ok(());
        }
        if state.fail_open {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "mock open failure",
            )));
        }
        state.open = true;
        state.opens += 1;
        let baud = state.baud;
        state.baud_at_open.push(baud);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let mut state = self.state();
        if state.open {
            state.open = false;
            state.closes += 1;
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.state.lock().unwrap().open
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()> {
        self.state().baud = baud_rate;
        Ok(())
    }

    fn baud_rate(&self) -> u32 {
        self.state.lock().unwrap().baud
    }

    fn clear_buffers(&mut self) -> Result<()> {
        let mut state = self.state();
        state.rx.clear();
        state.clears += 1;
        Ok(())
    }

    fn bytes_to_read(&mut self) -> Result<usize> {
        Ok(self.state().rx.len())
    }
}

impl Read for MockPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state();
        if !state.open {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "port closed"));
        }
        if state.rx.is_empty() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "no data"));
        }
        let n = buf.len().min(state.rx.len());
        for b in buf.iter_mut().take(n) {
            *b = state.rx.pop_front().unwrap();
        }
        Ok(n)
    }
}

impl Write for MockPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state();
        if !state.open {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "port closed"));
        }
        let mut n = state.write_limit.map_or(buf.len(), |limit| buf.len().min(limit));
        if let Some(total) = state.accept_total {
            n = n.min(total.saturating_sub(state.tx.len()));
        }
        state.tx.extend_from_slice(&buf[..n]);
        state.pending.extend_from_slice(&buf[..n]);

        let fire = state
            .replies
            .front()
            .is_some_and(|(trigger, _)| state.pending.ends_with(trigger));
        if fire {
            if let Some((_, reply)) = state.replies.pop_front() {
                state.rx.extend(reply);
            }
            state.pending.clear();
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
