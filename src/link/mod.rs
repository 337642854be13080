//! Link module: the byte-stream connection to the device.
//!
//! [`Link`] wraps any `Read + Write` transport (a serial device file, a TCP
//! stream, or the in-process [`loopback`] pair) and turns its short reads
//! into the blocking, stop-aware [`ByteSource`] the decoder expects.

pub mod loopback;

use crate::error::{HostError, Result};
use crate::protocol::ByteSource;
use std::io::{ErrorKind, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Blocking byte link with cooperative shutdown.
pub struct Link<T> {
    transport: T,
    running: Arc<AtomicBool>,
    idle_backoff: Duration,
    bytes_in: u64,
    bytes_out: u64,
}

impl<T: Read + Write> Link<T> {
    /// Wrap `transport`. Reads give up with [`HostError::Stopped`] once
    /// `running` is cleared.
    pub const fn new(transport: T, running: Arc<AtomicBool>, idle_backoff: Duration) -> Self {
        Self {
            transport,
            running,
            idle_backoff,
            bytes_in: 0,
            bytes_out: 0,
        }
    }

    /// Read exactly one byte.
    ///
    /// Zero-length reads, timeouts and interrupts are retried after
    /// `idle_backoff`; any other I/O error is returned.
    pub fn read_byte(&mut self) -> Result<u8> {
        let mut byte = [0u8; 1];
        loop {
            if !self.running.load(Ordering::Relaxed) {
                return Err(HostError::Stopped);
            }
            match self.transport.read(&mut byte) {
                Ok(1) => {
                    self.bytes_in += 1;
                    return Ok(byte[0]);
                }
                Ok(_) => thread::sleep(self.idle_backoff),
                Err(e) if matches!(e.kind(), ErrorKind::Interrupted) => {}
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    thread::sleep(self.idle_backoff);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Write `bytes` and flush them to the device.
    pub fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        self.transport.write_all(bytes)?;
        self.transport.flush()?;
        self.bytes_out += bytes.len() as u64;
        Ok(())
    }

    /// Whether the host is still running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// The shared running flag.
    pub fn running(&self) -> &AtomicBool {
        &self.running
    }

    /// Clear the running flag, stopping both actors at their next check.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Bytes read so far.
    pub const fn bytes_in(&self) -> u64 {
        self.bytes_in
    }

    /// Bytes written so far.
    pub const fn bytes_out(&self) -> u64 {
        self.bytes_out
    }

    #[cfg(test)]
    pub(crate) fn into_inner(self) -> T {
        self.transport
    }
}

impl<T: Read + Write> ByteSource for Link<T> {
    fn next_byte(&mut self) -> Result<u8> {
        self.read_byte()
    }
}

impl<T> std::fmt::Debug for Link<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Link")
            .field("bytes_in", &self.bytes_in)
            .field("bytes_out", &self.bytes_out)
            .finish_non_exhaustive()
    }
}
