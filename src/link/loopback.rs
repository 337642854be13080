//! In-process link for tests and demos.
//!
//! [`pair`] returns the host's end, which implements `Read + Write` like a
//! serial port, and a [`DeviceEnd`] that plays the microcontroller.

use crate::protocol::Command;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::io::{self, ErrorKind, Read, Write};
use std::time::{Duration, Instant};

/// How long a host read waits before reporting a timeout.
const READ_POLL: Duration = Duration::from_millis(5);

/// Create a connected host/device pair.
pub fn pair() -> (HostEnd, DeviceEnd) {
    let (to_host, from_device) = unbounded();
    let (to_device, from_host) = unbounded();
    (
        HostEnd {
            rx: from_device,
            tx: to_device,
        },
        DeviceEnd {
            tx: to_host,
            rx: from_host,
        },
    )
}

/// The host side of a loopback link.
#[derive(Debug)]
pub struct HostEnd {
    rx: Receiver<u8>,
    tx: Sender<u8>,
}

impl Read for HostEnd {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.rx.recv_timeout(READ_POLL) {
            Ok(byte) => buf[0] = byte,
            Err(RecvTimeoutError::Timeout) => return Err(ErrorKind::TimedOut.into()),
            // Device hung up: behave like an idle port
            Err(RecvTimeoutError::Disconnected) => return Ok(0),
        }
        let mut n = 1;
        while n < buf.len() {
            match self.rx.try_recv() {
                Ok(byte) => {
                    buf[n] = byte;
                    n += 1;
                }
                Err(_) => break,
            }
        }
        Ok(n)
    }
}

impl Write for HostEnd {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for &byte in buf {
            self.tx
                .send(byte)
                .map_err(|_| io::Error::from(ErrorKind::BrokenPipe))?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// The device side of a loopback link.
#[derive(Debug)]
pub struct DeviceEnd {
    tx: Sender<u8>,
    rx: Receiver<u8>,
}

impl DeviceEnd {
    /// Send raw bytes to the host. Returns false if the host end is gone.
    pub fn send(&self, bytes: &[u8]) -> bool {
        bytes.iter().all(|&b| self.tx.send(b).is_ok())
    }

    /// Encode and send a command.
    pub fn send_command(&self, command: &Command) -> bool {
        self.send(&command.to_bytes())
    }

    /// Wait up to `timeout` for one byte from the host.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<u8> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Wait up to `timeout` in total for exactly `n` bytes.
    pub fn recv_exact(&self, n: usize, timeout: Duration) -> Option<Vec<u8>> {
        let deadline = Instant::now() + timeout;
        let mut bytes = Vec::with_capacity(n);
        while bytes.len() < n {
            let left = deadline.saturating_duration_since(Instant::now());
            bytes.push(self.rx.recv_timeout(left).ok()?);
        }
        Some(bytes)
    }

    /// Read a list response: bytes up to and excluding the `0xFF` terminator.
    pub fn recv_list(&self, timeout: Duration) -> Option<Vec<u8>> {
        let deadline = Instant::now() + timeout;
        let mut bytes = Vec::new();
        loop {
            let left = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(left).ok()? {
                crate::protocol::LIST_TERMINATOR => return Some(bytes),
                byte => bytes.push(byte),
            }
        }
    }

    /// Everything the host has written that is already queued.
    pub fn drain(&self) -> Vec<u8> {
        self.rx.try_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_flow_both_ways() {
        let (mut host, device) = pair();
        assert!(device.send(&[1, 2, 3]));
        let mut buf = [0u8; 8];
        assert_eq!(host.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], &[1, 2, 3]);

        host.write_all(&[9, 8, 0xFF]).unwrap();
        assert_eq!(device.recv_list(Duration::from_millis(50)), Some(vec![9, 8]));
    }

    #[test]
    fn test_idle_read_times_out() {
        let (mut host, _device) = pair();
        let mut buf = [0u8; 1];
        let err = host.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TimedOut);
    }

    #[test]
    fn test_hangups() {
        let (mut host, device) = pair();
        drop(device);
        let mut buf = [0u8; 1];
        assert_eq!(host.read(&mut buf).unwrap(), 0);
        assert_eq!(host.write(&[1]).unwrap_err().kind(), ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_recv_exact_times_out_short() {
        let (mut host, device) = pair();
        host.write_all(&[7]).unwrap();
        assert_eq!(device.recv_exact(2, Duration::from_millis(20)), None);
    }
}
