//! Message types for actor communication.
//!
//! Scene updates travel on the scene's own queue; this module holds the
//! window handshake between the link and render actors and the statistics
//! the render actor publishes.

use crate::error::{HostError, Result};
use crate::render::RenderError;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Request from the link actor to open the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowRequest {
    /// Width in pixels.
    pub width: u16,
    /// Height in pixels.
    pub height: u16,
}

/// The render actor's answer: `Ok` once the window exists.
pub type WindowReply = std::result::Result<(), String>;

/// Create the two halves of the window handshake.
pub fn window_channel(poll: Duration) -> (WindowHandshake, WindowEndpoint) {
    let (request_tx, request_rx) = bounded(1);
    let (reply_tx, reply_rx) = bounded(1);
    (
        WindowHandshake {
            requests: request_tx,
            replies: reply_rx,
            poll,
        },
        WindowEndpoint {
            requests: request_rx,
            replies: reply_tx,
            poll,
        },
    )
}

/// Link-actor half of the window handshake.
#[derive(Debug)]
pub struct WindowHandshake {
    requests: Sender<WindowRequest>,
    replies: Receiver<WindowReply>,
    poll: Duration,
}

impl WindowHandshake {
    /// Ask for a window and block until the render actor reports it open.
    ///
    /// Polls `running` every `poll` interval so a shutdown is never missed.
    pub fn open(&self, request: WindowRequest, running: &AtomicBool) -> Result<()> {
        self.requests
            .send(request)
            .map_err(|_| HostError::RenderActorGone)?;
        // A queued reply wins over a cleared flag: the render actor clears
        // it right after reporting a failure.
        loop {
            match self.replies.recv_timeout(self.poll) {
                Ok(Ok(())) => return Ok(()),
                Ok(Err(reason)) => return Err(RenderError::Window(reason).into()),
                Err(RecvTimeoutError::Timeout) if !running.load(Ordering::Relaxed) => {
                    return Err(HostError::Stopped);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return Err(HostError::RenderActorGone),
            }
        }
    }
}

/// Render-actor half of the window handshake.
#[derive(Debug)]
pub struct WindowEndpoint {
    requests: Receiver<WindowRequest>,
    replies: Sender<WindowReply>,
    poll: Duration,
}

impl WindowEndpoint {
    /// Block until a window is requested, calling `idle` after every poll
    /// interval without one. `None` if the host stops first or the link
    /// actor has gone.
    pub fn wait(&self, running: &AtomicBool, mut idle: impl FnMut()) -> Option<WindowRequest> {
        while running.load(Ordering::Relaxed) {
            match self.requests.recv_timeout(self.poll) {
                Ok(request) => return Some(request),
                Err(RecvTimeoutError::Timeout) => idle(),
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
        None
    }

    /// Report the outcome of opening the window.
    pub fn reply(&self, reply: WindowReply) {
        // The link actor may already have stopped
        let _ = self.replies.send(reply);
    }
}

/// Render statistics for debugging/profiling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Frames presented.
    pub frames: u64,
    /// Drawables in the most recent frame.
    pub sprites: u64,
    /// Dirty rectangles presented across all frames.
    pub rects_presented: u64,
    /// Last frame time in microseconds.
    pub last_frame_us: u64,
    /// Smoothed frame time in microseconds.
    pub avg_frame_us: u64,
}

impl RenderStats {
    /// Fold one frame into the statistics.
    pub fn record(&mut self, sprites: usize, rects: usize, elapsed: Duration) {
        self.frames += 1;
        self.sprites = sprites as u64;
        self.rects_presented += rects as u64;
        self.last_frame_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);

        // Smoothed average
        if self.avg_frame_us == 0 {
            self.avg_frame_us = self.last_frame_us;
        } else {
            self.avg_frame_us = (self.avg_frame_us * 15 + self.last_frame_us) / 16;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_handshake_round_trip() {
        let (link, render) = window_channel(Duration::from_millis(5));
        let running = AtomicBool::new(true);
        let worker = thread::spawn(move || {
            let running = AtomicBool::new(true);
            let request = render.wait(&running, || {}).unwrap();
            render.reply(Ok(()));
            request
        });
        link.open(WindowRequest { width: 64, height: 32 }, &running)
            .unwrap();
        assert_eq!(
            worker.join().unwrap(),
            WindowRequest {
                width: 64,
                height: 32
            }
        );
    }

    #[test]
    fn test_handshake_failure_is_render_error() {
        let (link, render) = window_channel(Duration::from_millis(5));
        render.reply(Err("no display".into()));
        let running = AtomicBool::new(true);
        assert!(matches!(
            link.open(WindowRequest { width: 1, height: 1 }, &running),
            Err(HostError::Render(RenderError::Window(_)))
        ));
    }

    #[test]
    fn test_handshake_failure_beats_cleared_flag() {
        let (link, render) = window_channel(Duration::from_millis(5));
        render.reply(Err("too large".into()));
        let running = AtomicBool::new(false);
        assert!(matches!(
            link.open(WindowRequest { width: 1, height: 1 }, &running),
            Err(HostError::Render(RenderError::Window(_)))
        ));
    }

    #[test]
    fn test_handshake_observes_shutdown() {
        let (link, _render) = window_channel(Duration::from_millis(5));
        let running = AtomicBool::new(false);
        assert!(matches!(
            link.open(WindowRequest { width: 1, height: 1 }, &running),
            Err(HostError::Stopped)
        ));
    }

    #[test]
    fn test_handshake_render_gone() {
        let (link, render) = window_channel(Duration::from_millis(5));
        drop(render);
        let running = AtomicBool::new(true);
        assert!(matches!(
            link.open(WindowRequest { width: 1, height: 1 }, &running),
            Err(HostError::RenderActorGone)
        ));
    }

    #[test]
    fn test_stats_smoothing() {
        let mut stats = RenderStats::default();
        stats.record(3, 2, Duration::from_micros(160));
        assert_eq!(stats.avg_frame_us, 160);
        stats.record(4, 1, Duration::from_micros(0));
        assert_eq!(stats.avg_frame_us, 150);
        assert_eq!(stats.frames, 2);
        assert_eq!(stats.sprites, 4);
        assert_eq!(stats.rects_presented, 3);
    }
}
