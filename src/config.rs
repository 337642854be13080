//! Host configuration.

use std::time::Duration;

/// Configuration for a [`Host`](crate::Host).
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Target frames per second for the render actor.
    pub target_fps: u32,
    /// Sleep between empty link reads.
    pub idle_backoff: Duration,
    /// Write the `0xFF` initialisation byte when the link opens.
    pub send_init_byte: bool,
    /// Discard the first byte the device sends.
    pub discard_sync_byte: bool,
    /// How often blocked handshakes re-check the running flag.
    pub handshake_poll: Duration,
}

impl HostConfig {
    /// Time budget of one frame.
    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs(1) / self.target_fps.max(1)
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            idle_backoff: Duration::from_millis(1),
            send_init_byte: true,
            discard_sync_byte: true,
            handshake_poll: Duration::from_millis(50),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_duration() {
        let config = HostConfig::default();
        assert_eq!(config.frame_duration(), Duration::from_secs(1) / 60);

        let stalled = HostConfig {
            target_fps: 0,
            ..HostConfig::default()
        };
        assert_eq!(stalled.frame_duration(), Duration::from_secs(1));
    }
}
