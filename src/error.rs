//! Error types for the host.

use crate::registry::HandleKind;
use crate::render::RenderError;
use thiserror::Error;

/// Main error type for link, registry and dispatch operations.
///
/// Everything except [`HostError::Exhausted`] is fatal to the link actor:
/// the dispatcher stops, the running flag is cleared and both actors wind
/// down.
#[derive(Debug, Error)]
pub enum HostError {
    /// A command named a handle that is not live in the registry.
    #[error("unknown {kind} handle {handle}")]
    UnknownHandle {
        /// Which pool the handle was looked up in.
        kind: HandleKind,
        /// Raw handle value received on the wire.
        handle: u8,
    },

    /// The byte in opcode position is not part of the command set.
    #[error("unrecognized opcode 0x{0:02x}")]
    UnrecognizedOpcode(u8),

    /// A handle pool has no free handles left.
    #[error("out of {0} handles")]
    Exhausted(HandleKind),

    /// DeleteGroup targeted the reserved ALL group.
    #[error("the ALL group cannot be deleted")]
    ReservedGroup,

    /// I/O error on the link.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image or window failure reported by the renderer.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// The running flag was cleared while waiting on the link or a handshake.
    #[error("host stopped")]
    Stopped,

    /// The render actor went away before completing the window handshake.
    #[error("render actor unavailable")]
    RenderActorGone,
}

impl HostError {
    /// Whether this error must terminate the link actor.
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::Exhausted(_))
    }
}

/// Result type alias using `HostError`.
pub type Result<T> = std::result::Result<T, HostError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_exhaustion_is_recoverable() {
        assert!(!HostError::Exhausted(HandleKind::Sprite).is_fatal());
        assert!(HostError::UnrecognizedOpcode(0x42).is_fatal());
        assert!(HostError::ReservedGroup.is_fatal());
        assert!(HostError::UnknownHandle {
            kind: HandleKind::Group,
            handle: 3
        }
        .is_fatal());
    }

    #[test]
    fn test_messages() {
        let err = HostError::UnknownHandle {
            kind: HandleKind::Sprite,
            handle: 99,
        };
        assert_eq!(err.to_string(), "unknown sprite handle 99");
        assert_eq!(
            HostError::UnrecognizedOpcode(0x0e).to_string(),
            "unrecognized opcode 0x0e"
        );
    }
}
