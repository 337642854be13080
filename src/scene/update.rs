//! Messages from the link actor to the render actor.

/// Identity of one sprite's lifetime.
///
/// Handles are recycled as soon as a sprite is deleted, while its removal
/// may still be queued for the render actor. Drawables are therefore keyed
/// by an id that is never reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct SpriteId(u64);

impl SpriteId {
    /// Wrap a raw id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// A visual change the render actor must apply.
///
/// Published by the [`Registry`](crate::registry::Registry) in command
/// order; `Removed` is always the last message for an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneUpdate {
    /// The sprite's centre moved.
    Moved {
        /// Target sprite.
        id: SpriteId,
        /// New centre x.
        x: u16,
        /// New centre y.
        y: u16,
    },

    /// The sprite's rotation changed.
    Rotated {
        /// Target sprite.
        id: SpriteId,
        /// New angle in degrees.
        angle: u16,
    },

    /// The sprite's unrotated size changed.
    Resized {
        /// Target sprite.
        id: SpriteId,
        /// New width.
        width: u16,
        /// New height.
        height: u16,
    },

    /// The sprite moved to another layer.
    Reordered {
        /// Target sprite.
        id: SpriteId,
        /// New layer.
        order: u8,
    },

    /// The sprite was deleted; its drawable must go.
    Removed {
        /// Target sprite.
        id: SpriteId,
    },
}

impl SceneUpdate {
    /// The sprite this update targets.
    pub const fn id(&self) -> SpriteId {
        match *self {
            Self::Moved { id, .. }
            | Self::Rotated { id, .. }
            | Self::Resized { id, .. }
            | Self::Reordered { id, .. }
            | Self::Removed { id } => id,
        }
    }

    /// Whether this is a removal.
    pub const fn is_removal(&self) -> bool {
        matches!(self, Self::Removed { .. })
    }
}
