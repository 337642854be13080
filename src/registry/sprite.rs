//! Sprite bookkeeping: the logical attributes the link actor owns.

use super::handle::Handle;
use crate::scene::SpriteId;

/// Everything CreateSprite carries on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteDescriptor {
    /// Image name, resolved by the renderer.
    pub image: String,
    /// Centre x in window coordinates.
    pub x: u16,
    /// Centre y in window coordinates.
    pub y: u16,
    /// Counter-clockwise rotation in degrees.
    pub angle: u16,
    /// Unrotated width in pixels.
    pub width: u16,
    /// Unrotated height in pixels.
    pub height: u16,
    /// Draw layer; larger is in front.
    pub order: u8,
}

/// A live sprite.
///
/// The visual half (transformed surface, mask, dirty flags) lives in the
/// render-side [`Drawable`](crate::scene::Drawable) keyed by the same
/// [`SpriteId`].
#[derive(Debug, Clone)]
pub struct Sprite {
    id: SpriteId,
    image: String,
    position: (u16, u16),
    angle: u16,
    size: (u16, u16),
    order: u8,
    /// Groups this sprite is a member of, in join order.
    pub(super) groups: Vec<Handle>,
}

impl Sprite {
    pub(super) fn new(id: SpriteId, descriptor: &SpriteDescriptor) -> Self {
        Self {
            id,
            image: descriptor.image.clone(),
            position: (descriptor.x, descriptor.y),
            angle: descriptor.angle,
            size: (descriptor.width, descriptor.height),
            order: descriptor.order,
            groups: Vec::new(),
        }
    }

    /// Identity of this sprite's drawable.
    #[inline]
    pub const fn id(&self) -> SpriteId {
        self.id
    }

    /// Image name it was created from.
    pub fn image(&self) -> &str {
        &self.image
    }

    /// Centre position.
    #[inline]
    pub const fn position(&self) -> (u16, u16) {
        self.position
    }

    /// Rotation in degrees.
    #[inline]
    pub const fn angle(&self) -> u16 {
        self.angle
    }

    /// Unrotated size.
    #[inline]
    pub const fn size(&self) -> (u16, u16) {
        self.size
    }

    /// Draw layer.
    #[inline]
    pub const fn order(&self) -> u8 {
        self.order
    }

    /// Groups this sprite belongs to.
    pub fn groups(&self) -> &[Handle] {
        &self.groups
    }

    /// Whether this sprite is a member of `group`.
    pub fn in_group(&self, group: Handle) -> bool {
        self.groups.contains(&group)
    }

    pub(super) fn set_position(&mut self, x: u16, y: u16) {
        self.position = (x, y);
    }

    /// Returns `false` when the angle is unchanged.
    pub(super) fn set_angle(&mut self, angle: u16) -> bool {
        if self.angle == angle {
            return false;
        }
        self.angle = angle;
        true
    }

    /// Returns `false` when the size is unchanged.
    pub(super) fn set_size(&mut self, width: u16, height: u16) -> bool {
        if self.size == (width, height) {
            return false;
        }
        self.size = (width, height);
        true
    }

    pub(super) fn set_order(&mut self, order: u8) {
        self.order = order;
    }
}
