//! Registry: sole owner of live sprites and groups.

use super::group::Group;
use super::handle::{Handle, HandleKind, HandlePool};
use super::sprite::{Sprite, SpriteDescriptor};
use crate::error::{HostError, Result};
use crate::scene::{SceneUpdate, SpriteId};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::HashMap;

/// Live sprites and groups plus their handle pools.
///
/// Every mutation that changes what is on screen is also published as a
/// [`SceneUpdate`] for the render actor. The registry itself holds no lock;
/// the shared [`Scene`](crate::scene::Scene) wraps it in the deletion lock.
#[derive(Debug)]
pub struct Registry {
    sprites: HashMap<Handle, Sprite>,
    groups: HashMap<Handle, Group>,
    sprite_pool: HandlePool,
    group_pool: HandlePool,
    next_id: u64,
    updates: Sender<SceneUpdate>,
}

impl Registry {
    /// Create a registry together with the receiving end of its update queue.
    pub fn new() -> (Self, Receiver<SceneUpdate>) {
        let (tx, rx) = unbounded();
        (Self::with_sender(tx), rx)
    }

    /// Create a registry publishing updates on `updates`.
    ///
    /// The ALL group exists from the start under its reserved handle.
    pub fn with_sender(updates: Sender<SceneUpdate>) -> Self {
        let mut groups = HashMap::new();
        groups.insert(Handle::ALL_GROUP, Group::new());

        Self {
            sprites: HashMap::new(),
            groups,
            sprite_pool: HandlePool::new(HandleKind::Sprite),
            group_pool: HandlePool::with_reserved(HandleKind::Group, &[Handle::ALL_GROUP]),
            next_id: 0,
            updates,
        }
    }

    /// Look up a live sprite.
    pub fn sprite(&self, handle: Handle) -> Result<&Sprite> {
        self.sprites.get(&handle).ok_or(HostError::UnknownHandle {
            kind: HandleKind::Sprite,
            handle: handle.raw(),
        })
    }

    fn sprite_mut(&mut self, handle: Handle) -> Result<&mut Sprite> {
        self.sprites.get_mut(&handle).ok_or(HostError::UnknownHandle {
            kind: HandleKind::Sprite,
            handle: handle.raw(),
        })
    }

    /// Look up a live group.
    pub fn group(&self, handle: Handle) -> Result<&Group> {
        self.groups.get(&handle).ok_or(HostError::UnknownHandle {
            kind: HandleKind::Group,
            handle: handle.raw(),
        })
    }

    /// Number of live sprites.
    pub fn sprite_count(&self) -> usize {
        self.sprites.len()
    }

    /// Number of live groups, ALL included.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Whether a CreateSprite would currently get a handle.
    pub fn can_create_sprite(&self) -> bool {
        !self.sprite_pool.is_exhausted()
    }

    /// Register a new sprite and add it to the ALL group.
    ///
    /// On exhaustion nothing is mutated.
    pub fn create_sprite(&mut self, descriptor: &SpriteDescriptor) -> Result<(Handle, SpriteId)> {
        let handle = self.sprite_pool.allocate()?;
        let id = SpriteId::new(self.next_id);
        self.next_id += 1;

        self.sprites.insert(handle, Sprite::new(id, descriptor));
        self.link(Handle::ALL_GROUP, handle);
        Ok((handle, id))
    }

    /// Move a sprite's centre.
    pub fn set_position(&mut self, handle: Handle, x: u16, y: u16) -> Result<()> {
        let sprite = self.sprite_mut(handle)?;
        sprite.set_position(x, y);
        let id = sprite.id();
        self.publish(SceneUpdate::Moved { id, x, y });
        Ok(())
    }

    /// Rotate a sprite; unchanged angles publish nothing.
    pub fn set_rotation(&mut self, handle: Handle, angle: u16) -> Result<()> {
        let sprite = self.sprite_mut(handle)?;
        if sprite.set_angle(angle) {
            let id = sprite.id();
            self.publish(SceneUpdate::Rotated { id, angle });
        }
        Ok(())
    }

    /// Resize a sprite; unchanged sizes publish nothing.
    pub fn set_size(&mut self, handle: Handle, width: u16, height: u16) -> Result<()> {
        let sprite = self.sprite_mut(handle)?;
        if sprite.set_size(width, height) {
            let id = sprite.id();
            self.publish(SceneUpdate::Resized { id, width, height });
        }
        Ok(())
    }

    /// Move a sprite to another draw layer.
    pub fn set_order(&mut self, handle: Handle, order: u8) -> Result<()> {
        let sprite = self.sprite_mut(handle)?;
        sprite.set_order(order);
        let id = sprite.id();
        self.publish(SceneUpdate::Reordered { id, order });
        Ok(())
    }

    /// Remove a sprite from every group, free its handle and queue its
    /// drawable for removal.
    pub fn delete_sprite(&mut self, handle: Handle) -> Result<SpriteId> {
        let sprite = self.sprites.remove(&handle).ok_or(HostError::UnknownHandle {
            kind: HandleKind::Sprite,
            handle: handle.raw(),
        })?;

        for group in &sprite.groups {
            if let Some(group) = self.groups.get_mut(group) {
                group.remove(handle);
            }
        }
        self.sprite_pool.release(handle);
        self.publish(SceneUpdate::Removed { id: sprite.id() });
        Ok(sprite.id())
    }

    /// Allocate an empty group.
    pub fn create_group(&mut self) -> Result<Handle> {
        let handle = self.group_pool.allocate()?;
        self.groups.insert(handle, Group::new());
        Ok(handle)
    }

    /// Add a sprite to a group; adding an existing member is a no-op.
    pub fn add_to_group(&mut self, group: Handle, sprite: Handle) -> Result<()> {
        self.group(group)?;
        self.sprite(sprite)?;
        self.link(group, sprite);
        Ok(())
    }

    /// Remove a sprite from a group; removing a non-member is a no-op.
    ///
    /// The ALL group keeps every live sprite, so removal from it is ignored.
    pub fn remove_from_group(&mut self, group: Handle, sprite: Handle) -> Result<()> {
        self.group(group)?;
        self.sprite(sprite)?;
        if group == Handle::ALL_GROUP {
            tracing::warn!(sprite = ?sprite, "ignoring removal from the ALL group");
            return Ok(());
        }
        self.unlink(group, sprite);
        Ok(())
    }

    /// Drop every member from a group, then free its handle.
    pub fn delete_group(&mut self, group: Handle) -> Result<()> {
        self.group(group)?;
        if group == Handle::ALL_GROUP {
            return Err(HostError::ReservedGroup);
        }

        let mut removed = self.groups.remove(&group).unwrap_or_default();
        for sprite in removed.take_members() {
            if let Some(sprite) = self.sprites.get_mut(&sprite) {
                sprite.groups.retain(|&g| g != group);
            }
        }
        self.group_pool.release(group);
        Ok(())
    }

    /// Members of a group, in membership order.
    pub fn members(&self, group: Handle) -> Result<&[Handle]> {
        self.group(group).map(Group::members)
    }

    fn link(&mut self, group: Handle, sprite: Handle) {
        let inserted = self
            .groups
            .get_mut(&group)
            .is_some_and(|g| g.insert(sprite));
        if inserted {
            if let Some(sprite) = self.sprites.get_mut(&sprite) {
                sprite.groups.push(group);
            }
        }
    }

    fn unlink(&mut self, group: Handle, sprite: Handle) {
        let removed = self
            .groups
            .get_mut(&group)
            .is_some_and(|g| g.remove(sprite));
        if removed {
            if let Some(sprite) = self.sprites.get_mut(&sprite) {
                sprite.groups.retain(|&g| g != group);
            }
        }
    }

    fn publish(&self, update: SceneUpdate) {
        // A closed queue only means the render actor is gone.
        let _ = self.updates.send(update);
    }
}
