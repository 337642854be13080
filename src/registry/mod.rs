//! Registry module: handle pools and the sprite/group object model.
//!
//! This module contains:
//! - [`HandlePool`]: free lists for sprite and group handles
//! - [`Sprite`] and [`Group`]: the objects commands refer to by handle
//! - [`Registry`]: owner of both, enforcing membership invariants

mod group;
mod handle;
#[allow(clippy::module_inception)]
mod registry;
mod sprite;

pub use group::Group;
pub use handle::{Handle, HandleKind, HandlePool, HANDLE_ERROR, POOL_CAPACITY};
pub use registry::Registry;
pub use sprite::{Sprite, SpriteDescriptor};
