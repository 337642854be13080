//! Handles: small recyclable identifiers for sprites and groups.

use crate::error::{HostError, Result};

/// Number of handles each pool can hand out.
pub const POOL_CAPACITY: usize = 0xFE;

/// Wire sentinel meaning "no handle could be allocated".
pub const HANDLE_ERROR: u8 = 0xFF;

/// Which pool a handle belongs to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum HandleKind {
    /// Sprite handles.
    Sprite,
    /// Group handles.
    Group,
}

impl std::fmt::Display for HandleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sprite => f.write_str("sprite"),
            Self::Group => f.write_str("group"),
        }
    }
}

/// A sprite or group identifier as it travels over the link.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Handle(u8);

impl Handle {
    /// The reserved handle of the ALL group.
    pub const ALL_GROUP: Self = Self(0x00);

    /// Wrap a raw wire byte.
    #[inline]
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    /// The raw wire byte.
    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }
}

impl std::fmt::Debug for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u8> for Handle {
    #[inline]
    fn from(raw: u8) -> Self {
        Self(raw)
    }
}

/// Free list of handles for one object kind.
///
/// `allocate` pops the highest free handle. Callers must not rely on that
/// order.
#[derive(Debug, Clone)]
pub struct HandlePool {
    kind: HandleKind,
    free: Vec<Handle>,
}

impl HandlePool {
    /// A pool holding every handle in `[0, 254)`.
    pub fn new(kind: HandleKind) -> Self {
        Self::with_reserved(kind, &[])
    }

    /// A pool holding every handle in `[0, 254)` except `reserved`.
    pub fn with_reserved(kind: HandleKind, reserved: &[Handle]) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        let free = (0..POOL_CAPACITY)
            .map(|raw| Handle(raw as u8))
            .filter(|h| !reserved.contains(h))
            .collect();
        Self { kind, free }
    }

    /// Take a free handle.
    pub fn allocate(&mut self) -> Result<Handle> {
        self.free.pop().ok_or(HostError::Exhausted(self.kind))
    }

    /// Return a handle to the pool.
    pub fn release(&mut self, handle: Handle) {
        debug_assert!(
            !self.free.contains(&handle),
            "{} handle {handle:?} released twice",
            self.kind
        );
        debug_assert_ne!(handle.raw(), HANDLE_ERROR);
        self.free.push(handle);
    }

    /// Number of handles still available.
    #[inline]
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Whether no handle can be allocated.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.free.is_empty()
    }
}
