//! Groups: ordered, duplicate-free sprite sets used for collision queries.

use super::handle::Handle;

/// A sprite group.
#[derive(Debug, Clone, Default)]
pub struct Group {
    members: Vec<Handle>,
}

impl Group {
    /// An empty group.
    pub const fn new() -> Self {
        Self {
            members: Vec::new(),
        }
    }

    /// Members in the order they joined.
    pub fn members(&self) -> &[Handle] {
        &self.members
    }

    /// Number of members.
    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the group has no members.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether `sprite` is a member.
    pub fn contains(&self, sprite: Handle) -> bool {
        self.members.contains(&sprite)
    }

    /// Append `sprite`; returns `false` if it was already a member.
    pub(super) fn insert(&mut self, sprite: Handle) -> bool {
        if self.contains(sprite) {
            return false;
        }
        self.members.push(sprite);
        true
    }

    /// Remove `sprite`; returns `false` if it was not a member.
    pub(super) fn remove(&mut self, sprite: Handle) -> bool {
        match self.members.iter().position(|&m| m == sprite) {
            Some(index) => {
                self.members.remove(index);
                true
            }
            None => false,
        }
    }

    pub(super) fn take_members(&mut self) -> Vec<Handle> {
        std::mem::take(&mut self.members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_is_idempotent() {
        let mut group = Group::new();
        assert!(group.insert(Handle::new(4)));
        assert!(!group.insert(Handle::new(4)));
        assert_eq!(group.len(), 1);
    }

    #[test]
    fn test_membership_order() {
        let mut group = Group::new();
        for raw in [9, 3, 7] {
            group.insert(Handle::new(raw));
        }
        group.remove(Handle::new(3));
        assert_eq!(group.members(), &[Handle::new(9), Handle::new(7)]);
        assert!(!group.remove(Handle::new(3)));
    }
}
