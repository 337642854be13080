//! Opcodes and their argument schemas.

use crate::error::HostError;

/// Primitive argument kinds on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// One byte.
    Int8,
    /// Two bytes, high byte first.
    Int16,
    /// Bytes up to a `0x00` terminator.
    String,
}

/// The closed command set.
///
/// Values are fixed by the device library and must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Create a sprite from an image.
    CreateSprite = 0x01,
    /// Move a sprite.
    SetPos = 0x02,
    /// Rotate a sprite.
    SetRot = 0x03,
    /// Delete a sprite.
    DeleteSprite = 0x04,
    /// Create a group.
    CreateGroup = 0x05,
    /// Add a sprite to a group.
    AddToGroup = 0x06,
    /// Remove a sprite from a group.
    RemoveFromGroup = 0x07,
    /// Delete a group.
    DeleteGroup = 0x08,
    /// List group members overlapping a sprite.
    Collide = 0x09,
    /// Open the display window.
    CreateWindow = 0x0A,
    /// Log a line of device text.
    Print = 0x0B,
    /// Change a sprite's draw layer.
    SetOrder = 0x0C,
    /// Resize a sprite.
    SetSize = 0x0D,
}

impl Opcode {
    /// Every opcode, in wire-value order.
    pub const ALL: [Self; 13] = [
        Self::CreateSprite,
        Self::SetPos,
        Self::SetRot,
        Self::DeleteSprite,
        Self::CreateGroup,
        Self::AddToGroup,
        Self::RemoveFromGroup,
        Self::DeleteGroup,
        Self::Collide,
        Self::CreateWindow,
        Self::Print,
        Self::SetOrder,
        Self::SetSize,
    ];

    /// The wire byte.
    #[inline]
    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// Argument kinds, in wire order.
    pub const fn args(self) -> &'static [ArgKind] {
        use ArgKind::{Int16, Int8, String};
        match self {
            Self::CreateSprite => &[String, Int16, Int16, Int16, Int16, Int16, Int8],
            Self::SetPos | Self::SetSize => &[Int8, Int16, Int16],
            Self::SetRot => &[Int8, Int16],
            Self::SetOrder | Self::AddToGroup | Self::RemoveFromGroup | Self::Collide => &[Int8, Int8],
            Self::DeleteSprite | Self::DeleteGroup => &[Int8],
            Self::CreateGroup => &[],
            Self::CreateWindow => &[Int16, Int16],
            Self::Print => &[String],
        }
    }

}

impl TryFrom<u8> for Opcode {
    type Error = HostError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|op| op.byte() == byte)
            .ok_or(HostError::UnrecognizedOpcode(byte))
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}(0x{:02x})", self.byte())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_values_round_trip() {
        for op in Opcode::ALL {
            assert_eq!(Opcode::try_from(op.byte()).unwrap(), op);
        }
        assert_eq!(Opcode::SetOrder.byte(), 0x0C);
        assert_eq!(Opcode::SetSize.byte(), 0x0D);
    }

    #[test]
    fn test_unknown_bytes() {
        for byte in [0x00, 0x0E, 0x42, 0xFF] {
            assert!(matches!(
                Opcode::try_from(byte),
                Err(HostError::UnrecognizedOpcode(b)) if b == byte
            ));
        }
    }

    #[test]
    fn test_create_sprite_schema() {
        let args = Opcode::CreateSprite.args();
        assert_eq!(args.len(), 7);
        assert_eq!(args[0], ArgKind::String);
        assert_eq!(args[6], ArgKind::Int8);
        assert!(Opcode::CreateGroup.args().is_empty());
    }
}
