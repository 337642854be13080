//! Typed commands.

use super::codec::{read_int16, read_int8, read_string, write_int16, write_string, ByteSource};
use super::opcode::{ArgKind, Opcode};
use crate::error::Result;
use crate::registry::{Handle, SpriteDescriptor};

/// One fully decoded device command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `0x01`: create a sprite and answer its handle.
    CreateSprite(SpriteDescriptor),

    /// `0x02`: move a sprite's centre.
    SetPos {
        /// Target sprite.
        sprite: Handle,
        /// New centre x.
        x: u16,
        /// New centre y.
        y: u16,
    },

    /// `0x03`: set a sprite's rotation.
    SetRot {
        /// Target sprite.
        sprite: Handle,
        /// Degrees counter-clockwise.
        angle: u16,
    },

    /// `0x04`: delete a sprite.
    DeleteSprite {
        /// Target sprite.
        sprite: Handle,
    },

    /// `0x05`: create a group and answer its handle.
    CreateGroup,

    /// `0x06`: add a sprite to a group.
    AddToGroup {
        /// Target group.
        group: Handle,
        /// Sprite to add.
        sprite: Handle,
    },

    /// `0x07`: remove a sprite from a group.
    RemoveFromGroup {
        /// Target group.
        group: Handle,
        /// Sprite to remove.
        sprite: Handle,
    },

    /// `0x08`: delete a group, keeping its sprites.
    DeleteGroup {
        /// Target group.
        group: Handle,
    },

    /// `0x09`: answer the group members overlapping a sprite.
    Collide {
        /// Sprite to test.
        sprite: Handle,
        /// Group whose members are candidates.
        group: Handle,
    },

    /// `0x0A`: open the display window.
    CreateWindow {
        /// Width in pixels.
        width: u16,
        /// Height in pixels.
        height: u16,
    },

    /// `0x0B`: log a line of device text.
    Print {
        /// Decoded text, invalid UTF-8 replaced.
        text: String,
    },

    /// `0x0C`: change a sprite's draw layer.
    SetOrder {
        /// Target sprite.
        sprite: Handle,
        /// New layer; higher draws on top.
        order: u8,
    },

    /// `0x0D`: change a sprite's unrotated size.
    SetSize {
        /// Target sprite.
        sprite: Handle,
        /// New width.
        width: u16,
        /// New height.
        height: u16,
    },
}

/// Reads an opcode's arguments in the order [`Opcode::args`] lists them.
struct ArgReader<'a, S: ?Sized> {
    source: &'a mut S,
    kinds: std::slice::Iter<'static, ArgKind>,
}

impl<'a, S: ByteSource + ?Sized> ArgReader<'a, S> {
    fn new(opcode: Opcode, source: &'a mut S) -> Self {
        Self {
            source,
            kinds: opcode.args().iter(),
        }
    }

    fn advance(&mut self, kind: ArgKind) {
        let next = self.kinds.next();
        debug_assert_eq!(next, Some(&kind), "argument read out of schema order");
    }

    fn int8(&mut self) -> Result<u8> {
        self.advance(ArgKind::Int8);
        read_int8(&mut *self.source)
    }

    fn int16(&mut self) -> Result<u16> {
        self.advance(ArgKind::Int16);
        read_int16(&mut *self.source)
    }

    fn handle(&mut self) -> Result<Handle> {
        self.int8().map(Handle::new)
    }

    fn text(&mut self) -> Result<String> {
        self.advance(ArgKind::String);
        read_string(&mut *self.source).map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    fn finish(self, command: Command) -> Command {
        debug_assert_eq!(self.kinds.len(), 0, "schema arguments left unread");
        command
    }
}

impl Command {
    /// Read the arguments of `opcode` and build the command.
    ///
    /// Arguments are consumed in wire order; the call returns only once the
    /// last one is complete.
    pub fn read<S: ByteSource + ?Sized>(opcode: Opcode, source: &mut S) -> Result<Self> {
        let mut args = ArgReader::new(opcode, source);
        let command = match opcode {
            Opcode::CreateSprite => Self::CreateSprite(SpriteDescriptor {
                image: args.text()?,
                x: args.int16()?,
                y: args.int16()?,
                angle: args.int16()?,
                width: args.int16()?,
                height: args.int16()?,
                order: args.int8()?,
            }),
            Opcode::SetPos => Self::SetPos {
                sprite: args.handle()?,
                x: args.int16()?,
                y: args.int16()?,
            },
            Opcode::SetRot => Self::SetRot {
                sprite: args.handle()?,
                angle: args.int16()?,
            },
            Opcode::DeleteSprite => Self::DeleteSprite {
                sprite: args.handle()?,
            },
            Opcode::CreateGroup => Self::CreateGroup,
            Opcode::AddToGroup => Self::AddToGroup {
                group: args.handle()?,
                sprite: args.handle()?,
            },
            Opcode::RemoveFromGroup => Self::RemoveFromGroup {
                group: args.handle()?,
                sprite: args.handle()?,
            },
            Opcode::DeleteGroup => Self::DeleteGroup {
                group: args.handle()?,
            },
            Opcode::Collide => Self::Collide {
                sprite: args.handle()?,
                group: args.handle()?,
            },
            Opcode::CreateWindow => Self::CreateWindow {
                width: args.int16()?,
                height: args.int16()?,
            },
            Opcode::Print => Self::Print { text: args.text()? },
            Opcode::SetOrder => Self::SetOrder {
                sprite: args.handle()?,
                order: args.int8()?,
            },
            Opcode::SetSize => Self::SetSize {
                sprite: args.handle()?,
                width: args.int16()?,
                height: args.int16()?,
            },
        };
        Ok(args.finish(command))
    }

    /// The opcode this command travels under.
    pub const fn opcode(&self) -> Opcode {
        match self {
            Self::CreateSprite(_) => Opcode::CreateSprite,
            Self::SetPos { .. } => Opcode::SetPos,
            Self::SetRot { .. } => Opcode::SetRot,
            Self::DeleteSprite { .. } => Opcode::DeleteSprite,
            Self::CreateGroup => Opcode::CreateGroup,
            Self::AddToGroup { .. } => Opcode::AddToGroup,
            Self::RemoveFromGroup { .. } => Opcode::RemoveFromGroup,
            Self::DeleteGroup { .. } => Opcode::DeleteGroup,
            Self::Collide { .. } => Opcode::Collide,
            Self::CreateWindow { .. } => Opcode::CreateWindow,
            Self::Print { .. } => Opcode::Print,
            Self::SetOrder { .. } => Opcode::SetOrder,
            Self::SetSize { .. } => Opcode::SetSize,
        }
    }

    /// Append the device-side encoding: opcode byte, then arguments.
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.opcode().byte());
        match self {
            Self::CreateSprite(desc) => {
                write_string(out, desc.image.as_bytes());
                for value in [desc.x, desc.y, desc.angle, desc.width, desc.height] {
                    write_int16(out, value);
                }
                out.push(desc.order);
            }
            Self::SetPos { sprite, x, y } => {
                out.push(sprite.raw());
                write_int16(out, *x);
                write_int16(out, *y);
            }
            Self::SetRot { sprite, angle } => {
                out.push(sprite.raw());
                write_int16(out, *angle);
            }
            Self::DeleteSprite { sprite } => out.push(sprite.raw()),
            Self::CreateGroup => {}
            Self::AddToGroup { group, sprite } | Self::RemoveFromGroup { group, sprite } => {
                out.push(group.raw());
                out.push(sprite.raw());
            }
            Self::DeleteGroup { group } => out.push(group.raw()),
            Self::Collide { sprite, group } => {
                out.push(sprite.raw());
                out.push(group.raw());
            }
            Self::CreateWindow { width, height } => {
                write_int16(out, *width);
                write_int16(out, *height);
            }
            Self::Print { text } => write_string(out, text.as_bytes()),
            Self::SetOrder { sprite, order } => {
                out.push(sprite.raw());
                out.push(*order);
            }
            Self::SetSize {
                sprite,
                width,
                height,
            } => {
                out.push(sprite.raw());
                write_int16(out, *width);
                write_int16(out, *height);
            }
        }
    }

    /// The device-side encoding as a fresh buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(16);
        self.encode(&mut out);
        out
    }
}
