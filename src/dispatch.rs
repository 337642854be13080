//! Command dispatcher: the link actor's state machine.
//!
//! ```text
//! Syncing ──▶ AwaitOpcode ──▶ AwaitArgs ──▶ Dispatch ─┐
//!                  ▲                                  │
//!                  └──────────────────────────────────┘
//!        (any fatal error or shutdown) ──▶ Stopped
//! ```
//!
//! Each command is executed against the shared [`Scene`]; its response, if
//! any, is written back before the next opcode is read.

use crate::actor::{WindowHandshake, WindowRequest};
use crate::error::{HostError, Result};
use crate::link::Link;
use crate::protocol::{Command, Opcode, Response};
use crate::registry::{SpriteDescriptor, HANDLE_ERROR};
use crate::render::Renderer;
use crate::scene::{Drawable, Scene};
use std::io::{Read, Write};
use std::sync::Arc;

/// Where the dispatcher is in the byte stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchState {
    /// Discard the single byte the device sends when the link opens.
    Syncing,
    /// Next byte is an opcode.
    AwaitOpcode,
    /// Reading the arguments of this opcode.
    AwaitArgs(Opcode),
    /// A complete command is ready to execute.
    Dispatch(Command),
    /// Terminal state.
    Stopped,
}

/// Decodes commands from the link and applies them to the scene.
pub struct Dispatcher<T> {
    link: Link<T>,
    scene: Arc<Scene>,
    renderer: Arc<dyn Renderer>,
    window: WindowHandshake,
    state: DispatchState,
    window_size: Option<(u16, u16)>,
    executed: u64,
}

impl<T: Read + Write> Dispatcher<T> {
    /// Create a dispatcher in the `Syncing` state.
    pub fn new(
        link: Link<T>,
        scene: Arc<Scene>,
        renderer: Arc<dyn Renderer>,
        window: WindowHandshake,
    ) -> Self {
        Self {
            link,
            scene,
            renderer,
            window,
            state: DispatchState::Syncing,
            window_size: None,
            executed: 0,
        }
    }

    /// Start directly at `AwaitOpcode`, for links without a sync byte.
    #[must_use]
    pub fn skip_sync(mut self) -> Self {
        if self.state == DispatchState::Syncing {
            self.state = DispatchState::AwaitOpcode;
        }
        self
    }

    /// Current state.
    pub const fn state(&self) -> &DispatchState {
        &self.state
    }

    /// Commands executed so far.
    pub const fn executed(&self) -> u64 {
        self.executed
    }

    /// Window size once `CreateWindow` has completed.
    pub const fn window_size(&self) -> Option<(u16, u16)> {
        self.window_size
    }

    /// The underlying link.
    pub const fn link(&self) -> &Link<T> {
        &self.link
    }

    /// Advance one transition.
    ///
    /// On error the dispatcher is left in `Stopped`.
    pub fn step(&mut self) -> Result<()> {
        let state = std::mem::replace(&mut self.state, DispatchState::Stopped);
        self.state = match state {
            DispatchState::Syncing => {
                let byte = self.link.read_byte()?;
                tracing::trace!(byte, "discarded sync byte");
                DispatchState::AwaitOpcode
            }
            DispatchState::AwaitOpcode => {
                let byte = self.link.read_byte()?;
                DispatchState::AwaitArgs(Opcode::try_from(byte)?)
            }
            DispatchState::AwaitArgs(opcode) => {
                DispatchState::Dispatch(Command::read(opcode, &mut self.link)?)
            }
            DispatchState::Dispatch(command) => {
                tracing::debug!(?command, "dispatch");
                let response = self.execute(command)?;
                let bytes = response.to_bytes();
                if !bytes.is_empty() {
                    tracing::trace!(?bytes, "respond");
                    self.link.write_all(&bytes)?;
                }
                self.executed += 1;
                DispatchState::AwaitOpcode
            }
            DispatchState::Stopped => return Err(HostError::Stopped),
        };
        Ok(())
    }

    /// Run until stopped.
    ///
    /// Fatal errors clear the running flag and are returned; a shutdown
    /// requested elsewhere ends the loop with `Ok`.
    pub fn run(&mut self) -> Result<()> {
        loop {
            match self.step() {
                Ok(()) => {}
                Err(HostError::Stopped) => {
                    tracing::debug!(executed = self.executed, "dispatcher stopped");
                    return Ok(());
                }
                Err(e) => {
                    tracing::error!(error = %e, "fatal link error");
                    self.link.stop();
                    return Err(e);
                }
            }
        }
    }

    /// Apply one command and produce its response.
    ///
    /// Handle exhaustion is answered with `HANDLE_ERROR`; every other
    /// error is fatal and leaves the scene untouched.
    pub fn execute(&mut self, command: Command) -> Result<Response> {
        match command {
            Command::CreateSprite(descriptor) => self.create_sprite(&descriptor),
            Command::SetPos { sprite, x, y } => {
                self.scene.registry().set_position(sprite, x, y)?;
                Ok(Response::Silent)
            }
            Command::SetRot { sprite, angle } => {
                self.scene.registry().set_rotation(sprite, angle)?;
                Ok(Response::Silent)
            }
            Command::SetOrder { sprite, order } => {
                self.scene.registry().set_order(sprite, order)?;
                Ok(Response::Silent)
            }
            Command::SetSize {
                sprite,
                width,
                height,
            } => {
                self.scene.registry().set_size(sprite, width, height)?;
                Ok(Response::Silent)
            }
            Command::DeleteSprite { sprite } => {
                self.scene.registry().delete_sprite(sprite)?;
                Ok(Response::Silent)
            }
            Command::CreateGroup => {
                let created = self.scene.registry().create_group();
                match created {
                    Ok(handle) => Ok(Response::Byte(handle.raw())),
                    Err(e) if !e.is_fatal() => {
                        tracing::warn!(error = %e, "CreateGroup failed");
                        Ok(Response::Byte(HANDLE_ERROR))
                    }
                    Err(e) => Err(e),
                }
            }
            Command::AddToGroup { group, sprite } => {
                self.scene.registry().add_to_group(group, sprite)?;
                Ok(Response::Silent)
            }
            Command::RemoveFromGroup { group, sprite } => {
                self.scene.registry().remove_from_group(group, sprite)?;
                Ok(Response::Silent)
            }
            Command::DeleteGroup { group } => {
                self.scene.registry().delete_group(group)?;
                Ok(Response::Silent)
            }
            Command::Collide { sprite, group } => {
                let hits = self.scene.collide(&*self.renderer, sprite, group)?;
                Ok(Response::List(hits))
            }
            Command::CreateWindow { width, height } => {
                self.create_window(width, height)?;
                Ok(Response::Silent)
            }
            Command::Print { text } => {
                tracing::info!(target: "device", "{text}");
                Ok(Response::Silent)
            }
        }
    }

    fn create_sprite(&self, descriptor: &SpriteDescriptor) -> Result<Response> {
        if !self.scene.registry().can_create_sprite() {
            tracing::warn!(image = %descriptor.image, "sprite handles exhausted");
            return Ok(Response::Byte(HANDLE_ERROR));
        }

        // Decode and transform outside both locks
        let source = match self.renderer.load_image(&descriptor.image) {
            Ok(surface) => surface,
            Err(e) => {
                tracing::warn!(image = %descriptor.image, error = %e, "image load failed");
                return Ok(Response::Byte(HANDLE_ERROR));
            }
        };
        let size = (descriptor.width, descriptor.height);
        let transformed = match self.renderer.transform(&source, size, descriptor.angle) {
            Ok(surface) => surface,
            Err(e) => {
                tracing::warn!(image = %descriptor.image, ?size, error = %e, "transform failed");
                return Ok(Response::Byte(HANDLE_ERROR));
            }
        };

        let mut registry = self.scene.registry();
        let (handle, id) = match registry.create_sprite(descriptor) {
            Ok(created) => created,
            Err(e) if !e.is_fatal() => {
                tracing::warn!(error = %e, "CreateSprite failed");
                return Ok(Response::Byte(HANDLE_ERROR));
            }
            Err(e) => return Err(e),
        };
        self.scene
            .visuals()
            .insert(id, Drawable::new(source, transformed, descriptor));
        drop(registry);

        tracing::debug!(?handle, image = %descriptor.image, "sprite created");
        Ok(Response::Byte(handle.raw()))
    }

    fn create_window(&mut self, width: u16, height: u16) -> Result<()> {
        if let Some((w, h)) = self.window_size {
            tracing::warn!(width, height, open_width = w, open_height = h, "window already open, ignoring");
            return Ok(());
        }
        self.window
            .open(WindowRequest { width, height }, self.link.running())?;
        self.window_size = Some((width, height));
        tracing::info!(width, height, "window open");
        Ok(())
    }
}

impl<T> std::fmt::Debug for Dispatcher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("state", &self.state)
            .field("window_size", &self.window_size)
            .field("executed", &self.executed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{window_channel, WindowEndpoint};
    use crate::link::loopback::{self, DeviceEnd, HostEnd};
    use crate::registry::{Handle, POOL_CAPACITY};
    use crate::render::{check_extent, Mask, RenderError, Surface, Window};
    use image::Rgba;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(2);

    /// Solid squares; names starting with `missing` fail to load.
    struct Blocks;

    impl Renderer for Blocks {
        fn load_image(&self, name: &str) -> std::result::Result<Surface, RenderError> {
            if name.starts_with("missing") {
                return Err(RenderError::Window(format!("no image {name}")));
            }
            Ok(Surface::solid(1, 1, Rgba([255, 255, 255, 255])))
        }
        fn transform(
            &self,
            _source: &Surface,
            size: (u16, u16),
            _angle: u16,
        ) -> std::result::Result<Surface, RenderError> {
            let (width, height) = (u32::from(size.0), u32::from(size.1));
            check_extent(width, height, self.max_pixels())?;
            Ok(Surface::solid(width, height, Rgba([255, 255, 255, 255])))
        }
        fn compute_mask(&self, surface: &Surface) -> Mask {
            Mask::from_surface(surface, 127)
        }
        fn open_window(&self, _w: u16, _h: u16) -> std::result::Result<Box<dyn Window>, RenderError> {
            Err(RenderError::Window("no window in tests".into()))
        }
    }

    struct Rig {
        dispatcher: Dispatcher<HostEnd>,
        device: DeviceEnd,
        scene: Arc<Scene>,
        _endpoint: WindowEndpoint,
    }

    fn rig() -> Rig {
        let (host, device) = loopback::pair();
        let running = Arc::new(AtomicBool::new(true));
        let link = Link::new(host, running, Duration::from_millis(1));
        let (scene, _updates) = Scene::new();
        let scene = Arc::new(scene);
        let (handshake, endpoint) = window_channel(Duration::from_millis(5));
        let dispatcher = Dispatcher::new(link, scene.clone(), Arc::new(Blocks), handshake).skip_sync();
        Rig {
            dispatcher,
            device,
            scene,
            _endpoint: endpoint,
        }
    }

    impl Rig {
        /// Send a command and run the dispatcher until it is back at
        /// `AwaitOpcode` or fails.
        fn run_command(&mut self, command: &Command) -> Result<()> {
            self.device.send_command(command);
            loop {
                self.dispatcher.step()?;
                if self.dispatcher.state() == &DispatchState::AwaitOpcode {
                    return Ok(());
                }
            }
        }
    }

    fn sprite(image: &str, x: u16, y: u16) -> Command {
        Command::CreateSprite(SpriteDescriptor {
            image: image.into(),
            x,
            y,
            angle: 0,
            width: 4,
            height: 4,
            order: 0,
        })
    }

    #[test]
    fn test_syncing_discards_one_byte() {
        let mut rig = rig();
        rig.dispatcher.state = DispatchState::Syncing;
        rig.device.send(&[0x42, Opcode::CreateGroup.byte()]);
        rig.dispatcher.step().unwrap();
        assert_eq!(rig.dispatcher.state(), &DispatchState::AwaitOpcode);
        rig.dispatcher.step().unwrap();
        assert_eq!(
            rig.dispatcher.state(),
            &DispatchState::AwaitArgs(Opcode::CreateGroup)
        );
    }

    #[test]
    fn test_group_lifecycle_keeps_sprite_in_all() {
        let mut rig = rig();
        rig.run_command(&Command::CreateGroup).unwrap();
        let group = rig.device.recv_timeout(WAIT).unwrap();
        assert_ne!(group, HANDLE_ERROR);

        rig.run_command(&sprite("ship", 10, 10)).unwrap();
        let ship = rig.device.recv_timeout(WAIT).unwrap();
        assert_ne!(ship, HANDLE_ERROR);

        rig.run_command(&Command::AddToGroup {
            group: Handle::new(group),
            sprite: Handle::new(ship),
        })
        .unwrap();
        rig.run_command(&Command::DeleteGroup {
            group: Handle::new(group),
        })
        .unwrap();

        let registry = rig.scene.registry();
        let live = registry.sprite(Handle::new(ship)).unwrap();
        assert!(live.in_group(Handle::ALL_GROUP));
        assert!(!live.in_group(Handle::new(group)));
        assert!(registry.group(Handle::new(group)).is_err());
        drop(registry);
        assert!(rig.device.drain().is_empty());
    }

    #[test]
    fn test_unknown_sprite_is_fatal_without_response() {
        let mut rig = rig();
        rig.device.send_command(&Command::SetPos {
            sprite: Handle::new(99),
            x: 0,
            y: 0,
        });
        let err = rig.dispatcher.run().unwrap_err();
        assert!(matches!(
            err,
            HostError::UnknownHandle { handle: 99, .. }
        ));
        assert_eq!(rig.dispatcher.state(), &DispatchState::Stopped);
        assert!(!rig.dispatcher.link().is_running());
        assert_eq!(rig.device.recv_timeout(Duration::from_millis(20)), None);
    }

    #[test]
    fn test_unrecognized_opcode_is_fatal() {
        let mut rig = rig();
        rig.device.send(&[0x42]);
        assert!(matches!(
            rig.dispatcher.run(),
            Err(HostError::UnrecognizedOpcode(0x42))
        ));
        assert!(!rig.dispatcher.link().is_running());
    }

    #[test]
    fn test_collide_without_overlap_writes_terminator_only() {
        let mut rig = rig();
        rig.run_command(&sprite("a", 10, 10)).unwrap();
        let a = rig.device.recv_timeout(WAIT).unwrap();
        rig.run_command(&sprite("b", 100, 100)).unwrap();
        let _b = rig.device.recv_timeout(WAIT).unwrap();

        rig.run_command(&Command::Collide {
            sprite: Handle::new(a),
            group: Handle::ALL_GROUP,
        })
        .unwrap();
        assert_eq!(rig.device.recv_exact(1, WAIT), Some(vec![0xFF]));
        assert!(rig.device.drain().is_empty());
    }

    #[test]
    fn test_collide_lists_overlapping_members() {
        let mut rig = rig();
        rig.run_command(&sprite("a", 10, 10)).unwrap();
        let a = rig.device.recv_timeout(WAIT).unwrap();
        rig.run_command(&sprite("b", 12, 12)).unwrap();
        let b = rig.device.recv_timeout(WAIT).unwrap();

        rig.run_command(&Command::Collide {
            sprite: Handle::new(a),
            group: Handle::ALL_GROUP,
        })
        .unwrap();
        assert_eq!(rig.device.recv_list(WAIT), Some(vec![b]));
    }

    #[test]
    fn test_exhaustion_answers_handle_error() {
        let mut rig = rig();
        for _ in 0..POOL_CAPACITY {
            rig.run_command(&sprite("dot", 1, 1)).unwrap();
            assert_ne!(rig.device.recv_timeout(WAIT).unwrap(), HANDLE_ERROR);
        }
        rig.run_command(&sprite("dot", 1, 1)).unwrap();
        assert_eq!(rig.device.recv_timeout(WAIT), Some(HANDLE_ERROR));
        assert_eq!(rig.scene.registry().sprite_count(), POOL_CAPACITY);
        assert_eq!(rig.scene.visuals().len(), POOL_CAPACITY);
    }

    #[test]
    fn test_failed_image_load_answers_handle_error() {
        let mut rig = rig();
        rig.run_command(&sprite("missing.png", 1, 1)).unwrap();
        assert_eq!(rig.device.recv_timeout(WAIT), Some(HANDLE_ERROR));
        assert_eq!(rig.scene.registry().sprite_count(), 0);
    }

    #[test]
    fn test_oversized_sprite_answers_handle_error() {
        let mut rig = rig();
        rig.run_command(&Command::CreateSprite(SpriteDescriptor {
            image: "huge".into(),
            x: 0,
            y: 0,
            angle: 0,
            width: u16::MAX,
            height: u16::MAX,
            order: 0,
        }))
        .unwrap();
        assert_eq!(rig.device.recv_timeout(WAIT), Some(HANDLE_ERROR));
        assert_eq!(rig.scene.registry().sprite_count(), 0);
        assert!(rig.scene.visuals().is_empty());

        // The link carries on
        rig.run_command(&sprite("ship", 1, 1)).unwrap();
        assert_ne!(rig.device.recv_timeout(WAIT), Some(HANDLE_ERROR));
    }

    #[test]
    fn test_delete_all_group_is_fatal() {
        let mut rig = rig();
        assert!(matches!(
            rig.run_command(&Command::DeleteGroup {
                group: Handle::ALL_GROUP
            }),
            Err(HostError::ReservedGroup)
        ));
        assert_eq!(rig.dispatcher.state(), &DispatchState::Stopped);
    }

    #[test]
    fn test_print_has_no_response() {
        let mut rig = rig();
        rig.run_command(&Command::Print {
            text: "hello".into(),
        })
        .unwrap();
        assert_eq!(rig.dispatcher.executed(), 1);
        assert!(rig.device.drain().is_empty());
    }

    #[test]
    fn test_second_create_window_is_ignored() {
        let mut rig = rig();
        rig.dispatcher.window_size = Some((64, 48));
        rig.run_command(&Command::CreateWindow {
            width: 10,
            height: 10,
        })
        .unwrap();
        assert_eq!(rig.dispatcher.window_size(), Some((64, 48)));
        assert!(rig.device.drain().is_empty());
    }
}
