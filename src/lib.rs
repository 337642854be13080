//! # spritelink
//!
//! Host side of a serial sprite protocol: a microcontroller drives a
//! display by sending compact binary commands, and the host keeps the
//! scene, draws it and answers collision queries.
//!
//! ## Core Concepts
//!
//! - **Wire protocol**: one opcode byte, fixed `INT8`/`INT16`/`STRING`
//!   arguments, single-byte or `0xFF`-terminated list responses
//! - **Handles**: 254 recyclable ids per pool for sprites and groups, with
//!   group 0 reserved for ALL
//! - **Actor model**: a link thread decodes commands, a render thread owns
//!   the window; they share one scene behind two locks
//! - **Lazy masks**: per-pixel collision masks are recomputed only when a
//!   collision query needs them
//!
//! ## Example
//!
//! ```rust,ignore
//! use spritelink::{Host, HostConfig, SoftwareRenderer};
//! use std::sync::Arc;
//!
//! let port = std::fs::OpenOptions::new().read(true).write(true).open("/dev/ttyUSB0")?;
//! let host = Host::start(port, Arc::new(SoftwareRenderer::default()), HostConfig::default())?;
//! host.wait()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod actor;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod link;
pub mod logging;
pub mod protocol;
pub mod registry;
pub mod render;
pub mod scene;
pub mod terminal;

// Re-exports for convenience
pub use actor::{Host, RenderStats};
pub use config::HostConfig;
pub use dispatch::{DispatchState, Dispatcher};
pub use error::{HostError, Result};
pub use link::Link;
pub use protocol::{Command, Opcode, Response};
pub use registry::{Handle, HandleKind, Registry, SpriteDescriptor};
pub use render::{Backend, Canvas, Mask, Rect, RenderError, Renderer, SoftwareRenderer, SoftwareRendererConfig, Surface, Window};
pub use scene::{Scene, SceneUpdate, SpriteId};
