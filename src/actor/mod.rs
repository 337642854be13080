//! Actor Model: the two threads that make up a running host.
//!
//! - **Link Actor**: reads the byte stream, decodes and executes commands
//! - **Render Actor**: owns the window, composites and presents frames
//! - **Host**: starts both and waits for them
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   WindowRequest   ┌──────────────┐
//! │              │ ────────────────▶ │              │
//! │  Link Thread │ ◀──────────────── │Render Thread │
//! │              │    WindowReply    │              │
//! └──────────────┘                   └──────────────┘
//!        │                                  ▲
//!        │ lock          Scene          lock│
//!        └──────────▶ ┌─────────┐ ◀─────────┘
//!                     │registry │── SceneUpdate ──▶ (render)
//!                     │visuals  │
//!                     └─────────┘
//! ```
//!
//! A shared running flag stops both actors; either can clear it.

mod host;
mod link;
mod messages;
mod renderer;

pub use host::Host;
pub use link::LinkActor;
pub use messages::{window_channel, RenderStats, WindowEndpoint, WindowHandshake, WindowReply, WindowRequest};
pub use renderer::{RenderActor, RenderContext};
