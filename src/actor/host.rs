//! Host: main coordinator that ties the actors together.
//!
//! The Host is the entry point for applications using spritelink. It
//! writes the init byte, builds the shared scene and spawns the link and
//! render actors.

use super::link::LinkActor;
use super::messages::{window_channel, RenderStats};
use super::renderer::{RenderActor, RenderContext};
use crate::config::HostConfig;
use crate::dispatch::Dispatcher;
use crate::error::{HostError, Result};
use crate::link::Link;
use crate::protocol::INIT_BYTE;
use crate::render::Renderer;
use crate::scene::Scene;
use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A running device session.
pub struct Host {
    /// Global running flag shared by both actors.
    running: Arc<AtomicBool>,
    /// Shared scene.
    scene: Arc<Scene>,
    /// Link actor handle.
    link: Option<LinkActor>,
    /// Render actor handle.
    render: Option<RenderActor>,
}

impl Host {
    /// Start a session on `transport`.
    ///
    /// # Errors
    ///
    /// Returns an error if the init byte cannot be written or a thread
    /// cannot be spawned.
    pub fn start<T>(mut transport: T, renderer: Arc<dyn Renderer>, config: HostConfig) -> Result<Self>
    where
        T: Read + Write + Send + 'static,
    {
        if config.send_init_byte {
            transport.write_all(&[INIT_BYTE])?;
            transport.flush()?;
            tracing::debug!("init byte sent");
        }

        let running = Arc::new(AtomicBool::new(true));
        let (scene, updates) = Scene::new();
        let scene = Arc::new(scene);
        let (handshake, endpoint) = window_channel(config.handshake_poll);

        let render = RenderActor::spawn(RenderContext {
            scene: scene.clone(),
            updates,
            renderer: renderer.clone(),
            window: endpoint,
            running: running.clone(),
            frame_duration: config.frame_duration(),
        })?;

        let link = Link::new(transport, running.clone(), config.idle_backoff);
        let mut dispatcher = Dispatcher::new(link, scene.clone(), renderer, handshake);
        if !config.discard_sync_byte {
            dispatcher = dispatcher.skip_sync();
        }

        let mut host = Self {
            running,
            scene,
            link: None,
            render: Some(render),
        };
        // On failure, dropping `host` stops the render actor
        host.link = Some(LinkActor::spawn(dispatcher)?);

        tracing::info!(fps = config.target_fps, "host started");
        Ok(host)
    }

    /// The shared scene.
    pub const fn scene(&self) -> &Arc<Scene> {
        &self.scene
    }

    /// Whether both actors are still meant to run.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Ask both actors to stop at their next check.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Frame statistics so far.
    pub fn render_stats(&self) -> RenderStats {
        self.render
            .as_ref()
            .map(RenderActor::stats)
            .unwrap_or_default()
    }

    /// Block until the link actor ends, then stop the render actor.
    ///
    /// Returns the link actor's fatal error, if any. A shutdown requested
    /// through [`Host::shutdown`] or the window is `Ok`.
    pub fn wait(mut self) -> Result<()> {
        let result = self.link.take().map_or(Ok(()), LinkActor::join);
        self.shutdown();
        if let Some(render) = self.render.take() {
            render.join();
        }
        match result {
            Err(HostError::Stopped) => Ok(()),
            other => other,
        }
    }
}

impl Drop for Host {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(link) = self.link.take() {
            let _ = link.join();
        }
        if let Some(render) = self.render.take() {
            render.join();
        }
    }
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("running", &self.is_running())
            .field("link", &self.link)
            .field("render", &self.render)
            .finish_non_exhaustive()
    }
}
