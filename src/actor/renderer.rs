//! Render Actor: dedicated thread that owns the window.
//!
//! Until the window handshake the actor only applies scene updates. After
//! it, the actor runs one frame per tick:
//! reap removed sprites, refresh transformed surfaces, composite dirty
//! drawables and present the changed rectangles.

use super::messages::{RenderStats, WindowEndpoint};
use crate::render::{check_extent, Canvas, RenderError, Renderer, Window};
use crate::scene::{Scene, SceneUpdate};
use crossbeam_channel::Receiver;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Everything the render thread needs.
pub struct RenderContext {
    /// Shared scene.
    pub scene: Arc<Scene>,
    /// Scene updates published by the registry.
    pub updates: Receiver<SceneUpdate>,
    /// Drawing capability.
    pub renderer: Arc<dyn Renderer>,
    /// Render half of the window handshake.
    pub window: WindowEndpoint,
    /// Global running flag.
    pub running: Arc<AtomicBool>,
    /// Time budget of one frame.
    pub frame_duration: Duration,
}

/// Render actor handle.
pub struct RenderActor {
    /// Handle to the render thread.
    handle: Option<JoinHandle<()>>,
    /// Statistics shared with the thread.
    stats: Arc<Mutex<RenderStats>>,
}

impl RenderActor {
    /// Spawn the render thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn(context: RenderContext) -> io::Result<Self> {
        let stats = Arc::new(Mutex::new(RenderStats::default()));
        let stats_clone = stats.clone();

        let handle = thread::Builder::new()
            .name("spritelink-render".to_string())
            .spawn(move || {
                if let Err(e) = Self::run_loop(&context, &stats_clone) {
                    tracing::error!(error = %e, "render thread error");
                    context.running.store(false, Ordering::Relaxed);
                }
            })?;

        Ok(Self {
            handle: Some(handle),
            stats,
        })
    }

    /// Snapshot of the frame statistics.
    pub fn stats(&self) -> RenderStats {
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Wait for the render thread to finish.
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("render thread panicked");
            }
        }
    }

    /// Handshake, then frames until the running flag clears.
    fn run_loop(context: &RenderContext, stats: &Mutex<RenderStats>) -> Result<(), RenderError> {
        let running = &*context.running;
        // Keep applying updates until there is a window to draw them in
        let idle = || {
            let pending = context.scene.reap(&context.updates);
            context.scene.refresh(&*context.renderer, &pending);
        };
        let Some(request) = context.window.wait(running, idle) else {
            return Ok(());
        };

        let limit = context.renderer.max_pixels();
        let opened = check_extent(u32::from(request.width), u32::from(request.height), limit)
            .and_then(|()| context.renderer.open_window(request.width, request.height));
        let mut window = match opened {
            Ok(window) => {
                context.window.reply(Ok(()));
                window
            }
            Err(e) => {
                context.window.reply(Err(e.to_string()));
                return Err(e);
            }
        };

        let mut canvas = Canvas::new(
            u32::from(request.width).max(1),
            u32::from(request.height).max(1),
            context.renderer.background(),
        );
        window.present(&canvas, &[canvas.bounds()])?;

        while running.load(Ordering::Relaxed) {
            let frame_start = Instant::now();

            let (sprites, rects) = Self::frame(context, &mut canvas, window.as_mut())?;
            stats
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .record(sprites, rects, frame_start.elapsed());

            if window.poll_quit() {
                tracing::info!("window closed");
                running.store(false, Ordering::Relaxed);
                break;
            }

            // Frame pacing
            let elapsed = frame_start.elapsed();
            if elapsed < context.frame_duration {
                thread::sleep(context.frame_duration - elapsed);
            }
        }
        Ok(())
    }

    /// One frame. Returns (drawables, dirty rectangles presented).
    fn frame(
        context: &RenderContext,
        canvas: &mut Canvas,
        window: &mut dyn Window,
    ) -> Result<(usize, usize), RenderError> {
        let scene = &context.scene;
        let pending = scene.reap(&context.updates);
        scene.refresh(&*context.renderer, &pending);
        let dirty = scene.compose(canvas);
        window.present(canvas, &dirty)?;
        Ok((scene.visuals().len(), dirty.len()))
    }
}

impl std::fmt::Debug for RenderActor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderActor")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
