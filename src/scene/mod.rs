//! Scene module: the state both actors share.
//!
//! The [`Scene`] pairs the [`Registry`] with the [`VisualState`], each
//! behind its own lock:
//!
//! - the **deletion lock** guards the registry. `DeleteSprite` holds it
//!   while it updates group membership and the handle pool; the render
//!   actor holds it while it drains the update queue and drops removed
//!   drawables, so a frame never sees half-deleted bookkeeping.
//! - the **visual-state lock** guards drawables. Compositing and
//!   collision-mask computation both read transformed surfaces and never
//!   overlap.
//!
//! Lock order is registry, then visuals. Nothing acquires the registry
//! while holding the visuals.

mod update;
mod visuals;

pub use update::{SceneUpdate, SpriteId};
pub use visuals::{Dirty, Drawable, TransformJob, VisualState};

use crate::error::Result;
use crate::registry::{Handle, Registry};
use crate::render::{Canvas, Mask, Rect, Renderer, Surface};
use crossbeam_channel::Receiver;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Top-left corner of `mask` centred on `position`.
fn top_left(position: (u16, u16), mask: &Mask) -> (i32, i32) {
    let rect = Rect::centered(
        i32::from(position.0),
        i32::from(position.1),
        mask.width(),
        mask.height(),
    );
    (rect.x, rect.y)
}

/// Registry and drawables, shared between the link and render actors.
#[derive(Debug)]
pub struct Scene {
    registry: Mutex<Registry>,
    visuals: Mutex<VisualState>,
}

impl Scene {
    /// Create an empty scene and the queue its updates arrive on.
    pub fn new() -> (Self, Receiver<SceneUpdate>) {
        let (registry, updates) = Registry::new();
        let scene = Self {
            registry: Mutex::new(registry),
            visuals: Mutex::new(VisualState::new()),
        };
        (scene, updates)
    }

    /// Acquire the deletion lock.
    pub fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquire the visual-state lock.
    pub fn visuals(&self) -> MutexGuard<'_, VisualState> {
        self.visuals.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Handles of `group` members whose masks overlap `sprite`'s, in
    /// membership order. `sprite` itself is never reported.
    ///
    /// Both handles are validated before any mask is touched. Masks are
    /// placed at the registry's positions, which may be ahead of the last
    /// frame.
    pub fn collide(&self, renderer: &dyn Renderer, sprite: Handle, group: Handle) -> Result<Vec<Handle>> {
        let (subject, candidates) = {
            let registry = self.registry();
            registry.group(group)?;
            let subject = registry.sprite(sprite)?;
            let subject = (subject.id(), subject.position());
            let mut candidates = Vec::new();
            for &member in registry.members(group)? {
                if member != sprite {
                    let live = registry.sprite(member)?;
                    candidates.push((member, live.id(), live.position()));
                }
            }
            (subject, candidates)
        };

        let mut visuals = self.visuals();
        let mut ids: Vec<SpriteId> = candidates.iter().map(|&(_, id, _)| id).collect();
        ids.push(subject.0);
        visuals.refresh_masks(&ids, renderer);

        let Some(subject_mask) = visuals.cached_mask(subject.0) else {
            return Ok(Vec::new());
        };
        let subject_at = top_left(subject.1, subject_mask);

        let hits = candidates
            .into_iter()
            .filter(|&(_, id, position)| {
                visuals.cached_mask(id).is_some_and(|mask| {
                    renderer.masks_overlap(subject_mask, subject_at, mask, top_left(position, mask))
                })
            })
            .map(|(handle, _, _)| handle)
            .collect();
        Ok(hits)
    }

    /// Frame step (a): under the deletion lock, drain the update queue,
    /// drop removed drawables and return the remaining updates.
    pub fn reap(&self, updates: &Receiver<SceneUpdate>) -> Vec<SceneUpdate> {
        let _deletion = self.registry();
        let mut pending = Vec::new();
        let mut removed = 0usize;
        {
            let mut visuals = self.visuals();
            for update in updates.try_iter() {
                if update.is_removal() {
                    visuals.remove(update.id());
                    removed += 1;
                } else {
                    pending.push(update);
                }
            }
        }
        if removed > 0 {
            tracing::trace!(removed, "reaped drawables");
        }
        pending
    }

    /// Frame step (b): apply visual updates and recompute transformed
    /// surfaces. Transforms run outside the visual-state lock.
    pub fn refresh(&self, renderer: &dyn Renderer, pending: &[SceneUpdate]) {
        let jobs = {
            let mut visuals = self.visuals();
            for update in pending {
                visuals.apply(update);
            }
            visuals.transform_jobs()
        };
        if jobs.is_empty() {
            return;
        }

        let finished: Vec<_> = jobs
            .into_iter()
            .map(|job| {
                let surface = renderer
                    .transform(&job.source, job.size, job.angle)
                    .unwrap_or_else(|e| {
                        tracing::warn!(id = ?job.id, error = %e, "transform failed, hiding sprite");
                        Surface::empty()
                    });
                (job.id, surface)
            })
            .collect();

        let mut visuals = self.visuals();
        for (id, surface) in finished {
            visuals.install(id, surface);
        }
    }

    /// Frame steps (c) and (d): composite dirty drawables into `canvas`
    /// and clear their dirty flags, under the visual-state lock.
    pub fn compose(&self, canvas: &mut Canvas) -> Vec<Rect> {
        let mut visuals = self.visuals();
        let dirty = visuals.draw_all(canvas);
        visuals.clear_dirty();
        dirty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HostError;
    use crate::registry::{HandleKind, SpriteDescriptor};
    use crate::render::{check_extent, Mask, RenderError, Window};
    use image::Rgba;

    /// Solid squares: every sprite's mask is its whole rectangle.
    struct Blocks;

    impl Renderer for Blocks {
        fn load_image(&self, _name: &str) -> std::result::Result<Surface, RenderError> {
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

    fn spawn(scene: &Scene, x: u16, y: u16, side: u16) -> Handle {
        let descriptor = SpriteDescriptor {
            image: "block".into(),
            x,
            y,
            angle: 0,
            width: side,
            height: side,
            order: 0,
        };
        let source = Blocks.load_image("block").unwrap();
        let transformed = Blocks.transform(&source, (side, side), 0).unwrap();
        let (handle, id) = scene.registry().create_sprite(&descriptor).unwrap();
        scene
            .visuals()
            .insert(id, Drawable::new(source, transformed, &descriptor));
        handle
    }

    #[test]
    fn test_collide_reports_overlaps_in_member_order() {
        let (scene, _rx) = Scene::new();
        let player = spawn(&scene, 10, 10, 4);
        let far = spawn(&scene, 50, 50, 4);
        let near_b = spawn(&scene, 12, 12, 4);
        let near_a = spawn(&scene, 8, 8, 4);

        let group = scene.registry().create_group().unwrap();
        for sprite in [near_a, far, near_b, player] {
            scene.registry().add_to_group(group, sprite).unwrap();
        }

        let hits = scene.collide(&Blocks, player, group).unwrap();
        let id = scene.registry().sprite(player).unwrap().id();
        assert!(!scene.visuals().get(id).unwrap().mask_dirty());
        assert_eq!(hits, vec![near_a, near_b]);
    }

    #[test]
    fn test_collide_uses_latest_positions() {
        let (scene, _rx) = Scene::new();
        let a = spawn(&scene, 10, 10, 4);
        let b = spawn(&scene, 40, 40, 4);
        assert!(scene.collide(&Blocks, a, Handle::ALL_GROUP).unwrap().is_empty());

        // No frame has run since the move
        scene.registry().set_position(b, 11, 11).unwrap();
        assert_eq!(scene.collide(&Blocks, a, Handle::ALL_GROUP).unwrap(), vec![b]);
    }

    #[test]
    fn test_collide_never_reports_self() {
        let (scene, _rx) = Scene::new();
        let lone = spawn(&scene, 10, 10, 4);
        let hits = scene.collide(&Blocks, lone, Handle::ALL_GROUP).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_collide_unknown_handles() {
        let (scene, _rx) = Scene::new();
        let sprite = spawn(&scene, 10, 10, 4);
        assert!(matches!(
            scene.collide(&Blocks, sprite, Handle::new(77)),
            Err(HostError::UnknownHandle {
                kind: HandleKind::Group,
                handle: 77
            })
        ));
        assert!(matches!(
            scene.collide(&Blocks, Handle::new(3), Handle::ALL_GROUP),
            Err(HostError::UnknownHandle {
                kind: HandleKind::Sprite,
                handle: 3
            })
        ));
    }

    #[test]
    fn test_frame_steps() {
        let (scene, updates) = Scene::new();
        let a = spawn(&scene, 4, 4, 2);
        let b = spawn(&scene, 10, 10, 2);
        let mut canvas = Canvas::new(16, 16, Blocks.background());

        // First frame draws both new sprites
        assert!(scene.reap(&updates).is_empty());
        assert_eq!(scene.compose(&mut canvas).len(), 2);

        scene.registry().set_size(a, 4, 4).unwrap();
        scene.registry().delete_sprite(b).unwrap();

        let pending = scene.reap(&updates);
        assert_eq!(pending.len(), 1);
        assert_eq!(scene.visuals().len(), 1);

        scene.refresh(&Blocks, &pending);
        let dirty = scene.compose(&mut canvas);
        // b's old area plus a's old and new areas
        assert_eq!(dirty.len(), 3);
        assert_eq!(canvas.get(10, 10), Some(Blocks.background()));
        assert_eq!(canvas.get(2, 2), Some(Rgba([255, 255, 255, 255])));
    }

    #[test]
    fn test_oversized_resize_hides_sprite() {
        let (scene, updates) = Scene::new();
        let a = spawn(&scene, 4, 4, 2);
        let id = scene.registry().sprite(a).unwrap().id();

        scene.registry().set_size(a, u16::MAX, u16::MAX).unwrap();
        let pending = scene.reap(&updates);
        scene.refresh(&Blocks, &pending);

        assert!(scene.visuals().get(id).unwrap().surface().is_empty());
        assert!(scene.collide(&Blocks, a, Handle::ALL_GROUP).unwrap().is_empty());
    }
}
