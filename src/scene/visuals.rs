//! Visual state: the drawable half of every sprite.
//!
//! Owned by the [`Scene`](super::Scene) behind the visual-state lock. The
//! render actor applies updates, transforms and composites; the link actor
//! only reads transformed surfaces to build collision masks.

use super::update::{SceneUpdate, SpriteId};
use crate::registry::SpriteDescriptor;
use crate::render::{Canvas, Mask, Rect, Renderer, Surface};
use bitflags::bitflags;
use std::collections::BTreeMap;

bitflags! {
    /// What changed on a drawable since the last frame.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
    pub struct Dirty: u8 {
        /// Centre moved.
        const POSITION = 0b0000_0001;
        /// Angle changed; surface must be re-rotated.
        const ROTATION = 0b0000_0010;
        /// Size changed; surface must be re-scaled and re-rotated.
        const SIZE     = 0b0000_0100;
        /// Layer changed.
        const LAYER    = 0b0000_1000;
        /// Never drawn.
        const NEW      = 0b0001_0000;
    }
}

impl Dirty {
    /// Changes that require a new transformed surface.
    pub const TRANSFORM: Self = Self::ROTATION.union(Self::SIZE);
}

/// A sprite as the render actor sees it.
#[derive(Debug, Clone)]
pub struct Drawable {
    source: Surface,
    transformed: Surface,
    position: (u16, u16),
    angle: u16,
    size: (u16, u16),
    layer: u8,
    dirty: Dirty,
    mask: Option<Mask>,
    mask_dirty: bool,
    /// Where it was last drawn; `Rect::ZERO` before the first frame.
    drawn: Rect,
}

impl Drawable {
    /// Build a drawable from a loaded image and its first transform.
    pub fn new(source: Surface, transformed: Surface, descriptor: &SpriteDescriptor) -> Self {
        Self {
            source,
            transformed,
            position: (descriptor.x, descriptor.y),
            angle: descriptor.angle,
            size: (descriptor.width, descriptor.height),
            layer: descriptor.order,
            dirty: Dirty::NEW,
            mask: None,
            mask_dirty: true,
            drawn: Rect::ZERO,
        }
    }

    /// Screen rectangle of the current transformed surface.
    pub fn rect(&self) -> Rect {
        Rect::centered(
            i32::from(self.position.0),
            i32::from(self.position.1),
            self.transformed.width(),
            self.transformed.height(),
        )
    }

    /// Pending changes.
    #[inline]
    pub const fn dirty(&self) -> Dirty {
        self.dirty
    }

    /// Draw layer.
    #[inline]
    pub const fn layer(&self) -> u8 {
        self.layer
    }

    /// Whether the collision mask is stale.
    #[inline]
    pub const fn mask_dirty(&self) -> bool {
        self.mask_dirty
    }

    /// The surface currently drawn.
    #[inline]
    pub const fn surface(&self) -> &Surface {
        &self.transformed
    }

    fn apply(&mut self, update: &SceneUpdate) {
        match *update {
            SceneUpdate::Moved { x, y, .. } => {
                self.position = (x, y);
                self.dirty |= Dirty::POSITION;
            }
            SceneUpdate::Rotated { angle, .. } => {
                self.angle = angle;
                self.dirty |= Dirty::ROTATION;
            }
            SceneUpdate::Resized { width, height, .. } => {
                self.size = (width, height);
                self.dirty |= Dirty::SIZE;
            }
            SceneUpdate::Reordered { order, .. } => {
                self.layer = order;
                self.dirty |= Dirty::LAYER;
            }
            SceneUpdate::Removed { .. } => {}
        }
    }

    fn install(&mut self, transformed: Surface) {
        self.transformed = transformed;
        self.mask_dirty = true;
    }

    /// Recompute the mask iff it is stale, then return it.
    fn refresh_mask(&mut self, renderer: &dyn Renderer) -> &Mask {
        if self.mask_dirty || self.mask.is_none() {
            self.mask = Some(renderer.compute_mask(&self.transformed));
            self.mask_dirty = false;
        }
        self.mask.get_or_insert_with(|| Mask::new(0, 0))
    }
}

/// A transform the render actor owes a drawable.
#[derive(Debug, Clone)]
pub struct TransformJob {
    /// Target drawable.
    pub id: SpriteId,
    /// Untransformed image.
    pub source: Surface,
    /// Target size.
    pub size: (u16, u16),
    /// Target angle.
    pub angle: u16,
}

/// All live drawables, in creation order.
#[derive(Debug, Default)]
pub struct VisualState {
    drawables: BTreeMap<SpriteId, Drawable>,
    /// Screen areas vacated by removed drawables, not yet redrawn.
    vacated: Vec<Rect>,
}

impl VisualState {
    /// An empty drawable set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of drawables.
    pub fn len(&self) -> usize {
        self.drawables.len()
    }

    /// Whether there are no drawables.
    pub fn is_empty(&self) -> bool {
        self.drawables.is_empty()
    }

    /// Look up a drawable.
    pub fn get(&self, id: SpriteId) -> Option<&Drawable> {
        self.drawables.get(&id)
    }

    /// Add a freshly created drawable.
    pub fn insert(&mut self, id: SpriteId, drawable: Drawable) {
        self.drawables.insert(id, drawable);
    }

    /// Drop a drawable, remembering the area it covered on screen.
    pub fn remove(&mut self, id: SpriteId) -> bool {
        match self.drawables.remove(&id) {
            Some(drawable) => {
                if !drawable.drawn.is_empty() {
                    self.vacated.push(drawable.drawn);
                }
                true
            }
            None => false,
        }
    }

    /// Apply a non-removal update. Updates for unknown ids are ignored.
    pub fn apply(&mut self, update: &SceneUpdate) {
        if let Some(drawable) = self.drawables.get_mut(&update.id()) {
            drawable.apply(update);
        }
    }

    /// Transforms owed to drawables whose size or rotation changed.
    pub fn transform_jobs(&self) -> Vec<TransformJob> {
        self.drawables
            .iter()
            .filter(|(_, d)| d.dirty.intersects(Dirty::TRANSFORM))
            .map(|(&id, d)| TransformJob {
                id,
                source: d.source.clone(),
                size: d.size,
                angle: d.angle,
            })
            .collect()
    }

    /// Swap in a finished transform.
    pub fn install(&mut self, id: SpriteId, transformed: Surface) {
        if let Some(drawable) = self.drawables.get_mut(&id) {
            drawable.install(transformed);
        }
    }

    /// Screen rectangle and up-to-date mask of a drawable.
    #[cfg(test)]
    pub fn mask(&mut self, id: SpriteId, renderer: &dyn Renderer) -> Option<(Rect, &Mask)> {
        let drawable = self.drawables.get_mut(&id)?;
        let rect = drawable.rect();
        Some((rect, drawable.refresh_mask(renderer)))
    }

    /// Recompute stale masks for `ids`.
    pub fn refresh_masks(&mut self, ids: &[SpriteId], renderer: &dyn Renderer) {
        for id in ids {
            if let Some(drawable) = self.drawables.get_mut(id) {
                drawable.refresh_mask(renderer);
            }
        }
    }

    /// Cached mask; `None` if missing or never computed.
    pub fn cached_mask(&self, id: SpriteId) -> Option<&Mask> {
        self.drawables.get(&id)?.mask.as_ref()
    }

    /// Redraw every area that changed since the last frame.
    ///
    /// Returns the dirty rectangles (canvas pixels) the window must present.
    pub fn draw_all(&mut self, canvas: &mut Canvas) -> Vec<Rect> {
        let mut dirty = std::mem::take(&mut self.vacated);
        for drawable in self.drawables.values_mut() {
            if drawable.dirty.is_empty() {
                continue;
            }
            let now = drawable.rect();
            for rect in [drawable.drawn, now] {
                if !rect.is_empty() {
                    dirty.push(rect);
                }
            }
            drawable.drawn = now;
        }
        if dirty.is_empty() {
            return dirty;
        }

        let mut order: Vec<&Drawable> = self.drawables.values().collect();
        // Stable: equal layers keep creation order.
        order.sort_by_key(|d| d.layer);

        for region in &dirty {
            canvas.clear_rect(*region);
            for drawable in &order {
                let rect = drawable.rect();
                if rect.intersects(region) {
                    canvas.blit(&drawable.transformed, (rect.x, rect.y), *region);
                }
            }
        }
        dirty
    }

    /// Forget this frame's changes.
    pub fn clear_dirty(&mut self) {
        for drawable in self.drawables.values_mut() {
            drawable.dirty = Dirty::empty();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{RenderError, Window};
    use image::Rgba;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    #[derive(Default)]
    struct CountingRenderer {
        masks: AtomicUsize,
    }

    impl Renderer for CountingRenderer {
        fn load_image(&self, _name: &str) -> Result<Surface, RenderError> {
            Ok(Surface::solid(1, 1, RED))
        }
        fn transform(&self, source: &Surface, size: (u16, u16), _angle: u16) -> Result<Surface, RenderError> {
            Ok(Surface::solid(
                u32::from(size.0),
                u32::from(size.1),
                *source.image().get_pixel(0, 0),
            ))
        }
        fn compute_mask(&self, surface: &Surface) -> Mask {
            self.masks.fetch_add(1, Ordering::SeqCst);
            Mask::from_surface(surface, 127)
        }
        fn open_window(&self, _w: u16, _h: u16) -> Result<Box<dyn Window>, RenderError> {
            Err(RenderError::Window("no window in tests".into()))
        }
    }

    fn drawable(color: Rgba<u8>, x: u16, y: u16, side: u16, order: u8) -> Drawable {
        let descriptor = SpriteDescriptor {
            image: String::new(),
            x,
            y,
            angle: 0,
            width: side,
            height: side,
            order,
        };
        let surface = Surface::solid(u32::from(side), u32::from(side), color);
        Drawable::new(surface.clone(), surface, &descriptor)
    }

    #[test]
    fn test_new_drawable_is_drawn_once() {
        let mut visuals = VisualState::new();
        visuals.insert(SpriteId::new(0), drawable(RED, 4, 4, 4, 0));
        let mut canvas = Canvas::new(16, 16, BLACK);

        let dirty = visuals.draw_all(&mut canvas);
        assert_eq!(dirty, vec![Rect::new(2, 2, 4, 4)]);
        assert_eq!(canvas.get(3, 3), Some(RED));
        visuals.clear_dirty();

        assert!(visuals.draw_all(&mut canvas).is_empty());
    }

    #[test]
    fn test_layers_and_creation_order() {
        let mut visuals = VisualState::new();
        visuals.insert(SpriteId::new(0), drawable(RED, 4, 4, 4, 2));
        visuals.insert(SpriteId::new(1), drawable(BLUE, 4, 4, 4, 1));
        let mut canvas = Canvas::new(8, 8, BLACK);
        visuals.draw_all(&mut canvas);
        // Higher layer wins despite being created first
        assert_eq!(canvas.get(4, 4), Some(RED));

        visuals.clear_dirty();
        visuals.apply(&SceneUpdate::Reordered {
            id: SpriteId::new(1),
            order: 2,
        });
        visuals.draw_all(&mut canvas);
        // Same layer: later creation on top
        assert_eq!(canvas.get(4, 4), Some(BLUE));
    }

    #[test]
    fn test_move_clears_old_area() {
        let mut visuals = VisualState::new();
        let id = SpriteId::new(0);
        visuals.insert(id, drawable(RED, 2, 2, 2, 0));
        let mut canvas = Canvas::new(16, 16, BLACK);
        visuals.draw_all(&mut canvas);
        visuals.clear_dirty();

        visuals.apply(&SceneUpdate::Moved { id, x: 10, y: 10 });
        let dirty = visuals.draw_all(&mut canvas);
        assert_eq!(dirty.len(), 2);
        assert_eq!(canvas.get(1, 1), Some(BLACK));
        assert_eq!(canvas.get(9, 9), Some(RED));
    }

    #[test]
    fn test_removal_vacates_area() {
        let mut visuals = VisualState::new();
        let id = SpriteId::new(7);
        visuals.insert(id, drawable(RED, 4, 4, 4, 0));
        let mut canvas = Canvas::new(8, 8, BLACK);
        visuals.draw_all(&mut canvas);
        visuals.clear_dirty();

        assert!(visuals.remove(id));
        assert!(!visuals.remove(id));
        let dirty = visuals.draw_all(&mut canvas);
        assert_eq!(dirty, vec![Rect::new(2, 2, 4, 4)]);
        assert_eq!(canvas.get(3, 3), Some(BLACK));
    }

    #[test]
    fn test_transform_jobs_and_lazy_mask() {
        let renderer = CountingRenderer::default();
        let mut visuals = VisualState::new();
        let id = SpriteId::new(0);
        visuals.insert(id, drawable(RED, 8, 8, 4, 0));

        visuals.mask(id, &renderer).unwrap();
        visuals.mask(id, &renderer).unwrap();
        assert_eq!(renderer.masks.load(Ordering::SeqCst), 1);

        visuals.apply(&SceneUpdate::Resized {
            id,
            width: 6,
            height: 2,
        });
        visuals.apply(&SceneUpdate::Moved { id, x: 1, y: 1 });
        let jobs = visuals.transform_jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].size, (6, 2));

        let surface = renderer
            .transform(&jobs[0].source, jobs[0].size, jobs[0].angle)
            .unwrap();
        visuals.install(id, surface);
        assert!(visuals.get(id).unwrap().mask_dirty());
        let (rect, mask) = visuals.mask(id, &renderer).unwrap();
        assert_eq!(rect, Rect::new(-2, 0, 6, 2));
        assert_eq!(mask.count(), 12);
        assert_eq!(renderer.masks.load(Ordering::SeqCst), 2);
    }
}
