//! Ordered overlay stack for stickers and pictures.

use std::sync::Arc;

use crate::foundation::core::{Canvas, CoordOrigin, Rect};
use crate::foundation::error::{WarpError, WarpResult};
use crate::render::blend::BlendMode;
use crate::render::engine::{RenderEngine, engine_failure};
use crate::render::image::ImageRGBA;

/// Where an overlay lands on the render target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Placement {
    /// Explicit rectangle in render-target pixels. Stored as given; anything outside the
    /// target is clipped when compositing.
    Frame(Rect),
    /// Stretched over the whole render target.
    FullCanvas,
}

impl Placement {
    /// Top-left pixel rectangle covered on a target of size `canvas`.
    pub fn resolve(self, canvas: Canvas, origin: CoordOrigin) -> Rect {
        match self {
            Self::Frame(rect) => origin.rect_to_top_left(rect, canvas),
            Self::FullCanvas => canvas.bounds(),
        }
    }
}

/// A shared image painted at a placement.
#[derive(Clone, Debug)]
pub struct Overlay {
    pub image: Arc<ImageRGBA>,
    pub placement: Placement,
    pub blend: BlendMode,
}

impl Overlay {
    pub fn new(image: Arc<ImageRGBA>, placement: Placement) -> Self {
        Self {
            image,
            placement,
            blend: BlendMode::Normal,
        }
    }
}

/// Overlays painted back-to-front: later entries end up on top.
///
/// Images are held through [`Arc`]; the stack never copies or mutates them.
#[derive(Clone, Debug, Default)]
pub struct OverlayStack {
    items: Vec<Overlay>,
}

impl OverlayStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair sticker images with their pixel frames, in order.
    pub fn with_stickers(stickers: Vec<Arc<ImageRGBA>>, frames: Vec<Rect>) -> WarpResult<Self> {
        if stickers.len() != frames.len() {
            return Err(WarpError::validation(format!(
                "{} stickers but {} sticker frames",
                stickers.len(),
                frames.len()
            )));
        }
        let items = stickers
            .into_iter()
            .zip(frames)
            .map(|(image, frame)| Overlay::new(image, Placement::Frame(frame)))
            .collect();
        Ok(Self { items })
    }

    pub fn add(&mut self, image: Arc<ImageRGBA>, frame: Rect) {
        self.push(Overlay::new(image, Placement::Frame(frame)));
    }

    /// Add a picture that covers the whole render target.
    pub fn add_full_canvas(&mut self, image: Arc<ImageRGBA>) {
        self.push(Overlay::new(image, Placement::FullCanvas));
    }

    pub fn push(&mut self, overlay: Overlay) {
        self.items.push(overlay);
    }

    pub fn remove_at(&mut self, index: usize) -> WarpResult<Overlay> {
        if index >= self.items.len() {
            return Err(WarpError::out_of_range(index, self.items.len()));
        }
        Ok(self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Overlay> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Overlay> {
        self.items.iter()
    }

    /// Composite every overlay onto a copy of `base`.
    ///
    /// `base` is never modified. On failure the intermediate is released before returning.
    pub fn composite(
        &self,
        engine: &mut dyn RenderEngine,
        base: &ImageRGBA,
        origin: CoordOrigin,
    ) -> WarpResult<ImageRGBA> {
        base.validate()?;
        let mut out = engine
            .allocate_intermediate(base.desc())
            .map_err(engine_failure)?;
        out.data.copy_from_slice(&base.data);

        match self.composite_onto(engine, &mut out, origin) {
            Ok(()) => {
                engine.detach_intermediate(&out);
                Ok(out)
            }
            Err(e) => {
                engine.release_intermediate(out);
                Err(e)
            }
        }
    }

    /// Composite every overlay, in insertion order, directly onto `dst`.
    pub fn composite_onto(
        &self,
        engine: &mut dyn RenderEngine,
        dst: &mut ImageRGBA,
        origin: CoordOrigin,
    ) -> WarpResult<()> {
        let canvas = dst.canvas();
        for (idx, overlay) in self.items.iter().enumerate() {
            let frame = overlay.placement.resolve(canvas, origin);
            tracing::trace!(idx, ?frame, "blend overlay");
            engine
                .blend_over(dst, &overlay.image, frame, overlay.blend)
                .map_err(engine_failure)?;
        }
        Ok(())
    }
}

impl FromIterator<Overlay> for OverlayStack {
    fn from_iter<I: IntoIterator<Item = Overlay>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a OverlayStack {
    type Item = &'a Overlay;
    type IntoIter = std::slice::Iter<'a, Overlay>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/stack.rs"]
mod tests;
