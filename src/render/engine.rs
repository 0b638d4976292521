use crate::foundation::core::{Point, Rect, Rgba8Premul};
use crate::foundation::error::{WarpError, WarpResult};
use crate::render::blend::BlendMode;
use crate::render::image::{ImageRGBA, SurfaceDesc};

/// How samples between pixel centers are reconstructed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleFilter {
    /// Weighted mix of the four nearest pixel centers.
    #[default]
    Bilinear,
    /// The pixel containing the sample position.
    Nearest,
}

/// What a sample outside the image bounds reads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgePolicy {
    /// Repeat the nearest edge pixel.
    #[default]
    ClampToEdge,
    /// Fully transparent black.
    Transparent,
}

/// Pixel work the filters delegate to.
///
/// Coordinates are in pixels with the origin at the top-left corner; the center of pixel
/// `(x, y)` is at `(x + 0.5, y + 0.5)`.
///
/// Intermediates handed out by [`RenderEngine::allocate_intermediate`] are owned by the caller
/// until passed back to [`RenderEngine::release_intermediate`] or, when returned to the user as
/// a pass result, marked with [`RenderEngine::detach_intermediate`].
pub trait RenderEngine {
    /// Read one color from `image` at `at`.
    fn sample(
        &self,
        image: &ImageRGBA,
        at: Point,
        edge: EdgePolicy,
        filter: SampleFilter,
    ) -> Rgba8Premul;

    /// Hand out a cleared (transparent) target.
    ///
    /// Fails with [`crate::WarpError::ResourceExhausted`] if the engine cannot allocate.
    fn allocate_intermediate(&mut self, desc: SurfaceDesc) -> WarpResult<ImageRGBA>;

    /// Paint `src`, stretched to `frame`, over `dst`. Parts of `frame` outside `dst` are
    /// clipped.
    fn blend_over(
        &mut self,
        dst: &mut ImageRGBA,
        src: &ImageRGBA,
        frame: Rect,
        mode: BlendMode,
    ) -> WarpResult<()>;

    /// Give an intermediate back to the engine.
    ///
    /// Detached pass results may also be given back here once the caller is done with them.
    fn release_intermediate(&mut self, image: ImageRGBA);

    /// The intermediate leaves the pass as its result and is no longer the engine's to track.
    ///
    /// Engines that budget checked-out intermediates stop counting `image` here.
    fn detach_intermediate(&mut self, image: &ImageRGBA) {
        let _ = image;
    }

    /// Fill every pixel of `dst` by sampling `src` at `map(pixel_center)`.
    fn remap(
        &self,
        src: &ImageRGBA,
        dst: &mut ImageRGBA,
        map: &(dyn Fn(Point) -> Point + Sync),
        edge: EdgePolicy,
        filter: SampleFilter,
    ) -> WarpResult<()> {
        for y in 0..dst.height {
            for x in 0..dst.width {
                let at = map(Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5));
                let px = self.sample(src, at, edge, filter);
                dst.set_pixel(x, y, px);
            }
        }
        Ok(())
    }
}

/// Reference sampler shared by engines that work on [`ImageRGBA`] buffers directly.
pub fn sample_rgba8_premul(
    image: &ImageRGBA,
    at: Point,
    edge: EdgePolicy,
    filter: SampleFilter,
) -> Rgba8Premul {
    if image.width == 0 || image.height == 0 || !at.x.is_finite() || !at.y.is_finite() {
        return Rgba8Premul::transparent();
    }
    match filter {
        SampleFilter::Nearest => fetch(image, at.x.floor() as i64, at.y.floor() as i64, edge),
        SampleFilter::Bilinear => {
            let fx = at.x - 0.5;
            let fy = at.y - 0.5;
            let x0 = fx.floor();
            let y0 = fy.floor();
            let dx = (fx - x0) as f32;
            let dy = (fy - y0) as f32;
            let (x0, y0) = (x0 as i64, y0 as i64);

            let p00 = fetch(image, x0, y0, edge).to_array();
            let p10 = fetch(image, x0 + 1, y0, edge).to_array();
            let p01 = fetch(image, x0, y0 + 1, edge).to_array();
            let p11 = fetch(image, x0 + 1, y0 + 1, edge).to_array();

            let mut out = [0u8; 4];
            for c in 0..4 {
                let v = f32::from(p00[c]) * (1.0 - dx) * (1.0 - dy)
                    + f32::from(p10[c]) * dx * (1.0 - dy)
                    + f32::from(p01[c]) * (1.0 - dx) * dy
                    + f32::from(p11[c]) * dx * dy;
                out[c] = v.round().clamp(0.0, 255.0) as u8;
            }
            Rgba8Premul::from_array(out)
        }
    }
}

fn fetch(image: &ImageRGBA, x: i64, y: i64, edge: EdgePolicy) -> Rgba8Premul {
    let (w, h) = (i64::from(image.width), i64::from(image.height));
    let (x, y) = match edge {
        EdgePolicy::ClampToEdge => (x.clamp(0, w - 1), y.clamp(0, h - 1)),
        EdgePolicy::Transparent => {
            if x < 0 || y < 0 || x >= w || y >= h {
                return Rgba8Premul::transparent();
            }
            (x, y)
        }
    };
    image
        .pixel(x as u32, y as u32)
        .unwrap_or_else(Rgba8Premul::transparent)
}

/// Classify an error reported by the rendering engine mid-pass: allocation and resource
/// failures keep their kind, everything else becomes [`WarpError::RenderResource`].
pub(crate) fn engine_failure(err: WarpError) -> WarpError {
    match err {
        WarpError::ResourceExhausted(_) | WarpError::RenderResource(_) => err,
        other => WarpError::render_resource(other.to_string()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/engine.rs"]
mod tests;
