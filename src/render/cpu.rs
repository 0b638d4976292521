use std::collections::HashMap;

use rayon::prelude::*;

use crate::foundation::core::{Point, Rect, Rgba8Premul};
use crate::foundation::error::{WarpError, WarpResult};
use crate::render::blend::{BlendMode, blend, blend_in_place};
use crate::render::engine::{EdgePolicy, RenderEngine, SampleFilter, sample_rgba8_premul};
use crate::render::image::{ImageRGBA, SurfaceDesc};
use crate::render::surface_pool::{SurfacePool, SurfacePoolOpts, SurfacePoolStats};

/// Options for [`CpuEngine`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CpuEngineOpts {
    /// Split remap passes across rows with rayon.
    pub parallel: bool,
    /// Filter used when stretching overlays into their frames.
    pub overlay_filter: SampleFilter,
    /// Upper bound on bytes held by intermediates that are checked out at the same time.
    /// Allocations past it fail with `ResourceExhausted`.
    pub max_live_bytes: usize,
    /// Retention limits for released intermediates.
    pub pool: SurfacePoolOpts,
}

impl Default for CpuEngineOpts {
    fn default() -> Self {
        Self {
            parallel: false,
            overlay_filter: SampleFilter::Bilinear,
            max_live_bytes: 512 * 1024 * 1024,
            pool: SurfacePoolOpts::default(),
        }
    }
}

/// Allocation counters for a [`CpuEngine`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CpuEngineStats {
    /// Intermediates currently checked out.
    pub live_intermediates: usize,
    /// Bytes held by checked-out intermediates.
    pub live_bytes: usize,
    pub pool: SurfacePoolStats,
}

/// Rendering engine that works on [`ImageRGBA`] buffers in memory.
///
/// Only checked-out intermediates count against `max_live_bytes`. Buffers handed to the user as
/// pass results are detached from the budget and may still be given back through
/// `release_intermediate` for reuse.
pub struct CpuEngine {
    opts: CpuEngineOpts,
    pool: SurfacePool,
    // Checked-out buffers keyed by heap address, mapped to their byte length.
    checked_out: HashMap<usize, usize>,
    live_bytes: usize,
}

impl CpuEngine {
    pub fn new(opts: CpuEngineOpts) -> Self {
        Self {
            opts,
            pool: SurfacePool::new(opts.pool),
            checked_out: HashMap::new(),
            live_bytes: 0,
        }
    }

    pub fn opts(&self) -> CpuEngineOpts {
        self.opts
    }

    pub fn stats(&self) -> CpuEngineStats {
        CpuEngineStats {
            live_intermediates: self.checked_out.len(),
            live_bytes: self.live_bytes,
            pool: self.pool.stats(),
        }
    }

    /// Drop all retained intermediates.
    pub fn purge(&mut self) {
        self.pool.purge();
    }

    /// Stop counting `data` against the live budget. Returns whether it was checked out.
    fn check_in(&mut self, data: &[u8]) -> bool {
        match self.checked_out.remove(&buffer_key(data)) {
            Some(bytes) => {
                self.live_bytes = self.live_bytes.saturating_sub(bytes);
                true
            }
            None => false,
        }
    }
}

fn buffer_key(data: &[u8]) -> usize {
    data.as_ptr() as usize
}

impl Default for CpuEngine {
    fn default() -> Self {
        Self::new(CpuEngineOpts::default())
    }
}

impl RenderEngine for CpuEngine {
    fn sample(
        &self,
        image: &ImageRGBA,
        at: Point,
        edge: EdgePolicy,
        filter: SampleFilter,
    ) -> Rgba8Premul {
        sample_rgba8_premul(image, at, edge, filter)
    }

    fn allocate_intermediate(&mut self, desc: SurfaceDesc) -> WarpResult<ImageRGBA> {
        let byte_len = desc
            .byte_len()
            .map_err(|_| WarpError::resource_exhausted("intermediate size overflows usize"))?;
        let live_after = self.live_bytes.saturating_add(byte_len);
        if live_after > self.opts.max_live_bytes {
            return Err(WarpError::resource_exhausted(format!(
                "intermediate {}x{} needs {byte_len} bytes, {} of {} already live",
                desc.width, desc.height, self.live_bytes, self.opts.max_live_bytes
            )));
        }

        if byte_len == 0 {
            return Ok(ImageRGBA {
                width: desc.width,
                height: desc.height,
                data: Vec::new(),
            });
        }

        let mut data = self.pool.borrow(desc, byte_len);
        data.fill(0);
        self.checked_out.insert(buffer_key(&data), byte_len);
        self.live_bytes = live_after;
        Ok(ImageRGBA {
            width: desc.width,
            height: desc.height,
            data,
        })
    }

    fn blend_over(
        &mut self,
        dst: &mut ImageRGBA,
        src: &ImageRGBA,
        frame: Rect,
        mode: BlendMode,
    ) -> WarpResult<()> {
        dst.validate()?;
        src.validate()?;

        let frame = frame.abs();
        if !frame.is_finite() || frame.width() <= 0.0 || frame.height() <= 0.0 {
            return Ok(());
        }
        if src.width == 0 || src.height == 0 {
            return Ok(());
        }

        if frame == dst.canvas().bounds() && src.canvas() == dst.canvas() {
            return blend_in_place(&mut dst.data, &src.data, mode);
        }

        let Some((xs, ys)) = covered_pixels(frame, dst.width, dst.height) else {
            return Ok(());
        };
        let sx = f64::from(src.width) / frame.width();
        let sy = f64::from(src.height) / frame.height();
        let filter = self.opts.overlay_filter;

        for y in ys {
            let cy = f64::from(y) + 0.5;
            for x in xs.clone() {
                let cx = f64::from(x) + 0.5;
                let at = Point::new((cx - frame.x0) * sx, (cy - frame.y0) * sy);
                let s = sample_rgba8_premul(src, at, EdgePolicy::ClampToEdge, filter);
                if let Some(d) = dst.pixel(x, y) {
                    let out = blend(d.to_array(), s.to_array(), mode);
                    dst.set_pixel(x, y, Rgba8Premul::from_array(out));
                }
            }
        }
        Ok(())
    }

    fn detach_intermediate(&mut self, image: &ImageRGBA) {
        if !image.data.is_empty() {
            self.check_in(&image.data);
        }
    }

    fn release_intermediate(&mut self, image: ImageRGBA) {
        if image.data.is_empty() {
            return;
        }
        let checked_in = self.check_in(&image.data);
        let desc = image.desc();
        match desc.byte_len() {
            Ok(len) if len == image.data.len() => self.pool.release(desc, image.data),
            _ => tracing::debug!(
                width = desc.width,
                height = desc.height,
                bytes = image.data.len(),
                checked_in,
                "dropping malformed buffer instead of pooling it"
            ),
        }
    }

    fn remap(
        &self,
        src: &ImageRGBA,
        dst: &mut ImageRGBA,
        map: &(dyn Fn(Point) -> Point + Sync),
        edge: EdgePolicy,
        filter: SampleFilter,
    ) -> WarpResult<()> {
        dst.validate()?;
        let stride = dst.width as usize * 4;
        if stride == 0 {
            return Ok(());
        }

        let fill_row = |(y, row): (usize, &mut [u8])| {
            let cy = y as f64 + 0.5;
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let at = map(Point::new(x as f64 + 0.5, cy));
                px.copy_from_slice(&sample_rgba8_premul(src, at, edge, filter).to_array());
            }
        };

        if self.opts.parallel {
            dst.data.par_chunks_mut(stride).enumerate().for_each(fill_row);
        } else {
            dst.data.chunks_mut(stride).enumerate().for_each(fill_row);
        }
        Ok(())
    }
}

/// Pixel index ranges whose centers fall inside `frame`, clipped to a `width x height` target.
fn covered_pixels(
    frame: Rect,
    width: u32,
    height: u32,
) -> Option<(std::ops::Range<u32>, std::ops::Range<u32>)> {
    fn span(lo: f64, hi: f64, len: u32) -> std::ops::Range<u32> {
        let len = f64::from(len);
        let start = (lo - 0.5).ceil().clamp(0.0, len) as u32;
        let end = (hi - 0.5).ceil().clamp(0.0, len) as u32;
        start..end
    }

    let xs = span(frame.x0, frame.x1, width);
    let ys = span(frame.y0, frame.y1, height);
    if xs.is_empty() || ys.is_empty() {
        return None;
    }
    Some((xs, ys))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
