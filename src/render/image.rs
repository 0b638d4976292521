use crate::foundation::core::{Canvas, Rgba8Premul};
use crate::foundation::error::{WarpError, WarpResult};

/// Pixel layout of images and intermediates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Four 8-bit channels, color premultiplied by alpha.
    Rgba8Premul,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba8Premul => 4,
        }
    }
}

/// Size and format of an intermediate target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceDesc {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

impl SurfaceDesc {
    pub fn rgba8_premul(canvas: Canvas) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            format: PixelFormat::Rgba8Premul,
        }
    }

    pub fn byte_len(self) -> WarpResult<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|v| v.checked_mul(self.format.bytes_per_pixel()))
            .ok_or_else(|| WarpError::validation("surface size overflow"))
    }
}

/// An image as RGBA8 pixels.
///
/// Pixels are **premultiplied alpha**, tightly packed, row-major, top row first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageRGBA {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Premultiplied RGBA8 bytes.
    pub data: Vec<u8>,
}

impl ImageRGBA {
    /// Wrap premultiplied bytes, checking that the length matches `width * height * 4`.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> WarpResult<Self> {
        let img = Self {
            width,
            height,
            data,
        };
        img.validate()?;
        Ok(img)
    }

    /// Build an image from straight (non-premultiplied) RGBA8 bytes.
    pub fn from_straight_rgba8(width: u32, height: u32, mut data: Vec<u8>) -> WarpResult<Self> {
        premultiply_rgba8_in_place(&mut data);
        Self::new(width, height, data)
    }

    pub fn solid(canvas: Canvas, color: Rgba8Premul) -> Self {
        let px = canvas.width as usize * canvas.height as usize;
        Self {
            width: canvas.width,
            height: canvas.height,
            data: color.to_array().repeat(px),
        }
    }

    pub fn transparent(canvas: Canvas) -> Self {
        Self::solid(canvas, Rgba8Premul::transparent())
    }

    pub fn canvas(&self) -> Canvas {
        Canvas::new(self.width, self.height)
    }

    pub fn desc(&self) -> SurfaceDesc {
        SurfaceDesc::rgba8_premul(self.canvas())
    }

    pub fn validate(&self) -> WarpResult<()> {
        let expected = self.desc().byte_len()?;
        if self.data.len() != expected {
            return Err(WarpError::validation(format!(
                "image buffer is {} bytes, expected {}x{}x4 = {expected}",
                self.data.len(),
                self.width,
                self.height
            )));
        }
        Ok(())
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba8Premul> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = self.index(x, y);
        Some(Rgba8Premul::from_array([
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]))
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, px: Rgba8Premul) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = self.index(x, y);
        self.data[idx..idx + 4].copy_from_slice(&px.to_array());
    }

    /// Straight-alpha copy of the pixel data, for encoders that expect it.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len());
        for px in self.data.chunks_exact(4) {
            let straight = Rgba8Premul::from_array([px[0], px[1], px[2], px[3]]).to_straight_rgba();
            out.extend_from_slice(&straight);
        }
        out
    }

    fn index(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + (x as usize)) * 4
    }
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/image.rs"]
mod tests;
