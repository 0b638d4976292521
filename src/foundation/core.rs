pub use kurbo::{Point, Rect, Vec2};

/// Pixel dimensions of a render target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// `height / width`, the factor applied to vertical normalized offsets so distances are
    /// measured in a square space.
    pub fn aspect(self) -> f64 {
        if self.width == 0 {
            return 1.0;
        }
        f64::from(self.height) / f64::from(self.width)
    }

    pub fn bounds(self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8Premul {
    pub fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    pub fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }

    /// Undo premultiplication. Fully transparent pixels come back as `[0, 0, 0, 0]`.
    pub fn to_straight_rgba(self) -> [u8; 4] {
        fn unpremul(c: u8, a: u8) -> u8 {
            let c = u32::from(c);
            let a = u32::from(a);
            ((c * 255 + a / 2) / a).min(255) as u8
        }

        if self.a == 0 {
            return [0, 0, 0, 0];
        }
        [
            unpremul(self.r, self.a),
            unpremul(self.g, self.a),
            unpremul(self.b, self.a),
            self.a,
        ]
    }

    pub fn from_array(px: [u8; 4]) -> Self {
        Self {
            r: px[0],
            g: px[1],
            b: px[2],
            a: px[3],
        }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Where the origin of overlay frames and bulge centers sits on the render target.
///
/// Internally everything is stored top-left/y-down; this only affects how caller-supplied
/// coordinates are interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordOrigin {
    /// Origin at the top-left corner, y grows downward (view convention).
    #[default]
    TopLeft,
    /// Origin at the bottom-left corner, y grows upward (texture convention).
    BottomLeft,
}

impl CoordOrigin {
    /// Map a pixel-unit rectangle into top-left space for a target of `canvas` size.
    pub fn rect_to_top_left(self, rect: Rect, canvas: Canvas) -> Rect {
        match self {
            Self::TopLeft => rect,
            Self::BottomLeft => {
                let h = f64::from(canvas.height);
                let r = rect.abs();
                Rect::new(r.x0, h - r.y1, r.x1, h - r.y0)
            }
        }
    }

    /// Map a normalized point into top-left space.
    pub fn uv_to_top_left(self, uv: Point) -> Point {
        match self {
            Self::TopLeft => uv,
            Self::BottomLeft => Point::new(uv.x, 1.0 - uv.y),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
