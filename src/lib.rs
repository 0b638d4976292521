//! Warpstack is a still-image filter node: multi-region bulge distortion followed by sticker and
//! picture overlays.
//!
//! - Describe the effect with [`BulgeRegions`] and an [`OverlayStack`] (or load a [`FilterSpec`])
//! - Attach both to a [`Compositor`]
//! - Call [`Compositor::render`] with a [`RenderEngine`] such as [`CpuEngine`]
//!
//! All pixel data is premultiplied RGBA8 ([`ImageRGBA`]).
#![forbid(unsafe_code)]

mod assets;
mod foundation;

pub(crate) mod compose;
/// JSON filter descriptions.
pub mod config;
pub(crate) mod distort;
pub(crate) mod overlay;
pub(crate) mod render;

pub use crate::foundation::core::{Canvas, CoordOrigin, Point, Rect, Rgba8Premul, Vec2};
pub use crate::foundation::error::{WarpError, WarpResult};

pub use crate::assets::decode::{decode_image, load_image, save_png};
pub use crate::compose::compositor::{Compositor, CompositorSettings};
pub use crate::config::{FilterSpec, FrameSpec, OverlaySpec};
pub use crate::distort::params::{BulgeParams, ParamPolicy};
pub use crate::distort::regions::BulgeRegions;
pub use crate::overlay::stack::{Overlay, OverlayStack, Placement};
pub use crate::render::blend::{BlendMode, PremulRgba8, blend, over};
pub use crate::render::cpu::{CpuEngine, CpuEngineOpts, CpuEngineStats};
pub use crate::render::engine::{EdgePolicy, RenderEngine, SampleFilter, sample_rgba8_premul};
pub use crate::render::image::{ImageRGBA, PixelFormat, SurfaceDesc};
pub use crate::render::surface_pool::{SurfacePoolOpts, SurfacePoolStats};
