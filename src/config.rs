//! JSON-facing filter description.
//!
//! ```json
//! {
//!   "settings": { "origin": "top_left", "filter": "bilinear" },
//!   "bulges": [{ "center": { "x": 0.5, "y": 0.5 }, "radius": 0.25, "scale": 0.5 }],
//!   "overlays": [
//!     { "source": "sticker.png", "frame": { "x": 0, "y": 0, "width": 64, "height": 64 } },
//!     { "source": "frame_border.png" }
//!   ]
//! }
//! ```
//!
//! Overlay sources are resolved relative to an assets root, normally the directory holding the
//! JSON file.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::assets::decode::load_image;
use crate::compose::compositor::{Compositor, CompositorSettings};
use crate::distort::params::BulgeParams;
use crate::distort::regions::BulgeRegions;
use crate::foundation::core::Rect;
use crate::foundation::error::{WarpError, WarpResult};
use crate::overlay::stack::{Overlay, OverlayStack, Placement};
use crate::render::image::ImageRGBA;

/// Origin-and-size rectangle in render-target pixels.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FrameSpec {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl FrameSpec {
    pub fn to_rect(self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }
}

/// One overlay entry. Without a frame the image covers the whole render target.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OverlaySpec {
    pub source: PathBuf,
    #[serde(default)]
    pub frame: Option<FrameSpec>,
}

/// A complete filter: settings, bulge regions and overlays.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterSpec {
    pub settings: CompositorSettings,
    pub bulges: Vec<BulgeParams>,
    pub overlays: Vec<OverlaySpec>,
}

impl FilterSpec {
    /// Parse a filter from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> WarpResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| WarpError::validation(format!("parse filter JSON: {e}")))
    }

    /// Parse a filter from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> WarpResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            WarpError::validation(format!("open filter JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Structural checks that do not need any image data.
    ///
    /// Bulge parameter ranges are not checked here; they follow the settings' parameter policy
    /// at render time.
    pub fn validate(&self) -> WarpResult<()> {
        for (idx, overlay) in self.overlays.iter().enumerate() {
            if overlay.source.as_os_str().is_empty() {
                return Err(WarpError::validation(format!(
                    "overlay {idx} has an empty source path"
                )));
            }
            if let Some(frame) = overlay.frame {
                let finite = [frame.x, frame.y, frame.width, frame.height]
                    .iter()
                    .all(|v| v.is_finite());
                if !finite {
                    return Err(WarpError::validation(format!(
                        "overlay {idx} frame must be finite"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Decode overlay sources under `assets_root` and build a ready-to-render compositor.
    ///
    /// Each distinct source path is decoded once and shared between the overlays using it.
    #[tracing::instrument(skip(self), fields(bulges = self.bulges.len(), overlays = self.overlays.len()))]
    pub fn build(&self, assets_root: &Path) -> WarpResult<Compositor> {
        self.validate()?;

        let mut comp = Compositor::new(self.settings);
        if !self.bulges.is_empty() {
            comp.set_regions(Some(self.bulges.iter().copied().collect::<BulgeRegions>()));
        }

        if !self.overlays.is_empty() {
            let mut decoded: HashMap<&Path, Arc<ImageRGBA>> = HashMap::new();
            let mut stack = OverlayStack::new();
            for spec in &self.overlays {
                let image = match decoded.get(spec.source.as_path()) {
                    Some(img) => Arc::clone(img),
                    None => {
                        let img = Arc::new(load_image(&assets_root.join(&spec.source))?);
                        decoded.insert(spec.source.as_path(), Arc::clone(&img));
                        img
                    }
                };
                let placement = match spec.frame {
                    Some(frame) => Placement::Frame(frame.to_rect()),
                    None => Placement::FullCanvas,
                };
                stack.push(Overlay::new(image, placement));
            }
            comp.set_overlays(Some(stack));
        }

        Ok(comp)
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
