use crate::distort::params::ParamPolicy;
use crate::distort::regions::BulgeRegions;
use crate::foundation::core::{CoordOrigin, Point};
use crate::foundation::error::WarpResult;
use crate::overlay::stack::OverlayStack;
use crate::render::engine::{EdgePolicy, RenderEngine, SampleFilter, engine_failure};
use crate::render::image::ImageRGBA;

/// Knobs that change how a [`Compositor`] interprets its configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CompositorSettings {
    /// Convention for overlay frames and bulge centers.
    pub origin: CoordOrigin,
    /// Reconstruction filter for distortion sampling.
    pub filter: SampleFilter,
    /// What distortion samples outside the input read.
    pub edge: EdgePolicy,
    /// Handling of out-of-domain bulge parameters.
    pub param_policy: ParamPolicy,
}

/// One filter-chain node: bulge distortion, then overlays, over a single input image.
///
/// `render` borrows the compositor immutably, so its configuration cannot change while a pass
/// is running; reconfigure between passes through the `&mut` accessors.
#[derive(Clone, Debug, Default)]
pub struct Compositor {
    regions: Option<BulgeRegions>,
    overlays: Option<OverlayStack>,
    settings: CompositorSettings,
}

impl Compositor {
    pub fn new(settings: CompositorSettings) -> Self {
        Self {
            regions: None,
            overlays: None,
            settings,
        }
    }

    pub fn settings(&self) -> CompositorSettings {
        self.settings
    }

    pub fn set_settings(&mut self, settings: CompositorSettings) {
        self.settings = settings;
    }

    pub fn regions(&self) -> Option<&BulgeRegions> {
        self.regions.as_ref()
    }

    /// Attached regions, attaching an empty collection first if there is none.
    pub fn regions_mut(&mut self) -> &mut BulgeRegions {
        self.regions.get_or_insert_with(BulgeRegions::default)
    }

    pub fn set_regions(&mut self, regions: Option<BulgeRegions>) {
        self.regions = regions;
    }

    pub fn overlays(&self) -> Option<&OverlayStack> {
        self.overlays.as_ref()
    }

    /// Attached overlays, attaching an empty stack first if there is none.
    pub fn overlays_mut(&mut self) -> &mut OverlayStack {
        self.overlays.get_or_insert_with(OverlayStack::default)
    }

    pub fn set_overlays(&mut self, overlays: Option<OverlayStack>) {
        self.overlays = overlays;
    }

    /// Produce a new image from `input`.
    ///
    /// 1. Non-empty regions: every output pixel samples `input` at its center plus the summed
    ///    bulge displacement.
    /// 2. Non-empty overlays: painted in insertion order over the result of step 1 (or over
    ///    `input`).
    /// 3. Neither: a copy of `input`.
    ///
    /// `input` is never modified. If the engine fails, every intermediate acquired during the
    /// pass is released before the error is returned.
    #[tracing::instrument(skip_all, fields(width = input.width, height = input.height))]
    pub fn render(
        &self,
        engine: &mut dyn RenderEngine,
        input: &ImageRGBA,
    ) -> WarpResult<ImageRGBA> {
        input.validate()?;

        let regions = match &self.regions {
            Some(r) if !r.is_empty() => Some(
                r.resolve(self.settings.param_policy)?
                    .to_top_left(self.settings.origin),
            ),
            _ => None,
        };
        let overlays = self.overlays.as_ref().filter(|o| !o.is_empty());

        match (regions, overlays) {
            (None, None) => {
                tracing::debug!("identity pass");
                Ok(input.clone())
            }
            (None, Some(overlays)) => {
                tracing::debug!(overlays = overlays.len(), "overlay pass");
                overlays.composite(engine, input, self.settings.origin)
            }
            (Some(regions), overlays) => {
                tracing::debug!(
                    regions = regions.len(),
                    overlays = overlays.map_or(0, OverlayStack::len),
                    "distortion pass"
                );
                let mut out = engine
                    .allocate_intermediate(input.desc())
                    .map_err(engine_failure)?;

                let mut result = self.warp(engine, input, &mut out, &regions);
                if result.is_ok()
                    && let Some(o) = overlays
                {
                    result = o.composite_onto(engine, &mut out, self.settings.origin);
                }
                match result {
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
        }
    }

    fn warp(
        &self,
        engine: &mut dyn RenderEngine,
        input: &ImageRGBA,
        out: &mut ImageRGBA,
        regions: &BulgeRegions,
    ) -> WarpResult<()> {
        let canvas = input.canvas();
        let map = |p: Point| p + regions.evaluate_displacement_px(p, canvas);
        engine
            .remap(input, out, &map, self.settings.edge, self.settings.filter)
            .map_err(engine_failure)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/compositor.rs"]
mod tests;
