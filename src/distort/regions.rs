//! Ordered collection of bulge regions and the combined displacement field they produce.

use crate::distort::params::{BulgeParams, ParamPolicy};
use crate::foundation::core::{Canvas, CoordOrigin, Point, Vec2};
use crate::foundation::error::{WarpError, WarpResult};

/// Bulge regions applied together in one pass.
///
/// Insertion order is evaluation order. Duplicates are legal: every region contributes its own
/// displacement and overlapping contributions add up, so two identical regions push twice as
/// far as one.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct BulgeRegions {
    items: Vec<BulgeParams>,
}

impl BulgeRegions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, params: BulgeParams) {
        self.items.push(params);
    }

    pub fn remove_at(&mut self, index: usize) -> WarpResult<BulgeParams> {
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

    pub fn get(&self, index: usize) -> Option<&BulgeParams> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut BulgeParams> {
        self.items.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BulgeParams> {
        self.items.iter()
    }

    /// Snapshot with every region passed through [`BulgeParams::resolve`].
    pub fn resolve(&self, policy: ParamPolicy) -> WarpResult<Self> {
        let items = self
            .items
            .iter()
            .map(|p| p.resolve(policy))
            .collect::<WarpResult<Vec<_>>>()?;
        Ok(Self { items })
    }

    /// Snapshot with centers re-expressed in top-left space.
    pub fn to_top_left(&self, origin: CoordOrigin) -> Self {
        let items = self
            .items
            .iter()
            .map(|p| BulgeParams {
                center: origin.uv_to_top_left(p.center),
                ..*p
            })
            .collect();
        Self { items }
    }

    /// Combined displacement at normalized coordinate `uv`, in normalized units.
    ///
    /// `aspect` is `height / width` of the target; vertical offsets are scaled by it before
    /// distances are compared against each radius.
    pub fn evaluate_displacement(&self, uv: Point, aspect: f64) -> Vec2 {
        self.items
            .iter()
            .fold(Vec2::ZERO, |acc, p| acc + bulge_displacement(p, uv, aspect))
    }

    /// Combined displacement at `pixel` on a target of size `canvas`, in pixels.
    pub fn evaluate_displacement_px(&self, pixel: Point, canvas: Canvas) -> Vec2 {
        if canvas.is_empty() {
            return Vec2::ZERO;
        }
        let w = f64::from(canvas.width);
        let h = f64::from(canvas.height);
        let d = self.evaluate_displacement(Point::new(pixel.x / w, pixel.y / h), canvas.aspect());
        Vec2::new(d.x * w, d.y * h)
    }
}

impl FromIterator<BulgeParams> for BulgeRegions {
    fn from_iter<I: IntoIterator<Item = BulgeParams>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a BulgeRegions {
    type Item = &'a BulgeParams;
    type IntoIter = std::slice::Iter<'a, BulgeParams>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

fn bulge_displacement(p: &BulgeParams, uv: Point, aspect: f64) -> Vec2 {
    if p.radius <= 0.0 || p.scale == 0.0 {
        return Vec2::ZERO;
    }
    let offset = uv - p.center;
    let dist = Vec2::new(offset.x, offset.y * aspect).hypot();
    if dist >= p.radius {
        return Vec2::ZERO;
    }

    // Sampling position is pulled toward the center by `percent`, which is 1 at the rim.
    let falloff = (p.radius - dist) / p.radius;
    let percent = (1.0 - falloff * p.scale).powi(2);
    offset * (percent - 1.0)
}

#[cfg(test)]
#[path = "../../tests/unit/distort/regions.rs"]
mod tests;
