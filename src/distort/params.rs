use crate::foundation::core::Point;
use crate::foundation::error::{WarpError, WarpResult};

/// What to do with a bulge parameter outside its documented domain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamPolicy {
    /// Clamp to the nearest valid value and keep rendering. Non-finite values fall back to
    /// the field default.
    #[default]
    Clamp,
    /// Fail the pass with [`WarpError::InvalidParameter`].
    Reject,
}

/// One bulge region: where it sits, how far it reaches and how hard it pushes.
///
/// Construction never fails; range checks happen when a pass resolves the parameters.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BulgeParams {
    /// Normalized center in `[0, 1] x [0, 1]`.
    pub center: Point,
    /// Normalized, aspect-corrected reach in `[0, 1]`. Pixels at or beyond it are untouched.
    pub radius: f64,
    /// Strength in `[-1, 1]`. Positive values bulge outward, negative values pinch, `0` is a
    /// no-op.
    pub scale: f64,
}

impl BulgeParams {
    pub const DEFAULT_CENTER: Point = Point::new(0.5, 0.5);
    pub const DEFAULT_RADIUS: f64 = 0.25;
    pub const DEFAULT_SCALE: f64 = 0.5;

    pub fn new(center: Point, radius: f64, scale: f64) -> Self {
        Self {
            center,
            radius,
            scale,
        }
    }

    /// Return a copy whose fields are inside their domains, according to `policy`.
    pub fn resolve(&self, policy: ParamPolicy) -> WarpResult<Self> {
        Ok(Self {
            center: Point::new(
                bounded("center.x", self.center.x, 0.0, 1.0, Self::DEFAULT_CENTER.x, policy)?,
                bounded("center.y", self.center.y, 0.0, 1.0, Self::DEFAULT_CENTER.y, policy)?,
            ),
            radius: bounded("radius", self.radius, 0.0, 1.0, Self::DEFAULT_RADIUS, policy)?,
            scale: bounded("scale", self.scale, -1.0, 1.0, Self::DEFAULT_SCALE, policy)?,
        })
    }
}

impl Default for BulgeParams {
    fn default() -> Self {
        Self {
            center: Self::DEFAULT_CENTER,
            radius: Self::DEFAULT_RADIUS,
            scale: Self::DEFAULT_SCALE,
        }
    }
}

fn bounded(
    name: &str,
    value: f64,
    min: f64,
    max: f64,
    fallback: f64,
    policy: ParamPolicy,
) -> WarpResult<f64> {
    let in_domain = value.is_finite() && (min..=max).contains(&value);
    if in_domain {
        return Ok(value);
    }
    match policy {
        ParamPolicy::Reject => Err(WarpError::invalid_parameter(format!(
            "{name} = {value} outside [{min}, {max}]"
        ))),
        ParamPolicy::Clamp => {
            let fixed = if value.is_finite() {
                value.clamp(min, max)
            } else {
                fallback
            };
            tracing::warn!(param = name, value, clamped = fixed, "bulge parameter clamped");
            Ok(fixed)
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/distort/params.rs"]
mod tests;
