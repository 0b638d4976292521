/// Convenience result type used across warpstack.
pub type WarpResult<T> = Result<T, WarpError>;

/// Top-level error taxonomy used by filter and engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum WarpError {
    /// An index passed to a collection removal was outside `0..len`.
    #[error("index {index} out of range for collection of length {len}")]
    OutOfRange {
        /// Offending index.
        index: usize,
        /// Collection length at the time of the call.
        len: usize,
    },

    /// A distortion parameter was outside its documented domain.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The rendering engine could not allocate an intermediate target.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Any other failure reported by the rendering engine during a pass.
    #[error("render resource error: {0}")]
    RenderResource(String),

    /// Malformed images, frames or filter descriptions.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WarpError {
    /// Build a [`WarpError::OutOfRange`] value.
    pub fn out_of_range(index: usize, len: usize) -> Self {
        Self::OutOfRange { index, len }
    }

    /// Build a [`WarpError::InvalidParameter`] value.
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Build a [`WarpError::ResourceExhausted`] value.
    pub fn resource_exhausted(msg: impl Into<String>) -> Self {
        Self::ResourceExhausted(msg.into())
    }

    /// Build a [`WarpError::RenderResource`] value.
    pub fn render_resource(msg: impl Into<String>) -> Self {
        Self::RenderResource(msg.into())
    }

    /// Build a [`WarpError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
