pub(crate) mod blend;
pub(crate) mod cpu;
pub(crate) mod engine;
pub(crate) mod image;
pub(crate) mod surface_pool;
